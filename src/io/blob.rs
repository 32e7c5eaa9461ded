//! Binary format of library indices
//!
//! The blob is a sequence of little-endian 32-bit words. Variable-size items are prefixed
//! by their length, and strings are padded to a whole number of words.

use crate::error::{LibraryError, LibraryResult};
use crate::library::{
    Cell, CellFunction, CellLibrary, CellLibraryBuilder, PinLayout, SequentialInfo, Sense,
};
use crate::network::RegisterKind;
use crate::patgen::{
    FunctionGroup, NpnMap, PatternArena, PatternDatabase, PatternEdge, PatternGraph,
    PatternNode, RepresentativeClass, SequentialClass, SequentialGroup, BUFFER_GROUP,
    CONST0_GROUP, CONST1_GROUP, INVERTER_GROUP,
};
use crate::Expr;

/// First word of every blob
pub const BLOB_MAGIC: u32 = 0x5041_4d43;

/// Version of the format written by this crate
pub const BLOB_VERSION: u32 = 1;

const MAX_EXPR_DEPTH: usize = 64;

const EXPR_ZERO: u32 = 0;
const EXPR_ONE: u32 = 1;
const EXPR_LITERAL: u32 = 2;
const EXPR_AND: u32 = 3;
const EXPR_OR: u32 = 4;
const EXPR_XOR: u32 = 5;

const FUNCTION_OPAQUE: u32 = 0;
const FUNCTION_LOGIC: u32 = 1;
const FUNCTION_SEQUENTIAL: u32 = 2;

const PIN_INPUT: u32 = 0;
const PIN_OUTPUT: u32 = 1;

const NODE_INPUT: u32 = 0;
const NODE_AND: u32 = 1;
const NODE_XOR: u32 = 2;

/// Serialize a library and its pattern database
pub fn write_blob(library: &CellLibrary, db: &PatternDatabase) -> Vec<u8> {
    let mut w = BlobWriter::default();
    w.word(BLOB_MAGIC);
    w.word(BLOB_VERSION);
    w.library(library);
    w.groups(db);
    w.arena(db.arena());
    w.classes(db);
    w.sequential(db);
    w.into_bytes()
}

/// Deserialize a library and its pattern database
///
/// Fails without producing anything if the blob is truncated or inconsistent.
pub fn read_blob(data: &[u8]) -> LibraryResult<(CellLibrary, PatternDatabase)> {
    let mut r = BlobReader::new(data);
    let magic = r.word()?;
    if magic != BLOB_MAGIC {
        return Err(LibraryError::BadMagic { found: magic });
    }
    let version = r.word()?;
    if version != BLOB_VERSION {
        return Err(LibraryError::BadVersion {
            found: version,
            expected: BLOB_VERSION,
        });
    }
    let library = r.library()?;
    let mut groups = r.groups(&library)?;
    for (g, arity) in [
        (CONST0_GROUP, 0),
        (CONST1_GROUP, 0),
        (BUFFER_GROUP, 1),
        (INVERTER_GROUP, 1),
    ] {
        if groups.get(g).map(|g| g.map.nb_inputs()) != Some(arity) {
            return Err(malformed(format!("function group {g} must have {arity} inputs")));
        }
    }
    let arena = r.arena()?;
    let (classes, patterns) = r.classes(&mut groups, &arena)?;
    let (seq_groups, seq_classes) = r.sequential(&library)?;
    if !r.is_empty() {
        return Err(malformed(format!(
            "{} trailing bytes at offset {}",
            r.remaining(),
            r.offset
        )));
    }
    let db = PatternDatabase {
        groups,
        classes,
        arena,
        patterns,
        seq_groups,
        seq_classes,
    };
    Ok((library, db))
}

fn malformed(msg: String) -> LibraryError {
    LibraryError::Malformed(msg)
}

fn optional_index(v: Option<usize>) -> u32 {
    match v {
        None => 0,
        Some(i) => i as u32 + 1,
    }
}

#[derive(Default)]
struct BlobWriter {
    words: Vec<u32>,
}

impl BlobWriter {
    fn word(&mut self, w: u32) {
        self.words.push(w);
    }

    fn index(&mut self, i: usize) {
        self.word(i as u32);
    }

    fn indices(&mut self, v: &[usize]) {
        self.index(v.len());
        for i in v {
            self.index(*i);
        }
    }

    fn float(&mut self, f: f64) {
        let bits = f.to_bits();
        self.word(bits as u32);
        self.word((bits >> 32) as u32);
    }

    fn string(&mut self, s: &str) {
        self.index(s.len());
        for chunk in s.as_bytes().chunks(4) {
            let mut b = [0u8; 4];
            b[..chunk.len()].copy_from_slice(chunk);
            self.word(u32::from_le_bytes(b));
        }
    }

    fn sense(&mut self, s: Sense) {
        self.word(s.code());
    }

    fn kind(&mut self, k: RegisterKind) {
        self.word(match k {
            RegisterKind::FlipFlop => 0,
            RegisterKind::Latch => 1,
        });
    }

    fn layout(&mut self, l: &PinLayout) {
        self.index(l.data);
        self.index(l.clock);
        self.word(optional_index(l.clear));
        self.word(optional_index(l.preset));
        self.index(l.q);
        self.word(optional_index(l.iq));
    }

    fn expr(&mut self, e: &Expr) {
        match e {
            Expr::Zero => self.word(EXPR_ZERO),
            Expr::One => self.word(EXPR_ONE),
            Expr::Literal { var, inverted } => {
                self.word(EXPR_LITERAL);
                self.word(*var << 1 | *inverted as u32);
            }
            Expr::And(v) | Expr::Or(v) | Expr::Xor(v) => {
                self.word(match e {
                    Expr::And(_) => EXPR_AND,
                    Expr::Or(_) => EXPR_OR,
                    _ => EXPR_XOR,
                });
                self.index(v.len());
                for c in v {
                    self.expr(c);
                }
            }
        }
    }

    fn library(&mut self, library: &CellLibrary) {
        self.string(library.name());
        self.index(library.nb_cells());
        for c in library.cells() {
            self.cell(c);
        }
    }

    fn cell(&mut self, c: &Cell) {
        self.string(c.name());
        self.float(c.area());
        self.index(c.nb_inputs() + c.nb_outputs());
        for i in 0..c.nb_inputs() {
            self.string(c.input_name(i));
            self.word(PIN_INPUT);
        }
        for i in 0..c.nb_outputs() {
            self.string(c.output_name(i));
            self.word(PIN_OUTPUT);
        }
        match c.function() {
            CellFunction::Opaque => self.word(FUNCTION_OPAQUE),
            CellFunction::Logic(e) => {
                self.word(FUNCTION_LOGIC);
                self.expr(e);
            }
            CellFunction::Sequential(s) => {
                self.word(FUNCTION_SEQUENTIAL);
                self.kind(s.kind);
                self.sense(s.clock_sense);
                self.sense(s.clear_sense);
                self.sense(s.preset_sense);
                self.layout(&s.layout);
            }
        }
    }

    fn groups(&mut self, db: &PatternDatabase) {
        self.index(db.nb_groups());
        for i in 0..db.nb_groups() {
            let g = db.group(i);
            let map = g.map();
            self.word((map.nb_inputs() as u32) << 1 | map.output_inv() as u32);
            for j in 0..map.nb_inputs() {
                let (pos, inv) = map.input(j);
                self.word((pos as u32) << 1 | inv as u32);
            }
            self.indices(g.cells());
        }
    }

    fn arena(&mut self, arena: &PatternArena) {
        self.index(arena.nb_inputs());
        self.index(arena.nb_nodes());
        for n in arena.nodes() {
            match n {
                PatternNode::Input(i) => {
                    self.word(NODE_INPUT);
                    self.word(*i);
                    self.word(0);
                }
                PatternNode::And([a, b]) | PatternNode::Xor([a, b]) => {
                    self.word(if matches!(n, PatternNode::And(_)) {
                        NODE_AND
                    } else {
                        NODE_XOR
                    });
                    self.word(a.raw());
                    self.word(b.raw());
                }
            }
        }
    }

    fn classes(&mut self, db: &PatternDatabase) {
        self.index(db.nb_classes());
        for i in 0..db.nb_classes() {
            let c = db.class(i);
            self.indices(c.groups());
            self.index(c.patterns().len());
            for p in c.patterns() {
                let p = db.pattern(*p);
                self.word((p.input_count() as u32) << 1 | p.root_inv() as u32);
                self.word(p.root().node);
                self.index(p.edges().len());
                for e in p.edges() {
                    self.word(*e);
                }
            }
        }
    }

    fn sequential(&mut self, db: &PatternDatabase) {
        self.index(db.nb_seq_groups());
        for i in 0..db.nb_seq_groups() {
            let g = db.seq_group(i);
            self.layout(g.layout());
            self.indices(g.cells());
        }
        self.index(db.nb_seq_classes());
        for i in 0..db.nb_seq_classes() {
            let c = db.seq_class(i);
            self.kind(c.kind());
            self.sense(c.clock_sense());
            self.sense(c.clear_sense());
            self.sense(c.preset_sense());
            self.indices(c.groups());
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        self.words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }
}

struct BlobReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> BlobReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        BlobReader { data, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn word(&mut self) -> LibraryResult<u32> {
        let bytes = self.bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn bytes(&mut self, n: usize) -> LibraryResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(LibraryError::Truncated {
                offset: self.offset,
                expected: n,
            });
        }
        let ret = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(ret)
    }

    /// Read a length, checking that enough words remain for its items
    fn count(&mut self, words_per_item: usize) -> LibraryResult<usize> {
        let n = self.word()? as usize;
        let needed = n.saturating_mul(words_per_item).saturating_mul(4);
        if needed > self.remaining() {
            return Err(LibraryError::Truncated {
                offset: self.offset,
                expected: needed,
            });
        }
        Ok(n)
    }

    fn index(&mut self, bound: usize, what: &str) -> LibraryResult<usize> {
        let offset = self.offset;
        let i = self.word()? as usize;
        if i >= bound {
            return Err(malformed(format!(
                "{what} index {i} out of range {bound} at offset {offset}"
            )));
        }
        Ok(i)
    }

    fn indices(&mut self, bound: usize, what: &str) -> LibraryResult<Vec<usize>> {
        let n = self.count(1)?;
        (0..n).map(|_| self.index(bound, what)).collect()
    }

    fn optional_index(&mut self, bound: usize, what: &str) -> LibraryResult<Option<usize>> {
        let w = self.word()? as usize;
        if w == 0 {
            Ok(None)
        } else if w - 1 < bound {
            Ok(Some(w - 1))
        } else {
            Err(malformed(format!("{what} index {} out of range", w - 1)))
        }
    }

    fn float(&mut self) -> LibraryResult<f64> {
        let lo = self.word()? as u64;
        let hi = self.word()? as u64;
        Ok(f64::from_bits(hi << 32 | lo))
    }

    fn string(&mut self) -> LibraryResult<String> {
        let len = self.word()? as usize;
        let padded = len.div_ceil(4) * 4;
        let offset = self.offset;
        let bytes = self.bytes(padded)?;
        String::from_utf8(bytes[..len].to_vec())
            .map_err(|_| malformed(format!("invalid string at offset {offset}")))
    }

    fn sense(&mut self) -> LibraryResult<Sense> {
        let code = self.word()?;
        Sense::from_code(code).ok_or_else(|| malformed(format!("invalid sense code {code}")))
    }

    fn kind(&mut self) -> LibraryResult<RegisterKind> {
        match self.word()? {
            0 => Ok(RegisterKind::FlipFlop),
            1 => Ok(RegisterKind::Latch),
            k => Err(malformed(format!("invalid register kind {k}"))),
        }
    }

    fn layout(&mut self) -> LibraryResult<PinLayout> {
        // Pin positions are checked against the cells by the library builder
        let data = self.word()? as usize;
        let clock = self.word()? as usize;
        let clear = self.optional_index(usize::MAX, "clear pin")?;
        let preset = self.optional_index(usize::MAX, "preset pin")?;
        let q = self.word()? as usize;
        let iq = self.optional_index(usize::MAX, "inverted output pin")?;
        Ok(PinLayout {
            data,
            clock,
            clear,
            preset,
            q,
            iq,
        })
    }

    fn expr(&mut self, depth: usize) -> LibraryResult<Expr> {
        if depth > MAX_EXPR_DEPTH {
            return Err(malformed("expression is nested too deeply".to_string()));
        }
        let tag = self.word()?;
        match tag {
            EXPR_ZERO => Ok(Expr::Zero),
            EXPR_ONE => Ok(Expr::One),
            EXPR_LITERAL => {
                let w = self.word()?;
                Ok(Expr::literal(w >> 1, w & 1 != 0))
            }
            EXPR_AND | EXPR_OR | EXPR_XOR => {
                let n = self.count(1)?;
                let children = (0..n)
                    .map(|_| self.expr(depth + 1))
                    .collect::<LibraryResult<Vec<_>>>()?;
                Ok(match tag {
                    EXPR_AND => Expr::And(children),
                    EXPR_OR => Expr::Or(children),
                    _ => Expr::Xor(children),
                })
            }
            _ => Err(malformed(format!("invalid expression tag {tag}"))),
        }
    }

    fn library(&mut self) -> LibraryResult<CellLibrary> {
        let name = self.string()?;
        let nb_cells = self.count(5)?;
        let mut builder = CellLibraryBuilder::new(&name);
        for _ in 0..nb_cells {
            let cell = self.cell()?;
            builder.add_cell(cell);
        }
        builder.build()
    }

    fn cell(&mut self) -> LibraryResult<Cell> {
        let name = self.string()?;
        let area = self.float()?;
        let nb_pins = self.count(2)?;
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        for _ in 0..nb_pins {
            let pin = self.string()?;
            match self.word()? {
                PIN_INPUT => inputs.push(pin),
                PIN_OUTPUT => outputs.push(pin),
                d => return Err(malformed(format!("invalid direction {d} for pin {pin}"))),
            }
        }
        let function = match self.word()? {
            FUNCTION_OPAQUE => CellFunction::Opaque,
            FUNCTION_LOGIC => CellFunction::Logic(self.expr(0)?),
            FUNCTION_SEQUENTIAL => {
                let kind = self.kind()?;
                let clock_sense = self.sense()?;
                let clear_sense = self.sense()?;
                let preset_sense = self.sense()?;
                let layout = self.layout()?;
                CellFunction::Sequential(SequentialInfo {
                    kind,
                    clock_sense,
                    clear_sense,
                    preset_sense,
                    layout,
                })
            }
            t => return Err(malformed(format!("invalid function tag {t} for cell {name}"))),
        };
        Ok(Cell::from_parts(name, area, inputs, outputs, function))
    }

    fn groups(&mut self, library: &CellLibrary) -> LibraryResult<Vec<FunctionGroup>> {
        let nb_groups = self.count(2)?;
        let mut ret = Vec::with_capacity(nb_groups);
        for _ in 0..nb_groups {
            let header = self.word()?;
            let nb_inputs = (header >> 1) as usize;
            if nb_inputs > crate::patgen::MAX_NPN_INPUTS {
                return Err(malformed(format!("function group with {nb_inputs} inputs")));
            }
            let inputs = (0..nb_inputs)
                .map(|_| -> LibraryResult<(usize, bool)> {
                    let w = self.word()?;
                    Ok(((w >> 1) as usize, w & 1 != 0))
                })
                .collect::<LibraryResult<Vec<_>>>()?;
            let map = NpnMap::new(inputs, header & 1 != 0);
            if !map.is_valid() {
                return Err(malformed("invalid input permutation".to_string()));
            }
            let cells = self.indices(library.nb_cells(), "cell")?;
            for c in &cells {
                let cell = library.cell(*c);
                if cell.logic().is_none() || cell.nb_inputs() != nb_inputs {
                    return Err(malformed(format!(
                        "cell {} does not implement a {nb_inputs}-input function",
                        cell.name()
                    )));
                }
            }
            ret.push(FunctionGroup {
                map,
                cells,
                rep: usize::MAX,
            });
        }
        Ok(ret)
    }

    fn arena(&mut self) -> LibraryResult<PatternArena> {
        let nb_inputs = self.word()? as usize;
        let nb_nodes = self.count(3)?;
        if nb_inputs > nb_nodes {
            return Err(malformed("pattern arena has fewer nodes than inputs".to_string()));
        }
        let mut nodes = Vec::with_capacity(nb_nodes);
        for i in 0..nb_nodes {
            let kind = self.word()?;
            let a = self.word()?;
            let b = self.word()?;
            let node = match kind {
                NODE_INPUT if i < nb_inputs && a as usize == i => PatternNode::Input(a),
                NODE_AND | NODE_XOR if i >= nb_inputs => {
                    let (a, b) = (PatternEdge::from_raw(a), PatternEdge::from_raw(b));
                    if a.node as usize >= i || b.node as usize >= i {
                        return Err(malformed(format!("pattern node {i} is not topologically sorted")));
                    }
                    if kind == NODE_AND {
                        PatternNode::And([a, b])
                    } else if a.inv || b.inv {
                        return Err(malformed(format!("pattern Xor node {i} has inverted edges")));
                    } else {
                        PatternNode::Xor([a, b])
                    }
                }
                _ => return Err(malformed(format!("invalid pattern node {i}"))),
            };
            nodes.push(node);
        }
        Ok(PatternArena::from_nodes(nb_inputs, nodes))
    }

    fn classes(
        &mut self,
        groups: &mut [FunctionGroup],
        arena: &PatternArena,
    ) -> LibraryResult<(Vec<RepresentativeClass>, Vec<PatternGraph>)> {
        let nb_classes = self.count(2)?;
        let mut classes = Vec::with_capacity(nb_classes);
        let mut patterns = Vec::new();
        for rep in 0..nb_classes {
            let class_groups = self.indices(groups.len(), "function group")?;
            for g in &class_groups {
                if groups[*g].rep != usize::MAX {
                    return Err(malformed(format!("function group {g} is in two classes")));
                }
                groups[*g].rep = rep;
            }
            let nb_patterns = self.count(3)?;
            let mut class_patterns = Vec::with_capacity(nb_patterns);
            for _ in 0..nb_patterns {
                let header = self.word()?;
                let node = self.index(arena.nb_nodes(), "pattern node")?;
                let root = PatternEdge::new(node as u32, header & 1 != 0);
                let nb_edges = self.count(1)?;
                let edges = (0..nb_edges)
                    .map(|_| self.word())
                    .collect::<LibraryResult<Vec<u32>>>()?;
                let input_count = (header >> 1) as usize;
                if edges != arena.edge_stream(root) || input_count != arena.input_count(root) {
                    return Err(malformed(format!(
                        "pattern {} does not match the node arena",
                        patterns.len()
                    )));
                }
                if let Some(g) = class_groups
                    .iter()
                    .find(|g| groups[**g].map.nb_inputs() != input_count)
                {
                    return Err(malformed(format!(
                        "function group {g} has {} inputs, but pattern {} of its class has {input_count}",
                        groups[*g].map.nb_inputs(),
                        patterns.len()
                    )));
                }
                class_patterns.push(patterns.len());
                patterns.push(PatternGraph {
                    root,
                    input_count,
                    edges,
                    rep,
                });
            }
            classes.push(RepresentativeClass {
                groups: class_groups,
                patterns: class_patterns,
            });
        }
        if let Some(g) = groups.iter().position(|g| g.rep == usize::MAX) {
            return Err(malformed(format!("function group {g} has no class")));
        }
        Ok((classes, patterns))
    }

    fn sequential(
        &mut self,
        library: &CellLibrary,
    ) -> LibraryResult<(Vec<SequentialGroup>, Vec<SequentialClass>)> {
        let nb_groups = self.count(7)?;
        let mut groups = Vec::with_capacity(nb_groups);
        for _ in 0..nb_groups {
            let layout = self.layout()?;
            let cells = self.indices(library.nb_cells(), "cell")?;
            for c in &cells {
                if library.cell(*c).sequential().map(|s| s.layout) != Some(layout) {
                    return Err(malformed(format!(
                        "cell {} does not have the layout of its sequential group",
                        library.cell(*c).name()
                    )));
                }
            }
            groups.push(SequentialGroup { layout, cells });
        }
        let nb_classes = self.count(5)?;
        let mut classes = Vec::with_capacity(nb_classes);
        for _ in 0..nb_classes {
            let kind = self.kind()?;
            let clock_sense = self.sense()?;
            let clear_sense = self.sense()?;
            let preset_sense = self.sense()?;
            let groups = self.indices(groups.len(), "sequential group")?;
            classes.push(SequentialClass {
                kind,
                clock_sense,
                clear_sense,
                preset_sense,
                groups,
            });
        }
        Ok((groups, classes))
    }
}
