//! Pattern database: the frozen result of pattern generation over a cell library

use fxhash::FxHashSet;
use log::{debug, info, warn};

use crate::library::{Cell, CellFunction, CellLibrary, PinLayout, SequentialInfo, Sense};
use crate::network::RegisterKind;
use crate::patgen::canon::FunctionCanonicalizer;
use crate::patgen::generator::PatternGenerator;
use crate::patgen::npn::{NpnMap, MAX_NPN_INPUTS};
use crate::patgen::pattern::{PatternArena, PatternEdge, PatternGraph};
use crate::Expr;

/// A Boolean function with the library cells implementing it
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionGroup {
    pub(crate) map: NpnMap,
    pub(crate) cells: Vec<usize>,
    pub(crate) rep: usize,
}

impl FunctionGroup {
    /// Map from the function to its representative
    pub fn map(&self) -> &NpnMap {
        &self.map
    }

    /// Cells implementing the function, with pins in the function's variable order
    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    /// Representative class
    pub fn rep(&self) -> usize {
        self.rep
    }
}

/// NPN equivalence class: its functions and the patterns of its canonical function
#[derive(Debug, Clone, PartialEq)]
pub struct RepresentativeClass {
    pub(crate) groups: Vec<usize>,
    pub(crate) patterns: Vec<usize>,
}

impl RepresentativeClass {
    /// Function groups of the class
    pub fn groups(&self) -> &[usize] {
        &self.groups
    }

    /// Patterns of the class
    pub fn patterns(&self) -> &[usize] {
        &self.patterns
    }
}

/// Sequential cells sharing the same pin layout
#[derive(Debug, Clone, PartialEq)]
pub struct SequentialGroup {
    pub(crate) layout: PinLayout,
    pub(crate) cells: Vec<usize>,
}

impl SequentialGroup {
    /// Pin positions
    pub fn layout(&self) -> &PinLayout {
        &self.layout
    }

    /// Member cells
    pub fn cells(&self) -> &[usize] {
        &self.cells
    }
}

/// Sequential cells sharing the same kind and control sensitivities
#[derive(Debug, Clone, PartialEq)]
pub struct SequentialClass {
    pub(crate) kind: RegisterKind,
    pub(crate) clock_sense: Sense,
    pub(crate) clear_sense: Sense,
    pub(crate) preset_sense: Sense,
    pub(crate) groups: Vec<usize>,
}

impl SequentialClass {
    /// Flip-flop or latch
    pub fn kind(&self) -> RegisterKind {
        self.kind
    }

    /// Clock edge or enable level
    pub fn clock_sense(&self) -> Sense {
        self.clock_sense
    }

    /// Clear level, or none
    pub fn clear_sense(&self) -> Sense {
        self.clear_sense
    }

    /// Preset level, or none
    pub fn preset_sense(&self) -> Sense {
        self.preset_sense
    }

    /// Member groups
    pub fn groups(&self) -> &[usize] {
        &self.groups
    }

    fn matches(&self, info: &SequentialInfo) -> bool {
        self.kind == info.kind
            && self.clock_sense == info.clock_sense
            && self.clear_sense == info.clear_sense
            && self.preset_sense == info.preset_sense
    }
}

/// Immutable database of functions, patterns and sequential classes for a library
#[derive(Debug, Clone, PartialEq)]
pub struct PatternDatabase {
    pub(crate) groups: Vec<FunctionGroup>,
    pub(crate) classes: Vec<RepresentativeClass>,
    pub(crate) arena: PatternArena,
    pub(crate) patterns: Vec<PatternGraph>,
    pub(crate) seq_groups: Vec<SequentialGroup>,
    pub(crate) seq_classes: Vec<SequentialClass>,
}

impl PatternDatabase {
    /// Number of function groups
    pub fn nb_groups(&self) -> usize {
        self.groups.len()
    }

    /// Get the function group at index i
    pub fn group(&self, i: usize) -> &FunctionGroup {
        &self.groups[i]
    }

    /// Number of representative classes
    pub fn nb_classes(&self) -> usize {
        self.classes.len()
    }

    /// Get the representative class at index i
    pub fn class(&self, i: usize) -> &RepresentativeClass {
        &self.classes[i]
    }

    /// Number of patterns
    pub fn nb_patterns(&self) -> usize {
        self.patterns.len()
    }

    /// Get the pattern at index i
    pub fn pattern(&self, i: usize) -> &PatternGraph {
        &self.patterns[i]
    }

    /// All patterns, in enumeration order
    pub fn patterns(&self) -> &[PatternGraph] {
        &self.patterns
    }

    /// Shared pattern nodes
    pub fn arena(&self) -> &PatternArena {
        &self.arena
    }

    /// Number of sequential classes
    pub fn nb_seq_classes(&self) -> usize {
        self.seq_classes.len()
    }

    /// Get the sequential class at index i
    pub fn seq_class(&self, i: usize) -> &SequentialClass {
        &self.seq_classes[i]
    }

    /// Number of sequential groups
    pub fn nb_seq_groups(&self) -> usize {
        self.seq_groups.len()
    }

    /// Get the sequential group at index i
    pub fn seq_group(&self, i: usize) -> &SequentialGroup {
        &self.seq_groups[i]
    }

    /// Largest number of inputs of a pattern
    pub fn max_pattern_inputs(&self) -> usize {
        self.patterns
            .iter()
            .map(|p| p.input_count())
            .max()
            .unwrap_or(0)
    }
}

/// Offline construction of a [`PatternDatabase`]
///
/// ```
/// # use cellmap::library::generic_library;
/// # use cellmap::PatternDatabaseBuilder;
/// let library = generic_library();
/// let mut builder = PatternDatabaseBuilder::new();
/// builder.add_library(&library);
/// let db = builder.freeze();
/// assert!(db.nb_patterns() > 0);
/// ```
#[derive(Debug, Clone)]
pub struct PatternDatabaseBuilder {
    canon: FunctionCanonicalizer,
    generator: PatternGenerator,
    group_cells: Vec<Vec<usize>>,
    rep_signatures: Vec<FxHashSet<String>>,
    patterns: Vec<(usize, PatternEdge)>,
    seq_groups: Vec<SequentialGroup>,
    seq_classes: Vec<SequentialClass>,
}

impl PatternDatabaseBuilder {
    /// Create a builder, with the plain Xor pattern registered
    pub fn new() -> Self {
        let mut ret = PatternDatabaseBuilder {
            canon: FunctionCanonicalizer::new(),
            generator: PatternGenerator::new(MAX_NPN_INPUTS),
            group_cells: Vec::new(),
            rep_signatures: Vec::new(),
            patterns: Vec::new(),
            seq_groups: Vec::new(),
            seq_classes: Vec::new(),
        };
        // Xor subject nodes may then be covered by cells written as sums of products
        let xor = Expr::xor(vec![Expr::var(0), Expr::var(1)]);
        let fid = ret.register_function(&xor, 2);
        ret.add_patterns(fid, &xor);
        ret
    }

    /// Add all cells of a library
    pub fn add_library(&mut self, library: &CellLibrary) {
        for (i, c) in library.cells().iter().enumerate() {
            self.add_cell(i, c);
        }
    }

    /// Add a cell; returns whether the mapper can use it
    pub fn add_cell(&mut self, id: usize, cell: &Cell) -> bool {
        match cell.function() {
            CellFunction::Logic(expr) => self.add_logic_cell(id, cell, expr),
            CellFunction::Sequential(info) => {
                self.add_sequential_cell(id, info);
                true
            }
            CellFunction::Opaque => {
                warn!("Cell {} has no usable function and is skipped", cell.name());
                false
            }
        }
    }

    fn add_logic_cell(&mut self, id: usize, cell: &Cell, expr: &Expr) -> bool {
        let n = cell.nb_inputs();
        if n > MAX_NPN_INPUTS {
            warn!(
                "Cell {} has {} inputs, more than the {} supported, and is skipped",
                cell.name(),
                n,
                MAX_NPN_INPUTS
            );
            return false;
        }
        if expr.support(n).iter().any(|used| !used) {
            warn!(
                "Function of cell {} does not depend on all its inputs; the cell is skipped",
                cell.name()
            );
            return false;
        }
        let fid = self.register_function(expr, n);
        self.group_cells[fid].push(id);
        if n >= 2 {
            let count = self.add_patterns(fid, expr);
            debug!("Cell {}: {} new patterns", cell.name(), count);
        }
        true
    }

    fn register_function(&mut self, expr: &Expr, nb_vars: usize) -> usize {
        let fid = self.canon.canonicalize(&expr.to_lut(nb_vars));
        while self.group_cells.len() < self.canon.nb_functions() {
            self.group_cells.push(Vec::new());
        }
        while self.rep_signatures.len() < self.canon.nb_reps() {
            self.rep_signatures.push(FxHashSet::default());
        }
        fid
    }

    /// Generate the patterns of a function, rewritten in the variables of its representative
    fn add_patterns(&mut self, fid: usize, expr: &Expr) -> usize {
        let map = self.canon.map(fid);
        let renaming: Vec<(u32, bool)> = (0..map.nb_inputs())
            .map(|i| {
                let (pos, inv) = map.input(i);
                (pos as u32, inv)
            })
            .collect();
        let mut rep_expr = expr.remap(&renaming);
        if map.output_inv() {
            rep_expr = !rep_expr;
        }
        if !self.generator.supports(&rep_expr) {
            warn!("Expression {expr} cannot be expanded into patterns");
            return 0;
        }
        let rep = self.canon.rep(fid);
        let mut count = 0;
        for p in self.generator.generate(&rep_expr) {
            if self.rep_signatures[rep].insert(self.generator.arena().signature(p)) {
                self.patterns.push((rep, p));
                count += 1;
            }
        }
        count
    }

    fn add_sequential_cell(&mut self, id: usize, info: &SequentialInfo) {
        let class = match self.seq_classes.iter().position(|c| c.matches(info)) {
            Some(c) => c,
            None => {
                self.seq_classes.push(SequentialClass {
                    kind: info.kind,
                    clock_sense: info.clock_sense,
                    clear_sense: info.clear_sense,
                    preset_sense: info.preset_sense,
                    groups: Vec::new(),
                });
                self.seq_classes.len() - 1
            }
        };
        let existing = self.seq_classes[class]
            .groups
            .iter()
            .copied()
            .find(|g| self.seq_groups[*g].layout == info.layout);
        let group = match existing {
            Some(g) => g,
            None => {
                self.seq_groups.push(SequentialGroup {
                    layout: info.layout,
                    cells: Vec::new(),
                });
                let g = self.seq_groups.len() - 1;
                self.seq_classes[class].groups.push(g);
                g
            }
        };
        self.seq_groups[group].cells.push(id);
    }

    /// Freeze the database; unused pattern nodes are removed
    pub fn freeze(self) -> PatternDatabase {
        let roots: Vec<PatternEdge> = self.patterns.iter().map(|(_, p)| *p).collect();
        let (arena, roots) = self.generator.arena().compact(&roots);
        let mut classes: Vec<RepresentativeClass> = (0..self.canon.nb_reps())
            .map(|r| RepresentativeClass {
                groups: self.canon.rep_groups(r).to_vec(),
                patterns: Vec::new(),
            })
            .collect();
        let mut patterns = Vec::new();
        for ((rep, _), root) in self.patterns.iter().zip(roots) {
            classes[*rep].patterns.push(patterns.len());
            patterns.push(PatternGraph {
                root,
                input_count: arena.input_count(root),
                edges: arena.edge_stream(root),
                rep: *rep,
            });
        }
        let groups = (0..self.canon.nb_functions())
            .map(|f| FunctionGroup {
                map: self.canon.map(f).clone(),
                cells: self.group_cells[f].clone(),
                rep: self.canon.rep(f),
            })
            .collect::<Vec<_>>();
        info!(
            "Pattern database: {} functions, {} classes, {} patterns, {} pattern nodes, {} sequential classes",
            groups.len(),
            classes.len(),
            patterns.len(),
            arena.nb_nodes(),
            self.seq_classes.len()
        );
        PatternDatabase {
            groups,
            classes,
            arena,
            patterns,
            seq_groups: self.seq_groups,
            seq_classes: self.seq_classes,
        }
    }
}

impl Default for PatternDatabaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}
