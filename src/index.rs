//! Immutable view of a cell library and its pattern database, as used by the mapper

use std::fmt;
use std::path::Path;

use log::info;

use crate::error::LibraryResult;
use crate::io::{read_blob, write_blob};
use crate::library::{Cell, CellLibrary};
use crate::patgen::{
    FunctionGroup, PatternArena, PatternDatabase, PatternDatabaseBuilder, PatternGraph,
    RepresentativeClass, SequentialClass, SequentialGroup, BUFFER_GROUP, CONST0_GROUP,
    CONST1_GROUP, INVERTER_GROUP,
};

/// Densely indexed library for technology mapping
///
/// All cross-references are integer indices: cells, function groups, representative
/// classes, patterns, sequential classes and groups. The index is read-only once built,
/// and can be shared between mapping runs.
///
/// ```
/// # use cellmap::library::generic_library;
/// # use cellmap::LibraryIndex;
/// let index = LibraryIndex::build(generic_library());
/// let blob = index.to_bytes();
/// let loaded = LibraryIndex::load(&blob).unwrap();
/// assert_eq!(loaded.nb_patterns(), index.nb_patterns());
/// let inv = loaded.inverter_cell().unwrap();
/// assert_eq!(loaded.cell(inv).name(), "INV");
/// ```
#[derive(Debug, Clone)]
pub struct LibraryIndex {
    library: CellLibrary,
    db: PatternDatabase,
    cheapest: Vec<Option<usize>>,
    max_pattern_inputs: usize,
}

impl LibraryIndex {
    /// Create the index from a library and its frozen database
    pub fn new(library: CellLibrary, db: PatternDatabase) -> LibraryIndex {
        let cheapest = (0..db.nb_groups())
            .map(|g| cheapest_cell(&library, db.group(g).cells()))
            .collect();
        let max_pattern_inputs = db.max_pattern_inputs();
        LibraryIndex {
            library,
            db,
            cheapest,
            max_pattern_inputs,
        }
    }

    /// Generate the pattern database of a library and index it
    pub fn build(library: CellLibrary) -> LibraryIndex {
        let mut builder = PatternDatabaseBuilder::new();
        builder.add_library(&library);
        LibraryIndex::new(library, builder.freeze())
    }

    /// Load an index from a binary blob
    pub fn load(data: &[u8]) -> LibraryResult<LibraryIndex> {
        let (library, db) = read_blob(data)?;
        let ret = LibraryIndex::new(library, db);
        info!(
            "Loaded library {}: {} cells, {} patterns",
            ret.library.name(),
            ret.library.nb_cells(),
            ret.db.nb_patterns()
        );
        Ok(ret)
    }

    /// Load an index from a file
    pub fn load_file(path: &Path) -> LibraryResult<LibraryIndex> {
        let data = std::fs::read(path)?;
        LibraryIndex::load(&data)
    }

    /// Serialize the index to a binary blob
    pub fn to_bytes(&self) -> Vec<u8> {
        write_blob(&self.library, &self.db)
    }

    /// Serialize the index to a file
    pub fn save_file(&self, path: &Path) -> LibraryResult<()> {
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }

    /// Cell library
    pub fn library(&self) -> &CellLibrary {
        &self.library
    }

    /// Pattern database
    pub fn database(&self) -> &PatternDatabase {
        &self.db
    }

    /// Number of cells
    pub fn nb_cells(&self) -> usize {
        self.library.nb_cells()
    }

    /// Get the cell at index i
    pub fn cell(&self, i: usize) -> &Cell {
        self.library.cell(i)
    }

    /// Number of function groups
    pub fn nb_groups(&self) -> usize {
        self.db.nb_groups()
    }

    /// Get the function group at index i
    pub fn group(&self, i: usize) -> &FunctionGroup {
        self.db.group(i)
    }

    /// Number of representative classes
    pub fn nb_classes(&self) -> usize {
        self.db.nb_classes()
    }

    /// Get the representative class at index i
    pub fn class(&self, i: usize) -> &RepresentativeClass {
        self.db.class(i)
    }

    /// Number of patterns
    pub fn nb_patterns(&self) -> usize {
        self.db.nb_patterns()
    }

    /// Get the pattern at index i
    pub fn pattern(&self, i: usize) -> &PatternGraph {
        self.db.pattern(i)
    }

    /// Node arena of the patterns
    pub fn arena(&self) -> &PatternArena {
        self.db.arena()
    }

    /// Number of sequential classes
    pub fn nb_seq_classes(&self) -> usize {
        self.db.nb_seq_classes()
    }

    /// Get the sequential class at index i
    pub fn seq_class(&self, i: usize) -> &SequentialClass {
        self.db.seq_class(i)
    }

    /// Get the sequential group at index i
    pub fn seq_group(&self, i: usize) -> &SequentialGroup {
        self.db.seq_group(i)
    }

    /// Smallest cell of a function group
    pub fn cheapest_cell(&self, group: usize) -> Option<usize> {
        self.cheapest[group]
    }

    /// Smallest inverter
    pub fn inverter_cell(&self) -> Option<usize> {
        self.cheapest[INVERTER_GROUP]
    }

    /// Smallest buffer
    pub fn buffer_cell(&self) -> Option<usize> {
        self.cheapest[BUFFER_GROUP]
    }

    /// Smallest constant-zero cell
    pub fn const0_cell(&self) -> Option<usize> {
        self.cheapest[CONST0_GROUP]
    }

    /// Smallest constant-one cell
    pub fn const1_cell(&self) -> Option<usize> {
        self.cheapest[CONST1_GROUP]
    }

    /// Smallest constant cell for a value
    pub fn const_cell(&self, value: bool) -> Option<usize> {
        if value {
            self.const1_cell()
        } else {
            self.const0_cell()
        }
    }

    /// Largest number of inputs of a pattern
    pub fn max_pattern_inputs(&self) -> usize {
        self.max_pattern_inputs
    }
}

/// Smallest cell among candidates; the first one wins ties
fn cheapest_cell(library: &CellLibrary, cells: &[usize]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for c in cells {
        match best {
            Some(b) if library.cell(b).area() <= library.cell(*c).area() => (),
            _ => best = Some(*c),
        }
    }
    best
}

impl fmt::Display for LibraryIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Library {} with {} cells, {} functions, {} classes, {} patterns:",
            self.library.name(),
            self.nb_cells(),
            self.nb_groups(),
            self.nb_classes(),
            self.nb_patterns()
        )?;
        for c in self.library.cells() {
            writeln!(f, "\t{c}")?;
        }
        writeln!(f, "Functions:")?;
        for g in 0..self.nb_groups() {
            let group = self.group(g);
            let map = group.map();
            let inputs: Vec<String> = (0..map.nb_inputs())
                .map(|i| {
                    let (pos, inv) = map.input(i);
                    format!("{}{}", if inv { "!" } else { "" }, pos)
                })
                .collect();
            let cells: Vec<&str> = group
                .cells()
                .iter()
                .map(|c| self.cell(*c).name())
                .collect();
            writeln!(
                f,
                "\tf{g}: class {} map ({}){} cells [{}]",
                group.rep(),
                inputs.join(", "),
                if map.output_inv() { " inverted" } else { "" },
                cells.join(", ")
            )?;
        }
        writeln!(f, "Classes:")?;
        for r in 0..self.nb_classes() {
            let class = self.class(r);
            writeln!(
                f,
                "\tclass {r}: functions {:?}, {} patterns",
                class.groups(),
                class.patterns().len()
            )?;
            for p in class.patterns() {
                let pattern = self.pattern(*p);
                writeln!(
                    f,
                    "\t\tp{p}: {}",
                    self.arena().signature(pattern.root())
                )?;
            }
        }
        writeln!(f, "Sequential classes:")?;
        for s in 0..self.nb_seq_classes() {
            let class = self.seq_class(s);
            write!(
                f,
                "\t{:?} clock={:?} clear={:?} preset={:?}:",
                class.kind(),
                class.clock_sense(),
                class.clear_sense(),
                class.preset_sense()
            )?;
            for g in class.groups() {
                let cells: Vec<&str> = self
                    .seq_group(*g)
                    .cells()
                    .iter()
                    .map(|c| self.cell(*c).name())
                    .collect();
                write!(f, " [{}]", cells.join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{generic_library, CellLibraryBuilder};
    use crate::Expr;

    #[test]
    fn test_caches() {
        let mut b = CellLibraryBuilder::new("caches");
        b.add_logic_cell("INV_X2", 2.0, &["A"], "Y", Expr::not_var(0));
        let inv1 = b.add_logic_cell("INV_X1", 1.0, &["A"], "Y", Expr::not_var(0));
        b.add_logic_cell("INV_X1B", 1.0, &["A"], "Y", Expr::not_var(0));
        b.add_logic_cell(
            "AND2",
            2.0,
            &["A", "B"],
            "Y",
            Expr::and(vec![Expr::var(0), Expr::var(1)]),
        );
        let index = LibraryIndex::build(b.build().unwrap());
        assert_eq!(index.inverter_cell(), Some(inv1));
        assert_eq!(index.buffer_cell(), None);
        assert_eq!(index.const_cell(false), None);
        assert_eq!(index.max_pattern_inputs(), 2);
    }

    #[test]
    fn test_load() {
        let index = LibraryIndex::build(generic_library());
        let loaded = LibraryIndex::load(&index.to_bytes()).unwrap();
        assert_eq!(loaded.database(), index.database());
        assert_eq!(loaded.const0_cell(), index.library().find("TIELO"));
        assert_eq!(loaded.const1_cell(), index.library().find("TIEHI"));
        assert_eq!(loaded.max_pattern_inputs(), 4);
        assert!(LibraryIndex::load(&index.to_bytes()[..100]).is_err());
    }

    #[test]
    fn test_files() {
        let index = LibraryIndex::build(generic_library());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generic.lib.bin");
        index.save_file(&path).unwrap();
        let loaded = LibraryIndex::load_file(&path).unwrap();
        assert_eq!(loaded.nb_patterns(), index.nb_patterns());
        assert!(LibraryIndex::load_file(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_display() {
        let index = LibraryIndex::build(generic_library());
        let s = index.to_string();
        assert!(s.starts_with("Library generic"));
        assert!(s.contains("NAND2"));
        assert!(s.contains("^(0,1)"));
        assert!(s.contains("FlipFlop clock=Positive clear=None preset=None: [DFF]"));
    }
}
