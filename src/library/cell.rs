use std::fmt;

use crate::error::LibraryError;
use crate::network::RegisterKind;
use crate::Expr;

/// Sensitivity of a clock or control pin
///
/// For a flip-flop clock, positive is the rising edge and negative the falling edge.
/// For a latch enable, a clear or a preset, positive is active-high and negative active-low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sense {
    /// The pin does not exist
    None,
    /// Rising edge or active-high
    Positive,
    /// Falling edge or active-low
    Negative,
}

impl Sense {
    /// Sense required by a subject signal: inverted signals require a negative sense
    pub fn of_inversion(inverted: bool) -> Sense {
        if inverted {
            Sense::Negative
        } else {
            Sense::Positive
        }
    }

    /// Returns whether the pin is negative (falling edge or active-low)
    pub fn is_negative(self) -> bool {
        self == Sense::Negative
    }

    /// Returns whether the pin exists
    pub fn is_some(self) -> bool {
        self != Sense::None
    }

    /// Code used in the serialized format
    pub fn code(self) -> u32 {
        match self {
            Sense::None => 0,
            Sense::Positive => 1,
            Sense::Negative => 2,
        }
    }

    /// Decode the serialized format
    pub fn from_code(code: u32) -> Option<Sense> {
        match code {
            0 => Some(Sense::None),
            1 => Some(Sense::Positive),
            2 => Some(Sense::Negative),
            _ => None,
        }
    }
}

/// Positions of the pins of a sequential cell
///
/// Data, clock, clear and preset are indices among the input pins; Q and !Q are indices
/// among the output pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinLayout {
    /// Data input
    pub data: usize,
    /// Clock or enable input
    pub clock: usize,
    /// Asynchronous clear input
    pub clear: Option<usize>,
    /// Asynchronous preset input
    pub preset: Option<usize>,
    /// Non-inverted output
    pub q: usize,
    /// Inverted output
    pub iq: Option<usize>,
}

/// Description of a flip-flop or latch cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SequentialInfo {
    /// Flip-flop or latch
    pub kind: RegisterKind,
    /// Clock edge or enable level
    pub clock_sense: Sense,
    /// Clear level, or none
    pub clear_sense: Sense,
    /// Preset level, or none
    pub preset_sense: Sense,
    /// Pin positions
    pub layout: PinLayout,
}

/// Behaviour of a library cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellFunction {
    /// Single-output combinatorial cell
    Logic(Expr),
    /// Flip-flop or latch
    Sequential(SequentialInfo),
    /// Any other cell; never used by the mapper
    Opaque,
}

/// A library cell
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    name: String,
    area: f64,
    inputs: Vec<String>,
    outputs: Vec<String>,
    function: CellFunction,
}

impl Cell {
    /// Create a cell
    pub fn new(
        name: &str,
        area: f64,
        inputs: &[&str],
        outputs: &[&str],
        function: CellFunction,
    ) -> Cell {
        Cell {
            name: name.to_string(),
            area,
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            function,
        }
    }

    pub(crate) fn from_parts(
        name: String,
        area: f64,
        inputs: Vec<String>,
        outputs: Vec<String>,
        function: CellFunction,
    ) -> Cell {
        Cell {
            name,
            area,
            inputs,
            outputs,
            function,
        }
    }

    /// Name of the cell
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Area of the cell
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Number of input pins
    pub fn nb_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Number of output pins
    pub fn nb_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Name of an input pin
    pub fn input_name(&self, i: usize) -> &str {
        &self.inputs[i]
    }

    /// Name of an output pin
    pub fn output_name(&self, i: usize) -> &str {
        &self.outputs[i]
    }

    /// Behaviour of the cell
    pub fn function(&self) -> &CellFunction {
        &self.function
    }

    /// Logic function of a combinatorial cell
    pub fn logic(&self) -> Option<&Expr> {
        match &self.function {
            CellFunction::Logic(e) => Some(e),
            _ => None,
        }
    }

    /// Description of a sequential cell
    pub fn sequential(&self) -> Option<&SequentialInfo> {
        match &self.function {
            CellFunction::Sequential(s) => Some(s),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if !self.area.is_finite() || self.area < 0.0 {
            return Err(format!("cell {} has invalid area {}", self.name, self.area));
        }
        match &self.function {
            CellFunction::Logic(e) => {
                if self.nb_outputs() != 1 {
                    return Err(format!(
                        "logic cell {} must have exactly one output",
                        self.name
                    ));
                }
                if e.nb_vars() > self.nb_inputs() {
                    return Err(format!(
                        "function of cell {} uses {} inputs but the cell has {}",
                        self.name,
                        e.nb_vars(),
                        self.nb_inputs()
                    ));
                }
            }
            CellFunction::Sequential(s) => {
                let l = &s.layout;
                let ins = [Some(l.data), Some(l.clock), l.clear, l.preset];
                let outs = [Some(l.q), l.iq];
                if ins.iter().flatten().any(|p| *p >= self.nb_inputs())
                    || outs.iter().flatten().any(|p| *p >= self.nb_outputs())
                {
                    return Err(format!("sequential cell {} has invalid pins", self.name));
                }
                if s.clock_sense == Sense::None
                    || l.clear.is_some() != s.clear_sense.is_some()
                    || l.preset.is_some() != s.preset_sense.is_some()
                {
                    return Err(format!(
                        "sequential cell {} has inconsistent senses",
                        self.name
                    ));
                }
            }
            CellFunction::Opaque => (),
        }
        Ok(())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (area {}) ({}) -> ({})",
            self.name,
            self.area,
            self.inputs.join(", "),
            self.outputs.join(", ")
        )?;
        match &self.function {
            CellFunction::Logic(e) => write!(f, ": {e}"),
            CellFunction::Sequential(s) => write!(
                f,
                ": {:?} clock={:?} clear={:?} preset={:?}",
                s.kind, s.clock_sense, s.clear_sense, s.preset_sense
            ),
            CellFunction::Opaque => Ok(()),
        }
    }
}

/// An immutable standard cell library
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellLibrary {
    name: String,
    cells: Vec<Cell>,
}

impl CellLibrary {
    /// Name of the library
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of cells
    pub fn nb_cells(&self) -> usize {
        self.cells.len()
    }

    /// Get the cell at index i
    pub fn cell(&self, i: usize) -> &Cell {
        &self.cells[i]
    }

    /// All cells, in index order
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Find a cell by name
    pub fn find(&self, name: &str) -> Option<usize> {
        self.cells.iter().position(|c| c.name() == name)
    }
}

/// Builder for a cell library
///
/// ```
/// # use cellmap::{CellLibraryBuilder, Expr};
/// let mut builder = CellLibraryBuilder::new("tiny");
/// let inv = builder.add_logic_cell("INV", 1.0, &["A"], "Y", Expr::not_var(0));
/// let lib = builder.build().unwrap();
/// assert_eq!(lib.cell(inv).name(), "INV");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CellLibraryBuilder {
    name: String,
    cells: Vec<Cell>,
}

impl CellLibraryBuilder {
    /// Start a new library
    pub fn new(name: &str) -> Self {
        CellLibraryBuilder {
            name: name.to_string(),
            cells: Vec::new(),
        }
    }

    /// Add a cell and return its index
    pub fn add_cell(&mut self, cell: Cell) -> usize {
        self.cells.push(cell);
        self.cells.len() - 1
    }

    /// Add a single-output combinatorial cell
    pub fn add_logic_cell(
        &mut self,
        name: &str,
        area: f64,
        inputs: &[&str],
        output: &str,
        function: Expr,
    ) -> usize {
        self.add_cell(Cell::new(
            name,
            area,
            inputs,
            &[output],
            CellFunction::Logic(function),
        ))
    }

    /// Add a flip-flop or latch
    pub fn add_sequential_cell(
        &mut self,
        name: &str,
        area: f64,
        inputs: &[&str],
        outputs: &[&str],
        info: SequentialInfo,
    ) -> usize {
        self.add_cell(Cell::new(
            name,
            area,
            inputs,
            outputs,
            CellFunction::Sequential(info),
        ))
    }

    /// Check the cells and freeze the library
    pub fn build(self) -> Result<CellLibrary, LibraryError> {
        for c in &self.cells {
            c.validate().map_err(LibraryError::Malformed)?;
        }
        Ok(CellLibrary {
            name: self.name,
            cells: self.cells,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dff_info() -> SequentialInfo {
        SequentialInfo {
            kind: RegisterKind::FlipFlop,
            clock_sense: Sense::Positive,
            clear_sense: Sense::None,
            preset_sense: Sense::None,
            layout: PinLayout {
                data: 0,
                clock: 1,
                clear: None,
                preset: None,
                q: 0,
                iq: Some(1),
            },
        }
    }

    #[test]
    fn test_build() {
        let mut b = CellLibraryBuilder::new("test");
        let and2 = b.add_logic_cell(
            "AND2",
            2.0,
            &["A", "B"],
            "Y",
            Expr::and(vec![Expr::var(0), Expr::var(1)]),
        );
        let dff = b.add_sequential_cell("DFF", 4.0, &["D", "CK"], &["Q", "QN"], dff_info());
        let lib = b.build().unwrap();
        assert_eq!(lib.nb_cells(), 2);
        assert_eq!(lib.cell(and2).nb_inputs(), 2);
        assert!(lib.cell(and2).logic().is_some());
        assert_eq!(lib.cell(dff).sequential().unwrap().layout.iq, Some(1));
        assert_eq!(lib.find("DFF"), Some(dff));
        assert_eq!(lib.find("NAND2"), None);
        assert_eq!(lib.cell(and2).to_string(), "AND2 (area 2) (A, B) -> (Y): A & B");
    }

    #[test]
    fn test_invalid_cells() {
        let mut b = CellLibraryBuilder::new("test");
        b.add_logic_cell("BAD", 1.0, &["A"], "Y", Expr::var(1));
        assert!(matches!(b.build(), Err(LibraryError::Malformed(_))));

        let mut info = dff_info();
        info.layout.clear = Some(5);
        let mut b = CellLibraryBuilder::new("test");
        b.add_sequential_cell("DFFR", 1.0, &["D", "CK"], &["Q"], info);
        assert!(b.build().is_err());

        let mut b = CellLibraryBuilder::new("test");
        b.add_logic_cell("NEG", -1.0, &["A"], "Y", Expr::var(0));
        assert!(b.build().is_err());
    }

    #[test]
    fn test_sense_codes() {
        for s in [Sense::None, Sense::Positive, Sense::Negative] {
            assert_eq!(Sense::from_code(s.code()), Some(s));
        }
        assert_eq!(Sense::from_code(3), None);
        assert!(Sense::of_inversion(true).is_negative());
    }
}
