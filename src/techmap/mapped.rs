//! Mapped network: instances of library cells connected by nets

use std::fmt;

use fxhash::FxHashMap;

use crate::library::CellLibrary;

/// Node of a mapped network
///
/// Each node drives one net. A cell node drives the net of its first output pin; the
/// other output pins of a multi-output cell are represented by `Tap` nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappedNode {
    /// Primary input
    Input(usize),
    /// Primary output, with its driver
    Output {
        /// Index of the output
        index: usize,
        /// Driver node
        fanin: usize,
    },
    /// Cell instance, with the driver of each input pin
    Cell {
        /// Cell in the library
        cell: usize,
        /// Driver node of each input pin
        fanins: Vec<usize>,
    },
    /// Secondary output pin of a cell instance
    Tap {
        /// Cell node
        node: usize,
        /// Output pin of the cell
        pin: usize,
    },
}

/// Named group of primary input and output nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedPort {
    /// Name of the port
    pub name: String,
    /// Input or output nodes of the port
    pub bits: Vec<usize>,
}

/// Network of library cell instances
///
/// Nodes are stored in creation order. Combinatorial cells are always created after their
/// drivers; sequential cells are created first and connected at the end, so a sequential
/// cell may have fanins with a larger index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedNetwork {
    nodes: Vec<MappedNode>,
    inputs: Vec<usize>,
    outputs: Vec<usize>,
    input_names: Vec<String>,
    output_names: Vec<String>,
    ports: Vec<MappedPort>,
    registers: Vec<usize>,
}

/// Statistics of a mapped network
#[derive(Debug, Clone, PartialEq)]
pub struct MappedStats {
    /// Number of primary inputs
    pub nb_inputs: usize,
    /// Number of primary outputs
    pub nb_outputs: usize,
    /// Number of cell instances
    pub nb_cells: usize,
    /// Number of sequential cell instances
    pub nb_registers: usize,
    /// Total area
    pub area: f64,
    /// Number of instances of each cell, by name
    pub cell_counts: Vec<(String, usize)>,
}

impl MappedNetwork {
    /// Create an empty network
    pub fn new() -> MappedNetwork {
        MappedNetwork::default()
    }

    /// Number of nodes
    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Get the node at index i
    pub fn node(&self, i: usize) -> &MappedNode {
        &self.nodes[i]
    }

    /// Number of primary inputs
    pub fn nb_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Number of primary outputs
    pub fn nb_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Node of primary input i
    pub fn input(&self, i: usize) -> usize {
        self.inputs[i]
    }

    /// Node of primary output i
    pub fn output(&self, i: usize) -> usize {
        self.outputs[i]
    }

    /// Name of primary input i
    pub fn input_name(&self, i: usize) -> &str {
        &self.input_names[i]
    }

    /// Name of primary output i
    pub fn output_name(&self, i: usize) -> &str {
        &self.output_names[i]
    }

    /// Ports of the network
    pub fn ports(&self) -> &[MappedPort] {
        &self.ports
    }

    /// Sequential cell nodes, in the order of the registers they implement
    pub fn registers(&self) -> &[usize] {
        &self.registers
    }

    /// Driver of primary output i
    pub fn output_driver(&self, i: usize) -> usize {
        match self.nodes[self.outputs[i]] {
            MappedNode::Output { fanin, .. } => fanin,
            _ => unreachable!(),
        }
    }

    /// Add a primary input
    pub fn new_input(&mut self, name: &str) -> usize {
        let id = self.nodes.len();
        self.nodes.push(MappedNode::Input(self.inputs.len()));
        self.inputs.push(id);
        self.input_names.push(name.to_string());
        id
    }

    /// Add a primary output driven by a node
    pub fn new_output(&mut self, name: &str, fanin: usize) -> usize {
        assert!(fanin < self.nodes.len());
        let id = self.nodes.len();
        self.nodes.push(MappedNode::Output {
            index: self.outputs.len(),
            fanin,
        });
        self.outputs.push(id);
        self.output_names.push(name.to_string());
        id
    }

    /// Add a cell instance
    pub fn new_cell_node(&mut self, cell: usize, fanins: Vec<usize>) -> usize {
        let id = self.nodes.len();
        self.nodes.push(MappedNode::Cell { cell, fanins });
        id
    }

    /// Add a sequential cell instance, whose pins are connected later
    pub fn new_register_node(&mut self, cell: usize, nb_pins: usize) -> usize {
        let id = self.new_cell_node(cell, vec![usize::MAX; nb_pins]);
        self.registers.push(id);
        id
    }

    /// Obtain the node driving an output pin of a cell instance
    pub fn new_tap(&mut self, node: usize, pin: usize) -> usize {
        assert!(matches!(self.nodes[node], MappedNode::Cell { .. }));
        if pin == 0 {
            return node;
        }
        let id = self.nodes.len();
        self.nodes.push(MappedNode::Tap { node, pin });
        id
    }

    /// Connect an input pin of a cell instance
    pub fn set_fanin(&mut self, node: usize, pin: usize, driver: usize) {
        assert!(driver < self.nodes.len());
        match &mut self.nodes[node] {
            MappedNode::Cell { fanins, .. } => fanins[pin] = driver,
            n => panic!("Node {node} is not a cell: {n:?}"),
        }
    }

    /// Add a named port made of input and output nodes
    pub fn add_port(&mut self, name: &str, bits: Vec<usize>) {
        for b in &bits {
            assert!(matches!(
                self.nodes[*b],
                MappedNode::Input(_) | MappedNode::Output { .. }
            ));
        }
        self.ports.push(MappedPort {
            name: name.to_string(),
            bits,
        });
    }

    /// Total area of the cell instances
    pub fn area(&self, library: &CellLibrary) -> f64 {
        self.cells().map(|(_, c)| library.cell(c).area()).sum()
    }

    /// Cell instances, as (node, cell) pairs
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.nodes.iter().enumerate().filter_map(|(i, n)| match n {
            MappedNode::Cell { cell, .. } => Some((i, *cell)),
            _ => None,
        })
    }

    /// Check consistency of the datastructure
    pub fn check(&self, library: &CellLibrary) {
        for (i, n) in self.nodes.iter().enumerate() {
            match n {
                MappedNode::Input(k) => assert_eq!(self.inputs[*k], i),
                MappedNode::Output { index, fanin } => {
                    assert_eq!(self.outputs[*index], i);
                    assert!(*fanin < i);
                }
                MappedNode::Cell { cell, fanins } => {
                    let c = library.cell(*cell);
                    assert_eq!(fanins.len(), c.nb_inputs(), "Wrong pin count for {}", c.name());
                    for f in fanins {
                        assert!(*f < self.nodes.len(), "Unconnected pin on {}", c.name());
                        assert!(
                            !matches!(self.nodes[*f], MappedNode::Output { .. }),
                            "Cell {} is driven by an output",
                            c.name()
                        );
                        if c.sequential().is_none() {
                            assert!(*f < i, "Cell {} is not topologically sorted", c.name());
                        }
                    }
                }
                MappedNode::Tap { node, pin } => match &self.nodes[*node] {
                    MappedNode::Cell { cell, .. } => {
                        assert!(*pin < library.cell(*cell).nb_outputs())
                    }
                    _ => panic!("Tap {i} is not connected to a cell"),
                },
            }
        }
    }

    /// Compute statistics
    pub fn stats(&self, library: &CellLibrary) -> MappedStats {
        let mut counts: FxHashMap<usize, usize> = FxHashMap::default();
        for (_, c) in self.cells() {
            *counts.entry(c).or_default() += 1;
        }
        let mut cell_counts: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(c, n)| (library.cell(c).name().to_string(), n))
            .collect();
        cell_counts.sort();
        MappedStats {
            nb_inputs: self.nb_inputs(),
            nb_outputs: self.nb_outputs(),
            nb_cells: self.cells().count(),
            nb_registers: self.registers.len(),
            area: self.area(library),
            cell_counts,
        }
    }
}

impl fmt::Display for MappedStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stats:")?;
        writeln!(f, "  Inputs: {}", self.nb_inputs)?;
        writeln!(f, "  Outputs: {}", self.nb_outputs)?;
        writeln!(f, "  Cells: {}", self.nb_cells)?;
        writeln!(f, "  Registers: {}", self.nb_registers)?;
        writeln!(f, "  Area: {}", self.area)?;
        for (name, n) in &self.cell_counts {
            writeln!(f, "    {name}: {n}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::generic_library;

    #[test]
    fn test_build() {
        let lib = generic_library();
        let nand2 = lib.find("NAND2").unwrap();
        let dff = lib.find("DFF").unwrap();
        let mut m = MappedNetwork::new();
        let a = m.new_input("a");
        let b = m.new_input("b");
        let r = m.new_register_node(dff, 2);
        let qn = m.new_tap(r, 1);
        assert_eq!(m.new_tap(r, 0), r);
        let n = m.new_cell_node(nand2, vec![a, qn]);
        m.set_fanin(r, 0, n);
        m.set_fanin(r, 1, b);
        let o = m.new_output("y", n);
        m.add_port("a", vec![a]);
        m.add_port("y", vec![o]);
        m.check(&lib);
        assert_eq!(m.output_driver(0), n);
        assert_eq!(m.registers(), &[r]);
        let stats = m.stats(&lib);
        assert_eq!(stats.nb_cells, 2);
        assert_eq!(stats.area, 6.5);
        assert_eq!(
            stats.cell_counts,
            vec![("DFF".to_string(), 1), ("NAND2".to_string(), 1)]
        );
    }
}
