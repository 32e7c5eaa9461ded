use crate::library::{CellFunction, CellLibrary, Sense, SequentialInfo};
use crate::techmap::{MappedNetwork, MappedNode};

use super::simple_sim::next_state;

/// Structure for simulation of a network of library cells
///
/// Nodes are evaluated in order. Sequential cells are sources for the combinatorial
/// logic: their outputs only depend on their state.
pub struct MappedSimulator<'a> {
    network: &'a MappedNetwork,
    library: &'a CellLibrary,
    input_values: Vec<u64>,
    node_values: Vec<u64>,
    /// State of each sequential cell node
    states: Vec<u64>,
}

/// Apply the sensitivity of a pin: the result is all ones where the pin is active
fn active(sense: Sense, value: u64) -> u64 {
    match sense {
        Sense::None => 0,
        Sense::Positive => value,
        Sense::Negative => !value,
    }
}

impl<'a> MappedSimulator<'a> {
    pub fn new(network: &'a MappedNetwork, library: &'a CellLibrary) -> MappedSimulator<'a> {
        network.check(library);
        MappedSimulator {
            network,
            library,
            input_values: vec![0; network.nb_inputs()],
            node_values: vec![0; network.nb_nodes()],
            states: vec![0; network.nb_nodes()],
        }
    }

    pub fn run(&mut self, input_values: &[Vec<u64>]) -> Vec<Vec<u64>> {
        self.reset();
        let mut ret = Vec::new();
        for (i, v) in input_values.iter().enumerate() {
            if i != 0 {
                self.run_registers();
            }
            assert_eq!(v.len(), self.input_values.len());
            self.input_values.copy_from_slice(v);
            self.run_comb();
            ret.push(
                (0..self.network.nb_outputs())
                    .map(|o| self.node_values[self.network.output_driver(o)])
                    .collect(),
            );
        }
        ret
    }

    fn reset(&mut self) {
        self.input_values = vec![0; self.network.nb_inputs()];
        self.node_values = vec![0; self.network.nb_nodes()];
        self.states = vec![0; self.network.nb_nodes()];
    }

    fn sequential(&self, cell: usize) -> Option<&'a SequentialInfo> {
        let library: &'a CellLibrary = self.library;
        library.cell(cell).sequential()
    }

    /// Value of an output pin of a cell instance
    fn output_value(&self, node: usize, pin: usize) -> u64 {
        let MappedNode::Cell { cell, fanins } = self.network.node(node) else {
            unreachable!()
        };
        match self.library.cell(*cell).function() {
            CellFunction::Sequential(info) => {
                if info.layout.iq == Some(pin) {
                    !self.states[node]
                } else {
                    self.states[node]
                }
            }
            CellFunction::Logic(expr) => {
                let inputs: Vec<u64> = fanins.iter().map(|f| self.node_values[*f]).collect();
                expr.eval_words(&inputs)
            }
            CellFunction::Opaque => panic!(
                "Cannot simulate opaque cell {}",
                self.library.cell(*cell).name()
            ),
        }
    }

    fn run_comb(&mut self) {
        for i in 0..self.network.nb_nodes() {
            let val = match self.network.node(i) {
                MappedNode::Input(k) => self.input_values[*k],
                MappedNode::Output { fanin, .. } => self.node_values[*fanin],
                MappedNode::Cell { .. } => self.output_value(i, 0),
                MappedNode::Tap { node, pin } => self.output_value(*node, *pin),
            };
            self.node_values[i] = val;
        }
    }

    fn run_registers(&mut self) {
        let mut next_states = self.states.clone();
        for r in self.network.registers() {
            let MappedNode::Cell { cell, fanins } = self.network.node(*r) else {
                continue;
            };
            let Some(info) = self.sequential(*cell) else {
                continue;
            };
            let layout = &info.layout;
            let pin = |p: Option<usize>| p.map_or(0, |p| self.node_values[fanins[p]]);
            next_states[*r] = next_state(
                self.states[*r],
                self.node_values[fanins[layout.data]],
                active(info.clock_sense, self.node_values[fanins[layout.clock]]),
                active(info.clear_sense, pin(layout.clear)),
                active(info.preset_sense, pin(layout.preset)),
            );
        }
        self.states = next_states;
    }
}
