//! Storage of covering decisions and reconstruction of the mapped network

use log::debug;

use crate::error::{MapError, MapResult};
use crate::index::LibraryIndex;
use crate::techmap::mapped::MappedNetwork;
use crate::{Network, Signal};

/// How a subject node is produced in one polarity
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Decision {
    /// No cover yet
    #[default]
    None,
    /// Primary input or register output, available without any cell
    Passthrough,
    /// Cell instance, with the subject signal driving each of its input pins
    Logic {
        /// Cell in the library
        cell: usize,
        /// Driver of each input pin
        leaves: Vec<Signal>,
    },
    /// Inverter on the other polarity of the same node
    Inverter {
        /// Inverter cell in the library
        cell: usize,
    },
}

/// Sequential cell chosen for a register
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterChoice {
    /// Cell in the library
    pub cell: usize,
    /// Subject signal driving each input pin of the cell, including tie-offs
    pub pins: Vec<Signal>,
    /// Output pin of Q
    pub q: usize,
    /// Output pin of !Q, if any
    pub iq: Option<usize>,
    /// The cell stores the complement of the register state: Q provides the inverted
    /// output of the register, and !Q its direct output
    pub inverted: bool,
}

/// Covering decisions for one mapping run
///
/// Decisions are recorded per subject slot and polarity, and the mapped network is built
/// from them in a single backward pass from the outputs and register pins. Each
/// (slot, polarity) pair is instantiated at most once.
#[derive(Debug, Clone)]
pub struct MapRecord {
    decisions: Vec<Decision>,
    registers: Vec<Option<RegisterChoice>>,
}

impl MapRecord {
    /// Create an empty record for a subject network
    pub fn new(network: &Network) -> MapRecord {
        MapRecord {
            decisions: vec![Decision::None; 2 * network.nb_slots()],
            registers: vec![None; network.nb_nodes()],
        }
    }

    /// Record the decision for a slot and polarity, replacing the previous one
    pub fn record(&mut self, slot: usize, pol: usize, decision: Decision) {
        self.decisions[2 * slot + pol] = decision;
    }

    /// Decision for a slot and polarity
    pub fn decision(&self, slot: usize, pol: usize) -> &Decision {
        &self.decisions[2 * slot + pol]
    }

    /// Record the cell chosen for register node i
    pub fn record_register(&mut self, i: usize, choice: RegisterChoice) {
        self.registers[i] = Some(choice);
    }

    /// Cell chosen for register node i
    pub fn register(&self, i: usize) -> Option<&RegisterChoice> {
        self.registers[i].as_ref()
    }

    /// Build the mapped network
    ///
    /// Registers are instantiated first, so that their outputs are available to the
    /// combinatorial logic. The logic cone of each primary output and register pin is then
    /// instantiated with an explicit worklist.
    pub fn build(&self, network: &Network, index: &LibraryIndex) -> MapResult<MappedNetwork> {
        let mut builder = Builder {
            network,
            index,
            record: self,
            mapped: MappedNetwork::new(),
            nodes: vec![usize::MAX; 2 * network.nb_slots()],
            constants: [None, None],
            stack: Vec::new(),
        };
        builder.run()
    }
}

struct Builder<'a> {
    network: &'a Network,
    index: &'a LibraryIndex,
    record: &'a MapRecord,
    mapped: MappedNetwork,
    /// Mapped node of each slot and polarity
    nodes: Vec<usize>,
    constants: [Option<usize>; 2],
    stack: Vec<(Signal, bool)>,
}

impl<'a> Builder<'a> {
    fn run(mut self) -> MapResult<MappedNetwork> {
        let network = self.network;
        let record = self.record;
        let mut input_nodes = Vec::with_capacity(self.network.nb_inputs());
        for i in 0..self.network.nb_inputs() {
            let id = self.mapped.new_input(self.network.input_name(i));
            let slot = self.network.slot(self.network.input(i));
            self.nodes[2 * slot] = id;
            input_nodes.push(id);
        }

        let mut registers = Vec::new();
        for i in network.registers() {
            let choice = record.register(i).ok_or_else(|| {
                MapError::SequentialCompatibility {
                    node: format!("x{i}"),
                    reason: "no cell was selected".to_string(),
                }
            })?;
            let cell = self.index.cell(choice.cell);
            let id = self.mapped.new_register_node(choice.cell, cell.nb_inputs());
            let slot = self.network.slot(self.network.node(i));
            let q_pol = choice.inverted as usize;
            self.nodes[2 * slot + q_pol] = self.mapped.new_tap(id, choice.q);
            if let Some(iq) = choice.iq {
                self.nodes[2 * slot + 1 - q_pol] = self.mapped.new_tap(id, iq);
            }
            registers.push((id, choice));
        }

        // Resolve everything before connecting registers and outputs
        let mut required: Vec<Signal> = (0..self.network.nb_outputs())
            .map(|o| self.network.output(o))
            .collect();
        for (_, choice) in &registers {
            required.extend(choice.pins.iter().copied());
        }
        for s in &required {
            self.resolve(*s)?;
        }

        for (id, choice) in &registers {
            for (pin, s) in choice.pins.iter().enumerate() {
                let driver = self.resolve(*s)?;
                self.mapped.set_fanin(*id, pin, driver);
            }
        }
        for (i, id) in input_nodes.iter().enumerate() {
            self.mapped.add_port(self.network.input_name(i), vec![*id]);
        }
        for o in 0..self.network.nb_outputs() {
            let driver = self.resolve(self.network.output(o))?;
            let name = self.network.output_name(o);
            let id = self.mapped.new_output(name, driver);
            self.mapped.add_port(name, vec![id]);
        }
        debug!(
            "Built mapped network with {} nodes",
            self.mapped.nb_nodes()
        );
        Ok(self.mapped)
    }

    /// Obtain the mapped node of a signal, instantiating its cone if needed
    fn resolve(&mut self, s: Signal) -> MapResult<usize> {
        let record = self.record;
        if s.is_constant() {
            return self.constant(s == Signal::one());
        }
        if let Some(id) = self.existing(s) {
            return Ok(id);
        }
        self.stack.push((s, false));
        while let Some((s, expanded)) = self.stack.pop() {
            if self.existing(s).is_some() {
                continue;
            }
            let slot = self.network.slot(s);
            let pol = s.polarity();
            let decision = record.decision(slot, pol);
            if !expanded {
                self.stack.push((s, true));
                match decision {
                    Decision::Logic { leaves, .. } => {
                        for l in leaves.iter().rev() {
                            if !l.is_constant() && self.existing(*l).is_none() {
                                self.stack.push((*l, false));
                            }
                        }
                    }
                    Decision::Inverter { .. } => {
                        if matches!(record.decision(slot, 1 - pol), Decision::Inverter { .. }) {
                            return Err(self.missing(s));
                        }
                        if self.existing(!s).is_none() {
                            self.stack.push((!s, false));
                        }
                    }
                    Decision::Passthrough | Decision::None => (),
                }
                continue;
            }
            let id = match decision {
                Decision::Logic { cell, leaves } => {
                    let mut fanins = Vec::with_capacity(leaves.len());
                    for l in leaves {
                        fanins.push(self.leaf_node(*l)?);
                    }
                    self.mapped.new_cell_node(*cell, fanins)
                }
                Decision::Inverter { cell } => {
                    let fanin = self.leaf_node(!s)?;
                    self.mapped.new_cell_node(*cell, vec![fanin])
                }
                Decision::Passthrough | Decision::None => {
                    return Err(self.missing(s));
                }
            };
            self.nodes[2 * slot + pol] = id;
        }
        self.existing(s).ok_or_else(|| self.missing(s))
    }

    /// Mapped node of a leaf, whose cone must already be instantiated
    fn leaf_node(&mut self, s: Signal) -> MapResult<usize> {
        if s.is_constant() {
            return self.constant(s == Signal::one());
        }
        self.existing(s).ok_or_else(|| self.missing(s))
    }

    fn existing(&self, s: Signal) -> Option<usize> {
        let id = self.nodes[2 * self.network.slot(s) + s.polarity()];
        if id == usize::MAX {
            None
        } else {
            Some(id)
        }
    }

    /// Tie cell for a constant, created once
    fn constant(&mut self, value: bool) -> MapResult<usize> {
        if let Some(id) = self.constants[value as usize] {
            return Ok(id);
        }
        let cell = self.index.const_cell(value).ok_or_else(|| MapError::NoMatch {
            node: format!("constant {}", value as u8),
            polarity: "direct",
            reason: "no constant cell available".to_string(),
        })?;
        let id = self.mapped.new_cell_node(cell, Vec::new());
        self.constants[value as usize] = Some(id);
        Ok(id)
    }

    fn missing(&self, s: Signal) -> MapError {
        let slot = self.network.slot(s);
        let other = self.record.decision(slot, 1 - s.polarity());
        let reason = if *other != Decision::None && self.index.inverter_cell().is_none() {
            "no inverter available"
        } else {
            "no cover was found"
        };
        MapError::NoMatch {
            node: slot_name(self.network, slot),
            polarity: polarity_name(s.polarity()),
            reason: reason.to_string(),
        }
    }
}

/// Name of a subject slot in messages
pub(crate) fn slot_name(network: &Network, slot: usize) -> String {
    if slot < network.nb_inputs() {
        network.input_name(slot).to_string()
    } else {
        format!("x{}", slot - network.nb_inputs())
    }
}

/// Name of a polarity in messages
pub(crate) fn polarity_name(pol: usize) -> &'static str {
    if pol == 0 {
        "direct"
    } else {
        "inverted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::CellLibraryBuilder;
    use crate::techmap::mapped::MappedNode;
    use crate::Expr;

    fn small_index() -> LibraryIndex {
        let mut b = CellLibraryBuilder::new("small");
        b.add_logic_cell("INV", 1.0, &["A"], "Y", Expr::not_var(0));
        b.add_logic_cell(
            "NAND2",
            1.5,
            &["A", "B"],
            "Y",
            !Expr::and(vec![Expr::var(0), Expr::var(1)]),
        );
        b.add_logic_cell("TIEHI", 1.0, &[], "Y", Expr::One);
        LibraryIndex::build(b.build().unwrap())
    }

    #[test]
    fn test_memoization() {
        let index = small_index();
        let inv = index.library().find("INV").unwrap();
        let nand = index.library().find("NAND2").unwrap();
        let mut net = Network::new();
        let a = net.add_input();
        let b = net.add_input();
        let x = net.and(a, b);
        net.add_output(x);
        net.add_output(!x);
        net.add_output(x);
        net.add_output(Signal::one());
        net.add_output(Signal::one());
        let slot = net.slot(x);

        let mut record = MapRecord::new(&net);
        record.record(0, 0, Decision::Passthrough);
        record.record(1, 0, Decision::Passthrough);
        record.record(
            slot,
            1,
            Decision::Logic {
                cell: nand,
                leaves: vec![a, b],
            },
        );
        record.record(slot, 0, Decision::Inverter { cell: inv });
        let mapped = record.build(&net, &index).unwrap();
        mapped.check(index.library());
        let stats = mapped.stats(index.library());
        assert_eq!(stats.nb_cells, 3);
        assert_eq!(mapped.output_driver(0), mapped.output_driver(2));
        assert_eq!(mapped.output_driver(3), mapped.output_driver(4));
        match mapped.node(mapped.output_driver(0)) {
            MappedNode::Cell { cell, fanins } => {
                assert_eq!(*cell, inv);
                assert_eq!(fanins, &vec![mapped.output_driver(1)]);
            }
            n => panic!("Unexpected node {n:?}"),
        }
        assert_eq!(mapped.ports().len(), 7);
    }

    #[test]
    fn test_missing_decision() {
        let index = small_index();
        let mut net = Network::new();
        let a = net.add_input();
        net.add_output(!a);
        let mut record = MapRecord::new(&net);
        record.record(0, 0, Decision::Passthrough);
        let err = record.build(&net, &index).unwrap_err();
        assert_eq!(
            err,
            MapError::NoMatch {
                node: "i0".to_string(),
                polarity: "inverted",
                reason: "no cover was found".to_string(),
            }
        );
        net.add_output(Signal::zero());
        record = MapRecord::new(&net);
        record.record(0, 0, Decision::Passthrough);
        record.record(0, 1, Decision::Inverter { cell: 0 });
        assert!(matches!(
            record.build(&net, &index),
            Err(MapError::NoMatch { .. })
        ));
    }
}
