//! Area-driven covering of the subject network by library cells
//!
//! ```
//! # use cellmap::library::generic_library;
//! # use cellmap::{area_map, LibraryIndex, Network};
//! let index = LibraryIndex::build(generic_library());
//! let mut net = Network::new();
//! let a = net.add_input();
//! let b = net.add_input();
//! let x = net.and(a, b);
//! net.add_output(!x);
//! let mapped = area_map(&net, &index).unwrap();
//! assert_eq!(mapped.area(index.library()), 1.5);
//! ```

use log::{debug, info};

use crate::error::{MapError, MapResult};
use crate::index::LibraryIndex;
use crate::library::Sense;
use crate::network::{Register, RegisterKind};
use crate::patgen::PatternNode;
use crate::techmap::mapped::MappedNetwork;
use crate::techmap::matcher::{Binding, Matcher};
use crate::techmap::record::{polarity_name, slot_name, Decision, MapRecord, RegisterChoice};
use crate::{Gate, Network, Signal};

/// Score of a clock sensitivity mismatch when selecting a sequential cell
const CLOCK_MISMATCH_WEIGHT: u32 = 4;
/// Score of a clear or preset mismatch when selecting a sequential cell
const CONTROL_MISMATCH_WEIGHT: u32 = 1;

/// Map a subject network to library cells, minimizing the total area
///
/// The network must be normalized: combinatorial gates have no constant fanin and are
/// topologically sorted.
pub fn area_map(network: &Network, index: &LibraryIndex) -> MapResult<MappedNetwork> {
    let mut cover = AreaCover::new(network, index);
    cover.run()?;
    let mapped = cover.record.build(network, index)?;
    info!(
        "Mapped {} nodes to {} cells, area {}",
        network.nb_nodes(),
        mapped.cells().count(),
        mapped.area(index.library())
    );
    Ok(mapped)
}

/// Control signals a register requires from its cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Requirement {
    kind: RegisterKind,
    clock: Sense,
    clear: Sense,
    preset: Sense,
}

impl Requirement {
    fn of(r: &Register) -> Requirement {
        let optional = |present: bool, s: Signal| {
            if present {
                Sense::of_inversion(s.is_inverted())
            } else {
                Sense::None
            }
        };
        Requirement {
            kind: r.kind(),
            clock: Sense::of_inversion(r.clock().is_inverted()),
            clear: optional(r.has_clear(), r.clear()),
            preset: optional(r.has_preset(), r.preset()),
        }
    }

    /// Requirement on a cell storing the complement of the state
    fn inverted(self) -> Requirement {
        Requirement {
            clear: self.preset,
            preset: self.clear,
            ..self
        }
    }
}

/// Mismatch of one control signal: wrong sense, or a pin that must be tied off
fn control_mismatch(required: Sense, provided: Sense) -> u32 {
    (required != provided) as u32
}

/// Dynamic programming state of the covering
pub struct AreaCover<'a> {
    network: &'a Network,
    index: &'a LibraryIndex,
    matcher: Matcher<'a>,
    /// Best cost of each slot and polarity
    costs: Vec<f64>,
    fanouts: Vec<u32>,
    drives_output: Vec<bool>,
    record: MapRecord,
    /// Scratch data for the fanout weights of a cut
    leaf_marks: Vec<bool>,
    leaf_weights: Vec<f64>,
    stack: Vec<(usize, f64)>,
}

impl<'a> AreaCover<'a> {
    /// Initialize the covering of a network
    pub fn new(network: &'a Network, index: &'a LibraryIndex) -> AreaCover<'a> {
        assert!(network.is_topo_sorted());
        let nb_slots = network.nb_slots();
        AreaCover {
            network,
            index,
            matcher: Matcher::new(network, index.arena()),
            costs: vec![f64::INFINITY; 2 * nb_slots],
            fanouts: network.fanout_counts(),
            drives_output: network.output_marks(),
            record: MapRecord::new(network),
            leaf_marks: vec![false; nb_slots],
            leaf_weights: vec![0.0; nb_slots],
            stack: Vec::new(),
        }
    }

    /// Best cost found for a slot and polarity
    pub fn cost(&self, slot: usize, pol: usize) -> f64 {
        self.costs[2 * slot + pol]
    }

    /// Decisions taken so far
    pub fn record(&self) -> &MapRecord {
        &self.record
    }

    /// Run the covering: registers first, then combinatorial nodes in topological order
    pub fn run(&mut self) -> MapResult<()> {
        for i in 0..self.network.nb_inputs() {
            self.set(i, 0, 0.0, Decision::Passthrough);
            self.add_inverter_fallback(i);
            self.check_covered(i)?;
        }
        let registers: Vec<usize> = self.network.registers().collect();
        for i in &registers {
            self.cover_register(*i)?;
        }
        for i in 0..self.network.nb_nodes() {
            if self.network.gate(i).is_comb() {
                let slot = self.network.nb_inputs() + i;
                self.cover_gate(slot);
                self.check_covered(slot)?;
            }
        }
        Ok(())
    }

    fn set(&mut self, slot: usize, pol: usize, cost: f64, decision: Decision) {
        self.costs[2 * slot + pol] = cost;
        self.record.record(slot, pol, decision);
    }

    fn check_covered(&self, slot: usize) -> MapResult<()> {
        if self.cost(slot, 0).is_finite() || self.cost(slot, 1).is_finite() {
            debug!(
                "{}: cost {} / {}",
                slot_name(self.network, slot),
                self.cost(slot, 0),
                self.cost(slot, 1)
            );
            return Ok(());
        }
        let is_and = matches!(self.network.slot_gate(slot), Some(Gate::And(_)));
        Err(MapError::NoMatch {
            node: slot_name(self.network, slot),
            polarity: "any",
            reason: format!(
                "no library pattern covers this {} gate",
                if is_and { "And" } else { "Xor" }
            ),
        })
    }

    /// Select the sequential cell of a register, and make its outputs available
    ///
    /// Each class is tried with the register as is, and inverted: the cell then stores the
    /// complement of the state, with clear and preset exchanged.
    fn cover_register(&mut self, i: usize) -> MapResult<()> {
        let network = self.network;
        let index = self.index;
        let Some(reg) = network.gate(i).register() else {
            return Ok(());
        };
        let direct = Requirement::of(reg);
        // (score, inverted, class), smallest first
        let mut best: Option<(u32, bool, usize)> = None;
        for c in 0..index.nb_seq_classes() {
            let class = index.seq_class(c);
            if class.kind() != direct.kind || class.groups().is_empty() {
                continue;
            }
            for inverted in [false, true] {
                let req = if inverted { direct.inverted() } else { direct };
                if (req.clear.is_some() && !class.clear_sense().is_some())
                    || (req.preset.is_some() && !class.preset_sense().is_some())
                {
                    continue;
                }
                let score = CLOCK_MISMATCH_WEIGHT * control_mismatch(req.clock, class.clock_sense())
                    + CONTROL_MISMATCH_WEIGHT * control_mismatch(req.clear, class.clear_sense())
                    + CONTROL_MISMATCH_WEIGHT
                        * control_mismatch(req.preset, class.preset_sense());
                if best.map_or(true, |b| (score, inverted) < (b.0, b.1)) {
                    best = Some((score, inverted, c));
                }
            }
        }
        let node = format!("x{i}");
        let Some((score, inverted, c)) = best else {
            let mut controls = vec![format!("{:?}", direct.kind)];
            if direct.clear.is_some() {
                controls.push("clear".to_string());
            }
            if direct.preset.is_some() {
                controls.push("preset".to_string());
            }
            return Err(MapError::SequentialCompatibility {
                node,
                reason: format!("no cell provides {}", controls.join(" with ")),
            });
        };
        let class = index.seq_class(c);
        let mut cell_choice: Option<(usize, usize)> = None;
        for g in class.groups() {
            for cell in index.seq_group(*g).cells() {
                let better = match cell_choice {
                    None => true,
                    Some((_, b)) => index.cell(*cell).area() < index.cell(b).area(),
                };
                if better {
                    cell_choice = Some((*g, *cell));
                }
            }
        }
        let Some((g, cell)) = cell_choice else {
            return Err(MapError::SequentialCompatibility {
                node,
                reason: "sequential class has no cell".to_string(),
            });
        };
        let layout = *index.seq_group(g).layout();
        let (clear, preset) = if inverted {
            (reg.preset(), reg.clear())
        } else {
            (reg.clear(), reg.preset())
        };
        // Unused pins are tied to zero; a clear or preset is tied to its inactive level
        let mut pins = vec![Signal::zero(); index.cell(cell).nb_inputs()];
        pins[layout.data] = reg.data() ^ inverted;
        pins[layout.clock] = reg.clock() ^ class.clock_sense().is_negative();
        if let Some(p) = layout.clear {
            pins[p] = clear ^ class.clear_sense().is_negative();
        }
        if let Some(p) = layout.preset {
            pins[p] = preset ^ class.preset_sense().is_negative();
        }
        debug!(
            "Register {node}: cell {}{} with mismatch score {score}",
            index.cell(cell).name(),
            if inverted { " (inverted)" } else { "" }
        );
        self.record.record_register(
            i,
            RegisterChoice {
                cell,
                pins,
                q: layout.q,
                iq: layout.iq,
                inverted,
            },
        );
        let slot = network.nb_inputs() + i;
        let q_pol = inverted as usize;
        self.set(slot, q_pol, 0.0, Decision::Passthrough);
        if layout.iq.is_some() {
            self.set(slot, 1 - q_pol, 0.0, Decision::Passthrough);
        }
        self.add_inverter_fallback(slot);
        Ok(())
    }

    /// Try every pattern at a combinatorial node
    fn cover_gate(&mut self, slot: usize) {
        let index = self.index;
        let is_xor = matches!(self.network.slot_gate(slot), Some(Gate::Xor(_)));
        for p in 0..index.nb_patterns() {
            let pattern = index.pattern(p);
            let root_is_xor = matches!(index.arena().node(pattern.root().node), PatternNode::Xor(_));
            if root_is_xor != is_xor {
                continue;
            }
            let Some(binding) = self.matcher.try_match(slot, pattern) else {
                continue;
            };
            self.compute_leaf_weights(slot, &binding);
            for g in index.class(pattern.rep()).groups() {
                self.try_group(slot, &binding, *g);
            }
            self.clear_leaf_weights(&binding);
        }
        self.add_inverter_fallback(slot);
    }

    /// Evaluate the cheapest cell of a function group on a match
    fn try_group(&mut self, slot: usize, binding: &Binding, g: usize) {
        let index = self.index;
        let Some(cell) = index.cheapest_cell(g) else {
            return;
        };
        let map = index.group(g).map();
        let pol = (binding.root_inv() ^ map.output_inv()) as usize;
        let mut cost = index.cell(cell).area();
        let mut leaves = Vec::with_capacity(map.nb_inputs());
        for i in 0..map.nb_inputs() {
            let (pos, inv) = map.input(i);
            let leaf = binding.leaf(pos) ^ inv;
            let leaf_slot = self.network.slot(leaf);
            let leaf_cost = self.cost(leaf_slot, leaf.polarity());
            if !leaf_cost.is_finite() {
                return;
            }
            let w = self.leaf_weights[leaf_slot];
            if w != 0.0 {
                cost += leaf_cost * w;
            }
            leaves.push(leaf);
        }
        if cost < self.cost(slot, pol) {
            self.set(slot, pol, cost, Decision::Logic { cell, leaves });
        }
    }

    /// Split the weight of the cut root among its leaves, following the fanouts
    fn compute_leaf_weights(&mut self, root: usize, binding: &Binding) {
        for l in binding.leaves() {
            self.leaf_marks[self.network.slot(*l)] = true;
        }
        let network = self.network;
        self.stack.push((root, 1.0));
        while let Some((slot, w)) = self.stack.pop() {
            let Some(gate) = network.slot_gate(slot) else {
                continue;
            };
            if !gate.is_comb() {
                continue;
            }
            for f in gate.dependencies() {
                if f.is_constant() {
                    continue;
                }
                let s = network.slot(*f);
                let fw = w / self.fanouts[s].max(1) as f64;
                if self.leaf_marks[s] {
                    if !self.drives_output[s] {
                        self.leaf_weights[s] += fw;
                    }
                } else {
                    self.stack.push((s, fw));
                }
            }
        }
    }

    fn clear_leaf_weights(&mut self, binding: &Binding) {
        for l in binding.leaves() {
            let s = self.network.slot(*l);
            self.leaf_marks[s] = false;
            self.leaf_weights[s] = 0.0;
        }
    }

    /// Obtain a polarity from the other one and an inverter, when cheaper
    fn add_inverter_fallback(&mut self, slot: usize) {
        let Some(inv) = self.index.inverter_cell() else {
            return;
        };
        let inv_area = self.index.cell(inv).area();
        for pol in 0..2 {
            let other = 1 - pol;
            if matches!(self.record.decision(slot, other), Decision::Inverter { .. }) {
                continue;
            }
            let cost = self.cost(slot, other) + inv_area;
            if cost.is_finite() && cost < self.cost(slot, pol) {
                debug!(
                    "{} ({}): inverter fallback",
                    slot_name(self.network, slot),
                    polarity_name(pol)
                );
                self.set(slot, pol, cost, Decision::Inverter { cell: inv });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{generic_library, CellLibraryBuilder, PinLayout, SequentialInfo};
    use crate::network::generators;
    use crate::techmap::mapped::MappedNode;
    use crate::Expr;

    fn and2() -> Expr {
        Expr::and(vec![Expr::var(0), Expr::var(1)])
    }

    fn basic_library(with_nand: bool) -> LibraryIndex {
        let mut b = CellLibraryBuilder::new("basic");
        b.add_logic_cell("BUF", 1.0, &["A"], "Y", Expr::var(0));
        b.add_logic_cell("INV", 1.0, &["A"], "Y", Expr::not_var(0));
        b.add_logic_cell("AND2", 2.0, &["A", "B"], "Y", and2());
        if with_nand {
            b.add_logic_cell("NAND2", 1.5, &["A", "B"], "Y", !and2());
        }
        LibraryIndex::build(b.build().unwrap())
    }

    fn and_network(inverted: bool) -> Network {
        let mut net = Network::new();
        let a = net.add_input();
        let b = net.add_input();
        let x = net.and(a, b);
        net.add_output(x ^ inverted);
        net
    }

    fn cell_names(mapped: &MappedNetwork, index: &LibraryIndex) -> Vec<String> {
        let mut ret: Vec<String> = mapped
            .cells()
            .map(|(_, c)| index.cell(c).name().to_string())
            .collect();
        ret.sort();
        ret
    }

    #[test]
    fn test_single_and() {
        let index = basic_library(false);
        let net = and_network(false);
        let mapped = area_map(&net, &index).unwrap();
        mapped.check(index.library());
        assert_eq!(cell_names(&mapped, &index), vec!["AND2"]);
        assert_eq!(mapped.area(index.library()), 2.0);
        match mapped.node(mapped.output_driver(0)) {
            MappedNode::Cell { fanins, .. } => {
                let mut fanins = fanins.clone();
                fanins.sort();
                assert_eq!(fanins, vec![mapped.input(0), mapped.input(1)]);
            }
            n => panic!("Unexpected node {n:?}"),
        }
    }

    #[test]
    fn test_inverted_and() {
        let index = basic_library(false);
        let net = and_network(true);
        let mapped = area_map(&net, &index).unwrap();
        assert_eq!(cell_names(&mapped, &index), vec!["AND2", "INV"]);
        assert_eq!(mapped.area(index.library()), 3.0);
    }

    #[test]
    fn test_nand() {
        let index = basic_library(true);
        let net = and_network(true);
        let mapped = area_map(&net, &index).unwrap();
        assert_eq!(cell_names(&mapped, &index), vec!["NAND2"]);
        assert_eq!(mapped.area(index.library()), 1.5);
    }

    #[test]
    fn test_complex_gate() {
        // !((a & b) | c) is a single AOI21 in the generic library
        let index = LibraryIndex::build(generic_library());
        let mut net = Network::new();
        let a = net.add_input();
        let b = net.add_input();
        let c = net.add_input();
        let x = net.and(a, b);
        let y = net.or(x, c);
        net.add_output(!y);
        let mapped = area_map(&net, &index).unwrap();
        assert_eq!(cell_names(&mapped, &index), vec!["AOI21"]);
    }

    #[test]
    fn test_mux_any_input_order() {
        let index = LibraryIndex::build(generic_library());
        let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        for order in orders {
            let mut net = Network::new();
            let inputs: Vec<Signal> = (0..3).map(|_| net.add_input()).collect();
            let x = net.mux(inputs[order[0]], inputs[order[1]], inputs[order[2]]);
            net.add_output(x);
            let mapped = area_map(&net, &index).unwrap();
            assert_eq!(cell_names(&mapped, &index), vec!["MUX2"], "order {order:?}");
            assert_eq!(mapped.area(index.library()), 3.5);
        }
    }

    /// x = a & b is a leaf of the covers of both y = x & c and z = x & !c
    fn shared_leaf_network(x_is_output: bool) -> (Network, [Signal; 3]) {
        let mut net = Network::new();
        let a = net.add_input();
        let b = net.add_input();
        let c = net.add_input();
        let x = net.and(a, b);
        let y = net.and(x, c);
        let z = net.and(x, !c);
        net.add_output(y);
        net.add_output(z);
        if x_is_output {
            net.add_output(x);
        }
        (net, [x, y, z])
    }

    #[test]
    fn test_fanout_weights() {
        let index = basic_library(false);
        let (net, [x, y, z]) = shared_leaf_network(false);
        let mut cover = AreaCover::new(&net, &index);
        cover.run().unwrap();
        assert_eq!(cover.cost(net.slot(x), 0), 2.0);
        // Half of the And of x, and half of the inverter of c
        assert_eq!(cover.cost(net.slot(y), 0), 3.0);
        assert_eq!(cover.cost(net.slot(z), 0), 3.5);
    }

    #[test]
    fn test_output_leaf_weight() {
        let index = basic_library(false);
        let (net, [x, y, z]) = shared_leaf_network(true);
        let mut cover = AreaCover::new(&net, &index);
        cover.run().unwrap();
        // x is instantiated for its output anyway
        assert_eq!(cover.cost(net.slot(x), 0), 2.0);
        assert_eq!(cover.cost(net.slot(y), 0), 2.0);
        assert_eq!(cover.cost(net.slot(z), 0), 2.5);
    }

    #[test]
    fn test_xor() {
        let index = LibraryIndex::build(generic_library());
        let mut net = Network::new();
        let a = net.add_input();
        let b = net.add_input();
        let x = net.xor(a, b);
        net.add_output(x);
        net.add_output(!x);
        let mapped = area_map(&net, &index).unwrap();
        assert_eq!(cell_names(&mapped, &index), vec!["XNOR2", "XOR2"]);
    }

    #[test]
    fn test_no_match() {
        let mut b = CellLibraryBuilder::new("inverters");
        b.add_logic_cell("INV", 1.0, &["A"], "Y", Expr::not_var(0));
        let index = LibraryIndex::build(b.build().unwrap());
        let err = area_map(&and_network(false), &index).unwrap_err();
        assert!(matches!(err, MapError::NoMatch { node, .. } if node == "x0"));
    }

    #[test]
    fn test_missing_inverter() {
        let mut b = CellLibraryBuilder::new("and");
        b.add_logic_cell("AND2", 2.0, &["A", "B"], "Y", and2());
        let index = LibraryIndex::build(b.build().unwrap());
        let mut net = Network::new();
        let a = net.add_input();
        let b = net.add_input();
        let x = net.and(a, !b);
        net.add_output(x);
        let err = area_map(&net, &index).unwrap_err();
        assert_eq!(
            err,
            MapError::NoMatch {
                node: "x0".to_string(),
                polarity: "any",
                reason: "no library pattern covers this And gate".to_string(),
            }
        );
        let err = area_map(&and_network(true), &index).unwrap_err();
        assert_eq!(
            err,
            MapError::NoMatch {
                node: "x0".to_string(),
                polarity: "inverted",
                reason: "no inverter available".to_string(),
            }
        );
    }

    fn dff_info(clear: bool) -> SequentialInfo {
        SequentialInfo {
            kind: RegisterKind::FlipFlop,
            clock_sense: Sense::Positive,
            clear_sense: if clear { Sense::Positive } else { Sense::None },
            preset_sense: Sense::None,
            layout: PinLayout {
                data: 0,
                clock: 1,
                clear: if clear { Some(2) } else { None },
                preset: None,
                q: 0,
                iq: None,
            },
        }
    }

    fn dff_library() -> LibraryIndex {
        let mut b = CellLibraryBuilder::new("dff");
        b.add_logic_cell("INV", 1.0, &["A"], "Y", Expr::not_var(0));
        b.add_logic_cell("TIELO", 1.0, &[], "Y", Expr::Zero);
        b.add_logic_cell(
            "XOR2",
            3.0,
            &["A", "B"],
            "Y",
            Expr::xor(vec![Expr::var(0), Expr::var(1)]),
        );
        b.add_sequential_cell(
            "DFF_with_clear",
            5.0,
            &["D", "CK", "CLR"],
            &["Q"],
            dff_info(true),
        );
        b.add_sequential_cell("DFF_plain", 6.0, &["D", "CK"], &["Q"], dff_info(false));
        LibraryIndex::build(b.build().unwrap())
    }

    #[test]
    fn test_plain_dff() {
        let index = dff_library();
        let mut net = Network::new();
        let d = net.add_input();
        let clk = net.add_input();
        let q = net.dff(d, clk, Signal::zero(), Signal::zero());
        net.add_output(q);
        let mapped = area_map(&net, &index).unwrap();
        mapped.check(index.library());
        assert_eq!(cell_names(&mapped, &index), vec!["DFF_plain"]);
        assert_eq!(mapped.registers().len(), 1);
        assert_eq!(mapped.output_driver(0), mapped.registers()[0]);
    }

    #[test]
    fn test_dff_with_clear() {
        let index = dff_library();
        let net = generators::testcases::toggle_chain(2, false, true);
        let mapped = area_map(&net, &index).unwrap();
        mapped.check(index.library());
        let names = cell_names(&mapped, &index);
        assert_eq!(
            names.iter().filter(|n| *n == "DFF_with_clear").count(),
            2
        );
        // Falling edge registers use an inverted clock
        let net = generators::testcases::toggle_chain(2, true, false);
        let mapped = area_map(&net, &index).unwrap();
        let names = cell_names(&mapped, &index);
        assert_eq!(names.iter().filter(|n| *n == "DFF_plain").count(), 2);
        assert!(names.contains(&"INV".to_string()));
    }

    #[test]
    fn test_inverted_register() {
        // Only a flip-flop with an active-low preset is available for a register with a clear
        let mut b = CellLibraryBuilder::new("preset");
        b.add_logic_cell("INV", 1.0, &["A"], "Y", Expr::not_var(0));
        b.add_sequential_cell(
            "DFF_preset",
            6.0,
            &["D", "CK", "SN"],
            &["Q", "QN"],
            SequentialInfo {
                kind: RegisterKind::FlipFlop,
                clock_sense: Sense::Positive,
                clear_sense: Sense::None,
                preset_sense: Sense::Negative,
                layout: PinLayout {
                    data: 0,
                    clock: 1,
                    clear: None,
                    preset: Some(2),
                    q: 0,
                    iq: Some(1),
                },
            },
        );
        let index = LibraryIndex::build(b.build().unwrap());
        let mut net = Network::new();
        let d = net.add_input();
        let clk = net.add_input();
        let rst_n = net.add_input();
        let q = net.dff(d, clk, !rst_n, Signal::zero());
        net.add_output(q);

        let mapped = area_map(&net, &index).unwrap();
        mapped.check(index.library());
        // The data is inverted, and the active-low reset drives SN directly
        assert_eq!(cell_names(&mapped, &index), vec!["DFF_preset", "INV"]);
        let reg = mapped.registers()[0];
        match mapped.node(mapped.output_driver(0)) {
            MappedNode::Tap { node, pin } => {
                assert_eq!(*node, reg);
                assert_eq!(*pin, 1);
            }
            n => panic!("Unexpected node {n:?}"),
        }
        match mapped.node(reg) {
            MappedNode::Cell { fanins, .. } => {
                assert_eq!(fanins[1], mapped.input(1));
                assert_eq!(fanins[2], mapped.input(2));
            }
            n => panic!("Unexpected node {n:?}"),
        }

        // Same behaviour once the register has been cleared
        let mut steps = vec![vec![false, true, false]];
        for i in 0..16usize {
            steps.push(vec![i % 3 == 0, i % 2 == 0, i % 7 != 3]);
        }
        let expected = crate::sim::simulate(&net, &steps);
        let actual = crate::sim::simulate_mapped(&mapped, index.library(), &steps);
        assert_eq!(expected[1..], actual[1..]);
    }

    #[test]
    fn test_sequential_compatibility() {
        let index = basic_library(true);
        let mut net = Network::new();
        let d = net.add_input();
        let clk = net.add_input();
        let q = net.latch(d, clk, Signal::zero(), Signal::zero());
        net.add_output(q);
        let err = area_map(&net, &index).unwrap_err();
        assert!(matches!(err, MapError::SequentialCompatibility { .. }));
    }
}
