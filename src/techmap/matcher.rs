//! Structural matching of pattern graphs on the subject network

use crate::patgen::{PatternArena, PatternGraph, PatternNode};
use crate::{Gate, Network, Signal};

const UNBOUND: u32 = u32::MAX;
const OPERATOR: u32 = u32::MAX - 1;

/// Result of a successful match
///
/// The pattern, with input `i` connected to `leaf(i)`, computes the root node of the
/// subject network inverted by `root_inv()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    root_inv: bool,
    leaves: Vec<Signal>,
}

impl Binding {
    /// Inversion between the pattern output and the subject root
    pub fn root_inv(&self) -> bool {
        self.root_inv
    }

    /// Number of leaves, i.e. of pattern inputs
    pub fn nb_leaves(&self) -> usize {
        self.leaves.len()
    }

    /// Signal bound to pattern input i
    pub fn leaf(&self, i: usize) -> Signal {
        self.leaves[i]
    }

    /// Subject driver bound to pattern input i
    pub fn leaf_node(&self, i: usize) -> Signal {
        self.leaves[i].without_inversion()
    }

    /// Polarity of the subject driver bound to pattern input i
    pub fn leaf_inv(&self, i: usize) -> bool {
        self.leaves[i].is_inverted()
    }

    /// All leaves, in pattern input order
    pub fn leaves(&self) -> &[Signal] {
        &self.leaves
    }
}

/// Pattern matching algorithm
///
/// This will find a correspondence between the nodes of a pattern and the nodes of the
/// subject network, starting from a root gate:
///   * each pattern operator is bound to a gate of the same type, in the same fanin order;
///   * each pattern input is bound to a subject signal, with its polarity.
///
/// Input order matters: a & (b & c) is a different pattern from (a & b) & c, which is why
/// the pattern database keeps both orientations.
/// And gates must agree exactly on the inversion of their fanins. For Xor gates, an
/// inversion on the output is absorbed by the first fanin.
///
/// A pattern input used twice must be bound to the same signal both times, and two
/// different pattern inputs may not be bound to the same subject node.
pub struct Matcher<'a> {
    network: &'a Network,
    arena: &'a PatternArena,
    /// Subject slot and flip bound to each pattern node
    bound: Vec<Option<(usize, bool)>>,
    /// Pattern input bound to each subject slot, or a marker for operators
    slot_use: Vec<u32>,
    leaves: Vec<Signal>,
    touched_nodes: Vec<u32>,
    touched_slots: Vec<usize>,
}

impl<'a> Matcher<'a> {
    /// Create a matcher for a subject network and a pattern arena
    pub fn new(network: &'a Network, arena: &'a PatternArena) -> Matcher<'a> {
        Matcher {
            network,
            arena,
            bound: vec![None; arena.nb_nodes()],
            slot_use: vec![UNBOUND; network.nb_slots()],
            leaves: vec![Signal::placeholder(); arena.nb_inputs()],
            touched_nodes: Vec::new(),
            touched_slots: Vec::new(),
        }
    }

    /// Match a pattern rooted at a subject slot. Returns the bound leaves, if any
    pub fn try_match(&mut self, root: usize, pattern: &PatternGraph) -> Option<Binding> {
        let matched = self.bind_node(pattern.root().node, root, false)
            && pattern.edges().iter().all(|e| self.match_edge(*e));
        let ret = if matched {
            let leaves = self.leaves[..pattern.input_count()].to_vec();
            debug_assert!(leaves.iter().all(|l| *l != Signal::placeholder()));
            Some(Binding {
                root_inv: pattern.root_inv(),
                leaves,
            })
        } else {
            None
        };
        self.reset();
        ret
    }

    /// Process one entry of the edge stream: match the fanin of an already bound operator
    fn match_edge(&mut self, entry: u32) -> bool {
        let node = entry >> 1;
        let pos = (entry & 1) as usize;
        let Some((slot, flip)) = self.bound[node as usize] else {
            return false;
        };
        let pattern_node = *self.arena.node(node);
        let (edge, is_xor) = match pattern_node {
            PatternNode::And(f) => (f[pos], false),
            PatternNode::Xor(f) => (f[pos], true),
            PatternNode::Input(_) => return false,
        };
        let Some(gate) = self.network.slot_gate(slot) else {
            return false;
        };
        let fanin = gate.fanin(pos);
        if fanin.is_constant() {
            return false;
        }
        // Output flip of a Xor is pushed to its first fanin
        let f = is_xor && pos == 0 && flip;
        let leaf_inv = edge.inv ^ f;
        let child = *self.arena.node(edge.node);
        match child {
            PatternNode::Input(i) => self.bind_input(i as usize, fanin ^ leaf_inv),
            _ => {
                let child_flip = fanin.is_inverted() ^ leaf_inv;
                self.bind_node(edge.node, self.network.slot(fanin), child_flip)
            }
        }
    }

    /// Bind a pattern operator to a subject gate
    fn bind_node(&mut self, node: u32, slot: usize, flip: bool) -> bool {
        if let Some(existing) = self.bound[node as usize] {
            return existing == (slot, flip);
        }
        let type_matches = match (self.arena.node(node), self.network.slot_gate(slot)) {
            (PatternNode::And(_), Some(Gate::And(_))) => !flip,
            (PatternNode::Xor(_), Some(Gate::Xor(_))) => true,
            _ => false,
        };
        if !type_matches || self.slot_use[slot] != UNBOUND {
            return false;
        }
        self.bound[node as usize] = Some((slot, flip));
        self.touched_nodes.push(node);
        self.slot_use[slot] = OPERATOR;
        self.touched_slots.push(slot);
        true
    }

    /// Bind a pattern input to a subject signal
    fn bind_input(&mut self, input: usize, s: Signal) -> bool {
        let existing = self.leaves[input];
        if existing != Signal::placeholder() {
            return existing == s;
        }
        let slot = self.network.slot(s);
        if self.slot_use[slot] != UNBOUND {
            return false;
        }
        self.leaves[input] = s;
        self.slot_use[slot] = input as u32;
        self.touched_slots.push(slot);
        true
    }

    /// Reset the internal state, using the list of modified entries
    fn reset(&mut self) {
        for n in self.touched_nodes.drain(..) {
            self.bound[n as usize] = None;
        }
        for s in self.touched_slots.drain(..) {
            self.slot_use[s] = UNBOUND;
        }
        for l in &mut self.leaves {
            *l = Signal::placeholder();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patgen::{PatternArena, PatternEdge};

    fn graph(arena: &PatternArena, root: PatternEdge) -> PatternGraph {
        PatternGraph {
            root,
            input_count: arena.input_count(root),
            edges: arena.edge_stream(root),
            rep: 0,
        }
    }

    /// Single gate pattern matching on And gates
    #[test]
    fn test_and() {
        let mut aig = Network::new();
        aig.add_inputs(3);
        let i0 = Signal::from_input(0);
        let i1 = Signal::from_input(1);
        let i2 = Signal::from_input(2);
        aig.add(Gate::and(i0, i1));
        aig.add(Gate::and(i0, i2));
        aig.add(Gate::and(i0, !i1));
        aig.add(Gate::and(!i0, i1));
        aig.add(Gate::xor(i0, i1));

        let mut arena = PatternArena::new(2);
        let and = arena.and(arena.input(0), arena.input(1));
        let nand = !and;
        let p_and = graph(&arena, and);
        let p_nand = graph(&arena, nand);

        let mut matcher = Matcher::new(&aig, &arena);
        let slot = |i: usize| aig.slot(Signal::from_var(i as u32));
        assert_eq!(matcher.try_match(slot(0), &p_and).unwrap().leaves(), &[i0, i1]);
        assert_eq!(matcher.try_match(slot(1), &p_and).unwrap().leaves(), &[i0, i2]);
        assert_eq!(matcher.try_match(slot(2), &p_and).unwrap().leaves(), &[i0, !i1]);
        assert_eq!(matcher.try_match(slot(3), &p_and).unwrap().leaves(), &[!i0, i1]);
        assert!(matcher.try_match(slot(4), &p_and).is_none());
        let b = matcher.try_match(slot(0), &p_nand).unwrap();
        assert!(b.root_inv());
        assert_eq!(b.leaf_node(1), i1);
        assert!(!b.leaf_inv(1));
        // Inputs and registers are never roots of a pattern
        assert!(matcher.try_match(0, &p_and).is_none());
    }

    /// Patterns with inverted internal edges and shared inputs
    #[test]
    fn test_complex_xor() {
        let mut aig = Network::new();
        aig.add_inputs(2);
        let i0 = Signal::from_input(0);
        let i1 = Signal::from_input(1);
        let x0 = aig.add(Gate::and(i0, !i1));
        let x1 = aig.add(Gate::and(!i0, i1));
        aig.add(Gate::and(!x0, !x1));
        aig.add(Gate::and(x0, x1));
        aig.add(Gate::and(!x0, x1));
        aig.add(Gate::and(!i0, !i1));

        // Xnor as !(a & !b) & !(!a & b)
        let mut arena = PatternArena::new(2);
        let (a, b) = (arena.input(0), arena.input(1));
        let p0 = arena.and(a, !b);
        let p1 = arena.and(!a, b);
        let root = arena.and(!p0, !p1);
        let p = graph(&arena, root);

        let mut matcher = Matcher::new(&aig, &arena);
        let slot = |i: usize| aig.slot(Signal::from_var(i as u32));
        assert_eq!(matcher.try_match(slot(2), &p).unwrap().leaves(), &[i0, i1]);
        assert!(matcher.try_match(slot(3), &p).is_none());
        assert!(matcher.try_match(slot(4), &p).is_none());
        assert!(matcher.try_match(slot(5), &p).is_none());
        // The state is reset after each attempt
        assert_eq!(matcher.try_match(slot(2), &p).unwrap().leaves(), &[i0, i1]);
    }

    /// Xor gates absorb output inversions
    #[test]
    fn test_xor_flip() {
        let mut aig = Network::new();
        aig.add_inputs(3);
        let i0 = Signal::from_input(0);
        let i1 = Signal::from_input(1);
        let i2 = Signal::from_input(2);
        let x = aig.add(Gate::xor(i0, i1));
        aig.add(Gate::xor(!x, i2));
        aig.add(Gate::xor(x, i2));

        let mut arena = PatternArena::new(3);
        let inner = arena.xor(arena.input(0), arena.input(1));
        let root = arena.xor(inner, arena.input(2));
        let p = graph(&arena, root);

        let mut matcher = Matcher::new(&aig, &arena);
        let slot = |i: usize| aig.slot(Signal::from_var(i as u32));
        assert_eq!(matcher.try_match(slot(1), &p).unwrap().leaves(), &[!i0, i1, i2]);
        assert_eq!(matcher.try_match(slot(2), &p).unwrap().leaves(), &[i0, i1, i2]);
    }

    /// Two pattern inputs may not share a subject node
    #[test]
    fn test_distinct_leaves() {
        let mut aig = Network::new();
        aig.add_inputs(2);
        let i0 = Signal::from_input(0);
        let i1 = Signal::from_input(1);
        let x = aig.add(Gate::and(i0, i1));
        aig.add(Gate::and(i0, x));

        let mut arena = PatternArena::new(3);
        let inner = arena.and(arena.input(1), arena.input(2));
        let root = arena.and(arena.input(0), inner);
        let p = graph(&arena, root);

        let mut matcher = Matcher::new(&aig, &arena);
        let slot = |i: usize| aig.slot(Signal::from_var(i as u32));
        assert!(matcher.try_match(slot(1), &p).is_none());
    }
}
