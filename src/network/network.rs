use core::fmt;

use crate::network::gates::{Gate, Normalization, Register, RegisterKind};
use crate::network::signal::Signal;

/// Subject graph for technology mapping: a network of 2-input And and Xor gates with
/// inverted edges, primary inputs and outputs, and registers
///
/// Combinatorial gates are kept in topological order: a gate only uses primary inputs,
/// registers and gates with a lower index. Registers may use any signal.
///
/// Inputs and nodes share a single dense index space, the slots: input `i` is slot `i`,
/// node `v` is slot `nb_inputs() + v`. The covering algorithm stores its per-polarity
/// costs by slot.
#[derive(Debug, Clone, Default)]
pub struct Network {
    nb_inputs: usize,
    nodes: Vec<Gate>,
    outputs: Vec<Signal>,
    input_names: Vec<String>,
    output_names: Vec<String>,
}

impl Network {
    /// Create a new network
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of primary inputs
    pub fn nb_inputs(&self) -> usize {
        self.nb_inputs
    }

    /// Return the number of primary outputs
    pub fn nb_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Return the number of nodes in the network
    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of slots (inputs and nodes)
    pub fn nb_slots(&self) -> usize {
        self.nb_inputs + self.nodes.len()
    }

    /// Get the input at index i
    pub fn input(&self, i: usize) -> Signal {
        assert!(i < self.nb_inputs());
        Signal::from_input(i as u32)
    }

    /// Get the output at index i
    pub fn output(&self, i: usize) -> Signal {
        assert!(i < self.nb_outputs());
        self.outputs[i]
    }

    /// Get the name of the input at index i
    pub fn input_name(&self, i: usize) -> &str {
        &self.input_names[i]
    }

    /// Get the name of the output at index i
    pub fn output_name(&self, i: usize) -> &str {
        &self.output_names[i]
    }

    /// Get the variable at index i
    pub fn node(&self, i: usize) -> Signal {
        Signal::from_var(i as u32)
    }

    /// Get the gate at index i
    pub fn gate(&self, i: usize) -> &Gate {
        &self.nodes[i]
    }

    /// Slot of the driver of a signal, ignoring its inversion
    pub fn slot(&self, s: Signal) -> usize {
        if s.is_input() {
            s.input() as usize
        } else {
            assert!(s.is_var(), "Constant {s} has no slot");
            self.nb_inputs + s.var() as usize
        }
    }

    /// Non-inverted signal driven by a slot
    pub fn slot_signal(&self, slot: usize) -> Signal {
        if slot < self.nb_inputs {
            Signal::from_input(slot as u32)
        } else {
            Signal::from_var((slot - self.nb_inputs) as u32)
        }
    }

    /// Gate at a slot, if the slot is not a primary input
    pub fn slot_gate(&self, slot: usize) -> Option<&Gate> {
        if slot < self.nb_inputs {
            None
        } else {
            Some(&self.nodes[slot - self.nb_inputs])
        }
    }

    /// Add a new primary input
    pub fn add_input(&mut self) -> Signal {
        let name = format!("i{}", self.nb_inputs);
        self.add_named_input(name)
    }

    /// Add a new primary input with a name
    pub fn add_named_input(&mut self, name: String) -> Signal {
        self.nb_inputs += 1;
        self.input_names.push(name);
        self.input(self.nb_inputs() - 1)
    }

    /// Add multiple primary inputs
    pub fn add_inputs(&mut self, nb: usize) {
        for _ in 0..nb {
            self.add_input();
        }
    }

    /// Add a new primary output based on an existing signal
    pub fn add_output(&mut self, l: Signal) {
        let name = format!("o{}", self.outputs.len());
        self.add_named_output(name, l);
    }

    /// Add a new primary output with a name
    pub fn add_named_output(&mut self, name: String, l: Signal) {
        self.outputs.push(l);
        self.output_names.push(name);
    }

    /// Create an And2 gate
    pub fn and(&mut self, a: Signal, b: Signal) -> Signal {
        self.add_canonical(Gate::and(a, b))
    }

    /// Create an Or2 gate, as an And with inverted inputs and output
    pub fn or(&mut self, a: Signal, b: Signal) -> Signal {
        !self.and(!a, !b)
    }

    /// Create a Xor2 gate
    pub fn xor(&mut self, a: Signal, b: Signal) -> Signal {
        self.add_canonical(Gate::xor(a, b))
    }

    /// Create a multiplexer s ? a : b from And gates
    pub fn mux(&mut self, s: Signal, a: Signal, b: Signal) -> Signal {
        let x = self.and(s, a);
        let y = self.and(!s, b);
        self.or(x, y)
    }

    /// Create an n-ary And as a balanced tree
    pub fn and_n(&mut self, sigs: &[Signal]) -> Signal {
        self.tree(sigs, Signal::one(), Network::and)
    }

    /// Create an n-ary Or as a balanced tree
    pub fn or_n(&mut self, sigs: &[Signal]) -> Signal {
        let inverted: Vec<Signal> = sigs.iter().map(|s| !s).collect();
        !self.and_n(&inverted)
    }

    /// Create an n-ary Xor as a balanced tree
    pub fn xor_n(&mut self, sigs: &[Signal]) -> Signal {
        self.tree(sigs, Signal::zero(), Network::xor)
    }

    fn tree<F>(&mut self, sigs: &[Signal], empty: Signal, mut op: F) -> Signal
    where
        F: FnMut(&mut Network, Signal, Signal) -> Signal,
    {
        if sigs.is_empty() {
            return empty;
        }
        let mut level = sigs.to_vec();
        while level.len() > 1 {
            let mut next = Vec::with_capacity((level.len() + 1) / 2);
            for pair in level.chunks(2) {
                if pair.len() == 2 {
                    next.push(op(self, pair[0], pair[1]));
                } else {
                    next.push(pair[0]);
                }
            }
            level = next;
        }
        level[0]
    }

    /// Create a rising-edge flip-flop, with optional clear and preset (zero if unused)
    pub fn dff(&mut self, data: Signal, clock: Signal, clear: Signal, preset: Signal) -> Signal {
        self.add(Gate::Register(Register::new(
            RegisterKind::FlipFlop,
            data,
            clock,
            clear,
            preset,
        )))
    }

    /// Create an active-high latch, with optional clear and preset (zero if unused)
    pub fn latch(&mut self, data: Signal, enable: Signal, clear: Signal, preset: Signal) -> Signal {
        self.add(Gate::Register(Register::new(
            RegisterKind::Latch,
            data,
            enable,
            clear,
            preset,
        )))
    }

    /// Add a new gate, and make it canonical. The gate may be simplified immediately
    pub fn add_canonical(&mut self, gate: Gate) -> Signal {
        use Normalization::*;
        match gate.make_canonical() {
            Copy(l) => l,
            Node(g, inv) => self.add(g) ^ inv,
        }
    }

    /// Add a new gate
    pub fn add(&mut self, gate: Gate) -> Signal {
        let l = Signal::from_var(self.nodes.len() as u32);
        self.nodes.push(gate);
        l
    }

    /// Connect the pins of a register once its drivers exist
    pub fn set_register_pins(&mut self, i: usize, pins: [Signal; 4]) {
        match &mut self.nodes[i] {
            Gate::Register(r) => r.set_pins(pins),
            g => panic!("Node x{i} is not a register: {g}"),
        }
    }

    /// Return whether the network is purely combinatorial
    pub fn is_comb(&self) -> bool {
        self.nodes.iter().all(|g| g.is_comb())
    }

    /// Indices of the register nodes, in order
    pub fn registers(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, g)| !g.is_comb())
            .map(|(i, _)| i)
    }

    /// Return whether the network is topologically sorted (except for registers)
    pub fn is_topo_sorted(&self) -> bool {
        for (i, g) in self.nodes.iter().enumerate() {
            let ind = i as u32;
            for v in g.comb_vars() {
                if v >= ind {
                    return false;
                }
            }
        }
        true
    }

    /// Number of references to each slot: gate fanins, register pins and primary outputs
    pub fn fanout_counts(&self) -> Vec<u32> {
        let mut ret = vec![0; self.nb_slots()];
        let deps = self
            .nodes
            .iter()
            .flat_map(|g| g.dependencies().iter())
            .chain(self.outputs.iter());
        for s in deps {
            if !s.is_constant() {
                ret[self.slot(*s)] += 1;
            }
        }
        ret
    }

    /// Mark the slots that directly drive a primary output
    pub fn output_marks(&self) -> Vec<bool> {
        let mut ret = vec![false; self.nb_slots()];
        for s in &self.outputs {
            if !s.is_constant() {
                ret[self.slot(*s)] = true;
            }
        }
        ret
    }

    /// Check consistency of the datastructure
    pub fn check(&self) {
        for i in 0..self.nb_nodes() {
            for v in self.gate(i).dependencies() {
                assert!(self.is_valid(*v), "Invalid signal {v}");
            }
        }
        for i in 0..self.nb_outputs() {
            let v = self.output(i);
            assert!(self.is_valid(v), "Invalid output {v}");
        }
        assert!(self.is_topo_sorted(), "Combinatorial gates are not sorted");
        assert_eq!(self.input_names.len(), self.nb_inputs);
        assert_eq!(self.output_names.len(), self.outputs.len());
    }

    /// Returns whether a signal is valid (within bounds) in the network
    pub(crate) fn is_valid(&self, s: Signal) -> bool {
        if s.without_inversion() == Signal::placeholder() {
            false
        } else if s.is_input() {
            s.input() < self.nb_inputs() as u32
        } else if s.is_var() {
            s.var() < self.nb_nodes() as u32
        } else {
            true
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Network with {} inputs, {} outputs:",
            self.nb_inputs(),
            self.nb_outputs()
        )?;
        for i in 0..self.nb_nodes() {
            writeln!(f, "\t{} = {}", self.node(i), self.gate(i))?;
        }
        for i in 0..self.nb_outputs() {
            writeln!(f, "\t{} = {}", self.output_name(i), self.output(i))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Gate, Network, Signal};

    #[test]
    fn test_basic() {
        let mut net = Network::default();
        let i0 = net.add_input();
        let i1 = net.add_input();
        let x = net.xor(i0, !i1);
        net.add_output(x);

        assert_eq!(net.nb_inputs(), 2);
        assert_eq!(net.nb_outputs(), 1);
        assert_eq!(net.nb_nodes(), 1);
        assert_eq!(net.nb_slots(), 3);
        assert!(net.is_comb());
        assert!(net.is_topo_sorted());
        assert!(x.is_inverted());
        assert_eq!(net.gate(0), &Gate::Xor([i0, i1]));
        assert_eq!(net.output_name(0), "o0");
        net.check();
    }

    #[test]
    fn test_slots() {
        let mut net = Network::new();
        net.add_inputs(3);
        let a = net.and(net.input(0), net.input(1));
        let b = net.and(!a, net.input(2));
        net.add_output(b);
        net.add_output(!a);
        assert_eq!(net.slot(net.input(2)), 2);
        assert_eq!(net.slot(!a), 3);
        assert_eq!(net.slot_signal(4), b);
        assert_eq!(net.slot_signal(1), net.input(1));
        assert!(net.slot_gate(0).is_none());
        assert!(net.slot_gate(3).unwrap().is_and());
        assert_eq!(net.fanout_counts(), vec![1, 1, 1, 2, 1]);
        assert_eq!(net.output_marks(), vec![false, false, false, true, true]);
    }

    #[test]
    fn test_trees() {
        let mut net = Network::new();
        net.add_inputs(5);
        let ins: Vec<Signal> = (0..5).map(|i| net.input(i)).collect();
        let a = net.and_n(&ins);
        let o = net.or_n(&ins[..3]);
        let x = net.xor_n(&ins[2..]);
        net.add_output(a);
        net.add_output(o);
        net.add_output(x);
        assert_eq!(net.nb_nodes(), 4 + 2 + 2);
        assert!(o.is_inverted());
        assert_eq!(net.and_n(&[]), Signal::one());
        assert_eq!(net.xor_n(&[ins[0]]), ins[0]);
        net.check();
    }

    #[test]
    fn test_registers() {
        let mut net = Network::new();
        let clk = net.add_input();
        let d = net.add_input();
        let q = net.dff(Signal::placeholder(), clk, Signal::zero(), Signal::zero());
        let n = net.xor(q, d);
        net.set_register_pins(0, [n, clk, Signal::zero(), Signal::zero()]);
        net.add_output(q);
        assert!(!net.is_comb());
        assert!(net.is_topo_sorted());
        assert_eq!(net.registers().collect::<Vec<_>>(), vec![0]);
        net.check();
    }
}
