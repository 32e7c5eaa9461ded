use crate::network::Register;
use crate::{Gate, Network, Signal};

/// Structure for simulation based directly on the subject network representation
pub struct SimpleSimulator<'a> {
    network: &'a Network,
    input_values: Vec<u64>,
    node_values: Vec<u64>,
}

/// Convert the inversion to a word for bitwise operations
pub(super) fn pol_to_word(s: Signal) -> u64 {
    let pol = s.raw() & 1;
    (!(pol as u64)).wrapping_add(1)
}

/// Next state of a register, from its current state and the active levels of its controls
///
/// The clock is sampled once per timestep: the data is captured while it is active.
/// Clear has priority over preset.
pub(super) fn next_state(state: u64, data: u64, clock: u64, clear: u64, preset: u64) -> u64 {
    let captured = (clock & data) | (!clock & state);
    !clear & (preset | captured)
}

impl<'a> SimpleSimulator<'a> {
    pub fn from_network(network: &'a Network) -> SimpleSimulator<'a> {
        assert!(network.is_topo_sorted());
        SimpleSimulator {
            network,
            input_values: vec![0; network.nb_inputs()],
            node_values: vec![0; network.nb_nodes()],
        }
    }

    pub fn run(&mut self, input_values: &[Vec<u64>]) -> Vec<Vec<u64>> {
        self.reset();
        let mut ret = Vec::new();
        for (i, v) in input_values.iter().enumerate() {
            if i != 0 {
                self.run_registers();
            }
            self.copy_inputs(v);
            self.run_comb();
            ret.push(self.get_output_values());
        }
        ret
    }

    fn reset(&mut self) {
        self.input_values = vec![0; self.network.nb_inputs()];
        self.node_values = vec![0; self.network.nb_nodes()];
    }

    fn get_value(&self, s: Signal) -> u64 {
        if s == Signal::zero() {
            0
        } else if s == Signal::one() {
            !0
        } else if s.is_input() {
            self.input_values[s.input() as usize] ^ pol_to_word(s)
        } else {
            debug_assert!(s.is_var());
            self.node_values[s.var() as usize] ^ pol_to_word(s)
        }
    }

    fn copy_inputs(&mut self, inputs: &[u64]) {
        assert_eq!(inputs.len(), self.input_values.len());
        self.input_values.copy_from_slice(inputs);
    }

    fn register_state(&self, i: usize, r: &Register) -> u64 {
        let optional = |present: bool, s: Signal| if present { self.get_value(s) } else { 0 };
        next_state(
            self.node_values[i],
            self.get_value(r.data()),
            self.get_value(r.clock()),
            optional(r.has_clear(), r.clear()),
            optional(r.has_preset(), r.preset()),
        )
    }

    fn run_registers(&mut self) {
        let mut next_values = self.node_values.clone();
        for i in self.network.registers() {
            if let Some(r) = self.network.gate(i).register() {
                next_values[i] = self.register_state(i, r);
            }
        }
        self.node_values = next_values;
    }

    fn run_comb(&mut self) {
        for i in 0..self.network.nb_nodes() {
            let val = match self.network.gate(i) {
                Gate::And([a, b]) => self.get_value(*a) & self.get_value(*b),
                Gate::Xor([a, b]) => self.get_value(*a) ^ self.get_value(*b),
                Gate::Register(_) => continue,
            };
            self.node_values[i] = val;
        }
    }

    fn get_output_values(&self) -> Vec<u64> {
        (0..self.network.nb_outputs())
            .map(|o| self.get_value(self.network.output(o)))
            .collect()
    }
}
