//! Subject network generators, used to exercise the mapper

/// Adder generators
pub mod adder {
    use crate::{Network, Signal};

    /// A simple ripple-carry adder, with the carry as a majority of And/Or gates
    pub fn ripple_carry(len: usize) -> Network {
        let mut ret = Network::new();
        let mut c = Signal::zero();
        for _ in 0..len {
            let a = ret.add_input();
            let b = ret.add_input();
            let p = ret.xor(a, b);
            let o = ret.xor(p, c);
            let g = ret.and(a, b);
            let t = ret.and(p, c);
            c = ret.or(g, t);
            ret.add_output(o);
        }
        ret.add_output(c);
        ret.check();
        ret
    }
}

/// Sequential test cases
pub mod testcases {
    use crate::{Network, Signal};

    /// A chain of flip-flops with a Xor against the input at the end
    ///
    /// The clock is inverted for falling-edge flip-flops; an active-low clear is added if requested.
    pub fn toggle_chain(len: usize, falling_edge: bool, has_clear: bool) -> Network {
        assert!(len > 0);
        let mut ret = Network::new();
        let input = ret.add_named_input("d".to_string());
        let clock = ret.add_named_input("clk".to_string()) ^ falling_edge;
        let clear = if has_clear {
            !ret.add_named_input("rst_n".to_string())
        } else {
            Signal::zero()
        };
        let mut x = input;
        for _ in 0..len {
            x = ret.dff(x, clock, clear, Signal::zero());
        }
        let o = ret.xor(x, input);
        ret.add_named_output("q".to_string(), o);
        ret.check();
        ret
    }
}

/// Random logic
pub mod random {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use crate::{Network, Signal};

    /// A random combinatorial network of And and Xor gates with random edge inversions
    ///
    /// Each gate picks its fanins among the inputs and the previous gates; the last
    /// gates drive the outputs, some of them inverted.
    pub fn random_logic(nb_inputs: usize, nb_gates: usize, nb_outputs: usize, seed: u64) -> Network {
        assert!(nb_inputs >= 2);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut ret = Network::new();
        ret.add_inputs(nb_inputs);
        let mut signals: Vec<Signal> = (0..nb_inputs).map(|i| ret.input(i)).collect();
        while ret.nb_nodes() < nb_gates {
            let a = signals[rng.gen_range(0..signals.len())] ^ rng.gen_bool(0.5);
            let b = signals[rng.gen_range(0..signals.len())] ^ rng.gen_bool(0.5);
            let s = if rng.gen_bool(0.25) {
                ret.xor(a, b)
            } else {
                ret.and(a, b)
            };
            if !s.is_constant() {
                signals.push(s.without_inversion());
            }
        }
        for i in 0..nb_outputs {
            let s = signals[signals.len() - 1 - i % signals.len()];
            ret.add_output(s ^ rng.gen_bool(0.5));
        }
        ret.check();
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generators() {
        let adder = adder::ripple_carry(4);
        assert_eq!(adder.nb_inputs(), 8);
        assert_eq!(adder.nb_outputs(), 5);
        assert!(adder.is_comb());

        let chain = testcases::toggle_chain(3, true, true);
        assert_eq!(chain.nb_inputs(), 3);
        assert_eq!(chain.registers().count(), 3);

        let rnd = random::random_logic(6, 40, 4, 1);
        assert!(rnd.nb_nodes() >= 40);
        assert_eq!(rnd.nb_outputs(), 4);
    }
}
