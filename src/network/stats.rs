//! Compute subject network statistics
//!
//! ```
//! # use cellmap::Network;
//! # let net = Network::new();
//! use cellmap::network::stats::stats;
//! let stats = stats(&net);
//!
//! // Check that there is no Xor2 gate
//! assert_eq!(stats.nb_xor, 0);
//!
//! // Show the statistics
//! println!("{}", stats);
//! ```

use std::fmt;

use crate::network::RegisterKind;
use crate::{Gate, Network};

/// Number of inputs, outputs, gates and registers in a subject network
#[derive(Clone, Debug, Default)]
pub struct NetworkStats {
    /// Number of inputs
    pub nb_inputs: usize,
    /// Number of outputs
    pub nb_outputs: usize,
    /// Number of And2 gates
    pub nb_and: usize,
    /// Number of Xor2 gates
    pub nb_xor: usize,
    /// Number of flip-flops
    pub nb_dff: usize,
    /// Number of latches
    pub nb_latch: usize,
    /// Number of registers with a clear input
    pub nb_clear: usize,
    /// Number of registers with a preset input
    pub nb_preset: usize,
}

impl NetworkStats {
    /// Total number of gates, including registers
    pub fn nb_gates(&self) -> usize {
        self.nb_and + self.nb_xor + self.nb_dff + self.nb_latch
    }
}

impl fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stats:")?;
        writeln!(f, "  Inputs: {}", self.nb_inputs)?;
        writeln!(f, "  Outputs: {}", self.nb_outputs)?;
        writeln!(f, "  Gates: {}", self.nb_gates())?;
        if self.nb_and != 0 {
            writeln!(f, "  And: {}", self.nb_and)?;
        }
        if self.nb_xor != 0 {
            writeln!(f, "  Xor: {}", self.nb_xor)?;
        }
        if self.nb_dff != 0 {
            writeln!(f, "  Dff: {}", self.nb_dff)?;
        }
        if self.nb_latch != 0 {
            writeln!(f, "  Latch: {}", self.nb_latch)?;
        }
        if self.nb_clear != 0 {
            writeln!(f, "      clear: {}", self.nb_clear)?;
        }
        if self.nb_preset != 0 {
            writeln!(f, "      preset: {}", self.nb_preset)?;
        }
        fmt::Result::Ok(())
    }
}

/// Compute the statistics of the network
pub fn stats(a: &Network) -> NetworkStats {
    let mut ret = NetworkStats {
        nb_inputs: a.nb_inputs(),
        nb_outputs: a.nb_outputs(),
        ..Default::default()
    };
    for i in 0..a.nb_nodes() {
        match a.gate(i) {
            Gate::And(_) => ret.nb_and += 1,
            Gate::Xor(_) => ret.nb_xor += 1,
            Gate::Register(r) => {
                match r.kind() {
                    RegisterKind::FlipFlop => ret.nb_dff += 1,
                    RegisterKind::Latch => ret.nb_latch += 1,
                }
                if r.has_clear() {
                    ret.nb_clear += 1;
                }
                if r.has_preset() {
                    ret.nb_preset += 1;
                }
            }
        }
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::stats;
    use crate::network::generators::{adder, testcases};

    #[test]
    fn test_stats() {
        let s = stats(&adder::ripple_carry(2));
        assert_eq!(s.nb_inputs, 4);
        assert_eq!(s.nb_xor, 3);
        assert_eq!(s.nb_and, 4);
        assert_eq!(s.nb_gates(), 7);

        let s = stats(&testcases::toggle_chain(2, false, true));
        assert_eq!(s.nb_dff, 2);
        assert_eq!(s.nb_clear, 2);
        assert!(format!("{s}").contains("Dff: 2"));
    }
}
