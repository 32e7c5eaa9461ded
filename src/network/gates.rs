use std::fmt;

use crate::network::signal::Signal;

/// Kind of a sequential element
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum RegisterKind {
    /// Edge-triggered flip-flop
    FlipFlop,
    /// Level-sensitive latch
    Latch,
}

/// A sequential element of the subject graph
///
/// The pins are stored as signals, so that their polarity is explicit:
///   * an inverted clock denotes a falling-edge flip-flop (or an active-low latch enable);
///   * an unused clear or preset is the constant zero signal;
///   * an inverted clear or preset is active-low.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Register {
    kind: RegisterKind,
    pins: [Signal; 4],
}

impl Register {
    /// Create a register
    pub fn new(
        kind: RegisterKind,
        data: Signal,
        clock: Signal,
        clear: Signal,
        preset: Signal,
    ) -> Register {
        Register {
            kind,
            pins: [data, clock, clear, preset],
        }
    }

    /// Kind of the element
    pub fn kind(&self) -> RegisterKind {
        self.kind
    }

    /// Data input
    pub fn data(&self) -> Signal {
        self.pins[0]
    }

    /// Clock (flip-flop) or enable (latch) input
    pub fn clock(&self) -> Signal {
        self.pins[1]
    }

    /// Asynchronous clear input, zero if unused
    pub fn clear(&self) -> Signal {
        self.pins[2]
    }

    /// Asynchronous preset input, zero if unused
    pub fn preset(&self) -> Signal {
        self.pins[3]
    }

    /// Whether the clear input is used
    pub fn has_clear(&self) -> bool {
        self.clear() != Signal::zero()
    }

    /// Whether the preset input is used
    pub fn has_preset(&self) -> bool {
        self.preset() != Signal::zero()
    }

    /// All pins, in the order data, clock, clear, preset
    pub fn pins(&self) -> &[Signal; 4] {
        &self.pins
    }

    pub(crate) fn set_pins(&mut self, pins: [Signal; 4]) {
        self.pins = pins;
    }
}

/// Node of the subject graph
///
/// Combinatorial nodes are two-input And or Xor gates, with an inversion flag on each
/// fanin edge. Registers are boundaries of the combinatorial logic: their output is a
/// free variable for the combinatorial covering.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Gate {
    /// 2-input And gate
    And([Signal; 2]),
    /// 2-input Xor gate
    Xor([Signal; 2]),
    /// Flip-flop or latch
    Register(Register),
}

/// Result of normalizing a logic gate
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Normalization {
    /// A gate, with an optional inverted output
    Node(Gate, bool),
    /// The trivial case, where the gate reduces to a single signal or constant
    Copy(Signal),
}

impl Gate {
    /// Create a 2-input And
    pub fn and(a: Signal, b: Signal) -> Gate {
        Gate::And([a, b])
    }

    /// Create a 2-input Xor
    pub fn xor(a: Signal, b: Signal) -> Gate {
        Gate::Xor([a, b])
    }

    /// Obtain the canonical form of the gate
    ///
    /// Constant and trivial inputs are simplified, and Xor inversions are moved to the output.
    pub fn make_canonical(&self) -> Normalization {
        match self {
            Gate::And([a, b]) => make_and(*a, *b),
            Gate::Xor([a, b]) => make_xor(*a, *b),
            Gate::Register(_) => Normalization::Node(self.clone(), false),
        }
    }

    /// Obtain all signals feeding this gate
    pub fn dependencies(&self) -> &[Signal] {
        match self {
            Gate::And(s) | Gate::Xor(s) => s,
            Gate::Register(r) => r.pins(),
        }
    }

    /// Obtain the fanin signal at position 0 or 1 of a combinatorial gate
    pub fn fanin(&self, pos: usize) -> Signal {
        match self {
            Gate::And(s) | Gate::Xor(s) => s[pos],
            Gate::Register(_) => panic!("Registers have no combinatorial fanin"),
        }
    }

    /// Obtain the inversion of the fanin edge at position 0 or 1 of a combinatorial gate
    pub fn fanin_inv(&self, pos: usize) -> bool {
        self.fanin(pos).is_inverted()
    }

    /// Obtain the nodes feeding this gate combinatorially
    pub fn comb_vars(&self) -> impl Iterator<Item = u32> + '_ {
        let deps: &[Signal] = match self {
            Gate::Register(_) => &[],
            _ => self.dependencies(),
        };
        deps.iter().filter(|s| s.is_var()).map(|s| s.var())
    }

    /// Returns whether the gate is combinatorial
    pub fn is_comb(&self) -> bool {
        !matches!(self, Gate::Register(_))
    }

    /// Returns whether the gate is an And
    pub fn is_and(&self) -> bool {
        matches!(self, Gate::And(_))
    }

    /// Returns whether the gate is a Xor
    pub fn is_xor(&self) -> bool {
        matches!(self, Gate::Xor(_))
    }

    /// Returns the register, if the gate is sequential
    pub fn register(&self) -> Option<&Register> {
        match self {
            Gate::Register(r) => Some(r),
            _ => None,
        }
    }
}

fn make_and(a: Signal, b: Signal) -> Normalization {
    use Normalization::*;
    let (i0, i1) = if a <= b { (a, b) } else { (b, a) };
    if i0 == Signal::zero() || i0 == !i1 {
        Copy(Signal::zero())
    } else if i0 == Signal::one() || i0 == i1 {
        Copy(i1)
    } else {
        Node(Gate::And([i0, i1]), false)
    }
}

fn make_xor(a: Signal, b: Signal) -> Normalization {
    use Normalization::*;
    let inv = a.is_inverted() ^ b.is_inverted();
    let (a, b) = (a.without_inversion(), b.without_inversion());
    let (i0, i1) = if a <= b { (a, b) } else { (b, a) };
    if i0 == Signal::zero() {
        Copy(i1 ^ inv)
    } else if i0 == i1 {
        Copy(Signal::from(inv))
    } else {
        Node(Gate::Xor([i0, i1]), inv)
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::And([a, b]) => write!(f, "{a} & {b}"),
            Gate::Xor([a, b]) => write!(f, "{a} ^ {b}"),
            Gate::Register(r) => {
                let name = match r.kind() {
                    RegisterKind::FlipFlop => "Dff",
                    RegisterKind::Latch => "Latch",
                };
                write!(f, "{name}({}, clk={}", r.data(), r.clock())?;
                if r.has_clear() {
                    write!(f, ", clr={}", r.clear())?;
                }
                if r.has_preset() {
                    write!(f, ", pre={}", r.preset())?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_normalization() {
        let a = Signal::from_input(0);
        let b = Signal::from_var(3);
        assert_eq!(
            Gate::and(b, a).make_canonical(),
            Normalization::Node(Gate::And([a, b]), false)
        );
        assert_eq!(
            Gate::and(a, !a).make_canonical(),
            Normalization::Copy(Signal::zero())
        );
        assert_eq!(Gate::and(a, a).make_canonical(), Normalization::Copy(a));
        assert_eq!(
            Gate::and(Signal::one(), !b).make_canonical(),
            Normalization::Copy(!b)
        );
    }

    #[test]
    fn test_xor_normalization() {
        let a = Signal::from_input(0);
        let b = Signal::from_var(3);
        assert_eq!(
            Gate::xor(!b, a).make_canonical(),
            Normalization::Node(Gate::Xor([a, b]), true)
        );
        assert_eq!(
            Gate::xor(a, !a).make_canonical(),
            Normalization::Copy(Signal::one())
        );
        assert_eq!(
            Gate::xor(Signal::one(), b).make_canonical(),
            Normalization::Copy(!b)
        );
    }

    #[test]
    fn test_register_accessors() {
        let d = Signal::from_input(0);
        let c = Signal::from_input(1);
        let r = Register::new(RegisterKind::FlipFlop, d, !c, Signal::zero(), Signal::zero());
        assert_eq!(r.data(), d);
        assert!(r.clock().is_inverted());
        assert!(!r.has_clear());
        assert!(!r.has_preset());
        let g = Gate::Register(r);
        assert!(!g.is_comb());
        assert_eq!(g.comb_vars().count(), 0);
        assert_eq!(format!("{g}"), "Dff(i0, clk=!i1)");
    }
}
