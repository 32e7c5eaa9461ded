use std::fmt;
use std::ops::{BitXor, BitXorAssign, Not};

/// An edge of the subject graph: a node or primary input, and an inversion flag
///
/// May be 0, 1, x or !x.
/// Primary inputs and constants get a special representation, so that a single word
/// identifies any driver in the subject network.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Default)]
pub struct Signal {
    a: u32,
}

impl Signal {
    /// Constant zero signal
    pub fn zero() -> Signal {
        Signal { a: 0 }
    }

    /// Constant one signal
    pub fn one() -> Signal {
        Signal { a: 1 }
    }

    /// A placeholder signal, used for register pins that are not connected yet
    pub(crate) fn placeholder() -> Signal {
        Signal { a: 0x8000_0000 }
    }

    /// Create a signal from a node index
    pub fn from_var(v: u32) -> Signal {
        Self::from_ind(v + 1)
    }

    /// Create a signal from a primary input index
    pub fn from_input(v: u32) -> Signal {
        Self::from_ind(!v)
    }

    fn from_ind(v: u32) -> Signal {
        Signal { a: v << 1 }
    }

    /// Obtain the node index associated with the signal
    pub fn var(&self) -> u32 {
        assert!(self.is_var());
        self.ind() - 1u32
    }

    /// Obtain the primary input index associated with the signal
    pub fn input(&self) -> u32 {
        assert!(self.is_input());
        !self.ind() & !0x8000_0000
    }

    fn ind(&self) -> u32 {
        self.a >> 1
    }

    /// Returns true if the signal represents a constant
    pub fn is_constant(&self) -> bool {
        self.ind() == 0
    }

    /// Returns true if the signal represents a primary input
    pub fn is_input(&self) -> bool {
        self.a & 0x8000_0000 != 0
    }

    /// Returns true if the signal represents a node of the network
    pub fn is_var(&self) -> bool {
        !self.is_input() && !self.is_constant()
    }

    /// The same driver, without inversion
    pub fn without_inversion(&self) -> Signal {
        Signal { a: self.a & !1u32 }
    }

    /// Returns true if the signal is implicitly inverted
    ///
    /// False for inputs, nodes and zero.
    /// True for their complement and for one.
    pub fn is_inverted(&self) -> bool {
        self.a & 1 != 0
    }

    /// Polarity index of the signal, 0 for direct and 1 for inverted
    pub fn polarity(&self) -> usize {
        (self.a & 1) as usize
    }

    /// Return the internal representation of the signal
    pub fn raw(&self) -> u32 {
        self.a
    }
}

impl From<bool> for Signal {
    fn from(b: bool) -> Signal {
        if b {
            Signal::one()
        } else {
            Signal::zero()
        }
    }
}

impl Not for Signal {
    type Output = Signal;
    fn not(self) -> Signal {
        Signal { a: self.a ^ 1u32 }
    }
}

impl Not for &'_ Signal {
    type Output = Signal;
    fn not(self) -> Signal {
        Signal { a: self.a ^ 1u32 }
    }
}

impl BitXorAssign<bool> for Signal {
    fn bitxor_assign(&mut self, rhs: bool) {
        self.a ^= rhs as u32;
    }
}

impl BitXor<bool> for Signal {
    type Output = Signal;
    fn bitxor(self, rhs: bool) -> Self::Output {
        let mut l = self;
        l ^= rhs;
        l
    }
}

impl BitXor<bool> for &'_ Signal {
    type Output = Signal;
    fn bitxor(self, rhs: bool) -> Self::Output {
        *self ^ rhs
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_constant() {
            let a = self.a & 1;
            write!(f, "{a}")
        } else {
            if self.is_inverted() {
                write!(f, "!")?;
            }
            if self.without_inversion() == Signal::placeholder() {
                write!(f, "##")
            } else if self.is_input() {
                let v = self.input();
                write!(f, "i{v}")
            } else {
                let v = self.var();
                write!(f, "x{v}")
            }
        }
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
