//! Subject graph: the technology-independent network to be mapped

mod gates;
pub mod generators;
mod network;
mod signal;
pub mod stats;

pub use gates::{Gate, Normalization, Register, RegisterKind};
pub use network::Network;
pub use signal::Signal;
