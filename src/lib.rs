//! Area-driven technology mapping to standard cells
//!
//! This crate covers a technology-independent logic network with the cells of a standard cell
//! library, so that the total area is minimized.
//!
//! # Usage
//!
//! Cellmap is distributed as a library as well as a binary program.
//!
//! ```bash
//! # Show available commands
//! cellmap help
//! # Generate the index of the built-in generic library
//! cellmap gen-lib -o generic.lib.bin
//! # Show its content
//! cellmap show generic.lib.bin
//! # Map a design, and write the netlist
//! cellmap map mydesign.bench -l generic.lib.bin -o mapped.bench
//! ```
//!
//! # Flow
//!
//! Mapping happens in two phases:
//!   * offline, the [`PatternDatabaseBuilder`] canonizes the function of each library cell and
//!     expands it into every pattern of 2-input gates that implements it. The resulting
//!     [`LibraryIndex`] can be saved to a binary blob;
//!   * at mapping time, [`area_map`] matches the patterns on the subject [`Network`], selects
//!     the cheapest cover of each node by dynamic programming, and rebuilds a
//!     [`MappedNetwork`] of cell instances.
//!
//! ## Subject network
//!
//! The subject network is made of 2-input And and Xor gates with optional inversions on
//! their edges, and of registers (flip-flops and latches). Combinatorial gates are kept in
//! topological order, so that a given gate has an index higher than its inputs.
//!
//! For example, here is a full adder mapped with the generic library:
//! ```
//! # use cellmap::library::generic_library;
//! # use cellmap::{area_map, LibraryIndex, Network};
//! let mut net = Network::new();
//! let i0 = net.add_input();
//! let i1 = net.add_input();
//! let i2 = net.add_input();
//! let p = net.xor(i0, i1);
//! let out = net.xor(p, i2);
//! let g = net.and(i0, i1);
//! let t = net.and(p, i2);
//! let carry = net.or(g, t);
//! net.add_output(out);
//! net.add_output(carry);
//!
//! let index = LibraryIndex::build(generic_library());
//! let mapped = area_map(&net, &index).unwrap();
//! println!("{}", mapped.stats(index.library()));
//! ```
//!
//! ## Cell library
//!
//! Cells are described by a factored [`Expr`] for combinatorial cells, or by their pin layout
//! and control sensitivities for flip-flops and latches. Parsing Liberty files is out of scope:
//! libraries are built with a [`CellLibraryBuilder`].

#![warn(missing_docs)]

pub mod error;
pub mod expr;
pub mod index;
pub mod io;
pub mod library;
pub mod network;
pub mod patgen;
pub mod sim;
pub mod techmap;

pub use error::{LibraryError, LibraryResult, MapError, MapResult};
pub use expr::Expr;
pub use index::LibraryIndex;
pub use library::{Cell, CellLibrary, CellLibraryBuilder};
pub use network::{stats, Gate, Network, Signal};
pub use patgen::{PatternDatabase, PatternDatabaseBuilder};
pub use techmap::{area_map, MappedNetwork};
