//! Standard cell library: cells, pins, functions and sequential descriptions

mod builtin;
mod cell;

pub use builtin::generic_library;
pub use cell::{
    Cell, CellFunction, CellLibrary, CellLibraryBuilder, PinLayout, SequentialInfo, Sense,
};
