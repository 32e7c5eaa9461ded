//! Offline pattern generation: function canonization, pattern expansion and the frozen database

mod canon;
mod database;
mod generator;
mod npn;
mod pattern;

pub use canon::{
    FunctionCanonicalizer, BUFFER_GROUP, CONST0_GROUP, CONST1_GROUP, INVERTER_GROUP,
};
pub use database::{
    FunctionGroup, PatternDatabase, PatternDatabaseBuilder, RepresentativeClass,
    SequentialClass, SequentialGroup,
};
pub use generator::{binary_tree_templates, PatternGenerator};
pub use npn::{bits_to_lut, lut_to_bits, npn_canonize, table_mask, NpnMap, MAX_NPN_INPUTS};
pub use pattern::{PatternArena, PatternEdge, PatternGraph, PatternNode};
