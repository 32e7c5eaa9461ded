//! Technology mapping: covering of the subject network with library cells
//!
//! Each combinatorial node is matched against the patterns of the library index, and the
//! cheapest cover of each polarity is selected by dynamic programming in topological
//! order. Registers are mapped to the sequential cell whose controls are the closest to
//! their own. The mapped network is then rebuilt from the outputs.

mod cover;
mod mapped;
mod matcher;
mod record;

pub use cover::{area_map, AreaCover};
pub use mapped::{MappedNetwork, MappedNode, MappedPort, MappedStats};
pub use matcher::{Binding, Matcher};
pub use record::{Decision, MapRecord, RegisterChoice};
