//! Read and write networks and library indices to files

mod bench;
mod blob;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub use bench::{read_bench, write_mapped_bench, IMPLICIT_CLOCK};
pub use blob::{read_blob, write_blob, BLOB_MAGIC, BLOB_VERSION};

use crate::library::CellLibrary;
use crate::techmap::MappedNetwork;
use crate::Network;

/// Read a subject network from a file
///
/// Following extensions are supported: .bench
pub fn read_network_file(path: &Path) -> Result<Network, String> {
    match path.extension() {
        Some(s) if s == "bench" => {
            let f = File::open(path).map_err(|e| format!("Cannot open {}: {e}", path.display()))?;
            read_bench(f)
        }
        Some(s) => Err(format!("Unknown extension {}", s.to_string_lossy())),
        None => Err("No extension given".to_string()),
    }
}

/// Write a mapped network to a file
///
/// Following extensions are supported: .bench
pub fn write_mapped_file(
    path: &Path,
    network: &MappedNetwork,
    library: &CellLibrary,
) -> Result<(), String> {
    match path.extension() {
        Some(s) if s == "bench" => {
            let f =
                File::create(path).map_err(|e| format!("Cannot create {}: {e}", path.display()))?;
            let mut w = BufWriter::new(f);
            write_mapped_bench(&mut w, network, library)
                .and_then(|_| w.flush())
                .map_err(|e| e.to_string())
        }
        Some(s) => Err(format!("Unknown extension {}", s.to_string_lossy())),
        None => Err("No extension given".to_string()),
    }
}
