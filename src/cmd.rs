//! Command line interface

use std::path::PathBuf;

use cellmap::io::{read_network_file, write_mapped_file};
use cellmap::library::generic_library;
use cellmap::network::stats::stats;
use cellmap::{area_map, LibraryIndex, PatternDatabaseBuilder};
use clap::{Args, Parser, Subcommand};
use kdam::{tqdm, BarExt};
use log::info;

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Command line arguments
#[derive(Subcommand)]
pub enum Commands {
    /// Generate the library index of the built-in generic library
    ///
    /// Patterns are generated for each cell, then the index is written as a binary blob
    /// that can be reused by the other commands.
    #[clap(alias = "gen")]
    GenLib(GenLibArgs),

    /// Show the content of a library index
    ///
    /// Will print the cells, the function groups with their patterns, and the sequential
    /// classes.
    #[clap()]
    Show(ShowArgs),

    /// Map a logic network to library cells
    ///
    /// The network is covered with the cells of the library to minimize the total area.
    /// Statistics are printed, and the mapped netlist can be written to a file.
    #[clap()]
    Map(MapArgs),
}

impl Commands {
    pub fn run(&self) -> Result<(), String> {
        match self {
            Commands::GenLib(a) => a.run(),
            Commands::Show(a) => a.run(),
            Commands::Map(a) => a.run(),
        }
    }
}

/// Command arguments for library generation
#[derive(Args)]
pub struct GenLibArgs {
    /// Output file for the library index
    #[arg(short = 'o', long)]
    output: PathBuf,
}

impl GenLibArgs {
    pub fn run(&self) -> Result<(), String> {
        let library = generic_library();
        let mut builder = PatternDatabaseBuilder::new();
        let mut progress = tqdm!(total = library.nb_cells());
        progress.set_description("Cells processed");
        let mut skipped = 0;
        for (i, cell) in library.cells().iter().enumerate() {
            if !builder.add_cell(i, cell) {
                skipped += 1;
            }
            progress.set_postfix(format!("cell={}", cell.name()));
            progress.update(1).map_err(|e| e.to_string())?;
        }
        progress
            .write(format!(
                "Processed {} cells, {} skipped",
                library.nb_cells(),
                skipped
            ))
            .map_err(|e| e.to_string())?;
        let index = LibraryIndex::new(library, builder.freeze());
        index.save_file(&self.output).map_err(|e| e.to_string())?;
        info!(
            "Wrote library index with {} patterns to {}",
            index.nb_patterns(),
            self.output.display()
        );
        Ok(())
    }
}

/// Command arguments for library informations
#[derive(Args)]
pub struct ShowArgs {
    /// Library index to show
    file: PathBuf,
}

impl ShowArgs {
    pub fn run(&self) -> Result<(), String> {
        let index = LibraryIndex::load_file(&self.file).map_err(|e| e.to_string())?;
        println!("{index}");
        Ok(())
    }
}

/// Command arguments for technology mapping
#[derive(Args)]
pub struct MapArgs {
    /// Network to map
    file: PathBuf,

    /// Library index; the built-in generic library is used if not given
    #[arg(short = 'l', long)]
    library: Option<PathBuf>,

    /// Output file for the mapped netlist
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

impl MapArgs {
    pub fn run(&self) -> Result<(), String> {
        let index = match &self.library {
            Some(path) => LibraryIndex::load_file(path).map_err(|e| e.to_string())?,
            None => LibraryIndex::build(generic_library()),
        };
        let network = read_network_file(&self.file)?;
        println!("Network stats:\n{}\n", stats(&network));
        let mapped = area_map(&network, &index).map_err(|e| e.to_string())?;
        println!("Mapped {}", mapped.stats(index.library()));
        if let Some(path) = &self.output {
            write_mapped_file(path, &mapped, index.library())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gen_show_map() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("generic.bin");
        GenLibArgs {
            output: lib.clone(),
        }
        .run()
        .unwrap();
        ShowArgs { file: lib.clone() }.run().unwrap();

        let design = dir.path().join("design.bench");
        std::fs::write(
            &design,
            "INPUT(a)\nINPUT(b)\nINPUT(c)\nOUTPUT(y)\nx = AND(a, b)\ny = NOR(x, c)\n",
        )
        .unwrap();
        let netlist = dir.path().join("mapped.bench");
        MapArgs {
            file: design,
            library: Some(lib),
            output: Some(netlist.clone()),
        }
        .run()
        .unwrap();
        let s = std::fs::read_to_string(netlist).unwrap();
        assert!(s.contains("AOI21("));
    }

    #[test]
    fn test_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.bin");
        assert!(ShowArgs {
            file: missing.clone()
        }
        .run()
        .is_err());
        let garbage = dir.path().join("garbage.bin");
        std::fs::write(&garbage, b"not a library").unwrap();
        assert!(ShowArgs { file: garbage }.run().is_err());
        assert!(MapArgs {
            file: dir.path().join("design.blif"),
            library: None,
            output: None,
        }
        .run()
        .is_err());
    }
}
