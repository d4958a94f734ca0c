use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tlb_dispatch::{DEFAULT_TYPE_LIBRARY_FILE, InterfaceId, TypeLibrarySource};

/// Load a type library the way the IDispatch adapter does and resolve
/// member names to dispatch IDs.
#[derive(Debug, Parser)]
#[command(name = "tlb-probe", version, about)]
pub struct Cli {
    /// Interface to look up, e.g. {00020400-0000-0000-C000-000000000046}.
    #[arg(short, long)]
    pub interface: InterfaceId,

    /// Type library file, looked up next to this executable.
    #[arg(short, long, default_value = DEFAULT_TYPE_LIBRARY_FILE)]
    pub type_library: PathBuf,

    /// Load --type-library as given instead of next to this executable.
    #[arg(long)]
    pub path: bool,

    /// Write logs to a daily rolling file in this directory instead of stderr.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Member names to resolve.
    pub names: Vec<String>,
}

impl Cli {
    pub fn source(&self) -> TypeLibrarySource {
        if self.path {
            TypeLibrarySource::Path(self.type_library.clone())
        } else {
            TypeLibrarySource::ExecutableRelative(self.type_library.clone())
        }
    }

    pub fn default_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
