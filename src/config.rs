//! Configuration for the interpreter CLI.
//!
//! Handles:
//! - Command-line argument parsing
//! - Machine profile resolution

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::profile::MachineProfile;

/// Command-line arguments for the G-code interpreter
#[derive(Debug, Parser)]
#[command(name = "gcode-interp")]
#[command(about = "Run a G-code program through the interpreter core")]
#[command(version)]
pub struct Args {
    /// G-code program to run; reads stdin when omitted
    pub input: Option<PathBuf>,

    /// Machine profile TOML file to load
    #[arg(long, help = "Path to a machine profile TOML file")]
    pub profile: Option<PathBuf>,

    /// Custom directory to search for a default profile
    #[arg(long, help = "Directory containing machine profile TOML files")]
    pub profile_dir: Option<PathBuf>,

    /// Emit the final machine state as JSON
    #[arg(long)]
    pub json: bool,

    /// Log level for the interpreter
    #[arg(
        long,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    /// Program file, or stdin when None
    pub input: Option<PathBuf>,
    /// Profile file explicitly set via command line
    pub profile_path: Option<PathBuf>,
    /// Directories to search for a default profile
    pub profile_dirs: Vec<PathBuf>,
    /// Emit JSON state instead of the text summary
    pub json: bool,
    /// Log level
    pub log_level: String,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: Args) -> Result<Self> {
        // Determine profile directories
        let mut profile_dirs = Vec::new();

        // Add user-specified directory if provided
        if let Some(custom_dir) = args.profile_dir {
            profile_dirs.push(custom_dir);
        }

        // Add default user config directory
        if let Some(config_dir) = dirs::config_dir() {
            profile_dirs.push(config_dir.join("gcode-interp").join("profiles"));
        }

        Ok(Config {
            input: args.input,
            profile_path: args.profile,
            profile_dirs,
            json: args.json,
            log_level: args.log_level,
        })
    }

    /// Resolve the machine profile: explicit path first, then a
    /// `default.toml` found in the search directories, then the embedded
    /// default.
    pub fn resolve_profile(&self) -> Result<MachineProfile> {
        if let Some(path) = &self.profile_path {
            return MachineProfile::load(path);
        }
        if let Some(found) = MachineProfile::find_default(&self.profile_dirs) {
            log::debug!("using profile {}", found.display());
            return MachineProfile::load(&found);
        }
        Ok(MachineProfile::embedded_default())
    }
}
