//! CLI tool for patching broken Forge and modlauncher jars.

mod commands;
mod exit_codes;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Offline patcher for known-broken Minecraft Forge and modlauncher jars
#[derive(Parser)]
#[command(name = "forgefix")]
#[command(author, version, about = "Offline jar patcher for broken Forge libraries", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print what the patcher is doing to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a catalog patch to a jar, in place (alias: p)
    #[command(alias = "p")]
    Patch {
        /// Name of the patch to apply (see `list`)
        patch_name: String,

        /// The jar to patch
        archive: PathBuf,
    },

    /// List the patch catalog (alias: l)
    #[command(alias = "l")]
    List,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let exit_code = match cli.command {
        Commands::Patch {
            patch_name,
            archive,
        } => commands::patch(&patch_name, &archive),
        Commands::List => commands::list(),
    };

    std::process::exit(exit_code.code());
}
