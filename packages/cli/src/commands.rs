use std::io::{self, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use layerfs::{EntryKind, Metadata, Vfs};
use tracing::debug;

/// layerfs - inspect a layered overlay filesystem
#[derive(Parser, Debug)]
#[command(name = "layerfs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON overlay configuration
    #[arg(short, long)]
    pub config: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List a directory
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Print a file's contents
    Cat { path: String },
    /// Show a node's metadata
    Stat { path: String },
}

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("read config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Layerfs(#[from] layerfs::Error),

    #[error("write output: {0}")]
    Output(#[from] io::Error),
}

/// Provision the configured overlay, run one command, then clean up.
pub fn dispatch(cli: Cli, out: &mut impl Write) -> Result<(), CliError> {
    let json = std::fs::read_to_string(&cli.config).map_err(|source| CliError::Config {
        path: cli.config.clone(),
        source,
    })?;

    let mut vfs = Vfs::from_json(&json)?;
    vfs.provision()?;
    debug!(command = ?cli.command, "running command");

    let result = run(&vfs, &cli.command, out);
    vfs.cleanup()?;
    result
}

fn run(vfs: &Vfs, command: &Command, out: &mut impl Write) -> Result<(), CliError> {
    match command {
        Command::Ls { path } => {
            for entry in vfs.read_dir(path)? {
                let suffix = if entry.metadata.is_dir() { "/" } else { "" };
                writeln!(out, "{:>10}  {}{}", entry.metadata.size, entry.name, suffix)?;
            }
        }
        Command::Cat { path } => {
            out.write_all(&vfs.read(path)?)?;
        }
        Command::Stat { path } => {
            write_stat(out, path, &vfs.stat(path)?)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn write_stat(out: &mut impl Write, path: &str, metadata: &Metadata) -> io::Result<()> {
    let kind = match metadata.kind {
        EntryKind::File => "file",
        EntryKind::Directory => "directory",
    };
    writeln!(out, "path:     {path}")?;
    writeln!(out, "kind:     {kind}")?;
    writeln!(out, "size:     {}", metadata.size)?;
    writeln!(out, "mode:     {:04o}", metadata.mode)?;
    match metadata.modified {
        Some(time) => writeln!(out, "modified: {}", DateTime::<Utc>::from(time).to_rfc3339()),
        None => writeln!(out, "modified: -"),
    }
}
