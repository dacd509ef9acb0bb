use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "stage-sequencer")]
#[command(about = "Stage-sequencing tool server for multi-phase agent workflows")]
#[command(long_about = "stage-sequencer hands out stage prompts in a fixed order: base stages first, \
                       then a per-unit implementation/execution loop in registration order, then a \
                       one-shot final stage. Run 'stage-sequencer serve' to expose it as MCP tools on stdio.")]
pub struct Cli {
    /// Configuration file layered over stage-sequencer.toml and defaults
    #[arg(long, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the MCP tool server on stdin/stdout (default)
    Serve,
    /// List stage keys in delivery order
    Stages,
    /// Print the text for one stage
    Show {
        /// Stage key, e.g. preparation or unit_execution
        stage: String,
        /// Unit identifier substituted into per-unit stages
        #[arg(long, help = "Unit identifier for per-unit stages")]
        unit: Option<String>,
    },
    /// Print or save the effective configuration
    Config {
        /// Write the configuration to this file instead of stdout
        #[arg(long, help = "File path to write the TOML configuration")]
        output: Option<PathBuf>,
    },
}
