use anyhow::Result;
use clap::Parser;

use stage_sequencer::cli::commands::{
    Command, ConfigCommand, ServeCommand, ShowCommand, StagesCommand,
};
use stage_sequencer::cli::{Cli, Commands};
use stage_sequencer::{init_telemetry, shutdown_telemetry, SequencerConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    SequencerConfig::load_env_file()?;
    let config = SequencerConfig::load(cli.config.as_deref())?;
    init_telemetry(&config.observability)?;

    let result = tokio::runtime::Runtime::new()?.block_on(async {
        match cli.command.unwrap_or(Commands::Serve) {
            Commands::Serve => ServeCommand::new(config).execute().await,
            Commands::Stages => StagesCommand::new().execute().await,
            Commands::Show { stage, unit } => {
                ShowCommand::new(config, stage, unit).execute().await
            }
            Commands::Config { output } => ConfigCommand::new(config, output).execute().await,
        }
    });

    shutdown_telemetry();
    result
}
