use anyhow::Result;
use std::path::PathBuf;

use super::Command;
use crate::config::SequencerConfig;

pub struct ConfigCommand {
    config: SequencerConfig,
    output: Option<PathBuf>,
}

impl ConfigCommand {
    pub fn new(config: SequencerConfig, output: Option<PathBuf>) -> Self {
        Self { config, output }
    }
}

impl Command for ConfigCommand {
    async fn execute(&self) -> Result<()> {
        match &self.output {
            Some(path) => {
                self.config.save_to_file(path)?;
                println!("✅ Configuration written to {}", path.display());
            }
            None => print!("{}", toml::to_string_pretty(&self.config)?),
        }
        Ok(())
    }
}
