use anyhow::{bail, Result};

use super::Command;
use crate::catalog::{StageKey, StageKind};
use crate::config::SequencerConfig;

pub struct ShowCommand {
    config: SequencerConfig,
    stage: String,
    unit: Option<String>,
}

impl ShowCommand {
    pub fn new(config: SequencerConfig, stage: String, unit: Option<String>) -> Self {
        Self {
            config,
            stage,
            unit,
        }
    }

    /// Text that would be handed out for the stage
    pub fn render(&self) -> Result<String> {
        let key: StageKey = self.stage.parse()?;
        let catalog = self.config.stage_catalog()?;

        match (key.kind(), &self.unit) {
            (StageKind::Unit, Some(unit)) => Ok(catalog.render_unit(key, unit)),
            (StageKind::Unit, None) => bail!("Stage '{key}' is per-unit; pass --unit <id>"),
            (_, Some(_)) => bail!("Stage '{key}' does not take a unit"),
            (_, None) => Ok(catalog.render(key).to_string()),
        }
    }
}

impl Command for ShowCommand {
    async fn execute(&self) -> Result<()> {
        println!("{}", self.render()?);
        Ok(())
    }
}
