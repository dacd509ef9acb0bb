use anyhow::Result;
use std::sync::Arc;

use super::Command;
use crate::config::SequencerConfig;
use crate::server::McpServer;
use crate::workflows::WorkflowController;

pub struct ServeCommand {
    config: SequencerConfig,
}

impl ServeCommand {
    pub fn new(config: SequencerConfig) -> Self {
        Self { config }
    }
}

impl Command for ServeCommand {
    async fn execute(&self) -> Result<()> {
        let catalog = Arc::new(self.config.stage_catalog()?);
        let controller = WorkflowController::new(catalog)
            .with_empty_unit_policy(self.config.workflow.empty_unit_policy);

        tracing::info!(
            policy = ?self.config.workflow.empty_unit_policy,
            templates = ?self.config.workflow.templates_file,
            "Starting stage sequencer"
        );

        let mut server = McpServer::new(self.config.server.clone(), controller);
        server.serve_stdio().await?;
        Ok(())
    }
}
