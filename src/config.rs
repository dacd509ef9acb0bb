use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::StageCatalog;
use crate::workflows::EmptyUnitPolicy;

/// Main configuration structure for the stage sequencer
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Tool server identity
    pub server: ServerConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
    /// Stage progression settings
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Name reported in the initialize handshake
    pub name: String,
    /// Version reported in the initialize handshake
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Emit logs as JSON lines
    pub json_logs: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Treatment of an explicitly registered empty unit set
    pub empty_unit_policy: EmptyUnitPolicy,
    /// Optional TOML file overriding stage texts. A relative path is taken
    /// relative to the `--config` file when one is given, otherwise the
    /// working directory.
    pub templates_file: Option<PathBuf>,
}

impl WorkflowConfig {
    fn resolve_relative_to(&mut self, dir: &Path) {
        if let Some(path) = &self.templates_file {
            if path.is_relative() {
                self.templates_file = Some(dir.join(path));
            }
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "stage-sequencer".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl SequencerConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. stage-sequencer.toml in the working directory
    /// 3. An explicit file passed on the command line
    /// 4. Environment variables (prefixed with STAGE_SEQUENCER__)
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if Path::new("stage-sequencer.toml").exists() {
            builder = builder.add_source(File::with_name("stage-sequencer"));
        }

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("STAGE_SEQUENCER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: SequencerConfig = builder.build()?.try_deserialize()?;
        if let Some(dir) = explicit.and_then(Path::parent) {
            config.workflow.resolve_relative_to(dir);
        }
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
        }
        Ok(())
    }

    /// Stage catalog with any configured overrides applied
    pub fn stage_catalog(&self) -> Result<StageCatalog> {
        match &self.workflow.templates_file {
            Some(path) => Ok(StageCatalog::from_templates_file(path)?),
            None => Ok(StageCatalog::builtin()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StageKey;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SequencerConfig::default();
        assert_eq!(config.server.name, "stage-sequencer");
        assert_eq!(config.observability.log_level, "info");
        assert!(!config.observability.json_logs);
        assert_eq!(
            config.workflow.empty_unit_policy,
            EmptyUnitPolicy::AwaitRegistration
        );
        assert!(config.workflow.templates_file.is_none());
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[workflow]").unwrap();
        writeln!(file, "empty_unit_policy = \"vacuously_complete\"").unwrap();
        writeln!(file, "[observability]").unwrap();
        writeln!(file, "json_logs = true").unwrap();

        let config = SequencerConfig::load(Some(file.path())).unwrap();
        assert_eq!(
            config.workflow.empty_unit_policy,
            EmptyUnitPolicy::VacuouslyComplete
        );
        assert!(config.observability.json_logs);
        assert_eq!(config.observability.log_level, "info");
        assert_eq!(config.server.name, "stage-sequencer");
    }

    #[test]
    fn test_save_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = SequencerConfig::default();
        config.workflow.empty_unit_policy = EmptyUnitPolicy::VacuouslyComplete;
        config.save_to_file(&path).unwrap();

        let loaded = SequencerConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.workflow, config.workflow);
    }

    #[test]
    fn test_templates_file_relative_to_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("settings");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("templates.toml"), "report = \"Nested summary.\"\n").unwrap();
        let config_path = nested.join("sequencer.toml");
        std::fs::write(&config_path, "[workflow]\ntemplates_file = \"templates.toml\"\n").unwrap();

        let config = SequencerConfig::load(Some(&config_path)).unwrap();
        assert_eq!(
            config.workflow.templates_file,
            Some(nested.join("templates.toml"))
        );
        let catalog = config.stage_catalog().unwrap();
        assert_eq!(catalog.render(StageKey::Report), "Nested summary.");
    }

    #[test]
    fn test_absolute_templates_file_left_alone() {
        let mut workflow = WorkflowConfig {
            templates_file: Some(PathBuf::from("/etc/stage-sequencer/templates.toml")),
            ..Default::default()
        };
        workflow.resolve_relative_to(Path::new("/somewhere/else"));
        assert_eq!(
            workflow.templates_file,
            Some(PathBuf::from("/etc/stage-sequencer/templates.toml"))
        );
    }

    #[test]
    fn test_stage_catalog_uses_templates_file() {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("templates.toml");
        std::fs::write(&templates, "report = \"Summarize everything.\"\n").unwrap();

        let mut config = SequencerConfig::default();
        config.workflow.templates_file = Some(templates);
        let catalog = config.stage_catalog().unwrap();
        assert_eq!(catalog.render(StageKey::Report), "Summarize everything.");
    }
}
