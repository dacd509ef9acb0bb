// Stage Catalog - ordered stage keys and the text handed out for each

mod builtin;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Placeholder substituted with the unit identifier in per-unit templates
pub const UNIT_PLACEHOLDER: &str = "{unit}";

/// Every stage the workflow can hand out text for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKey {
    Overview,
    Preparation,
    Identification,
    Flowcharts,
    VisualParameters,
    DataCheck,
    CodeGuidelines,
    /// First per-unit phase: begin execution of a unit
    UnitImplementation,
    /// Second per-unit phase: finalize and validate a unit
    UnitExecution,
    /// One-shot terminal stage
    Report,
}

/// Where a stage sits in the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Base,
    Unit,
    Terminal,
}

impl StageKey {
    /// Base progression, in delivery order
    pub const BASE: [StageKey; 7] = [
        StageKey::Overview,
        StageKey::Preparation,
        StageKey::Identification,
        StageKey::Flowcharts,
        StageKey::VisualParameters,
        StageKey::DataCheck,
        StageKey::CodeGuidelines,
    ];

    pub const ALL: [StageKey; 10] = [
        StageKey::Overview,
        StageKey::Preparation,
        StageKey::Identification,
        StageKey::Flowcharts,
        StageKey::VisualParameters,
        StageKey::DataCheck,
        StageKey::CodeGuidelines,
        StageKey::UnitImplementation,
        StageKey::UnitExecution,
        StageKey::Report,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKey::Overview => "overview",
            StageKey::Preparation => "preparation",
            StageKey::Identification => "identification",
            StageKey::Flowcharts => "flowcharts",
            StageKey::VisualParameters => "visual_parameters",
            StageKey::DataCheck => "data_check",
            StageKey::CodeGuidelines => "code_guidelines",
            StageKey::UnitImplementation => "unit_implementation",
            StageKey::UnitExecution => "unit_execution",
            StageKey::Report => "report",
        }
    }

    pub fn kind(&self) -> StageKind {
        match self {
            StageKey::UnitImplementation | StageKey::UnitExecution => StageKind::Unit,
            StageKey::Report => StageKind::Terminal,
            _ => StageKind::Base,
        }
    }

    fn builtin_text(&self) -> &'static str {
        match self {
            StageKey::Overview => builtin::OVERVIEW,
            StageKey::Preparation => builtin::PREPARATION,
            StageKey::Identification => builtin::IDENTIFICATION,
            StageKey::Flowcharts => builtin::FLOWCHARTS,
            StageKey::VisualParameters => builtin::VISUAL_PARAMETERS,
            StageKey::DataCheck => builtin::DATA_CHECK,
            StageKey::CodeGuidelines => builtin::CODE_GUIDELINES,
            StageKey::UnitImplementation => builtin::UNIT_IMPLEMENTATION,
            StageKey::UnitExecution => builtin::UNIT_EXECUTION,
            StageKey::Report => builtin::REPORT,
        }
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageKey {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StageKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| CatalogError::UnknownStage(s.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Unknown stage '{0}'")]
    UnknownStage(String),
    #[error("Template for '{stage}' must contain the {{unit}} placeholder")]
    MissingPlaceholder { stage: StageKey },
    #[error("Template for '{stage}' is empty")]
    EmptyText { stage: StageKey },
    #[error("Failed to read templates file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse templates file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Immutable stage catalog. Base order is fixed; only the texts can be overridden.
#[derive(Debug, Clone)]
pub struct StageCatalog {
    texts: HashMap<StageKey, String>,
}

impl Default for StageCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StageCatalog {
    pub fn builtin() -> Self {
        let texts = StageKey::ALL
            .iter()
            .map(|key| (*key, key.builtin_text().trim().to_string()))
            .collect();
        Self { texts }
    }

    /// Built-in catalog with selected stage texts replaced
    pub fn with_overrides(overrides: HashMap<String, String>) -> Result<Self, CatalogError> {
        let mut catalog = Self::builtin();
        for (name, text) in overrides {
            let key: StageKey = name.parse()?;
            let text = text.trim();
            if text.is_empty() {
                return Err(CatalogError::EmptyText { stage: key });
            }
            if key.kind() == StageKind::Unit && !text.contains(UNIT_PLACEHOLDER) {
                return Err(CatalogError::MissingPlaceholder { stage: key });
            }
            tracing::debug!(stage = %key, "Overriding built-in stage text");
            catalog.texts.insert(key, text.to_string());
        }
        Ok(catalog)
    }

    /// Load overrides from a TOML table of `stage_key = "text"` entries
    pub fn from_templates_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let overrides: HashMap<String, String> = toml::from_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            overrides = overrides.len(),
            "Loaded stage templates"
        );
        Self::with_overrides(overrides)
    }

    pub fn base_stages(&self) -> &'static [StageKey] {
        &StageKey::BASE
    }

    /// Raw text for a stage. Per-unit stages still carry the placeholder.
    pub fn render(&self, key: StageKey) -> &str {
        self.texts
            .get(&key)
            .map(String::as_str)
            .unwrap_or_else(|| key.builtin_text().trim())
    }

    /// Per-unit text with the unit identifier substituted
    pub fn render_unit(&self, key: StageKey, unit: &str) -> String {
        self.render(key).replace(UNIT_PLACEHOLDER, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_base_stage_order_is_fixed() {
        let catalog = StageCatalog::builtin();
        let names: Vec<&str> = catalog.base_stages().iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "overview",
                "preparation",
                "identification",
                "flowcharts",
                "visual_parameters",
                "data_check",
                "code_guidelines",
            ]
        );
        assert!(catalog.base_stages().iter().all(|k| k.kind() == StageKind::Base));
    }

    #[test]
    fn test_render_is_trimmed_and_deterministic() {
        let catalog = StageCatalog::builtin();
        let first = catalog.render(StageKey::Overview).to_string();
        assert_eq!(first, catalog.render(StageKey::Overview));
        assert!(!first.starts_with('\n'));
        assert!(first.starts_with("You are reconstructing"));
        assert!(catalog.render(StageKey::Report).starts_with("Step 4: Report"));
    }

    #[test]
    fn test_render_unit_substitutes_every_placeholder() {
        let catalog = StageCatalog::builtin();
        let text = catalog.render_unit(StageKey::UnitExecution, "exp1a");
        assert!(text.contains("Code Execution - Step 3 (exp1a)"));
        assert!(text.contains("expectations for exp1a"));
        assert!(!text.contains(UNIT_PLACEHOLDER));
    }

    #[test]
    fn test_stage_key_parse() {
        assert_eq!("data_check".parse::<StageKey>().unwrap(), StageKey::DataCheck);
        assert!(matches!(
            "step5".parse::<StageKey>(),
            Err(CatalogError::UnknownStage(name)) if name == "step5"
        ));
    }

    #[test]
    fn test_overrides_replace_text() {
        let overrides = HashMap::from([("report".to_string(), "  Write it up.  ".to_string())]);
        let catalog = StageCatalog::with_overrides(overrides).unwrap();
        assert_eq!(catalog.render(StageKey::Report), "Write it up.");
        assert!(catalog.render(StageKey::Overview).starts_with("You are reconstructing"));
    }

    #[test]
    fn test_unit_override_requires_placeholder() {
        let overrides = HashMap::from([(
            "unit_implementation".to_string(),
            "Implement the next one".to_string(),
        )]);
        let err = StageCatalog::with_overrides(overrides).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::MissingPlaceholder { stage: StageKey::UnitImplementation }
        ));
    }

    #[test]
    fn test_empty_override_rejected() {
        let overrides = HashMap::from([("overview".to_string(), "   ".to_string())]);
        assert!(matches!(
            StageCatalog::with_overrides(overrides),
            Err(CatalogError::EmptyText { stage: StageKey::Overview })
        ));
    }

    #[test]
    fn test_templates_file_loading() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "preparation = \"Read the paper twice.\"").unwrap();
        writeln!(file, "unit_execution = \"Run {{unit}} in full.\"").unwrap();

        let catalog = StageCatalog::from_templates_file(file.path()).unwrap();
        assert_eq!(catalog.render(StageKey::Preparation), "Read the paper twice.");
        assert_eq!(
            catalog.render_unit(StageKey::UnitExecution, "exp2"),
            "Run exp2 in full."
        );
    }

    #[test]
    fn test_templates_file_missing() {
        let err = StageCatalog::from_templates_file("/nonexistent/templates.toml").unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
