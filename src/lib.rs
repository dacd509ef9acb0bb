// Stage Sequencer Library - ordered stage prompts for multi-phase agent workflows
// This exposes the core components for testing and integration

pub mod catalog;
pub mod cli;
pub mod config;
pub mod observability;
pub mod server;
pub mod telemetry;
pub mod workflows;

// Re-export key types for easy access
pub use catalog::{CatalogError, StageCatalog, StageKey, StageKind};
pub use config::SequencerConfig;
pub use observability::{OperationTimer, ToolCallMetrics};
pub use server::{McpServer, ServerError};
pub use telemetry::{generate_correlation_id, init_telemetry, shutdown_telemetry};
pub use workflows::{
    Advance, EmptyUnitPolicy, MacroState, Phase, Registration, UnitReply, UnitStep,
    WorkflowController, WorkflowError, WorkflowSnapshot,
};
