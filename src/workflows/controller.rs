// Workflow Controller - base stages, then the unit loop, then a one-shot terminal stage
//
// Sequencing deviations come back as guidance values (Ok). Only caller bugs
// (unknown or duplicate units, calls before initialize) are errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::state_machine::Phase;
use super::units::{DuplicateUnit, UnitError, UnitPhaseMachine, UnitStep};
use crate::catalog::{StageCatalog, StageKey};

/// Sentinel returned by every `advance` after the terminal stage went out
pub const ALREADY_DELIVERED: &str = "All prompts have been delivered.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Workflow not initialized. Call init() first.")]
    NotInitialized,
    #[error("Unknown unit '{unit}'. Registered units: [{}]", .registered.join(", "))]
    UnknownUnit { unit: String, registered: Vec<String> },
    #[error("Duplicate unit '{0}' in registration; unit identifiers must be unique")]
    DuplicateUnit(String),
}

/// How an explicitly registered empty unit set is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyUnitPolicy {
    /// Empty set is "not ready": keep asking for units
    #[default]
    AwaitRegistration,
    /// Empty set counts as complete: the terminal stage becomes available
    VacuouslyComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MacroState {
    Uninitialized,
    BaseProgression,
    UnitLoop,
    Terminal,
}

/// Outcome of `advance`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Stage { key: StageKey, text: String },
    AwaitingUnits,
    UnitsPending { pending: Vec<String> },
    Terminal { text: String },
    AlreadyDelivered,
}

impl fmt::Display for Advance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advance::Stage { text, .. } | Advance::Terminal { text } => f.write_str(text),
            Advance::AwaitingUnits => f.write_str(
                "Register units first via register_units([...]), e.g. register_units([\"exp1a\", \"exp1b\"]). \
                 Then call unit_step(\"<unit>\") to receive implementation/execution prompts.",
            ),
            Advance::UnitsPending { pending } => write!(
                f,
                "Finish per-unit prompts before the final stage. Pending units (in order): {}. \
                 Use unit_step(\"<unit>\") to continue.",
                pending.join(", ")
            ),
            Advance::AlreadyDelivered => f.write_str(ALREADY_DELIVERED),
        }
    }
}

/// Outcome of `register_units`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Registered { units: Vec<String> },
    NoUnitsProvided,
    NotReady { remaining_stages: usize },
}

impl fmt::Display for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Registration::Registered { units } => {
                write!(f, "Units registered (in order): {}", units.join(", "))
            }
            Registration::NoUnitsProvided => f.write_str(
                "Units registered: none provided. Call register_units([...]) with the ordered unit identifiers.",
            ),
            Registration::NotReady { remaining_stages } => write!(
                f,
                "Complete the base stages via next_step() before registering units ({remaining_stages} remaining)."
            ),
        }
    }
}

/// Outcome of `unit_step`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitReply {
    Step(UnitStep),
    NotReady { remaining_stages: usize },
    NoUnitsRegistered,
    OutOfOrder { requested: String, next: String },
}

impl fmt::Display for UnitReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitReply::Step(step) => write!(f, "{step}"),
            UnitReply::NotReady { remaining_stages } => write!(
                f,
                "Complete the base stages via next_step() before running unit-specific prompts ({remaining_stages} remaining)."
            ),
            UnitReply::NoUnitsRegistered => {
                f.write_str("No units registered. Call register_units([...]) first.")
            }
            UnitReply::OutOfOrder { requested, next } => write!(
                f,
                "Next unit in sequence is '{next}'. Finish it before moving to '{requested}'."
            ),
        }
    }
}

/// Serializable view of the workflow, for logs and status output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowSnapshot {
    pub macro_state: MacroState,
    pub stage_index: Option<usize>,
    pub stage: Option<StageKey>,
    pub units: Vec<(String, Phase)>,
    pub terminal_delivered: bool,
}

#[derive(Debug, Default)]
struct WorkflowState {
    stage_index: usize,
    units: UnitPhaseMachine,
    units_registered: bool,
    terminal_delivered: bool,
}

#[derive(Debug)]
pub struct WorkflowController {
    catalog: Arc<StageCatalog>,
    policy: EmptyUnitPolicy,
    state: Option<WorkflowState>,
}

impl Default for WorkflowController {
    fn default() -> Self {
        Self::new(Arc::new(StageCatalog::builtin()))
    }
}

impl WorkflowController {
    pub fn new(catalog: Arc<StageCatalog>) -> Self {
        Self {
            catalog,
            policy: EmptyUnitPolicy::default(),
            state: None,
        }
    }

    pub fn with_empty_unit_policy(mut self, policy: EmptyUnitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn catalog(&self) -> &StageCatalog {
        &self.catalog
    }

    /// Reset everything and hand out the first base stage
    pub fn initialize(&mut self) -> String {
        self.state = Some(WorkflowState::default());
        let key = self.catalog.base_stages()[0];
        tracing::info!(stage = %key, "Workflow initialized");
        self.catalog.render(key).to_string()
    }

    pub fn advance(&mut self) -> Result<Advance, WorkflowError> {
        let catalog = Arc::clone(&self.catalog);
        let policy = self.policy;
        let state = self.state_mut()?;
        let base = catalog.base_stages();

        if state.stage_index + 1 < base.len() {
            state.stage_index += 1;
            let key = base[state.stage_index];
            tracing::info!(stage = %key, index = state.stage_index, "Advanced to base stage");
            return Ok(Advance::Stage {
                key,
                text: catalog.render(key).to_string(),
            });
        }

        if state.terminal_delivered {
            return Ok(Advance::AlreadyDelivered);
        }

        let empty_counts_as_complete =
            policy == EmptyUnitPolicy::VacuouslyComplete && state.units_registered;
        if state.units.is_empty() && !empty_counts_as_complete {
            tracing::warn!("Base stages exhausted but no units registered");
            return Ok(Advance::AwaitingUnits);
        }

        if !state.units.all_complete() {
            let pending = state.units.pending();
            tracing::warn!(pending = ?pending, "Terminal stage requested with units pending");
            return Ok(Advance::UnitsPending { pending });
        }

        state.terminal_delivered = true;
        tracing::info!(stage = %StageKey::Report, "Terminal stage delivered");
        Ok(Advance::Terminal {
            text: catalog.render(StageKey::Report).to_string(),
        })
    }

    pub fn register_units(&mut self, ids: Vec<String>) -> Result<Registration, WorkflowError> {
        let remaining = self.remaining_base_stages()?;
        let state = self.state_mut()?;

        if remaining > 0 {
            tracing::warn!(remaining, "Unit registration attempted before base stages finished");
            return Ok(Registration::NotReady {
                remaining_stages: remaining,
            });
        }

        state.units.register(ids).map_err(|DuplicateUnit(unit)| {
            tracing::error!(unit = %unit, "Duplicate unit in registration");
            WorkflowError::DuplicateUnit(unit)
        })?;
        state.units_registered = true;

        if state.units.is_empty() {
            Ok(Registration::NoUnitsProvided)
        } else {
            Ok(Registration::Registered {
                units: state.units.units().to_vec(),
            })
        }
    }

    pub fn unit_step(&mut self, id: &str) -> Result<UnitReply, WorkflowError> {
        let remaining = self.remaining_base_stages()?;
        let catalog = Arc::clone(&self.catalog);
        let state = self.state_mut()?;

        if remaining > 0 {
            tracing::warn!(unit = %id, remaining, "Unit step requested before base stages finished");
            return Ok(UnitReply::NotReady {
                remaining_stages: remaining,
            });
        }

        if state.units.is_empty() {
            return Ok(UnitReply::NoUnitsRegistered);
        }

        match state.units.step(id, &catalog) {
            Ok(step) => Ok(UnitReply::Step(step)),
            Err(UnitError::OutOfOrder { requested, next }) => {
                tracing::warn!(requested = %requested, next = %next, "Unit requested out of order");
                Ok(UnitReply::OutOfOrder { requested, next })
            }
            Err(UnitError::UnknownUnit { unit, registered }) => {
                tracing::error!(unit = %unit, "Unknown unit requested");
                Err(WorkflowError::UnknownUnit { unit, registered })
            }
        }
    }

    pub fn macro_state(&self) -> MacroState {
        match &self.state {
            None => MacroState::Uninitialized,
            Some(state) if state.stage_index + 1 < self.catalog.base_stages().len() => {
                MacroState::BaseProgression
            }
            Some(state) if state.terminal_delivered => MacroState::Terminal,
            Some(_) => MacroState::UnitLoop,
        }
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        let base = self.catalog.base_stages();
        WorkflowSnapshot {
            macro_state: self.macro_state(),
            stage_index: self.state.as_ref().map(|s| s.stage_index),
            stage: self.state.as_ref().map(|s| base[s.stage_index]),
            units: self
                .state
                .as_ref()
                .map(|s| s.units.phases())
                .unwrap_or_default(),
            terminal_delivered: self.state.as_ref().is_some_and(|s| s.terminal_delivered),
        }
    }

    fn remaining_base_stages(&self) -> Result<usize, WorkflowError> {
        let state = self.state.as_ref().ok_or(WorkflowError::NotInitialized)?;
        Ok(self.catalog.base_stages().len() - 1 - state.stage_index)
    }

    fn state_mut(&mut self) -> Result<&mut WorkflowState, WorkflowError> {
        self.state.as_mut().ok_or(WorkflowError::NotInitialized)
    }
}
