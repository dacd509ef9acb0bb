// Unit Phase Machine - ordered set of unit lifecycles
// A unit may only move once every unit registered before it is complete.

use std::collections::{HashMap, HashSet};
use std::fmt;

use statig::prelude::*;
use thiserror::Error;

use super::state_machine::{Phase, UnitEvent, UnitLifecycle};
use crate::catalog::{StageCatalog, StageKey};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("Unit '{unit}' is not registered. Registered units: [{}]", .registered.join(", "))]
    UnknownUnit { unit: String, registered: Vec<String> },
    #[error("Unit '{requested}' is out of order; '{next}' must complete first")]
    OutOfOrder { requested: String, next: String },
}

/// Registration rejected because an identifier repeats
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unit '{0}' appears more than once in the registration")]
pub struct DuplicateUnit(pub String);

/// Result of a successful step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStep {
    /// Pending -> Executing
    Began { unit: String, text: String },
    /// Executing -> Complete
    Finalized { unit: String, text: String },
    /// Already complete; nothing moved
    AlreadyComplete { unit: String, pending: Vec<String> },
}

impl UnitStep {
    pub fn unit(&self) -> &str {
        match self {
            UnitStep::Began { unit, .. }
            | UnitStep::Finalized { unit, .. }
            | UnitStep::AlreadyComplete { unit, .. } => unit,
        }
    }
}

impl fmt::Display for UnitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitStep::Began { text, .. } | UnitStep::Finalized { text, .. } => f.write_str(text),
            UnitStep::AlreadyComplete { unit, pending } => {
                let pending = if pending.is_empty() {
                    "none".to_string()
                } else {
                    pending.join(", ")
                };
                write!(f, "Unit '{unit}' already completed. Pending units: {pending}.")
            }
        }
    }
}

#[derive(Default)]
pub struct UnitPhaseMachine {
    order: Vec<String>,
    lifecycles: HashMap<String, StateMachine<UnitLifecycle>>,
}

impl fmt::Debug for UnitPhaseMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.order.iter().map(|id| (id, self.phase(id))))
            .finish()
    }
}

impl UnitPhaseMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the registration wholesale. Every unit restarts at Pending.
    /// Duplicates are rejected and leave the current registration untouched.
    pub fn register(&mut self, ids: Vec<String>) -> Result<(), DuplicateUnit> {
        let mut seen = HashSet::with_capacity(ids.len());
        for id in &ids {
            if !seen.insert(id.as_str()) {
                return Err(DuplicateUnit(id.clone()));
            }
        }

        self.lifecycles = ids
            .iter()
            .map(|id| (id.clone(), UnitLifecycle::new(id.clone()).state_machine()))
            .collect();
        self.order = ids;

        tracing::info!(units = ?self.order, "Units registered");
        Ok(())
    }

    pub fn step(&mut self, id: &str, catalog: &StageCatalog) -> Result<UnitStep, UnitError> {
        if !self.lifecycles.contains_key(id) {
            return Err(UnitError::UnknownUnit {
                unit: id.to_string(),
                registered: self.order.clone(),
            });
        }

        if let Some(next) = self.first_incomplete_before(id) {
            return Err(UnitError::OutOfOrder {
                requested: id.to_string(),
                next: next.to_string(),
            });
        }

        let pending = self.pending();
        let Some(sm) = self.lifecycles.get_mut(id) else {
            return Err(UnitError::UnknownUnit {
                unit: id.to_string(),
                registered: self.order.clone(),
            });
        };

        let step = match UnitLifecycle::phase_of(sm) {
            Phase::Pending => {
                sm.handle(&UnitEvent::Step);
                UnitStep::Began {
                    unit: id.to_string(),
                    text: catalog.render_unit(StageKey::UnitImplementation, id),
                }
            }
            Phase::Executing => {
                sm.handle(&UnitEvent::Step);
                UnitStep::Finalized {
                    unit: id.to_string(),
                    text: catalog.render_unit(StageKey::UnitExecution, id),
                }
            }
            Phase::Complete => UnitStep::AlreadyComplete {
                unit: id.to_string(),
                pending,
            },
        };
        Ok(step)
    }

    fn first_incomplete_before(&self, id: &str) -> Option<&str> {
        self.order
            .iter()
            .take_while(|unit| unit.as_str() != id)
            .find(|unit| self.phase(unit) != Some(Phase::Complete))
            .map(String::as_str)
    }

    pub fn phase(&self, id: &str) -> Option<Phase> {
        self.lifecycles.get(id).map(UnitLifecycle::phase_of)
    }

    /// Registered units in required completion order
    pub fn units(&self) -> &[String] {
        &self.order
    }

    /// Units not yet complete, in registration order
    pub fn pending(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|unit| self.phase(unit) != Some(Phase::Complete))
            .cloned()
            .collect()
    }

    /// The only unit currently allowed to move
    pub fn next_unit(&self) -> Option<&str> {
        self.order
            .iter()
            .find(|unit| self.phase(unit) != Some(Phase::Complete))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Vacuously true when nothing is registered
    pub fn all_complete(&self) -> bool {
        self.next_unit().is_none()
    }

    pub fn phases(&self) -> Vec<(String, Phase)> {
        self.order
            .iter()
            .map(|unit| (unit.clone(), self.phase(unit).unwrap_or_default()))
            .collect()
    }
}
