// Unit Lifecycle - per-unit three phase state machine
// pending -> executing -> complete, one phase per Step event

use serde::{Deserialize, Serialize};
use statig::prelude::*;
use std::fmt;

/// Position of a unit in its local cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Pending,
    Executing,
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Pending => "pending",
            Phase::Executing => "executing",
            Phase::Complete => "complete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitEvent {
    Step,
}

#[derive(Debug, Default)]
pub struct UnitLifecycle {
    pub unit_id: String,
    steps: u32,
}

impl UnitLifecycle {
    pub fn new(unit_id: String) -> Self {
        Self {
            unit_id,
            ..Default::default()
        }
    }

    pub fn unit_id(&self) -> &str {
        &self.unit_id
    }

    /// Number of phase advances taken so far
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Phase of a running lifecycle, read from its current state
    pub fn phase_of(sm: &StateMachine<Self>) -> Phase {
        match sm.state() {
            State::Pending { .. } => Phase::Pending,
            State::Executing { .. } => Phase::Executing,
            State::Complete { .. } => Phase::Complete,
        }
    }

    fn advanced(&mut self, from: Phase, to: Phase) {
        self.steps += 1;
        tracing::info!(
            unit = %self.unit_id,
            from = %from,
            to = %to,
            "Unit phase advanced"
        );
    }
}

#[state_machine(initial = "State::pending()")]
impl UnitLifecycle {
    #[state]
    fn pending(&mut self, event: &UnitEvent) -> Outcome<State> {
        match event {
            UnitEvent::Step => {
                self.advanced(Phase::Pending, Phase::Executing);
                Transition(State::executing())
            }
        }
    }

    #[state]
    fn executing(&mut self, event: &UnitEvent) -> Outcome<State> {
        match event {
            UnitEvent::Step => {
                self.advanced(Phase::Executing, Phase::Complete);
                Transition(State::complete())
            }
        }
    }

    #[state]
    fn complete(&mut self, event: &UnitEvent) -> Outcome<State> {
        match event {
            UnitEvent::Step => {
                tracing::debug!(unit = %self.unit_id, "Unit already complete, step ignored");
                Handled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_lifecycle_full_cycle() {
        let mut sm = UnitLifecycle::new("exp1".to_string()).state_machine();

        assert_eq!(UnitLifecycle::phase_of(&sm), Phase::Pending);
        assert_eq!(sm.inner().unit_id(), "exp1");

        sm.handle(&UnitEvent::Step);
        assert_eq!(UnitLifecycle::phase_of(&sm), Phase::Executing);

        sm.handle(&UnitEvent::Step);
        assert_eq!(UnitLifecycle::phase_of(&sm), Phase::Complete);
        assert_eq!(sm.inner().steps(), 2);
    }

    #[test]
    fn test_complete_is_absorbing() {
        let mut sm = UnitLifecycle::new("exp1".to_string()).state_machine();
        sm.handle(&UnitEvent::Step);
        sm.handle(&UnitEvent::Step);

        for _ in 0..3 {
            sm.handle(&UnitEvent::Step);
        }

        assert_eq!(UnitLifecycle::phase_of(&sm), Phase::Complete);
        assert_eq!(sm.inner().steps(), 2);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Pending.to_string(), "pending");
        assert_eq!(Phase::Executing.to_string(), "executing");
        assert_eq!(Phase::Complete.to_string(), "complete");
    }
}
