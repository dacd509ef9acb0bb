// Workflow sequencing modules
// Base stages -> ordered unit loop -> one-shot terminal stage

pub mod controller;
pub mod state_machine;
pub mod units;

pub use controller::{
    Advance, EmptyUnitPolicy, MacroState, Registration, UnitReply, WorkflowController,
    WorkflowError, WorkflowSnapshot, ALREADY_DELIVERED,
};
pub use state_machine::{Phase, UnitEvent, UnitLifecycle};
pub use units::{DuplicateUnit, UnitError, UnitPhaseMachine, UnitStep};
