//! Tool registry: maps MCP tool calls onto workflow controller operations

use serde::Deserialize;
use serde_json::{json, Value};

use super::protocol::ToolDefinition;
use super::ServerError;
use crate::workflows::{
    Advance, Registration, UnitReply, UnitStep, WorkflowController, WorkflowError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Init,
    NextStep,
    RegisterUnits,
    UnitStep,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::Init, Tool::NextStep, Tool::RegisterUnits, Tool::UnitStep];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::Init => "init",
            Tool::NextStep => "next_step",
            Tool::RegisterUnits => "register_units",
            Tool::UnitStep => "unit_step",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        Tool::ALL.iter().copied().find(|tool| tool.name() == name)
    }

    fn description(&self) -> &'static str {
        match self {
            Tool::Init => "Return the overall task prompt and reset the workflow to its first stage.",
            Tool::NextStep => "Return the next stage prompt in sequence.",
            Tool::RegisterUnits => {
                "Set the ordered unit identifiers, e.g. [\"exp1a\", \"exp1b\"]. \
                 Replaces any previous registration and resets per-unit progress."
            }
            Tool::UnitStep => {
                "Request the next instruction (implementation or execution) for a specific unit. \
                 Units must be completed in registration order."
            }
        }
    }

    fn input_schema(&self) -> Value {
        match self {
            Tool::Init | Tool::NextStep => json!({
                "type": "object",
                "properties": {},
            }),
            Tool::RegisterUnits => json!({
                "type": "object",
                "properties": {
                    "units": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Unit identifiers in required completion order"
                    }
                },
                "required": ["units"],
            }),
            Tool::UnitStep => json!({
                "type": "object",
                "properties": {
                    "unit": {
                        "type": "string",
                        "description": "Identifier of a registered unit"
                    }
                },
                "required": ["unit"],
            }),
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

pub fn list_tools() -> Vec<ToolDefinition> {
    Tool::ALL.iter().map(Tool::definition).collect()
}

#[derive(Debug, Deserialize)]
struct RegisterUnitsArgs {
    units: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct UnitStepArgs {
    unit: String,
}

/// What a tool call produced, before it is wrapped for the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    /// Stage or unit text
    Delivered(String),
    /// Sequencing deviation answered with guidance on the next action
    Guidance(String),
    /// Caller bug reported back as an error result
    Rejected(WorkflowError),
}

impl ToolOutcome {
    pub fn text(&self) -> String {
        match self {
            ToolOutcome::Delivered(text) | ToolOutcome::Guidance(text) => text.clone(),
            ToolOutcome::Rejected(err) => err.to_string(),
        }
    }
}

fn parse_args<T: for<'de> Deserialize<'de>>(tool: Tool, arguments: Value) -> Result<T, ServerError> {
    serde_json::from_value(arguments).map_err(|source| ServerError::InvalidArguments {
        tool: tool.name().to_string(),
        source,
    })
}

/// Dispatch one tool call against the controller
pub fn call_tool(
    controller: &mut WorkflowController,
    name: &str,
    arguments: Value,
) -> Result<ToolOutcome, ServerError> {
    let tool = Tool::from_name(name).ok_or_else(|| ServerError::UnknownTool(name.to_string()))?;

    let outcome = match tool {
        Tool::Init => Ok(ToolOutcome::Delivered(controller.initialize())),
        Tool::NextStep => controller.advance().map(|advance| match advance {
            Advance::Stage { .. } | Advance::Terminal { .. } => {
                ToolOutcome::Delivered(advance.to_string())
            }
            other => ToolOutcome::Guidance(other.to_string()),
        }),
        Tool::RegisterUnits => {
            let args: RegisterUnitsArgs = parse_args(tool, arguments)?;
            controller
                .register_units(args.units)
                .map(|registration| match registration {
                    Registration::Registered { .. } => {
                        ToolOutcome::Delivered(registration.to_string())
                    }
                    other => ToolOutcome::Guidance(other.to_string()),
                })
        }
        Tool::UnitStep => {
            let args: UnitStepArgs = parse_args(tool, arguments)?;
            controller.unit_step(&args.unit).map(|reply| match reply {
                UnitReply::Step(UnitStep::Began { .. } | UnitStep::Finalized { .. }) => {
                    ToolOutcome::Delivered(reply.to_string())
                }
                other => ToolOutcome::Guidance(other.to_string()),
            })
        }
    };

    Ok(outcome.unwrap_or_else(ToolOutcome::Rejected))
}
