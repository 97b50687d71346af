//! Process Transformers
//!
//! - [`tool`]: `CommandLineTool` to dummy tool
//! - [`workflow`]: step-by-step rewrite of what a workflow runs
//! - [`driver`]: the fabrication command every dummy tool executes

pub mod driver;
pub mod tool;
pub mod workflow;

pub use driver::{preview, Driver, MODE_SWITCH_FLAG};
pub use tool::{transform_tool, ToolPlan, SAFE_REQUIREMENTS};
pub use workflow::{transform_workflow, RunResolver, WorkflowPlan, WIRING_REQUIREMENTS};
