//! Workflow Transformer
//!
//! A workflow keeps its interface and its wiring; only what each step
//! runs changes. Steps referencing files point at the converted siblings,
//! and embedded processes are converted in place. Requirements declared on
//! the workflow or its steps apply to every tool underneath, so they go
//! through the same filter as a tool's own.

use log::{debug, error};
use serde_yaml::{Mapping, Value};

use super::tool::retain_safe;
use crate::error::{DummyError, Result};
use crate::schema::forms::{describe, ensure_sequence_form};
use crate::schema::{RunReference, Workflow};

/// Requirements the workflow engine itself needs to run the wiring.
pub const WIRING_REQUIREMENTS: &[&str] = &[
    "SubworkflowFeatureRequirement",
    "ScatterFeatureRequirement",
    "MultipleInputFeatureRequirement",
    "StepInputExpressionRequirement",
];

/// Fields holding requirements, with the name used in messages.
const REQUIREMENT_FIELDS: &[(&str, &str)] = &[("requirements", "requirement"), ("hints", "hint")];

/// Non-fatal findings from a workflow rewrite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowPlan {
    pub warnings: Vec<String>,
}

/// Converts the processes a workflow's steps run.
///
/// The converter implements this so workflows can recurse into referenced
/// documents without knowing about caching or emission.
pub trait RunResolver {
    /// Converts the document at `reference` (relative to the workflow) and
    /// returns the reference the step should use instead.
    fn resolve_path(&mut self, reference: &str) -> Result<String>;

    /// Converts an embedded process and returns its replacement.
    fn resolve_inline(&mut self, step_id: &str, node: Mapping) -> Result<Mapping>;

    /// Called for each failed step when conversion keeps going.
    fn step_failed(&mut self, step_id: &str, err: &DummyError) {
        error!("Step '{}' failed: {}", step_id, err);
    }
}

/// Rewrites every step's `run` through `resolver`, in declaration order.
///
/// Without `keep_going` the first failing step aborts the workflow. With it,
/// every step is attempted and the workflow then fails with `StepsFailed`
/// if any did. The workflow is only modified when every step succeeded.
pub fn transform_workflow(
    workflow: &mut Workflow,
    resolver: &mut dyn RunResolver,
    keep_going: bool,
) -> Result<WorkflowPlan> {
    let mut plan = WorkflowPlan::default();
    let workflow_extra = filter_requirements(&workflow.extra, &mut plan.warnings)?;
    let mut step_extras = Vec::with_capacity(workflow.steps.len());
    for step in &workflow.steps {
        let extra = filter_requirements(&step.extra, &mut plan.warnings)
            .map_err(|e| e.context(format!("step '{}'", step.id)))?;
        step_extras.push(extra);
    }

    let mut replacements = Vec::with_capacity(workflow.steps.len());
    let mut failed = 0;

    for step in &workflow.steps {
        let result = match &step.run {
            RunReference::Path(reference) => resolver.resolve_path(reference).map(RunReference::Path),
            RunReference::Inline(node) => resolver
                .resolve_inline(&step.id, node.clone())
                .map(RunReference::Inline),
        };

        match result {
            Ok(run) => replacements.push(run),
            Err(e) => {
                let e = e.context(format!("step '{}'", step.id));
                if !keep_going {
                    return Err(e);
                }
                resolver.step_failed(&step.id, &e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(DummyError::StepsFailed { failed });
    }

    workflow.extra = workflow_extra;
    for ((step, run), extra) in workflow.steps.iter_mut().zip(replacements).zip(step_extras) {
        if let RunReference::Path(reference) = &run {
            debug!("Step '{}' now runs {}", step.id, reference);
        }
        step.run = run;
        step.extra = extra;
    }
    Ok(plan)
}

/// Returns `extra` with unsafe requirements and hints removed.
fn filter_requirements(extra: &Mapping, warnings: &mut Vec<String>) -> Result<Mapping> {
    let mut filtered = extra.clone();

    for (field, section) in REQUIREMENT_FIELDS {
        let Some(node) = extra.get(*field) else {
            continue;
        };
        let entries = ensure_sequence_form(node.clone(), "class", "class")
            .map_err(|e| DummyError::Malformed(format!("{}: {}", field, e)))?
            .into_iter()
            .map(|entry| match entry {
                Value::Mapping(entry) => Ok(entry),
                other => Err(DummyError::Malformed(format!(
                    "{} entry is {}, expected a mapping",
                    section,
                    describe(&other)
                ))),
            })
            .collect::<Result<Vec<Mapping>>>()?;

        let kept = retain_safe(&entries, section, WIRING_REQUIREMENTS, warnings);
        if kept.is_empty() {
            filtered.remove(*field);
        } else {
            filtered.insert(
                Value::from(*field),
                Value::Sequence(kept.into_iter().map(Value::Mapping).collect()),
            );
        }
    }
    Ok(filtered)
}
