//! Tool Transformer
//!
//! Rewrites a `CommandLineTool` so that running it creates its declared
//! outputs and nothing else. The input interface is left exactly as written;
//! outputs keep their ids and types.
//!
//! Filesystem outputs are fabricated by the [`Driver`] from their globs.
//! Every other output gets an `outputEval` returning a synthesized literal.
//! All checks run before the tool is touched, so a failed transform leaves
//! the tool unchanged.

use log::debug;
use serde_yaml::{Mapping, Value};

use super::driver::Driver;
use crate::error::{DummyError, Result};
use crate::schema::forms::{ensure_list, shortname};
use crate::schema::{CommandLineTool, CwlType, OutputBinding, Parameter};
use crate::synth::expression::strip_references;
use crate::synth::{classify_glob, literal_expression, synthesize, trivial_literal, GlobSource};

/// Requirements and hints that stay meaningful for a dummy tool.
pub const SAFE_REQUIREMENTS: &[&str] = &[
    INLINE_JAVASCRIPT,
    "SchemaDefRequirement",
    "InitialWorkDirRequirement",
    "ResourceRequirement",
];

pub const INLINE_JAVASCRIPT: &str = "InlineJavascriptRequirement";

/// Tool fields this converter refuses to rewrite.
const REDIRECTIONS: &[&str] = &["stdin", "stdout", "stderr"];

/// What the driver of a transformed tool will create.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolPlan {
    /// Directory paths (possibly input references), in declaration order.
    pub directories: Vec<String>,
    /// File paths (possibly input references), in declaration order.
    pub files: Vec<String>,
    /// Non-fatal findings to report.
    pub warnings: Vec<String>,
}

/// Transforms `tool` in place.
///
/// # Errors
///
/// * `UnsupportedConstruct` for stdio redirection or filesystem outputs
///   without a glob
/// * `UnsupportedExpression` for globs or `outputEval`s that need evaluation
/// * `Schema` for unrecognised parameter types
pub fn transform_tool(tool: &mut CommandLineTool, driver: &Driver) -> Result<ToolPlan> {
    for field in REDIRECTIONS {
        if tool.extra.contains_key(*field) {
            return Err(DummyError::unsupported_construct(format!("'{}' redirection", field)));
        }
    }

    let mut plan = ToolPlan::default();
    for input in &tool.inputs {
        input.cwl_type().map_err(|e| e.context("input"))?;
    }

    let input_ids: Vec<&str> = tool.inputs.iter().map(|p| shortname(&p.id)).collect();
    let mut literals: Vec<(usize, serde_json::Value)> = Vec::new();

    for (index, output) in tool.outputs.iter().enumerate() {
        let context = format!("output '{}'", output.id);
        let ty = output.cwl_type().map_err(|e| e.context("output"))?;

        let synthesis = synthesize(&ty);
        plan.warnings.extend(
            synthesis
                .approximations
                .iter()
                .map(|approximation| format!("{}: {}", context, approximation)),
        );

        if ty.is_filesystem() {
            plan_filesystem_output(output, &ty, &input_ids, &mut plan).map_err(|e| e.context(context))?;
        } else {
            if let Some(expression) = output.output_binding.as_ref().and_then(|b| b.output_eval.as_ref()) {
                trivial_literal(expression).map_err(|e| e.context(context))?;
            }
            literals.push((index, synthesis.value.to_json()));
        }
    }

    // The driver's arguments follow every input binding.
    let last_position = tool.inputs.iter().filter_map(Parameter::position).max().unwrap_or(0);
    let driver_arguments = i64::try_from(plan.directories.len() + plan.files.len() + 3).unwrap_or(i64::MAX);
    if last_position.checked_add(driver_arguments).is_none() {
        return Err(DummyError::Malformed(format!(
            "input position {} leaves no room for the driver's arguments",
            last_position
        )));
    }
    let first_position = last_position + 1;

    tool.requirements = retain_safe(&tool.requirements, "requirement", &[], &mut plan.warnings);
    tool.hints = retain_safe(&tool.hints, "hint", &[], &mut plan.warnings);
    if !literals.is_empty() && !tool.has_requirement(INLINE_JAVASCRIPT) {
        let mut requirement = Mapping::new();
        requirement.insert(Value::from("class"), Value::from(INLINE_JAVASCRIPT));
        tool.requirements.push(requirement);
    }

    for (index, literal) in literals {
        let binding = tool.outputs[index]
            .output_binding
            .get_or_insert_with(OutputBinding::default);
        binding.glob = None;
        binding.load_contents = None;
        binding.output_eval = Some(Value::from(literal_expression(&literal)));
    }

    tool.base_command = Some(driver.base_command());
    tool.arguments = Some(driver.arguments(&plan.directories, &plan.files, first_position));

    debug!(
        "Driver creates {} director(ies) and {} file(s)",
        plan.directories.len(),
        plan.files.len()
    );
    Ok(plan)
}

fn plan_filesystem_output(
    output: &Parameter,
    ty: &CwlType,
    input_ids: &[&str],
    plan: &mut ToolPlan,
) -> Result<()> {
    let binding = output.output_binding.as_ref().ok_or_else(|| {
        DummyError::unsupported_construct("filesystem output without outputBinding")
    })?;
    let globs = binding.glob.as_ref().map(ensure_list).unwrap_or_default();
    if globs.is_empty() {
        return Err(DummyError::unsupported_construct("filesystem output without glob"));
    }
    if binding.load_contents == Some(true) {
        plan.warnings.push(format!(
            "output '{}': loadContents is set; consumers reading the contents get an empty file",
            output.id
        ));
    }

    let is_file = ty.reaches_file();
    for glob in &globs {
        let Value::String(glob) = glob else {
            return Err(DummyError::unsupported_expression(
                format!("{:?}", glob),
                "glob is not a string",
            ));
        };
        let source = classify_glob(glob, input_ids)?;

        if strip_references(glob).contains(['*', '?', '[']) {
            plan.warnings.push(format!(
                "output '{}': glob '{}' has glob characters; a file with that literal name is created",
                output.id, glob
            ));
        }

        if !is_file {
            plan.directories.push(glob.clone());
            continue;
        }
        plan.files.push(glob.clone());

        let Some(secondary) = output.extra.get("secondaryFiles") else {
            continue;
        };
        match &source {
            GlobSource::Literal(primary) => {
                for pattern in ensure_list(secondary) {
                    let text = match &pattern {
                        Value::String(text) => Some(text.as_str()),
                        Value::Mapping(entry) => entry.get("pattern").and_then(Value::as_str),
                        _ => None,
                    };
                    match text.and_then(|text| secondary_path(primary, text)) {
                        Some(path) => plan.files.push(path),
                        None => plan.warnings.push(format!(
                            "output '{}': secondaryFiles pattern {:?} cannot be computed and is not created",
                            output.id, pattern
                        )),
                    }
                }
            }
            GlobSource::Input(_) => plan.warnings.push(format!(
                "output '{}': secondaryFiles of a glob taken from an input are not created",
                output.id
            )),
        }
    }
    Ok(())
}

/// Applies a `secondaryFiles` pattern to a primary path.
///
/// Each leading `^` strips one extension; the rest is appended. Patterns
/// with expressions yield `None`.
pub fn secondary_path(primary: &str, pattern: &str) -> Option<String> {
    if pattern.contains('$') {
        return None;
    }

    let mut base = primary.to_string();
    let mut suffix = pattern;
    while let Some(rest) = suffix.strip_prefix('^') {
        let name_start = base.rfind('/').map(|i| i + 1).unwrap_or(0);
        if let Some(dot) = base[name_start..].rfind('.') {
            base.truncate(name_start + dot);
        }
        suffix = rest;
    }
    Some(format!("{}{}", base, suffix))
}

/// Keeps the entries whose class is in [`SAFE_REQUIREMENTS`] or `also_safe`.
pub(crate) fn retain_safe(
    entries: &[Mapping],
    section: &str,
    also_safe: &[&str],
    warnings: &mut Vec<String>,
) -> Vec<Mapping> {
    entries
        .iter()
        .filter(|entry| {
            let class = entry.get("class").and_then(Value::as_str).unwrap_or_default();
            if SAFE_REQUIREMENTS.contains(&class) || also_safe.contains(&class) {
                return true;
            }
            if class.contains([':', '#']) {
                warnings.push(format!("vendor {} '{}' dropped", section, class));
            } else {
                debug!("Dropping {} {}", section, class);
            }
            false
        })
        .cloned()
        .collect()
}
