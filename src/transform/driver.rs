//! Fabrication Driver
//!
//! The one command every dummy tool runs. It is a fixed POSIX `sh` script
//! that walks its arguments left to right, switching mode at each
//! [`MODE_SWITCH_FLAG`]:
//!
//! ```text
//! <original inputs...> FLAG <dirs to create...> FLAG <files to create...> FLAG
//! ```
//!
//! All per-tool knowledge lives in the argument list, so the script itself
//! never changes. An input whose value equals the flag confuses the driver;
//! that case is not guarded against.

use std::collections::HashMap;

use serde_yaml::{Mapping, Value};

use crate::schema::forms::shortname;
use crate::schema::CommandLineTool;
use crate::synth::expression::parse_input_reference;

/// Sentinel separating the driver's argument groups.
///
/// Must not contain shell metacharacters or spaces.
pub const MODE_SWITCH_FLAG: &str = "cwl-dummy-mode-switch";

/// Value of `$0` inside the driver script.
pub const DRIVER_PROGRAM_NAME: &str = "cwl-dummy";

/// Builds the replacement `baseCommand` and `arguments`.
#[derive(Debug, Clone, Default)]
pub struct Driver {
    delay: u32,
}

impl Driver {
    /// Creates a driver that sleeps `delay` seconds before fabricating.
    pub fn new(delay: u32) -> Self {
        Self { delay }
    }

    /// The shell script run by every dummy tool.
    pub fn script(&self) -> String {
        let mut script = String::new();
        if self.delay > 0 {
            script.push_str(&format!("sleep {}\n", self.delay));
        }
        script.push_str(&format!(
            r#"mode=pre
for arg in "$@"; do
    if [ "$mode" = pre ]; then
        if [ "$arg" = {flag} ]; then
            mode=dir
        fi
    elif [ "$mode" = dir ]; then
        if [ "$arg" = {flag} ]; then
            mode=file
        else
            mkdir -p -- "$arg"
        fi
    elif [ "$mode" = file ]; then
        if [ "$arg" = {flag} ]; then
            mode=post
        else
            mkdir -p -- "$(dirname -- "$arg")"
            touch -- "$arg"
        fi
    fi
done
"#,
            flag = MODE_SWITCH_FLAG
        ));
        script
    }

    /// `[sh, -c, <script>, cwl-dummy]`; the trailing name becomes `$0` so
    /// every real argument reaches `"$@"`.
    pub fn base_command(&self) -> Value {
        Value::Sequence(vec![
            Value::from("sh"),
            Value::from("-c"),
            Value::from(self.script()),
            Value::from(DRIVER_PROGRAM_NAME),
        ])
    }

    /// The driver's own arguments, positioned from `first_position` on so
    /// they sort after every original input.
    pub fn arguments(&self, directories: &[String], files: &[String], first_position: i64) -> Value {
        let flag = MODE_SWITCH_FLAG.to_string();
        let values = std::iter::once(&flag)
            .chain(directories)
            .chain(std::iter::once(&flag))
            .chain(files)
            .chain(std::iter::once(&flag));

        Value::Sequence(
            values
                .enumerate()
                .map(|(offset, value)| {
                    let mut entry = Mapping::new();
                    entry.insert(Value::from("position"), Value::from(first_position.saturating_add(offset as i64)));
                    entry.insert(Value::from("valueFrom"), Value::from(value.as_str()));
                    Value::Mapping(entry)
                })
                .collect(),
        )
    }
}

/// Renders the argument vector a CWL runner would pass to the tool's
/// `baseCommand`, given concrete input values.
///
/// Inputs without a value are left out, as a runner does for absent
/// optional inputs. `values` is keyed by short input id. Only whole-string
/// input references are substituted.
pub fn preview(tool: &CommandLineTool, values: &HashMap<String, String>) -> Vec<String> {
    let mut entries: Vec<(i64, Vec<String>)> = Vec::new();

    for input in &tool.inputs {
        let (Some(binding), Some(value)) = (&input.input_binding, values.get(shortname(&input.id))) else {
            continue;
        };
        let value = match binding.value_from.as_ref().and_then(Value::as_str) {
            Some(template) => substitute(template, values),
            None => value.clone(),
        };
        entries.push((binding.position.unwrap_or(0), with_prefix(&binding.extra, value)));
    }

    if let Some(Value::Sequence(arguments)) = &tool.arguments {
        for argument in arguments {
            match argument {
                Value::String(text) => entries.push((0, vec![substitute(text, values)])),
                Value::Mapping(entry) => {
                    let position = entry.get("position").and_then(Value::as_i64).unwrap_or(0);
                    let value = entry
                        .get("valueFrom")
                        .and_then(Value::as_str)
                        .map(|text| substitute(text, values))
                        .unwrap_or_default();
                    entries.push((position, with_prefix(entry, value)));
                }
                _ => {}
            }
        }
    }

    entries.sort_by_key(|(position, _)| *position);
    entries.into_iter().flat_map(|(_, words)| words).collect()
}

fn substitute(text: &str, values: &HashMap<String, String>) -> String {
    parse_input_reference(text)
        .and_then(|reference| values.get(&reference.input).cloned())
        .unwrap_or_else(|| text.to_string())
}

fn with_prefix(binding: &Mapping, value: String) -> Vec<String> {
    let Some(prefix) = binding.get("prefix").and_then(Value::as_str) else {
        return vec![value];
    };
    let separate = binding.get("separate").and_then(Value::as_bool).unwrap_or(true);
    if separate {
        vec![prefix.to_string(), value]
    } else {
        vec![format!("{}{}", prefix, value)]
    }
}
