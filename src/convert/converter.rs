//! Conversion Driver
//!
//! Walks a document and everything it references depth-first, converting
//! children before their parents. Every file is converted at most once per
//! [`Converter`]; a document that fails is never emitted, while siblings
//! already emitted stay valid.
//!
//! `run` references are resolved against the directory of the document as
//! it was reached, and rewritten relative to where its dummy is written.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde_yaml::Mapping;

use super::options::ConvertOptions;
use crate::emit::{output_path, relative_reference, EmitStatus, Emitter};
use crate::error::{DummyError, Result};
use crate::loader::{self, Artifact, DocumentCache, DocumentKey, DocumentRef, Loaded};
use crate::report::{ConversionReport, Outcome};
use crate::schema::forms::shortname;
use crate::schema::{CommandLineTool, Process};
use crate::transform::{preview, transform_tool, transform_workflow, Driver, RunResolver};

/// Converts CWL documents into their dummy versions.
///
/// # Example
///
/// ```rust,no_run
/// use cwl_dummy::{ConvertOptions, Converter};
///
/// fn main() -> Result<(), cwl_dummy::DummyError> {
///     let mut converter = Converter::new(ConvertOptions::default().with_force(true));
///     let written = converter.convert("workflows/main.cwl")?;
///     println!("{} ({})", written.display(), converter.report().summary());
///     Ok(())
/// }
/// ```
pub struct Converter {
    options: ConvertOptions,
    driver: Driver,
    emitter: Emitter,
    cache: DocumentCache,
    report: ConversionReport,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        let emitter = Emitter::new(options.suffix.clone())
            .with_force(options.force)
            .with_dry_run(options.dry_run);
        Self {
            driver: Driver::new(options.delay),
            emitter,
            cache: DocumentCache::new(),
            report: ConversionReport::new(),
            options,
        }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Documents visited so far.
    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    pub fn report(&self) -> &ConversionReport {
        &self.report
    }

    pub fn into_report(self) -> ConversionReport {
        self.report
    }

    /// Converts the document at `path` and everything it references.
    ///
    /// Returns the path of the dummy written for `path`, next to its
    /// canonical location.
    pub fn convert(&mut self, path: impl AsRef<Path>) -> Result<PathBuf> {
        self.convert_file(path.as_ref())
    }

    fn convert_file(&mut self, path: &Path) -> Result<PathBuf> {
        let label = path.display().to_string();

        let (id, document) = match loader::load(&mut self.cache, DocumentRef::Path(path)) {
            Ok(Loaded::Fresh { id, document }) => (id, document),
            Ok(Loaded::Cached { artifact, .. }) => {
                debug!("{} already converted", label);
                return Ok(artifact
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| output_path(path, &self.options.suffix)));
            }
            Err(e) => {
                // Cycles and repeat failures are reported by the document
                // that owns the entry.
                if !matches!(e, DummyError::CyclicReference { .. } | DummyError::PreviouslyFailed { .. }) {
                    self.report.add_outcome(&label, Outcome::Failed, Some(e.to_string()));
                }
                return Err(e.context(label));
            }
        };

        info!("Converting {} ({})", label, document.process.class());
        let source = match &document.key {
            DocumentKey::Path(canonical) => canonical.clone(),
            DocumentKey::Inline(_) => path.to_path_buf(),
        };
        let dirs = Dirs {
            base: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            emit: source.parent().map(Path::to_path_buf).unwrap_or_default(),
        };

        let emitted = match self.transform(document.process, &dirs, &label) {
            Ok(process) => self.emitter.emit(&source, &process),
            Err(e) => Err(e),
        };

        match emitted {
            Ok(emitted) => {
                self.cache.complete(id, Artifact::File(emitted.path.clone()));
                let outcome = match emitted.status {
                    EmitStatus::Written => Outcome::Converted,
                    EmitStatus::Kept => {
                        self.report.add_warning(
                            &label,
                            format!("{} exists and was kept; use --force to overwrite", emitted.path.display()),
                        );
                        Outcome::Kept
                    }
                    EmitStatus::DryRun => {
                        println!("[DRY RUN] Would write {}", emitted.path.display());
                        Outcome::Previewed
                    }
                };
                self.report
                    .add_outcome(&label, outcome, Some(emitted.path.display().to_string()));
                Ok(emitted.path)
            }
            Err(e) => {
                self.cache.fail(id);
                let e = e.context(label.clone());
                self.report.add_outcome(&label, Outcome::Failed, Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Converts a process embedded in a workflow step.
    fn convert_inline(&mut self, key: String, node: Mapping, dirs: &Dirs) -> Result<Mapping> {
        let loaded = loader::load(
            &mut self.cache,
            DocumentRef::Inline {
                key: key.clone(),
                node,
            },
        );
        let (id, document) = match loaded {
            Ok(Loaded::Fresh { id, document }) => (id, document),
            Ok(Loaded::Cached { .. }) => {
                return Err(DummyError::Malformed(format!("embedded process '{}' reached twice", key)))
            }
            Err(e) => {
                self.report.add_outcome(&key, Outcome::Failed, Some(e.to_string()));
                return Err(e);
            }
        };

        match self.transform(document.process, dirs, &key).and_then(|p| p.to_node()) {
            Ok(node) => {
                self.cache.complete(id, Artifact::Inline);
                self.report.add_outcome(&key, Outcome::Embedded, None);
                Ok(node)
            }
            Err(e) => {
                self.cache.fail(id);
                self.report.add_outcome(&key, Outcome::Failed, Some(e.to_string()));
                Err(e)
            }
        }
    }

    fn transform(&mut self, process: Process, dirs: &Dirs, label: &str) -> Result<Process> {
        match process {
            Process::Tool(mut tool) => {
                let plan = transform_tool(&mut tool, &self.driver)?;
                for warning in plan.warnings {
                    self.report.add_warning(label, warning);
                }
                if self.options.dry_run {
                    print_preview(label, &tool);
                }
                Ok(Process::Tool(tool))
            }
            Process::Workflow(mut workflow) => {
                let keep_going = self.options.keep_going;
                let mut resolver = StepResolver {
                    converter: &mut *self,
                    dirs,
                    parent: label,
                };
                let plan = transform_workflow(&mut workflow, &mut resolver, keep_going)?;
                for warning in plan.warnings {
                    self.report.add_warning(label, warning);
                }
                Ok(Process::Workflow(workflow))
            }
            Process::Expression(node) => {
                self.report
                    .add_warning(label, "ExpressionTool left unchanged; its expression still runs");
                Ok(Process::Expression(node))
            }
        }
    }
}

/// Shows the command line a runner would build, with each input standing
/// in for its own value.
fn print_preview(label: &str, tool: &CommandLineTool) {
    let values: HashMap<String, String> = tool
        .inputs
        .iter()
        .map(|input| {
            let name = shortname(&input.id);
            (name.to_string(), format!("<{}>", name))
        })
        .collect();
    println!("[DRY RUN] Tool: {}", label);
    println!("  Arguments: {}", preview(tool, &values).join(" "));
}

/// Directories a document's references are resolved from and rewritten to.
struct Dirs {
    /// Directory of the document as it was referenced.
    base: PathBuf,
    /// Canonical directory its dummy is written to.
    emit: PathBuf,
}

/// Resolves the steps of one workflow against the converter.
struct StepResolver<'a> {
    converter: &'a mut Converter,
    dirs: &'a Dirs,
    parent: &'a str,
}

impl RunResolver for StepResolver<'_> {
    fn resolve_path(&mut self, reference: &str) -> Result<String> {
        let path = loader::resolve_run_path(&self.dirs.base, reference)?;
        let artifact = self.converter.convert_file(&path)?;

        let rewritten = relative_reference(&artifact, &self.dirs.emit);
        debug!("{}: {} -> {}", self.parent, reference, rewritten);
        Ok(rewritten)
    }

    fn resolve_inline(&mut self, step_id: &str, node: Mapping) -> Result<Mapping> {
        let key = format!("{}#{}", self.parent, step_id);
        self.converter.convert_inline(key, node, self.dirs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RunReference, Workflow};
    use crate::transform::MODE_SWITCH_FLAG;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    const TOOL: &str = r#"cwlVersion: v1.0
class: CommandLineTool
baseCommand: [cat]
inputs:
  tool_input:
    type: string
    inputBinding:
      position: 1
outputs:
  tool_output:
    type: File
    outputBinding:
      glob: $(inputs.tool_input)
  message:
    type: string
    outputBinding:
      outputEval: $("done")
"#;

    const WORKFLOW: &str = r#"cwlVersion: v1.0
class: Workflow
inputs:
  name: string
outputs:
  result:
    type: File
    outputSource: second/tool_output
steps:
  first:
    run: tool.cwl
    in:
      tool_input: name
    out: [tool_output, message]
  second:
    run: tool.cwl
    in:
      tool_input: first/message
    out: [tool_output]
"#;

    fn setup(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = tempdir().unwrap();
        for (name, content) in files {
            let path = temp_dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        temp_dir
    }

    /// Canonical form of the temporary directory, where dummies land.
    fn root(dir: &TempDir) -> PathBuf {
        fs::canonicalize(dir.path()).unwrap()
    }

    fn read_process(path: &Path) -> Process {
        let node: Mapping = serde_yaml::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        Process::from_node(node).unwrap()
    }

    fn read_workflow(path: &Path) -> Workflow {
        match read_process(path) {
            Process::Workflow(workflow) => workflow,
            other => panic!("expected a workflow, got {}", other.class()),
        }
    }

    fn read_tool(path: &Path) -> CommandLineTool {
        match read_process(path) {
            Process::Tool(tool) => tool,
            other => panic!("expected a tool, got {}", other.class()),
        }
    }

    #[test]
    fn test_workflow_scenario() {
        let dir = setup(&[("tool.cwl", TOOL), ("wf.cwl", WORKFLOW)]);
        let mut converter = Converter::new(ConvertOptions::default());

        let written = converter.convert(dir.path().join("wf.cwl")).unwrap();
        assert_eq!(written, root(&dir).join("wf.cwl.dummy"));

        let original = read_workflow(&dir.path().join("wf.cwl"));
        let converted = read_workflow(&written);
        for (before, after) in original.steps.iter().zip(&converted.steps) {
            assert_eq!(after.run, RunReference::Path("tool.cwl.dummy".to_string()));
            assert_eq!(after.inputs, before.inputs);
            assert_eq!(after.out, before.out);
        }
        assert_eq!(converted.inputs, original.inputs);
        assert_eq!(converted.outputs, original.outputs);

        let tool = read_tool(&dir.path().join("tool.cwl.dummy"));
        let values = HashMap::from([("tool_input".to_string(), "x.txt".to_string())]);
        assert_eq!(
            preview(&tool, &values),
            vec!["x.txt", MODE_SWITCH_FLAG, MODE_SWITCH_FLAG, "x.txt", MODE_SWITCH_FLAG]
        );
    }

    #[test]
    fn test_shared_tool_converted_once() {
        let dir = setup(&[("tool.cwl", TOOL), ("wf.cwl", WORKFLOW)]);
        let mut converter = Converter::new(ConvertOptions::default());

        converter.convert(dir.path().join("wf.cwl")).unwrap();

        assert_eq!(converter.cache().len(), 2);
        assert_eq!(converter.report().count(Outcome::Converted), 2);

        // A second top-level request for the same tool is a cache hit.
        let again = converter.convert(dir.path().join("tool.cwl")).unwrap();
        assert_eq!(again, root(&dir).join("tool.cwl.dummy"));
        assert_eq!(converter.report().count(Outcome::Converted), 2);
    }

    #[test]
    fn test_cycle_is_rejected_without_output() {
        let step = |target: &str| {
            format!(
                "cwlVersion: v1.0\nclass: Workflow\ninputs: []\noutputs: []\nsteps:\n  next:\n    run: {}\n    in: {{}}\n    out: []\n",
                target
            )
        };
        let (a, b) = (step("b.cwl"), step("a.cwl"));
        let dir = setup(&[("a.cwl", a.as_str()), ("b.cwl", b.as_str())]);
        let mut converter = Converter::new(ConvertOptions::default());

        let err = converter.convert(dir.path().join("a.cwl")).unwrap_err();

        let DummyError::CyclicReference { chain } = err.root_cause() else {
            panic!("expected a cycle, got {}", err);
        };
        assert_eq!(chain.len(), 3);
        assert!(chain[0].ends_with("a.cwl"));
        assert!(chain[1].ends_with("b.cwl"));
        assert!(chain[2].ends_with("a.cwl"));
        assert!(!dir.path().join("a.cwl.dummy").exists());
        assert!(!dir.path().join("b.cwl.dummy").exists());
        assert_eq!(converter.report().count(Outcome::Failed), 2);
    }

    #[test]
    fn test_run_paths_resolve_relative_to_document() {
        let workflow = "cwlVersion: v1.1\nclass: Workflow\ninputs: []\noutputs: []\nsteps:\n  s:\n    run: ../tools/tool.cwl\n    in: {tool_input: {default: a}}\n    out: []\n";
        let dir = setup(&[("tools/tool.cwl", TOOL), ("workflows/wf.cwl", workflow)]);
        let mut converter = Converter::new(ConvertOptions::default());

        converter.convert(dir.path().join("workflows/wf.cwl")).unwrap();

        assert!(dir.path().join("tools/tool.cwl.dummy").is_file());
        let converted = read_workflow(&dir.path().join("workflows/wf.cwl.dummy"));
        assert_eq!(converted.steps[0].run, RunReference::Path("../tools/tool.cwl.dummy".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_tool_has_one_dummy() {
        let workflow = "cwlVersion: v1.0\nclass: Workflow\ninputs: []\noutputs: []\nsteps:\n  a:\n    run: link.cwl\n    in: {tool_input: {default: x}}\n    out: []\n  b:\n    run: real.cwl\n    in: {tool_input: {default: y}}\n    out: []\n";
        let dir = setup(&[("real.cwl", TOOL), ("wf.cwl", workflow)]);
        std::os::unix::fs::symlink(dir.path().join("real.cwl"), dir.path().join("link.cwl")).unwrap();
        let mut converter = Converter::new(ConvertOptions::default());

        converter.convert(dir.path().join("wf.cwl")).unwrap();

        let converted = read_workflow(&dir.path().join("wf.cwl.dummy"));
        for step in &converted.steps {
            assert_eq!(step.run, RunReference::Path("real.cwl.dummy".to_string()));
        }
        assert!(dir.path().join("real.cwl.dummy").is_file());
        assert!(!dir.path().join("link.cwl.dummy").exists());
        assert_eq!(converter.cache().len(), 2);
        assert_eq!(converter.report().count(Outcome::Converted), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_workflow_references_from_its_target() {
        let workflow = "cwlVersion: v1.0\nclass: Workflow\ninputs: []\noutputs: []\nsteps:\n  s:\n    run: ../tools/tool.cwl\n    in: {tool_input: {default: x}}\n    out: []\n";
        let dir = setup(&[("tools/tool.cwl", TOOL), ("workflows/wf.cwl", workflow)]);
        std::os::unix::fs::symlink(dir.path().join("workflows/wf.cwl"), dir.path().join("workflows/alias.cwl")).unwrap();
        let mut converter = Converter::new(ConvertOptions::default());

        let written = converter.convert(dir.path().join("workflows/alias.cwl")).unwrap();

        assert_eq!(written, root(&dir).join("workflows/wf.cwl.dummy"));
        let converted = read_workflow(&written);
        assert_eq!(converted.steps[0].run, RunReference::Path("../tools/tool.cwl.dummy".to_string()));
        assert!(dir.path().join("tools/tool.cwl.dummy").is_file());
    }

    #[test]
    fn test_workflow_requirements_filtered() {
        let workflow = r#"cwlVersion: v1.0
class: Workflow
requirements:
  DockerRequirement: {dockerPull: ubuntu}
  ScatterFeatureRequirement: {}
hints:
  - class: "http://example.org/cwl#Vendor"
inputs: []
outputs: []
steps:
  s:
    run: tool.cwl
    requirements:
      - class: DockerRequirement
        dockerPull: debian
    in: {tool_input: {default: x}}
    out: []
"#;
        let dir = setup(&[("tool.cwl", TOOL), ("wf.cwl", workflow)]);
        let mut converter = Converter::new(ConvertOptions::default());

        converter.convert(dir.path().join("wf.cwl")).unwrap();

        let text = fs::read_to_string(dir.path().join("wf.cwl.dummy")).unwrap();
        assert!(!text.contains("DockerRequirement"));
        assert!(text.contains("ScatterFeatureRequirement"));
        assert!(!text.contains("Vendor"));
        let converted = read_workflow(&dir.path().join("wf.cwl.dummy"));
        assert!(!converted.steps[0].extra.contains_key("requirements"));
        assert!(!converted.extra.contains_key("hints"));
        assert!(converter
            .report()
            .get_warnings()
            .iter()
            .any(|w| w.document.ends_with("wf.cwl") && w.message.contains("Vendor")));
    }

    #[test]
    fn test_keep_going_converts_healthy_siblings() {
        let broken = "cwlVersion: v1.0\nclass: CommandLineTool\nstdout: out.txt\ninputs: []\noutputs: []\n";
        let workflow = "cwlVersion: v1.0\nclass: Workflow\ninputs: []\noutputs: []\nsteps:\n  bad:\n    run: broken.cwl\n    in: {}\n    out: []\n  good:\n    run: tool.cwl\n    in: {}\n    out: []\n";
        let dir = setup(&[("broken.cwl", broken), ("tool.cwl", TOOL), ("wf.cwl", workflow)]);

        let mut strict = Converter::new(ConvertOptions::default());
        let err = strict.convert(dir.path().join("wf.cwl")).unwrap_err();
        assert!(matches!(err.root_cause(), DummyError::UnsupportedConstruct { .. }));
        assert!(!dir.path().join("tool.cwl.dummy").exists());

        let mut lenient = Converter::new(ConvertOptions::default().with_keep_going(true));
        let err = lenient.convert(dir.path().join("wf.cwl")).unwrap_err();
        assert!(matches!(err.root_cause(), DummyError::StepsFailed { failed: 1 }));
        assert!(dir.path().join("tool.cwl.dummy").is_file());
        assert!(!dir.path().join("broken.cwl.dummy").exists());
        assert!(!dir.path().join("wf.cwl.dummy").exists());
    }

    #[test]
    fn test_inline_step_is_converted_in_place() {
        let workflow = r#"cwlVersion: v1.2
class: Workflow
inputs: []
outputs: []
steps:
  make:
    run:
      class: CommandLineTool
      baseCommand: touch
      inputs: []
      outputs:
        made:
          type: File
          outputBinding: {glob: made.txt}
    in: {}
    out: [made]
"#;
        let dir = setup(&[("wf.cwl", workflow)]);
        let mut converter = Converter::new(ConvertOptions::default());

        converter.convert(dir.path().join("wf.cwl")).unwrap();

        let converted = read_workflow(&dir.path().join("wf.cwl.dummy"));
        let RunReference::Inline(node) = &converted.steps[0].run else {
            panic!("step should stay inline");
        };
        let Process::Tool(tool) = Process::from_node(node.clone()).unwrap() else {
            panic!("inline process should be a tool");
        };
        assert_eq!(tool.base_command, Some(Driver::default().base_command()));
        assert_eq!(converter.report().count(Outcome::Embedded), 1);
    }

    #[test]
    fn test_existing_output_kept_but_referenced() {
        let dir = setup(&[("tool.cwl", TOOL), ("wf.cwl", WORKFLOW), ("tool.cwl.dummy", "keep me\n")]);
        let mut converter = Converter::new(ConvertOptions::default());

        converter.convert(dir.path().join("wf.cwl")).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("tool.cwl.dummy")).unwrap(), "keep me\n");
        assert_eq!(converter.report().count(Outcome::Kept), 1);
        assert_eq!(converter.report().get_warnings().len(), 1);
        let converted = read_workflow(&dir.path().join("wf.cwl.dummy"));
        assert_eq!(converted.steps[0].run, RunReference::Path("tool.cwl.dummy".to_string()));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = setup(&[("tool.cwl", TOOL), ("wf.cwl", WORKFLOW)]);
        let mut converter = Converter::new(ConvertOptions::default().with_dry_run(true));

        let path = converter.convert(dir.path().join("wf.cwl")).unwrap();

        assert_eq!(path, root(&dir).join("wf.cwl.dummy"));
        assert!(!path.exists());
        assert!(!dir.path().join("tool.cwl.dummy").exists());
        assert_eq!(converter.report().count(Outcome::Previewed), 2);
    }

    #[test]
    fn test_expression_tool_passes_with_warning() {
        let expression = "cwlVersion: v1.0\nclass: ExpressionTool\ninputs: []\noutputs: []\nexpression: '${return {};}'\n";
        let dir = setup(&[("expr.cwl", expression)]);
        let mut converter = Converter::new(ConvertOptions::default());

        let written = converter.convert(dir.path().join("expr.cwl")).unwrap();

        assert_eq!(converter.report().get_warnings().len(), 1);
        let node: Mapping = serde_yaml::from_str(&fs::read_to_string(written).unwrap()).unwrap();
        let original: Mapping = serde_yaml::from_str(expression).unwrap();
        assert_eq!(node, original);
    }

    #[test]
    fn test_converting_a_dummy_preserves_interface() {
        let dir = setup(&[("tool.cwl", TOOL)]);
        let mut converter = Converter::new(ConvertOptions::default());

        let once = converter.convert(dir.path().join("tool.cwl")).unwrap();
        let twice = converter.convert(&once).unwrap();

        let original = read_tool(&dir.path().join("tool.cwl"));
        let first = read_tool(&once);
        let second = read_tool(&twice);
        assert_eq!(second.inputs, original.inputs);
        assert_eq!(first.outputs, second.outputs);
        assert_eq!(first.arguments, second.arguments);
    }

    #[test]
    fn test_unsupported_version_names_document() {
        let dir = setup(&[("old.cwl", "cwlVersion: draft-3\nclass: CommandLineTool\ninputs: []\noutputs: []\n")]);
        let mut converter = Converter::new(ConvertOptions::default());

        let err = converter.convert(dir.path().join("old.cwl")).unwrap_err();

        assert!(matches!(err.root_cause(), DummyError::UnsupportedVersion { .. }));
        assert!(err.to_string().contains("old.cwl"));
        assert!(converter.report().has_failures());
    }
}
