//! Dummy Document Writer
//!
//! Converted documents are written next to the canonical path of their
//! source as `<name><suffix>`. A file reached through several spellings
//! (symlinks, `..`) therefore has exactly one dummy, and parents point at
//! it with [`relative_reference`].

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use log::{debug, info};
use tempfile::NamedTempFile;

use crate::error::{DummyError, Result};
use crate::schema::Process;

/// Suffix appended to generated file names.
pub const DEFAULT_SUFFIX: &str = ".dummy";

/// Sibling path of `source` with `suffix` appended to the file name.
pub fn output_path(source: &Path, suffix: &str) -> PathBuf {
    let mut name = source.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    source.with_file_name(name)
}

/// The `run` reference a document in `from_dir` uses to reach `target`.
///
/// Both paths are expected to be canonical.
pub fn relative_reference(target: &Path, from_dir: &Path) -> String {
    let target: Vec<Component> = target.components().collect();
    let base: Vec<Component> = from_dir.components().collect();
    let common = target.iter().zip(&base).take_while(|(a, b)| a == b).count();

    let mut parts = vec!["..".to_string(); base.len() - common];
    parts.extend(
        target[common..]
            .iter()
            .map(|component| component.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

/// Serializes a converted process with a header naming its source.
pub fn render(process: &Process, source: &Path) -> Result<String> {
    let body = serde_yaml::to_string(process).map_err(|source_err| DummyError::Yaml {
        path: source.to_path_buf(),
        source: source_err,
    })?;
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string());

    Ok(format!(
        "# Dummy version of {}, generated by {} {}.\n# Its tools only create their declared outputs.\n{}",
        name,
        crate::APP_NAME,
        crate::VERSION,
        body
    ))
}

/// What happened to an output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitStatus {
    Written,
    /// An earlier output exists and `force` is off.
    Kept,
    /// Rendered only.
    DryRun,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub path: PathBuf,
    pub status: EmitStatus,
}

/// Writes converted documents.
#[derive(Debug, Clone)]
pub struct Emitter {
    suffix: String,
    force: bool,
    dry_run: bool,
}

impl Default for Emitter {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_string(),
            force: false,
            dry_run: false,
        }
    }
}

impl Emitter {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            ..Default::default()
        }
    }

    /// Allows overwriting existing outputs.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Renders without touching the filesystem.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Emits the converted form of the document at `source`.
    pub fn emit(&self, source: &Path, process: &Process) -> Result<Emitted> {
        let path = output_path(source, &self.suffix);
        let contents = render(process, source)?;

        if self.dry_run {
            debug!("Rendered {} ({} bytes)", path.display(), contents.len());
            return Ok(Emitted {
                path,
                status: EmitStatus::DryRun,
            });
        }

        if path.exists() && !self.force {
            debug!("{} exists, not overwriting", path.display());
            return Ok(Emitted {
                path,
                status: EmitStatus::Kept,
            });
        }

        write_atomic(&path, &contents)?;
        info!("Wrote {}", path.display());
        Ok(Emitted {
            path,
            status: EmitStatus::Written,
        })
    }
}

/// Writes through a temporary file in the target directory, then renames.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let io_err = |source| DummyError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut file = NamedTempFile::new_in(&dir).map_err(io_err)?;
    file.write_all(contents.as_bytes()).map_err(io_err)?;
    file.persist(path).map_err(|e| io_err(e.error))?;

    // NamedTempFile creates files readable by the owner only.
    let mut permissions = fs::metadata(path).map_err(io_err)?.permissions();
    set_readable(&mut permissions);
    fs::set_permissions(path, permissions).map_err(io_err)?;
    Ok(())
}

#[cfg(unix)]
fn set_readable(permissions: &mut fs::Permissions) {
    use std::os::unix::fs::PermissionsExt;
    permissions.set_mode(0o644);
}

#[cfg(not(unix))]
fn set_readable(_permissions: &mut fs::Permissions) {}
