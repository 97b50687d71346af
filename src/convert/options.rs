//! Conversion Options

use crate::emit::DEFAULT_SUFFIX;

/// Settings for one conversion run.
///
/// # Example
///
/// ```
/// use cwl_dummy::ConvertOptions;
///
/// let options = ConvertOptions::default().with_force(true).with_delay(5);
/// assert_eq!(options.suffix, ".dummy");
/// assert!(options.force);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Appended to every generated file name and rewritten `run` reference
    pub suffix: String,
    /// Overwrite existing dummies
    pub force: bool,
    /// Attempt every step of a workflow even after one fails
    pub keep_going: bool,
    /// Transform and render without writing
    pub dry_run: bool,
    /// Seconds the driver sleeps before fabricating outputs
    pub delay: u32,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_string(),
            force: false,
            keep_going: false,
            dry_run: false,
            delay: 0,
        }
    }
}

impl ConvertOptions {
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_delay(mut self, delay: u32) -> Self {
        self.delay = delay;
        self
    }
}
