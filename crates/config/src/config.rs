//! Immutable per-run configuration
//!
//! A `Config` is assembled once at startup by the [`ConfigLoader`](crate::ConfigLoader)
//! and then shared read-only by planning, execution and reporting.

use rivet_core::{FailurePolicy, SkipSelection};
use rivet_params::BuildContext;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Settings that shape how a run behaves, independent of the build itself
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuntimeSettings {
    /// Requested target names as typed; empty means the build's defaults
    pub targets: Vec<String>,

    /// Targets forced to `Skipped`
    pub skip: SkipSelection,

    pub policy: FailurePolicy,

    /// Print the plan and exit without running anything
    pub plan_only: bool,

    /// Print build metadata as JSON and exit
    pub describe: bool,

    /// Where to write the JSON run report, if anywhere
    pub report_path: Option<PathBuf>,

    /// Logging verbosity from repeated `-v`
    pub verbosity: u8,
}

impl RuntimeSettings {
    /// Whether the run stops after planning or describing
    pub fn is_dry_run(&self) -> bool {
        self.plan_only || self.describe
    }
}

/// The single source of truth for one run.
///
/// Cheap to clone; the build context is shared.
#[derive(Debug, Clone)]
pub struct Config {
    context: Arc<BuildContext>,
    settings: RuntimeSettings,
}

impl Config {
    pub fn new(context: BuildContext, settings: RuntimeSettings) -> Self {
        Self {
            context: Arc::new(context),
            settings,
        }
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    pub fn working_directory(&self) -> &Path {
        self.context.working_directory()
    }

    /// Report destination, resolved against the working directory
    pub fn report_path(&self) -> Option<PathBuf> {
        self.settings
            .report_path
            .as_ref()
            .map(|path| self.working_directory().join(path))
    }
}
