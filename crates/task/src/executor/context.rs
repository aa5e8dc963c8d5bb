use rivet_core::{Result, TargetName};
use rivet_params::{ParameterResolver, ParameterValue};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared interrupt flag.
///
/// The engine checks it before each target and after each body returns; it
/// never interrupts a running body. Bodies that run long may poll it.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a target body can see while it runs
pub struct TargetContext<'a> {
    pub(crate) name: &'a TargetName,
    pub(crate) resolver: &'a ParameterResolver,
    pub(crate) cancellation: &'a CancellationFlag,
}

impl<'a> TargetContext<'a> {
    pub fn new(
        name: &'a TargetName,
        resolver: &'a ParameterResolver,
        cancellation: &'a CancellationFlag,
    ) -> Self {
        Self {
            name,
            resolver,
            cancellation,
        }
    }

    pub fn target(&self) -> &TargetName {
        self.name
    }

    pub fn parameters(&self) -> &ParameterResolver {
        self.resolver
    }

    /// Resolve a parameter lazily; the first read is cached for the run
    pub fn value(&self, name: &str) -> Result<&ParameterValue> {
        self.resolver.value(name)
    }

    pub fn working_directory(&self) -> &Path {
        self.resolver.context().working_directory()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
