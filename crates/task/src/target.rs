//! Target declarations

use crate::executor::TargetContext;
use async_trait::async_trait;
use rivet_core::{Result, TargetName};
use rivet_params::ParameterResolver;
use std::fmt;
use std::sync::Arc;

/// The invocable action of a target.
///
/// Bodies are opaque to the engine: it only observes success or failure.
/// A body that hits a configuration problem (an undeclared or malformed
/// parameter) should return the `rivet_core::Error` unchanged so the engine
/// can halt the whole run instead of failing one target.
#[async_trait]
pub trait TargetBody: Send + Sync {
    async fn run(&self, ctx: &TargetContext<'_>) -> anyhow::Result<()>;
}

/// Adapts a synchronous closure into a [`TargetBody`]
pub struct FnBody<F>(pub F);

#[async_trait]
impl<F> TargetBody for FnBody<F>
where
    F: Fn(&TargetContext<'_>) -> anyhow::Result<()> + Send + Sync,
{
    async fn run(&self, ctx: &TargetContext<'_>) -> anyhow::Result<()> {
        (self.0)(ctx)
    }
}

/// Predicate over resolved parameters
pub type ConditionCheck = Arc<dyn Fn(&ParameterResolver) -> Result<bool> + Send + Sync>;

/// When a condition is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionTiming {
    /// Once, in the validation pass before any target runs
    Static,
    /// Just before the target would run
    Dynamic,
}

/// An `only_when` condition; false skips the target
#[derive(Clone)]
pub struct Condition {
    description: String,
    timing: ConditionTiming,
    check: ConditionCheck,
}

impl Condition {
    pub fn new<F>(description: impl Into<String>, timing: ConditionTiming, check: F) -> Self
    where
        F: Fn(&ParameterResolver) -> Result<bool> + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            timing,
            check: Arc::new(check),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn timing(&self) -> ConditionTiming {
        self.timing
    }

    pub fn evaluate(&self, resolver: &ParameterResolver) -> Result<bool> {
        (self.check)(resolver)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("description", &self.description)
            .field("timing", &self.timing)
            .finish()
    }
}

/// A `requires` entry; false skips the target with "requirement not met"
#[derive(Clone)]
pub enum Requirement {
    /// The named parameter was explicitly supplied
    Parameter(String),
    /// The named target succeeded earlier in this run
    Produced(TargetName),
    Predicate {
        description: String,
        check: ConditionCheck,
    },
}

impl Requirement {
    pub fn parameter(name: impl Into<String>) -> Self {
        Requirement::Parameter(name.into())
    }

    /// A skipped dependency produces nothing, so this only holds after success
    pub fn produced(target: impl Into<String>) -> Self {
        Requirement::Produced(TargetName::new_unchecked(target))
    }

    pub fn predicate<F>(description: impl Into<String>, check: F) -> Self
    where
        F: Fn(&ParameterResolver) -> Result<bool> + Send + Sync + 'static,
    {
        Requirement::Predicate {
            description: description.into(),
            check: Arc::new(check),
        }
    }

    /// Human-readable form for logs and metadata
    pub fn describe(&self) -> String {
        match self {
            Requirement::Parameter(name) => format!("parameter '{name}' is set"),
            Requirement::Produced(target) => format!("target '{target}' succeeded"),
            Requirement::Predicate { description, .. } => description.clone(),
        }
    }
}

impl fmt::Debug for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// A named unit of build work.
///
/// Built with chained calls:
///
/// ```ignore
/// Target::new("Pack")
///     .depends_on(["Test"])
///     .requires(Requirement::parameter("Version"))
///     .executes(|_| Ok(()))
/// ```
#[derive(Clone)]
pub struct Target {
    name: TargetName,
    description: Option<String>,
    unlisted: bool,
    depends_on: Vec<TargetName>,
    dependent_for: Vec<TargetName>,
    before: Vec<TargetName>,
    after: Vec<TargetName>,
    triggers: Vec<TargetName>,
    triggered_by: Vec<TargetName>,
    conditions: Vec<Condition>,
    requirements: Vec<Requirement>,
    parameters: Vec<String>,
    proceed_after_failure: bool,
    assured_after_failure: bool,
    body: Option<Arc<dyn TargetBody>>,
}

fn names<I, S>(names: I) -> impl Iterator<Item = TargetName>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    // Validated when the graph is built
    names.into_iter().map(TargetName::new_unchecked)
}

impl Target {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: TargetName::new_unchecked(name),
            description: None,
            unlisted: false,
            depends_on: Vec::new(),
            dependent_for: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
            triggers: Vec::new(),
            triggered_by: Vec::new(),
            conditions: Vec::new(),
            requirements: Vec::new(),
            parameters: Vec::new(),
            proceed_after_failure: false,
            assured_after_failure: false,
            body: None,
        }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Hide from metadata listings
    pub fn unlisted(mut self) -> Self {
        self.unlisted = true;
        self
    }

    pub fn depends_on<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(names(targets));
        self
    }

    /// The given targets depend on this one
    pub fn dependent_for<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependent_for.extend(names(targets));
        self
    }

    pub fn before<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.before.extend(names(targets));
        self
    }

    pub fn after<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.after.extend(names(targets));
        self
    }

    pub fn triggers<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.triggers.extend(names(targets));
        self
    }

    /// Run this target after any of the given targets succeeds
    pub fn triggered_by<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.triggered_by.extend(names(targets));
        self
    }

    /// Dynamic condition, evaluated just before the target runs
    pub fn only_when<F>(mut self, description: impl Into<String>, check: F) -> Self
    where
        F: Fn(&ParameterResolver) -> Result<bool> + Send + Sync + 'static,
    {
        self.conditions
            .push(Condition::new(description, ConditionTiming::Dynamic, check));
        self
    }

    /// Static condition, evaluated before any target runs
    pub fn only_when_static<F>(mut self, description: impl Into<String>, check: F) -> Self
    where
        F: Fn(&ParameterResolver) -> Result<bool> + Send + Sync + 'static,
    {
        self.conditions
            .push(Condition::new(description, ConditionTiming::Static, check));
        self
    }

    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Parameters the body reads; resolved and validated before the run starts
    pub fn uses_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters
            .extend(parameters.into_iter().map(Into::into));
        self
    }

    /// A failure of this target never stops a fail-fast run
    pub fn proceed_after_failure(mut self) -> Self {
        self.proceed_after_failure = true;
        self
    }

    /// Still run after a fail-fast stop, unless one of its own dependencies failed
    pub fn assured_after_failure(mut self) -> Self {
        self.assured_after_failure = true;
        self
    }

    pub fn executes<F>(self, body: F) -> Self
    where
        F: Fn(&TargetContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.executes_with(FnBody(body))
    }

    pub fn executes_with(mut self, body: impl TargetBody + 'static) -> Self {
        self.body = Some(Arc::new(body));
        self
    }

    pub fn name(&self) -> &TargetName {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_unlisted(&self) -> bool {
        self.unlisted
    }

    pub fn dependencies(&self) -> &[TargetName] {
        &self.depends_on
    }

    pub fn dependents(&self) -> &[TargetName] {
        &self.dependent_for
    }

    pub fn runs_before(&self) -> &[TargetName] {
        &self.before
    }

    pub fn runs_after(&self) -> &[TargetName] {
        &self.after
    }

    pub fn triggered_targets(&self) -> &[TargetName] {
        &self.triggers
    }

    pub fn triggering_targets(&self) -> &[TargetName] {
        &self.triggered_by
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn proceeds_after_failure(&self) -> bool {
        self.proceed_after_failure
    }

    pub fn is_assured_after_failure(&self) -> bool {
        self.assured_after_failure
    }

    pub fn body(&self) -> Option<&Arc<dyn TargetBody>> {
        self.body.as_ref()
    }

    /// Every target name this declaration references, with the relation
    pub(crate) fn references(&self) -> impl Iterator<Item = (&'static str, &TargetName)> {
        let produced = self.requirements.iter().filter_map(|req| match req {
            Requirement::Produced(name) => Some(("requires", name)),
            _ => None,
        });
        self.depends_on
            .iter()
            .map(|n| ("depends_on", n))
            .chain(self.dependent_for.iter().map(|n| ("dependent_for", n)))
            .chain(self.before.iter().map(|n| ("before", n)))
            .chain(self.after.iter().map(|n| ("after", n)))
            .chain(self.triggers.iter().map(|n| ("triggers", n)))
            .chain(self.triggered_by.iter().map(|n| ("triggered_by", n)))
            .chain(produced)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .field("before", &self.before)
            .field("after", &self.after)
            .field("triggers", &self.triggers)
            .field("conditions", &self.conditions)
            .field("requirements", &self.requirements)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}
