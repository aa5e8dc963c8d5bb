use super::context::{CancellationFlag, TargetContext};
use super::graph::TargetGraph;
use super::plan::{ExecutionPlan, Inclusion};
use super::report::{ReportEntry, RunReport};
use crate::target::{ConditionTiming, Requirement};
use petgraph::graph::NodeIndex;
use rivet_core::{
    Error, FailurePolicy, Result, RunOutcome, SkipReason, SkipSelection, TargetName, TargetStatus,
};
use rivet_params::ParameterResolver;
use rivet_utils::tracing::{
    run_span, target_aborted, target_completed, target_skipped, target_span, target_started,
};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Policy flags supplied by the invoking layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub policy: FailurePolicy,
    pub skip: SkipSelection,
}

/// Walks an execution plan one target at a time.
///
/// The status table and the parameter cache are only touched from the task
/// driving [`ExecutionEngine::run`], so neither needs locking.
pub struct ExecutionEngine<'a> {
    graph: &'a TargetGraph,
    resolver: &'a ParameterResolver,
    options: RunOptions,
    cancellation: CancellationFlag,
}

struct Record {
    status: TargetStatus,
    message: Option<String>,
    duration: Duration,
}

#[derive(Default)]
struct RunState {
    queue: VecDeque<NodeIndex>,
    inclusion: HashMap<NodeIndex, Inclusion>,
    records: HashMap<NodeIndex, Record>,
    /// Processing order
    sequence: Vec<NodeIndex>,
    /// Targets whose static condition was false, with that condition
    static_false: HashMap<NodeIndex, String>,
    /// First failure that stopped a fail-fast run
    stopped_by: Option<TargetName>,
}

enum Step {
    Next,
    /// Abort everything left; a configuration problem surfaced mid-run
    Halt(Error),
}

impl<'a> ExecutionEngine<'a> {
    pub fn new(graph: &'a TargetGraph, resolver: &'a ParameterResolver) -> Self {
        Self {
            graph,
            resolver,
            options: RunOptions::default(),
            cancellation: CancellationFlag::new(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationFlag) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancellation
    }

    /// Run the plan and report every target's final status.
    ///
    /// Configuration problems found by the validation pass end the run
    /// before any body is invoked.
    pub async fn run(&self, plan: &ExecutionPlan) -> RunReport {
        let span = run_span(plan.len());
        self.run_inner(plan).instrument(span).await
    }

    async fn run_inner(&self, plan: &ExecutionPlan) -> RunReport {
        let started = Instant::now();
        let mut state = RunState::default();
        for entry in plan.entries() {
            state.queue.push_back(entry.node);
            state.inclusion.insert(entry.node, entry.inclusion);
        }

        tracing::info!(
            targets = ?plan.names().map(TargetName::as_str).collect::<Vec<_>>(),
            policy = ?self.options.policy,
            "starting run"
        );

        if let Err(err) = self.validate(&mut state) {
            tracing::error!(error = %err, "build configuration invalid, nothing was run");
            return self.finish(
                state,
                RunOutcome::ConfigurationError,
                Some(err.to_string()),
                started,
            );
        }

        let mut halted = None;
        // Only a cancellation that stopped planned work changes the outcome
        let mut interrupted = false;
        while let Some(node) = state.queue.pop_front() {
            if self.cancellation.is_cancelled() {
                state.queue.push_front(node);
                self.abort_remaining(&mut state, "run cancelled by user");
                interrupted = true;
                break;
            }

            let span = target_span(self.graph.target(node).name().as_str());
            if let Step::Halt(err) = self.step(node, &mut state).instrument(span).await {
                self.abort_remaining(&mut state, "run halted by configuration error");
                halted = Some(err);
                break;
            }
        }

        let (outcome, error) = match halted {
            Some(err) => {
                tracing::error!(error = %err, "run halted");
                (RunOutcome::ConfigurationError, Some(err.to_string()))
            }
            None if interrupted => (
                RunOutcome::UserCancelled,
                Some(Error::Cancelled.to_string()),
            ),
            None => {
                let failed = state
                    .records
                    .values()
                    .any(|record| record.status.blocks_dependents());
                if failed {
                    (RunOutcome::Failure, None)
                } else {
                    (RunOutcome::Success, None)
                }
            }
        };

        self.finish(state, outcome, error, started)
    }

    /// Up-front checks over every target the run may reach.
    ///
    /// Skip names, required parameters, parameters referenced by targets and
    /// static conditions are all checked here, before the first body runs.
    fn validate(&self, state: &mut RunState) -> Result<()> {
        if let SkipSelection::Named(names) = &self.options.skip {
            for name in names {
                self.graph.require(name.as_str())?;
            }
        }
        self.resolver.validate_required()?;

        for node in self.reachable(state.queue.iter().copied()) {
            let target = self.graph.target(node);
            for parameter in target.parameters() {
                self.resolver.resolve(parameter)?;
            }
            for requirement in target.requirements() {
                if let Requirement::Parameter(parameter) = requirement {
                    self.resolver.resolve(parameter)?;
                }
            }

            if self.user_skips(node, state) {
                continue;
            }
            for condition in target
                .conditions()
                .iter()
                .filter(|c| c.timing() == ConditionTiming::Static)
            {
                if !condition.evaluate(self.resolver)? {
                    state
                        .static_false
                        .insert(node, condition.description().to_string());
                    break;
                }
            }
        }
        Ok(())
    }

    /// Planned targets plus everything triggers could add
    fn reachable(&self, planned: impl IntoIterator<Item = NodeIndex>) -> BTreeSet<NodeIndex> {
        let mut reachable = self.graph.closure(planned);
        let mut pending: Vec<NodeIndex> = reachable.iter().copied().collect();
        while let Some(node) = pending.pop() {
            for &triggered in self.graph.triggered_by(node) {
                for added in self.graph.closure([triggered]) {
                    if reachable.insert(added) {
                        pending.push(added);
                    }
                }
            }
        }
        reachable
    }

    async fn step(&self, node: NodeIndex, state: &mut RunState) -> Step {
        let target = self.graph.target(node);
        let name = target.name();

        if let Some(failed) = &state.stopped_by {
            if !target.is_assured_after_failure() {
                let message = format!("run stopped after '{failed}' failed");
                self.settle(state, node, TargetStatus::Aborted, Some(message), Duration::ZERO);
                return Step::Next;
            }
        }

        if self.user_skips(node, state) {
            self.skip(state, node, SkipReason::SkippedByUser, None);
            return Step::Next;
        }

        if let Some(condition) = state.static_false.get(&node).cloned() {
            let message = format!("condition '{condition}' is false");
            self.skip(state, node, SkipReason::ConditionFalse, Some(message));
            return Step::Next;
        }

        for condition in target
            .conditions()
            .iter()
            .filter(|c| c.timing() == ConditionTiming::Dynamic)
        {
            match condition.evaluate(self.resolver) {
                Ok(true) => {}
                Ok(false) => {
                    let message = format!("condition '{}' is false", condition.description());
                    self.skip(state, node, SkipReason::ConditionFalse, Some(message));
                    return Step::Next;
                }
                Err(err) => return self.evaluation_failed(state, node, err),
            }
        }

        for requirement in target.requirements() {
            match self.requirement_holds(requirement, state) {
                Ok(true) => {}
                Ok(false) => {
                    let message = format!("requirement not met: {}", requirement.describe());
                    self.skip(state, node, SkipReason::RequirementNotMet, Some(message));
                    return Step::Next;
                }
                Err(err) => return self.evaluation_failed(state, node, err),
            }
        }

        // Failure propagates along depends_on only, never along ordering hints
        for dependency in self.graph.dependencies_of(node) {
            let blocked = state
                .records
                .get(&dependency)
                .filter(|record| !record.status.satisfies_dependents())
                .map(|record| record.status);
            if let Some(status) = blocked {
                let dependency_name = self.graph.target(dependency).name();
                let message = match status {
                    TargetStatus::Failed => format!("dependency '{dependency_name}' failed"),
                    _ => format!("dependency '{dependency_name}' was aborted"),
                };
                self.settle(state, node, TargetStatus::Aborted, Some(message), Duration::ZERO);
                return Step::Next;
            }
        }

        target_started(name.as_str());
        let started = Instant::now();
        let result = match target.body() {
            Some(body) => {
                let ctx = TargetContext::new(name, self.resolver, &self.cancellation);
                body.run(&ctx).await
            }
            None => Ok(()),
        };
        let elapsed = started.elapsed();

        match result {
            Ok(()) => {
                self.settle(state, node, TargetStatus::Succeeded, None, elapsed);
                self.schedule_triggers(node, state);
                Step::Next
            }
            Err(err) => {
                let message = format!("{err:#}");
                self.settle(state, node, TargetStatus::Failed, Some(message), elapsed);

                match err.downcast::<Error>() {
                    Ok(config) if config.is_configuration() => return Step::Halt(config),
                    Ok(Error::Cancelled) => self.cancellation.cancel(),
                    _ => {}
                }

                self.note_failure(state, node);
                Step::Next
            }
        }
    }

    /// Under fail-fast, the first failure of a target that does not proceed
    /// after failure stops the run
    fn note_failure(&self, state: &mut RunState, node: NodeIndex) {
        let target = self.graph.target(node);
        let stops_run = self.options.policy == FailurePolicy::FailFast
            && !target.proceeds_after_failure()
            && state.stopped_by.is_none();
        if stops_run {
            tracing::warn!(target_name = %target.name(), "stopping run after failure");
            state.stopped_by = Some(target.name().clone());
        }
    }

    /// Conditions and requirements never run a body, so a failure here is
    /// either a configuration problem or a failure of this target.
    fn evaluation_failed(&self, state: &mut RunState, node: NodeIndex, err: Error) -> Step {
        if err.is_configuration() {
            return Step::Halt(err);
        }
        self.settle(
            state,
            node,
            TargetStatus::Failed,
            Some(err.to_string()),
            Duration::ZERO,
        );
        self.note_failure(state, node);
        Step::Next
    }

    fn requirement_holds(&self, requirement: &Requirement, state: &RunState) -> Result<bool> {
        match requirement {
            Requirement::Parameter(parameter) => self.resolver.is_supplied(parameter),
            // A skipped target produced nothing
            Requirement::Produced(target) => {
                let node = self.graph.require(target.as_str())?;
                Ok(state
                    .records
                    .get(&node)
                    .is_some_and(|record| record.status == TargetStatus::Succeeded))
            }
            Requirement::Predicate { check, .. } => check(self.resolver),
        }
    }

    fn user_skips(&self, node: NodeIndex, state: &RunState) -> bool {
        let requested = state.inclusion.get(&node) == Some(&Inclusion::Requested);
        self.options
            .skip
            .skips(self.graph.target(node).name(), requested)
    }

    /// Queue triggered targets and their unprocessed dependencies, then
    /// re-order whatever is left
    fn schedule_triggers(&self, node: NodeIndex, state: &mut RunState) {
        if state.stopped_by.is_some() {
            return;
        }

        let queued: HashSet<NodeIndex> = state.queue.iter().copied().collect();
        let mut added = Vec::new();
        for &triggered in self.graph.triggered_by(node) {
            if state.records.contains_key(&triggered) || queued.contains(&triggered) {
                continue;
            }
            if self
                .options
                .skip
                .skips(self.graph.target(triggered).name(), false)
            {
                continue;
            }
            for candidate in self.graph.closure([triggered]) {
                if !state.records.contains_key(&candidate)
                    && !queued.contains(&candidate)
                    && !added.contains(&candidate)
                {
                    added.push(candidate);
                }
            }
        }
        if added.is_empty() {
            return;
        }

        for &candidate in &added {
            state.inclusion.insert(candidate, Inclusion::Triggered);
            tracing::debug!(
                target_name = %self.graph.target(candidate).name(),
                triggered_by = %self.graph.target(node).name(),
                "target triggered"
            );
        }
        let remaining: BTreeSet<NodeIndex> = queued.into_iter().chain(added).collect();
        state.queue = self.graph.order(&remaining).into();
    }

    fn skip(
        &self,
        state: &mut RunState,
        node: NodeIndex,
        reason: SkipReason,
        message: Option<String>,
    ) {
        self.settle(
            state,
            node,
            TargetStatus::Skipped(reason),
            message,
            Duration::ZERO,
        );
    }

    fn abort_remaining(&self, state: &mut RunState, reason: &str) {
        while let Some(node) = state.queue.pop_front() {
            self.settle(
                state,
                node,
                TargetStatus::Aborted,
                Some(reason.to_string()),
                Duration::ZERO,
            );
        }
    }

    /// Record a terminal status; the only place statuses are written
    fn settle(
        &self,
        state: &mut RunState,
        node: NodeIndex,
        status: TargetStatus,
        message: Option<String>,
        duration: Duration,
    ) {
        let name = self.graph.target(node).name().as_str();
        match status {
            TargetStatus::Succeeded => {
                target_completed(name, duration.as_millis() as u64, true);
            }
            TargetStatus::Failed => {
                target_completed(name, duration.as_millis() as u64, false);
                if let Some(message) = &message {
                    tracing::error!(target_name = %name, error = %message, "target body failed");
                }
            }
            TargetStatus::Skipped(reason) => {
                target_skipped(name, message.as_deref().unwrap_or(&reason.to_string()));
            }
            TargetStatus::Aborted => {
                target_aborted(name, message.as_deref().unwrap_or("aborted"));
            }
            TargetStatus::Pending | TargetStatus::Running => {}
        }

        debug_assert!(!state.records.contains_key(&node), "status written twice");
        debug_assert!(
            TargetStatus::Pending.can_transition_to(status)
                || TargetStatus::Running.can_transition_to(status),
            "{status} is not a final status"
        );
        state.sequence.push(node);
        state.records.insert(
            node,
            Record {
                status,
                message,
                duration,
            },
        );
    }

    fn finish(
        &self,
        mut state: RunState,
        outcome: RunOutcome,
        error: Option<String>,
        started: Instant,
    ) -> RunReport {
        let unprocessed: Vec<NodeIndex> = state.queue.drain(..).collect();
        let entries = state
            .sequence
            .iter()
            .chain(unprocessed.iter())
            .map(|&node| {
                let record = state.records.remove(&node);
                ReportEntry {
                    name: self.graph.target(node).name().clone(),
                    inclusion: state
                        .inclusion
                        .get(&node)
                        .copied()
                        .unwrap_or(Inclusion::PulledIn),
                    status: record
                        .as_ref()
                        .map_or(TargetStatus::Pending, |record| record.status),
                    message: record.as_ref().and_then(|record| record.message.clone()),
                    duration: record.map_or(Duration::ZERO, |record| record.duration),
                }
            })
            .collect();

        let report = RunReport::new(outcome, error, started.elapsed(), entries);
        tracing::info!(
            outcome = ?report.outcome(),
            duration_ms = report.duration().as_millis() as u64,
            "run finished"
        );
        report
    }
}
