//! End-to-end runs over small build definitions

use rivet_core::{FailurePolicy, RunOutcome, SkipReason, SkipSelection, TargetName, TargetStatus};
use rivet_params::{BuildContext, ParameterDescriptor, RawValue, ValueProviders};
use rivet_task::{
    BuildDefinition, CancellationFlag, ExecutionEngine, ExecutionPlan, PreparedBuild, Requirement,
    RunOptions, RunReport, Target, TargetBody, TargetContext, TargetGraph,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Shared log of executed bodies
#[derive(Clone, Default)]
struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    fn record(&self, name: &str) {
        self.0.lock().unwrap().push(name.to_string());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

fn step(journal: &Journal, name: &str) -> Target {
    let journal = journal.clone();
    let label = name.to_string();
    Target::new(name).executes(move |_| {
        journal.record(&label);
        Ok(())
    })
}

fn failing(journal: &Journal, name: &str) -> Target {
    let journal = journal.clone();
    let label = name.to_string();
    Target::new(name).executes(move |_| {
        journal.record(&label);
        anyhow::bail!("{label} exited with code 1")
    })
}

/// `Clean → Compile → Test → Pack`, optionally with a failing Compile
fn chain(journal: &Journal, compile_fails: bool) -> Vec<Target> {
    let compile = if compile_fails {
        failing(journal, "Compile")
    } else {
        step(journal, "Compile")
    };
    vec![
        step(journal, "Clean"),
        compile.depends_on(["Clean"]),
        step(journal, "Test").depends_on(["Compile"]),
        step(journal, "Pack").depends_on(["Test"]),
    ]
}

fn options(policy: FailurePolicy) -> RunOptions {
    RunOptions {
        policy,
        skip: SkipSelection::None,
    }
}

async fn run_with(
    targets: Vec<Target>,
    parameters: Vec<ParameterDescriptor>,
    context: BuildContext,
    requested: &[&str],
    options: RunOptions,
) -> RunReport {
    let graph = TargetGraph::build(targets).unwrap();
    let resolver =
        rivet_params::ParameterResolver::new(context, parameters, ValueProviders::new()).unwrap();
    let plan = ExecutionPlan::for_request(&graph, requested, &[]).unwrap();
    ExecutionEngine::new(&graph, &resolver)
        .with_options(options)
        .run(&plan)
        .await
}

async fn run(targets: Vec<Target>, requested: &[&str], options: RunOptions) -> RunReport {
    run_with(targets, vec![], BuildContext::default(), requested, options).await
}

fn order(report: &RunReport) -> Vec<&str> {
    report.entries().iter().map(|e| e.name.as_str()).collect()
}

#[tokio::test]
async fn linear_chain_runs_in_dependency_order() {
    let journal = Journal::default();
    let graph = TargetGraph::build(chain(&journal, false)).unwrap();
    let plan = ExecutionPlan::for_request(&graph, &["Pack"], &[]).unwrap();
    let names: Vec<&str> = plan.names().map(TargetName::as_str).collect();
    assert_eq!(names, vec!["Clean", "Compile", "Test", "Pack"]);

    let report = run(chain(&journal, false), &["Pack"], RunOptions::default()).await;
    assert_eq!(report.outcome(), RunOutcome::Success);
    for name in ["Clean", "Compile", "Test", "Pack"] {
        assert_eq!(report.status(name), Some(TargetStatus::Succeeded), "{name}");
    }
    assert_eq!(journal.entries(), vec!["Clean", "Compile", "Test", "Pack"]);
}

#[tokio::test]
async fn fail_fast_aborts_everything_after_failure() {
    let journal = Journal::default();
    let report = run(
        chain(&journal, true),
        &["Pack"],
        options(FailurePolicy::FailFast),
    )
    .await;

    assert_eq!(report.status("Clean"), Some(TargetStatus::Succeeded));
    assert_eq!(report.status("Compile"), Some(TargetStatus::Failed));
    assert_eq!(report.status("Test"), Some(TargetStatus::Aborted));
    assert_eq!(report.status("Pack"), Some(TargetStatus::Aborted));
    assert_eq!(report.outcome(), RunOutcome::Failure);
    assert_eq!(
        report.message("Compile"),
        Some("Compile exited with code 1")
    );
    assert_eq!(journal.entries(), vec!["Clean", "Compile"]);
}

#[tokio::test]
async fn fail_fast_stops_independent_branches_too() {
    let journal = Journal::default();
    let mut targets = chain(&journal, true);
    targets.push(step(&journal, "Lint").depends_on(["Clean"]));

    let report = run(targets, &["Pack", "Lint"], options(FailurePolicy::FailFast)).await;
    assert_eq!(report.status("Lint"), Some(TargetStatus::Aborted));
    assert!(!journal.entries().contains(&"Lint".to_string()));
}

#[tokio::test]
async fn continue_runs_independent_branches() {
    let journal = Journal::default();
    let mut targets = chain(&journal, true);
    targets.push(step(&journal, "Lint").depends_on(["Clean"]));

    let report = run(targets, &["Pack", "Lint"], options(FailurePolicy::Continue)).await;

    assert_eq!(report.status("Clean"), Some(TargetStatus::Succeeded));
    assert_eq!(report.status("Compile"), Some(TargetStatus::Failed));
    assert_eq!(report.status("Test"), Some(TargetStatus::Aborted));
    assert_eq!(report.status("Pack"), Some(TargetStatus::Aborted));
    assert_eq!(report.status("Lint"), Some(TargetStatus::Succeeded));
    assert_eq!(report.outcome(), RunOutcome::Failure);
    assert_eq!(
        report.message("Pack"),
        Some("dependency 'Test' was aborted")
    );
}

#[tokio::test]
async fn unmet_requirement_skips_without_failing() {
    let journal = Journal::default();
    let targets = vec![
        step(&journal, "Pack"),
        step(&journal, "Deploy")
            .depends_on(["Pack"])
            .requires(Requirement::parameter("Tag")),
    ];
    let report = run_with(
        targets,
        vec![ParameterDescriptor::string("Tag").nullable()],
        BuildContext::default(),
        &["Deploy"],
        RunOptions::default(),
    )
    .await;

    assert_eq!(
        report.status("Deploy"),
        Some(TargetStatus::Skipped(SkipReason::RequirementNotMet))
    );
    assert_eq!(report.outcome(), RunOutcome::Success);
    assert_eq!(journal.entries(), vec!["Pack"]);
}

#[tokio::test]
async fn supplied_requirement_runs_target() {
    let journal = Journal::default();
    let targets = vec![step(&journal, "Deploy").requires(Requirement::parameter("Tag"))];
    let report = run_with(
        targets,
        vec![ParameterDescriptor::string("Tag").nullable()],
        BuildContext::builder().args(["-tag", "v1.0.0"]).build(),
        &["Deploy"],
        RunOptions::default(),
    )
    .await;
    assert_eq!(report.status("Deploy"), Some(TargetStatus::Succeeded));
}

#[tokio::test]
async fn missing_required_parameter_runs_nothing() {
    let journal = Journal::default();
    let report = run_with(
        chain(&journal, false),
        vec![ParameterDescriptor::string("ApiKey").required().secret()],
        BuildContext::default(),
        &["Pack"],
        RunOptions::default(),
    )
    .await;

    assert_eq!(report.outcome(), RunOutcome::ConfigurationError);
    assert_eq!(report.exit_code(), 2);
    assert!(report.error().unwrap().contains("ApiKey"));
    assert!(journal.entries().is_empty());
    assert!(report
        .entries()
        .iter()
        .all(|entry| entry.status == TargetStatus::Pending));
}

#[tokio::test]
async fn malformed_parameter_used_by_target_runs_nothing() {
    let journal = Journal::default();
    let targets = vec![
        step(&journal, "Clean"),
        step(&journal, "Test")
            .depends_on(["Clean"])
            .uses_parameters(["Retries"]),
    ];
    let report = run_with(
        targets,
        vec![ParameterDescriptor::integer("Retries")],
        BuildContext::builder().args(["-retries", "often"]).build(),
        &["Test"],
        RunOptions::default(),
    )
    .await;

    assert_eq!(report.outcome(), RunOutcome::ConfigurationError);
    assert!(report.error().unwrap().contains("'often'"));
    assert!(journal.entries().is_empty());
}

#[tokio::test]
async fn triggers_run_after_successful_target() {
    let journal = Journal::default();
    let targets = vec![
        step(&journal, "Compile").triggers(["Notify"]),
        step(&journal, "Restore"),
        step(&journal, "Notify").depends_on(["Restore"]),
        step(&journal, "Test").depends_on(["Compile"]),
    ];
    let report = run(targets, &["Test"], RunOptions::default()).await;

    assert_eq!(report.outcome(), RunOutcome::Success);
    assert_eq!(order(&report), vec!["Compile", "Restore", "Notify", "Test"]);
    assert_eq!(
        report.entry("Notify").unwrap().inclusion,
        rivet_task::Inclusion::Triggered
    );
}

#[tokio::test]
async fn failed_target_does_not_trigger() {
    let journal = Journal::default();
    let targets = vec![
        failing(&journal, "Publish").triggers(["Announce"]),
        step(&journal, "Announce"),
    ];
    let report = run(targets, &["Publish"], options(FailurePolicy::Continue)).await;
    assert_eq!(report.status("Announce"), None);
    assert_eq!(journal.entries(), vec!["Publish"]);
}

#[tokio::test]
async fn triggered_by_is_the_reverse_of_triggers() {
    let journal = Journal::default();
    let targets = vec![
        step(&journal, "Pack"),
        step(&journal, "UploadArtifacts").triggered_by(["Pack"]),
    ];
    let report = run(targets, &["Pack"], RunOptions::default()).await;
    assert_eq!(
        report.status("UploadArtifacts"),
        Some(TargetStatus::Succeeded)
    );
}

#[tokio::test]
async fn assured_target_runs_after_fail_fast_stop() {
    let journal = Journal::default();
    let targets = vec![
        failing(&journal, "Compile"),
        step(&journal, "Test").depends_on(["Compile"]),
        step(&journal, "UploadLogs").assured_after_failure(),
        step(&journal, "Report")
            .depends_on(["Compile"])
            .assured_after_failure(),
    ];
    let report = run(
        targets,
        &["Test", "UploadLogs", "Report"],
        options(FailurePolicy::FailFast),
    )
    .await;

    assert_eq!(report.status("Test"), Some(TargetStatus::Aborted));
    assert_eq!(report.status("UploadLogs"), Some(TargetStatus::Succeeded));
    // Its own dependency failed
    assert_eq!(report.status("Report"), Some(TargetStatus::Aborted));
}

#[tokio::test]
async fn proceed_after_failure_keeps_fail_fast_run_going() {
    let journal = Journal::default();
    let targets = vec![
        failing(&journal, "Analyze").proceed_after_failure(),
        step(&journal, "Compile"),
    ];
    let report = run(
        targets,
        &["Analyze", "Compile"],
        options(FailurePolicy::FailFast),
    )
    .await;
    assert_eq!(report.status("Analyze"), Some(TargetStatus::Failed));
    assert_eq!(report.status("Compile"), Some(TargetStatus::Succeeded));
    assert_eq!(report.outcome(), RunOutcome::Failure);
}

#[tokio::test]
async fn named_skip_forces_skipped_status() {
    let journal = Journal::default();
    let report = run(
        chain(&journal, false),
        &["Pack"],
        RunOptions {
            policy: FailurePolicy::FailFast,
            skip: SkipSelection::Named(vec![TargetName::new("test").unwrap()]),
        },
    )
    .await;
    assert_eq!(
        report.status("Test"),
        Some(TargetStatus::Skipped(SkipReason::SkippedByUser))
    );
    assert_eq!(report.status("Pack"), Some(TargetStatus::Succeeded));
    assert_eq!(journal.entries(), vec!["Clean", "Compile", "Pack"]);
}

#[tokio::test]
async fn static_condition_is_evaluated_once_before_run() {
    let evaluations = Arc::new(AtomicUsize::new(0));
    let counter = evaluations.clone();
    let journal = Journal::default();
    let targets = vec![
        step(&journal, "Compile"),
        step(&journal, "Sign").only_when_static("signing enabled", move |params| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(params.value("Sign")?.as_bool().unwrap_or(false))
        }),
    ];
    let report = run_with(
        targets,
        vec![ParameterDescriptor::bool("Sign")],
        BuildContext::default(),
        &["Compile", "Sign"],
        RunOptions::default(),
    )
    .await;

    assert_eq!(
        report.status("Sign"),
        Some(TargetStatus::Skipped(SkipReason::ConditionFalse))
    );
    assert_eq!(evaluations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dynamic_condition_sees_parameters() {
    let journal = Journal::default();
    let targets = vec![step(&journal, "Publish").only_when("on release branch", |params| {
        Ok(params.value("Branch")?.as_str() == Some("main"))
    })];
    let report = run_with(
        targets,
        vec![ParameterDescriptor::string("Branch")],
        BuildContext::builder().env_var("BRANCH", "main").build(),
        &["Publish"],
        RunOptions::default(),
    )
    .await;
    assert_eq!(report.status("Publish"), Some(TargetStatus::Succeeded));
}

struct CancelOnRun(CancellationFlag);

#[async_trait::async_trait]
impl TargetBody for CancelOnRun {
    async fn run(&self, _ctx: &TargetContext<'_>) -> anyhow::Result<()> {
        self.0.cancel();
        Ok(())
    }
}

#[tokio::test]
async fn cancellation_aborts_remaining_targets() {
    let journal = Journal::default();
    let flag = CancellationFlag::new();
    let targets = vec![
        Target::new("Clean").executes_with(CancelOnRun(flag.clone())),
        step(&journal, "Compile").depends_on(["Clean"]),
        step(&journal, "Lint"),
    ];
    let graph = TargetGraph::build(targets).unwrap();
    let resolver = rivet_params::ParameterResolver::new(
        BuildContext::default(),
        vec![],
        ValueProviders::new(),
    )
    .unwrap();
    let plan = ExecutionPlan::for_request(&graph, &["Compile", "Lint"], &[]).unwrap();
    let report = ExecutionEngine::new(&graph, &resolver)
        .with_cancellation(flag)
        .run(&plan)
        .await;

    // The running body finishes; nothing after it starts
    assert_eq!(report.status("Clean"), Some(TargetStatus::Succeeded));
    assert_eq!(report.status("Compile"), Some(TargetStatus::Aborted));
    assert_eq!(report.status("Lint"), Some(TargetStatus::Aborted));
    assert_eq!(report.outcome(), RunOutcome::UserCancelled);
    assert_eq!(report.exit_code(), 130);
    assert!(journal.entries().is_empty());
}

struct Release;

impl BuildDefinition for Release {
    fn targets(&self) -> Vec<Target> {
        vec![
            Target::new("Compile"),
            Target::new("Publish")
                .depends_on(["Compile"])
                .requires(Requirement::parameter("Version"))
                .executes(|ctx| {
                    let version = ctx.value("Version")?;
                    anyhow::ensure!(!version.is_null(), "version missing");
                    Ok(())
                }),
        ]
    }

    fn parameters(&self) -> Vec<ParameterDescriptor> {
        vec![ParameterDescriptor::string("Version").provided_by("git-describe")]
    }

    fn value_providers(&self) -> ValueProviders {
        ValueProviders::new().with("git-describe", || Ok(Some(RawValue::single("2.1.0"))))
    }

    fn default_targets(&self) -> Vec<String> {
        vec!["Publish".into()]
    }
}

#[tokio::test]
async fn provider_value_satisfies_requirement() {
    let build = PreparedBuild::new(&Release, BuildContext::default()).unwrap();
    let plan = build.plan::<&str>(&[]).unwrap();
    let report = build.engine().run(&plan).await;

    assert_eq!(report.outcome(), RunOutcome::Success);
    assert_eq!(report.status("Publish"), Some(TargetStatus::Succeeded));
    assert_eq!(
        build.resolver().value("Version").unwrap().as_str(),
        Some("2.1.0")
    );
}
