//! End-of-run summary table

use rivet_core::TargetStatus;
use rivet_task::RunReport;
use rivet_utils::tracing::format_duration;
use std::fmt::Write;

const RULE_CHAR: char = '═';
const SEPARATOR_CHAR: char = '─';

/// Render the report as a fixed-width table followed by the outcome line
pub fn render(report: &RunReport) -> String {
    let name_width = report
        .entries()
        .iter()
        .map(|entry| entry.name.as_str().len())
        .chain(std::iter::once("Target".len()))
        .max()
        .unwrap_or(0);
    let status_width = report
        .entries()
        .iter()
        .map(|entry| entry.status.to_string().len())
        .chain(std::iter::once("Status".len()))
        .max()
        .unwrap_or(0);
    let width = name_width + status_width + 14;

    let rule: String = std::iter::repeat(RULE_CHAR).take(width).collect();
    let separator: String = std::iter::repeat(SEPARATOR_CHAR).take(width).collect();

    let mut out = String::new();
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(
        out,
        "{:<name_width$}   {:<status_width$}   Duration",
        "Target", "Status"
    );
    let _ = writeln!(out, "{separator}");

    for entry in report.entries() {
        let duration = match entry.status {
            TargetStatus::Succeeded | TargetStatus::Failed => format_duration(entry.duration),
            _ => String::from("-"),
        };
        let _ = writeln!(
            out,
            "{:<name_width$}   {:<status_width$}   {duration}",
            entry.name.as_str(),
            entry.status.to_string(),
        );
        if let (TargetStatus::Failed | TargetStatus::Aborted, Some(message)) =
            (entry.status, entry.message.as_deref())
        {
            let _ = writeln!(out, "    {message}");
        }
    }

    let _ = writeln!(out, "{separator}");
    let _ = writeln!(
        out,
        "{:<name_width$}   {:<status_width$}   {}",
        "Total",
        "",
        format_duration(report.duration())
    );
    let _ = writeln!(out, "{rule}");
    if let Some(error) = report.error() {
        let _ = writeln!(out, "error: {error}");
    }
    let _ = writeln!(out, "{}", report.outcome());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rivet_params::{BuildContext, ParameterResolver, ValueProviders};
    use rivet_task::{ExecutionEngine, ExecutionPlan, Target, TargetGraph};

    async fn report(targets: Vec<Target>, requested: &[&str]) -> RunReport {
        let graph = TargetGraph::build(targets).unwrap();
        let resolver =
            ParameterResolver::new(BuildContext::default(), Vec::new(), ValueProviders::new())
                .unwrap();
        let plan = ExecutionPlan::for_request(&graph, requested, &[]).unwrap();
        ExecutionEngine::new(&graph, &resolver).run(&plan).await
    }

    #[tokio::test]
    async fn lists_every_target_and_the_outcome() {
        let report = report(
            vec![
                Target::new("Restore"),
                Target::new("CompileEverything").depends_on(["Restore"]),
            ],
            &["CompileEverything"],
        )
        .await;

        let table = render(&report);
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[1].starts_with("Target"));
        assert!(lines[3].starts_with("Restore             "));
        assert!(lines[4].starts_with("CompileEverything   Succeeded"));
        assert_eq!(lines.last(), Some(&"Build succeeded"));
    }

    #[tokio::test]
    async fn failures_carry_their_message() {
        let report = report(
            vec![
                Target::new("Test").executes(|_| anyhow::bail!("3 tests failed")),
                Target::new("Pack").depends_on(["Test"]),
            ],
            &["Pack"],
        )
        .await;

        let table = render(&report);
        assert!(table.contains("    3 tests failed"));
        assert!(table.contains("Aborted"));
        assert!(table.ends_with("Build failed\n"));
    }
}
