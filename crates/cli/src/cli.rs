use clap::{ArgAction, Parser};
use rivet_config::RuntimeOptions;
use std::path::PathBuf;

/// Command line of a rivet build.
///
/// Build parameters come after `--` so they never collide with the tool's
/// own flags: `rivet Pack --continue -- -configuration Release`.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "rivet")]
#[command(about = "Run targets of a code-first build", long_about = None)]
#[command(version)]
#[command(after_help = "ENVIRONMENT VARIABLES:
    RIVET_LOG        Log filter (e.g. debug, rivet_task=trace)
    RIVET_CONTINUE   Continue independent targets after a failure
    RIVET_SKIP       Comma-separated targets to skip; empty skips all non-requested")]
pub struct Cli {
    /// Targets to run; the build's default targets when none are given
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Skip the named targets, or every non-requested target when no names follow
    #[arg(long, value_name = "TARGET", num_args = 0.., value_delimiter = ',')]
    pub skip: Option<Vec<String>>,

    /// Keep running independent targets after a failure
    #[arg(long = "continue")]
    pub continue_on_failure: bool,

    /// Print the execution plan and exit
    #[arg(long = "plan")]
    pub plan_only: bool,

    /// Print build metadata as JSON and exit
    #[arg(long, conflicts_with = "plan_only")]
    pub describe: bool,

    /// Write a JSON run report to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Build parameters in `-name value` form
    #[arg(last = true, value_name = "PARAMETERS")]
    pub parameters: Vec<String>,
}

impl From<Cli> for RuntimeOptions {
    fn from(cli: Cli) -> Self {
        RuntimeOptions {
            targets: cli.targets,
            skip: cli.skip,
            continue_on_failure: cli.continue_on_failure,
            plan_only: cli.plan_only,
            describe: cli.describe,
            report_path: cli.report,
            verbosity: cli.verbose,
            parameter_args: cli.parameters,
        }
    }
}
