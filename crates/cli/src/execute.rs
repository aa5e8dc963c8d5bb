use crate::cli::Cli;
use crate::summary;
use rivet_config::{Config, ConfigLoader, RuntimeOptions};
use rivet_core::{
    Error, ErrorKind, EXIT_CONFIGURATION_ERROR, EXIT_FAILURE, EXIT_SUCCESS, EXIT_USER_CANCELLED,
};
use rivet_task::{BuildDefinition, CancellationFlag, PreparedBuild, RunOptions};
use rivet_utils::write_atomic_string;

/// Load the configuration for a parsed command line and run the build.
///
/// Returns the process exit code.
pub async fn execute(definition: &dyn BuildDefinition, cli: Cli) -> i32 {
    if let Err(e) = rivet_utils::tracing::init(cli.verbose) {
        eprintln!("rivet: failed to initialise logging: {e}");
    }

    let config = match ConfigLoader::new()
        .runtime(RuntimeOptions::from(cli))
        .load()
    {
        Ok(config) => config,
        Err(e) => return report_error(&e),
    };

    run(definition, &config).await
}

/// Run a build against an already loaded configuration
pub async fn run(definition: &dyn BuildDefinition, config: &Config) -> i32 {
    let settings = config.settings();

    let build = match PreparedBuild::new(definition, config.context().clone()) {
        Ok(build) => build,
        Err(e) => return report_error(&e),
    };

    if settings.describe {
        return match build.metadata().to_json() {
            Ok(json) => {
                println!("{json}");
                EXIT_SUCCESS
            }
            Err(e) => report_error(&e),
        };
    }

    let plan = match build.plan(&settings.targets) {
        Ok(plan) => plan,
        Err(e) => return report_error(&e),
    };

    if settings.plan_only {
        print!("{plan}");
        return EXIT_SUCCESS;
    }

    let cancellation = CancellationFlag::new();
    let interrupt = {
        let cancellation = cancellation.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, finishing the running target");
                cancellation.cancel();
            }
        })
    };

    let report = build
        .engine()
        .with_options(RunOptions {
            policy: settings.policy,
            skip: settings.skip.clone(),
        })
        .with_cancellation(cancellation)
        .run(&plan)
        .await;
    interrupt.abort();

    print!("{}", summary::render(&report));

    let mut exit_code = report.exit_code();
    if let Some(path) = config.report_path() {
        let written = report
            .to_json()
            .and_then(|json| write_atomic_string(&path, &json));
        match written {
            Ok(()) => tracing::info!(path = %path.display(), "wrote run report"),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to write run report");
                eprintln!("error: {e}");
                if exit_code == EXIT_SUCCESS {
                    exit_code = EXIT_FAILURE;
                }
            }
        }
    }
    exit_code
}

fn report_error(error: &Error) -> i32 {
    eprintln!("error: {error}");
    exit_code(error.kind())
}

fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Configuration => EXIT_CONFIGURATION_ERROR,
        ErrorKind::Cancelled => EXIT_USER_CANCELLED,
        ErrorKind::Execution | ErrorKind::Io => EXIT_FAILURE,
    }
}
