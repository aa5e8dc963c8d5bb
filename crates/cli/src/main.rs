//! Demo build exercising the rivet engine end to end

use clap::Parser;
use rivet::{
    BuildDefinition, Cli, ParameterDescriptor, RawValue, Requirement, Target, TargetContext,
    ValueProviders,
};

struct DemoBuild;

fn announce(ctx: &TargetContext<'_>, message: &str) {
    println!("[{}] {message}", ctx.target());
}

impl BuildDefinition for DemoBuild {
    fn name(&self) -> &str {
        "demo"
    }

    fn targets(&self) -> Vec<Target> {
        vec![
            Target::new("Clean")
                .described("Remove build outputs")
                .before(["Restore"])
                .executes(|ctx| {
                    announce(ctx, "cleaning");
                    Ok(())
                }),
            Target::new("Restore")
                .described("Restore dependencies")
                .executes(|ctx| {
                    announce(ctx, "restoring");
                    Ok(())
                }),
            Target::new("Compile")
                .described("Compile the sources")
                .depends_on(["Restore"])
                .after(["Clean"])
                .uses_parameters(["Configuration"])
                .executes(|ctx| {
                    let configuration = ctx.value("Configuration")?.as_str().unwrap_or("Debug");
                    announce(ctx, &format!("compiling in {configuration}"));
                    Ok(())
                }),
            Target::new("Test")
                .described("Run the test suite")
                .depends_on(["Compile"])
                .executes(|ctx| {
                    if ctx.value("FailTests")?.as_bool() == Some(true) {
                        anyhow::bail!("2 of 48 tests failed");
                    }
                    announce(ctx, "all tests passed");
                    Ok(())
                }),
            Target::new("Pack")
                .described("Create the package")
                .depends_on(["Compile"])
                .after(["Test"])
                .triggers(["Notify"])
                .executes(|ctx| {
                    let version = ctx.value("Version")?.to_string();
                    announce(ctx, &format!("packed version {version}"));
                    Ok(())
                }),
            Target::new("Publish")
                .described("Push the package to the feed")
                .depends_on(["Pack"])
                .requires(Requirement::parameter("ApiKey"))
                .executes(|ctx| {
                    announce(ctx, "published");
                    Ok(())
                }),
            Target::new("Notify").unlisted().executes(|ctx| {
                announce(ctx, "notified");
                Ok(())
            }),
        ]
    }

    fn parameters(&self) -> Vec<ParameterDescriptor> {
        vec![
            ParameterDescriptor::choice("Configuration", ["Debug", "Release"])
                .described("Build configuration"),
            ParameterDescriptor::bool("FailTests").described("Make the test target fail"),
            ParameterDescriptor::string("Version")
                .described("Package version")
                .provided_by("version"),
            ParameterDescriptor::string("ApiKey")
                .nullable()
                .secret()
                .described("Feed API key"),
        ]
    }

    fn value_providers(&self) -> ValueProviders {
        ValueProviders::new().with("version", || {
            Ok(Some(RawValue::single(env!("CARGO_PKG_VERSION"))))
        })
    }

    fn default_targets(&self) -> Vec<String> {
        vec!["Test".into()]
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let code = rivet::execute(&DemoBuild, cli).await;
    std::process::exit(code);
}
