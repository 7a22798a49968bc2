//
// main.rs
// Imaging-Workflow-rs
//
// Entry point that installs the tracing subscriber and hands off execution to the CLI layer.
//
// Thales Matheus Mendonça Santos - February 2026

use imaging_workflow::cli;

fn main() -> anyhow::Result<()> {
    // Workflow progress goes through tracing; RUST_LOG overrides the level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    cli::run()
}
