use cashback_desk::application::controller::WorkflowController;
use cashback_desk::config::Settings;
use cashback_desk::interfaces::console;
use cashback_desk::telemetry;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::io;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::parse();
    telemetry::init(&settings.log_level);

    let gateways = settings.gateways().into_diagnostic()?;
    let mut controller = WorkflowController::new(gateways, settings.controller_options());

    let stdin = io::stdin();
    let stdout = io::stdout();
    console::run(&mut controller, stdin.lock(), stdout.lock())
        .await
        .into_diagnostic()?;

    Ok(())
}
