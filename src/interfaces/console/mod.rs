//! Line-oriented terminal front-end for the workflow controller.

pub mod command;
pub mod render;

use crate::application::controller::WorkflowController;
use crate::domain::catalog::ProductId;
use crate::error::{DeskError, Result, ValidationError};
use command::{Command, HELP};
use std::io::{BufRead, Write};
use tracing::debug;

/// Feeds commands read from `input` to the controller and writes the rendered
/// session to `output` after each one. Rejected commands are reported inline;
/// only I/O failures end the loop early.
pub async fn run<R: BufRead, W: Write>(
    controller: &mut WorkflowController,
    input: R,
    mut output: W,
) -> Result<()> {
    writeln!(output, "{}", render::session(controller.session()))?;

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                writeln!(output, "! {e}")?;
                continue;
            }
        };
        debug!(?command, "console command");
        if command == Command::Quit {
            break;
        }

        match dispatch(controller, command).await {
            Ok(Some(extra)) => write!(output, "{extra}")?,
            Ok(None) => {}
            // Rejections from the controller already show up as the session notice.
            Err(DeskError::Validation(e))
                if controller.session().notice.as_deref() == Some(e.to_string().as_str()) => {}
            Err(e) => writeln!(output, "! {e}")?,
        }
        controller.sync_balance();
        writeln!(output, "{}", render::session(controller.session()))?;
    }
    Ok(())
}

async fn dispatch(controller: &mut WorkflowController, command: Command) -> Result<Option<String>> {
    match command {
        Command::Search(text) => {
            controller.search(&text);
            let snapshot = controller.search_settled().await;
            return Ok(Some(render::search_results(&snapshot, controller.session())));
        }
        Command::Select(n) => {
            let results = controller.search_results();
            let product = results
                .products
                .get(n - 1)
                .ok_or(ValidationError::NoSuchItem(n))?;
            controller.toggle_product(product)?;
        }
        Command::Manual { price, name } => controller.add_manual_item(&name, price)?,
        Command::Remove(n) => {
            controller.remove_manual_item(n - 1)?;
        }
        Command::Edit(n) => {
            let id = selected_id(controller, n)?;
            controller.begin_price_edit(&id)?;
        }
        Command::Price { index, price } => {
            let id = selected_id(controller, index)?;
            controller.set_override_price(&id, price)?;
        }
        Command::ConfirmPrice(n) => {
            let id = selected_id(controller, n)?;
            controller.confirm_price_edit(&id)?;
        }
        Command::CancelPrice(n) => {
            let id = selected_id(controller, n)?;
            controller.cancel_price_edit(&id)?;
        }
        Command::Mode(operation) => controller.switch_operation(operation)?,
        Command::Amount(amount) => controller.set_debit_amount(amount)?,
        Command::Pay(method) => controller.set_payment_method(method)?,
        Command::Confirm => controller.confirm_selection()?,
        Command::Back => controller.back_to_selection()?,
        Command::Scan => controller.start_scan()?,
        Command::Stop => controller.stop_scan()?,
        Command::Decode(payload) => controller.on_decoded(&payload)?,
        Command::Balance => {
            controller.await_balance().await;
        }
        Command::Submit => {
            controller.submit().await?;
        }
        Command::Retry => controller.retry()?,
        Command::Reset => controller.reset(),
        Command::Help => return Ok(Some(format!("{HELP}\n"))),
        Command::Quit => {}
    }
    Ok(None)
}

fn selected_id(controller: &WorkflowController, n: usize) -> Result<ProductId> {
    controller
        .session()
        .items
        .selections()
        .get(n - 1)
        .map(|s| s.id.clone())
        .ok_or_else(|| ValidationError::NoSuchItem(n).into())
}
