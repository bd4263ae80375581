//! Scrape, harvest and resolve commands.

use anyhow::Context;
use console::style;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use orderacquire::harvest::HarvestSummary;
use orderacquire::http_client::HttpClient;
use orderacquire::{Credentials, Pipeline, RunConfig};

use crate::cli::helpers::{cancel_on_ctrl_c, report_progress};

/// Full run: sign in, walk the listing, resolve and export.
pub async fn cmd_scrape(config: RunConfig, credentials: &Credentials) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(config)?;
    let cancel = cancel_on_ctrl_c();

    let summary = harvest(&pipeline, credentials, &cancel).await?;
    print_harvest_summary(&pipeline, &summary);

    if cancel.is_cancelled() {
        println!(
            "{} Cancelled during harvest. Run `orderacquire resolve` to export what was saved.",
            style("!").yellow()
        );
        return Ok(());
    }

    resolve_and_export(&pipeline, &cancel).await
}

/// Sign in and fill the link store only.
pub async fn cmd_harvest(config: RunConfig, credentials: &Credentials) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(config)?;
    let cancel = cancel_on_ctrl_c();

    let summary = harvest(&pipeline, credentials, &cancel).await?;
    print_harvest_summary(&pipeline, &summary);
    Ok(())
}

/// Resolve an existing link store and export.
pub async fn cmd_resolve(config: RunConfig) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(config)?;
    let cancel = cancel_on_ctrl_c();
    resolve_and_export(&pipeline, &cancel).await
}

fn print_harvest_summary(pipeline: &Pipeline, summary: &HarvestSummary) {
    println!(
        "{} Saved {} order links from {} pages to {}",
        style("✓").green(),
        summary.links,
        summary.pages,
        pipeline.store().path().display()
    );
}

#[cfg(feature = "browser")]
async fn harvest(
    pipeline: &Pipeline,
    credentials: &Credentials,
    cancel: &CancellationToken,
) -> anyhow::Result<HarvestSummary> {
    use orderacquire::session::ChromeSession;

    let config = pipeline.config();
    pipeline
        .reset_store()
        .await
        .context("Failed to reset link store")?;

    println!("{} Launching browser", style("→").cyan());
    let mut session = ChromeSession::launch(config.browser.clone())
        .await
        .context("Failed to start browser")?;

    let result = drive_session(pipeline, &mut session, credentials, cancel).await;
    session.close().await;
    result
}

#[cfg(feature = "browser")]
async fn drive_session(
    pipeline: &Pipeline,
    session: &mut orderacquire::session::ChromeSession,
    credentials: &Credentials,
    cancel: &CancellationToken,
) -> anyhow::Result<HarvestSummary> {
    use orderacquire::session::{open_order_history, LoginFlow};

    use crate::cli::helpers::wait_for_enter;

    let config = pipeline.config();
    let delays = config.login.delays();

    LoginFlow::new(credentials, &config.site.sign_in_url)
        .with_delays(delays)
        .run(
            session,
            wait_for_enter(
                "Complete any verification in the browser, then press Enter:",
                cancel,
            ),
        )
        .await
        .context("Sign-in failed")?;

    open_order_history(session, &config.year, &delays)
        .await
        .context("Failed to open order history")?;

    Ok(pipeline
        .harvest(session, cancel)
        .await
        .context("Order listing walk failed")?)
}

#[cfg(not(feature = "browser"))]
async fn harvest(
    _pipeline: &Pipeline,
    _credentials: &Credentials,
    _cancel: &CancellationToken,
) -> anyhow::Result<HarvestSummary> {
    Err(orderacquire::error::SessionError::Unsupported.into())
}

async fn resolve_and_export(pipeline: &Pipeline, cancel: &CancellationToken) -> anyhow::Result<()> {
    let config = pipeline.config();
    let client = HttpClient::new(&config.http)?;

    println!(
        "{} Resolving products from {} using {} workers",
        style("→").cyan(),
        pipeline.store().path().display(),
        config.http.workers.max(1)
    );

    let (tx, rx) = mpsc::channel(100);
    let progress = tokio::spawn(report_progress(rx));

    let (records, summary) = pipeline
        .resolve(&client, cancel, Some(tx))
        .await
        .context("Failed to read link store (run `orderacquire harvest` first?)")?;
    let _ = progress.await;

    let table = pipeline.assemble(&records);
    let output = config.output_file();
    pipeline
        .export(&table)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} Exported {} products ({} resolved, {} skipped) to {}",
        style("✓").green(),
        style(table.len()).bold(),
        summary.resolved,
        summary.failed(),
        output.display()
    );
    println!("  Total spent: {:.2}", table.total());

    if summary.cancelled {
        println!(
            "{} Cancelled with {} links not resolved",
            style("!").yellow(),
            summary.not_attempted
        );
    }

    Ok(())
}
