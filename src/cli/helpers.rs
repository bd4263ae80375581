//! Shared helpers for CLI commands.

use std::io::{self, Write};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use orderacquire::pipeline::ResolveEvent;

/// Token cancelled on the first Ctrl-C. A second Ctrl-C exits immediately.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        eprintln!(
            "\n{} Interrupted, saving what was collected (Ctrl-C again to quit)",
            style("!").yellow()
        );
        child.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });

    token
}

/// Wait for the operator to press Enter.
///
/// Resolves to `false` if stdin closes or the run is cancelled first. A
/// cancelled run never starts reading.
pub async fn wait_for_enter(prompt: &str, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }

    print!("{} {} ", style("?").cyan(), prompt);
    let _ = io::stdout().flush();

    let mut reader = BufReader::new(tokio::io::stdin());
    let mut input = String::new();

    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        read = reader.read_line(&mut input) => matches!(read, Ok(n) if n > 0),
    }
}

/// Truncate string for display.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Drive a progress bar from resolution events until the sender is dropped.
pub async fn report_progress(mut events: mpsc::Receiver<ResolveEvent>) {
    let mut progress: Option<ProgressBar> = None;

    while let Some(event) = events.recv().await {
        match event {
            ResolveEvent::Started { total } => {
                let pb = ProgressBar::new(total as u64);
                if let Ok(bar_style) = ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
                {
                    pb.set_style(bar_style.progress_chars("█▓░"));
                }
                pb.set_message("Resolving products...");
                progress = Some(pb);
            }
            ResolveEvent::ItemResolved { label } => {
                if let Some(pb) = &progress {
                    pb.set_message(truncate(&label, 40));
                    pb.inc(1);
                }
            }
            ResolveEvent::ItemFailed { label, error } => {
                if let Some(pb) = &progress {
                    pb.println(format!(
                        "{} {}: {}",
                        style("✗").red(),
                        truncate(&label, 40),
                        error
                    ));
                    pb.inc(1);
                }
            }
            ResolveEvent::Complete { .. } => {
                if let Some(pb) = progress.take() {
                    pb.finish_and_clear();
                }
            }
        }
    }
}
