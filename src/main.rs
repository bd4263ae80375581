//! orderacquire - export purchased products from an online order history.

mod cli;

use std::future::Future;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long shutdown waits for blocking tasks, such as a stdin read left
/// pending by a cancelled prompt.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "orderacquire=info"
    } else {
        "orderacquire=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    block_on_with_shutdown(cli::run())
}

/// Run `fut` on a fresh multi-threaded runtime, then shut it down without
/// waiting on blocking tasks for longer than [`SHUTDOWN_GRACE`].
fn block_on_with_shutdown<F>(fut: F) -> anyhow::Result<()>
where
    F: Future<Output = anyhow::Result<()>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(fut);
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}
