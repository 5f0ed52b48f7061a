use eyre::{eyre, Result};
use std::{backtrace::Backtrace, panic};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber. The filter is read from `RUST_LOG` and
/// defaults to `info`.
pub fn initialize_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().compact())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .try_init()
        .map_err(|e| eyre!("Could not install tracing subscriber: {e}"))?;

    // Set a custom panic hook to print backtraces on one line
    panic::set_hook(Box::new(|panic_info| {
        let message = match panic_info.payload().downcast_ref::<&str>() {
            Some(s) => *s,
            None => match panic_info.payload().downcast_ref::<String>() {
                Some(s) => s.as_str(),
                None => "Unknown panic message",
            },
        };
        let location = if let Some(location) = panic_info.location() {
            format!(
                "{}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            )
        } else {
            "Unknown location".to_string()
        };

        let backtrace = Backtrace::capture();
        let backtrace_single_line = format!("{:?}", backtrace).replace('\n', " | ");

        tracing::error!(
            { backtrace = %backtrace_single_line, location = %location},
            "Panic occurred with message: {}",
            message
        );
    }));
    Ok(())
}
