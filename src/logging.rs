//! Log setup.
//!
//! `RUST_LOG` filters the console layer (default `warn`). The file layer always records `debug` and
//! rotates daily under `~/.config/mmt/logs/mmt.log`. The TUI owns the terminal, so the console layer is
//! only attached for headless runs.

use std::fs;

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::logs_dir;

pub(crate) fn init(console: bool) {
    let console_layer = console.then(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(filter)
    });

    let file_layer = match logs_dir().map(|dir| fs::create_dir_all(&dir).map(|_| dir)) {
        Some(Ok(dir)) => {
            let appender = tracing_appender::rolling::daily(dir, "mmt.log");
            Some(
                fmt::layer()
                    .with_writer(appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new("debug")),
            )
        }
        Some(Err(err)) => {
            if console {
                eprintln!("Warning: Could not initialize file logging: {err}");
            }
            None
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}
