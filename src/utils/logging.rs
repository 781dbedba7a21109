// file: src/utils/logging.rs
// description: Tracing subscriber initialization with optional ANSI coloring

use colored::{Color, Colorize};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Logs go to stderr; stdout is reserved for command output. `RUST_LOG`
/// replaces the default filter entirely.
pub fn init_logger(colored_output: bool, verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact()
        .with_ansi(colored_output);

    // a second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn default_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    // HTTP and PDF parser internals stay quiet even in verbose mode
    EnvFilter::new(format!("{level},hyper=warn,hyper_util=warn,reqwest=warn,lopdf=warn"))
}

pub fn format_success(msg: &str) -> String {
    status_line("✓", msg, Color::Green)
}

pub fn format_error(msg: &str) -> String {
    status_line("✗", msg, Color::Red)
}

pub fn format_warning(msg: &str) -> String {
    status_line("⚠", msg, Color::Yellow)
}

fn status_line(symbol: &str, msg: &str, color: Color) -> String {
    format!("{} {}", symbol.color(color).bold(), msg.color(color))
}
