//! Logger setup

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "info";

/// Install a fmt subscriber writing to stderr. `log` records from the client
/// crates are forwarded to it as well.
///
/// The filter is `level` when given, then `RUST_LOG`, then `info`. A level
/// that does not parse falls back to `info`.
pub fn init_logger(level: Option<&str>) {
    let directive = resolve_directive(level, std::env::var(EnvFilter::DEFAULT_ENV).ok());
    let filter =
        EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false)
        .try_init();

    if result.is_err() {
        tracing::debug!("logger already initialised");
    }
}

fn resolve_directive(level: Option<&str>, from_env: Option<String>) -> String {
    level
        .map(str::trim)
        .filter(|level| !level.is_empty())
        .map(str::to_string)
        .or_else(|| from_env.filter(|value| !value.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_level_wins_over_env() {
        assert_eq!(
            resolve_directive(Some("debug"), Some("warn".into())),
            "debug"
        );
    }

    #[test]
    fn env_is_used_without_a_level() {
        assert_eq!(
            resolve_directive(None, Some("mesa_pos=trace".into())),
            "mesa_pos=trace"
        );
        assert_eq!(resolve_directive(Some(" "), Some("warn".into())), "warn");
    }

    #[test]
    fn falls_back_to_info() {
        assert_eq!(resolve_directive(None, None), "info");
        assert_eq!(resolve_directive(None, Some(String::new())), "info");
    }
}
