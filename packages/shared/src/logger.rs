//! Logging setup utilities for the CodeUnity server.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build the default filter directive for the given tracing targets.
///
/// Targets are crate names as they appear in module paths (`codeunity_server`,
/// `tower_http`); hyphens are normalized to underscores.
pub fn default_directive(targets: &[&str], default_log_level: &str) -> String {
    targets
        .iter()
        .map(|target| format!("{}={}", target.replace('-', "_"), default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `targets` - The crates whose events should be recorded (e.g. `["codeunity_server"]`)
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use codeunity_shared::logger::setup_logger;
///
/// setup_logger(&["codeunity_server", "tower_http"], "info");
/// ```
pub fn setup_logger(targets: &[&str], default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(targets, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_joins_targets() {
        // テスト項目: 複数のターゲットがカンマ区切りのディレクティブになる
        // given (前提条件):
        let targets = ["codeunity_server", "tower_http"];

        // when (操作):
        let directive = default_directive(&targets, "debug");

        // then (期待する結果):
        assert_eq!(directive, "codeunity_server=debug,tower_http=debug");
    }

    #[test]
    fn test_default_directive_normalizes_hyphens() {
        // テスト項目: バイナリ名のハイフンがアンダースコアに変換される
        // given (前提条件):
        let targets = ["codeunity-server"];

        // when (操作):
        let directive = default_directive(&targets, "info");

        // then (期待する結果):
        assert_eq!(directive, "codeunity_server=info");
    }
}
