//! 日志: 输出到 stderr, stdout 留给状态行

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";

/// 通过 `RUST_LOG` 调整级别, 例如 `RUST_LOG=statbar=debug`
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
