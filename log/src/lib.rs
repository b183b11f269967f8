use std::sync::Mutex;

use slog::Fuse;
use slog_async::Async;
use slog_json::Json;

pub use slog::{
    debug, error, info, o, trace, warn, Discard, Drain, Logger, Never, OwnedKVList, Record,
};

/// Builds the root logger: JSON lines on stderr, written asynchronously.
/// With the `env_logging` feature, records are filtered by `RUST_LOG`.
pub fn initialize_logger() -> Logger {
    let drain = Mutex::new(Json::default(std::io::stderr())).map(Fuse);

    #[cfg(feature = "env_logging")]
    let drain = slog_envlogger::new(drain).ignore_res();

    let drain = Async::new(drain).build().fuse();

    Logger::root(
        drain,
        o!("version" => info::VERSION, "revision" => info::REVISION, "build_timestamp" => info::BUILD_TIMESTAMP),
    )
}

/// A logger that drops every record, for tests and tools that don't log.
pub fn discard_logger() -> Logger {
    Logger::root(Discard, o!())
}
