//! tracing subscriber setup: console, plus a daily file when a log dir is set
//!
//! Console output always; a daily rolling file when a log directory is configured.

use std::path::Path;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over `log_level`. The file is created under
/// `log_dir` as `order-server.YYYY-MM-DD`.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        match std::fs::create_dir_all(log_path) {
            Ok(()) => {
                let file_appender = tracing_appender::rolling::daily(log_path, "order-server");
                let _ = subscriber
                    .with_writer(std::io::stdout.and(file_appender))
                    .try_init();
                return;
            }
            Err(e) => eprintln!("Failed to create log directory {dir}: {e}"),
        }
    }

    let _ = subscriber.try_init();
}
