use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

/// Console output style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(anyhow::anyhow!("Unknown log format: {other}")),
        }
    }
}

/// Initialize structured logging system.
///
/// `RUST_LOG` takes precedence over `log_level`. When `log_file` is set a
/// daily-rolling JSON log is written next to it; keep the returned guard
/// alive until exit so buffered lines are flushed.
pub fn init_logging(log_level: Option<&str>, log_file: Option<&Path>, format: LogFormat) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            let level = log_level.unwrap_or("info");
            EnvFilter::try_new(level)
        })
        .map_err(|e| anyhow::anyhow!("Failed to create log filter: {}", e))?;

    let console_layer = match format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .json()
            .boxed(),
    };

    let (file_layer, guard) = match log_file {
        Some(log_path) => {
            let directory = log_path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let file_name = log_path
                .file_name()
                .map_or_else(|| "vendor-compliance.log".into(), |n| n.to_string_lossy().into_owned());

            let file_appender = rolling::daily(directory, file_name);
            let (non_blocking_appender, guard) = non_blocking(file_appender);

            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .json();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

    info!("Logging system initialized");
    Ok(guard)
}

/// Performance timing utilities
///
/// Logs once: at info from [`OperationTimer::finish`], or at debug when
/// dropped unfinished.
pub struct OperationTimer {
    operation: String,
    start: Instant,
    finished: bool,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
            finished: false,
        }
    }

    /// Time since the timer started
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(mut self) -> Duration {
        let duration = self.start.elapsed();
        self.finished = true;
        tracing::info!(
            operation = self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
        duration
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        if !self.finished && !std::thread::panicking() {
            tracing::debug!(
                operation = self.operation,
                duration_ms = self.start.elapsed().as_millis(),
                "Operation finished"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing::Level;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn captured_lines(f: impl FnOnce()) -> Vec<String> {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);

        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap().lines().map(str::to_string).collect()
    }

    #[test]
    fn test_finish_logs_once() {
        let lines = captured_lines(|| {
            let timer = OperationTimer::new("ingest_vendor_sheet");
            timer.finish();
        });
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Operation completed"));
        assert!(lines[0].contains("ingest_vendor_sheet"));
    }

    #[test]
    fn test_unfinished_timer_logs_on_drop() {
        let lines = captured_lines(|| {
            let _timer = OperationTimer::new("search");
        });
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Operation finished"));
    }

    #[test]
    fn test_log_format_parses() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
    }
}
