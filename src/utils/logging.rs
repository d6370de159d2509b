use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn setup_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("Invalid log level {}", config.level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(make_writer(config)?)
        .with_target(true)
        .with_thread_ids(true)
        .with_ansi(config.file_path.is_none() && !config.json);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow!("Failed to set global subscriber: {}", e))
}

/// Log sink: the configured file in append mode, stdout otherwise
fn make_writer(config: &LoggingConfig) -> Result<BoxMakeWriter> {
    match &config.file_path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Ok(BoxMakeWriter::new(Mutex::new(file)))
        }
        None => Ok(BoxMakeWriter::new(std::io::stdout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_file_logging() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("server.log");
        let config = LoggingConfig {
            file_path: Some(log_path.clone()),
            ..LoggingConfig::default()
        };

        let subscriber = tracing_subscriber::fmt()
            .with_writer(make_writer(&config).unwrap())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(task = "summary", "Generation failed");
        });

        let contents = fs::read_to_string(log_path).unwrap();
        assert!(contents.contains("Generation failed"));
        assert!(contents.contains("task=\"summary\""));
    }

    #[test]
    fn test_unwritable_log_file() {
        let config = LoggingConfig {
            file_path: Some("/no/such/dir/server.log".into()),
            ..LoggingConfig::default()
        };
        assert!(make_writer(&config).is_err());
    }
}
