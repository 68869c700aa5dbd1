use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use shared_logging::{JsonLogger, LogLevel, LogRecord, LogSink};

/// Builder for alignment telemetry sinks.
pub struct AlignmentTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    min_level: LogLevel,
    sinks: Vec<Arc<dyn LogSink>>,
}

impl AlignmentTelemetryBuilder {
    /// Creates the builder.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            min_level: LogLevel::Info,
            sinks: Vec::new(),
        }
    }

    /// Appends JSON lines to `path`.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Minimum level written to the file sink.
    #[must_use]
    pub const fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Adds an already constructed sink.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Builds the telemetry handle, opening the log file if one was requested.
    pub fn build(self) -> Result<AlignmentTelemetry> {
        let mut sinks = self.sinks;
        if let Some(path) = self.log_path {
            sinks.push(Arc::new(JsonLogger::with_min_level(path, self.min_level)?));
        }
        Ok(AlignmentTelemetry {
            inner: Arc::new(TelemetryInner {
                module: self.module,
                sinks,
            }),
        })
    }
}

/// Telemetry handle shared across alignment components.
#[derive(Clone)]
pub struct AlignmentTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for AlignmentTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignmentTelemetry")
            .field("module", &self.inner.module)
            .field("sinks", &self.inner.sinks.len())
            .finish()
    }
}

struct TelemetryInner {
    module: String,
    sinks: Vec<Arc<dyn LogSink>>,
}

impl AlignmentTelemetry {
    /// Returns a builder.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> AlignmentTelemetryBuilder {
        AlignmentTelemetryBuilder::new(module)
    }

    /// Module name stamped on every record.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.inner.module
    }

    /// Logs structured metadata to every sink. Stops at the first failing sink.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if self.inner.sinks.is_empty() {
            return Ok(());
        }
        let record = LogRecord::new(&self.inner.module, level, message).with_metadata(metadata);
        for sink in &self.inner.sinks {
            sink.log(&record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_logging::MemoryLogger;
    use tempfile::tempdir;

    #[test]
    fn telemetry_writes_file_and_memory_sinks() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("alignment.log");
        let memory = Arc::new(MemoryLogger::default());
        let telemetry = AlignmentTelemetry::builder("alignment")
            .log_path(&path)
            .sink(memory.clone())
            .build()
            .unwrap();
        telemetry
            .log(LogLevel::Info, "alignment.analysis.start", json!({ "rows": 3 }))
            .unwrap();
        telemetry
            .log(LogLevel::Debug, "alignment.similarity.vectorized", json!({}))
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("alignment.analysis.start"));
        assert!(!content.contains("vectorized"));
        assert_eq!(memory.snapshot().len(), 2);
        assert_eq!(memory.snapshot()[0].metadata["rows"], json!(3));
    }

    #[test]
    fn telemetry_without_sinks_is_a_no_op() {
        let telemetry = AlignmentTelemetry::builder("alignment").build().unwrap();
        assert!(telemetry.log(LogLevel::Error, "x", json!({})).is_ok());
        assert_eq!(telemetry.module(), "alignment");
    }
}
