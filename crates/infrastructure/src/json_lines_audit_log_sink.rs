use std::io::Write;
use std::sync::Mutex;

use rolekeeper_application::AuditLogSink;
use rolekeeper_core::{AppError, AppResult};
use rolekeeper_domain::AuditRecord;

/// Structured log sink writing one JSON object per line.
///
/// Each line is flushed before `append` returns; write errors are surfaced.
#[derive(Debug)]
pub struct JsonLinesAuditLogSink<W> {
    writer: Mutex<W>,
}

impl<W> JsonLinesAuditLogSink<W>
where
    W: Write + Send,
{
    /// Creates a sink over the provided writer.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> AppResult<W> {
        self.writer
            .into_inner()
            .map_err(|_| AppError::Internal("audit log writer lock poisoned".to_owned()))
    }
}

impl<W> AuditLogSink for JsonLinesAuditLogSink<W>
where
    W: Write + Send,
{
    fn append(&self, record: &AuditRecord) -> AppResult<()> {
        let mut line = serde_json::to_vec(&record.to_json()).map_err(|error| {
            AppError::Internal(format!("failed to serialize audit record: {error}"))
        })?;
        line.push(b'\n');

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| AppError::Internal("audit log writer lock poisoned".to_owned()))?;
        writer
            .write_all(&line)
            .and_then(|()| writer.flush())
            .map_err(|error| AppError::Internal(format!("failed to write audit record: {error}")))
    }
}
