//! JSON output adapter.

use anyhow::{anyhow, Result};
use face_qc_core::{AnalysisResult, ResultOutput};
use std::io::{self, Write};
use std::sync::Mutex;

use crate::commands::check::OutputFormat;

/// JSON / JSON Lines output adapter.
///
/// JSONL writes one line per result as it arrives. JSON buffers results and
/// writes a single array on `flush`.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
    format: OutputFormat,
    pretty: bool,
    pending: Mutex<Vec<AnalysisResult>>,
}

impl JsonOutput {
    /// Creates a new JSON output writing to stdout.
    #[must_use]
    pub fn stdout(format: OutputFormat, pretty: bool) -> Self {
        Self::new(Box::new(io::stdout()), format, pretty)
    }

    /// Creates a new JSON output writing to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            format,
            pretty,
            pending: Mutex::new(Vec::new()),
        }
    }

    #[allow(clippy::significant_drop_tightening)]
    fn write_line(&self, json: &str) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        Ok(())
    }
}

impl ResultOutput for JsonOutput {
    fn write(&self, result: &AnalysisResult) -> Result<()> {
        match self.format {
            OutputFormat::Jsonl => self.write_line(&serde_json::to_string(result)?),
            OutputFormat::Json => {
                self.pending
                    .lock()
                    .map_err(|e| anyhow!("Lock poisoned: {e}"))?
                    .push(result.clone());
                Ok(())
            }
        }
    }

    #[allow(clippy::significant_drop_tightening)]
    fn flush(&self) -> Result<()> {
        if self.format == OutputFormat::Json {
            let results = std::mem::take(
                &mut *self
                    .pending
                    .lock()
                    .map_err(|e| anyhow!("Lock poisoned: {e}"))?,
            );
            let json = if self.pretty {
                serde_json::to_string_pretty(&results)?
            } else {
                serde_json::to_string(&results)?
            };
            self.write_line(&json)?;
        }
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow!("Lock poisoned: {e}"))?;
        writer.flush()?;
        Ok(())
    }
}
