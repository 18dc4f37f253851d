//! Metric and failure reporting for pipeline stages.
//!
//! Stages report row-count/shape metrics through a [`PipelineObserver`]. The orchestrator
//! additionally reports failures (and alerts at or above a configured [`Severity`]).

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (stage failed).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

/// Pipeline stage a metric or failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Ingest,
    Clean,
    Curate,
    Quality,
    Model,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Ingest => "ingest",
            Stage::Clean => "clean",
            Stage::Curate => "curate",
            Stage::Quality => "quality",
            Stage::Model => "model",
        };
        f.write_str(name)
    }
}

/// A structured row-count/shape measurement emitted by one step of a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageMetric {
    /// Stage that emitted the metric.
    pub stage: Stage,
    /// Step within the stage (e.g. `rename_columns`, `not_null`).
    pub step: String,
    /// Input shape `(rows, columns)`.
    pub shape_in: (usize, usize),
    /// Output shape `(rows, columns)`.
    pub shape_out: (usize, usize),
    /// Human-readable detail.
    pub message: String,
}

impl StageMetric {
    /// Create a metric for `step` of `stage`.
    pub fn new(
        stage: Stage,
        step: impl Into<String>,
        shape_in: (usize, usize),
        shape_out: (usize, usize),
        message: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            step: step.into(),
            shape_in,
            shape_out,
            message: message.into(),
        }
    }

    /// Rows removed between input and output.
    pub fn rows_removed(&self) -> usize {
        self.shape_in.0.saturating_sub(self.shape_out.0)
    }
}

impl fmt::Display for StageMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[METRIC] {}/{}: IN shape {:?} - OUT shape {:?}",
            self.stage, self.step, self.shape_in, self.shape_out
        )?;
        if !self.message.is_empty() {
            write!(f, " - {}", self.message)?;
        }
        Ok(())
    }
}

/// Observer interface for stage metrics and pipeline outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait PipelineObserver: Send + Sync {
    /// Called for every metric a stage emits.
    fn on_metric(&self, _metric: &StageMetric) {}

    /// Called when a stage fails.
    fn on_failure(&self, _stage: Stage, _severity: Severity, _error: &PipelineError) {}

    /// Called when a stage failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, stage: Stage, severity: Severity, error: &PipelineError) {
        self.on_failure(stage, severity, error)
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn PipelineObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl PipelineObserver for CompositeObserver {
    fn on_metric(&self, metric: &StageMetric) {
        for o in &self.observers {
            o.on_metric(metric);
        }
    }

    fn on_failure(&self, stage: Stage, severity: Severity, error: &PipelineError) {
        for o in &self.observers {
            o.on_failure(stage, severity, error);
        }
    }

    fn on_alert(&self, stage: Stage, severity: Severity, error: &PipelineError) {
        for o in &self.observers {
            o.on_alert(stage, severity, error);
        }
    }
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_metric(&self, metric: &StageMetric) {
        tracing::info!(
            stage = %metric.stage,
            step = %metric.step,
            rows_in = metric.shape_in.0,
            rows_out = metric.shape_out.0,
            "{metric}"
        );
    }

    fn on_failure(&self, stage: Stage, severity: Severity, error: &PipelineError) {
        tracing::error!(%stage, ?severity, "stage failed: {error}");
    }

    fn on_alert(&self, stage: Stage, severity: Severity, error: &PipelineError) {
        tracing::error!(%stage, ?severity, alert = true, "[ALERT] stage failed: {error}");
    }
}

/// Appends events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl PipelineObserver for FileObserver {
    fn on_metric(&self, metric: &StageMetric) {
        self.append_line(&format!("{} {metric}", timestamp()));
    }

    fn on_failure(&self, stage: Stage, severity: Severity, error: &PipelineError) {
        self.append_line(&format!(
            "{} fail stage={stage} severity={severity:?} err={error}",
            timestamp()
        ));
    }

    fn on_alert(&self, stage: Stage, severity: Severity, error: &PipelineError) {
        self.append_line(&format!(
            "{} ALERT stage={stage} severity={severity:?} err={error}",
            timestamp()
        ));
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}
