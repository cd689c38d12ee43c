//! Run tracing: a JSON-lines record of what each run did.
//!
//! The sink is switched on around a run with [`TraceSink::start`] and off
//! with [`TraceSink::shutdown`]; events recorded while it is off are
//! dropped. The run in progress (or else the last finished one) stays in
//! memory so tools can introspect it.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::warn;
use uuid::Uuid;

/// Outcome recorded when a run ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEvent {
    RunStarted {
        agent: String,
    },
    StepStarted {
        step: usize,
        agent: String,
    },
    StepEnded {
        step: usize,
        agent: String,
        tool_calls: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        handoff: Option<String>,
    },
    RunEnded {
        agent: String,
        status: RunStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

/// One line of the trace file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub timestamp: DateTime<Utc>,
    pub run_id: Uuid,
    pub seq: u64,
    pub event: TraceEvent,
}

/// All records of a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTrace {
    pub run_id: Uuid,
    pub finished: bool,
    pub records: Vec<TraceRecord>,
}

impl RunTrace {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            finished: false,
            records: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct TraceState {
    active: bool,
    current: Option<RunTrace>,
    last: Option<RunTrace>,
    writer: TraceWriter,
}

/// Trace file handle, open between `start` and `shutdown`.
#[derive(Debug, Default)]
enum TraceWriter {
    #[default]
    Closed,
    Open(BufWriter<File>),
    /// Opening failed once; not retried until the next `start`.
    Failed,
}

#[derive(Debug, Default)]
pub struct TraceSink {
    path: Option<PathBuf>,
    state: Mutex<TraceState>,
}

impl TraceSink {
    /// A sink that appends to `path` when given, and otherwise only keeps
    /// runs in memory.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            state: Mutex::default(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn start(&self) {
        let mut state = self.lock();
        state.active = true;
        state.writer = TraceWriter::Closed;
    }

    pub fn shutdown(&self) {
        let mut state = self.lock();
        state.active = false;
        if let Some(run) = state.current.take() {
            state.last = Some(run);
        }
        if let TraceWriter::Open(writer) = &mut state.writer {
            if let Err(e) = writer.flush() {
                warn!(error = %e, "Failed to flush trace file");
            }
        }
        state.writer = TraceWriter::Closed;
    }

    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    /// Append an event for `run_id`. A no-op while the sink is inactive.
    pub fn record(&self, run_id: Uuid, event: TraceEvent) {
        let mut state = self.lock();
        if !state.active {
            return;
        }

        if state.current.as_ref().map(|r| r.run_id) != Some(run_id) {
            if let Some(previous) = state.current.take() {
                state.last = Some(previous);
            }
            state.current = Some(RunTrace::new(run_id));
        }

        let ends_run = matches!(event, TraceEvent::RunEnded { .. });
        let state = &mut *state;
        let Some(run) = state.current.as_mut() else {
            return;
        };
        let record = TraceRecord {
            timestamp: Utc::now(),
            run_id,
            seq: run.records.len() as u64,
            event,
        };
        if let Some(path) = &self.path {
            write_record(&mut state.writer, path, &record, ends_run);
        }
        run.records.push(record);

        if ends_run {
            run.finished = true;
            state.last = state.current.take();
        }
    }

    /// The run in progress, or else the last finished run.
    pub fn last_run_tracing(&self) -> Option<RunTrace> {
        let state = self.lock();
        state.current.clone().or_else(|| state.last.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TraceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Buffer one record, opening the file on first use. Flushes when `flush` is set.
fn write_record(writer: &mut TraceWriter, path: &Path, record: &TraceRecord, flush: bool) {
    if let TraceWriter::Closed = writer {
        *writer = match open_trace_file(path) {
            Ok(file) => TraceWriter::Open(BufWriter::new(file)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to open trace file");
                TraceWriter::Failed
            }
        };
    }
    let TraceWriter::Open(out) = writer else {
        return;
    };
    let written = serde_json::to_string(record)
        .map_err(std::io::Error::from)
        .and_then(|line| writeln!(out, "{line}"))
        .and_then(|()| if flush { out.flush() } else { Ok(()) });
    if let Err(e) = written {
        warn!(path = %path.display(), error = %e, "Failed to write trace record");
    }
}

fn open_trace_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn started(agent: &str) -> TraceEvent {
        TraceEvent::RunStarted {
            agent: agent.into(),
        }
    }

    fn ended(agent: &str) -> TraceEvent {
        TraceEvent::RunEnded {
            agent: agent.into(),
            status: RunStatus::Completed,
            error: None,
        }
    }

    #[test]
    fn drops_events_while_inactive() {
        let sink = TraceSink::new(None);
        sink.record(Uuid::new_v4(), started("Assistant"));

        assert!(sink.last_run_tracing().is_none());
    }

    #[test]
    fn keeps_current_then_last_run() {
        let sink = TraceSink::new(None);
        let first = Uuid::new_v4();
        sink.start();
        sink.record(first, started("Assistant"));

        let current = sink.last_run_tracing().unwrap();
        assert_eq!(current.run_id, first);
        assert!(!current.finished);

        sink.record(first, ended("Assistant"));
        sink.shutdown();

        let last = sink.last_run_tracing().unwrap();
        assert!(last.finished);
        assert_eq!(last.records.len(), 2);
        assert_eq!(last.records[1].seq, 1);
    }

    #[test]
    fn writes_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("traces").join("run.jsonl");
        let sink = TraceSink::new(Some(path.clone()));
        let run_id = Uuid::new_v4();

        sink.start();
        sink.record(run_id, started("Assistant"));
        sink.record(run_id, ended("Assistant"));
        sink.shutdown();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<TraceRecord> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].event, started("Assistant"));
        assert!(text.contains(r#""type":"run_ended""#));
    }

    #[test]
    fn finished_run_is_on_disk_and_later_runs_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.jsonl");
        let sink = TraceSink::new(Some(path.clone()));
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());

        sink.start();
        sink.record(first, started("Assistant"));
        sink.record(first, ended("Assistant"));
        // Flushed at run end, before shutdown.
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
        sink.shutdown();

        sink.start();
        sink.record(second, started("Model Helper"));
        sink.shutdown();

        let runs: Vec<Uuid> = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str::<TraceRecord>(l).unwrap().run_id)
            .collect();
        assert_eq!(runs, vec![first, first, second]);
    }

    #[test]
    fn unwritable_path_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let sink = TraceSink::new(Some(dir.path().to_path_buf()));
        let run_id = Uuid::new_v4();

        sink.start();
        sink.record(run_id, started("Assistant"));

        assert_eq!(sink.last_run_tracing().unwrap().records.len(), 1);
    }
}
