//! Explicitly constructed log sink.
//!
//! The library never installs a global subscriber. A [`LogSink`] is built once
//! at startup, handed to the dispatcher and the orchestrator, and every worker
//! task runs under its dispatch. Formatted lines are echoed to stderr (when
//! asked) and kept in a bounded in-memory backlog that a front end can show as
//! its log panel.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::dispatcher::DefaultGuard;
use tracing::{Dispatch, Level};
use tracing_subscriber::EnvFilter;

const BACKLOG_LINES: usize = 1000;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogEcho {
    Stderr,
    None,
}

#[derive(Default)]
struct Backlog {
    lines: VecDeque<String>,
    partial: Vec<u8>,
}

impl Backlog {
    fn push_bytes(&mut self, buf: &[u8]) {
        self.partial.extend_from_slice(buf);
        while let Some(pos) = self.partial.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]).into_owned();
            if self.lines.len() == BACKLOG_LINES {
                self.lines.pop_front();
            }
            self.lines.push_back(line);
        }
    }
}

#[derive(Clone)]
struct SinkWriter {
    backlog: Arc<Mutex<Backlog>>,
    echo: LogEcho,
}

impl SinkWriter {
    fn backlog(&self) -> MutexGuard<'_, Backlog> {
        self.backlog.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.echo == LogEcho::Stderr {
            std::io::stderr().write_all(buf)?;
        }
        self.backlog().push_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if self.echo == LogEcho::Stderr {
            std::io::stderr().flush()?;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct LogSink {
    dispatch: Dispatch,
    writer: SinkWriter,
}

impl LogSink {
    /// `RUST_LOG` directives, when set, refine `level`.
    pub fn new(level: Level, echo: LogEcho) -> Self {
        let writer = SinkWriter {
            backlog: Arc::new(Mutex::new(Backlog::default())),
            echo,
        };

        let make_writer = writer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::builder()
                    .with_default_directive(level.into())
                    .from_env_lossy(),
            )
            .with_ansi(false)
            .with_thread_names(true)
            .with_writer(move || make_writer.clone())
            .finish();

        Self {
            dispatch: Dispatch::new(subscriber),
            writer,
        }
    }

    /// Keeps lines in the backlog only.
    pub fn capture_only(level: Level) -> Self {
        Self::new(level, LogEcho::None)
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Makes this sink the current thread's default until the guard drops.
    pub fn install(&self) -> DefaultGuard {
        tracing::dispatcher::set_default(&self.dispatch)
    }

    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Takes every buffered line, oldest first.
    pub fn drain_lines(&self) -> Vec<String> {
        self.writer.backlog().lines.drain(..).collect()
    }

    pub fn flush(&self) {
        let mut writer = self.writer.clone();
        if let Err(e) = writer.flush() {
            eprintln!("failed to flush log output: {e}");
        }
    }
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSink")
            .field("echo", &self.writer.echo)
            .finish_non_exhaustive()
    }
}
