use chrono::SecondsFormat;
use log::{debug, warn};
use reqwest::{blocking::Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::scoring::ExamResult;
use crate::session::Participant;

const REPORT_TIMEOUT: Duration = Duration::from_secs(10);
const FLUSH_POLL: Duration = Duration::from_millis(20);

/// Record delivered to a reporting destination when an exam ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPayload {
    pub name: String,
    pub id: String,
    pub class: String,
    pub score: usize,
    pub reason: String,
    pub time: String,
}

impl ReportPayload {
    pub fn new(participant: &Participant, result: &ExamResult) -> Self {
        Self {
            name: participant.name().to_string(),
            id: participant.id().to_string(),
            class: participant.class().to_string(),
            score: result.score,
            reason: result.reason.clone(),
            time: result
                .finished_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("report endpoint answered with status {0}")]
    HttpStatus(StatusCode),
    #[error("could not write results log: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode results log row: {0}")]
    Csv(#[from] csv::Error),
}

/// Best-effort delivery of a finished exam.
///
/// `report` must return promptly and never fail the caller; delivery errors
/// are logged and dropped.
pub trait Reporter: fmt::Debug {
    fn report(&self, payload: &ReportPayload);

    /// Waits up to `timeout` for deliveries still in flight. Called once at
    /// shutdown so the process does not exit under a running request.
    fn flush(&self, _timeout: Duration) {}
}

/// Used when no destination is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReporter;

impl Reporter for NoReporter {
    fn report(&self, _payload: &ReportPayload) {
        debug!("no report destination configured, skipping");
    }
}

/// POSTs the payload as JSON from a background thread; `flush` joins it
#[derive(Debug, Clone)]
pub struct HttpReporter {
    url: String,
    client: Client,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl HttpReporter {
    pub fn new(url: impl Into<String>) -> Result<Self, ReportError> {
        let client = Client::builder().timeout(REPORT_TIMEOUT).build()?;
        Ok(Self {
            url: url.into(),
            client,
            pending: Arc::default(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Report threads not yet joined
    pub fn in_flight(&self) -> usize {
        self.pending.lock().map_or(0, |pending| pending.len())
    }

    fn send(client: &Client, url: &str, payload: &ReportPayload) -> Result<(), ReportError> {
        let response = client.post(url).json(payload).send()?;
        if !response.status().is_success() {
            return Err(ReportError::HttpStatus(response.status()));
        }
        Ok(())
    }
}

impl Reporter for HttpReporter {
    fn report(&self, payload: &ReportPayload) {
        let client = self.client.clone();
        let url = self.url.clone();
        let payload = payload.clone();

        let spawned = thread::Builder::new()
            .name("report".into())
            .spawn(move || match Self::send(&client, &url, &payload) {
                Ok(()) => debug!("result reported to {url}"),
                Err(e) => warn!("result report to {url} failed: {e}"),
            });

        match spawned {
            Ok(handle) => match self.pending.lock() {
                Ok(mut pending) => pending.push(handle),
                Err(_) => warn!("report thread list poisoned, delivery will not be awaited"),
            },
            Err(e) => warn!("could not start report thread: {e}"),
        }
    }

    fn flush(&self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        let Ok(mut pending) = self.pending.lock() else {
            return;
        };

        loop {
            let (done, running): (Vec<_>, Vec<_>) =
                pending.drain(..).partition(|handle| handle.is_finished());
            for handle in done {
                if handle.join().is_err() {
                    warn!("report thread panicked");
                }
            }
            *pending = running;

            if pending.is_empty() {
                break;
            }
            if Instant::now() >= deadline {
                warn!(
                    "giving up on {} result report(s) to {} still in flight",
                    pending.len(),
                    self.url
                );
                break;
            }
            thread::sleep(FLUSH_POLL);
        }
    }
}

/// Appends the payload to a local CSV log, writing a header for a new file
#[derive(Debug, Clone)]
pub struct CsvReporter {
    path: PathBuf,
}

impl CsvReporter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, payload: &ReportPayload) -> Result<(), ReportError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // If the log doesn't exist yet, we need to emit a header
        let needs_header = !self.path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(payload)?;
        writer.flush()?;
        Ok(())
    }
}

impl Reporter for CsvReporter {
    fn report(&self, payload: &ReportPayload) {
        match self.append(payload) {
            Ok(()) => debug!("result appended to {}", self.path.display()),
            Err(e) => warn!("{e}"),
        }
    }
}

/// Hands every payload to each inner reporter
#[derive(Debug, Default)]
pub struct FanOutReporter {
    reporters: Vec<Box<dyn Reporter>>,
}

impl FanOutReporter {
    pub fn new(reporters: Vec<Box<dyn Reporter>>) -> Self {
        Self { reporters }
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

impl Reporter for FanOutReporter {
    fn report(&self, payload: &ReportPayload) {
        for reporter in &self.reporters {
            reporter.report(payload);
        }
    }

    /// The timeout covers all inner reporters together
    fn flush(&self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        for reporter in &self.reporters {
            reporter.flush(deadline.saturating_duration_since(Instant::now()));
        }
    }
}
