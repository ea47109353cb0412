/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Best-effort delivery of submissions to the results collector.
//!
//! [`ResultSink::submit`] hands the payload off and returns immediately. Callers must
//! not assume delivery: failures are logged as warnings and the payload is dropped,
//! with no retry.

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, info, warn};
use reqwest::blocking::Client;
use url::Url;

use super::SubmissionPayload;

/// Collector route, appended to the configured API base URL.
pub const RESULTS_PATH: &str = "/api/nperf/results";

/// Fire-and-forget destination for canonical submissions.
pub trait ResultSink {
    fn submit(&self, payload: SubmissionPayload);
}

/// `<base without trailing slash>/api/nperf/results`.
pub fn results_endpoint(api_base_url: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!(
        "{}{RESULTS_PATH}",
        api_base_url.trim_end_matches('/')
    ))
}

/// Posts submissions from a dedicated worker thread.
pub struct HttpResultSink {
    tx: Option<Sender<SubmissionPayload>>,
    worker: Option<JoinHandle<()>>,
}

impl HttpResultSink {
    pub fn spawn(endpoint: Url, timeout: Duration) -> Result<Self, SubmitError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SubmitError::Client(format!("{e}")))?;
        let (tx, rx) = unbounded();
        let worker = std::thread::Builder::new()
            .name("nperf-submit".to_string())
            .spawn(move || run_submit_worker(client, endpoint, rx))
            .map_err(|e| SubmitError::Worker(format!("{e}")))?;
        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Stop accepting submissions and wait for queued posts to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        // Dropping the sender ends the worker's receive loop.
        self.tx.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            warn!("Submission worker panicked");
        }
    }
}

impl ResultSink for HttpResultSink {
    fn submit(&self, payload: SubmissionPayload) {
        let Some(tx) = self.tx.as_ref() else {
            warn!("Submission worker stopped; result not recorded");
            return;
        };
        if tx.send(payload).is_err() {
            warn!("Submission worker stopped; result not recorded");
        }
    }
}

impl Drop for HttpResultSink {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_submit_worker(client: Client, endpoint: Url, rx: Receiver<SubmissionPayload>) {
    debug!("Submission worker started ({endpoint})");
    for payload in rx.iter() {
        info!(
            "Sending result {} (sector: {})",
            payload.nperf_test_id(),
            payload.sector()
        );
        match post_submission(&client, &endpoint, &payload) {
            Ok(()) => debug!("Result {} saved to backend", payload.nperf_test_id()),
            Err(e) => warn!(
                "Failed to save result {} to backend: {e}",
                payload.nperf_test_id()
            ),
        }
    }
    debug!("Submission worker stopped");
}

fn post_submission(
    client: &Client,
    endpoint: &Url,
    payload: &SubmissionPayload,
) -> Result<(), SubmitError> {
    let response = client
        .post(endpoint.clone())
        .json(payload)
        .send()
        .map_err(|e| SubmitError::Network(format!("{e}")))?;
    let status = response.status();
    if !status.is_success() {
        return Err(SubmitError::HttpStatus(status.as_u16()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    Client(String),
    Worker(String),
    Network(String),
    HttpStatus(u16),
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::Client(e) => write!(f, "HTTP client error: {e}"),
            SubmitError::Worker(e) => write!(f, "Worker error: {e}"),
            SubmitError::Network(e) => write!(f, "Network error: {e}"),
            SubmitError::HttpStatus(code) => write!(f, "HTTP status {code}"),
        }
    }
}

impl std::error::Error for SubmitError {}
