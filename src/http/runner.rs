use std::sync::Arc;

use reqwest::{Client, header::HeaderMap};
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info};

use crate::error::AppResult;
use crate::orchestrator::PhaseTicket;
use crate::results::ResultSet;

use super::client::{build_header_map, build_target_client};
use super::executor::execute_request;
use super::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Running,
    Draining,
    Done,
}

impl RunnerState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Done => "done",
        }
    }
}

/// Drives the request loop for a single target.
#[derive(Debug)]
pub struct TestRunner {
    target: usize,
    settings: Arc<Settings>,
    client: Client,
    headers: HeaderMap,
    state: RunnerState,
}

impl TestRunner {
    /// Prepares the client and headers for `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error when the client or the header map cannot be built.
    pub fn new(target: usize, settings: Arc<Settings>) -> AppResult<Self> {
        let client = build_target_client(&settings)?;
        let headers = build_header_map(&settings.headers)?;
        Ok(Self {
            target,
            settings,
            client,
            headers,
            state: RunnerState::Idle,
        })
    }

    #[must_use]
    pub const fn state(&self) -> RunnerState {
        self.state
    }

    /// Runs until the configured duration elapses and returns the results.
    pub async fn collect(&mut self) -> ResultSet {
        self.transition(RunnerState::Running);
        let mut results = ResultSet::new(self.target, self.settings.url.clone());
        let started = Instant::now();
        while started.elapsed() < self.settings.duration {
            if let Some(result) =
                execute_request(&self.client, &self.settings.url, &self.headers).await
            {
                results.push(result);
            }
            sleep(self.settings.interval).await;
        }
        self.transition(RunnerState::Draining);
        results
    }

    /// Runs the test, hands the result set to `results_tx`, then signals `ticket`.
    pub async fn run(mut self, results_tx: mpsc::Sender<ResultSet>, ticket: PhaseTicket) {
        info!(
            "Starting test {} (URL: {})",
            self.target.saturating_add(1),
            self.settings.url
        );
        debug!(
            "Target {} dialing over {} for {:?}, about {} requests",
            self.target,
            self.settings.network.as_str(),
            self.settings.duration,
            self.settings.max_requests()
        );
        let results = self.collect().await;
        debug!(
            "Target {} captured {} results",
            self.target,
            results.len()
        );
        if let Err(err) = results_tx.try_send(results) {
            error!(
                "Failed to hand off results for target {}: {}",
                self.target, err
            );
        }
        self.transition(RunnerState::Done);
        ticket.done();
    }

    fn transition(&mut self, next: RunnerState) {
        debug!(
            "Target {} runner {} -> {}",
            self.target,
            self.state.as_str(),
            next.as_str()
        );
        self.state = next;
    }
}
