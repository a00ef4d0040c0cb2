//! Runs fetch tickets on the tokio runtime.
//!
//! At most one fetch is live: dispatching a new ticket aborts the previous
//! task. Results travel back to the event loop as [`AppEvent::RunsResult`].

use crate::dagit::client::{self, RunsExecutor};
use crate::events::AppEvent;
use crate::view::FetchTicket;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct FetchDispatcher {
    executor: Arc<dyn RunsExecutor>,
    tx: mpsc::UnboundedSender<AppEvent>,
    in_flight: Option<JoinHandle<()>>,
}

impl FetchDispatcher {
    pub fn new(executor: Arc<dyn RunsExecutor>, tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            executor,
            tx,
            in_flight: None,
        }
    }

    pub fn dispatch(&mut self, ticket: FetchTicket) {
        if let Some(previous) = self.in_flight.take() {
            if !previous.is_finished() {
                tracing::debug!(ticket = ticket.id, "aborting superseded fetch");
                previous.abort();
            }
        }

        let executor = Arc::clone(&self.executor);
        let tx = self.tx.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let outcome = client::fetch_page(executor.as_ref(), &ticket.request)
                .await
                .map_err(|e| e.to_string());
            if tx
                .send(AppEvent::RunsResult {
                    ticket: ticket.id,
                    outcome,
                })
                .is_err()
            {
                tracing::warn!(ticket = ticket.id, "fetch finished after event loop closed");
            }
        }));
    }

    /// Aborts the in-flight fetch, if any.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for FetchDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
