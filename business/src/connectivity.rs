//! Event-driven reachability flag.
//!
//! The monitor never polls. Whoever observes the network (an OS path monitor, or the
//! [`ReachabilityProbe`] gateway decorator) reports through a [`ReachabilitySender`], and the
//! owner applies the events with [`ConnectivityMonitor::sync`].

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use flume::{Receiver, Sender};
use log::{info, warn};

use crate::http::{HttpGateway, HttpResult, Request, Response};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    Satisfied,
    Unsatisfied,
}

impl Reachability {
    pub fn is_satisfied(self) -> bool {
        self == Self::Satisfied
    }
}

#[derive(Debug, Clone)]
pub struct ReachabilitySender {
    send: Sender<Reachability>,
}

impl ReachabilitySender {
    /// Queue an event for the monitor. Ignored once the monitor is dropped.
    pub fn report(&self, reachability: Reachability) {
        if self.send.send(reachability).is_err() {
            warn!("ReachabilitySender: monitor dropped");
        }
    }
}

#[derive(Debug)]
pub struct ConnectivityMonitor {
    connected: bool,
    send: Sender<Reachability>,
    recv: Receiver<Reachability>,
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityMonitor {
    /// Starts out connected until told otherwise.
    pub fn new() -> Self {
        let (send, recv) = flume::unbounded();
        Self {
            connected: true,
            send,
            recv,
        }
    }

    /// A handle for event sources: a platform monitor, or the transport probe.
    pub fn sender(&self) -> ReachabilitySender {
        ReachabilitySender {
            send: self.send.clone(),
        }
    }

    /// State as of the last `sync`. Starts out connected.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Apply queued events. Returns true if the flag changed.
    pub fn sync(&mut self) -> bool {
        let before = self.connected;
        for event in self.recv.try_iter() {
            self.connected = event.is_satisfied();
        }
        if before != self.connected {
            info!("Connectivity: connected={}", self.connected);
        }
        before != self.connected
    }

    /// Wait for the next event, apply everything queued, and return the new flag.
    pub async fn changed(&mut self) -> bool {
        if let Ok(event) = self.recv.recv_async().await {
            self.connected = event.is_satisfied();
        }
        self.sync();
        self.connected
    }
}

/// Gateway decorator that turns request outcomes into reachability events.
///
/// Any HTTP response means the backend is reachable; connect and timeout failures mean it
/// is not. Only transitions are reported.
#[derive(Debug)]
pub struct ReachabilityProbe<G> {
    inner: G,
    sender: ReachabilitySender,
    last_satisfied: AtomicBool,
}

impl<G: HttpGateway> ReachabilityProbe<G> {
    pub fn new(inner: G, sender: ReachabilitySender) -> Self {
        Self {
            inner,
            sender,
            last_satisfied: AtomicBool::new(true),
        }
    }

    fn observe(&self, satisfied: bool) {
        if self.last_satisfied.swap(satisfied, Ordering::AcqRel) != satisfied {
            self.sender.report(if satisfied {
                Reachability::Satisfied
            } else {
                Reachability::Unsatisfied
            });
        }
    }
}

#[async_trait]
impl<G: HttpGateway> HttpGateway for ReachabilityProbe<G> {
    async fn send(&self, request: Request) -> HttpResult<Response> {
        let result = self.inner.send(request).await;
        match &result {
            Ok(_) => self.observe(true),
            Err(err) if err.is_unreachable() => self.observe(false),
            Err(_) => {}
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpError;
    use crate::test_utils::ScriptedGateway;

    #[test]
    fn starts_connected_and_applies_last_event() {
        let mut monitor = ConnectivityMonitor::new();
        assert!(monitor.is_connected());
        assert!(!monitor.sync());

        let sender = monitor.sender();
        sender.report(Reachability::Unsatisfied);
        assert!(monitor.is_connected(), "events wait for sync");
        assert!(monitor.sync());
        assert!(!monitor.is_connected());

        sender.report(Reachability::Satisfied);
        sender.report(Reachability::Unsatisfied);
        assert!(!monitor.sync(), "net result unchanged");
        assert!(!monitor.is_connected());
    }

    #[tokio::test]
    async fn changed_waits_for_event() {
        let mut monitor = ConnectivityMonitor::new();
        let sender = monitor.sender();
        tokio::spawn(async move { sender.report(Reachability::Unsatisfied) });
        assert!(!monitor.changed().await);
    }

    #[tokio::test]
    async fn probe_reports_transitions_only() {
        let mut monitor = ConnectivityMonitor::new();
        let gateway = ScriptedGateway::new();
        gateway.push_error(HttpError::connect("refused"));
        gateway.push_error(HttpError::timeout("slow"));
        gateway.push_error(HttpError::new("bad body"));
        gateway.push_json(500, serde_json::json!({}));
        let probe = ReachabilityProbe::new(gateway, monitor.sender());

        assert!(probe.send(Request::get("https://api.test/a")).await.is_err());
        assert!(monitor.sync());
        assert!(!monitor.is_connected());

        assert!(probe.send(Request::get("https://api.test/b")).await.is_err());
        assert!(probe.send(Request::get("https://api.test/c")).await.is_err());
        assert!(!monitor.sync());

        let response = probe.send(Request::get("https://api.test/d")).await.unwrap();
        assert_eq!(response.status, 500);
        assert!(monitor.sync());
        assert!(monitor.is_connected());
    }
}
