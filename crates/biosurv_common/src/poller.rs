//! Active-escalation poller
//!
//! A cancellable tokio task that re-fetches the active escalation on a fixed
//! interval and publishes snapshots on a `watch` channel. Stopping the poller
//! also drops any fetch still in flight, so no stale result is published
//! after `stop`.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::backend::EscalationSource;
use crate::types::EscalatedAlert;

/// What the dashboard last learned about the active escalation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollSnapshot {
    /// Last successfully fetched value; kept when a later fetch fails
    pub active: Option<EscalatedAlert>,
    pub last_error: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
    /// Completed fetch attempts, successful or not
    pub polls: u64,
}

/// Fold one fetch result into a snapshot
pub async fn poll_once(source: &dyn EscalationSource, snapshot: &mut PollSnapshot) {
    let result = source.active_escalation().await;
    apply_result(snapshot, result.map_err(|e| e.to_string()));
}

fn apply_result(snapshot: &mut PollSnapshot, result: Result<Option<EscalatedAlert>, String>) {
    snapshot.polls += 1;
    match result {
        Ok(active) => {
            if active.as_ref().map(|a| &a.alert.id) != snapshot.active.as_ref().map(|a| &a.alert.id) {
                debug!(
                    "Active escalation changed: {:?}",
                    active.as_ref().map(|a| a.alert.id.as_str())
                );
            }
            snapshot.active = active;
            snapshot.last_error = None;
            snapshot.fetched_at = Some(Utc::now());
        }
        Err(e) => {
            warn!("Escalation poll failed: {}", e);
            snapshot.last_error = Some(e);
        }
    }
}

pub struct EscalationPoller {
    snapshots: watch::Receiver<PollSnapshot>,
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl EscalationPoller {
    /// Start polling immediately, then every `interval`
    pub fn start(source: Arc<dyn EscalationSource>, interval: Duration) -> Self {
        let (snap_tx, snap_rx) = watch::channel(PollSnapshot::default());
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut snapshot = PollSnapshot::default();

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shutdown_rx.changed() => break,
                }

                let fetched = tokio::select! {
                    r = source.active_escalation() => r,
                    _ = shutdown_rx.changed() => break,
                };

                apply_result(&mut snapshot, fetched.map_err(|e| e.to_string()));
                if snap_tx.send(snapshot.clone()).is_err() {
                    break;
                }
            }
            debug!("Escalation poller stopped");
        });

        Self {
            snapshots: snap_rx,
            shutdown: shutdown_tx,
            handle: Some(handle),
        }
    }

    pub fn latest(&self) -> PollSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.snapshots.clone()
    }

    /// Stop and wait for the task to finish
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for EscalationPoller {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

// ============================================================================
// Fake source (testing)
// ============================================================================

/// Scripted escalation source; the last response repeats
pub struct FakeEscalationSource {
    responses: std::sync::Mutex<Vec<Result<Option<EscalatedAlert>, String>>>,
    calls: std::sync::atomic::AtomicUsize,
}

impl FakeEscalationSource {
    pub fn new(responses: Vec<Result<Option<EscalatedAlert>, String>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EscalationSource for FakeEscalationSource {
    async fn active_escalation(
        &self,
    ) -> Result<Option<EscalatedAlert>, crate::backend::BackendError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let next = match self.responses.lock() {
            Ok(mut responses) => match responses.len() {
                0 => Ok(None),
                1 => responses[0].clone(),
                _ => responses.remove(0),
            },
            Err(_) => Ok(None),
        };
        next.map_err(|detail| crate::backend::BackendError::Decode {
            path: "/api/escalation/active".to_string(),
            detail,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Alert, AlertCategory, AlertSeverity, Country, EscalationStatus, Level};

    fn escalated(id: &str) -> EscalatedAlert {
        EscalatedAlert {
            alert: Alert {
                id: id.to_string(),
                title: "Dengue surge".to_string(),
                description: String::new(),
                severity: AlertSeverity::High,
                category: AlertCategory::HumanHealth,
                country: Country::India,
                state: Some("Kerala".to_string()),
                district: None,
                pathogen: None,
                cases: Some(310),
                source: None,
                detected_at: Utc::now(),
            },
            level: Level::State,
            origin: Level::District,
            status: EscalationStatus::Escalated,
            escalated_at: Utc::now(),
            acknowledged_by: None,
            notes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_poll_once_keeps_last_good_value() {
        let source = FakeEscalationSource::new(vec![
            Ok(Some(escalated("e1"))),
            Err("connection refused".to_string()),
        ]);
        let mut snapshot = PollSnapshot::default();

        poll_once(&source, &mut snapshot).await;
        assert_eq!(snapshot.active.as_ref().unwrap().alert.id, "e1");
        assert!(snapshot.last_error.is_none());

        poll_once(&source, &mut snapshot).await;
        assert_eq!(snapshot.active.as_ref().unwrap().alert.id, "e1");
        assert!(snapshot.last_error.as_ref().unwrap().contains("connection refused"));
        assert_eq!(snapshot.polls, 2);
    }

    #[tokio::test]
    async fn test_poller_publishes_and_stops() {
        let source = Arc::new(FakeEscalationSource::new(vec![
            Ok(None),
            Ok(Some(escalated("e2"))),
        ]));
        let poller = EscalationPoller::start(source.clone(), Duration::from_millis(10));

        let mut rx = poller.subscribe();
        let snap = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.polls >= 2))
            .await
            .expect("poller did not tick")
            .expect("poller channel closed")
            .clone();
        assert!(snap.polls >= 2);
        assert_eq!(poller.latest().active.unwrap().alert.id, "e2");

        poller.stop().await;
        let calls = source.call_count();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.call_count(), calls);
    }
}
