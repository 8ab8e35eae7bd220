//! Background reload loop.
//!
//! Owns a [`Session`] inside a tokio task, reloads it on a fixed interval or
//! when [`ReloadHandle::refresh`] is signalled, and forwards a
//! [`DashboardView`] snapshot through an `mpsc` channel after every
//! successful load.

use std::time::Duration;

use lens_data::dashboard::{DashboardView, ViewKind};
use tokio::sync::mpsc;
use tokio::time;

use crate::session::Session;

// ── ReloadOrchestrator ────────────────────────────────────────────────────────

pub struct ReloadOrchestrator {
    session: Session,
    interval: Duration,
    view: ViewKind,
}

impl ReloadOrchestrator {
    /// `interval_secs` is the period between automatic reloads.
    pub fn new(session: Session, interval_secs: u64, view: ViewKind) -> Self {
        Self {
            session,
            interval: Duration::from_secs(interval_secs),
            view,
        }
    }

    /// Spawn the reload loop.
    ///
    /// The task loads immediately, then again on every tick or refresh
    /// signal. It stops once the receiver is dropped or the handle aborts it.
    pub fn start(self) -> (mpsc::Receiver<DashboardView>, ReloadHandle) {
        let (tx, rx) = mpsc::channel(16);
        let (refresh_tx, refresh_rx) = mpsc::channel(1);

        let handle = tokio::spawn(async move {
            self.reload_loop(tx, refresh_rx).await;
        });

        (rx, ReloadHandle { handle, refresh_tx })
    }

    async fn reload_loop(
        mut self,
        tx: mpsc::Sender<DashboardView>,
        mut refresh_rx: mpsc::Receiver<()>,
    ) {
        self.reload_and_send(&tx).await;

        let mut interval = time::interval(self.interval);
        // The first tick completes immediately; the initial load covers it.
        interval.tick().await;
        let mut refresh_open = true;

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                signal = refresh_rx.recv(), if refresh_open => {
                    if signal.is_none() {
                        refresh_open = false;
                        continue;
                    }
                    tracing::debug!("refresh requested");
                }
            }

            if tx.is_closed() {
                tracing::debug!("snapshot channel closed; exiting reload loop");
                break;
            }

            self.reload_and_send(&tx).await;
        }
    }

    async fn reload_and_send(&mut self, tx: &mpsc::Sender<DashboardView>) {
        if let Err(e) = self.session.load().await {
            tracing::warn!(error = %e, "reload failed; no snapshot sent");
            return;
        }

        let snapshot = self.session.dashboard(self.view);
        if let Err(e) = tx.send(snapshot).await {
            tracing::warn!(error = %e, "failed to send dashboard snapshot; receiver dropped");
        }
    }
}

// ── ReloadHandle ──────────────────────────────────────────────────────────────

/// Control side of a running [`ReloadOrchestrator`].
pub struct ReloadHandle {
    handle: tokio::task::JoinHandle<()>,
    refresh_tx: mpsc::Sender<()>,
}

impl ReloadHandle {
    /// Ask for an immediate reload. Returns `false` when the loop is gone.
    /// Signals sent while one is already pending collapse into it.
    pub fn refresh(&self) -> bool {
        match self.refresh_tx.try_send(()) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => true,
            Err(mpsc::error::TrySendError::Closed(())) => false,
        }
    }

    /// Stop the loop immediately.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionConfig;
    use crate::source::Source;
    use std::path::Path;

    const WAIT: Duration = Duration::from_secs(5);

    fn orchestrator_for(path: &Path, interval_secs: u64) -> ReloadOrchestrator {
        let session =
            Session::new(SessionConfig::new(Source::File(path.to_path_buf()))).unwrap();
        ReloadOrchestrator::new(session, interval_secs, ViewKind::All)
    }

    async fn next(rx: &mut mpsc::Receiver<DashboardView>) -> DashboardView {
        time::timeout(WAIT, rx.recv())
            .await
            .expect("timed out waiting for snapshot")
            .expect("channel closed before receiving snapshot")
    }

    #[tokio::test]
    async fn test_initial_snapshot_sent() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("expensas.csv");
        std::fs::write(&path, "mes,categoria,monto\n2024-01,Food,10\n").unwrap();

        let (mut rx, handle) = orchestrator_for(&path, 3600).start();
        let snapshot = next(&mut rx).await;
        assert_eq!(snapshot.bar.expect("bar").values[0].value, 10.0);
        handle.abort();
    }

    #[tokio::test]
    async fn test_refresh_reloads_changed_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("expensas.csv");
        std::fs::write(&path, "mes,categoria,monto\n2024-01,Food,10\n").unwrap();

        let (mut rx, handle) = orchestrator_for(&path, 3600).start();
        next(&mut rx).await;

        std::fs::write(&path, "mes,categoria,monto\n2024-01,Food,25\n").unwrap();
        assert!(handle.refresh());
        let snapshot = next(&mut rx).await;
        assert_eq!(snapshot.bar.expect("bar").values[0].value, 25.0);
        handle.abort();
    }

    #[tokio::test]
    async fn test_failed_reload_sends_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("expensas.csv");
        std::fs::write(&path, "mes,categoria,monto\n2024-01,Food,10\n").unwrap();

        let (mut rx, handle) = orchestrator_for(&path, 3600).start();
        next(&mut rx).await;

        std::fs::remove_file(&path).unwrap();
        handle.refresh();
        let silent = time::timeout(Duration::from_millis(300), rx.recv()).await;
        assert!(silent.is_err(), "no snapshot expected after a failed reload");

        std::fs::write(&path, "mes,categoria,monto\n2024-01,Food,40\n").unwrap();
        handle.refresh();
        let snapshot = next(&mut rx).await;
        assert_eq!(snapshot.bar.expect("bar").values[0].value, 40.0);
        handle.abort();
    }

    #[tokio::test]
    async fn test_interval_triggers_reload() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("expensas.csv");
        std::fs::write(&path, "mes,categoria,monto\n2024-01,Food,1\n").unwrap();

        let (mut rx, handle) = orchestrator_for(&path, 1).start();
        next(&mut rx).await;
        next(&mut rx).await;
        handle.abort();
    }

    #[tokio::test]
    async fn test_refresh_after_abort_reports_gone() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("expensas.csv");
        std::fs::write(&path, "mes,categoria,monto\n2024-01,Food,1\n").unwrap();

        let (_rx, handle) = orchestrator_for(&path, 3600).start();
        handle.abort();
        let mut gone = false;
        for _ in 0..50 {
            if !handle.refresh() {
                gone = true;
                break;
            }
            time::sleep(Duration::from_millis(20)).await;
        }
        assert!(gone);
    }
}
