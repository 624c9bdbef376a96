//! Computation watchers
//!
//! Launch-and-watch flows for the computations the platform runs. Each
//! watcher issues the domain launch request, interprets the reply (a
//! `blocked` reply means another computation already owns the resource and
//! no poll is started), then registers a poll whose outcomes are mapped
//! onto a channel of [`WatchEvent`]s for the owning view to consume.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use vigil_client::PlatformClient;
use vigil_core::dto::LaunchRequest;
use vigil_core::status::{StatusReport, TaskStatus};
use vigil_core::work::WorkType;

use crate::poller::{JobPoller, PollHandler, PollOutcome};

/// Progress event for one watched computation
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// Computation is running; elapsed seconds per the server clock
    Running { seconds: i64 },
    /// Computation finished; the report carries the result id
    Completed(StatusReport),
    /// Another computation already owns this resource server-side
    Blocked,
    /// Computation failed, or watching it did
    Failed { message: String },
}

/// Launches computations and watches them through the poller
///
/// One watcher serves a whole view; stopping the view means calling
/// [`stop_all`](Self::stop_all), not dropping the event receivers (a
/// dropped receiver merely discards events, the polls keep running).
pub struct ComputationWatcher {
    poller: JobPoller,
    client: Arc<PlatformClient>,
}

impl ComputationWatcher {
    pub fn new(poller: JobPoller, client: Arc<PlatformClient>) -> Self {
        Self { poller, client }
    }

    /// Launch an autofit run and watch it, keyed by the parameter set id
    ///
    /// Emits [`WatchEvent::Blocked`] without starting a poll when the
    /// backend reports another computation holds the project.
    pub async fn watch_autofit(
        &self,
        project_id: Uuid,
        parset_id: Uuid,
        maxtime: Option<f64>,
    ) -> vigil_client::Result<mpsc::UnboundedReceiver<WatchEvent>> {
        let (events, rx) = mpsc::unbounded_channel();

        let reply = self
            .client
            .start_autofit(project_id, parset_id, &LaunchRequest { maxtime })
            .await?;

        match reply.status {
            TaskStatus::Started => {
                info!("Autofit started for parset {}", parset_id);
                self.poller.start_poll(
                    parset_id.to_string(),
                    PlatformClient::autofit_status_path(project_id, parset_id),
                    event_handler(events),
                );
            }
            TaskStatus::Blocked => {
                let _ = events.send(WatchEvent::Blocked);
            }
            status => {
                let _ = events.send(WatchEvent::Failed {
                    message: format!("autofit launch answered with status {}", status),
                });
            }
        }

        Ok(rx)
    }

    /// Kick off BOC calculations for a portfolio and watch one poll per project
    ///
    /// Events are multiplexed onto one channel as `(project_id, event)`
    /// pairs; each project's poll is keyed by its project id.
    pub async fn watch_boc_calculations(
        &self,
        portfolio_id: Uuid,
        gaoptim_id: Uuid,
        project_ids: &[Uuid],
        maxtime: Option<f64>,
    ) -> vigil_client::Result<mpsc::UnboundedReceiver<(Uuid, WatchEvent)>> {
        let (events, rx) = mpsc::unbounded_channel();

        self.client
            .start_boc_calculation(portfolio_id, gaoptim_id, &LaunchRequest { maxtime })
            .await?;
        info!(
            "BOC calculations started for portfolio {} across {} project(s)",
            portfolio_id,
            project_ids.len()
        );

        for &project_id in project_ids {
            let events = events.clone();
            let handler: PollHandler = Arc::new(move |outcome| {
                let _ = events.send((project_id, map_outcome(outcome)));
            });
            self.poller.start_poll(
                project_id.to_string(),
                PlatformClient::boc_status_path(project_id, gaoptim_id),
                handler,
            );
        }

        Ok(rx)
    }

    /// Launch the full portfolio GA optimization and watch it, keyed by the
    /// gaoptim id
    ///
    /// When a GA run is already in progress for the portfolio the launch is
    /// skipped and the watcher simply joins the running job.
    pub async fn watch_portfolio_ga(
        &self,
        portfolio_id: Uuid,
        gaoptim_id: Uuid,
        maxtime: Option<f64>,
    ) -> vigil_client::Result<mpsc::UnboundedReceiver<WatchEvent>> {
        let (events, rx) = mpsc::unbounded_channel();

        let check = self
            .client
            .check_task(portfolio_id, &WorkType::PortfolioGa(gaoptim_id))
            .await?;

        if check.status == TaskStatus::Started {
            info!(
                "Joining GA optimization already running for portfolio {}",
                portfolio_id
            );
        } else {
            self.client
                .start_portfolio_ga(portfolio_id, gaoptim_id, &LaunchRequest { maxtime })
                .await?;
            info!("GA optimization started for portfolio {}", portfolio_id);
        }

        self.poller.start_poll(
            gaoptim_id.to_string(),
            PlatformClient::portfolio_ga_status_path(portfolio_id, gaoptim_id),
            event_handler(events),
        );

        Ok(rx)
    }

    /// Stop watching everything; call on view teardown
    pub fn stop_all(&self) {
        self.poller.stop_polls();
    }
}

fn event_handler(events: mpsc::UnboundedSender<WatchEvent>) -> PollHandler {
    Arc::new(move |outcome| {
        let _ = events.send(map_outcome(outcome));
    })
}

/// Maps one poll outcome to exactly one event
fn map_outcome(outcome: PollOutcome) -> WatchEvent {
    match outcome {
        Ok(report) => match report.status {
            TaskStatus::Completed => WatchEvent::Completed(report),
            TaskStatus::Started => {
                let seconds = report.elapsed().map(|d| d.num_seconds()).unwrap_or(0);
                WatchEvent::Running { seconds }
            }
            status => WatchEvent::Failed {
                message: report
                    .error_text
                    .unwrap_or_else(|| format!("computation ended with status {}", status)),
            },
        },
        Err(e) => WatchEvent::Failed {
            message: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PollConfig;
    use mockito::{Server, ServerGuard};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use vigil_client::ClientError;

    fn watcher_for(server: &ServerGuard) -> ComputationWatcher {
        let client = Arc::new(PlatformClient::new(server.url()));
        let poller = JobPoller::new(
            Arc::clone(&client),
            PollConfig::new(Duration::from_millis(20)),
        );
        ComputationWatcher::new(poller, client)
    }

    fn report(json: &str) -> StatusReport {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_map_outcome_running_reports_elapsed_seconds() {
        let event = map_outcome(Ok(report(
            r#"{
                "status": "started",
                "start_time": "2024-03-01T10:00:00Z",
                "current_time": "2024-03-01T10:01:30Z"
            }"#,
        )));
        assert!(matches!(event, WatchEvent::Running { seconds: 90 }));
    }

    #[test]
    fn test_map_outcome_prefers_error_text() {
        let event = map_outcome(Ok(report(
            r#"{"status": "error", "error_text": "solver diverged"}"#,
        )));
        match event {
            WatchEvent::Failed { message } => assert_eq!(message, "solver diverged"),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_map_outcome_unknown_status_fails_with_status_name() {
        let event = map_outcome(Ok(report(r#"{"status": "cancelled"}"#)));
        match event {
            WatchEvent::Failed { message } => assert!(message.contains("cancelled")),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_map_outcome_transport_error() {
        let event = map_outcome(Err(ClientError::api_error(500, "down")));
        assert!(matches!(event, WatchEvent::Failed { .. }));
    }

    #[tokio::test]
    async fn test_blocked_autofit_emits_blocked_and_starts_no_poll() {
        let mut server = Server::new_async().await;
        let project_id = Uuid::new_v4();
        let parset_id = Uuid::new_v4();
        let path = format!(
            "/api/project/{}/parsets/{}/automatic_calibration",
            project_id, parset_id
        );
        let _launch = server
            .mock("POST", path.as_str())
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": "blocked"}"#)
            .create_async()
            .await;
        let status_checks = server
            .mock("GET", path.as_str())
            .expect(0)
            .create_async()
            .await;

        let watcher = watcher_for(&server);
        let mut rx = watcher
            .watch_autofit(project_id, parset_id, None)
            .await
            .unwrap();

        assert!(matches!(rx.recv().await, Some(WatchEvent::Blocked)));
        tokio::time::sleep(Duration::from_millis(100)).await;
        status_checks.assert_async().await;
    }

    #[tokio::test]
    async fn test_autofit_runs_to_completion() {
        let mut server = Server::new_async().await;
        let project_id = Uuid::new_v4();
        let parset_id = Uuid::new_v4();
        let path = format!(
            "/api/project/{}/parsets/{}/automatic_calibration",
            project_id, parset_id
        );
        let _launch = server
            .mock("POST", path.as_str())
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": "started"}"#)
            .create_async()
            .await;

        let checks = Arc::new(AtomicUsize::new(0));
        let responder_checks = Arc::clone(&checks);
        let _status = server
            .mock("GET", path.as_str())
            .with_header("content-type", "application/json")
            .with_body_from_request(move |_| {
                if responder_checks.fetch_add(1, Ordering::SeqCst) == 0 {
                    br#"{
                        "status": "started",
                        "start_time": "2024-03-01T10:00:00Z",
                        "current_time": "2024-03-01T10:00:05Z"
                    }"#
                    .to_vec()
                } else {
                    br#"{"status": "completed"}"#.to_vec()
                }
            })
            .create_async()
            .await;

        let watcher = watcher_for(&server);
        let mut rx = watcher
            .watch_autofit(project_id, parset_id, Some(60.0))
            .await
            .unwrap();

        assert!(matches!(
            rx.recv().await,
            Some(WatchEvent::Running { seconds: 5 })
        ));
        assert!(matches!(rx.recv().await, Some(WatchEvent::Completed(_))));
    }

    #[tokio::test]
    async fn test_portfolio_ga_joins_running_job_without_relaunching() {
        let mut server = Server::new_async().await;
        let portfolio_id = Uuid::new_v4();
        let gaoptim_id = Uuid::new_v4();
        let check_path = format!(
            "/api/task/{}/type/portfolio-{}",
            portfolio_id, gaoptim_id
        );
        let launch_path = format!(
            "/api/minimize/portfolio/{}/gaoptim/{}",
            portfolio_id, gaoptim_id
        );

        // First hit is the pre-launch check, the rest are poll checks.
        let checks = Arc::new(AtomicUsize::new(0));
        let responder_checks = Arc::clone(&checks);
        let _status = server
            .mock("GET", check_path.as_str())
            .with_header("content-type", "application/json")
            .with_body_from_request(move |_| {
                if responder_checks.fetch_add(1, Ordering::SeqCst) < 2 {
                    br#"{"status": "started"}"#.to_vec()
                } else {
                    br#"{"status": "completed"}"#.to_vec()
                }
            })
            .create_async()
            .await;
        let launch = server
            .mock("POST", launch_path.as_str())
            .expect(0)
            .create_async()
            .await;

        let watcher = watcher_for(&server);
        let mut rx = watcher
            .watch_portfolio_ga(portfolio_id, gaoptim_id, None)
            .await
            .unwrap();

        assert!(matches!(rx.recv().await, Some(WatchEvent::Running { .. })));
        assert!(matches!(rx.recv().await, Some(WatchEvent::Completed(_))));
        launch.assert_async().await;
    }

    #[tokio::test]
    async fn test_boc_watch_polls_every_project() {
        let mut server = Server::new_async().await;
        let portfolio_id = Uuid::new_v4();
        let gaoptim_id = Uuid::new_v4();
        let project_a = Uuid::new_v4();
        let project_b = Uuid::new_v4();

        let launch_path = format!("/api/portfolio/{}/gaoptim/{}", portfolio_id, gaoptim_id);
        let launch = server
            .mock("POST", launch_path.as_str())
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let mut status_mocks = Vec::new();
        for project_id in [project_a, project_b] {
            let path = format!("/api/task/{}/type/gaoptim-{}", project_id, gaoptim_id);
            let mock = server
                .mock("GET", path.as_str())
                .with_header("content-type", "application/json")
                .with_body(r#"{"status": "completed"}"#)
                .create_async()
                .await;
            status_mocks.push(mock);
        }

        let watcher = watcher_for(&server);
        let mut rx = watcher
            .watch_boc_calculations(portfolio_id, gaoptim_id, &[project_a, project_b], None)
            .await
            .unwrap();

        let mut seen = Vec::new();
        for _ in 0..2 {
            let (project_id, event) = rx.recv().await.unwrap();
            assert!(matches!(event, WatchEvent::Completed(_)));
            seen.push(project_id);
        }
        seen.sort();
        let mut expected = vec![project_a, project_b];
        expected.sort();
        assert_eq!(seen, expected);
        launch.assert_async().await;
    }
}
