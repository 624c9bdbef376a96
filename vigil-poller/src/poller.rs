//! Job poller
//!
//! Process-wide registry of named polling tasks. Each running task owns one
//! check loop that queries a status endpoint, delivers every outcome to the
//! task's handler, and reschedules itself only while the backend keeps
//! reporting `started`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};
use uuid::Uuid;

use vigil_client::{ClientError, PlatformClient};
use vigil_core::status::{StatusReport, TaskStatus};
use vigil_core::work::WorkType;

use crate::config::PollConfig;

/// Everything a status check can deliver: a decoded report, or the client
/// error that ended the poll
pub type PollOutcome = Result<StatusReport, ClientError>;

/// Callback receiving every poll outcome for one task
pub type PollHandler = Arc<dyn Fn(PollOutcome) + Send + Sync>;

/// One polling slot
///
/// Slots are created lazily on first use of an id, reused across restarts,
/// and never removed from the registry. The generation counter is bumped on
/// every stop so a check that was in flight at that moment can tell it has
/// been superseded.
struct PollSlot {
    id: String,
    url: String,
    handler: PollHandler,
    is_running: bool,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

/// Registry of named polling tasks
///
/// Cheap to clone; all clones share one registry. Consumers interact only
/// through [`start_poll`](Self::start_poll), [`stop_poll`](Self::stop_poll),
/// [`stop_polls`](Self::stop_polls) and [`kill_job`](Self::kill_job), never
/// with the slots directly.
#[derive(Clone)]
pub struct JobPoller {
    client: Arc<PlatformClient>,
    config: PollConfig,
    slots: Arc<Mutex<HashMap<String, PollSlot>>>,
}

impl JobPoller {
    /// Creates a new poller backed by the given client
    pub fn new(client: Arc<PlatformClient>, config: PollConfig) -> Self {
        Self {
            client,
            config,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Start (or re-target) the poll for `id`
    ///
    /// The slot's URL and handler are always refreshed, so a stopped task
    /// can be restarted against a new endpoint without losing its identity,
    /// and a running one can be re-targeted for subsequent checks. If the
    /// task is already running this never schedules a second check loop;
    /// otherwise the loop is spawned and issues its first check immediately.
    ///
    /// All delivery happens through the handler; there is no return value.
    pub fn start_poll(&self, id: impl Into<String>, url: impl Into<String>, handler: PollHandler) {
        let id = id.into();
        let mut slots = self.slots.lock().unwrap();

        let slot = slots.entry(id.clone()).or_insert_with(|| {
            debug!("Creating polling slot for {}", id);
            PollSlot {
                id: id.clone(),
                url: String::new(),
                handler: Arc::new(|_| {}),
                is_running: false,
                generation: 0,
                task: None,
            }
        });

        slot.url = url.into();
        slot.handler = handler;

        if slot.is_running {
            return;
        }

        info!("Launch polling for {}", slot.id);
        slot.is_running = true;
        slot.task = Some(self.spawn_check_loop(id, slot.generation));
    }

    /// Stop watching `id`
    ///
    /// Cancels the pending check and marks the slot not-running. Idempotent;
    /// unknown or already-stopped ids are ignored. The server-side job is
    /// unaffected; see [`kill_job`](Self::kill_job) for that.
    pub fn stop_poll(&self, id: &str) {
        let task = {
            let mut slots = self.slots.lock().unwrap();
            match slots.get_mut(id) {
                Some(slot) if slot.is_running => {
                    info!("Stop polling for {}", slot.id);
                    slot.is_running = false;
                    slot.generation += 1;
                    slot.task.take()
                }
                _ => return,
            }
        };

        if let Some(task) = task {
            task.abort();
        }
    }

    /// Stop every running poll
    ///
    /// Called when the surrounding view changes context (switching project,
    /// tab or portfolio) so stale updates never reach a defunct screen.
    pub fn stop_polls(&self) {
        let tasks: Vec<JoinHandle<()>> = {
            let mut slots = self.slots.lock().unwrap();
            slots
                .values_mut()
                .filter(|slot| slot.is_running)
                .filter_map(|slot| {
                    info!("Stop polling for {}", slot.id);
                    slot.is_running = false;
                    slot.generation += 1;
                    slot.task.take()
                })
                .collect()
        };

        for task in tasks {
            task.abort();
        }
    }

    /// Whether the poll for `id` is currently running
    pub fn is_running(&self, id: &str) -> bool {
        let slots = self.slots.lock().unwrap();
        slots.get(id).is_some_and(|slot| slot.is_running)
    }

    /// Ask the backend to abort a server-side computation, fire and forget
    ///
    /// Purely a side-channel signal: no polling slot is touched. Pair with
    /// [`stop_poll`](Self::stop_poll) to also stop watching; leave the poll
    /// running to observe the resulting `cancelled` status instead.
    pub fn kill_job(&self, project_id: Uuid, work_type: WorkType) {
        let client = Arc::clone(&self.client);

        tokio::spawn(async move {
            if let Err(e) = client.kill_task(project_id, &work_type).await {
                warn!(
                    "Failed to kill {} job for project {}: {}",
                    work_type, project_id, e
                );
            }
        });
    }

    /// Spawns the check loop for one slot
    ///
    /// The loop re-reads the slot's URL before every check so re-targeting
    /// takes effect, and re-validates the generation after every response
    /// so outcomes that land after a stop are dropped instead of delivered.
    fn spawn_check_loop(&self, id: String, generation: u64) -> JoinHandle<()> {
        let poller = self.clone();

        tokio::spawn(async move {
            loop {
                let Some(url) = poller.current_url(&id, generation) else {
                    break;
                };

                debug!("Checking status of {} at {}", id, url);
                let outcome = poller.client.task_status(&url).await;

                let Some(handler) = poller.settle_check(&id, generation, &outcome) else {
                    debug!("Dropping stale status for {}", id);
                    break;
                };

                let keep_going =
                    matches!(&outcome, Ok(report) if report.status == TaskStatus::Started);

                // Continuation is already decided; the handler sees every
                // outcome exactly once, including the terminal one.
                handler(outcome);

                if !keep_going {
                    break;
                }

                time::sleep(poller.config.interval).await;
            }
        })
    }

    /// URL for the next check, or `None` if the slot was stopped or
    /// restarted under a newer generation
    fn current_url(&self, id: &str, generation: u64) -> Option<String> {
        let slots = self.slots.lock().unwrap();
        let slot = slots.get(id)?;

        if !slot.is_running || slot.generation != generation {
            return None;
        }

        Some(slot.url.clone())
    }

    /// Applies one check's outcome to its slot
    ///
    /// Returns the handler to notify, or `None` when the outcome arrived
    /// after a stop and must be suppressed. Any outcome other than a
    /// well-formed `started` report ends the poll.
    fn settle_check(&self, id: &str, generation: u64, outcome: &PollOutcome) -> Option<PollHandler> {
        let mut slots = self.slots.lock().unwrap();
        let slot = slots.get_mut(id)?;

        if !slot.is_running || slot.generation != generation {
            return None;
        }

        let still_running = matches!(outcome, Ok(report) if report.status == TaskStatus::Started);
        if !still_running {
            info!("Stop polling for {}", slot.id);
            slot.is_running = false;
            slot.task = None;
        }

        Some(slot.handler.clone())
    }
}
