use crate::arcade::{Arcade, ProfileWrite};
use crate::game::scheduler::Scheduler;
use crate::profile::{sanitize_name, Profile, ProfilePatch};
use crate::protocol::{Command, Notice, ServerMessage, StateView};
use crate::store::SqliteStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const EVENT_CAPACITY: usize = 256;

/// Drives one [`Arcade`] on a single scheduler timer and fans its output out.
#[derive(Clone)]
pub struct Runtime {
    shared: Arc<Shared>,
}

struct Shared {
    driver: Mutex<Driver>,
    store: Option<SqliteStore>,
    events: broadcast::Sender<ServerMessage>,
}

struct Driver {
    arcade: Arcade,
    timer: Option<JoinHandle<()>>,
    timer_stops: u64,
}

/// Output of one arcade step, delivered while the lock is still held.
#[derive(Default)]
struct Outbox {
    notices: Vec<Notice>,
    view: Option<StateView>,
    write: Option<ProfileWrite>,
}

impl Outbox {
    fn drain(arcade: &mut Arcade, changed: bool) -> Self {
        let notices = arcade.take_notices();
        let write = arcade.take_profile_write();
        let view = (changed || !notices.is_empty() || write.is_some()).then(|| arcade.view());
        Self {
            notices,
            view,
            write,
        }
    }
}

impl Runtime {
    pub fn new(arcade: Arcade, store: Option<SqliteStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                driver: Mutex::new(Driver {
                    arcade,
                    timer: None,
                    timer_stops: 0,
                }),
                store,
                events,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.shared.events.subscribe()
    }

    pub async fn view(&self) -> StateView {
        self.shared.driver.lock().await.arcade.view()
    }

    pub async fn profile(&self) -> Option<Profile> {
        self.shared.driver.lock().await.arcade.profile().cloned()
    }

    pub async fn dispatch(&self, command: Command) -> StateView {
        self.with_arcade(|arcade| arcade.apply(command)).await;
        self.view().await
    }

    /// Signs in under `name`, reusing a stored profile with that name.
    pub async fn login(&self, name: &str) -> Profile {
        let username = sanitize_name(name);
        let known = match &self.shared.store {
            Some(store) => store.find_profile(&username).await.unwrap_or_else(|error| {
                tracing::warn!(?error, %username, "failed to look up stored profile");
                None
            }),
            None => None,
        };
        self.with_arcade(|arcade| arcade.login(&username, known)).await
    }

    pub async fn patch_profile(&self, patch: ProfilePatch) -> Option<Profile> {
        self.with_arcade(|arcade| arcade.apply_patch(patch).cloned())
            .await
    }

    pub async fn logout(&self) -> bool {
        self.with_arcade(|arcade| arcade.logout()).await
    }

    /// Runs one UI operation under the lock, then brings the timer in line with
    /// the session phase and delivers whatever the operation produced.
    ///
    /// The outbox is flushed before the guard drops so snapshot writes land in
    /// the same order as the mutations that queued them.
    async fn with_arcade<T>(&self, operation: impl FnOnce(&mut Arcade) -> T) -> T {
        let mut driver = self.shared.driver.lock().await;
        let result = operation(&mut driver.arcade);
        self.sync_timer(&mut driver);
        let outbox = Outbox::drain(&mut driver.arcade, true);
        self.flush(outbox).await;
        result
    }

    fn sync_timer(&self, driver: &mut Driver) {
        if driver.arcade.is_playing() {
            let running = driver
                .timer
                .as_ref()
                .is_some_and(|handle| !handle.is_finished());
            if !running {
                self.start_timer(driver);
            }
        } else {
            stop_timer(driver);
        }
    }

    fn start_timer(&self, driver: &mut Driver) {
        let runtime = self.clone();
        let handle = tokio::spawn(async move { runtime.run_scheduler().await });
        if let Some(previous) = driver.timer.replace(handle) {
            previous.abort();
        }
        tracing::debug!("scheduler started");
    }

    async fn run_scheduler(self) {
        let mut interval = tokio::time::interval(Duration::from_millis(Scheduler::quantum_ms()));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;
        loop {
            interval.tick().await;
            let playing = {
                let mut driver = self.shared.driver.lock().await;
                let changed = driver.arcade.on_quantum();
                let outbox = Outbox::drain(&mut driver.arcade, changed);
                self.flush(outbox).await;
                driver.arcade.is_playing()
            };
            if !playing {
                tracing::debug!("scheduler finished");
                break;
            }
        }
    }

    async fn flush(&self, outbox: Outbox) {
        // Sending only fails when no socket is listening.
        for notice in outbox.notices {
            let _ = self.shared.events.send(ServerMessage::Notice(notice));
        }
        if let Some(view) = outbox.view {
            let _ = self.shared.events.send(ServerMessage::State(Box::new(view)));
        }
        if let Some(write) = outbox.write {
            self.persist(write).await;
        }
    }

    async fn persist(&self, write: ProfileWrite) {
        let Some(store) = &self.shared.store else { return };
        let result = match &write {
            ProfileWrite::Save(profile) => store.save_profile(profile).await,
            ProfileWrite::Clear => store.clear_profile().await,
        };
        if let Err(error) = result {
            tracing::warn!(?error, "failed to persist profile");
        }
    }
}

/// Cancels the scheduler timer if there is one. Returns whether it did.
fn stop_timer(driver: &mut Driver) -> bool {
    let Some(handle) = driver.timer.take() else {
        return false;
    };
    handle.abort();
    driver.timer_stops += 1;
    tracing::debug!(stops = driver.timer_stops, "scheduler stopped");
    true
}
