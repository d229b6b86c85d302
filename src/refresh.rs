//! Keeps the complaint store in step with the remote API.

use std::time::Duration;

use time::OffsetDateTime;
use tokio::{sync::oneshot, task::JoinHandle, time::MissedTickBehavior};

use crate::{Error, complaint::SharedStore, gateway::ApiClient};

/// How often the complaint list is fetched again.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Fetch every complaint and replace the contents of `store` with them.
///
/// On failure the loaded complaints are kept and the error is recorded on
/// the store so the complaints page can show it. Returns the number of
/// complaints fetched.
pub async fn refresh_store(gateway: &ApiClient, store: &SharedStore) -> Result<usize, Error> {
    let result = gateway.fetch_complaints().await;

    let mut store = store
        .write()
        .inspect_err(|error| tracing::error!("could not acquire store lock: {error}"))
        .map_err(|_| Error::StoreLockError)?;

    match result {
        Ok(complaints) => {
            let count = complaints.len();
            store.replace_all(complaints, OffsetDateTime::now_utc());
            tracing::debug!("Loaded {count} complaints");
            Ok(count)
        }
        Err(error) => {
            store.record_failure(error.to_string());
            Err(error.into())
        }
    }
}

struct RunningRefresh {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Runs [refresh_store] on a fixed interval in a background task.
///
/// The first refresh happens as soon as the scheduler starts. Dropping the
/// scheduler aborts the task.
pub struct RefreshScheduler {
    interval: Duration,
    running: Option<RunningRefresh>,
}

impl RefreshScheduler {
    /// Create a stopped scheduler that refreshes every `interval`.
    ///
    /// An interval of zero is raised to one millisecond.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            running: None,
        }
    }

    /// Start refreshing `store` from `gateway`. Does nothing if already running.
    pub fn start(&mut self, gateway: ApiClient, store: SharedStore) {
        if self.is_running() {
            tracing::warn!("Complaint refresh is already running");
            return;
        }

        let (stop, stop_signal) = oneshot::channel();
        let task = tokio::spawn(run(gateway, store, self.interval, stop_signal));

        tracing::info!("Refreshing complaints every {:?}", self.interval);
        self.running = Some(RunningRefresh { stop, task });
    }

    /// Stop refreshing and wait for an in-flight refresh to finish.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        // The task only drops the receiver when it has already exited.
        let _ = running.stop.send(());

        if let Err(error) = running.task.await {
            tracing::error!("Complaint refresh task failed: {error}");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.task.abort();
        }
    }
}

async fn run(
    gateway: ApiClient,
    store: SharedStore,
    period: Duration,
    mut stop_signal: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut stop_signal => {
                tracing::debug!("Stopping complaint refresh");
                break;
            }
            _ = ticker.tick() => {
                if let Err(error) = refresh_store(&gateway, &store).await {
                    tracing::warn!("Could not refresh complaints: {error}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use time::OffsetDateTime;

    use crate::{
        Error,
        complaint::{ComplaintStore, Folio},
        gateway::{ApiClient, DEFAULT_REQUEST_TIMEOUT, GatewayError},
        test_utils::{FakeApi, sample_complaints, sample_complaints_json},
    };

    use super::{RefreshScheduler, refresh_store};

    fn client_for(api: &FakeApi) -> ApiClient {
        ApiClient::new(&api.base_url, DEFAULT_REQUEST_TIMEOUT).unwrap()
    }

    #[tokio::test]
    async fn refresh_replaces_store_contents() {
        let api = FakeApi::start(sample_complaints_json()).await;
        let store = ComplaintStore::shared();

        let count = refresh_store(&client_for(&api), &store).await.unwrap();

        assert_eq!(count, 3);
        let store = store.read().unwrap();
        assert!(store.is_loaded());
        assert!(store.get(&Folio::new("Q-003")).is_some());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_complaints_and_records_error() {
        let api = FakeApi::start(sample_complaints_json()).await;
        api.set_failing(true);
        let store = ComplaintStore::shared();
        store
            .write()
            .unwrap()
            .replace_all(sample_complaints(), OffsetDateTime::now_utc());

        let result = refresh_store(&client_for(&api), &store).await;

        assert!(matches!(result, Err(Error::Gateway(GatewayError::Status(_)))));
        let store = store.read().unwrap();
        assert_eq!(store.complaints().len(), 3);
        assert!(store.last_error().is_some());
    }

    #[tokio::test]
    async fn refresh_after_failure_clears_error() {
        let api = FakeApi::start(sample_complaints_json()).await;
        let store = ComplaintStore::shared();
        api.set_failing(true);
        let _ = refresh_store(&client_for(&api), &store).await;

        api.set_failing(false);
        refresh_store(&client_for(&api), &store).await.unwrap();

        assert_eq!(store.read().unwrap().last_error(), None);
    }

    #[tokio::test]
    async fn scheduler_refreshes_until_stopped() {
        let api = FakeApi::start(sample_complaints_json()).await;
        let store = ComplaintStore::shared();
        let mut scheduler = RefreshScheduler::new(Duration::from_millis(20));

        scheduler.start(client_for(&api), store.clone());
        tokio::time::sleep(Duration::from_millis(150)).await;
        scheduler.stop().await;

        assert!(!scheduler.is_running());
        assert!(store.read().unwrap().is_loaded());
        let fetches_at_stop = api.fetch_count();
        assert!(
            fetches_at_stop >= 2,
            "want at least 2 fetches, got {fetches_at_stop}"
        );

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(api.fetch_count(), fetches_at_stop);
    }

    #[tokio::test]
    async fn starting_twice_keeps_one_task() {
        let api = FakeApi::start(sample_complaints_json()).await;
        let store = ComplaintStore::shared();
        let mut scheduler = RefreshScheduler::new(Duration::from_secs(60));

        scheduler.start(client_for(&api), store.clone());
        scheduler.start(client_for(&api), store.clone());
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(scheduler.is_running());
        assert_eq!(api.fetch_count(), 1);
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn dropping_scheduler_stops_refresh() {
        let api = FakeApi::start(sample_complaints_json()).await;
        let mut scheduler = RefreshScheduler::new(Duration::from_millis(20));
        scheduler.start(client_for(&api), ComplaintStore::shared());
        tokio::time::sleep(Duration::from_millis(60)).await;

        drop(scheduler);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let fetches_after_drop = api.fetch_count();
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(api.fetch_count(), fetches_after_drop);
    }
}
