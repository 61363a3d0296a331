// ── Periodic polling ──
//
// Two lifetimes: fixed loops live as long as the poller; named dynamic
// loops are replaced wholesale by `restart` when their target changes.
// Every loop owns a child of the poller's token, so `stop` cascades.
// The name registry is locked across check-cancel-insert, so concurrent
// restarts of one name leave exactly one live loop.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, trace};

/// Shortest accepted period; `tokio::time::interval` rejects zero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Runs caller-supplied work on a schedule under a cancellation hierarchy.
///
/// The callback receives the loop's own [`CancellationToken`]. Failures are
/// the callback's business: the poller never retries, backs off, or logs
/// on its behalf. Ticks of one loop never overlap; a tick that runs long
/// swallows the ticks it missed.
pub struct Poller {
    token: CancellationToken,
    dynamic: Mutex<HashMap<String, CancellationToken>>,
    tracker: TaskTracker,
    handle: Handle,
}

impl Poller {
    /// Create a poller scoped under `parent`, spawning on the current
    /// runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(parent: &CancellationToken) -> Self {
        Self::with_handle(parent, Handle::current())
    }

    /// Create a poller that spawns its loops on `handle`, so loops can be
    /// (re)started from threads outside the runtime.
    pub fn with_handle(parent: &CancellationToken, handle: Handle) -> Self {
        Self {
            token: parent.child_token(),
            dynamic: Mutex::new(HashMap::new()),
            tracker: TaskTracker::new(),
            handle,
        }
    }

    /// The poller's own scope. Cancelling it is equivalent to [`stop`](Self::stop).
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<String, CancellationToken>> {
        self.dynamic.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start an anonymous loop that lives until the poller stops.
    ///
    /// With `run_immediately`, `f` runs once right away; after that once
    /// per `period`.
    pub fn fixed<F, Fut>(&self, period: Duration, run_immediately: bool, mut f: F)
    where
        F: FnMut(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = self.token.clone();
        self.tracker.spawn_on(
            async move {
                if run_immediately && !token.is_cancelled() {
                    f(token.clone()).await;
                }
                poll_loop(token, period, f).await;
            },
            &self.handle,
        );
    }

    /// Replace the dynamic loop registered as `name`.
    ///
    /// The previous loop (if any) is cancelled before the new one is
    /// registered. The new loop waits one full `period` before its first
    /// call.
    pub fn restart<F, Fut>(&self, name: &str, period: Duration, f: F)
    where
        F: FnMut(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut registry = self.registry();
        if let Some(previous) = registry.remove(name) {
            previous.cancel();
        }

        let token = self.token.child_token();
        registry.insert(name.to_owned(), token.clone());
        debug!(name, ?period, "restarting poll loop");
        self.tracker
            .spawn_on(poll_loop(token, period, f), &self.handle);
    }

    /// Stop one dynamic loop. Returns `false` if no loop had that name.
    pub fn cancel(&self, name: &str) -> bool {
        match self.registry().remove(name) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Whether a live dynamic loop is registered as `name`.
    pub fn is_running(&self, name: &str) -> bool {
        self.registry()
            .get(name)
            .is_some_and(|t| !t.is_cancelled())
    }

    /// Names of live dynamic loops, sorted.
    pub fn dynamic_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .registry()
            .iter()
            .filter(|(_, t)| !t.is_cancelled())
            .map(|(n, _)| n.clone())
            .collect();
        names.sort();
        names
    }

    /// Cancel every loop, fixed and dynamic.
    pub fn stop(&self) {
        self.token.cancel();
        self.registry().clear();
    }

    /// [`stop`](Self::stop), then wait for every loop to return.
    pub async fn shutdown(&self) {
        self.stop();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn poll_loop<F, Fut>(token: CancellationToken, period: Duration, mut f: F)
where
    F: FnMut(CancellationToken) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut interval = tokio::time::interval(period.max(MIN_PERIOD));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => break,
            _ = interval.tick() => {
                trace!("poll tick");
                f(token.clone()).await;
            }
        }
    }
}
