use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::clock::Clock;
use crate::config::GuardConfig;
use crate::storage::{
    CookieJar, LocalStorage, PersistentSessionStore, SessionStore, TabId, TabStorage,
};

use super::cross_tab::CrossTabNotifier;
use super::monitor::{ActivityKind, ActivityMonitor, GuardState, LogoutReason, Trigger};
use super::navigator::Navigator;

/// Markup rendered instead of protected content while the guard is unresolved
pub const PLACEHOLDER_HTML: &str = r#"<div style="width:100vw;height:100vh"></div>"#;

/// What a gated page shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateView<T> {
    /// Blank area covering the full viewport
    Placeholder,
    Content(T),
}

impl<T> GateView<T> {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, GateView::Placeholder)
    }

    pub fn content(self) -> Option<T> {
        match self {
            GateView::Placeholder => None,
            GateView::Content(content) => Some(content),
        }
    }
}

impl GateView<String> {
    pub fn into_html(self) -> String {
        match self {
            GateView::Placeholder => PLACEHOLDER_HTML.to_string(),
            GateView::Content(html) => html,
        }
    }
}

/// Composition root wrapping every page of a tab.
///
/// Cloning is cheap; clones share the store, clock and navigator.
#[derive(Clone)]
pub struct RouteGate {
    config: Arc<GuardConfig>,
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    navigator: Arc<dyn Navigator>,
    cross_tab: Option<TabStorage>,
}

impl RouteGate {
    pub fn new(
        config: GuardConfig,
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            clock,
            navigator,
            cross_tab: None,
        }
    }

    /// Gate for one browser tab sharing `cookies` and `origin` with its siblings
    pub fn for_tab(
        config: GuardConfig,
        cookies: Arc<dyn CookieJar>,
        origin: &Arc<LocalStorage>,
        clock: Arc<dyn Clock>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let storage = origin.tab(TabId::new());
        let store = Arc::new(PersistentSessionStore::new(
            cookies,
            Arc::new(storage.clone()),
            config.inactivity_limit_secs,
        ));
        Self::new(config, store, clock, navigator).with_cross_tab(storage)
    }

    /// Listen for logout signals from other tabs through `storage`
    pub fn with_cross_tab(mut self, storage: TabStorage) -> Self {
        self.cross_tab = Some(storage);
        self
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Mount a page at `route`.
    ///
    /// The first check runs before this returns, so the returned gate already
    /// knows whether its children may render. Background tasks are spawned on
    /// the current Tokio runtime and live until the gate is dropped.
    pub fn mount(&self, route: impl Into<String>) -> MountedGate {
        let monitor = Arc::new(ActivityMonitor::new(
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
            Arc::clone(&self.navigator),
            Arc::clone(&self.config),
            route,
        ));

        // Subscribe before the first check so no foreign logout slips through
        let events = self.cross_tab.as_ref().map(TabStorage::subscribe);

        let initial = monitor.evaluate(&Trigger::Mount);
        tracing::debug!("Mounted {} in state {:?}", monitor.route(), initial);

        let mut tasks = Vec::new();
        if initial != GuardState::LoggedOut {
            tasks.push(spawn_tick(Arc::clone(&monitor), self.config.tick_interval));
            if let Some(events) = events {
                tasks.push(CrossTabNotifier::new(events).spawn(Arc::clone(&monitor)));
            }
        }

        MountedGate {
            gate: self.clone(),
            monitor,
            tasks,
        }
    }
}

fn spawn_tick(monitor: Arc<ActivityMonitor>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        // The mount check already covered t=0
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if monitor.evaluate(&Trigger::Tick) == GuardState::LoggedOut {
                break;
            }
        }
    })
}

/// A page currently shown behind the gate.
///
/// Dropping it removes the listeners and cancels the periodic check.
pub struct MountedGate {
    gate: RouteGate,
    monitor: Arc<ActivityMonitor>,
    tasks: Vec<JoinHandle<()>>,
}

impl MountedGate {
    pub fn route(&self) -> &str {
        self.monitor.route()
    }

    pub fn state(&self) -> GuardState {
        self.monitor.state()
    }

    pub fn monitor(&self) -> &Arc<ActivityMonitor> {
        &self.monitor
    }

    /// Render `children` only when the session check resolved to valid
    pub fn render<T>(&self, children: impl FnOnce() -> T) -> GateView<T> {
        if self.state().permits_render() {
            GateView::Content(children())
        } else {
            GateView::Placeholder
        }
    }

    /// Deliver a user interaction to the monitor
    pub fn dispatch(&self, kind: ActivityKind) -> GuardState {
        self.monitor.evaluate(&Trigger::Activity(kind))
    }

    /// User-initiated logout
    pub fn logout(&self) -> GuardState {
        self.monitor.logout(LogoutReason::UserRequested)
    }

    /// Tear this page down and mount `route` in its place
    pub fn navigate(self, route: impl Into<String>) -> MountedGate {
        let gate = self.gate.clone();
        drop(self);
        gate.mount(route)
    }

    pub fn unmount(self) {
        drop(self);
    }
}

impl Drop for MountedGate {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        tracing::trace!("Unmounted {}", self.monitor.route());
    }
}
