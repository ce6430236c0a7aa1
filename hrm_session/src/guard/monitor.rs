use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::clock::Clock;
use crate::config::GuardConfig;
use crate::routes::AppModule;
use crate::storage::{SessionStore, StorageEvent};

use super::cross_tab::signals_logout;
use super::navigator::Navigator;

/// Lifecycle of the guard for one mounted page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
    /// No check has run yet
    Unchecked,
    /// Rendering permitted
    Valid,
    /// Logout in progress
    Expiring,
    /// Terminal for this mount
    LoggedOut,
}

impl GuardState {
    pub fn permits_render(self) -> bool {
        self == GuardState::Valid
    }

    fn is_final(self) -> bool {
        matches!(self, GuardState::Expiring | GuardState::LoggedOut)
    }
}

/// User interactions that count as activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Click,
    KeyPress,
    PointerMove,
    Scroll,
    TouchStart,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 5] = [
        ActivityKind::Click,
        ActivityKind::KeyPress,
        ActivityKind::PointerMove,
        ActivityKind::Scroll,
        ActivityKind::TouchStart,
    ];

    /// DOM event name the listener is registered for
    pub fn event_name(self) -> &'static str {
        match self {
            ActivityKind::Click => "click",
            ActivityKind::KeyPress => "keypress",
            ActivityKind::PointerMove => "mousemove",
            ActivityKind::Scroll => "scroll",
            ActivityKind::TouchStart => "touchstart",
        }
    }
}

/// What caused an evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Mount,
    Tick,
    Activity(ActivityKind),
    Storage(StorageEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// No session flag on a protected route
    NotLoggedIn,
    /// Last activity is older than the inactivity limit
    Idle { idle_ms: i64 },
    /// Another tab cleared or falsified the session flag
    ForeignLogout,
    /// The user asked to log out
    UserRequested,
}

/// Inputs of a single check, read from the store and the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub logged_in: bool,
    pub last_activity_ms: i64,
    pub now_ms: i64,
    pub route_is_public: bool,
}

impl Observation {
    pub fn idle_ms(&self) -> i64 {
        self.now_ms.saturating_sub(self.last_activity_ms)
    }
}

/// Outcome of a check before any side effect is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Not logged in on a public page, render without touching the session
    Anonymous,
    /// Session is alive, extend it
    Refresh,
    Logout(LogoutReason),
}

/// Pure transition rule of the guard
pub fn decide(observation: &Observation, inactivity_limit_ms: i64) -> Verdict {
    if !observation.logged_in {
        return if observation.route_is_public {
            Verdict::Anonymous
        } else {
            Verdict::Logout(LogoutReason::NotLoggedIn)
        };
    }

    let idle_ms = observation.idle_ms();
    if idle_ms > inactivity_limit_ms {
        Verdict::Logout(LogoutReason::Idle { idle_ms })
    } else {
        Verdict::Refresh
    }
}

/// Session check bound to one mounted route.
///
/// Every trigger source funnels into [`ActivityMonitor::evaluate`].
pub struct ActivityMonitor {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    navigator: Arc<dyn Navigator>,
    config: Arc<GuardConfig>,
    route: String,
    module: AppModule,
    state: Mutex<GuardState>,
}

impl ActivityMonitor {
    pub fn new(
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        navigator: Arc<dyn Navigator>,
        config: Arc<GuardConfig>,
        route: impl Into<String>,
    ) -> Self {
        let route = route.into();
        let module = AppModule::for_route(&route);
        Self {
            store,
            clock,
            navigator,
            config,
            route,
            module,
            state: Mutex::new(GuardState::Unchecked),
        }
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn module(&self) -> AppModule {
        self.module
    }

    pub fn state(&self) -> GuardState {
        *self.lock_state()
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Read the current session inputs without changing anything
    pub fn observe(&self) -> Observation {
        Observation {
            logged_in: self.store.read_flag(),
            last_activity_ms: self.store.read_timestamp(),
            now_ms: self.clock.now_millis(),
            route_is_public: self.config.public_pages.contains(&self.route),
        }
    }

    pub fn evaluate(&self, trigger: &Trigger) -> GuardState {
        let current = self.state();
        if current.is_final() {
            tracing::trace!("Ignoring {:?} on {}: {:?}", trigger, self.route, current);
            return current;
        }

        if let Trigger::Storage(event) = trigger {
            if signals_logout(event) {
                return self.logout(LogoutReason::ForeignLogout);
            }
            return current;
        }

        let observation = self.observe();
        match decide(&observation, self.config.inactivity_limit_millis()) {
            Verdict::Anonymous => {
                tracing::trace!("Anonymous visit to public page {}", self.route);
                self.transition(GuardState::Valid)
            }
            Verdict::Refresh => {
                // Held across the writes; a logout that already started must not be undone
                let mut state = self.lock_state();
                if state.is_final() {
                    tracing::trace!("Skipping refresh on {}: {:?}", self.route, *state);
                    return *state;
                }
                self.store
                    .set_flag(true, self.config.inactivity_limit_secs);
                self.store.set_timestamp(observation.now_ms);
                tracing::trace!(
                    "Session refreshed on {:?} after {} ms idle",
                    trigger,
                    observation.idle_ms()
                );
                self.advance(&mut state, GuardState::Valid)
            }
            Verdict::Logout(reason) => self.logout(reason),
        }
    }

    /// Clear the session and leave for the module's login page.
    ///
    /// Only the first call has an effect; later calls return the current state.
    pub fn logout(&self, reason: LogoutReason) -> GuardState {
        {
            let mut state = self.lock_state();
            if state.is_final() {
                return *state;
            }
            *state = GuardState::Expiring;
        }

        tracing::info!(
            "Logging out from {} ({:?}), redirecting to {}",
            self.route,
            reason,
            self.module.login_route()
        );
        self.store.clear_all();
        self.navigator.replace(self.module.login_route());

        self.transition(GuardState::LoggedOut)
    }

    fn transition(&self, next: GuardState) -> GuardState {
        let mut state = self.lock_state();
        self.advance(&mut state, next)
    }

    /// Move to `next` unless that would leave a logout; only
    /// `Expiring -> LoggedOut` is allowed once logout has begun.
    fn advance(&self, state: &mut GuardState, next: GuardState) -> GuardState {
        let allowed = match *state {
            GuardState::Expiring => next == GuardState::LoggedOut,
            GuardState::LoggedOut => false,
            _ => true,
        };
        if !allowed {
            return *state;
        }
        if *state != next {
            tracing::debug!("Guard for {}: {:?} -> {:?}", self.route, *state, next);
            *state = next;
        }
        next
    }

    fn lock_state(&self) -> MutexGuard<'_, GuardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
