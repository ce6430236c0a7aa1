//! hrm_session - Session and inactivity guard for HRM front-end pages
//!
//! This crate tracks the login state of a browser profile in two mirrors
//! (cookies and same-origin key/value storage), ends sessions that stay idle
//! longer than the inactivity limit, and propagates logout across tabs.
//! Every page is wrapped in a [`RouteGate`] which decides whether the page may
//! render or must be replaced by the module's login route.

mod clock;
mod config;
mod errors;
mod guard;
mod routes;
mod session;
mod storage;
mod utils;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    FLAG_KEY, GuardConfig, INACTIVITY_LIMIT_SECS, LAST_ACTIVITY_KEY, TICK_INTERVAL, TOKEN_KEY,
    TRUE_SENTINEL,
};
pub use errors::SessionError;
pub use routes::{AppModule, PublicPageSet};

pub use guard::{
    ActivityKind, ActivityMonitor, CrossTabNotifier, GateView, GuardState, LogoutReason,
    MountedGate, Navigator, Observation, PLACEHOLDER_HTML, RecordingNavigator, RouteGate, Trigger,
    Verdict, decide, signals_logout,
};

pub use session::{begin_session, end_session};

pub use storage::{
    CookieJar, HeaderCookieJar, KeyValueStore, LocalStorage, MemoryCookieJar, NoCookies,
    NoStorage, PersistentSessionStore, SessionStore, StorageEvent, TabId, TabStorage,
    TabStorageEvents,
};
