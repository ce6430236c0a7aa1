//! End-to-end flows through the public API of hrm_session

use std::sync::Arc;
use std::time::Duration;

use hrm_session::{
    ActivityKind, CookieJar, GuardConfig, GuardState, KeyValueStore, LocalStorage, ManualClock,
    MemoryCookieJar, RecordingNavigator, RouteGate, SessionStore, TabId, Trigger, begin_session,
};

struct Browser {
    clock: ManualClock,
    cookies: Arc<MemoryCookieJar>,
    origin: Arc<LocalStorage>,
}

impl Browser {
    fn new() -> Self {
        let clock = ManualClock::new(0);
        let cookies = Arc::new(MemoryCookieJar::new(Arc::new(clock.clone())));
        Self {
            clock,
            cookies,
            origin: LocalStorage::new(),
        }
    }

    fn open_tab(&self) -> (RouteGate, Arc<RecordingNavigator>) {
        let navigator = Arc::new(RecordingNavigator::new());
        let gate = RouteGate::for_tab(
            GuardConfig::default(),
            self.cookies.clone(),
            &self.origin,
            Arc::new(self.clock.clone()),
            navigator.clone(),
        );
        (gate, navigator)
    }

    fn login(&self, gate: &RouteGate) {
        begin_session(
            gate.store().as_ref(),
            &self.clock,
            gate.config(),
            Some("backend-token"),
        );
    }
}

/// Login at t=0, click at t=30s, tick at t=95s ends the session
#[tokio::test(start_paused = true)]
async fn idle_session_is_ended_by_the_periodic_tick() {
    let browser = Browser::new();
    let (gate, navigator) = browser.open_tab();
    browser.login(&gate);
    browser
        .origin
        .tab(TabId::new())
        .set_item("employeeDirectory", r#"[{"id":7,"name":"Dela Cruz"}]"#);

    let page = gate.mount("/hrm/employees");
    assert_eq!(page.state(), GuardState::Valid);

    browser.clock.set_millis(30_000);
    assert_eq!(page.dispatch(ActivityKind::Click), GuardState::Valid);
    assert_eq!(gate.store().read_timestamp(), 30_000);
    assert!(gate.store().read_flag());

    browser.clock.set_millis(95_000);
    tokio::time::sleep(Duration::from_millis(1_100)).await;

    assert_eq!(page.state(), GuardState::LoggedOut);
    assert_eq!(navigator.redirects(), vec!["/hrm/login".to_string()]);
    assert!(browser.cookies.names().is_empty());
    assert!(browser.origin.is_empty());

    // Further ticks do not redirect again
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(navigator.redirects().len(), 1);
}

/// Same scenario driven through `evaluate` directly with the fake clock
#[tokio::test]
async fn idle_session_is_ended_by_direct_evaluation() {
    let browser = Browser::new();
    let (gate, navigator) = browser.open_tab();
    browser.login(&gate);
    let page = gate.mount("/employee/overtime");

    browser.clock.set_millis(30_000);
    page.monitor()
        .evaluate(&Trigger::Activity(ActivityKind::KeyPress));
    // Keep the flag cookie alive so the idle rule, not cookie expiry, decides
    browser.clock.set_millis(94_000);
    browser.cookies.set("isLoggedIn", "true", 60);
    browser.clock.set_millis(95_000);

    let observation = page.monitor().observe();
    assert!(observation.logged_in);
    assert_eq!(observation.idle_ms(), 65_000);

    assert_eq!(
        page.monitor().evaluate(&Trigger::Tick),
        GuardState::LoggedOut
    );
    assert_eq!(navigator.redirects(), vec!["/employee/login".to_string()]);
    assert!(browser.origin.is_empty());
}

#[tokio::test]
async fn protected_route_without_cookie_redirects_immediately() {
    let browser = Browser::new();
    let (gate, navigator) = browser.open_tab();

    let page = gate.mount("/admin/offices");

    assert!(page.render(|| "offices").is_placeholder());
    assert_eq!(navigator.redirects(), vec!["/admin/login".to_string()]);
}

#[tokio::test]
async fn public_route_without_cookie_renders() {
    let browser = Browser::new();
    let (gate, navigator) = browser.open_tab();

    let page = gate.mount("/hrm/login");

    assert_eq!(page.render(|| "login form").content(), Some("login form"));
    assert!(navigator.redirects().is_empty());
}

#[tokio::test(start_paused = true)]
async fn activity_keeps_a_session_alive_past_the_limit() {
    let browser = Browser::new();
    let (gate, navigator) = browser.open_tab();
    browser.login(&gate);
    let page = gate.mount("/employee/time-corrections");

    // Interact every 40 seconds for five minutes
    for step in 1..=8 {
        browser.clock.set_millis(step * 40_000);
        page.dispatch(ActivityKind::Scroll);
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(page.state(), GuardState::Valid);
    }

    assert!(navigator.redirects().is_empty());
    assert_eq!(gate.store().read_timestamp(), 320_000);
}

#[tokio::test(start_paused = true)]
async fn logout_propagates_to_other_tabs() {
    let browser = Browser::new();
    let (first_gate, first_navigator) = browser.open_tab();
    let (second_gate, second_navigator) = browser.open_tab();
    browser.login(&first_gate);

    let first = first_gate.mount("/hrm/employees");
    let second = second_gate.mount("/admin/dashboard");
    assert_eq!(second.state(), GuardState::Valid);

    first.logout();
    first.logout();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(first_navigator.redirects(), vec!["/hrm/login".to_string()]);
    assert_eq!(
        second_navigator.redirects(),
        vec!["/admin/login".to_string()]
    );
    assert_eq!(second.state(), GuardState::LoggedOut);
}
