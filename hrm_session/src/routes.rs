use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Front-end modules sharing the session guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppModule {
    /// Personal data, appointments and employment records
    Hrm,
    /// Administrative service pages
    Administrative,
    /// Employee self-service requests (leave, overtime, pass slips, ...)
    SelfService,
}

impl AppModule {
    pub const ALL: [AppModule; 3] = [
        AppModule::Hrm,
        AppModule::Administrative,
        AppModule::SelfService,
    ];

    /// Query and JSON name of the module, as produced by serde
    pub fn key(self) -> &'static str {
        match self {
            AppModule::Hrm => "hrm",
            AppModule::Administrative => "administrative",
            AppModule::SelfService => "self_service",
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            AppModule::Hrm => "/hrm",
            AppModule::Administrative => "/admin",
            AppModule::SelfService => "/employee",
        }
    }

    pub fn login_route(self) -> &'static str {
        match self {
            AppModule::Hrm => "/hrm/login",
            AppModule::Administrative => "/admin/login",
            AppModule::SelfService => "/employee/login",
        }
    }

    pub fn register_route(self) -> &'static str {
        match self {
            AppModule::Hrm => "/hrm/register",
            AppModule::Administrative => "/admin/register",
            AppModule::SelfService => "/employee/register",
        }
    }

    /// Resolve the module owning `route`.
    ///
    /// Routes outside every module prefix belong to [`AppModule::Hrm`], whose
    /// login page is the default landing point after a logout.
    pub fn for_route(route: &str) -> Self {
        let path = normalize_route(route);
        Self::ALL
            .into_iter()
            .find(|module| {
                let prefix = module.prefix();
                path == prefix
                    || path
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .unwrap_or(AppModule::Hrm)
    }
}

/// Routes reachable without a logged-in session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicPageSet {
    routes: BTreeSet<String>,
}

impl Default for PublicPageSet {
    fn default() -> Self {
        let routes = AppModule::ALL
            .into_iter()
            .flat_map(|module| [module.login_route(), module.register_route()])
            .map(str::to_string)
            .collect();
        Self { routes }
    }
}

impl PublicPageSet {
    pub fn empty() -> Self {
        Self {
            routes: BTreeSet::new(),
        }
    }

    pub fn with_route(mut self, route: &str) -> Self {
        self.routes.insert(normalize_route(route).to_string());
        self
    }

    pub fn contains(&self, route: &str) -> bool {
        self.routes.contains(normalize_route(route))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(String::as_str)
    }
}

/// Drop query string, fragment and trailing slash so `/hrm/login/?next=x`
/// and `/hrm/login` compare equal.
fn normalize_route(route: &str) -> &str {
    let end = route.find(['?', '#']).unwrap_or(route.len());
    let path = &route[..end];
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}
