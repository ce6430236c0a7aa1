mod cross_tab;
mod gate;
mod monitor;
mod navigator;

pub use cross_tab::{CrossTabNotifier, signals_logout};
pub use gate::{GateView, MountedGate, PLACEHOLDER_HTML, RouteGate};
pub use monitor::{
    ActivityKind, ActivityMonitor, GuardState, LogoutReason, Observation, Trigger, Verdict, decide,
};
pub use navigator::{Navigator, RecordingNavigator};
