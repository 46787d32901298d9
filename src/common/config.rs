//! Runtime settings.
//!
//! There is deliberately no configuration file: everything is compiled-in
//! defaults, with a handful of command-line overrides applied at startup.

use std::time::Duration;

/// Outer and inter-window gap, in points.
pub const GAP: f64 = 12.0;

/// How long a managed window may be absent from discovery snapshots before
/// it is evicted.
pub const ZOMBIE_TTL: Duration = Duration::from_secs(2);

/// Minimum width of the stack column.
pub const STACK_MIN: f64 = 400.0;

/// Master width floor for applications without a specific entry.
pub const DEFAULT_MIN_MASTER_WIDTH: f64 = 400.0;

/// Interval between periodic discovery scans.
pub const DISCOVERY_PERIOD: Duration = Duration::from_millis(1500);

/// Number of forced-visibility scans after a space transition.
pub const BURST_COUNT: u32 = 7;

/// Spacing between burst scans.
pub const BURST_INTERVAL: Duration = Duration::from_millis(200);

/// Layout deferral when a snapshot introduces a new window, giving the
/// window time to publish an initial frame.
pub const NEW_WINDOW_SETTLE: Duration = Duration::from_millis(50);

/// Coalescing window for externally triggered layouts.
pub const APPLY_LAYOUT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Delay between a left-button release and the layout pass it triggers.
pub const MOUSE_UP_DELAY: Duration = Duration::from_millis(200);

/// Per-component threshold below which a freshly computed target is
/// considered identical to the cached one.
pub const MOVEMENT_DEAD_ZONE: f64 = 1.0;

/// Chebyshev distance below which the animator writes the target directly
/// instead of interpolating.
pub const ANIMATION_DEAD_ZONE: f64 = 2.0;

/// How long animations are replaced by direct writes after a space switch.
pub const SPACE_SWITCH_SUPPRESSION: Duration = Duration::from_millis(800);

/// Apps whose compositor visibility reports lag during space transitions.
pub const BROWSER_WHITELIST: &[&str] = &[
    "Brave Browser",
    "Google Chrome",
    "Arc",
    "Safari",
    "Firefox",
    "Microsoft Edge",
];

#[derive(Debug, Clone)]
pub struct Settings {
    pub gap: f64,
    pub discovery_period: Duration,
    pub animate: bool,
    pub animation_duration: Duration,
    pub ease_exponent: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            gap: GAP,
            discovery_period: DISCOVERY_PERIOD,
            animate: true,
            animation_duration: Duration::from_millis(180),
            ease_exponent: 5,
        }
    }
}
