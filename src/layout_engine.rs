//! Master–stack geometry.
//!
//! The layout is a single vertical split: one master window on the left,
//! the remaining windows stacked top-to-bottom on the right. All
//! calculation is pure; the reactor decides which windows participate and
//! what to do with the rectangles.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::common::collections::HashMap;
use crate::common::config::{DEFAULT_MIN_MASTER_WIDTH, STACK_MIN};
use crate::model::window::{WindowId, WindowRecord};
use crate::sys::geometry::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Apps whose windows refuse to shrink below a known width. Giving the
/// master slot less than this makes the OS clamp the resize and the layout
/// oscillate.
static MIN_MASTER_WIDTHS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    let mut m = HashMap::default();
    m.insert("Xcode", 950.0);
    m.insert("Music", 600.0);
    m.insert("Spotify", 550.0);
    m.insert("Discord", 500.0);
    m.insert("System Settings", 600.0);
    m.insert("Brave Browser", 500.0);
    m.insert("Google Chrome", 500.0);
    m.insert("WhatsApp", 500.0);
    m.insert("Messages", 450.0);
    m
});

pub fn min_master_width(app_name: &str) -> f64 {
    MIN_MASTER_WIDTHS.get(app_name).copied().unwrap_or(DEFAULT_MIN_MASTER_WIDTH)
}

/// Compute target rectangles for `windows` within `bounds`.
///
/// `bounds` is the screen's usable rectangle already inset by the gap on
/// every side; `gap` is reapplied between cells. The first window is the
/// master. Returns one rectangle per window, in the same order.
pub fn master_stack(bounds: Rect, windows: &[&WindowRecord], gap: f64) -> Vec<(WindowId, Rect)> {
    match windows {
        [] => Vec::new(),
        [only] => vec![(only.id, bounds)],
        [master, stack @ ..] => {
            let desired_min = min_master_width(&master.app_name);
            let max_master = bounds.size.width - STACK_MIN - gap;
            let master_width = (bounds.size.width / 2.0).max(desired_min).min(max_master);

            let mut out = Vec::with_capacity(windows.len());
            out.push((
                master.id,
                Rect::new(bounds.origin.x, bounds.origin.y, master_width, bounds.size.height),
            ));

            let column_x = bounds.origin.x + master_width + gap;
            let column_width = bounds.size.width - master_width - gap;
            let n = stack.len() as f64;
            let cell_height = (bounds.size.height - gap * (n - 1.0)) / n;
            for (i, record) in stack.iter().enumerate() {
                let y = bounds.origin.y + i as f64 * (cell_height + gap);
                out.push((record.id, Rect::new(column_x, y, column_width, cell_height)));
            }
            out
        }
    }
}
