//! Scroll depth milestones

use std::collections::BTreeSet;

/// Percentages that emit a `scroll_depth` event the first time they are reached
pub const SCROLL_MILESTONES: [u8; 4] = [25, 50, 75, 100];

/// How far down the page the viewport is, 0-100
///
/// A page that fits entirely in the viewport counts as fully scrolled.
pub fn scroll_percent(scroll_top: u32, scroll_height: u32, client_height: u32) -> u8 {
    let scrollable = i64::from(scroll_height) - i64::from(client_height);
    if scrollable <= 0 {
        return 100;
    }
    let pct = (f64::from(scroll_top) / scrollable as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Remembers which milestones have already fired for one page view
#[derive(Debug, Clone, Default)]
pub struct ScrollDepthTracker {
    seen: BTreeSet<u8>,
}

impl ScrollDepthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a scroll position, returning milestones reached for the first time
    pub fn observe(&mut self, percent: u8) -> Vec<u8> {
        SCROLL_MILESTONES
            .iter()
            .copied()
            .filter(|m| percent >= *m && self.seen.insert(*m))
            .collect()
    }

    pub fn reached(&self) -> impl Iterator<Item = u8> + '_ {
        self.seen.iter().copied()
    }
}
