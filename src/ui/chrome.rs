/// Viewport widths below this (in CSS pixels) use the overlay sidebar.
pub const MOBILE_BREAKPOINT_PX: u32 = 1024;

/// Navigation chrome. `sidebar_open` only matters in mobile (overlay) mode and
/// `sidebar_collapsed` only in desktop (pinned) mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChromeState {
    pub sidebar_open: bool,
    pub sidebar_collapsed: bool,
    pub is_mobile: bool,
    pub global_loading: bool,
    pub dark_mode: bool,
}

impl ChromeState {
    /// Flips whichever sidebar toggle is operative for the current viewport.
    pub fn toggle_sidebar(&mut self) {
        if self.is_mobile {
            self.sidebar_open = !self.sidebar_open;
        } else {
            self.sidebar_collapsed = !self.sidebar_collapsed;
        }
    }
}

#[must_use]
pub fn is_mobile_width(width_px: u32) -> bool {
    width_px < MOBILE_BREAKPOINT_PX
}
