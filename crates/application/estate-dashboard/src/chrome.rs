//! Sidebar, navbar and loading overlay

use crate::group::ExclusiveGroup;
use crate::router::ViewName;
use estate_core::Result;

/// Default mobile breakpoint in CSS pixels
pub const MOBILE_BREAKPOINT: u32 = 800;

/// The four mutually exclusive sidebar layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    DesktopCollapsed,
    DesktopExpanded,
    MobileClosed,
    MobileOpened,
}

impl Presentation {
    pub fn css_class(&self) -> &'static str {
        match self {
            Presentation::DesktopCollapsed => "sidebar desktop-collapsed",
            Presentation::DesktopExpanded => "sidebar desktop-expanded",
            Presentation::MobileClosed => "sidebar mobile-closed",
            Presentation::MobileOpened => "sidebar mobile-opened",
        }
    }

    /// Title and nav labels are shown
    pub fn shows_labels(&self) -> bool {
        matches!(
            self,
            Presentation::DesktopExpanded | Presentation::MobileOpened
        )
    }
}

/// Signal consumed by the view router
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewChanged(pub ViewName);

/// Collapsible sidebar holding the view nav
#[derive(Debug, Clone)]
pub struct Sidebar {
    breakpoint: u32,
    width: u32,
    collapsed: bool,
    nav: ExclusiveGroup<ViewName>,
}

impl Sidebar {
    /// Seed the layout from the current viewport width
    pub fn new(width: u32, breakpoint: u32) -> Self {
        let mut sidebar = Self {
            breakpoint,
            width,
            collapsed: false,
            nav: ExclusiveGroup::new(ViewName::ALL),
        };
        sidebar.resize(width);
        sidebar
    }

    pub fn is_mobile(&self) -> bool {
        self.width < self.breakpoint
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Flip between collapsed and expanded at the given viewport width
    pub fn toggle(&mut self, width: u32) -> Presentation {
        self.width = width;
        self.collapsed = !self.collapsed;
        self.presentation()
    }

    /// Re-evaluate the viewport and force its default layout.
    ///
    /// Mobile always closes and desktop always expands, discarding any
    /// manual toggle.
    pub fn resize(&mut self, width: u32) -> Presentation {
        self.width = width;
        self.collapsed = self.is_mobile();
        self.presentation()
    }

    pub fn presentation(&self) -> Presentation {
        match (self.is_mobile(), self.collapsed) {
            (false, true) => Presentation::DesktopCollapsed,
            (false, false) => Presentation::DesktopExpanded,
            (true, true) => Presentation::MobileClosed,
            (true, false) => Presentation::MobileOpened,
        }
    }

    pub fn nav(&self) -> &ExclusiveGroup<ViewName> {
        &self.nav
    }

    /// Mark `view` active in the nav and emit the view-changed signal
    pub fn select_view(&mut self, view: ViewName) -> Result<ViewChanged> {
        self.nav.select(view, |v| Ok(ViewChanged(v)))
    }
}

/// Busy indicator shown while a prediction is in flight
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadingOverlay {
    visible: bool,
}

impl LoadingOverlay {
    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_from_width() {
        assert_eq!(
            Sidebar::new(1280, MOBILE_BREAKPOINT).presentation(),
            Presentation::DesktopExpanded
        );
        assert_eq!(
            Sidebar::new(799, MOBILE_BREAKPOINT).presentation(),
            Presentation::MobileClosed
        );
        assert_eq!(
            Sidebar::new(800, MOBILE_BREAKPOINT).presentation(),
            Presentation::DesktopExpanded
        );
    }

    #[test]
    fn test_toggle_desktop() {
        let mut sidebar = Sidebar::new(1024, MOBILE_BREAKPOINT);
        assert_eq!(sidebar.toggle(1024), Presentation::DesktopCollapsed);
        assert_eq!(sidebar.toggle(1024), Presentation::DesktopExpanded);
    }

    #[test]
    fn test_toggle_mobile() {
        let mut sidebar = Sidebar::new(400, MOBILE_BREAKPOINT);
        assert_eq!(sidebar.toggle(400), Presentation::MobileOpened);
        assert_eq!(sidebar.toggle(400), Presentation::MobileClosed);
    }

    #[test]
    fn test_resize_overrides_manual_toggle() {
        let mut sidebar = Sidebar::new(1024, MOBILE_BREAKPOINT);
        sidebar.toggle(1024);
        assert_eq!(sidebar.presentation(), Presentation::DesktopCollapsed);
        assert_eq!(sidebar.resize(1100), Presentation::DesktopExpanded);

        sidebar.toggle(1100);
        assert_eq!(sidebar.resize(500), Presentation::MobileClosed);
        sidebar.toggle(500);
        assert_eq!(sidebar.resize(600), Presentation::MobileClosed);
    }

    #[test]
    fn test_labels_follow_presentation() {
        assert!(Presentation::DesktopExpanded.shows_labels());
        assert!(Presentation::MobileOpened.shows_labels());
        assert!(!Presentation::DesktopCollapsed.shows_labels());
        assert!(!Presentation::MobileClosed.shows_labels());
    }

    #[test]
    fn test_select_view_signal() {
        let mut sidebar = Sidebar::new(1024, MOBILE_BREAKPOINT);
        assert_eq!(sidebar.nav().active(), None);
        let signal = sidebar.select_view(ViewName::Prediction).unwrap();
        assert_eq!(signal, ViewChanged(ViewName::Prediction));
        assert!(sidebar.nav().is_active(ViewName::Prediction));
        assert!(!sidebar.nav().is_active(ViewName::Analysis));
    }

    #[test]
    fn test_loading_overlay() {
        let mut overlay = LoadingOverlay::default();
        assert!(!overlay.is_visible());
        overlay.show();
        assert!(overlay.is_visible());
        overlay.hide();
        assert!(!overlay.is_visible());
    }
}
