//! # Sidebar handler
//!
//! Opens, closes and toggles the app sidebar. Buttons inside the sidebar
//! dispatch on their `data-action`; clicking the overlay closes it.

use std::fmt;
use std::rc::{Rc, Weak};

use configs::SidebarConfig;
use tracing::{debug, warn};

use crate::dom::{Document, Element, ElementRef, Event, EventKind, Tag};
use crate::error::ElementError;

pub const SIDEBAR_OVERLAY_ID: &str = "sidebar-overlay";
const FULL_WIDTH: &str = "100%";

/// Value of the sidebar's `data-state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarState {
    Open,
    Closed,
}

impl SidebarState {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "open" => Some(SidebarState::Open),
            "closed" => Some(SidebarState::Closed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SidebarState::Open => "open",
            SidebarState::Closed => "closed",
        }
    }
}

/// Recognised `data-action` verbs of sidebar buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarAction {
    Open,
    Close,
    Toggle,
    Unknown,
}

impl SidebarAction {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "open-sidebar" => SidebarAction::Open,
            "close-sidebar" => SidebarAction::Close,
            "toggle-sidebar" => SidebarAction::Toggle,
            _ => SidebarAction::Unknown,
        }
    }

    pub fn of(element: &Element) -> Self {
        element
            .data("action")
            .map_or(SidebarAction::Unknown, |raw| Self::parse(&raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarOptions {
    pub expand_body: bool,
    pub width: String,
    pub should_focus: bool,
    pub min_width_to_full_screen: Option<u32>,
}

impl Default for SidebarOptions {
    fn default() -> Self {
        Self {
            expand_body: false,
            width: "250px".to_string(),
            should_focus: false,
            min_width_to_full_screen: None,
        }
    }
}

impl From<&SidebarConfig> for SidebarOptions {
    fn from(config: &SidebarConfig) -> Self {
        Self {
            expand_body: config.expand_body,
            width: config.width.clone(),
            should_focus: config.should_focus,
            min_width_to_full_screen: config.min_width_to_full_screen,
        }
    }
}

/// An entry appended to the sidebar's navigation.
pub struct NavItem {
    pub label: String,
    pub on_click: Rc<dyn Fn(&Event)>,
}

impl NavItem {
    pub fn new(label: &str, on_click: impl Fn(&Event) + 'static) -> Self {
        Self {
            label: label.to_string(),
            on_click: Rc::new(on_click),
        }
    }
}

impl fmt::Debug for NavItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavItem").field("label", &self.label).finish()
    }
}

pub struct SidebarHandler {
    sidebar: ElementRef,
    document: Document,
    overlay: Option<ElementRef>,
    options: SidebarOptions,
}

impl SidebarHandler {
    pub fn new(
        document: &Document,
        sidebar: Option<ElementRef>,
        options: SidebarOptions,
    ) -> Result<Rc<Self>, ElementError> {
        let sidebar = sidebar.ok_or_else(|| ElementError::not_found("sidebar"))?;
        let overlay = document.get_element_by_id(SIDEBAR_OVERLAY_ID);

        let handler = Rc::new(Self {
            sidebar: Rc::clone(&sidebar),
            document: document.clone(),
            overlay: overlay.clone(),
            options,
        });

        for button in sidebar.elements_by_tag(Tag::Button) {
            let weak: Weak<SidebarHandler> = Rc::downgrade(&handler);
            button.add_event_listener(EventKind::Click, move |event| {
                let action = event
                    .current_target()
                    .map_or(SidebarAction::Unknown, |target| SidebarAction::of(&target));
                if let Some(handler) = weak.upgrade() {
                    handler.handle_action(action);
                }
            });
        }

        if let Some(overlay) = overlay {
            let weak: Weak<SidebarHandler> = Rc::downgrade(&handler);
            overlay.add_event_listener(EventKind::Click, move |_| {
                if let Some(handler) = weak.upgrade() {
                    handler.close();
                }
            });
        }

        Ok(handler)
    }

    pub fn element(&self) -> &ElementRef {
        &self.sidebar
    }

    /// `None` until the sidebar is first opened or closed.
    pub fn state(&self) -> Option<SidebarState> {
        self.sidebar
            .data("state")
            .and_then(|raw| SidebarState::parse(&raw))
    }

    pub fn is_open(&self) -> bool {
        self.state() == Some(SidebarState::Open)
    }

    pub fn open(&self) {
        let full_screen = self
            .options
            .min_width_to_full_screen
            .is_some_and(|min| self.document.viewport_width() <= min);
        let width = if full_screen {
            FULL_WIDTH
        } else {
            self.options.width.as_str()
        };

        self.sidebar.set_style("width", width);
        self.sidebar.set_data("state", SidebarState::Open.as_str());
        if self.options.should_focus {
            self.set_overlay_display("initial");
        }
        if self.options.expand_body && width != FULL_WIDTH {
            self.document.body().set_style("padding-left", width);
        }
        debug!(width, "sidebar opened");
    }

    pub fn close(&self) {
        self.sidebar.set_style("width", "0px");
        self.sidebar.set_data("state", SidebarState::Closed.as_str());
        if self.options.should_focus {
            self.set_overlay_display("none");
        }
        if self.options.expand_body {
            self.document.body().set_style("padding-left", "0px");
        }
        debug!("sidebar closed");
    }

    /// Opens unless currently open.
    pub fn toggle(&self) {
        match self.state() {
            Some(SidebarState::Open) => self.close(),
            Some(SidebarState::Closed) | None => self.open(),
        }
    }

    pub fn handle_action(&self, action: SidebarAction) {
        match action {
            SidebarAction::Open => self.open(),
            SidebarAction::Close => self.close(),
            SidebarAction::Toggle => self.toggle(),
            SidebarAction::Unknown => {}
        }
    }

    /// Appends one link per item to the first `<nav>` of the sidebar.
    /// Returns `false` when the sidebar has no `<nav>`.
    pub fn set_nav_items(&self, items: Vec<NavItem>) -> bool {
        let Some(nav) = self.sidebar.elements_by_tag(Tag::Nav).into_iter().next() else {
            warn!("sidebar has no nav to hold items");
            return false;
        };

        for item in items {
            let anchor = Element::new(Tag::A).with_text(&item.label);
            let on_click = Rc::clone(&item.on_click);
            anchor.add_event_listener(EventKind::Click, move |event| on_click(event));
            nav.append_child(anchor);
        }
        true
    }

    fn set_overlay_display(&self, display: &str) {
        if let Some(overlay) = &self.overlay {
            overlay.set_style("display", display);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Page {
        doc: Document,
        sidebar: ElementRef,
        overlay: ElementRef,
        close_button: ElementRef,
    }

    fn page() -> Page {
        let doc = Document::new();
        let close_button = Element::new(Tag::Button).with_data("action", "close-sidebar");
        let sidebar = Element::new(Tag::Aside)
            .with_id("home-sidebar")
            .with_child(close_button.clone())
            .with_child(Element::new(Tag::Nav));
        let overlay = Element::new(Tag::Div).with_id(SIDEBAR_OVERLAY_ID);
        doc.body().append_child(sidebar.clone());
        doc.body().append_child(overlay.clone());
        Page {
            doc,
            sidebar,
            overlay,
            close_button,
        }
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!(SidebarAction::parse("toggle-sidebar"), SidebarAction::Toggle);
        assert_eq!(SidebarAction::parse("toggle"), SidebarAction::Unknown);
        assert_eq!(SidebarState::parse("open"), Some(SidebarState::Open));
    }

    #[test]
    fn test_missing_sidebar_is_an_error() {
        let doc = Document::new();
        assert!(matches!(
            SidebarHandler::new(&doc, None, SidebarOptions::default()),
            Err(ElementError::NotFound(_))
        ));
    }

    #[test]
    fn test_toggle_from_unknown_state_opens() {
        let p = page();
        let handler = SidebarHandler::new(
            &p.doc,
            Some(p.sidebar.clone()),
            SidebarOptions::default(),
        )
        .unwrap();
        assert_eq!(handler.state(), None);

        handler.toggle();
        assert!(handler.is_open());
        assert_eq!(p.sidebar.style("width").as_deref(), Some("250px"));

        handler.toggle();
        assert_eq!(handler.state(), Some(SidebarState::Closed));
        assert_eq!(p.sidebar.style("width").as_deref(), Some("0px"));
    }

    #[test]
    fn test_focus_overlay_and_body_padding() {
        let p = page();
        let options = SidebarOptions {
            expand_body: true,
            should_focus: true,
            width: "300px".into(),
            ..SidebarOptions::default()
        };
        let handler = SidebarHandler::new(&p.doc, Some(p.sidebar.clone()), options).unwrap();

        handler.open();
        assert_eq!(p.overlay.style("display").as_deref(), Some("initial"));
        assert_eq!(p.doc.body().style("padding-left").as_deref(), Some("300px"));

        p.overlay.click();
        assert!(!handler.is_open());
        assert_eq!(p.overlay.style("display").as_deref(), Some("none"));
        assert_eq!(p.doc.body().style("padding-left").as_deref(), Some("0px"));
    }

    #[test]
    fn test_narrow_viewport_opens_full_screen_without_padding() {
        let p = page();
        p.doc.set_viewport_width(320);
        let options = SidebarOptions {
            expand_body: true,
            min_width_to_full_screen: Some(360),
            ..SidebarOptions::default()
        };
        let handler = SidebarHandler::new(&p.doc, Some(p.sidebar.clone()), options).unwrap();

        handler.open();
        assert_eq!(p.sidebar.style("width").as_deref(), Some("100%"));
        assert_eq!(p.doc.body().style("padding-left"), None);
    }

    #[test]
    fn test_close_button_and_nav_items() {
        let p = page();
        let handler = SidebarHandler::new(
            &p.doc,
            Some(p.sidebar.clone()),
            SidebarOptions::default(),
        )
        .unwrap();
        let clicks = Rc::new(Cell::new(0));
        let c = clicks.clone();

        let item = NavItem::new("New post", move |_| c.set(c.get() + 1));
        assert!(handler.set_nav_items(vec![item]));
        let links = p.sidebar.elements_by_tag(Tag::A);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].text(), "New post");
        links[0].click();
        assert_eq!(clicks.get(), 1);

        handler.open();
        p.close_button.click();
        assert_eq!(handler.state(), Some(SidebarState::Closed));
    }

    #[test]
    fn test_nav_items_need_a_nav() {
        let doc = Document::new();
        let handler = SidebarHandler::new(
            &doc,
            Some(Element::new(Tag::Aside)),
            SidebarOptions::default(),
        )
        .unwrap();
        assert!(!handler.set_nav_items(vec![NavItem::new("x", |_| {})]));
    }
}
