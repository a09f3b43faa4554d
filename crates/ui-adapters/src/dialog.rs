//! # Dialog handler
//!
//! Wraps a `<dialog>`: modal open/close, buttons dispatching on their
//! `data-action`, and closing when a click lands outside the dialog box.

use std::rc::{Rc, Weak};

use tracing::debug;

use crate::dom::{Element, ElementRef, EventKind, Tag};
use crate::error::ElementError;
use crate::handler::HandlerSlot;

/// Recognised `data-action` verbs of dialog buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogAction {
    Open,
    Close,
    Ok,
    Clear,
    /// Anything else; handled as a no-op
    Unknown,
}

impl DialogAction {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "dialog-open" => DialogAction::Open,
            "dialog-close" => DialogAction::Close,
            "dialog-ok" => DialogAction::Ok,
            "dialog-clear" => DialogAction::Clear,
            _ => DialogAction::Unknown,
        }
    }

    /// Reads the action of an element's `data-action` attribute.
    pub fn of(element: &Element) -> Self {
        element
            .data("action")
            .map_or(DialogAction::Unknown, |raw| Self::parse(&raw))
    }

    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            DialogAction::Open => Some("dialog-open"),
            DialogAction::Close => Some("dialog-close"),
            DialogAction::Ok => Some("dialog-ok"),
            DialogAction::Clear => Some("dialog-clear"),
            DialogAction::Unknown => None,
        }
    }
}

pub struct DialogHandler {
    dialog: ElementRef,
    on_ok: HandlerSlot<dyn Fn()>,
    on_clear: HandlerSlot<dyn Fn()>,
}

impl DialogHandler {
    pub fn new(dialog: Option<ElementRef>) -> Result<Rc<Self>, ElementError> {
        let dialog = dialog.ok_or_else(|| ElementError::not_found("dialog"))?;
        if dialog.tag() != Tag::Dialog {
            return Err(ElementError::WrongKind {
                expected: Tag::Dialog,
                found: dialog.tag(),
            });
        }

        let handler = Rc::new(Self {
            dialog: Rc::clone(&dialog),
            on_ok: HandlerSlot::new(),
            on_clear: HandlerSlot::new(),
        });

        // Button actions run on the button itself, before the click
        // reaches the dialog's outside-click check.
        for button in dialog.elements_by_tag(Tag::Button) {
            let weak: Weak<DialogHandler> = Rc::downgrade(&handler);
            let action = DialogAction::of(&button);
            button.add_event_listener(EventKind::Click, move |_| {
                if let Some(handler) = weak.upgrade() {
                    handler.handle_action(action);
                }
            });
        }

        let weak: Weak<DialogHandler> = Rc::downgrade(&handler);
        dialog.add_event_listener(EventKind::Click, move |event| {
            let (Some(handler), Some(point)) = (weak.upgrade(), event.pointer()) else {
                return;
            };
            let inside = handler
                .dialog
                .bounding_rect()
                .is_none_or(|rect| rect.contains(point));
            if !inside {
                debug!(x = point.x, y = point.y, "click outside dialog");
                handler.close();
            }
        });

        Ok(handler)
    }

    pub fn element(&self) -> &ElementRef {
        &self.dialog
    }

    pub fn show_modal(&self) {
        self.dialog.set_open(true);
        debug!(dialog = ?self.dialog.id(), "dialog opened");
    }

    pub fn close(&self) {
        self.dialog.set_open(false);
        debug!(dialog = ?self.dialog.id(), "dialog closed");
    }

    pub fn is_open(&self) -> bool {
        self.dialog.is_open()
    }

    /// Replaces the confirm handler.
    pub fn on_ok(&self, handler: impl Fn() + 'static) {
        self.on_ok.set(Rc::new(handler));
    }

    /// Replaces the clear handler.
    pub fn on_clear(&self, handler: impl Fn() + 'static) {
        self.on_clear.set(Rc::new(handler));
    }

    pub fn handle_action(&self, action: DialogAction) {
        match action {
            DialogAction::Open => self.show_modal(),
            DialogAction::Close => self.close(),
            DialogAction::Ok => {
                if let Some(handler) = self.on_ok.current() {
                    handler();
                }
            }
            DialogAction::Clear => {
                if let Some(handler) = self.on_clear.current() {
                    handler();
                }
            }
            DialogAction::Unknown => {}
        }
    }
}
