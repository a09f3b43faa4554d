use std::rc::Rc;

use crate::dom::{ElementRef, Event, EventKind};
use crate::error::ElementError;
use crate::handler::HandlerSlot;

pub const HEADER_BUTTON_CLASS: &str = "button";

/// Forwards clicks on the header's `.button` elements to one handler.
pub struct HeaderHandler {
    header: ElementRef,
    on_button_click: HandlerSlot<dyn Fn(&Event)>,
}

impl HeaderHandler {
    pub fn new(header: Option<ElementRef>) -> Result<Rc<Self>, ElementError> {
        let header = header.ok_or_else(|| ElementError::not_found("header"))?;
        let on_button_click: HandlerSlot<dyn Fn(&Event)> = HandlerSlot::new();

        for button in header.elements_by_class(HEADER_BUTTON_CLASS) {
            let slot = on_button_click.clone();
            button.add_event_listener(EventKind::Click, move |event| {
                if let Some(handler) = slot.current() {
                    handler(event);
                }
            });
        }

        Ok(Rc::new(Self {
            header,
            on_button_click,
        }))
    }

    pub fn element(&self) -> &ElementRef {
        &self.header
    }

    /// Replaces the click handler. `event.current_target()` is the button.
    pub fn on_button_click(&self, handler: impl Fn(&Event) + 'static) {
        self.on_button_click.set(Rc::new(handler));
    }
}
