use std::cell::RefCell;
use std::rc::Rc;

/// A single replaceable callback: setting a handler drops the previous one.
///
/// Clones share the same slot, so listeners captured at construction time
/// always see the most recently set handler.
pub struct HandlerSlot<F: ?Sized> {
    slot: Rc<RefCell<Option<Rc<F>>>>,
}

impl<F: ?Sized> HandlerSlot<F> {
    pub fn new() -> Self {
        Self {
            slot: Rc::new(RefCell::new(None)),
        }
    }

    pub fn set(&self, handler: Rc<F>) {
        *self.slot.borrow_mut() = Some(handler);
    }

    pub fn clear(&self) -> Option<Rc<F>> {
        self.slot.borrow_mut().take()
    }

    /// The active handler. The slot is not borrowed while it runs, so a
    /// handler may replace itself.
    pub fn current(&self) -> Option<Rc<F>> {
        self.slot.borrow().clone()
    }

    pub fn is_set(&self) -> bool {
        self.slot.borrow().is_some()
    }
}

impl<F: ?Sized> Clone for HandlerSlot<F> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<F: ?Sized> Default for HandlerSlot<F> {
    fn default() -> Self {
        Self::new()
    }
}
