//! # Headless DOM
//!
//! A minimal single-threaded element tree with event listeners and
//! bubbling. It carries exactly the state the page controllers read and
//! write: ids, classes, `data-*` attributes, inline style, text, form
//! control values, dialog open state and a layout box.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use chrono::NaiveDate;
use domains::DATE_INPUT_FORMAT;

pub type ElementRef = Rc<Element>;
type Listener = Rc<dyn Fn(&Event)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Html,
    Body,
    Div,
    Header,
    Nav,
    Aside,
    Main,
    Section,
    Article,
    Button,
    Span,
    H1,
    H3,
    P,
    A,
    Label,
    Input,
    TextArea,
    Form,
    Dialog,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Html => "html",
            Tag::Body => "body",
            Tag::Div => "div",
            Tag::Header => "header",
            Tag::Nav => "nav",
            Tag::Aside => "aside",
            Tag::Main => "main",
            Tag::Section => "section",
            Tag::Article => "article",
            Tag::Button => "button",
            Tag::Span => "span",
            Tag::H1 => "h1",
            Tag::H3 => "h3",
            Tag::P => "p",
            Tag::A => "a",
            Tag::Label => "label",
            Tag::Input => "input",
            Tag::TextArea => "textarea",
            Tag::Form => "form",
            Tag::Dialog => "dialog",
        }
    }

    fn is_void(&self) -> bool {
        matches!(self, Tag::Input)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subtype of an `<input>` element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InputType {
    #[default]
    Text,
    Search,
    Date,
    Number,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Search => "search",
            InputType::Date => "date",
            InputType::Number => "number",
        }
    }

    /// Whether a non-empty raw value converts to the input's type.
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            InputType::Text | InputType::Search => true,
            InputType::Date => NaiveDate::parse_from_str(value, DATE_INPUT_FORMAT).is_ok(),
            InputType::Number => value.trim().parse::<f64>().is_ok(),
        }
    }

    /// Only text-like inputs honour the `pattern` attribute.
    pub fn supports_pattern(&self) -> bool {
        matches!(self, InputType::Text | InputType::Search)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding box in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Edges count as inside.
    pub fn contains(&self, p: Point) -> bool {
        self.top <= p.y
            && p.y <= self.top + self.height
            && self.left <= p.x
            && p.x <= self.left + self.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Input,
    Blur,
    Focus,
    Invalid,
    Submit,
}

impl EventKind {
    pub fn bubbles(&self) -> bool {
        matches!(self, EventKind::Click | EventKind::Input | EventKind::Submit)
    }
}

pub struct Event {
    kind: EventKind,
    target: ElementRef,
    current_target: RefCell<Option<ElementRef>>,
    pointer: Option<Point>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl Event {
    pub fn new(kind: EventKind, target: ElementRef) -> Self {
        Self {
            kind,
            target,
            current_target: RefCell::new(None),
            pointer: None,
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    /// Event carrying pointer coordinates, as produced by a real mouse click.
    pub fn with_pointer(mut self, point: Point) -> Self {
        self.pointer = Some(point);
        self
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn target(&self) -> &ElementRef {
        &self.target
    }

    /// The element whose listener is currently running.
    pub fn current_target(&self) -> Option<ElementRef> {
        self.current_target.borrow().clone()
    }

    pub fn pointer(&self) -> Option<Point> {
        self.pointer
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind)
            .field("target", &self.target)
            .field("pointer", &self.pointer)
            .finish()
    }
}

#[derive(Default)]
struct ElementState {
    id: Option<String>,
    classes: Vec<String>,
    dataset: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    text: String,
    name: Option<String>,
    input_type: Option<InputType>,
    required: bool,
    pattern: Option<String>,
    value: String,
    default_value: String,
    open: bool,
    no_validate: bool,
    rect: Option<Rect>,
}

pub struct Element {
    tag: Tag,
    state: RefCell<ElementState>,
    children: RefCell<Vec<ElementRef>>,
    parent: RefCell<Weak<Element>>,
    listeners: RefCell<Vec<(EventKind, Listener)>>,
}

impl Element {
    pub fn new(tag: Tag) -> ElementRef {
        let state = ElementState {
            input_type: (tag == Tag::Input).then_some(InputType::Text),
            ..ElementState::default()
        };
        Rc::new(Self {
            tag,
            state: RefCell::new(state),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
            listeners: RefCell::new(Vec::new()),
        })
    }

    pub fn with_id(self: Rc<Self>, id: &str) -> ElementRef {
        self.set_id(id);
        self
    }

    pub fn with_class(self: Rc<Self>, class: &str) -> ElementRef {
        self.add_class(class);
        self
    }

    pub fn with_data(self: Rc<Self>, key: &str, value: &str) -> ElementRef {
        self.set_data(key, value);
        self
    }

    pub fn with_text(self: Rc<Self>, text: &str) -> ElementRef {
        self.set_text(text);
        self
    }

    pub fn with_child(self: Rc<Self>, child: ElementRef) -> ElementRef {
        self.append_child(child);
        self
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn id(&self) -> Option<String> {
        self.state.borrow().id.clone()
    }

    pub fn set_id(&self, id: &str) {
        self.state.borrow_mut().id = Some(id.to_string());
    }

    pub fn classes(&self) -> Vec<String> {
        self.state.borrow().classes.clone()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.state.borrow().classes.iter().any(|c| c == class)
    }

    pub fn add_class(&self, class: &str) {
        if !self.has_class(class) {
            self.state.borrow_mut().classes.push(class.to_string());
        }
    }

    /// Reads `data-<key>`.
    pub fn data(&self, key: &str) -> Option<String> {
        self.state.borrow().dataset.get(key).cloned()
    }

    pub fn set_data(&self, key: &str, value: &str) {
        self.state
            .borrow_mut()
            .dataset
            .insert(key.to_string(), value.to_string());
    }

    pub fn style(&self, property: &str) -> Option<String> {
        self.state.borrow().style.get(property).cloned()
    }

    pub fn set_style(&self, property: &str, value: &str) {
        self.state
            .borrow_mut()
            .style
            .insert(property.to_string(), value.to_string());
    }

    /// Own text, excluding children.
    pub fn text(&self) -> String {
        self.state.borrow().text.clone()
    }

    pub fn set_text(&self, text: &str) {
        self.state.borrow_mut().text = text.to_string();
    }

    /// Own text followed by every descendant's text, in tree order.
    pub fn text_content(&self) -> String {
        let mut out = self.text();
        for child in self.children() {
            out.push_str(&child.text_content());
        }
        out
    }

    pub fn name(&self) -> Option<String> {
        self.state.borrow().name.clone()
    }

    pub fn set_name(&self, name: &str) {
        self.state.borrow_mut().name = Some(name.to_string());
    }

    /// `Some` only for `<input>` elements.
    pub fn input_type(&self) -> Option<InputType> {
        self.state.borrow().input_type
    }

    pub fn set_input_type(&self, input_type: InputType) {
        if self.tag == Tag::Input {
            self.state.borrow_mut().input_type = Some(input_type);
        }
    }

    pub fn required(&self) -> bool {
        self.state.borrow().required
    }

    pub fn set_required(&self, required: bool) {
        self.state.borrow_mut().required = required;
    }

    pub fn pattern(&self) -> Option<String> {
        self.state.borrow().pattern.clone()
    }

    pub fn set_pattern(&self, pattern: &str) {
        self.state.borrow_mut().pattern = Some(pattern.to_string());
    }

    pub fn value(&self) -> String {
        self.state.borrow().value.clone()
    }

    pub fn set_value(&self, value: &str) {
        self.state.borrow_mut().value = value.to_string();
    }

    /// Value restored by a form reset.
    pub fn default_value(&self) -> String {
        self.state.borrow().default_value.clone()
    }

    pub fn set_default_value(&self, value: &str) {
        let mut state = self.state.borrow_mut();
        state.default_value = value.to_string();
        state.value = value.to_string();
    }

    pub fn is_form_control(&self) -> bool {
        matches!(self.tag, Tag::Input | Tag::TextArea)
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().open
    }

    pub fn set_open(&self, open: bool) {
        self.state.borrow_mut().open = open;
    }

    pub fn no_validate(&self) -> bool {
        self.state.borrow().no_validate
    }

    pub fn set_no_validate(&self, no_validate: bool) {
        self.state.borrow_mut().no_validate = no_validate;
    }

    pub fn bounding_rect(&self) -> Option<Rect> {
        self.state.borrow().rect
    }

    pub fn set_bounding_rect(&self, rect: Rect) {
        self.state.borrow_mut().rect = Some(rect);
    }

    // ── Tree ────────────────────────────────────────────────────────────────

    pub fn append_child(self: &Rc<Self>, child: ElementRef) {
        if let Some(old_parent) = child.parent() {
            old_parent.remove_child(&child);
        }
        *child.parent.borrow_mut() = Rc::downgrade(self);
        self.children.borrow_mut().push(child);
    }

    pub fn remove_child(&self, child: &ElementRef) -> bool {
        let mut children = self.children.borrow_mut();
        match children.iter().position(|c| Rc::ptr_eq(c, child)) {
            Some(index) => {
                let removed = children.remove(index);
                *removed.parent.borrow_mut() = Weak::new();
                true
            }
            None => false,
        }
    }

    /// Detaches every child.
    pub fn clear_children(&self) {
        let removed = std::mem::take(&mut *self.children.borrow_mut());
        for child in removed {
            *child.parent.borrow_mut() = Weak::new();
        }
    }

    pub fn children(&self) -> Vec<ElementRef> {
        self.children.borrow().clone()
    }

    pub fn parent(&self) -> Option<ElementRef> {
        self.parent.borrow().upgrade()
    }

    pub fn next_element_sibling(self: &Rc<Self>) -> Option<ElementRef> {
        let parent = self.parent()?;
        let siblings = parent.children.borrow();
        let index = siblings.iter().position(|c| Rc::ptr_eq(c, self))?;
        siblings.get(index + 1).cloned()
    }

    /// Descendants in tree order, excluding `self`.
    pub fn descendants(&self) -> Vec<ElementRef> {
        let mut out = Vec::new();
        for child in self.children() {
            out.push(child.clone());
            out.extend(child.descendants());
        }
        out
    }

    pub fn find_by_id(self: &Rc<Self>, id: &str) -> Option<ElementRef> {
        if self.id().as_deref() == Some(id) {
            return Some(Rc::clone(self));
        }
        self.descendants()
            .into_iter()
            .find(|e| e.id().as_deref() == Some(id))
    }

    pub fn elements_by_tag(&self, tag: Tag) -> Vec<ElementRef> {
        self.descendants()
            .into_iter()
            .filter(|e| e.tag == tag)
            .collect()
    }

    pub fn elements_by_class(&self, class: &str) -> Vec<ElementRef> {
        self.descendants()
            .into_iter()
            .filter(|e| e.has_class(class))
            .collect()
    }

    // ── Events ──────────────────────────────────────────────────────────────

    pub fn add_event_listener(&self, kind: EventKind, listener: impl Fn(&Event) + 'static) {
        self.listeners.borrow_mut().push((kind, Rc::new(listener)));
    }

    /// Runs listeners on the target, then on each ancestor if the event
    /// bubbles. The propagation path is fixed before the first listener
    /// runs, so listeners may freely rebuild the tree.
    pub fn dispatch_event(self: &Rc<Self>, event: &Event) {
        let mut path = vec![Rc::clone(self)];
        if event.kind.bubbles() {
            let mut cursor = self.parent();
            while let Some(node) = cursor {
                cursor = node.parent();
                path.push(node);
            }
        }

        for node in path {
            let listeners: Vec<Listener> = node
                .listeners
                .borrow()
                .iter()
                .filter(|(kind, _)| *kind == event.kind)
                .map(|(_, l)| Rc::clone(l))
                .collect();
            *event.current_target.borrow_mut() = Some(Rc::clone(&node));
            for listener in listeners {
                listener(event);
            }
            if event.propagation_stopped.get() {
                break;
            }
        }
        *event.current_target.borrow_mut() = None;
    }

    /// Synthetic click without pointer coordinates.
    pub fn click(self: &Rc<Self>) {
        self.dispatch_event(&Event::new(EventKind::Click, Rc::clone(self)));
    }

    /// Click at viewport coordinates.
    pub fn click_at(self: &Rc<Self>, point: Point) {
        self.dispatch_event(&Event::new(EventKind::Click, Rc::clone(self)).with_pointer(point));
    }

    /// Replaces the value as a user would and fires `input`.
    pub fn type_value(self: &Rc<Self>, value: &str) {
        self.set_value(value);
        self.dispatch_event(&Event::new(EventKind::Input, Rc::clone(self)));
    }

    pub fn blur(self: &Rc<Self>) {
        self.dispatch_event(&Event::new(EventKind::Blur, Rc::clone(self)));
    }

    // ── Serialisation ───────────────────────────────────────────────────────

    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        let state = self.state.borrow();
        out.push('<');
        out.push_str(self.tag.as_str());

        let mut attr = |name: &str, value: &str| {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(value));
            out.push('"');
        };
        if let Some(id) = &state.id {
            attr("id", id);
        }
        if !state.classes.is_empty() {
            attr("class", &state.classes.join(" "));
        }
        if let Some(name) = &state.name {
            attr("name", name);
        }
        if let Some(input_type) = state.input_type {
            attr("type", input_type.as_str());
        }
        if let Some(pattern) = &state.pattern {
            attr("pattern", pattern);
        }
        if self.tag == Tag::Input && !state.value.is_empty() {
            attr("value", &state.value);
        }
        for (key, value) in &state.dataset {
            attr(&format!("data-{key}"), value);
        }
        if !state.style.is_empty() {
            let style: Vec<String> = state
                .style
                .iter()
                .map(|(k, v)| format!("{k}: {v};"))
                .collect();
            attr("style", &style.join(" "));
        }
        if state.required {
            out.push_str(" required");
        }
        if state.open {
            out.push_str(" open");
        }
        if state.no_validate {
            out.push_str(" novalidate");
        }
        out.push('>');

        if self.tag.is_void() {
            return;
        }

        let inner_text = if self.tag == Tag::TextArea {
            &state.value
        } else {
            &state.text
        };
        out.push_str(&html_escape::encode_text(inner_text));
        drop(state);

        for child in self.children() {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(self.tag.as_str());
        out.push('>');
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("id", &state.id)
            .field("classes", &state.classes)
            .finish()
    }
}

/// The page: an `<html>` root holding a `<body>`, plus window state.
#[derive(Clone)]
pub struct Document {
    root: ElementRef,
    body: ElementRef,
    viewport_width: Rc<Cell<u32>>,
    active: Rc<RefCell<Weak<Element>>>,
}

impl Document {
    pub fn new() -> Self {
        let body = Element::new(Tag::Body);
        let root = Element::new(Tag::Html).with_child(body.clone());
        Self {
            root,
            body,
            viewport_width: Rc::new(Cell::new(1280)),
            active: Rc::new(RefCell::new(Weak::new())),
        }
    }

    pub fn root(&self) -> &ElementRef {
        &self.root
    }

    pub fn body(&self) -> &ElementRef {
        &self.body
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<ElementRef> {
        self.root.find_by_id(id)
    }

    pub fn viewport_width(&self) -> u32 {
        self.viewport_width.get()
    }

    pub fn set_viewport_width(&self, width: u32) {
        self.viewport_width.set(width);
    }

    /// Moves focus, firing `blur` on the previously focused element.
    pub fn focus(&self, element: &ElementRef) {
        if let Some(previous) = self.active_element() {
            if Rc::ptr_eq(&previous, element) {
                return;
            }
            previous.blur();
        }
        *self.active.borrow_mut() = Rc::downgrade(element);
        element.dispatch_event(&Event::new(EventKind::Focus, Rc::clone(element)));
    }

    pub fn active_element(&self) -> Option<ElementRef> {
        self.active.borrow().upgrade()
    }

    /// Handle for listeners that live inside this document's own tree.
    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument {
            root: Rc::downgrade(&self.root),
            body: Rc::downgrade(&self.body),
            viewport_width: Rc::clone(&self.viewport_width),
            active: Rc::clone(&self.active),
        }
    }
}

/// Non-owning [`Document`] handle.
#[derive(Clone)]
pub struct WeakDocument {
    root: Weak<Element>,
    body: Weak<Element>,
    viewport_width: Rc<Cell<u32>>,
    active: Rc<RefCell<Weak<Element>>>,
}

impl WeakDocument {
    pub fn upgrade(&self) -> Option<Document> {
        Some(Document {
            root: self.root.upgrade()?,
            body: self.body.upgrade()?,
            viewport_width: Rc::clone(&self.viewport_width),
            active: Rc::clone(&self.active),
        })
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
