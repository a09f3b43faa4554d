//! # Form handler
//!
//! Builds form fields from declarative descriptors (or binds existing
//! markup), validates them on `input`, `invalid` and `blur`, and hands the
//! collected values to a single submit handler.
//!
//! Native validation UI is disabled on the form (`novalidate`); every field
//! shows its message in the `p.field-error` element that follows it.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use domains::FormData;
use regex::Regex;
use tracing::{debug, warn};

use crate::dom::{Element, ElementRef, Event, EventKind, InputType, Tag};
use crate::error::ElementError;
use crate::handler::HandlerSlot;

pub const FIELD_ERROR_CLASS: &str = "field-error";

/// Kind of control a descriptor produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldElement {
    Input(InputType),
    TextArea,
}

/// Immutable description of one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub element: FieldElement,
    /// Key of the field in submitted data
    pub name: String,
    pub id: Option<String>,
    pub required: bool,
    /// Anchored regular expression the whole value must match
    pub pattern: Option<String>,
    pub label: String,
    pub class_list: Vec<String>,
    pub default_value: String,
}

impl FieldDescriptor {
    pub fn input(name: &str, input_type: InputType, label: &str) -> Self {
        Self::with_element(FieldElement::Input(input_type), name, label)
    }

    pub fn textarea(name: &str, label: &str) -> Self {
        Self::with_element(FieldElement::TextArea, name, label)
    }

    fn with_element(element: FieldElement, name: &str, label: &str) -> Self {
        Self {
            element,
            name: name.to_string(),
            id: None,
            required: false,
            pattern: None,
            label: label.to_string(),
            class_list: Vec::new(),
            default_value: String::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.class_list.push(class.to_string());
        self
    }

    pub fn default_value(mut self, value: &str) -> Self {
        self.default_value = value.to_string();
        self
    }

    /// Reconstructs a descriptor from an existing control.
    fn from_element(control: &Element) -> Self {
        let element = match control.input_type() {
            Some(input_type) => FieldElement::Input(input_type),
            None => FieldElement::TextArea,
        };
        let label = control
            .parent()
            .filter(|p| p.tag() == Tag::Label)
            .map(|p| p.text().trim().to_string())
            .unwrap_or_default();

        Self {
            element,
            name: control.name().unwrap_or_default(),
            id: control.id(),
            required: control.required(),
            pattern: control.pattern(),
            label,
            class_list: control.classes(),
            default_value: control.default_value(),
        }
    }

    fn build_control(&self) -> ElementRef {
        let control = match self.element {
            FieldElement::Input(input_type) => {
                let input = Element::new(Tag::Input);
                input.set_input_type(input_type);
                input
            }
            FieldElement::TextArea => Element::new(Tag::TextArea),
        };

        control.set_name(&self.name);
        if let Some(id) = &self.id {
            control.set_id(id);
        }
        for class in &self.class_list {
            control.add_class(class);
        }
        control.set_required(self.required);
        if let Some(pattern) = &self.pattern {
            control.set_pattern(pattern);
        }
        control.set_default_value(&self.default_value);
        control
    }
}

/// Message shown for a failing field, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMessage {
    Required,
    BadInput,
    WrongFormat,
}

impl ValidationMessage {
    pub fn text(&self) -> &'static str {
        match self {
            ValidationMessage::Required => "Field required",
            ValidationMessage::BadInput => "Bad input",
            ValidationMessage::WrongFormat => "Wrong format",
        }
    }
}

impl fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Constraint flags of a field's current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Validity {
    pub value_missing: bool,
    pub bad_input: bool,
    pub pattern_mismatch: bool,
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        !(self.value_missing || self.bad_input || self.pattern_mismatch)
    }

    /// The single message to display, honouring precedence.
    pub fn message(&self) -> Option<ValidationMessage> {
        if self.value_missing {
            Some(ValidationMessage::Required)
        } else if self.bad_input {
            Some(ValidationMessage::BadInput)
        } else if self.pattern_mismatch {
            Some(ValidationMessage::WrongFormat)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldState {
    /// Not yet validated since render or reset
    #[default]
    Pristine,
    Valid,
    Invalid(ValidationMessage),
}

/// A descriptor paired with its live control and error surface.
pub struct RenderedField {
    descriptor: FieldDescriptor,
    control: ElementRef,
    error: Option<ElementRef>,
    pattern: Option<Regex>,
    state: RefCell<FieldState>,
}

impl RenderedField {
    fn new(
        descriptor: FieldDescriptor,
        control: ElementRef,
        error: Option<ElementRef>,
    ) -> Rc<Self> {
        let pattern = descriptor.pattern.as_deref().and_then(|p| {
            Regex::new(&format!("^(?:{p})$"))
                .inspect_err(|e| {
                    warn!(field = %descriptor.name, error = %e, "ignoring invalid pattern")
                })
                .ok()
        });

        let field = Rc::new(Self {
            descriptor,
            control,
            error,
            pattern,
            state: RefCell::new(FieldState::Pristine),
        });

        for kind in [EventKind::Input, EventKind::Invalid, EventKind::Blur] {
            let weak: Weak<RenderedField> = Rc::downgrade(&field);
            field.control.add_event_listener(kind, move |_| {
                if let Some(field) = weak.upgrade() {
                    field.validate();
                }
            });
        }
        field
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    pub fn control(&self) -> &ElementRef {
        &self.control
    }

    pub fn error_element(&self) -> Option<&ElementRef> {
        self.error.as_ref()
    }

    pub fn value(&self) -> String {
        self.control.value()
    }

    pub fn state(&self) -> FieldState {
        *self.state.borrow()
    }

    /// Text currently shown under the field.
    pub fn error_text(&self) -> String {
        self.error.as_ref().map(|e| e.text()).unwrap_or_default()
    }

    pub fn validity(&self) -> Validity {
        let value = self.control.value();
        if value.is_empty() {
            return Validity {
                value_missing: self.control.required(),
                ..Validity::default()
            };
        }

        let input_type = self.control.input_type();
        let bad_input = input_type.is_some_and(|t| !t.accepts(&value));
        let pattern_mismatch = input_type.is_some_and(|t| t.supports_pattern())
            && self.pattern.as_ref().is_some_and(|re| !re.is_match(&value));

        Validity {
            value_missing: false,
            bad_input,
            pattern_mismatch,
        }
    }

    /// Recomputes the state and refreshes the error text.
    pub fn validate(&self) -> FieldState {
        let state = match self.validity().message() {
            Some(message) => FieldState::Invalid(message),
            None => FieldState::Valid,
        };
        if let Some(error) = &self.error {
            error.set_text(match state {
                FieldState::Invalid(message) => message.text(),
                _ => "",
            });
        }
        *self.state.borrow_mut() = state;
        state
    }

    fn reset(&self) {
        self.control.set_value(&self.control.default_value());
        if let Some(error) = &self.error {
            error.set_text("");
        }
        *self.state.borrow_mut() = FieldState::Pristine;
    }
}

impl fmt::Debug for RenderedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderedField")
            .field("name", &self.descriptor.name)
            .field("state", &self.state())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormOptions {
    /// Stop the native navigation a submit would cause
    pub prevent_default: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            prevent_default: true,
        }
    }
}

pub type SubmitHandler = dyn Fn(&FormData);

pub struct FormHandler {
    form: ElementRef,
    fields: Rc<Vec<Rc<RenderedField>>>,
    on_submit: HandlerSlot<SubmitHandler>,
}

impl FormHandler {
    /// Appends one `label.label > (control, p.field-error)` group per
    /// descriptor, in order.
    pub fn render(
        form: Option<ElementRef>,
        descriptors: &[FieldDescriptor],
        options: FormOptions,
    ) -> Result<Rc<Self>, ElementError> {
        let form = Self::check_form(form)?;

        let fields = descriptors
            .iter()
            .map(|descriptor| {
                let control = descriptor.build_control();
                let error = Element::new(Tag::P).with_class(FIELD_ERROR_CLASS);
                let label = Element::new(Tag::Label)
                    .with_class("label")
                    .with_text(&descriptor.label)
                    .with_child(control.clone())
                    .with_child(error.clone());
                form.append_child(label);
                RenderedField::new(descriptor.clone(), control, Some(error))
            })
            .collect();

        debug!(fields = descriptors.len(), "form rendered");
        Ok(Self::wire(form, fields, options))
    }

    /// Wires controls already present in the form, looked up by `name`.
    /// The element following each control, if it is a `<p>`, becomes its
    /// error surface. Names with no matching control are skipped.
    pub fn bind(
        form: Option<ElementRef>,
        names: &[&str],
        options: FormOptions,
    ) -> Result<Rc<Self>, ElementError> {
        let form = Self::check_form(form)?;
        let controls: Vec<ElementRef> = form
            .descendants()
            .into_iter()
            .filter(|e| e.is_form_control())
            .collect();

        let mut fields = Vec::new();
        for name in names {
            let Some(control) = controls.iter().find(|c| c.name().as_deref() == Some(*name)) else {
                warn!(field = %name, "no control found for field");
                continue;
            };
            let error = control.next_element_sibling().filter(|e| e.tag() == Tag::P);
            fields.push(RenderedField::new(
                FieldDescriptor::from_element(control),
                Rc::clone(control),
                error,
            ));
        }

        Ok(Self::wire(form, fields, options))
    }

    fn check_form(form: Option<ElementRef>) -> Result<ElementRef, ElementError> {
        let form = form.ok_or_else(|| ElementError::not_found("form"))?;
        if form.tag() != Tag::Form {
            return Err(ElementError::WrongKind {
                expected: Tag::Form,
                found: form.tag(),
            });
        }
        Ok(form)
    }

    fn wire(form: ElementRef, fields: Vec<Rc<RenderedField>>, options: FormOptions) -> Rc<Self> {
        form.set_no_validate(true);
        let fields = Rc::new(fields);
        let on_submit: HandlerSlot<SubmitHandler> = HandlerSlot::new();

        let submit_fields = Rc::clone(&fields);
        let slot = on_submit.clone();
        form.add_event_listener(EventKind::Submit, move |event| {
            if options.prevent_default {
                event.prevent_default();
            }
            if !check_validity(&submit_fields) {
                debug!("form submission blocked by invalid fields");
                return;
            }
            let data = collect(&submit_fields);
            match slot.current() {
                Some(handler) => handler(&data),
                None => debug!("form submitted without a handler"),
            }
        });

        Rc::new(Self {
            form,
            fields,
            on_submit,
        })
    }

    pub fn form(&self) -> &ElementRef {
        &self.form
    }

    pub fn fields(&self) -> &[Rc<RenderedField>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<Rc<RenderedField>> {
        self.fields.iter().find(|f| f.name() == name).cloned()
    }

    /// The live control of a field, for callers attaching their own listeners.
    pub fn get_field(&self, name: &str) -> Option<ElementRef> {
        self.field(name).map(|f| Rc::clone(f.control()))
    }

    pub fn values(&self) -> FormData {
        collect(&self.fields)
    }

    /// Fires `invalid` on every failing field; `true` if none failed.
    pub fn check_validity(&self) -> bool {
        check_validity(&self.fields)
    }

    /// Replaces the submit handler.
    pub fn on_submit(&self, handler: impl Fn(&FormData) + 'static) {
        self.on_submit.set(Rc::new(handler));
    }

    /// Requests submission: validation runs and, if every field passes,
    /// the handler receives the values.
    pub fn submit(&self) {
        self.form
            .dispatch_event(&Event::new(EventKind::Submit, Rc::clone(&self.form)));
    }

    /// Restores every control in the form, wired or not, to its default
    /// value, then clears the wired fields' messages and states.
    pub fn reset(&self) {
        let controls = self.form.descendants();
        for control in controls.iter().filter(|e| e.is_form_control()) {
            control.set_value(&control.default_value());
        }
        for field in self.fields.iter() {
            field.reset();
        }
        debug!("form reset");
    }
}

fn check_validity(fields: &[Rc<RenderedField>]) -> bool {
    let mut valid = true;
    for field in fields {
        if !field.validity().is_valid() {
            valid = false;
            let control = Rc::clone(field.control());
            control.dispatch_event(&Event::new(EventKind::Invalid, Rc::clone(&control)));
        }
    }
    valid
}

fn collect(fields: &[Rc<RenderedField>]) -> FormData {
    fields
        .iter()
        .map(|f| (f.name().to_string(), f.value()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn descriptors() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::input("title", InputType::Text, "Title").required(),
            FieldDescriptor::input("date", InputType::Date, "Date").required(),
            FieldDescriptor::input("code", InputType::Text, "Code").pattern("[A-Z]{3}"),
            FieldDescriptor::textarea("description", "Description"),
        ]
    }

    fn form() -> Rc<FormHandler> {
        FormHandler::render(
            Some(Element::new(Tag::Form)),
            &descriptors(),
            FormOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_render_builds_groups_in_order() {
        let form = form();
        let labels = form.form().children();
        assert_eq!(labels.len(), 4);
        assert!(form.form().no_validate());

        let first = &labels[0];
        assert_eq!(first.tag(), Tag::Label);
        assert_eq!(first.text(), "Title");
        let parts = first.children();
        assert_eq!(parts[0].tag(), Tag::Input);
        assert_eq!(parts[0].name().as_deref(), Some("title"));
        assert!(parts[0].required());
        assert!(parts[1].has_class(FIELD_ERROR_CLASS));

        assert_eq!(labels[3].children()[0].tag(), Tag::TextArea);
    }

    #[test]
    fn test_constructor_rejects_missing_or_wrong_element() {
        let missing = FormHandler::render(None, &descriptors(), FormOptions::default());
        assert!(matches!(missing, Err(ElementError::NotFound(_))));

        let wrong = FormHandler::render(Some(Element::new(Tag::Div)), &[], FormOptions::default());
        assert_eq!(
            wrong.err(),
            Some(ElementError::WrongKind {
                expected: Tag::Form,
                found: Tag::Div
            })
        );
    }

    #[test]
    fn test_message_precedence() {
        let form = form();
        let title = form.field("title").unwrap();
        let date = form.field("date").unwrap();
        let code = form.field("code").unwrap();
        assert_eq!(title.state(), FieldState::Pristine);

        title.control().blur();
        assert_eq!(title.error_text(), "Field required");
        assert_eq!(title.state(), FieldState::Invalid(ValidationMessage::Required));

        date.control().type_value("2024-02-30");
        assert_eq!(date.error_text(), "Bad input");

        code.control().type_value("ab");
        assert_eq!(code.error_text(), "Wrong format");

        code.control().type_value("ABC");
        assert_eq!(code.error_text(), "");
        assert_eq!(code.state(), FieldState::Valid);
    }

    #[test]
    fn test_optional_empty_field_is_valid_even_with_pattern() {
        let form = form();
        let code = form.field("code").unwrap();
        code.control().blur();
        assert_eq!(code.state(), FieldState::Valid);
    }

    #[test]
    fn test_invalid_submit_marks_fields_and_skips_handler() {
        let form = form();
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        form.on_submit(move |_| c.set(c.get() + 1));

        form.get_field("date").unwrap().set_value("2024-01-01");
        form.submit();

        assert_eq!(calls.get(), 0);
        assert_eq!(form.field("title").unwrap().error_text(), "Field required");
        assert_eq!(form.field("date").unwrap().error_text(), "");
    }

    #[test]
    fn test_valid_submit_passes_values_to_latest_handler() {
        let form = form();
        let received: Rc<RefCell<Vec<FormData>>> = Rc::default();
        let stale = Rc::new(Cell::new(false));

        let s = stale.clone();
        form.on_submit(move |_| s.set(true));
        let r = received.clone();
        form.on_submit(move |data| r.borrow_mut().push(data.clone()));

        form.get_field("title").unwrap().type_value("Trip");
        form.get_field("date").unwrap().type_value("2024-05-01");
        form.submit();

        assert!(!stale.get());
        let received = received.borrow();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["title"], "Trip");
        assert_eq!(received[0]["date"], "2024-05-01");
        assert_eq!(received[0]["description"], "");
    }

    #[test]
    fn test_submit_prevents_default_unless_disabled() {
        for (prevent, expected) in [(true, true), (false, false)] {
            let form = FormHandler::render(
                Some(Element::new(Tag::Form)),
                &[],
                FormOptions {
                    prevent_default: prevent,
                },
            )
            .unwrap();
            let seen = Rc::new(Cell::new(None));
            let s = seen.clone();
            form.form().add_event_listener(EventKind::Submit, move |e| {
                s.set(Some(e.default_prevented()))
            });
            form.submit();
            assert_eq!(seen.get(), Some(expected));
        }
    }

    #[test]
    fn test_reset_restores_defaults_and_clears_errors() {
        let descriptors = [FieldDescriptor::input("title", InputType::Text, "Title")
            .required()
            .default_value("Untitled")];
        let form = FormHandler::render(
            Some(Element::new(Tag::Form)),
            &descriptors,
            FormOptions::default(),
        )
        .unwrap();
        let title = form.field("title").unwrap();

        title.control().type_value("");
        assert_eq!(title.error_text(), "Field required");

        form.reset();
        assert_eq!(title.value(), "Untitled");
        assert_eq!(title.error_text(), "");
        assert_eq!(title.state(), FieldState::Pristine);
    }

    #[test]
    fn test_bind_wires_existing_markup() {
        let form = Element::new(Tag::Form);
        let input = Element::new(Tag::Input);
        input.set_name("title");
        input.set_required(true);
        let error = Element::new(Tag::P).with_class(FIELD_ERROR_CLASS);
        form.append_child(
            Element::new(Tag::Label)
                .with_text("Title")
                .with_child(input.clone())
                .with_child(error.clone()),
        );

        let handler =
            FormHandler::bind(Some(form), &["title", "missing"], FormOptions::default()).unwrap();
        assert_eq!(handler.fields().len(), 1);
        assert_eq!(handler.field("title").unwrap().descriptor().label, "Title");

        input.blur();
        assert_eq!(error.text(), "Field required");
    }

    #[test]
    fn test_reset_restores_unwired_controls_too() {
        let form = Element::new(Tag::Form);
        let title = Element::new(Tag::Input);
        title.set_name("title");
        let notes = Element::new(Tag::TextArea);
        notes.set_name("notes");
        notes.set_default_value("draft");
        form.append_child(title.clone());
        form.append_child(Element::new(Tag::Label).with_child(notes.clone()));

        let handler = FormHandler::bind(Some(form), &["title"], FormOptions::default()).unwrap();
        title.type_value("typed");
        notes.set_value("edited");

        handler.reset();

        assert_eq!(title.value(), "");
        assert_eq!(notes.value(), "draft");
        assert_eq!(handler.field("title").unwrap().state(), FieldState::Pristine);
    }

    #[test]
    fn test_invalid_pattern_is_ignored() {
        let descriptors = [FieldDescriptor::input("x", InputType::Text, "X").pattern("([")];
        let form = FormHandler::render(
            Some(Element::new(Tag::Form)),
            &descriptors,
            FormOptions::default(),
        )
        .unwrap();
        form.get_field("x").unwrap().type_value("anything");
        assert_eq!(form.field("x").unwrap().state(), FieldState::Valid);
    }
}
