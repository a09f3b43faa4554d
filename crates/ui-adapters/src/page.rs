//! # Home page
//!
//! Builds the default page tree and wires every controller together:
//!
//! - header buttons toggle the sidebar or open the create-post dialog
//! - sidebar nav items open the dialog or focus the search field
//! - the create-post form persists a post, then closes and clears the dialog
//! - the dialog's ok/clear buttons submit/reset the form
//! - typing in the search field filters the posts live by title

use std::rc::{Rc, Weak};

use anyhow::Context;
use configs::{telemetry, AppConfig};
use domains::{FormData, NewPost, PostFilter};
use services::PostService;
use storage_adapters::open_store;
use tracing::{debug, info, warn};

use crate::dialog::{DialogAction, DialogHandler};
use crate::dom::{Document, Element, ElementRef, EventKind, InputType, Rect, Tag};
use crate::error::ElementError;
use crate::form::{FieldDescriptor, FormHandler, FormOptions, FIELD_ERROR_CLASS};
use crate::header::{HeaderHandler, HEADER_BUTTON_CLASS};
use crate::posts_container::PostsContainer;
use crate::sidebar::{NavItem, SidebarAction, SidebarHandler, SidebarOptions, SIDEBAR_OVERLAY_ID};

pub const HOME_HEADER_ID: &str = "home-header";
pub const HOME_SIDEBAR_ID: &str = "home-sidebar";
pub const POSTS_CONTAINER_ID: &str = "posts-container";
pub const CREATE_POST_FORM_ID: &str = "create-post-form";
pub const CREATE_POST_DIALOG_ID: &str = "create-post-form-dialog";
pub const SEARCH_POST_FORM_ID: &str = "search-post-form";
pub const SEARCH_FIELD_NAME: &str = "title";

/// Fields of the create-post form, in display order.
pub fn create_post_form_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::input("title", InputType::Text, "Title")
            .required()
            .id("create-post-form-title")
            .class("input"),
        FieldDescriptor::input("date", InputType::Date, "Date")
            .required()
            .id("create-post-form-date")
            .class("input"),
        FieldDescriptor::textarea("description", "Description")
            .id("create-post-form-description")
            .class("textarea"),
    ]
}

fn icon_button(action: &str, icon: &str) -> ElementRef {
    Element::new(Tag::Button).with_data("action", action).with_child(
        Element::new(Tag::Span)
            .with_class("material-symbols-outlined")
            .with_text(icon),
    )
}

pub struct HomePage {
    document: Document,
    service: Rc<PostService>,
    sidebar: Rc<SidebarHandler>,
    header: Rc<HeaderHandler>,
    create_post_form: Rc<FormHandler>,
    create_post_dialog: Rc<DialogHandler>,
    posts: Rc<PostsContainer>,
    search_form: Option<Rc<FormHandler>>,
}

impl HomePage {
    /// Appends the default home page tree to the document body. The
    /// create-post form is left empty; `mount` renders its fields.
    pub fn markup(document: &Document) {
        let header = Element::new(Tag::Header)
            .with_id(HOME_HEADER_ID)
            .with_child(icon_button("toggle-sidebar", "menu").with_class(HEADER_BUTTON_CLASS))
            .with_child(Element::new(Tag::H1).with_text("Posts"))
            .with_child(icon_button("dialog-open", "add").with_class(HEADER_BUTTON_CLASS));

        let sidebar = Element::new(Tag::Aside)
            .with_id(HOME_SIDEBAR_ID)
            .with_class("sidebar")
            .with_child(icon_button("close-sidebar", "close"))
            .with_child(Element::new(Tag::Nav));

        let overlay = Element::new(Tag::Div)
            .with_id(SIDEBAR_OVERLAY_ID)
            .with_class("overlay");

        let search_input = Element::new(Tag::Input)
            .with_id("search-post-form-title")
            .with_class("input");
        search_input.set_input_type(InputType::Search);
        search_input.set_name(SEARCH_FIELD_NAME);
        let search_form = Element::new(Tag::Form).with_id(SEARCH_POST_FORM_ID).with_child(
            Element::new(Tag::Label)
                .with_class("label")
                .with_text("Search")
                .with_child(search_input)
                .with_child(Element::new(Tag::P).with_class(FIELD_ERROR_CLASS)),
        );

        let main = Element::new(Tag::Main)
            .with_child(search_form)
            .with_child(Element::new(Tag::Section).with_id(POSTS_CONTAINER_ID));

        let dialog = Element::new(Tag::Dialog)
            .with_id(CREATE_POST_DIALOG_ID)
            .with_child(Element::new(Tag::H1).with_text("New post"))
            .with_child(Element::new(Tag::Form).with_id(CREATE_POST_FORM_ID))
            .with_child(icon_button("dialog-close", "close"))
            .with_child(icon_button("dialog-clear", "delete"))
            .with_child(icon_button("dialog-ok", "check"));
        dialog.set_bounding_rect(Rect::new(340.0, 120.0, 600.0, 480.0));

        let body = document.body();
        for element in [header, sidebar, overlay, main, dialog] {
            body.append_child(element);
        }
    }

    /// Wires the controllers onto a document built by [`HomePage::markup`]
    /// (or equivalent markup). Only the search form is optional.
    pub fn mount(
        document: &Document,
        service: Rc<PostService>,
        sidebar_options: SidebarOptions,
    ) -> Result<Self, ElementError> {
        let sidebar = SidebarHandler::new(
            document,
            document.get_element_by_id(HOME_SIDEBAR_ID),
            sidebar_options,
        )?;
        let header = HeaderHandler::new(document.get_element_by_id(HOME_HEADER_ID))?;
        let create_post_form = FormHandler::render(
            document.get_element_by_id(CREATE_POST_FORM_ID),
            &create_post_form_fields(),
            FormOptions::default(),
        )?;
        let create_post_dialog =
            DialogHandler::new(document.get_element_by_id(CREATE_POST_DIALOG_ID))?;
        let posts = PostsContainer::new(
            document.get_element_by_id(POSTS_CONTAINER_ID),
            Rc::clone(&service),
        )?;
        let search_form = match FormHandler::bind(
            document.get_element_by_id(SEARCH_POST_FORM_ID),
            &[SEARCH_FIELD_NAME],
            FormOptions::default(),
        ) {
            Ok(form) => Some(form),
            Err(ElementError::NotFound(_)) => {
                debug!("page has no search form");
                None
            }
            Err(e) => return Err(e),
        };

        let page = Self {
            document: document.clone(),
            service,
            sidebar,
            header,
            create_post_form,
            create_post_dialog,
            posts,
            search_form,
        };
        page.wire_header();
        page.wire_nav();
        page.wire_create_post();
        page.wire_search();

        info!(posts = page.service.posts().len(), "home page mounted");
        Ok(page)
    }

    /// Startup entry: reads `.env`, `post-notes.toml` in the working
    /// directory and `POST_NOTES__*` variables, then bootstraps.
    pub fn bootstrap_from_env() -> anyhow::Result<Self> {
        let config = AppConfig::load().context("failed to load configuration")?;
        Self::bootstrap(&config)
    }

    /// Loads config-driven dependencies, builds the default markup and
    /// mounts it.
    pub fn bootstrap(config: &AppConfig) -> anyhow::Result<Self> {
        config.validate().context("invalid configuration")?;
        telemetry::init(&config.logging);

        let store = open_store(&config.storage).context("failed to open post storage")?;
        let service = Rc::new(PostService::new(store));

        let document = Document::new();
        document.set_viewport_width(config.viewport.width);
        Self::markup(&document);

        let page = Self::mount(&document, service, SidebarOptions::from(&config.sidebar))
            .context("failed to mount home page")?;
        Ok(page)
    }

    fn wire_header(&self) {
        let sidebar: Weak<SidebarHandler> = Rc::downgrade(&self.sidebar);
        let dialog: Weak<DialogHandler> = Rc::downgrade(&self.create_post_dialog);
        self.header.on_button_click(move |event| {
            let Some(button) = event.current_target() else {
                return;
            };
            if DialogAction::of(&button) == DialogAction::Open {
                if let Some(dialog) = dialog.upgrade() {
                    dialog.show_modal();
                }
            } else if let Some(sidebar) = sidebar.upgrade() {
                sidebar.handle_action(SidebarAction::of(&button));
            }
        });
    }

    fn wire_nav(&self) {
        let dialog: Weak<DialogHandler> = Rc::downgrade(&self.create_post_dialog);
        let new_post = NavItem::new("New post", move |_| {
            if let Some(dialog) = dialog.upgrade() {
                dialog.show_modal();
            }
        });

        let document = self.document.downgrade();
        let search_field = self
            .search_form
            .as_ref()
            .and_then(|form| form.get_field(SEARCH_FIELD_NAME))
            .map(|field| Rc::downgrade(&field));
        let search = NavItem::new("Search for posts", move |_| {
            match (document.upgrade(), search_field.as_ref().and_then(Weak::upgrade)) {
                (Some(document), Some(field)) => document.focus(&field),
                _ => debug!("no search field to focus"),
            }
        });

        self.sidebar.set_nav_items(vec![new_post, search]);
    }

    fn wire_create_post(&self) {
        let service: Weak<PostService> = Rc::downgrade(&self.service);
        let dialog: Weak<DialogHandler> = Rc::downgrade(&self.create_post_dialog);
        let form: Weak<FormHandler> = Rc::downgrade(&self.create_post_form);
        self.create_post_form.on_submit(move |data: &FormData| {
            let Some(candidate) = NewPost::from_form_data(data) else {
                warn!("submitted post is missing a title or date");
                return;
            };
            let Some(service) = service.upgrade() else {
                return;
            };
            match service.create_and_insert(candidate) {
                Ok(post) => {
                    info!(post_id = %post.id, title = %post.title, "post created");
                    if let Some(dialog) = dialog.upgrade() {
                        dialog.close();
                    }
                    if let Some(form) = form.upgrade() {
                        form.reset();
                    }
                }
                Err(e) => warn!(error = %e, "post was not created"),
            }
        });

        let form: Weak<FormHandler> = Rc::downgrade(&self.create_post_form);
        self.create_post_dialog.on_ok(move || {
            if let Some(form) = form.upgrade() {
                form.submit();
            }
        });

        let form: Weak<FormHandler> = Rc::downgrade(&self.create_post_form);
        self.create_post_dialog.on_clear(move || {
            if let Some(form) = form.upgrade() {
                form.reset();
            }
        });
    }

    fn wire_search(&self) {
        let Some(search_form) = &self.search_form else {
            return;
        };

        if let Some(field) = search_form.get_field(SEARCH_FIELD_NAME) {
            let posts: Weak<PostsContainer> = Rc::downgrade(&self.posts);
            field.add_event_listener(EventKind::Input, move |event| {
                if let Some(posts) = posts.upgrade() {
                    posts.set_filter(title_filter(&event.target().value()));
                }
            });
        }

        let posts: Weak<PostsContainer> = Rc::downgrade(&self.posts);
        search_form.on_submit(move |data| {
            let title = data.get(SEARCH_FIELD_NAME).map(String::as_str).unwrap_or_default();
            if let Some(posts) = posts.upgrade() {
                posts.set_filter(title_filter(title));
            }
        });
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn service(&self) -> &Rc<PostService> {
        &self.service
    }

    pub fn sidebar(&self) -> &Rc<SidebarHandler> {
        &self.sidebar
    }

    pub fn header(&self) -> &Rc<HeaderHandler> {
        &self.header
    }

    pub fn create_post_form(&self) -> &Rc<FormHandler> {
        &self.create_post_form
    }

    pub fn create_post_dialog(&self) -> &Rc<DialogHandler> {
        &self.create_post_dialog
    }

    pub fn posts(&self) -> &Rc<PostsContainer> {
        &self.posts
    }

    pub fn search_form(&self) -> Option<&Rc<FormHandler>> {
        self.search_form.as_ref()
    }
}

fn title_filter(title: &str) -> PostFilter {
    if title.is_empty() {
        PostFilter::default()
    } else {
        PostFilter::by_title(title)
    }
}
