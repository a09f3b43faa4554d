//! # Posts container
//!
//! Projects the repository's posts into a container element, newest first.
//! Every repository change or filter change clears the container and
//! rebuilds it. Posts are created inside the container like:
//!
//! ```html
//! <article class="post" id="First post_0">
//!   <button class="post-delete-btn">
//!     <span class="material-symbols-outlined">delete</span>
//!   </button>
//!   <h3 class="post-title">First post</h3>
//!   <p class="post-date">Mon, 25 Sep 2023</p>
//!   <p class="post-description">This is an example description</p>
//! </article>
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use domains::{Post, PostFilter, PostId};
use services::{filter_and_sort, input_date_to_display, ListenerId, PostService};
use tracing::{debug, warn};

use crate::dom::{Element, ElementRef, EventKind, Tag};
use crate::error::ElementError;

pub struct PostsContainer {
    container: ElementRef,
    service: Rc<PostService>,
    filter: RefCell<PostFilter>,
    rendered: RefCell<Vec<PostId>>,
    listener: Cell<Option<ListenerId>>,
}

impl PostsContainer {
    /// Renders immediately and re-renders on every repository change.
    pub fn new(
        container: Option<ElementRef>,
        service: Rc<PostService>,
    ) -> Result<Rc<Self>, ElementError> {
        let container = container.ok_or_else(|| ElementError::not_found("posts container"))?;

        let this = Rc::new(Self {
            container,
            service: Rc::clone(&service),
            filter: RefCell::new(PostFilter::default()),
            rendered: RefCell::new(Vec::new()),
            listener: Cell::new(None),
        });
        this.render();

        let weak: Weak<PostsContainer> = Rc::downgrade(&this);
        let id = service.add_change_listener(move |posts| {
            if let Some(this) = weak.upgrade() {
                this.render_posts(posts);
            }
        });
        this.listener.set(Some(id));

        Ok(this)
    }

    pub fn element(&self) -> &ElementRef {
        &self.container
    }

    pub fn filter(&self) -> PostFilter {
        self.filter.borrow().clone()
    }

    /// Replaces the active filter and re-renders.
    pub fn set_filter(&self, filter: PostFilter) {
        *self.filter.borrow_mut() = filter;
        self.render();
    }

    /// Ids of the posts currently on screen, in display order.
    pub fn rendered_ids(&self) -> Vec<PostId> {
        self.rendered.borrow().clone()
    }

    pub fn render(&self) {
        self.render_posts(&self.service.posts());
    }

    fn render_posts(&self, posts: &[Post]) {
        self.container.clear_children();

        let visible = filter_and_sort(posts, &self.filter.borrow());
        for post in &visible {
            self.container.append_child(self.create_article(post));
        }

        debug!(total = posts.len(), shown = visible.len(), "posts rendered");
        *self.rendered.borrow_mut() = visible.iter().map(|p| p.id).collect();
    }

    fn create_article(&self, post: &Post) -> ElementRef {
        let delete_button = Element::new(Tag::Button)
            .with_class("post-delete-btn")
            .with_child(
                Element::new(Tag::Span)
                    .with_class("material-symbols-outlined")
                    .with_text("delete"),
            );
        let service = Rc::downgrade(&self.service);
        let id = post.id;
        delete_button.add_event_listener(EventKind::Click, move |_| {
            if let Some(service) = service.upgrade() {
                service.delete(id);
            }
        });

        let date = input_date_to_display(&post.date).unwrap_or_else(|e| {
            warn!(post_id = %post.id, error = %e, "leaving post date blank");
            String::new()
        });

        Element::new(Tag::Article)
            .with_class("post")
            .with_id(&format!("{}_{}", post.title, post.id))
            .with_child(delete_button)
            .with_child(Element::new(Tag::H3).with_class("post-title").with_text(&post.title))
            .with_child(Element::new(Tag::P).with_class("post-date").with_text(&date))
            .with_child(
                Element::new(Tag::P)
                    .with_class("post-description")
                    .with_text(&post.description),
            )
    }
}

impl Drop for PostsContainer {
    fn drop(&mut self) {
        if let Some(id) = self.listener.take() {
            self.service.remove_change_listener(id);
        }
    }
}
