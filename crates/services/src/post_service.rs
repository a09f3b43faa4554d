//! # PostService
//!
//! The post repository: id assignment, record (de)serialization and change
//! notification on top of a `KeyValueStore`.
//!
//! The in-memory list is a cache of the store. It is rebuilt wholesale from
//! the store after every successful mutation, never patched in place.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use domains::{
    AppError, KeyFilter, KeyValueStore, NewPost, Post, PostId, Result, StorageKey,
    ID_GENERATOR_KEY, ID_GENERATOR_KIND, POST_KIND,
};
use tracing::{debug, error, warn};

/// Callback receiving the full post list after a successful mutation.
pub type ChangeListener = Rc<dyn Fn(&[Post])>;

/// Handle returned by `add_change_listener`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub struct PostService {
    store: Rc<dyn KeyValueStore>,
    posts: RefCell<Vec<Post>>,
    listeners: RefCell<Vec<(ListenerId, ChangeListener)>>,
    next_listener: Cell<u64>,
    /// Set while listeners run; mutations issued from a listener only flag
    /// `pending` and the running dispatch delivers another round.
    notifying: Cell<bool>,
    pending: Cell<bool>,
}

impl PostService {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        let service = Self {
            store,
            posts: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
            notifying: Cell::new(false),
            pending: Cell::new(false),
        };
        *service.posts.borrow_mut() = service.get_all();
        service
    }

    /// Snapshot of the cached post list.
    pub fn posts(&self) -> Vec<Post> {
        self.posts.borrow().clone()
    }

    /// Reads every stored post. Entries that fail to parse are skipped.
    pub fn get_all(&self) -> Vec<Post> {
        let raw = match self.store.get_all(&KeyFilter::of_kind(POST_KIND)) {
            Ok(values) => values,
            Err(e) => {
                error!(error = %e, "failed to enumerate stored posts");
                return Vec::new();
            }
        };

        raw.iter()
            .filter_map(|value| match serde_json::from_str::<Post>(value) {
                Ok(post) => Some(post),
                Err(e) => {
                    warn!(error = %e, "skipping malformed post record");
                    None
                }
            })
            .collect()
    }

    /// Hands out the next id and advances the stored counter.
    ///
    /// The counter holds the next id to assign. A missing or unreadable
    /// counter is rebuilt from the highest stored post id, so an empty
    /// store starts at `0` and existing posts are never overwritten.
    pub fn next_id(&self) -> Result<PostId> {
        let key = StorageKey::new(ID_GENERATOR_KIND, ID_GENERATOR_KEY);

        let assigned = match self.store.get_item(&key)? {
            None => {
                let recovered = self.recover_next_id()?;
                debug!(recovered = %recovered, "id counter missing");
                recovered
            }
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(n) => PostId(n),
                Err(e) => {
                    let recovered = self.recover_next_id()?;
                    warn!(value = %raw, error = %e, recovered = %recovered, "corrupt id counter");
                    recovered
                }
            },
        };

        let following = assigned.next().ok_or(AppError::IdsExhausted)?;
        self.store.set_item(&key, &following.to_string())?;
        Ok(assigned)
    }

    fn recover_next_id(&self) -> Result<PostId> {
        match self.get_all().iter().map(|p| p.id).max() {
            Some(highest) => highest.next().ok_or(AppError::IdsExhausted),
            None => Ok(PostId(0)),
        }
    }

    /// Validates the candidate and assigns it an id.
    /// Nothing is written when validation fails.
    pub fn create(&self, candidate: NewPost) -> Result<Post> {
        candidate.validate()?;
        let id = self.next_id()?;
        Ok(candidate.into_post(id))
    }

    /// Persists the post, refreshes the cache and notifies listeners.
    /// On a write failure the cache and listeners are left untouched.
    pub fn insert(&self, post: &Post) -> Result<()> {
        let value = serde_json::to_string(post)?;
        self.store
            .set_item(&StorageKey::new(POST_KIND, post.id), &value)
            .map_err(|e| {
                error!(post_id = %post.id, error = %e, "failed to persist post");
                AppError::from(e)
            })?;

        debug!(post_id = %post.id, "post inserted");
        self.refresh_and_notify();
        Ok(())
    }

    pub fn create_and_insert(&self, candidate: NewPost) -> Result<Post> {
        let post = self.create(candidate)?;
        self.insert(&post)?;
        Ok(post)
    }

    /// Removes the post. Failures are logged and swallowed; an unknown id
    /// still refreshes and notifies with the unchanged list.
    pub fn delete(&self, id: PostId) {
        match self.store.remove_item(&StorageKey::new(POST_KIND, id)) {
            Ok(()) => {
                debug!(post_id = %id, "post deleted");
                self.refresh_and_notify();
            }
            Err(e) => error!(post_id = %id, error = %e, "failed to delete post"),
        }
    }

    pub fn add_change_listener(&self, listener: impl Fn(&[Post]) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Returns `false` if the listener was already removed.
    pub fn remove_change_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn refresh_and_notify(&self) {
        *self.posts.borrow_mut() = self.get_all();

        if self.notifying.get() {
            self.pending.set(true);
            return;
        }

        let _guard = NotifyGuard::enter(&self.notifying);
        loop {
            self.pending.set(false);
            let snapshot = self.posts();
            let listeners: Vec<ChangeListener> = self
                .listeners
                .borrow()
                .iter()
                .map(|(_, l)| Rc::clone(l))
                .collect();

            debug!(
                posts = snapshot.len(),
                listeners = listeners.len(),
                "notifying change listeners"
            );
            for listener in listeners {
                listener(&snapshot);
            }

            if !self.pending.get() {
                break;
            }
        }
    }
}

struct NotifyGuard<'a>(&'a Cell<bool>);

impl<'a> NotifyGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for NotifyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
