//! Repository behaviour over a real in-memory store.

use std::cell::RefCell;
use std::rc::Rc;

use domains::{
    AppError, KeyValueStore, NewPost, PostId, StorageKey, ID_GENERATOR_KEY, ID_GENERATOR_KIND,
    POST_KIND,
};
use services::PostService;
use storage_adapters::MemoryStore;

fn service() -> (Rc<MemoryStore>, PostService) {
    let store = Rc::new(MemoryStore::new());
    let service = PostService::new(store.clone());
    (store, service)
}

fn sorted_ids(service: &PostService) -> Vec<u64> {
    let mut ids: Vec<u64> = service.posts().iter().map(|p| p.id.0).collect();
    ids.sort_unstable();
    ids
}

#[test]
fn ids_keep_growing_across_deletes() {
    let (store, service) = service();

    let a = service.create_and_insert(NewPost::new("a", "2024-01-01")).unwrap();
    let b = service.create_and_insert(NewPost::new("b", "2024-01-02")).unwrap();
    service.delete(b.id);
    service.delete(a.id);
    let c = service.create_and_insert(NewPost::new("c", "2024-01-03")).unwrap();

    assert_eq!((a.id, b.id, c.id), (PostId(0), PostId(1), PostId(2)));
    assert_eq!(sorted_ids(&service), vec![2]);

    let counter = store
        .get_item(&StorageKey::new(ID_GENERATOR_KIND, ID_GENERATOR_KEY))
        .unwrap();
    assert_eq!(counter.as_deref(), Some("3"));
}

#[test]
fn stored_record_has_the_documented_shape() {
    let (store, service) = service();
    service.create_and_insert(NewPost::new("Trip", "2023-09-25")).unwrap();

    let raw = store.get_item(&StorageKey::new(POST_KIND, 0)).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        value,
        serde_json::json!({"id": 0, "title": "Trip", "date": "2023-09-25", "description": ""})
    );
}

#[test]
fn validation_failure_has_no_side_effects() {
    let (store, service) = service();
    let notified = Rc::new(RefCell::new(0));
    let n = notified.clone();
    service.add_change_listener(move |_| *n.borrow_mut() += 1);

    for candidate in [
        NewPost::new("", "2024-01-01"),
        NewPost::new("title", ""),
        NewPost::new("title", "25/09/2023"),
    ] {
        let err = service.create_and_insert(candidate).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    assert!(store.is_empty());
    assert_eq!(*notified.borrow(), 0);

    // no id was consumed by the rejected candidates
    let post = service.create_and_insert(NewPost::new("ok", "2024-01-01")).unwrap();
    assert_eq!(post.id, PostId(0));
}

#[test]
fn every_listener_sees_the_grown_list_once() {
    let (_store, service) = service();
    service.create_and_insert(NewPost::new("seed", "2024-01-01")).unwrap();
    let before = service.posts().len();

    let first = Rc::new(RefCell::new(Vec::new()));
    let second = Rc::new(RefCell::new(Vec::new()));
    let f = first.clone();
    service.add_change_listener(move |posts| f.borrow_mut().push(posts.len()));
    let s = second.clone();
    service.add_change_listener(move |posts| s.borrow_mut().push(posts.len()));

    service.create_and_insert(NewPost::new("next", "2024-01-02")).unwrap();

    assert_eq!(*first.borrow(), vec![before + 1]);
    assert_eq!(*second.borrow(), vec![before + 1]);
}

#[test]
fn deleting_an_absent_id_notifies_with_unchanged_list() {
    let (_store, service) = service();
    service.create_and_insert(NewPost::new("keep", "2024-01-01")).unwrap();

    let lengths = Rc::new(RefCell::new(Vec::new()));
    let l = lengths.clone();
    service.add_change_listener(move |posts| l.borrow_mut().push(posts.len()));

    service.delete(PostId(42));

    assert_eq!(*lengths.borrow(), vec![1]);
    assert_eq!(sorted_ids(&service), vec![0]);
}

#[test]
fn fresh_service_reads_what_another_wrote() {
    let store = Rc::new(MemoryStore::new());
    let writer = PostService::new(store.clone());
    writer.create_and_insert(NewPost::new("one", "2024-01-01")).unwrap();
    writer.create_and_insert(NewPost::new("two", "2024-01-02")).unwrap();

    let reader = PostService::new(store);
    assert_eq!(sorted_ids(&reader), vec![0, 1]);
    assert_eq!(reader.next_id().unwrap(), PostId(2));
}
