//! End-to-end scenarios driving the mounted home page like a user would.

use std::rc::Rc;

use domains::{NewPost, PostId};
use services::PostService;
use storage_adapters::MemoryStore;
use ui_adapters::page::{CREATE_POST_DIALOG_ID, POSTS_CONTAINER_ID};
use ui_adapters::{Document, ElementRef, HomePage, Point, SidebarOptions, SidebarState, Tag};

fn mount_with(store: MemoryStore, options: SidebarOptions) -> HomePage {
    let document = Document::new();
    HomePage::markup(&document);
    let service = Rc::new(PostService::new(Rc::new(store)));
    HomePage::mount(&document, service, options).unwrap()
}

fn mount() -> HomePage {
    mount_with(MemoryStore::new(), SidebarOptions::default())
}

fn action_button(page: &HomePage, action: &str) -> ElementRef {
    page.document()
        .root()
        .descendants()
        .into_iter()
        .find(|e| e.tag() == Tag::Button && e.data("action").as_deref() == Some(action))
        .unwrap_or_else(|| panic!("no button for {action}"))
}

fn write_post(page: &HomePage, title: &str, date: &str, description: &str) {
    action_button(page, "dialog-open").click();
    let form = page.create_post_form();
    form.get_field("title").unwrap().type_value(title);
    form.get_field("date").unwrap().type_value(date);
    form.get_field("description").unwrap().type_value(description);
    action_button(page, "dialog-ok").click();
}

fn article_titles(page: &HomePage) -> Vec<String> {
    page.document()
        .get_element_by_id(POSTS_CONTAINER_ID)
        .unwrap()
        .elements_by_class("post-title")
        .iter()
        .map(|e| e.text())
        .collect()
}

#[test]
fn writing_posts_lists_them_newest_first() {
    let page = mount();
    write_post(&page, "Trip to Rome", "2023-09-25", "Colosseum");
    write_post(&page, "Groceries", "2023-09-26", "");

    assert_eq!(article_titles(&page), vec!["Groceries", "Trip to Rome"]);
    assert!(!page.create_post_dialog().is_open());

    let first = page.document().get_element_by_id("Trip to Rome_0").unwrap();
    let date = first.elements_by_class("post-date")[0].text();
    assert_eq!(date, "Mon, 25 Sep 2023");
}

#[test]
fn invalid_fields_show_one_message_each() {
    let page = mount();
    action_button(&page, "dialog-open").click();
    let form = page.create_post_form();
    form.get_field("date").unwrap().type_value("2023-02-30");
    action_button(&page, "dialog-ok").click();

    assert_eq!(form.field("title").unwrap().error_text(), "Field required");
    assert_eq!(form.field("date").unwrap().error_text(), "Bad input");
    assert_eq!(form.field("description").unwrap().error_text(), "");
    assert!(page.service().posts().is_empty());
    assert!(page.create_post_dialog().is_open());
}

#[test]
fn clicking_outside_the_dialog_closes_it_and_keeps_the_draft() {
    let page = mount();
    action_button(&page, "dialog-open").click();
    page.create_post_form().get_field("title").unwrap().type_value("draft");

    let dialog = page.document().get_element_by_id(CREATE_POST_DIALOG_ID).unwrap();
    dialog.click_at(Point::new(400.0, 300.0));
    assert!(page.create_post_dialog().is_open());

    dialog.click_at(Point::new(5.0, 5.0));
    assert!(!page.create_post_dialog().is_open());
    assert_eq!(page.create_post_form().get_field("title").unwrap().value(), "draft");
}

#[test]
fn delete_button_removes_the_post_everywhere() {
    let page = mount();
    write_post(&page, "a", "2024-01-01", "");
    write_post(&page, "b", "2024-01-02", "");

    let article = page.document().get_element_by_id("a_0").unwrap();
    article.elements_by_class("post-delete-btn")[0].click();

    assert_eq!(article_titles(&page), vec!["b"]);
    assert_eq!(page.service().posts().len(), 1);

    // ids are not reused after the delete
    write_post(&page, "c", "2024-01-03", "");
    assert_eq!(page.posts().rendered_ids(), vec![PostId(2), PostId(1)]);
}

#[test]
fn search_narrows_the_list_and_repository_changes_respect_it() {
    let page = mount();
    for title in ["Trip to Rome", "Groceries", "Rome again"] {
        page.service()
            .create_and_insert(NewPost::new(title, "2024-01-01"))
            .unwrap();
    }

    let search = page.search_form().unwrap().get_field("title").unwrap();
    search.type_value("rome");
    assert_eq!(page.posts().rendered_ids(), vec![PostId(2), PostId(0)]);

    write_post(&page, "Paris", "2024-01-02", "");
    assert_eq!(article_titles(&page), vec!["Rome again", "Trip to Rome"]);

    search.type_value("");
    assert_eq!(page.posts().rendered_ids().len(), 4);
}

#[test]
fn storage_quota_keeps_the_dialog_open() {
    // room for the id counter, not for the post itself
    let page = mount_with(MemoryStore::with_quota(40), SidebarOptions::default());
    write_post(&page, "Too big to fit", "2024-01-01", "lorem ipsum");

    assert!(page.service().posts().is_empty());
    assert!(page.create_post_dialog().is_open());
    assert_eq!(page.create_post_form().get_field("title").unwrap().value(), "Too big to fit");
}

#[test]
fn sidebar_menu_overlay_and_nav() {
    let options = SidebarOptions {
        should_focus: true,
        expand_body: true,
        width: "300px".into(),
        min_width_to_full_screen: Some(360),
    };
    let page = mount_with(MemoryStore::new(), options);
    let body = page.document().body().clone();

    action_button(&page, "toggle-sidebar").click();
    assert_eq!(page.sidebar().state(), Some(SidebarState::Open));
    assert_eq!(body.style("padding-left").as_deref(), Some("300px"));

    page.document().get_element_by_id("sidebar-overlay").unwrap().click();
    assert_eq!(page.sidebar().state(), Some(SidebarState::Closed));

    page.document().set_viewport_width(320);
    action_button(&page, "toggle-sidebar").click();
    assert_eq!(page.sidebar().element().style("width").as_deref(), Some("100%"));

    let new_post = page.sidebar().element().elements_by_tag(Tag::A)[0].clone();
    new_post.click();
    assert!(page.create_post_dialog().is_open());

    action_button(&page, "close-sidebar").click();
    assert!(!page.sidebar().is_open());
}
