//! Listing order and filtering of posts.

use domains::{Post, PostFilter};

/// Keeps the posts matching `filter`, newest id first.
pub fn filter_and_sort(posts: &[Post], filter: &PostFilter) -> Vec<Post> {
    let mut selected: Vec<Post> = posts.iter().filter(|p| filter.matches(p)).cloned().collect();
    selected.sort_by(|a, b| b.id.cmp(&a.id));
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{NewPost, PostId};

    fn posts() -> Vec<Post> {
        [(1, "Trip to Rome"), (2, "Grocery list"), (3, "Rome again")]
            .into_iter()
            .map(|(id, title)| NewPost::new(title, "2024-01-01").into_post(PostId(id)))
            .collect()
    }

    fn ids(posts: &[Post]) -> Vec<u64> {
        posts.iter().map(|p| p.id.0).collect()
    }

    #[test]
    fn test_unfiltered_is_descending_by_id() {
        assert_eq!(ids(&filter_and_sort(&posts(), &PostFilter::default())), vec![3, 2, 1]);
    }

    #[test]
    fn test_title_filter_keeps_order() {
        let result = filter_and_sort(&posts(), &PostFilter::by_title("rome"));
        assert_eq!(ids(&result), vec![3, 1]);
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(filter_and_sort(&posts(), &PostFilter::by_title("paris")).is_empty());
    }
}
