//! Query construction for the list/search endpoints.
//!
//! Translates request query parameters into store filters and paging
//! windows: pet search by name/category, owner-scoped "mine" listings,
//! and the 1-based page/size window.

use serde_json::Value;

use crate::storage::Filter;

/// Build the pet search filter. With a search text and/or a category the
/// filter matches `pet_name` as a case-insensitive substring AND
/// `pet_category.value` as a substring, a missing parameter standing in as
/// the empty pattern. With neither, every pet is visible.
pub fn pet_search_filter(search: Option<&str>, category: Option<&str>) -> Filter {
    if search.is_none() && category.is_none() {
        return Filter::all();
    }
    Filter::all()
        .contains_ci("pet_name", search.unwrap_or(""))
        .contains("pet_category.value", category.unwrap_or(""))
}

/// Owner scoping for the "mine" endpoints. Without the owner parameter the
/// filter is empty and the whole collection is returned; that fallback is
/// part of the endpoint contract.
pub fn owned_by(field: &str, owner: Option<&str>) -> Filter {
    match owner {
        Some(owner) => Filter::all().eq(field, Value::from(owner)),
        None => Filter::all(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: usize,
    pub limit: usize,
}

/// Resolve a 1-based page number and a page size into a skip/limit window.
/// Missing or non-numeric parameters, a page below 1, or a negative size
/// all select zero items; callers must always supply both.
pub fn page_window(page: Option<&str>, size: Option<&str>) -> PageWindow {
    let page = page.and_then(|p| p.parse::<i64>().ok());
    let size = size.and_then(|s| s.parse::<i64>().ok());
    match (page, size) {
        (Some(page), Some(size)) if page >= 1 && size >= 0 => PageWindow {
            skip: ((page - 1) * size) as usize,
            limit: size as usize,
        },
        _ => PageWindow { skip: 0, limit: 0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_filter_is_empty_without_parameters() {
        assert!(pet_search_filter(None, None).is_empty());
    }

    #[test]
    fn search_filter_matches_name_and_category_together() {
        let filter = pet_search_filter(Some("bella"), Some("dog"));
        let dog = json!({ "pet_name": "Bella Rose", "pet_category": { "value": "dog" } });
        let cat = json!({ "pet_name": "Bella Mia", "pet_category": { "value": "cat" } });
        assert!(filter.matches(&dog));
        assert!(!filter.matches(&cat));
    }

    #[test]
    fn search_without_category_matches_any_category_value() {
        let filter = pet_search_filter(Some("Bella"), None);
        let dog = json!({ "pet_name": "bella", "pet_category": { "value": "dog" } });
        let max = json!({ "pet_name": "Max", "pet_category": { "value": "dog" } });
        assert!(filter.matches(&dog));
        assert!(!filter.matches(&max));
    }

    #[test]
    fn owned_by_scopes_only_when_owner_is_supplied() {
        let scoped = owned_by("lister_email", Some("a@x.com"));
        assert!(scoped.matches(&json!({ "lister_email": "a@x.com" })));
        assert!(!scoped.matches(&json!({ "lister_email": "b@x.com" })));

        assert!(owned_by("lister_email", None).is_empty());
    }

    #[test]
    fn page_window_is_zero_based_from_one_based_pages() {
        assert_eq!(
            page_window(Some("1"), Some("10")),
            PageWindow { skip: 0, limit: 10 }
        );
        assert_eq!(
            page_window(Some("2"), Some("10")),
            PageWindow { skip: 10, limit: 10 }
        );
        assert_eq!(
            page_window(Some("3"), Some("7")),
            PageWindow { skip: 14, limit: 7 }
        );
    }

    #[test]
    fn invalid_paging_selects_zero_items() {
        let zero = PageWindow { skip: 0, limit: 0 };
        assert_eq!(page_window(None, None), zero);
        assert_eq!(page_window(Some("2"), None), zero);
        assert_eq!(page_window(Some("abc"), Some("10")), zero);
        assert_eq!(page_window(Some("0"), Some("10")), zero);
        assert_eq!(page_window(Some("2"), Some("-5")), zero);
    }
}
