//! Local re-pagination of fully materialized listings

use serde::Serialize;

/// One page of an in-memory sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub page_count: usize,
    pub current_page: usize,
    pub items_per_page: usize,
}

/// Slice `items` into pages of `page_size` and return page `page` (1-based).
/// A page past the end is empty rather than an error.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total_count = items.len();
    let page_count = total_count.div_ceil(page_size);

    let start = (page - 1).saturating_mul(page_size);
    let items: Vec<T> = items.into_iter().skip(start).take(page_size).collect();

    Page {
        items,
        total_count,
        page_count,
        current_page: page,
        items_per_page: page_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_middle_page() {
        let items: Vec<u32> = (1..=25).collect();
        let page = paginate(items, 2, 10);
        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.total_count, 25);
        assert_eq!(page.page_count, 3);
        assert_eq!(page.current_page, 2);
    }

    #[test]
    fn test_last_partial_page() {
        let items: Vec<u32> = (1..=25).collect();
        let page = paginate(items, 3, 10);
        assert_eq!(page.items, (21..=25).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_input() {
        let page = paginate(Vec::<u32>::new(), 1, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.page_count, 0);
        assert_eq!(page.total_count, 0);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let page = paginate(vec![1, 2, 3], 7, 2);
        assert!(page.items.is_empty());
        assert_eq!(page.page_count, 2);
        assert_eq!(page.current_page, 7);
    }

    #[test]
    fn test_zero_arguments_clamped() {
        let page = paginate(vec![1, 2, 3], 0, 0);
        assert_eq!(page.items, vec![1]);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.items_per_page, 1);
    }

    #[test]
    fn test_serialized_shape() {
        let page = paginate(vec!["a"], 1, 20);
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "items": ["a"],
                "totalCount": 1,
                "pageCount": 1,
                "currentPage": 1,
                "itemsPerPage": 20
            })
        );
    }
}
