//! Paging arithmetic shared by the catalog endpoints

/// Products per page on every list endpoint
pub const PAGE_SIZE: usize = 6;

/// Index of the last page holding `total` items; 0 for an empty list
pub fn last_page(total: usize) -> usize {
    total.saturating_sub(1) / PAGE_SIZE
}

/// Items on page `page`. Pages past the end are empty.
pub fn page_slice<T>(items: &[T], page: usize) -> &[T] {
    let start = page.saturating_mul(PAGE_SIZE).min(items.len());
    let end = start.saturating_add(PAGE_SIZE).min(items.len());
    &items[start..end]
}

/// Whether a `next_paging` key is expected after `page`
pub fn has_next(total: usize, page: usize) -> bool {
    page < last_page(total) && total > 0
}
