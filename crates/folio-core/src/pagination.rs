//! Page requests and the pagination block shared by every listing endpoint.

use serde::{Deserialize, Serialize};

pub const CHAPTER_PAGE_SIZE: u32 = 10;
pub const CHARACTER_PAGE_SIZE: u32 = 12;
pub const COMMENT_PAGE_SIZE: u32 = 20;
pub const NOTIFICATION_PAGE_SIZE: u32 = 20;

/// A 1-based page number and a fixed page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  pub page:  u32,
  pub limit: u32,
}

impl PageRequest {
  /// Missing, zero or negative page numbers are coerced to 1.
  pub fn new(page: Option<i64>, limit: u32) -> Self {
    let page = page
      .filter(|p| *p >= 1)
      .map(|p| u32::try_from(p).unwrap_or(u32::MAX))
      .unwrap_or(1);
    Self { page, limit: limit.max(1) }
  }

  pub fn offset(&self) -> u64 { u64::from(self.page - 1) * u64::from(self.limit) }
}

impl Default for PageRequest {
  fn default() -> Self { Self::new(None, CHAPTER_PAGE_SIZE) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  pub total:             u64,
  pub page:              u32,
  pub limit:             u32,
  pub total_pages:       u32,
  pub has_next_page:     bool,
  pub has_previous_page: bool,
  pub next_page:         Option<u32>,
  pub previous_page:     Option<u32>,
}

impl Pagination {
  pub fn new(total: u64, request: PageRequest) -> Self {
    let total_pages =
      u32::try_from(total.div_ceil(u64::from(request.limit))).unwrap_or(u32::MAX);
    let has_next_page = request.page < total_pages;
    let has_previous_page = request.page > 1;
    Self {
      total,
      page: request.page,
      limit: request.limit,
      total_pages,
      has_next_page,
      has_previous_page,
      next_page: has_next_page.then(|| request.page + 1),
      previous_page: has_previous_page.then(|| request.page - 1),
    }
  }
}

/// One page of items plus its pagination block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
  pub items:      Vec<T>,
  pub pagination: Pagination,
}

impl<T> Page<T> {
  /// Cut one page out of a fully materialised, already ordered list.
  pub fn from_all(all: Vec<T>, request: PageRequest) -> Self {
    let total = all.len() as u64;
    let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    let items = all
      .into_iter()
      .skip(offset)
      .take(request.limit as usize)
      .collect();
    Self { items, pagination: Pagination::new(total, request) }
  }

  pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
    Page {
      items:      self.items.into_iter().map(f).collect(),
      pagination: self.pagination,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn second_page_of_fifteen() {
    let page = Page::from_all((0..15).collect::<Vec<_>>(), PageRequest::new(Some(2), 10));
    assert_eq!(page.items, (10..15).collect::<Vec<_>>());
    let p = page.pagination;
    assert_eq!(p.total, 15);
    assert_eq!(p.total_pages, 2);
    assert!(!p.has_next_page);
    assert!(p.has_previous_page);
    assert_eq!(p.next_page, None);
    assert_eq!(p.previous_page, Some(1));
  }

  #[test]
  fn first_page_links_forward() {
    let p = Pagination::new(15, PageRequest::new(Some(1), 10));
    assert!(p.has_next_page);
    assert!(!p.has_previous_page);
    assert_eq!(p.next_page, Some(2));
    assert_eq!(p.previous_page, None);
  }

  #[test]
  fn non_positive_pages_are_coerced() {
    assert_eq!(PageRequest::new(Some(0), 10).page, 1);
    assert_eq!(PageRequest::new(Some(-4), 10).page, 1);
    assert_eq!(PageRequest::new(None, 10).page, 1);
  }

  #[test]
  fn empty_result_has_no_pages() {
    let p = Pagination::new(0, PageRequest::new(Some(1), 10));
    assert_eq!(p.total_pages, 0);
    assert!(!p.has_next_page);
  }

  #[test]
  fn page_past_the_end_is_empty() {
    let page = Page::from_all(vec![1, 2, 3], PageRequest::new(Some(5), 10));
    assert!(page.items.is_empty());
    assert_eq!(page.pagination.previous_page, Some(4));
  }

  #[test]
  fn serializes_camel_case() {
    let json = serde_json::to_value(Pagination::new(15, PageRequest::new(Some(2), 10))).unwrap();
    assert_eq!(json["totalPages"], 2);
    assert_eq!(json["hasNextPage"], false);
    assert_eq!(json["previousPage"], 1);
  }
}
