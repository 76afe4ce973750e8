//! List page state: pagination, sorting, search, filters and row selection.
//!
//! Every entity list (accounts, departments, categories, courses, challenges)
//! follows the same pattern. Search text, page and filter groups are mirrored
//! into the URL so a reload reproduces the same view.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::location::{QueryParams, PAGE_PARAM, SEARCH_PARAM};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Maximum rows per page accepted by the backend.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Separator between selected values of one filter group in the URL.
pub const FILTER_DELIMITER: &str = ",";

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Backend collections the console lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Accounts,
    Departments,
    Categories,
    Courses,
    Challenges,
    Quarters,
    Roles,
}

impl Resource {
    /// Path segment under the API base URL.
    pub fn path(self) -> &'static str {
        match self {
            Self::Accounts => "accounts",
            Self::Departments => "departments",
            Self::Categories => "categories",
            Self::Courses => "courses",
            Self::Challenges => "challenges",
            Self::Quarters => "quarters",
            Self::Roles => "roles",
        }
    }

    /// Console route of the list page.
    pub fn list_route(self) -> String {
        format!("/{}", self.path())
    }

    /// Filter groups the list page exposes.
    pub fn filter_groups(self) -> &'static [&'static str] {
        match self {
            Self::Accounts => &["department", "role", "status"],
            Self::Courses => &["category", "status"],
            Self::Challenges => &["quarter", "status"],
            Self::Departments | Self::Categories | Self::Quarters | Self::Roles => &[],
        }
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub order_column: String,
    pub order_dir: SortDir,
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// Request parameters of one list fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, Vec<String>>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            q: None,
            order_by: Vec::new(),
            filters: BTreeMap::new(),
        }
    }
}

impl ListQuery {
    /// Set the search text; blank text clears it. Always returns to page 1.
    pub fn set_search(&mut self, text: &str) {
        let trimmed = text.trim();
        self.q = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self.page = 1;
    }

    /// Go to a 1-based page.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Clamp the page size into `1..=MAX_PAGE_SIZE`.
    pub fn set_limit(&mut self, limit: u32) {
        self.limit = limit.clamp(1, MAX_PAGE_SIZE);
        self.page = 1;
    }

    /// Cycle the sort on `column`: none -> asc -> desc -> none.
    ///
    /// Only one column is sorted at a time.
    pub fn toggle_sort(&mut self, column: &str) {
        let next = match self.order_by.first() {
            Some(o) if o.order_column == column => match o.order_dir {
                SortDir::Asc => Some(SortDir::Desc),
                SortDir::Desc => None,
            },
            _ => Some(SortDir::Asc),
        };
        self.order_by = next
            .map(|order_dir| {
                vec![OrderBy {
                    order_column: column.to_string(),
                    order_dir,
                }]
            })
            .unwrap_or_default();
    }

    /// Current sort direction of `column`, if sorted.
    pub fn sort_dir(&self, column: &str) -> Option<SortDir> {
        self.order_by
            .iter()
            .find(|o| o.order_column == column)
            .map(|o| o.order_dir)
    }

    /// Restore `q` and `page` from URL parameters.
    pub fn from_params(params: &QueryParams) -> Self {
        let mut query = Self::default();
        if let Some(q) = params.get(SEARCH_PARAM) {
            query.set_search(q);
        }
        if let Some(page) = params.get(PAGE_PARAM).and_then(|p| p.parse::<u32>().ok()) {
            query.set_page(page);
        }
        query
    }

    /// Mirror `q` and `page` into URL parameters.
    pub fn write_params(&self, params: &mut QueryParams) {
        match &self.q {
            Some(q) => params.set(SEARCH_PARAM, q.clone()),
            None => {
                params.remove(SEARCH_PARAM);
            }
        }
        if self.page > 1 {
            params.set(PAGE_PARAM, self.page.to_string());
        } else {
            params.remove(PAGE_PARAM);
        }
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Selected values per filter group, e.g. `{status: ["active"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterGroups {
    groups: BTreeMap<String, Vec<String>>,
}

impl FilterGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection of one group. Empty selections remove the group.
    pub fn set(&mut self, group: impl Into<String>, values: Vec<String>) {
        let group = group.into();
        let values: Vec<String> = values.into_iter().filter(|v| !v.is_empty()).collect();
        if values.is_empty() {
            self.groups.remove(&group);
        } else {
            self.groups.insert(group, values);
        }
    }

    pub fn get(&self, group: &str) -> &[String] {
        self.groups.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, Vec<String>> {
        &self.groups
    }

    /// Write one parameter per active group (values joined by
    /// [`FILTER_DELIMITER`]) and drop parameters of inactive `known` groups.
    pub fn write_params(&self, known: &[&str], params: &mut QueryParams) {
        for group in known {
            params.remove(group);
        }
        for (group, values) in &self.groups {
            params.set(group.clone(), values.join(FILTER_DELIMITER));
        }
    }

    /// Read the `known` groups back from URL parameters.
    pub fn from_params(known: &[&str], params: &QueryParams) -> Self {
        let mut filters = Self::new();
        for group in known {
            if let Some(raw) = params.get(group) {
                let values = raw
                    .split(FILTER_DELIMITER)
                    .map(|v| v.trim().to_string())
                    .collect();
                filters.set(*group, values);
            }
        }
        filters
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Pagination envelope of list responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page_index: u32,
    pub total_pages_count: u32,
    pub page_size: u32,
    pub total_items_count: u64,
}

impl PaginationMeta {
    pub fn has_next(&self) -> bool {
        self.page_index < self.total_pages_count
    }

    pub fn has_prev(&self) -> bool {
        self.page_index > 1
    }
}

/// A page of rows plus its pagination envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Checkbox multi-select over row ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSelection {
    selected: BTreeSet<DbId>,
}

impl RowSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the new checked state of `id`.
    pub fn toggle(&mut self, id: DbId) -> bool {
        if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    /// Header checkbox: select every row of the page, or clear them if all
    /// were already selected.
    pub fn toggle_all(&mut self, page_ids: &[DbId]) {
        if self.all_selected(page_ids) {
            for id in page_ids {
                self.selected.remove(id);
            }
        } else {
            self.selected.extend(page_ids.iter().copied());
        }
    }

    pub fn all_selected(&self, page_ids: &[DbId]) -> bool {
        !page_ids.is_empty() && page_ids.iter().all(|id| self.selected.contains(id))
    }

    pub fn is_selected(&self, id: DbId) -> bool {
        self.selected.contains(&id)
    }

    pub fn ids(&self) -> Vec<DbId> {
        self.selected.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}
