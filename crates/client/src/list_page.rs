//! Controller behind every entity list page.
//!
//! Search text, page and filter groups are restored from the URL on mount
//! and written back on every change, so reloading or sharing a link
//! reproduces the same view.

use std::sync::Arc;

use serde_json::Value;

use campus_core::list_query::{FilterGroups, ListQuery, PaginationMeta, Resource, RowSelection};
use campus_core::location::Location;
use campus_core::notifications::{Notice, Notifier};
use campus_core::types::DbId;

use crate::api::ListApi;
use crate::error::{ClientError, ClientResult};

pub struct ListPageController<A> {
    api: Arc<A>,
    resource: Resource,
    query: ListQuery,
    filters: FilterGroups,
    selection: RowSelection,
    rows: Vec<Value>,
    pagination: PaginationMeta,
    location: Location,
    notifier: Arc<dyn Notifier>,
}

impl<A: ListApi> ListPageController<A> {
    pub fn mount(api: Arc<A>, resource: Resource, location: Location, notifier: Arc<dyn Notifier>) -> Self {
        let query = ListQuery::from_params(&location.query);
        let filters = FilterGroups::from_params(resource.filter_groups(), &location.query);
        Self {
            api,
            resource,
            query,
            filters,
            selection: RowSelection::new(),
            rows: Vec::new(),
            pagination: PaginationMeta::default(),
            location,
            notifier,
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn filters(&self) -> &FilterGroups {
        &self.filters
    }

    pub fn selection(&self) -> &RowSelection {
        &self.selection
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    pub fn pagination(&self) -> &PaginationMeta {
        &self.pagination
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Ids of the rows on the current page.
    pub fn row_ids(&self) -> Vec<DbId> {
        self.rows
            .iter()
            .filter_map(|r| r.get("id").and_then(Value::as_i64))
            .collect()
    }

    /// Load the current page.
    pub async fn fetch(&mut self) -> ClientResult<()> {
        let mut request = self.query.clone();
        request.filters = self.filters.as_map().clone();

        match self.api.query_page(self.resource, &request).await {
            Ok(page) => {
                tracing::debug!(
                    resource = self.resource.path(),
                    page = page.pagination.page_index,
                    rows = page.data.len(),
                    "List page loaded"
                );
                self.rows = page.data;
                self.pagination = page.pagination;
                Ok(())
            }
            Err(e) => Err(self.report("load list", e)),
        }
    }

    pub async fn set_search(&mut self, text: &str) -> ClientResult<()> {
        self.query.set_search(text);
        self.sync_url();
        self.fetch().await
    }

    pub async fn toggle_sort(&mut self, column: &str) -> ClientResult<()> {
        self.query.toggle_sort(column);
        self.fetch().await
    }

    pub async fn go_to_page(&mut self, page: u32) -> ClientResult<()> {
        self.query.set_page(page);
        self.sync_url();
        self.fetch().await
    }

    /// Replace the filter selection and return to the first page.
    pub async fn apply_filters(&mut self, filters: FilterGroups) -> ClientResult<()> {
        self.filters = filters;
        self.query.set_page(1);
        self.sync_url();
        self.fetch().await
    }

    pub fn toggle_row(&mut self, id: DbId) -> bool {
        self.selection.toggle(id)
    }

    /// Select every row on the page, or clear them if all are selected.
    pub fn toggle_all(&mut self) {
        let ids = self.row_ids();
        self.selection.toggle_all(&ids);
    }

    /// Delete the selected rows, then reload. Returns how many were deleted.
    pub async fn bulk_delete(&mut self) -> ClientResult<usize> {
        let ids = self.selection.ids();
        if ids.is_empty() {
            return Ok(0);
        }

        if let Err(e) = self.api.delete_many(self.resource, &ids).await {
            return Err(self.report("bulk delete", e));
        }
        tracing::info!(resource = self.resource.path(), count = ids.len(), "Rows deleted");
        self.notifier
            .notify(Notice::success(format!("Deleted {} item(s)", ids.len())));
        self.selection.clear();

        // The deletion may have emptied the last page.
        self.fetch().await?;
        if self.rows.is_empty() && self.query.page > 1 {
            let last = self.pagination.total_pages_count.max(1);
            self.go_to_page(last.min(self.query.page - 1)).await?;
        }
        Ok(ids.len())
    }

    fn sync_url(&mut self) {
        self.query.write_params(&mut self.location.query);
        self.filters
            .write_params(self.resource.filter_groups(), &mut self.location.query);
    }

    fn report(&self, action: &str, error: ClientError) -> ClientError {
        tracing::error!(resource = self.resource.path(), action, error = %error, "List request failed");
        self.notifier.notify(Notice::error(error.user_message()));
        error
    }
}
