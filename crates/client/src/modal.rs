//! Create/edit modals for simple entities (accounts, departments,
//! categories).

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use campus_core::form_state::FormState;
use campus_core::list_query::Resource;
use campus_core::notifications::{Notice, Notifier};
use campus_core::types::DbId;
use campus_core::validation::{check, AccountForm, CategoryForm, DepartmentForm, FormSchema};

use crate::api::RecordApi;
use crate::error::{ClientError, ClientResult};

pub type AccountModal<A> = EntityModal<A, AccountForm>;
pub type DepartmentModal<A> = EntityModal<A, DepartmentForm>;
pub type CategoryModal<A> = EntityModal<A, CategoryForm>;

/// One modal form bound to a resource and its validation schema `F`.
pub struct EntityModal<A, F> {
    api: Arc<A>,
    resource: Resource,
    notifier: Arc<dyn Notifier>,
    _schema: PhantomData<fn() -> F>,
}

impl<A: RecordApi, F: FormSchema> EntityModal<A, F> {
    pub fn new(api: Arc<A>, resource: Resource, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            resource,
            notifier,
            _schema: PhantomData,
        }
    }

    /// Validate and save. `id` selects update over create. Returns the
    /// record as stored by the backend.
    pub async fn submit(&self, form: &mut FormState, id: Option<DbId>) -> ClientResult<Value> {
        form.validate(check::<F>).map_err(ClientError::FieldErrors)?;
        let body = Value::Object(form.values());

        let result = match id {
            Some(id) => self.api.update_record(self.resource, id, &body).await,
            None => self.api.create_record(self.resource, &body).await,
        };
        match result {
            Ok(record) => {
                tracing::info!(resource = self.resource.path(), ?id, "Record saved");
                self.notifier.notify(Notice::success("Saved successfully"));
                Ok(record)
            }
            Err(e) => {
                tracing::error!(resource = self.resource.path(), ?id, error = %e, "Record save failed");
                self.notifier.notify(Notice::error(e.user_message()));
                Err(e)
            }
        }
    }
}
