//! Form-step controller driving the course and challenge wizards.
//!
//! The controller owns the current step (mirrored into the `step` URL
//! parameter), the entity's backend identity once created, and the draft
//! slot. Steps are planned by [`campus_core::wizard`]; this module performs
//! the backend calls and applies the outcome.
//!
//! A failed backend call never advances the step and never clears the
//! draft; the user sees an error notice and can resubmit.

use std::sync::Arc;

use campus_core::draft::{merge_shallow, Draft, DraftStore};
use campus_core::error::CoreError;
use campus_core::form_state::FormState;
use campus_core::location::{Location, STEP_PARAM};
use campus_core::notifications::{Notice, Notifier};
use campus_core::storage::TabStorage;
use campus_core::types::DbId;
use campus_core::wizard::{
    plan_back, plan_next, tag_request, BackAction, ChallengeStep, CourseStep, NextAction, StepRegistry,
    WizardStep,
};

use crate::api::EntityApi;
use crate::error::{ClientError, ClientResult};

pub type CourseWizard<A, T> = FormStepController<CourseStep, A, T>;
pub type ChallengeWizard<A, T> = FormStepController<ChallengeStep, A, T>;

/// Result of a successful forward submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome<S> {
    Advanced(S),
    /// The terminal step was confirmed; the wizard navigated to the list.
    Completed,
}

/// Result of going back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome<S> {
    Moved(S),
    /// Left the wizard from the first step; the draft was discarded.
    Abandoned,
}

pub struct FormStepController<S: WizardStep, A, T> {
    api: Arc<A>,
    drafts: DraftStore<T>,
    notifier: Arc<dyn Notifier>,
    registry: StepRegistry<S>,
    step: S,
    entity_id: Option<DbId>,
    location: Location,
    seeded: bool,
}

impl<S, A, T> FormStepController<S, A, T>
where
    S: WizardStep,
    A: EntityApi,
    T: TabStorage,
{
    /// Mount on `location`; the step comes from its `step` parameter.
    /// `entity_id` is set when editing an existing entity. Without one the
    /// wizard always starts on the first step and the parameter is dropped.
    pub fn mount(
        api: Arc<A>,
        drafts: DraftStore<T>,
        mut location: Location,
        notifier: Arc<dyn Notifier>,
        entity_id: Option<DbId>,
    ) -> Self {
        let registry = StepRegistry::<S>::new();
        let step = if entity_id.is_some() {
            registry.step_from_param(location.query.get(STEP_PARAM))
        } else {
            if let Some(ignored) = location.query.remove(STEP_PARAM) {
                tracing::debug!(kind = ?S::KIND, step = %ignored, "Ignoring step before creation");
            }
            registry.first()
        };
        tracing::debug!(kind = ?S::KIND, step = step.key(), ?entity_id, "Wizard mounted");
        Self {
            api,
            drafts,
            notifier,
            registry,
            step,
            entity_id,
            location,
            seeded: false,
        }
    }

    pub fn step(&self) -> S {
        self.step
    }

    pub fn entity_id(&self) -> Option<DbId> {
        self.entity_id
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn is_edit_mode(&self) -> bool {
        self.entity_id.is_some()
    }

    /// Persisted draft, if any.
    pub fn draft(&self) -> Option<Draft> {
        self.drafts.load()
    }

    /// Form for the current step, prefilled from the draft so a reload
    /// restores in-progress input.
    pub fn form(&self) -> FormState {
        FormState::from_values(self.drafts.load().unwrap_or_default())
    }

    /// In edit mode, seed the draft from the entity detail the first time
    /// this is called and only when no draft exists. Returns `true` if the
    /// draft was seeded.
    pub async fn load_for_edit(&mut self) -> ClientResult<bool> {
        let Some(id) = self.entity_id else {
            return Ok(false);
        };
        if self.seeded {
            return Ok(false);
        }

        let detail = match self.api.get_entity(S::KIND, id).await {
            Ok(detail) => detail,
            Err(e) => return Err(self.report(e)),
        };
        self.seeded = true;

        if self.drafts.exists() {
            tracing::debug!(kind = ?S::KIND, id, "Keeping existing draft");
            return Ok(false);
        }
        self.drafts.save(&S::draft_from_detail(&detail))?;
        tracing::info!(kind = ?S::KIND, id, "Seeded draft from entity detail");
        Ok(true)
    }

    /// Submit the current step.
    ///
    /// Validation failures are recorded on `form` and returned as
    /// [`ClientError::FieldErrors`] without any backend call.
    pub async fn handle_next_step(&mut self, form: &mut FormState) -> ClientResult<StepOutcome<S>> {
        let step = self.step;
        if self.entity_id.is_none() && step != self.registry.first() {
            return Err(ClientError::Core(CoreError::Validation(format!(
                "{} must be created from the first step",
                S::KIND.entity()
            ))));
        }
        step.validate(form).map_err(ClientError::FieldErrors)?;

        let submitted = form.values();
        let fields = if step.merges_draft() {
            self.drafts.merge(&submitted)?
        } else {
            let mut fields = self.drafts.load().unwrap_or_default();
            merge_shallow(&mut fields, &submitted);
            fields
        };

        match plan_next(step, self.entity_id.is_some()) {
            NextAction::Create {
                next,
                workflow_state,
                drafted,
            } => {
                let body = tag_request(step.transform_to_request(&fields), workflow_state, drafted);
                let id = match self.api.create_entity(S::KIND, &body).await {
                    Ok(id) => id,
                    Err(e) => return Err(self.report(e)),
                };
                tracing::info!(kind = ?S::KIND, id, "Created entity");
                self.entity_id = Some(id);
                self.location = Location::new(S::KIND.edit_path(id));
                self.advance(next);
                Ok(StepOutcome::Advanced(next))
            }
            NextAction::Update {
                next,
                workflow_state,
                drafted,
            } => {
                let id = self.require_identity()?;
                let body = tag_request(step.transform_to_request(&fields), workflow_state, drafted);
                if let Err(e) = self.api.update_entity(S::KIND, id, &body).await {
                    return Err(self.report(e));
                }
                tracing::info!(kind = ?S::KIND, id, workflow_state, "Updated entity");
                self.advance(next);
                Ok(StepOutcome::Advanced(next))
            }
            NextAction::Confirm => {
                self.finish(&fields).await?;
                Ok(StepOutcome::Completed)
            }
        }
    }

    /// Go back one step, or leave the wizard from the first step. Never
    /// calls the backend.
    pub fn handle_back(&mut self) -> ClientResult<BackOutcome<S>> {
        match plan_back(self.step) {
            BackAction::GoTo(prev) => {
                self.advance(prev);
                Ok(BackOutcome::Moved(prev))
            }
            BackAction::Abandon => {
                self.drafts.clear()?;
                self.location = Location::new(S::KIND.list_path());
                tracing::info!(kind = ?S::KIND, "Wizard abandoned");
                Ok(BackOutcome::Abandoned)
            }
        }
    }

    /// Final create-or-update with the whole draft. Only valid on the
    /// terminal step.
    pub async fn confirm(&mut self) -> ClientResult<()> {
        if !self.registry.is_terminal(self.step) {
            return Err(ClientError::Core(CoreError::InvalidStep {
                step: self.step.index(),
                total: self.registry.len(),
            }));
        }
        let fields = self.drafts.load().unwrap_or_default();
        self.finish(&fields).await
    }

    async fn finish(&mut self, fields: &Draft) -> ClientResult<()> {
        let terminal = self.registry.terminal();
        let body = tag_request(terminal.transform_to_request(fields), terminal.key(), false);

        let result = match self.entity_id {
            Some(id) => self.api.update_entity(S::KIND, id, &body).await.map(|()| id),
            None => self.api.create_entity(S::KIND, &body).await,
        };
        let id = match result {
            Ok(id) => id,
            Err(e) => return Err(self.report(e)),
        };

        self.entity_id = Some(id);
        self.drafts.clear()?;
        self.location = Location::new(S::KIND.list_path());
        tracing::info!(kind = ?S::KIND, id, "Wizard completed");
        self.notifier
            .notify(Notice::success(format!("{} saved", S::KIND.entity())));
        Ok(())
    }

    fn advance(&mut self, step: S) {
        self.step = step;
        self.location.query.set(STEP_PARAM, step.index().to_string());
    }

    fn require_identity(&self) -> ClientResult<DbId> {
        self.entity_id.ok_or_else(|| {
            ClientError::Core(CoreError::Internal(
                "update planned without an entity id".into(),
            ))
        })
    }

    fn report(&self, error: ClientError) -> ClientError {
        tracing::error!(kind = ?S::KIND, step = self.step.key(), error = %error, "Wizard request failed");
        self.notifier.notify(Notice::error(error.user_message()));
        error
    }
}
