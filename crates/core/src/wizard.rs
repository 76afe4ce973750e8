//! Step registry of the course and challenge authoring wizards.
//!
//! Each wizard is a closed enum of steps implementing [`WizardStep`]. A step
//! knows how to validate its form, whether its values are merged into the
//! persisted draft, and how to turn step-local field names into the body the
//! backend expects. The current step lives only in the `step` URL parameter.
//!
//! Forward transitions are planned here ([`plan_next`], [`plan_back`]); the
//! async controller in `campus-client` carries them out.

use std::fmt::Debug;
use std::marker::PhantomData;

use serde_json::{json, Map, Value};

use crate::draft::Draft;
use crate::error::CoreError;
use crate::form_state::FormState;
use crate::list_query::Resource;
use crate::types::DbId;
use crate::validation::{
    check, ChallengeCoursesForm, ChallengeInfoForm, ChallengeParticipantsForm, CourseInfoForm,
    CoursePublishForm, FieldErrors,
};

/// Key added to request bodies with the workflow state being advanced to.
pub const WORKFLOW_STATE_KEY: &str = "workflow_state";

/// Key added to request bodies flagging an unfinished entity.
pub const DRAFTED_KEY: &str = "drafted";

// ---------------------------------------------------------------------------
// Wizard kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WizardKind {
    Course,
    Challenge,
}

impl WizardKind {
    pub fn resource(self) -> Resource {
        match self {
            Self::Course => Resource::Courses,
            Self::Challenge => Resource::Challenges,
        }
    }

    /// Entity name used in errors and notices.
    pub fn entity(self) -> &'static str {
        match self {
            Self::Course => "Course",
            Self::Challenge => "Challenge",
        }
    }

    /// Console route of the list page the wizard returns to.
    pub fn list_path(self) -> String {
        self.resource().list_route()
    }

    pub fn create_path(self) -> String {
        format!("{}/new", self.list_path())
    }

    pub fn edit_path(self, id: DbId) -> String {
        format!("{}/{id}/edit", self.list_path())
    }
}

// ---------------------------------------------------------------------------
// Step contract
// ---------------------------------------------------------------------------

/// One step of a wizard.
pub trait WizardStep: Copy + Eq + Debug + Send + Sync + 'static {
    const KIND: WizardKind;

    /// Every step, in order. Never empty.
    const ALL: &'static [Self];

    fn index(self) -> usize;

    /// Stable identifier, also sent as the workflow state.
    fn key(self) -> &'static str;

    fn label(self) -> &'static str;

    /// Fields that must be filled before the step can be submitted.
    fn required_fields(self) -> &'static [&'static str];

    /// Whether submitted values are merged into the persisted draft.
    fn merges_draft(self) -> bool;

    /// Validate the step's form, recording errors on it for inline display.
    fn validate(self, form: &mut FormState) -> Result<(), FieldErrors>;

    /// Map step-local fields to the backend request body.
    fn transform_to_request(self, fields: &Draft) -> Value;

    /// Map a fetched entity detail back to step-local draft fields.
    fn draft_from_detail(detail: &Value) -> Draft;
}

/// Typed view over the steps of one wizard.
#[derive(Debug, Clone, Copy)]
pub struct StepRegistry<S> {
    _steps: PhantomData<S>,
}

impl<S: WizardStep> StepRegistry<S> {
    pub fn new() -> Self {
        Self { _steps: PhantomData }
    }

    pub fn len(&self) -> usize {
        S::ALL.len()
    }

    pub fn is_empty(&self) -> bool {
        S::ALL.is_empty()
    }

    pub fn first(&self) -> S {
        S::ALL[0]
    }

    pub fn get(&self, index: usize) -> Result<S, CoreError> {
        S::ALL.get(index).copied().ok_or(CoreError::InvalidStep {
            step: index,
            total: S::ALL.len(),
        })
    }

    pub fn terminal(&self) -> S {
        S::ALL[S::ALL.len() - 1]
    }

    pub fn is_terminal(&self, step: S) -> bool {
        step == self.terminal()
    }

    pub fn next(&self, step: S) -> Option<S> {
        S::ALL.get(step.index() + 1).copied()
    }

    pub fn prev(&self, step: S) -> Option<S> {
        step.index().checked_sub(1).and_then(|i| S::ALL.get(i).copied())
    }

    /// Step named by the `step` URL parameter; absent, non-numeric and
    /// out-of-range values fall back to the first step.
    pub fn step_from_param(&self, param: Option<&str>) -> S {
        param
            .and_then(|p| p.trim().parse::<usize>().ok())
            .and_then(|i| S::ALL.get(i).copied())
            .unwrap_or_else(|| self.first())
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// What submitting the current step does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAction<S> {
    /// No backend identity yet: create, then advance to `next`.
    Create {
        next: S,
        workflow_state: &'static str,
        drafted: bool,
    },
    /// Update the existing entity, then advance to `next`.
    Update {
        next: S,
        workflow_state: &'static str,
        drafted: bool,
    },
    /// Terminal step: final create-or-update, then leave the wizard.
    Confirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackAction<S> {
    /// Leave the wizard from the first step, discarding the draft.
    Abandon,
    GoTo(S),
}

pub fn plan_next<S: WizardStep>(step: S, has_identity: bool) -> NextAction<S> {
    let registry = StepRegistry::<S>::new();
    let Some(next) = registry.next(step) else {
        return NextAction::Confirm;
    };
    let workflow_state = next.key();
    let drafted = !registry.is_terminal(step);
    if has_identity {
        NextAction::Update {
            next,
            workflow_state,
            drafted,
        }
    } else {
        NextAction::Create {
            next,
            workflow_state,
            drafted,
        }
    }
}

pub fn plan_back<S: WizardStep>(step: S) -> BackAction<S> {
    match StepRegistry::<S>::new().prev(step) {
        Some(prev) => BackAction::GoTo(prev),
        None => BackAction::Abandon,
    }
}

/// Add `workflow_state` and `drafted` to a request body.
pub fn tag_request(mut body: Value, workflow_state: &str, drafted: bool) -> Value {
    if let Value::Object(map) = &mut body {
        map.insert(WORKFLOW_STATE_KEY.into(), Value::from(workflow_state));
        map.insert(DRAFTED_KEY.into(), Value::Bool(drafted));
    }
    body
}

// ---------------------------------------------------------------------------
// Course wizard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourseStep {
    Information,
    Content,
    Publish,
}

impl WizardStep for CourseStep {
    const KIND: WizardKind = WizardKind::Course;
    const ALL: &'static [Self] = &[Self::Information, Self::Content, Self::Publish];

    fn index(self) -> usize {
        match self {
            Self::Information => 0,
            Self::Content => 1,
            Self::Publish => 2,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Information => "information",
            Self::Content => "content",
            Self::Publish => "publish",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Information => "Course information",
            Self::Content => "Content",
            Self::Publish => "Publish",
        }
    }

    fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::Information => &["name", "category", "departments"],
            Self::Content => &["modules"],
            Self::Publish => &["visibility"],
        }
    }

    // Content is persisted through the module/lesson endpoints.
    fn merges_draft(self) -> bool {
        !matches!(self, Self::Content)
    }

    fn validate(self, form: &mut FormState) -> Result<(), FieldErrors> {
        match self {
            Self::Information => form.validate(check::<CourseInfoForm>),
            Self::Content => form.validate(validate_course_content),
            Self::Publish => form.validate(check::<CoursePublishForm>),
        }
    }

    fn transform_to_request(self, fields: &Draft) -> Value {
        match self {
            Self::Information => course_information_body(fields),
            Self::Content => json!({ "modules": field(fields, "modules").unwrap_or(json!([])) }),
            Self::Publish => {
                let mut body = course_information_body(fields);
                if let Value::Object(map) = &mut body {
                    map.insert("visibility".into(), field(fields, "visibility").unwrap_or(Value::Null));
                    map.insert("publish_at".into(), field(fields, "publish_at").unwrap_or(Value::Null));
                }
                body
            }
        }
    }

    fn draft_from_detail(detail: &Value) -> Draft {
        draft_from_course(detail)
    }
}

fn validate_course_content(values: &Value) -> Result<(), FieldErrors> {
    let has_module = values
        .get("modules")
        .and_then(Value::as_array)
        .is_some_and(|m| !m.is_empty());
    if has_module {
        Ok(())
    } else {
        let mut errors = FieldErrors::new();
        errors.insert("modules".into(), "Add at least one module".into());
        Err(errors)
    }
}

fn course_information_body(fields: &Draft) -> Value {
    json!({
        "title": text(fields, "name"),
        "description": text(fields, "description"),
        "category_id": option_id(fields, "category"),
        "department_ids": option_ids(fields, "departments"),
        "thumbnail_url": field(fields, "thumbnail_url").unwrap_or(Value::Null),
    })
}

/// Seed step-local course fields from `GET /courses/{id}`.
pub fn draft_from_course(detail: &Value) -> Draft {
    let mut draft = Map::new();
    draft.insert("name".into(), Value::from(str_of(detail, "title")));
    draft.insert("description".into(), Value::from(str_of(detail, "description")));
    draft.insert("category".into(), select_option(detail.get("category"), "name"));
    draft.insert("departments".into(), select_options(detail.get("departments"), "name"));
    copy_present(detail, &mut draft, &["thumbnail_url", "visibility", "publish_at"]);
    draft
}

// ---------------------------------------------------------------------------
// Challenge wizard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChallengeStep {
    Information,
    Courses,
    Participants,
    Review,
}

impl WizardStep for ChallengeStep {
    const KIND: WizardKind = WizardKind::Challenge;
    const ALL: &'static [Self] = &[
        Self::Information,
        Self::Courses,
        Self::Participants,
        Self::Review,
    ];

    fn index(self) -> usize {
        match self {
            Self::Information => 0,
            Self::Courses => 1,
            Self::Participants => 2,
            Self::Review => 3,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Information => "information",
            Self::Courses => "courses",
            Self::Participants => "participants",
            Self::Review => "review",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Information => "Challenge information",
            Self::Courses => "Courses",
            Self::Participants => "Participants",
            Self::Review => "Review",
        }
    }

    fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::Information => &["name", "quarter", "start_date", "end_date"],
            Self::Courses => &["courses"],
            Self::Participants => &["departments"],
            Self::Review => &[],
        }
    }

    fn merges_draft(self) -> bool {
        true
    }

    fn validate(self, form: &mut FormState) -> Result<(), FieldErrors> {
        match self {
            Self::Information => form.validate(check::<ChallengeInfoForm>),
            Self::Courses => form.validate(check::<ChallengeCoursesForm>),
            Self::Participants => form.validate(check::<ChallengeParticipantsForm>),
            Self::Review => form.validate(|_| Ok(())),
        }
    }

    fn transform_to_request(self, fields: &Draft) -> Value {
        match self {
            Self::Information => challenge_information_body(fields),
            Self::Courses => json!({ "course_ids": option_ids(fields, "courses") }),
            Self::Participants => challenge_participants_body(fields),
            Self::Review => {
                let mut body = challenge_information_body(fields);
                if let Value::Object(map) = &mut body {
                    map.insert("course_ids".into(), json!(option_ids(fields, "courses")));
                    if let Value::Object(participants) = challenge_participants_body(fields) {
                        map.extend(participants);
                    }
                }
                body
            }
        }
    }

    fn draft_from_detail(detail: &Value) -> Draft {
        draft_from_challenge(detail)
    }
}

fn challenge_information_body(fields: &Draft) -> Value {
    json!({
        "title": text(fields, "name"),
        "description": text(fields, "description"),
        "quarter_id": option_id(fields, "quarter"),
        "start_date": field(fields, "start_date").unwrap_or(Value::Null),
        "end_date": field(fields, "end_date").unwrap_or(Value::Null),
    })
}

fn challenge_participants_body(fields: &Draft) -> Value {
    json!({
        "department_ids": option_ids(fields, "departments"),
        "max_participants": field(fields, "max_participants").unwrap_or(Value::Null),
    })
}

/// Seed step-local challenge fields from `GET /challenges/{id}`.
pub fn draft_from_challenge(detail: &Value) -> Draft {
    let mut draft = Map::new();
    draft.insert("name".into(), Value::from(str_of(detail, "title")));
    draft.insert("description".into(), Value::from(str_of(detail, "description")));
    draft.insert("quarter".into(), select_option(detail.get("quarter"), "name"));
    draft.insert("courses".into(), select_options(detail.get("courses"), "title"));
    draft.insert("departments".into(), select_options(detail.get("departments"), "name"));
    copy_present(detail, &mut draft, &["start_date", "end_date", "max_participants"]);
    draft
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn field(fields: &Draft, key: &str) -> Option<Value> {
    fields.get(key).filter(|v| !v.is_null()).cloned()
}

fn text(fields: &Draft, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// `{value, label}` -> `value`.
fn option_id(fields: &Draft, key: &str) -> Option<DbId> {
    fields.get(key).and_then(|o| o.get("value")).and_then(Value::as_i64)
}

/// `[{value, label}]` -> `[value]`.
fn option_ids(fields: &Draft, key: &str) -> Vec<DbId> {
    fields
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|o| o.get("value").and_then(Value::as_i64))
                .collect()
        })
        .unwrap_or_default()
}

fn str_of(detail: &Value, key: &str) -> String {
    detail.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

/// `{id, <label_key>}` -> `{value, label}`, or null.
fn select_option(entity: Option<&Value>, label_key: &str) -> Value {
    match entity.and_then(|e| Some((e.get("id")?.as_i64()?, e))) {
        Some((id, e)) => json!({ "value": id, "label": str_of(e, label_key) }),
        None => Value::Null,
    }
}

fn select_options(entities: Option<&Value>, label_key: &str) -> Value {
    let items = entities
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|e| select_option(Some(e), label_key))
                .filter(|o| !o.is_null())
                .collect()
        })
        .unwrap_or_default();
    Value::Array(items)
}

fn copy_present(detail: &Value, draft: &mut Draft, keys: &[&str]) {
    for key in keys {
        if let Some(value) = detail.get(*key).filter(|v| !v.is_null()) {
            draft.insert((*key).to_string(), value.clone());
        }
    }
}
