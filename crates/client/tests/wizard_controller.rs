//! Integration tests for the form-step controller, run against the
//! in-memory fake backend.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;

use campus_client::error::ClientError;
use campus_client::wizard::{BackOutcome, ChallengeWizard, CourseWizard, StepOutcome};
use campus_core::draft::DraftStore;
use campus_core::form_state::FormState;
use campus_core::location::Location;
use campus_core::notifications::NoticeLevel;
use campus_core::storage::FileStorage;
use campus_core::wizard::{ChallengeStep, CourseStep, WizardKind};

use common::{draft_store, notices, object, Call, FakeBackend};

fn course_info() -> FormState {
    FormState::from_values(object(json!({
        "name": "Rust 101",
        "description": "Ownership and borrowing",
        "category": { "value": 3, "label": "Engineering" },
        "departments": [{ "value": 1, "label": "R&D" }]
    })))
}

fn course_content() -> FormState {
    FormState::from_values(object(json!({
        "modules": [{ "id": 11, "ordered_number": 0, "lessons": [] }]
    })))
}

// ---------------------------------------------------------------------------
// Test: creating from the first step assigns identity and moves to step 1
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_step_creates_entity_and_navigates_to_edit_route() {
    let api = FakeBackend::new();
    let log = notices();
    let (_, drafts) = draft_store();
    let mut wizard = CourseWizard::mount(api.clone(), drafts, Location::new("/courses/new"), log.clone(), None);
    assert_eq!(wizard.step(), CourseStep::Information);

    let outcome = wizard.handle_next_step(&mut course_info()).await.unwrap();

    assert_eq!(outcome, StepOutcome::Advanced(CourseStep::Content));
    assert_eq!(wizard.entity_id(), Some(1));
    assert!(wizard.is_edit_mode());
    assert_eq!(wizard.location().href(), "/courses/1/edit?step=1");

    let calls = api.calls();
    assert_eq!(calls.len(), 1);
    assert_matches!(&calls[0], Call::CreateEntity(WizardKind::Course, body) => {
        assert_eq!(body["title"], "Rust 101");
        assert_eq!(body["category_id"], 3);
        assert_eq!(body["workflow_state"], "content");
        assert_eq!(body["drafted"], true);
    });

    let draft = wizard.draft().expect("draft persisted");
    assert_eq!(draft["name"], "Rust 101");
}

#[tokio::test]
async fn step_param_is_ignored_until_created() {
    let api = FakeBackend::new();
    let (_, drafts) = draft_store();
    let location = Location::parse("/courses/new?step=1");
    let mut wizard = CourseWizard::mount(api.clone(), drafts, location, notices(), None);

    assert_eq!(wizard.step(), CourseStep::Information);
    assert_eq!(wizard.location().href(), "/courses/new");

    // Content without identity is validated as the information step.
    let err = wizard.handle_next_step(&mut course_content()).await.unwrap_err();
    assert_matches!(err, ClientError::FieldErrors(errors) => {
        assert!(errors.contains_key("name"));
    });
    assert!(api.calls().is_empty());
    assert_eq!(wizard.entity_id(), None);
}

// ---------------------------------------------------------------------------
// Test: a full course run ends on the list with the draft cleared
// ---------------------------------------------------------------------------

#[tokio::test]
async fn course_wizard_runs_to_completion() {
    let api = FakeBackend::new();
    let log = notices();
    let (_, drafts) = draft_store();
    let mut wizard = CourseWizard::mount(api.clone(), drafts, Location::new("/courses/new"), log.clone(), None);

    wizard.handle_next_step(&mut course_info()).await.unwrap();
    let outcome = wizard.handle_next_step(&mut course_content()).await.unwrap();
    assert_eq!(outcome, StepOutcome::Advanced(CourseStep::Publish));
    assert_eq!(wizard.location().href(), "/courses/1/edit?step=2");

    // Content is sent but not persisted into the draft.
    assert!(wizard.draft().unwrap().get("modules").is_none());
    assert_matches!(&api.calls()[1], Call::UpdateEntity(WizardKind::Course, 1, body) => {
        assert_eq!(body["workflow_state"], "publish");
        assert_eq!(body["modules"][0]["id"], 11);
    });

    let mut publish = FormState::from_values(object(json!({ "visibility": "public" })));
    let outcome = wizard.handle_next_step(&mut publish).await.unwrap();

    assert_eq!(outcome, StepOutcome::Completed);
    assert!(wizard.draft().is_none());
    assert_eq!(wizard.location().href(), "/courses");
    assert_matches!(&api.calls()[2], Call::UpdateEntity(WizardKind::Course, 1, body) => {
        assert_eq!(body["title"], "Rust 101");
        assert_eq!(body["visibility"], "public");
        assert_eq!(body["workflow_state"], "publish");
        assert_eq!(body["drafted"], false);
    });
    assert_eq!(log.last().unwrap().message, "Course saved");
}

// ---------------------------------------------------------------------------
// Test: invalid input never reaches the backend
// ---------------------------------------------------------------------------

#[tokio::test]
async fn validation_failure_makes_no_call() {
    let api = FakeBackend::new();
    let (_, drafts) = draft_store();
    let mut wizard = CourseWizard::mount(api.clone(), drafts, Location::new("/courses/new"), notices(), None);

    let mut form = FormState::from_values(object(json!({ "name": "" })));
    let err = wizard.handle_next_step(&mut form).await.unwrap_err();

    assert_matches!(err, ClientError::FieldErrors(errors) => {
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("category"));
    });
    assert_eq!(form.error_for("name"), Some("Course name is required"));
    assert!(api.calls().is_empty());
    assert_eq!(wizard.step(), CourseStep::Information);
    assert!(wizard.draft().is_none());
}

// ---------------------------------------------------------------------------
// Test: a failed update keeps the step and the draft
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_update_does_not_advance() {
    let api = FakeBackend::new();
    let log = notices();
    let (_, drafts) = draft_store();
    let mut wizard = CourseWizard::mount(api.clone(), drafts, Location::new("/courses/new"), log.clone(), None);
    wizard.handle_next_step(&mut course_info()).await.unwrap();

    api.fail("update_entity");
    let err = wizard.handle_next_step(&mut course_content()).await.unwrap_err();

    assert_matches!(err, ClientError::Api { status: 500, .. });
    assert_eq!(wizard.step(), CourseStep::Content);
    assert_eq!(wizard.location().href(), "/courses/1/edit?step=1");
    assert_eq!(wizard.draft().unwrap()["name"], "Rust 101");
    let errors = log.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].level, NoticeLevel::Error);

    // Resubmitting once the backend recovers succeeds.
    api.heal("update_entity");
    let outcome = wizard.handle_next_step(&mut course_content()).await.unwrap();
    assert_eq!(outcome, StepOutcome::Advanced(CourseStep::Publish));
}

// ---------------------------------------------------------------------------
// Test: back navigation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn back_from_first_step_abandons_without_backend_calls() {
    let api = FakeBackend::new();
    let (_, drafts) = draft_store();
    drafts.save(&object(json!({ "name": "half done" }))).unwrap();
    let mut wizard = CourseWizard::mount(api.clone(), drafts, Location::new("/courses/new"), notices(), None);

    let outcome = wizard.handle_back().unwrap();

    assert_eq!(outcome, BackOutcome::Abandoned);
    assert!(wizard.draft().is_none());
    assert_eq!(wizard.location().href(), "/courses");
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn back_from_later_step_keeps_draft() {
    let api = FakeBackend::new();
    let (_, drafts) = draft_store();
    drafts.save(&object(json!({ "name": "Rust 101" }))).unwrap();
    let location = Location::parse("/courses/5/edit?step=2");
    let mut wizard = CourseWizard::mount(api.clone(), drafts, location, notices(), Some(5));
    assert_eq!(wizard.step(), CourseStep::Publish);

    let outcome = wizard.handle_back().unwrap();

    assert_eq!(outcome, BackOutcome::Moved(CourseStep::Content));
    assert_eq!(wizard.location().href(), "/courses/5/edit?step=1");
    assert_eq!(wizard.draft().unwrap()["name"], "Rust 101");
    assert!(api.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Test: edit mode seeds the draft once
// ---------------------------------------------------------------------------

#[tokio::test]
async fn edit_mode_seeds_draft_once() {
    let api = FakeBackend::new();
    api.seed_entity(
        WizardKind::Course,
        4,
        json!({
            "id": 4,
            "title": "Rust 101",
            "description": "Intro",
            "category": { "id": 3, "name": "Engineering" },
            "departments": [{ "id": 1, "name": "R&D" }],
            "visibility": "private"
        }),
    );
    let (_, drafts) = draft_store();
    let location = Location::parse("/courses/4/edit?step=0");
    let mut wizard = CourseWizard::mount(api.clone(), drafts, location, notices(), Some(4));

    assert!(wizard.load_for_edit().await.unwrap());
    let draft = wizard.draft().unwrap();
    assert_eq!(draft["name"], "Rust 101");
    assert_eq!(draft["category"], json!({ "value": 3, "label": "Engineering" }));

    // A second load does not refetch.
    assert!(!wizard.load_for_edit().await.unwrap());
    assert_eq!(api.calls().len(), 1);
}

#[tokio::test]
async fn edit_mode_keeps_an_existing_draft() {
    let api = FakeBackend::new();
    api.seed_entity(WizardKind::Course, 4, json!({ "id": 4, "title": "Server title" }));
    let (_, drafts) = draft_store();
    drafts.save(&object(json!({ "name": "Unsaved local title" }))).unwrap();
    let mut wizard = CourseWizard::mount(api.clone(), drafts, Location::new("/courses/4/edit"), notices(), Some(4));

    assert!(!wizard.load_for_edit().await.unwrap());
    assert_eq!(wizard.form().get_value("name"), Some(&json!("Unsaved local title")));
}

// ---------------------------------------------------------------------------
// Test: confirm is terminal-only
// ---------------------------------------------------------------------------

#[tokio::test]
async fn confirm_before_terminal_step_is_rejected() {
    let api = FakeBackend::new();
    let (_, drafts) = draft_store();
    let mut wizard = CourseWizard::mount(api.clone(), drafts, Location::new("/courses/new"), notices(), None);

    let err = wizard.confirm().await.unwrap_err();

    assert_matches!(err, ClientError::Core(_));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn challenge_review_confirm_sends_whole_draft() {
    let api = FakeBackend::new();
    let log = notices();
    let (_, drafts) = draft_store();
    drafts
        .save(&object(json!({
            "name": "Spring sprint",
            "quarter": { "value": 2, "label": "Q2" },
            "start_date": "2026-04-01",
            "end_date": "2026-06-30",
            "courses": [{ "value": 7, "label": "Rust 101" }],
            "departments": [{ "value": 1, "label": "R&D" }]
        })))
        .unwrap();
    let location = Location::parse("/challenges/9/edit?step=3");
    let mut wizard = ChallengeWizard::mount(api.clone(), drafts, location, log.clone(), Some(9));
    assert_eq!(wizard.step(), ChallengeStep::Review);

    wizard.confirm().await.unwrap();

    assert_matches!(&api.calls()[0], Call::UpdateEntity(WizardKind::Challenge, 9, body) => {
        assert_eq!(body["title"], "Spring sprint");
        assert_eq!(body["course_ids"], json!([7]));
        assert_eq!(body["workflow_state"], "review");
        assert_eq!(body["drafted"], false);
    });
    assert!(wizard.draft().is_none());
    assert_eq!(wizard.location().href(), "/challenges");
    assert_eq!(log.last().unwrap().message, "Challenge saved");
}

// ---------------------------------------------------------------------------
// Test: a reload restores the draft from file-backed storage
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reload_restores_draft_from_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let api = FakeBackend::new();

    let drafts = DraftStore::new(FileStorage::new(dir.path()));
    let mut wizard = CourseWizard::mount(api.clone(), drafts, Location::new("/courses/new"), notices(), None);
    wizard.handle_next_step(&mut course_info()).await.unwrap();
    let href = wizard.location().href();
    drop(wizard);

    let drafts = DraftStore::new(FileStorage::new(dir.path()));
    let reloaded = CourseWizard::mount(api.clone(), drafts, Location::parse(&href), notices(), Some(1));

    assert_eq!(reloaded.step(), CourseStep::Content);
    let form = reloaded.form();
    assert_eq!(form.get_value("name"), Some(&json!("Rust 101")));
    assert_eq!(form.get_value("departments"), Some(&json!([{ "value": 1, "label": "R&D" }])));
}

#[tokio::test]
async fn shared_storage_is_visible_to_a_second_store() {
    let (storage, drafts) = draft_store();
    let api = FakeBackend::new();
    let mut wizard = CourseWizard::mount(api, drafts, Location::new("/courses/new"), notices(), None);
    wizard.handle_next_step(&mut course_info()).await.unwrap();

    let other = DraftStore::new(Arc::clone(&storage));
    assert_eq!(other.load().unwrap()["name"], "Rust 101");
}
