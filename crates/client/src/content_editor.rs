//! Editor for the module/lesson tree of one course.
//!
//! Adding and removing nodes calls the backend first and touches local state
//! only on success. Drag reordering and module moves are local; the order is
//! sent with the Content step via [`ContentTreeEditor::write_to_form`].
//! Lesson sub-editors (video, article images, quiz and practice imports)
//! save the lesson's type-specific payload through the same seam.

use std::sync::Arc;

use serde_json::Value;

use campus_core::content_tree::{ContentTree, DragEnd, Lesson, LessonBody, LessonType, NewLesson, NewModule};
use campus_core::error::CoreError;
use campus_core::form_state::FormState;
use campus_core::notifications::{Notice, Notifier};
use campus_core::quiz_import::{parse_practice_csv, parse_quiz_csv};
use campus_core::types::DbId;

use crate::api::ContentApi;
use crate::error::{ClientError, ClientResult};

/// Form field the Content step validates.
pub const MODULES_FIELD: &str = "modules";

pub struct ContentTreeEditor<A> {
    api: Arc<A>,
    course_id: DbId,
    tree: ContentTree,
    notifier: Arc<dyn Notifier>,
}

impl<A: ContentApi> ContentTreeEditor<A> {
    pub fn new(api: Arc<A>, course_id: DbId, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            course_id,
            tree: ContentTree::default(),
            notifier,
        }
    }

    pub fn course_id(&self) -> DbId {
        self.course_id
    }

    pub fn tree(&self) -> &ContentTree {
        &self.tree
    }

    /// Replace local state with the course's modules from the backend.
    pub async fn load(&mut self) -> ClientResult<()> {
        match self.api.list_modules(self.course_id).await {
            Ok(modules) => {
                self.tree = ContentTree::from_modules(modules);
                Ok(())
            }
            Err(e) => Err(self.report("load modules", e)),
        }
    }

    // -- nodes --

    /// Create a module at the end of the course. Returns its id.
    pub async fn add_module(&mut self, title: &str) -> ClientResult<DbId> {
        let request = NewModule {
            title: title.trim().to_string(),
            description: String::new(),
            course_id: self.course_id,
            ordered_number: self.tree.next_module_number(),
        };
        let module = match self.api.create_module(&request).await {
            Ok(module) => module,
            Err(e) => return Err(self.report("add module", e)),
        };
        let id = module.id;
        self.tree.push_module(module);
        tracing::info!(course_id = self.course_id, module_id = id, "Module added");
        Ok(id)
    }

    pub async fn remove_module(&mut self, index: usize, module_id: DbId) -> ClientResult<()> {
        if self.tree.modules().get(index).map(|m| m.id) != Some(module_id) {
            return Err(CoreError::NotFound {
                entity: "Module",
                id: module_id,
            }
            .into());
        }
        if let Err(e) = self.api.delete_module(module_id).await {
            return Err(self.report("remove module", e));
        }
        self.tree.remove_module(index, module_id)?;
        tracing::info!(course_id = self.course_id, module_id, "Module removed");
        Ok(())
    }

    /// Create an empty lesson of `lesson_type` at the end of a module.
    pub async fn add_lesson(&mut self, module_id: DbId, lesson_type: LessonType) -> ClientResult<DbId> {
        let request = NewLesson {
            title: lesson_type.default_title().to_string(),
            lesson_type,
            module_id,
            index: self.tree.next_lesson_index(module_id)?,
        };
        let lesson = match self.api.create_lesson(&request).await {
            Ok(lesson) => lesson,
            Err(e) => return Err(self.report("add lesson", e)),
        };
        let id = lesson.id;
        self.tree.push_lesson(lesson)?;
        tracing::info!(module_id, lesson_id = id, kind = lesson_type.as_str(), "Lesson added");
        Ok(id)
    }

    pub async fn remove_lesson(&mut self, module_id: DbId, index: usize, lesson_id: DbId) -> ClientResult<()> {
        let matches = self
            .tree
            .module_position(module_id)
            .and_then(|p| self.tree.modules()[p].lessons.get(index))
            .is_some_and(|l| l.id == lesson_id);
        if !matches {
            return Err(CoreError::NotFound {
                entity: "Lesson",
                id: lesson_id,
            }
            .into());
        }
        if let Err(e) = self.api.delete_lesson(lesson_id).await {
            return Err(self.report("remove lesson", e));
        }
        self.tree.remove_lesson(module_id, index, lesson_id)?;
        tracing::info!(module_id, lesson_id, "Lesson removed");
        Ok(())
    }

    // -- ordering --

    /// Apply a lesson drag locally. Returns `true` if the tree changed.
    pub fn on_drag_end(&mut self, drag: &DragEnd) -> bool {
        self.tree.apply_drag_end(drag)
    }

    /// Move a module locally. Out-of-range moves are logged and ignored.
    pub fn move_module(&mut self, from: usize, to: usize) -> bool {
        match self.tree.move_module(from, to) {
            Ok(changed) => changed,
            Err(e) => {
                tracing::warn!(error = %e, from, to, "Ignoring module move");
                false
            }
        }
    }

    /// Current order as sent with the Content step.
    pub fn ordering_snapshot(&self) -> ClientResult<Value> {
        serde_json::to_value(self.tree.ordering()).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Put the current order into the Content step form.
    pub fn write_to_form(&self, form: &mut FormState) -> ClientResult<()> {
        form.set_value(MODULES_FIELD, self.ordering_snapshot()?)?;
        Ok(())
    }

    // -- lesson payloads --

    pub async fn set_video_url(&mut self, module_id: DbId, lesson_id: DbId, url: String) -> ClientResult<()> {
        self.save_body(module_id, lesson_id, LessonBody::Video { video_url: Some(url) })
            .await
    }

    pub async fn attach_image(&mut self, module_id: DbId, lesson_id: DbId, url: String) -> ClientResult<()> {
        let mut image_files = match self.require_lesson(module_id, lesson_id)?.body.clone() {
            LessonBody::Article { image_files } => image_files,
            other => return Err(type_mismatch(LessonType::Article, other.lesson_type())),
        };
        image_files.push(url);
        self.save_body(module_id, lesson_id, LessonBody::Article { image_files })
            .await
    }

    /// Replace a quiz lesson's questions with an imported sheet. Returns the
    /// number of questions.
    pub async fn import_quiz(&mut self, module_id: DbId, lesson_id: DbId, csv: &str) -> ClientResult<usize> {
        let questions = parse_quiz_csv(csv)?;
        let count = questions.len();
        self.save_body(module_id, lesson_id, LessonBody::Quiz { questions })
            .await?;
        Ok(count)
    }

    pub async fn import_practice(&mut self, module_id: DbId, lesson_id: DbId, csv: &str) -> ClientResult<usize> {
        let practices = parse_practice_csv(csv)?;
        let count = practices.len();
        self.save_body(module_id, lesson_id, LessonBody::Practice { practices })
            .await?;
        Ok(count)
    }

    async fn save_body(&mut self, module_id: DbId, lesson_id: DbId, body: LessonBody) -> ClientResult<()> {
        let current = self.require_lesson(module_id, lesson_id)?;
        if current.lesson_type() != body.lesson_type() {
            return Err(type_mismatch(current.lesson_type(), body.lesson_type()));
        }
        let updated = Lesson {
            body,
            ..current.clone()
        };
        let saved = match self.api.update_lesson(&updated).await {
            Ok(saved) => saved,
            Err(e) => return Err(self.report("save lesson", e)),
        };
        self.tree.replace_lesson(saved)?;
        Ok(())
    }

    fn require_lesson(&self, module_id: DbId, lesson_id: DbId) -> ClientResult<&Lesson> {
        self.tree.lesson(module_id, lesson_id).ok_or_else(|| {
            CoreError::NotFound {
                entity: "Lesson",
                id: lesson_id,
            }
            .into()
        })
    }

    fn report(&self, action: &str, error: ClientError) -> ClientError {
        tracing::error!(course_id = self.course_id, action, error = %error, "Content request failed");
        self.notifier.notify(Notice::error(error.user_message()));
        error
    }
}

fn type_mismatch(expected: LessonType, got: LessonType) -> ClientError {
    CoreError::Validation(format!(
        "lesson is a {} lesson, not {}",
        expected.as_str(),
        got.as_str()
    ))
    .into()
}
