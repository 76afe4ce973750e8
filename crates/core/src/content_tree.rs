//! Course content tree: ordered modules, each holding ordered lessons.
//!
//! Adding and removing nodes goes through the backend first (see the content
//! editor in `campus-client`); this module owns the local tree and the pure
//! drag-and-drop reordering. Reordering never calls the backend: the new
//! order is sent when the Content step of the course wizard is submitted.
//!
//! Invariant: after every reorder or removal, the lesson `index` values of
//! each module form the contiguous sequence `0..len`, and module
//! `ordered_number` values do too.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::quiz_import::{PracticeItem, QuizQuestion};
use crate::types::DbId;

/// Prefix of droppable container ids rendered for module lesson lists.
pub const MODULE_CONTAINER_PREFIX: &str = "module-";

// ---------------------------------------------------------------------------
// Lessons
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonType {
    Video,
    Article,
    Quiz,
    Practice,
}

impl LessonType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Article => "article",
            Self::Quiz => "quiz",
            Self::Practice => "practice",
        }
    }

    /// Title given to a freshly added lesson of this type.
    pub fn default_title(self) -> &'static str {
        match self {
            Self::Video => "New video lesson",
            Self::Article => "New article",
            Self::Quiz => "New quiz",
            Self::Practice => "New practice",
        }
    }
}

/// The type-specific payload of a lesson. Exactly one is active, selected by
/// the `type` field on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LessonBody {
    Video {
        #[serde(default)]
        video_url: Option<String>,
    },
    Article {
        #[serde(default)]
        image_files: Vec<String>,
    },
    Quiz {
        #[serde(default)]
        questions: Vec<QuizQuestion>,
    },
    Practice {
        #[serde(default)]
        practices: Vec<PracticeItem>,
    },
}

impl LessonBody {
    pub fn empty(lesson_type: LessonType) -> Self {
        match lesson_type {
            LessonType::Video => Self::Video { video_url: None },
            LessonType::Article => Self::Article { image_files: Vec::new() },
            LessonType::Quiz => Self::Quiz { questions: Vec::new() },
            LessonType::Practice => Self::Practice { practices: Vec::new() },
        }
    }

    pub fn lesson_type(&self) -> LessonType {
        match self {
            Self::Video { .. } => LessonType::Video,
            Self::Article { .. } => LessonType::Article,
            Self::Quiz { .. } => LessonType::Quiz,
            Self::Practice { .. } => LessonType::Practice,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: DbId,
    pub title: String,
    /// Minutes.
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub content: String,
    pub index: u32,
    pub module_id: DbId,
    #[serde(flatten)]
    pub body: LessonBody,
}

impl Lesson {
    pub fn lesson_type(&self) -> LessonType {
        self.body.lesson_type()
    }
}

// ---------------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: DbId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub course_id: DbId,
    pub ordered_number: u32,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

/// Body of the module-create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewModule {
    pub title: String,
    pub description: String,
    pub course_id: DbId,
    pub ordered_number: u32,
}

/// Body of the lesson-create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLesson {
    pub title: String,
    #[serde(rename = "type")]
    pub lesson_type: LessonType,
    pub module_id: DbId,
    pub index: u32,
}

/// Order of one module and its lessons, as sent on Content step submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleOrder {
    pub id: DbId,
    pub ordered_number: u32,
    pub lessons: Vec<LessonOrder>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonOrder {
    pub id: DbId,
    pub index: u32,
    pub module_id: DbId,
}

// ---------------------------------------------------------------------------
// Drag and drop
// ---------------------------------------------------------------------------

/// Result of a drag gesture, independent of any UI drag library.
///
/// Containers are the droppable ids of module lesson lists, either
/// `"module-<index>"` or a bare module index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragEnd {
    pub source_container: String,
    pub source_index: usize,
    pub dest_container: String,
    pub dest_index: usize,
}

impl DragEnd {
    pub fn new(source_module: usize, source_index: usize, dest_module: usize, dest_index: usize) -> Self {
        Self {
            source_container: container_id(source_module),
            source_index,
            dest_container: container_id(dest_module),
            dest_index,
        }
    }
}

/// Droppable id of the lesson list of the module at `module_index`.
pub fn container_id(module_index: usize) -> String {
    format!("{MODULE_CONTAINER_PREFIX}{module_index}")
}

/// Parse a droppable id back into a module index.
pub fn parse_container(id: &str) -> Option<usize> {
    id.strip_prefix(MODULE_CONTAINER_PREFIX)
        .unwrap_or(id)
        .parse::<usize>()
        .ok()
}

/// Compute the module list after a lesson drag.
///
/// Returns `Ok(None)` when the drop lands where it started, `Ok(Some(list))`
/// with the whole rebuilt list otherwise. Unparseable or out-of-bounds module
/// containers and a missing source lesson are rejected; `modules` is never
/// touched. A destination index past the end appends.
pub fn reorder_lessons(modules: &[Module], drag: &DragEnd) -> Result<Option<Vec<Module>>, CoreError> {
    let source = resolve_container(modules, &drag.source_container)?;
    let dest = resolve_container(modules, &drag.dest_container)?;

    if source == dest && drag.source_index == drag.dest_index {
        return Ok(None);
    }

    let source_len = modules[source].lessons.len();
    if drag.source_index >= source_len {
        return Err(CoreError::Reorder(format!(
            "lesson {} does not exist in module {source} ({source_len} lessons)",
            drag.source_index
        )));
    }

    let mut next = modules.to_vec();

    if source == dest {
        let lessons = &mut next[source].lessons;
        let lesson = lessons.remove(drag.source_index);
        let at = drag.dest_index.min(lessons.len());
        lessons.insert(at, lesson);
        reindex_lessons(lessons);
    } else {
        let mut lesson = next[source].lessons.remove(drag.source_index);
        lesson.module_id = next[dest].id;

        let dest_lessons = &mut next[dest].lessons;
        let at = drag.dest_index.min(dest_lessons.len());
        dest_lessons.insert(at, lesson);

        reindex_lessons(&mut next[source].lessons);
        reindex_lessons(&mut next[dest].lessons);
    }

    Ok(Some(next))
}

fn resolve_container(modules: &[Module], id: &str) -> Result<usize, CoreError> {
    let index = parse_container(id)
        .ok_or_else(|| CoreError::Reorder(format!("drop container '{id}' is not a module index")))?;
    if index >= modules.len() {
        return Err(CoreError::Reorder(format!(
            "module index {index} is out of bounds ({} modules)",
            modules.len()
        )));
    }
    Ok(index)
}

/// Assign `index = position` to every lesson.
pub fn reindex_lessons(lessons: &mut [Lesson]) {
    for (position, lesson) in lessons.iter_mut().enumerate() {
        lesson.index = position as u32;
    }
}

/// Assign `ordered_number = position` to every module.
pub fn renumber_modules(modules: &mut [Module]) {
    for (position, module) in modules.iter_mut().enumerate() {
        module.ordered_number = position as u32;
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// Local module/lesson state of the course being edited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentTree {
    modules: Vec<Module>,
}

impl ContentTree {
    /// Build from backend data, ordering modules by `ordered_number` and
    /// lessons by `index`.
    pub fn from_modules(mut modules: Vec<Module>) -> Self {
        modules.sort_by_key(|m| m.ordered_number);
        for module in &mut modules {
            module.lessons.sort_by_key(|l| l.index);
        }
        Self { modules }
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn module_position(&self, module_id: DbId) -> Option<usize> {
        self.modules.iter().position(|m| m.id == module_id)
    }

    pub fn lesson(&self, module_id: DbId, lesson_id: DbId) -> Option<&Lesson> {
        let position = self.module_position(module_id)?;
        self.modules[position].lessons.iter().find(|l| l.id == lesson_id)
    }

    /// `ordered_number` for the next created module.
    pub fn next_module_number(&self) -> u32 {
        self.modules.len() as u32
    }

    /// `index` for the next lesson created in `module_id`.
    pub fn next_lesson_index(&self, module_id: DbId) -> Result<u32, CoreError> {
        let position = self.require_module(module_id)?;
        Ok(self.modules[position].lessons.len() as u32)
    }

    /// Apply a lesson drag. Rejected drags are logged and leave the tree
    /// unchanged. Returns `true` if the tree changed.
    pub fn apply_drag_end(&mut self, drag: &DragEnd) -> bool {
        match reorder_lessons(&self.modules, drag) {
            Ok(Some(next)) => {
                self.modules = next;
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, ?drag, "Ignoring lesson drag");
                false
            }
        }
    }

    /// Move a whole module and renumber `ordered_number`.
    pub fn move_module(&mut self, from: usize, to: usize) -> Result<bool, CoreError> {
        let len = self.modules.len();
        if from >= len || to >= len {
            return Err(CoreError::Reorder(format!(
                "module move {from} -> {to} is out of bounds ({len} modules)"
            )));
        }
        if from == to {
            return Ok(false);
        }
        let mut next = self.modules.clone();
        let module = next.remove(from);
        next.insert(to, module);
        renumber_modules(&mut next);
        self.modules = next;
        Ok(true)
    }

    /// Append a module returned by the backend.
    pub fn push_module(&mut self, mut module: Module) {
        module.ordered_number = self.next_module_number();
        self.modules.push(module);
    }

    /// Remove the module at `index` if it is `module_id`; remaining modules
    /// are renumbered.
    pub fn remove_module(&mut self, index: usize, module_id: DbId) -> Result<Module, CoreError> {
        match self.modules.get(index) {
            Some(m) if m.id == module_id => {}
            _ => {
                return Err(CoreError::NotFound {
                    entity: "Module",
                    id: module_id,
                })
            }
        }
        let removed = self.modules.remove(index);
        renumber_modules(&mut self.modules);
        Ok(removed)
    }

    /// Append a lesson returned by the backend to its module.
    pub fn push_lesson(&mut self, mut lesson: Lesson) -> Result<(), CoreError> {
        let position = self.require_module(lesson.module_id)?;
        let lessons = &mut self.modules[position].lessons;
        lesson.index = lessons.len() as u32;
        lessons.push(lesson);
        Ok(())
    }

    /// Remove the lesson at `index` of `module_id` if it is `lesson_id`;
    /// remaining lessons are reindexed.
    pub fn remove_lesson(&mut self, module_id: DbId, index: usize, lesson_id: DbId) -> Result<Lesson, CoreError> {
        let position = self.require_module(module_id)?;
        let lessons = &mut self.modules[position].lessons;
        match lessons.get(index) {
            Some(l) if l.id == lesson_id => {}
            _ => {
                return Err(CoreError::NotFound {
                    entity: "Lesson",
                    id: lesson_id,
                })
            }
        }
        let removed = lessons.remove(index);
        reindex_lessons(lessons);
        Ok(removed)
    }

    /// Replace a lesson in place (same id), e.g. after its video upload.
    pub fn replace_lesson(&mut self, lesson: Lesson) -> Result<(), CoreError> {
        let position = self.require_module(lesson.module_id)?;
        let slot = self.modules[position]
            .lessons
            .iter_mut()
            .find(|l| l.id == lesson.id)
            .ok_or(CoreError::NotFound {
                entity: "Lesson",
                id: lesson.id,
            })?;
        let index = slot.index;
        *slot = Lesson { index, ..lesson };
        Ok(())
    }

    /// Current order, for the Content step request.
    pub fn ordering(&self) -> Vec<ModuleOrder> {
        self.modules
            .iter()
            .map(|m| ModuleOrder {
                id: m.id,
                ordered_number: m.ordered_number,
                lessons: m
                    .lessons
                    .iter()
                    .map(|l| LessonOrder {
                        id: l.id,
                        index: l.index,
                        module_id: m.id,
                    })
                    .collect(),
            })
            .collect()
    }

    /// True if module numbers and every lesson index list are `0..len`.
    pub fn is_contiguous(&self) -> bool {
        self.modules
            .iter()
            .enumerate()
            .all(|(i, m)| m.ordered_number as usize == i)
            && self.modules.iter().all(|m| {
                m.lessons
                    .iter()
                    .enumerate()
                    .all(|(i, l)| l.index as usize == i)
            })
    }

    fn require_module(&self, module_id: DbId) -> Result<usize, CoreError> {
        self.module_position(module_id).ok_or(CoreError::NotFound {
            entity: "Module",
            id: module_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn lesson(id: DbId, module_id: DbId, index: u32) -> Lesson {
        Lesson {
            id,
            title: format!("Lesson {id}"),
            duration: 5,
            content: String::new(),
            index,
            module_id,
            body: LessonBody::empty(LessonType::Article),
        }
    }

    fn module(id: DbId, ordered_number: u32, lesson_ids: &[DbId]) -> Module {
        Module {
            id,
            title: format!("Module {id}"),
            description: String::new(),
            course_id: 1,
            ordered_number,
            lessons: lesson_ids
                .iter()
                .enumerate()
                .map(|(i, lid)| lesson(*lid, id, i as u32))
                .collect(),
        }
    }

    fn sample() -> Vec<Module> {
        vec![module(10, 0, &[100, 101, 102]), module(20, 1, &[200, 201])]
    }

    fn ids(module: &Module) -> Vec<DbId> {
        module.lessons.iter().map(|l| l.id).collect()
    }

    // -- wire format --

    #[test]
    fn lesson_type_tag_selects_payload() {
        let lesson: Lesson = serde_json::from_value(json!({
            "id": 1, "title": "Intro", "type": "video", "duration": 3,
            "content": "", "index": 0, "module_id": 9,
            "video_url": "https://cdn/v.mp4"
        }))
        .unwrap();
        assert_eq!(lesson.lesson_type(), LessonType::Video);
        assert_matches!(lesson.body, LessonBody::Video { video_url: Some(ref u) } if u == "https://cdn/v.mp4");

        let back = serde_json::to_value(&lesson).unwrap();
        assert_eq!(back["type"], "video");
        assert!(back.get("questions").is_none());
    }

    #[test]
    fn container_ids_parse() {
        assert_eq!(parse_container("module-3"), Some(3));
        assert_eq!(parse_container("2"), Some(2));
        assert_eq!(parse_container("module-x"), None);
        assert_eq!(parse_container("lessons"), None);
    }

    // -- reorder_lessons --

    #[test]
    fn same_position_is_noop() {
        let modules = sample();
        assert_matches!(reorder_lessons(&modules, &DragEnd::new(0, 1, 0, 1)), Ok(None));

        let mut tree = ContentTree::from_modules(sample());
        assert!(!tree.apply_drag_end(&DragEnd::new(1, 0, 1, 0)));
        assert_eq!(tree.modules(), sample().as_slice());
    }

    #[test]
    fn move_within_module_reindexes() {
        let next = reorder_lessons(&sample(), &DragEnd::new(0, 0, 0, 2)).unwrap().unwrap();
        assert_eq!(ids(&next[0]), vec![101, 102, 100]);
        assert_eq!(next[0].lessons.iter().map(|l| l.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(next[1], sample()[1]);
    }

    #[test]
    fn move_across_modules_reindexes_both_and_reparents() {
        let next = reorder_lessons(&sample(), &DragEnd::new(0, 1, 1, 1)).unwrap().unwrap();
        assert_eq!(ids(&next[0]), vec![100, 102]);
        assert_eq!(ids(&next[1]), vec![200, 101, 201]);
        assert_eq!(next[1].lessons[1].module_id, 20);
        assert!(ContentTree::from_modules(next).is_contiguous());
    }

    #[test]
    fn dest_index_past_end_appends() {
        let next = reorder_lessons(&sample(), &DragEnd::new(1, 0, 0, 99)).unwrap().unwrap();
        assert_eq!(ids(&next[0]), vec![100, 101, 102, 200]);
        assert_eq!(next[0].lessons[3].index, 3);
    }

    #[test]
    fn move_into_empty_module() {
        let modules = vec![module(10, 0, &[100]), module(20, 1, &[])];
        let next = reorder_lessons(&modules, &DragEnd::new(0, 0, 1, 0)).unwrap().unwrap();
        assert!(next[0].lessons.is_empty());
        assert_eq!(ids(&next[1]), vec![100]);
    }

    #[test]
    fn out_of_bounds_module_is_rejected_without_mutation() {
        let mut tree = ContentTree::from_modules(sample());
        let before = tree.clone();

        assert_matches!(
            reorder_lessons(tree.modules(), &DragEnd::new(0, 0, 5, 0)),
            Err(CoreError::Reorder(_))
        );
        assert!(!tree.apply_drag_end(&DragEnd::new(7, 0, 0, 0)));
        assert_eq!(tree, before);
    }

    #[test]
    fn unparseable_container_is_rejected() {
        let drag = DragEnd {
            source_container: "module-0".into(),
            source_index: 0,
            dest_container: "trash".into(),
            dest_index: 0,
        };
        assert_matches!(reorder_lessons(&sample(), &drag), Err(CoreError::Reorder(_)));
    }

    #[test]
    fn missing_source_lesson_is_rejected() {
        assert_matches!(
            reorder_lessons(&sample(), &DragEnd::new(1, 5, 0, 0)),
            Err(CoreError::Reorder(_))
        );
    }

    #[test]
    fn indices_stay_contiguous_over_many_drags() {
        let mut tree = ContentTree::from_modules(vec![
            module(1, 0, &[11, 12, 13, 14]),
            module(2, 1, &[21, 22]),
            module(3, 2, &[]),
            module(4, 3, &[41, 42, 43]),
        ]);
        let total: usize = tree.modules().iter().map(|m| m.lessons.len()).sum();

        // Deterministic pseudo-random sequence of in-bounds drags.
        let mut seed: u64 = 0x5eed;
        let mut next = |bound: usize| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((seed >> 33) as usize) % bound.max(1)
        };

        for _ in 0..500 {
            let non_empty: Vec<usize> = tree
                .modules()
                .iter()
                .enumerate()
                .filter(|(_, m)| !m.lessons.is_empty())
                .map(|(i, _)| i)
                .collect();
            let src = non_empty[next(non_empty.len())];
            let src_idx = next(tree.modules()[src].lessons.len());
            let dst = next(tree.len());
            let dst_idx = next(tree.modules()[dst].lessons.len() + 1);

            tree.apply_drag_end(&DragEnd::new(src, src_idx, dst, dst_idx));

            assert!(tree.is_contiguous());
            let count: usize = tree.modules().iter().map(|m| m.lessons.len()).sum();
            assert_eq!(count, total);
            for m in tree.modules() {
                assert!(m.lessons.iter().all(|l| l.module_id == m.id));
            }
        }
    }

    // -- tree mutations --

    #[test]
    fn push_and_remove_renumber() {
        let mut tree = ContentTree::from_modules(sample());
        tree.push_module(module(30, 99, &[]));
        assert_eq!(tree.modules()[2].ordered_number, 2);

        let removed = tree.remove_module(0, 10).unwrap();
        assert_eq!(removed.id, 10);
        assert_eq!(
            tree.modules().iter().map(|m| (m.id, m.ordered_number)).collect::<Vec<_>>(),
            vec![(20, 0), (30, 1)]
        );

        tree.push_lesson(lesson(202, 20, 0)).unwrap();
        assert_eq!(tree.modules()[0].lessons[2].index, 2);

        tree.remove_lesson(20, 0, 200).unwrap();
        assert_eq!(ids(&tree.modules()[0]), vec![201, 202]);
        assert!(tree.is_contiguous());
    }

    #[test]
    fn remove_with_stale_index_is_not_found() {
        let mut tree = ContentTree::from_modules(sample());
        assert_matches!(tree.remove_module(0, 20), Err(CoreError::NotFound { .. }));
        assert_matches!(tree.remove_lesson(10, 9, 100), Err(CoreError::NotFound { .. }));
        assert_matches!(tree.push_lesson(lesson(1, 99, 0)), Err(CoreError::NotFound { .. }));
        assert_eq!(tree.modules(), sample().as_slice());
    }

    #[test]
    fn move_module_renumbers() {
        let mut tree = ContentTree::from_modules(vec![
            module(1, 0, &[]),
            module(2, 1, &[]),
            module(3, 2, &[]),
        ]);
        assert!(tree.move_module(2, 0).unwrap());
        assert_eq!(
            tree.modules().iter().map(|m| (m.id, m.ordered_number)).collect::<Vec<_>>(),
            vec![(3, 0), (1, 1), (2, 2)]
        );
        assert!(!tree.move_module(1, 1).unwrap());
        assert!(tree.move_module(0, 3).is_err());
    }

    #[test]
    fn from_modules_sorts_backend_order() {
        let mut shuffled = sample();
        shuffled.reverse();
        shuffled[1].lessons.reverse();
        let tree = ContentTree::from_modules(shuffled);
        assert_eq!(tree.modules(), sample().as_slice());
    }

    #[test]
    fn ordering_snapshot() {
        let tree = ContentTree::from_modules(sample());
        let order = tree.ordering();
        assert_eq!(order.len(), 2);
        assert_eq!(order[1].lessons[1], LessonOrder { id: 201, index: 1, module_id: 20 });
    }

    #[test]
    fn replace_lesson_keeps_position() {
        let mut tree = ContentTree::from_modules(sample());
        let mut updated = lesson(101, 10, 42);
        updated.body = LessonBody::Video { video_url: Some("https://cdn/x.mp4".into()) };
        tree.replace_lesson(updated).unwrap();
        let stored = &tree.modules()[0].lessons[1];
        assert_eq!(stored.index, 1);
        assert_eq!(stored.lesson_type(), LessonType::Video);
    }
}
