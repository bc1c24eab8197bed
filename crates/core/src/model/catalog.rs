use crate::model::ids::ModuleId;
use crate::model::lesson::Lesson;
use crate::model::module::Module;
use crate::model::question::Question;

/// The in-memory ordered collection of all modules.
///
/// Insertion order is catalog order. Ids are not deduplicated: a local and a
/// remote copy of the same module may both be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    modules: Vec<Module>,
}

impl Catalog {
    #[must_use]
    pub fn new(modules: Vec<Module>) -> Self {
        Self { modules }
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Position of the first module with `id`, by linear scan.
    #[must_use]
    pub fn position(&self, id: &ModuleId) -> Option<usize> {
        self.modules.iter().position(|m| m.id() == id)
    }

    #[must_use]
    pub fn get(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| m.id() == id)
    }

    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Module> {
        self.modules.get(index)
    }

    /// Replace the whole catalog.
    pub fn replace_all(&mut self, modules: Vec<Module>) {
        self.modules = modules;
    }

    /// Append modules after the existing ones.
    pub fn append(&mut self, modules: Vec<Module>) {
        self.modules.extend(modules);
    }

    /// Overwrite the lessons of every module whose id is `id`.
    ///
    /// Returns the number of modules updated; `0` means the update was dropped.
    pub fn apply_lessons(&mut self, id: &ModuleId, lessons: &[Lesson]) -> usize {
        let mut applied = 0;
        for module in self.modules.iter_mut().filter(|m| m.id() == id) {
            module.replace_lessons(lessons.to_vec());
            applied += 1;
        }
        applied
    }

    /// Overwrite the questions of every module whose id is `id`.
    ///
    /// Returns the number of modules updated; `0` means the update was dropped.
    pub fn apply_questions(&mut self, id: &ModuleId, questions: &[Question]) -> usize {
        let mut applied = 0;
        for module in self.modules.iter_mut().filter(|m| m.id() == id) {
            module.replace_questions(questions.to_vec());
            applied += 1;
        }
        applied
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::{LessonId, QuestionId};
    use crate::model::module::{Content, Descriptor, Test};

    fn module(id: &str, category: &str) -> Module {
        Module::new(
            ModuleId::new(id).unwrap(),
            category,
            Content::new(Descriptor::default()),
            Test::new(Descriptor::default()),
        )
    }

    fn lesson(id: &str, title: &str) -> Lesson {
        Lesson::new(LessonId::new(id).unwrap(), title, "", "", "")
    }

    #[test]
    fn fresh_modules_have_no_nested_items() {
        let catalog = Catalog::new(vec![module("m1", "Swift"), module("m2", "Rust")]);
        for m in catalog.modules() {
            assert!(m.lessons().is_empty());
            assert!(m.questions().is_empty());
        }
    }

    #[test]
    fn apply_lessons_overwrites_instead_of_appending() {
        let mut catalog = Catalog::new(vec![module("m1", "Swift")]);
        let id = ModuleId::new("m1").unwrap();
        let lessons = vec![lesson("l1", "Intro"), lesson("l2", "Next")];

        assert_eq!(catalog.apply_lessons(&id, &lessons), 1);
        assert_eq!(catalog.apply_lessons(&id, &lessons), 1);

        assert_eq!(catalog.get(&id).unwrap().lessons().len(), 2);
    }

    #[test]
    fn apply_to_unknown_id_leaves_catalog_unchanged() {
        let mut catalog = Catalog::new(vec![module("m1", "Swift")]);
        let before = catalog.clone();

        let missing = ModuleId::new("missing-id").unwrap();
        assert_eq!(catalog.apply_lessons(&missing, &[lesson("l1", "Intro")]), 0);

        let question = Question::new(QuestionId::new("q").unwrap(), "", vec!["a".into()], 0)
            .unwrap();
        assert_eq!(catalog.apply_questions(&missing, &[question]), 0);

        assert_eq!(catalog, before);
    }

    #[test]
    fn append_keeps_duplicate_ids_in_order() {
        let mut catalog = Catalog::new(vec![module("m1", "Local")]);
        catalog.append(vec![module("m1", "Remote"), module("m2", "Rust")]);

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.at(1).unwrap().category(), "Remote");
        assert_eq!(catalog.position(&ModuleId::new("m1").unwrap()), Some(0));
        assert_eq!(catalog.position(&ModuleId::new("m2").unwrap()), Some(2));
    }

    #[test]
    fn apply_updates_every_copy_of_a_duplicated_id() {
        let mut catalog = Catalog::new(vec![module("m1", "Local")]);
        catalog.append(vec![module("m1", "Remote")]);

        let id = ModuleId::new("m1").unwrap();
        assert_eq!(catalog.apply_lessons(&id, &[lesson("l1", "Intro")]), 2);
        assert!(catalog.modules().iter().all(|m| m.lessons().len() == 1));
    }
}
