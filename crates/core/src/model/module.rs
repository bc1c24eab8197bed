use crate::model::ids::ModuleId;
use crate::model::lesson::Lesson;
use crate::model::question::Question;

/// Descriptor shared by a module's content and test halves.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Descriptor {
    pub id: String,
    pub description: String,
    pub image: String,
    pub time: String,
}

/// Lesson half of a module. `lessons` starts empty and is filled after a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Content {
    descriptor: Descriptor,
    lessons: Vec<Lesson>,
}

impl Content {
    #[must_use]
    pub fn new(descriptor: Descriptor) -> Self {
        Self {
            descriptor,
            lessons: Vec::new(),
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }
}

/// Quiz half of a module. `questions` starts empty and is filled after a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Test {
    descriptor: Descriptor,
    questions: Vec<Question>,
}

impl Test {
    #[must_use]
    pub fn new(descriptor: Descriptor) -> Self {
        Self {
            descriptor,
            questions: Vec::new(),
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }
}

/// A top-level learning unit: a lesson sequence plus a quiz.
///
/// Only the catalog replaces the nested lesson and question lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    id: ModuleId,
    category: String,
    content: Content,
    test: Test,
}

impl Module {
    #[must_use]
    pub fn new(id: ModuleId, category: impl Into<String>, content: Content, test: Test) -> Self {
        Self {
            id,
            category: category.into(),
            content,
            test,
        }
    }

    #[must_use]
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn content(&self) -> &Content {
        &self.content
    }

    #[must_use]
    pub fn test(&self) -> &Test {
        &self.test
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.content.lessons
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.test.questions
    }

    pub(crate) fn replace_lessons(&mut self, lessons: Vec<Lesson>) {
        self.content.lessons = lessons;
    }

    pub(crate) fn replace_questions(&mut self, questions: Vec<Question>) {
        self.test.questions = questions;
    }
}
