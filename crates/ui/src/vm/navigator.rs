use lesson_core::model::{
    Lesson, Module, ModuleId, ProgressSnapshot, Question, ResumePoint, UserProfile,
};
use services::{SharedCatalog, Stylesheet};
use thiserror::Error;
use tracing::debug;

use super::rich_text::{StyledText, render};
use super::walk::Walk;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NavError {
    #[error("module {0} is not in the catalog")]
    ModuleNotFound(ModuleId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavState {
    /// No module selected.
    Idle,
    /// Module selected, no walk in progress.
    ModuleActive,
    LessonWalk,
    QuizWalk,
}

/// Owns the current module, lesson and question cursors.
///
/// Modules are looked up by id in the shared catalog on every selection, so the
/// navigator never keeps a catalog position across catalog changes.
pub struct Navigator {
    catalog: SharedCatalog,
    stylesheet: Stylesheet,
    module: Option<Module>,
    module_index: Option<usize>,
    lessons: Walk<Lesson>,
    questions: Walk<Question>,
    last_module: Option<ModuleId>,
    lesson_index: usize,
    question_index: usize,
    rendered: StyledText,
}

impl Navigator {
    #[must_use]
    pub fn new(catalog: SharedCatalog, stylesheet: Stylesheet) -> Self {
        Self {
            catalog,
            stylesheet,
            module: None,
            module_index: None,
            lessons: Walk::default(),
            questions: Walk::default(),
            last_module: None,
            lesson_index: 0,
            question_index: 0,
            rendered: StyledText::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> NavState {
        if self.module.is_none() {
            NavState::Idle
        } else if self.lessons.is_active() {
            NavState::LessonWalk
        } else if self.questions.is_active() {
            NavState::QuizWalk
        } else {
            NavState::ModuleActive
        }
    }

    /// Every module in catalog order.
    #[must_use]
    pub fn modules(&self) -> Vec<Module> {
        self.catalog.snapshot()
    }

    #[must_use]
    pub fn current_module(&self) -> Option<&Module> {
        self.module.as_ref()
    }

    /// Catalog position of the current module when it was selected.
    #[must_use]
    pub fn current_module_index(&self) -> Option<usize> {
        self.module_index
    }

    #[must_use]
    pub fn current_lesson(&self) -> Option<&Lesson> {
        self.lessons.current()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.current()
    }

    #[must_use]
    pub fn lesson_index(&self) -> usize {
        self.lesson_index
    }

    #[must_use]
    pub fn question_index(&self) -> usize {
        self.question_index
    }

    /// Number of questions in the current module's test.
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn rendered_body(&self) -> &StyledText {
        &self.rendered
    }

    /// Select the first module with `id`.
    ///
    /// # Errors
    ///
    /// Returns `NavError::ModuleNotFound` when no module has `id`; the current
    /// selection is left as it was.
    pub fn select_module(&mut self, id: &ModuleId) -> Result<(), NavError> {
        let Some((index, module)) = self.locate(id) else {
            return Err(NavError::ModuleNotFound(id.clone()));
        };

        if self.last_module.as_ref() != Some(id) {
            self.lesson_index = 0;
            self.question_index = 0;
        }
        self.lessons = Walk::new(module.lessons().to_vec());
        self.questions = Walk::new(module.questions().to_vec());
        self.module = Some(module);
        self.module_index = Some(index);
        self.last_module = Some(id.clone());
        self.rendered = StyledText::default();
        debug!(module = %id, index, "module selected");
        Ok(())
    }

    /// Drop the selection and any walk in progress.
    pub fn leave_module(&mut self) {
        self.module = None;
        self.module_index = None;
        self.lessons = Walk::default();
        self.questions = Walk::default();
        self.rendered = StyledText::default();
    }

    /// Re-read the selected module from the catalog, picking up collections
    /// that arrived after selection. Walks in progress keep their position.
    ///
    /// Returns `false` when nothing is selected or the module is gone.
    pub fn refresh_module(&mut self) -> bool {
        let Some(id) = self.module.as_ref().map(|m| m.id().clone()) else {
            return false;
        };
        let Some((index, module)) = self.locate(&id) else {
            debug!(module = %id, "selected module left the catalog");
            return false;
        };

        self.lessons.replace_items(module.lessons().to_vec());
        self.questions.replace_items(module.questions().to_vec());
        self.module = Some(module);
        self.module_index = Some(index);
        true
    }

    /// Start walking the current module's lessons at `start`, clamped to the first lesson.
    ///
    /// Returns `false` without a module or when the module has no lessons.
    pub fn begin_lesson_walk(&mut self, start: isize) -> bool {
        if self.module.is_none() {
            return false;
        }
        self.questions.reset();
        self.question_index = 0;
        if self.lessons.begin(start).is_none() {
            self.lesson_index = 0;
            return false;
        }
        self.lesson_index = self.lessons.index().unwrap_or(0);
        self.render_current();
        true
    }

    /// Move to the next lesson, or finish the walk and return to `Idle`.
    ///
    /// Returns whether a lesson is current afterwards.
    pub fn advance_lesson(&mut self) -> bool {
        if self.state() != NavState::LessonWalk {
            return false;
        }
        if self.lessons.advance().is_some() {
            self.lesson_index = self.lessons.index().unwrap_or(self.lesson_index);
            self.render_current();
            true
        } else {
            self.lesson_index = 0;
            self.leave_module();
            false
        }
    }

    #[must_use]
    pub fn has_next_lesson(&self) -> bool {
        self.module.is_some() && self.lessons.has_next()
    }

    /// Select `id` and start its quiz at the first question.
    ///
    /// Returns whether a question is current; a module without questions
    /// stays selected with none.
    ///
    /// # Errors
    ///
    /// Returns `NavError::ModuleNotFound` when no module has `id`.
    pub fn begin_quiz_walk(&mut self, id: &ModuleId) -> Result<bool, NavError> {
        self.select_module(id)?;
        Ok(self.start_quiz(0))
    }

    fn start_quiz(&mut self, start: isize) -> bool {
        self.lessons.reset();
        self.lesson_index = 0;
        if self.questions.begin(start).is_none() {
            self.question_index = 0;
            return false;
        }
        self.question_index = self.questions.index().unwrap_or(0);
        self.render_current();
        true
    }

    /// Move to the next question, or finish the quiz and return to `Idle`.
    pub fn advance_question(&mut self) -> bool {
        if self.state() != NavState::QuizWalk {
            return false;
        }
        if self.questions.advance().is_some() {
            self.question_index = self.questions.index().unwrap_or(self.question_index);
            self.render_current();
            true
        } else {
            self.question_index = 0;
            self.leave_module();
            false
        }
    }

    #[must_use]
    pub fn has_next_question(&self) -> bool {
        self.module.is_some() && self.questions.has_next()
    }

    /// Re-select the stored module by id and start the matching walk at the
    /// stored index, clamped like any other start.
    ///
    /// # Errors
    ///
    /// Returns `NavError::ModuleNotFound` when the module is no longer in the catalog.
    pub fn resume(&mut self, point: &ResumePoint) -> Result<bool, NavError> {
        self.select_module(point.module())?;
        let start = isize::try_from(point.index()).unwrap_or(0);
        Ok(match point {
            ResumePoint::Lesson { .. } => self.begin_lesson_walk(start),
            ResumePoint::Quiz { .. } => self.start_quiz(start),
        })
    }

    /// Last module and positions, for persistence.
    #[must_use]
    pub fn progress_snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            module: self.last_module.clone(),
            lesson: self.lesson_index,
            question: self.question_index,
        }
    }

    /// Take the stored resume position as the last known one, without selecting
    /// anything, so a snapshot taken before any navigation reports it unchanged.
    pub fn restore_progress(&mut self, profile: &UserProfile) {
        self.last_module = profile.last_module.clone();
        self.lesson_index = profile.last_lesson.unwrap_or(0);
        self.question_index = profile.last_question.unwrap_or(0);
    }

    fn locate(&self, id: &ModuleId) -> Option<(usize, Module)> {
        self.catalog.read(|catalog| {
            let index = catalog.position(id)?;
            Some((index, catalog.at(index)?.clone()))
        })
    }

    fn render_current(&mut self) {
        let body = match self.state() {
            NavState::LessonWalk => self.lessons.current_body(),
            NavState::QuizWalk => self.questions.current_body(),
            NavState::Idle | NavState::ModuleActive => None,
        };
        self.rendered = body.map_or_else(StyledText::default, |body| {
            render(body, self.stylesheet.bytes())
        });
    }
}
