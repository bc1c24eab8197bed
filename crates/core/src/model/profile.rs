use crate::model::ids::ModuleId;

/// Cached metadata for the signed-in user.
///
/// An empty `name` means the profile has not been fetched yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub last_module: Option<ModuleId>,
    pub last_lesson: Option<usize>,
    pub last_question: Option<usize>,
}

impl UserProfile {
    #[must_use]
    pub fn needs_fetch(&self) -> bool {
        self.name.is_empty()
    }

    /// True when any progress has ever been recorded.
    #[must_use]
    pub fn has_history(&self) -> bool {
        self.last_lesson.is_some() || self.last_question.is_some()
    }

    /// Overwrite the resume fields from a navigator snapshot.
    pub fn apply_snapshot(&mut self, snapshot: &ProgressSnapshot) {
        self.last_module = snapshot.module.clone();
        self.last_lesson = Some(snapshot.lesson);
        self.last_question = Some(snapshot.question);
    }

    /// Where the user left off, if anywhere.
    ///
    /// A positive lesson index wins; otherwise a positive question index resumes the quiz.
    #[must_use]
    pub fn resume_point(&self) -> Option<ResumePoint> {
        let module = self.last_module.clone()?;
        match (self.last_lesson, self.last_question) {
            (Some(lesson), _) if lesson > 0 => Some(ResumePoint::Lesson {
                module,
                index: lesson,
            }),
            (_, Some(question)) if question > 0 => Some(ResumePoint::Quiz {
                module,
                index: question,
            }),
            _ => None,
        }
    }
}

/// Position captured from the navigator for persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub module: Option<ModuleId>,
    pub lesson: usize,
    pub question: usize,
}

/// A resumable position, keyed by module id rather than catalog position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumePoint {
    Lesson { module: ModuleId, index: usize },
    Quiz { module: ModuleId, index: usize },
}

impl ResumePoint {
    #[must_use]
    pub fn module(&self) -> &ModuleId {
        match self {
            ResumePoint::Lesson { module, .. } | ResumePoint::Quiz { module, .. } => module,
        }
    }

    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            ResumePoint::Lesson { index, .. } | ResumePoint::Quiz { index, .. } => *index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(lesson: Option<usize>, question: Option<usize>) -> UserProfile {
        UserProfile {
            name: "Ada".into(),
            last_module: Some(ModuleId::new("m1").unwrap()),
            last_lesson: lesson,
            last_question: question,
        }
    }

    #[test]
    fn empty_name_needs_fetch() {
        assert!(UserProfile::default().needs_fetch());
        assert!(!profile(None, None).needs_fetch());
    }

    #[test]
    fn positive_lesson_resumes_lesson() {
        let point = profile(Some(2), Some(4)).resume_point().unwrap();
        assert_eq!(
            point,
            ResumePoint::Lesson {
                module: ModuleId::new("m1").unwrap(),
                index: 2
            }
        );
    }

    #[test]
    fn zero_lesson_with_positive_question_resumes_quiz() {
        let point = profile(Some(0), Some(3)).resume_point().unwrap();
        assert!(matches!(point, ResumePoint::Quiz { index: 3, .. }));
    }

    #[test]
    fn nothing_to_resume_at_the_start() {
        assert!(profile(Some(0), Some(0)).resume_point().is_none());
        assert!(profile(None, None).resume_point().is_none());

        let mut no_module = profile(Some(3), None);
        no_module.last_module = None;
        assert!(no_module.resume_point().is_none());
    }

    #[test]
    fn apply_snapshot_overwrites_resume_fields() {
        let mut p = profile(None, None);
        p.apply_snapshot(&ProgressSnapshot {
            module: Some(ModuleId::new("m9").unwrap()),
            lesson: 1,
            question: 0,
        });
        assert_eq!(p.last_module.as_ref().map(ModuleId::as_str), Some("m9"));
        assert_eq!(p.last_lesson, Some(1));
        assert_eq!(p.last_question, Some(0));
        assert!(p.has_history());
        assert_eq!(p.name, "Ada");
    }
}
