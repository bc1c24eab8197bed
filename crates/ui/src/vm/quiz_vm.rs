use lesson_core::model::{Question, QuestionError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("answer {index} is out of range for {len} answers")]
    AnswerOutOfRange { index: usize, len: usize },
    #[error("no answer selected")]
    NothingSelected,
    #[error("this question was already submitted")]
    AlreadySubmitted,
    #[error("question cannot be scored: {0}")]
    InvalidQuestion(#[source] QuestionError),
}

impl From<QuestionError> for QuizError {
    fn from(err: QuestionError) -> Self {
        match err {
            QuestionError::AnswerOutOfRange { index, len } => {
                QuizError::AnswerOutOfRange { index, len }
            }
            other => QuizError::InvalidQuestion(other),
        }
    }
}

/// Answer selection and running score for one pass through a module's test.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuizScore {
    selected: Option<usize>,
    submitted: bool,
    correct: usize,
    answered: usize,
}

impl QuizScore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    #[must_use]
    pub fn correct(&self) -> usize {
        self.correct
    }

    #[must_use]
    pub fn answered(&self) -> usize {
        self.answered
    }

    /// Pick an answer for `question`. Rejected indices leave the selection unchanged.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::AnswerOutOfRange` for an index past the answers, or
    /// `QuizError::AlreadySubmitted` once the question is submitted.
    pub fn select(&mut self, question: &Question, index: usize) -> Result<(), QuizError> {
        if self.submitted {
            return Err(QuizError::AlreadySubmitted);
        }
        question.check_answer_index(index)?;
        self.selected = Some(index);
        Ok(())
    }

    /// Score the selection. Returns whether it was correct.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NothingSelected` without a selection, or
    /// `QuizError::AlreadySubmitted` on a second submit.
    pub fn submit(&mut self, question: &Question) -> Result<bool, QuizError> {
        if self.submitted {
            return Err(QuizError::AlreadySubmitted);
        }
        let index = self.selected.ok_or(QuizError::NothingSelected)?;
        let correct = question.is_correct(index)?;

        self.submitted = true;
        self.answered += 1;
        if correct {
            self.correct += 1;
        }
        Ok(correct)
    }

    /// Clear the selection for the next question; the score carries over.
    pub fn next_question(&mut self) {
        self.selected = None;
        self.submitted = false;
    }
}

#[must_use]
pub fn button_label(submitted: bool, has_next: bool) -> &'static str {
    match (submitted, has_next) {
        (false, _) => "Submit",
        (true, true) => "Next Question",
        (true, false) => "Finish",
    }
}

#[must_use]
pub fn result_heading(correct: usize, total: usize) -> &'static str {
    if total == 0 {
        return "Keep learning";
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = correct as f64 / total as f64;
    if ratio > 0.7 {
        "Awesome!"
    } else if ratio > 0.4 {
        "Doing great!"
    } else {
        "Keep learning"
    }
}

#[must_use]
pub fn result_summary(correct: usize, total: usize) -> String {
    format!("You got {correct} out of {total} questions right!")
}
