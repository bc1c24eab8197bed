use thiserror::Error;

use crate::model::body::HtmlBody;
use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question must have at least one answer")]
    NoAnswers,

    #[error("correct index {index} is out of range for {len} answers")]
    CorrectIndexOutOfRange { index: usize, len: usize },

    #[error("answer index {index} is out of range for {len} answers")]
    AnswerOutOfRange { index: usize, len: usize },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice quiz question.
///
/// `correct_index` is checked once at construction; scoring trusts it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    content: String,
    answers: Vec<String>,
    correct_index: usize,
}

impl Question {
    /// # Errors
    ///
    /// Returns `QuestionError::NoAnswers` if `answers` is empty, or
    /// `QuestionError::CorrectIndexOutOfRange` if `correct_index` does not point at an answer.
    pub fn new(
        id: QuestionId,
        content: impl Into<String>,
        answers: Vec<String>,
        correct_index: usize,
    ) -> Result<Self, QuestionError> {
        if answers.is_empty() {
            return Err(QuestionError::NoAnswers);
        }
        if correct_index >= answers.len() {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: correct_index,
                len: answers.len(),
            });
        }

        Ok(Self {
            id,
            content: content.into(),
            answers,
            correct_index,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    /// Raw HTML body of the question.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    /// Check whether `index` is in range for this question's answers.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::AnswerOutOfRange` for an index past the last answer.
    pub fn check_answer_index(&self, index: usize) -> Result<(), QuestionError> {
        if index >= self.answers.len() {
            return Err(QuestionError::AnswerOutOfRange {
                index,
                len: self.answers.len(),
            });
        }
        Ok(())
    }

    /// Score a selected answer.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::AnswerOutOfRange` before any scoring happens when
    /// `index` does not name an answer.
    pub fn is_correct(&self, index: usize) -> Result<bool, QuestionError> {
        self.check_answer_index(index)?;
        Ok(index == self.correct_index)
    }
}

impl HtmlBody for Question {
    fn html_body(&self) -> &str {
        &self.content
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
