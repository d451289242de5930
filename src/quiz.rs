//! Stateless linear quiz with local scoring.
//!
//! Module pages end with a short multiple-choice quiz. Unlike the
//! simulation there is no persistence or branching: questions are answered
//! front to back and the score is computed locally when the last answer
//! lands. Passing at 70% earns the certificate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Percentage needed to pass a quiz.
pub const PASS_THRESHOLD_PCT: u32 = 70;

/// Quiz content or answer errors.
#[derive(Debug, Error)]
pub enum QuizError {
    /// The quiz has no questions.
    #[error("Quiz has no questions")]
    Empty,

    /// A question has an empty option list.
    #[error("Question {index} has no options")]
    NoOptions {
        /// Position of the question.
        index: usize,
    },

    /// A question's correct-answer index does not resolve.
    #[error("Question {index} marks option {correct} correct but only has {options} options")]
    CorrectOutOfRange {
        /// Position of the question.
        index: usize,
        /// The declared correct index.
        correct: usize,
        /// Number of declared options.
        options: usize,
    },

    /// An answer index does not resolve on the current question.
    #[error("Answer {answer} is out of range for question {index} ({options} options)")]
    AnswerOutOfRange {
        /// Position of the question.
        index: usize,
        /// The given answer index.
        answer: usize,
        /// Number of declared options.
        options: usize,
    },

    /// An answer arrived after the last question.
    #[error("Quiz already finished")]
    Finished,
}

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question text.
    pub prompt: String,

    /// Answer options in display order.
    pub options: Vec<String>,

    /// Index of the correct option.
    pub correct: usize,

    /// Points awarded for a correct answer.
    pub points: u32,
}

/// A validated set of questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    questions: Vec<Question>,
}

impl Quiz {
    /// Builds a quiz, validating every question.
    ///
    /// # Errors
    ///
    /// Rejects empty quizzes, questions without options, and correct-answer
    /// indices that do not resolve.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::Empty);
        }
        for (index, q) in questions.iter().enumerate() {
            if q.options.is_empty() {
                return Err(QuizError::NoOptions { index });
            }
            if q.correct >= q.options.len() {
                return Err(QuizError::CorrectOutOfRange {
                    index,
                    correct: q.correct,
                    options: q.options.len(),
                });
            }
        }
        Ok(Self { questions })
    }

    /// The questions in display order.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Number of questions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// False for every constructed quiz; [`Quiz::new`] rejects empty
    /// question lists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Maximum attainable score.
    #[must_use]
    pub fn total_points(&self) -> u32 {
        self.questions.iter().map(|q| q.points).sum()
    }

    /// Starts a run over this quiz.
    #[must_use]
    pub fn start(&self) -> QuizRun<'_> {
        QuizRun {
            quiz: self,
            answers: Vec::with_capacity(self.questions.len()),
        }
    }
}

/// Per-question outcome and totals of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizReport {
    /// Points earned.
    pub score: u32,
    /// Maximum attainable score.
    pub total_points: u32,
    /// `score / total_points`, rounded to the nearest percent.
    pub percentage: u32,
    /// True when `percentage` reached [`PASS_THRESHOLD_PCT`].
    pub passed: bool,
    /// Correctness per question, in display order.
    pub per_question: Vec<bool>,
}

/// One user's walk through a quiz, front to back.
#[derive(Debug)]
pub struct QuizRun<'a> {
    quiz: &'a Quiz,
    answers: Vec<usize>,
}

impl QuizRun<'_> {
    /// Index of the question awaiting an answer; `None` once finished.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        (self.answers.len() < self.quiz.len()).then_some(self.answers.len())
    }

    /// True once every question has been answered.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.answers.len() >= self.quiz.len()
    }

    /// Fraction of questions presented so far, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let fraction =
            (self.answers.len().min(self.quiz.len() - 1) + 1) as f32 / self.quiz.len() as f32;
        fraction
    }

    /// Records the answer for the current question.
    ///
    /// Returns the report when this was the last question.
    ///
    /// # Errors
    ///
    /// Rejects answers after the run finished and option indices that do
    /// not resolve; neither mutates the run.
    pub fn answer(&mut self, option: usize) -> Result<Option<QuizReport>, QuizError> {
        let Some(index) = self.current_index() else {
            return Err(QuizError::Finished);
        };
        let options = self.quiz.questions[index].options.len();
        if option >= options {
            return Err(QuizError::AnswerOutOfRange {
                index,
                answer: option,
                options,
            });
        }

        self.answers.push(option);
        Ok(self.report())
    }

    /// The report, once the run is finished.
    #[must_use]
    pub fn report(&self) -> Option<QuizReport> {
        if !self.is_finished() {
            return None;
        }

        let per_question: Vec<bool> = self
            .quiz
            .questions
            .iter()
            .zip(&self.answers)
            .map(|(q, &a)| a == q.correct)
            .collect();
        let score: u32 = self
            .quiz
            .questions
            .iter()
            .zip(&per_question)
            .filter(|(_, &ok)| ok)
            .map(|(q, _)| q.points)
            .sum();
        let total_points = self.quiz.total_points();
        let percentage = if total_points == 0 {
            0
        } else {
            (score * 100 + total_points / 2) / total_points
        };

        Some(QuizReport {
            score,
            total_points,
            percentage,
            passed: percentage >= PASS_THRESHOLD_PCT,
            per_question,
        })
    }
}
