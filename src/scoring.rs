use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::question::{AnswerSet, Question};

/// Shown in a review when a question was left blank
pub const NO_ANSWER: &str = "-";

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Confirmed by the participant
    Submitted,
    /// Ended by the system, carrying the cause
    Automatic(String),
}

impl Termination {
    pub fn is_automatic(&self) -> bool {
        matches!(self, Termination::Automatic(_))
    }

    /// Empty for a deliberate submission
    pub fn reason(&self) -> &str {
        match self {
            Termination::Submitted => "",
            Termination::Automatic(reason) => reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewItem {
    pub index: usize,
    pub text: String,
    pub answer: Option<String>,
    pub correct: String,
    pub is_correct: bool,
}

impl ReviewItem {
    pub fn answer_label(&self) -> &str {
        self.answer.as_deref().unwrap_or(NO_ANSWER)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExamResult {
    pub score: usize,
    pub total: usize,
    /// Only present for deliberate submissions
    pub breakdown: Option<Vec<ReviewItem>>,
    pub reason: String,
    /// Ended by the system rather than a confirmed submit
    pub automatic: bool,
    pub finished_at: DateTime<Utc>,
    pub elapsed_secs: u64,
}

impl ExamResult {
    pub fn is_automatic(&self) -> bool {
        self.automatic
    }
}

pub fn score(questions: &[Question], answers: &AnswerSet) -> usize {
    questions
        .iter()
        .filter(|q| answers.get(q.index()).is_some_and(|a| q.is_correct(a)))
        .count()
}

pub fn breakdown(questions: &[Question], answers: &AnswerSet) -> Vec<ReviewItem> {
    questions
        .iter()
        .map(|q| {
            let answer = answers.get(q.index()).map(str::to_string);
            ReviewItem {
                index: q.index(),
                text: q.text().to_string(),
                is_correct: answer.as_deref().is_some_and(|a| q.is_correct(a)),
                answer,
                correct: q.correct().to_string(),
            }
        })
        .collect()
}

/// Builds the final record. Automatic terminations carry the reason and no
/// per-question review.
pub fn assemble(
    questions: &[Question],
    answers: &AnswerSet,
    termination: &Termination,
    finished_at: DateTime<Utc>,
    elapsed_secs: u64,
) -> ExamResult {
    ExamResult {
        score: score(questions, answers),
        total: questions.len(),
        breakdown: (!termination.is_automatic()).then(|| breakdown(questions, answers)),
        reason: termination.reason().to_string(),
        automatic: termination.is_automatic(),
        finished_at,
        elapsed_secs,
    }
}
