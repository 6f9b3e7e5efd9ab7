use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Options are picked with the digit keys 1-9
pub const MAX_OPTIONS: usize = 9;

/// A question exactly as it appears in a question bank document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawQuestion {
    pub text: String,
    pub options: Vec<String>,
    pub correct: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionError {
    #[error("question text is empty")]
    EmptyText,
    #[error("needs at least two options, found {0}")]
    TooFewOptions(usize),
    #[error("at most {} options are allowed, found {0}", MAX_OPTIONS)]
    TooManyOptions(usize),
    #[error("option {0:?} appears more than once")]
    DuplicateOption(String),
    #[error("correct answer is empty")]
    EmptyCorrect,
    #[error("correct answer {0:?} is not one of the options")]
    CorrectNotAnOption(String),
}

impl RawQuestion {
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if self.options.len() < 2 {
            return Err(QuestionError::TooFewOptions(self.options.len()));
        }
        if self.options.len() > MAX_OPTIONS {
            return Err(QuestionError::TooManyOptions(self.options.len()));
        }

        let mut seen = HashSet::new();
        for option in &self.options {
            if !seen.insert(option.as_str()) {
                return Err(QuestionError::DuplicateOption(option.clone()));
            }
        }

        if self.correct.trim().is_empty() {
            return Err(QuestionError::EmptyCorrect);
        }
        if !seen.contains(self.correct.as_str()) {
            return Err(QuestionError::CorrectNotAnOption(self.correct.clone()));
        }

        Ok(())
    }
}

/// A loaded question. `index` is its position in the shuffled exam and the
/// option order is fixed once loading is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    index: usize,
    text: String,
    options: Vec<String>,
    correct: String,
}

impl Question {
    /// Builds a question from an already validated raw entry.
    pub(crate) fn from_raw(index: usize, raw: RawQuestion) -> Self {
        Self {
            index,
            text: raw.text,
            options: raw.options,
            correct: raw.correct,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn option(&self, position: usize) -> Option<&str> {
        self.options.get(position).map(String::as_str)
    }

    pub fn correct(&self) -> &str {
        &self.correct
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o == value)
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct == answer
    }
}

/// Selected option per question index. A missing key means unanswered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSet {
    selections: BTreeMap<usize, String>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `option` for `index`, replacing any earlier selection.
    pub fn select(&mut self, index: usize, option: impl Into<String>) {
        self.selections.insert(index, option.into());
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.selections.get(&index).map(String::as_str)
    }

    pub fn is_answered(&self, index: usize) -> bool {
        self.selections.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.selections.iter().map(|(i, s)| (*i, s.as_str()))
    }
}
