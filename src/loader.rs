use include_dir::{include_dir, Dir};
use log::{debug, info};
use rand::{seq::SliceRandom, Rng};
use reqwest::{blocking::Client, header::CACHE_CONTROL, StatusCode};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::question::{Question, QuestionError, RawQuestion};

static BANK_DIR: Dir = include_dir!("src/banks");

/// Bank compiled into the binary, used when no bank is given
pub const SAMPLE_BANK: &str = "sample.json";

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read question bank {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not fetch question bank: {0}")]
    Http(#[from] reqwest::Error),
    #[error("question bank request failed with status {0}")]
    HttpStatus(StatusCode),
    #[error("embedded question bank {0} not found")]
    MissingEmbedded(String),
    #[error("question bank is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("question bank is empty")]
    Empty,
    #[error("question {index} is malformed: {source}")]
    Invalid {
        index: usize,
        source: QuestionError,
    },
}

/// Anything that can hand over the raw questions of a bank
pub trait QuestionSource: fmt::Debug {
    fn fetch(&self) -> Result<Vec<RawQuestion>, LoadError>;

    /// Short human readable origin, used in logs
    fn describe(&self) -> String;
}

pub fn parse_bank(bytes: &[u8]) -> Result<Vec<RawQuestion>, LoadError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[derive(Debug, Clone)]
pub struct FileQuestionSource {
    path: PathBuf,
}

impl FileQuestionSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl QuestionSource for FileQuestionSource {
    fn fetch(&self) -> Result<Vec<RawQuestion>, LoadError> {
        let bytes = fs::read(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_bank(&bytes)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Clone)]
pub struct HttpQuestionSource {
    url: String,
}

impl HttpQuestionSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl QuestionSource for HttpQuestionSource {
    fn fetch(&self) -> Result<Vec<RawQuestion>, LoadError> {
        let client = Client::builder().timeout(FETCH_TIMEOUT).build()?;
        let response = client
            .get(&self.url)
            .header(CACHE_CONTROL, "no-store")
            .send()?;

        if !response.status().is_success() {
            return Err(LoadError::HttpStatus(response.status()));
        }

        parse_bank(&response.bytes()?)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddedQuestionSource {
    name: String,
}

impl EmbeddedQuestionSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn sample() -> Self {
        Self::new(SAMPLE_BANK)
    }
}

impl QuestionSource for EmbeddedQuestionSource {
    fn fetch(&self) -> Result<Vec<RawQuestion>, LoadError> {
        let file = BANK_DIR
            .get_file(&self.name)
            .ok_or_else(|| LoadError::MissingEmbedded(self.name.clone()))?;
        parse_bank(file.contents())
    }

    fn describe(&self) -> String {
        format!("embedded:{}", self.name)
    }
}

/// In-memory bank
#[derive(Debug, Clone, Default)]
pub struct StaticQuestionSource {
    questions: Vec<RawQuestion>,
}

impl StaticQuestionSource {
    pub fn new(questions: Vec<RawQuestion>) -> Self {
        Self { questions }
    }
}

impl QuestionSource for StaticQuestionSource {
    fn fetch(&self) -> Result<Vec<RawQuestion>, LoadError> {
        Ok(self.questions.clone())
    }

    fn describe(&self) -> String {
        format!("static:{} questions", self.questions.len())
    }
}

/// Shuffles the question order and, independently, every question's options.
/// Both passes are Fisher-Yates shuffles, so every ordering is equally likely.
pub fn shuffle_bank<R: Rng + ?Sized>(raw: &mut [RawQuestion], rng: &mut R) {
    raw.shuffle(rng);
    for question in raw.iter_mut() {
        question.options.shuffle(rng);
    }
}

/// Fetches, validates and shuffles a bank. Nothing is returned unless every
/// question is well formed.
pub fn load_questions<R: Rng + ?Sized>(
    source: &dyn QuestionSource,
    rng: &mut R,
) -> Result<Vec<Question>, LoadError> {
    let mut raw = source.fetch()?;
    if raw.is_empty() {
        return Err(LoadError::Empty);
    }

    for (index, question) in raw.iter().enumerate() {
        question
            .validate()
            .map_err(|source| LoadError::Invalid { index, source })?;
    }
    debug!("validated {} questions from {}", raw.len(), source.describe());

    shuffle_bank(&mut raw, rng);

    let questions: Vec<Question> = raw
        .into_iter()
        .enumerate()
        .map(|(index, q)| Question::from_raw(index, q))
        .collect();

    info!(
        "loaded {} questions from {}",
        questions.len(),
        source.describe()
    );
    Ok(questions)
}
