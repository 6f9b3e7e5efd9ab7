use chrono::Utc;
use log::{debug, info};
use rand::Rng;
use std::time::Duration;
use strum_macros::Display;
use thiserror::Error;

use crate::loader::{load_questions, LoadError, QuestionSource};
use crate::question::{AnswerSet, Question};
use crate::report::{NoReporter, ReportPayload, Reporter};
use crate::scoring::{assemble, ExamResult, Termination};
use crate::timer::{Countdown, DEFAULT_SECONDS_PER_QUESTION, TIME_EXPIRED};

#[derive(Debug, Error)]
pub enum StartError {
    #[error("participant {0} is required")]
    MissingField(&'static str),
    #[error("exam has already been started")]
    AlreadyStarted,
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// The exam taker. Fields are trimmed and never blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    name: String,
    id: String,
    class: String,
}

impl Participant {
    pub fn new(
        name: impl AsRef<str>,
        id: impl AsRef<str>,
        class: impl AsRef<str>,
    ) -> Result<Self, StartError> {
        let field = |value: &str, label: &'static str| {
            let value = value.trim();
            if value.is_empty() {
                Err(StartError::MissingField(label))
            } else {
                Ok(value.to_string())
            }
        };

        Ok(Self {
            name: field(name.as_ref(), "name")?,
            id: field(id.as_ref(), "id")?,
            class: field(class.as_ref(), "class")?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn class(&self) -> &str {
        &self.class
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
    NotStarted,
    InProgress,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub seconds_per_question: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seconds_per_question: DEFAULT_SECONDS_PER_QUESTION,
        }
    }
}

/// One participant's attempt at an exam.
///
/// Every mutation is a no-op unless the session is `InProgress`, and
/// `terminate` is the only way into `Finished`.
#[derive(Debug)]
pub struct ExamSession {
    config: SessionConfig,
    phase: Phase,
    participant: Option<Participant>,
    questions: Vec<Question>,
    answers: AnswerSet,
    current_index: usize,
    countdown: Countdown,
    submit_prompt_open: bool,
    submitted: bool,
    result: Option<ExamResult>,
    reporter: Box<dyn Reporter>,
}

impl Default for ExamSession {
    fn default() -> Self {
        Self::new(SessionConfig::default(), Box::new(NoReporter))
    }
}

impl ExamSession {
    pub fn new(config: SessionConfig, reporter: Box<dyn Reporter>) -> Self {
        Self {
            config,
            phase: Phase::NotStarted,
            participant: None,
            questions: vec![],
            answers: AnswerSet::new(),
            current_index: 0,
            countdown: Countdown::new(0),
            submit_prompt_open: false,
            submitted: false,
            result: None,
            reporter,
        }
    }

    /// Loads the bank and starts the clock. On any error the session stays
    /// `NotStarted`.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        participant: Participant,
        source: &dyn QuestionSource,
        rng: &mut R,
    ) -> Result<(), StartError> {
        if self.phase != Phase::NotStarted {
            return Err(StartError::AlreadyStarted);
        }

        let questions = load_questions(source, rng)?;
        let seconds_per_question = self.config.seconds_per_question.max(1);

        self.countdown = Countdown::for_questions(questions.len(), seconds_per_question);
        self.questions = questions;
        self.current_index = 0;
        self.participant = Some(participant);
        self.phase = Phase::InProgress;
        self.countdown.start();

        info!(
            "exam started: {} questions, {}s on the clock",
            self.questions.len(),
            self.countdown.total_secs()
        );
        Ok(())
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_in_progress(&self) -> bool {
        self.phase == Phase::InProgress
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn participant(&self) -> Option<&Participant> {
        self.participant.as_ref()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn current_answer(&self) -> Option<&str> {
        self.answers.get(self.current_index)
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn time_remaining_secs(&self) -> u64 {
        self.countdown.remaining_secs()
    }

    pub fn submit_prompt_open(&self) -> bool {
        self.submit_prompt_open
    }

    pub fn result(&self) -> Option<&ExamResult> {
        self.result.as_ref()
    }

    pub fn is_first(&self) -> bool {
        self.current_index == 0
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 >= self.questions.len()
    }

    pub fn is_answered(&self, index: usize) -> bool {
        self.answers.is_answered(index)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn go_to(&mut self, index: usize) -> bool {
        if !self.is_in_progress() || index >= self.questions.len() {
            debug!("ignoring navigation to {index}");
            return false;
        }
        self.current_index = index;
        true
    }

    pub fn next(&mut self) -> bool {
        self.go_to(self.current_index + 1)
    }

    pub fn prev(&mut self) -> bool {
        match self.current_index.checked_sub(1) {
            Some(index) => self.go_to(index),
            None => false,
        }
    }

    /// Records `option` for the current question. Values that are not one of
    /// its options are ignored.
    pub fn select_answer(&mut self, option: &str) -> bool {
        if !self.is_in_progress() {
            return false;
        }
        let Some(question) = self.questions.get(self.current_index) else {
            return false;
        };
        if !question.has_option(option) {
            debug!("ignoring unknown option {option:?}");
            return false;
        }

        self.answers.select(self.current_index, option);
        true
    }

    /// Selects the current question's option by displayed position
    pub fn select_option(&mut self, position: usize) -> bool {
        let Some(option) = self
            .current_question()
            .and_then(|q| q.option(position))
            .map(str::to_string)
        else {
            return false;
        };
        self.select_answer(&option)
    }

    /// Takes one second off the clock. Returns true if that ended the exam.
    pub fn tick_second(&mut self) -> bool {
        if !self.is_in_progress() {
            return false;
        }
        if self.countdown.tick_second() {
            return self.terminate(Termination::Automatic(TIME_EXPIRED.to_string()));
        }
        false
    }

    /// Feeds wall-clock time to the countdown, one whole second at a time
    pub fn advance_clock(&mut self, elapsed: Duration) {
        let due = self.countdown.accumulate(elapsed);
        for _ in 0..due {
            if !self.is_in_progress() || self.tick_second() {
                break;
            }
        }
    }

    /// Opens the yes/no confirmation that precedes a deliberate submit
    pub fn request_submit(&mut self) -> bool {
        if !self.is_in_progress() {
            return false;
        }
        self.submit_prompt_open = true;
        true
    }

    /// Answers the submit confirmation. Declining leaves the exam untouched.
    pub fn answer_submit_prompt(&mut self, confirmed: bool) -> bool {
        if !self.submit_prompt_open || !self.is_in_progress() {
            return false;
        }
        self.submit_prompt_open = false;
        if confirmed {
            self.terminate(Termination::Submitted)
        } else {
            false
        }
    }

    /// Gives in-flight result reports up to `timeout` to finish
    pub fn flush_reports(&self, timeout: Duration) {
        self.reporter.flush(timeout);
    }

    pub fn auto_terminate(&mut self, reason: &str) -> bool {
        self.terminate(Termination::Automatic(reason.to_string()))
    }

    /// The single transition into `Finished`. Runs at most once: the clock is
    /// stopped, the result assembled and handed to the reporter exactly once.
    pub fn terminate(&mut self, termination: Termination) -> bool {
        if self.submitted || !self.is_in_progress() {
            return false;
        }
        self.submitted = true;
        self.countdown.stop();
        self.submit_prompt_open = false;
        self.phase = Phase::Finished;

        let result = assemble(
            &self.questions,
            &self.answers,
            &termination,
            Utc::now(),
            self.countdown.elapsed_secs(),
        );
        info!(
            "exam finished: score {}/{}{}",
            result.score,
            result.total,
            if result.reason.is_empty() {
                String::new()
            } else {
                format!(" ({})", result.reason)
            }
        );

        if let Some(participant) = &self.participant {
            self.reporter.report(&ReportPayload::new(participant, &result));
        }
        self.result = Some(result);
        true
    }
}
