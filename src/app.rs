use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{debug, info};
use std::time::{Duration, Instant};

use crate::anti_cheat::{self, classify_key, classify_mouse, CheatTrigger};
use crate::config::RuntimeSettings;
use crate::loader::QuestionSource;
use crate::report::Reporter;
use crate::runtime::ExamEvent;
use crate::session::{ExamSession, Participant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Login,
    Exam,
    Results,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginField {
    #[default]
    Name,
    Id,
    Class,
}

impl LoginField {
    pub const ALL: [LoginField; 3] = [LoginField::Name, LoginField::Id, LoginField::Class];

    pub fn label(self) -> &'static str {
        match self {
            LoginField::Name => "Name",
            LoginField::Id => "ID",
            LoginField::Class => "Class",
        }
    }

    fn next(self) -> Self {
        match self {
            LoginField::Name => LoginField::Id,
            LoginField::Id => LoginField::Class,
            LoginField::Class => LoginField::Name,
        }
    }

    fn prev(self) -> Self {
        match self {
            LoginField::Name => LoginField::Class,
            LoginField::Id => LoginField::Name,
            LoginField::Class => LoginField::Id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub name: String,
    pub id: String,
    pub class: String,
    pub focus: LoginField,
    pub error: Option<String>,
}

impl LoginForm {
    pub fn value(&self, field: LoginField) -> &str {
        match field {
            LoginField::Name => &self.name,
            LoginField::Id => &self.id,
            LoginField::Class => &self.class,
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Name => &mut self.name,
            LoginField::Id => &mut self.id,
            LoginField::Class => &mut self.class,
        }
    }
}

/// Terminal presenter: turns terminal events into session calls
#[derive(Debug)]
pub struct App {
    pub session: ExamSession,
    pub state: AppState,
    pub login: LoginForm,
    pub settings: RuntimeSettings,
    pub review_scroll: usize,
    source: Box<dyn QuestionSource>,
    last_tick: Option<Instant>,
    should_quit: bool,
}

impl App {
    pub fn new(
        settings: RuntimeSettings,
        source: Box<dyn QuestionSource>,
        reporter: Box<dyn Reporter>,
    ) -> Self {
        Self {
            session: ExamSession::new(settings.session.clone(), reporter),
            state: AppState::Login,
            login: LoginForm::default(),
            settings,
            review_scroll: 0,
            source,
            last_tick: None,
            should_quit: false,
        }
    }

    pub fn with_login(mut self, name: &str, id: &str, class: &str) -> Self {
        self.login.name = name.to_string();
        self.login.id = id.to_string();
        self.login.class = class.to_string();
        self
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn on_event(&mut self, event: ExamEvent) {
        match event {
            ExamEvent::Tick => self.on_tick(Instant::now()),
            ExamEvent::Key(key) => self.on_key(key),
            ExamEvent::Mouse(mouse) => {
                if let Some(trigger) = classify_mouse(&mouse) {
                    self.signal(trigger);
                }
            }
            ExamEvent::FocusLost => self.signal(CheatTrigger::TabHidden),
            ExamEvent::FocusGained => {}
            ExamEvent::Resize => {
                if self.settings.lock_window {
                    self.signal(CheatTrigger::FullscreenExited);
                }
            }
        }
        self.sync_state();
    }

    /// Feeds the time since the previous tick to the session clock
    pub fn on_tick(&mut self, now: Instant) {
        let elapsed = self
            .last_tick
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last_tick = Some(now);
        self.session.advance_clock(elapsed);
        self.sync_state();
    }

    /// Forwards a side-channel signal. Ignored unless an exam is running.
    pub fn signal(&mut self, trigger: CheatTrigger) {
        if self.state == AppState::Exam {
            anti_cheat::dispatch(&mut self.session, trigger);
        }
        self.sync_state();
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        match self.state {
            AppState::Login => self.on_login_key(key),
            AppState::Exam => self.on_exam_key(key),
            AppState::Results => self.on_results_key(key),
        }
    }

    fn on_login_key(&mut self, key: KeyEvent) {
        if is_quit(&key) {
            self.should_quit = true;
            return;
        }
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.login.focus = self.login.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.login.focus = self.login.focus.prev(),
            KeyCode::Backspace => {
                self.login.focused_mut().pop();
            }
            KeyCode::Enter => self.start_exam(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.login.focused_mut().push(c);
            }
            _ => {}
        }
    }

    /// Validates the login form and starts the session
    pub fn start_exam(&mut self) {
        let started = Participant::new(&self.login.name, &self.login.id, &self.login.class)
            .and_then(|participant| {
                self.session
                    .start(participant, self.source.as_ref(), &mut rand::thread_rng())
            });

        match started {
            Ok(()) => {
                self.login.error = None;
                self.last_tick = None;
                self.state = AppState::Exam;
            }
            Err(e) => {
                info!("exam not started: {e}");
                self.login.error = Some(e.to_string());
            }
        }
    }

    fn on_exam_key(&mut self, key: KeyEvent) {
        if let Some(trigger) = classify_key(&key) {
            self.signal(trigger);
            return;
        }
        if is_quit(&key) {
            self.signal(CheatTrigger::PageUnload);
            return;
        }

        if self.session.submit_prompt_open() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    self.session.answer_submit_prompt(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Backspace => {
                    self.session.answer_submit_prompt(false);
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('p') => {
                self.session.prev();
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('n') => {
                self.session.next();
            }
            KeyCode::Home => {
                self.session.go_to(0);
            }
            KeyCode::End => {
                let last = self.session.question_count().saturating_sub(1);
                self.session.go_to(last);
            }
            KeyCode::Char('u') => self.jump_to_unanswered(),
            KeyCode::Char(c @ '1'..='9') => {
                let position = c as usize - '1' as usize;
                self.session.select_option(position);
            }
            // submitting is offered on the last question only
            KeyCode::Enter | KeyCode::Char('s') if self.session.is_last() => {
                self.session.request_submit();
            }
            _ => debug!("unhandled exam key {:?}", key.code),
        }
    }

    /// Moves to the first unanswered question after the current one, wrapping
    /// around to the start
    fn jump_to_unanswered(&mut self) {
        let count = self.session.question_count();
        let current = self.session.current_index();
        let target = (1..count)
            .map(|offset| (current + offset) % count)
            .find(|&i| !self.session.is_answered(i));
        if let Some(index) = target {
            self.session.go_to(index);
        }
    }

    fn on_results_key(&mut self, key: KeyEvent) {
        if is_quit(&key) || key.code == KeyCode::Char('q') {
            self.should_quit = true;
            return;
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.review_scroll = self.review_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                // Will check max scroll in render function
                self.review_scroll += 1;
            }
            KeyCode::PageUp => self.review_scroll = self.review_scroll.saturating_sub(10),
            KeyCode::PageDown => self.review_scroll += 10,
            KeyCode::Home => self.review_scroll = 0,
            _ => {}
        }
    }

    fn sync_state(&mut self) {
        if self.session.is_finished() && self.state != AppState::Results {
            self.state = AppState::Results;
            self.review_scroll = 0;
        }
    }
}

fn is_quit(key: &KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
}
