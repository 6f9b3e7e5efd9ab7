use std::io::Write;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event as CtEvent, KeyEvent, KeyboardEnhancementFlags, MouseEvent,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::supports_keyboard_enhancement,
};
use log::{debug, info};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum ExamEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    FocusLost,
    FocusGained,
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, mouse, focus, resize)
pub trait ExamEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<ExamEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<ExamEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) => ExamEvent::Key(key),
                Ok(CtEvent::Mouse(mouse)) => ExamEvent::Mouse(mouse),
                Ok(CtEvent::FocusLost) => ExamEvent::FocusLost,
                Ok(CtEvent::FocusGained) => ExamEvent::FocusGained,
                Ok(CtEvent::Resize(_, _)) => ExamEvent::Resize,
                Ok(_) => continue,
                Err(_) => break,
            };
            if tx.send(evt).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ExamEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ExamEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<ExamEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<ExamEvent>) -> Self {
        Self { rx }
    }
}

impl ExamEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ExamEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: ExamEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: ExamEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> ExamEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => ExamEvent::Tick,
        }
    }
}

/// Terminal features the anti-cheat signals depend on. Each one is switched
/// on only if the terminal accepts it; a missing feature just means that
/// signal never fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub focus_events: bool,
    pub mouse_capture: bool,
    pub keyboard_enhancement: bool,
}

impl Capabilities {
    pub fn enable<W: Write>(out: &mut W) -> Self {
        let keyboard_enhancement = matches!(supports_keyboard_enhancement(), Ok(true))
            && execute!(
                out,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
            )
            .is_ok();

        let caps = Self {
            focus_events: execute!(out, EnableFocusChange).is_ok(),
            mouse_capture: execute!(out, EnableMouseCapture).is_ok(),
            keyboard_enhancement,
        };
        info!("terminal capabilities: {caps:?}");
        caps
    }

    /// Undo whatever `enable` switched on
    pub fn restore<W: Write>(&self, out: &mut W) {
        if self.keyboard_enhancement && execute!(out, PopKeyboardEnhancementFlags).is_err() {
            debug!("could not pop keyboard enhancement flags");
        }
        if self.mouse_capture && execute!(out, DisableMouseCapture).is_err() {
            debug!("could not disable mouse capture");
        }
        if self.focus_events && execute!(out, DisableFocusChange).is_err() {
            debug!("could not disable focus change events");
        }
    }
}
