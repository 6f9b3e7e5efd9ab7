use ratatui::Frame;

use crate::app::{App, AppState};
use crate::ui::review::render_results;

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &mut App, f: &mut Frame);
}

/// Login form - renders via the App widget
pub struct LoginScreen;

impl Screen for LoginScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        f.render_widget(&*app, f.area());
    }
}

/// Running exam - renders via the App widget
pub struct ExamScreen;

impl Screen for ExamScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        f.render_widget(&*app, f.area());
    }
}

/// Final result - uses the dedicated review renderer
pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        render_results(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Login => Box::new(LoginScreen),
        AppState::Exam => Box::new(ExamScreen),
        AppState::Results => Box::new(ResultsScreen),
    }
}
