use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use proctor::app::{App, AppState};
use proctor::config::RuntimeSettings;
use proctor::loader::StaticQuestionSource;
use proctor::question::RawQuestion;
use proctor::report::NoReporter;
use proctor::runtime::{ExamEvent, FixedTicker, Runner, TestEventSource};
use proctor::session::SessionConfig;

fn bank(n: usize) -> StaticQuestionSource {
    StaticQuestionSource::new(
        (0..n)
            .map(|i| RawQuestion {
                text: format!("question {i}"),
                options: vec![format!("a{i}"), format!("b{i}"), format!("c{i}")],
                correct: format!("a{i}"),
            })
            .collect(),
    )
}

fn key(code: KeyCode) -> ExamEvent {
    ExamEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

// Headless integration using the internal runtime + App without a TTY.
// Verifies that a full login -> answer -> submit flow completes via Runner/TestEventSource.
#[test]
fn headless_exam_flow_completes() {
    let mut app = App::new(
        RuntimeSettings::default(),
        Box::new(bank(2)),
        Box::new(NoReporter),
    );

    let (tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(5));
    let runner = Runner::new(es, ticker);

    // Producer: login, answer both questions, submit and confirm, then quit
    for c in "Ada".chars() {
        tx.send(key(KeyCode::Char(c))).unwrap();
    }
    tx.send(key(KeyCode::Tab)).unwrap();
    tx.send(key(KeyCode::Char('7'))).unwrap();
    tx.send(key(KeyCode::Tab)).unwrap();
    tx.send(key(KeyCode::Char('X'))).unwrap();
    tx.send(key(KeyCode::Enter)).unwrap();
    tx.send(key(KeyCode::Char('1'))).unwrap();
    tx.send(key(KeyCode::Right)).unwrap();
    tx.send(key(KeyCode::Char('2'))).unwrap();
    tx.send(key(KeyCode::Char('s'))).unwrap();
    tx.send(key(KeyCode::Char('y'))).unwrap();
    tx.send(key(KeyCode::Char('q'))).unwrap();

    for _ in 0..200u32 {
        app.on_event(runner.step());
        if app.should_quit() {
            break;
        }
    }

    assert!(app.should_quit(), "app should have quit from the results screen");
    assert_eq!(app.state, AppState::Results);
    let result = app.session.result().expect("exam should have a result");
    assert_eq!(result.total, 2);
    assert_eq!(result.reason, "");
    assert_eq!(result.breakdown.as_ref().map(Vec::len), Some(2));
    assert_eq!(app.session.participant().unwrap().id(), "7");
}

#[test]
fn headless_timed_session_finishes_by_time() {
    let settings = RuntimeSettings {
        session: SessionConfig {
            seconds_per_question: 1,
        },
        ..RuntimeSettings::default()
    };
    let mut app = App::new(settings, Box::new(bank(1)), Box::new(NoReporter))
        .with_login("Ada", "42", "B");
    app.start_exam();
    assert_eq!(app.state, AppState::Exam);

    let (_tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(20)),
    );

    // up to ~3s of wall-clock ticks for a 1s exam
    for _ in 0..150u32 {
        app.on_event(runner.step());
        if app.state == AppState::Results {
            break;
        }
    }

    assert_eq!(app.state, AppState::Results, "timed exam should finish by timeout");
    assert_eq!(app.session.result().unwrap().reason, "time expired");
    assert_eq!(app.session.time_remaining_secs(), 0);
}

#[test]
fn headless_focus_loss_stops_exam() {
    let mut app = App::new(
        RuntimeSettings::default(),
        Box::new(bank(3)),
        Box::new(NoReporter),
    )
    .with_login("Ada", "42", "B");
    app.start_exam();

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );
    tx.send(key(KeyCode::Char('1'))).unwrap();
    tx.send(ExamEvent::FocusLost).unwrap();
    tx.send(ExamEvent::Resize).unwrap();

    for _ in 0..5u32 {
        app.on_event(runner.step());
    }

    let result = app.session.result().unwrap();
    assert_eq!(result.reason, "tab switched");
    assert!(result.breakdown.is_none());
    assert_eq!(app.state, AppState::Results);
}
