use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{info, warn};
use proctor::{
    app::App,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, Overrides, RuntimeSettings},
    loader::{EmbeddedQuestionSource, FileQuestionSource, HttpQuestionSource, QuestionSource},
    report::{CsvReporter, FanOutReporter, HttpReporter, Reporter},
    runtime::{Capabilities, CrosstermEventSource, FixedTicker, Runner},
    ui::ui,
    TICK_RATE_MS,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, File},
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

/// Longest shutdown wait for result reports still being sent
const REPORT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// timed multiple-choice exams in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Runs a timed multiple-choice exam in the terminal. Leaving the terminal, resizing it, right-clicking or pressing developer shortcuts ends the exam early. Results can be posted to a reporting endpoint."
)]
pub struct Cli {
    /// question bank JSON file; the built-in sample bank is used if omitted
    #[clap(short = 'q', long, conflicts_with = "questions_url")]
    questions: Option<PathBuf>,

    /// fetch the question bank from this URL instead of a file
    #[clap(long)]
    questions_url: Option<String>,

    /// seconds allowed per question
    #[clap(short = 's', long)]
    seconds_per_question: Option<u64>,

    /// endpoint that receives the result as a JSON POST
    #[clap(long, env = "PROCTOR_REPORT_URL")]
    report_url: Option<String>,

    /// also append results to a local CSV log
    #[clap(long)]
    log_results: bool,

    /// do not end the exam when the terminal is resized
    #[clap(long)]
    no_lock_window: bool,

    /// store the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,

    /// prefill the participant name
    #[clap(long)]
    name: Option<String>,

    /// prefill the participant id
    #[clap(long)]
    id: Option<String>,

    /// prefill the participant class
    #[clap(long)]
    class: Option<String>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            seconds_per_question: self.seconds_per_question,
            report_url: self.report_url.clone(),
            log_results: self.log_results,
            no_lock_window: self.no_lock_window,
        }
    }

    fn question_source(&self) -> Box<dyn QuestionSource> {
        match (&self.questions, &self.questions_url) {
            (Some(path), _) => Box::new(FileQuestionSource::new(path)),
            (None, Some(url)) => Box::new(HttpQuestionSource::new(url.clone())),
            (None, None) => Box::new(EmbeddedQuestionSource::sample()),
        }
    }
}

fn build_reporter(settings: &RuntimeSettings) -> Box<dyn Reporter> {
    let mut reporters: Vec<Box<dyn Reporter>> = vec![];

    if let Some(url) = &settings.report_url {
        match HttpReporter::new(url.clone()) {
            Ok(reporter) => reporters.push(Box::new(reporter)),
            Err(e) => warn!("reporting to {url} disabled: {e}"),
        }
    }
    if settings.log_results {
        reporters.push(Box::new(CsvReporter::new(AppDirs::results_path())));
    }

    Box::new(FanOutReporter::new(reporters))
}

/// Logs go to a file; the terminal belongs to the TUI
fn init_logging() {
    let path = AppDirs::log_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match File::options().create(true).append(true).open(&path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(_) => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    let _ = builder.try_init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();

    let store = FileConfigStore::new();
    let settings = store.load().resolve(&cli.overrides());
    if cli.save_config {
        store.save(&Config::from(&settings))?;
        info!("saved settings to {}", store.path().display());
    }

    let mut app = App::new(
        settings.clone(),
        cli.question_source(),
        build_reporter(&settings),
    )
    .with_login(
        cli.name.as_deref().unwrap_or_default(),
        cli.id.as_deref().unwrap_or_default(),
        cli.class.as_deref().unwrap_or_default(),
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let capabilities = Capabilities::enable(&mut stdout);
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app);

    capabilities.restore(terminal.backend_mut());
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Some(result) = app.session.result() {
        println!("Score: {} / {}", result.score, result.total);
    }
    app.session.flush_reports(REPORT_FLUSH_TIMEOUT);

    outcome
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    while !app.should_quit() {
        terminal.draw(|f| ui(app, f))?;
        app.on_event(runner.step());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["proctor"]);

        assert_eq!(cli.questions, None);
        assert_eq!(cli.seconds_per_question, None);
        assert!(!cli.log_results);
        assert!(!cli.no_lock_window);
        assert_eq!(cli.overrides().seconds_per_question, None);
    }

    #[test]
    fn test_cli_flags_become_overrides() {
        let cli = Cli::parse_from([
            "proctor",
            "-s",
            "30",
            "--report-url",
            "https://example.com/r",
            "--log-results",
            "--no-lock-window",
        ]);
        let overrides = cli.overrides();

        assert_eq!(overrides.seconds_per_question, Some(30));
        assert_eq!(overrides.report_url.as_deref(), Some("https://example.com/r"));
        assert!(overrides.log_results);
        assert!(overrides.no_lock_window);
    }

    #[test]
    fn test_questions_and_url_conflict() {
        let parsed = Cli::try_parse_from([
            "proctor",
            "-q",
            "bank.json",
            "--questions-url",
            "https://example.com/bank.json",
        ]);

        assert!(parsed.is_err());
    }

    #[test]
    fn test_question_source_selection() {
        let file = Cli::parse_from(["proctor", "-q", "bank.json"]).question_source();
        assert_eq!(file.describe(), "bank.json");

        let url = Cli::parse_from(["proctor", "--questions-url", "https://x.test/q.json"])
            .question_source();
        assert_eq!(url.describe(), "https://x.test/q.json");

        let embedded = Cli::parse_from(["proctor"]).question_source();
        assert_eq!(embedded.describe(), "embedded:sample.json");
    }

    #[test]
    fn test_cli_prefill() {
        let cli = Cli::parse_from(["proctor", "--name", "Ada", "--id", "42", "--class", "B"]);
        let app = App::new(
            RuntimeSettings::default(),
            cli.question_source(),
            build_reporter(&RuntimeSettings::default()),
        )
        .with_login(
            cli.name.as_deref().unwrap_or_default(),
            cli.id.as_deref().unwrap_or_default(),
            cli.class.as_deref().unwrap_or_default(),
        );

        assert_eq!(app.login.name, "Ada");
        assert_eq!(app.login.class, "B");
    }

    #[test]
    fn test_tick_rate_constant() {
        assert_eq!(TICK_RATE_MS, 100);
    }
}
