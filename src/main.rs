use std::{
    io,
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use crossbeam_channel::{Receiver, unbounded};
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{error, info, warn};

use skrevo::{
    autosave::{AutosaveEvent, AutosaveScheduler},
    config::{Config, DEFAULT_CONFIG_PATH, DEFAULT_CONTENT_FILE, write_bindings},
    context::SessionContext,
    document::Document,
    error::StartupError,
    keys::KeyBindings,
    logging,
    paths::{expand_path, resolve_target},
    session::{Session, SessionOptions},
    theme::Theme,
    ui,
};

const TICK_RATE: Duration = Duration::from_millis(250);
const TARGET_DESCRIPTION: &str = "skrevo.txt";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(
    name = "skrevo",
    version,
    about = "A distraction-reduced terminal editor for free writing"
)]
struct Args {
    /// File to write in. Falls back to `content-file` in the config, then ~/skrevo.txt.
    #[arg(value_name = "SKREVOFILE")]
    file: Option<String>,
    /// Configuration file.
    #[arg(short = 'c', long = "config", value_name = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    /// Print the default key bindings as a `[keys]` section and exit.
    #[arg(long = "show-default-bindings")]
    show_default_bindings: bool,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            err.print().ok();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let _log_guard = logging::configure_logging();
    logging::install_panic_hook();

    match run(args) {
        Ok(code) => code,
        Err(err) => {
            error!(target: "runtime", error = %format!("{err:#}"), "fatal");
            match err.downcast_ref::<StartupError>() {
                Some(startup) => {
                    eprintln!("ERROR: {startup}");
                    eprintln!();
                    eprintln!("{}", Args::command().render_usage());
                }
                None => eprintln!("ERROR: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    if args.show_default_bindings {
        let mut stdout = io::stdout().lock();
        write_bindings(&KeyBindings::default(), &mut stdout)
            .context("failed to print key bindings")?;
        return Ok(ExitCode::SUCCESS);
    }

    let config_path = expand_path(&args.config);
    let config = Config::load(&config_path)?;
    let raw_target = args
        .file
        .or_else(|| config.settings.content_file.clone())
        .unwrap_or_else(|| DEFAULT_CONTENT_FILE.to_string());
    let target = resolve_target(&raw_target, TARGET_DESCRIPTION)?;

    let (document, initial_status) = load_document(target);
    info!(
        target: "runtime",
        file = %document.file_path().display(),
        config = %config_path.display(),
        auto_save = config.settings.auto_save,
        "startup"
    );

    let context = Arc::new(SessionContext::new(document, config.settings.auto_save));
    let (events_tx, events_rx) = unbounded();
    let scheduler = AutosaveScheduler::start(Arc::clone(&context), events_tx)
        .context("failed to start the autosave worker")?;

    let mut session = Session::new(
        Arc::clone(&context),
        config.key_bindings(),
        SessionOptions {
            word_wrap: config.settings.enable_word_wrap,
            borders: config.settings.enable_borders,
            show_toolbar: config.settings.show_toolbar,
        },
    );
    if let Some(status) = initial_status {
        session.set_status(status);
    }

    let ui_result = run_terminal(&mut session, &events_rx);
    let save_result = scheduler.shutdown();
    ui_result?;

    match save_result {
        Ok(()) => {
            info!(target: "runtime", "shutdown_complete");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("ERROR: final save failed: {err}");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// An unreadable file still opens: the session starts empty and says why.
fn load_document(path: PathBuf) -> (Document, Option<String>) {
    match Document::load(path.clone()) {
        Ok(document) => (document, None),
        Err(err) => {
            warn!(target: "io", %err, "file_open_error");
            let message = format!("{err}. Starting with an empty document.");
            (Document::new(path), Some(message))
        }
    }
}

fn run_terminal(session: &mut Session, events: &Receiver<AutosaveEvent>) -> Result<()> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let theme = Theme::new();

    let result = execute!(io::stdout(), EnterAlternateScreen)
        .context("failed to enter alternate screen")
        .and_then(|()| {
            Terminal::new(CrosstermBackend::new(io::stdout()))
                .context("failed to create terminal backend")
        })
        .and_then(|mut terminal| {
            terminal.clear().ok();
            let res = run_app(&mut terminal, session, events, &theme).context("application error");
            terminal.show_cursor().ok();
            res
        });

    logging::restore_terminal();

    result
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    session: &mut Session,
    events: &Receiver<AutosaveEvent>,
    theme: &Theme,
) -> Result<()> {
    let mut last_tick = Instant::now();

    while !session.should_quit() {
        terminal
            .draw(|frame| ui::draw(frame, session, theme))
            .context("failed to draw frame")?;

        let timeout = TICK_RATE
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout).context("event poll failed")? {
            if let Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) = event::read().context("failed to read event")?
            {
                session.handle_key(code, modifiers);
            }
        }

        for event in events.try_iter() {
            session.on_autosave_event(event);
        }

        if last_tick.elapsed() >= TICK_RATE {
            session.on_tick();
            last_tick = Instant::now();
        }
    }

    Ok(())
}
