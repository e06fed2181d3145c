use std::{env, io, path::PathBuf, sync::Once};

use crossterm::{
    execute,
    terminal::{LeaveAlternateScreen, disable_raw_mode},
};
use tracing_appender::non_blocking::WorkerGuard;

pub const LOG_FILE_NAME: &str = "skrevo.log";

/// Where the log file goes. The terminal belongs to the UI, so logs never
/// go to stdout or stderr.
pub fn log_dir() -> PathBuf {
    env::temp_dir()
}

/// Installs the global subscriber, filtered by `RUST_LOG`. The returned
/// guard flushes the non-blocking writer when dropped; `None` means another
/// subscriber was already installed.
pub fn configure_logging() -> Option<WorkerGuard> {
    let file_appender = tracing_appender::rolling::never(log_dir(), LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}

/// Leaves raw mode and the alternate screen. Harmless when neither is active.
pub fn restore_terminal() {
    disable_raw_mode().ok();
    execute!(io::stdout(), LeaveAlternateScreen).ok();
}

/// Logs the panic and hands the terminal back before the default hook
/// prints the message.
pub fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime", ?info, "panic");
            restore_terminal();
            default_panic(info);
        }));
    });
}
