use chrono::Local;
use log::{LevelFilter, info};
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::File;
use std::io;
use std::path::PathBuf;

/// `log_YYYY-MM-DD_HH-MM-SS.txt` for the current local time
pub fn log_file_name() -> String {
    let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
    format!("log_{}.txt", date_and_time)
}

/// Installs a terminal logger and, if `to_file` is set, a time-stamped log file next to it.
///
/// A logger that is already installed is kept; the function then returns without error.
/// Returns the log file path when one was created.
pub fn init_logger(level: LevelFilter, to_file: bool) -> io::Result<Option<PathBuf>> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    let mut path = None;
    if to_file {
        let name = PathBuf::from(log_file_name());
        loggers.push(WriteLogger::new(level, Config::default(), File::create(&name)?));
        path = Some(name);
    }
    match CombinedLogger::init(loggers) {
        Ok(()) => {
            info!("logging at level {}", level);
            Ok(path)
        }
        Err(_) => Ok(None),
    }
}
