#![allow(non_snake_case)]
use CalculusVisualizer::Utils::config::{CONFIG_FILE, VisualizerConfig};
use CalculusVisualizer::Utils::logger::init_logger;
use CalculusVisualizer::visualizer::session::Session;
use std::io;
use std::path::Path;

fn main() -> io::Result<()> {
    let config = match VisualizerConfig::load_or_default(Path::new(CONFIG_FILE)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}; using default settings", e);
            VisualizerConfig::default()
        }
    };
    if let Some(path) = init_logger(config.log_level, config.log_file)? {
        println!("log file: {}", path.display());
    }
    let mut session = Session::new(config);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    session.run(stdin.lock(), &mut stdout)
}
