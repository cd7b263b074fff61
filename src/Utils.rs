//! different utility modules used throughout the project
/// settings of the visualizer, read from a TOML file
pub mod config;
/// terminal and file logging
pub mod logger;
/// chart of a function, its derivative and its integral
pub mod plots;
