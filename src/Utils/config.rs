//! Visualizer settings, optionally read from a TOML file.
//!
//! ```toml
//! [input]
//! variable = "x"
//! expression = "x**3*(x*cos(x) + 4*sin(x))"
//! point = 0.0
//!
//! [output]
//! path = "calculus_visualizer.png"
//! width = 1200
//! height = 800
//!
//! [logging]
//! level = "info"
//! file = false
//!
//! [integration]
//! quadrature_degree = 16
//! ```
//! Every key is optional. Unknown keys are reported and ignored, a key of the wrong type is
//! an error.
use crate::numerical::sampler::{GRID_END, GRID_START};
use crate::symbolic::symbolic_engine::FreeVariable;
use crate::symbolic::whitelist::KnownFunction;
use log::{LevelFilter, warn};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use toml::{Table, Value};

pub const CONFIG_FILE: &str = "calculus_visualizer.toml";
pub const DEFAULT_EXPRESSION: &str = "x**3*(x*cos(x) + 4*sin(x))";
const MAX_FIGURE_SIDE: i64 = 10_000;
const MIN_QUADRATURE_DEGREE: i64 = 2;
const MAX_QUADRATURE_DEGREE: i64 = 100;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Io { path: PathBuf, message: String },
    Syntax(String),
    WrongType { key: String, expected: &'static str },
    InvalidValue { key: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "cannot read {}: {}", path.display(), message)
            }
            ConfigError::Syntax(msg) => write!(f, "malformed configuration: {}", msg),
            ConfigError::WrongType { key, expected } => {
                write!(f, "'{}' must be {}", key, expected)
            }
            ConfigError::InvalidValue { key, reason } => {
                write!(f, "invalid value for '{}': {}", key, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq)]
pub struct VisualizerConfig {
    /// name of the free variable
    pub variable: String,
    /// expression shown on start
    pub expression: String,
    /// initial slider position, inside [-10, 10]
    pub point: f64,
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub log_level: LevelFilter,
    /// also write a time-stamped log file
    pub log_file: bool,
    /// Gauss-Legendre points per panel of a numeric integral
    pub quadrature_degree: usize,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        VisualizerConfig {
            variable: "x".to_string(),
            expression: DEFAULT_EXPRESSION.to_string(),
            point: 0.0,
            output_path: PathBuf::from("calculus_visualizer.png"),
            width: 1200,
            height: 800,
            log_level: LevelFilter::Info,
            log_file: false,
            quadrature_degree: 16,
        }
    }
}

/// Clamps a slider value into [-10, 10]; NaN goes to 0.
pub fn clamp_point(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(GRID_START, GRID_END)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn wrong_type(key: &str, expected: &'static str) -> ConfigError {
    ConfigError::WrongType {
        key: key.to_string(),
        expected,
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn get_str(value: &Value, key: &str) -> Result<String, ConfigError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| wrong_type(key, "a string"))
}

fn get_float(value: &Value, key: &str) -> Result<f64, ConfigError> {
    value
        .as_float()
        .or_else(|| value.as_integer().map(|i| i as f64))
        .ok_or_else(|| wrong_type(key, "a number"))
}

fn get_int(value: &Value, key: &str, min: i64, max: i64) -> Result<i64, ConfigError> {
    let int = value
        .as_integer()
        .ok_or_else(|| wrong_type(key, "an integer"))?;
    if int < min || int > max {
        return Err(invalid(key, format!("must be between {} and {}", min, max)));
    }
    Ok(int)
}

fn get_bool(value: &Value, key: &str) -> Result<bool, ConfigError> {
    value.as_bool().ok_or_else(|| wrong_type(key, "a boolean"))
}

impl VisualizerConfig {
    /// Reads the settings from TOML text, starting from the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let table = text
            .parse::<Table>()
            .map_err(|e| ConfigError::Syntax(e.to_string()))?;
        let mut config = VisualizerConfig::default();
        for (section, content) in table.iter() {
            let Some(content) = content.as_table() else {
                warn!("ignoring top-level key '{}' outside of a section", section);
                continue;
            };
            for (name, value) in content.iter() {
                let key = format!("{}.{}", section, name);
                config.apply(&key, value)?;
            }
        }
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, key: &str, value: &Value) -> Result<(), ConfigError> {
        match key {
            "input.variable" => self.variable = get_str(value, key)?,
            "input.expression" => self.expression = get_str(value, key)?,
            "input.point" => {
                let point = get_float(value, key)?;
                self.point = clamp_point(point);
                if self.point != point {
                    warn!("{} = {} is outside [-10, 10], using {}", key, point, self.point);
                }
            }
            "output.path" => self.output_path = PathBuf::from(get_str(value, key)?),
            "output.width" => self.width = get_int(value, key, 1, MAX_FIGURE_SIDE)? as u32,
            "output.height" => self.height = get_int(value, key, 1, MAX_FIGURE_SIDE)? as u32,
            "logging.level" => {
                let level = get_str(value, key)?;
                self.log_level = LevelFilter::from_str(&level)
                    .map_err(|_| invalid(key, format!("unknown log level '{}'", level)))?;
            }
            "logging.file" => self.log_file = get_bool(value, key)?,
            "integration.quadrature_degree" => {
                self.quadrature_degree =
                    get_int(value, key, MIN_QUADRATURE_DEGREE, MAX_QUADRATURE_DEGREE)? as usize
            }
            _ => warn!("ignoring unknown configuration key '{}'", key),
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !is_identifier(&self.variable) {
            return Err(invalid("input.variable", "must be a plain identifier"));
        }
        if KnownFunction::lookup(&self.variable).is_some() {
            return Err(invalid("input.variable", "must not be a function name"));
        }
        Ok(())
    }

    /// Reads the file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        VisualizerConfig::from_toml_str(&text)
    }

    /// Reads the file at `path` if it exists, otherwise returns the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            VisualizerConfig::load(path)
        } else {
            Ok(VisualizerConfig::default())
        }
    }

    pub fn free_variable(&self) -> FreeVariable {
        FreeVariable::new(&self.variable)
    }

    pub fn figure_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = VisualizerConfig::default();
        assert_eq!(config.variable, "x");
        assert_eq!(config.expression, "x**3*(x*cos(x) + 4*sin(x))");
        assert_eq!(config.point, 0.0);
        assert_eq!(config.figure_size(), (1200, 800));
        assert_eq!(config.quadrature_degree, 16);
        assert_eq!(config.log_level, LevelFilter::Info);
    }

    #[test]
    fn test_empty_text_gives_defaults() {
        assert_eq!(
            VisualizerConfig::from_toml_str("").unwrap(),
            VisualizerConfig::default()
        );
    }

    #[test]
    fn test_full_file() {
        let text = r#"
            [input]
            variable = "t"
            expression = "sin(t)"
            point = 2

            [output]
            path = "out.png"
            width = 640
            height = 480

            [logging]
            level = "debug"
            file = true

            [integration]
            quadrature_degree = 32
        "#;
        let config = VisualizerConfig::from_toml_str(text).unwrap();
        assert_eq!(config.variable, "t");
        assert_eq!(config.expression, "sin(t)");
        assert_eq!(config.point, 2.0);
        assert_eq!(config.output_path, PathBuf::from("out.png"));
        assert_eq!(config.figure_size(), (640, 480));
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert!(config.log_file);
        assert_eq!(config.quadrature_degree, 32);
        assert_eq!(config.free_variable().name(), "t");
    }

    #[test]
    fn test_point_is_clamped() {
        let config = VisualizerConfig::from_toml_str("[input]\npoint = 25.5").unwrap();
        assert_eq!(config.point, 10.0);
        assert_eq!(clamp_point(-11.0), -10.0);
        assert_eq!(clamp_point(f64::NAN), 0.0);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config = VisualizerConfig::from_toml_str("[input]\ncolour = \"red\"\n[extra]\na = 1")
            .unwrap();
        assert_eq!(config, VisualizerConfig::default());
    }

    #[test]
    fn test_wrong_types_are_errors() {
        assert_eq!(
            VisualizerConfig::from_toml_str("[output]\nwidth = \"wide\""),
            Err(ConfigError::WrongType {
                key: "output.width".to_string(),
                expected: "an integer"
            })
        );
        assert!(VisualizerConfig::from_toml_str("[logging]\nfile = 1").is_err());
        assert!(VisualizerConfig::from_toml_str("[input]\npoint = \"0\"").is_err());
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            VisualizerConfig::from_toml_str("[integration]\nquadrature_degree = 1"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(VisualizerConfig::from_toml_str("[output]\nheight = 0").is_err());
        assert!(VisualizerConfig::from_toml_str("[logging]\nlevel = \"loud\"").is_err());
        assert!(VisualizerConfig::from_toml_str("[input]\nvariable = \"sin\"").is_err());
        assert!(VisualizerConfig::from_toml_str("[input]\nvariable = \"2x\"").is_err());
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            VisualizerConfig::from_toml_str("[input\nvariable = "),
            Err(ConfigError::Syntax(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[input]\nexpression = \"x**2\"").unwrap();
        let config = VisualizerConfig::load(file.path()).unwrap();
        assert_eq!(config.expression, "x**2");

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(CONFIG_FILE);
        assert_eq!(
            VisualizerConfig::load_or_default(&missing).unwrap(),
            VisualizerConfig::default()
        );
        assert!(matches!(
            VisualizerConfig::load(&missing),
            Err(ConfigError::Io { .. })
        ));
    }
}
