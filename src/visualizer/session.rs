//! Interactive terminal front end.
//!
//! The session owns the two inputs, the expression text and the slider position, and reruns
//! the pipeline whenever one of them changes. Each run writes the figure to the configured PNG
//! file and prints the page: title, configuration panel, explanations, a summary table and
//! notices, or only the error indicator when the text is not a valid function.
use crate::Utils::config::{VisualizerConfig, clamp_point};
use crate::Utils::plots::render_png;
use crate::numerical::sampler::CurveSample;
use crate::symbolic::symbolic_integration::Antiderivative;
use crate::symbolic::whitelist::KnownFunction;
use crate::visualizer::pipeline::{
    APP_TITLE, CONFIGURATION_HEADING, DERIVATIVE_HEADING, DERIVATIVE_TEXT, FUNCTION_INPUT_LABEL,
    INTEGRAL_HEADING, INTEGRAL_TEXT, POINT_INPUT_LABEL, Response, Visualization,
    VisualizationRequest, visualize,
};
use log::{error, info};
use std::io::{self, BufRead, Write};
use tabled::{builder::Builder, settings::Style};

const PROMPT: &str = "> ";

/// One line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// new function text
    Expression(String),
    /// new slider position, not yet clamped
    Point(f64),
    /// `point` followed by something that is not a number
    BadPoint(String),
    Help,
    Quit,
    Empty,
}

/// Reads a command; anything that is not a keyword is an expression.
pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    match line {
        "help" | "?" => return Command::Help,
        "quit" | "exit" => return Command::Quit,
        _ => {}
    }
    let mut words = line.splitn(2, char::is_whitespace);
    if let (Some("point" | "p"), Some(value)) = (words.next(), words.next()) {
        let value = value.trim();
        return match value.parse::<f64>() {
            Ok(v) if !v.is_nan() => Command::Point(v),
            _ => Command::BadPoint(value.to_string()),
        };
    }
    Command::Expression(line.to_string())
}

pub fn help_text() -> String {
    format!(
        "Type a function of the variable to plot it, e.g. x**2*sin(x).\n\
         Known functions: {}. Powers: ** or ^.\n\
         point <value> (or p <value>)  move the highlighted point, -10 to 10\n\
         help                         show this text\n\
         quit, exit                   leave",
        KnownFunction::names().join(", ")
    )
}

/// Summary of the three curves as a table.
pub fn summary_table(visualization: &Visualization) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Curve", "Expression", "Samples", "Undefined"]);
    let integral_expr = match &visualization.antiderivative {
        Antiderivative::Closed(expr) => expr.to_string(),
        Antiderivative::Numeric { integrand, .. } => {
            format!("∫₀ˣ {} (numeric)", integrand)
        }
    };
    let rows: [(&str, String, &CurveSample); 3] = [
        (
            "Function",
            visualization.function.to_string(),
            visualization.original(),
        ),
        (
            "Derivative",
            visualization.derivative.to_string(),
            visualization.derivative_sample(),
        ),
        ("Integral", integral_expr, visualization.integral_sample()),
    ];
    for (name, expr, sample) in rows {
        builder.push_record([
            name.to_string(),
            expr,
            sample.len().to_string(),
            sample.non_finite_count().to_string(),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.to_string()
}

pub struct Session {
    config: VisualizerConfig,
    expression: String,
    point: f64,
    last: Option<Response>,
}

impl Session {
    pub fn new(config: VisualizerConfig) -> Self {
        Session {
            expression: config.expression.clone(),
            point: clamp_point(config.point),
            config,
            last: None,
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn point(&self) -> f64 {
        self.point
    }

    /// response of the latest run
    pub fn last_response(&self) -> Option<&Response> {
        self.last.as_ref()
    }

    fn rerun(&mut self) -> &Response {
        let request = VisualizationRequest::new(&self.expression, self.point);
        self.last.insert(visualize(&request, &self.config))
    }

    pub fn set_expression(&mut self, text: &str) -> &Response {
        self.expression = text.trim().to_string();
        self.rerun()
    }

    pub fn set_point(&mut self, value: f64) -> &Response {
        self.point = clamp_point(value);
        self.rerun()
    }

    /// Prints the page for the latest response and writes the figure file.
    fn show<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", APP_TITLE)?;
        writeln!(out, "[{}]", CONFIGURATION_HEADING)?;
        writeln!(out, "  {}: {}", FUNCTION_INPUT_LABEL, self.expression)?;
        writeln!(out, "  {}: {:?}", POINT_INPUT_LABEL, self.point)?;
        match &self.last {
            None => {}
            Some(Response::Error(indicator)) => writeln!(out, "{}", indicator)?,
            Some(Response::Rendered(visualization)) => {
                writeln!(out, "\n{}\n{}", DERIVATIVE_HEADING, DERIVATIVE_TEXT)?;
                writeln!(out, "\n{}\n{}\n", INTEGRAL_HEADING, INTEGRAL_TEXT)?;
                writeln!(out, "{}", summary_table(visualization))?;
                writeln!(
                    out,
                    "point on {}: {}",
                    visualization.function_label(),
                    visualization.figure.annotation
                )?;
                for notice in &visualization.notices {
                    writeln!(out, "note: {}", notice)?;
                }
                let path = &self.config.output_path;
                match render_png(&visualization.figure, path, self.config.figure_size()) {
                    Ok(()) => {
                        info!("figure written to {}", path.display());
                        writeln!(out, "figure: {}", path.display())?;
                    }
                    Err(e) => {
                        error!("{}", e);
                        writeln!(out, "figure not written: {}", e)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Reads commands until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        self.rerun();
        self.show(out)?;
        write!(out, "{}", PROMPT)?;
        out.flush()?;
        for line in input.lines() {
            match parse_command(&line?) {
                Command::Quit => break,
                Command::Empty => {}
                Command::Help => writeln!(out, "{}", help_text())?,
                Command::BadPoint(value) => writeln!(out, "not a number: {}", value)?,
                Command::Point(value) => {
                    self.set_point(value);
                    self.show(out)?;
                }
                Command::Expression(text) => {
                    self.set_expression(&text);
                    self.show(out)?;
                }
            }
            write!(out, "{}", PROMPT)?;
            out.flush()?;
        }
        writeln!(out)?;
        Ok(())
    }
}
