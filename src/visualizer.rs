//! The visualizer itself: one run of the pipeline and the interactive session around it.
/// text and slider position in, figure or error indicator out
pub mod pipeline;
#[cfg(test)]
mod pipeline_tests;
/// terminal front end
pub mod session;
