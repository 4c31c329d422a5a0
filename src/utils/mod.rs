//! Process and filesystem helpers shared by the pipeline.

pub mod exec;
pub mod fs;
