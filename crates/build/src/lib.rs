pub mod codegen;
pub mod conf;
pub mod config;
pub mod driver;
pub mod error;
pub mod orchestrator;

pub use driver::{build_project, clean_project, load_project_config, BuildSummary, CleanArgs};
pub use error::{BuildError, Result};
