//! Tool analysis entry points.

mod bash;
mod context;
mod trace;

pub use bash::{analyze_bash, analyze_command, analyze_command_traced};
pub use context::{
    AnalyzeOptions, Environment, PARANOID_ENV, PARANOID_INTERPRETERS_ENV, PARANOID_RM_ENV,
    STRICT_ENV, env_truthy,
};
pub use trace::TraceStep;
