#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

//! Resolution-and-execution engine: decides whether a requested command is
//! already satisfied, installs packages into a private invocation-scoped
//! prefix when it is not, classifies the resolved target, and runs it with
//! faithful exit-status propagation.

pub mod classify;
pub mod exec;
pub mod installer;
pub mod lifecycle;
pub mod locator;
pub mod npm;
pub mod outcome;
pub mod paths;
pub mod runner;

pub use exec::{decide_strategy, ExecutionStrategy};
pub use installer::InstallRoot;
pub use outcome::{
    ExecutionTarget, ExitOutcome, InstallOutcome, ResolvedPath, RpxError, NOT_FOUND_EXIT_CODE,
};
pub use runner::run;
