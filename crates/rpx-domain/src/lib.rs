#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod environment;
pub mod manifest;
pub mod request;

pub use environment::{Environment, PATH_SEPARATOR, PATH_VAR};
pub use manifest::{BinField, PackageManifest};
pub use request::{parse_specifier, InvocationRequest, ParsedSpecifier};
