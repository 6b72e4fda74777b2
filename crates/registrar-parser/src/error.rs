//! Diagnostic system for the Registrar front-end.
//!
//! Every phase reports problems as [`Diagnostic`]s instead of failing on the
//! first one. Phases push into a caller-owned [`DiagnosticCollector`]; APIs
//! that need a `Result` wrap the accumulated list in a [`ParseError`].

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub use collector::DiagnosticCollector;
pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::{ParseError, Result};
pub use severity::Severity;
