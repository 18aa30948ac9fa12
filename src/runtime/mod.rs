//! Runtime adapters: environment termination signals.

pub mod signal;

pub use signal::{TerminationListener, TerminationRequest};
