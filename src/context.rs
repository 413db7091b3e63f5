//! Reporter traits
//!
//! These let the expander surface generator failures without depending on
//! a particular logging or reporting setup.

use crate::types::ResourceRef;

/// Receives generator failures, attributed to the resource that raised them
pub trait GenerationReporter: Send {
    /// Called once per failed generation callback
    ///
    /// # Arguments
    /// * `resource` - The resource whose generator failed
    /// * `error` - The error returned by the generator
    /// * `message` - Human-readable summary including the phase
    fn log_exception(&mut self, resource: &ResourceRef, error: &anyhow::Error, message: &str);
}

/// Default reporter: writes through the `log` facade at error level
pub struct LogReporter;

impl GenerationReporter for LogReporter {
    fn log_exception(&mut self, resource: &ResourceRef, error: &anyhow::Error, message: &str) {
        log::error!("{resource}: {message}");
        for cause in error.chain().skip(1) {
            log::debug!("{resource}: caused by: {cause}");
        }
    }
}

/// No-op reporter
pub struct NoReporter;

impl GenerationReporter for NoReporter {
    fn log_exception(&mut self, _resource: &ResourceRef, _error: &anyhow::Error, _message: &str) {}
}
