//! Diagnostic sink used for non-fatal notices
//!
//! Kept behind a trait so input resolution stays testable without capturing
//! process output.

/// Sink for non-fatal diagnostic messages
pub trait Diagnostics {
    fn debug(&self, message: &str);
}

/// Console sink; prints only when verbose output is enabled
#[derive(Debug, Clone, Copy)]
pub struct ConsoleDiagnostics {
    pub verbose: bool,
}

impl Diagnostics for ConsoleDiagnostics {
    fn debug(&self, message: &str) {
        if self.verbose {
            println!("{}", message);
        }
    }
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn debug(&self, _message: &str) {}
}
