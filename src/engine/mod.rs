pub mod sequential;
pub mod trace;
#[cfg(test)]
pub mod integration_tests;

pub use sequential::SequentialExecutor;
pub use trace::{Trace, TraceFragment};
