//! Observability utilities.

mod subscriber;
mod timer;

pub use subscriber::{build_filter, init_tracing};
pub use timer::SpanTimer;
