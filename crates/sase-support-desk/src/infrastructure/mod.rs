//! Infrastructure adapters
pub mod clock;
pub mod memory;
pub mod tracing_view;

pub use clock::{FixedClock, SystemClock};
pub use memory::InMemoryDataSource;
pub use tracing_view::{TracingChartSink, TracingView};
