pub mod context;
pub mod metrics;
pub mod record;
pub mod timestamp;

pub use context::Context;
pub use record::Record;
