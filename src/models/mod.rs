pub mod record;
pub mod tick;

pub use record::EnrichedRecord;
pub use tick::{RawTick, Tick, TickTimestamp};
