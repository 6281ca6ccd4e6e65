/// Queue-to-core boundary
///
/// The adapter receives one message body at a time from the queue client,
/// runs it through the enrichment pipeline and hands the result to the
/// broadcaster. The queue client only learns whether to ack or reject.

pub mod adapter;

pub use adapter::{Disposition, IngestionAdapter, IngestionStats, SharedIngestionAdapter};
