mod consumer_set;
mod drop_monitor;
mod ingest;
mod processor;
mod queue_consumer;
mod router;

pub use consumer_set::{ConsumerEntry, ConsumerSet};
pub use drop_monitor::{DropLedger, DropMonitor, DropMonitorHandle};
pub use processor::{Processor, ProcessorHandle, ProcessorState};
pub use queue_consumer::QueueConsumer;
pub use router::{FanoutRouter, RouteOutcome};
