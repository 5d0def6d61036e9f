//! Ferrous Collector Infrastructure Layer
pub mod decoder;
pub mod pipeline;

pub use decoder::HickoryDnsDecoder;
pub use pipeline::{
    ConsumerSet, DropLedger, DropMonitor, FanoutRouter, Processor, ProcessorHandle,
    ProcessorState, QueueConsumer, RouteOutcome,
};
