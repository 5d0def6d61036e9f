mod chain;
mod extract;
mod features;
mod filtering;
mod geoip;
mod labels;
mod latency;
mod normalize;
mod privacy;
mod reducer;
mod stage;
mod suspicious;
mod tags;

pub use chain::TransformChain;
pub use stage::{StageOutcome, TransformStage};
