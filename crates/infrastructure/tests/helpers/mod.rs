mod codec;
mod frames;

pub use codec::JsonEnvelopeCodec;
pub use frames::{dns_payload, FrameBuilder};
