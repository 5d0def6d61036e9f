mod hickory_decoder;

pub use hickory_decoder::HickoryDnsDecoder;
