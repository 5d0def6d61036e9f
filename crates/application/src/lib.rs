//! Ferrous Collector Application Layer
//!
//! Ports to the collaborators the pipeline depends on and the transform
//! chain every normalized message runs through.
pub mod ports;
pub mod transforms;
