pub mod collector;
pub mod exec;
pub mod probe;
pub mod sampler;
pub mod snapshot;
