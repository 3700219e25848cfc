// optiga-rs/src/bus/mod.rs

pub mod mock;
pub mod traits;

pub use mock::{MockBus, SharedMockBus};
pub use traits::TwoWireBus;
