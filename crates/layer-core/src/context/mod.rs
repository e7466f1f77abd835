//! Machine context collection
//!
//! The context type itself lives in `layer-meta`; this module knows how to
//! fill one in from the live system.

mod provider;

pub use provider::{MachineContextProvider, collect};
