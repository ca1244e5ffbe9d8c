//! # EDM Testkit
//!
//! Test utilities for the EDM runtime.
//!
//! This crate provides:
//! - An example datamodel (`Hit`, `Cluster`, `Track`) shaped like
//!   generated per-type code
//! - Property-based generators for events with random relation graphs
//! - Fixtures for a small, fully related sample event
//! - Log setup for tests and benches
//!
//! ## Usage
//!
//! ```rust
//! use edm_testkit::prelude::*;
//!
//! init_test_logging();
//! let frame = sample_frame();
//! let read = reread(frame.write_data().unwrap()).unwrap();
//! assert_eq!(EventSpec::from_frame(&read).unwrap(), sample_event());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod datamodel;
pub mod fixtures;
pub mod generators;
pub mod logging;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::datamodel::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logging::*;
}

pub use datamodel::*;
pub use fixtures::*;
pub use generators::*;
pub use logging::*;
