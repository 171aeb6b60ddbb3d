//! Utility functions shared across layers.
//!
//! - [`code_generator`] - Base62 short code encoding and request ids

pub mod code_generator;
