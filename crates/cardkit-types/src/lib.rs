//! Foundation types and traits for cardkit.
//!
//! This crate contains the host-agnostic types shared by every cardkit crate:
//! key events, the display and speaker traits the framework draws and beeps
//! through, and the error type.

pub mod backend;
pub mod error;
pub mod input;
