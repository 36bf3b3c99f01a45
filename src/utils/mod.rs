//! The `utils` module provides a collection of utility functions and common
//! definitions used across the `chatrelay` crate.
//!
//! It centralizes the error taxonomy and the logging bootstrap so that every
//! other module reports failures and diagnostics the same way.

pub mod error;
pub mod logging;
