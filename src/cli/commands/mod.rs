//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod copy;
pub mod count;
pub mod init;
pub mod validate;
