//! Result type alias for docferry
//!
//! This module provides a convenient Result type alias that uses FerryError
//! as the error type.

use super::errors::FerryError;

/// Result type alias for docferry operations
///
/// This is a convenience type alias that uses `FerryError` as the error type.
/// Use this throughout the codebase for fallible operations.
///
/// # Examples
///
/// ```
/// use docferry::domain::result::Result;
/// use docferry::domain::errors::FerryError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(FerryError::Validation("invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, FerryError>;
