//! Store error classification.
//!
//! Stores report failures in inconsistent shapes: a numeric code on the top
//! level, a code buried in a per-document failure, or nothing but message
//! text. The classifier reduces every [`StoreError`] to one of four classes
//! the writer knows how to react to. Checks run in a fixed order so an
//! error matching several patterns lands in the most actionable class:
//! throttling first (a throttled bulk write often also carries duplicate
//! noise), then duplicate identifiers, then network failures.

use crate::domain::errors::StoreError;

/// Write failure classes the batch writer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The store shed load; back off and retry.
    Throttle,
    /// A document identifier already exists in the target.
    Conflict,
    /// The transport failed; the store may be fine.
    Network,
    /// Anything the writer does not know how to retry.
    Other,
}

/// Numeric codes that signal rate limiting.
///
/// 429 is the HTTP status used by most managed document stores; 16500 is
/// the request-rate code of Cosmos DB's MongoDB-compatible API.
const THROTTLE_CODES: [i32; 2] = [429, 16500];

/// Message fragments that signal rate limiting, matched case-insensitively.
const THROTTLE_VOCABULARY: [&str; 5] = [
    "too many requests",
    "request rate is large",
    "rate limit",
    "throttl",
    "retryafterms",
];

/// Numeric codes that signal a duplicate identifier.
///
/// 11000 is the classic duplicate-key code; 11001 its legacy counterpart
/// raised on updates.
const CONFLICT_CODES: [i32; 2] = [11000, 11001];

/// Message fragments that signal a duplicate identifier.
const CONFLICT_VOCABULARY: [&str; 2] = ["duplicate key", "e11000"];

/// Numeric codes that signal transport failures on stores that report them.
const NETWORK_CODES: [i32; 3] = [6, 7, 89];

/// Message fragments that signal transport failures.
const NETWORK_VOCABULARY: [&str; 9] = [
    "timed out",
    "timeout",
    "connection refused",
    "connection reset",
    "connection closed",
    "broken pipe",
    "unreachable",
    "no route to host",
    "dns error",
];

/// Classifies a store error into the class the writer should react to.
///
/// The function is pure and total: every error maps to exactly one class,
/// and the same error always maps to the same class. Top-level code and
/// message are checked first, then every per-document failure, so a
/// throttling response wrapped inside a generic bulk-write error is still
/// recognized as throttling.
pub fn classify(error: &StoreError) -> ErrorClass {
    if matches_class(error, &THROTTLE_CODES, &THROTTLE_VOCABULARY) {
        return ErrorClass::Throttle;
    }
    if matches_class(error, &CONFLICT_CODES, &CONFLICT_VOCABULARY) {
        return ErrorClass::Conflict;
    }
    if matches_class(error, &NETWORK_CODES, &NETWORK_VOCABULARY) {
        return ErrorClass::Network;
    }
    ErrorClass::Other
}

fn matches_class(error: &StoreError, codes: &[i32], vocabulary: &[&str]) -> bool {
    if code_matches(error.code, codes) || text_matches(&error.message, vocabulary) {
        return true;
    }
    error
        .failures
        .iter()
        .any(|f| code_matches(f.code, codes) || text_matches(&f.message, vocabulary))
}

fn code_matches(code: Option<i32>, codes: &[i32]) -> bool {
    code.is_some_and(|c| codes.contains(&c))
}

fn text_matches(message: &str, vocabulary: &[&str]) -> bool {
    let lowered = message.to_lowercase();
    vocabulary.iter().any(|needle| lowered.contains(needle))
}
