//! Conflict policies.
//!
//! A conflict policy decides, ahead of time, how the batch writer behaves
//! when a document's identifier already exists in the target. The policy
//! shapes three things: how documents are prepared before submission, which
//! write primitive each round uses, and whether a reported duplicate stops
//! the run or is absorbed.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::domain::document::ID_FIELD;
use crate::domain::stats::OutcomeKind;

/// Field that receives the original identifier under
/// [`ConflictPolicy::GenerateNewIds`].
pub const PRESERVED_ID_FIELD: &str = "_originalId";

/// How identifier conflicts in the target are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Stop the transfer at the first duplicate identifier.
    Abort,
    /// Keep target documents, drop conflicting source documents.
    Skip,
    /// Replace target documents with the source version, keyed by identifier.
    Overwrite,
    /// Strip identifiers so the target assigns fresh ones; the original id
    /// is preserved inside the document.
    GenerateNewIds,
}

impl ConflictPolicy {
    /// All policies, in the order they are offered to users.
    pub const ALL: [ConflictPolicy; 4] = [
        ConflictPolicy::Abort,
        ConflictPolicy::Skip,
        ConflictPolicy::Overwrite,
        ConflictPolicy::GenerateNewIds,
    ];

    /// Canonical name used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictPolicy::Abort => "abort",
            ConflictPolicy::Skip => "skip",
            ConflictPolicy::Overwrite => "overwrite",
            ConflictPolicy::GenerateNewIds => "generate-new-ids",
        }
    }

    /// One-line description for prompts and help text.
    pub fn describe(&self) -> &'static str {
        match self {
            ConflictPolicy::Abort => "stop at the first duplicate id",
            ConflictPolicy::Skip => "keep target documents, drop conflicting source documents",
            ConflictPolicy::Overwrite => "replace target documents with the source version",
            ConflictPolicy::GenerateNewIds => {
                "assign fresh ids, preserving the original id inside the document"
            }
        }
    }

    /// Whether write rounds submit documents in order, stopping at the
    /// first failure.
    ///
    /// Only the abort policy needs ordered semantics: the position of the
    /// first duplicate matters. The other policies want every document
    /// attempted so conflicts can be absorbed individually.
    pub fn ordered_writes(&self) -> bool {
        matches!(self, ConflictPolicy::Abort)
    }

    /// Whether write rounds use replace-with-upsert instead of insert.
    pub fn uses_upsert(&self) -> bool {
        matches!(self, ConflictPolicy::Overwrite)
    }

    /// Whether a reported duplicate identifier ends the transfer.
    pub fn halts_on_conflict(&self) -> bool {
        matches!(self, ConflictPolicy::Abort)
    }

    /// Outcome category for documents this policy lands successfully.
    pub fn success_kind(&self) -> OutcomeKind {
        match self {
            ConflictPolicy::Abort | ConflictPolicy::Skip => OutcomeKind::Inserted,
            ConflictPolicy::Overwrite => OutcomeKind::Replaced,
            ConflictPolicy::GenerateNewIds => OutcomeKind::Created,
        }
    }

    /// Prepares a document body for submission under this policy.
    ///
    /// Only [`ConflictPolicy::GenerateNewIds`] rewrites the document: the
    /// `_id` field is removed so the store assigns a fresh identifier, and
    /// the original value is kept under [`PRESERVED_ID_FIELD`] (with an
    /// ascending numeric suffix when that field is already taken).
    pub fn prepare(&self, body: Value) -> Value {
        match self {
            ConflictPolicy::GenerateNewIds => strip_id_preserving_original(body),
            _ => body,
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "abort" => Ok(ConflictPolicy::Abort),
            "skip" => Ok(ConflictPolicy::Skip),
            "overwrite" => Ok(ConflictPolicy::Overwrite),
            "generate-new-ids" => Ok(ConflictPolicy::GenerateNewIds),
            other => Err(format!(
                "unknown conflict policy '{other}' (expected abort, skip, overwrite, or generate-new-ids)"
            )),
        }
    }
}

fn strip_id_preserving_original(mut body: Value) -> Value {
    if let Value::Object(ref mut map) = body {
        if let Some(id) = map.remove(ID_FIELD) {
            let slot = preserved_slot(map);
            map.insert(slot, id);
        }
    }
    body
}

/// Picks a field name for the preserved id that does not collide with an
/// existing field: `_originalId`, then `_originalId1`, `_originalId2`, ...
fn preserved_slot(map: &Map<String, Value>) -> String {
    if !map.contains_key(PRESERVED_ID_FIELD) {
        return PRESERVED_ID_FIELD.to_string();
    }
    let mut suffix = 1u32;
    loop {
        let candidate = format!("{PRESERVED_ID_FIELD}{suffix}");
        if !map.contains_key(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("abort", ConflictPolicy::Abort)]
    #[test_case("skip", ConflictPolicy::Skip)]
    #[test_case("overwrite", ConflictPolicy::Overwrite)]
    #[test_case("generate-new-ids", ConflictPolicy::GenerateNewIds)]
    #[test_case("generate_new_ids", ConflictPolicy::GenerateNewIds; "underscore separated generate new ids")]
    #[test_case("  Abort ", ConflictPolicy::Abort; "abort with whitespace and capitals")]
    fn test_parse_policy(input: &str, expected: ConflictPolicy) {
        assert_eq!(input.parse::<ConflictPolicy>().unwrap(), expected);
    }

    #[test]
    fn test_parse_rejects_unknown_policy() {
        let err = "merge".parse::<ConflictPolicy>().unwrap_err();
        assert!(err.contains("unknown conflict policy"));
    }

    #[test_case(ConflictPolicy::Abort, true, false, true)]
    #[test_case(ConflictPolicy::Skip, false, false, false)]
    #[test_case(ConflictPolicy::Overwrite, false, true, false)]
    #[test_case(ConflictPolicy::GenerateNewIds, false, false, false)]
    fn test_policy_decision_table(
        policy: ConflictPolicy,
        ordered: bool,
        upsert: bool,
        halts: bool,
    ) {
        assert_eq!(policy.ordered_writes(), ordered);
        assert_eq!(policy.uses_upsert(), upsert);
        assert_eq!(policy.halts_on_conflict(), halts);
    }

    #[test]
    fn test_prepare_is_identity_for_most_policies() {
        let body = json!({"_id": "a", "value": 1});
        for policy in [
            ConflictPolicy::Abort,
            ConflictPolicy::Skip,
            ConflictPolicy::Overwrite,
        ] {
            assert_eq!(policy.prepare(body.clone()), body);
        }
    }

    #[test]
    fn test_prepare_moves_id_to_preserved_field() {
        let prepared = ConflictPolicy::GenerateNewIds.prepare(json!({"_id": "a", "value": 1}));
        assert_eq!(prepared, json!({"_originalId": "a", "value": 1}));
    }

    #[test]
    fn test_prepare_probes_for_free_preserved_slot() {
        let prepared = ConflictPolicy::GenerateNewIds.prepare(json!({
            "_id": "fresh",
            "_originalId": "first-copy",
            "_originalId1": "second-copy",
        }));
        assert_eq!(
            prepared,
            json!({
                "_originalId": "first-copy",
                "_originalId1": "second-copy",
                "_originalId2": "fresh",
            })
        );
    }

    #[test]
    fn test_prepare_leaves_documents_without_id_alone() {
        let body = json!({"value": 1});
        assert_eq!(ConflictPolicy::GenerateNewIds.prepare(body.clone()), body);
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for policy in ConflictPolicy::ALL {
            assert_eq!(policy.to_string().parse::<ConflictPolicy>().unwrap(), policy);
        }
    }
}
