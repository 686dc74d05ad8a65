//! Key derivation for backend storage
//!
//! Every stored record is addressed by one opaque string derived from
//! `(session, record kind, record id)`. Record ids are arbitrary strings —
//! commonly another party's address such as `"1234@host:5"` — and may
//! contain characters that are meaningful to a backend's own addressing
//! (path separators, reserved delimiters). Those are substituted per
//! component before concatenation so an id can never alter the intended
//! backend addressing.
//!
//! ## Contract
//!
//! - `derive_key` is pure and deterministic: equal inputs always produce
//!   equal keys.
//! - Distinct `(kind, id)` pairs within a session produce distinct keys,
//!   unless the raw inputs already collide after substitution (an id of
//!   `"a/b"` and an id of `"a__b"` are the same key by design — the
//!   substitution is not an escape).

/// Substitute backend-reserved characters in one key component.
///
/// Forward slashes become double underscores and colons become hyphens,
/// mirroring the substitutions applied by every producer of this key
/// format.
pub fn sanitize_component(component: &str) -> String {
    component.replace('/', "__").replace(':', "-")
}

/// Derive the backend key for a keyed record.
///
/// The flattened form is `"<session>-<kind>-<id>"`, each component
/// sanitized first.
pub fn derive_key(session: &str, kind: crate::kinds::RecordKind, id: &str) -> String {
    format!(
        "{}-{}-{}",
        sanitize_component(session),
        kind.as_str(),
        sanitize_component(id)
    )
}

/// Derive the backend key for the root credential record.
///
/// The root record has no id component: `"<session>-creds"`.
pub fn root_key(session: &str) -> String {
    format!(
        "{}-{}",
        sanitize_component(session),
        crate::kinds::RecordKind::Creds.as_str()
    )
}
