/// Opaque document identifiers and owner equality
use crate::error::{ApiError, ApiResult};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

const ID_BYTES: usize = 12;
const ID_LEN: usize = ID_BYTES * 2;

/// 24 character lowercase hex identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        let mut bytes = [0u8; ID_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Parse and canonicalise an identifier received from a client.
    ///
    /// `what` names the identifier in the error message, e.g. "video".
    pub fn parse(raw: &str, what: &str) -> ApiResult<Self> {
        let candidate = raw.trim().to_ascii_lowercase();
        if Self::is_well_formed(&candidate) {
            Ok(Self(candidate))
        } else {
            Err(ApiError::InvalidInput(format!("Invalid {} ID", what)))
        }
    }

    pub fn is_well_formed(raw: &str) -> bool {
        raw.len() == ID_LEN && raw.chars().all(|c| c.is_ascii_hexdigit())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owner equality on canonical identifier forms
pub fn is_owner(actor: &ObjectId, owner: &ObjectId) -> bool {
    actor.as_str().eq_ignore_ascii_case(owner.as_str())
}

/// Fail with `Forbidden` unless `actor` owns the resource
pub fn ensure_owner(actor: &ObjectId, owner: &ObjectId, what: &str) -> ApiResult<()> {
    if is_owner(actor, owner) {
        Ok(())
    } else {
        tracing::warn!(actor = %actor, owner = %owner, "Rejected {} mutation by non-owner", what);
        Err(ApiError::Forbidden(format!(
            "Only the owner can modify this {}",
            what
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_well_formed() {
        let id = ObjectId::new();
        assert_eq!(id.as_str().len(), 24);
        assert!(ObjectId::is_well_formed(id.as_str()));
        assert_ne!(ObjectId::new(), id);
    }

    #[test]
    fn test_parse_canonicalises() {
        let id = ObjectId::parse(" 65A1B2C3D4E5F60718293A4B ", "video").unwrap();
        assert_eq!(id.as_str(), "65a1b2c3d4e5f60718293a4b");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in ["", "abc", "zzzzzzzzzzzzzzzzzzzzzzzz", "65a1b2c3d4e5f60718293a4b00"] {
            match ObjectId::parse(raw, "playlist") {
                Err(ApiError::InvalidInput(msg)) => assert_eq!(msg, "Invalid playlist ID"),
                other => panic!("expected InvalidInput for {:?}, got {:?}", raw, other),
            }
        }
    }

    #[test]
    fn test_owner_equality() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert!(is_owner(&a, &a.clone()));
        assert!(!is_owner(&a, &b));
        assert!(ensure_owner(&a, &a, "comment").is_ok());
        assert!(matches!(ensure_owner(&a, &b, "comment"), Err(ApiError::Forbidden(_))));
    }
}
