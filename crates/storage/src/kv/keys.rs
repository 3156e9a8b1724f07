use prep_core::model::{LedgerKey, PoolType};

use crate::repository::StorageError;

/// Namespace shared by every ledger document key.
pub const LEDGER_KEY_PREFIX: &str = "question_states:";

/// Key of the persisted signed-in user.
pub const SESSION_KEY: &str = "user";

/// Storage key for a ledger document.
///
/// The coordinates are written as a JSON array after the prefix, so any
/// character inside an identifier survives decoding.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the key cannot be encoded.
pub fn encode_ledger_key(key: &LedgerKey) -> Result<String, StorageError> {
    let coords = serde_json::to_string(&(key.pool, &key.subject_id, &key.chapter_id))?;
    Ok(format!("{LEDGER_KEY_PREFIX}{coords}"))
}

/// Inverse of [`encode_ledger_key`]; `None` for keys outside the ledger namespace.
///
/// # Errors
///
/// Returns `StorageError::Serialization` for a namespaced key whose
/// coordinates do not decode.
pub fn decode_ledger_key(raw: &str) -> Result<Option<LedgerKey>, StorageError> {
    let Some(coords) = raw.strip_prefix(LEDGER_KEY_PREFIX) else {
        return Ok(None);
    };
    let (pool, subject_id, chapter_id): (PoolType, String, String) = serde_json::from_str(coords)?;
    Ok(Some(LedgerKey {
        pool,
        subject_id,
        chapter_id,
    }))
}
