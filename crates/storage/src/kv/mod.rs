//! Typed repositories layered over a `KeyValueStore`.

mod keys;
mod ledger_repo;
mod session_repo;

pub use keys::{LEDGER_KEY_PREFIX, SESSION_KEY, decode_ledger_key, encode_ledger_key};
pub use ledger_repo::KvLedgerRepository;
pub use session_repo::KvSessionRepository;
