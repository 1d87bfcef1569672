//! Persistent access-token registry.
//!
//! The registry holds the set of tokens (RFID cards) authorised to open the
//! gate, backed by a small fixed-layout blob in persistent storage:
//!
//! ```text
//! ┌───────────┬──────────┬───────────────────────────────────────────┐
//! │ magic (2B)│ count(1B)│ count × { id (10B) | len (1B) | name (17B)}│
//! └───────────┴──────────┴───────────────────────────────────────────┘
//! ```
//!
//! Names are NUL-padded ASCII, 16 chars max. The store is written exactly
//! once, at first-boot seeding; thereafter it is read-only at boot. Per-token
//! scan counts are session-volatile and never persisted.

use heapless::{String, Vec};
use log::{info, warn};

use crate::app::ports::{StorageError, StoragePort};
use crate::error::RegistryError;

/// Maximum number of registered tokens.
pub const MAX_TOKENS: usize = 5;
/// Maximum token identifier length in bytes.
pub const TOKEN_ID_MAX: usize = 10;
/// Maximum display-name length in characters.
pub const NAME_MAX: usize = 16;

/// Magic marker identifying a provisioned store.
pub const STORE_MAGIC: [u8; 2] = [0x42, 0x47];

const HEADER_SIZE: usize = 3;
const RECORD_SIZE: usize = TOKEN_ID_MAX + 1 + NAME_MAX + 1;
/// Size of a full store blob (header + all token slots).
pub const STORE_MAX_SIZE: usize = HEADER_SIZE + MAX_TOKENS * RECORD_SIZE;

const STORE_NAMESPACE: &str = "faregate";
const STORE_KEY: &str = "registry";

/// Token identifier: variable-length byte sequence, max 10 bytes.
pub type TokenId = Vec<u8, TOKEN_ID_MAX>;
/// Token display name, max 16 chars.
pub type TokenName = String<NAME_MAX>;

// ---------------------------------------------------------------------------
// AccessToken
// ---------------------------------------------------------------------------

/// A registered access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Immutable identifier bytes.
    pub id: TokenId,
    /// Display name shown on grant and in the station snapshot.
    pub name: TokenName,
    /// Times this token was granted this session. Reset at boot.
    pub scan_count: u16,
}

impl AccessToken {
    /// Build a token, rejecting over-length ids or names.
    pub fn new(id: &[u8], name: &str) -> Option<Self> {
        Some(Self {
            id: TokenId::from_slice(id).ok()?,
            name: TokenName::try_from(name).ok()?,
            scan_count: 0,
        })
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// The set of registered tokens, unique by identifier bytes + length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    tokens: Vec<AccessToken, MAX_TOKENS>,
}

impl Registry {
    /// An empty registry (degraded mode after a corrupt count).
    pub fn empty() -> Self {
        Self::default()
    }

    /// The factory-provisioned token set, seeded at first boot.
    pub fn factory() -> Self {
        let mut tokens = Vec::new();
        // Slots are compile-time sized; the factory set always fits.
        let _ = tokens.push(
            AccessToken::new(&[0xA4, 0x3B, 0x6C, 0x19], "BUS DRIVER")
                .unwrap_or_else(|| unreachable!()),
        );
        let _ = tokens.push(
            AccessToken::new(&[0xD2, 0x07, 0x5E, 0x88], "HELPER")
                .unwrap_or_else(|| unreachable!()),
        );
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// All tokens in registry order.
    pub fn tokens(&self) -> &[AccessToken] {
        &self.tokens
    }

    /// Exact match on identifier bytes and length. No prefix matching.
    pub fn find(&self, id: &[u8]) -> Option<&AccessToken> {
        self.tokens.iter().find(|t| t.id.as_slice() == id)
    }

    /// Mutable lookup, used to bump the volatile scan count.
    pub fn find_mut(&mut self, id: &[u8]) -> Option<&mut AccessToken> {
        self.tokens.iter_mut().find(|t| t.id.as_slice() == id)
    }

    // ── Persisted layout ──────────────────────────────────────

    /// Serialise into the fixed store layout. `out` must hold at least
    /// [`STORE_MAX_SIZE`] bytes. Returns the number of bytes written.
    pub fn encode(&self, out: &mut [u8]) -> usize {
        let total = HEADER_SIZE + self.tokens.len() * RECORD_SIZE;
        debug_assert!(out.len() >= total);

        out[0..2].copy_from_slice(&STORE_MAGIC);
        out[2] = self.tokens.len() as u8;

        for (i, token) in self.tokens.iter().enumerate() {
            let rec = &mut out[HEADER_SIZE + i * RECORD_SIZE..HEADER_SIZE + (i + 1) * RECORD_SIZE];
            rec.fill(0);
            rec[..token.id.len()].copy_from_slice(&token.id);
            rec[TOKEN_ID_MAX] = token.id.len() as u8;
            let name = token.name.as_bytes();
            rec[TOKEN_ID_MAX + 1..TOKEN_ID_MAX + 1 + name.len()].copy_from_slice(name);
            // Remaining name bytes stay NUL (17th byte is the guaranteed terminator).
        }

        total
    }

    /// Parse a store blob. Scan counts start at zero regardless of content.
    pub fn decode(bytes: &[u8]) -> core::result::Result<Self, RegistryError> {
        if bytes.len() < HEADER_SIZE {
            return Err(RegistryError::Truncated);
        }
        if bytes[0..2] != STORE_MAGIC {
            return Err(RegistryError::BadMagic);
        }
        let count = bytes[2] as usize;
        if count > MAX_TOKENS {
            return Err(RegistryError::CountOutOfRange);
        }
        if bytes.len() < HEADER_SIZE + count * RECORD_SIZE {
            return Err(RegistryError::Truncated);
        }

        let mut tokens: Vec<AccessToken, MAX_TOKENS> = Vec::new();
        for i in 0..count {
            let rec = &bytes[HEADER_SIZE + i * RECORD_SIZE..HEADER_SIZE + (i + 1) * RECORD_SIZE];
            let id_len = rec[TOKEN_ID_MAX] as usize;
            if id_len > TOKEN_ID_MAX {
                return Err(RegistryError::BadRecord);
            }
            let name_field = &rec[TOKEN_ID_MAX + 1..];
            let name_len = name_field
                .iter()
                .position(|&b| b == 0)
                .unwrap_or(NAME_MAX)
                .min(NAME_MAX);
            let name = core::str::from_utf8(&name_field[..name_len])
                .map_err(|_| RegistryError::BadRecord)?;

            let token =
                AccessToken::new(&rec[..id_len], name).ok_or(RegistryError::BadRecord)?;
            // Slots match the decoded count, which is already bounds-checked.
            let _ = tokens.push(token);
        }

        Ok(Self { tokens })
    }

    // ── Boot-time load ────────────────────────────────────────

    /// Load the registry from persistent storage.
    ///
    /// - Store absent, too short for a header, or unprovisioned (magic
    ///   mismatch): seed the factory set and write the store — the only
    ///   runtime persistence write.
    /// - Stored count out of range or a malformed record: degrade to an
    ///   empty registry without touching the store. Re-provisioning a
    ///   plausible-but-unexpected store is an explicit operator action.
    /// - Truncated body with a valid header: fall back to the factory set
    ///   in memory, leaving the store as-is.
    pub fn load(storage: &mut impl StoragePort) -> Self {
        let mut buf = [0u8; STORE_MAX_SIZE];
        match storage.read(STORE_NAMESPACE, STORE_KEY, &mut buf) {
            // A blob too short to hold a header cannot have been provisioned.
            Ok(len) if len < HEADER_SIZE => {
                info!("registry: store too short for a header, seeding factory set");
                Self::seed(storage)
            }
            Ok(len) => match Self::decode(&buf[..len]) {
                Ok(registry) => {
                    info!("registry: loaded {} token(s) from store", registry.len());
                    registry
                }
                Err(RegistryError::BadMagic) => {
                    info!("registry: magic mismatch, seeding factory set");
                    Self::seed(storage)
                }
                Err(RegistryError::CountOutOfRange | RegistryError::BadRecord) => {
                    warn!("registry: corrupt store, degrading to empty set (no re-seed)");
                    Self::empty()
                }
                Err(e @ RegistryError::Truncated) => {
                    warn!("registry: {e}, using factory set in memory");
                    Self::factory()
                }
            },
            Err(StorageError::NotFound) => {
                info!("registry: no store found, seeding factory set");
                Self::seed(storage)
            }
            Err(e) => {
                warn!("registry: store read failed ({e}), using factory set in memory");
                Self::factory()
            }
        }
    }

    /// First-boot seeding: write the factory set and the magic marker.
    fn seed(storage: &mut impl StoragePort) -> Self {
        let registry = Self::factory();
        let mut buf = [0u8; STORE_MAX_SIZE];
        let len = registry.encode(&mut buf);
        if let Err(e) = storage.write(STORE_NAMESPACE, STORE_KEY, &buf[..len]) {
            warn!("registry: seed write failed ({e}), continuing with in-memory set");
        } else {
            info!("registry: factory set seeded ({} bytes)", len);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemStorage;

    fn two_token_registry() -> Registry {
        Registry::factory()
    }

    #[test]
    fn factory_set_has_driver_and_helper() {
        let r = Registry::factory();
        assert_eq!(r.len(), 2);
        assert_eq!(r.tokens()[0].name.as_str(), "BUS DRIVER");
        assert_eq!(r.tokens()[1].name.as_str(), "HELPER");
        assert!(r.tokens().iter().all(|t| t.scan_count == 0));
    }

    #[test]
    fn find_is_exact_on_bytes_and_length() {
        let r = two_token_registry();
        let id = r.tokens()[0].id.clone();
        assert!(r.find(&id).is_some());
        // Prefix of a valid id must not match.
        assert!(r.find(&id[..id.len() - 1]).is_none());
        // Same prefix, extra byte must not match.
        let mut longer = id.to_vec();
        longer.push(0x00);
        assert!(r.find(&longer).is_none());
    }

    #[test]
    fn encode_decode_preserves_tokens() {
        let r = two_token_registry();
        let mut buf = [0u8; STORE_MAX_SIZE];
        let len = r.encode(&mut buf);
        assert_eq!(len, HEADER_SIZE + 2 * RECORD_SIZE);

        let r2 = Registry::decode(&buf[..len]).unwrap();
        assert_eq!(r2.len(), 2);
        assert_eq!(r2.tokens()[0].id, r.tokens()[0].id);
        assert_eq!(r2.tokens()[1].name, r.tokens()[1].name);
    }

    #[test]
    fn decode_rejects_bad_magic() {
        let mut buf = [0u8; STORE_MAX_SIZE];
        let len = two_token_registry().encode(&mut buf);
        buf[0] ^= 0xFF;
        assert_eq!(
            Registry::decode(&buf[..len]),
            Err(RegistryError::BadMagic)
        );
    }

    #[test]
    fn decode_rejects_count_out_of_range() {
        let mut buf = [0u8; STORE_MAX_SIZE];
        let _ = two_token_registry().encode(&mut buf);
        buf[2] = (MAX_TOKENS + 1) as u8;
        assert_eq!(
            Registry::decode(&buf),
            Err(RegistryError::CountOutOfRange)
        );
    }

    #[test]
    fn decode_rejects_truncated_body() {
        let mut buf = [0u8; STORE_MAX_SIZE];
        let len = two_token_registry().encode(&mut buf);
        assert_eq!(
            Registry::decode(&buf[..len - 1]),
            Err(RegistryError::Truncated)
        );
    }

    #[test]
    fn decode_rejects_overlong_id_record() {
        let mut buf = [0u8; STORE_MAX_SIZE];
        let len = two_token_registry().encode(&mut buf);
        buf[HEADER_SIZE + TOKEN_ID_MAX] = (TOKEN_ID_MAX + 1) as u8;
        assert_eq!(
            Registry::decode(&buf[..len]),
            Err(RegistryError::BadRecord)
        );
    }

    #[test]
    fn first_boot_seeds_and_persists() {
        let mut storage = MemStorage::new();
        let r = Registry::load(&mut storage);
        assert_eq!(r.len(), 2);
        assert!(storage.exists(STORE_NAMESPACE, STORE_KEY));

        // Second boot reads the seeded store back, no factory fallback path.
        let r2 = Registry::load(&mut storage);
        assert_eq!(r2.len(), 2);
        assert_eq!(r2.tokens()[0].name.as_str(), "BUS DRIVER");
    }

    #[test]
    fn corrupt_count_degrades_to_empty_without_reseed() {
        let mut storage = MemStorage::new();
        let _ = Registry::load(&mut storage); // seed

        // Corrupt the stored count past the maximum.
        let mut buf = [0u8; STORE_MAX_SIZE];
        let len = storage.read(STORE_NAMESPACE, STORE_KEY, &mut buf).unwrap();
        buf[2] = 200;
        storage.write(STORE_NAMESPACE, STORE_KEY, &buf[..len]).unwrap();

        let r = Registry::load(&mut storage);
        assert!(r.is_empty(), "corrupt count must degrade to empty");

        // The store must not have been overwritten.
        let mut after = [0u8; STORE_MAX_SIZE];
        let after_len = storage.read(STORE_NAMESPACE, STORE_KEY, &mut after).unwrap();
        assert_eq!(after_len, len);
        assert_eq!(after[2], 200, "degraded load must not re-seed the store");
    }

    #[test]
    fn headerless_blob_treated_as_first_boot() {
        let mut storage = MemStorage::new();
        storage.write(STORE_NAMESPACE, STORE_KEY, &[0x42]).unwrap();

        let r = Registry::load(&mut storage);
        assert_eq!(r.len(), 2);

        // The store was re-seeded with a full, valid blob.
        let mut buf = [0u8; STORE_MAX_SIZE];
        let len = storage.read(STORE_NAMESPACE, STORE_KEY, &mut buf).unwrap();
        assert!(len >= HEADER_SIZE);
        assert_eq!(buf[0..2], STORE_MAGIC);
    }

    #[test]
    fn truncated_store_falls_back_to_factory_in_memory() {
        let mut storage = MemStorage::new();
        let _ = Registry::load(&mut storage); // seed
        let mut buf = [0u8; STORE_MAX_SIZE];
        let len = storage.read(STORE_NAMESPACE, STORE_KEY, &mut buf).unwrap();
        storage
            .write(STORE_NAMESPACE, STORE_KEY, &buf[..len - RECORD_SIZE - 1])
            .unwrap();

        let r = Registry::load(&mut storage);
        assert_eq!(r.len(), 2, "truncated store fails over to the factory set");
    }

    #[test]
    fn name_at_max_length_round_trips() {
        let mut r = Registry::empty();
        let t = AccessToken::new(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10], "ABCDEFGHIJKLMNOP").unwrap();
        r.tokens.push(t).unwrap();

        let mut buf = [0u8; STORE_MAX_SIZE];
        let len = r.encode(&mut buf);
        let r2 = Registry::decode(&buf[..len]).unwrap();
        assert_eq!(r2.tokens()[0].name.as_str(), "ABCDEFGHIJKLMNOP");
        assert_eq!(r2.tokens()[0].id.len(), TOKEN_ID_MAX);
    }

    #[test]
    fn token_rejects_overlong_inputs() {
        assert!(AccessToken::new(&[0u8; 11], "X").is_none());
        assert!(AccessToken::new(&[1], "SEVENTEEN CHARS !").is_none());
    }
}
