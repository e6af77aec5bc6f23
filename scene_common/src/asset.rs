use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
    str::FromStr,
};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Identifies a binary payload by the hash of its own bytes.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, Hash, PartialEq)]
#[serde(into = "String", try_from = "String")]
pub struct ContentHash(blake3::Hash);

impl ContentHash {
    pub fn of(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = blake3::HexError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        blake3::Hash::from_hex(value).map(Self)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.to_string()
    }
}

impl TryFrom<String> for ContentHash {
    type Error = blake3::HexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Content-addressed cache of mesh and texture payloads.
///
/// Filled while a scene compiles, read-only afterwards. Storing the same bytes
/// twice yields the same key and keeps a single copy.
#[derive(Debug, Default)]
pub struct AssetStore {
    blobs: HashMap<ContentHash, Bytes>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, data: impl Into<Bytes>) -> ContentHash {
        let data = data.into();
        let hash = ContentHash::of(&data);
        self.blobs.entry(hash).or_insert(data);
        hash
    }

    pub fn get(&self, hash: &ContentHash) -> Option<Bytes> {
        self.blobs.get(hash).cloned()
    }

    /// Looks up an opaque key as it arrives from a client. Malformed keys are
    /// simply not found.
    pub fn get_by_key(&self, key: &str) -> Option<Bytes> {
        let hash = key.trim().parse::<ContentHash>().ok()?;
        self.get(&hash)
    }

    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.blobs.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.blobs.values().map(|blob| blob.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_bytes_share_one_entry() {
        let mut store = AssetStore::new();
        let a = store.insert(vec![1u8, 2, 3, 4]);
        let b = store.insert(vec![1u8, 2, 3, 4]);
        let c = store.insert(vec![4u8, 3, 2, 1]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(store.len(), 2);
        assert_eq!(store.total_bytes(), 8);
    }

    #[test]
    fn hashing_is_deterministic() {
        let payload = b"some mesh bytes";
        assert_eq!(ContentHash::of(payload), ContentHash::of(payload));
        assert_eq!(
            ContentHash::of(payload).to_string(),
            ContentHash::of(payload).to_string()
        );
    }

    #[test]
    fn hex_keys_round_trip() {
        let mut store = AssetStore::new();
        let hash = store.insert(&b"texture"[..]);
        let key = hash.to_string();
        assert_eq!(key.len(), 64);
        assert_eq!(key.parse::<ContentHash>().unwrap(), hash);
        assert_eq!(store.get_by_key(&key).as_deref(), Some(&b"texture"[..]));
    }

    #[test]
    fn unknown_or_malformed_keys_are_not_found() {
        let mut store = AssetStore::new();
        store.insert(&b"mesh"[..]);
        assert!(store.get_by_key("not-a-hash").is_none());
        assert!(store.get_by_key(&ContentHash::of(b"other").to_string()).is_none());
    }

    #[test]
    fn serializes_as_hex_string() {
        let hash = ContentHash::of(b"abc");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{hash}\""));
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }
}
