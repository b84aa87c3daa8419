//! Account addresses and module-derived addresses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ValidationError, ValidationResult};

/// Length in bytes of every account address.
pub const ADDR_LEN: usize = 20;

/// Opaque fixed-length account identifier.
///
/// Ordering is plain byte order. Serialized as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AccAddress([u8; ADDR_LEN]);

impl AccAddress {
    pub const fn new(bytes: [u8; ADDR_LEN]) -> Self {
        Self(bytes)
    }

    /// Build an address from a byte slice of exactly [`ADDR_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> ValidationResult<Self> {
        let arr: [u8; ADDR_LEN] = bytes.try_into().map_err(|_| {
            ValidationError::InvalidAddress(format!(
                "expected {} bytes, got {}",
                ADDR_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn from_hex(s: &str) -> ValidationResult<Self> {
        let bytes = hex::decode(s).map_err(|e| ValidationError::InvalidAddress(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; ADDR_LEN] {
        &self.0
    }

    /// The all-zero address is treated as "no address".
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Bitwise complement of every byte.
    ///
    /// Used as the tie-break suffix of the bond index so that equal bonds
    /// scan in descending address order.
    pub fn complement(&self) -> [u8; ADDR_LEN] {
        let mut out = self.0;
        for b in out.iter_mut() {
            *b = !*b;
        }
        out
    }

    /// Inverse of [`AccAddress::complement`].
    pub fn from_complement(bytes: &[u8]) -> ValidationResult<Self> {
        let mut addr = Self::from_slice(bytes)?;
        for b in addr.0.iter_mut() {
            *b = !*b;
        }
        Ok(addr)
    }
}

/// Deterministic address of a module-owned account.
///
/// The first [`ADDR_LEN`] bytes of the BLAKE3 digest of the module name.
pub fn module_address(module_name: &str) -> AccAddress {
    let digest = blake3::hash(module_name.as_bytes());
    let mut bytes = [0u8; ADDR_LEN];
    bytes.copy_from_slice(&digest.as_bytes()[..ADDR_LEN]);
    AccAddress(bytes)
}

impl fmt::Display for AccAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for AccAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccAddress({})", self.to_hex())
    }
}

impl FromStr for AccAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; ADDR_LEN]> for AccAddress {
    fn from(bytes: [u8; ADDR_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for AccAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AccAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
