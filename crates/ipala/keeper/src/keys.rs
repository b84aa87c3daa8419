//! On-disk key layout of the module namespace.
//!
//! ```text
//! 0x01                                   params record
//! 0x11 | address                         service node record
//! 0x12 | be_u64(bond) | !address         -> address    (bond index)
//! 0x13 | moniker                         -> address    (moniker index)
//! 0x21 | be_u64(secs ^ 1<<63) | be_u32(nanos)  -> bucket (unbonding queue)
//! ```
//!
//! The bond and queue layouts are scanned in key order, so they are part of
//! the module's compatibility contract.

use chrono::{DateTime, Utc};
use ipala_types::{AccAddress, ADDR_LEN};

use crate::error::{KeeperError, KeeperResult};

pub const PARAMS_KEY: &[u8] = &[0x01];
pub const SERVICE_NODE_PREFIX: u8 = 0x11;
pub const BOND_INDEX_PREFIX: u8 = 0x12;
pub const MONIKER_INDEX_PREFIX: u8 = 0x13;
pub const UNBONDING_QUEUE_PREFIX: u8 = 0x21;

const BOND_LEN: usize = 8;
/// Unix seconds with the sign bit flipped, then subsecond nanos.
const TIME_LEN: usize = 12;
const SIGN_BIT: u64 = 1 << 63;

pub fn service_node_key(operator: &AccAddress) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + ADDR_LEN);
    key.push(SERVICE_NODE_PREFIX);
    key.extend_from_slice(operator.as_bytes());
    key
}

/// Ascending by bond amount, then descending by address.
pub fn bond_index_key(bond_amount: u64, operator: &AccAddress) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + BOND_LEN + ADDR_LEN);
    key.push(BOND_INDEX_PREFIX);
    key.extend_from_slice(&bond_amount.to_be_bytes());
    key.extend_from_slice(&operator.complement());
    key
}

/// Recover `(bond_amount, operator)` from a full bond index key.
pub fn parse_bond_index_key(key: &[u8]) -> KeeperResult<(u64, AccAddress)> {
    if key.len() != 1 + BOND_LEN + ADDR_LEN || key[0] != BOND_INDEX_PREFIX {
        return Err(KeeperError::codec(format!("malformed bond index key of {} bytes", key.len())));
    }
    let mut amount = [0u8; BOND_LEN];
    amount.copy_from_slice(&key[1..1 + BOND_LEN]);
    let operator = AccAddress::from_complement(&key[1 + BOND_LEN..])?;
    Ok((u64::from_be_bytes(amount), operator))
}

pub fn moniker_key(moniker: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + moniker.len());
    key.push(MONIKER_INDEX_PREFIX);
    key.extend_from_slice(moniker.as_bytes());
    key
}

/// Maturity times are bucketed at their UTC nanosecond instant; every claim
/// in a block shares the block time, so their entries share a bucket.
///
/// Byte order equals time order over the whole `DateTime<Utc>` range,
/// including times before the epoch.
pub fn encode_time(time: &DateTime<Utc>) -> Vec<u8> {
    let secs = (time.timestamp() as u64) ^ SIGN_BIT;
    let mut bytes = Vec::with_capacity(TIME_LEN);
    bytes.extend_from_slice(&secs.to_be_bytes());
    bytes.extend_from_slice(&time.timestamp_subsec_nanos().to_be_bytes());
    bytes
}

pub fn decode_time(bytes: &[u8]) -> KeeperResult<DateTime<Utc>> {
    if bytes.len() != TIME_LEN {
        return Err(KeeperError::codec(format!("malformed timestamp of {} bytes", bytes.len())));
    }
    let mut secs = [0u8; 8];
    secs.copy_from_slice(&bytes[..8]);
    let mut nanos = [0u8; 4];
    nanos.copy_from_slice(&bytes[8..]);
    let secs = (u64::from_be_bytes(secs) ^ SIGN_BIT) as i64;
    DateTime::from_timestamp(secs, u32::from_be_bytes(nanos))
        .ok_or_else(|| KeeperError::codec(format!("timestamp out of range: {secs}s")))
}

pub fn unbonding_queue_key(end_time: &DateTime<Utc>) -> Vec<u8> {
    let time = encode_time(end_time);
    let mut key = Vec::with_capacity(1 + time.len());
    key.push(UNBONDING_QUEUE_PREFIX);
    key.extend_from_slice(&time);
    key
}

pub fn parse_unbonding_queue_key(key: &[u8]) -> KeeperResult<DateTime<Utc>> {
    match key.split_first() {
        Some((&UNBONDING_QUEUE_PREFIX, time)) => decode_time(time),
        _ => Err(KeeperError::codec("malformed unbonding queue key")),
    }
}
