//! Link key store
//!
//! Bounded address-to-key table filled from link-key notifications and
//! consulted on link-key requests. Keys live for the process lifetime only.

use crate::{BluetoothAddress, constants::MAX_LINK_KEYS};
use core::fmt;
use heapless::FnvIndexMap;

/// 128-bit link key
pub type LinkKey = [u8; 16];

/// Link key store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkKeyError {
    /// Every slot is taken; the new key was dropped
    TableFull,
    /// The all-zero address cannot own a key
    InvalidAddress,
}

impl fmt::Display for LinkKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableFull => f.write_str("link key table full"),
            Self::InvalidAddress => f.write_str("invalid link key address"),
        }
    }
}

/// Result of storing a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreOutcome {
    /// A free slot was used
    Inserted,
    /// The key for an already known address was overwritten
    Replaced,
}

/// Bounded link key table, at most one entry per address
#[derive(Debug, Default)]
pub struct LinkKeyStore {
    keys: FnvIndexMap<BluetoothAddress, LinkKey, MAX_LINK_KEYS>,
}

impl LinkKeyStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: FnvIndexMap::new(),
        }
    }

    /// Store or replace the key for `addr`
    ///
    /// # Errors
    /// Returns `TableFull` when the address is new and no slot is free; the
    /// table is left unchanged in that case.
    pub fn store(
        &mut self,
        addr: BluetoothAddress,
        key: LinkKey,
    ) -> Result<StoreOutcome, LinkKeyError> {
        if addr.is_zero() {
            return Err(LinkKeyError::InvalidAddress);
        }
        match self.keys.insert(addr, key) {
            Ok(Some(_)) => Ok(StoreOutcome::Replaced),
            Ok(None) => Ok(StoreOutcome::Inserted),
            Err(_) => Err(LinkKeyError::TableFull),
        }
    }

    /// Get the key stored for `addr`
    #[must_use]
    pub fn get(&self, addr: &BluetoothAddress) -> Option<&LinkKey> {
        self.keys.get(addr)
    }

    /// Delete keys
    ///
    /// The all-zero address clears the whole table; any other address removes
    /// only its own entry. Returns the number of entries removed.
    pub fn delete(&mut self, addr: &BluetoothAddress) -> usize {
        if addr.is_zero() {
            let removed = self.keys.len();
            self.keys.clear();
            removed
        } else {
            usize::from(self.keys.remove(addr).is_some())
        }
    }

    /// Whether a key is stored for `addr`
    #[must_use]
    pub fn contains(&self, addr: &BluetoothAddress) -> bool {
        self.keys.contains_key(addr)
    }

    /// Number of stored keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no key is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Fixed capacity of the table
    #[must_use]
    pub const fn capacity(&self) -> usize {
        MAX_LINK_KEYS
    }

    /// Iterate stored addresses
    pub fn addresses(&self) -> impl Iterator<Item = &BluetoothAddress> {
        self.keys.keys()
    }
}
