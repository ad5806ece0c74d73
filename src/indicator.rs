//! Indicator & notification registry
//!
//! Two tables live here. The AG owns a fixed table of control indicators
//! (`service`, `call`, ...) whose values it reports to the HF. The HF learns the
//! AG's indicators at service level setup and keeps them in discovery order,
//! each with an enable flag that drives the indicator activation list.

use crate::constants::{MAX_INDICATOR_NAME_LENGTH, MAX_NOTIFICATIONS};
use core::fmt;
use heapless::{String, Vec};

/// Indicator name as stored in the notification registry
pub type IndicatorName = String<MAX_INDICATOR_NAME_LENGTH>;

/// Per-indicator enable flags in discovery order (`AT+BIA`)
pub type ActivationMask = Vec<bool, MAX_NOTIFICATIONS>;

/// Number of AG control indicators
pub const INDICATOR_COUNT: usize = 8;

/// Indicator registry errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IndicatorError {
    /// Index outside `1..=len`
    InvalidIndex,
    /// Value outside the indicator's declared bounds
    InvalidValue,
    /// The notification registry is full
    RegistryFull,
}

impl fmt::Display for IndicatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIndex => f.write_str("indicator index out of range"),
            Self::InvalidValue => f.write_str("indicator value out of range"),
            Self::RegistryFull => f.write_str("notification registry full"),
        }
    }
}

/// Value domain of an indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IndicatorKind {
    /// 0 or 1
    Boolean,
    /// Inclusive range
    Range {
        /// Lowest value
        low: u8,
        /// Highest value
        high: u8,
    },
}

impl IndicatorKind {
    /// Whether `value` is allowed
    #[must_use]
    pub const fn accepts(&self, value: u8) -> bool {
        match *self {
            Self::Boolean => value <= 1,
            Self::Range { low, high } => value >= low && value <= high,
        }
    }
}

/// One AG control indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Indicator {
    /// Indicator name
    pub name: &'static str,
    /// Value domain
    pub kind: IndicatorKind,
    /// Current value
    pub value: u8,
}

impl Indicator {
    const fn boolean(name: &'static str, value: u8) -> Self {
        Self {
            name,
            kind: IndicatorKind::Boolean,
            value,
        }
    }

    const fn range(name: &'static str, low: u8, high: u8, value: u8) -> Self {
        Self {
            name,
            kind: IndicatorKind::Range { low, high },
            value,
        }
    }
}

/// Default control indicators, seeded at every service level connection
///
/// Call setup appears under both of its historical spellings.
pub const DEFAULT_INDICATORS: [Indicator; INDICATOR_COUNT] = [
    Indicator::boolean("service", 1),
    Indicator::boolean("call", 0),
    Indicator::range("callsetup", 0, 3, 0),
    Indicator::range("call_setup", 0, 3, 0),
    Indicator::range("callheld", 0, 2, 0),
    Indicator::range("signal", 0, 5, 5),
    Indicator::boolean("roam", 0),
    Indicator::range("battchg", 0, 5, 5),
];

/// AG control indicator table
#[derive(Debug, Clone)]
pub struct IndicatorTable {
    indicators: [Indicator; INDICATOR_COUNT],
}

impl Default for IndicatorTable {
    fn default() -> Self {
        Self {
            indicators: DEFAULT_INDICATORS,
        }
    }
}

impl IndicatorTable {
    /// Table with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore the default values
    pub fn reset(&mut self) {
        self.indicators = DEFAULT_INDICATORS;
    }

    /// Update indicator `index` (1-based)
    ///
    /// # Errors
    /// `InvalidIndex` outside `1..=8`, `InvalidValue` outside the indicator's
    /// bounds. The table is unchanged on error.
    pub fn update(&mut self, index: u32, value: u32) -> Result<&Indicator, IndicatorError> {
        let slot = usize::try_from(index)
            .ok()
            .and_then(|index| index.checked_sub(1))
            .ok_or(IndicatorError::InvalidIndex)?;
        let indicator = self
            .indicators
            .get_mut(slot)
            .ok_or(IndicatorError::InvalidIndex)?;
        let value = u8::try_from(value).map_err(|_| IndicatorError::InvalidValue)?;
        if !indicator.kind.accepts(value) {
            return Err(IndicatorError::InvalidValue);
        }
        indicator.value = value;
        Ok(indicator)
    }

    /// Indicator `index` (1-based)
    #[must_use]
    pub fn get(&self, index: u32) -> Option<&Indicator> {
        let slot = usize::try_from(index).ok()?.checked_sub(1)?;
        self.indicators.get(slot)
    }

    /// Iterate indicators in table order
    pub fn iter(&self) -> impl Iterator<Item = &Indicator> {
        self.indicators.iter()
    }
}

/// One indicator the peer announced
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NotificationEntry {
    /// Name, truncated to the compare length
    pub name: IndicatorName,
    /// Whether updates are wanted
    pub enabled: bool,
    /// Last value reported by the peer
    pub value: Option<u8>,
}

/// Indicators announced by the peer, in discovery order
///
/// Entries are never removed, only toggled.
#[derive(Debug, Default)]
pub struct NotificationRegistry {
    entries: Vec<NotificationEntry, MAX_NOTIFICATIONS>,
}

fn truncated(name: &str) -> IndicatorName {
    let mut stored = IndicatorName::new();
    for c in name.chars() {
        if stored.push(c).is_err() {
            break;
        }
    }
    stored
}

impl NotificationRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an indicator name, returning its 1-based index
    ///
    /// Matching is case-insensitive on the first 16 bytes; a known name returns
    /// its existing index. New entries start enabled.
    ///
    /// # Errors
    /// `RegistryFull` when a new name does not fit.
    pub fn register(&mut self, name: &str) -> Result<usize, IndicatorError> {
        if let Some(index) = self.find(name) {
            return Ok(index);
        }
        self.entries
            .push(NotificationEntry {
                name: truncated(name),
                enabled: true,
                value: None,
            })
            .map_err(|_| IndicatorError::RegistryFull)?;
        Ok(self.entries.len())
    }

    /// 1-based index of `name`
    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        let wanted = truncated(name);
        self.entries
            .iter()
            .position(|entry| entry.name.eq_ignore_ascii_case(&wanted))
            .map(|slot| slot + 1)
    }

    /// Enable or disable entry `index` (1-based, discovery order)
    ///
    /// # Errors
    /// `InvalidIndex` outside `1..=len`.
    pub fn toggle(
        &mut self,
        index: u32,
        enabled: bool,
    ) -> Result<&NotificationEntry, IndicatorError> {
        let entry = self.entry_mut(index)?;
        entry.enabled = enabled;
        Ok(entry)
    }

    /// Record the peer's value for entry `index` (1-based)
    ///
    /// # Errors
    /// `InvalidIndex` outside `1..=len`.
    pub fn set_value(
        &mut self,
        index: u32,
        value: u8,
    ) -> Result<&NotificationEntry, IndicatorError> {
        let entry = self.entry_mut(index)?;
        entry.value = Some(value);
        Ok(entry)
    }

    fn entry_mut(&mut self, index: u32) -> Result<&mut NotificationEntry, IndicatorError> {
        let slot = usize::try_from(index)
            .ok()
            .and_then(|index| index.checked_sub(1))
            .ok_or(IndicatorError::InvalidIndex)?;
        self.entries
            .get_mut(slot)
            .ok_or(IndicatorError::InvalidIndex)
    }

    /// Enable flags in discovery order
    #[must_use]
    pub fn activation_mask(&self) -> ActivationMask {
        self.entries.iter().map(|entry| entry.enabled).collect()
    }

    /// Iterate entries in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &NotificationEntry> {
        self.entries.iter()
    }

    /// Number of registered indicators
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let table = IndicatorTable::new();
        let names: std::vec::Vec<_> = table.iter().map(|i| i.name).collect();
        assert_eq!(
            names,
            [
                "service",
                "call",
                "callsetup",
                "call_setup",
                "callheld",
                "signal",
                "roam",
                "battchg"
            ]
        );
        assert_eq!(table.get(6).unwrap().value, 5);
        assert!(table.get(0).is_none());
        assert!(table.get(9).is_none());
    }

    #[test]
    fn test_update_checks_bounds() {
        let mut table = IndicatorTable::new();

        assert_eq!(table.update(3, 10), Err(IndicatorError::InvalidValue));
        assert_eq!(table.get(3).unwrap().value, 0);

        assert_eq!(table.update(3, 2).unwrap().value, 2);
        assert_eq!(table.get(3).unwrap().value, 2);

        assert_eq!(table.update(2, 2), Err(IndicatorError::InvalidValue));
        assert_eq!(table.update(0, 0), Err(IndicatorError::InvalidIndex));
        assert_eq!(table.update(9, 0), Err(IndicatorError::InvalidIndex));
        assert_eq!(table.update(8, 256), Err(IndicatorError::InvalidValue));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut table = IndicatorTable::new();
        table.update(1, 0).unwrap();
        table.reset();
        assert_eq!(table.get(1).unwrap().value, 1);
    }

    #[test]
    fn test_register_is_case_insensitive() {
        let mut registry = NotificationRegistry::new();
        assert_eq!(registry.register("service"), Ok(1));
        assert_eq!(registry.register("call"), Ok(2));
        assert_eq!(registry.register("SERVICE"), Ok(1));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_compares_bounded_length() {
        let mut registry = NotificationRegistry::new();
        assert_eq!(registry.register("a_very_long_indicator_name"), Ok(1));
        assert_eq!(registry.register("A_VERY_LONG_INDICATOR_other"), Ok(1));
        assert_eq!(registry.iter().next().unwrap().name.len(), MAX_INDICATOR_NAME_LENGTH);
    }

    #[test]
    fn test_toggle_uses_discovery_order() {
        let mut registry = NotificationRegistry::new();
        registry.register("battchg").unwrap();
        registry.register("signal").unwrap();

        assert!(!registry.toggle(2, false).unwrap().enabled);
        assert_eq!(registry.activation_mask().as_slice(), &[true, false]);
        assert_eq!(registry.toggle(3, true), Err(IndicatorError::InvalidIndex));
        assert_eq!(registry.toggle(0, true), Err(IndicatorError::InvalidIndex));
    }

    #[test]
    fn test_registry_full() {
        let mut registry = NotificationRegistry::new();
        for i in 0..MAX_NOTIFICATIONS {
            let mut name = IndicatorName::new();
            core::fmt::Write::write_fmt(&mut name, format_args!("ind{i}")).unwrap();
            registry.register(&name).unwrap();
        }
        assert_eq!(registry.register("extra"), Err(IndicatorError::RegistryFull));
        assert_eq!(registry.register("ind3"), Ok(4));
    }
}
