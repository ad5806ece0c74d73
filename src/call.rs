//! Call-state tracker
//!
//! Keeps the coarse call state, the response-and-hold state and the current
//! calls list (`+CLCC`). On the AG side the list is authored by the operator,
//! either in one line or interactively one entry per line; on the HF side it is
//! filled from the entries the AG reports.

use crate::{
    command::Parameter,
    constants::{MAX_CALL_LIST_ENTRIES, MAX_PHONE_NUMBER_LENGTH},
};
use core::fmt;
use heapless::{String, Vec};

/// Phone number text
pub type PhoneNumber = String<MAX_PHONE_NUMBER_LENGTH>;

/// Number of fields in one call list line
pub const CALL_LIST_FIELDS: usize = 7;

/// Sample line shown when an interactive entry is incomplete
pub const CALL_LIST_SAMPLE: &str = "1 0 0 0 5551234 129 1";

/// Field order of a call list line
pub const CALL_LIST_USAGE: &str = "<dir> <status> <mode> <mpty> <number> <format> <final>";

/// Call list errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CallError {
    /// Fewer than seven fields
    MissingFields,
    /// A field is out of range
    InvalidField(&'static str),
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFields => write!(f, "expected {CALL_LIST_FIELDS} fields"),
            Self::InvalidField(field) => write!(f, "invalid {field}"),
        }
    }
}

/// Call direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CallDirection {
    /// Mobile originated
    Outgoing,
    /// Mobile terminated
    Incoming,
}

/// Call status as reported in `+CLCC`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CallStatus {
    /// Active
    Active,
    /// Held
    Held,
    /// Dialing (outgoing)
    Dialing,
    /// Alerting (outgoing)
    Alerting,
    /// Incoming
    Incoming,
    /// Waiting (incoming)
    Waiting,
}

impl CallStatus {
    fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Active),
            1 => Some(Self::Held),
            2 => Some(Self::Dialing),
            3 => Some(Self::Alerting),
            4 => Some(Self::Incoming),
            5 => Some(Self::Waiting),
            _ => None,
        }
    }
}

/// Call mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CallMode {
    /// Voice
    Voice,
    /// Data
    Data,
    /// Fax
    Fax,
}

impl CallMode {
    fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Voice),
            1 => Some(Self::Data),
            2 => Some(Self::Fax),
            _ => None,
        }
    }
}

/// Response and hold state of an incoming call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseHoldState {
    /// Incoming call put on hold
    Hold,
    /// Held incoming call accepted
    Accept,
    /// Held incoming call rejected
    Reject,
}

impl ResponseHoldState {
    /// Map the operator value
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Hold),
            1 => Some(Self::Accept),
            2 => Some(Self::Reject),
            _ => None,
        }
    }
}

/// Coarse call state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CallState {
    /// No call
    #[default]
    Idle,
    /// Ringing
    Incoming,
    /// Dialing out
    Outgoing,
    /// A call is up
    Active,
}

/// One current-calls list entry
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CallListEntry {
    /// 1-based call index
    pub index: u32,
    /// Direction
    pub direction: CallDirection,
    /// Status
    pub status: CallStatus,
    /// Mode
    pub mode: CallMode,
    /// Part of a multiparty call
    pub multiparty: bool,
    /// Remote number
    pub number: PhoneNumber,
    /// Number format (129 national, 145 international)
    pub format: u8,
}

impl CallListEntry {
    /// Parse one authored entry from `<dir> <status> <mode> <mpty> <number> <format> <final>`
    ///
    /// Returns the entry, with index 0, and the final flag.
    ///
    /// # Errors
    /// `MissingFields` with fewer than seven fields, `InvalidField` naming the
    /// first field that is out of range.
    pub fn from_parameters(params: &[Parameter]) -> Result<(Self, bool), CallError> {
        let [direction, status, mode, multiparty, number, format, final_entry, ..] = params else {
            return Err(CallError::MissingFields);
        };

        let direction = match direction.number() {
            Some(0) => CallDirection::Outgoing,
            Some(1) => CallDirection::Incoming,
            _ => return Err(CallError::InvalidField("direction")),
        };
        let status = status
            .number()
            .and_then(CallStatus::from_raw)
            .ok_or(CallError::InvalidField("status"))?;
        let mode = mode
            .number()
            .and_then(CallMode::from_raw)
            .ok_or(CallError::InvalidField("mode"))?;
        let multiparty = flag(multiparty).ok_or(CallError::InvalidField("multiparty"))?;
        let number =
            PhoneNumber::try_from(number.as_str()).map_err(|()| CallError::InvalidField("number"))?;
        let format = format
            .number()
            .and_then(|raw| u8::try_from(raw).ok())
            .ok_or(CallError::InvalidField("format"))?;
        let final_entry = flag(final_entry).ok_or(CallError::InvalidField("final"))?;

        Ok((
            Self {
                index: 0,
                direction,
                status,
                mode,
                multiparty,
                number,
                format,
            },
            final_entry,
        ))
    }
}

fn flag(param: &Parameter) -> Option<bool> {
    match param.number()? {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

/// Call state and call list bookkeeping
#[derive(Debug, Default)]
pub struct CallTracker {
    state: CallState,
    response_hold: Option<ResponseHoldState>,
    next_index: u32,
    entries: Vec<CallListEntry, MAX_CALL_LIST_ENTRIES>,
    authoring: bool,
}

impl CallTracker {
    /// Create an idle tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current coarse call state
    #[must_use]
    pub const fn state(&self) -> CallState {
        self.state
    }

    /// Move to a new call state
    pub fn set_state(&mut self, state: CallState) {
        if self.state != state {
            debug!("[CALL] {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Response and hold state last sent or received
    #[must_use]
    pub const fn response_hold(&self) -> Option<ResponseHoldState> {
        self.response_hold
    }

    /// Record the response and hold state
    pub fn set_response_hold(&mut self, state: ResponseHoldState) {
        self.response_hold = Some(state);
    }

    /// Index the next authored entry will get, minus one
    #[must_use]
    pub const fn call_index(&self) -> u32 {
        self.next_index
    }

    /// Assign the next index to an authored entry
    ///
    /// The first entry of a list clears the previously recorded list. A final
    /// entry resets the counter so the next list starts over.
    pub fn prepare_entry(&mut self, mut entry: CallListEntry, final_entry: bool) -> CallListEntry {
        if self.next_index == 0 {
            self.entries.clear();
        }
        self.next_index += 1;
        entry.index = self.next_index;
        if final_entry {
            self.next_index = 0;
        }
        if self.entries.push(entry.clone()).is_err() {
            warn!("[CALL] Call list full, entry {} not recorded", entry.index);
        }
        entry
    }

    /// Abandon the list being authored after a transport failure
    pub fn abort_list(&mut self) {
        self.next_index = 0;
        self.authoring = false;
    }

    /// Record an entry reported by the peer
    pub fn record_entry(&mut self, entry: CallListEntry) {
        if self.entries.push(entry).is_err() {
            warn!("[CALL] Call list full, reported entry dropped");
        }
    }

    /// Forget the recorded list before asking the peer for a fresh one
    pub fn clear_entries(&mut self) {
        self.entries.clear();
    }

    /// Entries of the last list
    #[must_use]
    pub fn entries(&self) -> &[CallListEntry] {
        &self.entries
    }

    /// Whether operator lines are currently call list entries
    #[must_use]
    pub const fn is_authoring(&self) -> bool {
        self.authoring
    }

    /// Enter or leave interactive authoring
    pub fn set_authoring(&mut self, authoring: bool) {
        self.authoring = authoring;
    }

    /// Forget everything (port closed)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::parse_parameters;

    fn entry(line: &str) -> (CallListEntry, bool) {
        CallListEntry::from_parameters(&parse_parameters(line).unwrap()).unwrap()
    }

    #[test]
    fn test_parse_sample_line() {
        let (parsed, final_entry) = entry(CALL_LIST_SAMPLE);
        assert_eq!(parsed.direction, CallDirection::Incoming);
        assert_eq!(parsed.status, CallStatus::Active);
        assert_eq!(parsed.mode, CallMode::Voice);
        assert!(!parsed.multiparty);
        assert_eq!(parsed.number.as_str(), "5551234");
        assert_eq!(parsed.format, 129);
        assert!(final_entry);
    }

    #[test]
    fn test_parse_rejects_short_and_invalid_lines() {
        let params = parse_parameters("1 0 0").unwrap();
        assert_eq!(
            CallListEntry::from_parameters(&params),
            Err(CallError::MissingFields)
        );

        let params = parse_parameters("1 9 0 0 555 129 0").unwrap();
        assert_eq!(
            CallListEntry::from_parameters(&params),
            Err(CallError::InvalidField("status"))
        );

        let params = parse_parameters("1 0 0 0 555 300 0").unwrap();
        assert_eq!(
            CallListEntry::from_parameters(&params),
            Err(CallError::InvalidField("format"))
        );
    }

    #[test]
    fn test_index_counter() {
        let mut tracker = CallTracker::new();
        let (template, _) = entry("0 0 0 0 5550000 129 0");

        assert_eq!(tracker.prepare_entry(template.clone(), false).index, 1);
        assert_eq!(tracker.prepare_entry(template.clone(), false).index, 2);
        assert_eq!(tracker.call_index(), 2);
        assert_eq!(tracker.prepare_entry(template.clone(), true).index, 3);
        assert_eq!(tracker.call_index(), 0);
        assert_eq!(tracker.entries().len(), 3);

        // a new list replaces the recorded one
        assert_eq!(tracker.prepare_entry(template, false).index, 1);
        assert_eq!(tracker.entries().len(), 1);
    }

    #[test]
    fn test_abort_list_resets_counter() {
        let mut tracker = CallTracker::new();
        let (template, _) = entry("0 0 0 0 5550000 129 0");

        tracker.set_authoring(true);
        tracker.prepare_entry(template, false);
        tracker.abort_list();

        assert_eq!(tracker.call_index(), 0);
        assert!(!tracker.is_authoring());
    }
}
