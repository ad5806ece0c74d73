//! Pairing & security state machine
//!
//! Reacts to authentication events from the lower stack, one negotiation at a
//! time. Requests that the local policy can answer (link key lookup, IO
//! capabilities, Just Works confirmation, OOB) are answered inside the event
//! call. PIN, passkey and numeric-comparison requests park the machine until the
//! operator replies.
//!
//! ```text
//! Idle -> AwaitingPin | AwaitingPasskey | AwaitingUserConfirmation | AwaitingIoCapability -> Idle
//! ```

use crate::{
    BluetoothAddress,
    constants::{MAX_PASSKEY, MAX_PIN_CODE_LENGTH},
    link_key::{LinkKey, LinkKeyStore},
};
use core::fmt;

/// Declared input/output capability used to pick the association model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum IoCapability {
    /// Display only
    DisplayOnly = 0,
    /// Display with yes/no input
    DisplayYesNo = 1,
    /// Keyboard only
    KeyboardOnly = 2,
    /// No input and no output
    NoInputNoOutput = 3,
}

impl IoCapability {
    /// Parse the operator's numeric capability value
    #[must_use]
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::DisplayOnly),
            1 => Some(Self::DisplayYesNo),
            2 => Some(Self::KeyboardOnly),
            3 => Some(Self::NoInputNoOutput),
            _ => None,
        }
    }

    /// Human-readable name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DisplayOnly => "Display Only",
            Self::DisplayYesNo => "Display Yes/No",
            Self::KeyboardOnly => "Keyboard Only",
            Self::NoInputNoOutput => "No Input/Output",
        }
    }
}

/// Bonding type requested with `Pair`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BondingType {
    /// Dedicated bonding (pair now, connect later)
    Dedicated,
    /// General bonding (pair as part of a connection)
    General,
}

/// PIN code supplied by the operator
pub type PinCode = heapless::Vec<u8, MAX_PIN_CODE_LENGTH>;

/// Authentication events delivered by the lower stack for one peer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AuthEvent {
    /// Peer needs a stored link key
    LinkKeyRequest,
    /// Legacy pairing needs a PIN
    PinCodeRequest,
    /// Secure Simple Pairing asks for our IO capabilities
    IoCapabilityRequest,
    /// The peer's own IO capabilities
    IoCapabilityResponse {
        /// Peer capability
        io_capability: IoCapability,
        /// Peer requires MITM protection
        mitm_protection: bool,
        /// Peer has OOB data
        oob_data_present: bool,
    },
    /// Numeric comparison / Just Works confirmation
    UserConfirmationRequest {
        /// Six-digit value to compare
        value: u32,
    },
    /// Passkey entry required locally
    PasskeyRequest,
    /// Passkey to be displayed locally
    PasskeyNotification {
        /// Passkey shown to the user
        passkey: u32,
    },
    /// Remote OOB data requested
    OobDataRequest,
    /// A new link key was created
    LinkKeyCreated {
        /// The key
        key: LinkKey,
    },
    /// Authentication finished
    AuthenticationStatus {
        /// 0 on success, otherwise the lower stack's reason code
        status: u8,
    },
}

/// Responses handed to the lower stack
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AuthResponse {
    /// Stored key, or `None` to force a fresh exchange
    LinkKey(Option<LinkKey>),
    /// PIN code reply
    PinCode(PinCode),
    /// Local IO capability triple
    IoCapabilities {
        /// Local capability
        io_capability: IoCapability,
        /// MITM protection required
        mitm_protection: bool,
        /// OOB data present
        oob_data_present: bool,
    },
    /// Confirmation accept/reject
    UserConfirmation(bool),
    /// Passkey reply, `None` rejects
    Passkey(Option<u32>),
    /// OOB reply; this core never has OOB data
    OutOfBandData(Option<[u8; 32]>),
}

/// Current negotiation step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PairingState {
    /// No negotiation in progress
    #[default]
    Idle,
    /// Waiting for `PINCodeResponse`
    AwaitingPin,
    /// Waiting for `PassKeyResponse`
    AwaitingPasskey,
    /// Waiting for `UserConfirmationResponse`
    AwaitingUserConfirmation,
    /// Our capabilities were sent, waiting for the peer's
    AwaitingIoCapability,
}

/// Pairing errors surfaced to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PairingError {
    /// No negotiation is waiting for this kind of reply
    NotInProgress,
    /// PIN empty or longer than 16 bytes
    InvalidPin,
    /// Passkey above six decimal digits
    InvalidPasskey,
}

impl fmt::Display for PairingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInProgress => f.write_str("no matching pairing request outstanding"),
            Self::InvalidPin => f.write_str("PIN must be 1 to 16 characters"),
            Self::InvalidPasskey => f.write_str("passkey must be at most 6 digits"),
        }
    }
}

/// Security policy applied to incoming requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SecurityPolicy {
    /// Local IO capability
    pub io_capability: IoCapability,
    /// Require MITM protection
    pub mitm_protection: bool,
    /// Advertise OOB data in the IO capability reply
    ///
    /// OOB data requests are still answered without data.
    pub oob_supported: bool,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            io_capability: IoCapability::DisplayYesNo,
            mitm_protection: true,
            oob_supported: false,
        }
    }
}

/// What the session must do after an authentication event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingAction {
    /// Send this response to the peer now
    Respond(AuthResponse),
    /// Ask the operator and wait
    PromptOperator,
    /// Nothing to send
    None,
}

/// Pairing context: the single outstanding peer plus the local policy
#[derive(Debug, Default)]
pub struct PairingContext {
    peer: BluetoothAddress,
    state: PairingState,
    policy: SecurityPolicy,
}

impl PairingContext {
    /// Create an idle context with the given policy
    #[must_use]
    pub fn new(policy: SecurityPolicy) -> Self {
        Self {
            peer: BluetoothAddress::ZERO,
            state: PairingState::Idle,
            policy,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> PairingState {
        self.state
    }

    /// Peer under negotiation, if any
    #[must_use]
    pub fn peer(&self) -> Option<BluetoothAddress> {
        (!self.peer.is_zero()).then_some(self.peer)
    }

    /// Local policy
    #[must_use]
    pub const fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    /// Replace the IO capability and MITM requirement
    pub fn set_simple_pairing_parameters(&mut self, io_capability: IoCapability, mitm: bool) {
        self.policy.io_capability = io_capability;
        self.policy.mitm_protection = mitm;
    }

    fn begin(&mut self, addr: BluetoothAddress, state: PairingState) {
        self.peer = addr;
        self.state = state;
    }

    fn finish(&mut self) {
        self.peer = BluetoothAddress::ZERO;
        self.state = PairingState::Idle;
    }

    /// Feed one authentication event
    ///
    /// `LinkKeyCreated` is answered by the session, which owns the store;
    /// here it only returns `PairingAction::None`.
    pub fn handle_event(
        &mut self,
        addr: BluetoothAddress,
        event: &AuthEvent,
        link_keys: &LinkKeyStore,
    ) -> PairingAction {
        match event {
            AuthEvent::LinkKeyRequest => {
                PairingAction::Respond(AuthResponse::LinkKey(link_keys.get(&addr).copied()))
            }
            AuthEvent::PinCodeRequest => {
                self.begin(addr, PairingState::AwaitingPin);
                PairingAction::PromptOperator
            }
            AuthEvent::IoCapabilityRequest => {
                self.begin(addr, PairingState::AwaitingIoCapability);
                PairingAction::Respond(AuthResponse::IoCapabilities {
                    io_capability: self.policy.io_capability,
                    mitm_protection: self.policy.mitm_protection,
                    oob_data_present: self.policy.oob_supported,
                })
            }
            AuthEvent::IoCapabilityResponse { .. } => {
                if self.state == PairingState::AwaitingIoCapability {
                    self.state = PairingState::Idle;
                }
                PairingAction::None
            }
            AuthEvent::UserConfirmationRequest { .. } => {
                if self.policy.io_capability == IoCapability::DisplayYesNo {
                    self.begin(addr, PairingState::AwaitingUserConfirmation);
                    PairingAction::PromptOperator
                } else {
                    // Just Works
                    self.finish();
                    PairingAction::Respond(AuthResponse::UserConfirmation(true))
                }
            }
            AuthEvent::PasskeyRequest => {
                self.begin(addr, PairingState::AwaitingPasskey);
                PairingAction::PromptOperator
            }
            AuthEvent::OobDataRequest => PairingAction::Respond(AuthResponse::OutOfBandData(None)),
            AuthEvent::PasskeyNotification { .. } | AuthEvent::LinkKeyCreated { .. } => {
                PairingAction::None
            }
            AuthEvent::AuthenticationStatus { .. } => {
                self.finish();
                PairingAction::None
            }
        }
    }

    fn take_peer(&mut self, expected: PairingState) -> Result<BluetoothAddress, PairingError> {
        if self.state != expected || self.peer.is_zero() {
            return Err(PairingError::NotInProgress);
        }
        let peer = self.peer;
        self.finish();
        Ok(peer)
    }

    /// Operator PIN reply
    ///
    /// # Errors
    /// `NotInProgress` without an outstanding PIN request, `InvalidPin` for an
    /// empty or over-long PIN (the request stays outstanding).
    pub fn pin_code_response(
        &mut self,
        pin: &str,
    ) -> Result<(BluetoothAddress, AuthResponse), PairingError> {
        if self.state != PairingState::AwaitingPin {
            return Err(PairingError::NotInProgress);
        }
        let code = PinCode::from_slice(pin.as_bytes()).map_err(|()| PairingError::InvalidPin)?;
        if code.is_empty() {
            return Err(PairingError::InvalidPin);
        }
        let peer = self.take_peer(PairingState::AwaitingPin)?;
        Ok((peer, AuthResponse::PinCode(code)))
    }

    /// Operator passkey reply
    ///
    /// # Errors
    /// `NotInProgress` without an outstanding passkey request, `InvalidPasskey`
    /// above 999999 (the request stays outstanding).
    pub fn passkey_response(
        &mut self,
        passkey: u32,
    ) -> Result<(BluetoothAddress, AuthResponse), PairingError> {
        if self.state != PairingState::AwaitingPasskey {
            return Err(PairingError::NotInProgress);
        }
        if passkey > MAX_PASSKEY {
            return Err(PairingError::InvalidPasskey);
        }
        let peer = self.take_peer(PairingState::AwaitingPasskey)?;
        Ok((peer, AuthResponse::Passkey(Some(passkey))))
    }

    /// Operator numeric-comparison reply
    ///
    /// # Errors
    /// `NotInProgress` without an outstanding confirmation request.
    pub fn user_confirmation_response(
        &mut self,
        accept: bool,
    ) -> Result<(BluetoothAddress, AuthResponse), PairingError> {
        let peer = self.take_peer(PairingState::AwaitingUserConfirmation)?;
        Ok((peer, AuthResponse::UserConfirmation(accept)))
    }
}
