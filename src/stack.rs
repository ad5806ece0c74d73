//! Lower-stack seam
//!
//! The session core never talks to a controller directly. Everything below it
//! (link controller, RFCOMM, SDP, SCO) is reached through [`Stack`], a
//! synchronous, non-blocking interface: each call either fails immediately with
//! the stack's numeric reason or is accepted, with the outcome arriving later as
//! a [`TransportEvent`](crate::event::TransportEvent).

use crate::{
    BluetoothAddress, ClassOfDevice,
    audio::{AudioParameters, Codec},
    call::{CallListEntry, PhoneNumber, ResponseHoldState},
    device_cache::DeviceName,
    indicator::ActivationMask,
    pairing::{AuthResponse, BondingType},
};
use core::fmt;
use heapless::String;

/// Identifier returned by a successful stack initialization
pub type StackId = u32;

/// Open RFCOMM port handle (never 0)
pub type PortId = u32;

/// Registered SDP record handle
pub type SdpRecordHandle = u32;

/// Operator name as carried by operator selection/query
pub type OperatorName = String<16>;

/// Numeric failure reason reported by the lower stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StackError(pub i32);

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stack error {}", self.0)
    }
}

/// Profile role of this endpoint, fixed for the lifetime of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// Audio Gateway (the phone side)
    AudioGateway,
    /// Hands-Free unit (the car kit side)
    HandsFree,
}

impl Role {
    /// The role expected on the other end of the link
    #[must_use]
    pub const fn peer(&self) -> Self {
        match self {
            Self::AudioGateway => Self::HandsFree,
            Self::HandsFree => Self::AudioGateway,
        }
    }

    /// Human-readable role name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AudioGateway => "Audio Gateway",
            Self::HandsFree => "Hands-Free",
        }
    }
}

/// Discoverability mode (`SetDiscoverabilityMode <0|1|2>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DiscoverabilityMode {
    /// Not discoverable
    #[default]
    NonDiscoverable,
    /// Limited discoverable
    Limited,
    /// General discoverable
    General,
}

impl DiscoverabilityMode {
    /// Map the operator value
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::NonDiscoverable),
            1 => Some(Self::Limited),
            2 => Some(Self::General),
            _ => None,
        }
    }
}

/// Connectability mode (`SetConnectabilityMode <0|1>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectabilityMode {
    /// Page scan disabled
    #[default]
    NonConnectable,
    /// Page scan enabled
    Connectable,
}

impl ConnectabilityMode {
    /// Map the operator value
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::NonConnectable),
            1 => Some(Self::Connectable),
            _ => None,
        }
    }
}

/// Pairability mode (`SetPairabilityMode <0|1|2>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PairabilityMode {
    /// Reject pairing
    #[default]
    NonPairable,
    /// Legacy pairing only
    Pairable,
    /// Legacy and Secure Simple Pairing
    PairableWithSecureSimplePairing,
}

impl PairabilityMode {
    /// Map the operator value
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::NonPairable),
            1 => Some(Self::Pairable),
            2 => Some(Self::PairableWithSecureSimplePairing),
            _ => None,
        }
    }
}

/// Debug sink mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebugMode {
    /// Append readable lines to a log file
    AsciiLog,
    /// Print to an interactive terminal
    Terminal,
    /// Binary snoop capture
    Snoop,
}

impl DebugMode {
    /// Map the operator value
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::AsciiLog),
            1 => Some(Self::Terminal),
            2 => Some(Self::Snoop),
            _ => None,
        }
    }

    /// Sink used when the operator names none
    #[must_use]
    pub const fn default_target(&self) -> &'static str {
        match self {
            Self::AsciiLog => crate::constants::DEFAULT_ASCII_LOG_FILE,
            Self::Terminal => crate::constants::DEFAULT_TERMINAL,
            Self::Snoop => crate::constants::DEFAULT_SNOOP_LOG_FILE,
        }
    }
}

/// Debug sink configuration handed to the stack
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DebugConfig {
    /// Sink mode
    pub mode: DebugMode,
    /// File or terminal path
    pub target: String<64>,
    /// Prefix every line with the stack identifier
    pub prefix_stack_id: bool,
}

/// Profile-level requests sent over the signalling channel
///
/// Covers both directions; the session only issues the ones that belong to
/// its role.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HfpRequest {
    /// AG: indicator value changed (`+CIEV`), 1-based index
    IndicatorUpdate {
        /// Indicator index
        index: u8,
        /// New value
        value: u8,
    },
    /// AG: call waiting notification (`+CCWA`)
    CallWaitingNotification(PhoneNumber),
    /// AG: calling line identification (`+CLIP`)
    CallerIdNotification(PhoneNumber),
    /// AG: ring alert (`RING`)
    RingIndication,
    /// AG: in-band ring tone setting (`+BSIR`)
    InBandRingTone(bool),
    /// Both: voice recognition activation (`+BVRA`)
    VoiceRecognition(bool),
    /// Both: speaker gain (`+VGS`)
    SpeakerGain(u8),
    /// Both: microphone gain (`+VGM`)
    MicrophoneGain(u8),
    /// AG: number attached to a voice tag (`+BINP`)
    VoiceTagResponse(PhoneNumber),
    /// AG: network operator (`+COPS`)
    OperatorSelection {
        /// Operator selection mode
        mode: u8,
        /// Operator name
        name: OperatorName,
    },
    /// AG: subscriber number (`+CNUM`)
    SubscriberNumber {
        /// Number
        number: PhoneNumber,
        /// Number type (129 national, 145 international)
        number_type: u8,
        /// Service (4 voice, 5 fax)
        service: u8,
    },
    /// AG: response and hold state (`+BTRH`)
    ResponseHoldState(ResponseHoldState),
    /// AG: one current-calls list entry (`+CLCC`)
    CurrentCallsEntry {
        /// Entry
        entry: CallListEntry,
        /// Last entry of the list
        final_entry: bool,
    },
    /// AG: extended error result code (`+CME ERROR`)
    ExtendedErrorResult(u8),
    /// AG: codec selection (`+BCS`)
    CodecSelection(Codec),
    /// HF: read indicator values (`AT+CIND?`)
    QueryIndicators,
    /// HF: indicator activation list (`AT+BIA`)
    IndicatorActivation(ActivationMask),
    /// HF: enable call waiting notification (`AT+CCWA`)
    EnableCallWaiting(bool),
    /// HF: enable caller id notification (`AT+CLIP`)
    EnableCallerId(bool),
    /// HF: dial a number (`ATD`)
    Dial(PhoneNumber),
    /// HF: dial a memory location (`ATD>`)
    MemoryDial(u32),
    /// HF: redial last number (`AT+BLDN`)
    Redial,
    /// HF: answer (`ATA`)
    Answer,
    /// HF: hang up (`AT+CHUP`)
    HangUp,
    /// HF: DTMF tone (`AT+VTS`)
    Dtmf(char),
    /// HF: call hold and multiparty handling (`AT+CHLD`)
    CallHoldSelection {
        /// Action 0 to 4
        action: u8,
        /// Call index for the indexed variants
        index: Option<u32>,
    },
    /// HF: request number for a voice tag (`AT+BINP=1`)
    VoiceTagRequest,
    /// HF: list current calls (`AT+CLCC`)
    QueryCurrentCalls,
    /// HF: set operator name format (`AT+COPS=3,0`)
    SetOperatorFormat,
    /// HF: query operator (`AT+COPS?`)
    QueryOperator,
    /// HF: enable extended error codes (`AT+CMEE`)
    EnableExtendedErrors(bool),
    /// HF: query subscriber number (`AT+CNUM`)
    QuerySubscriberNumber,
    /// HF: query response and hold state (`AT+BTRH?`)
    QueryResponseHold,
    /// HF: set response and hold state (`AT+BTRH=n`)
    SetResponseHold(ResponseHoldState),
    /// HF: ask the AG to start codec negotiation (`AT+BCC`)
    CodecConnectionRequest,
    /// Both: confirm or reject the peer's codec choice
    CodecConfirmation {
        /// Codec the peer proposed
        codec: Codec,
        /// Positive or negative completion
        accepted: bool,
    },
}

/// Lower Bluetooth stack as seen by the session core
///
/// Methods never block. Long-running operations return once the request is
/// accepted and report their outcome through transport events.
pub trait Stack {
    /// Bring the stack up, returning its identifier
    ///
    /// # Errors
    /// Returns the stack's reason when the controller cannot be opened.
    fn initialize(&mut self) -> Result<StackId, StackError>;

    /// Tear the stack down
    fn shutdown(&mut self, stack_id: StackId);

    /// Start an inquiry of `length` x 1.28s, stopping after `max_responses`
    ///
    /// # Errors
    /// Returns the stack's reason when the inquiry cannot start.
    fn start_inquiry(&mut self, length: u8, max_responses: u8) -> Result<(), StackError>;

    /// Set discoverability
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn set_discoverability_mode(&mut self, mode: DiscoverabilityMode) -> Result<(), StackError>;

    /// Set connectability
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn set_connectability_mode(&mut self, mode: ConnectabilityMode) -> Result<(), StackError>;

    /// Set pairability
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn set_pairability_mode(&mut self, mode: PairabilityMode) -> Result<(), StackError>;

    /// Local controller address
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn local_address(&mut self) -> Result<BluetoothAddress, StackError>;

    /// Set the local friendly name
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn set_local_name(&mut self, name: &str) -> Result<(), StackError>;

    /// Local friendly name
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn local_name(&mut self) -> Result<DeviceName, StackError>;

    /// Set the local Class of Device
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn set_class_of_device(&mut self, class_of_device: ClassOfDevice) -> Result<(), StackError>;

    /// Local Class of Device
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn class_of_device(&mut self) -> Result<ClassOfDevice, StackError>;

    /// Request a remote name; answered by a `RemoteName` event
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn request_remote_name(&mut self, addr: BluetoothAddress) -> Result<(), StackError>;

    /// Start bonding with `addr`
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn initiate_bonding(
        &mut self,
        addr: BluetoothAddress,
        bonding_type: BondingType,
    ) -> Result<(), StackError>;

    /// Abort bonding with `addr`
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn end_bonding(&mut self, addr: BluetoothAddress) -> Result<(), StackError>;

    /// Answer an authentication request
    ///
    /// # Errors
    /// Returns the stack's reason when the response is rejected.
    fn authentication_response(
        &mut self,
        addr: BluetoothAddress,
        response: &AuthResponse,
    ) -> Result<(), StackError>;

    /// Search the remote SDP database for a 16- or 32-bit service UUID
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn service_search(&mut self, addr: BluetoothAddress, uuid: u32) -> Result<(), StackError>;

    /// Configure the debug sink; `None` disables it
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn enable_debug(&mut self, config: Option<&DebugConfig>) -> Result<(), StackError>;

    /// Open a listening port for `role` on RFCOMM channel `channel`
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn open_server_port(&mut self, role: Role, channel: u8) -> Result<PortId, StackError>;

    /// Advertise an open server port
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn register_sdp_record(
        &mut self,
        port: PortId,
        role: Role,
        service_name: &str,
    ) -> Result<SdpRecordHandle, StackError>;

    /// Withdraw an SDP record
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn unregister_sdp_record(&mut self, handle: SdpRecordHandle) -> Result<(), StackError>;

    /// Connect to `channel` on a remote device; completed by `OpenConfirmation`
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn open_remote_port(
        &mut self,
        role: Role,
        addr: BluetoothAddress,
        channel: u8,
    ) -> Result<PortId, StackError>;

    /// Close a server or client port
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn close_port(&mut self, port: PortId) -> Result<(), StackError>;

    /// Accept or reject an incoming connection on a server port
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn respond_open_request(&mut self, port: PortId, accept: bool) -> Result<(), StackError>;

    /// Require authentication on incoming connections
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn set_server_authentication(&mut self, required: bool) -> Result<(), StackError>;

    /// Send one signalling request
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn send(&mut self, port: PortId, request: &HfpRequest) -> Result<(), StackError>;

    /// Set up, or accept, a synchronous audio connection
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn setup_audio(&mut self, port: PortId, parameters: &AudioParameters)
    -> Result<(), StackError>;

    /// Release the synchronous audio connection
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn release_audio(&mut self, port: PortId) -> Result<(), StackError>;

    /// Queue one frame of audio data
    ///
    /// # Errors
    /// Returns the stack's reason on failure.
    fn send_audio_data(&mut self, port: PortId, data: &[u8]) -> Result<(), StackError>;
}
