//! Transport events
//!
//! Everything the lower stack reports back, as one owned value per event so it
//! can be queued from a callback and applied later by the processor.

use crate::{
    BluetoothAddress, ClassOfDevice,
    audio::{Codec, tone::AudioFrame},
    call::{CallListEntry, PhoneNumber, ResponseHoldState},
    device_cache::DeviceName,
    indicator::{IndicatorKind, IndicatorName},
    pairing::AuthEvent,
    stack::{OperatorName, PortId},
};

/// Inquiry, name and service discovery results
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GapEvent {
    /// A device answered the inquiry
    InquiryResult {
        /// Device address
        addr: BluetoothAddress,
        /// Class of Device, when reported
        class_of_device: Option<ClassOfDevice>,
    },
    /// Inquiry finished
    InquiryComplete,
    /// Remote name request finished
    RemoteName {
        /// Device address
        addr: BluetoothAddress,
        /// Name, `None` on failure
        name: Option<DeviceName>,
    },
    /// Service search finished
    ServiceSearchResult {
        /// Device address
        addr: BluetoothAddress,
        /// 0 on success
        status: u8,
        /// Number of matching records
        records: u8,
    },
}

/// Signalling port lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortEvent {
    /// A peer wants to connect to the server port
    OpenRequest {
        /// Connecting device
        addr: BluetoothAddress,
    },
    /// A peer connected to the server port
    OpenIndication {
        /// Connected device
        addr: BluetoothAddress,
    },
    /// Outcome of an outgoing connection
    OpenConfirmation {
        /// 0 on success
        status: u8,
    },
    /// Service level connection established
    ServiceLevelConnected {
        /// Peer supports wideband speech
        wideband: bool,
    },
    /// The peer closed the connection
    CloseIndication,
}

/// Signalling received from the peer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HfpEvent {
    /// AG: the HF answered
    Answer,
    /// AG: the HF hung up
    HangUp,
    /// AG: dial request
    Dial(PhoneNumber),
    /// AG: memory dial request
    MemoryDial(u32),
    /// AG: redial request
    Redial,
    /// AG: DTMF request
    Dtmf(char),
    /// AG: call hold and multiparty request
    CallHoldSelection {
        /// Action 0 to 4
        action: u8,
        /// Call index for the indexed variants
        index: Option<u32>,
    },
    /// AG: voice tag number request
    VoiceTagRequest,
    /// AG: the HF asks for the current calls list
    CurrentCallsQuery,
    /// AG: operator query
    OperatorQuery,
    /// AG: subscriber number query
    SubscriberNumberQuery,
    /// AG: response and hold query
    ResponseHoldQuery,
    /// AG: response and hold request
    ResponseHoldSet(ResponseHoldState),
    /// AG: the HF confirmed a codec
    CodecConfirmation(Codec),
    /// AG: the HF asks for codec negotiation
    CodecConnectionRequest,
    /// HF: one indicator announced during service level setup
    ControlIndicatorStatus {
        /// Indicator name
        name: IndicatorName,
        /// Value domain
        kind: IndicatorKind,
        /// Current value
        value: u8,
    },
    /// HF: indicator value changed, index in discovery order
    IndicatorUpdate {
        /// 1-based index
        index: u8,
        /// New value
        value: u8,
    },
    /// HF: ring alert
    Ring,
    /// HF: call waiting
    CallWaiting(PhoneNumber),
    /// HF: calling line identification
    CallerId(PhoneNumber),
    /// HF: in-band ring tone setting
    InBandRing(bool),
    /// HF: one current-calls list entry
    CurrentCallsEntry(CallListEntry),
    /// HF: operator information
    OperatorInfo {
        /// Selection mode
        mode: u8,
        /// Operator name
        name: OperatorName,
    },
    /// HF: subscriber number
    SubscriberNumber {
        /// Number
        number: PhoneNumber,
        /// Number type
        number_type: u8,
        /// Service
        service: u8,
    },
    /// HF: response and hold state
    ResponseHoldState(ResponseHoldState),
    /// HF: number attached to a voice tag
    VoiceTag(PhoneNumber),
    /// HF: the AG selected a codec
    CodecSelection(Codec),
    /// HF: extended error result code
    ExtendedErrorResult(u8),
    /// Both: voice recognition state
    VoiceRecognition(bool),
    /// Both: speaker gain
    SpeakerGain(u8),
    /// Both: microphone gain
    MicrophoneGain(u8),
}

/// Synchronous audio connection
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioEvent {
    /// The peer asks for an audio connection
    ConnectionRequest,
    /// Audio setup finished
    Connected {
        /// 0 on success
        status: u8,
        /// Negotiated frame length in bytes, 0 if unknown
        frame_length: u16,
    },
    /// Audio connection released
    Disconnected,
    /// One received frame
    Data(AudioFrame),
}

/// One event from the lower stack
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportEvent {
    /// Inquiry and discovery
    Gap(GapEvent),
    /// Pairing and security
    Authentication {
        /// Peer address
        addr: BluetoothAddress,
        /// Event
        event: AuthEvent,
    },
    /// Port lifecycle
    Port {
        /// Port handle
        port: PortId,
        /// Event
        event: PortEvent,
    },
    /// Profile signalling
    Hfp {
        /// Port handle
        port: PortId,
        /// Event
        event: HfpEvent,
    },
    /// Audio
    Audio {
        /// Port handle
        port: PortId,
        /// Event
        event: AudioEvent,
    },
}
