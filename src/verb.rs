//! Operator verbs
//!
//! Each [`Verb`] parses its positional parameters and calls one typed
//! [`Session`] operation. Verbs are registered by name in three groups: the
//! common set, then the set of the session's role. Within a group the order
//! matters for prefix resolution, so a name always precedes any longer name it
//! begins.

use crate::{
    ClassOfDevice,
    audio::{Codec, DataFormat, ScoTransport, TestMode},
    call::{CallListEntry, ResponseHoldState},
    command::{
        CommandError, CommandHandler, CommandResult, CommandTable, Parameter, TableFull,
        join_parameters,
    },
    device_cache::DeviceName,
    pairing::{BondingType, IoCapability},
    session::{Session, gap::service_uuid},
    stack::{
        ConnectabilityMode, DebugConfig, DebugMode, DiscoverabilityMode, OperatorName,
        PairabilityMode, Role, Stack,
    },
};

/// Highest RFCOMM server channel
const MAX_RFCOMM_CHANNEL: u32 = 30;

/// An operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Verb {
    // GAP
    Inquiry,
    DisplayInquiryList,
    Pair,
    UnPair,
    EndPairing,
    PinCodeResponse,
    PasskeyResponse,
    UserConfirmationResponse,
    SetDiscoverabilityMode,
    SetConnectabilityMode,
    SetPairabilityMode,
    ChangeSimplePairingParameters,
    GetLocalAddress,
    SetLocalName,
    GetLocalName,
    SetClassOfDevice,
    GetClassOfDevice,
    GetRemoteName,
    ServiceDiscovery,
    ClearSavedLinkKey,
    SetAuthenticationMode,
    EnableDebug,
    // audio and shared signalling
    Audio,
    SetScoTransport,
    SetScoDataFormat,
    SetScoTestMode,
    SelectCodec,
    VoiceRecognition,
    SetSpeakerGain,
    SetMicrophoneGain,
    DisplayCallList,
    // ports
    OpenServer,
    CloseServer,
    OpenClient,
    CloseClient,
    // Audio Gateway
    UpdateControlIndicators,
    DisplayControlIndicators,
    CallWaitingNotification,
    CallerIdNotification,
    RingIndication,
    InBandRingTone,
    VoiceTagResponse,
    SendOperatorSelection,
    SendSubscriberNumber,
    SendIncomingCallState,
    SendCallListEntry,
    SendExtendedError,
    // Hands-Free
    QueryControlIndicators,
    DisplayNotifications,
    EnableIndicatorNotification,
    EnableCallWaiting,
    EnableCallerId,
    Dial,
    MemoryDial,
    Redial,
    Answer,
    HangUp,
    Dtmf,
    CallHoldSelection,
    RequestVoiceTag,
    QueryCurrentCalls,
    SetOperatorFormat,
    QueryOperator,
    EnableExtendedErrors,
    QuerySubscriberNumber,
    QueryResponseHold,
    SetIncomingCallState,
}

/// Verbs available in both roles
pub static COMMON: &[(&str, Verb)] = &[
    ("Inquiry", Verb::Inquiry),
    ("DisplayInquiryList", Verb::DisplayInquiryList),
    ("Pair", Verb::Pair),
    ("UnPair", Verb::UnPair),
    ("EndPairing", Verb::EndPairing),
    ("PINCodeResponse", Verb::PinCodeResponse),
    ("PassKeyResponse", Verb::PasskeyResponse),
    ("UserConfirmationResponse", Verb::UserConfirmationResponse),
    ("SetDiscoverabilityMode", Verb::SetDiscoverabilityMode),
    ("SetConnectabilityMode", Verb::SetConnectabilityMode),
    ("SetPairabilityMode", Verb::SetPairabilityMode),
    ("ChangeSimplePairingParameters", Verb::ChangeSimplePairingParameters),
    ("GetLocalAddress", Verb::GetLocalAddress),
    ("SetLocalName", Verb::SetLocalName),
    ("GetLocalName", Verb::GetLocalName),
    ("SetClassOfDevice", Verb::SetClassOfDevice),
    ("GetClassOfDevice", Verb::GetClassOfDevice),
    ("GetRemoteName", Verb::GetRemoteName),
    ("ServiceDiscovery", Verb::ServiceDiscovery),
    ("ClearSavedLinkKey", Verb::ClearSavedLinkKey),
    ("SetAuthenticationMode", Verb::SetAuthenticationMode),
    ("EnableDebug", Verb::EnableDebug),
    ("Audio", Verb::Audio),
    ("SetSCOTransport", Verb::SetScoTransport),
    ("SetSCODataFormat", Verb::SetScoDataFormat),
    ("SetSCOTestMode", Verb::SetScoTestMode),
    ("SelectCodec", Verb::SelectCodec),
    ("VoiceRecognitionActivation", Verb::VoiceRecognition),
    ("SetSpeakerGain", Verb::SetSpeakerGain),
    ("SetMicrophoneGain", Verb::SetMicrophoneGain),
    ("DisplayCallList", Verb::DisplayCallList),
];

/// Audio Gateway verbs
pub static AUDIO_GATEWAY: &[(&str, Verb)] = &[
    ("OpenAudioGatewayServer", Verb::OpenServer),
    ("CloseAudioGatewayServer", Verb::CloseServer),
    ("OpenHandsFreeClient", Verb::OpenClient),
    ("CloseHandsFreeClient", Verb::CloseClient),
    ("UpdateControlIndicators", Verb::UpdateControlIndicators),
    ("DisplayControlIndicators", Verb::DisplayControlIndicators),
    ("CallWaitingNotification", Verb::CallWaitingNotification),
    ("CallerIDNotification", Verb::CallerIdNotification),
    ("RingIndication", Verb::RingIndication),
    ("InBandRingToneSetting", Verb::InBandRingTone),
    ("VoiceTagResponse", Verb::VoiceTagResponse),
    ("SendOperatorSelection", Verb::SendOperatorSelection),
    ("SendSubscriberNumber", Verb::SendSubscriberNumber),
    ("SendIncomingCallState", Verb::SendIncomingCallState),
    ("SendCallListEntry", Verb::SendCallListEntry),
    ("SendExtendedError", Verb::SendExtendedError),
];

/// Hands-Free verbs
pub static HANDS_FREE: &[(&str, Verb)] = &[
    ("OpenHandsFreeServer", Verb::OpenServer),
    ("CloseHandsFreeServer", Verb::CloseServer),
    ("OpenAudioGatewayClient", Verb::OpenClient),
    ("CloseAudioGatewayClient", Verb::CloseClient),
    ("QueryControlIndicators", Verb::QueryControlIndicators),
    ("DisplayNotifications", Verb::DisplayNotifications),
    ("EnableIndicatorNotification", Verb::EnableIndicatorNotification),
    ("EnableCallWaitingNotification", Verb::EnableCallWaiting),
    ("EnableCallerIDNotification", Verb::EnableCallerId),
    ("DialPhoneNumber", Verb::Dial),
    ("DialPhoneNumberFromMemory", Verb::MemoryDial),
    ("RedialLastNumber", Verb::Redial),
    ("AnswerIncomingCall", Verb::Answer),
    ("HangUpCall", Verb::HangUp),
    ("TransmitDTMFCode", Verb::Dtmf),
    ("CallHoldMultipartySelection", Verb::CallHoldSelection),
    ("RequestVoiceTag", Verb::RequestVoiceTag),
    ("QueryCurrentCalls", Verb::QueryCurrentCalls),
    ("SetOperatorFormat", Verb::SetOperatorFormat),
    ("QueryOperator", Verb::QueryOperator),
    ("EnableExtendedErrors", Verb::EnableExtendedErrors),
    ("QuerySubscriberNumber", Verb::QuerySubscriberNumber),
    ("QueryResponseHold", Verb::QueryResponseHold),
    ("SetIncomingCallState", Verb::SetIncomingCallState),
];

/// Register the common verbs followed by the verbs of `role`
///
/// # Errors
/// `TableFull` when the table cannot take every verb.
pub fn register<S: Stack>(
    table: &mut CommandTable<'_, Session<S>>,
    role: Role,
) -> Result<(), TableFull> {
    let role_verbs = match role {
        Role::AudioGateway => AUDIO_GATEWAY,
        Role::HandsFree => HANDS_FREE,
    };
    for (name, verb) in COMMON.iter().chain(role_verbs) {
        table.register(*name, verb)?;
    }
    Ok(())
}

fn required(params: &[Parameter], position: usize) -> Result<&Parameter, CommandError> {
    params.get(position).ok_or(CommandError::InvalidParameters)
}

fn number(params: &[Parameter], position: usize) -> Result<u32, CommandError> {
    required(params, position)?
        .number()
        .ok_or(CommandError::InvalidParameters)
}

fn byte(params: &[Parameter], position: usize) -> Result<u8, CommandError> {
    u8::try_from(number(params, position)?).map_err(|_| CommandError::InvalidParameters)
}

fn flag(params: &[Parameter], position: usize) -> Result<bool, CommandError> {
    match number(params, position)? {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(CommandError::InvalidParameters),
    }
}

fn mapped<T>(
    params: &[Parameter],
    position: usize,
    map: impl FnOnce(u32) -> Option<T>,
) -> Result<T, CommandError> {
    map(number(params, position)?).ok_or(CommandError::InvalidParameters)
}

fn channel(params: &[Parameter], position: usize) -> Result<u8, CommandError> {
    mapped(params, position, |raw| {
        u8::try_from(raw)
            .ok()
            .filter(|_| (1..=MAX_RFCOMM_CHANNEL).contains(&raw))
    })
}

fn text(params: &[Parameter], position: usize) -> Result<&str, CommandError> {
    Ok(required(params, position)?.as_str())
}

impl Verb {
    /// Parameter synopsis shown when parameters are rejected
    #[must_use]
    pub const fn usage(&self) -> &'static str {
        match self {
            Self::Pair => "<inquiry index> [bonding type: 0 dedicated, 1 general]",
            Self::UnPair | Self::EndPairing | Self::GetRemoteName => "<inquiry index>",
            Self::PinCodeResponse => "<PIN code>",
            Self::PasskeyResponse => "<passkey, 0 to 999999>",
            Self::SetDiscoverabilityMode => "<0 non-discoverable, 1 limited, 2 general>",
            Self::SetConnectabilityMode => "<0 non-connectable, 1 connectable>",
            Self::SetPairabilityMode => "<0 non-pairable, 1 pairable, 2 pairable with SSP>",
            Self::ChangeSimplePairingParameters => {
                concat!(
                    "<IO capability: 0 display only, 1 display yes/no, 2 keyboard only, 3 none> ",
                    "<MITM 0|1>"
                )
            }
            Self::SetLocalName => "<name>",
            Self::SetClassOfDevice => "<class of device, e.g. 0x200408>",
            Self::ServiceDiscovery => {
                "<inquiry index> <profile: 0 SPP, 1 HS, 2 HS AG, 3 HF, 4 HF AG, 5 custom> [uuid]"
            }
            Self::EnableDebug => {
                "<0|1> <0 ASCII log, 1 terminal, 2 snoop> [file] [prefix stack ID 0|1]"
            }
            Self::SetScoTransport => "<0 codec, 1 HCI>",
            Self::SetScoDataFormat => "<0 8-bit, 1 16-bit>",
            Self::SetScoTestMode => "<0 none, 1 tone, 2 loopback>",
            Self::SelectCodec => "<1 CVSD, 2 mSBC>",
            Self::SetSpeakerGain | Self::SetMicrophoneGain => "<gain, 0 to 15>",
            Self::OpenServer => "<RFCOMM channel>",
            Self::OpenClient => "<inquiry index> <RFCOMM channel>",
            Self::UpdateControlIndicators => "<indicator index> <value>",
            Self::CallWaitingNotification
            | Self::CallerIdNotification
            | Self::VoiceTagResponse
            | Self::Dial => "<phone number>",
            Self::SendOperatorSelection => "<mode> <operator name>",
            Self::SendSubscriberNumber => "<phone number> <number type> <service>",
            Self::SendIncomingCallState | Self::SetIncomingCallState => {
                "<0 hold, 1 accept, 2 reject>"
            }
            Self::SendCallListEntry => {
                "[<dir> <status> <mode> <mpty> <number> <format> <final>]"
            }
            Self::SendExtendedError => "<error code>",
            Self::EnableIndicatorNotification => "<indicator index> <0|1>",
            Self::MemoryDial => "<memory location>",
            Self::Dtmf => "<0-9, *, #, A-D>",
            Self::CallHoldSelection => "<0..4> [call index]",
            Self::UserConfirmationResponse
            | Self::SetAuthenticationMode
            | Self::Audio
            | Self::VoiceRecognition
            | Self::InBandRingTone
            | Self::EnableCallWaiting
            | Self::EnableCallerId
            | Self::EnableExtendedErrors => "<0|1>",
            _ => "",
        }
    }

    fn run<S: Stack>(self, session: &mut Session<S>, params: &[Parameter]) -> CommandResult {
        match self {
            Self::Inquiry => session.inquiry(),
            Self::DisplayInquiryList => {
                session.display_inquiry_list();
                Ok(())
            }
            Self::Pair => {
                let index = number(params, 0)?;
                let bonding_type = match params.get(1).map(Parameter::number) {
                    None | Some(Some(0)) => BondingType::Dedicated,
                    Some(Some(1)) => BondingType::General,
                    Some(_) => return Err(CommandError::InvalidParameters),
                };
                session.pair(index, bonding_type)
            }
            Self::UnPair => session.unpair(number(params, 0)?),
            Self::EndPairing => session.end_pairing(number(params, 0)?),
            Self::PinCodeResponse => session.pin_code_response(text(params, 0)?),
            Self::PasskeyResponse => session.passkey_response(number(params, 0)?),
            Self::UserConfirmationResponse => session.user_confirmation_response(flag(params, 0)?),
            Self::SetDiscoverabilityMode => {
                session.set_discoverability(mapped(params, 0, DiscoverabilityMode::from_raw)?)
            }
            Self::SetConnectabilityMode => {
                session.set_connectability(mapped(params, 0, ConnectabilityMode::from_raw)?)
            }
            Self::SetPairabilityMode => {
                session.set_pairability(mapped(params, 0, PairabilityMode::from_raw)?)
            }
            Self::ChangeSimplePairingParameters => {
                let io_capability = mapped(params, 0, IoCapability::from_raw)?;
                session.change_simple_pairing_parameters(io_capability, flag(params, 1)?)
            }
            Self::GetLocalAddress => session.local_address().map(drop),
            Self::SetLocalName => {
                let name: DeviceName =
                    join_parameters(params).ok_or(CommandError::InvalidParameters)?;
                if name.is_empty() {
                    return Err(CommandError::InvalidParameters);
                }
                session.set_local_name(&name)
            }
            Self::GetLocalName => session.local_name().map(drop),
            Self::SetClassOfDevice => {
                let raw = number(params, 0)?;
                if raw > 0x00FF_FFFF {
                    return Err(CommandError::InvalidParameters);
                }
                session.set_class_of_device(ClassOfDevice::from_raw(raw))
            }
            Self::GetClassOfDevice => session.class_of_device().map(drop),
            Self::GetRemoteName => session.request_remote_name(number(params, 0)?),
            Self::ServiceDiscovery => {
                let index = number(params, 0)?;
                let custom = params.get(2).and_then(Parameter::number);
                let uuid = service_uuid(number(params, 1)?, custom)
                    .ok_or(CommandError::InvalidParameters)?;
                session.service_discovery(index, uuid)
            }
            Self::ClearSavedLinkKey => session.clear_saved_link_keys(),
            Self::SetAuthenticationMode => session.set_authentication_mode(flag(params, 0)?),
            Self::EnableDebug => {
                if !flag(params, 0)? {
                    return session.enable_debug(None);
                }
                let mode = mapped(params, 1, DebugMode::from_raw)?;
                let target = params
                    .get(2)
                    .map_or(mode.default_target(), Parameter::as_str);
                let config = DebugConfig {
                    mode,
                    target: target
                        .try_into()
                        .map_err(|()| CommandError::InvalidParameters)?,
                    prefix_stack_id: params.len() > 3 && flag(params, 3)?,
                };
                session.enable_debug(Some(config))
            }
            Self::Audio => session.audio_connection(flag(params, 0)?),
            Self::SetScoTransport => {
                session.set_sco_transport(mapped(params, 0, ScoTransport::from_raw)?)
            }
            Self::SetScoDataFormat => {
                session.set_sco_data_format(mapped(params, 0, DataFormat::from_raw)?)
            }
            Self::SetScoTestMode => {
                session.set_sco_test_mode(mapped(params, 0, TestMode::from_raw)?)
            }
            Self::SelectCodec => session.select_codec(mapped(params, 0, Codec::from_id)?),
            Self::VoiceRecognition => session.voice_recognition(flag(params, 0)?),
            Self::SetSpeakerGain => session.set_speaker_gain(number(params, 0)?),
            Self::SetMicrophoneGain => session.set_microphone_gain(number(params, 0)?),
            Self::DisplayCallList => {
                session.display_call_list();
                Ok(())
            }
            Self::OpenServer => session.open_server(channel(params, 0)?).map(drop),
            Self::CloseServer => session.close_server(),
            Self::OpenClient => {
                let index = number(params, 0)?;
                session.open_client(index, channel(params, 1)?).map(drop)
            }
            Self::CloseClient => session.close_client(),
            Self::UpdateControlIndicators => {
                session.update_control_indicator(number(params, 0)?, number(params, 1)?)
            }
            Self::DisplayControlIndicators => {
                session.display_control_indicators();
                Ok(())
            }
            Self::CallWaitingNotification => session.call_waiting_notification(text(params, 0)?),
            Self::CallerIdNotification => session.caller_id_notification(text(params, 0)?),
            Self::RingIndication => session.ring_indication(),
            Self::InBandRingTone => session.in_band_ring(flag(params, 0)?),
            Self::VoiceTagResponse => session.voice_tag_response(text(params, 0)?),
            Self::SendOperatorSelection => {
                let mode = byte(params, 0)?;
                let name: OperatorName = params
                    .get(1..)
                    .filter(|rest| !rest.is_empty())
                    .and_then(|rest| join_parameters(rest))
                    .ok_or(CommandError::InvalidParameters)?;
                session.send_operator_selection(mode, &name)
            }
            Self::SendSubscriberNumber => session.send_subscriber_number(
                text(params, 0)?,
                byte(params, 1)?,
                byte(params, 2)?,
            ),
            Self::SendIncomingCallState => {
                session.send_incoming_call_state(mapped(params, 0, ResponseHoldState::from_raw)?)
            }
            Self::SendCallListEntry => {
                if params.is_empty() {
                    return session.begin_call_list_authoring();
                }
                let (entry, final_entry) = CallListEntry::from_parameters(params)?;
                session.send_call_list_entry(entry, final_entry)
            }
            Self::SendExtendedError => session.send_extended_error(byte(params, 0)?),
            Self::QueryControlIndicators => session.query_control_indicators(),
            Self::DisplayNotifications => {
                session.display_notifications();
                Ok(())
            }
            Self::EnableIndicatorNotification => {
                session.enable_indicator_notification(number(params, 0)?, flag(params, 1)?)
            }
            Self::EnableCallWaiting => session.enable_call_waiting(flag(params, 0)?),
            Self::EnableCallerId => session.enable_caller_id(flag(params, 0)?),
            Self::Dial => session.dial(text(params, 0)?),
            Self::MemoryDial => session.memory_dial(number(params, 0)?),
            Self::Redial => session.redial(),
            Self::Answer => session.answer(),
            Self::HangUp => session.hang_up(),
            Self::Dtmf => {
                let mut chars = text(params, 0)?.chars();
                let (Some(code), None) = (chars.next(), chars.next()) else {
                    return Err(CommandError::InvalidParameters);
                };
                session.dtmf(code.to_ascii_uppercase())
            }
            Self::CallHoldSelection => {
                let action = byte(params, 0)?;
                let index = match params.get(1) {
                    Some(param) => Some(param.number().ok_or(CommandError::InvalidParameters)?),
                    None => None,
                };
                session.call_hold_selection(action, index)
            }
            Self::RequestVoiceTag => session.request_voice_tag(),
            Self::QueryCurrentCalls => session.query_current_calls(),
            Self::SetOperatorFormat => session.set_operator_format(),
            Self::QueryOperator => session.query_operator(),
            Self::EnableExtendedErrors => session.enable_extended_errors(flag(params, 0)?),
            Self::QuerySubscriberNumber => session.query_subscriber_number(),
            Self::QueryResponseHold => session.query_response_hold(),
            Self::SetIncomingCallState => {
                session.set_incoming_call_state(mapped(params, 0, ResponseHoldState::from_raw)?)
            }
        }
    }
}

impl<S: Stack> CommandHandler<Session<S>> for Verb {
    fn execute(&self, session: &mut Session<S>, params: &[Parameter]) -> CommandResult {
        session.require_stack()?;
        let result = self.run(session, params);
        if result == Err(CommandError::InvalidParameters) && !self.usage().is_empty() {
            warn!("[COMMAND] Usage: {}", self.usage());
        }
        result
    }
}
