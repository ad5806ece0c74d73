//! Transport event handling
//!
//! Every event from the lower stack lands in [`Session::handle_event`]. Events
//! never block and never wait for the operator; anything that needs an
//! operator decision is logged and left outstanding in the pairing context.

use super::Session;
use crate::{
    BluetoothAddress,
    audio::Codec,
    call::CallState,
    event::{AudioEvent, GapEvent, HfpEvent, PortEvent, TransportEvent},
    pairing::{AuthEvent, PairingAction, PairingState},
    stack::{HfpRequest, PortId, Role, Stack},
};

/// Call state implied by an AG indicator update, if any
fn implied_call_state(name: &str, value: u8, current: CallState) -> Option<CallState> {
    let call_setup =
        name.eq_ignore_ascii_case("callsetup") || name.eq_ignore_ascii_case("call_setup");
    if name.eq_ignore_ascii_case("call") {
        return Some(if value == 0 {
            CallState::Idle
        } else {
            CallState::Active
        });
    }
    if !call_setup {
        return None;
    }
    match value {
        0 if matches!(current, CallState::Incoming | CallState::Outgoing) => Some(CallState::Idle),
        1 => Some(CallState::Incoming),
        2 | 3 => Some(CallState::Outgoing),
        _ => None,
    }
}

impl<S: Stack> Session<S> {
    /// Apply one event from the lower stack
    pub fn handle_event(&mut self, event: TransportEvent) {
        trace!("[SESSION] Event {:?}", event);
        match event {
            TransportEvent::Gap(event) => self.handle_gap_event(event),
            TransportEvent::Authentication { addr, event } => {
                self.handle_authentication_event(addr, &event);
            }
            TransportEvent::Port { port, event } => self.handle_port_event(port, event),
            TransportEvent::Hfp { port, event } => self.handle_hfp_event(port, event),
            TransportEvent::Audio { port, event } => self.handle_audio_event(port, event),
        }
    }

    fn handle_gap_event(&mut self, event: GapEvent) {
        match event {
            GapEvent::InquiryResult {
                addr,
                class_of_device,
            } => match self.devices.insert(addr, class_of_device) {
                Some(slot) => info!("[GAP] {}: {}", slot + 1, addr.format_hex().as_str()),
                None => warn!(
                    "[GAP] Inquiry list full, {} dropped",
                    addr.format_hex().as_str()
                ),
            },
            GapEvent::InquiryComplete => {
                info!("[GAP] Inquiry complete, {} devices", self.devices.len());
            }
            GapEvent::RemoteName { addr, name } => match name {
                Some(name) => {
                    if !self.devices.set_name(&addr, &name) {
                        debug!("[GAP] Name for unlisted device {}", addr.format_hex().as_str());
                    }
                    info!("[GAP] {} is {}", addr.format_hex().as_str(), name.as_str());
                }
                None => warn!("[GAP] Remote name of {} unavailable", addr.format_hex().as_str()),
            },
            GapEvent::ServiceSearchResult {
                addr,
                status,
                records,
            } => {
                if status == 0 {
                    info!(
                        "[GAP] {} matching records on {}",
                        records,
                        addr.format_hex().as_str()
                    );
                } else {
                    warn!("[GAP] Service search failed, status {}", status);
                }
            }
        }
    }

    fn handle_authentication_event(&mut self, addr: BluetoothAddress, event: &AuthEvent) {
        match event {
            AuthEvent::LinkKeyCreated { key } => match self.link_keys.store(addr, *key) {
                Ok(outcome) => debug!("[PAIRING] Link key {:?}", outcome),
                Err(e) => warn!("[PAIRING] Link key not saved: {:?}", e),
            },
            AuthEvent::PasskeyNotification { passkey } => {
                info!("[PAIRING] Passkey {}", passkey);
            }
            AuthEvent::AuthenticationStatus { status } => {
                if *status == 0 {
                    info!("[PAIRING] Authenticated {}", addr.format_hex().as_str());
                } else {
                    warn!("[PAIRING] Authentication failed, status {}", status);
                }
            }
            _ => {}
        }

        match self.pairing.handle_event(addr, event, &self.link_keys) {
            PairingAction::Respond(response) => {
                if let Err(e) = self.stack.authentication_response(addr, &response) {
                    warn!("[PAIRING] Response rejected ({})", e.0);
                }
            }
            PairingAction::PromptOperator => match self.pairing.state() {
                PairingState::AwaitingPin => info!("[PAIRING] Respond with PINCodeResponse"),
                PairingState::AwaitingPasskey => info!("[PAIRING] Respond with PassKeyResponse"),
                PairingState::AwaitingUserConfirmation => {
                    if let AuthEvent::UserConfirmationRequest { value } = event {
                        info!("[PAIRING] Confirm {} with UserConfirmationResponse", value);
                    }
                }
                PairingState::Idle | PairingState::AwaitingIoCapability => {}
            },
            PairingAction::None => {}
        }
    }

    fn handle_port_event(&mut self, port: PortId, event: PortEvent) {
        match event {
            PortEvent::OpenRequest { addr } => {
                let accept = self.ports.accepts_incoming(port);
                info!(
                    "[HFP] Open request from {}, accept {}",
                    addr.format_hex().as_str(),
                    accept
                );
                if let Err(e) = self.stack.respond_open_request(port, accept) {
                    warn!("[HFP] Open response failed ({})", e.0);
                }
            }
            PortEvent::OpenIndication { addr } => {
                if self.ports.on_open_indication(port) {
                    info!("[HFP] {} connected on port {}", addr.format_hex().as_str(), port);
                }
            }
            PortEvent::OpenConfirmation { status } => {
                if self.ports.on_open_confirmation(port, status) {
                    info!("[HFP] Port {} connected", port);
                } else {
                    warn!("[HFP] Port {} connection failed, status {}", port, status);
                }
            }
            PortEvent::ServiceLevelConnected { wideband } => {
                if !self.ports.on_service_level(port) {
                    return;
                }
                if self.options.role == Role::AudioGateway {
                    self.indicators.reset();
                }
                self.audio.set_remote_wideband(wideband);
                info!("[HFP] Service level connection up on port {}", port);
            }
            PortEvent::CloseIndication => {
                if self.ports.on_close_indication(port).is_some() {
                    self.drop_connection_state();
                    info!("[HFP] Port {} closed by peer", port);
                }
            }
        }
    }

    fn confirm_codec(&mut self, port: PortId, codec: Codec) {
        let accepted = self.audio.confirm_codec(codec);
        if !accepted {
            warn!("[AUDIO] Codec {:?} rejected", codec);
        }
        if let Err(e) = self
            .stack
            .send(port, &HfpRequest::CodecConfirmation { codec, accepted })
        {
            warn!("[AUDIO] Codec confirmation failed ({})", e.0);
        }
    }

    fn handle_hfp_event(&mut self, port: PortId, event: HfpEvent) {
        if self.ports.connected_port() != Some(port) {
            debug!("[HFP] Event on inactive port {}", port);
            return;
        }
        match event {
            HfpEvent::Answer => self.calls.set_state(CallState::Active),
            HfpEvent::HangUp => self.calls.set_state(CallState::Idle),
            HfpEvent::Dial(number) => {
                info!("[HFP] Dial {}", number.as_str());
                self.calls.set_state(CallState::Outgoing);
            }
            HfpEvent::MemoryDial(location) => {
                info!("[HFP] Dial memory {}", location);
                self.calls.set_state(CallState::Outgoing);
            }
            HfpEvent::Redial => {
                info!("[HFP] Redial");
                self.calls.set_state(CallState::Outgoing);
            }
            HfpEvent::Dtmf(code) => info!("[HFP] DTMF {}", code),
            HfpEvent::CallHoldSelection { action, index } => match index {
                Some(index) => info!("[HFP] Call hold {} on call {}", action, index),
                None => info!("[HFP] Call hold {}", action),
            },
            HfpEvent::VoiceTagRequest => {
                info!("[HFP] Voice tag requested, reply with VoiceTagResponse");
            }
            HfpEvent::CurrentCallsQuery => {
                info!("[HFP] Current calls requested, reply with SendCallListEntry");
            }
            HfpEvent::OperatorQuery => {
                info!("[HFP] Operator requested, reply with SendOperatorSelection");
            }
            HfpEvent::SubscriberNumberQuery => {
                info!("[HFP] Subscriber number requested, reply with SendSubscriberNumber");
            }
            HfpEvent::ResponseHoldQuery => {
                info!("[HFP] Response and hold requested, reply with SendIncomingCallState");
            }
            HfpEvent::ResponseHoldSet(state) | HfpEvent::ResponseHoldState(state) => {
                info!("[HFP] Response and hold {:?}", state);
                self.calls.set_response_hold(state);
            }
            HfpEvent::CodecConfirmation(codec) | HfpEvent::CodecSelection(codec) => {
                self.confirm_codec(port, codec);
            }
            HfpEvent::CodecConnectionRequest => {
                let codec = self.audio.selected();
                match self.stack.send(port, &HfpRequest::CodecSelection(codec)) {
                    Ok(()) => self.audio.mark_requested(),
                    Err(e) => warn!("[AUDIO] Codec selection failed ({})", e.0),
                }
            }
            HfpEvent::ControlIndicatorStatus { name, kind, value } => {
                match self.notifications.register(&name) {
                    Ok(index) => {
                        self.notifications.set_value(index as u32, value).ok();
                        debug!("[HFP] Indicator {} is {} ({:?})", index, name.as_str(), kind);
                    }
                    Err(e) => warn!("[HFP] Indicator {} not registered: {:?}", name.as_str(), e),
                }
            }
            HfpEvent::IndicatorUpdate { index, value } => {
                let Ok(entry) = self.notifications.set_value(u32::from(index), value) else {
                    warn!("[HFP] Update for unknown indicator {}", index);
                    return;
                };
                info!("[HFP] {} = {}", entry.name.as_str(), value);
                let current = self.calls.state();
                if let Some(state) = implied_call_state(&entry.name, value, current) {
                    self.calls.set_state(state);
                }
            }
            HfpEvent::Ring => {
                info!("[HFP] RING");
                self.calls.set_state(CallState::Incoming);
            }
            HfpEvent::CallWaiting(number) => info!("[HFP] Call waiting {}", number.as_str()),
            HfpEvent::CallerId(number) => info!("[HFP] Caller {}", number.as_str()),
            HfpEvent::InBandRing(enabled) => info!("[HFP] In-band ring {}", enabled),
            HfpEvent::CurrentCallsEntry(entry) => self.calls.record_entry(entry),
            HfpEvent::OperatorInfo { mode, name } => {
                info!("[HFP] Operator {} (mode {})", name.as_str(), mode);
            }
            HfpEvent::SubscriberNumber {
                number,
                number_type,
                service,
            } => info!(
                "[HFP] Subscriber {} type {} service {}",
                number.as_str(),
                number_type,
                service
            ),
            HfpEvent::VoiceTag(number) => info!("[HFP] Voice tag {}", number.as_str()),
            HfpEvent::ExtendedErrorResult(code) => warn!("[HFP] Extended error {}", code),
            HfpEvent::VoiceRecognition(active) => info!("[HFP] Voice recognition {}", active),
            HfpEvent::SpeakerGain(gain) => info!("[HFP] Speaker gain {}", gain),
            HfpEvent::MicrophoneGain(gain) => info!("[HFP] Microphone gain {}", gain),
        }
    }

    fn handle_audio_event(&mut self, port: PortId, event: AudioEvent) {
        match event {
            AudioEvent::ConnectionRequest => {
                if self.ports.connected_port() == Some(port) {
                    self.audio.on_connection_request(&mut self.stack, port);
                } else {
                    warn!("[AUDIO] Connection request on inactive port {}", port);
                }
            }
            _ if self.ports.connected_port() != Some(port) => {
                debug!("[AUDIO] Event on inactive port {} ignored", port);
            }
            AudioEvent::Connected {
                status,
                frame_length,
            } => self.audio.on_connected(status, frame_length),
            AudioEvent::Disconnected => {
                self.audio.on_disconnected();
                info!("[AUDIO] Disconnected");
            }
            AudioEvent::Data(frame) => self.audio.on_data(&mut self.stack, port, &frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audio::{AudioState, DataFormat, TestMode, tone::{AudioFrame, TONE_8BIT}},
        command::CommandError,
        indicator::IndicatorKind,
        link_key::LinkKeyStore,
        pairing::{AuthResponse, IoCapability},
        session::{
            SessionOptions,
            testing::{MockStack, StackCall},
        },
    };

    const PEER: BluetoothAddress = BluetoothAddress::new([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);

    fn session(role: Role, io_capability: IoCapability) -> Session<MockStack> {
        let mut session = Session::new(
            MockStack::new(),
            SessionOptions {
                role,
                io_capability,
                ..SessionOptions::default()
            },
        );
        session.open().unwrap();
        session
    }

    fn authenticate(session: &mut Session<MockStack>, event: AuthEvent) {
        session.handle_event(TransportEvent::Authentication { addr: PEER, event });
    }

    fn port_event(session: &mut Session<MockStack>, port: PortId, event: PortEvent) {
        session.handle_event(TransportEvent::Port { port, event });
    }

    fn hfp_event(session: &mut Session<MockStack>, port: PortId, event: HfpEvent) {
        session.handle_event(TransportEvent::Hfp { port, event });
    }

    fn connected(role: Role) -> (Session<MockStack>, PortId) {
        let mut session = session(role, IoCapability::DisplayYesNo);
        let port = session.open_server(1).unwrap();
        port_event(&mut session, port, PortEvent::OpenIndication { addr: PEER });
        port_event(
            &mut session,
            port,
            PortEvent::ServiceLevelConnected { wideband: true },
        );
        (session, port)
    }

    #[test]
    fn test_just_works_answers_without_operator() {
        let mut session = session(Role::HandsFree, IoCapability::NoInputNoOutput);
        authenticate(
            &mut session,
            AuthEvent::UserConfirmationRequest { value: 123_456 },
        );

        assert_eq!(session.pairing().state(), PairingState::Idle);
        assert_eq!(
            session.stack().auth_responses(),
            [AuthResponse::UserConfirmation(true)]
        );
        assert_eq!(
            session.user_confirmation_response(true),
            Err(CommandError::FunctionError)
        );
    }

    #[test]
    fn test_numeric_comparison_waits_for_operator() {
        let mut session = session(Role::HandsFree, IoCapability::DisplayYesNo);
        authenticate(
            &mut session,
            AuthEvent::UserConfirmationRequest { value: 123_456 },
        );
        assert_eq!(
            session.pairing().state(),
            PairingState::AwaitingUserConfirmation
        );
        assert!(session.stack().auth_responses().is_empty());

        session.user_confirmation_response(false).unwrap();
        assert_eq!(
            session.stack().auth_responses(),
            [AuthResponse::UserConfirmation(false)]
        );
    }

    #[test]
    fn test_link_key_lifecycle() {
        let mut session = session(Role::HandsFree, IoCapability::DisplayYesNo);
        authenticate(&mut session, AuthEvent::LinkKeyRequest);
        authenticate(&mut session, AuthEvent::LinkKeyCreated { key: [9; 16] });
        authenticate(&mut session, AuthEvent::LinkKeyRequest);

        assert_eq!(
            session.stack().auth_responses(),
            [
                AuthResponse::LinkKey(None),
                AuthResponse::LinkKey(Some([9; 16]))
            ]
        );
    }

    #[test]
    fn test_full_link_key_table_does_not_fail_pairing() {
        let mut session = session(Role::HandsFree, IoCapability::DisplayYesNo);
        let capacity = LinkKeyStore::new().capacity();
        for last in 0..capacity {
            session.handle_event(TransportEvent::Authentication {
                addr: BluetoothAddress::new([9, 9, 9, 9, 9, last as u8 + 1]),
                event: AuthEvent::LinkKeyCreated { key: [1; 16] },
            });
        }
        authenticate(&mut session, AuthEvent::LinkKeyCreated { key: [2; 16] });
        authenticate(&mut session, AuthEvent::AuthenticationStatus { status: 0 });

        assert_eq!(session.link_keys().len(), capacity);
        assert!(!session.link_keys().contains(&PEER));
        assert_eq!(session.pairing().state(), PairingState::Idle);
    }

    #[test]
    fn test_oob_request_answered_negatively() {
        let mut session = session(Role::HandsFree, IoCapability::DisplayYesNo);
        authenticate(&mut session, AuthEvent::OobDataRequest);
        assert_eq!(
            session.stack().auth_responses(),
            [AuthResponse::OutOfBandData(None)]
        );
    }

    #[test]
    fn test_configured_oob_support_advertised() {
        let mut session = Session::new(
            MockStack::new(),
            SessionOptions {
                io_capability: IoCapability::DisplayYesNo,
                mitm_protection: false,
                oob_supported: true,
                ..SessionOptions::default()
            },
        );
        session.open().unwrap();
        authenticate(&mut session, AuthEvent::IoCapabilityRequest);
        assert_eq!(
            session.stack().auth_responses(),
            [AuthResponse::IoCapabilities {
                io_capability: IoCapability::DisplayYesNo,
                mitm_protection: false,
                oob_data_present: true,
            }]
        );
    }

    #[test]
    fn test_open_request_accepted_once() {
        let mut session = session(Role::AudioGateway, IoCapability::DisplayYesNo);
        let port = session.open_server(1).unwrap();

        port_event(&mut session, port, PortEvent::OpenRequest { addr: PEER });
        port_event(&mut session, port, PortEvent::OpenIndication { addr: PEER });
        port_event(&mut session, port, PortEvent::OpenRequest { addr: PEER });

        let responses: std::vec::Vec<bool> = session
            .stack()
            .calls
            .iter()
            .filter_map(|call| match call {
                StackCall::RespondOpenRequest(_, accept) => Some(*accept),
                _ => None,
            })
            .collect();
        assert_eq!(responses, [true, false]);
    }

    #[test]
    fn test_service_level_resets_indicators() {
        let mut session = session(Role::AudioGateway, IoCapability::DisplayYesNo);
        let port = session.open_server(1).unwrap();
        session.update_control_indicator(3, 2).unwrap();

        port_event(&mut session, port, PortEvent::OpenIndication { addr: PEER });
        assert_eq!(session.indicators().get(3).unwrap().value, 2);
        port_event(
            &mut session,
            port,
            PortEvent::ServiceLevelConnected { wideband: false },
        );
        assert_eq!(session.indicators().get(3).unwrap().value, 0);
        assert!(session.ports().service_level());
    }

    #[test]
    fn test_peer_close_releases_client_and_audio() {
        let mut session = session(Role::HandsFree, IoCapability::DisplayYesNo);
        session.handle_event(TransportEvent::Gap(GapEvent::InquiryResult {
            addr: PEER,
            class_of_device: None,
        }));
        let port = session.open_client(1, 3).unwrap();
        port_event(&mut session, port, PortEvent::OpenConfirmation { status: 0 });
        session.audio_connection(true).unwrap();
        assert_eq!(session.audio().state(), AudioState::Connecting);

        port_event(&mut session, port, PortEvent::CloseIndication);
        assert_eq!(session.ports().client_port(), None);
        assert_eq!(session.audio().state(), AudioState::Disconnected);
    }

    #[test]
    fn test_indicator_discovery_and_call_state() {
        let (mut session, port) = connected(Role::HandsFree);
        for (name, value) in [("service", 1), ("call", 0), ("callsetup", 0), ("CALL", 0)] {
            hfp_event(
                &mut session,
                port,
                HfpEvent::ControlIndicatorStatus {
                    name: name.try_into().unwrap(),
                    kind: IndicatorKind::Boolean,
                    value,
                },
            );
        }
        assert_eq!(session.notifications().len(), 3);

        hfp_event(&mut session, port, HfpEvent::IndicatorUpdate { index: 3, value: 1 });
        assert_eq!(session.calls().state(), CallState::Incoming);
        hfp_event(&mut session, port, HfpEvent::IndicatorUpdate { index: 2, value: 1 });
        assert_eq!(session.calls().state(), CallState::Active);
        hfp_event(&mut session, port, HfpEvent::IndicatorUpdate { index: 3, value: 0 });
        assert_eq!(session.calls().state(), CallState::Active);
        hfp_event(&mut session, port, HfpEvent::IndicatorUpdate { index: 2, value: 0 });
        assert_eq!(session.calls().state(), CallState::Idle);

        session.enable_indicator_notification(1, false).unwrap();
        assert_eq!(
            session.stack().sent().last(),
            Some(&HfpRequest::IndicatorActivation(
                [false, true, true].into_iter().collect()
            ))
        );
    }

    #[test]
    fn test_codec_confirmation() {
        let (mut session, port) = connected(Role::AudioGateway);
        session.select_codec(Codec::Msbc).unwrap();
        hfp_event(&mut session, port, HfpEvent::CodecConfirmation(Codec::Msbc));
        assert_eq!(session.audio().negotiated(), Some(Codec::Msbc));

        session.select_codec(Codec::Msbc).unwrap();
        hfp_event(&mut session, port, HfpEvent::CodecConfirmation(Codec::Cvsd));
        assert_eq!(session.audio().requested(), None);

        let confirmations: std::vec::Vec<HfpRequest> = session
            .stack()
            .sent()
            .into_iter()
            .filter(|request| matches!(request, HfpRequest::CodecConfirmation { .. }))
            .collect();
        assert_eq!(
            confirmations,
            [
                HfpRequest::CodecConfirmation {
                    codec: Codec::Msbc,
                    accepted: true
                },
                HfpRequest::CodecConfirmation {
                    codec: Codec::Cvsd,
                    accepted: false
                },
            ]
        );
    }

    #[test]
    fn test_hands_free_accepts_selected_codec() {
        let (mut session, port) = connected(Role::HandsFree);
        hfp_event(&mut session, port, HfpEvent::CodecSelection(Codec::Cvsd));
        assert_eq!(
            session.stack().sent(),
            [HfpRequest::CodecConfirmation {
                codec: Codec::Cvsd,
                accepted: true
            }]
        );
    }

    #[test]
    fn test_codec_connection_request() {
        let (mut session, port) = connected(Role::AudioGateway);
        hfp_event(&mut session, port, HfpEvent::CodecConnectionRequest);
        assert_eq!(
            session.stack().sent(),
            [HfpRequest::CodecSelection(Codec::Cvsd)]
        );
        assert_eq!(session.audio().requested(), Some(Codec::Cvsd));
    }

    #[test]
    fn test_late_audio_events_after_close_ignored() {
        let (mut session, port) = connected(Role::HandsFree);
        session.audio_connection(true).unwrap();
        session.close_server().unwrap();
        session.set_sco_test_mode(TestMode::Loopback).unwrap();

        session.handle_event(TransportEvent::Audio {
            port,
            event: AudioEvent::Connected {
                status: 0,
                frame_length: 60,
            },
        });
        session.handle_event(TransportEvent::Audio {
            port,
            event: AudioEvent::Data(AudioFrame::from_slice(&[1, 2, 3]).unwrap()),
        });

        assert_eq!(session.ports().server_port(), None);
        assert_eq!(session.audio().state(), AudioState::Disconnected);
        session.set_sco_data_format(DataFormat::Bits8).unwrap();
        assert!(
            !session
                .stack()
                .calls
                .iter()
                .any(|call| matches!(call, StackCall::SendAudioData(..)))
        );
    }

    #[test]
    fn test_audio_events_for_other_port_ignored() {
        let (mut session, port) = connected(Role::HandsFree);
        session.audio_connection(true).unwrap();
        session.handle_event(TransportEvent::Audio {
            port: port + 1,
            event: AudioEvent::Connected {
                status: 0,
                frame_length: 60,
            },
        });
        assert_eq!(session.audio().state(), AudioState::Connecting);

        session.handle_event(TransportEvent::Audio {
            port,
            event: AudioEvent::Connected {
                status: 0,
                frame_length: 60,
            },
        });
        session.handle_event(TransportEvent::Audio {
            port: port + 1,
            event: AudioEvent::Disconnected,
        });
        assert_eq!(session.audio().state(), AudioState::Connected);
    }

    #[test]
    fn test_tone_and_loopback() {
        let (mut session, port) = connected(Role::HandsFree);
        session.set_sco_data_format(DataFormat::Bits8).unwrap();
        session.set_sco_test_mode(TestMode::Tone).unwrap();
        session.audio_connection(true).unwrap();
        session.handle_event(TransportEvent::Audio {
            port,
            event: AudioEvent::Connected {
                status: 0,
                frame_length: 0,
            },
        });

        let inbound = AudioFrame::from_slice(&[0; 10]).unwrap();
        session.handle_event(TransportEvent::Audio {
            port,
            event: AudioEvent::Data(inbound.clone()),
        });
        session.set_sco_test_mode(TestMode::Loopback).unwrap();
        let echoed = AudioFrame::from_slice(&[1, 2, 3]).unwrap();
        session.handle_event(TransportEvent::Audio {
            port,
            event: AudioEvent::Data(echoed),
        });

        let frames: std::vec::Vec<std::vec::Vec<u8>> = session
            .stack()
            .calls
            .iter()
            .filter_map(|call| match call {
                StackCall::SendAudioData(_, data) => Some(data.clone()),
                _ => None,
            })
            .collect();
        let mut expected_tone = TONE_8BIT.to_vec();
        expected_tone.extend_from_slice(&TONE_8BIT[..2]);
        assert_eq!(frames, [expected_tone, std::vec![1, 2, 3]]);
    }

    #[test]
    fn test_implied_call_state() {
        assert_eq!(
            implied_call_state("call", 1, CallState::Idle),
            Some(CallState::Active)
        );
        assert_eq!(
            implied_call_state("call_setup", 3, CallState::Idle),
            Some(CallState::Outgoing)
        );
        assert_eq!(implied_call_state("signal", 3, CallState::Idle), None);
    }
}
