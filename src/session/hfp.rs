//! Profile ports, indicators, calls and audio

use super::{Session, stack_failure};
use crate::{
    audio::{Codec, DataFormat, ScoTransport, TestMode},
    call::{
        CALL_LIST_SAMPLE, CALL_LIST_USAGE, CallListEntry, CallState, PhoneNumber,
        ResponseHoldState,
    },
    command::{CommandError, CommandResult, parse_parameters},
    constants::MAX_GAIN,
    indicator::IndicatorKind,
    port::PortError,
    stack::{HfpRequest, OperatorName, PortId, Role, Stack},
};

fn phone_number(number: &str) -> Result<PhoneNumber, CommandError> {
    if number.is_empty() {
        return Err(CommandError::InvalidParameters);
    }
    PhoneNumber::try_from(number).map_err(|()| {
        warn!("[HFP] Phone number too long");
        CommandError::InvalidParameters
    })
}

fn gain(value: u32) -> Result<u8, CommandError> {
    u8::try_from(value)
        .ok()
        .filter(|gain| *gain <= MAX_GAIN)
        .ok_or(CommandError::InvalidParameters)
}

/// DTMF digits accepted by `TransmitDTMFCode`
#[must_use]
pub fn is_dtmf(code: char) -> bool {
    matches!(code, '0'..='9' | '*' | '#' | 'A'..='D')
}

impl<S: Stack> Session<S> {
    pub(super) fn drop_connection_state(&mut self) {
        self.audio.force_disconnected();
        self.calls.reset();
    }

    /// Open and advertise the server port for this role
    ///
    /// # Errors
    /// `FunctionError` when a port is already open or connected, or when the
    /// stack refuses the port or its SDP record.
    pub fn open_server(&mut self, channel: u8) -> Result<PortId, CommandError> {
        self.require_stack()?;
        let port = self
            .ports
            .open_server(
                &mut self.stack,
                self.options.role,
                channel,
                self.options.service_name,
            )
            .map_err(|e| {
                warn!("[HFP] Server port not opened: {:?}", e);
                CommandError::from(e)
            })?;
        Ok(port)
    }

    /// Close the server port
    ///
    /// Audio is torn down and the call state forgotten.
    ///
    /// # Errors
    /// `FunctionError` without a server port or when the stack refuses.
    pub fn close_server(&mut self) -> CommandResult {
        self.require_stack()?;
        let result = self.ports.close_server(&mut self.stack);
        // the handle is released even when the stack refuses the close
        if result != Err(PortError::NotOpen) {
            self.drop_connection_state();
        }
        result.map_err(|e| {
            warn!("[HFP] Server port close: {:?}", e);
            CommandError::from(e)
        })
    }

    /// Connect to the peer role's server on an inquired device
    ///
    /// # Errors
    /// `InvalidParameters` for an unknown index, `FunctionError` when a port is
    /// already open or connected, or when the stack refuses.
    pub fn open_client(&mut self, index: u32, channel: u8) -> Result<PortId, CommandError> {
        self.require_stack()?;
        let addr = self.device(index)?;
        let port = self
            .ports
            .open_client(&mut self.stack, self.options.role, addr, channel)
            .map_err(|e| {
                warn!("[HFP] Client port not opened: {:?}", e);
                CommandError::from(e)
            })?;
        info!("[HFP] Connecting port {} to {}", port, addr.format_hex().as_str());
        Ok(port)
    }

    /// Close the client port
    ///
    /// # Errors
    /// `FunctionError` without a client port or when the stack refuses.
    pub fn close_client(&mut self) -> CommandResult {
        self.require_stack()?;
        let result = self.ports.close_client(&mut self.stack);
        // the handle is released even when the stack refuses the close
        if result != Err(PortError::NotOpen) {
            self.drop_connection_state();
        }
        result.map_err(|e| {
            warn!("[HFP] Client port close: {:?}", e);
            CommandError::from(e)
        })
    }

    // Audio Gateway

    /// Change one control indicator and report it to a connected HF
    ///
    /// # Errors
    /// `InvalidParameters` for an unknown index or a value outside the
    /// indicator's domain; the table is listed as guidance.
    pub fn update_control_indicator(&mut self, index: u32, value: u32) -> CommandResult {
        self.require_stack()?;
        self.require_role(Role::AudioGateway)?;
        let updated = match self.indicators.update(index, value) {
            Ok(indicator) => indicator.value,
            Err(e) => {
                warn!("[HFP] Indicator {} cannot take {}", index, value);
                self.display_control_indicators();
                return Err(e.into());
            }
        };
        if self.ports.service_level() {
            // index is at most INDICATOR_COUNT once accepted
            let index = u8::try_from(index).map_err(|_| CommandError::InvalidParameters)?;
            self.send(&HfpRequest::IndicatorUpdate {
                index,
                value: updated,
            })?;
        }
        Ok(())
    }

    /// Log the control indicator table
    pub fn display_control_indicators(&self) {
        for (i, indicator) in self.indicators.iter().enumerate() {
            match indicator.kind {
                IndicatorKind::Boolean => info!(
                    "[HFP] {}: {} (0-1) = {}",
                    i + 1,
                    indicator.name,
                    indicator.value
                ),
                IndicatorKind::Range { low, high } => info!(
                    "[HFP] {}: {} ({}-{}) = {}",
                    i + 1,
                    indicator.name,
                    low,
                    high,
                    indicator.value
                ),
            }
        }
    }

    /// Notify a waiting call
    ///
    /// # Errors
    /// `InvalidParameters` for a bad number, `FunctionError` without a
    /// connection.
    pub fn call_waiting_notification(&mut self, number: &str) -> CommandResult {
        self.require_role(Role::AudioGateway)?;
        let number = phone_number(number)?;
        self.send(&HfpRequest::CallWaitingNotification(number))
    }

    /// Send the calling line identification
    ///
    /// # Errors
    /// `InvalidParameters` for a bad number, `FunctionError` without a
    /// connection.
    pub fn caller_id_notification(&mut self, number: &str) -> CommandResult {
        self.require_role(Role::AudioGateway)?;
        let number = phone_number(number)?;
        self.send(&HfpRequest::CallerIdNotification(number))
    }

    /// Alert the HF of an incoming call
    ///
    /// # Errors
    /// `FunctionError` without a connection.
    pub fn ring_indication(&mut self) -> CommandResult {
        self.require_role(Role::AudioGateway)?;
        self.send(&HfpRequest::RingIndication)?;
        self.calls.set_state(CallState::Incoming);
        Ok(())
    }

    /// Turn the in-band ring tone on or off
    ///
    /// # Errors
    /// `FunctionError` without a connection.
    pub fn in_band_ring(&mut self, enabled: bool) -> CommandResult {
        self.require_role(Role::AudioGateway)?;
        self.send(&HfpRequest::InBandRingTone(enabled))
    }

    /// Answer a voice tag request with a number
    ///
    /// # Errors
    /// `InvalidParameters` for a bad number, `FunctionError` without a
    /// connection.
    pub fn voice_tag_response(&mut self, number: &str) -> CommandResult {
        self.require_role(Role::AudioGateway)?;
        let number = phone_number(number)?;
        self.send(&HfpRequest::VoiceTagResponse(number))
    }

    /// Send the network operator
    ///
    /// # Errors
    /// `InvalidParameters` for a name over 16 bytes, `FunctionError` without a
    /// connection.
    pub fn send_operator_selection(&mut self, mode: u8, name: &str) -> CommandResult {
        self.require_role(Role::AudioGateway)?;
        let name = OperatorName::try_from(name).map_err(|()| CommandError::InvalidParameters)?;
        self.send(&HfpRequest::OperatorSelection { mode, name })
    }

    /// Send the subscriber number
    ///
    /// # Errors
    /// `InvalidParameters` for a bad number, `FunctionError` without a
    /// connection.
    pub fn send_subscriber_number(
        &mut self,
        number: &str,
        number_type: u8,
        service: u8,
    ) -> CommandResult {
        self.require_role(Role::AudioGateway)?;
        let number = phone_number(number)?;
        self.send(&HfpRequest::SubscriberNumber {
            number,
            number_type,
            service,
        })
    }

    /// Send the response and hold state
    ///
    /// # Errors
    /// `FunctionError` without a connection.
    pub fn send_incoming_call_state(&mut self, state: ResponseHoldState) -> CommandResult {
        self.require_role(Role::AudioGateway)?;
        self.send(&HfpRequest::ResponseHoldState(state))?;
        self.calls.set_response_hold(state);
        Ok(())
    }

    /// Send an extended error result code
    ///
    /// # Errors
    /// `FunctionError` without a connection.
    pub fn send_extended_error(&mut self, code: u8) -> CommandResult {
        self.require_role(Role::AudioGateway)?;
        self.send(&HfpRequest::ExtendedErrorResult(code))
    }

    /// Send one current-calls entry
    ///
    /// The entry gets the next call index. A transport failure abandons the
    /// list and ends interactive authoring; a final entry also ends it.
    ///
    /// # Errors
    /// `FunctionError` without a connection or when the stack refuses.
    pub fn send_call_list_entry(
        &mut self,
        entry: CallListEntry,
        final_entry: bool,
    ) -> CommandResult {
        self.require_role(Role::AudioGateway)?;
        let port = self.require_port()?;
        let entry = self.calls.prepare_entry(entry, final_entry);
        let request = HfpRequest::CurrentCallsEntry { entry, final_entry };
        if let Err(e) = self.stack.send(port, &request) {
            self.calls.abort_list();
            return Err(stack_failure("Call list entry", e));
        }
        if final_entry {
            self.calls.set_authoring(false);
        }
        Ok(())
    }

    /// Start reading call list entries from operator lines
    ///
    /// # Errors
    /// `FunctionError` without a connection.
    pub fn begin_call_list_authoring(&mut self) -> CommandResult {
        self.require_role(Role::AudioGateway)?;
        self.require_port()?;
        self.calls.set_authoring(true);
        info!("[HFP] Enter call list entries: {}", CALL_LIST_USAGE);
        info!("[HFP] Example: {}", CALL_LIST_SAMPLE);
        Ok(())
    }

    /// Take one operator line as a call list entry
    ///
    /// A malformed line is rejected and authoring goes on.
    ///
    /// # Errors
    /// `InvalidParameters` for a malformed line, otherwise as
    /// [`send_call_list_entry`](Self::send_call_list_entry).
    pub fn submit_call_list_line(&mut self, line: &str) -> CommandResult {
        let parsed = parse_parameters(line).and_then(|params| {
            CallListEntry::from_parameters(&params).map_err(CommandError::from)
        });
        let (entry, final_entry) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("[HFP] Usage: {}", CALL_LIST_USAGE);
                warn!("[HFP] Example: {}", CALL_LIST_SAMPLE);
                return Err(e);
            }
        };
        self.send_call_list_entry(entry, final_entry)
    }

    // Hands-Free

    /// Ask the AG for its indicator values
    ///
    /// # Errors
    /// `FunctionError` without a connection.
    pub fn query_control_indicators(&mut self) -> CommandResult {
        self.require_role(Role::HandsFree)?;
        self.send(&HfpRequest::QueryIndicators)
    }

    /// Log the indicators announced by the AG
    pub fn display_notifications(&self) {
        for (i, entry) in self.notifications.iter().enumerate() {
            let state = if entry.enabled { "enabled" } else { "disabled" };
            match entry.value {
                Some(value) => info!(
                    "[HFP] {}: {} {} = {}",
                    i + 1,
                    entry.name.as_str(),
                    state,
                    value
                ),
                None => info!("[HFP] {}: {} {}", i + 1, entry.name.as_str(), state),
            }
        }
    }

    /// Enable or disable updates of one announced indicator
    ///
    /// # Errors
    /// `FunctionError` without a connection, `InvalidParameters` for an index
    /// outside the announced list.
    pub fn enable_indicator_notification(&mut self, index: u32, enabled: bool) -> CommandResult {
        self.require_role(Role::HandsFree)?;
        self.require_port()?;
        self.notifications.toggle(index, enabled)?;
        let mask = self.notifications.activation_mask();
        self.send(&HfpRequest::IndicatorActivation(mask))
    }

    /// Enable or disable call waiting notification
    ///
    /// # Errors
    /// `FunctionError` without a connection.
    pub fn enable_call_waiting(&mut self, enabled: bool) -> CommandResult {
        self.require_role(Role::HandsFree)?;
        self.send(&HfpRequest::EnableCallWaiting(enabled))
    }

    /// Enable or disable calling line identification
    ///
    /// # Errors
    /// `FunctionError` without a connection.
    pub fn enable_caller_id(&mut self, enabled: bool) -> CommandResult {
        self.require_role(Role::HandsFree)?;
        self.send(&HfpRequest::EnableCallerId(enabled))
    }

    /// Dial a number
    ///
    /// # Errors
    /// `InvalidParameters` for a bad number, `FunctionError` without a
    /// connection.
    pub fn dial(&mut self, number: &str) -> CommandResult {
        self.require_role(Role::HandsFree)?;
        let number = phone_number(number)?;
        self.send(&HfpRequest::Dial(number))?;
        self.calls.set_state(CallState::Outgoing);
        Ok(())
    }

    /// Dial a memory location
    ///
    /// # Errors
    /// `FunctionError` without a connection.
    pub fn memory_dial(&mut self, location: u32) -> CommandResult {
        self.require_role(Role::HandsFree)?;
        self.send(&HfpRequest::MemoryDial(location))?;
        self.calls.set_state(CallState::Outgoing);
        Ok(())
    }

    /// Redial the last number
    ///
    /// # Errors
    /// `FunctionError` without a connection.
    pub fn redial(&mut self) -> CommandResult {
        self.require_role(Role::HandsFree)?;
        self.send(&HfpRequest::Redial)?;
        self.calls.set_state(CallState::Outgoing);
        Ok(())
    }

    /// Answer the incoming call
    ///
    /// # Errors
    /// `FunctionError` without a connection.
    pub fn answer(&mut self) -> CommandResult {
        self.require_role(Role::HandsFree)?;
        self.send(&HfpRequest::Answer)?;
        self.calls.set_state(CallState::Active);
        Ok(())
    }

    /// Hang up
    ///
    /// # Errors
    /// `FunctionError` without a connection.
    pub fn hang_up(&mut self) -> CommandResult {
        self.require_role(Role::HandsFree)?;
        self.send(&HfpRequest::HangUp)?;
        self.calls.set_state(CallState::Idle);
        Ok(())
    }

    /// Send a DTMF digit
    ///
    /// # Errors
    /// `InvalidParameters` for anything but 0-9, `*`, `#` and A-D,
    /// `FunctionError` without a connection.
    pub fn dtmf(&mut self, code: char) -> CommandResult {
        self.require_role(Role::HandsFree)?;
        if !is_dtmf(code) {
            return Err(CommandError::InvalidParameters);
        }
        self.send(&HfpRequest::Dtmf(code))
    }

    /// Call hold and multiparty handling
    ///
    /// Actions 1 and 2 may name a call index.
    ///
    /// # Errors
    /// `InvalidParameters` for an action above 4 or an index on another
    /// action, `FunctionError` without a connection.
    pub fn call_hold_selection(&mut self, action: u8, index: Option<u32>) -> CommandResult {
        self.require_role(Role::HandsFree)?;
        let indexed = matches!(action, 1 | 2);
        if action > 4 || (index.is_some() && !indexed) {
            return Err(CommandError::InvalidParameters);
        }
        self.send(&HfpRequest::CallHoldSelection { action, index })
    }

    /// Ask the AG for a number to attach to a voice tag
    ///
    /// # Errors
    /// `FunctionError` without a connection.
    pub fn request_voice_tag(&mut self) -> CommandResult {
        self.require_role(Role::HandsFree)?;
        self.send(&HfpRequest::VoiceTagRequest)
    }

    /// Ask the AG for the current calls list
    ///
    /// # Errors
    /// `FunctionError` without a connection.
    pub fn query_current_calls(&mut self) -> CommandResult {
        self.require_role(Role::HandsFree)?;
        self.send(&HfpRequest::QueryCurrentCalls)?;
        self.calls.clear_entries();
        Ok(())
    }

    /// Select the alphanumeric operator name format
    ///
    /// # Errors
    /// `FunctionError` without a connection.
    pub fn set_operator_format(&mut self) -> CommandResult {
        self.require_role(Role::HandsFree)?;
        self.send(&HfpRequest::SetOperatorFormat)
    }

    /// Ask the AG for the network operator
    ///
    /// # Errors
    /// `FunctionError` without a connection.
    pub fn query_operator(&mut self) -> CommandResult {
        self.require_role(Role::HandsFree)?;
        self.send(&HfpRequest::QueryOperator)
    }

    /// Enable or disable extended error result codes
    ///
    /// # Errors
    /// `FunctionError` without a connection.
    pub fn enable_extended_errors(&mut self, enabled: bool) -> CommandResult {
        self.require_role(Role::HandsFree)?;
        self.send(&HfpRequest::EnableExtendedErrors(enabled))
    }

    /// Ask the AG for the subscriber number
    ///
    /// # Errors
    /// `FunctionError` without a connection.
    pub fn query_subscriber_number(&mut self) -> CommandResult {
        self.require_role(Role::HandsFree)?;
        self.send(&HfpRequest::QuerySubscriberNumber)
    }

    /// Ask the AG for the response and hold state
    ///
    /// # Errors
    /// `FunctionError` without a connection.
    pub fn query_response_hold(&mut self) -> CommandResult {
        self.require_role(Role::HandsFree)?;
        self.send(&HfpRequest::QueryResponseHold)
    }

    /// Put the incoming call on hold, accept it or reject it
    ///
    /// # Errors
    /// `FunctionError` without a connection.
    pub fn set_incoming_call_state(&mut self, state: ResponseHoldState) -> CommandResult {
        self.require_role(Role::HandsFree)?;
        self.send(&HfpRequest::SetResponseHold(state))
    }

    // Both roles

    /// Activate or deactivate voice recognition
    ///
    /// # Errors
    /// `FunctionError` without a connection.
    pub fn voice_recognition(&mut self, active: bool) -> CommandResult {
        self.send(&HfpRequest::VoiceRecognition(active))
    }

    /// Report or set the speaker gain (0 to 15)
    ///
    /// # Errors
    /// `InvalidParameters` above 15, `FunctionError` without a connection.
    pub fn set_speaker_gain(&mut self, value: u32) -> CommandResult {
        let value = gain(value)?;
        self.send(&HfpRequest::SpeakerGain(value))
    }

    /// Report or set the microphone gain (0 to 15)
    ///
    /// # Errors
    /// `InvalidParameters` above 15, `FunctionError` without a connection.
    pub fn set_microphone_gain(&mut self, value: u32) -> CommandResult {
        let value = gain(value)?;
        self.send(&HfpRequest::MicrophoneGain(value))
    }

    /// Log the last current-calls list
    pub fn display_call_list(&self) {
        info!("[HFP] Call list: {} entries", self.calls.entries().len());
        for entry in self.calls.entries() {
            info!(
                "[HFP] {}: {:?} {:?} {:?} mpty {} {} ({})",
                entry.index,
                entry.direction,
                entry.status,
                entry.mode,
                entry.multiparty,
                entry.number.as_str(),
                entry.format
            );
        }
    }

    /// Set up or release the audio connection
    ///
    /// # Errors
    /// `FunctionError` without a connection, when audio is already in the
    /// requested state or when the stack refuses.
    pub fn audio_connection(&mut self, connect: bool) -> CommandResult {
        let port = self.require_port()?;
        let result = if connect {
            self.audio.connect(&mut self.stack, port)
        } else {
            self.audio.disconnect(&mut self.stack, port)
        };
        result.map_err(|e| {
            warn!("[AUDIO] Request failed: {:?}", e);
            CommandError::from(e)
        })
    }

    /// Route audio over the codec interface or HCI
    ///
    /// # Errors
    /// `FunctionError` unless audio is disconnected.
    pub fn set_sco_transport(&mut self, transport: ScoTransport) -> CommandResult {
        self.require_stack()?;
        Ok(self.audio.set_transport(transport)?)
    }

    /// Sample width of audio data
    ///
    /// # Errors
    /// `FunctionError` unless audio is disconnected.
    pub fn set_sco_data_format(&mut self, format: DataFormat) -> CommandResult {
        self.require_stack()?;
        Ok(self.audio.set_data_format(format)?)
    }

    /// Answer received audio with silence, a tone or the same data
    ///
    /// # Errors
    /// `InvalidStackId` when closed.
    pub fn set_sco_test_mode(&mut self, mode: TestMode) -> CommandResult {
        self.require_stack()?;
        self.audio.set_test_mode(mode);
        Ok(())
    }

    /// Choose the speech codec
    ///
    /// The AG sends its selection right away. The HF records its preference
    /// and asks the AG to start negotiation once the service level connection
    /// is up.
    ///
    /// # Errors
    /// `InvalidParameters` when mSBC is not supported by both sides,
    /// `FunctionError` when the AG has no connection.
    pub fn select_codec(&mut self, codec: Codec) -> CommandResult {
        self.require_stack()?;
        match self.options.role {
            Role::AudioGateway => {
                self.require_port()?;
                self.audio.select_codec(codec)?;
                self.send(&HfpRequest::CodecSelection(codec))?;
                self.audio.mark_requested();
                Ok(())
            }
            Role::HandsFree => {
                self.audio.select_codec(codec)?;
                if self.ports.service_level() {
                    self.send(&HfpRequest::CodecConnectionRequest)?;
                    self.audio.mark_requested();
                }
                Ok(())
            }
        }
    }
}
