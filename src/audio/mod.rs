//! Audio connection manager
//!
//! Tracks the synchronous audio connection that rides next to the signalling
//! port, the codec negotiation between AG and HF, and the two test modes:
//! a generated 1 kHz tone and a loopback that echoes every received frame.
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> Disconnected
//! ```

pub mod tone;

use crate::stack::{PortId, Stack, StackError};
use core::fmt;
use tone::{TONE_8BIT, TONE_16BIT_8KHZ, TONE_16BIT_16KHZ, ToneGenerator};

/// Speech codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Codec {
    /// Narrowband CVSD, always available
    #[default]
    Cvsd,
    /// Wideband mSBC
    Msbc,
}

impl Codec {
    /// Codec from its HFP codec id
    #[must_use]
    pub const fn from_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(Self::Cvsd),
            2 => Some(Self::Msbc),
            _ => None,
        }
    }

    /// HFP codec id
    #[must_use]
    pub const fn id(&self) -> u8 {
        match self {
            Self::Cvsd => 1,
            Self::Msbc => 2,
        }
    }
}

/// Audio connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioState {
    /// No audio connection
    #[default]
    Disconnected,
    /// Setup requested, waiting for the stack
    Connecting,
    /// Audio flowing
    Connected,
}

/// Test signal mode (`SetSCOTestMode <0|1|2>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TestMode {
    /// Received audio is discarded
    #[default]
    None,
    /// Answer every received frame with a 1 kHz tone frame
    Tone,
    /// Echo every received frame
    Loopback,
}

impl TestMode {
    /// Map the operator value
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::None),
            1 => Some(Self::Tone),
            2 => Some(Self::Loopback),
            _ => None,
        }
    }
}

/// Sample width (`SetSCODataFormat <0|1>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataFormat {
    /// 8-bit samples
    Bits8,
    /// 16-bit little-endian samples
    #[default]
    Bits16,
}

impl DataFormat {
    /// Map the operator value
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Bits8),
            1 => Some(Self::Bits16),
            _ => None,
        }
    }
}

/// Audio routing (`SetSCOTransport <0|1>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScoTransport {
    /// Controller PCM interface
    #[default]
    Codec,
    /// Audio data over HCI
    Hci,
}

impl ScoTransport {
    /// Map the operator value
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Codec),
            1 => Some(Self::Hci),
            _ => None,
        }
    }
}

/// Parameters handed to the stack at audio setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AudioParameters {
    /// Routing
    pub transport: ScoTransport,
    /// Sample width
    pub data_format: DataFormat,
    /// Negotiated codec
    pub codec: Codec,
}

/// Audio errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioError {
    /// Only allowed while disconnected
    NotDisconnected,
    /// No audio connection to release
    NotConnected,
    /// Codec not supported by both sides
    UnsupportedCodec,
    /// The stack refused the request
    Stack(StackError),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotDisconnected => f.write_str("audio connection active"),
            Self::NotConnected => f.write_str("no audio connection"),
            Self::UnsupportedCodec => f.write_str("codec not supported"),
            Self::Stack(e) => write!(f, "audio request failed: {e}"),
        }
    }
}

/// Audio connection and codec state
#[derive(Debug)]
pub struct AudioManager {
    state: AudioState,
    test_mode: TestMode,
    data_format: DataFormat,
    transport: ScoTransport,
    selected: Codec,
    requested: Option<Codec>,
    negotiated: Option<Codec>,
    local_wideband: bool,
    remote_wideband: bool,
    frame_length: usize,
    tone: ToneGenerator,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(false)
    }
}

impl AudioManager {
    /// Disconnected audio, CVSD selected
    #[must_use]
    pub const fn new(wideband_speech: bool) -> Self {
        Self {
            state: AudioState::Disconnected,
            test_mode: TestMode::None,
            data_format: DataFormat::Bits16,
            transport: ScoTransport::Codec,
            selected: Codec::Cvsd,
            requested: None,
            negotiated: None,
            local_wideband: wideband_speech,
            remote_wideband: false,
            frame_length: 0,
            tone: ToneGenerator::new(),
        }
    }

    /// Connection state
    #[must_use]
    pub const fn state(&self) -> AudioState {
        self.state
    }

    /// Test mode
    #[must_use]
    pub const fn test_mode(&self) -> TestMode {
        self.test_mode
    }

    /// Change the test mode; allowed at any time
    pub fn set_test_mode(&mut self, mode: TestMode) {
        self.test_mode = mode;
        self.tone.reset();
    }

    /// Sample width
    #[must_use]
    pub const fn data_format(&self) -> DataFormat {
        self.data_format
    }

    /// Change the sample width
    ///
    /// # Errors
    /// `NotDisconnected` unless audio is disconnected.
    pub fn set_data_format(&mut self, format: DataFormat) -> Result<(), AudioError> {
        self.ensure_disconnected()?;
        self.data_format = format;
        Ok(())
    }

    /// Audio routing
    #[must_use]
    pub const fn transport(&self) -> ScoTransport {
        self.transport
    }

    /// Change the audio routing
    ///
    /// # Errors
    /// `NotDisconnected` unless audio is disconnected.
    pub fn set_transport(&mut self, transport: ScoTransport) -> Result<(), AudioError> {
        self.ensure_disconnected()?;
        self.transport = transport;
        Ok(())
    }

    fn ensure_disconnected(&self) -> Result<(), AudioError> {
        if self.state == AudioState::Disconnected {
            Ok(())
        } else {
            Err(AudioError::NotDisconnected)
        }
    }

    /// Record whether the peer advertised wideband speech
    pub fn set_remote_wideband(&mut self, supported: bool) {
        self.remote_wideband = supported;
    }

    /// Whether both sides can use `codec`
    #[must_use]
    pub const fn codec_available(&self, codec: Codec) -> bool {
        match codec {
            Codec::Cvsd => true,
            Codec::Msbc => self.local_wideband && self.remote_wideband,
        }
    }

    /// Codec chosen by the operator
    #[must_use]
    pub const fn selected(&self) -> Codec {
        self.selected
    }

    /// Codec proposed to the peer and not yet confirmed
    #[must_use]
    pub const fn requested(&self) -> Option<Codec> {
        self.requested
    }

    /// Codec both sides agreed on
    #[must_use]
    pub const fn negotiated(&self) -> Option<Codec> {
        self.negotiated
    }

    /// Choose the codec used when no request is outstanding
    ///
    /// # Errors
    /// `UnsupportedCodec` when either side lacks wideband support for mSBC.
    pub fn select_codec(&mut self, codec: Codec) -> Result<(), AudioError> {
        if !self.codec_available(codec) {
            return Err(AudioError::UnsupportedCodec);
        }
        self.selected = codec;
        Ok(())
    }

    /// Record the selected codec as sent to the peer
    pub fn mark_requested(&mut self) {
        self.requested = Some(self.selected);
    }

    /// Check the peer's codec against the outstanding request
    ///
    /// Without an outstanding request the selected codec is expected. The
    /// request is cleared whatever the outcome; returns whether the codec was
    /// accepted.
    pub fn confirm_codec(&mut self, codec: Codec) -> bool {
        let expected = self.requested.take().unwrap_or(self.selected);
        let accepted = codec == expected && self.codec_available(codec);
        if accepted {
            self.negotiated = Some(codec);
        }
        accepted
    }

    /// Parameters for the next audio setup
    #[must_use]
    pub fn parameters(&self) -> AudioParameters {
        AudioParameters {
            transport: self.transport,
            data_format: self.data_format,
            codec: self.negotiated.unwrap_or_default(),
        }
    }

    /// Start an outgoing audio connection
    ///
    /// # Errors
    /// `NotDisconnected` unless audio is disconnected, `Stack` when the stack
    /// refuses; the state is unchanged on error.
    pub fn connect<S: Stack>(&mut self, stack: &mut S, port: PortId) -> Result<(), AudioError> {
        self.ensure_disconnected()?;
        stack
            .setup_audio(port, &self.parameters())
            .map_err(AudioError::Stack)?;
        self.state = AudioState::Connecting;
        Ok(())
    }

    /// Release the audio connection; completion arrives as an event
    ///
    /// # Errors
    /// `NotConnected` when already disconnected, `Stack` when the stack refuses.
    pub fn disconnect<S: Stack>(&mut self, stack: &mut S, port: PortId) -> Result<(), AudioError> {
        if self.state == AudioState::Disconnected {
            return Err(AudioError::NotConnected);
        }
        stack.release_audio(port).map_err(AudioError::Stack)
    }

    /// Peer asked for an audio connection
    pub fn on_connection_request<S: Stack>(&mut self, stack: &mut S, port: PortId) {
        if self.state != AudioState::Disconnected {
            warn!("[AUDIO] Connection request while {:?}", self.state);
            return;
        }
        match stack.setup_audio(port, &self.parameters()) {
            Ok(()) => self.state = AudioState::Connecting,
            Err(e) => warn!("[AUDIO] Accepting audio failed ({})", e.0),
        }
    }

    /// Audio setup finished
    ///
    /// Ignored unless a setup is pending.
    pub fn on_connected(&mut self, status: u8, frame_length: u16) {
        if self.state != AudioState::Connecting {
            warn!("[AUDIO] Unexpected connection while {:?}", self.state);
            return;
        }
        if status == 0 {
            self.state = AudioState::Connected;
            self.frame_length = usize::from(frame_length);
            self.tone.reset();
            info!("[AUDIO] Connected, frame length {}", frame_length);
        } else {
            self.state = AudioState::Disconnected;
            warn!("[AUDIO] Connection failed, status {}", status);
        }
    }

    /// Audio connection went away
    pub fn on_disconnected(&mut self) {
        self.state = AudioState::Disconnected;
        self.frame_length = 0;
    }

    /// Drop the audio state because its signalling port closed
    pub fn force_disconnected(&mut self) {
        self.on_disconnected();
        self.requested = None;
        self.remote_wideband = false;
    }

    /// Table the tone generator cycles for the current format and codec
    #[must_use]
    pub fn tone_table(&self) -> &'static [u8] {
        match (self.data_format, self.negotiated) {
            (DataFormat::Bits8, _) => &TONE_8BIT,
            (DataFormat::Bits16, Some(Codec::Msbc)) => &TONE_16BIT_16KHZ,
            (DataFormat::Bits16, _) => &TONE_16BIT_8KHZ,
        }
    }

    /// Handle one received audio frame according to the test mode
    pub fn on_data<S: Stack>(&mut self, stack: &mut S, port: PortId, data: &[u8]) {
        if self.state != AudioState::Connected {
            return;
        }
        let result = match self.test_mode {
            TestMode::None => return,
            TestMode::Loopback => stack.send_audio_data(port, data),
            TestMode::Tone => {
                let length = if self.frame_length == 0 {
                    data.len()
                } else {
                    self.frame_length
                };
                let table = self.tone_table();
                let frame = self.tone.next_frame(table, length);
                stack.send_audio_data(port, &frame)
            }
        };
        if let Err(e) = result {
            trace!("[AUDIO] Audio data dropped ({})", e.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{MockStack, StackCall};

    const PORT: PortId = 1;

    fn connected(stack: &mut MockStack, frame_length: u16) -> AudioManager {
        let mut audio = AudioManager::new(true);
        audio.connect(stack, PORT).unwrap();
        audio.on_connected(0, frame_length);
        audio
    }

    #[test]
    fn test_state_transitions() {
        let mut stack = MockStack::new();
        let mut audio = AudioManager::new(false);

        assert_eq!(audio.disconnect(&mut stack, PORT), Err(AudioError::NotConnected));
        audio.connect(&mut stack, PORT).unwrap();
        assert_eq!(audio.state(), AudioState::Connecting);
        assert_eq!(audio.connect(&mut stack, PORT), Err(AudioError::NotDisconnected));

        audio.on_connected(0, 60);
        assert_eq!(audio.state(), AudioState::Connected);
        audio.disconnect(&mut stack, PORT).unwrap();
        audio.on_disconnected();
        assert_eq!(audio.state(), AudioState::Disconnected);
    }

    #[test]
    fn test_connection_without_setup_ignored() {
        let mut stack = MockStack::new();
        let mut audio = AudioManager::new(false);
        audio.on_connected(0, 60);
        assert_eq!(audio.state(), AudioState::Disconnected);

        audio.set_test_mode(TestMode::Loopback);
        audio.on_data(&mut stack, PORT, &[1, 2, 3]);
        assert!(stack.calls.is_empty());

        let mut audio = connected(&mut stack, 60);
        audio.on_connected(0, 120);
        assert_eq!(audio.frame_length, 60);
    }

    #[test]
    fn test_failed_setup_returns_to_disconnected() {
        let mut stack = MockStack::new();
        let mut audio = AudioManager::new(false);
        audio.connect(&mut stack, PORT).unwrap();
        audio.on_connected(0x0D, 0);
        assert_eq!(audio.state(), AudioState::Disconnected);
    }

    #[test]
    fn test_format_changes_only_while_disconnected() {
        let mut stack = MockStack::new();
        let mut audio = connected(&mut stack, 48);

        assert_eq!(
            audio.set_data_format(DataFormat::Bits8),
            Err(AudioError::NotDisconnected)
        );
        assert_eq!(
            audio.set_transport(ScoTransport::Hci),
            Err(AudioError::NotDisconnected)
        );
        assert_eq!(audio.data_format(), DataFormat::Bits16);

        audio.force_disconnected();
        audio.set_data_format(DataFormat::Bits8).unwrap();
        audio.set_transport(ScoTransport::Hci).unwrap();
        assert_eq!(audio.parameters().transport, ScoTransport::Hci);
    }

    #[test]
    fn test_wideband_needs_both_sides() {
        let mut audio = AudioManager::new(true);
        assert_eq!(audio.select_codec(Codec::Msbc), Err(AudioError::UnsupportedCodec));
        audio.set_remote_wideband(true);
        audio.select_codec(Codec::Msbc).unwrap();
        assert_eq!(audio.selected(), Codec::Msbc);
        assert_eq!(audio.requested(), None);

        let mut narrow = AudioManager::new(false);
        narrow.set_remote_wideband(true);
        assert_eq!(narrow.select_codec(Codec::Msbc), Err(AudioError::UnsupportedCodec));
    }

    #[test]
    fn test_codec_confirmation_clears_request() {
        let mut audio = AudioManager::new(true);
        audio.set_remote_wideband(true);

        audio.select_codec(Codec::Msbc).unwrap();
        audio.mark_requested();
        assert!(!audio.confirm_codec(Codec::Cvsd));
        assert_eq!(audio.requested(), None);
        assert_eq!(audio.negotiated(), None);

        audio.select_codec(Codec::Msbc).unwrap();
        audio.mark_requested();
        assert!(audio.confirm_codec(Codec::Msbc));
        assert_eq!(audio.requested(), None);
        assert_eq!(audio.negotiated(), Some(Codec::Msbc));

        // peer-initiated: compared with the selected codec
        assert!(audio.confirm_codec(Codec::Msbc));
        assert!(!audio.confirm_codec(Codec::Cvsd));
    }

    #[test]
    fn test_tone_frames_follow_frame_length() {
        let mut stack = MockStack::new();
        let mut audio = connected(&mut stack, 10);
        audio.set_test_mode(TestMode::Tone);

        audio.on_data(&mut stack, PORT, &[0; 60]);
        audio.on_data(&mut stack, PORT, &[0; 60]);

        let frames: std::vec::Vec<_> = stack
            .calls
            .iter()
            .filter_map(|call| match call {
                StackCall::SendAudioData(_, data) => Some(data.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_slice(), &TONE_16BIT_8KHZ[..10]);
        assert_eq!(frames[1][..6], TONE_16BIT_8KHZ[10..16]);
        assert_eq!(frames[1][6..], TONE_16BIT_8KHZ[..4]);
    }

    #[test]
    fn test_tone_uses_inbound_length_without_frame_length() {
        let mut stack = MockStack::new();
        let mut audio = AudioManager::new(false);
        audio.set_data_format(DataFormat::Bits8).unwrap();
        audio.connect(&mut stack, PORT).unwrap();
        audio.on_connected(0, 0);
        audio.set_test_mode(TestMode::Tone);

        audio.on_data(&mut stack, PORT, &[0; 12]);
        assert_eq!(
            stack.calls.last(),
            Some(&StackCall::SendAudioData(
                PORT,
                [TONE_8BIT.as_slice(), &TONE_8BIT[..4]].concat()
            ))
        );
    }

    #[test]
    fn test_loopback_echoes_input() {
        let mut stack = MockStack::new();
        let mut audio = connected(&mut stack, 48);
        audio.set_test_mode(TestMode::Loopback);

        audio.on_data(&mut stack, PORT, &[1, 2, 3]);
        assert_eq!(
            stack.calls.last(),
            Some(&StackCall::SendAudioData(PORT, std::vec![1, 2, 3]))
        );
    }

    #[test]
    fn test_data_ignored_without_test_mode() {
        let mut stack = MockStack::new();
        let mut audio = connected(&mut stack, 48);
        let before = stack.calls.len();
        audio.on_data(&mut stack, PORT, &[1, 2, 3]);
        assert_eq!(stack.calls.len(), before);
    }
}
