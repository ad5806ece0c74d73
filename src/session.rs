//! Session context
//!
//! A [`Session`] bundles every piece of state one profile endpoint needs: the
//! stack handle, device cache, link keys, pairing, ports, indicators, calls and
//! audio. Operator commands and transport events both operate on it through
//! `&mut`, so whoever owns the session serializes them.
//!
//! Operations are split by concern:
//! - [`gap`]: discovery, local device settings, pairing replies
//! - [`hfp`]: ports, indicators, calls, audio
//! - [`events`]: transport event handling

pub mod events;
pub mod gap;
pub mod hfp;
#[cfg(test)]
pub mod testing;

use crate::{
    audio::AudioManager,
    call::CallTracker,
    command::{CommandError, CommandResult},
    constants::{DEFAULT_INQUIRY_LENGTH, DEFAULT_SERVICE_NAME, MAX_DISCOVERED_DEVICES},
    device_cache::DeviceCache,
    indicator::{IndicatorTable, NotificationRegistry},
    link_key::LinkKeyStore,
    pairing::{IoCapability, PairingContext, SecurityPolicy},
    port::PortManager,
    stack::{
        ConnectabilityMode, DebugConfig, DiscoverabilityMode, HfpRequest, PairabilityMode, PortId,
        Role, Stack, StackError, StackId,
    },
};

/// Session configuration
///
/// # Examples
///
/// ```ignore
/// let options = SessionOptions {
///     role: Role::AudioGateway,
///     service_name: "Voice Gateway",
///     ..SessionOptions::default()
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Profile role, fixed for the session
    pub role: Role,
    /// Local IO capability for Secure Simple Pairing
    pub io_capability: IoCapability,
    /// Require MITM protection
    pub mitm_protection: bool,
    /// OOB pairing data support
    pub oob_supported: bool,
    /// Offer wideband speech (mSBC)
    pub wideband_speech: bool,
    /// Service name in the SDP record
    pub service_name: &'static str,
    /// Inquiry duration in 1.28s units
    pub inquiry_length: u8,
    /// Stop the inquiry after this many responses
    pub max_inquiry_responses: u8,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            role: Role::HandsFree,
            io_capability: IoCapability::DisplayYesNo,
            mitm_protection: true,
            oob_supported: false,
            wideband_speech: true,
            service_name: DEFAULT_SERVICE_NAME,
            inquiry_length: DEFAULT_INQUIRY_LENGTH,
            max_inquiry_responses: MAX_DISCOVERED_DEVICES as u8,
        }
    }
}

/// Local GAP settings last accepted by the stack
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GapSettings {
    /// Discoverability
    pub discoverability: DiscoverabilityMode,
    /// Connectability
    pub connectability: ConnectabilityMode,
    /// Pairability
    pub pairability: PairabilityMode,
    /// Incoming connections must authenticate
    pub authentication_required: bool,
    /// Active debug sink
    pub debug: Option<DebugConfig>,
}

/// One profile endpoint
pub struct Session<S> {
    stack: S,
    options: SessionOptions,
    stack_id: Option<StackId>,
    gap: GapSettings,
    devices: DeviceCache,
    link_keys: LinkKeyStore,
    pairing: PairingContext,
    ports: PortManager,
    indicators: IndicatorTable,
    notifications: NotificationRegistry,
    calls: CallTracker,
    audio: AudioManager,
}

impl<S: Stack> Session<S> {
    /// Create a closed session over `stack`
    #[must_use]
    pub fn new(stack: S, options: SessionOptions) -> Self {
        Self {
            stack,
            options,
            stack_id: None,
            gap: GapSettings::default(),
            devices: DeviceCache::new(),
            link_keys: LinkKeyStore::new(),
            pairing: PairingContext::new(SecurityPolicy {
                io_capability: options.io_capability,
                mitm_protection: options.mitm_protection,
                oob_supported: options.oob_supported,
            }),
            ports: PortManager::new(),
            indicators: IndicatorTable::new(),
            notifications: NotificationRegistry::new(),
            calls: CallTracker::new(),
            audio: AudioManager::new(options.wideband_speech),
        }
    }

    /// Bring the stack up
    ///
    /// Opening an open session returns the existing identifier.
    ///
    /// # Errors
    /// `UnableToInitializeStack` when the stack cannot be initialized.
    pub fn open(&mut self) -> Result<StackId, CommandError> {
        if let Some(id) = self.stack_id {
            return Ok(id);
        }
        let id = self.stack.initialize().map_err(|e| {
            error!("[SESSION] Stack initialization failed ({})", e.0);
            CommandError::UnableToInitializeStack
        })?;
        info!("[SESSION] Stack {} open as {}", id, self.options.role.name());
        self.stack_id = Some(id);
        Ok(id)
    }

    /// Close every port and shut the stack down
    ///
    /// Discovered devices are dropped; link keys stay for the process lifetime.
    pub fn close(&mut self) {
        let Some(id) = self.stack_id.take() else {
            return;
        };
        if self.ports.server_port().is_some() {
            self.ports.close_server(&mut self.stack).ok();
        }
        if self.ports.client_port().is_some() {
            self.ports.close_client(&mut self.stack).ok();
        }
        self.audio.force_disconnected();
        self.calls.reset();
        self.devices.clear();
        self.stack.shutdown(id);
        info!("[SESSION] Stack {} closed", id);
    }

    /// Identifier of the open stack
    #[must_use]
    pub const fn stack_id(&self) -> Option<StackId> {
        self.stack_id
    }

    /// Whether the stack is open
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.stack_id.is_some()
    }

    /// Fail with `InvalidStackId` unless the stack is open
    ///
    /// # Errors
    /// `InvalidStackId` when closed.
    pub fn require_stack(&self) -> Result<StackId, CommandError> {
        self.stack_id.ok_or(CommandError::InvalidStackId)
    }

    /// Session role
    #[must_use]
    pub const fn role(&self) -> Role {
        self.options.role
    }

    pub(crate) fn require_role(&self, role: Role) -> CommandResult {
        if self.options.role == role {
            Ok(())
        } else {
            warn!("[SESSION] Only available as {}", role.name());
            Err(CommandError::FunctionError)
        }
    }

    /// Port carrying the profile connection
    ///
    /// # Errors
    /// `InvalidStackId` when closed, `FunctionError` without a connection.
    pub fn require_port(&self) -> Result<PortId, CommandError> {
        self.require_stack()?;
        self.ports.connected_port().ok_or_else(|| {
            warn!("[SESSION] No active connection");
            CommandError::FunctionError
        })
    }

    /// Send one signalling request on the active connection
    ///
    /// # Errors
    /// `FunctionError` without a connection or when the stack refuses.
    pub fn send(&mut self, request: &HfpRequest) -> CommandResult {
        let port = self.require_port()?;
        self.stack
            .send(port, request)
            .map_err(|e| stack_failure("Send", e))
    }

    /// Configuration
    #[must_use]
    pub const fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Lower stack
    #[must_use]
    pub const fn stack(&self) -> &S {
        &self.stack
    }

    /// Lower stack, mutably
    pub fn stack_mut(&mut self) -> &mut S {
        &mut self.stack
    }

    /// GAP settings
    #[must_use]
    pub const fn gap(&self) -> &GapSettings {
        &self.gap
    }

    /// Discovered devices
    #[must_use]
    pub const fn devices(&self) -> &DeviceCache {
        &self.devices
    }

    /// Stored link keys
    #[must_use]
    pub const fn link_keys(&self) -> &LinkKeyStore {
        &self.link_keys
    }

    /// Pairing state
    #[must_use]
    pub const fn pairing(&self) -> &PairingContext {
        &self.pairing
    }

    /// Port handles
    #[must_use]
    pub const fn ports(&self) -> &PortManager {
        &self.ports
    }

    /// AG control indicators
    #[must_use]
    pub const fn indicators(&self) -> &IndicatorTable {
        &self.indicators
    }

    /// Indicators announced by the AG
    #[must_use]
    pub const fn notifications(&self) -> &NotificationRegistry {
        &self.notifications
    }

    /// Call state
    #[must_use]
    pub const fn calls(&self) -> &CallTracker {
        &self.calls
    }

    /// Audio state
    #[must_use]
    pub const fn audio(&self) -> &AudioManager {
        &self.audio
    }
}

/// Log a refused stack request and map it to `FunctionError`
pub(crate) fn stack_failure(operation: &str, e: StackError) -> CommandError {
    warn!("[SESSION] {} failed ({})", operation, e.0);
    CommandError::FunctionError
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{MockStack, StackCall};

    #[test]
    fn test_open_and_close() {
        let mut session = Session::new(MockStack::new(), SessionOptions::default());
        assert_eq!(session.require_stack(), Err(CommandError::InvalidStackId));

        let id = session.open().unwrap();
        assert_eq!(session.open(), Ok(id));
        assert_eq!(session.require_stack(), Ok(id));

        session.close();
        assert!(!session.is_open());
        assert!(session.stack().calls.contains(&StackCall::Shutdown(id)));
    }

    #[test]
    fn test_initialization_failure() {
        let mut stack = MockStack::new();
        stack.fail_initialize = Some(StackError(-1));
        let mut session = Session::new(stack, SessionOptions::default());

        assert_eq!(session.open(), Err(CommandError::UnableToInitializeStack));
        assert!(!session.is_open());
    }

    #[test]
    fn test_send_requires_connection() {
        let mut session = Session::new(MockStack::new(), SessionOptions::default());
        assert_eq!(
            session.send(&HfpRequest::Answer),
            Err(CommandError::InvalidStackId)
        );
        session.open().unwrap();
        assert_eq!(
            session.send(&HfpRequest::Answer),
            Err(CommandError::FunctionError)
        );
    }

    #[test]
    fn test_close_releases_ports() {
        let mut session = Session::new(MockStack::new(), SessionOptions::default());
        session.open().unwrap();
        let port = session.open_server(3).unwrap();

        session.close();
        assert!(session.stack().calls.contains(&StackCall::ClosePort(port)));
        assert_eq!(session.ports().server_port(), None);
    }
}
