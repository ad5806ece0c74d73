//! Port/session lifecycle manager
//!
//! Owns the single profile connection: at most one server port (listening,
//! advertised through an SDP record) and at most one client port. Whether the
//! session is connected is derived from the port handles and the open/close
//! indications, never set directly.

use crate::{
    BluetoothAddress,
    stack::{PortId, Role, SdpRecordHandle, Stack, StackError},
};
use core::fmt;

/// Port lifecycle errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortError {
    /// A port of this kind is already open
    AlreadyOpen,
    /// The other port carries the active connection
    Busy,
    /// No port of this kind is open
    NotOpen,
    /// The stack refused to open the port
    Open(StackError),
    /// The SDP record could not be registered; the port was closed again
    SdpRegistration(StackError),
    /// The stack refused to close the port
    Close(StackError),
}

impl fmt::Display for PortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyOpen => f.write_str("port already open"),
            Self::Busy => f.write_str("another port is connected"),
            Self::NotOpen => f.write_str("no port open"),
            Self::Open(e) => write!(f, "port open failed: {e}"),
            Self::SdpRegistration(e) => write!(f, "SDP record registration failed: {e}"),
            Self::Close(e) => write!(f, "port close failed: {e}"),
        }
    }
}

/// Which side opened a port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortKind {
    /// Local listening port
    Server,
    /// Outgoing connection
    Client,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenPort {
    id: PortId,
    connected: bool,
    service_level: bool,
}

impl OpenPort {
    const fn new(id: PortId) -> Self {
        Self {
            id,
            connected: false,
            service_level: false,
        }
    }
}

/// Server and client port handles
#[derive(Debug, Default)]
pub struct PortManager {
    server: Option<OpenPort>,
    client: Option<OpenPort>,
    sdp_record: Option<SdpRecordHandle>,
}

impl PortManager {
    /// No ports open
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Server port handle, if open
    #[must_use]
    pub fn server_port(&self) -> Option<PortId> {
        self.server.map(|port| port.id)
    }

    /// Client port handle, if open
    #[must_use]
    pub fn client_port(&self) -> Option<PortId> {
        self.client.map(|port| port.id)
    }

    /// SDP record of the server port
    #[must_use]
    pub const fn sdp_record(&self) -> Option<SdpRecordHandle> {
        self.sdp_record
    }

    /// Port carrying the profile connection
    #[must_use]
    pub fn connected_port(&self) -> Option<PortId> {
        [self.server, self.client]
            .into_iter()
            .flatten()
            .find(|port| port.connected)
            .map(|port| port.id)
    }

    /// Whether a profile connection is up
    #[must_use]
    pub fn connected(&self) -> bool {
        self.connected_port().is_some()
    }

    /// Whether the service level connection is established
    #[must_use]
    pub fn service_level(&self) -> bool {
        [self.server, self.client]
            .into_iter()
            .flatten()
            .any(|port| port.connected && port.service_level)
    }

    /// Kind of a known port
    #[must_use]
    pub fn kind_of(&self, port: PortId) -> Option<PortKind> {
        if self.server_port() == Some(port) {
            Some(PortKind::Server)
        } else if self.client_port() == Some(port) {
            Some(PortKind::Client)
        } else {
            None
        }
    }

    /// Open and advertise the server port
    ///
    /// # Errors
    /// `AlreadyOpen`/`Busy` on precondition failures, `Open` when the stack
    /// refuses the port, `SdpRegistration` when the record cannot be
    /// registered. In the last case the port is closed before returning.
    pub fn open_server<S: Stack>(
        &mut self,
        stack: &mut S,
        role: Role,
        channel: u8,
        service_name: &str,
    ) -> Result<PortId, PortError> {
        if self.server.is_some() {
            return Err(PortError::AlreadyOpen);
        }
        if self.client.is_some_and(|port| port.connected) {
            return Err(PortError::Busy);
        }

        let port = stack
            .open_server_port(role, channel)
            .map_err(PortError::Open)?;
        match stack.register_sdp_record(port, role, service_name) {
            Ok(handle) => {
                info!("[PORT] Server port {} open, SDP record {}", port, handle);
                self.server = Some(OpenPort::new(port));
                self.sdp_record = Some(handle);
                Ok(port)
            }
            Err(e) => {
                warn!("[PORT] SDP registration failed ({}), closing port {}", e.0, port);
                if let Err(close) = stack.close_port(port) {
                    warn!("[PORT] Close of port {} failed ({})", port, close.0);
                }
                self.sdp_record = None;
                Err(PortError::SdpRegistration(e))
            }
        }
    }

    /// Withdraw the SDP record and close the server port
    ///
    /// The handle is released even when the stack reports a failure.
    ///
    /// # Errors
    /// `NotOpen` without a server port, `Close` when the stack refuses.
    pub fn close_server<S: Stack>(&mut self, stack: &mut S) -> Result<(), PortError> {
        let port = self.server.take().ok_or(PortError::NotOpen)?;
        if let Some(handle) = self.sdp_record.take() {
            if let Err(e) = stack.unregister_sdp_record(handle) {
                warn!("[PORT] SDP record removal failed ({})", e.0);
            }
        }
        stack.close_port(port.id).map_err(PortError::Close)
    }

    /// Connect to a remote server port
    ///
    /// # Errors
    /// `AlreadyOpen`/`Busy` on precondition failures, `Open` when the stack
    /// refuses.
    pub fn open_client<S: Stack>(
        &mut self,
        stack: &mut S,
        role: Role,
        addr: BluetoothAddress,
        channel: u8,
    ) -> Result<PortId, PortError> {
        if self.client.is_some() {
            return Err(PortError::AlreadyOpen);
        }
        if self.server.is_some_and(|port| port.connected) {
            return Err(PortError::Busy);
        }
        let port = stack
            .open_remote_port(role, addr, channel)
            .map_err(PortError::Open)?;
        self.client = Some(OpenPort::new(port));
        Ok(port)
    }

    /// Close the client port
    ///
    /// The handle is released even when the stack reports a failure.
    ///
    /// # Errors
    /// `NotOpen` without a client port, `Close` when the stack refuses.
    pub fn close_client<S: Stack>(&mut self, stack: &mut S) -> Result<(), PortError> {
        let port = self.client.take().ok_or(PortError::NotOpen)?;
        stack.close_port(port.id).map_err(PortError::Close)
    }

    /// Whether an incoming connection on `port` may be accepted
    #[must_use]
    pub fn accepts_incoming(&self, port: PortId) -> bool {
        self.server_port() == Some(port) && !self.connected()
    }

    /// Incoming connection established on the server port
    pub fn on_open_indication(&mut self, port: PortId) -> bool {
        match self.server.as_mut() {
            Some(server) if server.id == port => {
                server.connected = true;
                true
            }
            _ => false,
        }
    }

    /// Outgoing connection completed; a failure releases the client handle
    pub fn on_open_confirmation(&mut self, port: PortId, status: u8) -> bool {
        let Some(client) = self.client.as_mut().filter(|client| client.id == port) else {
            return false;
        };
        if status == 0 {
            client.connected = true;
            return true;
        }
        self.client = None;
        false
    }

    /// Service level connection established on `port`
    pub fn on_service_level(&mut self, port: PortId) -> bool {
        let Some(open) = [self.server.as_mut(), self.client.as_mut()]
            .into_iter()
            .flatten()
            .find(|open| open.id == port && open.connected)
        else {
            return false;
        };
        open.service_level = true;
        true
    }

    /// Remote side closed `port`
    ///
    /// A server port keeps listening; a client port is released.
    pub fn on_close_indication(&mut self, port: PortId) -> Option<PortKind> {
        match self.kind_of(port)? {
            PortKind::Server => {
                if let Some(server) = self.server.as_mut() {
                    *server = OpenPort::new(server.id);
                }
                Some(PortKind::Server)
            }
            PortKind::Client => {
                self.client = None;
                Some(PortKind::Client)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{MockStack, StackCall};

    const PEER: BluetoothAddress = BluetoothAddress::new([9, 8, 7, 6, 5, 4]);

    #[test]
    fn test_open_server_registers_record() {
        let mut stack = MockStack::new();
        let mut ports = PortManager::new();

        let port = ports
            .open_server(&mut stack, Role::HandsFree, 3, "Hands-Free")
            .unwrap();
        assert_eq!(ports.server_port(), Some(port));
        assert!(ports.sdp_record().is_some());
        assert!(!ports.connected());
        assert_eq!(
            ports.open_server(&mut stack, Role::HandsFree, 3, "Hands-Free"),
            Err(PortError::AlreadyOpen)
        );
    }

    #[test]
    fn test_sdp_failure_closes_port() {
        let mut stack = MockStack::new();
        stack.fail_sdp = Some(StackError(-12));
        let mut ports = PortManager::new();

        assert_eq!(
            ports.open_server(&mut stack, Role::AudioGateway, 1, "Voice Gateway"),
            Err(PortError::SdpRegistration(StackError(-12)))
        );
        assert_eq!(ports.server_port(), None);
        assert_eq!(ports.sdp_record(), None);
        assert!(stack.calls.contains(&StackCall::ClosePort(1)));
    }

    #[test]
    fn test_connected_is_derived() {
        let mut stack = MockStack::new();
        let mut ports = PortManager::new();

        let port = ports.open_client(&mut stack, Role::HandsFree, PEER, 2).unwrap();
        assert!(!ports.connected());
        assert!(ports.on_open_confirmation(port, 0));
        assert_eq!(ports.connected_port(), Some(port));
        assert!(ports.on_service_level(port));
        assert!(ports.service_level());

        assert_eq!(ports.on_close_indication(port), Some(PortKind::Client));
        assert!(!ports.connected());
        assert_eq!(ports.client_port(), None);
    }

    #[test]
    fn test_failed_confirmation_releases_client() {
        let mut stack = MockStack::new();
        let mut ports = PortManager::new();

        let port = ports.open_client(&mut stack, Role::HandsFree, PEER, 2).unwrap();
        assert!(!ports.on_open_confirmation(port, 4));
        assert_eq!(ports.client_port(), None);
    }

    #[test]
    fn test_server_and_client_are_exclusive_while_connected() {
        let mut stack = MockStack::new();
        let mut ports = PortManager::new();

        let server = ports
            .open_server(&mut stack, Role::AudioGateway, 1, "Voice Gateway")
            .unwrap();
        assert!(ports.accepts_incoming(server));
        assert!(ports.on_open_indication(server));
        assert!(!ports.accepts_incoming(server));
        assert_eq!(
            ports.open_client(&mut stack, Role::AudioGateway, PEER, 1),
            Err(PortError::Busy)
        );

        // the server keeps listening after the peer leaves
        assert_eq!(ports.on_close_indication(server), Some(PortKind::Server));
        assert_eq!(ports.server_port(), Some(server));
        assert!(!ports.connected());
    }

    #[test]
    fn test_close_releases_handles() {
        let mut stack = MockStack::new();
        let mut ports = PortManager::new();

        assert_eq!(ports.close_server(&mut stack), Err(PortError::NotOpen));
        assert_eq!(ports.close_client(&mut stack), Err(PortError::NotOpen));

        ports
            .open_server(&mut stack, Role::HandsFree, 3, "Hands-Free")
            .unwrap();
        ports.close_server(&mut stack).unwrap();
        assert_eq!(ports.server_port(), None);
        assert_eq!(ports.sdp_record(), None);
        assert!(stack.calls.iter().any(|call| matches!(call, StackCall::UnregisterSdpRecord(_))));
    }
}
