//! Recording stack for tests
#![allow(missing_docs)]

use crate::{
    BluetoothAddress, ClassOfDevice,
    audio::AudioParameters,
    device_cache::DeviceName,
    pairing::{AuthResponse, BondingType},
    stack::{
        ConnectabilityMode, DebugConfig, DiscoverabilityMode, HfpRequest, PairabilityMode, PortId,
        Role, SdpRecordHandle, Stack, StackError, StackId,
    },
};
use std::vec::Vec;

/// One call made into the stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackCall {
    Initialize,
    Shutdown(StackId),
    StartInquiry(u8, u8),
    SetDiscoverability(DiscoverabilityMode),
    SetConnectability(ConnectabilityMode),
    SetPairability(PairabilityMode),
    SetLocalName(DeviceName),
    SetClassOfDevice(ClassOfDevice),
    RequestRemoteName(BluetoothAddress),
    InitiateBonding(BluetoothAddress, BondingType),
    EndBonding(BluetoothAddress),
    AuthenticationResponse(BluetoothAddress, AuthResponse),
    ServiceSearch(BluetoothAddress, u32),
    EnableDebug(Option<DebugConfig>),
    OpenServerPort(Role, u8),
    RegisterSdpRecord(PortId),
    UnregisterSdpRecord(SdpRecordHandle),
    OpenRemotePort(BluetoothAddress, u8),
    ClosePort(PortId),
    RespondOpenRequest(PortId, bool),
    SetServerAuthentication(bool),
    Send(PortId, HfpRequest),
    SetupAudio(PortId, AudioParameters),
    ReleaseAudio(PortId),
    SendAudioData(PortId, Vec<u8>),
}

/// Stack double that records every call and fails on demand
#[derive(Debug, Default)]
pub struct MockStack {
    pub calls: Vec<StackCall>,
    pub fail_initialize: Option<StackError>,
    pub fail_sdp: Option<StackError>,
    pub fail_send: Option<StackError>,
    pub fail_authentication: Option<StackError>,
    pub fail_close: Option<StackError>,
    pub local_name: DeviceName,
    pub class_of_device: ClassOfDevice,
    next_port: PortId,
}

pub const LOCAL_ADDRESS: BluetoothAddress =
    BluetoothAddress::new([0x00, 0x1B, 0xDC, 0x0F, 0x55, 0x01]);

impl MockStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests sent with `Stack::send`, in order
    pub fn sent(&self) -> Vec<HfpRequest> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                StackCall::Send(_, request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    /// Authentication responses, in order
    pub fn auth_responses(&self) -> Vec<AuthResponse> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                StackCall::AuthenticationResponse(_, response) => Some(response.clone()),
                _ => None,
            })
            .collect()
    }

    fn allocate_port(&mut self) -> PortId {
        self.next_port += 1;
        self.next_port
    }
}

impl Stack for MockStack {
    fn initialize(&mut self) -> Result<StackId, StackError> {
        self.calls.push(StackCall::Initialize);
        match self.fail_initialize {
            Some(e) => Err(e),
            None => Ok(1),
        }
    }

    fn shutdown(&mut self, stack_id: StackId) {
        self.calls.push(StackCall::Shutdown(stack_id));
    }

    fn start_inquiry(&mut self, length: u8, max_responses: u8) -> Result<(), StackError> {
        self.calls.push(StackCall::StartInquiry(length, max_responses));
        Ok(())
    }

    fn set_discoverability_mode(&mut self, mode: DiscoverabilityMode) -> Result<(), StackError> {
        self.calls.push(StackCall::SetDiscoverability(mode));
        Ok(())
    }

    fn set_connectability_mode(&mut self, mode: ConnectabilityMode) -> Result<(), StackError> {
        self.calls.push(StackCall::SetConnectability(mode));
        Ok(())
    }

    fn set_pairability_mode(&mut self, mode: PairabilityMode) -> Result<(), StackError> {
        self.calls.push(StackCall::SetPairability(mode));
        Ok(())
    }

    fn local_address(&mut self) -> Result<BluetoothAddress, StackError> {
        Ok(LOCAL_ADDRESS)
    }

    fn set_local_name(&mut self, name: &str) -> Result<(), StackError> {
        self.local_name = DeviceName::try_from(name).map_err(|()| StackError(-6))?;
        self.calls.push(StackCall::SetLocalName(self.local_name.clone()));
        Ok(())
    }

    fn local_name(&mut self) -> Result<DeviceName, StackError> {
        Ok(self.local_name.clone())
    }

    fn set_class_of_device(&mut self, class_of_device: ClassOfDevice) -> Result<(), StackError> {
        self.class_of_device = class_of_device;
        self.calls.push(StackCall::SetClassOfDevice(class_of_device));
        Ok(())
    }

    fn class_of_device(&mut self) -> Result<ClassOfDevice, StackError> {
        Ok(self.class_of_device)
    }

    fn request_remote_name(&mut self, addr: BluetoothAddress) -> Result<(), StackError> {
        self.calls.push(StackCall::RequestRemoteName(addr));
        Ok(())
    }

    fn initiate_bonding(
        &mut self,
        addr: BluetoothAddress,
        bonding_type: BondingType,
    ) -> Result<(), StackError> {
        self.calls.push(StackCall::InitiateBonding(addr, bonding_type));
        Ok(())
    }

    fn end_bonding(&mut self, addr: BluetoothAddress) -> Result<(), StackError> {
        self.calls.push(StackCall::EndBonding(addr));
        Ok(())
    }

    fn authentication_response(
        &mut self,
        addr: BluetoothAddress,
        response: &AuthResponse,
    ) -> Result<(), StackError> {
        self.calls
            .push(StackCall::AuthenticationResponse(addr, response.clone()));
        match self.fail_authentication {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn service_search(&mut self, addr: BluetoothAddress, uuid: u32) -> Result<(), StackError> {
        self.calls.push(StackCall::ServiceSearch(addr, uuid));
        Ok(())
    }

    fn enable_debug(&mut self, config: Option<&DebugConfig>) -> Result<(), StackError> {
        self.calls.push(StackCall::EnableDebug(config.cloned()));
        Ok(())
    }

    fn open_server_port(&mut self, role: Role, channel: u8) -> Result<PortId, StackError> {
        self.calls.push(StackCall::OpenServerPort(role, channel));
        Ok(self.allocate_port())
    }

    fn register_sdp_record(
        &mut self,
        port: PortId,
        _role: Role,
        _service_name: &str,
    ) -> Result<SdpRecordHandle, StackError> {
        self.calls.push(StackCall::RegisterSdpRecord(port));
        match self.fail_sdp {
            Some(e) => Err(e),
            None => Ok(0x0001_0000 + port),
        }
    }

    fn unregister_sdp_record(&mut self, handle: SdpRecordHandle) -> Result<(), StackError> {
        self.calls.push(StackCall::UnregisterSdpRecord(handle));
        Ok(())
    }

    fn open_remote_port(
        &mut self,
        _role: Role,
        addr: BluetoothAddress,
        channel: u8,
    ) -> Result<PortId, StackError> {
        self.calls.push(StackCall::OpenRemotePort(addr, channel));
        Ok(self.allocate_port())
    }

    fn close_port(&mut self, port: PortId) -> Result<(), StackError> {
        self.calls.push(StackCall::ClosePort(port));
        match self.fail_close {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn respond_open_request(&mut self, port: PortId, accept: bool) -> Result<(), StackError> {
        self.calls.push(StackCall::RespondOpenRequest(port, accept));
        Ok(())
    }

    fn set_server_authentication(&mut self, required: bool) -> Result<(), StackError> {
        self.calls.push(StackCall::SetServerAuthentication(required));
        Ok(())
    }

    fn send(&mut self, port: PortId, request: &HfpRequest) -> Result<(), StackError> {
        self.calls.push(StackCall::Send(port, request.clone()));
        match self.fail_send {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn setup_audio(
        &mut self,
        port: PortId,
        parameters: &AudioParameters,
    ) -> Result<(), StackError> {
        self.calls.push(StackCall::SetupAudio(port, *parameters));
        Ok(())
    }

    fn release_audio(&mut self, port: PortId) -> Result<(), StackError> {
        self.calls.push(StackCall::ReleaseAudio(port));
        Ok(())
    }

    fn send_audio_data(&mut self, port: PortId, data: &[u8]) -> Result<(), StackError> {
        self.calls.push(StackCall::SendAudioData(port, data.to_vec()));
        Ok(())
    }
}
