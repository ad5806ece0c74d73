//! Discovery, local device settings and pairing replies

use super::{Session, stack_failure};
use crate::{
    BluetoothAddress, ClassOfDevice,
    command::{CommandError, CommandResult},
    device_cache::DeviceName,
    pairing::{AuthResponse, BondingType, IoCapability},
    stack::{ConnectabilityMode, DebugConfig, DiscoverabilityMode, PairabilityMode, Stack},
};

/// Profiles offered by `ServiceDiscovery`, by operator index
///
/// The last entry takes the UUID from the command line.
pub const SERVICE_PROFILES: [(&str, Option<u32>); 6] = [
    ("Serial Port", Some(0x1101)),
    ("Headset", Some(0x1108)),
    ("Headset Audio Gateway", Some(0x1112)),
    ("Hands-Free", Some(0x111E)),
    ("Hands-Free Audio Gateway", Some(0x111F)),
    ("Custom", None),
];

/// UUID searched for profile `profile`, with `custom` for the custom entry
#[must_use]
pub fn service_uuid(profile: u32, custom: Option<u32>) -> Option<u32> {
    let (_, uuid) = SERVICE_PROFILES.get(usize::try_from(profile).ok()?)?;
    uuid.or(custom)
}

impl<S: Stack> Session<S> {
    /// Address of the device at 1-based inquiry index `index`
    ///
    /// # Errors
    /// `InvalidParameters` when the index is not in the inquiry list.
    pub fn device(&self, index: u32) -> Result<BluetoothAddress, CommandError> {
        self.devices
            .by_index(index)
            .map(|device| device.addr)
            .ok_or_else(|| {
                warn!("[GAP] No device at index {}", index);
                CommandError::InvalidParameters
            })
    }

    /// Clear the inquiry list and start a new inquiry
    ///
    /// # Errors
    /// `InvalidStackId` when closed, `FunctionError` when the stack refuses.
    pub fn inquiry(&mut self) -> CommandResult {
        self.require_stack()?;
        self.devices.clear();
        self.stack
            .start_inquiry(
                self.options.inquiry_length,
                self.options.max_inquiry_responses,
            )
            .map_err(|e| stack_failure("Inquiry", e))?;
        info!("[GAP] Inquiry started");
        Ok(())
    }

    /// Log the inquiry list
    pub fn display_inquiry_list(&self) {
        info!("[GAP] Inquiry list: {} devices", self.devices.len());
        for (i, device) in self.devices.iter().enumerate() {
            let addr = device.addr.format_hex();
            match &device.name {
                Some(name) => info!("[GAP] {}: {} {}", i + 1, addr.as_str(), name.as_str()),
                None => info!("[GAP] {}: {}", i + 1, addr.as_str()),
            }
        }
    }

    /// Bond with an inquired device
    ///
    /// Any key already stored for the device is dropped first.
    ///
    /// # Errors
    /// `InvalidParameters` for an unknown index, `FunctionError` when the stack
    /// refuses.
    pub fn pair(&mut self, index: u32, bonding_type: BondingType) -> CommandResult {
        self.require_stack()?;
        let addr = self.device(index)?;
        self.link_keys.delete(&addr);
        self.stack
            .initiate_bonding(addr, bonding_type)
            .map_err(|e| stack_failure("Bonding", e))?;
        info!("[GAP] Bonding with {} started", addr.format_hex().as_str());
        Ok(())
    }

    /// Forget the link key of an inquired device
    ///
    /// # Errors
    /// `InvalidParameters` for an unknown index.
    pub fn unpair(&mut self, index: u32) -> CommandResult {
        self.require_stack()?;
        let addr = self.device(index)?;
        let removed = self.link_keys.delete(&addr);
        info!("[GAP] {} link keys removed", removed);
        Ok(())
    }

    /// Abort bonding with an inquired device
    ///
    /// # Errors
    /// `InvalidParameters` for an unknown index, `FunctionError` when the stack
    /// refuses.
    pub fn end_pairing(&mut self, index: u32) -> CommandResult {
        self.require_stack()?;
        let addr = self.device(index)?;
        self.stack
            .end_bonding(addr)
            .map_err(|e| stack_failure("End bonding", e))
    }

    fn answer_peer(&mut self, addr: BluetoothAddress, response: &AuthResponse) -> CommandResult {
        self.stack
            .authentication_response(addr, response)
            .map_err(|e| stack_failure("Authentication response", e))
    }

    /// Answer an outstanding PIN code request
    ///
    /// # Errors
    /// `FunctionError` without an outstanding request or when the stack
    /// refuses, `InvalidParameters` for an empty or over-long PIN.
    pub fn pin_code_response(&mut self, pin: &str) -> CommandResult {
        self.require_stack()?;
        let (addr, response) = self.pairing.pin_code_response(pin)?;
        self.answer_peer(addr, &response)
    }

    /// Answer an outstanding passkey request
    ///
    /// # Errors
    /// `FunctionError` without an outstanding request or when the stack
    /// refuses, `InvalidParameters` above 999999.
    pub fn passkey_response(&mut self, passkey: u32) -> CommandResult {
        self.require_stack()?;
        let (addr, response) = self.pairing.passkey_response(passkey)?;
        self.answer_peer(addr, &response)
    }

    /// Answer an outstanding numeric comparison
    ///
    /// # Errors
    /// `FunctionError` without an outstanding request or when the stack
    /// refuses.
    pub fn user_confirmation_response(&mut self, accept: bool) -> CommandResult {
        self.require_stack()?;
        let (addr, response) = self.pairing.user_confirmation_response(accept)?;
        self.answer_peer(addr, &response)
    }

    /// Set discoverability
    ///
    /// # Errors
    /// `FunctionError` when the stack refuses; the stored mode is unchanged.
    pub fn set_discoverability(&mut self, mode: DiscoverabilityMode) -> CommandResult {
        self.require_stack()?;
        self.stack
            .set_discoverability_mode(mode)
            .map_err(|e| stack_failure("Set discoverability", e))?;
        self.gap.discoverability = mode;
        Ok(())
    }

    /// Set connectability
    ///
    /// # Errors
    /// `FunctionError` when the stack refuses; the stored mode is unchanged.
    pub fn set_connectability(&mut self, mode: ConnectabilityMode) -> CommandResult {
        self.require_stack()?;
        self.stack
            .set_connectability_mode(mode)
            .map_err(|e| stack_failure("Set connectability", e))?;
        self.gap.connectability = mode;
        Ok(())
    }

    /// Set pairability
    ///
    /// # Errors
    /// `FunctionError` when the stack refuses; the stored mode is unchanged.
    pub fn set_pairability(&mut self, mode: PairabilityMode) -> CommandResult {
        self.require_stack()?;
        self.stack
            .set_pairability_mode(mode)
            .map_err(|e| stack_failure("Set pairability", e))?;
        self.gap.pairability = mode;
        Ok(())
    }

    /// Replace the IO capability and MITM requirement used for pairing
    ///
    /// # Errors
    /// `InvalidStackId` when closed.
    pub fn change_simple_pairing_parameters(
        &mut self,
        io_capability: IoCapability,
        mitm_protection: bool,
    ) -> CommandResult {
        self.require_stack()?;
        self.pairing
            .set_simple_pairing_parameters(io_capability, mitm_protection);
        info!(
            "[GAP] IO capability {}, MITM {}",
            io_capability.name(),
            mitm_protection
        );
        Ok(())
    }

    /// Require authentication on incoming connections
    ///
    /// # Errors
    /// `FunctionError` when the stack refuses.
    pub fn set_authentication_mode(&mut self, required: bool) -> CommandResult {
        self.require_stack()?;
        self.stack
            .set_server_authentication(required)
            .map_err(|e| stack_failure("Set authentication mode", e))?;
        self.gap.authentication_required = required;
        Ok(())
    }

    /// Local controller address
    ///
    /// # Errors
    /// `FunctionError` when the stack refuses.
    pub fn local_address(&mut self) -> Result<BluetoothAddress, CommandError> {
        self.require_stack()?;
        let addr = self
            .stack
            .local_address()
            .map_err(|e| stack_failure("Get local address", e))?;
        info!("[GAP] Local address {}", addr.format_hex().as_str());
        Ok(addr)
    }

    /// Set the local friendly name
    ///
    /// # Errors
    /// `FunctionError` when the stack refuses.
    pub fn set_local_name(&mut self, name: &str) -> CommandResult {
        self.require_stack()?;
        self.stack
            .set_local_name(name)
            .map_err(|e| stack_failure("Set local name", e))
    }

    /// Local friendly name
    ///
    /// # Errors
    /// `FunctionError` when the stack refuses.
    pub fn local_name(&mut self) -> Result<DeviceName, CommandError> {
        self.require_stack()?;
        let name = self
            .stack
            .local_name()
            .map_err(|e| stack_failure("Get local name", e))?;
        info!("[GAP] Local name {}", name.as_str());
        Ok(name)
    }

    /// Set the local Class of Device
    ///
    /// # Errors
    /// `FunctionError` when the stack refuses.
    pub fn set_class_of_device(&mut self, class_of_device: ClassOfDevice) -> CommandResult {
        self.require_stack()?;
        self.stack
            .set_class_of_device(class_of_device)
            .map_err(|e| stack_failure("Set class of device", e))
    }

    /// Local Class of Device
    ///
    /// # Errors
    /// `FunctionError` when the stack refuses.
    pub fn class_of_device(&mut self) -> Result<ClassOfDevice, CommandError> {
        self.require_stack()?;
        let class_of_device = self
            .stack
            .class_of_device()
            .map_err(|e| stack_failure("Get class of device", e))?;
        info!("[GAP] Class of device {}", class_of_device.raw());
        Ok(class_of_device)
    }

    /// Ask an inquired device for its name
    ///
    /// # Errors
    /// `InvalidParameters` for an unknown index, `FunctionError` when the stack
    /// refuses.
    pub fn request_remote_name(&mut self, index: u32) -> CommandResult {
        self.require_stack()?;
        let addr = self.device(index)?;
        self.stack
            .request_remote_name(addr)
            .map_err(|e| stack_failure("Remote name request", e))
    }

    /// Search an inquired device for a service UUID
    ///
    /// # Errors
    /// `InvalidParameters` for an unknown index, `FunctionError` when the stack
    /// refuses.
    pub fn service_discovery(&mut self, index: u32, uuid: u32) -> CommandResult {
        self.require_stack()?;
        let addr = self.device(index)?;
        self.stack
            .service_search(addr, uuid)
            .map_err(|e| stack_failure("Service discovery", e))
    }

    /// Delete every stored link key
    ///
    /// # Errors
    /// `InvalidStackId` when closed.
    pub fn clear_saved_link_keys(&mut self) -> CommandResult {
        self.require_stack()?;
        let removed = self.link_keys.delete(&BluetoothAddress::ZERO);
        info!("[GAP] {} link keys removed", removed);
        Ok(())
    }

    /// Configure the debug sink, or disable it with `None`
    ///
    /// # Errors
    /// `FunctionError` when the stack refuses.
    pub fn enable_debug(&mut self, config: Option<DebugConfig>) -> CommandResult {
        self.require_stack()?;
        self.stack
            .enable_debug(config.as_ref())
            .map_err(|e| stack_failure("Enable debug", e))?;
        self.gap.debug = config;
        Ok(())
    }
}
