//! Discovered device cache
//!
//! Bounded set of remote devices reported by inquiry. Operator commands refer
//! to devices by their 1-based position in discovery order, so the cache keeps
//! insertion order and never evicts.

use crate::{BluetoothAddress, ClassOfDevice, constants::MAX_DISCOVERED_DEVICES};
use heapless::{FnvIndexMap, String};

/// Device name as reported by a remote name request
pub type DeviceName = String<{ crate::constants::MAX_DEVICE_NAME_LENGTH }>;

/// A device seen during inquiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    /// Bluetooth device address (`BD_ADDR`)
    pub addr: BluetoothAddress,
    /// Class of Device reported in the inquiry result, if any
    pub class_of_device: Option<ClassOfDevice>,
    /// Remote name, once a name request has completed
    pub name: Option<DeviceName>,
}

impl DiscoveredDevice {
    /// Create a new entry without class or name
    #[must_use]
    pub fn new(addr: BluetoothAddress) -> Self {
        Self {
            addr,
            class_of_device: None,
            name: None,
        }
    }
}

/// Bounded, insertion-ordered set of discovered devices
#[derive(Debug, Default)]
pub struct DeviceCache {
    devices: FnvIndexMap<BluetoothAddress, DiscoveredDevice, MAX_DISCOVERED_DEVICES>,
}

impl DeviceCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self {
            devices: FnvIndexMap::new(),
        }
    }

    /// Insert a device, returning its 0-based slot
    ///
    /// A device already present keeps its slot; a class of device reported
    /// again refreshes the stored one. Returns `None` when the cache is full.
    pub fn insert(
        &mut self,
        addr: BluetoothAddress,
        class_of_device: Option<ClassOfDevice>,
    ) -> Option<usize> {
        if let Some(slot) = self.devices.keys().position(|known| *known == addr) {
            if let (Some(device), Some(_)) = (self.devices.get_mut(&addr), class_of_device) {
                device.class_of_device = class_of_device;
            }
            return Some(slot);
        }

        let mut device = DiscoveredDevice::new(addr);
        device.class_of_device = class_of_device;
        self.devices.insert(addr, device).ok()?;
        Some(self.devices.len() - 1)
    }

    /// Record the remote name of a known device
    ///
    /// Returns `false` if the device is not in the cache.
    pub fn set_name(&mut self, addr: &BluetoothAddress, name: &str) -> bool {
        let Some(device) = self.devices.get_mut(addr) else {
            return false;
        };
        let mut stored = DeviceName::new();
        for c in name.chars() {
            if stored.push(c).is_err() {
                break;
            }
        }
        device.name = Some(stored);
        true
    }

    /// Look up a device by its 1-based operator index
    #[must_use]
    pub fn by_index(&self, index: u32) -> Option<&DiscoveredDevice> {
        let slot = usize::try_from(index).ok()?.checked_sub(1)?;
        self.devices.values().nth(slot)
    }

    /// Whether the address is in the cache
    #[must_use]
    pub fn contains(&self, addr: &BluetoothAddress) -> bool {
        self.devices.contains_key(addr)
    }

    /// Iterate devices in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &DiscoveredDevice> {
        self.devices.values()
    }

    /// Number of cached devices
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether the cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Forget every device (done at the start of each inquiry)
    pub fn clear(&mut self) {
        self.devices.clear();
    }
}
