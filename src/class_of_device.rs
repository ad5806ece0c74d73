//! Class of Device (`CoD`) field
//!
//! The Class of Device is a 24-bit field advertised during inquiry:
//! - Major Service Classes (bits 23-13)
//! - Major Device Class (bits 12-8)
//! - Minor Device Class (bits 7-2)
//! - Format Type (bits 1-0, always 0b00)
//!
//! Only the parts that matter for telephony roles are decoded here: the
//! major classes, the phone and audio minor classes and the service bits.

use core::fmt;

/// Class of Device (`CoD`) indicating device type and capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClassOfDevice {
    raw: u32,
}

impl ClassOfDevice {
    /// Hands-free unit: Audio service, Audio/Video major, Hands-free minor
    pub const HANDS_FREE: Self = Self { raw: 0x0020_0408 };

    /// Audio gateway: Audio and Telephony services, Phone major, Cellular minor
    pub const AUDIO_GATEWAY: Self = Self { raw: 0x0060_0204 };

    /// Create a `ClassOfDevice` from a raw 24-bit value
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            raw: raw & 0xFF_FFFF,
        }
    }

    /// Create a `ClassOfDevice` from its 3-byte little-endian wire form
    #[must_use]
    pub const fn from_le_bytes(bytes: [u8; 3]) -> Self {
        Self::from_raw(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]))
    }

    /// Get the raw 24-bit value
    #[must_use]
    pub const fn raw(&self) -> u32 {
        self.raw
    }

    /// Get the Major Device Class (bits 12-8)
    #[must_use]
    pub fn major_device_class(&self) -> MajorDeviceClass {
        MajorDeviceClass::from_raw(((self.raw >> 8) & 0x1F) as u8)
    }

    /// Get the Minor Device Class (bits 7-2)
    #[must_use]
    pub const fn minor_device_class(&self) -> u8 {
        ((self.raw >> 2) & 0x3F) as u8
    }

    /// Get the Major Service Classes (bits 23-13)
    #[must_use]
    pub const fn major_service_classes(&self) -> u16 {
        ((self.raw >> 13) & 0x7FF) as u16
    }

    /// Whether the Audio service bit (bit 21) is set
    #[must_use]
    pub const fn has_audio_service(&self) -> bool {
        self.raw & (1 << 21) != 0
    }

    /// Whether the Telephony service bit (bit 22) is set
    #[must_use]
    pub const fn has_telephony_service(&self) -> bool {
        self.raw & (1 << 22) != 0
    }

    /// Minor class description for phone and audio devices
    #[must_use]
    pub fn minor_description(&self) -> Option<&'static str> {
        let minor = self.minor_device_class();
        match self.major_device_class() {
            MajorDeviceClass::Phone => match minor {
                0x00 => Some("Uncategorized"),
                0x01 => Some("Cellular"),
                0x02 => Some("Cordless"),
                0x03 => Some("Smartphone"),
                0x04 => Some("Wired modem or voice gateway"),
                _ => None,
            },
            MajorDeviceClass::AudioVideo => match minor {
                0x00 => Some("Uncategorized"),
                0x01 => Some("Wearable headset device"),
                0x02 => Some("Hands-free device"),
                0x06 => Some("Headphones"),
                0x08 => Some("Car audio"),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for ClassOfDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:06X} {}", self.raw, self.major_device_class().description())?;
        if let Some(minor) = self.minor_description() {
            write!(f, " ({minor})")?;
        }
        match (self.has_audio_service(), self.has_telephony_service()) {
            (true, true) => f.write_str(" - Services: Audio, Telephony"),
            (true, false) => f.write_str(" - Services: Audio"),
            (false, true) => f.write_str(" - Services: Telephony"),
            (false, false) => Ok(()),
        }
    }
}

/// Major Device Class enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MajorDeviceClass {
    /// Miscellaneous devices
    Miscellaneous,
    /// Computer devices
    Computer,
    /// Phone devices
    Phone,
    /// LAN/Network Access Point devices
    LanNetworkAccessPoint,
    /// Audio/Video devices
    AudioVideo,
    /// Peripheral devices
    Peripheral,
    /// Uncategorized devices
    Uncategorized,
    /// Any other major class
    Other(u8),
}

impl MajorDeviceClass {
    /// Create `MajorDeviceClass` from raw 5-bit value
    #[must_use]
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => Self::Miscellaneous,
            0x01 => Self::Computer,
            0x02 => Self::Phone,
            0x03 => Self::LanNetworkAccessPoint,
            0x04 => Self::AudioVideo,
            0x05 => Self::Peripheral,
            0x1F => Self::Uncategorized,
            other => Self::Other(other),
        }
    }

    /// Get human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Miscellaneous => "Miscellaneous",
            Self::Computer => "Computer",
            Self::Phone => "Phone",
            Self::LanNetworkAccessPoint => "LAN/Network Access Point",
            Self::AudioVideo => "Audio/Video",
            Self::Peripheral => "Peripheral",
            Self::Uncategorized => "Uncategorized",
            Self::Other(_) => "Other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    #[test]
    fn test_hands_free_preset() {
        let cod = ClassOfDevice::HANDS_FREE;
        assert_eq!(cod.major_device_class(), MajorDeviceClass::AudioVideo);
        assert_eq!(cod.minor_description(), Some("Hands-free device"));
        assert!(cod.has_audio_service());
        assert!(!cod.has_telephony_service());
    }

    #[test]
    fn test_audio_gateway_preset() {
        let cod = ClassOfDevice::AUDIO_GATEWAY;
        assert_eq!(cod.major_device_class(), MajorDeviceClass::Phone);
        assert_eq!(cod.minor_description(), Some("Cellular"));
        assert!(cod.has_telephony_service());
    }

    #[test]
    fn test_raw_is_masked_to_24_bits() {
        let cod = ClassOfDevice::from_raw(0xFF20_0408);
        assert_eq!(cod.raw(), 0x0020_0408);
        assert_eq!(ClassOfDevice::from_le_bytes([0x08, 0x04, 0x20]), cod);
    }

    #[test]
    fn test_display() {
        let mut text = heapless::String::<96>::new();
        write!(text, "{}", ClassOfDevice::HANDS_FREE).unwrap();
        assert_eq!(
            text.as_str(),
            "0x200408 Audio/Video (Hands-free device) - Services: Audio"
        );
    }
}
