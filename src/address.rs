use core::fmt;

/// Error returned when a textual or raw Bluetooth address is malformed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidAddress;

impl fmt::Display for InvalidAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid Bluetooth device address")
    }
}

/// A Bluetooth Device Address (`BD_ADDR`) wrapper for type safety
///
/// The all-zero address is reserved: the session uses it as "no device"
/// (no pairing in flight) and as the wildcard for "all link keys".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BluetoothAddress(pub [u8; 6]);

impl BluetoothAddress {
    /// The all-zero address
    pub const ZERO: Self = Self([0; 6]);

    /// Create a new Bluetooth address from bytes
    #[must_use]
    pub const fn new(addr: [u8; 6]) -> Self {
        Self(addr)
    }

    /// Get the raw address bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Whether this is the all-zero address
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Format the address as a colon-separated hex string
    #[must_use]
    pub fn format_hex(&self) -> heapless::String<17> {
        const HEX: &[u8; 16] = b"0123456789ABCDEF";
        let mut result = heapless::String::new();
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                result.push(':').ok();
            }
            result.push(char::from(HEX[usize::from(byte >> 4)])).ok();
            result.push(char::from(HEX[usize::from(byte & 0x0F)])).ok();
        }
        result
    }

    /// Parse a Bluetooth address from a colon-separated hex string
    ///
    /// # Errors
    /// Returns an error if the string is not exactly 17 characters long or
    /// contains invalid characters
    pub fn from_hex(hex: &str) -> Result<Self, InvalidAddress> {
        if hex.len() != 17 || !hex.chars().all(|c| c.is_ascii_hexdigit() || c == ':') {
            return Err(InvalidAddress);
        }

        let mut bytes = [0u8; 6];
        for (i, byte) in hex.split(':').enumerate() {
            if i >= 6 || byte.len() != 2 {
                return Err(InvalidAddress);
            }
            bytes[i] = u8::from_str_radix(byte, 16).map_err(|_| InvalidAddress)?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for BluetoothAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.format_hex().as_str())
    }
}

impl From<[u8; 6]> for BluetoothAddress {
    fn from(addr: [u8; 6]) -> Self {
        Self(addr)
    }
}

impl From<BluetoothAddress> for [u8; 6] {
    fn from(addr: BluetoothAddress) -> Self {
        addr.0
    }
}

impl From<BluetoothAddress> for bt_hci::param::BdAddr {
    fn from(addr: BluetoothAddress) -> Self {
        bt_hci::param::BdAddr::new(addr.0)
    }
}

impl TryFrom<&str> for BluetoothAddress {
    type Error = InvalidAddress;

    fn try_from(hex: &str) -> Result<Self, Self::Error> {
        BluetoothAddress::from_hex(hex)
    }
}

impl TryFrom<&[u8]> for BluetoothAddress {
    type Error = InvalidAddress;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let addr: [u8; 6] = bytes.try_into().map_err(|_| InvalidAddress)?;
        Ok(BluetoothAddress(addr))
    }
}

impl TryFrom<bt_hci::param::BdAddr> for BluetoothAddress {
    type Error = InvalidAddress;

    fn try_from(bd_addr: bt_hci::param::BdAddr) -> Result<Self, Self::Error> {
        bd_addr.raw().try_into()
    }
}
