//! `handsfree` Constants
//!
//! Capacity limits and protocol defaults used throughout the session core.
//! The capacities are part of the observable behaviour: tables never grow past
//! them, and inserts into a full table fail or are dropped instead of evicting.

/// Maximum number of verbs in the command table
pub const MAX_COMMANDS: usize = 64;

/// Maximum number of parameters following a verb
pub const MAX_PARAMETERS: usize = 10;

/// Maximum length of one operator input line
pub const MAX_COMMAND_LENGTH: usize = 256;

/// Maximum length of a single verb or parameter token
pub const MAX_TOKEN_LENGTH: usize = 64;

/// Maximum number of stored link keys (must be a power of two)
pub const MAX_LINK_KEYS: usize = 16;

/// Maximum number of discovered devices kept from an inquiry (must be a power of two)
pub const MAX_DISCOVERED_DEVICES: usize = 32;

/// Maximum number of peer indicators tracked for notification
pub const MAX_NOTIFICATIONS: usize = 20;

/// Number of characters compared when matching indicator names
pub const MAX_INDICATOR_NAME_LENGTH: usize = 16;

/// Maximum number of entries in the current calls list
pub const MAX_CALL_LIST_ENTRIES: usize = 16;

/// Maximum phone number length
pub const MAX_PHONE_NUMBER_LENGTH: usize = 32;

/// Maximum device name length in bytes
pub const MAX_DEVICE_NAME_LENGTH: usize = 32;

/// Maximum PIN code length in bytes
pub const MAX_PIN_CODE_LENGTH: usize = 16;

/// Largest passkey accepted from the operator (six decimal digits)
pub const MAX_PASSKEY: u32 = 999_999;

/// Maximum SCO frame length handled by the audio path
pub const MAX_AUDIO_FRAME_LENGTH: usize = 240;

/// Depth of each message queue between the transport, the operator and the session
pub const MAX_QUEUED_MESSAGES: usize = 8;

/// Default inquiry duration in 1.28s units
pub const DEFAULT_INQUIRY_LENGTH: u8 = 10;

/// Highest speaker/microphone gain value
pub const MAX_GAIN: u8 = 15;

/// Default HFP service name advertised in the SDP record
pub const DEFAULT_SERVICE_NAME: &str = "Hands-Free";

/// Default ASCII debug log file name
pub const DEFAULT_ASCII_LOG_FILE: &str = "hfp_debug.log";

/// Default binary snoop log file name
pub const DEFAULT_SNOOP_LOG_FILE: &str = "hfp_snoop.log";

/// Default terminal device for interactive debug output
pub const DEFAULT_TERMINAL: &str = "/dev/tty";
