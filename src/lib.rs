//! # handsfree
//!
//! Session core of a Bluetooth Hands-Free Profile endpoint, usable as either
//! the Audio Gateway (the phone side) or the Hands-Free unit (the car kit
//! side), for `no_std` targets.
//!
//! The crate owns the state a profile endpoint has to keep consistent:
//!
//! * discovered devices and stored link keys
//! * the pairing state machine, from legacy PIN to Secure Simple Pairing
//! * server and client port handles and the service level connection
//! * control indicators, call state and the current-calls list
//! * SCO audio setup, codec negotiation and the tone and loopback test modes
//!
//! The radio, RFCOMM and SDP live behind the [`Stack`] trait. Requests go down
//! synchronously; their outcomes come back later as [`TransportEvent`]s.
//!
//! Operators drive a [`Session`] with text lines such as `Pair 1` or
//! `UpdateControlIndicators 3 2`. A [`Shell`] resolves the verb by prefix,
//! parses the parameters and returns a signed result code, 0 on success.
//!
//! [`processor::run`] serializes transport events and operator lines through
//! bounded queues, so the session is only ever touched by one task:
//!
//! ```rust,ignore
//! let session = Mutex::<CriticalSectionRawMutex, _>::new(Session::new(stack, options));
//! let shell = Shell::new(Role::HandsFree)?;
//! join(
//!     processor::run(&session, &shell, &processor::MAILBOX),
//!     api::run_console(&mut uart_lines),
//! )
//! .await;
//! ```
//!
//! ## Features
//!
//! * `defmt`: log through `defmt`
//! * `log`: log through the `log` facade
#![no_std]
#![warn(missing_docs)]
#![allow(clippy::too_many_lines)]

#[cfg(test)]
extern crate std;

// must come first, the other modules use its macros
mod fmt;

mod address;
pub mod api;
pub mod audio;
pub mod call;
mod class_of_device;
pub mod command;
pub mod constants;
pub mod device_cache;
pub mod event;
pub mod indicator;
pub mod link_key;
pub mod pairing;
pub mod port;
pub mod processor;
pub mod session;
pub mod shell;
pub mod stack;
pub mod verb;

pub use address::{BluetoothAddress, InvalidAddress};
pub use class_of_device::{ClassOfDevice, MajorDeviceClass};
pub use command::{CommandError, CommandResult};
pub use event::TransportEvent;
pub use session::{Session, SessionOptions};
pub use shell::Shell;
pub use stack::{Role, Stack, StackError};
