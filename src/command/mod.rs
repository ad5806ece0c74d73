//! Operator command parsing and result codes
//!
//! A command line is split on spaces, tabs, CR and LF. The first token is the
//! verb, the rest are positional parameters. Each parameter keeps its text and a
//! best-effort unsigned value, so handlers can read either.

pub mod table;

use crate::{
    audio::AudioError,
    call::CallError,
    constants::{MAX_COMMAND_LENGTH, MAX_PARAMETERS, MAX_TOKEN_LENGTH},
    indicator::IndicatorError,
    link_key::LinkKeyError,
    pairing::PairingError,
    port::PortError,
    stack::StackError,
};
use core::fmt;
use heapless::{String, Vec};

pub use table::{CommandHandler, CommandTable, TableFull};

/// One token of a command line
pub type Token = String<MAX_TOKEN_LENGTH>;

/// Operator line as queued to the processor
pub type CommandLine = String<MAX_COMMAND_LENGTH>;

/// Parameter list of one command
pub type Parameters = Vec<Parameter, MAX_PARAMETERS>;

/// Reasons a command fails, with their signed result codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Empty line
    NoCommand,
    /// Verb matches no registered command
    InvalidCommand,
    /// Session end requested
    Exit,
    /// The handler or the stack failed
    FunctionError,
    /// More parameters than a command can carry
    TooManyParameters,
    /// Missing or out-of-range parameters
    InvalidParameters,
    /// The stack could not be brought up
    UnableToInitializeStack,
    /// No initialized stack
    InvalidStackId,
}

impl CommandError {
    /// Signed result code
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::NoCommand => -1,
            Self::InvalidCommand => -2,
            Self::Exit => -3,
            Self::FunctionError => -4,
            Self::TooManyParameters => -5,
            Self::InvalidParameters => -6,
            Self::UnableToInitializeStack => -7,
            Self::InvalidStackId => -8,
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoCommand => "no command given",
            Self::InvalidCommand => "invalid command",
            Self::Exit => "exit",
            Self::FunctionError => "function error",
            Self::TooManyParameters => "too many parameters",
            Self::InvalidParameters => "invalid parameters",
            Self::UnableToInitializeStack => "unable to initialize stack",
            Self::InvalidStackId => "stack not initialized",
        };
        f.write_str(text)
    }
}

/// Outcome of one command
pub type CommandResult = Result<(), CommandError>;

/// Signed result code of a command outcome (0 on success)
#[must_use]
pub const fn result_code(result: &CommandResult) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => e.code(),
    }
}

impl From<StackError> for CommandError {
    fn from(_: StackError) -> Self {
        Self::FunctionError
    }
}

impl From<PortError> for CommandError {
    fn from(_: PortError) -> Self {
        Self::FunctionError
    }
}

impl From<LinkKeyError> for CommandError {
    fn from(_: LinkKeyError) -> Self {
        Self::FunctionError
    }
}

impl From<PairingError> for CommandError {
    fn from(e: PairingError) -> Self {
        match e {
            PairingError::NotInProgress => Self::FunctionError,
            PairingError::InvalidPin | PairingError::InvalidPasskey => Self::InvalidParameters,
        }
    }
}

impl From<IndicatorError> for CommandError {
    fn from(e: IndicatorError) -> Self {
        match e {
            IndicatorError::InvalidIndex | IndicatorError::InvalidValue => Self::InvalidParameters,
            IndicatorError::RegistryFull => Self::FunctionError,
        }
    }
}

impl From<CallError> for CommandError {
    fn from(_: CallError) -> Self {
        Self::InvalidParameters
    }
}

impl From<AudioError> for CommandError {
    fn from(e: AudioError) -> Self {
        match e {
            AudioError::UnsupportedCodec => Self::InvalidParameters,
            AudioError::NotDisconnected | AudioError::NotConnected | AudioError::Stack(_) => {
                Self::FunctionError
            }
        }
    }
}

/// One positional parameter
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Parameter {
    text: Token,
    number: Option<u32>,
}

impl Parameter {
    /// Parse a parameter from its token
    ///
    /// # Errors
    /// `InvalidParameters` when the token is longer than 64 bytes.
    pub fn new(text: &str) -> Result<Self, CommandError> {
        Ok(Self {
            text: Token::try_from(text).map_err(|()| CommandError::InvalidParameters)?,
            number: parse_number(text),
        })
    }

    /// Raw token
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Unsigned value, or 0 when the token is not a number
    #[must_use]
    pub fn value(&self) -> u32 {
        self.number.unwrap_or(0)
    }

    /// Unsigned value, or `None` when the token is not a number
    #[must_use]
    pub const fn number(&self) -> Option<u32> {
        self.number
    }
}

/// Decimal, or hexadecimal with a `0x` prefix
fn parse_number(text: &str) -> Option<u32> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// A parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    verb: Token,
    parameters: Parameters,
}

impl Command {
    /// Verb as typed
    #[must_use]
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// Positional parameters
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }
}

fn tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split([' ', '\t', '\r', '\n'])
        .filter(|token| !token.is_empty())
}

/// Split a command line into verb and parameters
///
/// # Errors
/// `NoCommand` for a blank line, `InvalidCommand` for an over-long verb,
/// `TooManyParameters` beyond ten parameters, `InvalidParameters` for an
/// over-long parameter.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let mut tokens = tokens(line);
    let verb = tokens.next().ok_or(CommandError::NoCommand)?;
    let verb = Token::try_from(verb).map_err(|()| CommandError::InvalidCommand)?;
    let parameters = collect_parameters(tokens)?;
    Ok(Command { verb, parameters })
}

/// Split a line made only of parameters
///
/// # Errors
/// As [`parse`], except that a blank line yields an empty list.
pub fn parse_parameters(line: &str) -> Result<Parameters, CommandError> {
    collect_parameters(tokens(line))
}

fn collect_parameters<'a>(
    tokens: impl Iterator<Item = &'a str>,
) -> Result<Parameters, CommandError> {
    let mut parameters = Parameters::new();
    for token in tokens {
        parameters
            .push(Parameter::new(token)?)
            .map_err(|_| CommandError::TooManyParameters)?;
    }
    Ok(parameters)
}

/// Join the raw text of `parameters` with single spaces
///
/// Used by verbs whose last argument is free text, such as a device name.
#[must_use]
pub fn join_parameters<const N: usize>(parameters: &[Parameter]) -> Option<String<N>> {
    let mut joined = String::new();
    for (i, parameter) in parameters.iter().enumerate() {
        if i > 0 {
            joined.push(' ').ok()?;
        }
        joined.push_str(parameter.as_str()).ok()?;
    }
    Some(joined)
}
