//! Command table
//!
//! Verbs are resolved by case-insensitive prefix: the first registered name
//! that begins with the typed verb wins. Registration order therefore decides
//! which command a short verb reaches, and a name that begins an earlier name
//! can never be reached at all.

use super::{Command, CommandError, CommandResult, Parameter};
use crate::constants::MAX_COMMANDS;
use core::fmt;
use heapless::Vec;

/// A command bound to a name in a [`CommandTable`]
pub trait CommandHandler<C> {
    /// Run the command against `context`
    ///
    /// # Errors
    /// Returns the command's failure code.
    fn execute(&self, context: &mut C, parameters: &[Parameter]) -> CommandResult;
}

impl<C, F> CommandHandler<C> for F
where
    F: Fn(&mut C, &[Parameter]) -> CommandResult,
{
    fn execute(&self, context: &mut C, parameters: &[Parameter]) -> CommandResult {
        self(context, parameters)
    }
}

/// The table already holds the maximum number of commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TableFull;

impl fmt::Display for TableFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("command table full")
    }
}

fn begins_with(name: &str, verb: &str) -> bool {
    name.len() >= verb.len()
        && name.as_bytes()[..verb.len()].eq_ignore_ascii_case(verb.as_bytes())
}

/// Insertion-ordered table of named commands
pub struct CommandTable<'h, C> {
    entries: Vec<(&'h str, &'h dyn CommandHandler<C>), MAX_COMMANDS>,
}

impl<C> Default for CommandTable<'_, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'h, C> CommandTable<'h, C> {
    /// Empty table
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a command
    ///
    /// A name that an earlier entry already begins with is accepted but can
    /// never be resolved; this is logged.
    ///
    /// # Errors
    /// `TableFull` once 64 commands are registered.
    pub fn register(
        &mut self,
        name: &'h str,
        handler: &'h dyn CommandHandler<C>,
    ) -> Result<(), TableFull> {
        if let Some((earlier, _)) = self.resolve(name) {
            warn!("[COMMAND] {} is shadowed by {}", name, earlier);
        }
        self.entries.push((name, handler)).map_err(|_| TableFull)
    }

    /// First registered command whose name begins with `verb`
    #[must_use]
    pub fn resolve(&self, verb: &str) -> Option<(&'h str, &'h dyn CommandHandler<C>)> {
        if verb.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(name, _)| begins_with(name, verb))
            .copied()
    }

    /// Resolve and run a parsed command
    ///
    /// # Errors
    /// `InvalidCommand` when nothing matches, otherwise the handler's result.
    pub fn dispatch(&self, context: &mut C, command: &Command) -> CommandResult {
        let (name, handler) = self
            .resolve(command.verb())
            .ok_or(CommandError::InvalidCommand)?;
        trace!("[COMMAND] {} -> {}", command.verb(), name);
        handler.execute(context, command.parameters())
    }

    /// Registered names in order
    pub fn names(&self) -> impl Iterator<Item = &'h str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    /// Number of registered commands
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
