//! Session processor
//!
//! Transport callbacks and the operator both talk to the session through a
//! [`Mailbox`]. A single task running [`run`] drains it and applies every
//! message under the session mutex, one message at a time, so handlers never
//! interleave.
//!
//! # Usage
//!
//! The lower stack's callback posts events with [`crate::api::post_event`];
//! the operator task feeds lines with [`crate::api::run_console`]; a third
//! task owns the loop:
//!
//! ```rust,ignore
//! let session = Mutex::<CriticalSectionRawMutex, _>::new(Session::new(stack, options));
//! let shell = Shell::new(Role::HandsFree)?;
//! processor::run(&session, &shell, &processor::MAILBOX).await?;
//! ```

use crate::{
    command::{CommandError, CommandLine, CommandResult},
    constants::MAX_QUEUED_MESSAGES,
    event::TransportEvent,
    session::Session,
    shell::Shell,
    stack::Stack,
};
use embassy_futures::select::{Either, select};
use embassy_sync::{
    blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex},
    channel::{Channel, TrySendError},
    mutex::Mutex,
};

/// Default queues, shared by the transport glue and the operator task
pub static MAILBOX: Mailbox<CriticalSectionRawMutex> = Mailbox::new();

/// Bounded queues between producers and the processor
pub struct Mailbox<M: RawMutex> {
    events: Channel<M, TransportEvent, MAX_QUEUED_MESSAGES>,
    lines: Channel<M, CommandLine, MAX_QUEUED_MESSAGES>,
    results: Channel<M, CommandResult, MAX_QUEUED_MESSAGES>,
}

impl<M: RawMutex> Default for Mailbox<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> Mailbox<M> {
    /// Empty queues
    #[must_use]
    pub const fn new() -> Self {
        Self {
            events: Channel::new(),
            lines: Channel::new(),
            results: Channel::new(),
        }
    }

    /// Queue a transport event without waiting
    ///
    /// # Errors
    /// Hands the event back when the queue is full.
    pub fn post_event(&self, event: TransportEvent) -> Result<(), TransportEvent> {
        self.events.try_send(event).map_err(|e| match e {
            TrySendError::Full(event) => {
                warn!("[PROCESSOR] Event queue full");
                event
            }
        })
    }

    /// Queue an operator line and wait for its result
    ///
    /// Results come back in line order; one operator task is expected.
    ///
    /// # Errors
    /// The line's command failure, `Exit` once the session ends.
    pub async fn submit_line(&self, line: CommandLine) -> CommandResult {
        self.lines.send(line).await;
        self.results.receive().await
    }
}

enum Message {
    Event(TransportEvent),
    Line(CommandLine),
}

/// Open the session and apply queued messages until the operator quits
///
/// Pending events are taken before pending lines. On `Exit` the session is
/// closed, the result is delivered and the loop returns.
///
/// # Errors
/// `UnableToInitializeStack` when the session cannot be opened.
pub async fn run<M: RawMutex, S: Stack>(
    session: &Mutex<M, Session<S>>,
    shell: &Shell<'_, S>,
    mailbox: &Mailbox<M>,
) -> CommandResult {
    session.lock().await.open()?;
    loop {
        let message = match select(mailbox.events.receive(), mailbox.lines.receive()).await {
            Either::First(event) => Message::Event(event),
            Either::Second(line) => Message::Line(line),
        };
        let result = {
            let mut session = session.lock().await;
            match message {
                Message::Event(event) => {
                    debug!("[PROCESSOR] Event: {:?}", event);
                    session.handle_event(event);
                    continue;
                }
                Message::Line(line) => {
                    debug!("[PROCESSOR] Line: {}", line.as_str());
                    let result = shell.execute(&mut session, &line);
                    if result == Err(CommandError::Exit) {
                        session.close();
                    }
                    result
                }
            }
        };
        mailbox.results.send(result).await;
        if result == Err(CommandError::Exit) {
            info!("[PROCESSOR] Session ended");
            return Ok(());
        }
    }
}
