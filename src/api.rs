//! Handsfree API functions
//!
//! Entry points for the two producers of the default [`MAILBOX`]: the lower
//! stack's callback, which posts transport events, and the operator, whose
//! lines are executed one by one with their results returned.
//!
//! # Usage
//!
//! ```rust,ignore
//! use handsfree::api::{post_event, run_console};
//!
//! // From the stack's callback
//! if post_event(event).is_err() {
//!     // queue full, the event was handed back
//! }
//!
//! // In the operator task
//! run_console(&mut uart_lines).await;
//! ```

use crate::{
    command::{CommandError, CommandLine, CommandResult, result_code},
    event::TransportEvent,
    processor::MAILBOX,
    shell::QUIT,
};

/// Source of operator lines
#[allow(async_fn_in_trait)]
pub trait LineSource {
    /// Next line, or `None` once the input is closed
    async fn read_line(&mut self) -> Option<CommandLine>;
}

/// Queue a transport event for the processor without waiting.
///
/// # Errors
///
/// Hands the event back when the queue is full.
pub fn post_event(event: TransportEvent) -> Result<(), TransportEvent> {
    MAILBOX.post_event(event)
}

/// Execute one operator line and wait for its result.
///
/// # Errors
///
/// Returns the command's failure, or `Exit` once the session has ended.
pub async fn submit_line(line: CommandLine) -> CommandResult {
    MAILBOX.submit_line(line).await
}

/// Read-eval loop over `source`
///
/// Every line's result code is logged. Closed input is treated as `QUIT`.
/// Returns once the session has ended.
pub async fn run_console(source: &mut impl LineSource) {
    loop {
        let line = match source.read_line().await {
            Some(line) => line,
            None => {
                info!("[COMMAND] Input closed");
                let mut quit = CommandLine::new();
                // QUIT fits any line buffer
                quit.push_str(QUIT).ok();
                quit
            }
        };
        let result = submit_line(line).await;
        info!("[COMMAND] Result: {}", result_code(&result));
        if result == Err(CommandError::Exit) {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        processor::run,
        session::{
            Session, SessionOptions,
            testing::{MockStack, StackCall},
        },
        shell::Shell,
        stack::{DiscoverabilityMode, Role},
    };
    use embassy_futures::{block_on, join::join};
    use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, mutex::Mutex};

    struct Script(std::vec::IntoIter<&'static str>);

    impl LineSource for Script {
        async fn read_line(&mut self) -> Option<CommandLine> {
            self.0.next().map(|line| CommandLine::try_from(line).unwrap())
        }
    }

    #[test]
    fn test_console_quits_at_end_of_input() {
        let session: Mutex<CriticalSectionRawMutex, _> =
            Mutex::new(Session::new(MockStack::new(), SessionOptions::default()));
        let shell = Shell::new(Role::HandsFree).unwrap();
        let mut script =
            Script(std::vec!["SetDiscoverabilityMode 2", "Bogus", "Inquiry"].into_iter());

        let (ended, ()) = block_on(join(
            run(&session, &shell, &MAILBOX),
            run_console(&mut script),
        ));

        assert_eq!(ended, Ok(()));
        let session = session.try_lock().unwrap();
        assert_eq!(session.stack_id(), None);
        assert_eq!(session.gap().discoverability, DiscoverabilityMode::General);
        assert!(
            session
                .stack()
                .calls
                .iter()
                .any(|call| matches!(call, StackCall::StartInquiry(..)))
        );
        assert!(session.stack().calls.contains(&StackCall::Shutdown(1)));
    }
}
