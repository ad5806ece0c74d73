//! Operator line interpreter
//!
//! Turns one operator line into one [`CommandResult`]. `QUIT` ends the
//! session before the table is consulted; while a current-calls list is being
//! typed in, lines are list entries rather than commands.

use crate::{
    command::{CommandError, CommandResult, CommandTable, TableFull, parse},
    session::Session,
    stack::{Role, Stack},
    verb,
};

/// Verb that ends the session
pub const QUIT: &str = "QUIT";

/// Verb table for one role
pub struct Shell<'h, S> {
    role: Role,
    table: CommandTable<'h, Session<S>>,
}

impl<S: Stack> Shell<'_, S> {
    /// Table holding the common verbs and those of `role`
    ///
    /// # Errors
    /// `TableFull` when the verb set does not fit the table.
    pub fn new(role: Role) -> Result<Self, TableFull> {
        let mut table = CommandTable::new();
        verb::register(&mut table, role)?;
        debug!("[COMMAND] {} verbs for {}", table.len(), role.name());
        Ok(Self { role, table })
    }

    /// Role the verbs were chosen for
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Registered verb names in resolution order
    pub fn verbs(&self) -> impl Iterator<Item = &str> + '_ {
        self.table.names()
    }

    /// Interpret one line against `session`
    ///
    /// # Errors
    /// `Exit` for `QUIT`, otherwise the parse or command failure.
    pub fn execute(&self, session: &mut Session<S>, line: &str) -> CommandResult {
        if is_quit(line) {
            info!("[COMMAND] Quit");
            return Err(CommandError::Exit);
        }
        let result = if session.calls().is_authoring() {
            session.submit_call_list_line(line)
        } else {
            parse(line).and_then(|command| self.table.dispatch(session, &command))
        };
        match result {
            Ok(()) => debug!("[COMMAND] Ok"),
            Err(CommandError::InvalidCommand) => warn!("[COMMAND] Invalid command"),
            Err(CommandError::NoCommand) => {}
            Err(e) => warn!("[COMMAND] {:?} ({})", e, e.code()),
        }
        result
    }
}

fn is_quit(line: &str) -> bool {
    let mut tokens = line.split_ascii_whitespace();
    tokens
        .next()
        .is_some_and(|verb| verb.eq_ignore_ascii_case(QUIT))
        && tokens.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        BluetoothAddress,
        command::result_code,
        event::{PortEvent, TransportEvent},
        session::{
            SessionOptions,
            testing::{MockStack, StackCall},
        },
        stack::{DiscoverabilityMode, HfpRequest, StackError},
    };

    fn open(role: Role) -> (Shell<'static, MockStack>, Session<MockStack>) {
        let mut session = Session::new(
            MockStack::new(),
            SessionOptions {
                role,
                ..SessionOptions::default()
            },
        );
        session.open().unwrap();
        (Shell::new(role).unwrap(), session)
    }

    #[test]
    fn test_discoverability_scenario() {
        let (shell, mut session) = open(Role::HandsFree);
        assert_eq!(
            result_code(&shell.execute(&mut session, "SetDiscoverabilityMode 2")),
            0
        );
        assert_eq!(
            result_code(&shell.execute(&mut session, "SetDiscoverabilityMode 9")),
            -6
        );
        assert_eq!(session.gap().discoverability, DiscoverabilityMode::General);
        assert_eq!(
            session
                .stack()
                .calls
                .iter()
                .filter(|call| matches!(call, StackCall::SetDiscoverability(_)))
                .count(),
            1
        );
    }

    #[test]
    fn test_sdp_failure_scenario() {
        let (shell, mut session) = open(Role::AudioGateway);
        session.stack_mut().fail_sdp = Some(StackError(-12));
        assert_eq!(
            shell.execute(&mut session, "OpenAudioGatewayServer 1"),
            Err(CommandError::FunctionError)
        );
        assert_eq!(session.ports().server_port(), None);
        assert!(
            session
                .stack()
                .calls
                .iter()
                .any(|call| matches!(call, StackCall::ClosePort(_)))
        );
    }

    #[test]
    fn test_indicator_scenario() {
        let (shell, mut session) = open(Role::AudioGateway);
        assert_eq!(
            result_code(&shell.execute(&mut session, "UpdateControlIndicators 3 10")),
            -6
        );
        assert_eq!(
            result_code(&shell.execute(&mut session, "UpdateControlIndicators 3 2")),
            0
        );
        assert_eq!(session.indicators().get(3).unwrap().value, 2);
    }

    #[test]
    fn test_closed_session() {
        let (shell, _) = open(Role::HandsFree);
        let mut session = Session::new(MockStack::new(), SessionOptions::default());
        assert_eq!(
            result_code(&shell.execute(&mut session, "Inquiry")),
            -8
        );
        assert_eq!(
            result_code(&shell.execute(&mut session, "GetLocalAddress")),
            -8
        );
    }

    #[test]
    fn test_quit() {
        let (shell, mut session) = open(Role::HandsFree);
        assert_eq!(shell.execute(&mut session, "quit"), Err(CommandError::Exit));
        assert_eq!(shell.execute(&mut session, " QUIT \r\n"), Err(CommandError::Exit));
        // QUIT is exact, never a prefix
        assert_eq!(
            shell.execute(&mut session, "QUIT now"),
            Err(CommandError::InvalidCommand)
        );
        assert_eq!(
            shell.execute(&mut session, "QUITE"),
            Err(CommandError::InvalidCommand)
        );
        assert!(session.stack_id().is_some());
    }

    #[test]
    fn test_line_errors() {
        let (shell, mut session) = open(Role::HandsFree);
        assert_eq!(shell.execute(&mut session, "  "), Err(CommandError::NoCommand));
        assert_eq!(
            shell.execute(&mut session, "Frobnicate"),
            Err(CommandError::InvalidCommand)
        );
        assert_eq!(
            shell.execute(&mut session, "Pair 1 2 3 4 5 6 7 8 9 10 11"),
            Err(CommandError::TooManyParameters)
        );
    }

    #[test]
    fn test_role_verbs() {
        let (shell, mut session) = open(Role::HandsFree);
        assert_eq!(shell.role(), Role::HandsFree);
        assert!(shell.verbs().any(|name| name == "DialPhoneNumber"));
        assert_eq!(
            shell.execute(&mut session, "RingIndication"),
            Err(CommandError::InvalidCommand)
        );
    }

    #[test]
    fn test_call_list_authoring() {
        let (shell, mut session) = open(Role::AudioGateway);
        shell.execute(&mut session, "OpenAudioGatewayServer 1").unwrap();
        let port = session.ports().server_port().unwrap();
        session.handle_event(TransportEvent::Port {
            port,
            event: PortEvent::OpenIndication {
                addr: BluetoothAddress::new([1, 2, 3, 4, 5, 6]),
            },
        });
        session.handle_event(TransportEvent::Port {
            port,
            event: PortEvent::ServiceLevelConnected { wideband: false },
        });

        shell.execute(&mut session, "SendCallListEntry").unwrap();
        assert!(session.calls().is_authoring());
        // lines are entries now, not verbs
        assert_eq!(
            shell.execute(&mut session, "Inquiry"),
            Err(CommandError::InvalidParameters)
        );
        shell.execute(&mut session, "1 0 0 0 5551234 129 0").unwrap();
        shell.execute(&mut session, "0 1 0 0 5559876 129 1").unwrap();
        assert!(!session.calls().is_authoring());
        assert_eq!(
            session
                .stack()
                .sent()
                .iter()
                .filter(|request| matches!(request, HfpRequest::CurrentCallsEntry { .. }))
                .count(),
            2
        );
        assert_eq!(shell.execute(&mut session, "quit"), Err(CommandError::Exit));
    }
}
