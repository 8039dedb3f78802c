//! Single round trip to the host.

use tracing::debug;

use crate::error::BridgeError;
use crate::host::HostPort;

/// What came back from one dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Success(String),
    /// Host-reported error message, untransformed.
    Failure(String),
}

impl DispatchOutcome {
    pub fn into_result(self) -> Result<String, BridgeError> {
        match self {
            DispatchOutcome::Success(text) => Ok(text),
            DispatchOutcome::Failure(msg) => Err(BridgeError::HostExecution(msg)),
        }
    }
}

/// Send `command` to the host exactly once.
///
/// `capture` selects whether the host returns its output (`true`) or shows it
/// itself.  Blocks until the host answers.
pub fn dispatch(host: &dyn HostPort, command: &str, capture: bool) -> DispatchOutcome {
    debug!(command, capture, "dispatching host command");
    let reply = host.execute_command(command, capture);
    if reply.had_error {
        debug!(command, error = %reply.output, "host command failed");
        DispatchOutcome::Failure(reply.output)
    } else {
        DispatchOutcome::Success(reply.output)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ScriptedHost;

    #[test]
    fn success_carries_payload() {
        let host = ScriptedHost::new().reply("Get", "42");
        assert_eq!(dispatch(&host, "Get number", true), DispatchOutcome::Success("42".into()));
    }

    #[test]
    fn failure_message_is_verbatim() {
        let host = ScriptedHost::new().fail("Read", "no such file");
        let outcome = dispatch(&host, "Read from file x", true);
        assert_eq!(outcome, DispatchOutcome::Failure("no such file".into()));
    }

    #[test]
    fn failure_surfaces_with_error_prefix() {
        let host = ScriptedHost::new().fail("Read", "no such file");
        let err = dispatch(&host, "Read", true).into_result().unwrap_err();
        assert_eq!(err, BridgeError::HostExecution("no such file".into()));
        assert_eq!(err.to_string(), "Error: no such file");
    }

    #[test]
    fn exactly_one_host_call() {
        let host = ScriptedHost::new();
        dispatch(&host, "Play", false);
        assert_eq!(host.commands().len(), 1);
        assert!(!host.commands()[0].divert);
    }
}
