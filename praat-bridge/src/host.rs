//! The host boundary.
//!
//! Everything the bridge needs from Praat goes through [`HostPort`]:
//!
//! | Method                   | Praat side                                   |
//! |--------------------------|----------------------------------------------|
//! | `echo`                   | print to the Info window                     |
//! | `execute_command`        | run one command line, optionally diverting   |
//! | `get_name_of_selected`   | name of the selected object, if any          |
//!
//! [`ScriptedHost`] is an in-process stand-in that answers from a list of
//! [`ReplyRule`]s and records every call; the dry-run binary and the tests
//! drive scripts against it.

use std::sync::Mutex;

// ── HostPort ──────────────────────────────────────────────────────────────────

/// Result of one `execute_command` round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostReply {
    /// Captured output, or the error message when `had_error` is set.
    /// Empty when output was not diverted.
    pub output: String,
    pub had_error: bool,
}

impl HostReply {
    pub fn ok(output: impl Into<String>) -> Self {
        Self { output: output.into(), had_error: false }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { output: message.into(), had_error: true }
    }
}

/// Callbacks into the host application.
///
/// Calls are made one at a time from the thread running the script.  The
/// `Send + Sync` bound exists so an engine can park the port in
/// process-global state its interpreter callbacks read.
pub trait HostPort: Send + Sync {
    /// Display text on the host's output channel.  Must not fail.
    fn echo(&self, message: &str);

    /// Run `command`.  With `divert` set, output is captured and returned
    /// instead of displayed.
    fn execute_command(&self, command: &str, divert: bool) -> HostReply;

    /// Name of the currently selected object, optionally restricted to a
    /// class.
    fn get_name_of_selected(&self, class_filter: Option<&str>, inplace: bool) -> Option<String>;
}

// ── ScriptedHost ──────────────────────────────────────────────────────────────

/// Canned reply for commands beginning with `prefix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRule {
    pub prefix: String,
    pub reply: HostReply,
}

/// One command as seen by the [`ScriptedHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    pub command: String,
    pub divert: bool,
}

/// A fake host that records commands and answers from canned rules.
///
/// The first rule whose prefix matches the command wins; unmatched commands
/// succeed with empty output.  A successful `select <name>` command updates
/// the selection.
#[derive(Debug, Default)]
pub struct ScriptedHost {
    rules: Vec<ReplyRule>,
    selected: Mutex<Option<String>>,
    commands: Mutex<Vec<RecordedCommand>>,
    echoed: Mutex<String>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<ReplyRule>) -> Self {
        Self { rules, ..Self::default() }
    }

    /// Add a success rule (builder style).
    pub fn reply(mut self, prefix: impl Into<String>, output: impl Into<String>) -> Self {
        self.rules.push(ReplyRule { prefix: prefix.into(), reply: HostReply::ok(output) });
        self
    }

    /// Add a failure rule (builder style).
    pub fn fail(mut self, prefix: impl Into<String>, message: impl Into<String>) -> Self {
        self.rules.push(ReplyRule { prefix: prefix.into(), reply: HostReply::error(message) });
        self
    }

    /// Set the current selection (builder style).
    pub fn selecting(self, name: impl Into<String>) -> Self {
        *lock(&self.selected) = Some(name.into());
        self
    }

    /// Every command executed so far, in order.
    pub fn commands(&self) -> Vec<RecordedCommand> {
        lock(&self.commands).clone()
    }

    /// Just the command strings, in order.
    pub fn command_lines(&self) -> Vec<String> {
        lock(&self.commands).iter().map(|c| c.command.clone()).collect()
    }

    /// Everything echoed so far, concatenated.
    pub fn echoed(&self) -> String {
        lock(&self.echoed).clone()
    }

    /// Drain the echoed text.
    pub fn take_echoed(&self) -> String {
        std::mem::take(&mut *lock(&self.echoed))
    }

    fn find_rule(&self, command: &str) -> Option<&ReplyRule> {
        self.rules.iter().find(|r| command.starts_with(r.prefix.as_str()))
    }
}

impl HostPort for ScriptedHost {
    fn echo(&self, message: &str) {
        lock(&self.echoed).push_str(message);
    }

    fn execute_command(&self, command: &str, divert: bool) -> HostReply {
        lock(&self.commands).push(RecordedCommand { command: command.to_owned(), divert });

        let mut reply = self
            .find_rule(command)
            .map(|r| r.reply.clone())
            .unwrap_or_default();

        if !reply.had_error {
            if let Some(name) = command.strip_prefix("select ") {
                *lock(&self.selected) = Some(name.to_owned());
            }
            // Undiverted output goes to the Info window, not back to the caller.
            if !divert {
                let shown = std::mem::take(&mut reply.output);
                if !shown.is_empty() {
                    self.echo(&shown);
                    if !shown.ends_with('\n') {
                        self.echo("\n");
                    }
                }
            }
        }
        reply
    }

    fn get_name_of_selected(&self, _class_filter: Option<&str>, _inplace: bool) -> Option<String> {
        lock(&self.selected).clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatched_command_succeeds_empty() {
        let host = ScriptedHost::new();
        assert_eq!(host.execute_command("Play", true), HostReply::ok(""));
        assert_eq!(host.command_lines(), vec!["Play"]);
    }

    #[test]
    fn first_matching_rule_wins() {
        let host = ScriptedHost::new()
            .reply("Get duration", "0.5 seconds")
            .reply("Get", "never");
        assert_eq!(host.execute_command("Get duration", true).output, "0.5 seconds");
        assert_eq!(host.execute_command("Get mean", true).output, "never");
    }

    #[test]
    fn failure_rule_sets_error_flag() {
        let host = ScriptedHost::new().fail("Read from file", "File not found.");
        let reply = host.execute_command("Read from file /nope.wav", false);
        assert!(reply.had_error);
        assert_eq!(reply.output, "File not found.");
    }

    #[test]
    fn select_command_updates_selection() {
        let host = ScriptedHost::new();
        assert_eq!(host.get_name_of_selected(None, false), None);
        host.execute_command("select Sound hello", false);
        assert_eq!(host.get_name_of_selected(None, false).as_deref(), Some("Sound hello"));
    }

    #[test]
    fn failed_select_keeps_selection() {
        let host = ScriptedHost::new().fail("select", "No such object").selecting("Sound a");
        host.execute_command("select Sound b", false);
        assert_eq!(host.get_name_of_selected(None, false).as_deref(), Some("Sound a"));
    }

    #[test]
    fn undiverted_output_is_echoed() {
        let host = ScriptedHost::new().reply("Info", "some info");
        let reply = host.execute_command("Info", false);
        assert_eq!(reply.output, "");
        assert_eq!(host.echoed(), "some info\n");
    }

    #[test]
    fn records_divert_flag() {
        let host = ScriptedHost::new();
        host.execute_command("a", true);
        host.execute_command("b", false);
        let cmds = host.commands();
        assert!(cmds[0].divert);
        assert!(!cmds[1].divert);
    }

    #[test]
    fn take_echoed_drains() {
        let host = ScriptedHost::new();
        host.echo("hello\n");
        assert_eq!(host.take_echoed(), "hello\n");
        assert_eq!(host.echoed(), "");
    }
}
