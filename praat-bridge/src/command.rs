//! Command formatting.
//!
//! Turns a verb plus typed arguments into the single command line the Praat
//! interpreter expects, e.g. `Create Sound from formula "sine 1" 1 0 1 44100`.
//!
//! # Quoting
//!
//! | Position     | Canonical text                         | Rendered      |
//! |--------------|----------------------------------------|---------------|
//! | last         | anything                               | verbatim      |
//! | not last     | contains a space                       | `"…"`         |
//! | not last     | float without a `.` (e.g. `5`)         | `"5"`         |
//! | not last     | anything else                          | verbatim      |
//!
//! Quoted text escapes `"` by doubling it; there is no backslash escaping.

use std::fmt;

// ── Arg ───────────────────────────────────────────────────────────────────────

/// A single command argument as passed from a script.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Str(String),
    /// Floating-point number.  Subject to the integral-float quoting rule.
    Num(f64),
    Int(i64),
    Bool(bool),
}

impl Arg {
    /// The natural string rendering of the value, before any quoting.
    pub fn canonical_text(&self) -> String {
        match self {
            Arg::Str(s) => s.clone(),
            Arg::Num(f) => f.to_string(),
            Arg::Int(i) => i.to_string(),
            Arg::Bool(b) => b.to_string(),
        }
    }

    /// Whether this argument must be quoted when it is not the last one.
    fn needs_quotes(&self, text: &str) -> bool {
        text.contains(' ') || (matches!(self, Arg::Num(_)) && !text.contains('.'))
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Str(s.to_owned())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Str(s)
    }
}

impl From<f64> for Arg {
    fn from(f: f64) -> Self {
        Arg::Num(f)
    }
}

impl From<i64> for Arg {
    fn from(i: i64) -> Self {
        Arg::Int(i)
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Arg::Bool(b)
    }
}

// ── Formatting ────────────────────────────────────────────────────────────────

/// Build the command line for `verb` followed by `args`.
///
/// Never fails; an empty verb is passed through unchecked.
pub fn format_command(verb: &str, args: &[Arg]) -> String {
    let mut out = String::from(verb);
    let last = args.len().saturating_sub(1);
    for (i, arg) in args.iter().enumerate() {
        out.push(' ');
        let text = arg.canonical_text();
        if i != last && arg.needs_quotes(&text) {
            push_quoted(&mut out, &text);
        } else {
            out.push_str(&text);
        }
    }
    out
}

fn push_quoted(out: &mut String, text: &str) {
    out.push('"');
    for ch in text.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
}

// ── Command ───────────────────────────────────────────────────────────────────

/// A verb with its ordered arguments.
///
/// ```
/// use praat_bridge::command::Command;
///
/// let cmd = Command::new("Create Sound").arg("my sound").arg(44100.0);
/// assert_eq!(cmd.to_string(), "Create Sound \"my sound\" 44100");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub verb: String,
    pub args: Vec<Arg>,
}

impl Command {
    pub fn new(verb: impl Into<String>) -> Self {
        Self { verb: verb.into(), args: Vec::new() }
    }

    /// Append an argument (builder style).
    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn format(&self) -> String {
        format_command(&self.verb, &self.args)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Arg {
        Arg::Str(v.to_owned())
    }

    #[test]
    fn no_args_is_verb_alone() {
        assert_eq!(format_command("Play", &[]), "Play");
    }

    #[test]
    fn single_arg_never_quoted() {
        assert_eq!(format_command("select", &[s("Sound my voice")]), "select Sound my voice");
        assert_eq!(format_command("Scale", &[Arg::Num(5.0)]), "Scale 5");
    }

    #[test]
    fn non_last_arg_with_space_is_quoted() {
        assert_eq!(
            format_command("Create Sound", &[s("my sound"), Arg::Num(0.5)]),
            "Create Sound \"my sound\" 0.5"
        );
    }

    #[test]
    fn last_arg_with_space_is_not_quoted() {
        assert_eq!(
            format_command("Rename", &[s("a"), s("new name")]),
            "Rename a new name"
        );
    }

    #[test]
    fn plain_string_not_quoted() {
        assert_eq!(
            format_command("Create Sound", &[s("myname"), Arg::Num(44100.0)]),
            "Create Sound myname 44100"
        );
    }

    #[test]
    fn integral_float_is_quoted_when_not_last() {
        assert_eq!(format_command("cmd", &[Arg::Num(5.0), Arg::Num(3.2)]), "cmd \"5\" 3.2");
    }

    #[test]
    fn fractional_float_not_quoted() {
        assert_eq!(format_command("cmd", &[Arg::Num(0.25), s("x")]), "cmd 0.25 x");
    }

    #[test]
    fn integers_and_bools_not_quoted() {
        assert_eq!(
            format_command("cmd", &[Arg::Int(5), Arg::Bool(true), Arg::Bool(false)]),
            "cmd 5 true false"
        );
    }

    #[test]
    fn embedded_quotes_doubled() {
        assert_eq!(
            format_command("Say", &[s("He said \"hi\""), s("end")]),
            "Say \"He said \"\"hi\"\"\" end"
        );
    }

    #[test]
    fn quote_without_space_left_alone() {
        // Only spaces (and integral floats) trigger quoting.
        assert_eq!(format_command("Say", &[s("a\"b"), s("end")]), "Say a\"b end");
    }

    #[test]
    fn argument_order_preserved() {
        let args = [s("one"), s("two"), s("three")];
        assert_eq!(format_command("v", &args), "v one two three");
    }

    #[test]
    fn negative_integral_float_quoted() {
        assert_eq!(format_command("Shift", &[Arg::Num(-2.0), s("x")]), "Shift \"-2\" x");
    }

    #[test]
    fn command_builder_display() {
        let cmd = Command::new("To Pitch").arg(0.0).arg(75.0).arg(600.0);
        assert_eq!(cmd.to_string(), "To Pitch \"0\" \"75\" 600");
        assert_eq!(cmd.args.len(), 3);
    }

    #[test]
    fn canonical_text_of_floats() {
        assert_eq!(Arg::Num(44100.0).canonical_text(), "44100");
        assert_eq!(Arg::Num(3.14).canonical_text(), "3.14");
    }
}
