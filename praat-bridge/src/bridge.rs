//! The functions scripts call.
//!
//! | Script function          | Capture | Returns                         |
//! |--------------------------|---------|---------------------------------|
//! | `go(cmd, …)`             | no      | nothing                         |
//! | `getString(cmd, …)`      | yes     | Info window output, verbatim    |
//! | `getNum(cmd, …)`         | yes     | leading number of the output    |
//! | `select(obj, …)`         | no      | nothing (`select`, then `plus`) |
//! | `plus(obj, …)`           | no      | nothing                         |
//! | `minus(obj, …)`          | no      | nothing                         |
//! | `remove(obj, …)`         | no      | nothing (`select…`, `Remove`)   |
//! | `selected()`             | (none)  | selected object name, or none   |
//! | `getargv()`              | (none)  | script arguments, or none       |
//! | `print(text)`            | (none)  | nothing; echoes `text` + `\n`   |
//!
//! Both engines bind these through a shared [`Bridge`] so the dialects differ
//! only in how values cross the language boundary.

use std::fmt;
use std::sync::Arc;

use crate::command::{format_command, Arg};
use crate::error::{BridgeError, BridgeResult};
use crate::gateway::dispatch;
use crate::host::HostPort;

// ── ObjectRef ─────────────────────────────────────────────────────────────────

/// A Praat object named in a selection call: either `"Sound my voice"` or
/// the class and name given apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectRef {
    Name(String),
    Typed { class: String, name: String },
}

impl ObjectRef {
    fn command_args(&self) -> Vec<Arg> {
        match self {
            ObjectRef::Name(name) => vec![Arg::Str(name.clone())],
            ObjectRef::Typed { class, name } => {
                vec![Arg::Str(class.clone()), Arg::Str(name.clone())]
            }
        }
    }
}

impl From<&str> for ObjectRef {
    fn from(name: &str) -> Self {
        ObjectRef::Name(name.to_owned())
    }
}

impl From<String> for ObjectRef {
    fn from(name: String) -> Self {
        ObjectRef::Name(name)
    }
}

impl From<(&str, &str)> for ObjectRef {
    fn from((class, name): (&str, &str)) -> Self {
        ObjectRef::Typed { class: class.to_owned(), name: name.to_owned() }
    }
}

// ── Bridge ────────────────────────────────────────────────────────────────────

/// Handle to the host, shared by every binding of one script run.
#[derive(Clone)]
pub struct Bridge {
    host: Arc<dyn HostPort>,
    argv: Option<Arc<[String]>>,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge").finish_non_exhaustive()
    }
}

impl Bridge {
    pub fn new(host: Arc<dyn HostPort>) -> Self {
        Self { host, argv: None }
    }

    /// Attach the script's command line, script name first.
    pub fn with_argv(mut self, argv: Vec<String>) -> Self {
        self.argv = Some(argv.into());
        self
    }

    /// The script's command line, if it was started with one.
    pub fn argv(&self) -> Option<&[String]> {
        self.argv.as_deref()
    }

    /// Display a line on the host's output channel.
    pub fn print(&self, message: &str) {
        self.host.echo(&format!("{message}\n"));
    }

    /// Raw text to the output channel, no newline added.
    pub fn echo(&self, text: &str) {
        self.host.echo(text);
    }

    fn run(&self, verb: &str, args: &[Arg], capture: bool) -> BridgeResult<String> {
        let command = format_command(verb, args);
        dispatch(self.host.as_ref(), &command, capture).into_result()
    }

    /// Run a command, letting the host display its output.
    pub fn go(&self, verb: &str, args: &[Arg]) -> BridgeResult<()> {
        self.run(verb, args, false).map(|_| ())
    }

    /// Run a command and return its captured output.
    pub fn get_string(&self, verb: &str, args: &[Arg]) -> BridgeResult<String> {
        self.run(verb, args, true)
    }

    /// Run a command and parse the number its output starts with.
    ///
    /// A host error is returned as-is; parsing is only attempted on success.
    pub fn get_num(&self, verb: &str, args: &[Arg]) -> BridgeResult<f64> {
        let output = self.run(verb, args, true)?;
        parse_leading_number(&output).ok_or(BridgeError::NumericParse(output))
    }

    /// Select `objects`: `select` for the first, `plus` for the rest.
    ///
    /// Stops at the first command the host rejects.
    pub fn select(&self, objects: &[ObjectRef]) -> BridgeResult<()> {
        let (first, rest) = objects.split_first().ok_or(BridgeError::NoObjects("select"))?;
        self.go("select", &first.command_args())?;
        self.each("plus", rest)
    }

    /// Add `objects` to the selection.
    pub fn plus(&self, objects: &[ObjectRef]) -> BridgeResult<()> {
        if objects.is_empty() {
            return Err(BridgeError::NoObjects("plus"));
        }
        self.each("plus", objects)
    }

    /// Drop `objects` from the selection.
    pub fn minus(&self, objects: &[ObjectRef]) -> BridgeResult<()> {
        if objects.is_empty() {
            return Err(BridgeError::NoObjects("minus"));
        }
        self.each("minus", objects)
    }

    /// Select `objects` and remove them from the object list.
    pub fn remove(&self, objects: &[ObjectRef]) -> BridgeResult<()> {
        if objects.is_empty() {
            return Err(BridgeError::NoObjects("remove"));
        }
        self.select(objects)?;
        self.go("Remove", &[])
    }

    fn each(&self, verb: &str, objects: &[ObjectRef]) -> BridgeResult<()> {
        objects.iter().try_for_each(|obj| self.go(verb, &obj.command_args()))
    }

    /// Name of the selected object, or `None` when nothing is selected.
    pub fn selected(&self) -> Option<String> {
        self.host.get_name_of_selected(None, false)
    }
}

// ── Numeric parsing ───────────────────────────────────────────────────────────

/// Parse the number at the start of `text`, ignoring leading whitespace and
/// any trailing units (`"0.5 seconds"` → `0.5`).
///
/// Accepts what C's `strtod` does: decimal and exponent forms, `inf`/`nan`,
/// and hexadecimal floats (`0x1A`, `0x1.8p1`).  Always uses `.` as the
/// decimal separator regardless of locale.
pub fn parse_leading_number(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let negative = bytes.first() == Some(&b'-');

    if let Some(hex) = s[end..].strip_prefix("0x").or_else(|| s[end..].strip_prefix("0X")) {
        if let Some(v) = parse_hex_float(hex) {
            return Some(if negative { -v } else { v });
        }
    }

    // inf / infinity / nan, as a C `%g` scan accepts
    let rest = &s[end..];
    for word in ["infinity", "inf", "nan"] {
        if rest.get(..word.len()).is_some_and(|w| w.eq_ignore_ascii_case(word)) {
            return s[..end + word.len()].parse().ok();
        }
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        end += 1 + frac_digits;
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    s[..end].parse().ok()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Hex mantissa with optional fraction and binary exponent, after the `0x`.
/// `None` when no hex digit follows, leaving `"0x"` to parse as `0`.
fn parse_hex_float(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let hex_digit = |i: usize| bytes.get(i).and_then(|&b| char::from(b).to_digit(16));
    let mut value = 0.0_f64;
    let mut scale: i32 = 0;
    let mut i = 0;
    let mut digits = 0;

    while let Some(d) = hex_digit(i) {
        value = value * 16.0 + f64::from(d);
        i += 1;
        digits += 1;
    }
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        while let Some(d) = hex_digit(i) {
            value = value * 16.0 + f64::from(d);
            scale = scale.saturating_sub(4);
            i += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(i), Some(b'p' | b'P')) {
        let mut j = i + 1;
        let exp_negative = bytes.get(j) == Some(&b'-');
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let n = count_digits(&bytes[j..]);
        if n > 0 {
            let exp = s[j..j + n].parse::<i32>().unwrap_or(i32::MAX);
            scale = if exp_negative { scale.saturating_sub(exp) } else { scale.saturating_add(exp) };
        }
    }

    Some(value * 2f64.powi(scale))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
