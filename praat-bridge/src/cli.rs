//! Command-line argument parsing.
//!
//! Usage:
//!   praat-bridge [-f[<rcfile>]] [-c<script>] [-td] [<script-file> | -] [<arg>...]
//!
//! Arguments after the script file (or all positional arguments with `-c`)
//! are handed to the script through `getargv()`.

use std::path::{Path, PathBuf};

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Which rc file describes the dry-run host.
    pub config: ConfigFile,
    /// Where the script comes from.
    pub source: ScriptSource,
    /// Arguments for the script itself.
    pub script_args: Vec<String>,
    /// Print the dispatched commands after the script output (`-t`).
    pub transcript: bool,
    /// Debug logging (`-d`).
    pub debug: bool,
}

/// How to choose the rc file.
#[derive(Debug, Default)]
pub enum ConfigFile {
    /// Search `$PRAAT_BRIDGE_RC`, `~/.praatbridgerc`, `./.praatbridgerc`.
    #[default]
    Search,
    /// `-f` with no file argument: no rc file.
    Skip,
    /// `-f<file>`: load this specific file.
    Explicit(PathBuf),
}

/// Where to read the script from.
#[derive(Debug, Default)]
pub enum ScriptSource {
    /// `-` or no argument at all.
    #[default]
    Stdin,
    File(PathBuf),
    /// `-c<script>`.
    Inline(String),
}

impl ScriptSource {
    /// The script's own name, first entry of its `getargv()`.
    pub fn script_name(&self) -> String {
        match self {
            ScriptSource::Stdin => "-".to_owned(),
            ScriptSource::File(path) => path.display().to_string(),
            ScriptSource::Inline(_) => "-c".to_owned(),
        }
    }
}

impl CliArgs {
    /// Command line seen by the script: its name, then its arguments.
    pub fn script_argv(&self) -> Vec<String> {
        std::iter::once(self.source.script_name())
            .chain(self.script_args.iter().cloned())
            .collect()
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(&raw[1..])
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        if arg == "--" {
            i += 1;
            positional.extend(argv[i..].iter().cloned());
            break;
        }

        // The script name ends option parsing; the rest belongs to the script.
        if !arg.starts_with('-') || arg == "-" {
            positional.extend(argv[i..].iter().cloned());
            break;
        }

        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'd' => args.debug = true,
                't' => args.transcript = true,

                // -f[<file>]
                'f' => {
                    if j + 1 < chars.len() {
                        let file: String = chars[j + 1..].iter().collect();
                        args.config = ConfigFile::Explicit(PathBuf::from(file));
                        j = chars.len();
                    } else if i + 1 < argv.len() && !argv[i + 1].starts_with('-') && is_rc_path(&argv[i + 1]) {
                        i += 1;
                        args.config = ConfigFile::Explicit(PathBuf::from(&argv[i]));
                    } else {
                        args.config = ConfigFile::Skip;
                    }
                }

                // -c<script>
                'c' => {
                    let script = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err("-c requires a script argument".to_owned());
                    };
                    args.source = ScriptSource::Inline(unescape_newlines(&script));
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    let mut positional = positional.into_iter();
    if !matches!(args.source, ScriptSource::Inline(_)) {
        if let Some(p) = positional.next() {
            if p != "-" {
                args.source = ScriptSource::File(PathBuf::from(p));
            }
        }
    }
    args.script_args = positional.collect();

    Ok(args)
}

/// A separate `-f <file>` argument is only taken as the rc file when it
/// looks like one (`*.rc` or `*praatbridgerc`); otherwise it is the script.
fn is_rc_path(arg: &str) -> bool {
    Path::new(arg)
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".rc") || name.ends_with("praatbridgerc"))
}

/// `-c` scripts are usually typed on one line; allow `\n` for line breaks.
fn unescape_newlines(s: &str) -> String {
    s.replace("\\n", "\n")
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Search for the rc file in the standard locations.
/// Returns the first path that exists, or `None`.
pub fn find_user_config() -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(p) = std::env::var("PRAAT_BRIDGE_RC") {
        candidates.push(PathBuf::from(p));
    }
    if let Some(dirs) = directories::BaseDirs::new() {
        candidates.push(dirs.home_dir().join(".praatbridgerc"));
    }
    candidates.push(PathBuf::from("./.praatbridgerc"));
    candidates.into_iter().find(|p| p.exists())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|&s| s.to_owned()).collect()
    }

    #[test]
    fn empty_args_reads_stdin() {
        let a = parse_argv(&argv(&[])).unwrap();
        assert!(matches!(a.source, ScriptSource::Stdin));
        assert!(matches!(a.config, ConfigFile::Search));
        assert!(!a.transcript && !a.debug);
    }

    #[test]
    fn script_file_positional() {
        let a = parse_argv(&argv(&["analyse.py"])).unwrap();
        assert!(matches!(&a.source, ScriptSource::File(p) if p == &PathBuf::from("analyse.py")));
    }

    #[test]
    fn dash_is_stdin() {
        let a = parse_argv(&argv(&["-"])).unwrap();
        assert!(matches!(a.source, ScriptSource::Stdin));
    }

    #[test]
    fn bool_flags_combined() {
        let a = parse_argv(&argv(&["-td"])).unwrap();
        assert!(a.transcript && a.debug);
    }

    #[test]
    fn config_skip() {
        let a = parse_argv(&argv(&["-f", "script.lua"])).unwrap();
        assert!(matches!(a.config, ConfigFile::Skip));
        assert!(matches!(&a.source, ScriptSource::File(p) if p == &PathBuf::from("script.lua")));
    }

    #[test]
    fn config_explicit_embedded() {
        let a = parse_argv(&argv(&["-ftest.rc"])).unwrap();
        assert!(matches!(&a.config, ConfigFile::Explicit(p) if p == &PathBuf::from("test.rc")));
    }

    #[test]
    fn config_explicit_separate() {
        let a = parse_argv(&argv(&["-f", "my.praatbridgerc", "s.py"])).unwrap();
        assert!(matches!(&a.config, ConfigFile::Explicit(p) if p == &PathBuf::from("my.praatbridgerc")));
        assert!(matches!(&a.source, ScriptSource::File(_)));
    }

    #[test]
    fn inline_script_with_newlines() {
        let a = parse_argv(&argv(&["-c--lua\\ngo('Play')"])).unwrap();
        assert!(matches!(&a.source, ScriptSource::Inline(s) if s == "--lua\ngo('Play')"));
    }

    #[test]
    fn inline_script_separate() {
        let a = parse_argv(&argv(&["-c", "#python\\ngo('Play')"])).unwrap();
        assert!(matches!(&a.source, ScriptSource::Inline(s) if s == "#python\ngo('Play')"));
    }

    #[test]
    fn config_separate_requires_rc_name() {
        for script in ["src", "notes.rcx", "arc"] {
            let a = parse_argv(&argv(&["-f", script])).unwrap();
            assert!(matches!(a.config, ConfigFile::Skip), "{script}");
            assert!(matches!(&a.source, ScriptSource::File(p) if p == &PathBuf::from(script)));
        }
        let a = parse_argv(&argv(&["-f", "conf/test.rc", "s.py"])).unwrap();
        assert!(matches!(&a.config, ConfigFile::Explicit(p) if p == &PathBuf::from("conf/test.rc")));
    }

    #[test]
    fn inline_script_takes_positionals_as_args() {
        let a = parse_argv(&argv(&["-c--lua", "x.wav", "y"])).unwrap();
        assert!(matches!(&a.source, ScriptSource::Inline(_)));
        assert_eq!(a.script_argv(), vec!["-c", "x.wav", "y"]);
    }

    #[test]
    fn missing_inline_script() {
        assert!(parse_argv(&argv(&["-c"])).is_err());
    }

    #[test]
    fn trailing_args_go_to_script() {
        let a = parse_argv(&argv(&["a.py", "in.wav", "-x"])).unwrap();
        assert!(matches!(&a.source, ScriptSource::File(p) if p == &PathBuf::from("a.py")));
        assert_eq!(a.script_args, vec!["in.wav", "-x"]);
        assert_eq!(a.script_argv(), vec!["a.py", "in.wav", "-x"]);
    }

    #[test]
    fn stdin_script_argv() {
        let a = parse_argv(&argv(&["-", "one"])).unwrap();
        assert!(matches!(a.source, ScriptSource::Stdin));
        assert_eq!(a.script_argv(), vec!["-", "one"]);
    }

    #[test]
    fn unknown_flag() {
        assert!(parse_argv(&argv(&["-z"])).is_err());
    }
}
