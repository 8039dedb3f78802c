//! `.praatbridgerc` parser.
//!
//! Describes how the dry-run host answers commands:
//!
//! | Directive                    | Action                                     |
//! |------------------------------|--------------------------------------------|
//! | `/reply <prefix>=<text>`     | commands starting with `<prefix>` succeed  |
//! | `/fail <prefix>=<message>`   | commands starting with `<prefix>` fail     |
//! | `/select <name>`             | initial selection                          |
//! | Lines starting with `;`      | comment, ignored                           |
//! | Any other `/command`         | silently skipped                           |
//!
//! `\n` in a reply or message stands for a newline.  Rules are tried in file
//! order; the first match wins.

use std::path::Path;

use crate::host::{HostReply, ReplyRule, ScriptedHost};

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a config file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

/// Parsed rc file.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Config {
    pub rules: Vec<ReplyRule>,
    pub selected: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an rc string.  Returns the config and any errors on recognised
    /// lines; bad lines are skipped.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let Some(rest) = line.strip_prefix('/') else { continue };

            let (cmd, args_str) = rest
                .split_once(|c: char| c.is_ascii_whitespace())
                .unwrap_or((rest, ""));
            let args_str = args_str.trim();

            match cmd {
                "reply" | "fail" => match parse_rule(args_str, cmd == "fail") {
                    Ok(rule) => config.rules.push(rule),
                    Err(msg) => errors.push(ConfigError { line: lineno, message: msg }),
                },
                "select" => {
                    if args_str.is_empty() {
                        errors.push(ConfigError {
                            line: lineno,
                            message: "/select: missing object name".into(),
                        });
                    } else {
                        config.selected = Some(args_str.to_owned());
                    }
                }
                _ => {}
            }
        }

        (config, errors)
    }

    /// Read and parse an rc file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }

    /// A dry-run host answering per this config.
    pub fn build_host(&self) -> ScriptedHost {
        let host = ScriptedHost::with_rules(self.rules.clone());
        match &self.selected {
            Some(name) => host.selecting(name.clone()),
            None => host,
        }
    }
}

// ── /reply and /fail ──────────────────────────────────────────────────────────

fn parse_rule(args: &str, is_failure: bool) -> Result<ReplyRule, String> {
    let directive = if is_failure { "/fail" } else { "/reply" };
    let (prefix, text) = args
        .split_once('=')
        .ok_or_else(|| format!("{directive}: expected <prefix>=<text>"))?;
    let prefix = prefix.trim_end();
    if prefix.is_empty() {
        return Err(format!("{directive}: empty command prefix"));
    }
    let text = unescape(text);
    let reply = if is_failure { HostReply::error(text) } else { HostReply::ok(text) };
    Ok(ReplyRule { prefix: prefix.to_owned(), reply })
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostPort;

    #[test]
    fn reply_and_fail_rules() {
        let (cfg, errs) = Config::load_str(
            "/reply Get duration=0.5 seconds\n\
             /fail Read from file=File not found.\n",
        );
        assert!(errs.is_empty());
        assert_eq!(cfg.rules.len(), 2);
        assert_eq!(cfg.rules[0].prefix, "Get duration");
        assert_eq!(cfg.rules[0].reply, HostReply::ok("0.5 seconds"));
        assert_eq!(cfg.rules[1].reply, HostReply::error("File not found."));
    }

    #[test]
    fn comments_and_unknown_directives_skipped() {
        let (cfg, errs) = Config::load_str("; comment\n\n/def foo = bar\nplain text\n");
        assert!(errs.is_empty());
        assert!(cfg.rules.is_empty());
        assert!(cfg.selected.is_none());
    }

    #[test]
    fn select_directive() {
        let (cfg, errs) = Config::load_str("/select Sound hello world\n");
        assert!(errs.is_empty());
        assert_eq!(cfg.selected.as_deref(), Some("Sound hello world"));
    }

    #[test]
    fn escapes_in_reply() {
        let (cfg, _) = Config::load_str("/reply Info=line 1\\nline 2\\\\\n");
        assert_eq!(cfg.rules[0].reply.output, "line 1\nline 2\\");
    }

    #[test]
    fn reply_text_may_contain_equals() {
        let (cfg, _) = Config::load_str("/reply Get formula=x = 1\n");
        assert_eq!(cfg.rules[0].reply.output, "x = 1");
    }

    #[test]
    fn malformed_lines_reported_with_line_numbers() {
        let (cfg, errs) = Config::load_str("/reply nothing here\n/fail =msg\n/select\n/reply ok=1\n");
        assert_eq!(cfg.rules.len(), 1);
        let lines: Vec<usize> = errs.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
        assert_eq!(errs[0].to_string(), "line 1: /reply: expected <prefix>=<text>");
    }

    #[test]
    fn build_host_uses_rules_and_selection() {
        let (cfg, _) = Config::load_str("/reply Get=3\n/select Sound s\n");
        let host = cfg.build_host();
        assert_eq!(host.execute_command("Get mean", true), HostReply::ok("3"));
        assert_eq!(host.get_name_of_selected(None, false).as_deref(), Some("Sound s"));
    }

    #[test]
    fn load_file_reads_disk() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "/fail Play=no sound").unwrap();
        let (cfg, errs) = Config::load_file(f.path()).unwrap();
        assert!(errs.is_empty());
        assert_eq!(cfg.rules[0].reply, HostReply::error("no sound"));
    }
}
