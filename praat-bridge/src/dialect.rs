//! Script dialects and the `run_script` entry point.
//!
//! The first characters of a script pick its language:
//!
//! | Marker          | Dialect |
//! |-----------------|---------|
//! | `#python`       | Python  |
//! | `#lang=python`  | Python  |
//! | `--lua`         | Lua     |
//! | `#lang=lua`     | Lua     |
//!
//! A dialect is only runnable when its Cargo feature (`python`, `lua`) is
//! enabled; otherwise the script is reported as unsupported.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::bridge::Bridge;
use crate::error::ScriptError;
use crate::host::HostPort;

const LANG_PREFIX: &str = "#lang=";

const MARKERS: &[(&str, Dialect)] = &[
    ("#lang=python", Dialect::Python),
    ("#python", Dialect::Python),
    ("#lang=lua", Dialect::Lua),
    ("--lua", Dialect::Lua),
];

// ── Dialect ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Python,
    Lua,
}

impl Dialect {
    /// Identify the dialect from the script's leading marker.
    pub fn detect(script: &str) -> Result<Self, ScriptError> {
        MARKERS
            .iter()
            .find(|(marker, _)| script.starts_with(marker))
            .map(|&(_, d)| d)
            .ok_or(ScriptError::UnrecognizedScript)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dialect::Python => "Python",
            Dialect::Lua => "Lua",
        })
    }
}

/// Whether the host should hand `script` to the bridge rather than run it
/// itself: it carries a known marker or any `#lang=` line.
pub fn is_bridge_script(script: &str) -> bool {
    script.starts_with(LANG_PREFIX) || Dialect::detect(script).is_ok()
}

// ── ScriptEngine ──────────────────────────────────────────────────────────────

/// One embedded interpreter.
pub trait ScriptEngine {
    fn dialect(&self) -> Dialect;

    /// Make the script functions (`go`, `getString`, `getNum`, `select`,
    /// `plus`, `minus`, `remove`, `selected`, `getargv`, `print`) available
    /// to scripts, bound to `bridge`.
    fn inject(&mut self, bridge: Bridge) -> Result<(), ScriptError>;

    /// Run a whole script.  Uncaught script errors come back as
    /// [`ScriptError::Runtime`].
    fn run(&mut self, script: &str) -> Result<(), ScriptError>;
}

/// A fresh engine for `dialect`, if it was compiled in.
pub fn engine_for(dialect: Dialect) -> Result<Box<dyn ScriptEngine>, ScriptError> {
    match dialect {
        #[cfg(feature = "python")]
        Dialect::Python => Ok(Box::new(crate::python::PythonEngine::new()?)),
        #[cfg(feature = "lua")]
        Dialect::Lua => Ok(Box::new(crate::lua::LuaEngine::new())),
        #[allow(unreachable_patterns)]
        other => Err(ScriptError::UnsupportedDialect(other)),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Run `script` against `host`.
///
/// Nothing is returned: unsupported or unrecognized scripts and uncaught
/// script errors are reported on the host's echo channel.
pub fn run_script(host: Arc<dyn HostPort>, script: &str) {
    run_script_with_argv(host, script, &[]);
}

/// [`run_script`] with a command line for `getargv()`, script name first.
/// An empty `argv` means the script was started without one.
pub fn run_script_with_argv(host: Arc<dyn HostPort>, script: &str, argv: &[String]) {
    if let Err(e) = try_run_script(Arc::clone(&host), script, argv) {
        warn!(error = %e, "script did not complete");
        host.echo(&format!("{e}\n"));
    }
}

/// Like [`run_script_with_argv`] but hands the error back instead of
/// echoing it.
pub fn try_run_script(
    host: Arc<dyn HostPort>,
    script: &str,
    argv: &[String],
) -> Result<(), ScriptError> {
    let dialect = Dialect::detect(script)?;
    info!(%dialect, bytes = script.len(), args = argv.len(), "running script");
    let mut engine = engine_for(dialect)?;
    let mut bridge = Bridge::new(host);
    if !argv.is_empty() {
        bridge = bridge.with_argv(argv.to_vec());
    }
    engine.inject(bridge)?;
    engine.run(script)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ScriptedHost;

    #[test]
    fn detect_markers() {
        assert_eq!(Dialect::detect("#python\nprint(1)"), Ok(Dialect::Python));
        assert_eq!(Dialect::detect("#lang=python\n"), Ok(Dialect::Python));
        assert_eq!(Dialect::detect("--lua\nprint(1)"), Ok(Dialect::Lua));
        assert_eq!(Dialect::detect("#lang=lua\n"), Ok(Dialect::Lua));
    }

    #[test]
    fn detect_unknown() {
        assert_eq!(Dialect::detect("#lang=ruby\n"), Err(ScriptError::UnrecognizedScript));
        assert_eq!(Dialect::detect("echo hello"), Err(ScriptError::UnrecognizedScript));
        assert_eq!(Dialect::detect(" #python"), Err(ScriptError::UnrecognizedScript));
    }

    #[test]
    fn bridge_script_detection() {
        assert!(is_bridge_script("#lang=ruby\n"));
        assert!(is_bridge_script("--lua\n"));
        assert!(!is_bridge_script("Create Sound from formula: \"s\", 1, 0, 1, 44100, \"0\"\n"));
    }

    #[test]
    fn unrecognized_script_is_echoed() {
        let host = Arc::new(ScriptedHost::new());
        run_script(host.clone(), "#lang=ruby\nputs 1\n");
        assert_eq!(
            host.echoed(),
            "Unrecognized language in #lang= line in script. Use \"#lang=python\" or \"#lang=lua\".\n"
        );
        assert!(host.commands().is_empty());
    }

    #[cfg(not(feature = "lua"))]
    #[test]
    fn missing_lua_support_is_echoed() {
        let host = Arc::new(ScriptedHost::new());
        run_script(host.clone(), "--lua\ngo('Play')\n");
        assert_eq!(host.echoed(), "This build was not compiled for Lua scripting.\n");
        assert!(host.commands().is_empty());
    }

    #[cfg(not(feature = "python"))]
    #[test]
    fn missing_python_support_is_reported() {
        let host = Arc::new(ScriptedHost::new());
        let err = try_run_script(host.clone(), "#python\ngo('Play')\n", &[]).unwrap_err();
        assert_eq!(err, ScriptError::UnsupportedDialect(Dialect::Python));
        assert!(host.commands().is_empty());
    }

    #[cfg(feature = "lua")]
    #[test]
    fn lua_script_runs_end_to_end() {
        let host = Arc::new(ScriptedHost::new().reply("Get", "7"));
        run_script(host.clone(), "--lua\ngo('Play')\nprint(getNum('Get value') * 2)\n");
        assert_eq!(host.command_lines(), vec!["Play", "Get value"]);
        assert_eq!(host.echoed(), "14.0\n");
    }

    #[cfg(feature = "lua")]
    #[test]
    fn lua_script_sees_argv() {
        let host = Arc::new(ScriptedHost::new());
        let argv = vec!["s.lua".to_owned(), "in.wav".to_owned()];
        run_script_with_argv(host.clone(), "--lua\nselect(getargv()[2])\n", &argv);
        assert_eq!(host.command_lines(), vec!["select in.wav"]);
    }

    #[cfg(feature = "python")]
    #[test]
    fn python_marker_builds_python_engine() {
        let _g = crate::python::TEST_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        let engine = engine_for(Dialect::detect("#lang=python\n").unwrap()).unwrap();
        assert_eq!(engine.dialect(), Dialect::Python);
    }

    #[cfg(feature = "python")]
    #[test]
    fn python_script_runs_end_to_end() {
        let _g = crate::python::TEST_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        let host = Arc::new(ScriptedHost::new().reply("Get", "7"));
        run_script(
            host.clone(),
            "#python\ngo('Play')\nprint(getNum('Get value') * 2)\n\
             raise RuntimeError('boom')\nprint('unreachable')\n",
        );
        assert_eq!(host.command_lines(), vec!["Play", "Get value"]);
        let echoed = host.echoed();
        assert!(echoed.starts_with("14.0\n"), "{echoed:?}");
        assert!(echoed.contains("RuntimeError"));
        assert!(echoed.ends_with("boom\n"));
        assert!(!echoed.contains("unreachable"));
    }

    #[cfg(feature = "python")]
    #[test]
    fn python_script_sees_argv() {
        let _g = crate::python::TEST_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        let host = Arc::new(ScriptedHost::new());
        let argv = vec!["s.py".to_owned(), "in.wav".to_owned()];
        run_script_with_argv(host.clone(), "#python\nprint(argv)\nprint(getargv()[1])\n", &argv);
        assert_eq!(host.echoed(), "['s.py', 'in.wav']\nin.wav\n");
    }
}
