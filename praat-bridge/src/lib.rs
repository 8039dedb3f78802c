//! Scripting bridge between embedded Python/Lua interpreters and the Praat
//! command interpreter.
//!
//! A script call such as `go("Create Sound", "my sound", 44100)` is formatted
//! into one Praat command line ([`command`]), sent across the [`host`]
//! boundary ([`gateway`]), and its reply coerced into a script value
//! ([`bridge`]).  [`dialect::run_script`] is the entry point a host calls with
//! a whole script.

pub mod bridge;
pub mod cli;
pub mod command;
pub mod config;
pub mod dialect;
pub mod error;
pub mod gateway;
pub mod host;
pub mod lua;
pub mod output;
pub mod python;

pub use bridge::{Bridge, ObjectRef};
pub use command::{format_command, Arg, Command};
pub use dialect::{is_bridge_script, run_script, run_script_with_argv, Dialect, ScriptEngine};
pub use error::{BridgeError, ScriptError};
pub use gateway::{dispatch, DispatchOutcome};
pub use host::{HostPort, HostReply, ScriptedHost};
