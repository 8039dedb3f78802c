//! Error types.

use crate::dialect::Dialect;

/// Errors raised into a script by the bridge functions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BridgeError {
    /// The host reported an error; carries its message verbatim.
    #[error("Error: {0}")]
    HostExecution(String),
    /// `getNum` got output that does not start with a number.
    #[error("No numeric value found in Info window output: {0}")]
    NumericParse(String),
    /// A selection call (`select`, `plus`, `minus`, `remove`) named no objects.
    #[error("You must pass at least one Praat object name to the {0} method.")]
    NoObjects(&'static str),
    /// A script value that cannot be used as a command argument.
    #[error("{0}")]
    InvalidArgument(String),
}

/// Errors from running a whole script.
///
/// `run_script` reports these through the host's echo channel rather than
/// returning them.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScriptError {
    #[error("This build was not compiled for {0} scripting.")]
    UnsupportedDialect(Dialect),
    #[error("Unrecognized language in #lang= line in script. Use \"#lang=python\" or \"#lang=lua\".")]
    UnrecognizedScript,
    #[error("failed to start {dialect} engine: {message}")]
    Init { dialect: Dialect, message: String },
    /// Uncaught error inside the script.
    #[error("{0}")]
    Runtime(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;
