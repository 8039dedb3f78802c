//! Optional Python scripting via the `pyo3` crate.
//!
//! Enabled with the `python` Cargo feature:
//! ```text
//! cargo build --features python
//! cargo test  --features python
//! ```
//!
//! # Python `praat` module
//!
//! Every script runs with `from praat import *` already done:
//!
//! | Python function          | Effect                                    |
//! |--------------------------|-------------------------------------------|
//! | `go(cmd, *args)`         | Run a command, output to the Info window  |
//! | `getString(cmd, *args)`  | Run a command → captured output string    |
//! | `getNum(cmd, *args)`     | Run a command → leading number of output  |
//! | `select(obj, ...)`       | Select objects (`select`, then `plus`)    |
//! | `plus(obj, ...)`         | Add objects to the selection              |
//! | `minus(obj, ...)`        | Drop objects from the selection           |
//! | `remove(obj, ...)`       | Select objects, then `Remove` them        |
//! | `selected()`             | Name of the selected object, or `None`    |
//! | `getargv()`              | Script arguments as a list, or `None`     |
//! | `argv`                   | `getargv()` taken when the script starts  |
//! | `praat.print(obj)`       | Echo `str(obj)` as one line               |
//!
//! An object is either `'Sound my voice'` or a tuple `('Sound', 'my voice')`.
//!
//! `sys.stdout` and `sys.stderr` are replaced by `praat.InfoWindow` streams,
//! so the builtin `print` also ends up on the host's echo channel.  Host
//! errors are raised as `praat.PraatPyException`; values that cannot be
//! passed to Praat raise `ValueError`.

#[cfg(feature = "python")]
pub use python_impl::PythonEngine;

/// Python tests share the interpreter and the bridge slot; they take this
/// lock to run one at a time.
#[cfg(all(test, feature = "python"))]
pub(crate) static TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(feature = "python")]
mod python_impl {
    use std::sync::{Mutex, OnceLock};

    use pyo3::exceptions::{PyException, PyRuntimeError, PyValueError};
    use pyo3::prelude::*;
    use pyo3::types::{PyBool, PyDict, PyFloat, PyLong, PyString, PyTuple};
    use tracing::debug;

    use crate::bridge::{Bridge, ObjectRef};
    use crate::command::Arg;
    use crate::dialect::{Dialect, ScriptEngine};
    use crate::error::{BridgeError, ScriptError};
    use crate::output::LineBuffer;

    // ── Shared state accessed by #[pyfunction]s ───────────────────────────

    pyo3::create_exception!(praat, PraatPyException, PyException);

    static STATE: Mutex<Option<Bridge>> = Mutex::new(None);
    static PYTHON_INIT: OnceLock<()> = OnceLock::new();

    fn current_bridge() -> PyResult<Bridge> {
        STATE
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
            .ok_or_else(|| PyRuntimeError::new_err("praat: no script is running"))
    }

    fn raise(err: BridgeError) -> PyErr {
        match err {
            BridgeError::InvalidArgument(_) => PyValueError::new_err(err.to_string()),
            _ => PraatPyException::new_err(err.to_string()),
        }
    }

    // ── Value conversion ──────────────────────────────────────────────────

    fn to_arg(value: &Bound<'_, PyAny>, position: usize) -> PyResult<Arg> {
        // bool before int: Python bools are ints.
        if value.is_instance_of::<PyBool>() {
            return Ok(Arg::Bool(value.extract()?));
        }
        if value.is_instance_of::<PyLong>() {
            return Ok(Arg::Int(value.extract()?));
        }
        if value.is_instance_of::<PyFloat>() {
            return Ok(Arg::Num(value.extract()?));
        }
        if value.is_instance_of::<PyString>() {
            return Ok(Arg::Str(value.extract()?));
        }
        Err(raise(BridgeError::InvalidArgument(format!(
            "argument {position}: only strings, integers, floats, True and False \
             can be used as arguments to Praat commands, got {}",
            value.get_type().name()?
        ))))
    }

    fn to_args(args: &Bound<'_, PyTuple>) -> PyResult<Vec<Arg>> {
        args.iter()
            .enumerate()
            .map(|(i, v)| to_arg(&v, i + 2))
            .collect()
    }

    fn to_objects(objects: &Bound<'_, PyTuple>) -> PyResult<Vec<ObjectRef>> {
        objects
            .iter()
            .map(|item| {
                if item.is_instance_of::<PyString>() {
                    return Ok(ObjectRef::Name(item.extract()?));
                }
                if let Ok((class, name)) = item.extract::<(String, String)>() {
                    return Ok(ObjectRef::Typed { class, name });
                }
                Err(raise(BridgeError::InvalidArgument(
                    "Arguments to select must be strings like 'LongSound mysound' \
                     or tuples like ('LongSound', 'mysound')."
                        .into(),
                )))
            })
            .collect()
    }

    // ── praat.* Python functions ──────────────────────────────────────────

    /// `go(cmd, *args)`: run a command, output to the Info window.
    #[pyfunction]
    #[pyo3(name = "go", signature = (command, *args))]
    fn py_go(command: &str, args: &Bound<'_, PyTuple>) -> PyResult<()> {
        current_bridge()?.go(command, &to_args(args)?).map_err(raise)
    }

    /// `getString(cmd, *args)` → str
    #[pyfunction]
    #[pyo3(name = "getString", signature = (command, *args))]
    fn py_get_string(command: &str, args: &Bound<'_, PyTuple>) -> PyResult<String> {
        current_bridge()?.get_string(command, &to_args(args)?).map_err(raise)
    }

    /// `getNum(cmd, *args)` → float
    #[pyfunction]
    #[pyo3(name = "getNum", signature = (command, *args))]
    fn py_get_num(command: &str, args: &Bound<'_, PyTuple>) -> PyResult<f64> {
        current_bridge()?.get_num(command, &to_args(args)?).map_err(raise)
    }

    /// `select(obj, ...)`: select the first object, add the rest.
    #[pyfunction]
    #[pyo3(name = "select", signature = (*objects))]
    fn py_select(objects: &Bound<'_, PyTuple>) -> PyResult<()> {
        current_bridge()?.select(&to_objects(objects)?).map_err(raise)
    }

    #[pyfunction]
    #[pyo3(name = "plus", signature = (*objects))]
    fn py_plus(objects: &Bound<'_, PyTuple>) -> PyResult<()> {
        current_bridge()?.plus(&to_objects(objects)?).map_err(raise)
    }

    #[pyfunction]
    #[pyo3(name = "minus", signature = (*objects))]
    fn py_minus(objects: &Bound<'_, PyTuple>) -> PyResult<()> {
        current_bridge()?.minus(&to_objects(objects)?).map_err(raise)
    }

    /// `remove(obj, ...)`: select the objects and remove them.
    #[pyfunction]
    #[pyo3(name = "remove", signature = (*objects))]
    fn py_remove(objects: &Bound<'_, PyTuple>) -> PyResult<()> {
        current_bridge()?.remove(&to_objects(objects)?).map_err(raise)
    }

    /// `selected()` → str | None
    #[pyfunction]
    #[pyo3(name = "selected")]
    fn py_selected() -> PyResult<Option<String>> {
        Ok(current_bridge()?.selected())
    }

    /// `getargv()` → list[str] | None, script name first
    #[pyfunction]
    #[pyo3(name = "getargv")]
    fn py_getargv() -> PyResult<Option<Vec<String>>> {
        Ok(current_bridge()?.argv().map(<[String]>::to_vec))
    }

    /// `praat.print(obj)`: echo `str(obj)` as one line.
    #[pyfunction]
    #[pyo3(name = "print")]
    fn py_print(message: &Bound<'_, PyAny>) -> PyResult<()> {
        let text = message.str()?;
        current_bridge()?.print(text.to_str()?);
        Ok(())
    }

    // ── InfoWindow stream ─────────────────────────────────────────────────

    /// File-like object that forwards whole lines to the host.
    #[pyclass(name = "InfoWindow", module = "praat")]
    struct InfoWindow {
        buffer: LineBuffer,
    }

    #[pymethods]
    impl InfoWindow {
        #[new]
        fn new() -> Self {
            Self { buffer: LineBuffer::new() }
        }

        fn write(&mut self, text: &str) -> PyResult<usize> {
            let lines = self.buffer.push(text);
            if !lines.is_empty() {
                let bridge = current_bridge()?;
                for line in &lines {
                    bridge.echo(line);
                }
            }
            Ok(text.chars().count())
        }

        fn flush(&mut self) -> PyResult<()> {
            if let Some(rest) = self.buffer.take_remainder() {
                current_bridge()?.echo(&rest);
            }
            Ok(())
        }
    }

    // ── praat module registration ─────────────────────────────────────────

    const STAR_EXPORTS: &[&str] = &[
        "go",
        "getString",
        "getNum",
        "select",
        "plus",
        "minus",
        "remove",
        "selected",
        "getargv",
        "argv",
        "InfoWindow",
        "PraatPyException",
    ];

    fn register_praat_module(py: Python<'_>, argv: Option<&[String]>) -> PyResult<()> {
        let m = PyModule::new_bound(py, "praat")?;
        m.add_function(wrap_pyfunction!(py_go, &m)?)?;
        m.add_function(wrap_pyfunction!(py_get_string, &m)?)?;
        m.add_function(wrap_pyfunction!(py_get_num, &m)?)?;
        m.add_function(wrap_pyfunction!(py_select, &m)?)?;
        m.add_function(wrap_pyfunction!(py_plus, &m)?)?;
        m.add_function(wrap_pyfunction!(py_minus, &m)?)?;
        m.add_function(wrap_pyfunction!(py_remove, &m)?)?;
        m.add_function(wrap_pyfunction!(py_selected, &m)?)?;
        m.add_function(wrap_pyfunction!(py_getargv, &m)?)?;
        m.add_function(wrap_pyfunction!(py_print, &m)?)?;
        m.add_class::<InfoWindow>()?;
        m.add("PraatPyException", py.get_type_bound::<PraatPyException>())?;
        m.add("argv", argv.map(<[String]>::to_vec))?;
        // `praat.print` stays out of the star import so the builtin survives.
        m.add("__all__", STAR_EXPORTS.to_vec())?;
        let sys = py.import_bound("sys")?;
        sys.getattr("modules")?.set_item("praat", &m)?;
        Ok(())
    }

    // ── PythonEngine ──────────────────────────────────────────────────────

    /// A Python session with the `praat` module installed.
    ///
    /// The CPython interpreter is initialised at most once per process and
    /// outlives the engine; each [`ScriptEngine::run`] uses fresh globals.
    /// Dropping the engine detaches the host and restores `sys.stdout` /
    /// `sys.stderr`, so leftover callbacks raise instead of reaching a stale
    /// host.
    pub struct PythonEngine {
        saved_streams: Option<(PyObject, PyObject)>,
    }

    impl PythonEngine {
        pub fn new() -> Result<Self, ScriptError> {
            PYTHON_INIT.get_or_init(pyo3::prepare_freethreaded_python);
            Ok(Self { saved_streams: None })
        }

        fn install(&mut self, py: Python<'_>, argv: Option<&[String]>) -> PyResult<()> {
            register_praat_module(py, argv)?;
            let sys = py.import_bound("sys")?;
            if self.saved_streams.is_none() {
                self.saved_streams = Some((
                    sys.getattr("stdout")?.unbind(),
                    sys.getattr("stderr")?.unbind(),
                ));
            }
            sys.setattr("stdout", Py::new(py, InfoWindow::new())?)?;
            sys.setattr("stderr", Py::new(py, InfoWindow::new())?)?;
            Ok(())
        }

        /// Execute Python statements in a fresh `__main__`-like namespace.
        pub fn exec(&self, code: &str) -> PyResult<()> {
            Python::with_gil(|py| {
                let globals = PyDict::new_bound(py);
                globals.set_item("__builtins__", py.import_bound("builtins")?)?;
                globals.set_item("__name__", "__main__")?;
                py.run_bound("from praat import *", Some(&globals), None)?;
                let result = py.run_bound(code, Some(&globals), None);
                flush_streams(py)?;
                result
            })
        }
    }

    fn flush_streams(py: Python<'_>) -> PyResult<()> {
        let sys = py.import_bound("sys")?;
        for name in ["stdout", "stderr"] {
            sys.getattr(name)?.call_method0("flush")?;
        }
        Ok(())
    }

    impl ScriptEngine for PythonEngine {
        fn dialect(&self) -> Dialect {
            Dialect::Python
        }

        fn inject(&mut self, bridge: Bridge) -> Result<(), ScriptError> {
            let argv = bridge.argv().map(<[String]>::to_vec);
            *STATE.lock().unwrap_or_else(|p| p.into_inner()) = Some(bridge);
            Python::with_gil(|py| self.install(py, argv.as_deref())).map_err(|e| ScriptError::Init {
                dialect: Dialect::Python,
                message: e.to_string(),
            })
        }

        fn run(&mut self, script: &str) -> Result<(), ScriptError> {
            self.exec(script).map_err(|e| {
                debug!(error = %e, "python script failed");
                ScriptError::Runtime(e.to_string())
            })
        }
    }

    impl Drop for PythonEngine {
        fn drop(&mut self) {
            if let Some((stdout, stderr)) = self.saved_streams.take() {
                Python::with_gil(|py| {
                    if let Ok(sys) = py.import_bound("sys") {
                        let _ = sys.setattr("stdout", stdout.bind(py));
                        let _ = sys.setattr("stderr", stderr.bind(py));
                    }
                });
            }
            *STATE.lock().unwrap_or_else(|p| p.into_inner()) = None;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
