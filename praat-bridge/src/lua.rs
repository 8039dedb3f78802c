//! Optional Lua 5.4 scripting via the `mlua` crate.
//!
//! Enabled with the `lua` Cargo feature:
//! ```text
//! cargo build --features lua
//! cargo test  --features lua
//! ```
//!
//! # Lua API
//!
//! The following functions are registered as globals and in a `praat` table:
//!
//! | Lua function                 | Effect                                   |
//! |------------------------------|------------------------------------------|
//! | `go(cmd, …)`                 | Run a command, output to the Info window |
//! | `getString(cmd, …)`          | Run a command → captured output string   |
//! | `getNum(cmd, …)`             | Run a command → leading number of output |
//! | `select(obj, …)`             | Select objects (`select`, then `plus`)   |
//! | `plus(obj, …)`               | Add objects to the selection             |
//! | `minus(obj, …)`              | Drop objects from the selection          |
//! | `remove(obj, …)`             | Select objects, then `Remove` them       |
//! | `selected()`                 | Name of the selected object, or nil      |
//! | `getargv()`                  | Script arguments as a table, or nil      |
//! | `print(…)`                   | Echo a tab-separated line                |
//!
//! An object is either `'Sound my voice'` or a pair `{'Sound', 'my voice'}`.
//! The arguments are also stored in `praat.argv`.
//!
//! Host errors are raised as Lua errors, so `pcall` can catch them.

#[cfg(feature = "lua")]
pub use lua_impl::LuaEngine;

#[cfg(feature = "lua")]
mod lua_impl {
    use mlua::prelude::*;
    use mlua::Variadic;
    use tracing::debug;

    use crate::bridge::{Bridge, ObjectRef};
    use crate::command::Arg;
    use crate::dialect::{Dialect, ScriptEngine};
    use crate::error::{BridgeError, ScriptError};

    // ── Value conversion ──────────────────────────────────────────────────

    fn to_arg(value: LuaValue, position: usize) -> LuaResult<Arg> {
        match value {
            LuaValue::String(s) => Ok(Arg::Str((*s.to_str()?).to_owned())),
            LuaValue::Integer(i) => Ok(Arg::Int(i)),
            LuaValue::Number(f) => Ok(Arg::Num(f)),
            LuaValue::Boolean(b) => Ok(Arg::Bool(b)),
            other => Err(raise(BridgeError::InvalidArgument(format!(
                "bad argument #{position} (only strings, numbers and booleans \
                 can be used as arguments to Praat commands, got {})",
                other.type_name()
            )))),
        }
    }

    fn to_args(values: Variadic<LuaValue>) -> LuaResult<Vec<Arg>> {
        values
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, v)| to_arg(v, i + 2))
            .collect()
    }

    fn to_object(value: LuaValue) -> LuaResult<ObjectRef> {
        match value {
            LuaValue::String(s) => Ok(ObjectRef::Name((*s.to_str()?).to_owned())),
            LuaValue::Table(t) if t.raw_len() == 2 => Ok(ObjectRef::Typed {
                class: t.raw_get(1)?,
                name: t.raw_get(2)?,
            }),
            _ => Err(raise(BridgeError::InvalidArgument(
                "Arguments to select must be strings like 'LongSound mysound' \
                 or pairs like {'LongSound', 'mysound'}."
                    .into(),
            ))),
        }
    }

    fn to_objects(values: Variadic<LuaValue>) -> LuaResult<Vec<ObjectRef>> {
        values.iter().cloned().map(to_object).collect()
    }

    fn raise(err: BridgeError) -> LuaError {
        LuaError::RuntimeError(err.to_string())
    }

    // ── LuaEngine ─────────────────────────────────────────────────────────

    /// A Lua 5.4 interpreter with the Praat API registered.
    ///
    /// One engine runs one script; [`crate::dialect::run_script`] builds a
    /// fresh one per call so no globals leak between scripts.
    pub struct LuaEngine {
        lua: Lua,
    }

    impl LuaEngine {
        pub fn new() -> Self {
            Self { lua: Lua::new() }
        }

        fn register_api(&self, bridge: Bridge) -> LuaResult<()> {
            let lua = &self.lua;
            let globals = lua.globals();
            let praat = lua.create_table()?;

            let register = |name: &str, func: LuaFunction| -> LuaResult<()> {
                praat.set(name, func.clone())?;
                globals.set(name, func)
            };

            // go(cmd, …) → nothing
            {
                let bridge = bridge.clone();
                register(
                    "go",
                    lua.create_function(move |_, (verb, args): (String, Variadic<LuaValue>)| {
                        bridge.go(&verb, &to_args(args)?).map_err(raise)
                    })?,
                )?;
            }

            // getString(cmd, …) → string
            {
                let bridge = bridge.clone();
                register(
                    "getString",
                    lua.create_function(move |_, (verb, args): (String, Variadic<LuaValue>)| {
                        bridge.get_string(&verb, &to_args(args)?).map_err(raise)
                    })?,
                )?;
            }

            // getNum(cmd, …) → number
            {
                let bridge = bridge.clone();
                register(
                    "getNum",
                    lua.create_function(move |_, (verb, args): (String, Variadic<LuaValue>)| {
                        bridge.get_num(&verb, &to_args(args)?).map_err(raise)
                    })?,
                )?;
            }

            // select / plus / minus / remove(obj, …) → nothing
            let selection: [(&str, fn(&Bridge, &[ObjectRef]) -> Result<(), BridgeError>); 4] = [
                ("select", Bridge::select),
                ("plus", Bridge::plus),
                ("minus", Bridge::minus),
                ("remove", Bridge::remove),
            ];
            for (name, method) in selection {
                let bridge = bridge.clone();
                register(
                    name,
                    lua.create_function(move |_, objects: Variadic<LuaValue>| {
                        method(&bridge, &to_objects(objects)?).map_err(raise)
                    })?,
                )?;
            }

            // selected() → string | nil
            {
                let bridge = bridge.clone();
                register(
                    "selected",
                    lua.create_function(move |_, ()| Ok(bridge.selected()))?,
                )?;
            }

            // getargv() → table | nil
            {
                let bridge = bridge.clone();
                register(
                    "getargv",
                    lua.create_function(move |_, ()| Ok(bridge.argv().map(<[String]>::to_vec)))?,
                )?;
            }
            if let Some(argv) = bridge.argv() {
                praat.set("argv", argv.to_vec())?;
            }

            // print(…) → echo one line, arguments tab-separated like Lua's own print
            {
                let bridge = bridge.clone();
                register(
                    "print",
                    lua.create_function(move |lua, values: Variadic<LuaValue>| {
                        let tostring: LuaFunction = lua.globals().get("tostring")?;
                        let parts = values
                            .iter()
                            .cloned()
                            .map(|v| tostring.call::<String>(v))
                            .collect::<LuaResult<Vec<_>>>()?;
                        bridge.print(&parts.join("\t"));
                        Ok(())
                    })?,
                )?;
            }

            globals.set("praat", praat)?;
            Ok(())
        }

        /// Execute a Lua chunk.
        pub fn exec(&self, chunk: &str) -> LuaResult<()> {
            self.lua.load(chunk).set_name("=script").exec()
        }

        /// Evaluate a Lua expression string and return its value.
        pub fn eval<R: FromLuaMulti>(&self, expr: &str) -> LuaResult<R> {
            self.lua.load(expr).eval()
        }
    }

    impl Default for LuaEngine {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ScriptEngine for LuaEngine {
        fn dialect(&self) -> Dialect {
            Dialect::Lua
        }

        fn inject(&mut self, bridge: Bridge) -> Result<(), ScriptError> {
            self.register_api(bridge).map_err(|e| ScriptError::Init {
                dialect: Dialect::Lua,
                message: e.to_string(),
            })
        }

        fn run(&mut self, script: &str) -> Result<(), ScriptError> {
            let chunk = blank_hash_marker(script);
            self.exec(&chunk).map_err(|e| {
                debug!(error = %e, "lua script failed");
                ScriptError::Runtime(e.to_string())
            })
        }
    }

    /// A `#lang=lua` first line is not valid Lua; blank it, keeping line
    /// numbers intact.
    fn blank_hash_marker(script: &str) -> std::borrow::Cow<'_, str> {
        if !script.starts_with('#') {
            return script.into();
        }
        match script.find('\n') {
            Some(nl) => script[nl..].to_owned().into(),
            None => String::new().into(),
        }
    }

    #[cfg(test)]
    pub(super) fn blank_marker_for_test(script: &str) -> String {
        blank_hash_marker(script).into_owned()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
