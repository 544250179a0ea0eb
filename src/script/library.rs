//! The `bananaboat` Lua module.
//!
//! ```lua
//! local bb = require("bananaboat")
//! local roll = bb.random(6)
//! bb.worker(function(to, url)
//!     local title = require("bananaboat").get_title(url)
//!     return {{ command = "PRIVMSG", params = { to, title } }}
//! end, "#c", url)
//! ```
//!
//! A function handed to `worker` runs on another interpreter and loses the
//! locals it captured, so everything it needs is passed as arguments.

use mlua::{Function, IntoLuaMulti, Lua, LuaOptions, LuaSerdeExt, MultiValue, StdLib, Table};
use rand::rngs::{OsRng, StdRng};
use rand::{Rng, SeedableRng};
use std::sync::{Arc, OnceLock, Weak};
use tracing::warn;

use super::pool::{CallContext, InterpreterPool, WorkerJob};
use super::portable::{PortableFunction, capture_args, stash_debug_library};
use crate::apis::HttpApis;
use crate::error::BotError;
use crate::network::ServerSet;

/// Name scripts `require`.
pub const MODULE_NAME: &str = "bananaboat";

/// Create a bare interpreter with the safe standard libraries.
///
/// `debug` is opened as well but kept in the registry for rebinding restored
/// worker functions; scripts cannot reach it.
#[allow(unsafe_code)]
pub fn new_interpreter() -> mlua::Result<Lua> {
    // SAFETY: the only binary chunks loaded are produced by `Function::dump`
    // inside this process (see `PortableFunction`), and the debug library is
    // removed from the globals before any script runs.
    let lua = unsafe { Lua::unsafe_new_with(StdLib::ALL_SAFE | StdLib::DEBUG, LuaOptions::new()) };
    stash_debug_library(&lua)?;
    Ok(lua)
}

/// Host functions shared by every interpreter.
pub struct ScriptLibrary {
    servers: Arc<ServerSet>,
    apis: HttpApis,
    pool: OnceLock<Weak<InterpreterPool>>,
}

impl ScriptLibrary {
    pub fn new(servers: Arc<ServerSet>, apis: HttpApis) -> Arc<Self> {
        Arc::new(Self {
            servers,
            apis,
            pool: OnceLock::new(),
        })
    }

    pub fn servers(&self) -> &Arc<ServerSet> {
        &self.servers
    }

    pub(super) fn attach(&self, pool: &Arc<InterpreterPool>) {
        let _ = self.pool.set(Arc::downgrade(pool));
    }

    /// Create an interpreter with the module preloaded.
    pub fn new_interpreter(self: &Arc<Self>) -> mlua::Result<Lua> {
        let lua = new_interpreter()?;
        let library = Arc::clone(self);
        let loader = lua.create_function(move |lua, _: MultiValue| library.module(lua))?;
        let package: Table = lua.globals().get("package")?;
        let preload: Table = package.get("preload")?;
        preload.set(MODULE_NAME, loader)?;
        Ok(lua)
    }

    fn module(self: &Arc<Self>, lua: &Lua) -> mlua::Result<Table> {
        let module = lua.create_table()?;

        module.set("random", lua.create_function(|_, n: i64| Ok(random(n)))?)?;

        let library = Arc::clone(self);
        module.set(
            "worker",
            lua.create_function(move |lua, (function, args): (Function, MultiValue)| {
                library.schedule_worker(lua, &function, &args)
            })?,
        )?;

        let apis = self.apis.clone();
        module.set(
            "get_title",
            lua.create_async_function(move |_, url: String| {
                let apis = apis.clone();
                async move {
                    match apis.fetch_title(&url).await {
                        Ok(title) => Ok(Some(title)),
                        Err(e) => {
                            log_api_failure("get_title", e);
                            Ok(None)
                        }
                    }
                }
            })?,
        )?;

        let apis = self.apis.clone();
        module.set(
            "owm",
            lua.create_async_function(move |_, (api_key, location): (String, String)| {
                let apis = apis.clone();
                async move {
                    match apis.weather(&api_key, &location).await {
                        Ok(summary) => Ok(Some(summary)),
                        Err(e) => {
                            log_api_failure("owm", e);
                            Ok(None)
                        }
                    }
                }
            })?,
        )?;

        let apis = self.apis.clone();
        module.set(
            "luis_predict",
            lua.create_async_function(
                move |lua, (region, app_id, key, utterance): (String, String, String, String)| {
                    let apis = apis.clone();
                    async move {
                        match apis.predict_intent(&region, &app_id, &key, &utterance).await {
                            Ok(prediction) => {
                                let entities = lua.to_value(&prediction.entities)?;
                                (prediction.intent, prediction.score, entities).into_lua_multi(&lua)
                            }
                            Err(e) => {
                                log_api_failure("luis_predict", e);
                                Ok(MultiValue::new())
                            }
                        }
                    }
                },
            )?,
        )?;

        Ok(module)
    }

    /// Capture a worker call and hand it to the pool.
    fn schedule_worker(&self, lua: &Lua, function: &Function, args: &MultiValue) -> mlua::Result<()> {
        let context = lua
            .app_data_ref::<CallContext>()
            .map(|context| (*context).clone())
            .ok_or_else(|| mlua::Error::runtime("worker called outside of an event handler"))?;

        let job = WorkerJob {
            function: PortableFunction::capture(function).map_err(mlua::Error::external)?,
            args: capture_args(args).map_err(mlua::Error::external)?,
            context,
        };

        let pool = self
            .pool
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| mlua::Error::runtime("interpreter pool is shut down"))?;
        pool.spawn_worker(job);
        Ok(())
    }
}

/// Uniform integer in `[1, n]` from a freshly OS-seeded generator.
///
/// If the OS source fails the value comes from the thread generator and the
/// error text is returned alongside it.
pub fn random(n: i64) -> (Option<i64>, Option<String>) {
    if n <= 0 {
        return (None, Some("upper bound must be positive".to_string()));
    }
    match StdRng::from_rng(OsRng) {
        Ok(mut rng) => (Some(rng.gen_range(1..=n)), None),
        Err(e) => (Some(rand::thread_rng().gen_range(1..=n)), Some(e.to_string())),
    }
}

fn log_api_failure(function: &'static str, error: crate::error::ExternalApiError) {
    let error = BotError::ExternalApi(error);
    warn!(function, error = %error, code = error.error_code(), "Library call failed");
}
