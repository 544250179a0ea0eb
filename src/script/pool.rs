//! Shared interpreter plus a pool of worker interpreters.

use mlua::{Lua, Value};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, warn};

use super::codec::actions_from_value;
use super::library::ScriptLibrary;
use super::portable::{PortableFunction, PortableValue, restore_args};
use crate::event::Event;
use crate::telemetry::spans;

/// The event a script call is running for.
///
/// Present in an interpreter's app data only while a call is in progress.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub network: String,
    pub event: Event,
}

impl CallContext {
    pub fn for_event(event: &Event) -> Self {
        Self {
            network: event.network.clone(),
            event: event.clone(),
        }
    }
}

/// Records a [`CallContext`] on an interpreter and clears it on drop.
pub struct CallScope<'a> {
    lua: &'a Lua,
}

impl<'a> CallScope<'a> {
    pub fn enter(lua: &'a Lua, context: CallContext) -> Self {
        lua.set_app_data(context);
        Self { lua }
    }
}

impl Drop for CallScope<'_> {
    fn drop(&mut self) {
        self.lua.remove_app_data::<CallContext>();
    }
}

/// A callable and its arguments, detached from the interpreter that made them.
#[derive(Debug, Clone)]
pub struct WorkerJob {
    pub function: PortableFunction,
    pub args: Vec<PortableValue>,
    pub context: CallContext,
}

/// Owner of every interpreter the bot runs.
///
/// Handlers and reloads run on the shared interpreter, one at a time. Worker
/// jobs each check out an interpreter of their own.
pub struct InterpreterPool {
    shared: Mutex<Lua>,
    idle: parking_lot::Mutex<Vec<Lua>>,
    library: Arc<ScriptLibrary>,
}

impl InterpreterPool {
    pub fn new(library: Arc<ScriptLibrary>) -> mlua::Result<Arc<Self>> {
        let shared = library.new_interpreter()?;
        let pool = Arc::new(Self {
            shared: Mutex::new(shared),
            idle: parking_lot::Mutex::new(Vec::new()),
            library,
        });
        pool.library.attach(&pool);
        Ok(pool)
    }

    /// Lock the shared interpreter.
    pub async fn shared(&self) -> MutexGuard<'_, Lua> {
        self.shared.lock().await
    }

    pub fn library(&self) -> &Arc<ScriptLibrary> {
        &self.library
    }

    /// Interpreters currently waiting in the pool.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    fn checkout(&self) -> mlua::Result<Lua> {
        if let Some(lua) = self.idle.lock().pop() {
            return Ok(lua);
        }
        debug!("Creating worker interpreter");
        self.library.new_interpreter()
    }

    fn checkin(&self, lua: Lua) {
        lua.remove_app_data::<CallContext>();
        self.idle.lock().push(lua);
    }

    /// Run `job` on a detached task.
    pub fn spawn_worker(self: &Arc<Self>, job: WorkerJob) -> JoinHandle<()> {
        let pool = Arc::clone(self);
        let span = spans::worker(&job.context.network);
        tokio::spawn(async move { pool.run_worker(job).await }.instrument(span))
    }

    /// Execute a worker job and forward the actions it returns.
    ///
    /// Failures are logged; nothing is reported back to the script.
    pub async fn run_worker(&self, job: WorkerJob) {
        let lua = match self.checkout() {
            Ok(lua) => lua,
            Err(e) => {
                warn!(error = %e, "Worker interpreter unavailable");
                return;
            }
        };

        let outcome = {
            let _scope = CallScope::enter(&lua, job.context.clone());
            match call_worker(&lua, &job).await {
                Ok(value) => actions_from_value(&job.context.network, value)
                    .map_err(mlua::Error::external),
                Err(e) => Err(e),
            }
        };
        self.checkin(lua);

        match outcome {
            Ok(actions) => self.library.servers().deliver_all(actions),
            Err(e) => warn!(error = %e, "worker: error calling Lua"),
        }
    }
}

async fn call_worker(lua: &Lua, job: &WorkerJob) -> mlua::Result<Value> {
    let function = job.function.restore(lua)?;
    let args = restore_args(lua, &job.args)?;
    function.call_async::<Value>(args).await
}
