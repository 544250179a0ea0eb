//! The bot core: script reloads, event dispatch and connection management.
//!
//! - [`dispatch`]: inbound events → handlers → actions
//! - [`reconcile`]: declared servers → live connections
//! - [`recovery`]: replacing failed connections

mod dispatch;
mod reconcile;
mod recovery;

pub use reconcile::ReconcilePlan;

use async_trait::async_trait;
use bananaboat_proto::Message;
use mlua::{ChunkMode, Value};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use tracing::{Instrument, info};

use crate::apis::HttpApis;
use crate::config::Config;
use crate::error::{BotError, ScriptLoadError, TransportError};
use crate::event::Event;
use crate::network::{ConnectionEvents, Connector, Generation, ServerSet};
use crate::script::{BotDefaults, HandlerRegistry, InterpreterPool, ScriptDefinition, ScriptLibrary};
use crate::telemetry::spans;

/// A running bot.
pub struct Bot {
    config: Config,
    interpreters: Arc<InterpreterPool>,
    registry: HandlerRegistry,
    servers: Arc<ServerSet>,
    defaults: RwLock<BotDefaults>,
    connector: Arc<dyn Connector>,
    events: Arc<dyn ConnectionEvents>,
}

impl Bot {
    /// Build a bot with no script loaded yet; call [`Bot::reload`] next.
    pub fn new(config: Config, connector: Arc<dyn Connector>) -> Result<Arc<Self>, BotError> {
        let servers = Arc::new(ServerSet::new());
        let apis = HttpApis::new(&config.http)?;
        let library = ScriptLibrary::new(Arc::clone(&servers), apis);
        let interpreters = InterpreterPool::new(library).map_err(ScriptLoadError::Lua)?;

        Ok(Arc::new_cyclic(|bot: &Weak<Bot>| Self {
            config,
            interpreters,
            registry: HandlerRegistry::new(),
            servers,
            defaults: RwLock::new(BotDefaults::default()),
            connector,
            events: Arc::new(EventSink { bot: bot.clone() }),
        }))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn servers(&self) -> &Arc<ServerSet> {
        &self.servers
    }

    pub fn interpreters(&self) -> &Arc<InterpreterPool> {
        &self.interpreters
    }

    pub fn defaults(&self) -> BotDefaults {
        self.defaults.read().clone()
    }

    /// Re-run the script and apply its definition.
    ///
    /// The result is validated in full first; on error nothing changes.
    pub async fn reload(&self) -> Result<(), BotError> {
        let path = self.config.bot.script.display().to_string();
        let span = spans::reload(&path);
        let definition = self.load_script(&path).instrument(span.clone()).await?;

        let handlers = self.registry.len();
        let plan = self.reconcile(definition.servers).instrument(span).await;
        info!(
            path = %path,
            handlers,
            created = plan.create.len(),
            replaced = plan.replace.len(),
            removed = plan.remove.len(),
            "Script loaded"
        );
        Ok(())
    }

    /// Evaluate the script and commit defaults and handlers.
    ///
    /// Returns the definition so its servers can be reconciled.
    async fn load_script(&self, path: &str) -> Result<ScriptDefinition, ScriptLoadError> {
        let source = tokio::fs::read(&self.config.bot.script)
            .await
            .map_err(|source| ScriptLoadError::Read {
                path: path.to_owned(),
                source,
            })?;

        let lua = self.interpreters.shared().await;
        let value: Value = lua
            .load(&source[..])
            .set_name(format!("@{path}"))
            .set_mode(ChunkMode::Text)
            .call_async(())
            .await?;

        let current = self.defaults();
        let mut definition = ScriptDefinition::from_value(value, &current, &self.config.bot)?;

        *self.defaults.write() = definition.defaults.clone();
        self.registry
            .replace(std::mem::take(&mut definition.handlers));
        drop(lua);

        Ok(definition)
    }

    /// Close every connection.
    pub async fn close(&self) {
        info!("Shutting down");
        let _guard = self.servers.lock().await;
        self.servers.close_all();
    }
}

/// Routes connection callbacks back into the bot without keeping it alive.
struct EventSink {
    bot: Weak<Bot>,
}

#[async_trait]
impl ConnectionEvents for EventSink {
    async fn message(&self, network: &str, message: Message) {
        if let Some(bot) = self.bot.upgrade() {
            bot.handle_event(Event::from_message(network, &message))
                .await;
        }
    }

    async fn error(&self, network: &str, generation: Generation, error: TransportError) {
        if let Some(bot) = self.bot.upgrade() {
            bot.handle_connection_error(network, generation, error)
                .await;
        }
    }
}
