//! Inbound event dispatch.

use mlua::{Function, Value};
use tracing::{Instrument, info, warn};

use super::Bot;
use crate::error::BotError;
use crate::event::{Action, Event};
use crate::script::{CallContext, CallScope, actions_from_value, event_args};
use crate::telemetry::{DispatchTimer, spans};

impl Bot {
    /// Run the handler registered for `event.command`, if any, and forward the
    /// actions it returns.
    pub async fn handle_event(&self, event: Event) {
        if self.config.bot.log_commands {
            info!(
                network = %event.network,
                source = event.sender_nick.as_deref().unwrap_or(""),
                command = %event.command,
                params = ?event.params,
                "Received"
            );
        }

        // No interpreter lock is taken for unhandled commands.
        let Some(handler) = self.registry.get(&event.command) else {
            return;
        };

        let span = spans::dispatch(
            &event.network,
            &event.command,
            event.sender_nick.as_deref(),
        );
        let actions = self.call_handler(&handler, &event).instrument(span).await;
        self.servers.deliver_all(actions);
    }

    /// Protected call on the shared interpreter. Faults yield no actions.
    async fn call_handler(&self, handler: &Function, event: &Event) -> Vec<Action> {
        let _timer = DispatchTimer::new(&event.network, &event.command);

        let lua = self.interpreters.shared().await;
        let _scope = CallScope::enter(&lua, CallContext::for_event(event));

        let result = match handler.call_async::<Value>(event_args(event)).await {
            Ok(value) => actions_from_value(&event.network, value).map_err(mlua::Error::external),
            Err(e) => Err(e),
        };

        match result {
            Ok(actions) => actions,
            Err(source) => {
                let error = BotError::HandlerFault {
                    command: event.command.clone(),
                    source,
                };
                warn!(
                    network = %event.network,
                    error = %error,
                    code = error.error_code(),
                    "Handler failed"
                );
                Vec::new()
            }
        }
    }
}
