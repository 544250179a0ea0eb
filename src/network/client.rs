//! TCP/TLS IRC client connections.

use async_trait::async_trait;
use bananaboat_proto::Message;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{Instrument, debug, info, warn};

use super::backoff::Backoff;
use super::codec::IrcCodec;
use super::connection::{Connection, ConnectionEvents, Connector};
use super::generation::Generation;
use super::settings::ServerSettings;
use super::stream::IrcStream;
use super::tls::upgrade_to_tls;
use crate::error::TransportError;
use crate::telemetry::spans;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Inbound messages buffered while a dispatch is in progress.
const INBOUND_BACKLOG: usize = 512;

type IrcSink = SplitSink<Framed<IrcStream, IrcCodec>, Message>;
type IrcSource = SplitStream<Framed<IrcStream, IrcCodec>>;

/// Creates [`IrcConnection`]s with a fixed outbound queue capacity.
pub struct IrcConnector {
    outbound_capacity: usize,
}

impl IrcConnector {
    pub fn new(outbound_capacity: usize) -> Self {
        Self {
            outbound_capacity: outbound_capacity.max(1),
        }
    }
}

impl Connector for IrcConnector {
    fn connect(
        &self,
        name: &str,
        settings: ServerSettings,
        events: Arc<dyn ConnectionEvents>,
    ) -> Arc<dyn Connection> {
        Arc::new(IrcConnection::new(
            name,
            settings,
            self.outbound_capacity,
            events,
        ))
    }
}

/// One client connection instance.
///
/// Dials at most once; recovery replaces the whole instance.
pub struct IrcConnection {
    name: String,
    settings: ServerSettings,
    generation: Generation,
    backoff: Mutex<Backoff>,
    outbound: mpsc::Sender<Message>,
    outbound_rx: Mutex<Option<mpsc::Receiver<Message>>>,
    events: Arc<dyn ConnectionEvents>,
}

impl IrcConnection {
    pub fn new(
        name: &str,
        settings: ServerSettings,
        outbound_capacity: usize,
        events: Arc<dyn ConnectionEvents>,
    ) -> Self {
        let (outbound, outbound_rx) = mpsc::channel(outbound_capacity);
        Self {
            name: name.to_owned(),
            settings,
            generation: Generation::new(),
            backoff: Mutex::new(Backoff::default()),
            outbound,
            outbound_rx: Mutex::new(Some(outbound_rx)),
            events,
        }
    }

    async fn open(&self) -> Result<IrcStream, TransportError> {
        let address = self.settings.address();
        info!(address = %address, tls = self.settings.tls, "Connecting");

        let tcp = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(&address))
            .await
            .map_err(|_| TransportError::ConnectTimeout(address.clone()))??;

        if self.settings.tls {
            let tls = upgrade_to_tls(tcp, &self.settings.host, self.settings.verify_tls).await?;
            Ok(IrcStream::Tls(Box::new(tls)))
        } else {
            Ok(IrcStream::Plain(tcp))
        }
    }

    async fn run(&self, outbound: mpsc::Receiver<Message>) -> Result<(), TransportError> {
        let stream = self.open().await?;
        let (sink, source) = Framed::new(stream, IrcCodec::new()).split();

        // Registration and PONG replies skip the bounded queue.
        let (control, control_rx) = mpsc::unbounded_channel();
        let _ = control.send(Message::new("NICK", [self.settings.nick.as_str()]));
        let _ = control.send(Message::new(
            "USER",
            [
                self.settings.username.as_str(),
                "0",
                "*",
                self.settings.realname.as_str(),
            ],
        ));

        let (received, to_dispatch) = mpsc::channel(INBOUND_BACKLOG);
        let receiving = async {
            let (result, ()) = tokio::join!(
                self.read_loop(source, &control, received),
                self.dispatch_loop(to_dispatch),
            );
            result
        };

        tokio::select! {
            result = write_loop(sink, control_rx, outbound) => result,
            result = receiving => result,
        }
    }

    /// Answer PINGs and track registration, then pass every message on.
    async fn read_loop(
        &self,
        mut source: IrcSource,
        control: &mpsc::UnboundedSender<Message>,
        received: mpsc::Sender<Message>,
    ) -> Result<(), TransportError> {
        while let Some(message) = source.next().await {
            let message = message?;
            match message.command.as_str() {
                "PING" => {
                    let _ = control.send(Message::new(
                        "PONG",
                        message.params.iter().map(String::as_str),
                    ));
                }
                "001" => {
                    self.backoff.lock().reset();
                    info!(nick = %self.settings.nick, "Registered");
                }
                _ => {}
            }
            if received.send(message).await.is_err() {
                break;
            }
        }
        Err(TransportError::Closed)
    }

    /// Hand messages to the event sink in arrival order.
    async fn dispatch_loop(&self, mut to_dispatch: mpsc::Receiver<Message>) {
        while let Some(message) = to_dispatch.recv().await {
            self.events.message(&self.name, message).await;
        }
    }
}

async fn write_loop(
    mut sink: IrcSink,
    mut control: mpsc::UnboundedReceiver<Message>,
    mut outbound: mpsc::Receiver<Message>,
) -> Result<(), TransportError> {
    loop {
        let message = tokio::select! {
            biased;
            Some(message) = control.recv() => message,
            queued = outbound.recv() => queued.ok_or(TransportError::Closed)?,
        };
        debug!(command = %message.command, "Sending");
        sink.send(message).await?;
    }
}

#[async_trait]
impl Connection for IrcConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    fn generation(&self) -> &Generation {
        &self.generation
    }

    fn outbound(&self) -> &mpsc::Sender<Message> {
        &self.outbound
    }

    fn backoff(&self) -> Backoff {
        *self.backoff.lock()
    }

    fn set_backoff(&self, backoff: Backoff) {
        *self.backoff.lock() = backoff;
    }

    async fn reconnect_wait(&self) {
        let delay = self
            .backoff
            .lock()
            .next_delay(self.settings.max_reconnect());
        info!(network = %self.name, delay_secs = delay.as_secs(), "Waiting before reconnect");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = self.generation.cancelled() => {}
        }
    }

    async fn dial(&self) {
        let Some(outbound) = self.outbound_rx.lock().take() else {
            warn!(network = %self.name, error = %TransportError::AlreadyDialed, "Dial ignored");
            return;
        };

        let span = spans::connection(&self.name, &self.settings.address());
        let result = tokio::select! {
            _ = self.generation.cancelled() => return,
            result = self.run(outbound).instrument(span) => result,
        };

        // run() only ever ends in failure
        let error = match result {
            Ok(()) => TransportError::Closed,
            Err(e) => e,
        };
        if self.generation.is_cancelled() {
            return;
        }
        self.events
            .error(&self.name, self.generation.clone(), error)
            .await;
    }

    fn close(&self) {
        if !self.generation.is_cancelled() {
            debug!(network = %self.name, "Closing connection");
        }
        self.generation.cancel();
    }
}
