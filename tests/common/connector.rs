//! Recording connector that never touches the network.

use async_trait::async_trait;
use bananaboat_proto::Message;
use bananaboatbot::error::TransportError;
use bananaboatbot::network::{
    Backoff, Connection, ConnectionEvents, Connector, Generation, ServerSettings,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// A connection that records what happens to it.
pub struct MockConnection {
    name: String,
    settings: ServerSettings,
    generation: Generation,
    backoff: Mutex<Backoff>,
    outbound: mpsc::Sender<Message>,
    outbound_rx: Mutex<mpsc::Receiver<Message>>,
    events: Arc<dyn ConnectionEvents>,
    dials: AtomicUsize,
    waits: AtomicUsize,
    closed: AtomicBool,
}

#[allow(dead_code)]
impl MockConnection {
    /// Feed an inbound line as if the server had sent it.
    pub async fn inject(&self, line: &str) {
        let message: Message = line.parse().expect("valid IRC line");
        self.events.message(&self.name, message).await;
    }

    /// Report a transport failure for this instance.
    pub async fn fail(&self) {
        self.events
            .error(&self.name, self.generation.clone(), TransportError::Closed)
            .await;
    }

    /// Everything queued for sending so far.
    pub fn drain(&self) -> Vec<Message> {
        let mut rx = self.outbound_rx.lock();
        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    pub fn dial_count(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    pub fn wait_count(&self) -> usize {
        self.waits.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connection for MockConnection {
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
        // Advance the backoff like the real client, without sleeping.
        self.backoff.lock().next_delay(self.settings.max_reconnect());
        self.waits.fetch_add(1, Ordering::SeqCst);
    }

    async fn dial(&self) {
        self.dials.fetch_add(1, Ordering::SeqCst);
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.generation.cancel();
    }
}

/// Connector handing out [`MockConnection`]s and remembering every one.
pub struct MockConnector {
    capacity: usize,
    created: Mutex<Vec<Arc<MockConnection>>>,
}

#[allow(dead_code)]
impl MockConnector {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            created: Mutex::new(Vec::new()),
        }
    }

    /// Most recently created connection for `name`.
    pub fn latest(&self, name: &str) -> Option<Arc<MockConnection>> {
        self.created
            .lock()
            .iter()
            .rev()
            .find(|c| c.name == name)
            .cloned()
    }

    /// How many connections were ever created for `name`.
    pub fn created_for(&self, name: &str) -> usize {
        self.created.lock().iter().filter(|c| c.name == name).count()
    }

    pub fn total_created(&self) -> usize {
        self.created.lock().len()
    }
}

impl Connector for MockConnector {
    fn connect(
        &self,
        name: &str,
        settings: ServerSettings,
        events: Arc<dyn ConnectionEvents>,
    ) -> Arc<dyn Connection> {
        let (outbound, outbound_rx) = mpsc::channel(self.capacity);
        let connection = Arc::new(MockConnection {
            name: name.to_string(),
            settings,
            generation: Generation::new(),
            backoff: Mutex::new(Backoff::default()),
            outbound,
            outbound_rx: Mutex::new(outbound_rx),
            events,
            dials: AtomicUsize::new(0),
            waits: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        });
        self.created.lock().push(Arc::clone(&connection));
        connection
    }
}
