//! Integration test common infrastructure.
//!
//! Provides a recording connector, a bot wired to a temporary script file,
//! and a minimal IRC server for exercising the real client.

pub mod connector;
pub mod server;

#[allow(unused_imports)]
pub use connector::{MockConnection, MockConnector};
#[allow(unused_imports)]
pub use server::FakeIrcServer;

use bananaboatbot::{Bot, BotError, Config};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

/// A bot whose script lives in a temporary file.
#[allow(dead_code)]
pub struct TestBot {
    pub bot: Arc<Bot>,
    pub connector: Arc<MockConnector>,
    script: NamedTempFile,
}

#[allow(dead_code)]
impl TestBot {
    /// Create a bot for `script` without loading it.
    pub fn new(script: &str) -> Self {
        Self::with_queue(script, 100)
    }

    pub fn with_queue(script: &str, outbound_queue: usize) -> Self {
        let mut file = tempfile::Builder::new()
            .suffix(".lua")
            .tempfile()
            .expect("create script file");
        file.write_all(script.as_bytes()).expect("write script");

        let connector = Arc::new(MockConnector::new(outbound_queue));
        let config = Config::for_script(file.path());
        let bot = Bot::new(config, connector.clone()).expect("build bot");

        Self {
            bot,
            connector,
            script: file,
        }
    }

    /// Create a bot and load `script`, panicking if it is rejected.
    pub async fn loaded(script: &str) -> Self {
        let test_bot = Self::new(script);
        test_bot.reload().await.expect("initial reload");
        test_bot
    }

    /// Replace the script file's contents.
    pub fn write_script(&self, script: &str) {
        std::fs::write(self.script.path(), script).expect("rewrite script");
    }

    pub async fn reload(&self) -> Result<(), BotError> {
        self.bot.reload().await
    }
}

/// Poll `condition` until it holds or two seconds pass.
#[allow(dead_code)]
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
