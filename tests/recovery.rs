//! Connection error recovery.

use bananaboatbot::error::TransportError;
use bananaboatbot::network::{Backoff, Connection};
use std::time::Duration;

mod common;
use common::{TestBot, eventually};

const SCRIPT: &str = r#"
return {
    handlers = {},
    servers = { alpha = { server = "alpha.example" } },
}
"#;

#[tokio::test]
async fn test_error_replaces_connection_with_inherited_backoff() {
    let bot = TestBot::loaded(SCRIPT).await;
    let old = bot.connector.latest("alpha").unwrap();

    let mut backoff = Backoff::default();
    for _ in 0..3 {
        backoff.next_delay(Duration::from_secs(3600));
    }
    old.set_backoff(backoff);

    let replacement = bot
        .bot
        .handle_connection_error("alpha", old.generation().clone(), TransportError::Closed)
        .await
        .expect("current instance is recovered");

    assert!(old.is_closed());
    assert!(!replacement.generation().same_instance(old.generation()));
    assert_eq!(bot.connector.created_for("alpha"), 2);

    let new = bot.connector.latest("alpha").unwrap();
    assert!(eventually(|| new.wait_count() == 1 && new.dial_count() == 1).await);
    // Inherited three attempts, then waited once more.
    assert_eq!(new.backoff().attempts(), 4);

    let live = bot.bot.servers().get("alpha").unwrap();
    assert!(live.generation().same_instance(new.generation()));
}

#[tokio::test]
async fn test_error_via_event_sink() {
    let bot = TestBot::loaded(SCRIPT).await;
    let old = bot.connector.latest("alpha").unwrap();

    old.fail().await;

    assert!(old.is_closed());
    assert_eq!(bot.connector.created_for("alpha"), 2);
}

#[tokio::test]
async fn test_superseded_error_is_ignored() {
    let bot = TestBot::loaded(SCRIPT).await;
    let old = bot.connector.latest("alpha").unwrap();
    let stale = old.generation().clone();

    assert!(
        bot.bot
            .handle_connection_error("alpha", stale.clone(), TransportError::Closed)
            .await
            .is_some()
    );

    // The same instance failing again must not trigger a second recovery.
    assert!(
        bot.bot
            .handle_connection_error("alpha", stale, TransportError::Closed)
            .await
            .is_none()
    );
    assert_eq!(bot.connector.created_for("alpha"), 2);
}

#[tokio::test]
async fn test_error_after_reload_replacement_is_ignored() {
    let bot = TestBot::loaded(SCRIPT).await;
    let old = bot.connector.latest("alpha").unwrap();

    bot.write_script(
        r#"return { handlers = {}, servers = { alpha = { server = "alpha.example", port = 7000 } } }"#,
    );
    bot.reload().await.unwrap();
    assert_eq!(bot.connector.created_for("alpha"), 2);

    let recovered = bot
        .bot
        .handle_connection_error("alpha", old.generation().clone(), TransportError::Closed)
        .await;
    assert!(recovered.is_none());
    assert_eq!(bot.connector.created_for("alpha"), 2);
}

#[tokio::test]
async fn test_error_for_removed_server_is_ignored() {
    let bot = TestBot::loaded(SCRIPT).await;
    let old = bot.connector.latest("alpha").unwrap();

    bot.write_script("return { handlers = {} }");
    bot.reload().await.unwrap();

    let recovered = bot
        .bot
        .handle_connection_error("alpha", old.generation().clone(), TransportError::Closed)
        .await;
    assert!(recovered.is_none());
    assert!(bot.bot.servers().is_empty());
}
