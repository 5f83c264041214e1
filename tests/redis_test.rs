//! Redis queue store tests.
//!
//! The scripted-server tests run anywhere. The rest need a running Redis
//! (see REDIS_* in `.env`):
//! ```sh
//! cargo test --test redis_test -- --ignored
//! ```

use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use workpipe::codec::{decode_bytes, encode};
use workpipe::config::StoreConfig;
use workpipe::config::secrets::SecretString;
use workpipe::consumer::{Consumer, Cycle};
use workpipe::error::Error;
use workpipe::model::{ActorId, WorkItem};
use workpipe::producer::Producer;
use workpipe::queue::{QueueStore, RedisQueue};

fn local_config() -> StoreConfig {
    dotenvy::dotenv().ok();
    StoreConfig::from_env().unwrap_or_else(|_| StoreConfig {
        host: "127.0.0.1".to_string(),
        port: 6379,
        password: SecretString::from("redis_dev"),
    })
}

/// Unique queue per test run so reruns start empty.
fn test_queue(name: &str) -> String {
    format!("workpipe-test-{name}-{}", uuid::Uuid::new_v4().simple())
}

#[tokio::test]
async fn connect_fails_fast_when_store_is_unreachable() {
    let config = StoreConfig {
        host: "127.0.0.1".to_string(),
        // Nothing listens on port 1.
        port: 1,
        password: SecretString::from("unused"),
    };
    match RedisQueue::connect(&config).await {
        Err(Error::StoreUnavailable { .. }) => {}
        Err(other) => panic!("expected StoreUnavailable, got {other:?}"),
        Ok(_) => panic!("connected to a closed port"),
    }
}

/// Read one RESP array command, `None` once the client hangs up.
async fn read_command<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<Vec<Vec<u8>>> {
    let mut line = Vec::new();
    if reader.read_until(b'\n', &mut line).await.ok()? == 0 {
        return None;
    }
    let count: usize = std::str::from_utf8(&line[1..]).ok()?.trim().parse().ok()?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        line.clear();
        reader.read_until(b'\n', &mut line).await.ok()?;
        let len: usize = std::str::from_utf8(&line[1..]).ok()?.trim().parse().ok()?;
        let mut arg = vec![0; len + 2];
        reader.read_exact(&mut arg).await.ok()?;
        arg.truncate(len);
        args.push(arg);
    }
    Some(args)
}

fn blpop_reply(queue: &str, payload: &[u8]) -> Vec<u8> {
    let mut reply = format!("*2\r\n${}\r\n{queue}\r\n${}\r\n", queue.len(), payload.len()).into_bytes();
    reply.extend_from_slice(payload);
    reply.extend_from_slice(b"\r\n");
    reply
}

/// One-connection RESP server on a free port. Handshake commands get
/// `+OK`, `PING` gets `+PONG`, and each `BLPOP` gets the next scripted
/// reply (a nil array once the script runs out).
async fn scripted_redis(blpop_replies: Vec<Vec<u8>>) -> StoreConfig {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read, mut write) = socket.into_split();
        let mut reader = BufReader::new(read);
        let mut script = blpop_replies.into_iter();

        while let Some(command) = read_command(&mut reader).await {
            let reply = match command[0].to_ascii_uppercase().as_slice() {
                b"PING" => b"+PONG\r\n".to_vec(),
                b"BLPOP" => script.next().unwrap_or_else(|| b"*-1\r\n".to_vec()),
                _ => b"+OK\r\n".to_vec(),
            };
            if write.write_all(&reply).await.is_err() {
                return;
            }
        }
    });

    StoreConfig {
        host: "127.0.0.1".to_string(),
        port,
        password: SecretString::from("scripted"),
    }
}

#[tokio::test]
async fn pop_hands_back_non_utf8_bytes() {
    let config = scripted_redis(vec![blpop_reply("work", b"\xff\xfe")]).await;
    let store = RedisQueue::connect(&config).await.unwrap();

    let popped = store.pop_timeout("work", Duration::from_secs(1)).await.unwrap();
    assert_eq!(popped, Some(b"\xff\xfe".to_vec()));
    assert!(matches!(decode_bytes(b"\xff\xfe"), Err(Error::Decode { .. })));
}

#[tokio::test]
async fn non_utf8_payload_from_redis_is_skipped_not_fatal() {
    let item = WorkItem::new(ActorId::from("Master-1"), "file-1.txt", 1.0).unwrap();
    let config = scripted_redis(vec![
        blpop_reply("work", b"\xff\xfe\xfd"),
        blpop_reply("work", encode(&item).unwrap().as_bytes()),
    ])
    .await;
    let store = RedisQueue::connect(&config).await.unwrap();

    let tmp = tempfile::tempdir().unwrap();
    let c = Consumer::with_id(store, "work", tmp.path(), ActorId::from("Worker-1"));

    assert_eq!(c.run().await.unwrap(), Cycle::Skipped);
    assert_eq!(
        c.run().await.unwrap(),
        Cycle::Written(tmp.path().join("Worker-1/Master-1/file-1.txt"))
    );
}

#[tokio::test]
#[ignore] // Requires running Redis
async fn push_then_pop_is_fifo() {
    let store = RedisQueue::connect(&local_config()).await.unwrap();
    let queue = test_queue("fifo");

    store.push(&queue, "one").await.unwrap();
    store.push(&queue, "two").await.unwrap();
    assert_eq!(store.len(&queue).await.unwrap(), 2);

    assert_eq!(store.blocking_pop(&queue).await.unwrap(), b"one");
    assert_eq!(
        store.pop_timeout(&queue, Duration::from_secs(1)).await.unwrap(),
        Some(b"two".to_vec())
    );
    assert_eq!(store.len(&queue).await.unwrap(), 0);
}

#[tokio::test]
#[ignore] // Requires running Redis
async fn pop_timeout_returns_none_on_empty_queue() {
    let store = RedisQueue::connect(&local_config()).await.unwrap();
    let queue = test_queue("empty");
    let popped = store
        .pop_timeout(&queue, Duration::from_millis(200))
        .await
        .unwrap();
    assert_eq!(popped, None);
}

#[tokio::test]
#[ignore] // Requires running Redis
async fn producer_start_lands_items_in_redis() {
    let store = RedisQueue::connect(&local_config()).await.unwrap();
    let queue = test_queue("producer");

    let producer = Producer::new(store, queue.clone()).with_interval(Duration::ZERO);
    producer.start(3).await.unwrap();
    assert_eq!(producer.store().len(&queue).await.unwrap(), 3);

    for _ in 0..3 {
        let raw = producer.store().blocking_pop(&queue).await.unwrap();
        let item = decode_bytes(&raw).unwrap();
        assert_eq!(item.producer_id(), producer.id());
    }
}
