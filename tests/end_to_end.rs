//! End-to-end sessions against a running server over a Unix socket.

use std::time::Duration;

use pipecrypt::pipeline::apply_keystream;
use pipecrypt::{ClientError, EncryptClient};
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;

mod common;
use common::{eventually, start_server, with_timeout};

fn encrypt_locally(data: &[u8], key: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    apply_keystream(&mut out, key, 0);
    out
}

#[tokio::test]
async fn key_stream_continues_across_chunks() {
    let server = start_server(&[("alice", "secret")], 4, 2).await;

    let mut client = with_timeout(EncryptClient::connect(&server.socket, "alice", "secret", b"key"))
        .await
        .unwrap();
    let first = client.encrypt(b"AAAA").await.unwrap();
    let second = client.encrypt(b"BB").await.unwrap();
    client.close().await.unwrap();

    assert_eq!(first, vec![0x2a, 0x24, 0x38, 0x2a]);
    assert_eq!(second, vec![0x27, 0x3b]);

    let credentials = server.stop().await;
    let record = credentials.list_all().into_iter().find(|r| r.username == "alice").unwrap();
    assert_eq!(record.bytes_encrypted, 6);
    assert!(!record.connected);
}

#[tokio::test]
async fn usage_accumulates_over_sessions() {
    let server = start_server(&[("bob", "pw")], 4, 1).await;

    for _ in 0..3 {
        let mut client = EncryptClient::connect(&server.socket, "bob", "pw", b"k").await.unwrap();
        client.encrypt(&[7u8; 100]).await.unwrap();
        client.close().await.unwrap();
    }

    let credentials = server.stop().await;
    let record = credentials.list_all().into_iter().find(|r| r.username == "bob").unwrap();
    assert_eq!(record.bytes_encrypted, 300);
}

#[tokio::test]
async fn wrong_password_leaves_usage_untouched() {
    let server = start_server(&[("alice", "secret")], 2, 1).await;

    let err = EncryptClient::connect(&server.socket, "alice", "guess", b"key").await.unwrap_err();
    assert!(matches!(err, ClientError::AuthRejected));

    let record = server.record("alice");
    assert_eq!(record.bytes_encrypted, 0);
    assert!(!record.connected);

    let mut client = EncryptClient::connect(&server.socket, "alice", "secret", b"key").await.unwrap();
    client.encrypt(b"x").await.unwrap();
    client.close().await.unwrap();

    let credentials = server.stop().await;
    let record = credentials.list_all().into_iter().find(|r| r.username == "alice").unwrap();
    assert_eq!(record.bytes_encrypted, 1);
}

#[tokio::test]
async fn client_over_ceiling_is_rejected_until_slot_frees() {
    let server = start_server(&[("alice", "secret"), ("bob", "pw")], 1, 1).await;

    let holder = EncryptClient::connect(&server.socket, "alice", "secret", b"key").await.unwrap();

    let err = EncryptClient::connect(&server.socket, "bob", "pw", b"key").await.unwrap_err();
    assert!(matches!(err, ClientError::Rejected));

    holder.close().await.unwrap();

    let socket = server.socket.clone();
    let admitted = with_timeout(async move {
        loop {
            match EncryptClient::connect(&socket, "bob", "pw", b"key").await {
                Ok(client) => break client,
                Err(ClientError::Rejected) => tokio::time::sleep(Duration::from_millis(10)).await,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
    })
    .await;
    admitted.close().await.unwrap();

    server.stop().await;
}

#[tokio::test]
async fn many_concurrent_sessions_keep_their_own_streams() {
    let users: Vec<(String, String)> = (0..8).map(|i| (format!("user{i}"), format!("pw{i}"))).collect();
    let pairs: Vec<(&str, &str)> = users.iter().map(|(u, p)| (u.as_str(), p.as_str())).collect();
    let server = start_server(&pairs, 8, 3).await;

    let mut tasks = Vec::new();
    for (i, (user, pw)) in users.iter().cloned().enumerate() {
        let socket = server.socket.clone();
        tasks.push(tokio::spawn(async move {
            let key = format!("key-{i}").into_bytes();
            let data: Vec<u8> = (0..5000u32).map(|n| (n * 7 + i as u32) as u8).collect();

            let mut client = EncryptClient::connect(&socket, &user, &pw, &key).await.unwrap();
            let mut encrypted = Vec::new();
            for chunk in data.chunks(333) {
                encrypted.extend(client.encrypt(chunk).await.unwrap());
            }
            client.close().await.unwrap();
            assert_eq!(encrypted, encrypt_locally(&data, &key));
        }));
    }
    for task in tasks {
        with_timeout(task).await.unwrap();
    }

    let credentials = server.stop().await;
    for record in credentials.list_all() {
        assert_eq!(record.bytes_encrypted, 5000, "{}", record.username);
    }
}

#[tokio::test]
async fn wrong_initial_command_closes_without_reply() {
    let server = start_server(&[("alice", "secret")], 2, 1).await;

    let mut stream = UnixStream::connect(&server.socket).await.unwrap();
    let mut words = Vec::new();
    for word in [9u32, 5, 6, 3] {
        words.extend_from_slice(&word.to_ne_bytes());
    }
    stream.write_all(&words).await.unwrap();

    let mut reply = Vec::new();
    let n = with_timeout(tokio::io::AsyncReadExt::read_to_end(&mut stream, &mut reply))
        .await
        .unwrap();
    assert_eq!(n, 0);

    server.stop().await;
}

#[tokio::test]
async fn shutdown_waits_for_live_sessions() {
    let server = start_server(&[("alice", "secret")], 2, 1).await;

    let mut client = EncryptClient::connect(&server.socket, "alice", "secret", b"key").await.unwrap();
    server.shutdown.trigger();

    // New clients can no longer reach the channel.
    let socket = server.socket.clone();
    eventually(|| !socket.exists()).await;
    assert!(UnixStream::connect(&server.socket).await.is_err());

    // The live session is still served while draining.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!server.is_finished());
    assert_eq!(client.encrypt(b"AAAA").await.unwrap(), vec![0x2a, 0x24, 0x38, 0x2a]);

    client.close().await.unwrap();
    let credentials = server.stop().await;
    let record = credentials.list_all().into_iter().find(|r| r.username == "alice").unwrap();
    assert_eq!(record.bytes_encrypted, 4);
}

#[tokio::test]
async fn cli_encrypts_a_file() {
    let server = start_server(&[("alice", "secret")], 2, 2).await;

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("plain.bin");
    let output = dir.path().join("cipher.bin");
    let data: Vec<u8> = (0..10_000u32).map(|n| (n % 251) as u8).collect();
    std::fs::write(&input, &data).unwrap();

    let mut cmd = std::process::Command::new(env!("CARGO_BIN_EXE_pipecrypt-cli"));
    cmd.arg("--socket")
        .arg(&server.socket)
        .args(["--username", "alice", "--password", "secret", "--key", "abcde"])
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .args(["--chunk-size", "1000"]);
    let status = with_timeout(tokio::task::spawn_blocking(move || cmd.status()))
        .await
        .unwrap()
        .unwrap();
    assert!(status.success());

    let encrypted = std::fs::read(&output).unwrap();
    assert_eq!(encrypted, encrypt_locally(&data, b"abcde"));

    let credentials = server.stop().await;
    let record = credentials.list_all().into_iter().find(|r| r.username == "alice").unwrap();
    assert_eq!(record.bytes_encrypted, 10_000);
}

#[tokio::test]
async fn shutdown_does_not_wait_for_silent_clients() {
    let server = start_server(&[("alice", "secret")], 2, 1).await;

    let mut silent = UnixStream::connect(&server.socket).await.unwrap();
    let mut half_init = UnixStream::connect(&server.socket).await.unwrap();
    half_init.write_all(&1u32.to_ne_bytes()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // with_timeout inside stop fails the test if the drain hangs.
    server.stop().await;

    for stream in [&mut silent, &mut half_init] {
        let mut reply = Vec::new();
        let n = with_timeout(tokio::io::AsyncReadExt::read_to_end(stream, &mut reply))
            .await
            .unwrap();
        assert_eq!(n, 0);
    }
}
