//! Response timeout race.

use std::time::{Duration, Instant};

use splitlink::Reply;

use super::test_helpers::{connected_pair, EXPECT_WAIT};

// ── Sentinel ─────────────────────────────────────────────────────────────────

/// With a 50 ms timeout and no reply, the future resolves with the
/// `NoAnswer` sentinel after roughly 50 ms rather than hanging.
#[tokio::test]
async fn unanswered_command_resolves_with_sentinel() {
    let (client, mut peer, _server) = connected_pair(Duration::from_millis(50)).await;

    let started = Instant::now();
    let pending = client.send("getcurrenttime").expect("send");
    assert_eq!(peer.recv_line().await, "getcurrenttime");

    let reply = tokio::time::timeout(EXPECT_WAIT, pending)
        .await
        .expect("timeout must resolve the future")
        .expect("still connected");

    assert_eq!(reply, Reply::NoAnswer);
    assert!(
        started.elapsed() >= Duration::from_millis(45),
        "resolved too early: {:?}",
        started.elapsed()
    );
}

// ── Queue advances ───────────────────────────────────────────────────────────

/// A timed-out head releases the next command, which then correlates with
/// the next line normally.
#[tokio::test]
async fn timeout_releases_next_command() {
    let (client, mut peer, _server) = connected_pair(Duration::from_millis(50)).await;

    let a = client.send("getbestpossibletime").expect("send a");
    let b = client.send("getsplitindex").expect("send b");

    assert_eq!(peer.recv_line().await, "getbestpossibletime");
    // a already has its 50 ms deadline; give b room to be answered.
    client.set_response_timeout(Duration::from_secs(5));
    // No reply to a: b is only written once a has timed out.
    assert_eq!(peer.recv_line().await, "getsplitindex");
    peer.reply("2").await;

    assert_eq!(a.await.expect("a"), Reply::NoAnswer);
    assert_eq!(b.await.expect("b"), Reply::Line("2".to_owned()));
}

// ── Data wins the race ───────────────────────────────────────────────────────

/// A reply that beats the deadline wins; the deadline has no later effect on
/// the next command.
#[tokio::test]
async fn reply_before_deadline_cancels_timer() {
    let (client, mut peer, _server) = connected_pair(Duration::from_millis(200)).await;

    let a = client.send("getdelta").expect("send a");
    assert_eq!(peer.recv_line().await, "getdelta");
    peer.reply("-0.10").await;
    assert_eq!(a.await.expect("a").as_line(), Some("-0.10"));

    client.set_response_timeout(Duration::from_secs(5));
    let b = client.send("getsplitindex").expect("send b");
    assert_eq!(peer.recv_line().await, "getsplitindex");
    // Well past a's old deadline.
    tokio::time::sleep(Duration::from_millis(300)).await;
    peer.reply("1").await;

    assert_eq!(b.await.expect("b").as_line(), Some("1"));
}

// ── Timeout changes ──────────────────────────────────────────────────────────

/// The timeout is read when a command is transmitted.
#[tokio::test]
async fn timeout_is_sampled_at_transmission() {
    let (client, mut peer, _server) = connected_pair(Duration::from_secs(5)).await;
    assert_eq!(client.response_timeout(), Duration::from_secs(5));

    client.set_response_timeout(Duration::from_millis(30));
    let pending = client.send("getcurrenttime").expect("send");
    assert_eq!(peer.recv_line().await, "getcurrenttime");

    let reply = tokio::time::timeout(EXPECT_WAIT, pending)
        .await
        .expect("short timeout applied")
        .expect("still connected");
    assert!(reply.is_no_answer());
}
