//! End-to-end tests over a real socket
//!
//! Spins an in-process stub of the simulator-side endpoint on a temp socket
//! and exercises the production transport and dispatcher against it:
//! connect, get/set round trips, command batches, and reconnect after the
//! endpoint goes away.

use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::task::JoinHandle;
use xplane_link::{
    ConnectionState, DataRef, DataRefValue, Link, LinkConfig, LinkError, PipeTransport,
    TransportError,
};

/// Accept one connection and answer up to `max_requests` request lines with
/// `respond`, then drop the connection and the listener.
fn spawn_stub<F>(listener: UnixListener, max_requests: usize, respond: F) -> JoinHandle<Vec<String>>
where
    F: Fn(&str) -> String + Send + 'static,
{
    tokio::spawn(async move {
        let mut seen = Vec::new();
        let (stream, _) = listener.accept().await.expect("accept");
        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();

        while seen.len() < max_requests {
            let Ok(Some(line)) = lines.next_line().await else {
                break;
            };
            let reply = respond(&line);
            seen.push(line);
            write_half
                .write_all(format!("{}\n", reply).as_bytes())
                .await
                .expect("write reply");
        }
        seen
    })
}

fn test_config(path: &Path) -> LinkConfig {
    LinkConfig::default()
        .with_socket_path(path)
        .with_connect_timeout_ms(1000)
}

#[tokio::test]
async fn test_get_dataref_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sim.sock");
    let listener = UnixListener::bind(&path).unwrap();

    let stub = spawn_stub(listener, 1, |request| {
        assert_eq!(request, "get:sim/cockpit/radios/nav1_freq_hz");
        "sim/cockpit/radios/nav1_freq_hz;1;11010".to_string()
    });

    let mut link = Link::new(test_config(&path));
    let dataref = link
        .get_dataref("sim/cockpit/radios/nav1_freq_hz")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(dataref.value(), &DataRefValue::Int(11010));

    let seen = stub.await.unwrap();
    assert_eq!(seen.len(), 1);
}

#[tokio::test]
async fn test_get_unknown_dataref_returns_none() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sim.sock");
    let listener = UnixListener::bind(&path).unwrap();

    let _stub = spawn_stub(listener, 1, |_| "{invalid_dataref}".to_string());

    let mut link = Link::new(test_config(&path));
    assert!(link.get_dataref("sim/bogus").await.unwrap().is_none());
}

#[tokio::test]
async fn test_set_and_command_batch_over_socket() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sim.sock");
    let listener = UnixListener::bind(&path).unwrap();

    let stub = spawn_stub(listener, 2, |request| {
        if request.starts_with("set:") {
            assert_eq!(request, "set:sim/autopilot/heading;2;270");
            "{ok}".to_string()
        } else {
            assert_eq!(request, "cmd:sim/lights/landing:once;cmd:sim/bogus:once");
            "{ok};{invalid_command}".to_string()
        }
    });

    let mut link = Link::new(test_config(&path));

    let dataref = DataRef::new("sim/autopilot/heading", DataRefValue::Float(270.0));
    assert!(link.set_dataref(&dataref).await.unwrap());

    let ok = link
        .once_command("sim/lights/landing;sim/bogus")
        .await
        .unwrap();
    assert!(!ok, "one rejected position fails the batch");

    stub.await.unwrap();
}

#[tokio::test]
async fn test_connect_failure_is_explicit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nobody-listening.sock");

    let mut link = Link::new(test_config(&path));
    let err = link.get_dataref("sim/anything").await.unwrap_err();
    assert!(matches!(
        err,
        LinkError::Transport(TransportError::Io(_) | TransportError::ConnectTimeout { .. })
    ));
}

#[tokio::test]
async fn test_set_reconnects_after_endpoint_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sim.sock");

    // first endpoint instance answers one get, then goes away
    let listener = UnixListener::bind(&path).unwrap();
    let stub = spawn_stub(listener, 1, |_| "sim/a;1;1".to_string());

    let mut link = Link::new(test_config(&path));
    assert!(link.get_dataref("sim/a").await.unwrap().is_some());
    stub.await.unwrap();

    // endpoint comes back on the same path
    std::fs::remove_file(&path).unwrap();
    let listener = UnixListener::bind(&path).unwrap();
    let stub = spawn_stub(listener, 1, |request| {
        assert_eq!(request, "set:sim/a;1;2");
        "{ok}".to_string()
    });

    // the stale connection breaks on use; the dispatcher reconnects and
    // retries within its attempt bound
    let dataref = DataRef::new("sim/a", DataRefValue::Int(2));
    assert!(link.set_dataref(&dataref).await.unwrap());
    stub.await.unwrap();
}

#[tokio::test]
async fn test_transport_state_machine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sim.sock");
    let listener = UnixListener::bind(&path).unwrap();
    let _stub = spawn_stub(listener, 0, |_| String::new());

    let mut transport =
        PipeTransport::new(&path, std::time::Duration::from_millis(1000));
    assert_eq!(transport.state(), ConnectionState::Disconnected);

    transport.connect().await.unwrap();
    assert_eq!(transport.state(), ConnectionState::Connected);

    use xplane_link::Transport as _;
    transport.disconnect().await;
    assert_eq!(transport.state(), ConnectionState::Disconnected);
}
