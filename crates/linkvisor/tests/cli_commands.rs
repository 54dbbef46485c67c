#![cfg(all(unix, feature = "cli"))]

mod common;

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel;

use common::{fast_config, wait_for};
use linkvisor::engine::{payload_fn, LinkHandler, ManualReset};
use linkvisor::frame::read_payload;
use linkvisor::transport::{LinkStream, UnixDomainSocket};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "linkvisor-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn wait_for_connect(path: &Path, timeout: Duration) -> io::Result<LinkStream> {
    let start = Instant::now();
    loop {
        match UnixDomainSocket::connect(path) {
            Ok(stream) => return Ok(stream),
            Err(err) => {
                if start.elapsed() >= timeout {
                    return Err(io::Error::other(format!("connect timeout: {err}")));
                }
                thread::sleep(Duration::from_millis(25));
            }
        }
    }
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Option<ExitStatus> {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if let Some(status) = child.try_wait().expect("child status should be readable") {
            return Some(status);
        }
        thread::sleep(Duration::from_millis(25));
    }
    None
}

#[test]
fn serve_echoes_payloads_and_exits_when_link_is_lost() {
    let dir = unique_temp_dir("serve-echo");
    let sock_path = dir.join("link.sock");

    let mut child = Command::new(env!("CARGO_BIN_EXE_linkvisor"))
        .args(["--log-level", "error", "--format", "json", "serve"])
        .arg(&sock_path)
        .args(["--echo", "--heartbeat", "50ms", "--deadline", "200ms"])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("serve command should start");

    let stream = wait_for_connect(&sock_path, Duration::from_secs(3))
        .expect("client should connect to serve");
    let (echo_tx, echoes) = channel::unbounded();
    let client = LinkHandler::init(
        stream.into_channels().expect("stream should split"),
        fast_config(),
        payload_fn(move |_link: &LinkHandler, inbound: &mut dyn Read, size: u32| {
            let payload = read_payload(inbound, size)?;
            let _ = echo_tx.send(payload.to_vec());
            Ok(())
        }),
        ManualReset,
    )
    .expect("client handler should init");
    client.start().expect("client handler should start");

    wait_for("heartbeats with serve", || client.stats().pongs_received >= 2);
    client.write(b"hello").expect("payload should send");
    let echoed = echoes
        .recv_timeout(Duration::from_secs(3))
        .expect("serve should echo the payload");
    assert_eq!(echoed, b"hello");

    client.stop().expect("client should stop");
    drop(client);

    let status = wait_with_timeout(&mut child, Duration::from_secs(5));
    let Some(status) = status else {
        let _ = child.kill();
        panic!("serve did not exit after link loss");
    };
    assert_eq!(status.code(), Some(30));

    let mut stdout = String::new();
    child
        .stdout
        .take()
        .expect("stdout should be piped")
        .read_to_string(&mut stdout)
        .expect("stdout should be readable");
    let first: serde_json::Value = serde_json::from_str(
        stdout
            .lines()
            .next()
            .expect("a payload line should be printed"),
    )
    .expect("output should be json");
    assert_eq!(first["event"], "payload");
    assert_eq!(first["payload"], "hello");
    assert!(stdout.contains("\"event\":\"summary\""));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn connect_to_missing_socket_fails() {
    let dir = unique_temp_dir("connect-missing");
    let output = Command::new(env!("CARGO_BIN_EXE_linkvisor"))
        .arg("connect")
        .arg(dir.join("absent.sock"))
        .output()
        .expect("connect command should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("connect failed"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_heartbeat_is_a_usage_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_linkvisor"))
        .args(["connect", "/tmp/unused.sock", "--heartbeat", "0s"])
        .output()
        .expect("connect command should run");
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_reports_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_linkvisor"))
        .arg("version")
        .output()
        .expect("version command should run");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("linkvisor {}", env!("CARGO_PKG_VERSION"))
    );
}
