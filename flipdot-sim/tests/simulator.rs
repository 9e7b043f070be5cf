//! Integration tests: drivers talking to the simulator over localhost,
//! and the shared state under concurrent writers.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::ascii::FONT_5X7;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use flipdot_core::canvas::is_on;
use flipdot_core::{Display, TcpClient, UdpClient, binarize, encode};
use flipdot_sim::config::DisplayConfig;
use flipdot_sim::{SimulatorState, listener};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream, UdpSocket};

// ── Helpers ──────────────────────────────────────────────────────

fn running_state() -> Arc<SimulatorState> {
    let state = Arc::new(SimulatorState::from_config(&DisplayConfig::default()).unwrap());
    state.start();
    state
}

/// Start a TCP listener on an OS-assigned port.
async fn spawn_tcp(state: &Arc<SimulatorState>, read_timeout: Duration) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(listener::serve_tcp(listener, Arc::clone(state), read_timeout));
    port
}

async fn spawn_udp(state: &Arc<SimulatorState>) -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = socket.local_addr().unwrap().port();
    tokio::spawn(listener::serve_udp(socket, Arc::clone(state)));
    port
}

/// Poll until `count` payloads have been applied.
async fn wait_applied(state: &SimulatorState, count: u64) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while state.applied() < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timeout waiting for frames");
}

fn draw_text(display: &mut Display, text: &str) {
    let style = MonoTextStyle::new(&FONT_5X7, Rgb888::WHITE);
    Text::with_baseline(text, Point::new(1, 0), style, Baseline::Top)
        .draw(display.canvas_mut())
        .unwrap();
}

// ── Driver → simulator ───────────────────────────────────────────

#[tokio::test]
async fn test_tcp_driver_matches_simulator() {
    let state = running_state();
    let port = spawn_tcp(&state, Duration::from_secs(5)).await;

    let mut display = Display::tiled((28, 7), 28, 56).unwrap();
    draw_text(&mut display, "HI");
    display
        .connect(TcpClient::new("127.0.0.1", port).into())
        .await
        .unwrap();
    display.send(true).await.unwrap();

    wait_applied(&state, 8).await;
    let shown = state.snapshot();
    assert!(shown.count_on() > 0);
    assert_eq!(shown, binarize(display.canvas()));
    state.stop();
}

#[tokio::test]
async fn test_udp_driver_matches_simulator() {
    let state = running_state();
    let port = spawn_udp(&state).await;

    let mut display = Display::tiled((28, 7), 28, 56).unwrap();
    display.reset(Some(4), true).unwrap();
    display
        .connect(UdpClient::new("127.0.0.1", port).into())
        .await
        .unwrap();
    display.send(false).await.unwrap();

    wait_applied(&state, 8).await;
    let shown = state.snapshot();
    assert_eq!(shown.count_on(), 28 * 7);
    assert!(is_on(shown.pixel(0, 21)));
    assert!(is_on(shown.pixel(27, 27)));
    state.stop();
}

#[tokio::test]
async fn test_tcp_stream_survives_bad_frames() {
    let state = running_state();
    let port = spawn_tcp(&state, Duration::from_secs(5)).await;

    let mut bytes = vec![0x80, 0x90, 0x01, 0x8F];
    bytes.extend(encode(1, &[0x7F; 28], true).unwrap());
    bytes.extend([0x80, 0x84, 0x02, 0x00, 0x8F]);
    bytes.extend(encode(2, &[0x01; 28], true).unwrap());

    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    stream.write_all(&bytes).await.unwrap();
    stream.shutdown().await.unwrap();

    wait_applied(&state, 2).await;
    assert_eq!(state.snapshot().count_on(), 28 * 7 + 28);
    state.stop();
}

#[tokio::test]
async fn test_idle_tcp_connection_is_closed() {
    let state = running_state();
    let port = spawn_tcp(&state, Duration::from_millis(100)).await;

    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    // Say nothing; the simulator should hang up.
    let mut buf = [0u8; 1];
    let read = tokio::time::timeout(Duration::from_secs(5), async {
        use tokio::io::AsyncReadExt;
        stream.read(&mut buf).await
    })
    .await
    .expect("connection was not closed");
    assert_eq!(read.unwrap(), 0);
    state.stop();
}

#[tokio::test]
async fn test_slow_tcp_sender_is_not_cut_off() {
    let state = running_state();
    let port = spawn_tcp(&state, Duration::from_millis(300)).await;

    // The whole frame takes far longer than the read timeout, but no
    // single gap does.
    let bytes = encode(2, &[0x7F; 28], true).unwrap();
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    stream.set_nodelay(true).unwrap();
    for byte in &bytes {
        stream.write_all(&[*byte]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
    }
    wait_applied(&state, 1).await;

    // Same connection still accepts the next frame.
    stream.write_all(&encode(1, &[0x01; 28], true).unwrap()).await.unwrap();
    wait_applied(&state, 2).await;
    assert_eq!(state.snapshot().count_on(), 28 * 7 + 28);
    state.stop();
}

#[tokio::test]
async fn test_listeners_exit_on_stop() {
    let state = running_state();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let tcp = tokio::spawn(listener::serve_tcp(
        listener,
        Arc::clone(&state),
        Duration::from_secs(5),
    ));
    let udp = tokio::spawn(listener::serve_udp(socket, Arc::clone(&state)));

    state.stop();
    let (tcp, udp) = tokio::time::timeout(Duration::from_secs(5), async {
        (tcp.await.unwrap(), udp.await.unwrap())
    })
    .await
    .expect("listeners did not stop");
    tcp.unwrap();
    udp.unwrap();
}

// ── Shared state under load ──────────────────────────────────────

#[test]
fn test_concurrent_applies_never_tear() {
    let state = running_state();
    let writers: Vec<_> = (1..=8u8)
        .map(|address| {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for i in 0..500 {
                    let fill = if (i + address as usize) % 2 == 0 { 0x7F } else { 0x00 };
                    state.apply(address, &[fill; 28]);
                }
            })
        })
        .collect();

    let reader = {
        let state = Arc::clone(&state);
        thread::spawn(move || {
            for _ in 0..500 {
                let canvas = state.snapshot();
                // Every panel is written whole, so each 28x7 band is
                // either fully on or fully off.
                for band in 0..8 {
                    let on = canvas.crop(0, band * 7, 28, 7).count_on();
                    assert!(on == 0 || on == 28 * 7, "torn panel {}: {on}", band + 1);
                }
                state.tick();
            }
        })
    };

    for w in writers {
        w.join().unwrap();
    }
    reader.join().unwrap();
    assert_eq!(state.applied(), 8 * 500);
    assert_eq!(state.frames(), 500);
}
