//! Integration tests: the driver configuration pushed to UDP receivers on
//! localhost.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use flipdot_cli::animation::{AnimationState, Font, Pace, Transition};
use flipdot_cli::app::{self, Mode};
use flipdot_cli::config::{DriverConfig, MuxEntry};
use flipdot_cli::surface::Surface;
use flipdot_core::{ChannelKind, Endpoint, Frame, validate};
use tokio::net::UdpSocket;

// ── Helpers ──────────────────────────────────────────────────────

async fn receiver() -> (UdpSocket, u16) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = socket.local_addr().unwrap().port();
    (socket, port)
}

fn udp(port: u16) -> Endpoint {
    Endpoint {
        protocol: ChannelKind::Udp,
        host: "127.0.0.1".into(),
        port,
        ..Endpoint::default()
    }
}

/// Read every frame that arrives before the line goes quiet.
async fn drain(socket: &UdpSocket) -> Vec<Frame> {
    let mut frames = Vec::new();
    let mut buf = [0u8; 256];
    while let Ok(Ok((len, _))) =
        tokio::time::timeout(Duration::from_millis(200), socket.recv_from(&mut buf)).await
    {
        frames.push(validate(&buf[..len]).unwrap());
    }
    frames
}

// ── Single display ───────────────────────────────────────────────

#[tokio::test]
async fn test_text_reaches_every_panel() {
    let (socket, port) = receiver().await;
    let mut config = DriverConfig::default();
    config.transport = udp(port);

    let mut surface = app::connect(&config).await.unwrap();
    let mode = Mode::Text {
        text: "HI".into(),
        font: Font::Small,
    };
    let mut state = AnimationState::new(Pace::INSTANT);
    app::play(surface.as_mut(), &mode, &mut state).await.unwrap();

    let frames = drain(&socket).await;
    // 28x14 is two panels.
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].address(), 1);
    assert_eq!(frames[1].address(), 2);
    assert!(frames[0].payload().iter().any(|&b| b != 0));
    assert!(frames.iter().all(|f| f.refresh()));

    app::shutdown(surface.as_mut()).await.unwrap();
    let blank = drain(&socket).await;
    assert_eq!(blank.len(), 2);
    assert!(blank.iter().all(|f| f.payload().iter().all(|&b| b == 0)));
}

#[tokio::test]
async fn test_run_stops_between_rounds() {
    let (socket, port) = receiver().await;
    let mut config = DriverConfig::default();
    config.transport = udp(port);
    let mut surface = app::connect(&config).await.unwrap();

    let mode = Mode::Blink {
        text: "HI".into(),
        times: 1,
    };
    let mut state = AnimationState::with_order(vec![Transition::Dot], Pace::INSTANT);
    let running = Arc::new(AtomicBool::new(true));

    let stopper = {
        let running = Arc::clone(&running);
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            running.store(false, Ordering::SeqCst);
        }
    };
    tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(
            app::run(surface.as_mut(), &mode, &mut state, &running),
            stopper
        )
    })
    .await
    .expect("run did not stop");

    let frames = drain(&socket).await;
    // The all-white start frame goes out first.
    assert!(frames.len() >= 2);
    assert!(frames[0].payload().iter().all(|&b| b == 0x7F));
}

// ── Mux ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_portrait_mux_from_config() {
    let (rx1, port1) = receiver().await;
    let (rx2, port2) = receiver().await;

    let mut config = DriverConfig::default();
    config.display.portrait = true;
    config.mux = vec![
        MuxEntry {
            id: 1,
            x: 0,
            y: 0,
            width: 28,
            height: 7,
            transport: udp(port1),
        },
        MuxEntry {
            id: 2,
            x: 0,
            y: 7,
            width: 28,
            height: 7,
            transport: udp(port2),
        },
    ];

    let mut surface = app::connect(&config).await.unwrap();
    assert_eq!((surface.width(), surface.height()), (14, 28));
    assert!(surface.describe().contains("display 2"));

    // Light the right half of the logical canvas: all of display 2.
    surface.clear(false);
    surface.canvas_mut().fill_rect(7, 0, 7, 28, Rgb888::WHITE);
    surface.flush(true).await.unwrap();

    let first = drain(&rx1).await;
    let second = drain(&rx2).await;
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert!(first[0].payload().iter().all(|&b| b == 0));
    assert!(second[0].payload().iter().all(|&b| b == 0x7F));

    app::shutdown(surface.as_mut()).await.unwrap();
}
