//! Text and transition animations.
//!
//! Every animation is a sequence of draw, [`Surface::flush`] and pause
//! steps. Pauses are scaled by a [`Pace`] so tests can run them
//! instantly. A failed flush ends the animation and is returned.

use std::time::Duration;

use embedded_graphics::mono_font::ascii::{FONT_5X7, FONT_7X14_BOLD};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, PrimitiveStyle};
use embedded_graphics::text::{Baseline, Text};
use serde::{Deserialize, Serialize};
use tracing::debug;

use flipdot_core::SendError;

use crate::surface::Surface;

// ── Pace ─────────────────────────────────────────────────────────

/// Multiplier applied to every pause. `1.0` is real time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pace(pub f64);

impl Pace {
    pub const REAL_TIME: Pace = Pace(1.0);
    pub const INSTANT: Pace = Pace(0.0);

    /// Sleep for `millis` scaled by the pace. A zero-length pause still
    /// yields to the runtime.
    pub async fn pause(self, millis: u64) {
        let scaled = (millis as f64 * self.0.max(0.0)) as u64;
        if scaled > 0 {
            tokio::time::sleep(Duration::from_millis(scaled)).await;
        } else {
            tokio::task::yield_now().await;
        }
    }
}

impl Default for Pace {
    fn default() -> Self {
        Pace::REAL_TIME
    }
}

// ── Fonts ────────────────────────────────────────────────────────

/// Text size. `Small` fits one 7-row panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Font {
    #[default]
    Small,
    Big,
}

impl Font {
    fn mono(self) -> &'static MonoFont<'static> {
        match self {
            Font::Small => &FONT_5X7,
            Font::Big => &FONT_7X14_BOLD,
        }
    }

    fn style(self) -> MonoTextStyle<'static, Rgb888> {
        MonoTextStyle::new(self.mono(), Rgb888::WHITE)
    }

    /// Rendered width of `text` in dots.
    pub fn text_width(self, text: &str) -> u32 {
        Text::with_baseline(text, Point::zero(), self.style(), Baseline::Top)
            .bounding_box()
            .size
            .width
    }
}

fn draw_text<S: Surface + ?Sized>(surface: &mut S, text: &str, origin: Point, font: Font) {
    // Drawing into a canvas is infallible.
    let _ = Text::with_baseline(text, origin, font.style(), Baseline::Top).draw(surface.canvas_mut());
}

/// Which way a wipe travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Left to right, or top to bottom.
    #[default]
    Forward,
    /// Right to left, or bottom to top.
    Backward,
}

// ── Text ─────────────────────────────────────────────────────────

/// Show `text` at the top-left corner, scrolling it instead when it is
/// wider than the surface.
pub async fn display_text<S: Surface + ?Sized>(
    surface: &mut S,
    text: &str,
    font: Font,
    pace: Pace,
) -> Result<(), SendError> {
    if font.text_width(text) > surface.width() {
        return scroll_text(surface, text, font, pace).await;
    }
    surface.clear(false);
    draw_text(surface, text, Point::zero(), font);
    surface.flush(true).await
}

/// Slide `text` from the left edge until it has left the surface, one
/// column per frame.
pub async fn scroll_text<S: Surface + ?Sized>(
    surface: &mut S,
    text: &str,
    font: Font,
    pace: Pace,
) -> Result<(), SendError> {
    let width = font.text_width(text) as i32;
    for x in (-width..=0).rev() {
        surface.clear(false);
        draw_text(surface, text, Point::new(x, 0), font);
        surface.flush(true).await?;
        pace.pause(60).await;
    }
    Ok(())
}

/// Flash `text` on and off `times` times.
pub async fn blink_text<S: Surface + ?Sized>(
    surface: &mut S,
    text: &str,
    times: usize,
    pace: Pace,
) -> Result<(), SendError> {
    for _ in 0..times {
        display_text(surface, text, Font::Small, pace).await?;
        pace.pause(500).await;
        surface.clear(false);
        surface.flush(true).await?;
        pace.pause(500).await;
    }
    Ok(())
}

// ── Transitions ──────────────────────────────────────────────────

/// Start from the opposite colour and paint `white` (or black) across
/// the surface one column at a time.
pub async fn wipe_horizontal<S: Surface + ?Sized>(
    surface: &mut S,
    direction: Direction,
    white: bool,
    pace: Pace,
) -> Result<(), SendError> {
    let (w, h) = (surface.width(), surface.height());
    surface.clear(!white);
    surface.flush(true).await?;
    pace.pause(500).await;

    let color = if white { Rgb888::WHITE } else { Rgb888::BLACK };
    for x in 1..=w {
        let start = match direction {
            Direction::Forward => 0,
            Direction::Backward => w - x,
        };
        surface.canvas_mut().fill_rect(start, 0, x, h, color);
        surface.flush(true).await?;
        pace.pause(70).await;
    }
    Ok(())
}

/// Like [`wipe_horizontal`], one row at a time.
pub async fn wipe_vertical<S: Surface + ?Sized>(
    surface: &mut S,
    direction: Direction,
    white: bool,
    pace: Pace,
) -> Result<(), SendError> {
    let (w, h) = (surface.width(), surface.height());
    surface.clear(!white);
    surface.flush(true).await?;
    pace.pause(500).await;

    let color = if white { Rgb888::WHITE } else { Rgb888::BLACK };
    for y in 1..=h {
        let start = match direction {
            Direction::Forward => 0,
            Direction::Backward => h - y,
        };
        surface.canvas_mut().fill_rect(0, start, w, y, color);
        surface.flush(true).await?;
        pace.pause(100).await;
    }
    Ok(())
}

/// A black band over white that opens to the centre and closes again.
pub async fn curtain<S: Surface + ?Sized>(surface: &mut S, pace: Pace) -> Result<(), SendError> {
    let (w, h) = (surface.width(), surface.height());
    for x in 1..=w {
        let (lo, hi) = (x.min(w - x), x.max(w - x));
        surface.clear(true);
        surface
            .canvas_mut()
            .fill_rect(lo, 0, hi - lo + 1, h, Rgb888::BLACK);
        surface.flush(true).await?;
        pace.pause(100).await;
    }
    Ok(())
}

/// A filled circle growing from the centre until it covers the surface.
pub async fn dot<S: Surface + ?Sized>(surface: &mut S, pace: Pace) -> Result<(), SendError> {
    let (w, h) = (surface.width(), surface.height());
    let center = Point::new((w / 2) as i32, (h / 2) as i32);
    for r in 0..w {
        surface.clear(false);
        let _ = Circle::with_center(center, 2 * r + 1)
            .into_styled(PrimitiveStyle::with_fill(Rgb888::WHITE))
            .draw(surface.canvas_mut());
        surface.flush(true).await?;
        pace.pause(600 / (r as u64 + 1)).await;
    }
    Ok(())
}

// ── AnimationState ───────────────────────────────────────────────

/// Transitions played between demo steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Dot,
    Curtain,
    WipeHorizontal,
    WipeVertical,
}

impl Transition {
    pub const ALL: [Transition; 4] = [
        Transition::Dot,
        Transition::Curtain,
        Transition::WipeHorizontal,
        Transition::WipeVertical,
    ];

    pub async fn play<S: Surface + ?Sized>(self, surface: &mut S, pace: Pace) -> Result<(), SendError> {
        match self {
            Transition::Dot => dot(surface, pace).await,
            Transition::Curtain => curtain(surface, pace).await,
            Transition::WipeHorizontal => {
                wipe_horizontal(surface, Direction::Forward, false, pace).await
            }
            Transition::WipeVertical => wipe_vertical(surface, Direction::Forward, true, pace).await,
        }
    }
}

/// Round-robin over the transitions, plus the pace of every animation.
#[derive(Debug, Clone)]
pub struct AnimationState {
    order: Vec<Transition>,
    next: usize,
    pace: Pace,
}

impl AnimationState {
    pub fn new(pace: Pace) -> Self {
        Self::with_order(Transition::ALL.to_vec(), pace)
    }

    /// Play `order` in turn. An empty order plays nothing.
    pub fn with_order(order: Vec<Transition>, pace: Pace) -> Self {
        Self {
            order,
            next: 0,
            pace,
        }
    }

    pub fn pace(&self) -> Pace {
        self.pace
    }

    /// The transition the next call to [`transition`](Self::transition)
    /// plays.
    pub fn peek(&self) -> Option<Transition> {
        self.order.get(self.next).copied()
    }

    /// Play the next transition and advance.
    pub async fn transition<S: Surface + ?Sized>(&mut self, surface: &mut S) -> Result<(), SendError> {
        let Some(t) = self.peek() else {
            return Ok(());
        };
        self.next = (self.next + 1) % self.order.len();
        debug!("transition {t:?}");
        t.play(surface, self.pace).await
    }

    /// One pass of the demo routine.
    pub async fn demo<S: Surface + ?Sized>(&mut self, surface: &mut S) -> Result<(), SendError> {
        let pace = self.pace;
        display_text(surface, "YO!", Font::Small, pace).await?;
        pace.pause(2000).await;
        self.transition(surface).await?;
        blink_text(surface, "HI!", 3, pace).await?;
        pace.pause(1000).await;
        self.transition(surface).await?;
        scroll_text(surface, "This is scrolled text.", Font::Small, pace).await?;
        pace.pause(500).await;
        self.transition(surface).await?;
        surface.clear(false);
        surface.flush(true).await
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flipdot_core::{Canvas, TransportError};

    /// Records every flushed frame instead of sending it.
    struct Recorder {
        canvas: Canvas,
        frames: Vec<Canvas>,
    }

    impl Recorder {
        fn new(width: u32, height: u32) -> Self {
            Self {
                canvas: Canvas::new(width, height),
                frames: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl Surface for Recorder {
        fn canvas(&self) -> &Canvas {
            &self.canvas
        }

        fn canvas_mut(&mut self) -> &mut Canvas {
            &mut self.canvas
        }

        fn clear(&mut self, white: bool) {
            self.canvas
                .fill(if white { Rgb888::WHITE } else { Rgb888::BLACK });
        }

        async fn flush(&mut self, _refresh: bool) -> Result<(), SendError> {
            self.frames.push(self.canvas.clone());
            Ok(())
        }

        async fn disconnect(&mut self) -> Result<(), TransportError> {
            Ok(())
        }

        fn describe(&self) -> String {
            "recorder".into()
        }
    }

    #[test]
    fn small_font_width() {
        let f = &FONT_5X7;
        assert_eq!(
            Font::Small.text_width("HI!"),
            3 * f.character_size.width + 2 * f.character_spacing
        );
        assert!(Font::Big.text_width("HI!") > Font::Small.text_width("HI!"));
    }

    #[tokio::test]
    async fn short_text_is_one_frame() {
        let mut r = Recorder::new(28, 7);
        display_text(&mut r, "HI", Font::Small, Pace::INSTANT)
            .await
            .unwrap();
        assert_eq!(r.frames.len(), 1);
        assert!(r.frames[0].count_on() > 0);
    }

    #[tokio::test]
    async fn long_text_scrolls_off() {
        let mut r = Recorder::new(28, 7);
        let text = "This is scrolled text.";
        let width = Font::Small.text_width(text);
        assert!(width > 28);

        display_text(&mut r, text, Font::Small, Pace::INSTANT)
            .await
            .unwrap();
        assert_eq!(r.frames.len(), width as usize + 1);
        assert!(r.frames[0].count_on() > 0);
        assert_eq!(r.frames.last().unwrap().count_on(), 0);
    }

    #[test]
    fn blank_text_still_flushes() {
        let mut r = Recorder::new(28, 7);
        tokio_test::block_on(display_text(&mut r, "", Font::Big, Pace::INSTANT)).unwrap();
        assert_eq!(r.frames.len(), 1);
        assert_eq!(r.frames[0].count_on(), 0);
    }

    #[tokio::test]
    async fn blink_alternates() {
        let mut r = Recorder::new(28, 7);
        blink_text(&mut r, "HI", 2, Pace::INSTANT).await.unwrap();
        let lit: Vec<bool> = r.frames.iter().map(|f| f.count_on() > 0).collect();
        assert_eq!(lit, vec![true, false, true, false]);
    }

    #[tokio::test]
    async fn wipes_fill_progressively() {
        let mut r = Recorder::new(28, 7);
        wipe_horizontal(&mut r, Direction::Backward, true, Pace::INSTANT)
            .await
            .unwrap();
        // Start frame plus one per column.
        assert_eq!(r.frames.len(), 29);
        assert_eq!(r.frames[0].count_on(), 0);
        assert_eq!(r.frames[1].count_on(), 7);
        assert_eq!(r.frames[1].pixel(27, 0), Rgb888::WHITE);
        assert_eq!(r.frames[28].count_on(), 28 * 7);

        let mut r = Recorder::new(28, 7);
        wipe_vertical(&mut r, Direction::Forward, false, Pace::INSTANT)
            .await
            .unwrap();
        assert_eq!(r.frames[0].count_on(), 28 * 7);
        assert_eq!(r.frames[1].count_on(), 28 * 6);
        assert_eq!(r.frames.last().unwrap().count_on(), 0);
    }

    #[tokio::test]
    async fn curtain_closes_black() {
        let mut r = Recorder::new(28, 7);
        curtain(&mut r, Pace::INSTANT).await.unwrap();
        assert_eq!(r.frames.len(), 28);
        // Halfway the band is a single column.
        assert_eq!(r.frames[13].count_on(), 27 * 7);
        assert_eq!(r.frames.last().unwrap().count_on(), 0);
    }

    #[tokio::test]
    async fn dot_grows() {
        let mut r = Recorder::new(28, 7);
        dot(&mut r, Pace::INSTANT).await.unwrap();
        assert_eq!(r.frames.len(), 28);
        assert!(r.frames[0].count_on() < r.frames[5].count_on());
        assert_eq!(r.frames.last().unwrap().count_on(), 28 * 7);
    }

    #[tokio::test]
    async fn transitions_round_robin() {
        let mut r = Recorder::new(28, 7);
        let mut state =
            AnimationState::with_order(vec![Transition::Curtain, Transition::Dot], Pace::INSTANT);
        assert_eq!(state.peek(), Some(Transition::Curtain));
        state.transition(&mut r).await.unwrap();
        assert_eq!(state.peek(), Some(Transition::Dot));
        state.transition(&mut r).await.unwrap();
        assert_eq!(state.peek(), Some(Transition::Curtain));

        let mut idle = AnimationState::with_order(Vec::new(), Pace::INSTANT);
        idle.transition(&mut r).await.unwrap();
    }

    #[tokio::test]
    async fn demo_ends_blank() {
        let mut r = Recorder::new(28, 14);
        let mut state = AnimationState::new(Pace::INSTANT);
        state.demo(&mut r).await.unwrap();
        assert!(r.frames.len() > 10);
        assert_eq!(r.frames.last().unwrap().count_on(), 0);
    }
}
