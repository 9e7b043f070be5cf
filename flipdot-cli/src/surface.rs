//! Anything an animation can draw on and push out.

use async_trait::async_trait;

use flipdot_core::{Canvas, Display, MultiDisplay, SendError, TransportError};

/// A drawable canvas with a link behind it.
///
/// Implemented by [`Display`] and [`MultiDisplay`] so animations work
/// the same on one display or several.
#[async_trait]
pub trait Surface: Send {
    fn canvas(&self) -> &Canvas;

    fn canvas_mut(&mut self) -> &mut Canvas;

    /// Paint the whole canvas black or white.
    fn clear(&mut self, white: bool);

    /// Transmit the canvas.
    async fn flush(&mut self, refresh: bool) -> Result<(), SendError>;

    /// Close every link.
    async fn disconnect(&mut self) -> Result<(), TransportError>;

    /// Human-readable layout, one line per panel or sub-display.
    fn describe(&self) -> String;

    fn width(&self) -> u32 {
        self.canvas().width()
    }

    fn height(&self) -> u32 {
        self.canvas().height()
    }
}

#[async_trait]
impl Surface for Display {
    fn canvas(&self) -> &Canvas {
        Display::canvas(self)
    }

    fn canvas_mut(&mut self) -> &mut Canvas {
        Display::canvas_mut(self)
    }

    fn clear(&mut self, white: bool) {
        // Resetting every panel cannot fail.
        let _ = self.reset(None, white);
    }

    async fn flush(&mut self, refresh: bool) -> Result<(), SendError> {
        self.send(refresh).await
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        Display::disconnect(self).await
    }

    fn describe(&self) -> String {
        self.panels().to_string()
    }
}

#[async_trait]
impl Surface for MultiDisplay {
    fn canvas(&self) -> &Canvas {
        MultiDisplay::canvas(self)
    }

    fn canvas_mut(&mut self) -> &mut Canvas {
        MultiDisplay::canvas_mut(self)
    }

    fn clear(&mut self, white: bool) {
        let _ = self.reset(None, white);
    }

    async fn flush(&mut self, refresh: bool) -> Result<(), SendError> {
        self.send(refresh).await
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        MultiDisplay::disconnect(self).await
    }

    fn describe(&self) -> String {
        let mut lines = Vec::new();
        for id in self.ids() {
            let (Ok((x, y, w, h)), Some(display)) = (self.region(id), self.display(id)) else {
                continue;
            };
            lines.push(format!("display {id}: region ({x}, {y}) {w}x{h}"));
            for line in display.panels().to_string().lines() {
                lines.push(format!("  {line}"));
            }
        }
        lines.join("\n")
    }
}
