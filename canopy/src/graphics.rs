//! In-memory highlight overlay.

use crate::focus::{Graphic, GraphicsOverlay, HighlightSymbol};

/// Graphics overlay keeping the drawn graphics in memory, in drawing order.
#[derive(Debug, Clone, Default)]
pub struct GraphicsLayer {
    graphics: Vec<Graphic>,
}

impl GraphicsLayer {
    /// Creates an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drawn graphics, bottom first.
    pub fn graphics(&self) -> &[Graphic] {
        &self.graphics
    }

    /// Drawn graphics with the given symbol.
    pub fn with_symbol(&self, symbol: HighlightSymbol) -> impl Iterator<Item = &Graphic> + '_ {
        self.graphics.iter().filter(move |g| g.symbol == symbol)
    }

    /// Returns true if nothing is drawn.
    pub fn is_empty(&self) -> bool {
        self.graphics.is_empty()
    }
}

impl GraphicsOverlay for GraphicsLayer {
    fn clear(&mut self) {
        self.graphics.clear();
    }

    fn add(&mut self, graphic: Graphic) {
        self.graphics.push(graphic);
    }
}
