//! Drawing capabilities. The core only describes what to draw; a front end
//! implements [`Surface`] to put it on screen.

use crate::item::Item;
use crate::spray::Spray;

/// Something items and sprays can be drawn on, in box pixel coordinates.
pub trait Surface {
    fn draw_item(&mut self, item: &Item);
    fn draw_spray(&mut self, spray: &Spray);
}

pub trait Renderable {
    fn render(&self, surface: &mut dyn Surface);
}

impl Renderable for Item {
    fn render(&self, surface: &mut dyn Surface) {
        surface.draw_item(self);
    }
}

impl Renderable for Spray {
    fn render(&self, surface: &mut dyn Surface) {
        surface.draw_spray(self);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::item::ItemKind;

    /// Surface that remembers what was drawn.
    #[derive(Debug, Default)]
    pub struct RecordingSurface {
        pub items: Vec<(ItemKind, u8, f64, f64)>,
        pub sprays: Vec<(f64, f64)>,
    }

    impl Surface for RecordingSurface {
        fn draw_item(&mut self, item: &Item) {
            self.items.push((item.kind(), item.damage(), item.x, item.y));
        }

        fn draw_spray(&mut self, spray: &Spray) {
            self.sprays.push((spray.x, spray.y));
        }
    }
}
