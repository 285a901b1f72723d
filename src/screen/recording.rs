use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::pen::CssColor;
use crate::screen::{Clock, ItemId, ItemKind, Renderer};
use crate::shapes::ImageHandle;
use crate::vec2d::Vec2D;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Line {
        item: ItemId,
        points: Vec<Vec2D>,
        color: CssColor,
        width: f64,
    },
    Polygon {
        item: ItemId,
        points: Vec<Vec2D>,
        fill: Option<CssColor>,
        outline: Option<CssColor>,
        width: f64,
    },
    Image {
        item: ItemId,
        position: Vec2D,
        image: ImageHandle,
    },
    Delete(ItemId),
}

impl DrawCall {
    pub fn item(&self) -> ItemId {
        match self {
            DrawCall::Line { item, .. }
            | DrawCall::Polygon { item, .. }
            | DrawCall::Image { item, .. } => *item,
            DrawCall::Delete(item) => *item,
        }
    }
}

/// Everything a headless screen saw: draw calls in order, the live items
/// with their current geometry, and frame/delay counts.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    calls: Vec<DrawCall>,
    items: BTreeMap<ItemId, (ItemKind, Vec<Vec2D>)>,
    next_id: u64,
    frames: usize,
    delayed_ms: u64,
}

pub type SharedJournal = Rc<RefCell<Journal>>;

impl Journal {
    pub fn shared() -> SharedJournal {
        Rc::new(RefCell::new(Journal::default()))
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Forget recorded calls and counters. Live items stay.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
        self.frames = 0;
        self.delayed_ms = 0;
    }

    /// Calls that targeted `item`.
    pub fn calls_for(&self, item: ItemId) -> Vec<&DrawCall> {
        self.calls.iter().filter(|call| call.item() == item).collect()
    }

    pub fn polygon_calls(&self) -> Vec<&DrawCall> {
        self.calls
            .iter()
            .filter(|call| matches!(call, DrawCall::Polygon { .. }))
            .collect()
    }

    /// Polygon calls that actually filled something.
    pub fn fill_calls(&self) -> Vec<&DrawCall> {
        self.calls
            .iter()
            .filter(|call| matches!(call, DrawCall::Polygon { fill: Some(_), points, .. } if !points.is_empty()))
            .collect()
    }

    pub fn line_calls(&self) -> Vec<&DrawCall> {
        self.calls
            .iter()
            .filter(|call| matches!(call, DrawCall::Line { .. }))
            .collect()
    }

    pub fn is_live(&self, item: ItemId) -> bool {
        self.items.contains_key(&item)
    }

    pub fn kind(&self, item: ItemId) -> Option<ItemKind> {
        self.items.get(&item).map(|(kind, _)| *kind)
    }

    pub fn live_items(&self) -> Vec<ItemId> {
        self.items.keys().copied().collect()
    }

    /// Live items of one kind that currently show something.
    pub fn visible_items(&self, kind: ItemKind) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|(_, (k, geometry))| *k == kind && !geometry.is_empty())
            .map(|(item, _)| *item)
            .collect()
    }

    pub fn geometry(&self, item: ItemId) -> Vec<Vec2D> {
        self.items
            .get(&item)
            .map(|(_, geometry)| geometry.clone())
            .unwrap_or_default()
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn delayed_ms(&self) -> u64 {
        self.delayed_ms
    }

    fn create(&mut self, kind: ItemKind) -> ItemId {
        self.next_id += 1;
        let item = ItemId(self.next_id);
        self.items.insert(item, (kind, vec![]));
        item
    }

    fn set_geometry(&mut self, item: ItemId, points: &[Vec2D]) {
        if let Some((_, geometry)) = self.items.get_mut(&item) {
            *geometry = points.to_vec();
        }
    }
}

/// Renderer that keeps no pixels, only the [`Journal`].
pub struct RecordingRenderer {
    journal: SharedJournal,
}

impl RecordingRenderer {
    pub fn new(journal: &SharedJournal) -> RecordingRenderer {
        RecordingRenderer {
            journal: journal.clone(),
        }
    }
}

impl Renderer for RecordingRenderer {
    fn create_line_item(&mut self) -> ItemId {
        self.journal.borrow_mut().create(ItemKind::Line)
    }

    fn create_polygon_item(&mut self) -> ItemId {
        self.journal.borrow_mut().create(ItemKind::Polygon)
    }

    fn create_image_item(&mut self) -> ItemId {
        self.journal.borrow_mut().create(ItemKind::Image)
    }

    fn draw_line(&mut self, item: ItemId, points: &[Vec2D], color: &CssColor, width: f64) {
        let mut journal = self.journal.borrow_mut();
        journal.set_geometry(item, points);
        journal.calls.push(DrawCall::Line {
            item,
            points: points.to_vec(),
            color: color.clone(),
            width,
        });
    }

    fn draw_polygon(
        &mut self,
        item: ItemId,
        points: &[Vec2D],
        fill: Option<&CssColor>,
        outline: Option<&CssColor>,
        width: f64,
    ) {
        let mut journal = self.journal.borrow_mut();
        journal.set_geometry(item, points);
        journal.calls.push(DrawCall::Polygon {
            item,
            points: points.to_vec(),
            fill: fill.cloned(),
            outline: outline.cloned(),
            width,
        });
    }

    fn draw_image(&mut self, item: ItemId, position: Vec2D, image: &ImageHandle) {
        let mut journal = self.journal.borrow_mut();
        journal.set_geometry(item, &[position]);
        journal.calls.push(DrawCall::Image {
            item,
            position,
            image: image.clone(),
        });
    }

    fn delete_item(&mut self, item: ItemId) {
        let mut journal = self.journal.borrow_mut();
        journal.items.remove(&item);
        journal.calls.push(DrawCall::Delete(item));
    }

    fn read_item_geometry(&self, item: ItemId) -> Vec<Vec2D> {
        self.journal.borrow().geometry(item)
    }
}

/// Clock that never sleeps. Frames and delays are only counted.
pub struct RecordingClock {
    journal: SharedJournal,
    animate: bool,
}

impl RecordingClock {
    pub fn new(journal: &SharedJournal) -> RecordingClock {
        RecordingClock {
            journal: journal.clone(),
            animate: true,
        }
    }
}

impl Clock for RecordingClock {
    fn delay(&mut self, milliseconds: u64) {
        self.journal.borrow_mut().delayed_ms += milliseconds;
    }

    fn request_frame(&mut self) {
        self.journal.borrow_mut().frames += 1;
    }

    fn is_animation_enabled(&self) -> bool {
        self.animate
    }

    fn set_animation_enabled(&mut self, enabled: bool) {
        self.animate = enabled;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_items_and_geometry() {
        let journal = Journal::shared();
        let mut renderer = RecordingRenderer::new(&journal);
        let black = CssColor::from_rgba8(0, 0, 0, 255);
        let line = renderer.create_line_item();
        let poly = renderer.create_item(ItemKind::Polygon);
        renderer.draw_line(line, &[Vec2D::ZERO, Vec2D::new(1.0, 0.0)], &black, 1.0);
        renderer.draw_polygon(poly, &[Vec2D::ZERO], Some(&black), None, 1.0);
        assert_eq!(renderer.read_item_geometry(line).len(), 2);
        assert_eq!(journal.borrow().kind(poly), Some(ItemKind::Polygon));
        renderer.delete_item(line);
        assert!(!journal.borrow().is_live(line));
        assert!(renderer.read_item_geometry(line).is_empty());
        assert_eq!(journal.borrow().calls().len(), 3);
        assert_eq!(journal.borrow().fill_calls().len(), 1);
        assert_eq!(journal.borrow().line_calls().len(), 1);
        assert_eq!(journal.borrow().polygon_calls().len(), 1);
        renderer.draw_polygon(poly, &[], None, Some(&black), 1.0);
        assert_eq!(journal.borrow().polygon_calls().len(), 2);
        assert_eq!(journal.borrow().fill_calls().len(), 1);
    }
}
