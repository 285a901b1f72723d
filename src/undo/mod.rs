//! A fixed-size undo log. When it fills up the oldest action silently falls
//! off the back.
use crate::pen::{CssColor, PenAttributes};
use crate::screen::ItemId;
use crate::turtle::StampId;
use crate::vec2d::Vec2D;

/// Pen state that mattered for a move.
#[derive(Debug, Clone, PartialEq)]
pub struct GoModes {
    pub drawing: bool,
    pub color: CssColor,
    pub width: f64,
    pub filling: bool,
}

/// The polyline being drawn when a move started.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSnapshot {
    pub item: ItemId,
    pub points: Vec<Vec2D>,
    /// What the renderer was showing for `item`.
    pub geometry: Vec<Vec2D>,
    pub items: Vec<ItemId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UndoRecord {
    Go {
        from: Vec2D,
        to: Vec2D,
        modes: GoModes,
        line: LineSnapshot,
    },
    /// A jump that drew nothing and touched no fill or polygon path.
    Teleport {
        from: Vec2D,
        line: LineSnapshot,
    },
    Rotate {
        angle: f64,
        degrees_per_unit: f64,
    },
    Stamp(StampId),
    Pen(PenAttributes),
    BeginFill(ItemId),
    DoFill(ItemId),
    Dot(ItemId),
    Sequence(Vec<UndoRecord>),
    /// Left behind where a record stopped meaning anything.
    Noop,
}

impl UndoRecord {
    fn purge<F: Fn(&UndoRecord) -> bool>(&mut self, matches: &F) {
        if matches(self) {
            *self = UndoRecord::Noop;
        } else if let UndoRecord::Sequence(records) = self {
            for record in records.iter_mut() {
                record.purge(matches);
            }
        }
    }
}

/// # UndoRingBuffer
///
/// Ring of `capacity` slots. `write_index` always points at the newest
/// record. While cumulating, pushes are folded into the [`UndoRecord::Sequence`]
/// sitting at `write_index` so they pop as one.
///
/// A zero capacity turns undo off: pushes are dropped and pops find nothing.
///
/// ```rust
/// use aoer_turtle_rs::undo::{UndoRecord, UndoRingBuffer};
///
/// let mut buf = UndoRingBuffer::new(2);
/// buf.push(UndoRecord::Noop);
/// buf.push(UndoRecord::Rotate { angle: 90.0, degrees_per_unit: 1.0 });
/// buf.push(UndoRecord::Rotate { angle: 45.0, degrees_per_unit: 1.0 });
/// assert_eq!(buf.count(), 2);
/// assert_eq!(
///     buf.pop(),
///     Some(UndoRecord::Rotate { angle: 45.0, degrees_per_unit: 1.0 })
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct UndoRingBuffer {
    slots: Vec<Option<UndoRecord>>,
    write_index: usize,
    cumulate_depth: usize,
}

pub const DEFAULT_UNDO_CAPACITY: usize = 1000;

impl Default for UndoRingBuffer {
    fn default() -> Self {
        UndoRingBuffer::new(DEFAULT_UNDO_CAPACITY)
    }
}

impl UndoRingBuffer {
    pub fn new(capacity: usize) -> UndoRingBuffer {
        UndoRingBuffer {
            slots: vec![None; capacity],
            write_index: capacity.saturating_sub(1),
            cumulate_depth: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn write_index(&self) -> usize {
        self.write_index
    }

    pub fn is_cumulating(&self) -> bool {
        self.cumulate_depth > 0
    }

    pub fn push(&mut self, record: UndoRecord) {
        let capacity = self.capacity();
        if capacity == 0 {
            return;
        }
        if self.is_cumulating() {
            if let Some(UndoRecord::Sequence(records)) = &mut self.slots[self.write_index] {
                records.push(record);
                return;
            }
        }
        self.write_index = (self.write_index + 1) % capacity;
        self.slots[self.write_index] = Some(record);
    }

    /// Start grouping. Nested calls just join the outer group.
    pub fn begin_cumulate(&mut self) {
        if !self.is_cumulating() {
            self.push(UndoRecord::Sequence(vec![]));
        }
        self.cumulate_depth += 1;
    }

    pub fn end_cumulate(&mut self) {
        self.cumulate_depth = self.cumulate_depth.saturating_sub(1);
    }

    /// Take the newest record. `None` means there's nothing to undo.
    pub fn pop(&mut self) -> Option<UndoRecord> {
        let capacity = self.capacity();
        if capacity == 0 {
            return None;
        }
        let record = self.slots[self.write_index].take()?;
        self.write_index = (self.write_index + capacity - 1) % capacity;
        Some(record)
    }

    /// Non-empty slots.
    pub fn count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Drop all history. With a size, reallocate at that capacity too.
    pub fn reset(&mut self, capacity: Option<usize>) {
        *self = UndoRingBuffer::new(capacity.unwrap_or(self.capacity()));
    }

    /// Turn every record `matches` accepts into [`UndoRecord::Noop`],
    /// including ones nested in sequences.
    pub fn purge<F: Fn(&UndoRecord) -> bool>(&mut self, matches: F) {
        for record in self.slots.iter_mut().flatten() {
            record.purge(&matches);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn rot(angle: f64) -> UndoRecord {
        UndoRecord::Rotate {
            angle,
            degrees_per_unit: 1.0,
        }
    }

    #[test]
    fn test_empty_pop() {
        let mut buf = UndoRingBuffer::new(4);
        assert_eq!(buf.pop(), None);
        assert_eq!(buf.write_index(), 3);
        assert_eq!(buf.count(), 0);
    }

    #[test]
    fn test_ring_overwrite() {
        let mut buf = UndoRingBuffer::new(5);
        for i in 0..6 {
            buf.push(rot(i as f64));
            assert!(buf.write_index() < buf.capacity());
        }
        assert_eq!(buf.count(), 5);
        for i in (1..6).rev() {
            assert_eq!(buf.pop(), Some(rot(i as f64)));
        }
        // record 0 fell off the back
        assert_eq!(buf.pop(), None);
    }

    #[test]
    fn test_cumulate_pops_as_one() {
        let mut buf = UndoRingBuffer::new(10);
        buf.push(rot(1.0));
        buf.begin_cumulate();
        buf.push(rot(2.0));
        buf.push(rot(3.0));
        buf.push(rot(4.0));
        buf.end_cumulate();
        assert!(!buf.is_cumulating());
        assert_eq!(buf.count(), 2);
        assert_eq!(
            buf.pop(),
            Some(UndoRecord::Sequence(vec![rot(2.0), rot(3.0), rot(4.0)]))
        );
        assert_eq!(buf.pop(), Some(rot(1.0)));
        assert_eq!(buf.pop(), None);
    }

    #[test]
    fn test_nested_cumulate_joins_outer() {
        let mut buf = UndoRingBuffer::new(10);
        buf.begin_cumulate();
        buf.push(rot(1.0));
        buf.begin_cumulate();
        buf.push(rot(2.0));
        buf.end_cumulate();
        buf.push(rot(3.0));
        buf.end_cumulate();
        assert_eq!(buf.count(), 1);
        assert_eq!(
            buf.pop(),
            Some(UndoRecord::Sequence(vec![rot(1.0), rot(2.0), rot(3.0)]))
        );
    }

    #[test]
    fn test_zero_capacity_disables() {
        let mut buf = UndoRingBuffer::new(0);
        buf.push(rot(1.0));
        buf.begin_cumulate();
        buf.push(rot(2.0));
        assert_eq!(buf.count(), 0);
        assert_eq!(buf.pop(), None);
    }

    #[test]
    fn test_reset() {
        let mut buf = UndoRingBuffer::new(3);
        buf.push(rot(1.0));
        buf.reset(None);
        assert_eq!(buf.count(), 0);
        assert_eq!(buf.capacity(), 3);
        buf.reset(Some(7));
        assert_eq!(buf.capacity(), 7);
        assert_eq!(buf.write_index(), 6);
    }

    #[test]
    fn test_purge() {
        let mut buf = UndoRingBuffer::new(4);
        buf.push(UndoRecord::Stamp(StampId(1)));
        buf.begin_cumulate();
        buf.push(UndoRecord::Stamp(StampId(2)));
        buf.push(rot(5.0));
        buf.end_cumulate();
        buf.purge(|r| matches!(r, UndoRecord::Stamp(_)));
        assert_eq!(buf.count(), 2);
        assert_eq!(
            buf.pop(),
            Some(UndoRecord::Sequence(vec![UndoRecord::Noop, rot(5.0)]))
        );
        assert_eq!(buf.pop(), Some(UndoRecord::Noop));
    }
}
