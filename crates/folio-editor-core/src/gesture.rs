//! Pointer drag recognition for block reordering.
//!
//! The recognizer turns a stream of pointer samples into a single
//! [`DragOutcome`]. It never touches the document. The session applies a
//! successful drag by block id, re-resolving both ends against the current
//! document.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Rect::new(x, y, right - x, bottom - y)
    }
}

/// A block's current on-screen bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct DropTarget<K> {
    pub key: K,
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The pointer never travelled the activation distance.
    NeverActivated,
    /// Released outside the area covered by the targets.
    OutsideTargets,
    /// Dropped back onto its own slot.
    SameSlot,
    /// The dragged block is no longer among the targets.
    ActiveGone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    Reorder { from: usize, to: usize },
    Cancelled(CancelReason),
}

/// The target whose centre is nearest to `pointer`, if the pointer is
/// inside the targets' combined bounds.
pub fn closest_center<K>(pointer: Point, targets: &[DropTarget<K>]) -> Option<&DropTarget<K>> {
    let bounds = targets
        .iter()
        .map(|t| t.rect)
        .reduce(|acc, r| acc.union(&r))?;
    if !bounds.contains(pointer) {
        return None;
    }
    targets.iter().min_by(|a, b| {
        let da = a.rect.center().distance_to(pointer);
        let db = b.rect.center().distance_to(pointer);
        da.total_cmp(&db)
    })
}

/// One drag, from pointer-down to release.
#[derive(Debug, Clone)]
pub struct DragGesture<K> {
    active: K,
    origin: Point,
    activation_distance: f32,
    activated: bool,
    over: Option<K>,
}

impl<K: PartialEq + Clone> DragGesture<K> {
    pub fn begin(active: K, pointer: Point, activation_distance: f32) -> Self {
        Self {
            active,
            origin: pointer,
            activation_distance,
            activated: false,
            over: None,
        }
    }

    pub fn active(&self) -> &K {
        &self.active
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Current candidate drop target.
    pub fn over(&self) -> Option<&K> {
        self.over.as_ref()
    }

    /// Feed a pointer sample, recomputing the candidate against the
    /// current target rects.
    pub fn pointer_moved(&mut self, pointer: Point, targets: &[DropTarget<K>]) {
        if !self.activated {
            if self.origin.distance_to(pointer) < self.activation_distance {
                return;
            }
            self.activated = true;
            tracing::trace!(target: "folio::session", "drag activated");
        }
        self.over = closest_center(pointer, targets).map(|t| t.key.clone());
    }

    pub fn release(mut self, pointer: Point, targets: &[DropTarget<K>]) -> DragOutcome {
        self.pointer_moved(pointer, targets);
        if !self.activated {
            return DragOutcome::Cancelled(CancelReason::NeverActivated);
        }
        let Some(from) = targets.iter().position(|t| t.key == self.active) else {
            return DragOutcome::Cancelled(CancelReason::ActiveGone);
        };
        let Some(over) = &self.over else {
            return DragOutcome::Cancelled(CancelReason::OutsideTargets);
        };
        let Some(to) = targets.iter().position(|t| &t.key == over) else {
            return DragOutcome::Cancelled(CancelReason::OutsideTargets);
        };
        if from == to {
            return DragOutcome::Cancelled(CancelReason::SameSlot);
        }
        DragOutcome::Reorder { from, to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three stacked 100px tall rows.
    fn rows() -> Vec<DropTarget<&'static str>> {
        ["a", "b", "c"]
            .into_iter()
            .enumerate()
            .map(|(i, key)| DropTarget {
                key,
                rect: Rect::new(0.0, i as f32 * 100.0, 300.0, 100.0),
            })
            .collect()
    }

    #[test]
    fn test_drag_to_last_row() {
        let targets = rows();
        let mut drag = DragGesture::begin("a", Point::new(10.0, 50.0), 8.0);
        drag.pointer_moved(Point::new(10.0, 150.0), &targets);
        assert_eq!(drag.over(), Some(&"b"));
        let outcome = drag.release(Point::new(10.0, 260.0), &targets);
        assert_eq!(outcome, DragOutcome::Reorder { from: 0, to: 2 });
    }

    #[test]
    fn test_short_travel_never_activates() {
        let targets = rows();
        let drag = DragGesture::begin("a", Point::new(10.0, 50.0), 8.0);
        assert_eq!(
            drag.release(Point::new(14.0, 53.0), &targets),
            DragOutcome::Cancelled(CancelReason::NeverActivated)
        );
    }

    #[test]
    fn test_release_outside_cancels() {
        let targets = rows();
        let mut drag = DragGesture::begin("b", Point::new(10.0, 150.0), 8.0);
        drag.pointer_moved(Point::new(10.0, 250.0), &targets);
        assert_eq!(
            drag.release(Point::new(500.0, 250.0), &targets),
            DragOutcome::Cancelled(CancelReason::OutsideTargets)
        );
    }

    #[test]
    fn test_same_slot_and_vanished_block() {
        let targets = rows();
        let mut drag = DragGesture::begin("b", Point::new(10.0, 150.0), 8.0);
        drag.pointer_moved(Point::new(40.0, 160.0), &targets);
        assert_eq!(
            drag.clone().release(Point::new(40.0, 160.0), &targets),
            DragOutcome::Cancelled(CancelReason::SameSlot)
        );

        let without_b: Vec<_> = targets.into_iter().filter(|t| t.key != "b").collect();
        assert_eq!(
            drag.release(Point::new(10.0, 50.0), &without_b),
            DragOutcome::Cancelled(CancelReason::ActiveGone)
        );
    }
}
