//! Drag coordination: raw pointer/keyboard gestures in, one move intent out.
//!
//! The coordinator is a small state machine with a single consumer. For every
//! gesture it emits at most one [`DragEvent`]; a recognised drag always yields
//! `Start`, zero or more `Over`, then exactly one `End`.

use crate::board::Board;
use crate::types::{AreaId, StageId};
use serde::{Deserialize, Serialize};

/// Pointer travel (in px) required before a press becomes a drag
pub const DEFAULT_ACTIVATION_DISTANCE: f64 = 8.0;

/// What a drag is currently hovering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DropTarget {
    Stage(StageId),
    Area(AreaId),
}

/// Kind of drop target, without its id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Stage,
    Area,
}

impl DropTarget {
    pub fn kind(&self) -> TargetKind {
        match self {
            Self::Stage(_) => TargetKind::Stage,
            Self::Area(_) => TargetKind::Area,
        }
    }
}

/// The resolved description of one drag gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub active: AreaId,
    pub over: DropTarget,
}

impl MoveIntent {
    /// Drop an area onto a stage (append)
    pub fn onto_stage(active: impl Into<AreaId>, stage: impl Into<StageId>) -> Self {
        Self {
            active: active.into(),
            over: DropTarget::Stage(stage.into()),
        }
    }

    /// Drop an area onto another area (take its position)
    pub fn onto_area(active: impl Into<AreaId>, target: impl Into<AreaId>) -> Self {
        Self {
            active: active.into(),
            over: DropTarget::Area(target.into()),
        }
    }

    pub fn target_kind(&self) -> TargetKind {
        self.over.kind()
    }

    /// Dropped back onto itself
    pub fn is_self_drop(&self) -> bool {
        self.over == DropTarget::Area(self.active)
    }
}

/// Screen position in px
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Keys the keyboard drag path reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    Enter,
    Escape,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

/// Raw input delivered by the host UI
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Pointer pressed on an area
    PointerDown { area: AreaId, at: Point },
    /// Pointer moved; `over` is the host's hit test at `at`
    PointerMove { at: Point, over: Option<DropTarget> },
    /// Pointer released; `over` is the host's hit test at release
    PointerUp { over: Option<DropTarget> },
    /// Key pressed while `focused` area has keyboard focus
    KeyDown { focused: Option<AreaId>, key: Key },
    /// Host aborted the gesture (focus lost, window blurred)
    Cancel,
}

/// Output stream consumed by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEvent {
    Start(AreaId),
    Over(Option<DropTarget>),
    /// Terminal event; `None` means nothing to do
    End(Option<MoveIntent>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Pointer,
    Keyboard,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Idle,
    Pressed {
        area: AreaId,
        origin: Point,
    },
    Dragging {
        active: AreaId,
        over: Option<DropTarget>,
        mode: Mode,
    },
}

/// Converts a gesture stream into drag events
#[derive(Debug, Clone)]
pub struct DragCoordinator {
    activation_distance: f64,
    state: State,
}

impl Default for DragCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVATION_DISTANCE)
    }
}

impl DragCoordinator {
    pub fn new(activation_distance: f64) -> Self {
        Self {
            activation_distance,
            state: State::Idle,
        }
    }

    /// A drag has been recognised and not yet ended
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, State::Dragging { .. })
    }

    /// A press or drag is underway
    pub fn is_engaged(&self) -> bool {
        !matches!(self.state, State::Idle)
    }

    /// The area being dragged, if any
    pub fn active(&self) -> Option<AreaId> {
        match self.state {
            State::Dragging { active, .. } => Some(active),
            _ => None,
        }
    }

    /// Feed one gesture. `board` is consulted for keyboard navigation.
    pub fn handle(&mut self, gesture: Gesture, board: &Board) -> Option<DragEvent> {
        match (self.state, gesture) {
            (State::Idle, Gesture::PointerDown { area, at }) => {
                self.state = State::Pressed { area, origin: at };
                None
            }
            (State::Idle, Gesture::KeyDown { focused: Some(area), key })
                if matches!(key, Key::Space | Key::Enter) =>
            {
                self.state = State::Dragging {
                    active: area,
                    over: Some(DropTarget::Area(area)),
                    mode: Mode::Keyboard,
                };
                Some(DragEvent::Start(area))
            }
            (State::Pressed { area, origin }, Gesture::PointerMove { at, over }) => {
                if origin.distance_to(&at) > self.activation_distance {
                    self.state = State::Dragging {
                        active: area,
                        over,
                        mode: Mode::Pointer,
                    };
                    Some(DragEvent::Start(area))
                } else {
                    None
                }
            }
            (State::Pressed { .. }, Gesture::PointerUp { .. } | Gesture::Cancel) => {
                // A click, not a drag
                self.state = State::Idle;
                None
            }
            (
                State::Dragging {
                    active,
                    over: current,
                    mode: Mode::Pointer,
                },
                Gesture::PointerMove { over, .. },
            ) => {
                if over == current {
                    return None;
                }
                self.state = State::Dragging {
                    active,
                    over,
                    mode: Mode::Pointer,
                };
                Some(DragEvent::Over(over))
            }
            (
                State::Dragging {
                    active,
                    mode: Mode::Pointer,
                    ..
                },
                Gesture::PointerUp { over },
            ) => Some(self.finish(active, over)),
            (
                State::Dragging {
                    active,
                    over,
                    mode: Mode::Keyboard,
                },
                Gesture::KeyDown { key, .. },
            ) => match key {
                Key::Space | Key::Enter => Some(self.finish(active, over)),
                Key::Escape => Some(self.finish(active, None)),
                Key::ArrowUp | Key::ArrowDown | Key::ArrowLeft | Key::ArrowRight => {
                    let next = step(board, over, key)?;
                    self.state = State::Dragging {
                        active,
                        over: Some(next),
                        mode: Mode::Keyboard,
                    };
                    Some(DragEvent::Over(Some(next)))
                }
            },
            (
                State::Dragging {
                    active,
                    mode: Mode::Pointer,
                    ..
                },
                Gesture::KeyDown {
                    key: Key::Escape, ..
                },
            ) => Some(self.finish(active, None)),
            (State::Dragging { active, .. }, Gesture::Cancel) => Some(self.finish(active, None)),
            _ => None,
        }
    }

    fn finish(&mut self, active: AreaId, over: Option<DropTarget>) -> DragEvent {
        self.state = State::Idle;
        let intent = over
            .map(|over| MoveIntent { active, over })
            .filter(|intent| !intent.is_self_drop());
        DragEvent::End(intent)
    }
}

/// Move the keyboard drop target one step
fn step(board: &Board, current: Option<DropTarget>, key: Key) -> Option<DropTarget> {
    let lanes = board.lanes();
    let (lane_idx, slot) = match current? {
        DropTarget::Area(id) => board.locate(id)?,
        // A stage target sits one past its last area
        DropTarget::Stage(id) => {
            let lane_idx = board.lane_index(id)?;
            (lane_idx, lanes[lane_idx].areas.len())
        }
    };

    let target_in = |lane_idx: usize, slot: usize| -> DropTarget {
        let lane = &lanes[lane_idx];
        match lane.areas.get(slot) {
            Some(area) => DropTarget::Area(area.id),
            None => DropTarget::Stage(lane.stage.id),
        }
    };

    match key {
        Key::ArrowDown => {
            let len = lanes[lane_idx].areas.len();
            (slot < len).then(|| target_in(lane_idx, slot + 1))
        }
        Key::ArrowUp => (slot > 0).then(|| target_in(lane_idx, slot - 1)),
        Key::ArrowRight => {
            let next = lane_idx + 1;
            (next < lanes.len()).then(|| target_in(next, slot.min(lanes[next].areas.len())))
        }
        Key::ArrowLeft => {
            let prev = lane_idx.checked_sub(1)?;
            Some(target_in(prev, slot.min(lanes[prev].areas.len())))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CultivationArea, Stage};

    const X: AreaId = AreaId::new(10);
    const Y: AreaId = AreaId::new(11);
    const Z: AreaId = AreaId::new(12);

    fn board() -> Board {
        Board::project(
            &[Stage::new(1, "A", 0), Stage::new(2, "B", 1)],
            &[
                CultivationArea::new(10, "x", 1, 1, 0),
                CultivationArea::new(11, "y", 1, 1, 1),
                CultivationArea::new(12, "z", 1, 2, 0),
            ],
        )
    }

    fn down(area: AreaId) -> Gesture {
        Gesture::PointerDown {
            area,
            at: Point::new(100.0, 100.0),
        }
    }

    fn move_to(x: f64, over: Option<DropTarget>) -> Gesture {
        Gesture::PointerMove {
            at: Point::new(x, 100.0),
            over,
        }
    }

    fn key(key: Key) -> Gesture {
        Gesture::KeyDown { focused: None, key }
    }

    #[test]
    fn test_small_movement_is_a_click() {
        let board = board();
        let mut drag = DragCoordinator::default();

        assert_eq!(drag.handle(down(X), &board), None);
        assert_eq!(drag.handle(move_to(105.0, None), &board), None);
        assert_eq!(drag.handle(move_to(108.0, None), &board), None);
        assert_eq!(drag.handle(Gesture::PointerUp { over: None }, &board), None);
        assert!(!drag.is_engaged());
    }

    #[test]
    fn test_pointer_drag_emits_start_over_end() {
        let board = board();
        let mut drag = DragCoordinator::default();
        let target = Some(DropTarget::Area(Z));

        drag.handle(down(X), &board);
        assert_eq!(
            drag.handle(move_to(109.0, None), &board),
            Some(DragEvent::Start(X))
        );
        assert_eq!(drag.active(), Some(X));
        assert_eq!(
            drag.handle(move_to(200.0, target), &board),
            Some(DragEvent::Over(target))
        );
        // Unchanged hover is not re-emitted
        assert_eq!(drag.handle(move_to(201.0, target), &board), None);
        assert_eq!(
            drag.handle(Gesture::PointerUp { over: target }, &board),
            Some(DragEvent::End(Some(MoveIntent::onto_area(X, Z))))
        );
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_drop_on_nothing_or_self_ends_without_intent() {
        let board = board();
        let mut drag = DragCoordinator::default();

        drag.handle(down(X), &board);
        drag.handle(move_to(150.0, None), &board);
        assert_eq!(
            drag.handle(Gesture::PointerUp { over: None }, &board),
            Some(DragEvent::End(None))
        );

        drag.handle(down(X), &board);
        drag.handle(move_to(150.0, None), &board);
        assert_eq!(
            drag.handle(
                Gesture::PointerUp {
                    over: Some(DropTarget::Area(X))
                },
                &board
            ),
            Some(DragEvent::End(None))
        );
    }

    #[test]
    fn test_escape_cancels_pointer_drag() {
        let board = board();
        let mut drag = DragCoordinator::default();
        drag.handle(down(X), &board);
        drag.handle(move_to(150.0, Some(DropTarget::Stage(StageId::new(2)))), &board);
        assert_eq!(drag.handle(key(Key::Escape), &board), Some(DragEvent::End(None)));
    }

    #[test]
    fn test_keyboard_drag_to_next_stage() {
        let board = board();
        let mut drag = DragCoordinator::default();

        assert_eq!(
            drag.handle(
                Gesture::KeyDown {
                    focused: Some(X),
                    key: Key::Space
                },
                &board
            ),
            Some(DragEvent::Start(X))
        );
        assert_eq!(
            drag.handle(key(Key::ArrowRight), &board),
            Some(DragEvent::Over(Some(DropTarget::Area(Z))))
        );
        assert_eq!(
            drag.handle(key(Key::Enter), &board),
            Some(DragEvent::End(Some(MoveIntent::onto_area(X, Z))))
        );
    }

    #[test]
    fn test_keyboard_navigation_within_and_past_lane() {
        let board = board();
        let mut drag = DragCoordinator::default();
        drag.handle(
            Gesture::KeyDown {
                focused: Some(X),
                key: Key::Enter,
            },
            &board,
        );

        assert_eq!(
            drag.handle(key(Key::ArrowDown), &board),
            Some(DragEvent::Over(Some(DropTarget::Area(Y))))
        );
        assert_eq!(
            drag.handle(key(Key::ArrowDown), &board),
            Some(DragEvent::Over(Some(DropTarget::Stage(StageId::new(1)))))
        );
        // Already past the end: nothing further down
        assert_eq!(drag.handle(key(Key::ArrowDown), &board), None);
        assert_eq!(drag.handle(key(Key::ArrowLeft), &board), None);
        assert_eq!(
            drag.handle(key(Key::ArrowRight), &board),
            Some(DragEvent::Over(Some(DropTarget::Stage(StageId::new(2)))))
        );
        assert_eq!(
            drag.handle(key(Key::ArrowUp), &board),
            Some(DragEvent::Over(Some(DropTarget::Area(Z))))
        );
        assert_eq!(drag.handle(key(Key::Escape), &board), Some(DragEvent::End(None)));
    }

    #[test]
    fn test_keyboard_pick_up_and_drop_in_place_is_noop() {
        let board = board();
        let mut drag = DragCoordinator::default();
        drag.handle(
            Gesture::KeyDown {
                focused: Some(Y),
                key: Key::Space,
            },
            &board,
        );
        assert_eq!(drag.handle(key(Key::Space), &board), Some(DragEvent::End(None)));
    }

    #[test]
    fn test_custom_activation_distance() {
        let board = board();
        let mut drag = DragCoordinator::new(2.0);
        drag.handle(down(X), &board);
        assert_eq!(
            drag.handle(move_to(103.0, None), &board),
            Some(DragEvent::Start(X))
        );
    }

    #[test]
    fn test_intent_kind_and_wire_shape() {
        let intent = MoveIntent::onto_stage(X, StageId::new(2));
        assert_eq!(intent.target_kind(), TargetKind::Stage);
        let json = serde_json::to_value(intent).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"active": 10, "over": {"kind": "stage", "id": 2}})
        );
    }
}
