//! End-to-end board scenarios against the in-memory server

use cultivation_board::notify::{AREA_MOVED, MOVE_FAILED};
use cultivation_board::test_support::{ApiCall, MemoryBoardApi, RecordingNotifier};
use cultivation_board::{
    gate::DRAG_DENIED_MESSAGE, AreaId, BoardConfig, BoardError, BoardSession, CultivationArea,
    DragEvent, DropTarget, Gesture, GestureOutcome, Key, MoveIntent, MoveOutcome,
    PermissionGate, Point, RequestContext, Severity, Stage, StageId, TargetKind,
};
use std::sync::Arc;

const A: StageId = StageId::new(1);
const B: StageId = StageId::new(2);
const X: AreaId = AreaId::new(10);
const Y: AreaId = AreaId::new(11);
const Z: AreaId = AreaId::new(12);

struct Fixture {
    api: Arc<MemoryBoardApi>,
    notifier: Arc<RecordingNotifier>,
    session: BoardSession,
    ctx: RequestContext,
}

async fn fixture(areas: Vec<CultivationArea>) -> Fixture {
    let api = Arc::new(MemoryBoardApi::with_data(
        vec![Stage::new(1, "Propagation", 0), Stage::new(2, "Flowering", 1)],
        areas,
    ));
    let notifier = Arc::new(RecordingNotifier::default());
    let session = BoardSession::new(api.clone(), notifier.clone(), &BoardConfig::default());
    let ctx = RequestContext::new().with_scope("tenant-7");

    session.load(&ctx).await.unwrap();
    api.clear_calls();

    Fixture {
        api,
        notifier,
        session,
        ctx,
    }
}

/// A=[x(0),y(1)], B=[z(0)]
async fn two_stage_fixture() -> Fixture {
    fixture(vec![
        CultivationArea::new(10, "x", 1, 1, 0),
        CultivationArea::new(11, "y", 1, 1, 1),
        CultivationArea::new(12, "z", 1, 2, 0),
    ])
    .await
}

/// Each lane as `(area id, order)` pairs
fn lanes(session: &BoardSession) -> Vec<Vec<(AreaId, i64)>> {
    session
        .board()
        .lanes()
        .iter()
        .map(|lane| lane.areas.iter().map(|a| (a.id, a.order)).collect())
        .collect()
}

#[tokio::test]
async fn test_cross_stage_move_onto_area() {
    let f = two_stage_fixture().await;

    let outcome = f
        .session
        .apply_move(MoveIntent::onto_area(X, Z), &f.ctx)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        MoveOutcome::Moved {
            committed: true,
            steps_completed: 3
        }
    );
    assert_eq!(
        lanes(&f.session),
        vec![vec![(Y, 0)], vec![(X, 0), (Z, 1)]]
    );
    assert_eq!(
        f.api.calls(),
        vec![
            ApiCall::UpdateArea(X),
            ApiCall::Reorder(A),
            ApiCall::Reorder(B),
            ApiCall::ListAreas,
        ]
    );
    assert_eq!(f.api.stage_order(B), vec![X, Z]);
    assert_eq!(f.notifier.messages(), vec![AREA_MOVED.to_string()]);
}

#[tokio::test]
async fn test_same_stage_move_to_front() {
    let f = fixture(vec![
        CultivationArea::new(10, "x", 1, 1, 0),
        CultivationArea::new(11, "y", 1, 1, 1),
        CultivationArea::new(12, "z", 1, 1, 2),
    ])
    .await;

    f.session
        .apply_move(MoveIntent::onto_area(Z, X), &f.ctx)
        .await
        .unwrap();

    assert_eq!(lanes(&f.session)[0], vec![(Z, 0), (X, 1), (Y, 2)]);
    assert_eq!(f.api.calls(), vec![ApiCall::Reorder(A), ApiCall::ListAreas]);
    assert_eq!(f.api.stage_order(A), vec![Z, X, Y]);
}

#[tokio::test]
async fn test_move_onto_empty_stage() {
    let f = fixture(vec![
        CultivationArea::new(10, "x", 1, 1, 0),
        CultivationArea::new(11, "y", 1, 1, 1),
    ])
    .await;

    f.session
        .apply_move(MoveIntent::onto_stage(Y, B), &f.ctx)
        .await
        .unwrap();

    assert_eq!(lanes(&f.session), vec![vec![(X, 0)], vec![(Y, 0)]]);
}

#[test_log::test(tokio::test)]
async fn test_failed_update_reconciles_to_server_order() {
    let f = two_stage_fixture().await;
    f.api.fail_on(ApiCall::UpdateArea(X));
    let before = lanes(&f.session);

    let outcome = f
        .session
        .apply_move(MoveIntent::onto_area(X, Z), &f.ctx)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        MoveOutcome::Moved {
            committed: false,
            steps_completed: 0
        }
    );
    assert_eq!(f.api.calls(), vec![ApiCall::UpdateArea(X), ApiCall::ListAreas]);
    assert_eq!(lanes(&f.session), before);

    let notifications = f.notifier.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].severity, Severity::Error);
    assert_eq!(notifications[0].message, MOVE_FAILED);
}

#[tokio::test]
async fn test_failed_reorder_mid_plan_adopts_server_state() {
    let f = two_stage_fixture().await;
    f.api.fail_on(ApiCall::Reorder(B));

    f.session
        .apply_move(MoveIntent::onto_area(X, Z), &f.ctx)
        .await
        .unwrap();

    // The reassignment and source reorder landed; the board mirrors exactly that
    assert_eq!(
        f.api.calls(),
        vec![
            ApiCall::UpdateArea(X),
            ApiCall::Reorder(A),
            ApiCall::Reorder(B),
            ApiCall::ListAreas,
        ]
    );
    assert_eq!(*f.session.areas(), f.api.stored_areas());
    assert_eq!(f.session.board().stage_of(X), Some(B));
    assert_eq!(f.notifier.messages(), vec![MOVE_FAILED.to_string()]);
}

#[tokio::test]
async fn test_self_drop_makes_no_calls() {
    let f = two_stage_fixture().await;
    let areas = f.session.areas();

    let outcome = f
        .session
        .apply_move(MoveIntent::onto_area(X, X), &f.ctx)
        .await
        .unwrap();

    assert_eq!(outcome, MoveOutcome::NoOp);
    assert!(f.api.calls().is_empty());
    assert!(Arc::ptr_eq(&areas, &f.session.areas()));
    assert!(f.notifier.messages().is_empty());
}

#[tokio::test]
async fn test_drop_on_own_stage_end_is_a_no_op() {
    let f = two_stage_fixture().await;

    let outcome = f
        .session
        .apply_move(MoveIntent::onto_stage(Y, A), &f.ctx)
        .await
        .unwrap();

    assert_eq!(outcome, MoveOutcome::NoOp);
    assert!(f.api.calls().is_empty());
}

#[tokio::test]
async fn test_operator_drag_is_denied_once() {
    let f = two_stage_fixture().await;
    let ctx = f
        .ctx
        .clone()
        .with_gate(PermissionGate::facility_operator());
    let areas = f.session.areas();

    let outcome = f
        .session
        .apply_move(MoveIntent::onto_area(X, Z), &ctx)
        .await
        .unwrap();

    assert_eq!(outcome, MoveOutcome::Denied);
    assert!(f.api.calls().is_empty());
    assert!(Arc::ptr_eq(&areas, &f.session.areas()));
    assert_eq!(f.notifier.messages(), vec![DRAG_DENIED_MESSAGE.to_string()]);
}

#[tokio::test]
async fn test_second_move_while_in_flight_is_busy() {
    let f = two_stage_fixture().await;
    let release = f.api.pause_on(ApiCall::Reorder(A));

    let first = f.session.apply_move(MoveIntent::onto_area(X, Z), &f.ctx);
    let second = async {
        while !f.api.calls().contains(&ApiCall::Reorder(A)) {
            tokio::task::yield_now().await;
        }
        assert!(f.session.is_busy());

        let busy = f
            .session
            .apply_move(MoveIntent::onto_area(Y, Z), &f.ctx)
            .await;

        let ignored = f
            .session
            .handle_gesture(
                Gesture::PointerDown {
                    area: Y,
                    at: Point::new(0.0, 0.0),
                },
                &f.ctx,
            )
            .await
            .unwrap();

        release.notify_one();
        (busy, ignored)
    };

    let (first, (busy, ignored)) = tokio::join!(first, second);

    assert!(matches!(first, Ok(MoveOutcome::Moved { committed: true, .. })));
    assert!(matches!(busy, Err(BoardError::Busy)));
    assert_eq!(ignored, GestureOutcome::Ignored);
    assert!(!f.session.is_busy());
    assert!(!f.session.is_dragging());
}

#[tokio::test]
async fn test_move_is_visible_while_plan_is_in_flight() {
    let f = two_stage_fixture().await;
    let release = f.api.pause_on(ApiCall::UpdateArea(X));

    let moving = f.session.apply_move(MoveIntent::onto_area(X, Z), &f.ctx);
    let observe = async {
        while !f.api.calls().contains(&ApiCall::UpdateArea(X)) {
            tokio::task::yield_now().await;
        }
        let in_flight: Vec<Vec<AreaId>> = f
            .session
            .board()
            .lanes()
            .iter()
            .map(|lane| lane.area_ids())
            .collect();
        let stored_stage = f
            .api
            .stored_areas()
            .into_iter()
            .find(|a| a.id == X)
            .map(|a| a.current_stage_id);

        release.notify_one();
        (in_flight, stored_stage)
    };

    let (moved, (in_flight, stored_stage)) = tokio::join!(moving, observe);

    assert_eq!(in_flight, vec![vec![Y], vec![X, Z]]);
    assert_eq!(stored_stage, Some(A));
    assert!(matches!(moved, Ok(MoveOutcome::Moved { committed: true, .. })));
    assert_eq!(lanes(&f.session), vec![vec![(Y, 0)], vec![(X, 0), (Z, 1)]]);
}

#[tokio::test]
async fn test_keyboard_drop_target_kind() {
    let f = two_stage_fixture().await;
    let key = |key| Gesture::KeyDown {
        focused: Some(Y),
        key,
    };

    f.session.handle_gesture(key(Key::Space), &f.ctx).await.unwrap();
    let over = f
        .session
        .handle_gesture(key(Key::ArrowRight), &f.ctx)
        .await
        .unwrap();

    match over {
        GestureOutcome::Drag(DragEvent::Over(Some(target))) => {
            // y sits past z's slot, so the target is the stage end
            assert_eq!(target, DropTarget::Stage(B));
            assert_eq!(target.kind(), TargetKind::Stage);
            assert_eq!(MoveIntent::onto_area(Y, Z).target_kind(), TargetKind::Area);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    f.session.handle_gesture(key(Key::Escape), &f.ctx).await.unwrap();
}

#[tokio::test]
async fn test_operator_pointer_drag_is_denied_once() {
    let f = two_stage_fixture().await;
    let s = &f.session;
    let ctx = f
        .ctx
        .clone()
        .with_gate(PermissionGate::facility_operator());
    let areas = s.areas();

    let press = Gesture::PointerDown {
        area: X,
        at: Point::new(0.0, 0.0),
    };
    let drag = Gesture::PointerMove {
        at: Point::new(40.0, 0.0),
        over: Some(DropTarget::Area(Z)),
    };
    let release = Gesture::PointerUp {
        over: Some(DropTarget::Area(Z)),
    };
    s.handle_gesture(press, &ctx).await.unwrap();
    s.handle_gesture(drag, &ctx).await.unwrap();

    assert_eq!(
        s.handle_gesture(release, &ctx).await.unwrap(),
        GestureOutcome::Move(MoveOutcome::Denied)
    );
    assert!(f.api.calls().is_empty());
    assert!(Arc::ptr_eq(&areas, &s.areas()));
    assert_eq!(f.notifier.messages(), vec![DRAG_DENIED_MESSAGE.to_string()]);
    assert!(!s.is_dragging());
}

#[tokio::test]
async fn test_scope_header_sent_with_every_call() {
    let f = two_stage_fixture().await;

    f.session
        .apply_move(MoveIntent::onto_area(X, Z), &f.ctx)
        .await
        .unwrap();

    let scopes = f.api.scopes();
    assert_eq!(scopes.len(), 4);
    assert!(scopes.iter().all(|s| s.as_deref() == Some("tenant-7")));
}

#[tokio::test]
async fn test_facility_scope_limits_loaded_areas() {
    let api = Arc::new(MemoryBoardApi::with_data(
        vec![Stage::new(1, "Propagation", 0)],
        vec![
            CultivationArea::new(10, "x", 1, 1, 0),
            CultivationArea::new(11, "y", 2, 1, 0),
        ],
    ));
    let notifier = Arc::new(RecordingNotifier::default());
    let session = BoardSession::new(api, notifier, &BoardConfig::default());

    session
        .load(&RequestContext::new().with_facility(2))
        .await
        .unwrap();

    assert_eq!(session.board().lanes()[0].area_ids(), vec![Y]);
}

#[tokio::test]
async fn test_pointer_drag_end_to_end() {
    let f = two_stage_fixture().await;
    let s = &f.session;

    let press = Gesture::PointerDown {
        area: X,
        at: Point::new(0.0, 0.0),
    };
    assert_eq!(s.handle_gesture(press, &f.ctx).await.unwrap(), GestureOutcome::Ignored);

    // Below the activation distance: still a click
    let nudge = Gesture::PointerMove {
        at: Point::new(3.0, 0.0),
        over: Some(DropTarget::Area(X)),
    };
    assert_eq!(s.handle_gesture(nudge, &f.ctx).await.unwrap(), GestureOutcome::Ignored);

    let drag = Gesture::PointerMove {
        at: Point::new(40.0, 0.0),
        over: Some(DropTarget::Area(Z)),
    };
    assert_eq!(
        s.handle_gesture(drag, &f.ctx).await.unwrap(),
        GestureOutcome::Drag(DragEvent::Start(X))
    );

    let release = Gesture::PointerUp {
        over: Some(DropTarget::Area(Z)),
    };
    assert_eq!(
        s.handle_gesture(release, &f.ctx).await.unwrap(),
        GestureOutcome::Move(MoveOutcome::Moved {
            committed: true,
            steps_completed: 3
        })
    );
    assert_eq!(lanes(s), vec![vec![(Y, 0)], vec![(X, 0), (Z, 1)]]);
}

#[tokio::test]
async fn test_keyboard_drag_end_to_end() {
    let f = two_stage_fixture().await;
    let s = &f.session;
    let key = |key| Gesture::KeyDown {
        focused: Some(X),
        key,
    };

    assert_eq!(
        s.handle_gesture(key(Key::Space), &f.ctx).await.unwrap(),
        GestureOutcome::Drag(DragEvent::Start(X))
    );
    assert_eq!(
        s.handle_gesture(key(Key::ArrowRight), &f.ctx).await.unwrap(),
        GestureOutcome::Drag(DragEvent::Over(Some(DropTarget::Area(Z))))
    );
    assert!(matches!(
        s.handle_gesture(key(Key::Enter), &f.ctx).await.unwrap(),
        GestureOutcome::Move(MoveOutcome::Moved { committed: true, .. })
    ));
    assert_eq!(lanes(s), vec![vec![(Y, 0)], vec![(X, 0), (Z, 1)]]);
}

#[tokio::test]
async fn test_cancelled_drag_makes_no_calls() {
    let f = two_stage_fixture().await;
    let s = &f.session;

    s.handle_gesture(
        Gesture::KeyDown {
            focused: Some(Y),
            key: Key::Space,
        },
        &f.ctx,
    )
    .await
    .unwrap();
    let outcome = s
        .handle_gesture(
            Gesture::KeyDown {
                focused: Some(Y),
                key: Key::Escape,
            },
            &f.ctx,
        )
        .await
        .unwrap();

    assert_eq!(outcome, GestureOutcome::Drag(DragEvent::End(None)));
    assert!(f.api.calls().is_empty());
}
