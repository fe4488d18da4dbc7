//! Board reconciliation engine for the cultivation console
//!
//! The console shows cultivation areas as cards laid out in stage columns.
//! This crate keeps that board consistent with the server while users drag
//! areas between and within stages.
//!
//! ## Overview
//!
//! - **Projection** - The board is derived from two flat lists (stages, areas)
//!   and never stored on its own
//! - **Drag coordination** - Pointer and keyboard gestures become a single
//!   [`MoveIntent`]
//! - **Move resolution** - A pure function turns `(board, intent)` into a new
//!   board and a [`PersistencePlan`]
//! - **Sync** - Plans are written sequentially, then the authoritative area
//!   list is always fetched again; there is no rollback
//! - **Permission gate** - Facility operators are refused locally before any
//!   network call
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use cultivation_board::{
//!     BoardConfig, BoardSession, HttpBoardApi, LogNotifier, MoveIntent, RequestContext,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BoardConfig::load()?;
//! let api = Arc::new(HttpBoardApi::from_config(&config)?);
//! let session = BoardSession::new(api, Arc::new(LogNotifier), &config);
//!
//! let ctx = RequestContext::new().with_scope("7").with_facility(3);
//! session.load(&ctx).await?;
//!
//! // Move area 10 in front of area 12
//! session.apply_move(MoveIntent::onto_area(10, 12), &ctx).await?;
//!
//! for lane in session.board().lanes() {
//!     println!("{}: {:?}", lane.stage.name, lane.area_ids());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod board;
pub mod config;
pub mod drag;
mod error;
pub mod gate;
pub mod notify;
mod session;
pub mod sync;
pub mod types;
pub mod validation;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use api::{BoardApi, HttpBoardApi};
pub use board::{resolve, Board, BoardProjection, PersistencePlan, Resolution, StageLane, StageOrder};
pub use config::BoardConfig;
pub use drag::{DragCoordinator, DragEvent, DropTarget, Gesture, Key, MoveIntent, Point, TargetKind};
pub use error::{BoardError, Result};
pub use gate::{AreaScope, PermissionGate, RequestContext, ScopeHeader};
pub use notify::{LogNotifier, Notification, NotificationSink, Severity};
pub use session::{BoardSession, GestureOutcome, InFlightGuard, MoveOutcome};
pub use sync::{SyncEngine, SyncReport};
pub use types::*;
