//! Exhibition floor-plan viewer
//!
//! Interactive canvas for stall booking: pan/zoom over halls, stalls, fixtures
//! and walkways, multi-select of available stalls, and a live sync feed that
//! patches the layout while other visitors book.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐   InputEvent   ┌──────────────────────┐
//! │ egui input │ ─────────────► │ InteractionController│──┐ pending viewport/
//! └────────────┘                └──────────────────────┘  │ selection
//! ┌────────────┐  SyncMessage   ┌──────────────────────┐  ▼
//! │ sync thread│ ─────────────► │     LayoutStore      │ commit_frame()
//! └────────────┘   (drained)    └──────────┬───────────┘
//!                                          │ read-only
//!                           cull ─► LOD ─► render ─► Scene ─► egui::Painter
//! ```
//!
//! Everything touching the store runs on the UI thread. The sync transport
//! lives on its own thread and only hands messages over a channel.

pub mod api;
pub mod config;
pub mod error;
pub mod floorplan;
pub mod sync;
pub mod telemetry;

pub use config::ViewerConfig;
pub use error::{ApiError, ConfigError, GeometryError, SyncError};
pub use floorplan::{FloorPlanView, LayoutStore, Scene, ViewerEvent, Viewport};
pub use sync::{ConnectionStatus, SyncChannel, SyncHandle};

pub use floorplan_types;
