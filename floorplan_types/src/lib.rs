//! Shared Floor-Plan Types
//!
//! Single source of truth for every type crossing the viewer's boundaries:
//!
//! ```text
//! ┌──────────────────┐  GET layout   ┌──────────────────┐
//! │  Layout API      │ ────────────► │                  │
//! └──────────────────┘               │  Floor-plan      │
//! ┌──────────────────┐  push feed    │  viewer (egui)   │
//! │  Sync feed       │ ────────────► │                  │
//! └──────────────────┘               └────────┬─────────┘
//!                                             │ BookingRequest
//!                                             ▼
//!                                    external checkout flow
//! ```
//!
//! ## Rules
//!
//! 1. Pure data plus constructors/accessors - geometry maths lives in the viewer
//! 2. Every type is serde-serializable (JSON over the wire)
//! 3. Entity ids are server-assigned strings; exhibition ids are UUIDs

pub mod booking;
pub mod layout;
pub mod sync;

pub use booking::BookingRequest;
pub use layout::*;
pub use sync::*;
