//! Booking handoff - the only thing the viewer passes to checkout

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Finalized selection handed to the external checkout flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub exhibition_id: Uuid,
    pub stall_ids: Vec<String>,
    pub total: Decimal,
}
