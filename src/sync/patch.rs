//! Targeted layout patches
//!
//! Upserts merge `fields` key-by-key onto the existing entity (JSON merge
//! patch: objects recurse, `null` removes, anything else replaces). Unknown
//! ids are inserted from `fields`. Deletes remove by id.

use floorplan_types::{
    EntityKind, ExhibitionLayout, Fixture, Hall, PathSegment, Stall, SyncEvent, SyncOp,
    HALL_ID_FIELD,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{SyncError, SyncResult};

/// Stall fields that change geometry (the rest are status/price/occupant)
const STALL_GEOMETRY_FIELDS: [&str; 3] = ["shape", "position", HALL_ID_FIELD];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Bounds or membership changed; spatial index must be rebuilt
    pub geometry_changed: bool,
}

/// Apply one event to the layout. The layout is untouched on error.
pub fn apply_event(layout: &mut ExhibitionLayout, event: &SyncEvent) -> SyncResult<PatchOutcome> {
    match (event.entity_kind, event.op) {
        (EntityKind::Stall, SyncOp::Upsert) => upsert_stall(layout, event),
        (EntityKind::Stall, SyncOp::Delete) => {
            let (h, s) = find_stall(layout, &event.entity_id).ok_or_else(|| unknown(event))?;
            layout.halls[h].stalls.remove(s);
            Ok(changed())
        }
        (EntityKind::Hall, SyncOp::Upsert) => {
            match layout.halls.iter().position(|h| h.id == event.entity_id) {
                Some(h) => layout.halls[h] = merged(&layout.halls[h], event)?,
                None => layout.halls.push(inserted::<Hall>(event)?),
            }
            Ok(changed())
        }
        (EntityKind::Hall, SyncOp::Delete) => {
            let h = layout
                .halls
                .iter()
                .position(|h| h.id == event.entity_id)
                .ok_or_else(|| unknown(event))?;
            layout.halls.remove(h);
            Ok(changed())
        }
        (EntityKind::Fixture, SyncOp::Upsert) => {
            match layout.fixtures.iter().position(|f| f.id == event.entity_id) {
                Some(f) => layout.fixtures[f] = merged(&layout.fixtures[f], event)?,
                None => layout.fixtures.push(inserted::<Fixture>(event)?),
            }
            Ok(changed())
        }
        (EntityKind::Fixture, SyncOp::Delete) => {
            let f = layout
                .fixtures
                .iter()
                .position(|f| f.id == event.entity_id)
                .ok_or_else(|| unknown(event))?;
            layout.fixtures.remove(f);
            Ok(changed())
        }
        (EntityKind::Path, SyncOp::Upsert) => upsert_path(layout, event),
        (EntityKind::Path, SyncOp::Delete) => {
            let removed = remove_path(layout, &event.entity_id);
            if removed {
                Ok(changed())
            } else {
                Err(unknown(event))
            }
        }
    }
}

fn changed() -> PatchOutcome {
    PatchOutcome {
        geometry_changed: true,
    }
}

fn unknown(event: &SyncEvent) -> SyncError {
    SyncError::UnknownEntity {
        kind: event.entity_kind,
        id: event.entity_id.clone(),
    }
}

fn patch_error(event: &SyncEvent, source: serde_json::Error) -> SyncError {
    SyncError::Patch {
        kind: event.entity_kind,
        id: event.entity_id.clone(),
        source,
    }
}

// =============================================================================
// STALLS
// =============================================================================

pub fn find_stall(layout: &ExhibitionLayout, id: &str) -> Option<(usize, usize)> {
    layout.halls.iter().enumerate().find_map(|(h, hall)| {
        hall.stalls
            .iter()
            .position(|s| s.id == id)
            .map(|s| (h, s))
    })
}

fn target_hall(layout: &ExhibitionLayout, event: &SyncEvent) -> Option<Option<usize>> {
    let hall_id = event.fields.get(HALL_ID_FIELD)?;
    Some(
        hall_id
            .as_str()
            .and_then(|id| layout.halls.iter().position(|h| h.id == id)),
    )
}

fn upsert_stall(layout: &mut ExhibitionLayout, event: &SyncEvent) -> SyncResult<PatchOutcome> {
    let geometry_changed = event
        .fields
        .as_object()
        .is_some_and(|fields| STALL_GEOMETRY_FIELDS.iter().any(|k| fields.contains_key(*k)));

    match find_stall(layout, &event.entity_id) {
        Some((h, s)) => {
            let patched: Stall = merged(&layout.halls[h].stalls[s], event)?;
            match target_hall(layout, event) {
                Some(None) => Err(SyncError::MissingHall(event.entity_id.clone())),
                Some(Some(target)) if target != h => {
                    layout.halls[h].stalls.remove(s);
                    layout.halls[target].stalls.push(patched);
                    Ok(PatchOutcome { geometry_changed })
                }
                _ => {
                    layout.halls[h].stalls[s] = patched;
                    Ok(PatchOutcome { geometry_changed })
                }
            }
        }
        None => {
            let Some(Some(target)) = target_hall(layout, event) else {
                return Err(SyncError::MissingHall(event.entity_id.clone()));
            };
            let stall: Stall = inserted(event)?;
            layout.halls[target].stalls.push(stall);
            Ok(changed())
        }
    }
}

// =============================================================================
// PATHS
// =============================================================================

fn upsert_path(layout: &mut ExhibitionLayout, event: &SyncEvent) -> SyncResult<PatchOutcome> {
    let id = event.entity_id.as_str();
    if let Some(p) = layout.paths.iter().position(|p| p.id == id) {
        layout.paths[p] = merged(&layout.paths[p], event)?;
        return Ok(changed());
    }
    for hall in &mut layout.halls {
        if let Some(p) = hall.paths.iter().position(|p| p.id == id) {
            hall.paths[p] = merged(&hall.paths[p], event)?;
            return Ok(changed());
        }
    }

    let path: PathSegment = inserted(event)?;
    match target_hall(layout, event) {
        Some(Some(h)) => layout.halls[h].paths.push(path),
        Some(None) => return Err(SyncError::MissingHall(event.entity_id.clone())),
        None => layout.paths.push(path),
    }
    Ok(changed())
}

fn remove_path(layout: &mut ExhibitionLayout, id: &str) -> bool {
    if let Some(p) = layout.paths.iter().position(|p| p.id == id) {
        layout.paths.remove(p);
        return true;
    }
    for hall in &mut layout.halls {
        if let Some(p) = hall.paths.iter().position(|p| p.id == id) {
            hall.paths.remove(p);
            return true;
        }
    }
    false
}

// =============================================================================
// MERGE
// =============================================================================

/// Existing entity with `event.fields` merged on top
fn merged<T: Serialize + DeserializeOwned>(entity: &T, event: &SyncEvent) -> SyncResult<T> {
    let mut value = serde_json::to_value(entity).map_err(|e| patch_error(event, e))?;
    let mut fields = event.fields.clone();
    if let Value::Object(map) = &mut fields {
        map.remove(HALL_ID_FIELD);
        map.remove("id");
    }
    merge_patch(&mut value, &fields);
    serde_json::from_value(value).map_err(|e| patch_error(event, e))
}

/// New entity built from `event.fields`, id taken from the event
fn inserted<T: DeserializeOwned>(event: &SyncEvent) -> SyncResult<T> {
    let mut map = match &event.fields {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    map.remove(HALL_ID_FIELD);
    map.insert("id".to_string(), Value::String(event.entity_id.clone()));
    serde_json::from_value(Value::Object(map)).map_err(|e| patch_error(event, e))
}

/// RFC 7396 merge patch
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        if !patch.is_null() {
            *target = patch.clone();
        }
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(target_map) = target {
        for (key, value) in patch_map {
            if value.is_null() {
                target_map.remove(key);
            } else {
                merge_patch(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}
