//! Selection state - selected stall ids plus the hovered stall
//!
//! An id only enters the set while its stall is available. Sync events that
//! make a selected stall unavailable evict it (see `evict_unavailable`).

use std::collections::BTreeSet;

use floorplan_types::Stall;
use rust_decimal::Decimal;

/// Read access to stalls by id
pub trait StallLookup {
    fn stall(&self, id: &str) -> Option<&Stall>;

    fn is_available(&self, id: &str) -> bool {
        self.stall(id).is_some_and(|s| s.status.is_available())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
    /// Stall missing or not available
    Rejected,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: BTreeSet<String>,
    hovered: Option<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: &str, stalls: &impl StallLookup) -> Toggle {
        if self.selected.remove(id) {
            return Toggle::Removed;
        }
        if stalls.is_available(id) {
            self.selected.insert(id.to_string());
            Toggle::Added
        } else {
            Toggle::Rejected
        }
    }

    /// Add every available id; never removes. Returns how many were added.
    pub fn add_available<'a>(
        &mut self,
        ids: impl IntoIterator<Item = &'a str>,
        stalls: &impl StallLookup,
    ) -> usize {
        let mut added = 0;
        for id in ids {
            if !self.selected.contains(id) && stalls.is_available(id) {
                self.selected.insert(id.to_string());
                added += 1;
            }
        }
        added
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Drop ids whose stall is gone or no longer available
    pub fn evict_unavailable(&mut self, stalls: &impl StallLookup) -> Vec<String> {
        let evicted: Vec<String> = self
            .selected
            .iter()
            .filter(|id| !stalls.is_available(id))
            .cloned()
            .collect();
        for id in &evicted {
            self.selected.remove(id);
        }
        if self
            .hovered
            .as_deref()
            .is_some_and(|id| stalls.stall(id).is_none())
        {
            self.hovered = None;
        }
        evicted
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected ids in sorted order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn set_hovered(&mut self, id: Option<String>) {
        self.hovered = id;
    }

    /// Sum of prices, recomputed on demand
    pub fn total(&self, stalls: &impl StallLookup) -> Decimal {
        self.selected
            .iter()
            .filter_map(|id| stalls.stall(id))
            .map(|s| s.price)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorplan_types::{Point, Size, StallShape, StallStatus};
    use std::collections::HashMap;

    struct Table(HashMap<String, Stall>);

    impl StallLookup for Table {
        fn stall(&self, id: &str) -> Option<&Stall> {
            self.0.get(id)
        }
    }

    fn table(entries: &[(&str, StallStatus, i64)]) -> Table {
        Table(
            entries
                .iter()
                .map(|(id, status, price)| {
                    let stall = Stall {
                        id: id.to_string(),
                        stall_number: id.to_uppercase(),
                        shape: StallShape::Rectangle {
                            size: Size::new(3.0, 3.0),
                        },
                        position: Point::default(),
                        status: *status,
                        price: Decimal::from(*price),
                        occupant: None,
                    };
                    (id.to_string(), stall)
                })
                .collect(),
        )
    }

    #[test]
    fn toggle_respects_availability() {
        let stalls = table(&[
            ("a", StallStatus::Available, 100),
            ("b", StallStatus::Booked, 200),
        ]);
        let mut sel = SelectionState::new();
        assert_eq!(sel.toggle("a", &stalls), Toggle::Added);
        assert_eq!(sel.toggle("b", &stalls), Toggle::Rejected);
        assert_eq!(sel.toggle("missing", &stalls), Toggle::Rejected);
        assert_eq!(sel.len(), 1);
        assert_eq!(sel.toggle("a", &stalls), Toggle::Removed);
        assert!(sel.is_empty());
    }

    #[test]
    fn total_sums_prices() {
        let stalls = table(&[
            ("a", StallStatus::Available, 5000),
            ("b", StallStatus::Available, 1250),
        ]);
        let mut sel = SelectionState::new();
        sel.add_available(["a", "b", "a"], &stalls);
        assert_eq!(sel.total(&stalls), Decimal::from(6250));
    }

    #[test]
    fn eviction_drops_non_available() {
        let mut stalls = table(&[
            ("a", StallStatus::Available, 5000),
            ("b", StallStatus::Available, 1250),
        ]);
        let mut sel = SelectionState::new();
        sel.add_available(["a", "b"], &stalls);
        sel.set_hovered(Some("b".into()));

        if let Some(s) = stalls.0.get_mut("a") {
            s.status = StallStatus::Booked;
        }
        stalls.0.remove("b");

        let evicted = sel.evict_unavailable(&stalls);
        assert_eq!(evicted, vec!["a".to_string(), "b".to_string()]);
        assert!(sel.is_empty());
        assert_eq!(sel.hovered(), None);
    }
}
