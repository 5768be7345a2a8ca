//! Runway-use order across approach, circuit and holding traffic.
//!
//! # Design
//!
//! The merged list is rebuilt from scratch on every merge pass, so it never
//! owns records and can not drift from the queues:
//!
//! ```text
//! Approach ──┐
//! Circuit  ──┼──► insert by ETA ──► [head = next on runway, ...]
//! Hold     ──┘    (holding traffic fills gaps)
//! ```
//!
//! Airborne traffic is ordered by ETA. A holding aircraft takes the first gap
//! wide enough for a departure plus the arrival separation.

use std::collections::{BTreeMap, HashMap};

use super::queue::{QueueKind, Queues};
use super::record::{RecordId, TrackedAircraft};

/// Separation figures used by the merge.
#[derive(Debug, Clone, Copy)]
pub struct SeparationRules {
    /// Minimum arrival separation (seconds).
    pub separation_s: f64,
    /// Extra time behind a departure (seconds).
    pub departure_separation_s: f64,
    /// Seconds since the last departure, `None` if nothing has departed.
    pub since_departure_s: Option<f64>,
}

/// Ordered runway-use list.
#[derive(Debug, Clone, Default)]
pub struct MergedTrafficList {
    order: Vec<RecordId>,
}

impl MergedTrafficList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the order and flag the head as next on the runway.
    ///
    /// Returns `true` when two arrivals are closer than the separation.
    pub fn rebuild(
        &mut self,
        queues: &Queues,
        records: &mut BTreeMap<RecordId, TrackedAircraft>,
        rules: SeparationRules,
    ) -> bool {
        self.order.clear();
        // effective runway time of each entry; holding traffic uses its slot start
        let mut times: HashMap<RecordId, f64> = HashMap::new();
        let mut conflict = false;

        for kind in [QueueKind::Approach, QueueKind::Circuit] {
            for id in queues.members(kind) {
                let Some(record) = records.get(id) else {
                    continue;
                };
                conflict |= self.insert_airborne(*id, record.eta_s, &times, rules.separation_s);
                times.insert(*id, record.eta_s);
            }
        }

        for id in queues.members(QueueKind::Hold) {
            if !records.contains_key(id) {
                continue;
            }
            let slot_start = self.insert_holding(*id, &times, rules);
            times.insert(*id, slot_start);
        }

        for record in records.values_mut() {
            record.next_on_runway = false;
        }
        if let Some(head) = self.head() {
            if let Some(record) = records.get_mut(&head) {
                record.next_on_runway = true;
            }
        }

        if conflict {
            tracing::debug!(order = ?self.order, "Arrival separation conflict");
        }
        conflict
    }

    fn insert_airborne(
        &mut self,
        id: RecordId,
        eta: f64,
        times: &HashMap<RecordId, f64>,
        separation_s: f64,
    ) -> bool {
        for (index, member) in self.order.iter().enumerate() {
            let member_eta = times.get(member).copied().unwrap_or(0.0);
            if eta < member_eta {
                let conflict = member_eta - eta <= separation_s;
                self.order.insert(index, id);
                return conflict;
            }
        }
        self.order.push(id);
        false
    }

    fn insert_holding(
        &mut self,
        id: RecordId,
        times: &HashMap<RecordId, f64>,
        rules: SeparationRules,
    ) -> f64 {
        let departure_allowance = match rules.since_departure_s {
            Some(t) => (rules.departure_separation_s - t).max(0.0),
            None => 0.0,
        };
        let mut prev_eta = 0.0;
        for (index, member) in self.order.iter().enumerate() {
            let member_eta = times.get(member).copied().unwrap_or(0.0);
            let slot = if index == 0 {
                rules.separation_s + departure_allowance
            } else {
                rules.separation_s + rules.departure_separation_s
            };
            if member_eta - prev_eta > slot {
                self.order.insert(index, id);
                return prev_eta;
            }
            prev_eta = member_eta;
        }
        self.order.push(id);
        prev_eta
    }

    pub fn head(&self) -> Option<RecordId> {
        self.order.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Index of a record in the order.
    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.order.iter().position(|m| *m == id)
    }

    pub fn as_slice(&self) -> &[RecordId] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aircraft::OperationKind;

    const RULES: SeparationRules = SeparationRules {
        separation_s: 90.0,
        departure_separation_s: 60.0,
        since_departure_s: None,
    };

    struct Fixture {
        queues: Queues,
        records: BTreeMap<RecordId, TrackedAircraft>,
        next: u32,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                queues: Queues::new(),
                records: BTreeMap::new(),
                next: 0,
            }
        }

        fn add(&mut self, kind: QueueKind, eta: f64) -> RecordId {
            self.next += 1;
            let id = RecordId(self.next);
            let mut record = TrackedAircraft::new(format!("N{}", self.next), OperationKind::Circuit);
            record.eta_s = eta;
            self.records.insert(id, record);
            self.queues.push_back(id, kind);
            id
        }

        fn merge(&mut self, rules: SeparationRules) -> (MergedTrafficList, bool) {
            let mut list = MergedTrafficList::new();
            let conflict = list.rebuild(&self.queues, &mut self.records, rules);
            (list, conflict)
        }
    }

    #[test]
    fn test_airborne_ordered_by_eta() {
        let mut f = Fixture::new();
        let late = f.add(QueueKind::Circuit, 400.0);
        let early = f.add(QueueKind::Circuit, 100.0);
        let app = f.add(QueueKind::Approach, 250.0);

        let (list, conflict) = f.merge(RULES);
        assert_eq!(list.as_slice(), &[early, app, late]);
        assert!(!conflict);
    }

    #[test]
    fn test_close_arrivals_flag_conflict() {
        let mut f = Fixture::new();
        f.add(QueueKind::Approach, 150.0);
        f.add(QueueKind::Circuit, 100.0);

        let (_, conflict) = f.merge(RULES);
        assert!(conflict);
    }

    #[test]
    fn test_exactly_one_next_on_runway() {
        let mut f = Fixture::new();
        f.add(QueueKind::Circuit, 300.0);
        let first = f.add(QueueKind::Approach, 50.0);
        f.add(QueueKind::Hold, 0.0);

        let (list, _) = f.merge(RULES);
        assert_eq!(list.head(), Some(first));
        let flagged: Vec<_> = f.records.iter().filter(|(_, r)| r.next_on_runway).collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(*flagged[0].0, first);
    }

    #[test]
    fn test_holding_takes_first_wide_gap() {
        let mut f = Fixture::new();
        let arrival = f.add(QueueKind::Circuit, 200.0);
        let holding = f.add(QueueKind::Hold, 0.0);

        let (list, _) = f.merge(RULES);
        assert_eq!(list.as_slice(), &[holding, arrival]);
    }

    #[test]
    fn test_holding_waits_behind_close_arrival() {
        let mut f = Fixture::new();
        let first = f.add(QueueKind::Circuit, 60.0);
        let second = f.add(QueueKind::Circuit, 400.0);
        let holding = f.add(QueueKind::Hold, 0.0);

        let (list, _) = f.merge(RULES);
        assert_eq!(list.as_slice(), &[first, holding, second]);
    }

    #[test]
    fn test_recent_departure_widens_first_slot() {
        let mut f = Fixture::new();
        let arrival = f.add(QueueKind::Circuit, 120.0);
        let holding = f.add(QueueKind::Hold, 0.0);

        let (list, _) = f.merge(RULES);
        assert_eq!(list.as_slice(), &[holding, arrival]);

        let recent = SeparationRules {
            since_departure_s: Some(10.0),
            ..RULES
        };
        let (list, _) = f.merge(recent);
        assert_eq!(list.as_slice(), &[arrival, holding]);
    }

    #[test]
    fn test_two_holding_aircraft_queue_up() {
        let mut f = Fixture::new();
        let h1 = f.add(QueueKind::Hold, 0.0);
        let h2 = f.add(QueueKind::Hold, 0.0);

        let (list, _) = f.merge(RULES);
        assert_eq!(list.as_slice(), &[h1, h2]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut f = Fixture::new();
        f.add(QueueKind::Circuit, 300.0);
        f.add(QueueKind::Approach, 120.0);
        f.add(QueueKind::Hold, 0.0);
        f.add(QueueKind::Circuit, 500.0);

        let (a, ca) = f.merge(RULES);
        let (b, cb) = f.merge(RULES);
        assert_eq!(a.as_slice(), b.as_slice());
        assert_eq!(ca, cb);
    }

    #[test]
    fn test_runway_and_vacated_are_not_merged() {
        let mut f = Fixture::new();
        f.add(QueueKind::Runway, 0.0);
        f.add(QueueKind::Vacated, 0.0);
        f.add(QueueKind::Departure, 0.0);

        let (list, _) = f.merge(RULES);
        assert!(list.is_empty());
        assert!(f.records.values().all(|r| !r.next_on_runway));
    }
}
