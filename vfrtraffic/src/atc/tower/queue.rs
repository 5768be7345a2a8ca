//! The tower's six traffic queues.
//!
//! A record is a member of at most one queue. [`Queues`] is the only
//! owner of membership and removes a record from its old queue before
//! placing it in a new one.

use std::collections::HashMap;

use serde::Serialize;

use super::record::RecordId;

/// One of the tower's queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QueueKind {
    /// Waiting at the hold short.
    Hold,
    /// Flying the traffic pattern.
    Circuit,
    /// Inbound and not yet in the pattern.
    Approach,
    /// On the runway.
    Runway,
    /// Departed and leaving the airspace.
    Departure,
    /// Landed and clear of the runway.
    Vacated,
}

impl QueueKind {
    pub const ALL: [QueueKind; 6] = [
        QueueKind::Hold,
        QueueKind::Circuit,
        QueueKind::Approach,
        QueueKind::Runway,
        QueueKind::Departure,
        QueueKind::Vacated,
    ];

    fn slot(self) -> usize {
        match self {
            QueueKind::Hold => 0,
            QueueKind::Circuit => 1,
            QueueKind::Approach => 2,
            QueueKind::Runway => 3,
            QueueKind::Departure => 4,
            QueueKind::Vacated => 5,
        }
    }
}

impl std::fmt::Display for QueueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueKind::Hold => write!(f, "hold"),
            QueueKind::Circuit => write!(f, "circuit"),
            QueueKind::Approach => write!(f, "approach"),
            QueueKind::Runway => write!(f, "runway"),
            QueueKind::Departure => write!(f, "departure"),
            QueueKind::Vacated => write!(f, "vacated"),
        }
    }
}

/// An ordered queue with a round-robin cursor.
#[derive(Debug, Clone, Default)]
struct Queue {
    members: Vec<RecordId>,
    cursor: usize,
}

/// All queues of one tower.
#[derive(Debug, Clone, Default)]
pub struct Queues {
    queues: [Queue; 6],
    membership: HashMap<RecordId, QueueKind>,
}

impl Queues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a record is in, if any.
    pub fn queue_of(&self, id: RecordId) -> Option<QueueKind> {
        self.membership.get(&id).copied()
    }

    pub fn members(&self, kind: QueueKind) -> &[RecordId] {
        &self.queues[kind.slot()].members
    }

    pub fn len(&self, kind: QueueKind) -> usize {
        self.members(kind).len()
    }

    pub fn is_empty(&self, kind: QueueKind) -> bool {
        self.members(kind).is_empty()
    }

    pub fn head(&self, kind: QueueKind) -> Option<RecordId> {
        self.members(kind).first().copied()
    }

    /// Append a record, removing it from any other queue.
    pub fn push_back(&mut self, id: RecordId, kind: QueueKind) {
        let index = self.len_after_remove(id, kind);
        self.insert_at(id, kind, index);
    }

    /// Put a record at the front, removing it from any other queue.
    pub fn push_front(&mut self, id: RecordId, kind: QueueKind) {
        self.insert_at(id, kind, 0);
    }

    /// Insert a record at `index` (clamped), removing it from any other queue.
    pub fn insert_at(&mut self, id: RecordId, kind: QueueKind, index: usize) {
        self.remove(id);
        let queue = &mut self.queues[kind.slot()];
        let index = index.min(queue.members.len());
        queue.members.insert(index, id);
        if index < queue.cursor {
            queue.cursor += 1;
        }
        self.membership.insert(id, kind);
    }

    fn len_after_remove(&self, id: RecordId, kind: QueueKind) -> usize {
        let len = self.len(kind);
        if self.queue_of(id) == Some(kind) {
            len - 1
        } else {
            len
        }
    }

    /// Remove a record from whichever queue holds it.
    pub fn remove(&mut self, id: RecordId) -> Option<QueueKind> {
        let kind = self.membership.remove(&id)?;
        let queue = &mut self.queues[kind.slot()];
        if let Some(index) = queue.members.iter().position(|m| *m == id) {
            queue.members.remove(index);
            if index < queue.cursor {
                queue.cursor -= 1;
            }
        }
        Some(kind)
    }

    /// Member under the cursor, advancing the cursor.
    ///
    /// Returns the record and whether it is the queue head.
    pub fn next_at_cursor(&mut self, kind: QueueKind) -> Option<(RecordId, bool)> {
        let queue = &mut self.queues[kind.slot()];
        if queue.members.is_empty() {
            queue.cursor = 0;
            return None;
        }
        if queue.cursor >= queue.members.len() {
            queue.cursor = 0;
        }
        let index = queue.cursor;
        queue.cursor += 1;
        Some((queue.members[index], index == 0))
    }

    /// Every record in any queue.
    pub fn all(&self) -> impl Iterator<Item = (RecordId, QueueKind)> + '_ {
        self.membership.iter().map(|(id, kind)| (*id, *kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> RecordId {
        RecordId(n)
    }

    #[test]
    fn test_single_membership() {
        let mut q = Queues::new();
        q.push_back(id(1), QueueKind::Approach);
        q.push_back(id(1), QueueKind::Circuit);

        assert!(q.is_empty(QueueKind::Approach));
        assert_eq!(q.members(QueueKind::Circuit), &[id(1)]);
        assert_eq!(q.queue_of(id(1)), Some(QueueKind::Circuit));
    }

    #[test]
    fn test_push_back_same_queue_moves_to_end() {
        let mut q = Queues::new();
        q.push_back(id(1), QueueKind::Hold);
        q.push_back(id(2), QueueKind::Hold);
        q.push_back(id(1), QueueKind::Hold);
        assert_eq!(q.members(QueueKind::Hold), &[id(2), id(1)]);
    }

    #[test]
    fn test_push_front_and_insert() {
        let mut q = Queues::new();
        q.push_back(id(1), QueueKind::Runway);
        q.push_front(id(2), QueueKind::Runway);
        q.insert_at(id(3), QueueKind::Runway, 1);
        q.insert_at(id(4), QueueKind::Runway, 99);
        assert_eq!(q.members(QueueKind::Runway), &[id(2), id(3), id(1), id(4)]);
        assert_eq!(q.head(QueueKind::Runway), Some(id(2)));
    }

    #[test]
    fn test_cursor_round_robin() {
        let mut q = Queues::new();
        for n in 1..=3 {
            q.push_back(id(n), QueueKind::Circuit);
        }
        assert_eq!(q.next_at_cursor(QueueKind::Circuit), Some((id(1), true)));
        assert_eq!(q.next_at_cursor(QueueKind::Circuit), Some((id(2), false)));
        assert_eq!(q.next_at_cursor(QueueKind::Circuit), Some((id(3), false)));
        assert_eq!(q.next_at_cursor(QueueKind::Circuit), Some((id(1), true)));
        assert_eq!(q.next_at_cursor(QueueKind::Hold), None);
    }

    #[test]
    fn test_cursor_survives_removal() {
        let mut q = Queues::new();
        for n in 1..=3 {
            q.push_back(id(n), QueueKind::Circuit);
        }
        q.next_at_cursor(QueueKind::Circuit);
        q.next_at_cursor(QueueKind::Circuit);
        // cursor now points at id 3; removing id 1 must not skip it
        q.remove(id(1));
        assert_eq!(q.next_at_cursor(QueueKind::Circuit), Some((id(3), false)));
    }

    #[test]
    fn test_remove_reports_queue() {
        let mut q = Queues::new();
        q.push_back(id(5), QueueKind::Vacated);
        assert_eq!(q.remove(id(5)), Some(QueueKind::Vacated));
        assert_eq!(q.remove(id(5)), None);
        assert_eq!(q.all().count(), 0);
    }
}
