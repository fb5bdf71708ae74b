//! Request sequencing.
//!
//! Every asynchronous request is issued for a slot and receives a ticket with a sequence number
//! that grows within the slot. A completion is only applied if its ticket is still the latest
//! one of the slot, so a slow response can never overwrite the result of a newer request.

use std::collections::HashMap;

/// Kind of asynchronous request. Requests of different slots never supersede each other.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RequestSlot {
    /// Distinct area list.
    AreaOptions,
    /// Distinct road list of the selected area.
    RoadOptions,
    /// Search results.
    Search,
    /// Features intersecting the buffer.
    BufferIntersect,
    /// Extent of the whole layer.
    HomeExtent,
    /// Cluster renderer preparation.
    ClusterRenderer,
}

/// Identifies one issued request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Ticket {
    slot: RequestSlot,
    seq: u64,
}

impl Ticket {
    /// Slot the request was issued for.
    pub fn slot(&self) -> RequestSlot {
        self.slot
    }

    /// Sequence number within the slot, starting from 1.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Issues tickets and tells whether a ticket is still current.
#[derive(Debug, Default)]
pub struct Sequencer {
    latest: HashMap<RequestSlot, u64>,
}

impl Sequencer {
    /// Creates a sequencer with no issued tickets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new ticket for the slot, superseding all previous tickets of the slot.
    pub fn issue(&mut self, slot: RequestSlot) -> Ticket {
        let seq = self.latest.entry(slot).or_insert(0);
        *seq += 1;

        Ticket { slot, seq: *seq }
    }

    /// Supersedes all issued tickets of the slot without issuing a new one.
    pub fn invalidate(&mut self, slot: RequestSlot) {
        if let Some(seq) = self.latest.get_mut(&slot) {
            *seq += 1;
        }
    }

    /// Returns true if the ticket is the latest one issued for its slot.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.get(&ticket.slot) == Some(&ticket.seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_supersedes() {
        let mut sequencer = Sequencer::new();
        let a = sequencer.issue(RequestSlot::Search);
        let b = sequencer.issue(RequestSlot::Search);

        assert!(b.seq() > a.seq());
        assert!(!sequencer.is_current(a));
        assert!(sequencer.is_current(b));
    }

    #[test]
    fn slots_are_independent() {
        let mut sequencer = Sequencer::new();
        let search = sequencer.issue(RequestSlot::Search);
        let roads = sequencer.issue(RequestSlot::RoadOptions);
        sequencer.issue(RequestSlot::RoadOptions);

        assert!(sequencer.is_current(search));
        assert!(!sequencer.is_current(roads));
    }

    #[test]
    fn invalidate() {
        let mut sequencer = Sequencer::new();
        let ticket = sequencer.issue(RequestSlot::BufferIntersect);
        sequencer.invalidate(RequestSlot::BufferIntersect);
        sequencer.invalidate(RequestSlot::HomeExtent);

        assert!(!sequencer.is_current(ticket));
        assert!(sequencer.issue(RequestSlot::BufferIntersect).seq() > 2);
    }
}
