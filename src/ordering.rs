//! Ordering stage: stable sort by event time, remembering each event's input position.

use crate::normalizer::Event;

/// An event tagged with its position in the original input
#[derive(Debug, Clone, PartialEq)]
pub struct Sequenced<P> {
    pub index: usize,
    pub event: Event<P>,
}

/// Number events in input order, then sort by time. Equal timestamps keep input order.
pub fn sort_events<P>(events: impl IntoIterator<Item = Event<P>>) -> Vec<Sequenced<P>> {
    let seq = events
        .into_iter()
        .enumerate()
        .map(|(index, event)| Sequenced { index, event })
        .collect();
    sort_sequenced(seq)
}

/// Stable time sort of already-numbered events.
pub fn sort_sequenced<P>(mut seq: Vec<Sequenced<P>>) -> Vec<Sequenced<P>> {
    // slice::sort_by_key is stable; ties stay in index order
    seq.sort_by_key(|s| s.event.event_time);
    seq
}
