//! Chain-of-custody timeline for one product.

use crate::assembler::{party_name, ProfileIndex};
use crate::models::SupplyChainEvent;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

pub trait Timestamped {
    fn timestamp(&self) -> Option<DateTime<Utc>>;
}

impl Timestamped for SupplyChainEvent {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }
}

/// An event with its parties resolved to display names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyEvent {
    #[serde(flatten)]
    pub event: SupplyChainEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_name: Option<String>,
}

impl Timestamped for PartyEvent {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.event.timestamp
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry<E> {
    /// 1-based position in timestamp order
    pub step: usize,
    #[serde(flatten)]
    pub event: E,
}

pub fn resolve_parties(
    events: Vec<SupplyChainEvent>,
    profiles: &ProfileIndex<'_>,
) -> Vec<PartyEvent> {
    events
        .into_iter()
        .map(|event| PartyEvent {
            from_name: party_name(event.from_user.as_ref(), profiles),
            to_name: party_name(event.to_user.as_ref(), profiles),
            event,
        })
        .collect()
}

/// Orders events by timestamp and numbers them from 1.
///
/// The sort is stable, so events with equal timestamps keep their fetch
/// order. Events without a timestamp go last.
pub fn assemble_timeline<E: Timestamped>(mut events: Vec<E>) -> Vec<TimelineEntry<E>> {
    events.sort_by(|a, b| match (a.timestamp(), b.timestamp()) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    events
        .into_iter()
        .enumerate()
        .map(|(i, event)| TimelineEntry { step: i + 1, event })
        .collect()
}
