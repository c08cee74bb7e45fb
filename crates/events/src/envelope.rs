use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use ledger_core::BlockHeight;

use crate::Event;

/// Envelope for a published event, carrying stream metadata.
///
/// Notes:
/// - `sequence_number` is the position in the ledger-wide stream; it starts at 1
///   and increases by one per committed event.
/// - `aggregate_id` is the numeric id of the record the event belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E = JsonValue> {
    event_id: Uuid,
    aggregate_id: u64,
    aggregate_type: String,
    event_type: String,
    event_version: u32,
    sequence_number: u64,
    block_height: BlockHeight,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        aggregate_id: u64,
        aggregate_type: impl Into<String>,
        event_type: impl Into<String>,
        event_version: u32,
        sequence_number: u64,
        block_height: BlockHeight,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            event_type: event_type.into(),
            event_version,
            sequence_number,
            block_height,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn aggregate_id(&self) -> u64 {
        self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn event_version(&self) -> u32 {
        self.event_version
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn block_height(&self) -> BlockHeight {
        self.block_height
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

impl EventEnvelope<JsonValue> {
    /// Wrap a typed event, serializing its payload to JSON.
    pub fn from_typed<T>(
        aggregate_id: u64,
        aggregate_type: impl Into<String>,
        sequence_number: u64,
        event: &T,
    ) -> Result<Self, serde_json::Error>
    where
        T: Event + Serialize,
    {
        Ok(Self::new(
            Uuid::now_v7(),
            aggregate_id,
            aggregate_type,
            event.event_type(),
            event.version(),
            sequence_number,
            event.recorded_at(),
            serde_json::to_value(event)?,
        ))
    }
}
