//! Saga journal events.

use chrono::{DateTime, Utc};
use common::{OrderId, RequesterId};
use domain::{NewOrder, OrderStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::CompensationRecord;
use crate::order_fulfillment;
use crate::services::StepError;
use crate::state::SagaStep;

/// Events recorded while an order saga runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SagaEvent {
    /// The order was persisted and the saga started.
    SagaStarted(SagaStartedData),

    /// A step call was issued.
    StepStarted(StepData),

    /// A step call returned a usable answer.
    StepCompleted(StepData),

    /// A step call failed or was refused.
    StepFailed(StepFailedData),

    /// A compensating action became due.
    CompensationRecorded(CompensationRecord),

    /// The caller went away before the given step was issued.
    SagaAbandoned(StepData),

    /// The terminal status was persisted.
    SagaFinished(SagaFinishedData),
}

impl SagaEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            SagaEvent::SagaStarted(_) => "SagaStarted",
            SagaEvent::StepStarted(_) => "StepStarted",
            SagaEvent::StepCompleted(_) => "StepCompleted",
            SagaEvent::StepFailed(_) => "StepFailed",
            SagaEvent::CompensationRecorded(_) => "CompensationRecorded",
            SagaEvent::SagaAbandoned(_) => "SagaAbandoned",
            SagaEvent::SagaFinished(_) => "SagaFinished",
        }
    }

    pub fn saga_started(order: &NewOrder) -> Self {
        SagaEvent::SagaStarted(SagaStartedData {
            saga_type: order_fulfillment::SAGA_TYPE.to_string(),
            requester_id: order.requester_id(),
            product_name: order.product_name().to_string(),
            quantity: order.quantity(),
            started_at: Utc::now(),
        })
    }

    pub fn step_started(step: SagaStep) -> Self {
        SagaEvent::StepStarted(StepData { step })
    }

    pub fn step_completed(step: SagaStep) -> Self {
        SagaEvent::StepCompleted(StepData { step })
    }

    pub fn step_failed(step: SagaStep, error: StepError) -> Self {
        SagaEvent::StepFailed(StepFailedData { step, error })
    }

    pub fn abandoned(step: SagaStep) -> Self {
        SagaEvent::SagaAbandoned(StepData { step })
    }

    pub fn saga_finished(status: OrderStatus, reason: Option<String>) -> Self {
        SagaEvent::SagaFinished(SagaFinishedData {
            status,
            reason,
            finished_at: Utc::now(),
        })
    }
}

/// Data for SagaStarted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SagaStartedData {
    pub saga_type: String,
    pub requester_id: RequesterId,
    pub product_name: String,
    pub quantity: u32,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepData {
    pub step: SagaStep,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFailedData {
    pub step: SagaStep,
    pub error: StepError,
}

/// Data for SagaFinished event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SagaFinishedData {
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub finished_at: DateTime<Utc>,
}

/// A journal entry: one event with its identity and recording time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub event_id: Uuid,
    pub order_id: OrderId,
    pub recorded_at: DateTime<Utc>,
    pub event_type: String,
    pub event: SagaEvent,
}

impl JournalEntry {
    pub fn new(order_id: OrderId, event: SagaEvent) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            order_id,
            recorded_at: Utc::now(),
            event_type: event.event_type().to_string(),
            event,
        }
    }
}
