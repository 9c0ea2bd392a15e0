//! Saga orchestration for order creation.
//!
//! An order request is driven through a fixed pipeline of remote steps:
//! 1. Check inventory availability
//! 2. Screen for fraud (fails open when the fraud service is unreachable)
//! 3. Reserve inventory and obtain committed pricing
//! 4. Process payment
//! 5. Ship (non-fatal)
//! 6. Notify the customer (non-fatal)
//!
//! Each remote call is bounded by a per-step deadline. A payment failure
//! after a successful reservation records an inventory-release compensation.

pub mod cancel;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod journal;
pub mod order_fulfillment;
pub mod services;
pub mod state;

pub use cancel::{AbandonGuard, AbandonSignal};
pub use config::{SagaConfig, StepTimeouts};
pub use context::{CompensationAction, CompensationRecord, OrderOutcome, StepReport, StepResults};
pub use coordinator::OrderOrchestrator;
pub use error::SagaError;
pub use events::{JournalEntry, SagaEvent};
pub use journal::{InMemorySagaJournal, SagaJournal};
pub use services::{
    Acknowledgment, Availability, Behavior, FraudService, FraudVerdict, HttpTransport,
    InMemoryFraudService, InMemoryInventoryService, InMemoryNotificationService,
    InMemoryPaymentService, InMemoryShippingService, InMemoryStepClients, InventoryRequest,
    InventoryService, NotificationChannel, NotificationRequest, NotificationService,
    PaymentConfirmation, PaymentRequest, PaymentService, Pricing, Reservation, ServiceEndpoints,
    Shipment, ShipmentRequest, ShippingService, StepClients, StepError, StepErrorKind,
};
pub use state::{SagaStep, Transition};
