//! Order orchestrator driving the order creation saga.

use std::future::Future;
use std::sync::Arc;

use common::OrderId;
use domain::{NewOrder, OrderStatus};
use order_store::OrderStore;

use crate::cancel::AbandonSignal;
use crate::config::SagaConfig;
use crate::context::{CompensationAction, CompensationRecord, OrderOutcome, SagaContext, StepReport};
use crate::error::{Result, SagaError};
use crate::events::SagaEvent;
use crate::journal::SagaJournal;
use crate::order_fulfillment::{
    REASON_ABANDONED, REASON_FRAUD_DETECTED, REASON_INVENTORY_UNAVAILABLE, REASON_PAYMENT_FAILED,
    REASON_RESERVATION_FAILED, SAGA_TYPE,
};
use crate::services::{
    FraudRequest, FraudVerdict, InventoryRequest, NotificationChannel, NotificationRequest,
    PaymentRequest, ShipmentRequest, StepClients, StepError,
};
use crate::state::{SagaStep, Transition};

/// A fatal step outcome: the terminal status to persist and why.
#[derive(Debug, Clone, Copy)]
struct Halt {
    status: OrderStatus,
    reason: &'static str,
}

impl Halt {
    fn new(status: OrderStatus, reason: &'static str) -> Self {
        Self { status, reason }
    }
}

/// Orchestrates order creation sagas.
///
/// Each run persists a `pending` order, drives it through the pipeline in
/// [`SagaStep`] order and writes exactly one terminal status. Step failures
/// become part of the returned [`OrderOutcome`]; only order store failures
/// are returned as errors.
#[derive(Clone)]
pub struct OrderOrchestrator {
    store: Arc<dyn OrderStore>,
    clients: StepClients,
    journal: Arc<dyn SagaJournal>,
    config: SagaConfig,
}

impl OrderOrchestrator {
    /// Creates a new orchestrator.
    pub fn new(
        store: Arc<dyn OrderStore>,
        clients: StepClients,
        journal: Arc<dyn SagaJournal>,
        config: SagaConfig,
    ) -> Self {
        Self {
            store,
            clients,
            journal,
            config,
        }
    }

    pub fn config(&self) -> &SagaConfig {
        &self.config
    }

    /// Runs a saga for the order with no way for the caller to abandon it.
    pub async fn place_order(&self, order: NewOrder) -> Result<OrderOutcome> {
        self.run(order, &AbandonSignal::new()).await
    }

    /// Runs a saga for the order.
    ///
    /// `abandon` is consulted before each step that has not committed any
    /// downstream state. Once set, the order finishes as `cancelled` and no
    /// further calls are issued. Calls already in flight always complete.
    #[tracing::instrument(
        skip(self, order, abandon),
        fields(
            saga_type = SAGA_TYPE,
            product = order.product_name(),
            quantity = order.quantity(),
            order_id = tracing::field::Empty,
        )
    )]
    pub async fn run(&self, order: NewOrder, abandon: &AbandonSignal) -> Result<OrderOutcome> {
        metrics::counter!("saga_executions_total").increment(1);

        let order_id = self.store.create(&order).await.inspect_err(|e| {
            tracing::error!(error = %e, "failed to persist order");
        })?;
        tracing::Span::current().record("order_id", order_id.as_i64());
        tracing::info!("order persisted, saga started");
        self.journal
            .append(order_id, SagaEvent::saga_started(&order))
            .await;

        let mut ctx = SagaContext::new(order_id, order);
        let mut step = SagaStep::first();
        let mut reason = None;

        let status = loop {
            if step.is_abandonable() && abandon.is_abandoned() {
                tracing::warn!(%step, "request abandoned, skipping remaining steps");
                self.journal
                    .append(order_id, SagaEvent::abandoned(step))
                    .await;
                reason = Some(REASON_ABANDONED);
                break OrderStatus::Cancelled;
            }

            let transition = match self.execute_step(step, &mut ctx).await {
                Ok(()) => Transition::after(step),
                Err(halt) => {
                    reason = Some(halt.reason);
                    Transition::Finish(halt.status)
                }
            };

            match transition {
                Transition::Continue(next) => step = next,
                Transition::Finish(status) => break status,
            }
        };

        self.finish(ctx, status, reason).await
    }

    async fn execute_step(
        &self,
        step: SagaStep,
        ctx: &mut SagaContext,
    ) -> std::result::Result<(), Halt> {
        let order_id = ctx.order_id;
        match step {
            SagaStep::InventoryCheck => {
                let request = self.inventory_request(ctx);
                let result = self
                    .call(order_id, step, self.clients.inventory.check(&request))
                    .await;
                let available = matches!(&result, Ok(availability) if availability.available);
                ctx.results.inventory_check = Some(result.into());

                if available {
                    Ok(())
                } else {
                    Err(Halt::new(
                        OrderStatus::FailedInventory,
                        REASON_INVENTORY_UNAVAILABLE,
                    ))
                }
            }
            SagaStep::FraudCheck => {
                let request = FraudRequest {
                    user_id: ctx.order.requester_id(),
                    total_amount: ctx.estimated_total,
                };
                let verdict = match self
                    .call(order_id, step, self.clients.fraud.check(&request))
                    .await
                {
                    Ok(verdict) => verdict,
                    Err(error) => {
                        tracing::warn!(
                            kind = %error.kind,
                            "fraud service unavailable, failing open"
                        );
                        FraudVerdict::fail_open(error)
                    }
                };
                let is_fraud = verdict.is_fraud;
                ctx.results.fraud_check = Some(StepReport::Succeeded(verdict));

                if is_fraud {
                    Err(Halt::new(OrderStatus::RejectedFraud, REASON_FRAUD_DETECTED))
                } else {
                    Ok(())
                }
            }
            SagaStep::InventoryReserve => {
                let request = self.inventory_request(ctx);
                let result = self
                    .call(order_id, step, self.clients.inventory.reserve(&request))
                    .await;
                if let Ok(reservation) = &result {
                    ctx.committed_total = Some(reservation.pricing.total_price);
                }
                let reserved = result.is_ok();
                ctx.results.pricing = Some(result.into());

                if reserved {
                    Ok(())
                } else {
                    Err(Halt::new(
                        OrderStatus::FailedInventory,
                        REASON_RESERVATION_FAILED,
                    ))
                }
            }
            SagaStep::Payment => {
                let request = PaymentRequest {
                    order_id,
                    amount: ctx.committed_total.unwrap_or_default(),
                    card_number: ctx.order.payment_instrument().to_string(),
                };
                let result = self
                    .call(order_id, step, self.clients.payment.process(&request))
                    .await;
                let failure = result.as_ref().err().cloned();
                ctx.results.payment = Some(result.into());

                match failure {
                    None => Ok(()),
                    Some(cause) => {
                        self.compensate(ctx, cause).await;
                        Err(Halt::new(OrderStatus::PaymentFailed, REASON_PAYMENT_FAILED))
                    }
                }
            }
            SagaStep::Shipping => {
                let request = ShipmentRequest {
                    order_id,
                    address: ctx.order.address().to_string(),
                };
                let result = self
                    .call(order_id, step, self.clients.shipping.ship(&request))
                    .await;
                ctx.results.shipping = Some(result.into());
                Ok(())
            }
            SagaStep::Notification => {
                let request = self.notification_request(ctx);
                let result = self
                    .call(order_id, step, self.clients.notification.send(&request))
                    .await;
                ctx.results.notification = Some(result.into());
                Ok(())
            }
        }
    }

    /// Issues one step call under its deadline and journals the outcome.
    async fn call<T, F>(
        &self,
        order_id: OrderId,
        step: SagaStep,
        call: F,
    ) -> std::result::Result<T, StepError>
    where
        F: Future<Output = std::result::Result<T, StepError>>,
    {
        let deadline = self.config.timeouts.for_step(step);

        tracing::info!(%step, "saga step started");
        self.journal
            .append(order_id, SagaEvent::step_started(step))
            .await;

        let result = match tokio::time::timeout(deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(StepError::timeout(deadline)),
        };

        match &result {
            Ok(_) => {
                tracing::info!(%step, "saga step completed");
                self.journal
                    .append(order_id, SagaEvent::step_completed(step))
                    .await;
            }
            Err(error) => {
                metrics::counter!("saga_step_failures_total", "step" => step.as_str())
                    .increment(1);
                tracing::warn!(
                    %step,
                    kind = %error.kind,
                    detail = %error.detail,
                    transport = error.is_transport(),
                    fatal = step.is_fatal(),
                    "saga step failed"
                );
                self.journal
                    .append(order_id, SagaEvent::step_failed(step, error.clone()))
                    .await;
            }
        }

        result
    }

    /// Records the inventory release owed after a failed payment.
    ///
    /// The release itself is not issued from here; the record is the
    /// obligation handed to whoever reconciles inventory.
    async fn compensate(&self, ctx: &mut SagaContext, cause: StepError) {
        let record = CompensationRecord {
            order_id: ctx.order_id,
            action: CompensationAction::ReleaseInventory,
            product_name: ctx.order.product_name().to_string(),
            quantity: ctx.order.quantity(),
            cause,
        };

        tracing::warn!(
            product = %record.product_name,
            quantity = record.quantity,
            "compensating transaction: releasing reserved inventory"
        );
        metrics::counter!("saga_compensations_total").increment(1);
        self.journal
            .append(ctx.order_id, SagaEvent::CompensationRecorded(record.clone()))
            .await;

        ctx.compensation = Some(record);
    }

    /// Persists the terminal status and builds the outcome.
    async fn finish(
        &self,
        ctx: SagaContext,
        status: OrderStatus,
        reason: Option<&'static str>,
    ) -> Result<OrderOutcome> {
        let order_id = ctx.order_id;
        if !OrderStatus::Pending.can_transition_to(status) {
            return Err(SagaError::InvalidTransition {
                order_id,
                from: OrderStatus::Pending,
                to: status,
            });
        }

        self.store
            .set_status(order_id, status)
            .await
            .inspect_err(|e| {
                tracing::error!(error = %e, %status, "failed to persist terminal status");
            })?;

        let reason = reason.map(str::to_string);
        self.journal
            .append(order_id, SagaEvent::saga_finished(status, reason.clone()))
            .await;

        metrics::histogram!("saga_duration_seconds").record(ctx.started.elapsed().as_secs_f64());
        if status == OrderStatus::Completed {
            metrics::counter!("saga_completed").increment(1);
            tracing::info!("saga completed");
        } else {
            metrics::counter!("saga_failed", "status" => status.as_str()).increment(1);
            tracing::info!(%status, reason = reason.as_deref(), "saga finished without completing");
        }

        Ok(ctx.into_outcome(status, reason))
    }

    fn inventory_request(&self, ctx: &SagaContext) -> InventoryRequest {
        InventoryRequest {
            product_name: ctx.order.product_name().to_string(),
            quantity: ctx.order.quantity(),
        }
    }

    fn notification_request(&self, ctx: &SagaContext) -> NotificationRequest {
        NotificationRequest {
            recipient: format!(
                "user_{}@{}",
                ctx.order.requester_id(),
                self.config.notification_domain
            ),
            message: format!(
                "Your order #{} for {}x {} has been placed!",
                ctx.order_id,
                ctx.order.quantity(),
                ctx.order.product_name()
            ),
            channel: NotificationChannel::Email,
        }
    }
}
