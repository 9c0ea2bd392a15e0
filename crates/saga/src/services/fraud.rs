//! Fraud screening client.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::RequesterId;
use domain::Money;
use serde::{Deserialize, Serialize};

use super::http::{HttpTransport, endpoint};
use super::{Behavior, StepError};
use crate::order_fulfillment::FRAUD_FAIL_OPEN_REASON;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudRequest {
    pub user_id: RequesterId,
    pub total_amount: Money,
}

/// Verdict of a fraud screening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudVerdict {
    #[serde(default)]
    pub is_fraud: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Set when the verdict was produced by failing open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StepError>,
}

impl FraudVerdict {
    pub fn clear() -> Self {
        Self {
            is_fraud: false,
            reason: None,
            error: None,
        }
    }

    pub fn fraud(reason: impl Into<String>) -> Self {
        Self {
            is_fraud: true,
            reason: Some(reason.into()),
            error: None,
        }
    }

    /// A non-fraud verdict standing in for an unreachable fraud service.
    pub fn fail_open(error: StepError) -> Self {
        Self {
            is_fraud: false,
            reason: Some(FRAUD_FAIL_OPEN_REASON.to_string()),
            error: Some(error),
        }
    }

    pub fn is_fail_open(&self) -> bool {
        self.error.is_some()
    }
}

#[async_trait]
pub trait FraudService: Send + Sync {
    /// Screens an order total for the given requester.
    async fn check(&self, request: &FraudRequest) -> Result<FraudVerdict, StepError>;
}

#[derive(Debug)]
struct InMemoryFraudState {
    verdict: FraudVerdict,
    behavior: Behavior,
    requests: Vec<FraudRequest>,
}

impl Default for InMemoryFraudState {
    fn default() -> Self {
        Self {
            verdict: FraudVerdict::clear(),
            behavior: Behavior::Succeed,
            requests: Vec::new(),
        }
    }
}

/// In-memory fraud service for testing. Clears every order by default.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFraudService {
    state: Arc<RwLock<InMemoryFraudState>>,
}

impl InMemoryFraudService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the verdict returned for every subsequent screening.
    pub fn set_verdict(&self, verdict: FraudVerdict) {
        self.state.write().unwrap().verdict = verdict;
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        self.state.write().unwrap().behavior = behavior;
    }

    pub fn check_count(&self) -> usize {
        self.state.read().unwrap().requests.len()
    }

    /// Returns every screening request received, oldest first.
    pub fn requests(&self) -> Vec<FraudRequest> {
        self.state.read().unwrap().requests.clone()
    }
}

#[async_trait]
impl FraudService for InMemoryFraudService {
    async fn check(&self, request: &FraudRequest) -> Result<FraudVerdict, StepError> {
        let behavior = {
            let mut state = self.state.write().unwrap();
            state.requests.push(*request);
            state.behavior.clone()
        };
        behavior.play().await?;

        Ok(self.state.read().unwrap().verdict.clone())
    }
}

#[derive(Debug, Clone)]
pub struct HttpFraudService {
    transport: HttpTransport,
    check_url: String,
}

impl HttpFraudService {
    pub fn new(transport: HttpTransport, base_url: &str) -> Self {
        Self {
            transport,
            check_url: endpoint(base_url, "/fraud/check"),
        }
    }
}

#[async_trait]
impl FraudService for HttpFraudService {
    async fn check(&self, request: &FraudRequest) -> Result<FraudVerdict, StepError> {
        self.transport.post_json(&self.check_url, request).await
    }
}
