//! Customer notification client.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::http::{HttpTransport, endpoint};
use super::{Behavior, StepError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    #[default]
    Email,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub recipient: String,
    pub message: String,
    #[serde(rename = "type")]
    pub channel: NotificationChannel,
}

/// Whatever the notification service answered with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgment {
    #[serde(flatten)]
    pub detail: Map<String, Value>,
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn send(&self, request: &NotificationRequest) -> Result<Acknowledgment, StepError>;
}

#[derive(Debug, Default)]
struct InMemoryNotificationState {
    sent: Vec<NotificationRequest>,
    behavior: Behavior,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationService {
    state: Arc<RwLock<InMemoryNotificationState>>,
}

impl InMemoryNotificationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        self.state.write().unwrap().behavior = behavior;
    }

    /// Returns every notification received, oldest first.
    pub fn sent(&self) -> Vec<NotificationRequest> {
        self.state.read().unwrap().sent.clone()
    }
}

#[async_trait]
impl NotificationService for InMemoryNotificationService {
    async fn send(&self, request: &NotificationRequest) -> Result<Acknowledgment, StepError> {
        let behavior = {
            let mut state = self.state.write().unwrap();
            state.sent.push(request.clone());
            state.behavior.clone()
        };
        behavior.play().await?;

        let mut detail = Map::new();
        detail.insert("status".to_string(), Value::from("sent"));
        detail.insert("recipient".to_string(), Value::from(request.recipient.clone()));
        Ok(Acknowledgment { detail })
    }
}

#[derive(Debug, Clone)]
pub struct HttpNotificationService {
    transport: HttpTransport,
    send_url: String,
}

impl HttpNotificationService {
    pub fn new(transport: HttpTransport, base_url: &str) -> Self {
        Self {
            transport,
            send_url: endpoint(base_url, "/notifications/send"),
        }
    }
}

#[async_trait]
impl NotificationService for HttpNotificationService {
    async fn send(&self, request: &NotificationRequest) -> Result<Acknowledgment, StepError> {
        self.transport.post_json(&self.send_url, request).await
    }
}
