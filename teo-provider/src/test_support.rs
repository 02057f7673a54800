//! Scripted transport for handler unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::Result;
use crate::resource_data::ResourceData;
use crate::retry::RetryPolicy;
use crate::schema::Schema;
use crate::services::teo::TeoService;
use crate::traits::ApiTransport;

/// Answers each action from its own queue; an exhausted queue answers `{}`.
#[derive(Default)]
pub(crate) struct Scripted {
    replies: Mutex<HashMap<String, VecDeque<Result<Value>>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl Scripted {
    pub(crate) fn reply(self, action: &str, response: Value) -> Self {
        self.push(action, Ok(response));
        self
    }

    pub(crate) fn fail(self, action: &str, error: crate::error::ProviderError) -> Self {
        self.push(action, Err(error));
        self
    }

    fn push(&self, action: &str, reply: Result<Value>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.entry(action.to_string()).or_default().push_back(reply);
        }
    }

    /// All recorded `(action, payload)` pairs in call order.
    pub(crate) fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub(crate) fn actions(&self) -> Vec<String> {
        self.calls().into_iter().map(|(a, _)| a).collect()
    }

    /// Payload of the first call to `action`.
    pub(crate) fn payload(&self, action: &str) -> Value {
        self.calls()
            .into_iter()
            .find(|(a, _)| a == action)
            .map_or(Value::Null, |(_, p)| p)
    }
}

#[async_trait]
impl ApiTransport for Scripted {
    async fn call(&self, action: &str, payload: Value) -> Result<Value> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((action.to_string(), payload));
        }
        let next = self
            .replies
            .lock()
            .ok()
            .and_then(|mut r| r.get_mut(action).and_then(VecDeque::pop_front));
        next.unwrap_or_else(|| Ok(json!({})))
    }
}

pub(crate) fn service(transport: &Arc<Scripted>) -> TeoService {
    TeoService::new(transport.clone(), RetryPolicy::default())
}

pub(crate) fn config(schema: &Schema, value: Value) -> ResourceData {
    ResourceData::from_config(schema, object(value))
}

pub(crate) fn object(value: Value) -> serde_json::Map<String, Value> {
    match value {
        Value::Object(m) => m,
        _ => serde_json::Map::new(),
    }
}
