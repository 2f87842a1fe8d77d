use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::Value;

use crate::fetcher::{AttemptError, Transport};

/// Transport that replays canned attempt results and records every payload.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<Value, AttemptError>>>,
    fallback: Option<Result<Value, AttemptError>>,
    requests: Mutex<Vec<Value>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<Value, AttemptError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Answers every call with `result`.
    pub fn repeating(result: Result<Value, AttemptError>) -> Self {
        Self { fallback: Some(result), ..Self::new(Vec::new()) }
    }

    /// Appends results to the end of the script.
    pub fn push(&self, result: Result<Value, AttemptError>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn post_json(&self, _endpoint: &str, payload: &Value, _timeout: Duration) -> Result<Value, AttemptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(payload.clone());
        let next = self.script.lock().unwrap().pop_front();
        match (next, &self.fallback) {
            (Some(result), _) => result,
            (None, Some(result)) => result.clone(),
            (None, None) => Err(AttemptError::Fatal(String::from("script exhausted"))),
        }
    }
}
