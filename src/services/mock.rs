//! Scripted [`NodeApi`] for tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use async_trait::async_trait;
use dkg_domain::{OperationKind, OperationResult, OperationStatus};
use serde_json::Value;
use uuid::Uuid;

use super::node_api::{NodeApi, NodeInfo, OperationRequest};
use crate::error::DkgError;

type Scripted<T> = Mutex<VecDeque<Result<T, String>>>;

/// Replays queued responses per operation kind. The last queued response
/// repeats once the queue is down to one entry; an empty queue answers PENDING.
#[derive(Default)]
pub(crate) struct MockNodeApi {
    pub submitted: Mutex<Vec<OperationRequest>>,
    pub fetches: Mutex<Vec<(OperationKind, Uuid)>>,
    results: Mutex<HashMap<OperationKind, VecDeque<Result<(OperationStatus, Value), String>>>>,
    finality: Scripted<u64>,
    pub finality_calls: Mutex<usize>,
}

impl MockNodeApi {
    pub fn push_result(&self, kind: OperationKind, status: OperationStatus, data: Value) {
        self.results
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push_back(Ok((status, data)));
    }

    pub fn push_fetch_error(&self, kind: OperationKind, message: &str) {
        self.results
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push_back(Err(message.to_string()));
    }

    pub fn push_finality(&self, confirmations: Result<u64, &str>) {
        self.finality
            .lock()
            .unwrap()
            .push_back(confirmations.map_err(str::to_string));
    }

    pub fn fetch_count(&self, kind: OperationKind) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|(fetched, _)| *fetched == kind)
            .count()
    }

    pub fn submitted_kinds(&self) -> Vec<OperationKind> {
        self.submitted
            .lock()
            .unwrap()
            .iter()
            .map(OperationRequest::kind)
            .collect()
    }
}

fn next_scripted<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

#[async_trait]
impl NodeApi for MockNodeApi {
    async fn info(&self) -> Result<NodeInfo, DkgError> {
        Ok(NodeInfo {
            version: "8.0.0-mock".to_string(),
        })
    }

    async fn submit(&self, request: &OperationRequest) -> Result<Uuid, DkgError> {
        self.submitted.lock().unwrap().push(request.clone());
        Ok(Uuid::new_v4())
    }

    async fn operation_result(
        &self,
        kind: OperationKind,
        operation_id: Uuid,
    ) -> Result<OperationResult, DkgError> {
        self.fetches.lock().unwrap().push((kind, operation_id));
        let scripted = {
            let mut results = self.results.lock().unwrap();
            results.get_mut(&kind).and_then(next_scripted)
        };

        match scripted {
            Some(Ok((status, data))) => Ok(OperationResult::new(operation_id, status, data)),
            Some(Err(message)) => Err(DkgError::Transport(message)),
            None => Ok(OperationResult::new(
                operation_id,
                OperationStatus::Pending,
                Value::Null,
            )),
        }
    }

    async fn finality(&self, _ual: &str) -> Result<u64, DkgError> {
        *self.finality_calls.lock().unwrap() += 1;
        let scripted = next_scripted(&mut self.finality.lock().unwrap());
        match scripted {
            Some(Ok(confirmations)) => Ok(confirmations),
            Some(Err(message)) => Err(DkgError::Transport(message)),
            None => Ok(0),
        }
    }
}
