//! ScriptedTransport - テスト用の QueueTransport
//!
//! receive のレスポンスを事前に積んでおき、すべての呼び出しを記録します。

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::domain::{DeleteBatchEntry, ReceiveRequest, ReceivedMessage, TransportError};
use crate::ports::{QueueDescriptor, QueueTransport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    ListQueues(Option<String>),
    Receive(ReceiveRequest),
    Delete {
        queue: String,
        receipt_handle: String,
    },
    DeleteBatch {
        queue: String,
        entries: Vec<DeleteBatchEntry>,
    },
}

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Vec<ReceivedMessage>, TransportError>>>,
    fail_deletes: AtomicBool,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue up the messages returned by the next receive. Once the script
    /// runs out, receives return no messages.
    pub(crate) fn push_messages(&self, messages: Vec<ReceivedMessage>) {
        self.responses.lock().unwrap().push_back(Ok(messages));
    }

    pub(crate) fn push_failure(&self, err: TransportError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub(crate) fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn receive_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Receive(_)))
            .count()
    }

    pub(crate) fn delete_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Delete { .. } | Call::DeleteBatch { .. }))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl QueueTransport for ScriptedTransport {
    async fn list_queues(
        &self,
        prefix: Option<&str>,
    ) -> Result<Vec<QueueDescriptor>, TransportError> {
        self.record(Call::ListQueues(prefix.map(str::to_string)));
        Ok(vec![])
    }

    async fn receive_messages(
        &self,
        request: &ReceiveRequest,
    ) -> Result<Vec<ReceivedMessage>, TransportError> {
        self.record(Call::Receive(request.clone()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![]))
    }

    async fn delete_message(&self, queue: &str, receipt_handle: &str) -> Result<(), TransportError> {
        self.record(Call::Delete {
            queue: queue.to_string(),
            receipt_handle: receipt_handle.to_string(),
        });
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(TransportError::Delete("scripted delete failure".into()));
        }
        Ok(())
    }

    async fn delete_message_batch(
        &self,
        queue: &str,
        entries: &[DeleteBatchEntry],
    ) -> Result<(), TransportError> {
        self.record(Call::DeleteBatch {
            queue: queue.to_string(),
            entries: entries.to_vec(),
        });
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(TransportError::Delete("scripted batch delete failure".into()));
        }
        Ok(())
    }
}
