//! Messages received from the queue and the per-cycle delete batch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A message handed out by the transport.
///
/// The core only looks at `receipt_handle`; everything else is passed to the
/// sink untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    pub body: String,

    /// Transport-issued token required to delete this delivery of the message.
    pub receipt_handle: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl ReceivedMessage {
    pub fn new(body: impl Into<String>, receipt_handle: impl Into<String>) -> Self {
        Self {
            message_id: None,
            body: body.into(),
            receipt_handle: receipt_handle.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// One entry of a batch delete call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteBatchEntry {
    /// Batch-local correlation id (`msg1`, `msg2`, ...).
    pub id: String,

    /// Percent-encoded receipt handle.
    pub receipt_handle: String,
}

/// Delete request built from one cycle's messages. Never outlives the cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteBatch {
    Single { receipt_handle: String },
    Batch(Vec<DeleteBatchEntry>),
}

impl DeleteBatch {
    /// Builds the delete request for `messages`, or `None` when there is nothing to delete.
    ///
    /// Ids are 1-based positions in receipt order and carry no message content.
    pub fn from_messages(messages: &[ReceivedMessage]) -> Option<Self> {
        match messages {
            [] => None,
            [only] => Some(DeleteBatch::Single {
                receipt_handle: encode_receipt_handle(&only.receipt_handle),
            }),
            many => Some(DeleteBatch::Batch(
                many.iter()
                    .enumerate()
                    .map(|(index, message)| DeleteBatchEntry {
                        id: format!("msg{}", index + 1),
                        receipt_handle: encode_receipt_handle(&message.receipt_handle),
                    })
                    .collect(),
            )),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DeleteBatch::Single { .. } => 1,
            DeleteBatch::Batch(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Percent-encodes a receipt handle for transmission.
pub fn encode_receipt_handle(receipt_handle: &str) -> String {
    urlencoding::encode(receipt_handle).into_owned()
}
