use serde_derive::{Deserialize, Serialize};

use crate::{RequestId, Timestamp};

/// A request that finished service (`R<n>`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub id: RequestId,
    /// time the client issued the request
    pub sent_timestamp: Timestamp,
    /// service time the request asked for
    pub service_length: Timestamp,
    /// time the server accepted the request into its queue
    pub receipt_timestamp: Timestamp,
    /// time a worker picked the request up; only the five-field format carries it
    pub start_timestamp: Option<Timestamp>,
    pub completion_timestamp: Timestamp,
}

impl Completion {
    pub fn new(
        id: RequestId,
        sent_timestamp: Timestamp,
        service_length: Timestamp,
        receipt_timestamp: Timestamp,
        completion_timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            sent_timestamp,
            service_length,
            receipt_timestamp,
            start_timestamp: None,
            completion_timestamp,
        }
    }

    pub fn with_start(mut self, start_timestamp: Timestamp) -> Self {
        self.start_timestamp = Some(start_timestamp);
        self
    }

    /// Time between the client sending the request and the server completing it.
    pub fn response_time(&self) -> Timestamp {
        self.completion_timestamp - self.sent_timestamp
    }

    /// Time spent in the queue before a worker started on it.
    pub fn waiting_time(&self) -> Option<Timestamp> {
        self.start_timestamp
            .map(|start| start - self.receipt_timestamp)
    }

    /// Check `sent <= receipt <= (start <=) completion`.
    pub fn is_lifecycle_ordered(&self) -> bool {
        let start_ok = match self.start_timestamp {
            Some(start) => {
                self.receipt_timestamp <= start && start <= self.completion_timestamp
            }
            None => true,
        };
        self.sent_timestamp <= self.receipt_timestamp
            && self.receipt_timestamp <= self.completion_timestamp
            && start_ok
    }
}

/// A request turned away by the server, e.g. because the queue was full (`X<n>`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub id: RequestId,
    pub sent_timestamp: Timestamp,
    /// only the three-field format carries it
    pub service_length: Option<Timestamp>,
    pub rejection_timestamp: Timestamp,
}

impl Rejection {
    pub fn new(id: RequestId, sent_timestamp: Timestamp, rejection_timestamp: Timestamp) -> Self {
        Self {
            id,
            sent_timestamp,
            service_length: None,
            rejection_timestamp,
        }
    }

    pub fn with_service_length(mut self, service_length: Timestamp) -> Self {
        self.service_length = Some(service_length);
        self
    }
}
