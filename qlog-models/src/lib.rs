pub mod request;
pub mod worker;

use serde_derive::{Deserialize, Serialize};

pub use request::{Completion, Rejection};
pub use worker::{Worker, WorkerId};

/// Request identifier, the `<n>` in `R<n>` / `X<n>`.
pub type RequestId = u64;
/// timestamp in seconds, as printed by the simulator (`%.6f`)
pub type Timestamp = f64;

/// Instantaneous queue occupancy, printed by the server right after a completion.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub queue_depth: usize,
}

impl QueueSnapshot {
    pub fn new(queue_depth: usize) -> Self {
        Self { queue_depth }
    }
}

/// One line of a simulator log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventRecord {
    Completion(Completion),
    QueueSnapshot(QueueSnapshot),
    Rejection(Rejection),
    WorkerTag(WorkerId),
}

impl EventRecord {
    pub fn as_completion(&self) -> Option<&Completion> {
        match self {
            EventRecord::Completion(completion) => Some(completion),
            _ => None,
        }
    }

    pub fn as_rejection(&self) -> Option<&Rejection> {
        match self {
            EventRecord::Rejection(rejection) => Some(rejection),
            _ => None,
        }
    }

    pub fn as_queue_snapshot(&self) -> Option<&QueueSnapshot> {
        match self {
            EventRecord::QueueSnapshot(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    /// Request id of a completion or rejection.
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            EventRecord::Completion(c) => Some(c.id),
            EventRecord::Rejection(r) => Some(r.id),
            _ => None,
        }
    }

    /// Whether the record belongs to a single worker, i.e. it is a completion or a rejection.
    pub fn is_request(&self) -> bool {
        matches!(self, EventRecord::Completion(_) | EventRecord::Rejection(_))
    }
}

impl From<Completion> for EventRecord {
    fn from(completion: Completion) -> Self {
        EventRecord::Completion(completion)
    }
}

impl From<Rejection> for EventRecord {
    fn from(rejection: Rejection) -> Self {
        EventRecord::Rejection(rejection)
    }
}

impl From<QueueSnapshot> for EventRecord {
    fn from(snapshot: QueueSnapshot) -> Self {
        EventRecord::QueueSnapshot(snapshot)
    }
}

/// Iterate over the completions of a record sequence, in log order.
pub fn completions<'a, I>(records: I) -> impl Iterator<Item = &'a Completion>
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    records.into_iter().filter_map(EventRecord::as_completion)
}

/// Iterate over the rejections of a record sequence, in log order.
pub fn rejections<'a, I>(records: I) -> impl Iterator<Item = &'a Rejection>
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    records.into_iter().filter_map(EventRecord::as_rejection)
}
