use std::collections::BTreeMap;

use ahash::AHashSet;
use qlog_models::{EventRecord, Worker};
use tracing::warn;

use crate::error::UngroupedRecordError;

/// Per-worker record sequences, ordered by worker.
pub type WorkerStreams = BTreeMap<Worker, Vec<EventRecord>>;

/// Split an interleaved multi-worker log into one record sequence per worker.
///
/// Every completion and rejection belongs to the most recent `T<k>` tag. Queue snapshots describe the
/// shared queue and are left out. A log without any tag is returned unchanged as a single
/// [`Worker::Implicit`] stream.
pub fn demultiplex<I>(records: I) -> Result<WorkerStreams, UngroupedRecordError>
where
    I: IntoIterator<Item = EventRecord>,
{
    let records = records.into_iter().collect::<Vec<_>>();
    let mut streams = WorkerStreams::new();

    if !records
        .iter()
        .any(|record| matches!(record, EventRecord::WorkerTag(_)))
    {
        warn_duplicate_ids(Worker::Implicit, &records);
        streams.insert(Worker::Implicit, records);
        return Ok(streams);
    }

    let mut current: Option<Worker> = None;
    for (position, record) in records.into_iter().enumerate() {
        match record {
            EventRecord::WorkerTag(id) => {
                let worker = Worker::Tagged(id);
                streams.entry(worker).or_default();
                current = Some(worker);
            }
            EventRecord::QueueSnapshot(_) => {}
            record => match current {
                Some(worker) => streams.entry(worker).or_default().push(record),
                None => return Err(UngroupedRecordError { position, record }),
            },
        }
    }

    for (worker, stream) in streams.iter() {
        warn_duplicate_ids(*worker, stream);
    }
    Ok(streams)
}

fn warn_duplicate_ids(worker: Worker, records: &[EventRecord]) {
    let mut seen = AHashSet::new();
    for id in records.iter().filter_map(EventRecord::request_id) {
        if !seen.insert(id) {
            warn!(%worker, id, "request id appears more than once in one worker stream");
        }
    }
}
