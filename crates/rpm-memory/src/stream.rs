//! An in-memory, partitioned, ordered stream.
//!
//! Records are routed to one of `shard_count` shards by a stable hash of
//! their partition key. Each shard is a FIFO, so records sharing a key are
//! received in send order. Sequence numbers increase across the whole
//! stream.
//!
//! `receive_batch` blocks on a `Condvar` until at least one record is
//! available or the wait elapses, then drains shards round-robin.

use std::{
    collections::{hash_map::DefaultHasher, VecDeque},
    hash::{Hash, Hasher},
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use tracing::debug;

use rpm_contracts::{
    error::{PipelineError, PipelineResult},
    stream::RawRecord,
};
use rpm_core::traits::{StreamSink, StreamSource};

struct StreamState {
    shards: Vec<VecDeque<RawRecord>>,
    next_sequence: u64,
    /// Shard the next receive starts draining from.
    cursor: usize,
}

impl StreamState {
    fn pending(&self) -> usize {
        self.shards.iter().map(VecDeque::len).sum()
    }
}

pub struct InMemoryStream {
    name: String,
    state: Mutex<StreamState>,
    available: Condvar,
}

impl InMemoryStream {
    /// Create a stream with `shard_count` shards (at least one).
    pub fn new(name: impl Into<String>, shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        Self {
            name: name.into(),
            state: Mutex::new(StreamState {
                shards: (0..shard_count).map(|_| VecDeque::new()).collect(),
                next_sequence: 1,
                cursor: 0,
            }),
            available: Condvar::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shard_count(&self) -> usize {
        self.lock_state().shards.len()
    }

    /// Records sent but not yet received.
    pub fn pending(&self) -> usize {
        self.lock_state().pending()
    }

    /// The shard a partition key routes to.
    pub fn shard_for(&self, partition_key: &str) -> usize {
        shard_index(partition_key, self.shard_count())
    }

    fn lock_state(&self) -> MutexGuard<'_, StreamState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn shard_index(partition_key: &str, shard_count: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    partition_key.hash(&mut hasher);
    (hasher.finish() % shard_count as u64) as usize
}

impl StreamSink for InMemoryStream {
    fn send(&self, partition_key: &str, data: Vec<u8>) -> PipelineResult<u64> {
        let mut state = self.state.lock().map_err(|e| PipelineError::TransportSend {
            partition_key: partition_key.to_string(),
            reason: format!("stream '{}' lock poisoned: {}", self.name, e),
            retryable: false,
        })?;

        let shard = shard_index(partition_key, state.shards.len());
        let sequence_number = state.next_sequence;
        state.next_sequence += 1;
        state.shards[shard].push_back(RawRecord {
            partition_key: partition_key.to_string(),
            sequence_number,
            data,
        });
        drop(state);

        self.available.notify_all();
        debug!(stream = %self.name, partition_key = %partition_key, shard, sequence_number, "record appended");
        Ok(sequence_number)
    }
}

impl StreamSource for InMemoryStream {
    fn receive_batch(&self, max_records: usize, wait: Duration) -> PipelineResult<Vec<RawRecord>> {
        let deadline = Instant::now() + wait;
        let mut state = self.lock_state();

        while state.pending() == 0 {
            let now = Instant::now();
            if now >= deadline {
                return Ok(Vec::new());
            }
            let (next, _) = self
                .available
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            state = next;
        }

        let shard_count = state.shards.len();
        let mut batch = Vec::with_capacity(max_records.min(state.pending()));
        let mut idle_shards = 0;
        while batch.len() < max_records && idle_shards < shard_count {
            let shard = state.cursor;
            state.cursor = (state.cursor + 1) % shard_count;
            match state.shards[shard].pop_front() {
                Some(record) => {
                    batch.push(record);
                    idle_shards = 0;
                }
                None => idle_shards += 1,
            }
        }

        Ok(batch)
    }
}
