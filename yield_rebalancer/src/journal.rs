use std::borrow::Cow;

use candid::{CandidType, Decode, Encode};
use ic_stable_structures::{storable::Bound, Storable};
use serde::Deserialize;

use crate::{state::insert_journal_collection, utils::error::ManagerResult};

/// Kind of a journal entry
#[derive(CandidType, Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub enum LogType {
    /// Progress of a tick
    Info,
    /// Outcome of the rebalance decision
    Decision,
    /// A rebalance report was submitted
    Rebalance,
    /// Final result of a tick
    ExecutionResult,
}

/// Journal entry
#[derive(CandidType, Clone, Debug, Deserialize)]
pub struct JournalEntry {
    pub timestamp: u64,
    pub entry: ManagerResult<()>,
    pub log_type: LogType,
    pub note: Option<String>,
}

/// The entries of one tick, committed to stable memory together.
#[derive(CandidType, Clone, Debug, Deserialize)]
pub struct JournalCollection {
    pub start_date_and_time: u64,
    pub end_date_and_time: u64,
    pub entries: Vec<JournalEntry>,
}

impl JournalCollection {
    /// Opens a collection at `timestamp` (nanoseconds)
    pub fn open(timestamp: u64) -> Self {
        Self {
            start_date_and_time: timestamp,
            end_date_and_time: timestamp,
            entries: vec![],
        }
    }

    /// Adds an entry stamped with the opening time of the collection
    pub fn append_note<S: AsRef<str>>(
        &mut self,
        entry: ManagerResult<()>,
        log_type: LogType,
        note: S,
    ) -> &mut Self {
        self.entries.push(JournalEntry {
            timestamp: self.start_date_and_time,
            entry,
            log_type,
            note: Some(note.as_ref().to_string()),
        });
        self
    }

    /// Closes the collection at `timestamp` and commits it to stable memory
    pub fn commit(mut self, timestamp: u64) {
        self.end_date_and_time = timestamp;
        insert_journal_collection(self);
    }
}

impl Storable for JournalCollection {
    fn to_bytes(&self) -> Cow<[u8]> {
        Cow::Owned(Encode!(self).unwrap())
    }

    fn from_bytes(bytes: Cow<[u8]>) -> Self {
        Decode!(bytes.as_ref(), Self).unwrap()
    }

    const BOUND: Bound = Bound::Unbounded;
}
