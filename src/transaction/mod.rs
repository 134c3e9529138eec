//! Transaction ledger
//!
//! Append-only debit and credit entries. Corrections are new entries, never
//! edits.

pub mod recorder;
pub mod types;

pub use recorder::{EntryCommand, StagedEntry, TransactionRecorder};
pub use types::{Transaction, TransactionMethod, TransactionStatus, TransactionType};
