//! Case persistence and the voting state machine.
//!
//! [`CaseLedger`] maps cases onto the slots of any
//! [`Ledger`](arbiter_core::ledger::Ledger); [`Arbitration`] drives the case
//! lifecycle on top of it.

mod adapter;
mod engine;
mod memory;
mod record;

pub use adapter::CaseLedger;
pub use engine::Arbitration;
pub use memory::{MemoryLedger, MemoryLedgerError};
pub use record::{INDEX_KEY, ballots_key, case_key, revision};
