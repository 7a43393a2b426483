//! Core types and trait definitions for confidential dispute arbitration.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the case model, the encrypted-field codec, the session parameters that
//! shape a decryption challenge, the signature gate, and the [`Ledger`]
//! abstraction every storage backend implements.
//!
//! [`Ledger`]: ledger::Ledger

// We intentionally use return-position `impl Future` in traits.
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod case;
pub mod codec;
pub mod error;
pub mod gate;
pub mod ledger;
pub mod session;

pub use error::{Error, Result};
