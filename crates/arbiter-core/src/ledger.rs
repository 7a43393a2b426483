//! The `Ledger` trait — the external key-value store cases live in.
//!
//! Implemented by storage backends (e.g. `arbiter-store-sqlite`). The store
//! offers plain get/set only: no transactions and no compare-and-swap, so
//! every read-modify-write built on top of it can race with other writers.

use std::future::Future;

use bytes::Bytes;

/// An opaque, byte-addressed key-value store.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait Ledger: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the value under `key`. An absent key reads as empty bytes, not as
  /// an error.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Bytes, Self::Error>> + Send + 'a;

  /// Overwrite the value under `key`.
  fn set<'a>(
    &'a self,
    key: &'a str,
    value: Bytes,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Liveness probe, consulted before reads.
  fn is_available(&self) -> impl Future<Output = bool> + Send + '_;
}
