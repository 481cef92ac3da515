//! Vetrina — catalog read-path cache.
//!
//! Serves paginated, sorted, searchable item listings and per-item lookups
//! from an in-memory index store, falling back to the relational source of
//! truth on miss, and overlays a per-user basket counter onto the shared
//! catalog record.
//!
//! Layers:
//!
//! - [`domain`] — catalog records and sort-order types.
//! - [`cache`] — the index store (records, two sort indexes, counters) and
//!   the loader that populates it cache-aside.
//! - [`application`] — repository ports for the backing store and the
//!   [`application::catalog::CatalogCache`] facade callers talk to.
//! - [`infra`] — Postgres adapters for the ports, telemetry bootstrap.
//! - [`config`] — layered settings (file → env).

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
