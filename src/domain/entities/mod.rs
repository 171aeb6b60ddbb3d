//! Core domain entities.
//!
//! Each entity is owned by exactly one store; the three stores share no schema
//! and are reconciled only through bus events.
//!
//! - [`UrlMapping`] - Short code assignment (mapping store)
//! - [`RedirectRecord`] - Resolvable copy of a mapping (redirect store)
//! - [`AnalyticRecord`] - Access ledger entry (analytics store)
//!
//! Entities follow the "New Type" pattern with separate structs for creation:
//! `NewUrlMapping`, `NewRedirectRecord`, `NewAnalyticRecord`.

pub mod analytic_record;
pub mod redirect_record;
pub mod url_mapping;

pub use analytic_record::{AnalyticRecord, NewAnalyticRecord};
pub use redirect_record::{NewRedirectRecord, RedirectRecord};
pub use url_mapping::{NewUrlMapping, UrlMapping};
