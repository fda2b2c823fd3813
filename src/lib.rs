//! Finstat Extractor Library
//!
//! Takes an input CSV table of company ICO codes, looks every code up in the
//! Finstat API and writes the company data as a flat CSV table.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `finstat_client`: Finstat API client.
//! - `flatten`: Nested response to flat record conversion.
//! - `hasher`: Request hash generation.
//! - `identifiers`: Input table reading.
//! - `runner`: Run orchestration.
//! - `state`: Persisted run state.
//! - `value`: Generic response tree.
//! - `writer`: Output tables and manifests.
//! - `xml`: XML response decoding.

pub mod config;
pub mod errors;
pub mod finstat_client;
pub mod flatten;
pub mod hasher;
pub mod identifiers;
pub mod runner;
pub mod state;
pub mod value;
pub mod writer;
pub mod xml;
