//! Vendor Compliance - certificate ingestion and vendor approval
//!
//! A Rust library for turning loosely structured vendor certificate sheets
//! into per-vendor approval records, and for searching them together with
//! separately maintained vendor details.
//!
//! # Features
//!
//! - Classify headerless vendor sheets and attribute certificates to vendors
//! - Resolve expirations and approve vendors holding every required certificate
//! - Atomic replace-all persistence in SQLite
//! - Merge certificate status with vendor details by normalized company name
//! - Export to multiple formats (TXT, CSV, JSON)

/// Division and trade catalogue
pub mod catalog;
/// Row classification
pub mod classifier;
/// Certificate collation and approval
pub mod collator;
/// Configuration management
pub mod config;
/// Expiration date parsing
pub mod dates;
/// Database operations and connection pooling
pub mod db;
/// Error types
pub mod error;
/// Export to TXT, CSV and JSON
pub mod export;
/// Logging setup and utilities
pub mod logging;
/// Record merging for search results
pub mod merger;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Company name normalization
pub mod normalize;
/// CSV sheet readers
pub mod reader;
/// Repository pattern for data access
pub mod repository;
/// Database schema definitions
pub mod schema;
/// Search requests and fuzzy ranking
pub mod search;
/// Ingestion and search orchestration
pub mod service;
/// Vendor context tracking
pub mod tracker;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use db::Database;
pub use error::{Result, Stage, VendorError};
pub use models::{IngestSummary, MergedVendorView, OutputFormat, RawRow, VendorDetailsRecord, VendorRecord};
pub use normalize::normalize_company;
pub use service::{ServiceSettings, VendorService};
