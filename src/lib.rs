// Castor EDC - Export and import tool for Castor EDC studies
// Copyright (c) 2025 Castor EDC Contributors
// Licensed under the MIT License

//! # castor-edc
//!
//! Client and data-mapping toolkit for the Castor EDC REST API.
//!
//! ## Overview
//!
//! - **Mapping**: rebuilds a study's form structure (forms, steps, fields) and
//!   collected data (records, form instances, data points) from the flat
//!   structure and data exports
//! - **Interpretation**: turns raw wire strings into typed values, honouring
//!   the five missing-data reasons
//! - **Export**: one wide table for study forms, one per survey and one per report
//! - **Import**: castorizes spreadsheet values into wire values, rejects any
//!   batch with a failing cell, then uploads
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Mapping, interpretation, export and import
//! - [`adapters`] - Castor REST client and spreadsheet input
//! - [`domain`] - Study tree, field types, values and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use castor_edc::adapters::castor::CastorClient;
//! use castor_edc::config::load_config;
//! use castor_edc::core::export::write_tables;
//! use castor_edc::core::session::CastorStudy;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("castor.toml")?;
//!     let client = CastorClient::connect(config.castor.clone()).await?;
//!
//!     let mut study = CastorStudy::new(Arc::new(client));
//!     study.map_data().await?;
//!
//!     let tables = study.export_to_tables()?;
//!     write_tables(&tables, Path::new("output"), b';')?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library functions return [`domain::Result`], whose error is
//! [`domain::CastorError`]. Values that fail to interpret or castorize are not
//! errors; they become an `"Error"` cell so every problem in a batch is visible
//! at once.
//!
//! ```rust,no_run
//! use castor_edc::domain::CastorError;
//!
//! fn example() -> Result<(), CastorError> {
//!     let config = castor_edc::config::load_config("castor.toml")?;
//!     println!("study {}", config.castor.study_id);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
