//! Core logic for castor-edc.
//!
//! # Modules
//!
//! - [`mapping`] - rebuilds the study tree from flat structure and data exports
//! - [`interpret`] - typed interpretation of raw data point values
//! - [`export`] - wide tables per form type, and CSV output
//! - [`import`] - castorization of spreadsheet data and upload
//! - [`session`] - [`session::CastorStudy`], which ties the above to a source
//!
//! # Example
//!
//! ```rust,no_run
//! use castor_edc::adapters::castor::CastorClient;
//! use castor_edc::config::load_config;
//! use castor_edc::core::session::CastorStudy;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("castor.toml")?;
//! let client = CastorClient::connect(config.castor.clone()).await?;
//!
//! let mut study = CastorStudy::new(Arc::new(client));
//! study.map_data().await?;
//!
//! let tables = study.export_to_tables()?;
//! println!("Study table has {} rows", tables.study.len());
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod import;
pub mod interpret;
pub mod mapping;
pub mod session;
