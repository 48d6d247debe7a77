//! External system integrations for castor-edc.
//!
//! - [`castor`] - Castor EDC REST API client and the [`castor::StudySource`] seam
//! - [`spreadsheet`] - delimited file input for imports
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies. The mapping engine only sees the
//! [`castor::StudySource`] trait, so tests run it against an in-memory study.
//!
//! ```rust,no_run
//! use castor_edc::adapters::castor::{CastorClient, StudySource};
//! use castor_edc::config::{secret_string, CastorConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CastorConfig {
//!     study_id: "D234215B-D956-482D-BF17-71F2BB12A2FD".to_string(),
//!     client_id: "client".to_string(),
//!     client_secret: secret_string("secret".to_string()),
//!     ..Default::default()
//! };
//!
//! let client = CastorClient::connect(config).await?;
//! let surveys = client.fetch_surveys().await?;
//! # Ok(())
//! # }
//! ```

pub mod castor;
pub mod spreadsheet;
