//! Import: external spreadsheet data to Castor
//!
//! The pipeline runs in three stages:
//!
//! 1. [`preprocess`] merges and translates source columns
//! 2. [`prepare::castorize_upload`] castorizes every cell and rejects the whole
//!    batch if any cell failed
//! 3. [`upload::upload_table`] uploads the rows concurrently and collects the
//!    server's per-row feedback

pub mod castorize;
pub mod prepare;
pub mod preprocess;
pub mod upload;

pub use castorize::{
    castorize_dependent, castorize_value, ensure_castorizable, Castorized, CastorizeOptions,
};
pub use prepare::{castorize_upload, CastorizedColumn, CastorizedRow, CastorizedTable};
pub use preprocess::{
    apply_merge, apply_translation, ColumnLink, MergeRow, TranslationRow, RECORD_ID_COLUMN,
};
pub use upload::{upload_table, ImportSummary, RowFeedback, UploadOptions, UploadPlan};
