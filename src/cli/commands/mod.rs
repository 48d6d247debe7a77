//! CLI command implementations

pub mod export;
pub mod import;
pub mod init;
pub mod validate;

use crate::domain::CastorError;

/// Exit code for a failed operation, by error kind
pub(crate) fn exit_code_for(error: &CastorError) -> i32 {
    match error {
        CastorError::Configuration(_) => 2,
        CastorError::Api(_) => 4,
        _ => 5,
    }
}
