//! Result type aliases

use crate::error::{DcError, ValidationErrors};

/// Standard Result type for DocConstruct operations
pub type DcResult<T> = Result<T, DcError>;

/// Lifts a contract outcome into the crate-wide result type.
pub trait ValidationExt {
    fn into_dc_result(self) -> DcResult<()>;
}

impl ValidationExt for Result<(), ValidationErrors> {
    fn into_dc_result(self) -> DcResult<()> {
        self.map_err(DcError::Validation)
    }
}
