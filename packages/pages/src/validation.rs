//! Client-side validation failures. These never reach the network.

use api::{is_valid_code, is_valid_phone};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("please enter a phone number")]
    MissingPhone,
    #[error("invalid phone number")]
    InvalidPhone,
    #[error("please enter the verification code")]
    MissingCode,
    #[error("invalid verification code")]
    InvalidCode,
    #[error("please wait {0}s before requesting another code")]
    CountdownActive(u32),
    #[error("please choose a file")]
    MissingFile,
    #[error("unsupported file type, expected .xlsx, .xls or .csv")]
    UnsupportedFileType,
    #[error("file must not exceed 5MB")]
    FileTooLarge,
    #[error("cannot read file {0}")]
    UnreadableFile(String),
    #[error("please choose a layer type")]
    MissingLayerType,
    #[error("nothing to update")]
    EmptyUpdate,
}

pub fn check_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.is_empty() {
        Err(ValidationError::MissingPhone)
    } else if !is_valid_phone(phone) {
        Err(ValidationError::InvalidPhone)
    } else {
        Ok(())
    }
}

pub fn check_code(code: &str) -> Result<(), ValidationError> {
    if code.is_empty() {
        Err(ValidationError::MissingCode)
    } else if !is_valid_code(code) {
        Err(ValidationError::InvalidCode)
    } else {
        Ok(())
    }
}
