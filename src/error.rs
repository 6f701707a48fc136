use thiserror::Error;

pub(crate) type MergeResult<T> = Result<T, MergeError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum MergeError {
    #[error("Template '{name}' is not valid text: {reason}")]
    Extraction { name: String, reason: String },

    #[error("Unknown placeholder '{placeholder}': not present in the current template")]
    UnknownPlaceholder { placeholder: String },

    #[error("Row {index} is out of range: table has {len} rows")]
    RowIndex { index: usize, len: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
