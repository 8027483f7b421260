use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("More than 1 {marker} field defined on {type_name}")]
    AmbiguousMetadata {
        type_name: &'static str,
        marker: &'static str,
    },

    #[error("PartitionKey of {type_name} must have a non-empty value")]
    MissingPartitionKey { type_name: &'static str },

    #[error("Can't set value '{raw}' to field '{field}'. Error: {cause}")]
    FieldCoercion {
        field: String,
        raw: String,
        cause: String,
    },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
