use thiserror::Error;

#[derive(Debug, Error)]
pub enum RvSimError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("haplotype matrix has {0} columns; expected an even number (2 per individual)")]
    OddHaplotypeColumns(usize),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("unsupported table kind: {0}")]
    UnsupportedTableKind(String),

    #[error("unsupported control configuration: {0}")]
    UnsupportedControlConfig(String),

    #[error("population {0} missing from proportion estimate")]
    MissingPopulation(String),
}

pub type Result<T> = std::result::Result<T, RvSimError>;
