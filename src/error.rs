use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisError {
    #[error("Malformed part token '{token}': {reason}")]
    MalformedToken { token: String, reason: String },

    #[error("Unknown part type '{part_type}' in token '{token}'")]
    UnknownPartType { token: String, part_type: String },

    #[error("Colour index {index} of '{token}' is outside the {palette_size}-colour palette")]
    ColorIndexOutOfRange {
        token: String,
        index: i64,
        palette_size: usize,
    },

    #[error("Identifier table does not line up with construct '{construct}': {reason}")]
    MisalignedIdentifierTable { construct: String, reason: String },

    #[error("Equivalence anchor '{anchor}' not found in row '{row}'")]
    UnresolvableEquivalence { anchor: String, row: String },

    #[error("Construct '{0}' is defined more than once")]
    DuplicateConstruct(String),

    #[error("Invalid design matrix at row {row}: {reason}")]
    InvalidDesignMatrix { row: usize, reason: String },

    #[error("External tool '{program}' failed: {reason}")]
    ExternalTool { program: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl VisError {
    pub fn malformed(token: &str, reason: impl Into<String>) -> Self {
        VisError::MalformedToken {
            token: token.to_string(),
            reason: reason.into(),
        }
    }

    pub fn misaligned(construct: &str, reason: impl Into<String>) -> Self {
        VisError::MisalignedIdentifierTable {
            construct: construct.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VisError>;
