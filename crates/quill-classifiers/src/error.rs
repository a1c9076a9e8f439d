use thiserror::Error;

/// Errors raised while setting up or running an attribution experiment.
///
/// Everything here is a configuration error in the sense that retrying the
/// same call will fail the same way; callers are expected to abort the run.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("expected feature vectors of length {expected}, found length {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error(
        "author {author} has {available} eligible documents, fewer than the {requested} splits requested"
    )]
    InsufficientDocuments {
        author: String,
        available: usize,
        requested: usize,
    },

    #[error("no candidate authors to sample from")]
    EmptyAuthorSet,

    #[error("requested {requested} authors but only {available} are available")]
    TooManyAuthors { requested: usize, available: usize },

    #[error("unknown feature group '{0}'")]
    UnknownFeatureGroup(String),

    #[error("feature group selection is empty")]
    EmptySelection,

    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("nothing to evaluate: prediction set is empty")]
    EmptyEvaluation,

    #[error("label '{0}' was not seen during training")]
    UnknownLabel(String),

    #[error("no (regular, obfuscated) document pairs to learn from")]
    NoObfuscationPairs,

    #[error("strategy '{0}' does not produce rankings")]
    RankingUnsupported(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("model fitting failed: {0}")]
    ModelFit(String),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, EvalError>;
