use thiserror::Error;

/// Everything that can abort a generation run.
///
/// There is no retry and no skip-and-continue anywhere: the first error
/// surfaces to `main` and the process exits. Scratch directories clean up
/// on the way out regardless.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("unknown paper preset '{token}' (expected A4 or LETTER)")]
    UnknownPaper { token: String },

    #[error("option count list must have exactly {expected} entries, got {got}")]
    CountsLength { expected: usize, got: usize },

    #[error("bad option count '{token}': counts must be positive integers")]
    BadCount { token: String },

    #[error("answer key is empty")]
    EmptyKey,

    #[error("answer key token '{token}' for question {question} is neither an option index nor a letter label")]
    BadKeyToken { question: usize, token: String },

    #[error("answer key entry for question {question} out of range: {index} (options: {count})")]
    KeyOutOfRange {
        question: usize,
        index: usize,
        count: usize,
    },

    /// Not a single question row fits between the reserved header bands and
    /// the bottom margin. Shrink the boxes or the gaps, or pick a larger
    /// paper; nothing short of that helps.
    #[error("layout too tight: no question row fits the page with the requested geometry")]
    LayoutTooTight,

    #[error("cover content file not found: {path}")]
    MissingFragment { path: String },

    /// The external TeX toolchain failed. `log` carries whatever the
    /// toolchain printed before dying.
    #[error("{reason}\n{log}")]
    Toolchain { reason: String, log: String },

    #[error("nothing to merge")]
    EmptyMerge,

    #[error("malformed merge input: {0}")]
    Malformed(&'static str),

    #[error("pdf rendering failed: {0}")]
    Pdf(String),

    #[error("pdf merge failed: {0}")]
    Merge(#[from] lopdf::Error),

    #[error("layout snapshot serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type SheetResult<T> = Result<T, SheetError>;
