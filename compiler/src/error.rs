use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{line}:{column}: {msg}.")]
    Lex {
        msg:    String,
        line:   usize,
        column: usize,
    },

    #[error("{file}:{line}:{column}: {msg}.")]
    Parse {
        msg:    String,
        file:   String,
        line:   usize,
        column: usize,
    },

    #[error("Preprocessor failed: {0}")]
    Preprocess(String),

    #[error("Code generation error: {0}")]
    Generate(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
