use thiserror::Error;

/// The source text does not parse under the Python grammar. Always fatal.
#[derive(Debug, Error)]
pub enum SyntaxError {
    #[error("failed to parse Python source: {0}")]
    Parse(String),

    #[error("syntax error at line {line}, column {column}: {context}")]
    Invalid {
        line: usize,
        column: usize,
        context: String,
    },
}

/// The source parses but lacks structure the pipeline depends on.
/// Surfaced before generation starts.
#[derive(Debug, Error)]
pub enum StructuralError {
    #[error("class '{class}' has no constructor; cannot classify it as Model or Controller")]
    MissingConstructor { class: String },

    #[error(
        "return arity mismatch on {class}.{method}: annotation declares {declared} element(s), trailing return has {actual}"
    )]
    ReturnArityMismatch {
        class: String,
        method: String,
        declared: usize,
        actual: usize,
    },

    #[error("main controller '{0}' does not appear in the scanned table")]
    MainControllerNotFound(String),
}

/// A cross-reference cannot be resolved during generation.
/// Fatal for the whole run unless isolated to a satellite view.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error(
        "no Model initializer matches constructor argument '{param}: {ty}' of controller '{class}'"
    )]
    UnresolvedModel {
        class: String,
        param: String,
        ty: String,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("classifier returned {got} prediction(s) for {want} feature row(s)")]
    ClassifierMisaligned { want: usize, got: usize },

    #[error("classifier failed: {0}")]
    Classifier(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
