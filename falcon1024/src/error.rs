use thiserror::Error;

/// Error type for key generation, signing, and codec operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FalconError {
    #[error("key generation did not find a usable basis within {0} iterations")]
    KeygenRetriesExhausted(usize),
    #[error("signing did not produce a short enough vector within {0} attempts")]
    SigningRetriesExhausted(usize),
    #[error("f is not invertible modulo q")]
    NotInvertible,
    #[error("the NTRU solver exceeded its recursion depth cap at depth {depth}")]
    SolverDepthExceeded { depth: usize },
    #[error("expected key data of length {expected}, found {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
}

/// Expected, frequent rejection causes inside the key generation loop. These are values, not
/// errors in the caller-facing sense: the loop consumes them and simply draws a new candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeygenRetry {
    /// The Gram-Schmidt norm of (f, g) exceeds the acceptance bound.
    NormBoundExceeded,
    /// f has a zero NTT coefficient, so the public key h = g/f does not exist.
    NotInvertible,
    /// The resultants of f and g share a factor; the scalar Bezout step has no solution.
    NotCoprime,
    /// A frequency where both f and g vanish makes the Babai quotient undefined.
    ZeroDenominator,
    /// The reduced (F, G) still has coefficients outside the 16-bit storage range.
    CoefficientOverflow,
}

/// Outcome of the recursive NTRU solver: either a retryable rejection bubbled up from
/// anywhere in the descent, or an exceeded recursion-depth cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SolveError {
    Retry(KeygenRetry),
    DepthExceeded { depth: usize },
}

impl From<KeygenRetry> for SolveError {
    fn from(retry: KeygenRetry) -> Self {
        SolveError::Retry(retry)
    }
}
