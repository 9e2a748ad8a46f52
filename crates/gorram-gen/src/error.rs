use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenErrorKind {
    /// Target symbol not found, wrong kind, or not exported.
    Lookup,
    /// The signature falls outside the supported class.
    UnsupportedSignature,
    /// Cache directory, file write, or formatter failure.
    Io,
    /// Internal inconsistency; a bug signal, not a user error.
    Invariant,
}

#[derive(Debug, Clone)]
pub struct GenError {
    pub kind: GenErrorKind,
    pub message: String,
}

impl GenError {
    pub fn new(kind: GenErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn lookup(message: impl Into<String>) -> Self {
        Self::new(GenErrorKind::Lookup, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(GenErrorKind::UnsupportedSignature, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(GenErrorKind::Io, message)
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::new(GenErrorKind::Invariant, message)
    }
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Messages are user-facing and surfaced verbatim.
        f.write_str(&self.message)
    }
}

impl std::error::Error for GenError {}
