use thiserror::Error;

/// Boxed error used for failures coming from outside the container
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for container operations
pub type ContainerResult<T> = Result<T, ContainerError>;

/// Errors raised while registering or resolving names
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("\"{name}\" is not defined")]
    NotDefined { name: String },

    #[error("cannot change \"{name}\": it has already been resolved")]
    Frozen { name: String },

    #[error("\"{name}\" does not hold a value of type {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
    },

    #[error("Service construction failed: {source}")]
    Construction { source: BoxError },
}

impl ContainerError {
    /// Create a not defined error
    pub fn not_defined(name: impl Into<String>) -> Self {
        Self::NotDefined { name: name.into() }
    }

    /// Create a frozen registration error
    pub fn frozen(name: impl Into<String>) -> Self {
        Self::Frozen { name: name.into() }
    }

    /// Wrap a failure raised by a factory or after-handler
    pub fn construction(source: impl Into<BoxError>) -> Self {
        Self::Construction {
            source: source.into(),
        }
    }

    /// Check if the error is a not defined error
    pub fn is_not_defined(&self) -> bool {
        matches!(self, Self::NotDefined { .. })
    }

    /// Check if the error is a frozen registration error
    pub fn is_frozen(&self) -> bool {
        matches!(self, Self::Frozen { .. })
    }
}

/// Errors raised by service providers during the container lifecycle
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider registration failed for '{provider}': {error}")]
    RegistrationFailed {
        provider: String,
        error: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Provider boot failed for '{provider}': {error}")]
    BootFailed {
        provider: String,
        error: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Provider close failed for '{provider}': {error}")]
    CloseFailed {
        provider: String,
        error: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error("{message}")]
    Custom { message: String },

    #[error(transparent)]
    Other(BoxError),
}

impl ProviderError {
    /// Create a provider error from a plain message
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }

    /// Wrap any other error raised inside a provider
    pub fn other(error: impl Into<BoxError>) -> Self {
        Self::Other(error.into())
    }

    /// Name of the provider a lifecycle failure belongs to, if any
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::RegistrationFailed { provider, .. }
            | Self::BootFailed { provider, .. }
            | Self::CloseFailed { provider, .. } => Some(provider),
            _ => None,
        }
    }
}
