//! Error types for price lookups
//!
//! Providers report failures as [`UpstreamError`]. The fetchers run every
//! upstream failure through [`classify`] before handing it to the caller, so
//! callers only ever see [`PricingError`].

use std::fmt;
use std::num::ParseFloatError;
use thiserror::Error;

/// Error reported by a pricing catalog or spot history provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// The provider answered with an error code
    #[error("{code}: {message}")]
    Service { code: String, message: String },

    /// The request never reached the provider
    #[error("transport failure: {0}")]
    Transport(String),
}

impl UpstreamError {
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        UpstreamError::Service {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        UpstreamError::Transport(message.into())
    }

    /// Provider error code, or `None` for transport failures
    pub fn code(&self) -> Option<&str> {
        match self {
            UpstreamError::Service { code, .. } => Some(code),
            UpstreamError::Transport(_) => None,
        }
    }

    /// Provider error kind, or `None` for transport failures
    pub fn kind(&self) -> Option<ProviderErrorKind> {
        match self {
            UpstreamError::Service { code, .. } => Some(ProviderErrorKind::from_code(code)),
            UpstreamError::Transport(_) => None,
        }
    }
}

/// Closed set of provider error codes the fetchers recognise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    /// `InternalErrorException`
    InternalError,
    /// `InvalidParameterException`
    InvalidParameter,
    /// `NotFoundException`
    NotFound,
    /// `InvalidNextTokenException`
    InvalidContinuationToken,
    /// `ExpiredNextTokenException`
    ExpiredContinuationToken,
    /// Any code not listed above
    Unclassified,
}

impl ProviderErrorKind {
    /// Map a provider error code onto a kind
    pub fn from_code(code: &str) -> Self {
        match code {
            "InternalErrorException" => ProviderErrorKind::InternalError,
            "InvalidParameterException" => ProviderErrorKind::InvalidParameter,
            "NotFoundException" => ProviderErrorKind::NotFound,
            "InvalidNextTokenException" => ProviderErrorKind::InvalidContinuationToken,
            "ExpiredNextTokenException" => ProviderErrorKind::ExpiredContinuationToken,
            _ => ProviderErrorKind::Unclassified,
        }
    }

    /// Whether a caller may reasonably retry the whole fetch
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderErrorKind::InternalError | ProviderErrorKind::ExpiredContinuationToken
        )
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::InternalError => write!(f, "internal error"),
            ProviderErrorKind::InvalidParameter => write!(f, "invalid parameter"),
            ProviderErrorKind::NotFound => write!(f, "not found"),
            ProviderErrorKind::InvalidContinuationToken => write!(f, "invalid continuation token"),
            ProviderErrorKind::ExpiredContinuationToken => write!(f, "expired continuation token"),
            ProviderErrorKind::Unclassified => write!(f, "unclassified provider error"),
        }
    }
}

/// Main error type for price lookups
#[derive(Error, Debug)]
pub enum PricingError {
    /// The request never reached the provider
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider answered with an error code
    #[error("Provider error ({kind}) {code}: {message}")]
    Provider {
        kind: ProviderErrorKind,
        code: String,
        message: String,
    },

    /// A product document does not match the expected unit or shape
    #[error("Malformed price data: {0}")]
    MalformedPriceData(String),

    /// A price string is not a number
    #[error("Invalid price format '{value}': {source}")]
    InvalidPriceFormat {
        value: String,
        #[source]
        source: ParseFloatError,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for price lookups
pub type Result<T> = std::result::Result<T, PricingError>;

impl PricingError {
    /// Provider kind for `Provider` errors
    pub fn provider_kind(&self) -> Option<ProviderErrorKind> {
        match self {
            PricingError::Provider { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Prefix upstream failures with the region they were raised for
    pub fn in_region(self, region: &str) -> Self {
        match self {
            PricingError::Transport(message) => {
                PricingError::Transport(format!("region {}: {}", region, message))
            }
            PricingError::Provider {
                kind,
                code,
                message,
            } => PricingError::Provider {
                kind,
                code,
                message: format!("region {}: {}", region, message),
            },
            other => other,
        }
    }

    /// Whether a caller may reasonably retry the failed fetch
    pub fn is_retryable(&self) -> bool {
        match self {
            PricingError::Transport(_) => true,
            PricingError::Provider { kind, .. } => kind.is_retryable(),
            _ => false,
        }
    }
}

/// Classify an upstream failure into a [`PricingError`]
///
/// Pure mapping; the code and message are carried verbatim.
pub fn classify(error: UpstreamError) -> PricingError {
    match error {
        UpstreamError::Transport(message) => PricingError::Transport(message),
        UpstreamError::Service { code, message } => PricingError::Provider {
            kind: ProviderErrorKind::from_code(&code),
            code,
            message,
        },
    }
}

impl From<UpstreamError> for PricingError {
    fn from(error: UpstreamError) -> Self {
        classify(error)
    }
}
