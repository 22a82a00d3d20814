//! Error types for the negotiation core.
//!
//! [`Error`] is the fatal channel: every value aborts the handshake and
//! maps to exactly one alert via [`Error::alert`]. Per-entry problems in a
//! ClientHello key_share list use the separate
//! [`ShareRejection`](crate::key_share::ShareRejection) type and are never
//! converted into an `Error`.

use core::fmt;

/// Result type for negotiation operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Fatal negotiation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid configuration
    InvalidConfig(String),

    /// Malformed or truncated wire data
    DecodeError(String),

    /// A group or scheme is unknown, disabled or not activatable where the
    /// protocol requires one
    UnsupportedAlgorithm(String),

    /// A decoded peer key failed the algorithm constraints
    ConstraintViolation(String),

    /// Protocol violation carrying its own alert
    Fatal {
        /// Alert to send
        alert: AlertDescription,
        /// Diagnostic text
        reason: String,
    },

    /// Cryptographic error
    CryptoError(String),

    /// Internal error
    InternalError(String),
}

impl Error {
    /// Shorthand for [`Error::Fatal`].
    pub fn fatal(alert: AlertDescription, reason: impl Into<String>) -> Self {
        Error::Fatal {
            alert,
            reason: reason.into(),
        }
    }

    /// The alert the connection layer sends for this error.
    pub fn alert(&self) -> AlertDescription {
        match self {
            Error::DecodeError(_) => AlertDescription::UnexpectedMessage,
            Error::UnsupportedAlgorithm(_) => AlertDescription::IllegalParameter,
            Error::ConstraintViolation(_) => AlertDescription::InsufficientSecurity,
            Error::Fatal { alert, .. } => *alert,
            Error::InvalidConfig(_) | Error::CryptoError(_) | Error::InternalError(_) => {
                AlertDescription::InternalError
            },
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::DecodeError(msg) => write!(f, "Decode error: {}", msg),
            Error::UnsupportedAlgorithm(msg) => write!(f, "Unsupported algorithm: {}", msg),
            Error::ConstraintViolation(msg) => write!(f, "Constraint violation: {}", msg),
            Error::Fatal { alert, reason } => write!(f, "Fatal ({:?}): {}", alert, reason),
            Error::CryptoError(msg) => write!(f, "Cryptographic error: {}", msg),
            Error::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<hsneg_crypto::Error> for Error {
    fn from(e: hsneg_crypto::Error) -> Self {
        if e.is_peer_error() {
            return Error::fatal(AlertDescription::IllegalParameter, e.to_string());
        }
        Error::CryptoError(e.to_string())
    }
}

/// TLS alert descriptions (RFC 8446 Section 6) raised by negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AlertDescription {
    /// Unexpected message
    UnexpectedMessage = 10,

    /// Handshake failure
    HandshakeFailure = 40,

    /// Illegal parameter
    IllegalParameter = 47,

    /// Decode error
    DecodeError = 50,

    /// Insufficient security
    InsufficientSecurity = 71,

    /// Internal error
    InternalError = 80,

    /// Missing extension
    MissingExtension = 109,
}

impl AlertDescription {
    /// Convert from wire format (u8).
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            10 => Some(AlertDescription::UnexpectedMessage),
            40 => Some(AlertDescription::HandshakeFailure),
            47 => Some(AlertDescription::IllegalParameter),
            50 => Some(AlertDescription::DecodeError),
            71 => Some(AlertDescription::InsufficientSecurity),
            80 => Some(AlertDescription::InternalError),
            109 => Some(AlertDescription::MissingExtension),
            _ => None,
        }
    }

    /// Convert to wire format (u8).
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_description_conversion() {
        assert_eq!(
            AlertDescription::from_u8(71),
            Some(AlertDescription::InsufficientSecurity)
        );
        assert_eq!(AlertDescription::from_u8(255), None);
        assert_eq!(AlertDescription::IllegalParameter.to_u8(), 47);
    }

    #[test]
    fn test_error_alert_mapping() {
        assert_eq!(
            Error::DecodeError("short".into()).alert(),
            AlertDescription::UnexpectedMessage
        );
        assert_eq!(
            Error::ConstraintViolation("weak".into()).alert(),
            AlertDescription::InsufficientSecurity
        );
        assert_eq!(
            Error::fatal(AlertDescription::HandshakeFailure, "no group").alert(),
            AlertDescription::HandshakeFailure
        );
        assert_eq!(
            Error::from(hsneg_crypto::Error::KeyExchangeFailed).alert(),
            AlertDescription::InternalError
        );
        assert_eq!(
            Error::from(hsneg_crypto::Error::InvalidPublicKey).alert(),
            AlertDescription::IllegalParameter
        );
    }
}
