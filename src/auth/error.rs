use std::fmt;

/// Internal classification of authentication failures.
///
/// These kinds exist for logging and tests only. At the HTTP boundary every
/// variant is converted into the same generic 401 response (see
/// `From<AuthError> for AppError` in `crate::error`), so clients can never
/// tell which check rejected them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// The presented token is not structurally a JWT (bad segment count,
    /// undecodable base64, unparsable claims).
    Malformed,
    /// The token header declares a signing algorithm outside the expected
    /// HMAC family. Rejecting this early defends against algorithm-confusion
    /// attacks.
    WrongAlgorithm,
    /// The signature does not verify against the configured secret.
    BadSignature,
    /// The token's expiry claim is in the past.
    Expired,
    /// The token is on the revocation denylist.
    Revoked,
    /// No credential was presented at all.
    NotAuthenticated,
    /// The revocation store could not be reached. The gate fails closed on
    /// this kind: a token whose revocation status cannot be checked is
    /// rejected.
    StoreUnavailable,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::Malformed => write!(f, "malformed token"),
            AuthError::WrongAlgorithm => write!(f, "unexpected signing algorithm"),
            AuthError::BadSignature => write!(f, "invalid token signature"),
            AuthError::Expired => write!(f, "token expired"),
            AuthError::Revoked => write!(f, "token revoked"),
            AuthError::NotAuthenticated => write!(f, "missing credentials"),
            AuthError::StoreUnavailable => write!(f, "revocation store unavailable"),
        }
    }
}

/// Maps `jsonwebtoken` failures onto the internal taxonomy.
impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(error: jsonwebtoken::errors::Error) -> AuthError {
        use jsonwebtoken::errors::ErrorKind;

        match error.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature => AuthError::BadSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                AuthError::WrongAlgorithm
            }
            // Everything else (bad segment count, base64/JSON decode failures,
            // missing claims) means the input was not a token we minted.
            _ => AuthError::Malformed,
        }
    }
}
