//! HTTP status classes.
//!
//! The access log buckets every response into one of the five IANA status
//! classes. Codes outside `100..=599` belong to none of them.
//!
//! ```rust
//! use strata::StatusClass;
//!
//! assert_eq!(StatusClass::of(204), Some(StatusClass::Success));
//! assert_eq!(StatusClass::of(422), Some(StatusClass::ClientError));
//! assert_eq!(StatusClass::of(42), None);
//! ```

/// One of the five HTTP status classes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StatusClass {
    Informational, // 1xx
    Success,       // 2xx
    Redirection,   // 3xx
    ClientError,   // 4xx
    ServerError,   // 5xx
}

impl StatusClass {
    /// Classifies a status code. Returns `None` outside `100..=599`.
    pub fn of(code: u16) -> Option<Self> {
        match code {
            100..=199 => Some(Self::Informational),
            200..=299 => Some(Self::Success),
            300..=399 => Some(Self::Redirection),
            400..=499 => Some(Self::ClientError),
            500..=599 => Some(Self::ServerError),
            _         => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_boundaries() {
        assert_eq!(StatusClass::of(99), None);
        assert_eq!(StatusClass::of(100), Some(StatusClass::Informational));
        assert_eq!(StatusClass::of(199), Some(StatusClass::Informational));
        assert_eq!(StatusClass::of(200), Some(StatusClass::Success));
        assert_eq!(StatusClass::of(308), Some(StatusClass::Redirection));
        assert_eq!(StatusClass::of(403), Some(StatusClass::ClientError));
        assert_eq!(StatusClass::of(599), Some(StatusClass::ServerError));
        assert_eq!(StatusClass::of(600), None);
    }
}
