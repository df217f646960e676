//! Request message and its wire codec.
//!
//! A request names the resource to fetch and the requester's time budget in
//! whole seconds. On the wire it is a single UTF-8 datagram:
//!
//! ```text
//! <resource>,<budget_secs>
//! ```
//!
//! The resource name is split from the budget at the first comma, so
//! resource names containing commas are not representable.

use std::time::Duration;

use crate::error::{FetchgramError, Result};

/// A request to fetch a resource within a time budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Name of the resource to fetch, e.g. a web server host name.
    pub resource: String,
    /// Time budget in whole seconds. Always greater than zero.
    pub budget_secs: u64,
}

impl Request {
    /// Create a new request.
    ///
    /// Fails with [`FetchgramError::BudgetZero`] when `budget_secs` is zero.
    pub fn new(resource: impl Into<String>, budget_secs: u64) -> Result<Self> {
        if budget_secs == 0 {
            return Err(FetchgramError::BudgetZero);
        }
        Ok(Self {
            resource: resource.into(),
            budget_secs,
        })
    }

    /// The time budget as a [`Duration`].
    pub fn budget(&self) -> Duration {
        Duration::from_secs(self.budget_secs)
    }

    /// Parse a request from a datagram.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|_| FetchgramError::malformed_request("not valid UTF-8"))?;

        let (resource, budget) = text
            .split_once(',')
            .ok_or_else(|| FetchgramError::malformed_request("missing ',' separator"))?;

        if resource.is_empty() {
            return Err(FetchgramError::malformed_request("empty resource name"));
        }

        let budget_secs: u64 = budget.trim().parse().map_err(|_| {
            FetchgramError::malformed_request(format!("invalid timer value {budget:?}"))
        })?;

        if budget_secs == 0 {
            return Err(FetchgramError::malformed_request("timer value must be positive"));
        }

        Ok(Self {
            resource: resource.to_string(),
            budget_secs,
        })
    }

    /// Serialize the request to a datagram.
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("{},{}", self.resource, self.budget_secs).into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_roundtrip() {
        let request = Request::new("example.com", 5).unwrap();
        let bytes = request.to_bytes();
        assert_eq!(bytes, b"example.com,5");

        let parsed = Request::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, request);
        assert_eq!(parsed.budget(), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_budget_rejected() {
        assert!(matches!(
            Request::new("example.com", 0),
            Err(FetchgramError::BudgetZero)
        ));
        assert!(Request::from_bytes(b"example.com,0").is_err());
    }

    #[test]
    fn test_missing_separator() {
        let err = Request::from_bytes(b"example.com").unwrap_err();
        assert!(matches!(err, FetchgramError::MalformedRequest(_)));
    }

    #[test]
    fn test_empty_resource() {
        assert!(Request::from_bytes(b",5").is_err());
    }

    #[test]
    fn test_non_numeric_budget() {
        assert!(Request::from_bytes(b"example.com,soon").is_err());
        assert!(Request::from_bytes(b"example.com,-3").is_err());
        assert!(Request::from_bytes(b"example.com,").is_err());
    }

    #[test]
    fn test_budget_whitespace_tolerated() {
        let parsed = Request::from_bytes(b"example.com, 7").unwrap();
        assert_eq!(parsed.budget_secs, 7);
    }

    #[test]
    fn test_resource_split_at_first_comma() {
        // Everything after the first comma is the budget field, so a comma
        // in the resource name makes the budget unparseable.
        assert!(Request::from_bytes(b"a,b,5").is_err());
    }
}
