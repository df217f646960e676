//! Origin lookup capability.
//!
//! The responder treats content retrieval as an opaque capability behind
//! the [`ResourceFetch`] trait. The default implementation issues a
//! blocking HTTP GET; tests substitute closures.

use bytes::Bytes;

use crate::error::Result;

/// Fetches the content of a named resource.
pub trait ResourceFetch: Send + Sync {
    /// Look up `resource` and return its content.
    ///
    /// Fails with [`crate::FetchgramError::Fetch`] when the origin is
    /// unavailable.
    fn fetch(&self, resource: &str) -> Result<Bytes>;
}

impl<F> ResourceFetch for F
where
    F: Fn(&str) -> Result<Bytes> + Send + Sync,
{
    fn fetch(&self, resource: &str) -> Result<Bytes> {
        self(resource)
    }
}

#[cfg(feature = "http")]
pub use self::http::HttpFetcher;

#[cfg(feature = "http")]
mod http {
    use std::io;
    use std::time::Duration;

    use bytes::Bytes;

    use crate::error::{FetchgramError, Result};

    use super::ResourceFetch;

    /// Overall deadline for one origin request.
    const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

    /// Fetches resources with a blocking HTTP GET.
    ///
    /// Bare host names are fetched as `https://<resource>`; names that
    /// already carry a scheme are used as-is.
    #[derive(Debug, Clone)]
    pub struct HttpFetcher {
        client: reqwest::blocking::Client,
    }

    impl HttpFetcher {
        /// Create a fetcher with the default request timeout.
        pub fn new() -> Result<Self> {
            let client = reqwest::blocking::Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .map_err(|e| FetchgramError::Io(io::Error::other(e)))?;
            Ok(Self { client })
        }
    }

    impl ResourceFetch for HttpFetcher {
        fn fetch(&self, resource: &str) -> Result<Bytes> {
            let url = if resource.contains("://") {
                resource.to_string()
            } else {
                format!("https://{resource}")
            };

            let response = self
                .client
                .get(&url)
                .send()
                .map_err(|e| FetchgramError::fetch(resource, e.to_string()))?;

            if !response.status().is_success() {
                return Err(FetchgramError::fetch(
                    resource,
                    format!("HTTP status {}", response.status()),
                ));
            }

            response
                .bytes()
                .map_err(|e| FetchgramError::fetch(resource, e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchgramError;

    #[test]
    fn test_closure_fetch() {
        let fetch = |resource: &str| Ok(Bytes::from(format!("content of {resource}")));
        assert_eq!(fetch.fetch("example.com").unwrap(), "content of example.com");
    }

    #[test]
    fn test_closure_fetch_error() {
        let fetch = |resource: &str| -> Result<Bytes> {
            Err(FetchgramError::fetch(resource, "origin unavailable"))
        };
        assert!(fetch.fetch("example.com").is_err());
    }
}
