use thiserror::Error;
use url::Url;

/// Number of articles a batch processes when the caller names no limit.
pub const DEFAULT_BATCH_LIMIT: usize = 10;
/// Number of links discovery returns when the caller names no limit.
pub const DEFAULT_DISCOVERY_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("url must be absolute: {0}")]
    RelativeUrl(String),
    #[error("article limit must be at least 1")]
    ZeroLimit,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Entry page of a blog plus the maximum number of articles to take from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedRequest {
    origin: Url,
    limit: usize,
}

impl SeedRequest {
    pub fn new(origin: &str, limit: usize) -> Result<Self, RequestError> {
        if limit == 0 {
            return Err(RequestError::ZeroLimit);
        }
        let origin = parse_absolute(origin)?;
        Ok(Self { origin, limit })
    }

    /// Seed with the discovery default of [`DEFAULT_DISCOVERY_LIMIT`] links.
    pub fn with_default_limit(origin: &str) -> Result<Self, RequestError> {
        Self::new(origin, DEFAULT_DISCOVERY_LIMIT)
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

fn parse_absolute(raw: &str) -> Result<Url, RequestError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RequestError::MissingField("url"));
    }
    match Url::parse(trimmed) {
        Ok(url) if url.has_host() => Ok(url),
        Ok(url) => Err(RequestError::InvalidUrl {
            url: url.to_string(),
            reason: "url has no host".to_string(),
        }),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Err(RequestError::RelativeUrl(trimmed.to_string()))
        }
        Err(err) => Err(RequestError::InvalidUrl {
            url: trimmed.to_string(),
            reason: err.to_string(),
        }),
    }
}

/// Everything the orchestrator needs for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub seed: SeedRequest,
    pub destination: String,
}

impl BatchRequest {
    /// Validates raw caller input. A missing `limit` falls back to `default_limit`.
    pub fn new(
        blog_url: &str,
        destination: &str,
        limit: Option<usize>,
        default_limit: usize,
    ) -> Result<Self, RequestError> {
        if blog_url.trim().is_empty() {
            return Err(RequestError::MissingField("blogUrl"));
        }
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(RequestError::MissingField("kindleEmail"));
        }
        let seed = SeedRequest::new(blog_url, limit.unwrap_or(default_limit))?;
        Ok(Self {
            seed,
            destination: destination.to_string(),
        })
    }
}
