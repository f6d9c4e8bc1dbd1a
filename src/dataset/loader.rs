use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA, USER_AGENT};
use reqwest::Url;
use thiserror::Error;
use tracing::{debug, info};

use super::Dataset;

/// Query parameter carrying the cache-busting timestamp.
pub const CACHE_BUST_PARAM: &str = "v";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSource {
    Remote(Url),
    File(PathBuf),
}

impl DataSource {
    /// `http(s)://` and `file://` URLs are recognised; anything else is a local path.
    pub fn parse(raw: &str) -> Result<Self, LoadError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(LoadError::InvalidSource {
                raw: raw.to_string(),
            });
        }
        match Url::parse(raw) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(Self::Remote(url)),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(Self::File)
                .map_err(|_| LoadError::InvalidSource {
                    raw: raw.to_string(),
                }),
            _ => Ok(Self::File(PathBuf::from(raw))),
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Self::Remote(url) => url.to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid data source: '{raw}'")]
    InvalidSource { raw: String },

    #[error("Không tải được dữ liệu (HTTP {status})")]
    Status { url: String, status: u16 },

    #[error("Không tải được dữ liệu: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Không đọc được tệp dữ liệu {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Dữ liệu không đúng định dạng JSON: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Clone, Debug)]
pub struct LoaderOptions {
    /// No timeout unless set; a slow source is waited on.
    pub timeout_seconds: Option<u64>,
    pub proxy: Option<String>,
    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` from the environment.
    pub system_proxy: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: None,
            proxy: None,
            system_proxy: true,
        }
    }
}

/// Fetches the grade book once per call. The caller owns the result.
#[derive(Clone, Debug)]
pub struct Loader {
    source: DataSource,
    client: reqwest::Client,
}

impl Loader {
    pub fn new(source: DataSource, options: &LoaderOptions) -> Result<Self, LoadError> {
        let client = build_client(options)?;
        Ok(Self { source, client })
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub async fn load(&self) -> Result<Dataset, LoadError> {
        let dataset = match &self.source {
            DataSource::Remote(url) => fetch_remote(&self.client, url).await?,
            DataSource::File(path) => read_file(path).await?,
        };
        info!(
            source = %self.source.display_name(),
            records = dataset.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }
}

/// Appends `v=<stamp>` so intermediaries never serve a stale copy.
pub fn cache_busted_url(base: &Url, stamp_millis: i64) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair(CACHE_BUST_PARAM, &stamp_millis.to_string());
    url
}

fn build_client(options: &LoaderOptions) -> Result<reqwest::Client, LoadError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("gradelookup/", env!("CARGO_PKG_VERSION"))),
    );

    let mut builder = reqwest::Client::builder().default_headers(headers);
    if let Some(seconds) = options.timeout_seconds {
        builder = builder.timeout(Duration::from_secs(seconds));
    }
    if !options.system_proxy {
        builder = builder.no_proxy();
    }
    if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| LoadError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| LoadError::ClientBuild { source: e })
}

async fn fetch_remote(client: &reqwest::Client, base: &Url) -> Result<Dataset, LoadError> {
    let url = cache_busted_url(base, chrono::Utc::now().timestamp_millis());
    debug!(%url, "fetching dataset");

    let resp = client
        .get(url)
        .header(CACHE_CONTROL, "no-store")
        .header(PRAGMA, "no-cache")
        .send()
        .await
        .map_err(|e| LoadError::Request {
            url: base.to_string(),
            source: e,
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(LoadError::Status {
            url: base.to_string(),
            status: status.as_u16(),
        });
    }

    let body = resp.bytes().await.map_err(|e| LoadError::Request {
        url: base.to_string(),
        source: e,
    })?;
    debug!(bytes = body.len(), "dataset body received");
    Dataset::from_json_slice(&body).map_err(|e| LoadError::Parse { source: e })
}

async fn read_file(path: &Path) -> Result<Dataset, LoadError> {
    debug!(path = %path.display(), "reading dataset file");
    let body = tokio::fs::read(path).await.map_err(|e| LoadError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    Dataset::from_json_slice(&body).map_err(|e| LoadError::Parse { source: e })
}
