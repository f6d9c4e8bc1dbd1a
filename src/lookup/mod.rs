use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use crate::dataset::{Dataset, LoadError, Loader, Record};
use crate::render::{RenderedRecord, Renderer};

pub const FOUND_NOTICE: &str = "Tìm thấy dữ liệu.";
pub const UNKNOWN_LAST_UPDATED: &str = "(không rõ)";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("Vui lòng nhập mã định danh.")]
    EmptyInput,

    #[error("Chưa có dữ liệu.")]
    NoData,

    #[error("Không tìm thấy mã định danh này.")]
    NotFound { identifier: String },
}

pub fn lookup(dataset: Option<&Dataset>, identifier: &str) -> Result<RenderedRecord, LookupError> {
    lookup_with(&Renderer::default(), dataset, identifier)
}

pub fn lookup_with(
    renderer: &Renderer,
    dataset: Option<&Dataset>,
    identifier: &str,
) -> Result<RenderedRecord, LookupError> {
    find_record(dataset, identifier).map(|record| renderer.render(record))
}

/// Blank input is rejected before the dataset is consulted.
pub fn find_record<'a>(
    dataset: Option<&'a Dataset>,
    identifier: &str,
) -> Result<&'a Record, LookupError> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(LookupError::EmptyInput);
    }
    let dataset = dataset
        .filter(|d| d.has_records())
        .ok_or(LookupError::NoData)?;
    dataset
        .record(identifier)
        .ok_or_else(|| LookupError::NotFound {
            identifier: identifier.to_string(),
        })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusLine {
    Loaded { last_updated: String },
    Failed { message: String },
}

impl StatusLine {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded { last_updated } => write!(f, "Cập nhật lần cuối: {last_updated}"),
            Self::Failed { message } => write!(f, "Lỗi tải dữ liệu: {message}"),
        }
    }
}

/// The dataset loaded at startup (or the reason it is missing) together with the
/// renderer every lookup goes through. Never reloaded.
#[derive(Debug)]
pub struct Session {
    data: Result<Dataset, LoadError>,
    renderer: Renderer,
}

impl Session {
    pub fn new(data: Result<Dataset, LoadError>, renderer: Renderer) -> Self {
        Self { data, renderer }
    }

    pub async fn start(loader: &Loader, renderer: Renderer) -> Self {
        let data = loader.load().await;
        if let Err(e) = data.as_ref() {
            warn!(source = %loader.source().display_name(), error = %e, "dataset load failed");
        }
        Self::new(data, renderer)
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.data.as_ref().ok()
    }

    pub fn load_error(&self) -> Option<&LoadError> {
        self.data.as_ref().err()
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn status_line(&self) -> StatusLine {
        match &self.data {
            Ok(dataset) => StatusLine::Loaded {
                last_updated: dataset
                    .last_updated_label()
                    .unwrap_or_else(|| UNKNOWN_LAST_UPDATED.to_string()),
            },
            Err(e) => StatusLine::Failed {
                message: e.to_string(),
            },
        }
    }

    /// HTML-escaped result, ready for markup.
    pub fn submit(&self, input: &str) -> Result<RenderedRecord, LookupError> {
        self.find(input).map(|record| self.renderer.render(record))
    }

    /// Unescaped result for terminal and JSON output.
    pub fn submit_plain(&self, input: &str) -> Result<RenderedRecord, LookupError> {
        self.find(input).map(|record| self.renderer.render_plain(record))
    }

    fn find(&self, input: &str) -> Result<&Record, LookupError> {
        let result = find_record(self.dataset(), input);
        debug!(identifier = input.trim(), ok = result.is_ok(), "lookup");
        result
    }
}
