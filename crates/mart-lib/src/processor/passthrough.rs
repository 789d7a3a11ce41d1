use super::{ArticleProcessor, ProcessRequest, ProcessorError};
use crate::params::OutputFormat;
use crate::utils::is_url;
use std::path::{Path, PathBuf};

const DEFAULT_DOCUMENT_STEM: &str = "index";

/// Copies a Markdown source, local or remote, into the output location
/// without rewriting it. Image capture is not performed.
#[derive(Clone, Debug, Default)]
pub struct PassthroughProcessor;

impl PassthroughProcessor {
    pub fn new() -> Self {
        Self
    }

    fn fetch(&self, request: &ProcessRequest) -> Result<String, ProcessorError> {
        let url = &request.article_file_path_or_url;
        let fetch_error = |e: reqwest::Error| ProcessorError::Fetch {
            url: url.clone(),
            reason: e.to_string(),
        };

        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = request.downloading_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(fetch_error)?;

        client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(fetch_error)
    }

    fn read_local(&self, request: &ProcessRequest) -> Result<String, ProcessorError> {
        std::fs::read_to_string(&request.article_file_path_or_url).map_err(|e| {
            ProcessorError::SourceRead {
                source_path: request.article_file_path_or_url.clone(),
                reason: e.to_string(),
            }
        })
    }
}

impl ArticleProcessor for PassthroughProcessor {
    fn process(&self, request: &ProcessRequest) -> Result<Option<PathBuf>, ProcessorError> {
        if request.output_format != OutputFormat::Md {
            return Err(ProcessorError::UnsupportedFormat {
                format: request.output_format,
            });
        }

        let remote = is_url(&request.article_file_path_or_url);
        let content = if remote {
            self.fetch(request)?
        } else {
            self.read_local(request)?
        };

        let output_file = output_file_path(request, remote);
        if let Some(parent) = output_file.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ProcessorError::Write {
                path: parent.to_path_buf(),
                reason: e.to_string(),
            })?;
        }
        std::fs::write(&output_file, content).map_err(|e| ProcessorError::Write {
            path: output_file.clone(),
            reason: e.to_string(),
        })?;
        tracing::debug!(output = %output_file.display(), "Document written");

        if request.remove_source && !remote {
            let source = Path::new(&request.article_file_path_or_url);
            if source != output_file {
                std::fs::remove_file(source).map_err(|e| ProcessorError::Write {
                    path: source.to_path_buf(),
                    reason: format!("failed to remove source: {e}"),
                })?;
            }
        }

        Ok(Some(output_file))
    }
}

/// Where the document for `request` is written.
///
/// An output path ending in `.md` names the file itself; anything else is a
/// directory that receives `<source stem>.md`, nested under the source's own
/// directories when `save_hierarchy` is set.
fn output_file_path(request: &ProcessRequest, remote: bool) -> PathBuf {
    let output = &request.output_path;
    if output.extension().is_some_and(|ext| ext == "md") {
        return output.clone();
    }

    let (hierarchy, stem) = if remote {
        split_url_source(&request.article_file_path_or_url)
    } else {
        split_local_source(Path::new(&request.article_file_path_or_url))
    };

    let mut target = output.clone();
    if request.save_hierarchy {
        target.push(hierarchy);
    }
    target.push(format!("{stem}.{}", OutputFormat::Md));
    target
}

fn split_local_source(source: &Path) -> (PathBuf, String) {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_DOCUMENT_STEM.to_string());
    let hierarchy = source
        .parent()
        .filter(|p| p.is_relative())
        .map(Path::to_path_buf)
        .unwrap_or_default();
    (hierarchy, stem)
}

fn split_url_source(source: &str) -> (PathBuf, String) {
    let Ok(parsed) = url::Url::parse(source) else {
        return (PathBuf::new(), DEFAULT_DOCUMENT_STEM.to_string());
    };

    let mut hierarchy = PathBuf::from(parsed.host_str().unwrap_or_default());
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let stem = match segments.split_last() {
        Some((last, dirs)) => {
            hierarchy.extend(dirs);
            Path::new(last)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| DEFAULT_DOCUMENT_STEM.to_string())
        }
        None => DEFAULT_DOCUMENT_STEM.to_string(),
    };
    (hierarchy, stem)
}
