use eyre::Result;
use mart_lib::config::{Config, DispatcherConfig, ItemDefaults};
use mart_lib::params::OutputFormat;
use mart_lib::processor::{ArticleProcessor, ProcessRequest, ProcessorError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

pub const VALID_URL: &str = "https://valid.example/a.md";
pub const MISSING_PATH: &str = "/nonexistent/path";

pub fn create_test_config(output_dir: &Path) -> Config {
    Config {
        defaults: ItemDefaults {
            output_path: Some(output_dir.to_string_lossy().into_owned()),
            output_format: OutputFormat::Md,
            downloading_timeout: Some(30),
            skip_list: vec!["tracker.gif".to_string()],
            ..ItemDefaults::default()
        },
        dispatcher: DispatcherConfig { workers: Some(2) },
    }
}

/// A temp dir holding `config.json`, a local `local.md` article and a
/// `links.txt` listing a URL, a blank line, a missing path and the article.
pub fn setup_test_environment() -> Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;

    let config = create_test_config(&temp_dir.path().join("out"));
    let config_path = temp_dir.path().join("config.json");
    std::fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;

    let article = temp_dir.path().join("local.md");
    std::fs::write(&article, "# Local article\n\nBody.\n")?;

    std::fs::write(
        temp_dir.path().join("links.txt"),
        format!("{VALID_URL}\n\n{MISSING_PATH}\n{}\n", article.display()),
    )?;

    Ok(temp_dir)
}

#[derive(Clone, Debug)]
pub enum Script {
    Produce(PathBuf),
    NoOutput,
    Fail(String),
    Panic,
    /// Sleeps, then produces the path.
    Slow(Duration, PathBuf),
}

/// Answers each source with a scripted outcome and records every request.
/// Unscripted sources fail with a source-read error.
#[derive(Default)]
pub struct ScriptedProcessor {
    scripts: HashMap<String, Script>,
    requests: Mutex<Vec<ProcessRequest>>,
}

impl ScriptedProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: &str, script: Script) -> Self {
        self.scripts.insert(source.to_string(), script);
        self
    }

    pub fn requests(&self) -> Vec<ProcessRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl ArticleProcessor for ScriptedProcessor {
    fn process(&self, request: &ProcessRequest) -> Result<Option<PathBuf>, ProcessorError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        match self.scripts.get(&request.article_file_path_or_url) {
            Some(Script::Produce(path)) => Ok(Some(path.clone())),
            Some(Script::NoOutput) => Ok(None),
            Some(Script::Fail(reason)) => Err(ProcessorError::Other(reason.clone())),
            Some(Script::Panic) => panic!("scripted panic for {}", request.article_file_path_or_url),
            Some(Script::Slow(delay, path)) => {
                std::thread::sleep(*delay);
                Ok(Some(path.clone()))
            }
            None => Err(ProcessorError::SourceRead {
                source_path: request.article_file_path_or_url.clone(),
                reason: "not scripted".to_string(),
            }),
        }
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("mart_lib=debug,mart_e2e_tests=debug")
        .with_test_writer()
        .try_init()
        .ok();
}
