use crate::config::Config;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RunParams {
    pub app_config: Config,
    pub link_files: Vec<PathBuf>,
    pub links: Vec<String>,
    pub skip_invalid: bool,
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct CheckParams {
    pub link_files: Vec<PathBuf>,
    pub links: Vec<String>,
    pub json: bool,
}
