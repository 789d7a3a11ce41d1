use crate::cli::args::{Command, ParameterOverrides};
use crate::cli::params::{CheckParams, RunParams};
use crate::config::{Config, ItemDefaults, load_config};
use crate::error::MartError;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum ResolvedCommand {
    Run(RunParams),
    Check(CheckParams),
}

pub fn resolve_command(command: Command) -> Result<ResolvedCommand, MartError> {
    match command {
        Command::Run {
            config_path,
            link_files,
            links,
            overrides,
            workers,
            skip_invalid,
            json,
        } => {
            ensure_sources(&link_files, &links)?;

            if workers == Some(0) {
                return Err(MartError::CliArgumentValidation {
                    details: "workers must be greater than 0.".to_string(),
                });
            }

            let mut app_config = match config_path {
                Some(config_path) => {
                    tracing::info!("Loading configuration from {}", config_path);
                    load_config(&config_path)?
                }
                None => Config::default(),
            };
            apply_overrides(&mut app_config.defaults, overrides)?;
            if workers.is_some() {
                app_config.dispatcher.workers = workers;
            }

            Ok(ResolvedCommand::Run(RunParams {
                app_config,
                link_files: link_files.into_iter().map(PathBuf::from).collect(),
                links,
                skip_invalid,
                json,
            }))
        }
        Command::Check {
            link_files,
            links,
            json,
        } => {
            ensure_sources(&link_files, &links)?;

            Ok(ResolvedCommand::Check(CheckParams {
                link_files: link_files.into_iter().map(PathBuf::from).collect(),
                links,
                json,
            }))
        }
    }
}

fn ensure_sources(link_files: &[String], links: &[String]) -> Result<(), MartError> {
    if link_files.is_empty() && links.is_empty() {
        return Err(MartError::CliArgumentValidation {
            details: "No links provided. Pass LINK arguments or --links FILE.".to_string(),
        });
    }
    Ok(())
}

/// Flags replace file values when given; switches can only turn options on.
fn apply_overrides(
    defaults: &mut ItemDefaults,
    overrides: ParameterOverrides,
) -> Result<(), MartError> {
    if let Some(output_path) = overrides.output_path {
        defaults.output_path = Some(output_path);
    }
    if let Some(format) = overrides.output_format {
        defaults.output_format = format.parse()?;
    }
    if let Some(format) = overrides.input_format {
        defaults.input_format = format.parse()?;
    }
    if let Some(mode) = overrides.deduplication {
        defaults.deduplication_type = mode.parse()?;
    }
    if overrides.timeout.is_some() {
        defaults.downloading_timeout = overrides.timeout;
    }
    if !overrides.skip.is_empty() {
        defaults.skip_list = overrides.skip;
    }
    if let Some(images_dir) = overrides.images_dir {
        defaults.images_dir_name = images_dir;
    }
    if let Some(public_path) = overrides.images_public_path {
        defaults.images_public_path = public_path;
    }

    defaults.remove_source |= overrides.remove_source;
    defaults.save_hierarchy |= overrides.save_hierarchy;
    defaults.download_incorrect_mime |= overrides.download_incorrect_mime;
    defaults.skip_all_incorrect |= overrides.skip_all_incorrect;
    Ok(())
}
