use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use tracing::Level;

/// Per-item settings given on the command line. Unset values fall back to
/// the configuration file, then to built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct ParameterOverrides {
    pub output_path: Option<String>,
    pub output_format: Option<String>,
    pub input_format: Option<String>,
    pub deduplication: Option<String>,
    pub timeout: Option<i64>,
    pub skip: Vec<String>,
    pub images_dir: Option<String>,
    pub images_public_path: Option<String>,
    pub remove_source: bool,
    pub save_hierarchy: bool,
    pub download_incorrect_mime: bool,
    pub skip_all_incorrect: bool,
}

#[derive(Debug, Clone)]
pub enum Command {
    Run {
        config_path: Option<String>,
        link_files: Vec<String>,
        links: Vec<String>,
        overrides: ParameterOverrides,
        workers: Option<usize>,
        skip_invalid: bool,
        json: bool,
    },
    Check {
        link_files: Vec<String>,
        links: Vec<String>,
        json: bool,
    },
}

pub struct Args {
    pub command: Command,
    pub log_level: Level,
}

#[derive(Debug, Parser)]
#[command(
    name = "mart",
    version,
    about = "Queue links and local files and convert them into Markdown articles"
)]
struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Sets the level of verbosity",
        action = ArgAction::Count,
        global = true
    )]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, ClapArgs)]
struct SourceArgs {
    #[arg(
        short = 'l',
        long = "links",
        value_name = "FILE",
        help = "Reads links from a file, one path or URL per line (repeatable)",
        action = ArgAction::Append
    )]
    link_files: Vec<String>,

    #[arg(value_name = "LINK", help = "Paths or URLs to queue")]
    links: Vec<String>,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Convert every queued link and report per-item results
    Run {
        #[command(flatten)]
        sources: SourceArgs,

        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Configuration file with item defaults and dispatcher settings"
        )]
        config: Option<String>,

        #[arg(
            short = 'o',
            long = "output-path",
            value_name = "PATH",
            help = "Output directory, or a .md file name"
        )]
        output_path: Option<String>,

        #[arg(long = "output-format", value_name = "FORMAT", help = "md, html or pdf")]
        output_format: Option<String>,

        #[arg(long = "input-format", value_name = "FORMAT", help = "md or html")]
        input_format: Option<String>,

        #[arg(
            long = "dedup",
            value_name = "MODE",
            help = "Image deduplication: disabled, by-content or by-filename"
        )]
        deduplication: Option<String>,

        #[arg(
            long = "timeout",
            value_name = "SECS",
            help = "Download timeout in seconds; negative disables it",
            allow_negative_numbers = true
        )]
        timeout: Option<i64>,

        #[arg(
            long = "skip",
            value_name = "PATTERN",
            help = "Image file name or URL fragment to skip (repeatable)",
            action = ArgAction::Append
        )]
        skip: Vec<String>,

        #[arg(long = "images-dir", value_name = "NAME", help = "Directory name for downloaded images")]
        images_dir: Option<String>,

        #[arg(
            long = "images-public-path",
            value_name = "PATH",
            help = "Path prefix used for images inside the document"
        )]
        images_public_path: Option<String>,

        #[arg(long = "remove-source", help = "Delete local sources after conversion")]
        remove_source: bool,

        #[arg(long = "save-hierarchy", help = "Keep the source directory layout under the output path")]
        save_hierarchy: bool,

        #[arg(long = "download-incorrect-mime", help = "Download images with unrecognized MIME types")]
        download_incorrect_mime: bool,

        #[arg(long = "skip-all-incorrect", help = "Skip every image that fails to download")]
        skip_all_incorrect: bool,

        #[arg(long = "workers", value_name = "N", help = "Worker threads (default: CPU count + 1)")]
        workers: Option<usize>,

        #[arg(long = "skip-invalid", help = "Drop entries that are neither URLs nor existing files")]
        skip_invalid: bool,

        #[arg(long = "json", help = "Print the run summary as JSON")]
        json: bool,
    },

    /// Load and validate links without converting them
    Check {
        #[command(flatten)]
        sources: SourceArgs,

        #[arg(long = "json", help = "Print the queue as JSON")]
        json: bool,
    },
}

pub fn parse_args() -> Args {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let command = match cli.command {
        CliCommand::Run {
            sources,
            config,
            output_path,
            output_format,
            input_format,
            deduplication,
            timeout,
            skip,
            images_dir,
            images_public_path,
            remove_source,
            save_hierarchy,
            download_incorrect_mime,
            skip_all_incorrect,
            workers,
            skip_invalid,
            json,
        } => Command::Run {
            config_path: config,
            link_files: sources.link_files,
            links: sources.links,
            overrides: ParameterOverrides {
                output_path,
                output_format,
                input_format,
                deduplication,
                timeout,
                skip,
                images_dir,
                images_public_path,
                remove_source,
                save_hierarchy,
                download_incorrect_mime,
                skip_all_incorrect,
            },
            workers,
            skip_invalid,
            json,
        },
        CliCommand::Check { sources, json } => Command::Check {
            link_files: sources.link_files,
            links: sources.links,
            json,
        },
    };

    Args { command, log_level }
}
