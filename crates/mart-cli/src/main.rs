use mart_lib::cli::{ResolvedCommand, parse_args, resolve_command, run_check, run_queue};
use mart_lib::error::MartError;
use mart_lib::logging::{LogEcho, LogSink};

fn main() -> Result<(), MartError> {
    color_eyre::install()?;

    let args = parse_args();
    let log = LogSink::new(args.log_level, LogEcho::Stderr);
    let _guard = log.install();

    let result = resolve_command(args.command).and_then(|command| match command {
        ResolvedCommand::Run(params) => run_queue(params, log.clone()).map(|_| ()),
        ResolvedCommand::Check(params) => run_check(params, log.clone()).map(|_| ()),
    });

    log.flush();
    result
}
