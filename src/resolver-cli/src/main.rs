use anyhow::{Context, Result};
use clap::Parser;
use daap_provider::DaapSession;
use resolver_core::{
    init_logging, AppDirs, Catalog, Config, ConfigError, LogLevel, StaticCatalog,
};
use resolver_protocol::{
    Dispatcher, FrameReader, FrameWriter, LoopExit, Outbound, RequestLoop, Settings,
};
use resolver_search::CandidateSearcher;
use std::io::{StdoutLock, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Span;

/// Exit status when the host sends a frame length over the limit.
const EXIT_PROTOCOL_ERROR: u8 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "daap-resolver",
    version,
    about = "Resolves playback queries against a DAAP share over stdio"
)]
struct Cli {
    /// Config file (defaults to config.toml in the config directory)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Keep config and logs under this directory instead of the platform defaults
    #[arg(long)]
    state_dir: Option<PathBuf>,
    /// DAAP share host (takes precedence over config)
    #[arg(long)]
    host: Option<String>,
    /// DAAP share port (takes precedence over config)
    #[arg(long)]
    port: Option<u16>,
    /// Serve tracks from a JSON catalog file instead of a live share
    #[arg(long)]
    catalog_file: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_parser = parse_log_level)]
    log_level: Option<LogLevel>,
    /// Mirror log lines to stderr
    #[arg(long)]
    log_stderr: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.daap.host = host.clone();
        }
        if let Some(port) = self.port {
            config.daap.port = port;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if self.log_stderr {
            config.logging.stderr = true;
        }
    }

    fn app_dirs(&self) -> Result<AppDirs> {
        Ok(match &self.state_dir {
            Some(root) => AppDirs::rooted_at(root),
            None => AppDirs::discover()?,
        })
    }

    fn load_config(&self, dirs: &AppDirs) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load_or_default(dirs)?,
        };
        self.apply_overrides(&mut config);
        config.validate().map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

fn parse_log_level(value: &str) -> Result<LogLevel, String> {
    match value.to_ascii_lowercase().as_str() {
        "trace" => Ok(LogLevel::Trace),
        "debug" => Ok(LogLevel::Debug),
        "info" => Ok(LogLevel::Info),
        "warn" => Ok(LogLevel::Warn),
        "error" => Ok(LogLevel::Error),
        other => Err(format!("unknown log level '{other}'")),
    }
}

fn exit_status(exit: LoopExit) -> u8 {
    match exit {
        LoopExit::Shutdown | LoopExit::Closed => 0,
        LoopExit::Oversized(_) => EXIT_PROTOCOL_ERROR,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("daap-resolver: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let dirs = cli.app_dirs()?;
    let config = cli.load_config(&dirs)?;
    let _logging = init_logging(&config.logging, dirs.log_dir())?;

    let span = tracing::info_span!("resolver", name = %config.resolver.name);
    tracing::info!(parent: &span, "Started");

    // The host learns who we are before the catalog is fetched.
    let mut writer = FrameWriter::new(std::io::stdout().lock());
    writer
        .send(&Outbound::Settings(Settings::from(&config.resolver)))
        .context("failed to announce settings")?;

    let result = serve(cli, &config, writer, &span);
    match &result {
        Ok(_) => tracing::info!(parent: &span, "Stopped"),
        Err(err) => tracing::error!(parent: &span, error = %format!("{err:#}"), "Stopped on error"),
    }
    result
}

fn serve(
    cli: &Cli,
    config: &Config,
    writer: FrameWriter<StdoutLock<'static>>,
    span: &Span,
) -> Result<ExitCode> {
    // The share session must outlive the loop: stream URLs embed its id.
    let (catalog, _session) = match &cli.catalog_file {
        Some(path) => {
            let provider = StaticCatalog::from_json_file(path)?;
            (Catalog::load(&provider)?, None)
        }
        None => {
            let session = DaapSession::connect(&config.daap).with_context(|| {
                format!(
                    "failed to connect to DAAP share at {}:{}",
                    config.daap.host, config.daap.port
                )
            })?;
            let catalog = Catalog::load(&session).context("failed to fetch catalog")?;
            (catalog, Some(session))
        }
    };
    tracing::info!(parent: span, tracks = catalog.len(), "Got tracks");

    let searcher = CandidateSearcher::new(&catalog, tracing::info_span!(parent: span, "search"));
    let mut server = RequestLoop::new(
        FrameReader::new(std::io::stdin().lock()),
        writer,
        Dispatcher::new(searcher),
        span.clone(),
    );
    let exit = server.run()?;
    server.into_writer().into_inner().flush()?;
    Ok(ExitCode::from(exit_status(exit)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "daap-resolver",
            "--host",
            "10.0.73.1",
            "--port",
            "3690",
            "--log-level",
            "DEBUG",
            "--log-stderr",
        ])
        .expect("flags should parse");

        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.daap.host, "10.0.73.1");
        assert_eq!(config.daap.port, 3690);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.logging.stderr);
    }

    #[test]
    fn no_flags_keep_config() {
        let cli = Cli::try_parse_from(["daap-resolver"]).unwrap();
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.daap.host, "127.0.0.1");
        assert!(!config.logging.stderr);
    }

    #[test]
    fn bad_log_level_is_rejected() {
        assert!(Cli::try_parse_from(["daap-resolver", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn zero_port_override_fails_validation() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "daap-resolver",
            "--state-dir",
            tmp.path().to_str().unwrap(),
            "--port",
            "0",
        ])
        .unwrap();
        let dirs = cli.app_dirs().unwrap();
        assert!(cli.load_config(&dirs).is_err());
    }

    #[test]
    fn exit_codes_distinguish_protocol_errors() {
        assert_eq!(exit_status(LoopExit::Shutdown), 0);
        assert_eq!(exit_status(LoopExit::Closed), 0);
        assert_eq!(exit_status(LoopExit::Oversized(5000)), EXIT_PROTOCOL_ERROR);
    }
}
