//! `convert` handler: a minimal editor host
//!
//! Starts the configured server, opens one document, runs a single
//! conversion command through the dispatcher and writes out the result.
//! The server is killed when the handler returns; there is no restart or
//! supervision.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, bail};
use colored::Colorize;
use universal_connector::{
    CommandDispatcher, ConversionOutput, ConvertCommand, Document, DocumentId, RpcSession,
    ServerConfig, SessionRegistry,
};
use url::Url;

use super::args::Args;

/// Load the configuration: explicit file, then discovery, then defaults
pub(crate) fn load_config(
    explicit: Option<&Path>,
    search_from: Option<&Path>,
) -> universal_connector::Result<ServerConfig> {
    let config = match (explicit, search_from) {
        (Some(path), _) => ServerConfig::from_file(path)?,
        (None, Some(dir)) => ServerConfig::discover(dir).unwrap_or_default(),
        (None, None) => ServerConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

pub(crate) async fn run_convert(
    args: &Args,
    command: ConvertCommand,
    file: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let path = std::fs::canonicalize(file)
        .with_context(|| format!("cannot open {}", file.display()))?;
    let config = load_config(args.config.as_deref(), path.parent())?;

    if !config.enabled {
        bail!("the server is disabled in the configuration");
    }

    let language = config
        .language_for_path(&path)
        .with_context(|| format!("no configured language handles {}", path.display()))?;
    let scope = language.scope().unwrap_or_default().to_string();
    if !config.selector.matches(&scope) {
        bail!("'{}' is not matched by selector '{}'", scope, config.selector);
    }

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let uri = Url::from_file_path(&path)
        .map_err(|()| anyhow::anyhow!("cannot build a URI for {}", path.display()))?;

    let (program, program_args) = config
        .command
        .split_first()
        .context("the configuration has no server command")?;
    let mut child = tokio::process::Command::new(program)
        .args(program_args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to start '{}'", program))?;
    let stdout = child.stdout.take().context("server stdout not captured")?;
    let stdin = child.stdin.take().context("server stdin not captured")?;

    let session = Arc::new(RpcSession::new(args.server_id.clone(), stdout, stdin));
    let root = path.parent().and_then(|dir| Url::from_directory_path(dir).ok());
    session
        .initialize(root)
        .await
        .context("server initialization failed")?;
    session.did_open(uri.clone(), &language.language_id, text)?;

    let registry = Arc::new(SessionRegistry::new());
    registry.register(session.clone(), config.selector.clone());
    let document = Document::new(DocumentId(1), uri, scope);
    registry.attach(&args.server_id, &document);

    let dispatcher = CommandDispatcher::new(Arc::clone(&registry), args.server_id.clone());
    let pending = dispatcher
        .run_with_result(command, &document)
        .context("no session is bound to the document")?;
    let result = pending
        .await
        .with_context(|| format!("{} failed", command))?;

    if let Err(e) = session.shutdown().await {
        log::warn!("server shutdown failed: {}", e);
    }

    let rendered = match result.as_ref().and_then(ConversionOutput::from_result) {
        Some(converted) => {
            for warning in &converted.warnings {
                eprintln!("{} {}", "warning:".yellow().bold(), warning);
            }
            converted.content
        }
        None => serde_json::to_string_pretty(&result)?,
    };

    match output {
        Some(out) => {
            std::fs::write(out, &rendered)
                .with_context(|| format!("cannot write {}", out.display()))?;
            log::info!("wrote {}", out.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}
