// Cluster Wizard
// Main library entry point

pub mod api;
pub mod config;
pub mod i18n;
pub mod models;
pub mod tui;
pub mod utils;
pub mod wizard;

use crate::config::{LoggingSettings, WizardSettings};
use crate::i18n::Messages;
use crate::models::context::{FlowKind, LaunchParams, WizardContext};
use crate::wizard::schema::StepId;
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;

/// How the binary was asked to open the wizard.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub config: Option<PathBuf>,
    pub flow: Option<String>,
    pub import: bool,
    pub launch: LaunchParams,
    /// Start on this step instead of the flow's first one.
    pub step: Option<String>,
}

/// Initialize logging system with dual format (JSON + human-readable)
fn init_logging(with_stdout: bool, settings: &LoggingSettings) -> anyhow::Result<()> {
    let log_dir = utils::path_resolver::resolve_log_folder(settings.dir.as_deref())?;

    let timestamp = chrono::Utc::now().format("%Y-%m-%d-%H%M%S");

    // JSON log file for structured parsing
    let json_log_file = log_dir.join(format!("cluster-wizard-{}.log", timestamp));

    // Human-readable log file (.txt)
    let txt_log_file = log_dir.join(format!("cluster-wizard-{}.txt", timestamp));

    // stdout stays off under the TUI
    let mut dispatch = fern::Dispatch::new().level(settings.level_filter());

    if with_stdout {
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}", txt_line));
                })
                .chain(std::io::stdout()),
        );
    }

    dispatch = dispatch
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_utc = chrono::Utc::now().to_rfc3339();
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let json_line = utils::logging::format_json_log(
                        &timestamp_utc,
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                        None,
                    );
                    out.finish(format_args!("{}\n", json_line));
                })
                .chain(fern::log_file(json_log_file)?),
        )
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}\n", txt_line));
                })
                .chain(fern::log_file(txt_log_file)?),
        );

    dispatch.apply()?;

    log::info!(
        "[PHASE: initialization] Logging initialized, log directory: {:?}",
        log_dir
    );
    Ok(())
}

/// Settings plus logging. Logging failures are reported and ignored.
fn bootstrap(config: Option<&std::path::Path>, with_stdout: bool) -> anyhow::Result<WizardSettings> {
    let settings = WizardSettings::load(config)?;
    if let Err(e) = init_logging(with_stdout, &settings.logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }
    info!(
        "[PHASE: initialization] Cluster wizard starting at {}",
        chrono::Utc::now()
    );
    info!(
        "[PHASE: initialization] [STEP: config] Server: {}",
        utils::logging::redact_url(&settings.server.base_url)
    );
    Ok(settings)
}

fn build_context(opts: &LaunchOptions) -> anyhow::Result<(WizardContext, Option<StepId>)> {
    let flow_name = opts.flow.as_deref().unwrap_or("cluster");
    let flow = FlowKind::parse(flow_name)
        .ok_or_else(|| anyhow::anyhow!("Unknown wizard '{}' (expected s3, catalog, cluster or driver)", flow_name))?;
    let entry = match opts.step.as_deref() {
        Some(s) => Some(
            StepId::parse(s).ok_or_else(|| anyhow::anyhow!("Unknown step '{}'", s))?,
        ),
        None => None,
    };
    let ctx = WizardContext::launched(flow, opts.import, opts.launch.clone());
    Ok((ctx, entry))
}

fn launch_tui(opts: LaunchOptions) -> anyhow::Result<()> {
    let settings = bootstrap(opts.config.as_deref(), false)?;
    let messages = Arc::new(Messages::load(settings.i18n.messages_file.as_deref())?);
    let backend = api::Backend::http(&settings)?;
    let (ctx, entry) = build_context(&opts)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    tui::run(tui::TuiOptions {
        ctx,
        entry,
        backend,
        messages,
        runtime: runtime.handle().clone(),
    })
}

/// Interactive terminal wizard
pub fn run_tui(opts: LaunchOptions) {
    if let Err(e) = launch_tui(opts) {
        error!("[PHASE: tui] [STEP: fatal] TUI exited with error: {:?}", e);
        eprintln!("Cluster wizard error: {}", e);
        std::process::exit(1);
    }
}

/// Non-interactive TUI smoke mode (for automated checks).
/// Renders a single frame and exits.
pub fn run_tui_smoke(config: Option<PathBuf>, target: Option<String>) {
    if let Err(e) = bootstrap(config.as_deref(), false) {
        eprintln!("Cluster wizard error: {}", e);
        std::process::exit(1);
    }

    let target = target.as_deref().unwrap_or("intro");
    if let Err(e) = tui::smoke(target) {
        error!(
            "[PHASE: tui] [STEP: smoke] TUI smoke exited with error: {:?}",
            e
        );
        eprintln!("Cluster wizard error: {}", e);
        std::process::exit(1);
    }
}

async fn probe(settings: &WizardSettings) -> anyhow::Result<()> {
    let backend = api::Backend::http(settings)?;

    let shims = backend.cluster.shim_identifiers().await?;
    println!("Shims available: {}", shims.len());
    for s in &shims {
        println!("  {} {} ({})", s.vendor, s.version, s.id);
    }

    let secure = backend.cluster.secure_enabled().await?;
    println!("Security configuration enabled: {}", secure);
    Ok(())
}

/// Non-interactive backend probe: lists shims and the security flag, exits 0/1.
pub fn run_probe(config: Option<PathBuf>) {
    let settings = match bootstrap(config.as_deref(), true) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Cluster wizard error: {}", e);
            std::process::exit(1);
        }
    };

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(anyhow::Error::from)
        .and_then(|rt| rt.block_on(probe(&settings)));

    match result {
        Ok(()) => info!("[PHASE: probe] [STEP: done] Backend probe passed"),
        Err(e) => {
            error!("[PHASE: probe] [STEP: fatal] Backend probe failed: {:?}", e);
            eprintln!("Backend probe failed: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_follows_the_launch_options() {
        let opts = LaunchOptions {
            flow: Some("s3".into()),
            launch: LaunchParams {
                name: Some("lake".into()),
                ..LaunchParams::default()
            },
            ..LaunchOptions::default()
        };

        let (ctx, entry) = build_context(&opts).expect("context");

        assert_eq!(ctx.flow, FlowKind::S3);
        assert_eq!(ctx.launch.name.as_deref(), Some("lake"));
        assert!(entry.is_none());
    }

    #[test]
    fn unknown_flows_and_steps_are_rejected() {
        let bad_flow = LaunchOptions {
            flow: Some("ftp".into()),
            ..LaunchOptions::default()
        };
        assert!(build_context(&bad_flow).is_err());

        let bad_step = LaunchOptions {
            step: Some("nowhere".into()),
            ..LaunchOptions::default()
        };
        assert!(build_context(&bad_step).is_err());
    }

    #[test]
    fn import_launch_starts_an_import() {
        let opts = LaunchOptions {
            import: true,
            ..LaunchOptions::default()
        };
        let (ctx, _) = build_context(&opts).expect("context");
        assert_eq!(ctx.flow, FlowKind::HadoopCluster);
        assert_eq!(ctx.flow_type, crate::models::context::FlowType::Import);
    }
}
