use anyhow::{Context, anyhow};
use clap::Parser;
use domgrab_engine::background::{BackgroundEndpoint, LogBadge};
use domgrab_engine::config::ConfigLoader;
use domgrab_engine::orchestrator::{LogToast, PickerSession};
use domgrab_engine::panel::{ConnectionWatch, PanelEndpoint};
use domgrab_engine::transport::{ContextId, MessageRouter, ScriptInjector};
use domgrab_h::cdp::CdpClient;
use domgrab_h::clipboard::PageClipboard;
use domgrab_h::page::{CdpPageProbe, CollectorInjector};
use domgrab_h::window::CdpWindow;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "domgrab", version, about = "Capture element markup, styles and listeners")]
struct Args {
    /// Page to open
    url: String,

    /// CSS selector of the element to capture
    #[arg(long)]
    pick: String,

    /// Write the captured bundle to a file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,

    /// Launch browser in visible mode (not headless)
    #[arg(long)]
    visible: bool,

    /// Configuration file (defaults to ./domgrab.yaml, then ~/.domgrab/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run without the devtools endpoint, exercising the degraded path
    #[arg(long)]
    no_devtools: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging goes to stderr so stdout stays clean for the bundle.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ConfigLoader::load_from(path).await?,
        None => ConfigLoader::load_default().await?,
    };

    let client = CdpClient::launch(args.visible)
        .await
        .map_err(|e| anyhow!(e))?;
    client.goto(&args.url).await.map_err(|e| anyhow!(e))?;
    let page = client.page.clone();

    let router = MessageRouter::new();
    let injector: Arc<dyn ScriptInjector> = Arc::new(CollectorInjector::new(page.clone()));

    let session = Arc::new(PickerSession::new(
        router.clone(),
        Arc::clone(&injector),
        Arc::new(PageClipboard::new(page.clone())),
        Arc::new(LogToast),
        &config,
    ));
    router
        .register(ContextId::ContentScript, session.clone())
        .await;

    let background = Arc::new(BackgroundEndpoint::new(
        router.clone(),
        Arc::clone(&injector),
        Arc::new(LogBadge),
        config.timing.settle_delay(),
    ));
    router
        .register(ContextId::Background, background.clone())
        .await;

    let watch = if args.no_devtools {
        tracing::info!("running without devtools; listener data will be degraded");
        None
    } else {
        let panel = Arc::new(PanelEndpoint::new(
            Arc::new(CdpWindow::new(page.clone())),
            router.clone(),
            config.picker,
        ));
        router.register(ContextId::Panel, panel).await;
        Some(ConnectionWatch::spawn(
            router.clone(),
            Arc::clone(&injector),
            config.timing.connection_check_period(),
        ))
    };

    // The toolbar click arms selection mode; the --pick selector stands in
    // for the user's click on the page.
    background
        .on_toolbar_click()
        .await
        .context("failed to arm selection mode")?;

    let probe = CdpPageProbe::new(page.clone(), args.pick.clone());
    let summary = session
        .handle_click(&probe)
        .await
        .context("capture failed")?;

    tracing::info!(
        devtools_connected = summary.devtools_connected,
        clipboard_success = summary.clipboard.success,
        clipboard_fallback = summary.clipboard.fallback,
        "capture complete"
    );

    match &args.out {
        Some(path) => {
            tokio::fs::write(path, &summary.bundle)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "bundle written");
        }
        None => println!("{}", summary.bundle),
    }

    if let Some(watch) = watch {
        watch.shutdown();
    }
    client.close().await.map_err(|e| anyhow!(e))?;
    Ok(())
}
