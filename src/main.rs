mod app;
mod model;
mod msg;
mod panel;
mod plugin;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use anyhow::Result;
use clap::Parser;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use app::App;
use model::config::AppConfig;
use model::scene::Document;
use msg::{BodyMessage, Msg, PanelMessage};
use panel::{Panel, STARTUP_FAILED_MESSAGE};

/// Wraps image-filled rectangles of a scene in frames of the same size.
///
/// Panel messages are read as JSON lines on stdin and replies are written as
/// JSON lines on stdout.
#[derive(Debug, Parser)]
#[command(name = "framer", version)]
struct Cli {
    /// Scene file (JSON) to operate on.
    scene: PathBuf,

    /// Config file merged over the defaults instead of the per-user one.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the scene on close. Defaults to the input file.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    // Initialize logging to file (never stdout, which belongs to the panel)
    let log_dir = AppConfig::log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "framer.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.logging.filter))
        .init();

    tracing::info!("framer starting on {}", cli.scene.display());

    let (out_tx, out_rx) = mpsc::channel::<BodyMessage>();
    let panel = match Panel::show(&config.panel, out_tx) {
        Ok(panel) => panel,
        Err(err) => {
            tracing::error!("error showing panel: {err}");
            eprintln!("{STARTUP_FAILED_MESSAGE}");
            drop(guard);
            std::process::exit(1);
        }
    };
    let document = match Document::load(&cli.scene) {
        Ok(document) => document,
        Err(err) => {
            tracing::error!("error loading scene: {err}");
            eprintln!("{STARTUP_FAILED_MESSAGE} ({err})");
            drop(guard);
            std::process::exit(1);
        }
    };

    let writer = spawn_panel_writer(out_rx);
    let result = run(&cli, App::new(config, document, panel));

    // The app owned the last sender; the writer exits once the queue drains.
    if writer.join().is_err() {
        tracing::warn!("panel writer panicked");
    }

    if let Err(e) = &result {
        eprintln!("framer error: {e:?}");
    }
    drop(guard);
    result
}

fn run(cli: &Cli, mut app: App) -> Result<()> {
    let (tx, rx) = mpsc::channel::<Msg>();

    spawn_panel_reader(tx.clone());
    spawn_scene_watcher(cli.scene.clone(), tx);

    app.start();

    // ── Main event loop ──
    loop {
        // Batch-drain all pending messages
        let first = rx.recv()?;
        app.update(first)?;

        while let Ok(msg) = rx.try_recv() {
            app.update(msg)?;
        }

        for notice in app.notifications.drain(..) {
            eprintln!("notice: {notice}");
        }

        if app.should_quit {
            break;
        }
    }

    let output = cli.output.as_ref().unwrap_or(&cli.scene);
    app.document.save(output)?;
    tracing::info!("scene written to {}", output.display());
    Ok(())
}

// Panel → body. End of input closes the plugin.
fn spawn_panel_reader(tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    tracing::warn!("panel read error: {err}");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<PanelMessage>(&line) {
                Ok(msg) => {
                    if tx.send(Msg::Panel(msg)).is_err() {
                        return;
                    }
                }
                Err(err) => tracing::warn!("ignoring panel message {line:?}: {err}"),
            }
        }
        let _ = tx.send(Msg::Quit);
    });
}

// Body → panel.
fn spawn_panel_writer(rx: mpsc::Receiver<BodyMessage>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stdout = io::stdout();
        for msg in rx {
            let line = match serde_json::to_string(&msg) {
                Ok(line) => line,
                Err(err) => {
                    tracing::error!("cannot encode {msg:?}: {err}");
                    continue;
                }
            };
            let mut out = stdout.lock();
            if let Err(err) = writeln!(out, "{line}").and_then(|()| out.flush()) {
                tracing::error!("error sending message to panel: {err}");
            }
        }
    })
}

fn spawn_scene_watcher(scene_path: PathBuf, tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        let scene_path = scene_path.canonicalize().unwrap_or(scene_path);
        let tx_watch = tx.clone();
        let target = scene_path.clone();
        let mut watcher: RecommendedWatcher =
            match notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
                        && event.paths.iter().any(|path| path.ends_with(&target))
                        && tx_watch.send(Msg::SceneChanged(target.clone())).is_err()
                    {
                        tracing::debug!("scene watcher stopping: app is gone");
                    }
                }
                Err(err) => {
                    tracing::warn!("scene watcher error: {err}");
                }
            }) {
                Ok(w) => w,
                Err(err) => {
                    tracing::warn!("failed to initialize scene watcher: {err}");
                    return;
                }
            };

        if let Err(err) = watcher.watch(&scene_path, RecursiveMode::NonRecursive) {
            tracing::warn!("failed to watch scene {}: {err}", scene_path.display());
            return;
        }

        loop {
            thread::park();
        }
    });
}
