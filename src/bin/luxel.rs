use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use luxel::{
    AppEvent, Command as RenderCommand, ConfigStore as _, ConsoleCanvas, Controller, FrameCanvas,
    JsonConfig, RenderNode as _, ScriptEnv as _, load_script,
};

#[derive(Parser, Debug)]
#[command(name = "luxel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drive the render loop on an ANSI truecolor console canvas.
    Run(RunArgs),
    /// Load a script against a scratch canvas and report diagnostics.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Config JSON file with the `render.*` keys.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Screen width in pixels (overrides config).
    #[arg(long)]
    width: Option<u32>,

    /// Screen height in pixels (overrides config).
    #[arg(long)]
    height: Option<u32>,

    /// Frames per second (overrides config).
    #[arg(long)]
    fps: Option<u32>,

    /// Init script path (overrides config; empty config path means the
    /// built-in screen).
    #[arg(long)]
    script: Option<PathBuf>,

    /// Stop after this many milliseconds instead of running until the loop
    /// stops on its own.
    #[arg(long)]
    duration_ms: Option<u64>,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Script to load.
    script: PathBuf,

    /// Canvas width the script sees.
    #[arg(long, default_value_t = 19)]
    width: u32,

    /// Canvas height the script sees.
    #[arg(long, default_value_t = 7)]
    height: u32,
}

fn main() -> anyhow::Result<()> {
    if std::env::var_os("LUXEL_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("LUXEL_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn load_config(args: &RunArgs) -> anyhow::Result<JsonConfig> {
    let mut cfg = match &args.config {
        Some(path) => JsonConfig::from_file(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => JsonConfig::new(),
    };

    if let Some(w) = args.width {
        cfg.put_i64(luxel::control::CFG_SCREEN_W, i64::from(w));
    }
    if let Some(h) = args.height {
        cfg.put_i64(luxel::control::CFG_SCREEN_H, i64::from(h));
    }
    if let Some(fps) = args.fps {
        cfg.put_i64(luxel::control::CFG_FRAME_RATE, i64::from(fps));
    }
    if let Some(script) = &args.script {
        cfg.put_str(luxel::control::CFG_INIT_SCRIPT, &script.to_string_lossy());
    }
    Ok(cfg)
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args)?;
    let (tx, rx) = mpsc::channel();
    let mut controller = Controller::new(
        Arc::new(cfg),
        Arc::new(tx),
        Box::new(|w, h| Ok(Box::new(ConsoleCanvas::new(w, h)?))),
    );

    controller.dispatch(RenderCommand::Init)?;
    controller.dispatch(RenderCommand::Start)?;

    // Block until the loop ends: on its own (fault), or when the requested
    // duration elapses and we stop it.
    let stopped = match args.duration_ms {
        Some(ms) => rx.recv_timeout(Duration::from_millis(ms)).ok(),
        None => rx.recv().ok(),
    };
    match stopped {
        Some(AppEvent::Error(msg)) => {
            controller.dispatch(RenderCommand::Deinit).ok();
            anyhow::bail!("render loop faulted: {msg}");
        }
        Some(AppEvent::LoopStopped) => {}
        None => {
            controller.dispatch(RenderCommand::Stop)?;
        }
    }
    controller.dispatch(RenderCommand::Deinit)?;
    eprintln!("stopped");
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let graph = load_script(&args.script, args.width, args.height)
        .with_context(|| format!("load script '{}'", args.script.display()))?;

    let mut names: Vec<&str> = graph.vars.names().collect();
    names.sort_unstable();
    eprintln!("script loaded: {} variable(s)", names.len());
    for name in names {
        eprintln!("  {name}");
    }

    // One frame into a scratch canvas proves the tree renders.
    let mut canvas = FrameCanvas::new(args.width, args.height)?;
    graph.env.run_frame_hooks(0)?;
    graph.root.render(0, 0, 0, &mut canvas)?;
    eprintln!("rendered one {}x{} frame ok", args.width, args.height);
    Ok(())
}
