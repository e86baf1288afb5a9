use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reelforge", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a script manifest to MP4 (requires `ffmpeg` and `ffprobe`).
    Render(RenderArgs),
    /// Render the frame nearest to a timestamp as a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Script manifest JSON (`{ "config": ..., "scenes": [...] }`).
    #[arg(long)]
    manifest: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Override the manifest's style.
    #[arg(long, value_enum)]
    style: Option<reelforge::Style>,

    /// Seed for the Ken-Burns variant choice.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Script manifest JSON.
    #[arg(long)]
    manifest: PathBuf,

    /// Timeline position in seconds.
    #[arg(long)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Override the manifest's style.
    #[arg(long, value_enum)]
    style: Option<reelforge::Style>,

    /// Seed for the Ken-Burns variant choice.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn load_manifest(
    path: &std::path::Path,
    style: Option<reelforge::Style>,
    seed: Option<u64>,
) -> anyhow::Result<reelforge::ScriptManifest> {
    let mut manifest = reelforge::ScriptManifest::from_path(path)
        .with_context(|| format!("load manifest '{}'", path.display()))?;
    if let Some(style) = style {
        manifest.config.style = style;
    }
    if seed.is_some() {
        manifest.config.seed = seed;
    }
    Ok(manifest)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let manifest = load_manifest(&args.manifest, args.style, args.seed)?;
    let mut media = reelforge::FfmpegMedia::from_env();
    let mut compositor = reelforge::SceneCompositor::new(manifest.config)?;

    let (out, report) = compositor.render_to_mp4(&manifest.scenes, &mut media, &args.out)?;
    for skipped in report.skipped() {
        if let reelforge::SceneOutcome::Skipped { index, reason } = skipped {
            eprintln!("skipped scene {index}: {reason}");
        }
    }
    eprintln!(
        "wrote {} ({} of {} scenes, {:.2}s)",
        out.display(),
        report.rendered_count(),
        report.scenes.len(),
        report.total_duration_sec
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let manifest = load_manifest(&args.manifest, args.style, args.seed)?;
    let mut media = reelforge::FfmpegMedia::from_env();
    let mut compositor = reelforge::SceneCompositor::new(manifest.config)?;

    let frame = compositor.render_frame_at(&manifest.scenes, &mut media, args.time)?;
    reelforge::write_png(&frame, &args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
