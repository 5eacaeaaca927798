use std::{
    io::Write as _,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use slidecast::{
    BlockFont, DeckSession, ExportStage, Exporter, FfmpegCapture, FfmpegTranscoder, FontDir,
    FontProvider as _, LoadedFont, Pacing, ProjectConfig, Resolution, ShaperFactory,
    TranscoderHandle,
};

const DEFAULT_FAMILY: &str = "DejaVu Sans";

#[derive(Parser, Debug)]
#[command(name = "slidecast", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the whole script to an MP4 video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a single slide as a PNG.
    Frame(FrameArgs),
    /// Print the timeline summary of a script as JSON.
    Timeline(DeckArgs),
}

/// Options shared by every subcommand.
#[derive(Args, Debug)]
struct DeckArgs {
    /// Slide script, one slide per non-blank line.
    #[arg(long)]
    script: PathBuf,

    /// Project config JSON. Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output resolution: 1024x1024, 1080x1920 or 1920x1080.
    #[arg(long)]
    resolution: Option<Resolution>,

    /// Font family name.
    #[arg(long)]
    font: Option<String>,

    /// Extra font directory, loaded recursively before the system fonts. Repeatable.
    #[arg(long = "font-dir")]
    font_dirs: Vec<PathBuf>,

    /// Draw text as placeholder blocks instead of loading a font.
    #[arg(long)]
    block_font: bool,

    /// Render slides on a thread pool.
    #[arg(long)]
    parallel: bool,

    /// Worker threads for `--parallel` (defaults to the number of CPUs).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    deck: DeckArgs,

    /// Slide index (0-based).
    #[arg(long)]
    slide: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    deck: DeckArgs,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// x264 constant rate factor (0-51).
    #[arg(long)]
    crf: Option<u8>,

    /// x264 preset.
    #[arg(long)]
    preset: Option<String>,

    /// Push frames as fast as the encoder accepts them instead of in real time.
    #[arg(long)]
    unpaced: bool,

    /// Do not print progress.
    #[arg(long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Timeline(args) => cmd_timeline(args),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("slidecast=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(deck: &DeckArgs) -> anyhow::Result<ProjectConfig> {
    let mut cfg = match &deck.config {
        Some(path) => ProjectConfig::load(path)?,
        None => ProjectConfig::default(),
    };
    if let Some(resolution) = deck.resolution {
        cfg.resolution = resolution;
    }
    if let Some(font) = &deck.font {
        cfg.font = Some(font.clone());
    }
    cfg.font_dirs.extend(deck.font_dirs.iter().cloned());
    if deck.parallel {
        cfg.parallel = true;
    }
    if deck.threads.is_some() {
        cfg.threads = deck.threads;
    }
    Ok(cfg)
}

fn read_script(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read script '{}'", path.display()))
}

fn open_deck<F: ShaperFactory>(
    deck: &DeckArgs,
    cfg: &ProjectConfig,
    font: F,
) -> anyhow::Result<DeckSession<F>> {
    let script = read_script(&deck.script)?;
    let session = DeckSession::new(&script, cfg.deck_settings()?, font)
        .with_context(|| format!("parse script '{}'", deck.script.display()))?;
    Ok(session)
}

fn load_font(cfg: &ProjectConfig) -> anyhow::Result<LoadedFont> {
    let mut fonts = FontDir::new();
    for dir in &cfg.font_dirs {
        fonts.load_dir(dir);
    }
    fonts.load_system_fonts();
    let family = cfg.font.as_deref().unwrap_or(DEFAULT_FAMILY);
    let font = fonts
        .load(family)
        .with_context(|| format!("load font '{family}' (try --font-dir or --block-font)"))?;
    Ok(font)
}

fn create_parent(out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.deck)?;
    cfg.validate()?;
    let png = if args.deck.block_font {
        frame_png(open_deck(&args.deck, &cfg, block_font(&cfg))?, args.slide)?
    } else {
        frame_png(open_deck(&args.deck, &cfg, load_font(&cfg)?)?, args.slide)?
    };

    create_parent(&args.out)?;
    std::fs::write(&args.out, png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn frame_png<F: ShaperFactory>(mut deck: DeckSession<F>, slide: usize) -> anyhow::Result<Vec<u8>> {
    let png = deck
        .render_slide_png(slide)
        .with_context(|| format!("render slide {slide}"))?;
    Ok(png)
}

fn cmd_timeline(args: DeckArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args)?;
    cfg.validate()?;
    let summary = if args.block_font {
        open_deck(&args, &cfg, block_font(&cfg))?.timeline()?.summary()
    } else {
        open_deck(&args, &cfg, load_font(&cfg)?)?.timeline()?.summary()
    };

    let json = serde_json::to_string_pretty(&summary).context("serialize timeline summary")?;
    println!("{json}");
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(&args.deck)?;
    if let Some(crf) = args.crf {
        cfg.transcode.crf = crf;
    }
    if let Some(preset) = &args.preset {
        cfg.transcode.preset = preset.clone();
    }
    if args.unpaced {
        cfg.pacing = Pacing::Unpaced;
    }
    cfg.validate()?;

    let timeline = if args.deck.block_font {
        open_deck(&args.deck, &cfg, block_font(&cfg))?.timeline()?
    } else {
        open_deck(&args.deck, &cfg, load_font(&cfg)?)?.timeline()?
    };

    let mut exporter = Exporter::new(
        FfmpegCapture::new(),
        TranscoderHandle::new(FfmpegTranscoder::new),
        cfg.export_opts(),
    );
    let cancel = exporter.cancel_token();
    ctrlc::set_handler(move || cancel.cancel()).context("install Ctrl-C handler")?;

    let quiet = args.quiet;
    let mp4 = exporter
        .export(&timeline, &mut |stage, p| {
            if !quiet {
                print_progress(stage, p);
            }
        })
        .context("export video")?;
    if !quiet {
        eprintln!();
    }

    create_parent(&args.out)?;
    std::fs::write(&args.out, mp4)
        .with_context(|| format!("write mp4 '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn block_font(cfg: &ProjectConfig) -> BlockFont {
    match &cfg.font {
        Some(family) => BlockFont::new(family.clone()),
        None => BlockFont::default(),
    }
}

fn print_progress(stage: ExportStage, percent: f64) {
    let mut err = std::io::stderr().lock();
    let _ = write!(err, "\r{:<9} {percent:5.1}%", stage.as_str());
    let _ = err.flush();
}
