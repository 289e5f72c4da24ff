//! favicon-studio: render a favicon package from the command line.
//!
//! Style settings are layered: built-in defaults, then an optional
//! `--style` file (a style config or a brand kit), then individual flags.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use favicon_studio::matting::RemovalSettings;
use favicon_studio::{
    BackgroundMode, BrandKit, ContentSource, FaviconStudio, HexColor, Pattern, StyleConfig,
    StyleEdit, Texture,
};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Parser)]
#[command(name = "favicon-studio")]
#[command(about = "Generate a complete favicon package from text, an icon or a logo")]
struct Args {
    /// Style config or brand kit JSON file applied before the flags.
    #[arg(long, value_name = "FILE")]
    style: Option<PathBuf>,

    /// Text to draw (1-3 characters).
    #[arg(long, conflicts_with_all = ["icon", "logo"])]
    text: Option<String>,

    /// Icon to draw, usually an emoji.
    #[arg(long, conflicts_with = "logo")]
    icon: Option<String>,

    /// Logo image (PNG, JPEG, SVG, ...).
    #[arg(long, value_name = "FILE")]
    logo: Option<PathBuf>,

    #[arg(long, value_enum)]
    mode: Option<BackgroundMode>,

    #[arg(long)]
    background: Option<HexColor>,

    #[arg(long)]
    foreground: Option<HexColor>,

    /// Gradient start and end colors.
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    gradient: Option<Vec<HexColor>>,

    #[arg(long)]
    font: Option<String>,

    #[arg(long)]
    weight: Option<u16>,

    /// Shadow intensity, 0-20.
    #[arg(long)]
    shadow: Option<f32>,

    /// Glow intensity, 0-30.
    #[arg(long)]
    glow: Option<f32>,

    #[arg(long)]
    glow_color: Option<HexColor>,

    /// Logo size as a percentage of the icon, 20-120.
    #[arg(long)]
    logo_scale: Option<f32>,

    /// Corner radius as a percentage of the icon, 0-50.
    #[arg(long)]
    radius: Option<f32>,

    /// Border width in pixels, 0-10.
    #[arg(long)]
    border_width: Option<f32>,

    #[arg(long)]
    border_color: Option<HexColor>,

    #[arg(long, value_enum)]
    texture: Option<Texture>,

    #[arg(long, value_enum)]
    pattern: Option<Pattern>,

    /// Remove a uniform logo background.
    #[arg(long, requires = "logo")]
    remove_background: bool,

    /// Background removal tolerance, 10-100.
    #[arg(long, default_value_t = favicon_studio::matting::DEFAULT_TOLERANCE)]
    tolerance: u8,

    /// Directory the package files are written to.
    #[arg(short, long, default_value = "favicon-package")]
    out: PathBuf,

    /// Write the resolved style config to this file.
    #[arg(long, value_name = "FILE")]
    save_style: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Flag overrides, in the order they are applied.
    fn edits(&self) -> Vec<StyleEdit> {
        let mut edits = Vec::new();
        if let Some(text) = &self.text {
            edits.push(StyleEdit::Content(ContentSource::Text));
            edits.push(StyleEdit::Glyph(text.clone()));
        }
        if let Some(icon) = &self.icon {
            edits.push(StyleEdit::Content(ContentSource::Icon));
            edits.push(StyleEdit::Icon(icon.clone()));
        }
        if self.logo.is_some() {
            edits.push(StyleEdit::Content(ContentSource::Logo));
        }
        edits.extend(self.mode.map(StyleEdit::Mode));
        edits.extend(self.background.map(StyleEdit::Background));
        edits.extend(self.foreground.map(StyleEdit::Foreground));
        if let Some([start, end]) = self.gradient.as_deref() {
            edits.push(StyleEdit::GradientColors(*start, *end));
        }
        edits.extend(self.font.clone().map(StyleEdit::FontFamily));
        edits.extend(self.weight.map(StyleEdit::FontWeight));
        edits.extend(self.shadow.map(StyleEdit::ShadowIntensity));
        edits.extend(self.glow.map(StyleEdit::GlowIntensity));
        edits.extend(self.glow_color.map(StyleEdit::GlowColor));
        edits.extend(self.logo_scale.map(StyleEdit::LogoScale));
        edits.extend(self.radius.map(StyleEdit::BorderRadius));
        edits.extend(self.border_width.map(StyleEdit::BorderWidth));
        edits.extend(self.border_color.map(StyleEdit::BorderColor));
        edits.extend(self.texture.map(StyleEdit::Texture));
        edits.extend(self.pattern.map(StyleEdit::Pattern));
        edits
    }
}

/// Reads a style file holding either a brand kit or a style config.
fn load_style(path: &Path) -> Result<StyleConfig> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read style file {}", path.display()))?;

    if let Ok(kit) = serde_json::from_str::<BrandKit>(&json) {
        info!(kit = %kit.name, "Applying brand kit");
        return Ok(kit.apply_to(&StyleConfig::default()));
    }
    StyleConfig::from_json(&json)
        .with_context(|| format!("{} is not a style config or brand kit", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .compact()
        .init();

    let base = match &args.style {
        Some(path) => load_style(path)?,
        None => StyleConfig::default(),
    };
    let mut studio = FaviconStudio::with_config(base);
    for edit in args.edits() {
        studio.update(edit);
    }

    if let Some(path) = &args.logo {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read logo {}", path.display()))?;
        studio.set_removal(RemovalSettings::new(args.remove_background, args.tolerance));
        if let Some(ticket) = studio.upload_logo(&bytes)? {
            let result = ticket.run_async().await;
            studio.complete_reprocess(ticket, result);
        }
    }

    if let Some(path) = &args.save_style {
        fs::write(path, studio.config().to_json_pretty()?)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    let report = studio.accessibility();
    info!(ratio = report.ratio, score = report.score, "Contrast");
    if report.score < 100 {
        warn!("Foreground and background contrast is below 4.5:1");
    }

    let package = studio.package()?;
    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    let written = package.write_to_dir(&args.out)?;

    if !written.is_complete() {
        bail!("{} of {} files could not be written", written.failed.len(), package.files().len());
    }
    info!(dir = %args.out.display(), archive = %package.archive_name(), "Done");
    Ok(())
}
