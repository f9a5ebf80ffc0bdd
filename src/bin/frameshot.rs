use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use frameshot::{
    AppearanceConfig, ClipboardWrite, Color, DeviceCatalog, ExportFormat, Orientation,
    OutputAspect, Raster, RenderSession, RotationDeg, export,
};

#[derive(Parser, Debug)]
#[command(name = "frameshot", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the device frames a catalog provides.
    Devices(DevicesArgs),
    /// Compose a mockup and write it to a file or the clipboard.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct DevicesArgs {
    /// Device catalog JSON (brand/model groups).
    #[arg(long)]
    catalog: PathBuf,

    /// Screen geometry JSON (per device and orientation).
    #[arg(long)]
    geometry: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Device catalog JSON. Required unless --frameless.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Screen geometry JSON. Required unless --frameless.
    #[arg(long)]
    geometry: Option<PathBuf>,

    /// Directory holding the frame images the catalog names.
    #[arg(long)]
    frames_dir: Option<PathBuf>,

    /// Device brand, matched case-insensitively.
    #[arg(long)]
    brand: Option<String>,

    /// Device model, matched case-insensitively.
    #[arg(long)]
    model: Option<String>,

    /// Device orientation.
    #[arg(long, value_enum, default_value_t = OrientationChoice::Portrait)]
    orientation: OrientationChoice,

    /// Screenshot to place into the frame.
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Appearance JSON; the flags below override individual fields.
    #[arg(long)]
    appearance: Option<PathBuf>,

    /// Skip the device frame and present the screenshot alone.
    #[arg(long)]
    frameless: bool,

    /// Frameless rotation in degrees (0, 90, 180 or 270).
    #[arg(long)]
    rotate: Option<u32>,

    /// Frameless corner radius in pixels.
    #[arg(long)]
    radius: Option<u32>,

    /// Background fill color as hex; enables the background.
    #[arg(long)]
    background_color: Option<String>,

    /// Background image, cover-fit behind the content; enables the background.
    #[arg(long)]
    background_image: Option<PathBuf>,

    /// Enable the drop shadow.
    #[arg(long)]
    shadow: bool,

    /// Shadow blur strength in pixels.
    #[arg(long)]
    shadow_strength: Option<u32>,

    /// Shadow color as hex.
    #[arg(long)]
    shadow_color: Option<String>,

    /// Shadow opacity percent (0-100).
    #[arg(long)]
    shadow_opacity: Option<u8>,

    /// Output aspect preset.
    #[arg(long, value_enum)]
    aspect: Option<AspectChoice>,

    /// Padding around the content in pixels; negative values crop.
    #[arg(long, allow_hyphen_values = true)]
    padding: Option<i32>,

    /// Output encoding.
    #[arg(long, value_enum, default_value_t = FormatChoice::Png)]
    format: FormatChoice,

    /// Output path; defaults to the device-derived filename.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Copy to the system clipboard instead of writing a file.
    #[arg(long)]
    copy: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OrientationChoice {
    Portrait,
    Landscape,
    Front,
    Left,
    Right,
}

impl From<OrientationChoice> for Orientation {
    fn from(choice: OrientationChoice) -> Self {
        match choice {
            OrientationChoice::Portrait => Orientation::Portrait,
            OrientationChoice::Landscape => Orientation::Landscape,
            OrientationChoice::Front => Orientation::Front,
            OrientationChoice::Left => Orientation::Left,
            OrientationChoice::Right => Orientation::Right,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AspectChoice {
    #[value(name = "default")]
    Default,
    #[value(name = "1:1")]
    Square,
    #[value(name = "16:9")]
    SixteenByNine,
    #[value(name = "9:16")]
    NineBySixteen,
    #[value(name = "3:4")]
    ThreeByFour,
}

impl From<AspectChoice> for OutputAspect {
    fn from(choice: AspectChoice) -> Self {
        match choice {
            AspectChoice::Default => OutputAspect::Default,
            AspectChoice::Square => OutputAspect::Square,
            AspectChoice::SixteenByNine => OutputAspect::SixteenByNine,
            AspectChoice::NineBySixteen => OutputAspect::NineBySixteen,
            AspectChoice::ThreeByFour => OutputAspect::ThreeByFour,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Png,
    Jpeg,
    Webp,
}

impl From<FormatChoice> for ExportFormat {
    fn from(choice: FormatChoice) -> Self {
        match choice {
            FormatChoice::Png => ExportFormat::Png,
            FormatChoice::Jpeg => ExportFormat::Jpeg,
            FormatChoice::Webp => ExportFormat::Webp,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Devices(args) => cmd_devices(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn cmd_devices(args: DevicesArgs) -> anyhow::Result<()> {
    let catalog = DeviceCatalog::load(&args.catalog, &args.geometry)?;
    for frame in catalog.frames() {
        println!(
            "{}\t{}\t{}\t{}",
            frame.brand, frame.model, frame.orientation, frame.filename
        );
    }
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut session = RenderSession::new();
    session.set_appearance(build_appearance(&args)?)?;

    let mut frame_meta = None;
    if !args.frameless {
        let catalog_path = args
            .catalog
            .as_deref()
            .context("--catalog is required unless --frameless is set")?;
        let geometry_path = args
            .geometry
            .as_deref()
            .context("--geometry is required unless --frameless is set")?;
        let frames_dir = args
            .frames_dir
            .as_deref()
            .context("--frames-dir is required unless --frameless is set")?;
        let brand = args
            .brand
            .as_deref()
            .context("--brand is required unless --frameless is set")?;
        let model = args
            .model
            .as_deref()
            .context("--model is required unless --frameless is set")?;

        let catalog = DeviceCatalog::load(catalog_path, geometry_path)?;
        let orientation = Orientation::from(args.orientation);
        let meta = catalog
            .lookup(brand, model, orientation)
            .with_context(|| format!("no catalog entry for {brand} {model} ({orientation})"))?
            .clone();
        let raster = Raster::open(&frames_dir.join(&meta.filename))?;
        session.load_frame(meta.clone(), raster);
        frame_meta = Some(meta);
    }

    if let Some(path) = &args.screenshot {
        session.set_screenshot(Some(Raster::open(path)?));
    }
    if let Some(path) = &args.background_image {
        session.set_background_image(Some(Raster::open(path)?));
    }

    let surface = session.render()?;
    let format = ExportFormat::from(args.format);

    if args.copy {
        match export::copy_to_clipboard(surface, format)? {
            ClipboardWrite::Image => eprintln!("copied image to clipboard"),
            ClipboardWrite::TextFallback => eprintln!("copied data URL text to clipboard"),
        }
        return Ok(());
    }

    let out = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(export::export_filename(frame_meta.as_ref(), format)));
    export::save(surface, &out, format)?;
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn build_appearance(args: &RenderArgs) -> anyhow::Result<AppearanceConfig> {
    let mut appearance = match &args.appearance {
        Some(path) => read_appearance_json(path)?,
        None => AppearanceConfig::default(),
    };

    if args.frameless {
        appearance.frameless = true;
    }
    if let Some(deg) = args.rotate {
        appearance.rotation = RotationDeg::try_from(deg)?;
    }
    if let Some(radius) = args.radius {
        appearance.corner_radius_px = radius;
    }
    if let Some(hex) = &args.background_color {
        appearance.background.enabled = true;
        appearance.background.color = Color::from_hex(hex)?;
    }
    if args.background_image.is_some() {
        appearance.background.enabled = true;
    }
    if args.shadow {
        appearance.shadow.enabled = true;
    }
    if let Some(strength) = args.shadow_strength {
        appearance.shadow.strength_px = strength;
    }
    if let Some(hex) = &args.shadow_color {
        appearance.shadow.color = Color::from_hex(hex)?;
    }
    if let Some(pct) = args.shadow_opacity {
        appearance.shadow.opacity_pct = pct;
    }
    if let Some(choice) = args.aspect {
        appearance.aspect = OutputAspect::from(choice);
    }
    if let Some(padding) = args.padding {
        appearance.padding_px = padding;
    }
    Ok(appearance)
}

fn read_appearance_json(path: &Path) -> anyhow::Result<AppearanceConfig> {
    let f = File::open(path).with_context(|| format!("open appearance '{}'", path.display()))?;
    let appearance: AppearanceConfig =
        serde_json::from_reader(BufReader::new(f)).with_context(|| "parse appearance JSON")?;
    Ok(appearance)
}
