use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};

use lifcast::{
    Extent, LifProjector, ObserverCamera, Pose, RenderSettings, RenderThreading, StereoRig, Vec2,
    Vec3,
};

#[derive(Parser, Debug)]
#[command(name = "lifcast", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render a circular camera path around the capture as numbered PNGs.
    Orbit(OrbitArgs),
    /// Render a left/right eye pair.
    Stereo(StereoArgs),
    /// Print what a manifest decodes to.
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Input LIF manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Args, Debug)]
struct CameraArgs {
    /// Output width in pixels. Defaults to the first view's image width.
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels. Defaults to the first view's image height.
    #[arg(long)]
    height: Option<u32>,

    /// Vertical field of view in degrees. Defaults to the first view's intrinsics.
    #[arg(long)]
    fov_deg: Option<f32>,

    /// Observer position `x,y,z`. Defaults to the midpoint of the source views.
    #[arg(long, value_parser = parse_vec3)]
    pos: Option<Vec3>,

    /// Point the observer looks at, `x,y,z`. Defaults to looking down −Z.
    #[arg(long, value_parser = parse_vec3)]
    look_at: Option<Vec3>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Backend to use.
    #[arg(long, value_enum, default_value_t = BackendChoice::Cpu)]
    backend: BackendChoice,

    /// Edge feather width as a fraction of the source image.
    #[arg(long)]
    feather: Option<f32>,

    /// Straight RGBA background `r,g,b,a` in [0, 1].
    #[arg(long, value_parser = parse_rgba)]
    background: Option<[f32; 4]>,

    /// Alpha difference above which the two stereo views count as disagreeing.
    #[arg(long)]
    stereo_alpha_difference: Option<f32>,

    /// CPU worker threads. `LIFCAST_THREADS` takes priority.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    camera: CameraArgs,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Args, Debug)]
struct OrbitArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output directory; frames are written as `frame_0000.png`, ...
    #[arg(long)]
    out_dir: PathBuf,

    /// Number of frames on the circle.
    #[arg(long, default_value_t = 24)]
    frames: u32,

    /// Orbit radius in scene units.
    #[arg(long, default_value_t = 0.02)]
    radius: f32,

    /// Render frames concurrently (CPU backend only).
    #[arg(long)]
    parallel: bool,

    #[command(flatten)]
    camera: CameraArgs,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Args, Debug)]
struct StereoArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Left eye PNG path.
    #[arg(long)]
    out_left: PathBuf,

    /// Right eye PNG path.
    #[arg(long)]
    out_right: PathBuf,

    /// Interpupillary distance in scene units.
    #[arg(long, default_value_t = 0.063)]
    ipd: f32,

    #[command(flatten)]
    camera: CameraArgs,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Args, Debug)]
struct InspectArgs {
    #[command(flatten)]
    input: InputArgs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    Cpu,
    #[cfg(feature = "gpu")]
    Gpu,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Orbit(args) => cmd_orbit(args),
        Command::Stereo(args) => cmd_stereo(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn load(input: &InputArgs) -> anyhow::Result<LifProjector> {
    let projector = lifcast::load_lif(&input.in_path)
        .with_context(|| format!("load lif '{}'", input.in_path.display()))?;
    for fault in projector.asset().faults() {
        eprintln!("warning: {fault}");
    }
    Ok(projector)
}

/// Manifest settings, then CLI flags, then the environment.
fn resolve_settings(projector: &LifProjector, args: &RenderArgs) -> anyhow::Result<RenderSettings> {
    let mut settings = projector.asset().settings().cloned().unwrap_or_default();
    if let Some(feather) = args.feather {
        settings.feather = feather;
    }
    if let Some(background) = args.background {
        settings.background = background;
    }
    if let Some(diff) = args.stereo_alpha_difference {
        settings.stereo.alpha_difference = diff;
    }
    if args.threads.is_some() {
        settings.threads = args.threads;
    }
    let settings = settings.with_env_overrides();
    settings.validate()?;
    Ok(settings)
}

fn make_backend(
    choice: BackendChoice,
    settings: &RenderSettings,
) -> anyhow::Result<Box<dyn lifcast::RenderBackend>> {
    let kind = match choice {
        BackendChoice::Cpu => lifcast::BackendKind::Cpu,
        #[cfg(feature = "gpu")]
        BackendChoice::Gpu => lifcast::BackendKind::Gpu,
    };

    Ok(lifcast::create_backend(kind, settings)?)
}

/// Midpoint of the source views in scene space.
fn capture_center(projector: &LifProjector) -> Vec3 {
    let views = projector.asset().views();
    let sum: Vec3 = views.iter().map(|v| projector.view_position(v)).sum();
    sum / views.len().max(1) as f32
}

fn make_camera(projector: &LifProjector, args: &CameraArgs) -> anyhow::Result<ObserverCamera> {
    let first = projector
        .asset()
        .views()
        .first()
        .and_then(|v| v.layers.first())
        .context("lif has no layers")?;
    let source = first.rgb.extent();
    let extent = Extent::new(
        args.width.unwrap_or(source.width),
        args.height.unwrap_or(source.height),
    )?;

    let position = args.pos.unwrap_or_else(|| capture_center(projector));
    let pose = match args.look_at {
        Some(target) => Pose::looking_at(position, target, Vec3::Y),
        None => Pose::from_position(position),
    };

    Ok(match args.fov_deg {
        Some(fov) => ObserverCamera::perspective(pose, fov.to_radians(), extent)?,
        None => ObserverCamera {
            pose,
            focal: first.focal,
            skew: Vec2::ZERO,
            extent,
        },
    })
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let projector = load(&args.input)?;
    let settings = resolve_settings(&projector, &args.render)?;
    let mut backend = make_backend(args.render.backend, &settings)?;
    let camera = make_camera(&projector, &args.camera)?;

    let frame = lifcast::render_frame(&projector, &camera, backend.as_mut(), &settings)?;
    frame.save_png(&args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_orbit(args: OrbitArgs) -> anyhow::Result<()> {
    if args.frames == 0 {
        anyhow::bail!("--frames must be >= 1");
    }
    let projector = load(&args.input)?;
    let settings = resolve_settings(&projector, &args.render)?;
    let mut backend = make_backend(args.render.backend, &settings)?;
    let camera = make_camera(&projector, &args.camera)?;

    let depth = projector.convergence().map_or(1.0, |c| c.meters());
    let center = camera.pose.position;
    let target = center + camera.pose.rotation * Vec3::new(0.0, 0.0, -depth);
    let poses = lifcast::orbit_path(center, target, args.radius, args.frames);

    let threading = RenderThreading {
        parallel: args.parallel,
        threads: settings.threads,
    };
    let frames = lifcast::render_path(
        &projector,
        &camera,
        &poses,
        backend.as_mut(),
        &settings,
        &threading,
    )?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;
    for (i, frame) in frames.iter().enumerate() {
        frame.save_png(&args.out_dir.join(format!("frame_{i:04}.png")))?;
    }

    eprintln!("wrote {} frames to {}", frames.len(), args.out_dir.display());
    Ok(())
}

fn cmd_stereo(args: StereoArgs) -> anyhow::Result<()> {
    let projector = load(&args.input)?;
    let settings = resolve_settings(&projector, &args.render)?;
    let mut backend = make_backend(args.render.backend, &settings)?;
    let camera = make_camera(&projector, &args.camera)?;

    let rig = StereoRig {
        ipd: args.ipd,
        ..StereoRig::default()
    };
    let [left, right] = rig
        .eye_poses(&camera.pose)
        .map(|pose| camera.with_pose(pose));
    let left = lifcast::render_frame(&projector, &left, backend.as_mut(), &settings)?;
    let right = lifcast::render_frame(&projector, &right, backend.as_mut(), &settings)?;
    left.save_png(&args.out_left)?;
    right.save_png(&args.out_right)?;

    eprintln!(
        "wrote {} and {}",
        args.out_left.display(),
        args.out_right.display()
    );
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let projector = load(&args.input)?;
    let asset = projector.asset();

    println!(
        "{} ({} view{})",
        args.input.in_path.display(),
        asset.views().len(),
        if asset.is_stereo() { "s, stereo" } else { ", mono" }
    );
    println!("axis convention: {:?}", asset.axis_convention());
    match asset.convergence() {
        Some(c) => println!("convergence: {:.3} m", c.meters()),
        None => println!("convergence: n/a"),
    }
    for view in asset.views() {
        let p = view.position;
        println!(
            "view {}: position ({:.4}, {:.4}, {:.4}), skew ({:.4}, {:.4})",
            view.index, p.x, p.y, p.z, view.skew.x, view.skew.y
        );
        for (i, layer) in view.layers.iter().enumerate() {
            let extent = layer.rgb.extent();
            let range = layer.depth.range();
            println!(
                "  layer {i}: {}x{}, focal ({:.4}, {:.4}), inv_z [{}, {}]",
                extent.width,
                extent.height,
                layer.focal.x,
                layer.focal.y,
                range.inv_z_max,
                range.inv_z_min
            );
        }
    }
    for fault in asset.faults() {
        println!("{fault}");
    }
    Ok(())
}

fn parse_floats<const N: usize>(s: &str) -> Result<[f32; N], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {N} comma-separated numbers, got '{s}'"));
    }
    let mut out = [0.0f32; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse::<f32>()
            .map_err(|e| format!("invalid number '{part}': {e}"))?;
    }
    Ok(out)
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    parse_floats::<3>(s).map(Vec3::from_array)
}

fn parse_rgba(s: &str) -> Result<[f32; 4], String> {
    parse_floats::<4>(s)
}
