//! # 图片裁剪工具：命令行入口
//!
//! 本文件仅负责参数解析、日志初始化与子命令分发。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use image_cropper::analysis::{AnalysisService, HttpAnalysisClient, ImagePayload};
use image_cropper::crop_export::{ArtifactGuard, CropServiceState, ExportOutcome, ImageSource};
use image_cropper::error::AppError;
use image_cropper::geometry::{DisplayRect, RectUnit, Size};
use image_cropper::session::CropSession;
use image_cropper::settings::AppSettings;

#[derive(Parser, Debug)]
#[command(
    name = "image-cropper",
    version,
    about = "Crop a preview-space selection out of the full-resolution image and export it as JPEG"
)]
struct Cli {
    /// Settings file (default: <config_dir>/image-cropper/settings.json)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Map a display-space rectangle onto native pixels and export it
    Crop(CropArgs),
    /// Submit an image to the analysis service and apply its proposed crop
    Analyze(AnalyzeArgs),
    /// Print the analysis service status
    #[command(name = "service-info")]
    ServiceInfo(ServiceInfoArgs),
}

#[derive(Args, Debug)]
struct CropArgs {
    /// Source image path
    input: PathBuf,
    /// Displayed (preview) size, e.g. 600x450; defaults to the natural size
    #[arg(long, value_parser = parse_size)]
    displayed: Option<Size>,
    /// Selection rectangle x,y,w,h; defaults to the centered 50% selection
    #[arg(long, value_parser = parse_rect)]
    rect: Option<[f64; 4]>,
    /// Unit of --rect
    #[arg(long, value_enum, default_value_t = UnitArg::Pixel)]
    unit: UnitArg,
    /// Output directory
    #[arg(long, default_value = ".")]
    out: PathBuf,
    /// Quality profile: high / balanced / compact
    #[arg(long)]
    profile: Option<String>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Source image path
    input: PathBuf,
    /// Analysis endpoint (overrides settings)
    #[arg(long)]
    endpoint: Option<String>,
    /// Output directory for the proposed crop
    #[arg(long, default_value = ".")]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct ServiceInfoArgs {
    /// Analysis endpoint (overrides settings)
    #[arg(long)]
    endpoint: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum UnitArg {
    Pixel,
    Percent,
}

impl From<UnitArg> for RectUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Pixel => RectUnit::Pixel,
            UnitArg::Percent => RectUnit::Percent,
        }
    }
}

fn parse_size(value: &str) -> Result<Size, String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{}'", value))?;
    let width: f64 = w.trim().parse().map_err(|e| format!("invalid width: {}", e))?;
    let height: f64 = h.trim().parse().map_err(|e| format!("invalid height: {}", e))?;

    Ok(Size::new(width, height))
}

fn parse_rect(value: &str) -> Result<[f64; 4], String> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("invalid number '{}': {}", p, e)))
        .collect::<Result<Vec<_>, _>>()?;

    <[f64; 4]>::try_from(parts).map_err(|_| format!("expected x,y,w,h, got '{}'", value))
}

fn check_displayed(displayed: Size) -> Result<Size, AppError> {
    if !displayed.is_positive() {
        return Err(AppError::InvalidArgument(format!(
            "--displayed must be positive, got {}x{}",
            displayed.width, displayed.height
        )));
    }
    Ok(displayed)
}

fn check_rect(rect: [f64; 4]) -> Result<[f64; 4], AppError> {
    if rect.iter().any(|v| !v.is_finite()) {
        return Err(AppError::InvalidArgument(format!("--rect must be finite, got {:?}", rect)));
    }
    Ok(rect)
}

fn load_settings(path: Option<&Path>) -> Result<AppSettings, AppError> {
    match path {
        Some(path) => AppSettings::load_from(path),
        None => AppSettings::load_from(&AppSettings::default_path()?),
    }
}

fn print_outcome(outcome: ExportOutcome, service: &CropServiceState, out: &Path) -> Result<(), AppError> {
    match outcome {
        ExportOutcome::Exported(artifact) => {
            let guard = ArtifactGuard::new(service.registry(), artifact);
            let path = guard.save_to(out)?;
            let rect = guard.native_rect();
            let (width, height) = guard.dimensions();

            println!(
                "native rect: ({:.2}, {:.2}, {:.2}, {:.2})",
                rect.x, rect.y, rect.width, rect.height
            );
            println!("output: {}x{} {} bytes -> {}", width, height, guard.bytes().len(), path.display());
        }
        ExportOutcome::NothingToExport(reason) => {
            println!("nothing to export: {:?}", reason);
        }
    }

    Ok(())
}

async fn run_crop(args: CropArgs, settings: AppSettings) -> Result<(), AppError> {
    let service = CropServiceState::with_config(settings.export)?;
    if let Some(profile) = args.profile.as_deref() {
        service.set_quality_profile(profile)?;
    }

    let displayed = args.displayed.map(check_displayed).transpose()?;
    let requested = args.rect.map(check_rect).transpose()?;

    let mut session = CropSession::new(service.clone());
    let source = service.load_source(ImageSource::FilePath(args.input)).await?;
    let displayed = displayed.unwrap_or_else(|| source.natural_size());
    let initial = session.load_decoded(source, displayed);

    let rect = match requested {
        Some([x, y, width, height]) => DisplayRect {
            unit: args.unit.into(),
            x,
            y,
            width,
            height,
        },
        None => initial,
    };
    session.commit_selection(rect);

    let outcome = session.export().await?;
    print_outcome(outcome, &service, &args.out)
}

async fn run_analyze(args: AnalyzeArgs, settings: AppSettings) -> Result<(), AppError> {
    let mut analysis_config = settings.analysis;
    if let Some(endpoint) = args.endpoint {
        analysis_config.endpoint = endpoint;
    }
    let client = HttpAnalysisClient::new(analysis_config)?;

    let bytes = fs::read(&args.input)?;
    let file_name = args
        .input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_string();

    let service = CropServiceState::with_config(settings.export)?;
    let mut session = CropSession::new(service.clone());
    let source = service.load_source(ImageSource::Bytes(bytes.clone())).await?;
    let natural = source.natural_size();
    session.load_decoded(source, natural);

    let (response, outcome) = session
        .analyze_and_apply(&client, ImagePayload::from_bytes(bytes, file_name))
        .await?;

    println!("analysis: {}", response.message);
    if let Some(result) = response.result.as_ref() {
        println!("title: {}", result.title);
    }

    match outcome {
        Some(outcome) => print_outcome(outcome, &service, &args.out),
        None => {
            println!("no crop proposal returned");
            Ok(())
        }
    }
}

async fn run_service_info(args: ServiceInfoArgs, settings: AppSettings) -> Result<(), AppError> {
    let mut analysis_config = settings.analysis;
    if let Some(endpoint) = args.endpoint {
        analysis_config.endpoint = endpoint;
    }
    let client = HttpAnalysisClient::new(analysis_config)?;

    let info = client.service_info().await?;
    println!(
        "{} {} [{}] at {}",
        info.service,
        info.version,
        info.status,
        info.timestamp.to_rfc3339()
    );

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(cli.settings.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("error [{}]: {}", err.code(), err);
            return ExitCode::FAILURE;
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(settings.log_filter.as_str()))
        .init();

    let result = match cli.command {
        Commands::Crop(args) => run_crop(args, settings).await,
        Commands::Analyze(args) => run_analyze(args, settings).await,
        Commands::ServiceInfo(args) => run_service_info(args, settings).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("❌ 执行失败 [{}]: {}", err.code(), err);
            eprintln!("error [{}]: {}", err.code(), err);
            ExitCode::FAILURE
        }
    }
}
