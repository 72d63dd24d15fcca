use clap::{Parser, Subcommand};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resample_wav::audio::{self, AudioError, ResampleMethod, WavHeader};
use resample_wav::config;
use resample_wav::convert::{self, BatchPolicy};
use resample_wav::pdf::{self, PageSelection, PageSize, PdfError};

/// Resample audio files into 16-bit PCM WAV files and edit PDF pages
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resample audio files to a fraction of their sample rate
    Resample(ResampleArgs),

    /// Show the format of an audio file
    Info(InfoArgs),

    /// Merge PDF files into one, in the order given
    Merge(MergeArgs),

    /// Copy selected pages of a PDF into a new file
    Extract(ExtractArgs),

    /// Rotate all, odd or even pages of a PDF
    Rotate(RotateArgs),

    /// Put every page of a PDF on a new paper size
    Resize(ResizeArgs),
}

/// Resample audio files to a fraction of their sample rate
#[derive(Parser)]
struct ResampleArgs {
    /// Paths to the input audio files (WAV, MP3, FLAC, Ogg Vorbis, AIFF)
    #[arg(required = true, num_args = 1..)]
    files: Vec<String>,

    /// Fraction of the source sample rate to keep (0 < quality <= 1)
    #[arg(short, long)]
    quality: Option<f64>,

    /// Resampling method
    #[arg(short, long, value_enum)]
    method: Option<ResampleMethod>,

    /// Directory to write the output files to (defaults to next to each input)
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Continue with the remaining files when one fails
    #[arg(short, long)]
    keep_going: bool,
}

/// Show the format of an audio file
#[derive(Parser)]
struct InfoArgs {
    /// Path to the audio file
    #[arg(required = true)]
    audio_file: String,
}

/// Merge PDF files into one, in the order given
#[derive(Parser)]
struct MergeArgs {
    /// Paths to the input PDF files
    #[arg(required = true, num_args = 2..)]
    files: Vec<String>,

    /// Output file (defaults to merged.pdf in the current directory)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

/// Copy selected pages of a PDF into a new file
#[derive(Parser)]
struct ExtractArgs {
    /// Path to the input PDF file
    #[arg(required = true)]
    file: String,

    /// Pages to keep, e.g. "1-3, 5"
    #[arg(short, long)]
    pages: String,

    /// Output file (defaults to extracted_<name> next to the input)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

/// Rotate all, odd or even pages of a PDF
#[derive(Parser)]
struct RotateArgs {
    /// Path to the input PDF file
    #[arg(required = true)]
    file: String,

    /// Rotation in degrees, a multiple of 90
    #[arg(short, long, default_value_t = 90, allow_hyphen_values = true)]
    degrees: i64,

    /// Which pages to rotate
    #[arg(short, long, value_enum, default_value = "all")]
    pages: PageSelection,

    /// Output file (defaults to rotated_<name> next to the input)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

/// Put every page of a PDF on a new paper size
#[derive(Parser)]
struct ResizeArgs {
    /// Path to the input PDF file
    #[arg(required = true)]
    file: String,

    /// Paper size
    #[arg(short, long, value_enum)]
    size: Option<PageSize>,

    /// Extra scale after fitting each page, in percent
    #[arg(long)]
    scale: Option<f32>,

    /// Output file (defaults to resized_<name> next to the input)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn missing_file(kind: &str, path: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} not found: {}", kind, path),
    )
}

fn not_found(kind: &str, path: &str) -> AudioError {
    AudioError::Io(missing_file(kind, path))
}

fn run_resample_command(args: &ResampleArgs) -> Result<(), AudioError> {
    // Check all inputs before writing anything
    for file in &args.files {
        if !Path::new(file).exists() {
            return Err(not_found("Audio file", file));
        }
    }

    if let Some(dir) = &args.out_dir {
        fs::create_dir_all(dir)?;
    }

    let config = config::load_config_or_default();
    let mut job = config.job();
    if let Some(quality) = args.quality {
        job.quality = quality;
    }
    if let Some(method) = args.method {
        job.method = method;
    }

    let policy = if args.keep_going {
        BatchPolicy::Skip
    } else {
        BatchPolicy::Abort
    };

    let inputs: Vec<PathBuf> = args.files.iter().map(PathBuf::from).collect();
    let report = convert::resample_batch(
        &inputs,
        args.out_dir.as_deref(),
        &job,
        policy,
        |progress| {
            eprintln!(
                "[{}/{}] {} ({:.0}%)",
                progress.index + 1,
                progress.total,
                progress.path.display(),
                progress.percent()
            );
        },
    )?;

    for output in &report.written {
        println!("{}", output.display());
    }

    if !report.is_success() {
        for (input, err) in &report.failed {
            eprintln!("Failed: {}: {}", input.display(), err);
        }
        return Err(AudioError::ProcessingError(format!(
            "{} of {} files failed",
            report.failed.len(),
            inputs.len()
        )));
    }

    Ok(())
}

fn run_info_command(args: &InfoArgs) -> Result<(), AudioError> {
    let path = Path::new(&args.audio_file);
    if !path.exists() {
        return Err(not_found("Audio file", &args.audio_file));
    }

    let bytes = fs::read(path)?;
    match WavHeader::parse(&bytes) {
        Ok(header) => {
            println!("Layout:          canonical 44-byte header");
            println!("Audio format:    {}", header.audio_format);
            println!("Channels:        {}", header.channels);
            println!("Sample rate:     {} Hz", header.sample_rate);
            println!("Byte rate:       {}", header.byte_rate);
            println!("Block align:     {}", header.block_align);
            println!("Bits per sample: {}", header.bits_per_sample);
            println!("Frames:          {}", header.frame_count());
            if header.sample_rate > 0 {
                println!(
                    "Duration:        {:.3}s",
                    header.frame_count() as f64 / header.sample_rate as f64
                );
            }
        }
        Err(_) => {
            // Extended WAV files and other containers: fall back to a full decode
            let extension = path.extension().and_then(|ext| ext.to_str());
            let buffer = audio::read_audio_bytes(&bytes, extension)?;
            println!("Layout:          decoded");
            println!("Channels:        {}", buffer.channel_count());
            println!("Sample rate:     {} Hz", buffer.sample_rate);
            println!("Frames:          {}", buffer.frame_count());
            println!("Duration:        {:.3}s", buffer.duration_secs());
        }
    }

    Ok(())
}

fn read_pdf(path: &str) -> Result<Vec<u8>, PdfError> {
    if !Path::new(path).exists() {
        return Err(PdfError::Io(missing_file("PDF file", path)));
    }
    Ok(fs::read(path)?)
}

/// Explicit output path, or `<prefix>_<name>` next to the input
fn pdf_output_path(input: &str, prefix: &str, output: Option<&PathBuf>) -> Result<PathBuf, PdfError> {
    if let Some(output) = output {
        return Ok(output.clone());
    }
    let input = Path::new(input);
    let name = input
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            PdfError::InvalidParams(format!("Invalid input file name: {}", input.display()))
        })?;
    Ok(input
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(pdf::output_file_name(prefix, name)))
}

fn write_pdf(path: &Path, bytes: &[u8]) -> Result<(), PdfError> {
    fs::write(path, bytes)?;
    tracing::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    println!("{}", path.display());
    Ok(())
}

fn run_merge_command(args: &MergeArgs) -> Result<(), PdfError> {
    let mut documents = Vec::with_capacity(args.files.len());
    for (index, file) in args.files.iter().enumerate() {
        eprintln!("[{}/{}] {}", index + 1, args.files.len(), file);
        documents.push(read_pdf(file)?);
    }

    let merged = pdf::merge_documents(&documents)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(pdf::MERGED_FILE_NAME));
    write_pdf(&output, &merged)
}

fn run_extract_command(args: &ExtractArgs) -> Result<(), PdfError> {
    let pages = pdf::parse_ranges(&args.pages)?;
    let extracted = pdf::extract_pages(&read_pdf(&args.file)?, &pages)?;
    let output = pdf_output_path(&args.file, "extracted", args.output.as_ref())?;
    write_pdf(&output, &extracted)
}

fn run_rotate_command(args: &RotateArgs) -> Result<(), PdfError> {
    let rotated = pdf::rotate_pages(&read_pdf(&args.file)?, args.degrees, args.pages)?;
    let output = pdf_output_path(&args.file, "rotated", args.output.as_ref())?;
    write_pdf(&output, &rotated)
}

fn run_resize_command(args: &ResizeArgs) -> Result<(), PdfError> {
    let defaults = config::load_config_or_default().pdf;
    let size = args.size.unwrap_or(defaults.page_size);
    let scale = args.scale.unwrap_or(defaults.scale_percent);

    let resized = pdf::resize_pages(&read_pdf(&args.file)?, size, scale)?;
    let output = pdf_output_path(&args.file, "resized", args.output.as_ref())?;
    write_pdf(&output, &resized)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resample_wav=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match &cli.command {
        Commands::Resample(args) => run_resample_command(args)?,
        Commands::Info(args) => run_info_command(args)?,
        Commands::Merge(args) => run_merge_command(args)?,
        Commands::Extract(args) => run_extract_command(args)?,
        Commands::Rotate(args) => run_rotate_command(args)?,
        Commands::Resize(args) => run_resize_command(args)?,
    }

    Ok(())
}

fn main() {
    match run() {
        Ok(_) => {}
        Err(err) => {
            eprintln!("\nERROR: {}\n", err);
            match err.downcast_ref::<AudioError>() {
                Some(AudioError::Io(ref io_err)) if io_err.kind() == io::ErrorKind::NotFound => {
                    eprintln!("Please check that:");
                    eprintln!("1. The file path is correct");
                    eprintln!("2. The file exists");
                    eprintln!("3. You have permission to read the file");
                }
                Some(AudioError::WavParse(_)) => {
                    eprintln!("WAV input must be integer PCM (8 to 32 bits) or 32-bit float.");
                }
                Some(AudioError::Decode(_)) => {
                    eprintln!("Supported inputs are WAV, MP3, FLAC, Ogg Vorbis and AIFF files.");
                }
                Some(AudioError::InvalidParams(_)) => {
                    eprintln!("Quality must be greater than 0 and at most 1, e.g. --quality 0.5");
                }
                _ => {}
            }
            match err.downcast_ref::<PdfError>() {
                Some(PdfError::Io(ref io_err)) if io_err.kind() == io::ErrorKind::NotFound => {
                    eprintln!("Please check that the PDF path is correct and readable.");
                }
                Some(PdfError::Parse(_)) => {
                    eprintln!("The file could not be read as a PDF (encrypted files are not supported).");
                }
                Some(PdfError::InvalidRange(_)) => {
                    eprintln!("Pages are 1-based, e.g. --pages \"1-3, 5\"");
                }
                _ => {}
            }
            process::exit(1);
        }
    }
}
