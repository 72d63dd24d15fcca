use std::fs;
use std::path::{Path, PathBuf};

use crate::audio::{self, AudioError, DecodedAudioBuffer, ResampleMethod, WavContainer};

/// Suffix appended to the input's stem to name the output file
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_resampled";

/// Default fraction of the source sample rate to keep
pub const DEFAULT_QUALITY: f64 = 0.5;

/// Settings for turning one audio file into a resampled WAV file
#[derive(Debug, Clone, PartialEq)]
pub struct ResampleJob {
    /// Fraction of the source sample rate to keep, in (0, 1]
    pub quality: f64,
    pub method: ResampleMethod,
    pub output_suffix: String,
}

/// What a batch does when one of its files fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// Stop at the first failure and return its error
    #[default]
    Abort,
    /// Record the failure and carry on with the next file
    Skip,
}

/// Progress notification sent before each file of a batch is processed
#[derive(Debug, Clone, Copy)]
pub struct BatchProgress<'a> {
    /// Zero-based position of the file in the batch
    pub index: usize,
    pub total: usize,
    pub path: &'a Path,
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Output files that were written, in input order
    pub written: Vec<PathBuf>,
    /// Inputs that failed along with their error
    pub failed: Vec<(PathBuf, AudioError)>,
}

impl Default for ResampleJob {
    fn default() -> Self {
        ResampleJob {
            quality: DEFAULT_QUALITY,
            method: ResampleMethod::default(),
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
        }
    }
}

impl ResampleJob {
    /// Resamples a decoded buffer to `floor(rate * quality)` and encodes it.
    pub fn process(&self, buffer: &DecodedAudioBuffer) -> Result<WavContainer, AudioError> {
        let target_rate = audio::target_sample_rate(buffer.sample_rate, self.quality)?;
        let resampled = audio::resample(buffer, target_rate, self.method)?;

        tracing::debug!(
            "Resampled {} channel(s) from {} Hz to {} Hz ({} -> {} frames)",
            buffer.channel_count(),
            buffer.sample_rate,
            target_rate,
            buffer.frame_count(),
            resampled.frame_count()
        );

        audio::encode_wav(&resampled)
    }
}

impl<'a> BatchProgress<'a> {
    /// Percentage of the batch reached once this file is done
    pub fn percent(&self) -> f64 {
        (self.index + 1) as f64 / self.total as f64 * 100.0
    }
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Builds the output file name for an input file name.
///
/// The last extension is replaced with `<suffix>.wav`, so `song.mp3` becomes
/// `song_resampled.wav`. Names without an extension keep their full name.
pub fn output_file_name(input_name: &str, suffix: &str) -> String {
    let stem = match input_name.rfind('.') {
        Some(dot) if dot + 1 < input_name.len() && !input_name[dot + 1..].contains('/') => {
            &input_name[..dot]
        }
        _ => input_name,
    };
    format!("{}{}.wav", stem, suffix)
}

/// Decodes an in-memory audio file and runs the job on it.
///
/// `extension` is the input's file extension, used as a format hint.
pub fn resample_bytes(
    data: &[u8],
    extension: Option<&str>,
    job: &ResampleJob,
) -> Result<WavContainer, AudioError> {
    let buffer = audio::read_audio_bytes(data, extension)?;
    job.process(&buffer)
}

/// Resamples one file and writes the result.
///
/// The output goes into `out_dir` when given, otherwise next to the input.
///
/// # Returns
/// * `Result<PathBuf, AudioError>` - Path of the written file
pub fn resample_file(
    input: &Path,
    out_dir: Option<&Path>,
    job: &ResampleJob,
) -> Result<PathBuf, AudioError> {
    let file_name = input
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            AudioError::InvalidParams(format!("Invalid input file name: {}", input.display()))
        })?;

    let buffer = audio::read_audio_file(input)?;
    let wav = job.process(&buffer)?;

    let dir = match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let output = dir.join(output_file_name(file_name, &job.output_suffix));
    fs::write(&output, wav.as_bytes())?;

    tracing::info!(
        "Wrote {} ({} bytes)",
        output.display(),
        wav.len()
    );
    Ok(output)
}

/// Resamples a list of files in order.
///
/// `on_progress` is called before each file. With [`BatchPolicy::Abort`] the
/// first failure is returned as the error; with [`BatchPolicy::Skip`] it is
/// recorded in the report and the batch continues.
pub fn resample_batch<F>(
    inputs: &[PathBuf],
    out_dir: Option<&Path>,
    job: &ResampleJob,
    policy: BatchPolicy,
    mut on_progress: F,
) -> Result<BatchReport, AudioError>
where
    F: FnMut(BatchProgress<'_>),
{
    let mut report = BatchReport::default();

    for (index, input) in inputs.iter().enumerate() {
        on_progress(BatchProgress {
            index,
            total: inputs.len(),
            path: input,
        });

        match resample_file(input, out_dir, job) {
            Ok(output) => report.written.push(output),
            Err(err) => match policy {
                BatchPolicy::Abort => return Err(err),
                BatchPolicy::Skip => {
                    tracing::warn!("Skipping {}: {}", input.display(), err);
                    report.failed.push((input.clone(), err));
                }
            },
        }
    }

    tracing::info!(
        "Batch finished: {} written, {} failed",
        report.written.len(),
        report.failed.len()
    );
    Ok(report)
}
