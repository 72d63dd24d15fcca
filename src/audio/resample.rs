use super::types::{AudioError, DecodedAudioBuffer};
use rustfft::{num_complex::Complex, FftPlanner};
use serde::Deserialize;

/// Input frames the spectral resampler transforms per block
const SPECTRAL_BLOCK_FRAMES: usize = 1 << 16;

/// Extra input frames on each side of a block; the FFT's circular edges
/// ring inside this margin and it is discarded
const SPECTRAL_PAD_FRAMES: usize = 4096;

/// How samples are computed at the new rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ResampleMethod {
    /// Straight-line interpolation between neighbouring frames. Fast, but
    /// content above the new Nyquist frequency aliases.
    Linear,
    /// Band-limited resampling through the FFT
    #[default]
    Spectral,
}

/// Computes the output sample rate for a quality factor.
///
/// The rate is `floor(source_rate * quality)`.
///
/// # Errors
/// * If the quality is not within (0, 1]
/// * If the resulting rate would be zero
pub fn target_sample_rate(source_rate: u32, quality: f64) -> Result<u32, AudioError> {
    if !quality.is_finite() || quality <= 0.0 || quality > 1.0 {
        return Err(AudioError::InvalidParams(format!(
            "Quality must be greater than 0 and at most 1, got {}",
            quality
        )));
    }

    let rate = (source_rate as f64 * quality).floor() as u32;
    if rate == 0 {
        return Err(AudioError::InvalidParams(format!(
            "Quality {} leaves no samples at a source rate of {} Hz",
            quality, source_rate
        )));
    }

    Ok(rate)
}

/// Number of frames the same duration takes at the target rate, rounded down
pub fn output_frame_count(frames: usize, source_rate: u32, target_rate: u32) -> usize {
    (frames as u128 * target_rate as u128 / source_rate as u128) as usize
}

/// Resamples every channel of a buffer to a new sample rate.
///
/// The output keeps the channel count and covers the same duration,
/// truncated to a whole number of frames. When the rates match the buffer is
/// returned unchanged.
///
/// # Arguments
/// * `buffer` - Audio to resample
/// * `target_rate` - Output sample rate in Hz
/// * `method` - Interpolation method
///
/// # Errors
/// * If the channels differ in length
/// * If either sample rate is zero
pub fn resample(
    buffer: &DecodedAudioBuffer,
    target_rate: u32,
    method: ResampleMethod,
) -> Result<DecodedAudioBuffer, AudioError> {
    buffer.validate()?;

    if buffer.sample_rate == 0 || target_rate == 0 {
        return Err(AudioError::InvalidParams(format!(
            "Cannot resample from {} Hz to {} Hz",
            buffer.sample_rate, target_rate
        )));
    }

    if buffer.sample_rate == target_rate {
        return Ok(buffer.clone());
    }

    let out_frames = output_frame_count(buffer.frame_count(), buffer.sample_rate, target_rate);
    let step = buffer.sample_rate as f64 / target_rate as f64;

    let channels = match method {
        ResampleMethod::Linear => buffer
            .channels
            .iter()
            .map(|track| resample_linear(track, out_frames, step))
            .collect(),
        ResampleMethod::Spectral => {
            let mut planner = FftPlanner::new();
            buffer
                .channels
                .iter()
                .map(|track| {
                    resample_spectral_blocks(
                        track,
                        out_frames,
                        buffer.sample_rate,
                        target_rate,
                        &mut planner,
                    )
                })
                .collect()
        }
    };

    Ok(DecodedAudioBuffer {
        sample_rate: target_rate,
        channels,
    })
}

fn resample_linear(input: &[f32], out_frames: usize, step: f64) -> Vec<f32> {
    (0..out_frames)
        .map(|i| {
            let position = i as f64 * step;
            let index = position.floor() as usize;
            let frac = (position - index as f64) as f32;

            let a = input.get(index).copied().unwrap_or(0.0);
            let b = input.get(index + 1).copied().unwrap_or(a);
            a + (b - a) * frac
        })
        .collect()
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Spectral resampling over overlapping blocks.
///
/// Blocks start on frames where the input and output grids line up
/// (multiples of `source_rate / gcd`), so every block's output lands on the
/// global output grid. Each block is transformed together with
/// `SPECTRAL_PAD_FRAMES` of context on both sides and only the output for the
/// block itself is kept. Memory and FFT size stay bounded by the block size
/// instead of growing with the track. Tracks that fit in a single block take
/// one transform.
fn resample_spectral_blocks(
    input: &[f32],
    out_frames: usize,
    source_rate: u32,
    target_rate: u32,
    planner: &mut FftPlanner<f32>,
) -> Vec<f32> {
    let g = gcd(source_rate, target_rate);
    let unit_in = (source_rate / g) as usize;
    let unit_out = (target_rate / g) as usize;
    let block_units = (SPECTRAL_BLOCK_FRAMES / unit_in).max(1);
    let pad_units = SPECTRAL_PAD_FRAMES.div_ceil(unit_in);

    if input.len() <= (block_units + 2 * pad_units) * unit_in {
        return resample_spectral(input, out_frames, planner);
    }

    let total_units = input.len().div_ceil(unit_in);
    let mut output = Vec::with_capacity(out_frames);
    let mut unit = 0;

    while unit < total_units && output.len() < out_frames {
        let first_unit = unit.saturating_sub(pad_units);
        let start = first_unit * unit_in;
        let end = ((unit + block_units + pad_units) * unit_in).min(input.len());
        let segment = &input[start..end];

        let resampled = resample_spectral(
            segment,
            output_frame_count(segment.len(), source_rate, target_rate),
            planner,
        );

        // Output frames of this block, past the leading context
        let skip = (unit - first_unit) * unit_out;
        let take = (block_units * unit_out).min(out_frames - output.len());
        let stop = (skip + take).min(resampled.len());
        if stop <= skip {
            break;
        }
        output.extend_from_slice(&resampled[skip..stop]);

        unit += block_units;
    }

    output.resize(out_frames, 0.0);
    output
}

/// Moves the track into the frequency domain, keeps the bins both lengths
/// can represent and transforms back at the output length.
///
/// The Nyquist bin of an even-length spectrum is dropped so the result stays
/// real.
fn resample_spectral(
    input: &[f32],
    out_frames: usize,
    planner: &mut FftPlanner<f32>,
) -> Vec<f32> {
    let in_frames = input.len();
    if in_frames == 0 || out_frames == 0 {
        return vec![0.0; out_frames];
    }

    let mut spectrum: Vec<Complex<f32>> = input.iter().map(|&x| Complex::new(x, 0.0)).collect();
    planner.plan_fft_forward(in_frames).process(&mut spectrum);

    let shared = in_frames.min(out_frames);
    let positive = (shared + 1) / 2;
    let negative = (shared - 1) / 2;

    let mut output = vec![Complex::new(0.0, 0.0); out_frames];
    output[..positive].copy_from_slice(&spectrum[..positive]);
    for k in 1..=negative {
        output[out_frames - k] = spectrum[in_frames - k];
    }

    planner.plan_fft_inverse(out_frames).process(&mut output);

    let scale = 1.0 / in_frames as f32;
    output.iter().map(|c| c.re * scale).collect()
}
