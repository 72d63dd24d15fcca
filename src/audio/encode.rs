use super::types::{AudioError, DecodedAudioBuffer, WavContainer};

/// Length of the canonical RIFF/WAVE header that precedes the sample data
pub const WAV_HEADER_LEN: usize = 44;

const FMT_CHUNK_LEN: u32 = 16;
const FORMAT_PCM: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: usize = 2;

/// Encodes a decoded buffer as a canonical 16-bit PCM WAV file.
///
/// The output is a 44-byte header followed by interleaved samples in
/// frame-major, channel-minor order. Every multi-byte field is written
/// little-endian. A buffer with no frames or no channels produces a
/// header-only file whose data chunk is empty.
///
/// # Arguments
/// * `buffer` - The audio to encode; its sample rate and channel count are copied into the header
///
/// # Returns
/// * `Result<WavContainer, AudioError>` - The encoded file
///
/// # Errors
/// * If the channels differ in length
/// * If the channel count or data size cannot be represented in the WAV header
pub fn encode_wav(buffer: &DecodedAudioBuffer) -> Result<WavContainer, AudioError> {
    buffer.validate()?;

    let channel_count = buffer.channel_count();
    let frame_count = buffer.frame_count();

    let num_channels = u16::try_from(channel_count).map_err(|_| {
        AudioError::InvalidInput(format!(
            "{} channels exceed the WAV limit of {}",
            channel_count,
            u16::MAX
        ))
    })?;
    let block_align = u16::try_from(channel_count * BYTES_PER_SAMPLE).map_err(|_| {
        AudioError::InvalidInput(format!(
            "Block size for {} channels exceeds the WAV limit",
            channel_count
        ))
    })?;
    let byte_rate = u32::try_from(buffer.sample_rate as u64 * block_align as u64).map_err(|_| {
        AudioError::InvalidInput(format!(
            "Byte rate for {} Hz x {} channels exceeds the WAV limit",
            buffer.sample_rate, channel_count
        ))
    })?;

    // RIFF size is data + 36 and must also fit in 32 bits
    let data_len = frame_count
        .checked_mul(block_align as usize)
        .and_then(|len| u32::try_from(len).ok())
        .filter(|&len| len <= u32::MAX - (WAV_HEADER_LEN as u32 - 8))
        .ok_or_else(|| {
            AudioError::InvalidInput(format!(
                "{} frames of {} channels exceed the 4 GiB WAV size limit",
                frame_count, channel_count
            ))
        })?;

    let mut bytes = Vec::with_capacity(WAV_HEADER_LEN + data_len as usize);

    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(data_len + WAV_HEADER_LEN as u32 - 8).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    bytes.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    bytes.extend_from_slice(&num_channels.to_le_bytes());
    bytes.extend_from_slice(&buffer.sample_rate.to_le_bytes());
    bytes.extend_from_slice(&byte_rate.to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());

    for frame in 0..frame_count {
        for track in &buffer.channels {
            bytes.extend_from_slice(&quantize_sample(track[frame]).to_le_bytes());
        }
    }

    debug_assert_eq!(bytes.len(), WAV_HEADER_LEN + data_len as usize);
    Ok(WavContainer::from_bytes(bytes))
}

/// Converts a floating point sample to a signed 16-bit value.
///
/// The sample is clamped to [-1, 1]. Negative values scale by 32768 and
/// positive values by 32767, then truncate toward zero, so the full range
/// [-32768, 32767] is reachable without ever producing +32768.
/// NaN encodes as silence.
///
/// The product is taken in `f64`, where it is exact; an `f32` product can
/// round up across an integer and land one step too high.
pub fn quantize_sample(sample: f32) -> i16 {
    let clamped = f64::from(sample).clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * 32768.0) as i16
    } else {
        (clamped * 32767.0) as i16
    }
}
