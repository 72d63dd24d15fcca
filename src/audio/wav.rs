use super::encode::WAV_HEADER_LEN;
use super::types::{AudioError, DecodedAudioBuffer};
use hound::{SampleFormat, WavReader};
use std::io::{Cursor, Read};
use std::path::Path;

/// Fields of a canonical 44-byte WAV header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    /// Size of everything after the RIFF size field
    pub riff_len: u32,
    /// 1 for linear PCM
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Size of the sample data in bytes
    pub data_len: u32,
}

impl WavHeader {
    /// Parses the fixed header layout written by [`encode_wav`](super::encode_wav).
    ///
    /// Files with extra chunks or an extended `fmt ` chunk are not canonical
    /// and are rejected; use [`read_wav_bytes`] to decode those.
    pub fn parse(bytes: &[u8]) -> Result<Self, AudioError> {
        if bytes.len() < WAV_HEADER_LEN {
            return Err(AudioError::WavParse(format!(
                "Canonical WAV header needs {} bytes, got {}",
                WAV_HEADER_LEN,
                bytes.len()
            )));
        }

        for (offset, tag) in [(0, b"RIFF"), (8, b"WAVE"), (12, b"fmt "), (36, b"data")] {
            if &bytes[offset..offset + 4] != tag {
                return Err(AudioError::WavParse(format!(
                    "Expected '{}' at offset {}",
                    String::from_utf8_lossy(tag),
                    offset
                )));
            }
        }

        if read_u32(bytes, 16) != 16 {
            return Err(AudioError::WavParse(
                "fmt chunk is not the 16-byte PCM layout".to_string(),
            ));
        }

        Ok(WavHeader {
            riff_len: read_u32(bytes, 4),
            audio_format: read_u16(bytes, 20),
            channels: read_u16(bytes, 22),
            sample_rate: read_u32(bytes, 24),
            byte_rate: read_u32(bytes, 28),
            block_align: read_u16(bytes, 32),
            bits_per_sample: read_u16(bytes, 34),
            data_len: read_u32(bytes, 40),
        })
    }

    /// Number of samples per channel described by the header
    pub fn frame_count(&self) -> u32 {
        if self.block_align == 0 {
            0
        } else {
            self.data_len / self.block_align as u32
        }
    }
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Reads and parses a WAV file, converting samples to normalized f32 values.
///
/// This function supports the following WAV formats:
/// - 32-bit float
/// - 8-bit integer
/// - 16-bit integer
/// - 24-bit integer
/// - 32-bit integer
///
/// All integer formats are normalized to the [-1, 1] range.
///
/// # Arguments
/// * `path` - Path to the WAV file to read
///
/// # Returns
/// * `Result<DecodedAudioBuffer, AudioError>` - One track per channel
///
/// # Errors
/// * If the file cannot be read
/// * If the WAV format is unsupported
/// * If there's an error during sample conversion
pub fn read_wav_file(path: &Path) -> Result<DecodedAudioBuffer, AudioError> {
    let reader = WavReader::open(path).map_err(wav_error)?;
    decode(reader)
}

/// Same as [`read_wav_file`] for a WAV file already held in memory
pub fn read_wav_bytes(data: &[u8]) -> Result<DecodedAudioBuffer, AudioError> {
    let reader = WavReader::new(Cursor::new(data)).map_err(wav_error)?;
    decode(reader)
}

fn wav_error(err: hound::Error) -> AudioError {
    match err {
        hound::Error::IoError(io) => AudioError::Io(io),
        other => AudioError::WavParse(other.to_string()),
    }
}

fn decode<R: Read>(reader: WavReader<R>) -> Result<DecodedAudioBuffer, AudioError> {
    let spec = reader.spec();

    // Convert samples to f32, regardless of input format
    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .map(|s| s.map_err(wav_error))
            .collect::<Result<Vec<f32>, AudioError>>()?,
        (SampleFormat::Int, 8) => reader
            .into_samples::<i8>()
            .map(|s| s.map_err(wav_error))
            .map(|s| Ok(s? as f32 / 128.0))
            .collect::<Result<Vec<f32>, AudioError>>()?,
        (SampleFormat::Int, 16) => reader
            .into_samples::<i16>()
            .map(|s| s.map_err(wav_error))
            .map(|s| Ok(s? as f32 / 32768.0))
            .collect::<Result<Vec<f32>, AudioError>>()?,
        (SampleFormat::Int, 24) => reader
            .into_samples::<i32>()
            .map(|s| s.map_err(wav_error))
            .map(|s| Ok(s? as f32 / 8388608.0))
            .collect::<Result<Vec<f32>, AudioError>>()?,
        (SampleFormat::Int, 32) => reader
            .into_samples::<i32>()
            .map(|s| s.map_err(wav_error))
            .map(|s| Ok(s? as f32 / 2147483648.0))
            .collect::<Result<Vec<f32>, AudioError>>()?,
        _ => {
            return Err(AudioError::WavParse(format!(
                "Unsupported WAV format: {:?} {}-bit",
                spec.sample_format, spec.bits_per_sample
            )))
        }
    };

    DecodedAudioBuffer::from_interleaved(spec.sample_rate, spec.channels as usize, &samples)
        .map_err(|e| AudioError::WavParse(e.to_string()))
}
