/// Audio processing module for resampling audio and writing canonical WAV files.
///
/// This module provides functionality to:
/// - Read and parse WAV files into per-channel sample tracks
/// - Decode other containers (MP3, FLAC, Ogg Vorbis, AIFF) through symphonia
/// - Resample decoded audio to a lower sample rate
/// - Encode decoded audio as a 16-bit PCM WAV container
mod encode;
mod input;
mod resample;
mod types;
mod wav;

pub use encode::{encode_wav, quantize_sample, WAV_HEADER_LEN};
pub use input::{read_audio_bytes, read_audio_file};
pub use resample::{output_frame_count, resample, target_sample_rate, ResampleMethod};
pub use types::{AudioError, DecodedAudioBuffer, WavContainer};
pub use wav::{read_wav_bytes, read_wav_file, WavHeader};
