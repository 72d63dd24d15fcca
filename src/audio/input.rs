use super::types::{AudioError, DecodedAudioBuffer};
use super::wav::read_wav_bytes;
use std::fs;
use std::io::{self, Cursor};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decodes an audio file of any supported container into per-channel tracks.
///
/// RIFF/WAVE data goes through the WAV reader. Everything else (MP3, FLAC,
/// Ogg Vorbis, AIFF, ...) is identified from its content and decoded with
/// symphonia; `extension` is only a hint for formats that are hard to tell
/// apart.
///
/// # Arguments
/// * `data` - The whole file
/// * `extension` - File extension without the dot, if known
///
/// # Errors
/// * `AudioError::WavParse` if a WAV file is malformed
/// * `AudioError::Decode` if the format is not recognized or the stream is corrupt
pub fn read_audio_bytes(
    data: &[u8],
    extension: Option<&str>,
) -> Result<DecodedAudioBuffer, AudioError> {
    if is_riff_wave(data) {
        return read_wav_bytes(data);
    }
    decode_compressed(data.to_vec(), extension)
}

/// Reads and decodes an audio file from disk, see [`read_audio_bytes`]
pub fn read_audio_file(path: &Path) -> Result<DecodedAudioBuffer, AudioError> {
    let data = fs::read(path)?;
    let extension = path.extension().and_then(|ext| ext.to_str());
    read_audio_bytes(&data, extension)
}

fn is_riff_wave(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WAVE"
}

fn decode_error(err: SymphoniaError) -> AudioError {
    AudioError::Decode(err.to_string())
}

fn decode_compressed(
    data: Vec<u8>,
    extension: Option<&str>,
) -> Result<DecodedAudioBuffer, AudioError> {
    let stream = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let mut format = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(decode_error)?
        .format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::Decode("No audio track found".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(decode_error)?;

    let mut sample_rate = codec_params.sample_rate;
    let mut channel_count = codec_params.channels.map(|c| c.count());
    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // End of stream
            Err(SymphoniaError::IoError(ref e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(decode_error(e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = Some(spec.rate);
                channel_count = Some(spec.channels.count());

                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buffer.samples());
            }
            // A damaged packet is dropped, the rest of the stream still decodes
            Err(SymphoniaError::DecodeError(msg)) => {
                tracing::warn!("Skipping undecodable packet: {}", msg);
            }
            Err(e) => return Err(decode_error(e)),
        }
    }

    let sample_rate = sample_rate
        .ok_or_else(|| AudioError::Decode("Stream does not declare a sample rate".to_string()))?;
    let channel_count = channel_count
        .ok_or_else(|| AudioError::Decode("Stream does not declare its channels".to_string()))?;

    tracing::debug!(
        "Decoded {} samples ({} channel(s) at {} Hz)",
        samples.len(),
        channel_count,
        sample_rate
    );

    DecodedAudioBuffer::from_interleaved(sample_rate, channel_count, &samples)
        .map_err(|e| AudioError::Decode(e.to_string()))
}
