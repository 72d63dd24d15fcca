// WAV encoding tests
//
// These tests check the canonical WAV container produced by the encoder:
// the 44-byte header, the interleaving of channels and the 16-bit
// quantization of samples. Output is also read back with hound to make sure
// other WAV readers agree with our layout.

use resample_wav::audio::{self, AudioError, DecodedAudioBuffer, WavHeader};

use test_utils::{read_pcm16, sine_buffer};

fn data_samples(bytes: &[u8]) -> Vec<i16> {
    bytes[44..]
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Test that a buffer without frames encodes to a header-only file.
#[test]
fn test_zero_frames_header_only() {
    for channels in [0, 1, 2] {
        let buffer = DecodedAudioBuffer::new(44100, vec![Vec::new(); channels]).unwrap();
        let wav = audio::encode_wav(&buffer).expect("empty buffer should encode");

        assert_eq!(wav.len(), 44);
        let header = WavHeader::parse(wav.as_bytes()).unwrap();
        assert_eq!(header.data_len, 0);
        assert_eq!(header.riff_len, 36);
        assert_eq!(header.channels as usize, channels);
    }
}

/// Test that the output length is 44 + frames * channels * 2.
#[test]
fn test_output_length() {
    for (channels, frames) in [(1, 1), (1, 1000), (2, 333), (6, 17)] {
        let buffer = sine_buffer(48000, channels, frames, 440.0, 0.8);
        let wav = audio::encode_wav(&buffer).unwrap();
        assert_eq!(wav.len(), 44 + frames * channels * 2);
    }
}

/// Test that the header fields describe the input buffer.
#[test]
fn test_header_round_trip() {
    let buffer = sine_buffer(22050, 2, 100, 440.0, 0.5);
    let wav = audio::encode_wav(&buffer).unwrap();
    let header = WavHeader::parse(wav.as_bytes()).unwrap();

    assert_eq!(header.sample_rate, 22050);
    assert_eq!(header.channels, 2);
    assert_eq!(header.bits_per_sample, 16);
    assert_eq!(header.audio_format, 1);
    assert_eq!(header.byte_rate, 22050 * 2 * 2);
    assert_eq!(header.block_align, 4);
    assert_eq!(header.frame_count(), 100);
    assert_eq!(header.riff_len as usize, wav.len() - 8);
}

/// Test the quantization of boundary and out-of-range samples.
#[test]
fn test_quantization_boundaries() {
    let buffer = DecodedAudioBuffer::new(8000, vec![vec![1.0, -1.0, 1.5, 0.0, -2.0]]).unwrap();
    let wav = audio::encode_wav(&buffer).unwrap();
    assert_eq!(data_samples(wav.as_bytes()), vec![32767, -32768, 32767, 0, -32768]);
}

/// Test that channels are interleaved frame by frame.
#[test]
fn test_channel_interleaving() {
    let buffer = DecodedAudioBuffer::new(8000, vec![vec![1.0, -1.0], vec![0.0, 0.5]]).unwrap();
    let wav = audio::encode_wav(&buffer).unwrap();

    assert_eq!(wav.len(), 52);
    assert_eq!(data_samples(wav.as_bytes()), vec![32767, 0, -32768, 16383]);
    assert_eq!(
        &wav.as_bytes()[44..],
        &[0xFF, 0x7F, 0x00, 0x00, 0x00, 0x80, 0xFF, 0x3F]
    );
}

/// Test that hound reads our output with the same samples.
#[test]
fn test_hound_reads_output() {
    let buffer = sine_buffer(16000, 2, 160, 1000.0, 0.9);
    let wav = audio::encode_wav(&buffer).unwrap();

    let (spec, samples) = read_pcm16(wav.as_bytes());
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 16000);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(samples, data_samples(wav.as_bytes()));
}

/// Test that mismatched channel lengths fail without output.
#[test]
fn test_mismatched_channels() {
    assert!(matches!(
        DecodedAudioBuffer::new(8000, vec![vec![0.0; 10], vec![0.0; 9]]),
        Err(AudioError::InvalidInput(_))
    ));

    let buffer = DecodedAudioBuffer {
        sample_rate: 8000,
        channels: vec![vec![0.0; 10], vec![0.0; 11]],
    };
    let result = audio::encode_wav(&buffer);
    assert!(matches!(result, Err(AudioError::InvalidInput(_))));
}

/// Test that the encoder is deterministic.
#[test]
fn test_deterministic_output() {
    let buffer = sine_buffer(44100, 2, 4410, 220.0, 0.7);
    let first = audio::encode_wav(&buffer).unwrap();
    let second = audio::encode_wav(&buffer).unwrap();
    assert_eq!(first, second);
}

/// Test that header fields which would overflow are rejected.
///
/// This test verifies:
/// - A byte rate above 32 bits fails instead of wrapping
/// - A block size above 16 bits fails
/// - A channel count above 16 bits fails
#[test]
fn test_header_overflow_is_rejected() {
    // u32::MAX Hz * 2 bytes per frame does not fit in the byte rate field
    let fast = DecodedAudioBuffer::new(u32::MAX, vec![vec![0.0]]).unwrap();
    assert!(matches!(
        audio::encode_wav(&fast),
        Err(AudioError::InvalidInput(_))
    ));

    // 40000 channels fit in NumChannels but 80000 bytes do not fit in BlockAlign
    let wide = DecodedAudioBuffer::new(8000, vec![Vec::new(); 40_000]).unwrap();
    assert!(matches!(
        audio::encode_wav(&wide),
        Err(AudioError::InvalidInput(_))
    ));

    let wider = DecodedAudioBuffer::new(8000, vec![Vec::new(); 70_000]).unwrap();
    assert!(matches!(
        audio::encode_wav(&wider),
        Err(AudioError::InvalidInput(_))
    ));

    // The largest block that still fits encodes normally
    let widest = DecodedAudioBuffer::new(1, vec![Vec::new(); 32_767]).unwrap();
    let wav = audio::encode_wav(&widest).unwrap();
    let header = WavHeader::parse(wav.as_bytes()).unwrap();
    assert_eq!(header.channels, 32_767);
    assert_eq!(header.block_align, 65_534);
    assert_eq!(header.data_len, 0);
}
