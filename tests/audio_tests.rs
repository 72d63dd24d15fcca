// Audio processing tests
//
// These tests focus on the decoding and resampling steps that feed the WAV
// encoder. They verify that WAV files in several sample formats decode into
// per-channel tracks, and that both resampling methods keep the duration,
// channel layout and signal content.
//
// The tests cover:
// - WAV file loading from disk and from memory
// - Target sample rate calculation from a quality factor
// - Linear and spectral resampling
// - Error handling for invalid parameters and files

use resample_wav::audio::{self, AudioError, DecodedAudioBuffer, ResampleMethod};
use std::fs;
use std::path::Path;

use test_utils::{aiff_bytes, ramp_buffer, scratch_dir, sine_buffer, write_fixture};

/// Test WAV file loading functionality.
///
/// This test verifies:
/// - Loading a 16-bit WAV file from disk
/// - Correct extraction of WAV properties (sample rate, channels)
/// - Samples come back within one quantization step
#[test]
fn test_wav_file_loading() {
    let dir = scratch_dir("wav_file_loading");
    let original = sine_buffer(44100, 2, 4410, 440.0, 0.5);
    let path = write_fixture(&dir, "sine.wav", &original);

    let result = audio::read_wav_file(&path).expect("Failed to load WAV file");

    assert_eq!(result.sample_rate, 44100);
    assert_eq!(result.channel_count(), 2);
    assert_eq!(result.frame_count(), 4410);
    for (decoded, source) in result.channels[1].iter().zip(&original.channels[1]) {
        assert!((decoded - source).abs() < 1.0 / 16384.0);
    }
}

/// Test loading a 32-bit float WAV file written by hound.
#[test]
fn test_float_wav_loading() {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for sample in [0.25f32, -0.75, 1.25] {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }

    let buffer = audio::read_wav_bytes(cursor.get_ref()).expect("Failed to decode float WAV");
    assert_eq!(buffer.sample_rate, 8000);
    assert_eq!(buffer.channels, vec![vec![0.25, -0.75, 1.25]]);
}

/// Test decoding a non-WAV container.
///
/// This test verifies:
/// - AIFF data is recognized from its content and decoded through symphonia
/// - Big-endian samples come back normalized and de-interleaved
/// - Files on disk take the same path and WAV input still decodes
#[test]
fn test_aiff_decoding() {
    let interleaved: Vec<i16> = vec![0, 16384, -16384, 32767, 8192, -32768];
    let data = aiff_bytes(8000, 2, &interleaved);

    let buffer = audio::read_audio_bytes(&data, Some("aiff")).expect("Failed to decode AIFF");
    assert_eq!(buffer.sample_rate, 8000);
    assert_eq!(buffer.channel_count(), 2);
    assert_eq!(buffer.frame_count(), 3);

    let expected = [[0.0, -0.5, 0.25], [0.5, 1.0, -1.0]];
    for (track, want) in buffer.channels.iter().zip(expected) {
        for (got, want) in track.iter().zip(want) {
            assert!((got - want).abs() < 1e-3, "got {}, expected {}", got, want);
        }
    }

    // Without a hint the content alone identifies the format
    let unhinted = audio::read_audio_bytes(&data, None).unwrap();
    assert_eq!(unhinted, buffer);

    let dir = scratch_dir("aiff_decoding");
    let path = dir.join("tone.aif");
    fs::write(&path, &data).unwrap();
    assert_eq!(audio::read_audio_file(&path).unwrap(), buffer);

    let wav = write_fixture(&dir, "tone.wav", &sine_buffer(8000, 1, 80, 1000.0, 0.5));
    assert_eq!(audio::read_audio_file(&wav).unwrap().frame_count(), 80);
}

/// Test that unrecognized data is reported as a decoding error.
#[test]
fn test_unknown_container() {
    assert!(matches!(
        audio::read_audio_bytes(b"definitely not audio", Some("mp3")),
        Err(AudioError::Decode(_))
    ));
    assert!(matches!(
        audio::read_audio_bytes(&[], None),
        Err(AudioError::Decode(_))
    ));
}

/// Test de-interleaving of raw samples into channel tracks.
#[test]
fn test_from_interleaved() {
    let buffer =
        DecodedAudioBuffer::from_interleaved(8000, 2, &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]).unwrap();
    assert_eq!(buffer.channels, vec![vec![0.1, 0.3, 0.5], vec![0.2, 0.4, 0.6]]);
    assert_eq!(buffer.frame_count(), 3);

    let partial = DecodedAudioBuffer::from_interleaved(8000, 2, &[0.1, 0.2, 0.3]);
    assert!(matches!(partial, Err(AudioError::InvalidInput(_))));
}

/// Test computing the output sample rate from a quality factor.
#[test]
fn test_target_sample_rate() {
    assert_eq!(audio::target_sample_rate(44100, 0.5).unwrap(), 22050);
    assert_eq!(audio::target_sample_rate(44100, 1.0).unwrap(), 44100);
    assert_eq!(audio::target_sample_rate(48000, 0.1).unwrap(), 4800);

    assert!(audio::target_sample_rate(44100, 0.0).is_err());
    assert!(audio::target_sample_rate(44100, 1.5).is_err());
    assert!(audio::target_sample_rate(44100, f64::NAN).is_err());
    assert!(audio::target_sample_rate(1, 0.5).is_err());
}

/// Test that linear resampling picks the expected points of a ramp.
#[test]
fn test_linear_resampling() {
    let buffer = ramp_buffer(8, 8);
    let result = audio::resample(&buffer, 4, ResampleMethod::Linear).unwrap();

    assert_eq!(result.sample_rate, 4);
    assert_eq!(result.frame_count(), 4);
    let expected = [
        buffer.channels[0][0],
        buffer.channels[0][2],
        buffer.channels[0][4],
        buffer.channels[0][6],
    ];
    for (got, want) in result.channels[0].iter().zip(expected) {
        assert!((got - want).abs() < 1e-6);
    }
}

/// Test that spectral resampling keeps a sine wave below the new Nyquist.
///
/// A 1 kHz sine at 8 kHz resampled to 4 kHz has a period of four samples,
/// so the output should read roughly 0, 1, 0, -1 scaled by the amplitude.
#[test]
fn test_spectral_resampling_keeps_sine() {
    let buffer = sine_buffer(8000, 1, 800, 1000.0, 0.8);
    let result = audio::resample(&buffer, 4000, ResampleMethod::Spectral).unwrap();

    assert_eq!(result.frame_count(), 400);
    for (i, sample) in result.channels[0].iter().enumerate() {
        let expected = 0.8 * (std::f32::consts::PI * i as f32 / 2.0).sin();
        assert!(
            (sample - expected).abs() < 1e-3,
            "frame {}: got {}, expected {}",
            i,
            sample,
            expected
        );
    }
}

/// Test that spectral resampling removes content above the new Nyquist.
#[test]
fn test_spectral_resampling_filters_high_frequencies() {
    // 3 kHz is representable at 8 kHz but not at 4 kHz
    let buffer = sine_buffer(8000, 1, 800, 3000.0, 0.8);
    let result = audio::resample(&buffer, 4000, ResampleMethod::Spectral).unwrap();

    let peak = result.channels[0]
        .iter()
        .fold(0.0f32, |max, s| max.max(s.abs()));
    assert!(peak < 1e-3, "aliased energy left: {}", peak);
}

/// Test spectral resampling of a track longer than one transform block.
///
/// A 441 Hz sine does not repeat evenly inside a block, so any seam between
/// blocks that is misaligned or left ringing shows up as a jump.
#[test]
fn test_spectral_resampling_in_blocks() {
    let buffer = sine_buffer(44100, 1, 200_000, 441.0, 0.5);
    let result = audio::resample(&buffer, 22050, ResampleMethod::Spectral).unwrap();

    assert_eq!(result.frame_count(), 100_000);

    // The ends of the track itself wrap around in the transform
    let edge = 4096;
    for (i, sample) in result.channels[0]
        .iter()
        .enumerate()
        .take(100_000 - edge)
        .skip(edge)
    {
        let phase = 2.0 * std::f64::consts::PI * 441.0 * i as f64 / 22050.0;
        let expected = 0.5 * phase.sin() as f32;
        assert!(
            (sample - expected).abs() < 1e-3,
            "frame {}: got {}, expected {}",
            i,
            sample,
            expected
        );
    }
}

/// Test that resampling keeps the channel layout and duration.
#[test]
fn test_resampling_keeps_layout() {
    let buffer = sine_buffer(44100, 2, 44100, 440.0, 0.5);
    for method in [ResampleMethod::Linear, ResampleMethod::Spectral] {
        let result = audio::resample(&buffer, 11025, method).unwrap();
        assert_eq!(result.channel_count(), 2);
        assert_eq!(result.frame_count(), 11025);
        assert!((result.duration_secs() - buffer.duration_secs()).abs() < 1e-9);
    }

    // Partial frames at the end are dropped
    assert_eq!(audio::output_frame_count(101, 44100, 22050), 50);

    let same = audio::resample(&buffer, 44100, ResampleMethod::Spectral).unwrap();
    assert_eq!(same, buffer);
}

/// Test audio processing error cases.
///
/// This test verifies:
/// - Proper error handling for non-existent and non-WAV files
/// - Resampling rejects malformed buffers and zero rates
#[test]
fn test_audio_error_cases() {
    let result = audio::read_wav_file(Path::new("non_existent_file.wav"));
    assert!(result.is_err(), "Should return error for non-existent file");

    let dir = scratch_dir("audio_error_cases");
    let junk = dir.join("junk.wav");
    fs::write(&junk, b"definitely not a wav file").unwrap();
    assert!(matches!(
        audio::read_wav_file(&junk),
        Err(AudioError::WavParse(_))
    ));

    let malformed = DecodedAudioBuffer {
        sample_rate: 8000,
        channels: vec![vec![0.0; 4], vec![0.0; 2]],
    };
    assert!(matches!(
        audio::resample(&malformed, 4000, ResampleMethod::Linear),
        Err(AudioError::InvalidInput(_))
    ));

    let buffer = ramp_buffer(8000, 16);
    assert!(audio::resample(&buffer, 0, ResampleMethod::Linear).is_err());
}
