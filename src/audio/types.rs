/// Decoded audio held as one sample track per channel.
///
/// Samples are nominally in the [-1, 1] range. Values outside of it are kept
/// as-is and only clamped when the buffer is encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudioBuffer {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// One track per channel, all of the same length
    pub channels: Vec<Vec<f32>>,
}

/// An encoded canonical WAV file (44-byte RIFF header followed by 16-bit PCM)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavContainer {
    bytes: Vec<u8>,
}

/// Errors that can occur during audio processing
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// IO errors when reading/writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors during WAV file parsing
    #[error("WAV parsing error: {0}")]
    WavParse(String),

    /// Errors while identifying or decoding a non-WAV container
    #[error("Audio decoding error: {0}")]
    Decode(String),

    /// Malformed audio buffers handed to the encoder or resampler
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid parameter values
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// General processing errors
    #[error("Processing error: {0}")]
    ProcessingError(String),
}

impl DecodedAudioBuffer {
    /// Creates a buffer from per-channel tracks.
    ///
    /// # Errors
    /// * `AudioError::InvalidInput` if the channels differ in length
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self, AudioError> {
        let buffer = DecodedAudioBuffer {
            sample_rate,
            channels,
        };
        buffer.validate()?;
        Ok(buffer)
    }

    /// Creates a buffer from interleaved samples (frame 0 ch 0, frame 0 ch 1, ...).
    ///
    /// # Errors
    /// * `AudioError::InvalidInput` if the sample count is not a whole number of frames
    pub fn from_interleaved(
        sample_rate: u32,
        channel_count: usize,
        samples: &[f32],
    ) -> Result<Self, AudioError> {
        if channel_count == 0 {
            if samples.is_empty() {
                return Ok(DecodedAudioBuffer {
                    sample_rate,
                    channels: Vec::new(),
                });
            }
            return Err(AudioError::InvalidInput(format!(
                "{} samples given for a buffer with no channels",
                samples.len()
            )));
        }

        if samples.len() % channel_count != 0 {
            return Err(AudioError::InvalidInput(format!(
                "{} samples do not divide evenly into {} channels",
                samples.len(),
                channel_count
            )));
        }

        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (track, &sample) in channels.iter_mut().zip(frame) {
                track.push(sample);
            }
        }

        Ok(DecodedAudioBuffer {
            sample_rate,
            channels,
        })
    }

    /// Checks that every channel holds the same number of frames
    pub fn validate(&self) -> Result<(), AudioError> {
        let expected = self.frame_count();
        match self
            .channels
            .iter()
            .enumerate()
            .find(|(_, track)| track.len() != expected)
        {
            Some((index, track)) => Err(AudioError::InvalidInput(format!(
                "Channel {} has {} frames but channel 0 has {}",
                index,
                track.len(),
                expected
            ))),
            None => Ok(()),
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel
    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / self.sample_rate as f64
    }
}

impl WavContainer {
    /// MIME type to deliver the file with
    pub const MIME_TYPE: &'static str = "audio/wav";

    pub(crate) fn from_bytes(bytes: Vec<u8>) -> Self {
        WavContainer { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for WavContainer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
