use tallyvox_core::AudioError;

/// Converts interleaved stereo S16LE PCM at the transport rate to mono S16LE
/// at the recognizer rate.
///
/// Conversion is stateless per call: no filter state is carried between
/// buffers, so boundary smearing is bounded to one decimation group. That is
/// a fixed contract for this type, not a runtime switch.
///
/// The source rate must be a whole multiple of the target rate. Each mono
/// sample of output is the average of one full group of `source / target`
/// downmixed input samples; a trailing partial group is dropped, as is any
/// trailing byte run shorter than one stereo frame.
#[derive(Debug, Clone)]
pub struct Resampler {
    source_rate: u32,
    target_rate: u32,
    factor: usize,
}

// One interleaved stereo frame: two 16-bit samples.
const STEREO_FRAME_BYTES: usize = 4;

impl Resampler {
    pub fn new(source_rate: u32, target_rate: u32) -> Result<Self, AudioError> {
        if source_rate == 0 || target_rate == 0 || source_rate % target_rate != 0 {
            return Err(AudioError::UnsupportedRates {
                source_rate,
                target_rate,
            });
        }
        Ok(Self {
            source_rate,
            target_rate,
            factor: (source_rate / target_rate) as usize,
        })
    }

    pub fn source_rate(&self) -> u32 {
        self.source_rate
    }

    pub fn target_rate(&self) -> u32 {
        self.target_rate
    }

    /// Downmix and decimate one buffer. Empty or truncated input yields as
    /// many whole samples as the bytes cover; it is never an error.
    pub fn convert(&self, pcm: &[u8]) -> Vec<i16> {
        let whole_frames = pcm.len() / STEREO_FRAME_BYTES;
        if whole_frames == 0 {
            return Vec::new();
        }

        let mut mono = Vec::with_capacity(whole_frames);
        for frame in pcm[..whole_frames * STEREO_FRAME_BYTES].chunks_exact(STEREO_FRAME_BYTES) {
            let left = i16::from_le_bytes([frame[0], frame[1]]) as i32;
            let right = i16::from_le_bytes([frame[2], frame[3]]) as i32;
            mono.push(((left + right) / 2) as i16);
        }

        let groups = mono.len() / self.factor;
        let mut out = Vec::with_capacity(groups);
        for group in mono[..groups * self.factor].chunks_exact(self.factor) {
            let sum: i32 = group.iter().map(|&s| s as i32).sum();
            out.push((sum / self.factor as i32) as i16);
        }
        out
    }
}
