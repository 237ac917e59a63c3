//! WAV emission: 24-bit PCM at the target sample rate, matching the
//! original's `soundfile` `PCM_24` output subtype.

use std::io::Write;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::errors::RenderResult;

const BITS_PER_SAMPLE: u16 = 24;
const MAX_24_BIT: f64 = 8_388_607.0;

fn spec(sample_rate: u32) -> WavSpec {
    WavSpec { channels: 1, sample_rate, bits_per_sample: BITS_PER_SAMPLE, sample_format: SampleFormat::Int }
}

/// # Errors
///
/// Returns a [`crate::errors::RenderError::Wav`] if the writer cannot be
/// created or a sample write fails.
pub fn write_wav<W: Write + std::io::Seek>(writer: W, samples: &[f64], sample_rate: u32) -> RenderResult<()> {
    let mut wav_writer = WavWriter::new(writer, spec(sample_rate))?;
    for sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        wav_writer.write_sample((clamped * MAX_24_BIT).round() as i32)?;
    }
    wav_writer.finalize()?;
    Ok(())
}
