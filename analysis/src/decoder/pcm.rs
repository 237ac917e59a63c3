//! Default decoder: rodio decodes the container, rubato resamples to the
//! canonical analysis rate.

use std::{f32::consts::SQRT_2, fs::File, io::BufReader, path::Path};

use rodio::Source;
use rubato::{FastFixedIn, PolynomialDegree, Resampler};

use crate::errors::{AnalysisError, AnalysisResult};
use crate::{DecodedAudio, SAMPLE_RATE};

use super::Decoder;

/// Decodes any container rodio understands and resamples to
/// [`SAMPLE_RATE`] mono f32.
#[allow(clippy::module_name_repetitions)]
pub struct PcmDecoder();

impl Decoder for PcmDecoder {
    #[allow(clippy::missing_inline_in_public_items)]
    fn decode(path: &Path) -> AnalysisResult<DecodedAudio> {
        let file = BufReader::new(File::open(path)?);
        let source = rodio::Decoder::new(file)?.convert_samples::<f32>();

        let num_channels = source.channels() as usize;
        let sample_rate = source.sample_rate();
        if source.total_duration().is_none() {
            return Err(AnalysisError::IndeterminateDuration);
        }

        let mut mono_sample_array: Vec<f32> = match num_channels {
            0 => return Err(AnalysisError::Decode(rodio::decoder::DecoderError::NoStreams)),
            // already mono
            1 => source.collect(),
            // stereo: equal-power sum down to mono
            2 => source
                .collect::<Vec<_>>()
                .chunks_exact(2)
                .map(|chunk| (chunk[0] + chunk[1]) * SQRT_2 / 2.)
                .collect(),
            // 2.1 / 5.1 surround: plain average
            _ => {
                log::warn!(
                    "audio source has {num_channels} channels, collapsing to mono by averaging"
                );
                source
                    .collect::<Vec<_>>()
                    .chunks_exact(num_channels)
                    .map(|chunk| chunk.iter().sum::<f32>() / num_channels as f32)
                    .collect()
            }
        };

        let resampled_array = if sample_rate == SAMPLE_RATE {
            mono_sample_array.shrink_to_fit();
            mono_sample_array
        } else {
            let mut resampler = FastFixedIn::new(
                f64::from(SAMPLE_RATE) / f64::from(sample_rate),
                1.0,
                PolynomialDegree::Cubic,
                mono_sample_array.len(),
                1,
            )?;
            resampler.process(&[&mono_sample_array], None)?[0].clone()
        };

        if resampled_array.len() < crate::MINIMUM_ANALYSIS_SAMPLES {
            return Err(AnalysisError::TooShort);
        }

        Ok(DecodedAudio {
            path: path.to_owned(),
            samples: resampled_array,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Decoder as DecoderTrait, PcmDecoder as Decoder};

    #[test]
    fn missing_file_is_an_io_error() {
        let result = Decoder::decode(std::path::Path::new("data/does-not-exist.wav"));
        assert!(result.is_err());
    }
}
