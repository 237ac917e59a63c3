//! Trait used to implement your own decoder, plus batch helpers that
//! fan out analysis of many files across a rayon thread pool.

#![allow(clippy::missing_inline_in_public_items)]

use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::mpsc::{self, SendError, SyncSender},
    thread,
};

use log::debug;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    errors::AnalysisResult, DecodedAudio, SAMPLE_RATE,
};

mod pcm;
#[allow(clippy::module_name_repetitions)]
pub use pcm::PcmDecoder;

pub type ProcessingCallback = SyncSender<(PathBuf, AnalysisResult<mashup_core::domain::Analysis>)>;

/// Trait used to implement your own decoder.
///
/// `decode` must resample to one channel at [`SAMPLE_RATE`] Hz, f32le.
/// Anything other than that will yield wrong results for the downstream
/// analysis modules.
#[allow(clippy::module_name_repetitions)]
pub trait Decoder {
    /// # Errors
    ///
    /// Returns an error if the file path is invalid, the file contains no
    /// or corrupted audio, or the decoded audio is too short to analyze.
    fn decode(path: &Path) -> AnalysisResult<DecodedAudio>;

    /// Decode and analyze a single path.
    ///
    /// # Errors
    ///
    /// See [`Decoder::decode`] and [`crate::analyze`].
    #[inline]
    fn analyze_path<P: AsRef<Path>>(path: P) -> AnalysisResult<mashup_core::domain::Analysis> {
        let audio = Self::decode(path.as_ref())?;
        crate::analyze(&audio.samples, SAMPLE_RATE)
    }

    /// Analyze every path in `paths` across all logical cores, emitting
    /// results through `callback` as they complete. Drop the receiver to
    /// cancel the remaining work.
    ///
    /// # Errors
    ///
    /// Errors if the `callback` channel is closed.
    #[inline]
    fn analyze_paths<P: Into<PathBuf>, I: Send + IntoIterator<Item = P>>(
        paths: I,
        callback: mpsc::Sender<(PathBuf, AnalysisResult<mashup_core::domain::Analysis>)>,
    ) -> Result<(), SendError<()>>
    where
        Self: Sync + Send,
    {
        let cores = thread::available_parallelism().unwrap_or(NonZeroUsize::new(1).unwrap());
        Self::analyze_paths_with_cores(paths, cores, callback)
    }

    /// See [`Decoder::analyze_paths`]; caps the worker count at
    /// `number_cores`.
    ///
    /// # Errors
    ///
    /// Errors if the `callback` channel is closed.
    fn analyze_paths_with_cores<P: Into<PathBuf>, I: IntoIterator<Item = P>>(
        paths: I,
        number_cores: NonZeroUsize,
        callback: mpsc::Sender<(PathBuf, AnalysisResult<mashup_core::domain::Analysis>)>,
    ) -> Result<(), SendError<()>>
    where
        Self: Sync + Send,
    {
        let mut cores = thread::available_parallelism().unwrap_or(NonZeroUsize::new(1).unwrap());
        if cores > number_cores {
            cores = number_cores;
        }
        let paths: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();

        if paths.is_empty() {
            return Ok(());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(cores.get())
            .build()
            .unwrap();

        pool.install(|| {
            paths.into_par_iter().try_for_each(|path| {
                debug!("analyzing file '{}'", path.display());
                let analysis = Self::analyze_path(&path);
                callback.send((path, analysis)).map_err(|_| SendError(()))
            })
        })
    }
}
