//! Configuration for codec runs

use crate::fec::{self, FecCodec};
use thiserror::Error;

/// A command-line value that could not be turned into a setting
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for --{arg}: {value:?}")]
    InvalidValue { arg: &'static str, value: String },
}

/// Code shape and execution settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Data blocks per batch (`k`)
    pub data_blocks: usize,
    /// FEC blocks per batch (`m`)
    pub fec_blocks: usize,
    /// Bytes per block
    pub fragment_size: usize,
    /// Number of threads for computation (0 = auto-detect)
    pub threads: usize,
    /// Whether to use parallel processing (false = single-threaded everything)
    pub parallel: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            data_blocks: 8,
            fec_blocks: 2,
            fragment_size: 1024,
            threads: 0, // Auto-detect CPU cores
            parallel: true,
        }
    }
}

impl CodecConfig {
    pub fn new(data_blocks: usize, fec_blocks: usize, fragment_size: usize) -> Self {
        Self {
            data_blocks,
            fec_blocks,
            fragment_size,
            ..Self::default()
        }
    }

    /// Read `-k`, `-m`, `-s`, `-t` and `--no-parallel`; absent values keep their defaults
    ///
    /// # Errors
    /// [`ConfigError::InvalidValue`] when a supplied number does not parse.
    pub fn from_args(matches: &clap::ArgMatches) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |arg: &'static str, fallback: usize| match matches.get_one::<String>(arg) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                arg,
                value: raw.clone(),
            }),
            None => Ok(fallback),
        };

        Ok(Self {
            data_blocks: get("data-blocks", defaults.data_blocks)?,
            fec_blocks: get("fec-blocks", defaults.fec_blocks)?,
            fragment_size: get("size", defaults.fragment_size)?,
            threads: get("threads", defaults.threads)?,
            parallel: !matches.get_flag("no-parallel"),
        })
    }

    /// Get effective thread count (auto-detect if 0)
    pub fn effective_threads(&self) -> usize {
        match (self.parallel, self.threads) {
            (false, _) => 1, // Sequential mode always uses single thread
            (true, 0) => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            (true, n) => n,
        }
    }

    /// Validated codec for this shape
    pub fn build_codec(&self) -> fec::Result<FecCodec> {
        Ok(FecCodec::new(self.data_blocks, self.fec_blocks)?.parallel(self.parallel))
    }

    /// Dedicated rayon pool sized by [`effective_threads`](Self::effective_threads)
    pub fn build_thread_pool(&self) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.effective_threads())
            .thread_name(|i| format!("fecrs-{i}"))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_mode_is_single_threaded() {
        let config = CodecConfig {
            threads: 12,
            parallel: false,
            ..CodecConfig::default()
        };
        assert_eq!(config.effective_threads(), 1);
        assert!(!config.build_codec().unwrap().is_parallel());
    }

    #[test]
    fn explicit_thread_count_wins() {
        let config = CodecConfig {
            threads: 3,
            ..CodecConfig::default()
        };
        assert_eq!(config.effective_threads(), 3);
        assert_eq!(config.build_thread_pool().unwrap().current_num_threads(), 3);
    }

    #[test]
    fn invalid_shape_is_rejected() {
        assert_eq!(
            CodecConfig::new(0, 2, 64).build_codec(),
            Err(fec::FecError::NoDataBlocks)
        );
        assert_eq!(
            CodecConfig::new(4, 129, 64).build_codec(),
            Err(fec::FecError::TooManyFecBlocks { count: 129 })
        );
    }
}
