//! Randomized self-tests behind the `fecrs` subcommands
//!
//! Every batch is generated from its own seed, so any failing batch can be
//! replayed in isolation with `fecrs roundtrip -i 1 --seed <seed>`.

use crate::config::CodecConfig;
use crate::fec::region::{
    accumulate_scaled_reference, assign_scaled_reference, process_with_level, WriteOp,
};
use crate::fec::simd::{available_levels, SimdLevel};
use crate::fec::{self, FecCodec, FecError};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::time::{Duration, Instant};
use thiserror::Error;

/// `(k, m, lost)` shapes exercised by [`run_sweep`]
pub const SWEEP_PATTERNS: [(usize, usize, usize); 5] =
    [(8, 2, 1), (8, 2, 2), (9, 3, 1), (9, 3, 2), (9, 3, 3)];

/// Errors that stop a self-test run before it produces a report
#[derive(Debug, Error)]
pub enum SelfTestError {
    #[error(transparent)]
    Codec(#[from] FecError),

    #[error("Cannot drop {lost} data blocks: at most {limit} can be lost")]
    TooManyLost { lost: usize, limit: usize },

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Per-run knobs for [`run_roundtrip`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundTripOptions {
    pub lost: usize,
    pub iterations: usize,
    pub seed: u64,
}

impl Default for RoundTripOptions {
    fn default() -> Self {
        Self {
            lost: 1,
            iterations: 1000,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundTripReport {
    pub batches: usize,
    /// Seeds of batches that did not decode bit-exactly
    pub failed_seeds: Vec<u64>,
    /// Data bytes pushed through encode + decode
    pub bytes: u64,
    pub elapsed: Duration,
}

impl RoundTripReport {
    pub fn is_success(&self) -> bool {
        self.failed_seeds.is_empty()
    }

    /// Data throughput in MiB/s
    pub fn throughput_mib_s(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.bytes as f64 / (1024.0 * 1024.0) / secs
    }
}

/// Encode, lose `lost` data blocks and decode, `iterations` times
///
/// Batches are spread over a dedicated rayon pool sized from `config`.
/// Decoding uses a random subset of the FEC blocks, never fewer than `lost`.
pub fn run_roundtrip(
    config: &CodecConfig,
    options: &RoundTripOptions,
) -> Result<RoundTripReport, SelfTestError> {
    let codec = config.build_codec()?;
    let limit = codec.data_blocks().min(codec.fec_blocks());
    if options.lost > limit {
        return Err(SelfTestError::TooManyLost {
            lost: options.lost,
            limit,
        });
    }

    let pool = config.build_thread_pool()?;
    log::info!(
        "round trip: k={} m={} size={} lost={} batches={} threads={}",
        codec.data_blocks(),
        codec.fec_blocks(),
        config.fragment_size,
        options.lost,
        options.iterations,
        pool.current_num_threads()
    );

    let start = Instant::now();
    let outcomes = pool.install(|| {
        (0..options.iterations)
            .into_par_iter()
            .map(|i| {
                let seed = options.seed.wrapping_add(i as u64);
                roundtrip_batch(&codec, config.fragment_size, options.lost, seed)
                    .map(|ok| (seed, ok))
            })
            .collect::<fec::Result<Vec<_>>>()
    })?;
    let elapsed = start.elapsed();

    let failed_seeds: Vec<u64> = outcomes
        .into_iter()
        .filter(|(_, ok)| !ok)
        .map(|(seed, _)| seed)
        .collect();
    for seed in &failed_seeds {
        log::error!("batch with seed {} did not round-trip", seed);
    }

    Ok(RoundTripReport {
        batches: options.iterations,
        failed_seeds,
        bytes: (options.iterations * codec.data_blocks() * config.fragment_size) as u64,
        elapsed,
    })
}

/// One seeded batch; `Ok(false)` means the decoded data differed
pub fn roundtrip_batch(
    codec: &FecCodec,
    fragment_len: usize,
    lost: usize,
    seed: u64,
) -> fec::Result<bool> {
    let mut rng = StdRng::seed_from_u64(seed);
    let (k, m) = (codec.data_blocks(), codec.fec_blocks());
    if lost > m {
        return Err(FecError::InsufficientRedundancy {
            erased: lost,
            received: m,
        });
    }
    if lost > k {
        return Err(FecError::DataIndexOutOfRange {
            index: lost - 1,
            data_blocks: k,
        });
    }

    let original: Vec<Vec<u8>> = (0..k).map(|_| random_block(&mut rng, fragment_len)).collect();
    let mut fec = vec![vec![0u8; fragment_len]; m];
    codec.encode(fragment_len, &original, &mut fec)?;

    let erased = index::sample(&mut rng, k, lost).into_vec();
    let received = rng.random_range(lost..=m);
    let fec_indices = index::sample(&mut rng, m, received).into_vec();

    let mut data = original.clone();
    for &e in &erased {
        rng.fill(&mut data[e][..]);
    }
    let mut fec: Vec<Vec<u8>> = fec_indices.iter().map(|&r| fec[r].clone()).collect();

    codec.decode(fragment_len, &mut data, &erased, &mut fec, &fec_indices)?;
    Ok(data == original)
}

fn random_block(rng: &mut StdRng, len: usize) -> Vec<u8> {
    let mut block = vec![0u8; len];
    rng.fill(&mut block[..]);
    block
}

/// A `(k, m, lost, size)` case that failed during [`run_sweep`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepFailure {
    pub data_blocks: usize,
    pub fec_blocks: usize,
    pub lost: usize,
    pub fragment_len: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub cases: usize,
    pub failures: Vec<SweepFailure>,
}

/// One batch per fragment size in `1..=max_size` for every [`SWEEP_PATTERNS`] shape
pub fn run_sweep(max_size: usize) -> fec::Result<SweepReport> {
    let mut report = SweepReport::default();

    for &(k, m, lost) in &SWEEP_PATTERNS {
        let codec = FecCodec::new(k, m)?;
        log::info!("sweep: k={} m={} lost={} sizes 1..={}", k, m, lost, max_size);
        for fragment_len in 1..=max_size {
            report.cases += 1;
            if !roundtrip_batch(&codec, fragment_len, lost, fragment_len as u64)? {
                log::error!("sweep: k={} m={} lost={} size={} failed", k, m, lost, fragment_len);
                report.failures.push(SweepFailure {
                    data_blocks: k,
                    fec_blocks: m,
                    lost,
                    fragment_len,
                });
            }
        }
    }

    Ok(report)
}

/// A region kernel result that disagreed with the bitwise reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelMismatch {
    pub level: SimdLevel,
    pub mode: WriteOp,
    pub coefficient: u8,
    pub size: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KernelReport {
    pub levels: Vec<SimdLevel>,
    pub checks: usize,
    pub mismatches: Vec<KernelMismatch>,
}

/// Compare every available kernel with the bitwise reference
///
/// Covers all 256 coefficients, both write modes and every size in
/// `0..=max_size`.
pub fn verify_region_kernels(max_size: usize) -> KernelReport {
    let mut report = KernelReport {
        levels: available_levels(),
        ..KernelReport::default()
    };

    for size in 0..=max_size {
        let mut rng = StdRng::seed_from_u64(size as u64);
        let src = random_block(&mut rng, size);
        let base = random_block(&mut rng, size);

        for coefficient in 0..=255u8 {
            for mode in [WriteOp::Direct, WriteOp::Add] {
                let mut expected = base.clone();
                match mode {
                    WriteOp::Direct => assign_scaled_reference(&mut expected, &src, coefficient),
                    WriteOp::Add => accumulate_scaled_reference(&mut expected, &src, coefficient),
                }

                for &level in &report.levels {
                    let mut actual = base.clone();
                    process_with_level(&mut actual, &src, coefficient, mode, level);
                    report.checks += 1;
                    if actual != expected {
                        report.mismatches.push(KernelMismatch {
                            level,
                            mode,
                            coefficient,
                            size,
                        });
                    }
                }
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_is_reproducible_from_seed() {
        let codec = FecCodec::new(5, 3).unwrap();
        for seed in 0..20 {
            assert!(roundtrip_batch(&codec, 33, 3, seed).unwrap());
        }
    }

    #[test]
    fn small_roundtrip_run() {
        let config = CodecConfig {
            threads: 2,
            ..CodecConfig::new(9, 3, 64)
        };
        let options = RoundTripOptions {
            lost: 2,
            iterations: 16,
            seed: 7,
        };
        let report = run_roundtrip(&config, &options).unwrap();
        assert!(report.is_success());
        assert_eq!(report.batches, 16);
        assert_eq!(report.bytes, 16 * 9 * 64);
    }

    #[test]
    fn losing_more_than_m_is_rejected() {
        let config = CodecConfig::new(8, 2, 16);
        let options = RoundTripOptions {
            lost: 3,
            ..RoundTripOptions::default()
        };
        assert!(matches!(
            run_roundtrip(&config, &options),
            Err(SelfTestError::TooManyLost { lost: 3, limit: 2 })
        ));
    }

    #[test]
    fn short_sweep_passes() {
        let report = run_sweep(40).unwrap();
        assert_eq!(report.cases, 5 * 40);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn kernels_agree_on_small_sizes() {
        let report = verify_region_kernels(40);
        assert!(report.mismatches.is_empty(), "{:?}", report.mismatches);
        assert_eq!(report.checks, 41 * 256 * 2 * report.levels.len());
    }
}
