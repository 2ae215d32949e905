//! SIMD-accelerated GF(2^8) region multiplication
//!
//! Platform-specific kernels with runtime dispatch:
//! - x86_64: PSHUFB (AVX2, then SSSE3) → scalar
//! - aarch64: NEON → scalar
//! - Other: scalar
//!
//! Based on the "Screaming Fast Galois Field Arithmetic" paper.
//!
//! # Note
//! This module is public for benchmarks and tests but not part of the stable API.
//! Use [`assign_scaled`](super::assign_scaled) and
//! [`accumulate_scaled`](super::accumulate_scaled) instead.

pub mod common;
#[cfg(target_arch = "aarch64")]
pub mod neon;
#[cfg(target_arch = "x86_64")]
pub mod pshufb;

use super::region::WriteOp;
use common::NibbleTables;
use std::sync::OnceLock;

/// SIMD implementation to use for the current platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdLevel {
    /// No SIMD available, use scalar fallback
    None,
    /// x86_64 SSSE3 (128-bit PSHUFB)
    Ssse3,
    /// x86_64 AVX2 (256-bit PSHUFB)
    Avx2,
    /// aarch64 NEON (128-bit TBL)
    Neon,
}

impl SimdLevel {
    /// Whether this level can run on the current CPU
    pub fn is_supported(self) -> bool {
        match self {
            SimdLevel::None => true,
            #[cfg(target_arch = "x86_64")]
            SimdLevel::Ssse3 => is_x86_feature_detected!("ssse3"),
            #[cfg(target_arch = "x86_64")]
            SimdLevel::Avx2 => {
                is_x86_feature_detected!("avx2") && is_x86_feature_detected!("ssse3")
            }
            #[cfg(target_arch = "aarch64")]
            SimdLevel::Neon => std::arch::is_aarch64_feature_detected!("neon"),
            #[allow(unreachable_patterns)]
            _ => false,
        }
    }
}

/// Detect best available SIMD implementation for current platform
pub fn detect_simd_support() -> SimdLevel {
    #[cfg(target_arch = "x86_64")]
    {
        if SimdLevel::Avx2.is_supported() {
            return SimdLevel::Avx2;
        }
        if SimdLevel::Ssse3.is_supported() {
            return SimdLevel::Ssse3;
        }
        SimdLevel::None
    }

    #[cfg(target_arch = "aarch64")]
    {
        if SimdLevel::Neon.is_supported() {
            return SimdLevel::Neon;
        }
        SimdLevel::None
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        SimdLevel::None
    }
}

static DETECTED: OnceLock<SimdLevel> = OnceLock::new();

/// Detected level, probed once per process
pub fn active_level() -> SimdLevel {
    *DETECTED.get_or_init(|| {
        let level = detect_simd_support();
        log::debug!("GF(2^8) region kernels: {:?}", level);
        level
    })
}

/// Every level usable on this CPU, scalar first
pub fn available_levels() -> Vec<SimdLevel> {
    [
        SimdLevel::None,
        SimdLevel::Ssse3,
        SimdLevel::Avx2,
        SimdLevel::Neon,
    ]
    .into_iter()
    .filter(|level| level.is_supported())
    .collect()
}

/// Run the vector kernel for `level` over the leading whole vectors
///
/// Returns the number of bytes written; the caller handles the tail. Levels
/// the CPU does not support process nothing and return 0.
#[doc(hidden)]
pub fn process_vectors(
    input: &[u8],
    output: &mut [u8],
    tables: &NibbleTables,
    mode: WriteOp,
    level: SimdLevel,
) -> usize {
    if !level.is_supported() {
        return 0;
    }

    match level {
        #[cfg(target_arch = "x86_64")]
        // SAFETY: AVX2 support checked above; `&[u8]` and `&mut [u8]` cannot alias.
        SimdLevel::Avx2 => unsafe {
            pshufb::process_slice_multiply_avx2(input, output, tables, mode)
        },
        #[cfg(target_arch = "x86_64")]
        // SAFETY: SSSE3 support checked above.
        SimdLevel::Ssse3 => unsafe {
            pshufb::process_slice_multiply_ssse3(input, output, tables, mode)
        },
        #[cfg(target_arch = "aarch64")]
        // SAFETY: NEON support checked above.
        SimdLevel::Neon => unsafe {
            neon::process_slice_multiply_neon(input, output, tables, mode)
        },
        _ => 0,
    }
}
