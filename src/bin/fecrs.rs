//! `fecrs` - self-test and throughput tool for the erasure codec
//!
//! - `roundtrip`: random batches through encode, loss and decode
//! - `sweep`: every fragment size over the standard loss patterns
//! - `verify-gf`: SIMD region kernels against the scalar reference

use anyhow::{Context, Result};
use fecrs::selftest::{self, RoundTripOptions};
use fecrs::CodecConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    fecrs::fec::init();
    let matches = fecrs::parse_args();

    match matches.subcommand() {
        Some(("roundtrip", sub_matches)) => handle_roundtrip(sub_matches),
        Some(("sweep", sub_matches)) => handle_sweep(sub_matches),
        Some(("verify-gf", sub_matches)) => handle_verify_gf(sub_matches),
        Some((cmd, _)) => anyhow::bail!("Unknown command: {}", cmd),
        None => anyhow::bail!("No command specified"),
    }
}

fn parse_number<T: std::str::FromStr>(matches: &clap::ArgMatches, id: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = matches
        .get_one::<String>(id)
        .with_context(|| format!("Missing --{}", id))?;
    raw.parse()
        .with_context(|| format!("Invalid value for --{}: {}", id, raw))
}

fn handle_roundtrip(matches: &clap::ArgMatches) -> Result<()> {
    let config = CodecConfig::from_args(matches).context("Invalid roundtrip arguments")?;
    let options = RoundTripOptions {
        lost: parse_number(matches, "lost")?,
        iterations: parse_number(matches, "iterations")?,
        seed: parse_number(matches, "seed")?,
    };

    let report = selftest::run_roundtrip(&config, &options).context("Round trip failed")?;

    println!(
        "k={} m={} size={} lost={}: {} batches, {} failed, {:.1} MiB/s ({:.3}s)",
        config.data_blocks,
        config.fec_blocks,
        config.fragment_size,
        options.lost,
        report.batches,
        report.failed_seeds.len(),
        report.throughput_mib_s(),
        report.elapsed.as_secs_f64()
    );

    anyhow::ensure!(
        report.is_success(),
        "{} batches did not round-trip (first seed {})",
        report.failed_seeds.len(),
        report.failed_seeds[0]
    );
    Ok(())
}

fn handle_sweep(matches: &clap::ArgMatches) -> Result<()> {
    let max_size: usize = parse_number(matches, "max-size")?;
    let report = selftest::run_sweep(max_size).context("Sweep failed")?;

    println!("{} cases, {} failed", report.cases, report.failures.len());
    for failure in &report.failures {
        println!(
            "  k={} m={} lost={} size={}",
            failure.data_blocks, failure.fec_blocks, failure.lost, failure.fragment_len
        );
    }

    anyhow::ensure!(report.failures.is_empty(), "Sweep found mismatches");
    Ok(())
}

fn handle_verify_gf(matches: &clap::ArgMatches) -> Result<()> {
    let max_size: usize = parse_number(matches, "max-size")?;
    let report = selftest::verify_region_kernels(max_size);

    println!(
        "Kernels {:?}: {} checks, {} mismatches",
        report.levels,
        report.checks,
        report.mismatches.len()
    );
    for mismatch in report.mismatches.iter().take(20) {
        println!(
            "  {:?} {:?} c={:#04x} size={}",
            mismatch.level, mismatch.mode, mismatch.coefficient, mismatch.size
        );
    }

    anyhow::ensure!(report.mismatches.is_empty(), "Region kernels disagree with reference");
    Ok(())
}
