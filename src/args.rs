use clap::{Arg, ArgAction, Command};

fn threads_arg() -> Arg {
    Arg::new("threads")
        .short('t')
        .long("threads")
        .help("Number of CPU threads for computation (0 = auto-detect)")
        .value_name("N")
        .default_value("0")
}

fn max_size_arg(default: &'static str) -> Arg {
    Arg::new("max-size")
        .long("max-size")
        .help("Largest fragment size to test, in bytes")
        .value_name("BYTES")
        .default_value(default)
}

/// Command-line definition for the `fecrs` self-test tool
pub fn build_cli() -> Command {
    Command::new("fecrs")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Systematic GF(256) erasure codec self-test and benchmark tool")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .subcommand(
            Command::new("roundtrip")
                .about("Encode random batches, drop data blocks and verify the decoder rebuilds them")
                .arg(
                    Arg::new("data-blocks")
                        .short('k')
                        .long("data-blocks")
                        .help("Data blocks per batch (1-128)")
                        .value_name("K")
                        .default_value("8"),
                )
                .arg(
                    Arg::new("fec-blocks")
                        .short('m')
                        .long("fec-blocks")
                        .help("FEC blocks per batch (0-128)")
                        .value_name("M")
                        .default_value("2"),
                )
                .arg(
                    Arg::new("size")
                        .short('s')
                        .long("size")
                        .help("Fragment size in bytes")
                        .value_name("BYTES")
                        .default_value("1024"),
                )
                .arg(
                    Arg::new("lost")
                        .short('l')
                        .long("lost")
                        .help("Data blocks dropped per batch (at most M)")
                        .value_name("N")
                        .default_value("1"),
                )
                .arg(
                    Arg::new("iterations")
                        .short('i')
                        .long("iterations")
                        .help("Number of batches")
                        .value_name("N")
                        .default_value("1000"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed for the random batches")
                        .value_name("SEED")
                        .default_value("0"),
                )
                .arg(threads_arg())
                .arg(
                    Arg::new("no-parallel")
                        .long("no-parallel")
                        .help("Disable all parallel processing")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("sweep")
                .about("Round-trip every fragment size up to --max-size over the standard loss patterns")
                .arg(max_size_arg("2048")),
        )
        .subcommand(
            Command::new("verify-gf")
                .about("Check every SIMD kernel on this CPU against the scalar reference")
                .arg(max_size_arg("256")),
        )
}

pub fn parse_args() -> clap::ArgMatches {
    build_cli().get_matches()
}
