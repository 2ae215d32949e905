pub mod args;
pub mod config;
pub mod fec;
pub mod selftest;

pub use args::parse_args;
pub use config::{CodecConfig, ConfigError};
pub use fec::{decode, encode, FecCodec, FecError};
