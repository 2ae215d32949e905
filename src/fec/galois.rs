//! Galois Field GF(2^8) arithmetic for the erasure codec
//!
//! ## Field Polynomial
//!
//! The field is generated by the primitive polynomial **0x11D**
//! (x⁸ + x⁴ + x³ + x² + 1) with α = x as the primitive element.
//!
//! ## Tables
//!
//! All arithmetic goes through four precomputed tables:
//!
//! - `exp[i] = αⁱ`, doubled to 510 entries so `exp[log a + log b]` never needs a modulo
//! - `log[αⁱ] = i`, with `log[0] = 255` as sentinel (log of zero is undefined)
//! - `inverse[a] = α^(255 - log a)`, with `inverse[0] = 0` by convention
//! - `mul[a][b]`, the full 64KB product table with row and column 0 forced to zero
//!
//! The tables are built exactly once per process behind a `OnceLock` and are
//! read-only afterwards, so any number of threads can encode and decode
//! concurrently without locking.

use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};
use std::sync::OnceLock;

/// Width of a field element in bits
pub const GF_BITS: usize = 8;

const _: () = assert!(GF_BITS == 8, "the codec is defined over GF(2^8) only");

/// Number of nonzero field elements (order of the multiplicative group)
pub const GF_SIZE: usize = (1 << GF_BITS) - 1;

/// Primitive polynomial 0x11D (x⁸ + x⁴ + x³ + x² + 1)
pub const FIELD_POLYNOMIAL: u16 = 0x11D;

/// Precomputed lookup tables for GF(2^8)
pub struct GaloisTables {
    exp: [u8; 2 * GF_SIZE],
    log: [u8; GF_SIZE + 1],
    inverse: [u8; GF_SIZE + 1],
    mul: Box<[[u8; GF_SIZE + 1]]>,
}

static TABLES: OnceLock<GaloisTables> = OnceLock::new();

/// Build the process-wide tables if that has not happened yet
///
/// Calling this more than once (or concurrently) is harmless: the first caller
/// builds the tables, everyone else waits for and then shares the result.
pub fn init() {
    tables();
}

/// Whether the process-wide tables have been built
pub fn is_initialized() -> bool {
    TABLES.get().is_some()
}

/// Access the process-wide tables, building them on first use
#[inline]
pub fn tables() -> &'static GaloisTables {
    TABLES.get_or_init(GaloisTables::new)
}

impl GaloisTables {
    fn new() -> Self {
        let mut tables = GaloisTables {
            exp: [0; 2 * GF_SIZE],
            log: [0; GF_SIZE + 1],
            inverse: [0; GF_SIZE + 1],
            mul: vec![[0u8; GF_SIZE + 1]; GF_SIZE + 1].into_boxed_slice(),
        };
        tables.build_exp_log();
        tables.build_inverse();
        tables.build_mul();
        log::debug!(
            "GF(2^{}) tables built for polynomial {:#x}",
            GF_BITS,
            FIELD_POLYNOMIAL
        );
        tables
    }

    fn build_exp_log(&mut self) {
        // The first GF_BITS powers of α are plain bit shifts. Every polynomial
        // bit below x^8 contributes to α^8.
        let mut mask = 1u8;
        self.exp[GF_BITS] = 0;
        for i in 0..GF_BITS {
            self.exp[i] = mask;
            self.log[mask as usize] = i as u8;
            if FIELD_POLYNOMIAL & (1 << i) != 0 {
                self.exp[GF_BITS] ^= mask;
            }
            mask = mask.wrapping_shl(1);
        }
        self.log[self.exp[GF_BITS] as usize] = GF_BITS as u8;

        // α^(i+1) is α^i shifted left, folding α^8 back in when the top bit falls out.
        let high_bit = 1u8 << (GF_BITS - 1);
        for i in GF_BITS + 1..GF_SIZE {
            let prev = self.exp[i - 1];
            self.exp[i] = if prev >= high_bit {
                self.exp[GF_BITS] ^ ((prev ^ high_bit) << 1)
            } else {
                prev << 1
            };
            self.log[self.exp[i] as usize] = i as u8;
        }

        self.log[0] = GF_SIZE as u8;

        for i in 0..GF_SIZE {
            self.exp[i + GF_SIZE] = self.exp[i];
        }
    }

    fn build_inverse(&mut self) {
        self.inverse[0] = 0;
        self.inverse[1] = 1;
        for i in 2..=GF_SIZE {
            self.inverse[i] = self.exp[GF_SIZE - self.log[i] as usize];
        }
    }

    fn build_mul(&mut self) {
        for a in 1..=GF_SIZE {
            let log_a = self.log[a] as usize;
            for b in 1..=GF_SIZE {
                self.mul[a][b] = self.exp[log_a + self.log[b] as usize];
            }
        }
        // log[0] is only a sentinel, so products with zero are set explicitly
        for i in 0..=GF_SIZE {
            self.mul[0][i] = 0;
            self.mul[i][0] = 0;
        }
    }

    /// Multiply two field elements
    #[inline]
    pub fn mul(&self, a: u8, b: u8) -> u8 {
        self.mul[a as usize][b as usize]
    }

    /// Multiplicative inverse (`inverse(0)` is 0 by convention)
    #[inline]
    pub fn inverse(&self, a: u8) -> u8 {
        self.inverse[a as usize]
    }

    /// Discrete logarithm of `a` (`255` for zero)
    #[inline]
    pub fn log(&self, a: u8) -> u8 {
        self.log[a as usize]
    }

    /// α raised to `power`, for `power < 510`
    #[inline]
    pub fn exp(&self, power: usize) -> u8 {
        self.exp[power]
    }

    /// Row of the product table: `mul_row(c)[x] == c * x`
    ///
    /// Used as the per-coefficient lookup table by the region operations, so a
    /// whole block multiplied by one scalar touches a single 256-byte row.
    #[inline]
    pub fn mul_row(&self, c: u8) -> &[u8; GF_SIZE + 1] {
        &self.mul[c as usize]
    }

    /// The doubled exponent table
    pub fn exp_table(&self) -> &[u8; 2 * GF_SIZE] {
        &self.exp
    }

    /// The logarithm table
    pub fn log_table(&self) -> &[u8; GF_SIZE + 1] {
        &self.log
    }

    /// The inverse table
    pub fn inverse_table(&self) -> &[u8; GF_SIZE + 1] {
        &self.inverse
    }
}

/// Multiply two field elements using the process-wide tables
#[inline]
pub fn gf_mul(a: u8, b: u8) -> u8 {
    tables().mul(a, b)
}

/// Inverse of a field element using the process-wide tables (0 maps to 0)
#[inline]
pub fn gf_inverse(a: u8) -> u8 {
    tables().inverse(a)
}

/// Table-free shift-and-add multiplication
///
/// Slow reference used to cross-check the tables.
pub const fn mul_bitwise(mut a: u8, mut b: u8) -> u8 {
    let reduce = (FIELD_POLYNOMIAL & 0xFF) as u8;
    let mut product = 0u8;
    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        let carry = a & 0x80 != 0;
        a <<= 1;
        if carry {
            a ^= reduce;
        }
        b >>= 1;
    }
    product
}

/// GF(2^8) field element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Galois8 {
    value: u8,
}

impl Galois8 {
    pub const ZERO: Self = Self { value: 0 };
    pub const ONE: Self = Self { value: 1 };

    pub const fn new(value: u8) -> Self {
        Self { value }
    }

    pub const fn value(&self) -> u8 {
        self.value
    }

    pub const fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Multiplicative inverse, or `None` for zero
    pub fn checked_inverse(&self) -> Option<Self> {
        if self.is_zero() {
            None
        } else {
            Some(Self::new(gf_inverse(self.value)))
        }
    }

    /// Multiplicative inverse
    ///
    /// # Panics
    ///
    /// Panics if `self` is zero.
    pub fn inverse(&self) -> Self {
        match self.checked_inverse() {
            Some(inv) => inv,
            None => panic!("Zero has no inverse in GF(2^8)"),
        }
    }

    /// Power operation
    pub fn pow(&self, exponent: u32) -> Self {
        if exponent == 0 {
            return Self::ONE;
        }
        if self.is_zero() {
            return Self::ZERO;
        }
        let table = tables();
        let log_val = table.log(self.value) as u64;
        let result_log = (log_val * exponent as u64) % GF_SIZE as u64;
        Self::new(table.exp(result_log as usize))
    }
}

// Addition (XOR in Galois fields)
impl Add for Galois8 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.value ^ rhs.value)
    }
}

impl AddAssign for Galois8 {
    fn add_assign(&mut self, rhs: Self) {
        self.value ^= rhs.value;
    }
}

// Subtraction (same as addition in GF(2^n))
impl Sub for Galois8 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.value ^ rhs.value)
    }
}

impl SubAssign for Galois8 {
    fn sub_assign(&mut self, rhs: Self) {
        self.value ^= rhs.value;
    }
}

impl Mul for Galois8 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::new(gf_mul(self.value, rhs.value))
    }
}

impl MulAssign for Galois8 {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Div for Galois8 {
    type Output = Self;

    /// # Panics
    ///
    /// Panics on division by zero.
    fn div(self, rhs: Self) -> Self::Output {
        if rhs.is_zero() {
            panic!("Division by zero in Galois field");
        }
        self * rhs.inverse()
    }
}

impl DivAssign for Galois8 {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl From<u8> for Galois8 {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<Galois8> for u8 {
    fn from(val: Galois8) -> Self {
        val.value
    }
}

impl fmt::Display for Galois8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.value)
    }
}
