//! Square matrices over GF(2^8) and in-place Gauss-Jordan inversion
//!
//! The decoder builds one `e×e` matrix per call (`e` = number of erasures,
//! at most 128) and inverts it in place. Bookkeeping arrays live on the stack
//! for every size the codec can produce.

use super::error::{FecError, Result};
use super::galois::tables;
use super::region::accumulate_scaled;
use smallvec::{smallvec, SmallVec};

/// Inline capacity for per-inversion scratch; matches the codec's block limit.
const INLINE: usize = super::MAX_FEC_BLOCKS;

/// Dense row-major square matrix of field elements
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SquareMatrix {
    size: usize,
    data: Vec<u8>,
}

impl SquareMatrix {
    /// Create a `size×size` zero matrix
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            data: vec![0; size * size],
        }
    }

    /// Create a `size×size` identity matrix
    pub fn identity(size: usize) -> Self {
        let mut matrix = Self::zeros(size);
        for i in 0..size {
            matrix.set(i, i, 1);
        }
        matrix
    }

    /// Build a matrix from `f(row, col)`
    pub fn from_fn(size: usize, mut f: impl FnMut(usize, usize) -> u8) -> Self {
        let mut data = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                data.push(f(row, col));
            }
        }
        Self { size, data }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.data[row * self.size + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: u8) {
        self.data[row * self.size + col] = value;
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[u8] {
        &self.data[row * self.size..(row + 1) * self.size]
    }

    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [u8] {
        &mut self.data[row * self.size..(row + 1) * self.size]
    }

    /// Matrix product `self * rhs`
    ///
    /// # Panics
    /// Panics if the sizes differ.
    pub fn multiply(&self, rhs: &SquareMatrix) -> SquareMatrix {
        assert_eq!(self.size, rhs.size, "matrix size mismatch");
        let gf = tables();
        SquareMatrix::from_fn(self.size, |row, col| {
            (0..self.size).fold(0, |acc, i| acc ^ gf.mul(self.get(row, i), rhs.get(i, col)))
        })
    }

    /// Invert in place by Gauss-Jordan elimination with full pivoting
    ///
    /// On failure the matrix contents are unspecified.
    ///
    /// # Errors
    /// [`FecError::SingularMatrix`] when no nonzero pivot remains.
    pub fn invert(&mut self) -> Result<()> {
        let k = self.size;
        let gf = tables();

        let mut pivoted: SmallVec<[bool; INLINE]> = smallvec![false; k];
        let mut indxr: SmallVec<[usize; INLINE]> = smallvec![0; k];
        let mut indxc: SmallVec<[usize; INLINE]> = smallvec![0; k];

        for col in 0..k {
            let (irow, icol) = self
                .find_pivot(col, &pivoted)
                .ok_or(FecError::SingularMatrix { size: k })?;
            pivoted[icol] = true;

            if irow != icol {
                log::trace!("pivot {}: swapping rows {} and {}", col, irow, icol);
                self.swap_rows(irow, icol);
            }
            indxr[col] = irow;
            indxc[col] = icol;

            let c = self.get(icol, icol);
            if c != 1 {
                let scale = gf.mul_row(gf.inverse(c));
                self.set(icol, icol, 1);
                for x in self.row_mut(icol) {
                    *x = scale[*x as usize];
                }
            }

            if self.is_unit_row(icol) {
                continue;
            }

            let pivot_row: SmallVec<[u8; INLINE]> = SmallVec::from_slice(self.row(icol));
            for row in (0..k).filter(|&row| row != icol) {
                let p = self.row_mut(row);
                let c = p[icol];
                p[icol] = 0;
                accumulate_scaled(p, &pivot_row, c);
            }
        }

        for col in (0..k).rev() {
            if indxr[col] != indxc[col] {
                log::trace!(
                    "undoing pivot {}: swapping columns {} and {}",
                    col,
                    indxr[col],
                    indxc[col]
                );
                self.swap_cols(indxr[col], indxc[col]);
            }
        }

        Ok(())
    }

    /// Diagonal first, then the first nonzero entry in an unused row and column
    fn find_pivot(&self, col: usize, pivoted: &[bool]) -> Option<(usize, usize)> {
        if !pivoted[col] && self.get(col, col) != 0 {
            return Some((col, col));
        }

        (0..self.size)
            .filter(|&row| !pivoted[row])
            .find_map(|row| {
                (0..self.size)
                    .find(|&ix| !pivoted[ix] && self.get(row, ix) != 0)
                    .map(|ix| (row, ix))
            })
    }

    fn is_unit_row(&self, row: usize) -> bool {
        self.row(row)
            .iter()
            .enumerate()
            .all(|(ix, &v)| v == u8::from(ix == row))
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        for ix in 0..self.size {
            self.data.swap(a * self.size + ix, b * self.size + ix);
        }
    }

    fn swap_cols(&mut self, a: usize, b: usize) {
        for row in 0..self.size {
            self.data.swap(row * self.size + a, row * self.size + b);
        }
    }
}
