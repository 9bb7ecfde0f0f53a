// Copyright 2025 The burrow developers
//
// SPDX-License-Identifier: Apache-2.0

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use log::debug;
use sufsort::DivSufSort;

use crate::slice::{ByteSlice, ByteSliceMut};

/// The largest supported block length in bytes.
pub const MAX_BLOCK_SIZE: usize = (1 << 30) - 4;

/// Blocks shorter than this use the packed inverse representation, which
/// keeps a symbol's occurrence rank in the upper 24 bits of one word.
const PACKED_RANK_BLOCK_LIMIT: usize = 1 << 24;

/// The row of the sorted rotation matrix holding the original block; always
/// less than the block length.
pub type PrimaryIndex = u32;

/// A reusable Burrows-Wheeler transform engine.
///
/// The engine owns the suffix sorter and the rank-table scratch used by the
/// inverse transform. All scratch grows to the largest block seen and is then
/// reused, so steady-state operation performs no allocation. An engine is
/// single-threaded; use one instance per thread for concurrent transforms.
///
/// # Examples
///
/// ```
/// use burrow::{BwtEngine, ByteSlice, ByteSliceMut};
///
/// # fn main() -> Result<(), burrow::TransformError> {
/// let input = b"banana";
/// let mut transformed = [0u8; 6];
/// let mut restored = [0u8; 6];
/// let mut engine = BwtEngine::new();
///
/// let primary = engine.forward(
///     &mut ByteSlice::whole(input),
///     &mut ByteSliceMut::whole(&mut transformed),
/// )?;
/// assert_eq!(&transformed, b"nnbaaa");
/// assert_eq!(primary, 3);
///
/// engine.inverse(
///     &mut ByteSlice::whole(&transformed),
///     &mut ByteSliceMut::whole(&mut restored),
///     primary,
/// )?;
/// assert_eq!(&restored, input);
/// # Ok(())
/// # }
/// ```
pub struct BwtEngine {
    sorter: DivSufSort,
    sa: Vec<i32>,
    sym: Vec<u8>,
}

impl BwtEngine {
    /// Creates an engine with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sorter: DivSufSort::new(),
            sa: Vec::new(),
            sym: Vec::new(),
        }
    }

    /// Applies the forward transform of the `src` window into `dst` and
    /// returns the primary index.
    ///
    /// Both windows must have the same length `n`. The output is the last
    /// column of the lexicographically sorted rotation matrix of the block;
    /// for `n <= 1` it is the block itself. On success both windows advance
    /// past the `n` processed bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::LengthMismatch`] if the windows differ in
    /// length and [`TransformError::BlockTooLarge`] past [`MAX_BLOCK_SIZE`].
    /// No output is produced on error.
    pub fn forward(
        &mut self,
        src: &mut ByteSlice<'_>,
        dst: &mut ByteSliceMut<'_>,
    ) -> Result<PrimaryIndex, TransformError> {
        let n = Self::common_length(src, dst)?;
        if n <= 1 {
            dst.window_mut().copy_from_slice(src.window());
            src.advance(n);
            dst.advance(n);
            return Ok(0);
        }

        if self.sa.len() < n {
            self.sa.resize(n, 0);
        }

        let input = src.window();
        self.sorter.compute_suffix_array(input, &mut self.sa[..n]);

        let output = dst.window_mut();
        let mut primary = 0;
        for (i, &s) in self.sa[..n].iter().enumerate() {
            if s == 0 {
                primary = i as PrimaryIndex;
                output[i] = input[n - 1];
            } else {
                output[i] = input[s as usize - 1];
            }
        }
        debug!("bwt forward: {n} bytes, primary index {primary}");

        src.advance(n);
        dst.advance(n);
        Ok(primary)
    }

    /// Reverses the transform of the `src` window into `dst`.
    ///
    /// `primary` must be the index returned by the matching
    /// [`forward`](Self::forward) call. On success both windows advance past
    /// the processed bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::LengthMismatch`] if the windows differ in
    /// length, [`TransformError::BlockTooLarge`] past [`MAX_BLOCK_SIZE`], and
    /// [`TransformError::BadPrimaryIndex`] if `primary` is not a valid row
    /// for the block. The destination contents are unspecified on error.
    pub fn inverse(
        &mut self,
        src: &mut ByteSlice<'_>,
        dst: &mut ByteSliceMut<'_>,
        primary: PrimaryIndex,
    ) -> Result<(), TransformError> {
        let n = Self::common_length(src, dst)?;
        if n == 0 {
            return Ok(());
        }
        if primary as usize >= n {
            return Err(TransformError::BadPrimaryIndex {
                index: primary,
                len: n,
            });
        }
        if n == 1 {
            dst.window_mut().copy_from_slice(src.window());
            src.advance(1);
            dst.advance(1);
            return Ok(());
        }

        if self.sa.len() < n {
            self.sa.resize(n, 0);
        }
        debug!("bwt inverse: {n} bytes, primary index {primary}");

        if n < PACKED_RANK_BLOCK_LIMIT {
            self.inverse_packed(src.window(), dst.window_mut(), primary as usize);
        } else {
            self.inverse_split(src.window(), dst.window_mut(), primary as usize);
        }

        src.advance(n);
        dst.advance(n);
        Ok(())
    }

    /// Small-block inverse: one word per position packing the occurrence rank
    /// above the symbol, walked backwards through the cumulative histogram.
    fn inverse_packed(&mut self, input: &[u8], output: &mut [u8], primary: usize) {
        let n = input.len();
        // The packed entries use all 32 bits, so view the suffix-array
        // scratch as unsigned words
        let data: &mut [u32] = bytemuck::cast_slice_mut(&mut self.sa[..n]);

        let mut counts = [0u32; 256];
        for (entry, &c) in data.iter_mut().zip(input.iter()) {
            *entry = (counts[c as usize] << 8) | u32::from(c);
            counts[c as usize] += 1;
        }

        let mut sums = [0u32; 256];
        let mut sum = 0;
        for (s, &c) in sums.iter_mut().zip(counts.iter()) {
            *s = sum;
            sum += c;
        }

        let mut ptr = data[primary];
        output[n - 1] = ptr as u8;
        for out in output[..n - 1].iter_mut().rev() {
            ptr = data[((ptr >> 8) + sums[(ptr & 0xff) as usize]) as usize];
            *out = ptr as u8;
        }
    }

    /// Large-block inverse: ranks no longer fit in 24 bits, so ranks and
    /// symbols live in two parallel arrays.
    fn inverse_split(&mut self, input: &[u8], output: &mut [u8], primary: usize) {
        let n = input.len();
        if self.sym.len() < n {
            self.sym.resize(n, 0);
        }

        let mut counts = [0i32; 256];
        for (i, &c) in input.iter().enumerate() {
            self.sa[i] = counts[c as usize];
            counts[c as usize] += 1;
            self.sym[i] = c;
        }

        let mut sums = [0usize; 256];
        let mut sum = 0;
        for (s, &c) in sums.iter_mut().zip(counts.iter()) {
            *s = sum;
            sum += c as usize;
        }

        let mut rank = self.sa[primary] as usize;
        let mut sym = self.sym[primary];
        output[n - 1] = sym;
        for out in output[..n - 1].iter_mut().rev() {
            let j = rank + sums[sym as usize];
            rank = self.sa[j] as usize;
            sym = self.sym[j];
            *out = sym;
        }
    }

    /// Computes the suffix array of the `src` window and returns it.
    ///
    /// The window is not advanced. The returned slice borrows the engine's
    /// scratch and is valid until the next call.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::BlockTooLarge`] past [`MAX_BLOCK_SIZE`].
    pub fn compute_suffix_array(
        &mut self,
        src: &ByteSlice<'_>,
    ) -> Result<&[i32], TransformError> {
        let n = src.len();
        if n > MAX_BLOCK_SIZE {
            return Err(TransformError::BlockTooLarge { len: n });
        }

        if self.sa.len() < n {
            self.sa.resize(n, 0);
        }
        self.sorter.compute_suffix_array(src.window(), &mut self.sa[..n]);
        Ok(&self.sa[..n])
    }

    /// Clears all scratch state without releasing its storage.
    ///
    /// Never required for correctness; a dirty engine produces correct
    /// results on its next call. Resetting twice is the same as resetting
    /// once.
    pub fn reset(&mut self) {
        self.sorter.reset();
        self.sa.fill(0);
        self.sym.fill(0);
    }

    fn common_length(
        src: &ByteSlice<'_>,
        dst: &ByteSliceMut<'_>,
    ) -> Result<usize, TransformError> {
        let n = src.len();
        if n != dst.len() {
            return Err(TransformError::LengthMismatch {
                src_len: n,
                dst_len: dst.len(),
            });
        }
        if n > MAX_BLOCK_SIZE {
            return Err(TransformError::BlockTooLarge { len: n });
        }
        Ok(n)
    }
}

impl Default for BwtEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// An error indicating that a transform argument was rejected.
///
/// All variants are detected before any output is written. Logic errors
/// inside the sorters are not represented here; those are bugs and panic.
#[derive(Debug)]
pub enum TransformError {
    /// A window falls outside its backing buffer
    BadSlice {
        /// Requested window start
        base: usize,
        /// Requested window length
        len: usize,
        /// Length of the backing buffer
        buf_len: usize,
    },
    /// Source and destination windows differ in length
    LengthMismatch {
        /// Source window length
        src_len: usize,
        /// Destination window length
        dst_len: usize,
    },
    /// The block exceeds [`MAX_BLOCK_SIZE`]
    BlockTooLarge {
        /// Rejected block length
        len: usize,
    },
    /// The inverse transform received a primary index outside the block
    BadPrimaryIndex {
        /// Rejected primary index
        index: u32,
        /// Block length it was checked against
        len: usize,
    },
}

impl Display for TransformError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            TransformError::BadSlice { base, len, buf_len } => {
                write!(f, "window [{base}, {base} + {len}) exceeds buffer of {buf_len} bytes")
            }
            TransformError::LengthMismatch { src_len, dst_len } => {
                write!(f, "source window is {src_len} bytes but destination is {dst_len}")
            }
            TransformError::BlockTooLarge { len } => {
                write!(f, "block of {len} bytes exceeds the maximum of {MAX_BLOCK_SIZE}")
            }
            TransformError::BadPrimaryIndex { index, len } => {
                write!(f, "primary index {index} out of range for a {len}-byte block")
            }
        }
    }
}

impl Error for TransformError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn forward_bytes(engine: &mut BwtEngine, input: &[u8]) -> (Vec<u8>, PrimaryIndex) {
        let mut output = vec![0u8; input.len()];
        let primary = engine
            .forward(
                &mut ByteSlice::whole(input),
                &mut ByteSliceMut::whole(&mut output),
            )
            .unwrap();
        (output, primary)
    }

    fn inverse_bytes(engine: &mut BwtEngine, input: &[u8], primary: PrimaryIndex) -> Vec<u8> {
        let mut output = vec![0u8; input.len()];
        engine
            .inverse(
                &mut ByteSlice::whole(input),
                &mut ByteSliceMut::whole(&mut output),
                primary,
            )
            .unwrap();
        output
    }

    #[test]
    fn banana_round_trip() {
        let mut engine = BwtEngine::new();
        let (transformed, primary) = forward_bytes(&mut engine, b"banana");

        assert_eq!(transformed, b"nnbaaa");
        assert_eq!(primary, 3);
        assert_eq!(inverse_bytes(&mut engine, &transformed, primary), b"banana");
    }

    #[test]
    fn empty_block_is_a_no_op() {
        let mut engine = BwtEngine::new();
        let (transformed, primary) = forward_bytes(&mut engine, b"");

        assert!(transformed.is_empty());
        assert_eq!(primary, 0);
        assert_eq!(inverse_bytes(&mut engine, b"", 0), b"");
    }

    #[test]
    fn single_byte_is_copied() {
        let mut engine = BwtEngine::new();
        let (transformed, primary) = forward_bytes(&mut engine, b"k");

        assert_eq!(transformed, b"k");
        assert_eq!(primary, 0);
        assert_eq!(inverse_bytes(&mut engine, b"k", 0), b"k");
    }

    #[test]
    fn windows_advance_on_success() {
        let input = *b"banana";
        let mut output = [0u8; 6];
        let mut src = ByteSlice::whole(&input);
        let mut dst = ByteSliceMut::whole(&mut output);

        BwtEngine::new().forward(&mut src, &mut dst).unwrap();

        assert_eq!(src.base(), 6);
        assert_eq!(dst.base(), 6);
        assert!(src.is_empty());
    }

    #[test]
    fn mismatched_windows_are_rejected() {
        let input = [0u8; 4];
        let mut output = [0u8; 3];

        let result = BwtEngine::new().forward(
            &mut ByteSlice::whole(&input),
            &mut ByteSliceMut::whole(&mut output),
        );

        assert!(matches!(result, Err(TransformError::LengthMismatch { .. })));
    }

    #[test]
    fn bad_primary_index_is_rejected() {
        let input = [7u8; 4];
        let mut output = [0u8; 4];

        let result = BwtEngine::new().inverse(
            &mut ByteSlice::whole(&input),
            &mut ByteSliceMut::whole(&mut output),
            4,
        );

        assert!(matches!(
            result,
            Err(TransformError::BadPrimaryIndex { index: 4, len: 4 }),
        ));
    }

    #[test]
    fn suffix_array_accessor_does_not_advance() {
        let input = *b"mississippi";
        let src = ByteSlice::whole(&input);
        let mut engine = BwtEngine::new();

        let sa = engine.compute_suffix_array(&src).unwrap();
        assert_eq!(sa, &[10, 7, 4, 1, 0, 9, 8, 6, 3, 5, 2]);
        assert_eq!(src.base(), 0);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut engine = BwtEngine::new();
        let (transformed, primary) = forward_bytes(&mut engine, b"abracadabra");

        engine.reset();
        engine.reset();

        assert_eq!(
            inverse_bytes(&mut engine, &transformed, primary),
            b"abracadabra",
        );
    }
}
