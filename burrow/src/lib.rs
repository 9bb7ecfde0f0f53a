// Copyright 2025 The burrow developers
//
// SPDX-License-Identifier: Apache-2.0

//! Burrows-Wheeler transform and inverse for byte blocks.
//!
//! The forward transform permutes a block into the last column of its sorted
//! rotation matrix, grouping symbols with similar right context so that later
//! compression stages see long runs. It is computed through a linear-time
//! suffix array rather than by materializing rotations. The inverse rebuilds
//! the original block from the permuted bytes and the primary index alone,
//! walking a rank table backwards in linear time.
//!
//! The crate exposes one engine type and bounds-checked window types for
//! zero-copy operation over caller buffers:
//!
//! ```
//! use burrow::{BwtEngine, ByteSlice, ByteSliceMut};
//!
//! # fn main() -> Result<(), burrow::TransformError> {
//! let mut engine = BwtEngine::new();
//! let input = b"how much wood would a woodchuck chuck";
//! let mut block = [0u8; 37];
//!
//! let primary = engine.forward(
//!     &mut ByteSlice::whole(input),
//!     &mut ByteSliceMut::whole(&mut block),
//! )?;
//!
//! let mut restored = [0u8; 37];
//! engine.inverse(
//!     &mut ByteSlice::whole(&block),
//!     &mut ByteSliceMut::whole(&mut restored),
//!     primary,
//! )?;
//! assert_eq!(&restored, input);
//! # Ok(())
//! # }
//! ```
//!
//! Callers that persist transformed blocks must store the block length and
//! primary index alongside the payload; the engine prescribes no framing.

mod bwt;
mod slice;

pub use bwt::{BwtEngine, MAX_BLOCK_SIZE, PrimaryIndex, TransformError};
pub use slice::{ByteSlice, ByteSliceMut};
