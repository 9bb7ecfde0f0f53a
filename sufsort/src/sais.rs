// Copyright 2025 The burrow developers
//
// SPDX-License-Identifier: Apache-2.0

//! Suffix array construction by induced sorting (SA-IS).
//!
//! This is an alternative to [`DivSufSort`](crate::DivSufSort) that also
//! handles the integer alphabets produced by its own problem reduction, and
//! can emit a Burrows-Wheeler transform directly during the final induction.
//!
//! The algorithm runs in three stages. A scan of the text identifies the
//! leftmost-S positions and induce-sorts their substrings; equal substrings
//! are then named and, if any name repeats, the named sequence is solved
//! recursively inside the free tail of the output buffer. The final stage
//! seeds the sorted leftmost-S suffixes into their buckets and induces the
//! remaining suffixes in two linear passes. Suffix types are recomputed on
//! the fly during every scan rather than materialized.

use alloc::{vec, vec::Vec};

/// Input text view: bytes at the top level, 32-bit names in recursive calls.
enum Text<'a> {
    Bytes(&'a [u8]),
    Ints(&'a [i32]),
}

impl Text<'_> {
    #[inline]
    fn at(&self, i: usize) -> usize {
        match self {
            Text::Bytes(data) => data[i] as usize,
            Text::Ints(data) => data[i] as usize,
        }
    }

    #[inline]
    fn len(&self) -> usize {
        match self {
            Text::Bytes(data) => data.len(),
            Text::Ints(data) => data.len(),
        }
    }
}

/// Where a bucket table lives: carved out of the free tail of the suffix
/// array buffer when it fits, on the heap otherwise.
enum Storage {
    Tail(usize),
    Heap(Vec<i32>),
}

/// The symbol count table and the bucket pointer table for one recursion
/// level.
///
/// When `counts` is `None` the two tables share the pointer storage and the
/// counts are recomputed from the text before every induction pass.
struct Buckets {
    counts: Option<Storage>,
    ptrs: Storage,
    k: usize,
}

impl Buckets {
    /// Chooses table placement for a problem of size `n` with `fs` free slots
    /// and alphabet size `k`.
    fn place(n: usize, fs: usize, k: usize) -> Self {
        if k <= 256 {
            let counts = Some(Storage::Heap(vec![0; k]));
            let ptrs = if k <= fs {
                Storage::Tail(n + fs - k)
            } else {
                Storage::Heap(vec![0; k])
            };
            Self { counts, ptrs, k }
        } else if k <= fs {
            let c_off = n + fs - k;
            if k <= fs - k {
                Self {
                    counts: Some(Storage::Tail(c_off)),
                    ptrs: Storage::Tail(c_off - k),
                    k,
                }
            } else if k <= 1024 {
                Self {
                    counts: Some(Storage::Tail(c_off)),
                    ptrs: Storage::Heap(vec![0; k]),
                    k,
                }
            } else {
                Self {
                    counts: None,
                    ptrs: Storage::Tail(c_off),
                    k,
                }
            }
        } else {
            Self {
                counts: None,
                ptrs: Storage::Heap(vec![0; k]),
                k,
            }
        }
    }

    /// Populates the count table (a no-op for shared storage, which counts
    /// lazily in [`prepare`]).
    fn count(&mut self, text: &Text<'_>, sa: &mut [i32], n: usize) {
        let k = self.k;
        match &mut self.counts {
            None => {}
            Some(Storage::Heap(counts)) => get_counts(text, counts, n),
            Some(Storage::Tail(off)) => {
                let off = *off - n;
                get_counts(text, &mut sa[n..][off..off + k], n);
            }
        }
    }
}

/// Fills a length-`k` histogram of the first `n` symbols.
fn get_counts(text: &Text<'_>, counts: &mut [i32], n: usize) {
    counts.fill(0);
    for i in 0..n {
        counts[text.at(i)] += 1;
    }
}

/// Converts a histogram into bucket pointers: inclusive prefix sums for
/// bucket ends, exclusive prefix sums for bucket starts.
fn to_bucket_ptrs(counts: &[i32], ptrs: &mut [i32], end: bool) {
    let mut sum = 0;
    for (p, &c) in ptrs.iter_mut().zip(counts.iter()) {
        sum += c;
        *p = if end { sum } else { sum - c };
    }
}

fn to_bucket_ptrs_in_place(buf: &mut [i32], end: bool) {
    let mut sum = 0;
    for p in buf.iter_mut() {
        let c = *p;
        sum += c;
        *p = if end { sum } else { sum - c };
    }
}

/// Splits the buffer into the working area and a freshly computed bucket
/// pointer table for the requested direction.
fn prepare<'a>(
    sa: &'a mut [i32],
    n: usize,
    buckets: &'a mut Buckets,
    text: &Text<'_>,
    end: bool,
) -> (&'a mut [i32], &'a mut [i32]) {
    let k = buckets.k;
    let (work, tail) = sa.split_at_mut(n);

    let ptrs = match (&mut buckets.counts, &mut buckets.ptrs) {
        (None, Storage::Heap(pv)) => {
            get_counts(text, pv, n);
            to_bucket_ptrs_in_place(pv, end);
            &mut pv[..]
        }
        (None, Storage::Tail(off)) => {
            let p = &mut tail[*off - n..*off - n + k];
            get_counts(text, p, n);
            to_bucket_ptrs_in_place(p, end);
            p
        }
        (Some(Storage::Heap(cv)), Storage::Heap(pv)) => {
            to_bucket_ptrs(cv, pv, end);
            &mut pv[..]
        }
        (Some(Storage::Heap(cv)), Storage::Tail(off)) => {
            let p = &mut tail[*off - n..*off - n + k];
            to_bucket_ptrs(cv, p, end);
            p
        }
        (Some(Storage::Tail(c_off)), Storage::Heap(pv)) => {
            to_bucket_ptrs(&tail[*c_off - n..*c_off - n + k], pv, end);
            &mut pv[..]
        }
        (Some(Storage::Tail(c_off)), Storage::Tail(p_off)) => {
            let boundary = *c_off - n;
            let (lo, hi) = tail.split_at_mut(boundary);
            let p = &mut lo[*p_off - n..*p_off - n + k];
            to_bucket_ptrs(&hi[..k], p, end);
            p
        }
    };

    (work, ptrs)
}

#[derive(Clone, Copy, PartialEq)]
enum Induce {
    /// Stage-one pass: entries are cleared as their predecessors are placed,
    /// so only leftmost-S positions survive both passes.
    Substrings,
    /// Final pass producing the suffix array.
    SuffixArray,
    /// Final pass producing BWT symbols in place of suffix indices.
    Bwt,
}

/// Deposits every leftmost-S position at the end of its bucket, scanning the
/// text right to left with on-the-fly type computation. Returns the number of
/// positions deposited.
fn seed_lms_substrings(text: &Text<'_>, work: &mut [i32], ends: &mut [i32]) -> usize {
    let n = text.len();
    let mut m = 0;
    let mut c1 = text.at(n - 1);
    // The suffix before the virtual sentinel is type L
    let mut next_is_s = false;

    for i in (0..n - 1).rev() {
        let c0 = text.at(i);
        if c0 < c1 || (c0 == c1 && next_is_s) {
            next_is_s = true;
        } else {
            if next_is_s {
                ends[c1] -= 1;
                work[ends[c1] as usize] = (i + 1) as i32;
                m += 1;
            }
            next_is_s = false;
        }
        c1 = c0;
    }

    m
}

/// Fills `out` with the leftmost-S positions in increasing text order.
fn enumerate_lms(text: &Text<'_>, out: &mut [i32]) {
    let n = text.len();
    let mut j = out.len();
    let mut c1 = text.at(n - 1);
    let mut next_is_s = false;

    for i in (0..n - 1).rev() {
        let c0 = text.at(i);
        if c0 < c1 || (c0 == c1 && next_is_s) {
            next_is_s = true;
        } else {
            if next_is_s {
                j -= 1;
                out[j] = (i + 1) as i32;
            }
            next_is_s = false;
        }
        c1 = c0;
    }

    debug_assert_eq!(j, 0, "leftmost-S census must match");
}

/// Left-to-right induction of type-L suffixes from the seeded entries.
fn induce_l(text: &Text<'_>, work: &mut [i32], starts: &mut [i32], mode: Induce) {
    let n = text.len();

    // The last suffix precedes the virtual sentinel and is type L, so it
    // heads the whole induction
    let c_last = text.at(n - 1);
    work[starts[c_last] as usize] = (n - 1) as i32;
    starts[c_last] += 1;

    for i in 0..n {
        let v = work[i];
        if v <= 0 {
            continue;
        }
        let j = (v - 1) as usize;
        let cj = text.at(j);
        if cj >= text.at(v as usize) {
            work[starts[cj] as usize] = j as i32;
            starts[cj] += 1;
            match mode {
                Induce::Substrings => work[i] = 0,
                Induce::SuffixArray => {}
                // The predecessor is type L, so this entry's transform symbol
                // is already known; stash it complemented for the S pass to
                // restore
                Induce::Bwt => work[i] = !(cj as i32),
            }
        }
    }
}

/// Right-to-left induction of type-S suffixes. In `Bwt` mode the pass writes
/// transform symbols over finished entries and returns the primary index.
fn induce_s(text: &Text<'_>, work: &mut [i32], ends: &mut [i32], mode: Induce) -> i32 {
    let n = text.len();
    let mut pidx = 0;

    for i in (0..n).rev() {
        let v = work[i];
        if v > 0 {
            let j = (v - 1) as usize;
            let cj = text.at(j);
            // The bucket pointer check settles the equal-symbol case: the
            // predecessor is type S exactly when its slot lies below the
            // current position
            if cj <= text.at(v as usize) && ends[cj] as usize <= i {
                ends[cj] -= 1;
                work[ends[cj] as usize] = j as i32;
                if mode == Induce::Substrings {
                    work[i] = 0;
                }
            }
            if mode == Induce::Bwt {
                work[i] = cj as i32;
            }
        } else if v < 0 {
            work[i] = !v;
        } else if mode == Induce::Bwt {
            pidx = i as i32;
        }
    }

    pidx
}

/// Length of the leftmost-S substring starting at `x`: the distance to the
/// following leftmost-S position, inclusive, or to the end of the text for
/// the final one.
fn lms_length(text: &Text<'_>, x: usize) -> usize {
    let n = text.len();
    let mut i = 1;
    while x + i < n && text.at(x + i) >= text.at(x + i - 1) {
        i += 1;
    }
    if x + i >= n {
        return n - x;
    }

    let mut dist = 0;
    loop {
        if x + i >= n || text.at(x + i) > text.at(x + i - 1) {
            break;
        }
        if x + i == n - 1 || text.at(x + i) < text.at(x + i - 1) {
            dist = i;
        }
        i += 1;
    }
    dist + 1
}

/// Core routine: computes the suffix array of `text` into `sa[..n]`, using
/// `fs` free slots at the tail of `sa` for bucket tables and the recursive
/// reduction. With `is_bwt`, the final induction emits transform symbols and
/// the primary index is returned instead.
fn sa_is(text: &Text<'_>, sa: &mut [i32], fs: usize, n: usize, k: usize, is_bwt: bool) -> i32 {
    debug_assert!(n >= 2, "trivial sizes are handled by the callers");
    debug_assert_eq!(sa.len(), n + fs, "buffer must be sized n + fs");

    let mut buckets = Buckets::place(n, fs, k);
    buckets.count(text, sa, n);

    // Stage 1: deposit the leftmost-S positions and sort their substrings by
    // two induction passes
    sa[..n].fill(0);
    let m = {
        let (work, ends) = prepare(sa, n, &mut buckets, text, true);
        seed_lms_substrings(text, work, ends)
    };

    let mut name_count = 0;
    if m > 0 {
        if m > 1 {
            {
                let (work, starts) = prepare(sa, n, &mut buckets, text, false);
                induce_l(text, work, starts, Induce::Substrings);
            }
            {
                let (work, ends) = prepare(sa, n, &mut buckets, text, true);
                induce_s(text, work, ends, Induce::Substrings);
            }
        }

        // Compact the surviving entries: the leftmost-S positions in
        // substring-sorted order
        let mut n1 = 0;
        for i in 0..n {
            let v = sa[i];
            if v > 0 {
                sa[n1] = v;
                n1 += 1;
            }
        }
        debug_assert_eq!(n1, m, "every leftmost-S position must survive induction");

        // Name the substrings; positions are at least two apart, so `pos / 2`
        // scatters the names without collision
        sa[m..n].fill(0);
        let mut prev_pos = usize::MAX;
        let mut prev_len = 0;
        for i in 0..m {
            let pos = sa[i] as usize;
            let len = lms_length(text, pos);
            let mut diff = true;
            if prev_pos != usize::MAX && len == prev_len {
                diff = false;
                for d in 0..len {
                    // Only the final substring can touch the last position;
                    // the sentinel behind it makes it unequal to any other
                    if pos + d == n - 1 || prev_pos + d == n - 1 || text.at(pos + d) != text.at(prev_pos + d)
                    {
                        diff = true;
                        break;
                    }
                }
            }
            if diff {
                name_count += 1;
                prev_pos = pos;
                prev_len = len;
            }
            sa[m + pos / 2] = name_count as i32;
        }
    }

    // Stage 2: if names repeat, solve the reduced problem recursively in the
    // tail of the buffer
    if name_count < m {
        let mut newfs = n + fs - 2 * m;
        let mut counts_stale = false;
        if matches!(buckets.counts, Some(Storage::Tail(_))) {
            // Keep the tail-resident count table out of the recursion's way
            // when there is room, otherwise recount afterwards
            if k + name_count <= newfs {
                newfs -= k;
            } else {
                counts_stale = true;
            }
        }
        let ra = m + newfs;

        // Gather the scattered names into the reduced text, order preserved
        let mut j = ra + m;
        for i in (m..m + (n >> 1)).rev() {
            if sa[i] != 0 {
                j -= 1;
                sa[j] = sa[i] - 1;
            }
        }

        {
            let (head, tail) = sa.split_at_mut(ra);
            let reduced = Text::Ints(&tail[..m]);
            sa_is(&reduced, head, newfs, m, name_count, false);
        }

        // Map reduced ranks back to text positions
        enumerate_lms(text, &mut sa[ra..ra + m]);
        for i in 0..m {
            sa[i] = sa[ra + sa[i] as usize];
        }

        if counts_stale {
            buckets.count(text, sa, n);
        }
    }
    // With all names unique, sa[..m] is already the sorted order

    // Stage 3: seed the sorted leftmost-S suffixes at their bucket ends and
    // induce the rest
    sa[m..n].fill(0);
    {
        let (work, ends) = prepare(sa, n, &mut buckets, text, true);
        for i in (0..m).rev() {
            let p = work[i];
            work[i] = 0;
            let c = text.at(p as usize);
            ends[c] -= 1;
            work[ends[c] as usize] = p;
        }
    }

    let mode = if is_bwt { Induce::Bwt } else { Induce::SuffixArray };
    {
        let (work, starts) = prepare(sa, n, &mut buckets, text, false);
        induce_l(text, work, starts, mode);
    }
    let (work, ends) = prepare(sa, n, &mut buckets, text, true);
    induce_s(text, work, ends, mode)
}

/// Computes the suffix array of `data` into `sa[..data.len()]`.
///
/// Slots beyond `data.len()` are used as free working space for bucket
/// tables, so passing a buffer with extra capacity reduces heap allocation.
///
/// # Panics
///
/// Panics if `sa` is shorter than `data`.
pub fn suffix_array(data: &[u8], sa: &mut [i32]) {
    let n = data.len();
    assert!(sa.len() >= n, "suffix array buffer too small");

    match n {
        0 => {}
        1 => sa[0] = 0,
        _ => {
            sa_is(&Text::Bytes(data), sa, sa.len() - n, n, 256, false);
        }
    }
}

/// Computes the Burrows-Wheeler transform of `data` directly, without
/// materializing the suffix array, and returns the primary index.
///
/// `sa` is working space at least as long as `data`; extra slots reduce heap
/// allocation as in [`suffix_array`]. For a block of length `n >= 2`,
/// `output[p]` holds the last input byte, where `p` is the returned index.
///
/// # Panics
///
/// Panics if `output` and `data` differ in length or `sa` is shorter than
/// `data`.
pub fn bwt(data: &[u8], output: &mut [u8], sa: &mut [i32]) -> u32 {
    let n = data.len();
    assert_eq!(output.len(), n, "output must match the input length");
    assert!(sa.len() >= n, "working space too small");

    if n == 0 {
        return 0;
    }
    if n == 1 {
        output[0] = data[0];
        return 0;
    }

    let fs = sa.len() - n;
    let pidx = sa_is(&Text::Bytes(data), sa, fs, n, 256, true);

    for (out, &v) in output.iter_mut().zip(sa.iter()) {
        *out = v as u8;
    }
    output[pidx as usize] = data[n - 1];
    pidx as u32
}
