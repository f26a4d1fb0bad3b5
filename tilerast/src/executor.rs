//! Dispatching work items.

use rayon::prelude::*;
use std::ops::Add;
use strum::{IntoStaticStr, VariantArray};

/// How the work items of a dispatch are executed. Every dispatch returns once all of its work
/// items are done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, VariantArray, IntoStaticStr)]
pub enum Executor {
    /// On the rayon thread pool.
    #[default]
    Parallel,
    /// One after the other, on the calling thread.
    Serial,
}

impl Executor {
    /// Runs `f` for every work item in `0..count` and sums the results.
    pub fn map_sum<T, F>(self, count: u32, f: F) -> T
    where
        T: Default + Add<Output = T> + Send,
        F: Fn(u32) -> T + Sync + Send,
    {
        match self {
            Self::Parallel => (0..count)
                .into_par_iter()
                .map(f)
                .reduce(T::default, Add::add),
            Self::Serial => (0..count).map(f).fold(T::default(), Add::add),
        }
    }

    /// Runs `f` for every pair of `chunk` long chunks of `a` and `b`, along with the index of the
    /// chunks.
    pub fn for_each_chunk_pair<A, B, F>(self, a: &mut [A], b: &mut [B], chunk: usize, f: F)
    where
        A: Send,
        B: Send,
        F: Fn(usize, &mut [A], &mut [B]) + Sync + Send,
    {
        if chunk == 0 {
            return;
        }

        match self {
            Self::Parallel => a
                .par_chunks_mut(chunk)
                .zip(b.par_chunks_mut(chunk))
                .enumerate()
                .for_each(|(index, (a, b))| f(index, a, b)),
            Self::Serial => a
                .chunks_mut(chunk)
                .zip(b.chunks_mut(chunk))
                .enumerate()
                .for_each(|(index, (a, b))| f(index, a, b)),
        }
    }

    /// Runs `f` for every pair of a `src_chunk` long chunk of `src` and the corresponding
    /// `dst_chunk` long chunk of `dst`.
    pub fn for_each_band<S, D, F>(
        self,
        src: &[S],
        src_chunk: usize,
        dst: &mut [D],
        dst_chunk: usize,
        f: F,
    ) where
        S: Sync,
        D: Send,
        F: Fn(&[S], &mut [D]) + Sync + Send,
    {
        if src_chunk == 0 || dst_chunk == 0 {
            return;
        }

        match self {
            Self::Parallel => src
                .par_chunks(src_chunk)
                .zip(dst.par_chunks_mut(dst_chunk))
                .for_each(|(src, dst)| f(src, dst)),
            Self::Serial => src
                .chunks(src_chunk)
                .zip(dst.chunks_mut(dst_chunk))
                .for_each(|(src, dst)| f(src, dst)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executors_agree() {
        for executor in Executor::VARIANTS {
            let sum: u64 = executor.map_sum(1000, u64::from);
            assert_eq!(sum, 999 * 1000 / 2);

            let mut a = vec![0u32; 10];
            let mut b = vec![0u32; 10];
            executor.for_each_chunk_pair(&mut a, &mut b, 3, |index, a, b| {
                a.fill(index as u32);
                b.fill(a.len() as u32);
            });
            assert_eq!(a, [0, 0, 0, 1, 1, 1, 2, 2, 2, 3]);
            assert_eq!(b, [3, 3, 3, 3, 3, 3, 3, 3, 3, 1]);

            let src = [1u32, 2, 3, 4];
            let mut dst = [0u32; 4];
            executor.for_each_band(&src, 2, &mut dst, 2, |src, dst| {
                dst[0] = src[1];
                dst[1] = src[0];
            });
            assert_eq!(dst, [2, 1, 4, 3]);
        }
    }
}
