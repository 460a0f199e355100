//! Vector add `c[i] = a[i] + b[i]`.

use crate::parallel::{parallel_for, Chunking, ParallelRuntime};
use crate::types::Elem;

/// Fill `a[i] = i` and `b[i] = n - i`, so every `c[i]` equals `n`.
pub fn init_vectors(rt: &ParallelRuntime, a: &mut [Elem], b: &mut [Elem]) {
    assert_eq!(a.len(), b.len());
    let n = a.len();
    parallel_for(rt, a, 1, Chunking::Static, |first, out| {
        for (off, v) in out.iter_mut().enumerate() {
            *v = (first + off) as Elem;
        }
    });
    parallel_for(rt, b, 1, Chunking::Static, |first, out| {
        for (off, v) in out.iter_mut().enumerate() {
            *v = (n - (first + off)) as Elem;
        }
    });
}

#[inline]
fn add_range(a: &[Elem], b: &[Elem], first: usize, out: &mut [Elem]) {
    let end = first + out.len();
    for ((o, &x), &y) in out.iter_mut().zip(&a[first..end]).zip(&b[first..end]) {
        *o = x + y;
    }
}

pub fn vec_add_serial(a: &[Elem], b: &[Elem], c: &mut [Elem]) {
    assert!(a.len() == c.len() && b.len() == c.len(), "vector lengths differ");
    add_range(a, b, 0, c);
}

pub fn vec_add_parallel(rt: &ParallelRuntime, a: &[Elem], b: &[Elem], c: &mut [Elem]) {
    assert!(a.len() == c.len() && b.len() == c.len(), "vector lengths differ");
    parallel_for(rt, c, 1, Chunking::Static, |first, out| add_range(a, b, first, out));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_vectors_sum_to_len() {
        let rt = ParallelRuntime::new(4).unwrap();
        let n = 1000;
        let mut a = vec![0.0; n];
        let mut b = vec![0.0; n];
        init_vectors(&rt, &mut a, &mut b);
        assert_eq!(a[0], 0.0);
        assert_eq!(b[0], n as Elem);
        let mut c = vec![0.0; n];
        vec_add_serial(&a, &b, &mut c);
        assert!(c.iter().all(|&v| v == n as Elem));
    }

    #[test]
    fn test_parallel_matches_serial() {
        let rt = ParallelRuntime::new(3).unwrap();
        let n = 10_007;
        let a: Vec<Elem> = (0..n).map(|i| (i as Elem).sin()).collect();
        let b: Vec<Elem> = (0..n).map(|i| (i as Elem * 0.5).cos()).collect();
        let mut serial = vec![0.0; n];
        let mut parallel = vec![0.0; n];
        vec_add_serial(&a, &b, &mut serial);
        vec_add_parallel(&rt, &a, &b, &mut parallel);
        assert_eq!(serial, parallel);
    }

    #[test]
    #[should_panic(expected = "vector lengths differ")]
    fn test_length_mismatch_panics() {
        let mut c = vec![0.0; 3];
        vec_add_serial(&[1.0; 3], &[1.0; 2], &mut c);
    }
}
