use rand::Rng;

use kernbench::Elem;

/// Matrix multiply FLOP count (multiply-add = 2 ops)
pub fn matmul_flops(n: usize) -> u64 {
    2 * (n as u64).pow(3)
}

/// Vector add bytes moved (2 reads + 1 write per element)
pub fn vec_add_rw_bytes(n: usize) -> u64 {
    3 * n as u64 * kernbench::ELEM_BYTES as u64
}

/// Random vector in [-1.0, 1.0)
pub fn random_vec(n: usize) -> Vec<Elem> {
    let mut rng = rand::thread_rng();
    (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
}
