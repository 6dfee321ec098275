//! Cheap pseudo-random payload for bulk writes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{SystemTime, UNIX_EPOCH};

/// Produces fixed-size chunks of ASCII digits.
///
/// The scratch buffer is allocated once and filled with decimal renderings of
/// random integers. Each call to [`next_chunk`](Self::next_chunk) re-renders a
/// single integer at a rotating offset, so consecutive chunks differ while the
/// per-chunk cost stays at a handful of bytes. The content is not meant to be
/// unpredictable, only cheap enough that the disk stays the bottleneck.
pub struct PayloadGenerator {
    rng: StdRng,
    scratch: Vec<u8>,
    cursor: usize,
}

impl PayloadGenerator {
    /// Create a generator seeded from the current time.
    pub fn new(chunk_size: usize) -> Self {
        Self::with_seed(chunk_size, time_seed())
    }

    /// Create a generator with a fixed seed.
    pub fn with_seed(chunk_size: usize, seed: u64) -> Self {
        let mut generator = Self {
            rng: StdRng::seed_from_u64(seed),
            scratch: vec![0; chunk_size.max(1)],
            cursor: 0,
        };
        generator.fill();
        generator
    }

    /// Size of every chunk this generator returns.
    pub fn chunk_size(&self) -> usize {
        self.scratch.len()
    }

    /// Next chunk to write. Always exactly `chunk_size` bytes.
    pub fn next_chunk(&mut self) -> &[u8] {
        let n = self.rng.random::<u64>();
        self.cursor += render_decimal(n, &mut self.scratch[self.cursor..]);
        if self.cursor >= self.scratch.len() {
            self.cursor = 0;
        }
        &self.scratch
    }

    fn fill(&mut self) {
        let mut pos = 0;
        while pos < self.scratch.len() {
            let n = self.rng.random::<u64>();
            pos += render_decimal(n, &mut self.scratch[pos..]);
        }
    }
}

/// Write the decimal digits of `n` into `out`, truncated to fit. Returns bytes written.
fn render_decimal(mut n: u64, out: &mut [u8]) -> usize {
    let mut digits = [0u8; 20];
    let mut start = digits.len();
    loop {
        start -= 1;
        digits[start] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    let len = (digits.len() - start).min(out.len());
    out[..len].copy_from_slice(&digits[start..start + len]);
    len
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
