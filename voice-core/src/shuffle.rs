use rand::Rng;

use crate::scd::ScdFile;
use crate::voice::Voice;

/// Redistributes every non-dummy voice across `files` with a uniformly random
/// permutation. Dummy slots are left alone and the slot count of every file
/// is unchanged. A voice may land back in its own slot.
///
/// Slots are visited in file order, then slot order, so a given seed always
/// produces the same layout for the same input list. Returns the pool size.
pub fn shuffle_voices<R: Rng + ?Sized>(files: &mut [ScdFile], rng: &mut R) -> usize {
    let mut pool: Vec<&mut Voice> = files
        .iter_mut()
        .flat_map(|file| file.voices_mut())
        .filter(|voice| !voice.is_dummy())
        .collect();

    // Fisher-Yates over the slots themselves: swapping the voices in place
    // is the same as drawing a permuted pool and handing it back out.
    let mut i = pool.len();
    while i > 1 {
        i -= 1;
        let j = rng.gen_range(0..=i);
        if i != j {
            let (lo, hi) = pool.split_at_mut(i);
            std::mem::swap(&mut *lo[j], &mut *hi[0]);
        }
    }

    pool.len()
}
