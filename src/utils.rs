/// Number of 32-bit words needed to hold one bit per source slot,
/// including the fake source 0.
pub(crate) const fn words_for_sources(num_sources: usize) -> usize {
    (num_sources + 1).div_ceil(u32::BITS as usize)
}

/// Source ID addressed by `bit` of the word at `word_index`.
pub(crate) const fn source_of_bit(word_index: usize, bit: u32) -> usize {
    word_index * u32::BITS as usize + bit as usize
}

/// Packs a 32-bit word: bit `i` is set iff `is_set(word_index * 32 + i)`.
pub(crate) fn pack_word(word_index: usize, is_set: impl Fn(usize) -> bool) -> u32 {
    let mut val: u32 = 0;
    let mut bit_mask: u32 = 1;
    for i in 0..u32::BITS {
        if is_set(source_of_bit(word_index, i)) {
            val |= bit_mask;
        }
        bit_mask <<= 1;
    }
    val
}
