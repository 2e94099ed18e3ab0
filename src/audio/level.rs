/// Approximate signal strength of a chunk.
///
/// Combines the first two bytes into one 16-bit-style value: the first byte's
/// low eight bits become the high byte and the second byte (unsigned) the low
/// byte. This is not RMS or peak detection. Missing bytes read as zero.
pub fn signal_amplitude(chunk: &[u8]) -> u32 {
    let b0 = chunk.first().map_or(0, |&b| i32::from(b as i8));
    let b1 = chunk.get(1).map_or(0, |&b| i32::from(b));

    let ab = ((b0 & 0xff) << 8) | b1;
    ab.unsigned_abs()
}
