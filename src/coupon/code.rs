use rand::Rng;

pub const MIN_CODE_LENGTH: usize = 1;
pub const MAX_CODE_LENGTH: usize = 10;

/// First and last Hangul syllable (가..힣).
const HANGUL_SYLLABLES: (u32, u32) = (0xAC00, 0xD7A3);
const DIGITS: (u32, u32) = ('0' as u32, '9' as u32);

/// Generates a display code for an issued coupon.
///
/// The length is uniform in `MIN_CODE_LENGTH..=MAX_CODE_LENGTH` and every
/// character is a Hangul syllable or an ASCII digit with equal odds. Codes are
/// not checked for uniqueness and may collide.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    let length = rng.gen_range(MIN_CODE_LENGTH..=MAX_CODE_LENGTH);

    (0..length)
        .map(|_| {
            let (start, end) = if rng.gen_bool(0.5) {
                HANGUL_SYLLABLES
            } else {
                DIGITS
            };
            pick(&mut *rng, start, end)
        })
        .collect()
}

fn pick<R: Rng + ?Sized>(rng: &mut R, start: u32, end: u32) -> char {
    // both ranges lie entirely outside the surrogate block
    char::from_u32(rng.gen_range(start..=end)).unwrap_or('0')
}
