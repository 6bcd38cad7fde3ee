use chrono::Utc;
use rand::Rng;

pub const BRAND_PREFIX: &str = "EBOMI";

// No 0/O or 1/I so references survive being read aloud.
const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const SUFFIX_LEN: usize = 6;

/// `EBOMI-<unix millis>-<6 chars>`. Uniqueness is enforced again by the store.
pub fn generate_booking_ref() -> String {
    let millis = Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("{BRAND_PREFIX}-{millis}-{suffix}")
}
