use rand::seq::IndexedRandom;

use super::types::ROOM_CODE_LENGTH;

/// Uppercase letters and digits only, so codes survive being read aloud.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a 6-character room code, uniform over the 36-character alphabet.
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    let mut code = String::with_capacity(ROOM_CODE_LENGTH);
    while code.len() < ROOM_CODE_LENGTH {
        // `choose` is None only for an empty slice; the alphabet never is.
        if let Some(&byte) = CODE_ALPHABET.choose(&mut rng) {
            code.push(byte as char);
        }
    }
    code
}

/// Check a user-supplied code for the expected shape before any lookup.
pub fn is_valid_room_code(code: &str) -> bool {
    code.len() == ROOM_CODE_LENGTH
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
