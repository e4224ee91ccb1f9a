use rand::RngCore;

pub const API_KEY_PREFIX: &str = "wf_";
const API_KEY_BYTES: usize = 32;

/// `wf_` followed by 32 random bytes in lower-case hex.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; API_KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|byte| format!("{byte:02x}")).collect();
    format!("{API_KEY_PREFIX}{hex}")
}
