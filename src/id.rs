//! ID generation utilities for Tandem
//!
//! Provides identifiers for conversations and the agents taking part in them.

use rand::Rng;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Generate a unique conversation ID
///
/// Format: `{timestamp_ms}-{random_hex}`
/// Example: `1738300800123-a1b2`
pub fn generate_conversation_id() -> String {
    let timestamp = now_ms();
    let random: u16 = rand::rng().random();
    format!("{}-{:04x}", timestamp, random)
}

/// Build the identity of one participant in a conversation
///
/// Format: `{role}@{conversation_suffix}`
/// Example: for role "executor" and conversation "1738300800123-a1b2": "executor@a1b2"
pub fn participant_id(role: &str, conversation_id: &str) -> String {
    let suffix = conversation_id.split('-').next_back().unwrap_or(conversation_id);
    format!("{}@{}", role, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms_returns_reasonable_timestamp() {
        let ts = now_ms();
        // Should be after 2020-01-01 and before 2100-01-01
        assert!(ts > 1577836800000);
        assert!(ts < 4102444800000);
    }

    #[test]
    fn test_generate_conversation_id_format() {
        let id = generate_conversation_id();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[1].len(), 4);
        assert!(parts[1].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_conversation_id_uniqueness() {
        let mut ids = std::collections::HashSet::new();
        for _ in 0..50 {
            ids.insert(generate_conversation_id());
        }
        // Random suffix makes collisions vanishingly unlikely
        assert!(ids.len() > 45);
    }

    #[test]
    fn test_participant_id() {
        assert_eq!(participant_id("executor", "1738300800123-a1b2"), "executor@a1b2");
        assert_eq!(participant_id("responder", "plain"), "responder@plain");
    }
}
