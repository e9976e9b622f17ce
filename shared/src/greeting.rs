//! Greeting detection used to hide citations on small talk.
//!
//! This is a plain keyword heuristic, not a classifier. It matches substrings,
//! so "hi" also fires inside words such as "this" or "which". That suppresses
//! citations on some real questions; the answer itself is unaffected.

/// Phrases that mark a message as a greeting or identity question.
pub const GREETING_KEYWORDS: [&str; 12] = [
    "hi",
    "hello",
    "hii",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
    "what is your name",
    "who are you",
    "what can you do",
    "your name",
    "how are you",
];

/// True if the message contains any greeting keyword, ignoring case.
pub fn is_greeting(message: &str) -> bool {
    let normalized = message.trim().to_lowercase();
    GREETING_KEYWORDS.iter().any(|keyword| normalized.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_greetings() {
        assert!(is_greeting("Hello"));
        assert!(is_greeting("  HEY there "));
        assert!(is_greeting("Good Morning!"));
        assert!(is_greeting("Who are you?"));
        assert!(is_greeting("what can you do for me"));
    }

    #[test]
    fn test_domain_question_is_not_greeting() {
        assert!(!is_greeting("What are the KYC requirements for agents?"));
        assert!(!is_greeting("Explain motor insurance regulations"));
    }

    #[test]
    fn test_substring_match_is_intentional() {
        assert!(is_greeting("Is this policy valid?"));
    }
}
