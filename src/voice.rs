//! Voice command matching.
//!
//! Speech recognition and synthesis live in the browser; this module is
//! the part in between — a fixed keyword lookup that turns a transcript
//! into a canned safety tip. Rules are checked in declaration order and
//! match whole words case-insensitively, in English or Hindi. Repeated
//! questions on the same topic rotate through that topic's tips.

use std::sync::atomic::{AtomicUsize, Ordering};

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Errors building an assistant rule set.
#[derive(Debug, Error)]
pub enum VoiceError {
    /// A rule was declared without any tips to answer with.
    #[error("Rule '{topic}' has no tips")]
    NoTips {
        /// The offending rule's topic.
        topic: String,
    },

    /// A rule was declared without any keywords to match on.
    #[error("Rule '{topic}' has no keywords")]
    NoKeywords {
        /// The offending rule's topic.
        topic: String,
    },

    /// The assembled keyword pattern failed to compile.
    #[error("Invalid keyword pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// The assistant's answer to one transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    /// Matched topic, `None` when the fallback answered.
    pub topic: Option<String>,
    /// Text to speak and display.
    pub text: String,
}

#[derive(Debug)]
struct CommandRule {
    topic: String,
    pattern: Regex,
    tips: Vec<String>,
    cursor: AtomicUsize,
}

/// Fixed keyword lookup with canned responses.
#[derive(Debug)]
pub struct SafetyAssistant {
    rules: Vec<CommandRule>,
    fallback: String,
}

impl SafetyAssistant {
    /// Creates an assistant with no rules; unmatched transcripts get
    /// `fallback`.
    #[must_use]
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            fallback: fallback.into(),
        }
    }

    /// Appends a rule. Earlier rules win when several match.
    ///
    /// Keywords are matched as whole words, case-insensitively; they are
    /// treated as literals, not patterns.
    ///
    /// # Errors
    ///
    /// Rejects rules without keywords or tips.
    pub fn with_rule(
        mut self,
        topic: impl Into<String>,
        keywords: &[&str],
        tips: Vec<String>,
    ) -> Result<Self, VoiceError> {
        let topic = topic.into();
        if keywords.is_empty() {
            return Err(VoiceError::NoKeywords { topic });
        }
        if tips.is_empty() {
            return Err(VoiceError::NoTips { topic });
        }

        let alternation = keywords
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
            .case_insensitive(true)
            .build()?;

        self.rules.push(CommandRule {
            topic,
            pattern,
            tips,
            cursor: AtomicUsize::new(0),
        });
        Ok(self)
    }

    /// The built-in preparedness rule set: flood, earthquake, cyclone and
    /// fire tips plus a help topic, with English and Hindi keywords.
    #[must_use]
    pub fn preparedness() -> Self {
        let tips = |lines: &[&str]| lines.iter().map(ToString::to_string).collect::<Vec<_>>();

        // Keywords are static literals; escaping guarantees they compile.
        Self::new(
            "I did not catch that. Ask me about floods, earthquakes, cyclones, or fires.",
        )
        .with_rule("flood", &["flood", "बाढ़"], tips(&[
            "Move to higher ground immediately and avoid walking through moving water.",
            "Do not drive through flooded roads; two feet of water can carry a car away.",
            "Keep your emergency kit and important documents in a waterproof bag.",
        ]))
        .and_then(|a| {
            a.with_rule("earthquake", &["earthquake", "भूकंप"], tips(&[
                "Drop, cover, and hold on until the shaking stops.",
                "Stay away from windows, mirrors, and anything that can fall.",
                "If you are outdoors, move to an open area away from buildings and wires.",
            ]))
        })
        .and_then(|a| {
            a.with_rule("cyclone", &["cyclone", "तूफान", "चक्रवात"], tips(&[
                "Secure loose objects outside and stay indoors away from windows.",
                "Keep a battery radio on for official updates and evacuation orders.",
            ]))
        })
        .and_then(|a| {
            a.with_rule("fire", &["fire", "आग"], tips(&[
                "Stay low under the smoke and crawl to the nearest exit.",
                "Feel doors with the back of your hand before opening them.",
                "Never use a lift during a fire; take the stairs.",
            ]))
        })
        .and_then(|a| {
            a.with_rule("help", &["help", "मदद"], tips(&[
                "You can ask me for safety tips about floods, earthquakes, cyclones, or fires.",
            ]))
        })
        .expect("built-in keyword rules are static literals")
    }

    /// Answers a transcript with the first matching rule's next tip, or
    /// the fallback.
    #[must_use]
    pub fn respond(&self, transcript: &str) -> AssistantReply {
        for rule in &self.rules {
            if rule.pattern.is_match(transcript) {
                let index = rule.cursor.fetch_add(1, Ordering::Relaxed) % rule.tips.len();
                return AssistantReply {
                    topic: Some(rule.topic.clone()),
                    text: rule.tips[index].clone(),
                };
            }
        }
        AssistantReply {
            topic: None,
            text: self.fallback.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_each_builtin_topic() {
        let assistant = SafetyAssistant::preparedness();
        for (transcript, topic) in [
            ("what do I do in a flood", "flood"),
            ("tell me about earthquake safety", "earthquake"),
            ("is a cyclone coming", "cyclone"),
            ("there is a fire in the kitchen", "fire"),
            ("help", "help"),
        ] {
            let reply = assistant.respond(transcript);
            assert_eq!(reply.topic.as_deref(), Some(topic), "for '{transcript}'");
            assert!(!reply.text.is_empty());
        }
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let assistant = SafetyAssistant::preparedness();
        let reply = assistant.respond("FLOOD warning near me");
        assert_eq!(reply.topic.as_deref(), Some("flood"));
    }

    #[test]
    fn test_hindi_keywords_match() {
        let assistant = SafetyAssistant::preparedness();
        assert_eq!(
            assistant.respond("बाढ़ में क्या करें").topic.as_deref(),
            Some("flood")
        );
        assert_eq!(
            assistant.respond("मदद").topic.as_deref(),
            Some("help")
        );
    }

    #[test]
    fn test_whole_word_matching() {
        let assistant = SafetyAssistant::preparedness();
        // "firefly" must not trip the fire rule.
        assert_eq!(assistant.respond("I saw a firefly").topic, None);
    }

    #[test]
    fn test_unmatched_transcript_gets_fallback() {
        let assistant = SafetyAssistant::preparedness();
        let reply = assistant.respond("what is the weather");
        assert_eq!(reply.topic, None);
        assert!(reply.text.contains("Ask me"));
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let assistant = SafetyAssistant::preparedness();
        let reply = assistant.respond("flood and fire at once");
        assert_eq!(reply.topic.as_deref(), Some("flood"));
    }

    #[test]
    fn test_tips_rotate() {
        let assistant = SafetyAssistant::preparedness();
        let first = assistant.respond("flood").text;
        let second = assistant.respond("flood").text;
        assert_ne!(first, second);

        // Three flood tips: the fourth answer wraps around.
        let _ = assistant.respond("flood");
        let fourth = assistant.respond("flood").text;
        assert_eq!(first, fourth);
    }

    #[test]
    fn test_rule_without_tips_rejected() {
        let err = SafetyAssistant::new("fallback")
            .with_rule("empty", &["x"], vec![])
            .unwrap_err();
        assert!(matches!(err, VoiceError::NoTips { .. }));
    }

    #[test]
    fn test_rule_without_keywords_rejected() {
        let err = SafetyAssistant::new("fallback")
            .with_rule("empty", &[], vec!["tip".to_string()])
            .unwrap_err();
        assert!(matches!(err, VoiceError::NoKeywords { .. }));
    }
}
