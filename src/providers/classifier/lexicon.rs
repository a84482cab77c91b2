//! Built-in wordlist classifier backend.
//!
//! Scores a text by counting hits against small positive and negative word
//! lists, with a preceding negator flipping a hit's sign. This backend needs
//! no external service and is the default; accuracy is traded for having a
//! dependency-free fallback when no model server is deployed.

use std::collections::HashSet;

use async_trait::async_trait;

use super::traits::{ClassifierResult, TextClassifier};
use crate::domain::Polarity;

const POSITIVE_WORDS: &[&str] = &[
    "amazing",
    "appreciate",
    "awesome",
    "best",
    "congratulations",
    "delighted",
    "excellent",
    "excited",
    "fantastic",
    "glad",
    "good",
    "great",
    "happy",
    "love",
    "loved",
    "perfect",
    "pleased",
    "thank",
    "thanks",
    "thrilled",
    "well",
    "wonderful",
];

const NEGATIVE_WORDS: &[&str] = &[
    "angry",
    "annoyed",
    "awful",
    "bad",
    "broken",
    "complaint",
    "disappointed",
    "disappointing",
    "failed",
    "failure",
    "frustrated",
    "hate",
    "horrible",
    "issue",
    "poor",
    "problem",
    "refund",
    "sad",
    "sorry",
    "terrible",
    "unacceptable",
    "unhappy",
    "worst",
    "wrong",
];

const NEGATORS: &[&str] = &["not", "no", "never", "isn't", "wasn't", "don't", "didn't"];

/// Wordlist sentiment scorer.
pub struct LexiconClassifier {
    positive: HashSet<&'static str>,
    negative: HashSet<&'static str>,
    negators: HashSet<&'static str>,
}

impl LexiconClassifier {
    pub fn new() -> Self {
        Self {
            positive: POSITIVE_WORDS.iter().copied().collect(),
            negative: NEGATIVE_WORDS.iter().copied().collect(),
            negators: NEGATORS.iter().copied().collect(),
        }
    }

    /// Scores a text: +1 per positive hit, -1 per negative hit, with the
    /// sign flipped when the previous token is a negator.
    fn score(&self, text: &str) -> i32 {
        let mut score = 0;
        let mut previous_negates = false;

        for raw in text.split_whitespace() {
            let token: String = raw
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '\'')
                .collect::<String>()
                .to_lowercase();
            if token.is_empty() {
                continue;
            }

            let hit = if self.positive.contains(token.as_str()) {
                1
            } else if self.negative.contains(token.as_str()) {
                -1
            } else {
                0
            };

            score += if previous_negates { -hit } else { hit };
            previous_negates = self.negators.contains(token.as_str());
        }

        score
    }
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextClassifier for LexiconClassifier {
    fn name(&self) -> &str {
        "lexicon"
    }

    async fn classify_text(&self, text: &str) -> ClassifierResult<Polarity> {
        let score = self.score(text);
        Ok(match score {
            s if s > 0 => Polarity::Positive,
            s if s < 0 => Polarity::Negative,
            _ => Polarity::Neutral,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn classify(text: &str) -> Polarity {
        LexiconClassifier::new().classify_text(text).await.unwrap()
    }

    #[tokio::test]
    async fn positive_text() {
        assert_eq!(classify("Great news!").await, Polarity::Positive);
        assert_eq!(
            classify("This made my day, thank you!").await,
            Polarity::Positive
        );
    }

    #[tokio::test]
    async fn negative_text() {
        assert_eq!(classify("terrible experience").await, Polarity::Negative);
        assert_eq!(
            classify("the worst support I have ever had").await,
            Polarity::Negative
        );
    }

    #[tokio::test]
    async fn neutral_text() {
        assert_eq!(
            classify("meeting moved to tuesday").await,
            Polarity::Neutral
        );
        assert_eq!(classify("").await, Polarity::Neutral);
    }

    #[tokio::test]
    async fn negation_flips_polarity() {
        assert_eq!(classify("not good at all").await, Polarity::Negative);
        assert_eq!(classify("never disappointed").await, Polarity::Positive);
    }

    #[tokio::test]
    async fn punctuation_is_stripped() {
        assert_eq!(classify("great, thanks!").await, Polarity::Positive);
    }

    #[tokio::test]
    async fn mixed_text_cancels_out() {
        assert_eq!(classify("good service, bad coffee").await, Polarity::Neutral);
    }
}
