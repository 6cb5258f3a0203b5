//! Offline keyword-lexicon classifier.
//!
//! Scores text against small weighted word lists and turns the evidence
//! into probabilities with a softmax. Good enough for offline use and
//! deterministic tests; use the Hugging Face classifier for real analysis.

use crate::core::sentiment::{
    EmotionDistribution, EmotionLabel, SentimentLabel, SentimentResult, SentimentScores,
};
use crate::error::Result;
use crate::providers::Classifier;
use regex::Regex;
use std::sync::LazyLock;

/// Logit gain per unit of lexicon evidence.
const GAIN: f64 = 2.5;

/// Logit of the neutral class, so text without evidence leans neutral.
const NEUTRAL_BIAS: f64 = 1.0;

/// Multiplier applied by an intensifier to the next sentiment word.
const INTENSIFIER_BOOST: f64 = 1.5;

static TOKEN_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[a-z']+").ok());

const POSITIVE_WORDS: &[(&str, f64)] = &[
    ("love", 1.0),
    ("loved", 1.0),
    ("great", 1.0),
    ("excellent", 1.0),
    ("amazing", 1.0),
    ("wonderful", 1.0),
    ("awesome", 1.0),
    ("fantastic", 1.0),
    ("perfect", 1.0),
    ("best", 1.0),
    ("happy", 1.0),
    ("excited", 0.9),
    ("glad", 0.8),
    ("enjoy", 0.8),
    ("pleased", 0.8),
    ("delighted", 1.0),
    ("good", 0.7),
    ("nice", 0.7),
    ("helpful", 0.7),
    ("thanks", 0.6),
    ("thank", 0.6),
    ("like", 0.5),
    ("better", 0.5),
];

const NEGATIVE_WORDS: &[(&str, f64)] = &[
    ("terrible", 1.0),
    ("awful", 1.0),
    ("horrible", 1.0),
    ("hate", 1.0),
    ("worst", 1.0),
    ("furious", 1.0),
    ("disgusting", 1.0),
    ("angry", 0.9),
    ("useless", 0.9),
    ("sad", 0.8),
    ("upset", 0.8),
    ("disappointed", 0.8),
    ("frustrated", 0.8),
    ("frustrating", 0.8),
    ("bad", 0.7),
    ("annoying", 0.7),
    ("annoyed", 0.7),
    ("scared", 0.7),
    ("poor", 0.6),
    ("broken", 0.6),
    ("worse", 0.6),
    ("wrong", 0.5),
];

const NEGATORS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "wasn't", "aren't", "can't",
    "won't",
];

const INTENSIFIERS: &[&str] = &["very", "really", "so", "extremely", "totally", "absolutely"];

const EMOTION_WORDS: &[(EmotionLabel, &[&str])] = &[
    (
        EmotionLabel::Joy,
        &[
            "love", "happy", "glad", "great", "wonderful", "amazing", "awesome", "excited",
            "enjoy", "delighted", "joy", "fantastic", "thanks",
        ],
    ),
    (
        EmotionLabel::Sadness,
        &[
            "sad", "unhappy", "depressed", "miss", "lonely", "cry", "crying", "disappointed",
            "sorry", "heartbroken",
        ],
    ),
    (
        EmotionLabel::Anger,
        &[
            "angry", "furious", "hate", "annoyed", "annoying", "mad", "outraged", "frustrated",
            "frustrating", "irritated",
        ],
    ),
    (
        EmotionLabel::Fear,
        &[
            "afraid", "scared", "fear", "worried", "anxious", "nervous", "terrified", "panic",
        ],
    ),
    (
        EmotionLabel::Surprise,
        &[
            "surprised", "wow", "unexpected", "shocked", "amazed", "astonished", "suddenly",
        ],
    ),
    (
        EmotionLabel::Disgust,
        &[
            "disgusting", "gross", "awful", "terrible", "horrible", "nasty", "revolting",
        ],
    ),
];

/// Lexicon-based classifier that never touches the network.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexiconClassifier;

impl LexiconClassifier {
    /// Create a lexicon classifier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Positive and negative evidence for a text.
    fn polarity_evidence(text: &str) -> (f64, f64) {
        let mut positive = 0.0;
        let mut negative = 0.0;
        let mut negate = false;
        let mut boost = 1.0;

        for token in tokenize(text) {
            if NEGATORS.contains(&token.as_str()) {
                negate = true;
                continue;
            }
            if INTENSIFIERS.contains(&token.as_str()) {
                boost = INTENSIFIER_BOOST;
                continue;
            }

            let weight = lookup(POSITIVE_WORDS, &token)
                .map(|w| (w, true))
                .or_else(|| lookup(NEGATIVE_WORDS, &token).map(|w| (w, false)));

            if let Some((w, is_positive)) = weight {
                // A negator flips the polarity of the next sentiment word
                if is_positive != negate {
                    positive += w * boost;
                } else {
                    negative += w * boost;
                }
                negate = false;
                boost = 1.0;
            }
        }

        (positive, negative)
    }
}

impl Classifier for LexiconClassifier {
    fn name(&self) -> &str {
        "lexicon"
    }

    fn classify(&self, text: &str) -> Result<SentimentResult> {
        if text.trim().is_empty() {
            return Ok(SentimentResult::neutral());
        }
        let (positive, negative) = Self::polarity_evidence(text);
        let probs = softmax(&[GAIN * negative, NEUTRAL_BIAS, GAIN * positive]);
        Ok(SentimentResult::from_scores(SentimentScores {
            negative: probs[0],
            neutral: probs[1],
            positive: probs[2],
        }))
    }

    fn classify_emotion(&self, text: &str) -> Result<EmotionDistribution> {
        let mut evidence = [0.0; 7];
        let mut negate = false;
        for token in tokenize(text) {
            if NEGATORS.contains(&token.as_str()) {
                negate = true;
                continue;
            }
            for (label, words) in EMOTION_WORDS {
                if words.contains(&token.as_str()) {
                    // Negated emotion words carry no evidence
                    if !negate {
                        evidence[label.index()] += 1.0;
                    }
                    negate = false;
                }
            }
        }

        let logits: Vec<f64> = EmotionLabel::ALL
            .iter()
            .map(|label| match label {
                EmotionLabel::Neutral => NEUTRAL_BIAS,
                other => GAIN * evidence[other.index()],
            })
            .collect();
        let probs = softmax(&logits);
        Ok(EmotionDistribution::from_pairs(
            EmotionLabel::ALL.iter().copied().zip(probs),
        ))
    }
}

fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    match TOKEN_RE.as_ref() {
        Some(re) => re.find_iter(&lower).map(|m| m.as_str().to_string()).collect(),
        None => lower.split_whitespace().map(str::to_string).collect(),
    }
}

fn lookup(table: &[(&str, f64)], token: &str) -> Option<f64> {
    table.iter().find(|(w, _)| *w == token).map(|(_, weight)| *weight)
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
