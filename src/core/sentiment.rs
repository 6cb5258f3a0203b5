//! Classification result types and the raw-label mapping tables.
//!
//! External classifiers report labels as free-form strings. They are mapped
//! to [`SentimentLabel`] and [`EmotionLabel`] here, at the boundary, so the
//! aggregation code never branches on raw strings.

use crate::error::{Error, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Polarity of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    /// Negative polarity.
    Negative,
    /// Neither positive nor negative.
    Neutral,
    /// Positive polarity.
    Positive,
}

/// Raw labels known to come out of sentiment models, lowercased.
const SENTIMENT_LABELS: &[(&str, SentimentLabel)] = &[
    ("negative", SentimentLabel::Negative),
    ("neg", SentimentLabel::Negative),
    ("label_0", SentimentLabel::Negative),
    ("1 star", SentimentLabel::Negative),
    ("2 stars", SentimentLabel::Negative),
    ("neutral", SentimentLabel::Neutral),
    ("neu", SentimentLabel::Neutral),
    ("label_1", SentimentLabel::Neutral),
    ("3 stars", SentimentLabel::Neutral),
    ("positive", SentimentLabel::Positive),
    ("pos", SentimentLabel::Positive),
    ("label_2", SentimentLabel::Positive),
    ("4 stars", SentimentLabel::Positive),
    ("5 stars", SentimentLabel::Positive),
];

impl SentimentLabel {
    /// Every label, in score-vector order.
    pub const ALL: [Self; 3] = [Self::Negative, Self::Neutral, Self::Positive];

    /// Signed value used for trends: positive = +1, neutral = 0, negative = -1.
    #[must_use]
    pub fn value(self) -> f64 {
        match self {
            Self::Negative => -1.0,
            Self::Neutral => 0.0,
            Self::Positive => 1.0,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Negative => "negative",
            Self::Neutral => "neutral",
            Self::Positive => "positive",
        }
    }

    /// Map a raw model label to a sentiment label.
    ///
    /// Returns `None` for labels outside the mapping table.
    #[must_use]
    pub fn from_raw(raw: &str) -> Option<Self> {
        let key = raw.trim().to_lowercase();
        SENTIMENT_LABELS
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, label)| *label)
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-label probabilities for one message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    /// Probability of negative.
    pub negative: f64,
    /// Probability of neutral.
    pub neutral: f64,
    /// Probability of positive.
    pub positive: f64,
}

impl SentimentScores {
    /// Probability of a label.
    #[must_use]
    pub fn get(&self, label: SentimentLabel) -> f64 {
        match label {
            SentimentLabel::Negative => self.negative,
            SentimentLabel::Neutral => self.neutral,
            SentimentLabel::Positive => self.positive,
        }
    }

    fn set(&mut self, label: SentimentLabel, value: f64) {
        match label {
            SentimentLabel::Negative => self.negative = value,
            SentimentLabel::Neutral => self.neutral = value,
            SentimentLabel::Positive => self.positive = value,
        }
    }
}

impl Default for SentimentScores {
    fn default() -> Self {
        Self {
            negative: 1.0 / 3.0,
            neutral: 1.0 / 3.0,
            positive: 1.0 / 3.0,
        }
    }
}

/// Sentiment classification of one message.
///
/// Deserialized results are range-checked: `confidence` and every score must
/// lie in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSentimentResult")]
pub struct SentimentResult {
    /// Winning label.
    pub label: SentimentLabel,

    /// Probability of the winning label, in `[0, 1]`.
    pub confidence: f64,

    /// Full probability vector.
    pub scores: SentimentScores,
}

impl SentimentResult {
    /// Build a result from a label and confidence.
    ///
    /// The remaining probability mass is split evenly over the other labels.
    #[must_use]
    pub fn new(label: SentimentLabel, confidence: f64) -> Self {
        let confidence = clamp_unit(confidence);
        let rest = (1.0 - confidence) / 2.0;
        let mut scores = SentimentScores {
            negative: rest,
            neutral: rest,
            positive: rest,
        };
        scores.set(label, confidence);
        Self {
            label,
            confidence,
            scores,
        }
    }

    /// Build a result from a probability vector, picking the arg-max label.
    #[must_use]
    pub fn from_scores(scores: SentimentScores) -> Self {
        let scores = SentimentScores {
            negative: clamp_unit(scores.negative),
            neutral: clamp_unit(scores.neutral),
            positive: clamp_unit(scores.positive),
        };
        let mut label = SentimentLabel::Negative;
        for candidate in SentimentLabel::ALL {
            if scores.get(candidate) > scores.get(label) {
                label = candidate;
            }
        }
        Self {
            label,
            confidence: scores.get(label),
            scores,
        }
    }

    /// Neutral result with zero confidence.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            confidence: 0.0,
            scores: SentimentScores::default(),
        }
    }

    /// Signed, confidence-weighted value in `[-1, 1]`.
    #[must_use]
    pub fn weighted_value(&self) -> f64 {
        self.label.value() * self.confidence
    }

    /// Strength of the sentiment regardless of direction.
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.label.value().abs() * self.confidence
    }

    /// Sentiment score on a 0-100 scale (50 is neutral).
    #[must_use]
    pub fn score(&self) -> u8 {
        let raw = match self.label {
            SentimentLabel::Positive => 50.0 + self.scores.positive * 50.0,
            SentimentLabel::Negative => 50.0 - self.scores.negative * 50.0,
            SentimentLabel::Neutral => 50.0 + (self.scores.positive - self.scores.negative) * 10.0,
        };
        // Clamped to 0..=100, so the cast cannot truncate or lose sign
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let score = raw.clamp(0.0, 100.0).trunc() as u8;
        score
    }

    /// Short human-readable description, chosen by confidence band.
    #[must_use]
    pub fn explanation(&self) -> &'static str {
        let strong = self.confidence > 0.7;
        let moderate = self.confidence > 0.5;
        match self.label {
            SentimentLabel::Positive if strong => "general satisfaction and positive engagement",
            SentimentLabel::Positive if moderate => "overall positive interaction",
            SentimentLabel::Positive => "favorable conversation tone",
            SentimentLabel::Negative if strong => "general dissatisfaction",
            SentimentLabel::Negative if moderate => "overall negative interaction",
            SentimentLabel::Negative => "unfavorable conversation tone",
            SentimentLabel::Neutral if strong => "neutral or balanced interaction",
            SentimentLabel::Neutral if moderate => "mixed or neutral conversation tone",
            SentimentLabel::Neutral => "neither strongly positive nor negative",
        }
    }
}

#[derive(Deserialize)]
struct RawSentimentResult {
    label: SentimentLabel,
    confidence: f64,
    scores: SentimentScores,
}

impl TryFrom<RawSentimentResult> for SentimentResult {
    type Error = Error;

    fn try_from(raw: RawSentimentResult) -> Result<Self> {
        let fields = [
            ("confidence", raw.confidence),
            ("negative", raw.scores.negative),
            ("neutral", raw.scores.neutral),
            ("positive", raw.scores.positive),
        ];
        for (name, value) in fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Validation(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(Self {
            label: raw.label,
            confidence: raw.confidence,
            scores: raw.scores,
        })
    }
}

/// Emotion vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    /// Joy.
    Joy,
    /// Sadness.
    Sadness,
    /// Anger.
    Anger,
    /// Fear.
    Fear,
    /// Surprise.
    Surprise,
    /// Disgust.
    Disgust,
    /// No particular emotion.
    Neutral,
}

const EMOTION_LABELS: &[(&str, EmotionLabel)] = &[
    ("joy", EmotionLabel::Joy),
    ("happiness", EmotionLabel::Joy),
    ("happy", EmotionLabel::Joy),
    ("sadness", EmotionLabel::Sadness),
    ("sad", EmotionLabel::Sadness),
    ("anger", EmotionLabel::Anger),
    ("angry", EmotionLabel::Anger),
    ("fear", EmotionLabel::Fear),
    ("surprise", EmotionLabel::Surprise),
    ("disgust", EmotionLabel::Disgust),
    ("neutral", EmotionLabel::Neutral),
    ("others", EmotionLabel::Neutral),
];

impl EmotionLabel {
    /// Every label, in vocabulary order.
    pub const ALL: [Self; 7] = [
        Self::Joy,
        Self::Sadness,
        Self::Anger,
        Self::Fear,
        Self::Surprise,
        Self::Disgust,
        Self::Neutral,
    ];

    /// Position in [`EmotionLabel::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Joy => 0,
            Self::Sadness => 1,
            Self::Anger => 2,
            Self::Fear => 3,
            Self::Surprise => 4,
            Self::Disgust => 5,
            Self::Neutral => 6,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Joy => "joy",
            Self::Sadness => "sadness",
            Self::Anger => "anger",
            Self::Fear => "fear",
            Self::Surprise => "surprise",
            Self::Disgust => "disgust",
            Self::Neutral => "neutral",
        }
    }

    /// Map a raw model label to an emotion label.
    #[must_use]
    pub fn from_raw(raw: &str) -> Option<Self> {
        let key = raw.trim().to_lowercase();
        EMOTION_LABELS
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, label)| *label)
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probability distribution over [`EmotionLabel::ALL`] for one message.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EmotionDistribution {
    probabilities: [f64; 7],
}

impl EmotionDistribution {
    /// Distribution with every probability at zero.
    #[must_use]
    pub fn zeros() -> Self {
        Self::default()
    }

    /// Build a distribution from label/probability pairs.
    ///
    /// Repeated labels are summed. A vector with positive mass is normalized
    /// to sum to 1.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (EmotionLabel, f64)>) -> Self {
        let mut probabilities = [0.0; 7];
        for (label, p) in pairs {
            probabilities[label.index()] += clamp_unit(p);
        }
        let total: f64 = probabilities.iter().sum();
        if total > 0.0 {
            for p in &mut probabilities {
                *p /= total;
            }
        }
        Self { probabilities }
    }

    pub(crate) fn from_array(probabilities: [f64; 7]) -> Self {
        Self {
            probabilities: probabilities.map(clamp_unit),
        }
    }

    /// Probability of a label.
    #[must_use]
    pub fn probability(&self, label: EmotionLabel) -> f64 {
        self.probabilities[label.index()]
    }

    /// Raw vector in vocabulary order.
    #[must_use]
    pub fn as_array(&self) -> &[f64; 7] {
        &self.probabilities
    }

    /// Arg-max label; ties resolve to the earlier label in vocabulary order.
    /// An all-zero distribution is neutral.
    #[must_use]
    pub fn label(&self) -> EmotionLabel {
        let mut best = EmotionLabel::Neutral;
        let mut best_p = 0.0;
        for label in EmotionLabel::ALL {
            let p = self.probability(label);
            if p > best_p {
                best = label;
                best_p = p;
            }
        }
        best
    }

    /// Probability of the arg-max label.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.probability(self.label())
    }

    /// Label/probability pairs in vocabulary order.
    pub fn iter(&self) -> impl Iterator<Item = (EmotionLabel, f64)> + '_ {
        EmotionLabel::ALL.iter().map(|l| (*l, self.probability(*l)))
    }
}

impl Serialize for EmotionDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(EmotionLabel::ALL.len()))?;
        for (label, p) in self.iter() {
            map.serialize_entry(label.as_str(), &p)?;
        }
        map.end()
    }
}

/// Clamp into `[0, 1]`, mapping NaN to 0.
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_sentiment_labels_map_to_enum() {
        assert_eq!(SentimentLabel::from_raw("positive"), Some(SentimentLabel::Positive));
        assert_eq!(SentimentLabel::from_raw("LABEL_0"), Some(SentimentLabel::Negative));
        assert_eq!(SentimentLabel::from_raw(" Neutral "), Some(SentimentLabel::Neutral));
        assert_eq!(SentimentLabel::from_raw("5 stars"), Some(SentimentLabel::Positive));
        assert_eq!(SentimentLabel::from_raw("ecstatic"), None);
    }

    #[test]
    fn raw_emotion_labels_map_to_enum() {
        assert_eq!(EmotionLabel::from_raw("JOY"), Some(EmotionLabel::Joy));
        assert_eq!(EmotionLabel::from_raw("anger"), Some(EmotionLabel::Anger));
        assert_eq!(EmotionLabel::from_raw("love"), None);
    }

    #[test]
    fn new_clamps_confidence() {
        let r = SentimentResult::new(SentimentLabel::Positive, 1.7);
        assert!((r.confidence - 1.0).abs() < f64::EPSILON);
        let r = SentimentResult::new(SentimentLabel::Negative, f64::NAN);
        assert!(r.confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn from_scores_picks_argmax() {
        let r = SentimentResult::from_scores(SentimentScores {
            negative: 0.1,
            neutral: 0.2,
            positive: 0.7,
        });
        assert_eq!(r.label, SentimentLabel::Positive);
        assert!((r.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn score_ranges_by_label() {
        let positive = SentimentResult::from_scores(SentimentScores {
            negative: 0.0625,
            neutral: 0.0625,
            positive: 0.875,
        });
        assert_eq!(positive.score(), 93);

        let negative = SentimentResult::from_scores(SentimentScores {
            negative: 0.75,
            neutral: 0.125,
            positive: 0.125,
        });
        assert_eq!(negative.score(), 12);

        let neutral = SentimentResult::from_scores(SentimentScores {
            negative: 0.125,
            neutral: 0.5,
            positive: 0.375,
        });
        assert_eq!(neutral.score(), 52);
    }

    #[test]
    fn explanation_follows_confidence_band() {
        let strong = SentimentResult::new(SentimentLabel::Negative, 0.9);
        assert_eq!(strong.explanation(), "general dissatisfaction");
        let weak = SentimentResult::new(SentimentLabel::Positive, 0.4);
        assert_eq!(weak.explanation(), "favorable conversation tone");
    }

    #[test]
    fn weighted_value_is_signed() {
        let r = SentimentResult::new(SentimentLabel::Negative, 0.5);
        assert!((r.weighted_value() + 0.5).abs() < 1e-9);
        assert!((r.magnitude() - 0.5).abs() < 1e-9);
        assert!(SentimentResult::new(SentimentLabel::Neutral, 0.9).magnitude().abs() < 1e-9);
    }

    #[test]
    fn emotion_distribution_normalizes() {
        let d = EmotionDistribution::from_pairs([
            (EmotionLabel::Anger, 3.0),
            (EmotionLabel::Joy, 0.5),
            (EmotionLabel::Anger, 0.5),
        ]);
        // Inputs are clamped to 1.0 before summing
        assert!((d.probability(EmotionLabel::Anger) - 0.75).abs() < 1e-9);
        assert!((d.probability(EmotionLabel::Joy) - 0.25).abs() < 1e-9);
        assert_eq!(d.label(), EmotionLabel::Anger);
    }

    #[test]
    fn zero_distribution_is_neutral() {
        let d = EmotionDistribution::zeros();
        assert_eq!(d.label(), EmotionLabel::Neutral);
        assert!(d.confidence().abs() < f64::EPSILON);
    }

    #[test]
    fn deserialize_rejects_out_of_range_confidence() {
        let json = r#"{"label":"positive","confidence":1.5,
            "scores":{"negative":0.0,"neutral":0.0,"positive":1.0}}"#;
        let err = serde_json::from_str::<SentimentResult>(json).unwrap_err();
        assert!(err.to_string().contains("confidence must be within [0, 1]"));

        let json = r#"{"label":"negative","confidence":0.5,
            "scores":{"negative":-0.2,"neutral":0.2,"positive":0.3}}"#;
        assert!(serde_json::from_str::<SentimentResult>(json).is_err());
    }

    #[test]
    fn deserialize_accepts_serialized_result() {
        let original = SentimentResult::new(SentimentLabel::Negative, 0.8);
        let json = serde_json::to_string(&original).unwrap();
        let back: SentimentResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn emotion_distribution_serializes_as_map() {
        let d = EmotionDistribution::from_pairs([(EmotionLabel::Fear, 1.0)]);
        let json = serde_json::to_value(d).unwrap();
        assert_eq!(json["fear"], 1.0);
        assert_eq!(json["joy"], 0.0);
    }
}
