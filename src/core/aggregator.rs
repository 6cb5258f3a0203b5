//! Conversation-level sentiment aggregation.
//!
//! Only the `classify_*` functions talk to the classifier and can fail. The
//! rest are pure functions over results that were already fetched.

use crate::core::conversation::{ConversationStore, Turn};
use crate::core::sentiment::{EmotionDistribution, EmotionLabel, SentimentLabel, SentimentResult};
use crate::error::{Error, Result};
use crate::providers::Classifier;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Minimum mean change between halves for a trend to count as directional.
pub const DEFAULT_TREND_THRESHOLD: f64 = 0.15;

/// Default number of key moments to report.
pub const DEFAULT_KEY_MOMENTS: usize = 3;

/// Sentiment of one user turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageSentiment {
    /// Index of the turn in the full history.
    pub sequence_index: usize,

    /// Text that was classified.
    pub text: String,

    /// Classifier output.
    pub result: SentimentResult,
}

/// Emotion distribution of one user turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageEmotion {
    /// Index of the turn in the full history.
    pub sequence_index: usize,

    /// Classifier output.
    pub distribution: EmotionDistribution,
}

/// Direction of sentiment across the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// Second half is more positive than the first.
    Improving,
    /// Second half is more negative than the first.
    Declining,
    /// No change beyond the threshold.
    Stable,
    /// Fewer than two user turns.
    InsufficientData,
}

impl Trend {
    /// Human-readable description.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Declining => "declining",
            Self::Stable => "stable",
            Self::InsufficientData => "insufficient data",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A user turn with unusually strong sentiment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyMoment {
    /// Index of the turn in the full history.
    pub sequence_index: usize,

    /// Turn text.
    pub text: String,

    /// Sentiment label of the turn.
    pub label: SentimentLabel,

    /// Classifier confidence.
    pub confidence: f64,

    /// `|label value| * confidence`.
    pub magnitude: f64,
}

/// Label counts across the conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LabelDistribution {
    /// Negative messages.
    pub negative: usize,
    /// Neutral messages.
    pub neutral: usize,
    /// Positive messages.
    pub positive: usize,
}

/// Emotion view of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionSummary {
    /// Dominant emotion of the mean distribution.
    pub label: EmotionLabel,

    /// Probability of the dominant emotion.
    pub confidence: f64,

    /// Component-wise mean of every message's distribution.
    pub mean: EmotionDistribution,

    /// Per-message distributions, aligned with user turns.
    pub per_message: Vec<MessageEmotion>,
}

/// Full analysis of a conversation. Replaced wholesale on each request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationSentiment {
    /// Overall label.
    pub overall_label: SentimentLabel,

    /// Mean confidence of the overall label's occurrences.
    pub overall_confidence: f64,

    /// Per-message results, one per user turn, in turn order.
    pub per_message: Vec<MessageSentiment>,

    /// Direction of the conversation.
    pub trend: Trend,

    /// Human-readable trend.
    pub trend_description: String,

    /// Strongest user turns.
    pub key_moments: Vec<KeyMoment>,

    /// Label counts.
    pub distribution: LabelDistribution,

    /// Emotion view (when requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotions: Option<EmotionSummary>,
}

impl ConversationSentiment {
    /// Overall result as a `SentimentResult`.
    #[must_use]
    pub fn overall(&self) -> SentimentResult {
        SentimentResult::new(self.overall_label, self.overall_confidence)
    }

    /// One-line summary of the overall sentiment.
    #[must_use]
    pub fn headline(&self) -> String {
        let overall = self.overall();
        let label = self.overall_label.as_str();
        let mut chars = label.chars();
        let capitalized = chars
            .next()
            .map(|c| c.to_uppercase().chain(chars).collect::<String>())
            .unwrap_or_default();
        format!(
            "Overall conversation sentiment: {capitalized} - {}",
            overall.explanation()
        )
    }
}

/// Tuning for [`analyze`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    /// Trend threshold.
    pub trend_threshold: f64,

    /// Number of key moments.
    pub key_moments: usize,

    /// Whether to run the emotion classifier as well.
    pub emotions: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            trend_threshold: DEFAULT_TREND_THRESHOLD,
            key_moments: DEFAULT_KEY_MOMENTS,
            emotions: true,
        }
    }
}

/// Classify each turn, aborting on the first failure.
///
/// # Errors
///
/// Returns `Error::ClassifierUnavailable` naming the first turn whose
/// classification failed. No partial results are returned.
pub fn classify_each(turns: &[&Turn], classifier: &dyn Classifier) -> Result<Vec<MessageSentiment>> {
    let mut results = Vec::with_capacity(turns.len());
    for turn in turns {
        let result = classifier
            .classify(turn.text())
            .map_err(|e| unavailable(turn, &e))?;
        debug!(
            sequence_index = turn.sequence_index(),
            label = %result.label,
            confidence = result.confidence,
            "classified turn"
        );
        results.push(MessageSentiment {
            sequence_index: turn.sequence_index(),
            text: turn.text().to_string(),
            result,
        });
    }
    Ok(results)
}

/// Run the emotion classifier on each turn, aborting on the first failure.
///
/// # Errors
///
/// Returns `Error::ClassifierUnavailable` naming the first failing turn.
pub fn classify_emotions_each(
    turns: &[&Turn],
    classifier: &dyn Classifier,
) -> Result<Vec<MessageEmotion>> {
    turns
        .iter()
        .map(|turn| {
            classifier
                .classify_emotion(turn.text())
                .map(|distribution| MessageEmotion {
                    sequence_index: turn.sequence_index(),
                    distribution,
                })
                .map_err(|e| unavailable(turn, &e))
        })
        .collect()
}

fn unavailable(turn: &Turn, err: &Error) -> Error {
    Error::ClassifierUnavailable {
        sequence_index: turn.sequence_index(),
        reason: err.to_string(),
    }
}

/// Overall label and confidence by majority vote.
///
/// Ties on count go to the larger summed confidence; exact ties resolve in
/// the order neutral, negative, positive. Confidence is the mean confidence
/// of the winning label's occurrences. Empty input is `(Neutral, 0.0)`.
#[must_use]
pub fn aggregate_overall(results: &[SentimentResult]) -> (SentimentLabel, f64) {
    const TIE_ORDER: [SentimentLabel; 3] = [
        SentimentLabel::Neutral,
        SentimentLabel::Negative,
        SentimentLabel::Positive,
    ];

    let mut best: Option<(SentimentLabel, usize, f64)> = None;
    for label in TIE_ORDER {
        let (count, sum) = results
            .iter()
            .filter(|r| r.label == label)
            .fold((0_usize, 0.0), |(n, s), r| (n + 1, s + r.confidence));
        if count == 0 {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, best_count, best_sum)) => {
                count > best_count || (count == best_count && sum > best_sum)
            }
        };
        if better {
            best = Some((label, count, sum));
        }
    }

    match best {
        Some((label, count, sum)) => (label, sum / as_f64(count)),
        None => (SentimentLabel::Neutral, 0.0),
    }
}

/// Component-wise mean of emotion distributions.
///
/// Empty input yields the all-zero (neutral) distribution.
#[must_use]
pub fn aggregate_emotions(distributions: &[EmotionDistribution]) -> EmotionDistribution {
    if distributions.is_empty() {
        return EmotionDistribution::zeros();
    }
    let mut sums = [0.0; 7];
    for d in distributions {
        for (sum, p) in sums.iter_mut().zip(d.as_array()) {
            *sum += p;
        }
    }
    let n = as_f64(distributions.len());
    EmotionDistribution::from_array(sums.map(|s| s / n))
}

/// Classify the direction of the conversation.
///
/// Each message contributes `label value * confidence`. The mean of the
/// last `n/2` messages is compared with the mean of the first `n/2`; the
/// middle message of an odd-length conversation is in neither half.
#[must_use]
pub fn build_trend(results: &[SentimentResult], threshold: f64) -> Trend {
    let n = results.len();
    if n < 2 {
        return Trend::InsufficientData;
    }
    let half = n / 2;
    let values = mood_series(results);
    let first = mean(&values[..half]);
    let second = mean(&values[n - half..]);
    let delta = second - first;

    if delta > threshold {
        Trend::Improving
    } else if delta < -threshold {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// The `top_k` strongest messages, ties broken by latest turn first.
#[must_use]
pub fn extract_key_moments(messages: &[MessageSentiment], top_k: usize) -> Vec<KeyMoment> {
    let mut ranked: Vec<&MessageSentiment> = messages.iter().collect();
    ranked.sort_by(|a, b| {
        b.result
            .magnitude()
            .total_cmp(&a.result.magnitude())
            .then_with(|| b.sequence_index.cmp(&a.sequence_index))
    });
    ranked
        .into_iter()
        .take(top_k)
        .map(|m| KeyMoment {
            sequence_index: m.sequence_index,
            text: m.text.clone(),
            label: m.result.label,
            confidence: m.result.confidence,
            magnitude: m.result.magnitude(),
        })
        .collect()
}

/// Signed, confidence-weighted value per message.
#[must_use]
pub fn mood_series(results: &[SentimentResult]) -> Vec<f64> {
    results.iter().map(SentimentResult::weighted_value).collect()
}

/// Count messages per label.
#[must_use]
pub fn distribution(results: &[SentimentResult]) -> LabelDistribution {
    results
        .iter()
        .fold(LabelDistribution::default(), |mut acc, r| {
            match r.label {
                SentimentLabel::Negative => acc.negative += 1,
                SentimentLabel::Neutral => acc.neutral += 1,
                SentimentLabel::Positive => acc.positive += 1,
            }
            acc
        })
}

/// Classify every user turn of a conversation and aggregate the results.
///
/// # Errors
///
/// Returns `Error::ClassifierUnavailable` if any classifier call fails.
pub fn analyze(
    store: &ConversationStore,
    classifier: &dyn Classifier,
    options: &AnalysisOptions,
) -> Result<ConversationSentiment> {
    let turns = store.user_turns();
    let per_message = classify_each(&turns, classifier)?;
    let results: Vec<SentimentResult> = per_message.iter().map(|m| m.result).collect();

    let emotions = if options.emotions {
        let per_message = classify_emotions_each(&turns, classifier)?;
        let distributions: Vec<EmotionDistribution> =
            per_message.iter().map(|m| m.distribution).collect();
        let mean = aggregate_emotions(&distributions);
        Some(EmotionSummary {
            label: mean.label(),
            confidence: mean.confidence(),
            mean,
            per_message,
        })
    } else {
        None
    };

    let (overall_label, overall_confidence) = aggregate_overall(&results);
    let trend = build_trend(&results, options.trend_threshold);

    Ok(ConversationSentiment {
        overall_label,
        overall_confidence,
        trend,
        trend_description: trend.description().to_string(),
        key_moments: extract_key_moments(&per_message, options.key_moments),
        distribution: distribution(&results),
        per_message,
        emotions,
    })
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / as_f64(values.len())
    }
}

// Message counts stay far below 2^52
#[allow(clippy::cast_precision_loss)]
fn as_f64(n: usize) -> f64 {
    n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversation::Role;
    use crate::providers::LexiconClassifier;
    use proptest::prelude::*;

    fn r(label: SentimentLabel, confidence: f64) -> SentimentResult {
        SentimentResult::new(label, confidence)
    }

    fn msg(index: usize, label: SentimentLabel, confidence: f64) -> MessageSentiment {
        MessageSentiment {
            sequence_index: index,
            text: format!("message {index}"),
            result: r(label, confidence),
        }
    }

    /// Classifier that fails on any text containing "boom".
    struct Flaky;

    impl Classifier for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn classify(&self, text: &str) -> Result<SentimentResult> {
            if text.contains("boom") {
                Err(Error::Classifier("model offline".to_string()))
            } else {
                Ok(r(SentimentLabel::Positive, 0.8))
            }
        }

        fn classify_emotion(&self, _text: &str) -> Result<EmotionDistribution> {
            Ok(EmotionDistribution::from_pairs([(EmotionLabel::Joy, 1.0)]))
        }
    }

    #[test]
    fn overall_of_empty_is_neutral_zero() {
        let (label, confidence) = aggregate_overall(&[]);
        assert_eq!(label, SentimentLabel::Neutral);
        assert!(confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn overall_uses_majority_and_mean_confidence() {
        let results = [
            r(SentimentLabel::Positive, 0.9),
            r(SentimentLabel::Positive, 0.8),
            r(SentimentLabel::Negative, 0.6),
        ];
        let (label, confidence) = aggregate_overall(&results);
        assert_eq!(label, SentimentLabel::Positive);
        assert!((confidence - 0.85).abs() < 1e-9);
    }

    #[test]
    fn overall_tie_broken_by_summed_confidence() {
        let results = [
            r(SentimentLabel::Positive, 0.6),
            r(SentimentLabel::Negative, 0.95),
        ];
        let (label, confidence) = aggregate_overall(&results);
        assert_eq!(label, SentimentLabel::Negative);
        assert!((confidence - 0.95).abs() < 1e-9);
    }

    #[test]
    fn overall_exact_tie_prefers_neutral() {
        let results = [
            r(SentimentLabel::Positive, 0.5),
            r(SentimentLabel::Neutral, 0.5),
        ];
        assert_eq!(aggregate_overall(&results).0, SentimentLabel::Neutral);
    }

    #[test]
    fn trend_improving() {
        let results = [
            r(SentimentLabel::Negative, 0.9),
            r(SentimentLabel::Negative, 0.9),
            r(SentimentLabel::Positive, 0.9),
            r(SentimentLabel::Positive, 0.9),
        ];
        assert_eq!(build_trend(&results, DEFAULT_TREND_THRESHOLD), Trend::Improving);
    }

    #[test]
    fn trend_declining() {
        let results = [
            r(SentimentLabel::Positive, 0.8),
            r(SentimentLabel::Neutral, 0.7),
            r(SentimentLabel::Negative, 0.8),
        ];
        assert_eq!(build_trend(&results, DEFAULT_TREND_THRESHOLD), Trend::Declining);
    }

    #[test]
    fn trend_stable_within_threshold() {
        let results = [
            r(SentimentLabel::Positive, 0.6),
            r(SentimentLabel::Positive, 0.7),
        ];
        assert_eq!(build_trend(&results, DEFAULT_TREND_THRESHOLD), Trend::Stable);
    }

    #[test]
    fn trend_delta_equal_to_threshold_is_stable() {
        // Neutral contributes exactly 0, so delta is exactly the confidence
        let rising = [
            r(SentimentLabel::Neutral, 0.9),
            r(SentimentLabel::Positive, 0.15),
        ];
        assert_eq!(build_trend(&rising, 0.15), Trend::Stable);

        let falling = [
            r(SentimentLabel::Neutral, 0.9),
            r(SentimentLabel::Negative, 0.15),
        ];
        assert_eq!(build_trend(&falling, 0.15), Trend::Stable);

        let past = [
            r(SentimentLabel::Neutral, 0.9),
            r(SentimentLabel::Positive, 0.16),
        ];
        assert_eq!(build_trend(&past, 0.15), Trend::Improving);
    }

    #[test]
    fn trend_needs_two_messages() {
        assert_eq!(build_trend(&[], DEFAULT_TREND_THRESHOLD), Trend::InsufficientData);
        assert_eq!(
            build_trend(&[r(SentimentLabel::Positive, 1.0)], DEFAULT_TREND_THRESHOLD),
            Trend::InsufficientData
        );
        assert_eq!(Trend::InsufficientData.description(), "insufficient data");
    }

    #[test]
    fn odd_length_trend_ignores_middle() {
        // Middle message is strongly negative but sits in neither half
        let results = [
            r(SentimentLabel::Positive, 0.5),
            r(SentimentLabel::Negative, 1.0),
            r(SentimentLabel::Positive, 0.5),
        ];
        assert_eq!(build_trend(&results, DEFAULT_TREND_THRESHOLD), Trend::Stable);
    }

    #[test]
    fn key_moment_picks_strongest() {
        let messages = [
            msg(0, SentimentLabel::Positive, 0.5),
            msg(1, SentimentLabel::Negative, 0.95),
        ];
        let moments = extract_key_moments(&messages, 1);
        assert_eq!(moments.len(), 1);
        assert_eq!(moments[0].sequence_index, 1);
        assert_eq!(moments[0].label, SentimentLabel::Negative);
    }

    #[test]
    fn key_moment_ties_prefer_latest() {
        let messages = [
            msg(0, SentimentLabel::Positive, 0.8),
            msg(2, SentimentLabel::Negative, 0.8),
            msg(4, SentimentLabel::Neutral, 0.99),
        ];
        let moments = extract_key_moments(&messages, 3);
        let order: Vec<usize> = moments.iter().map(|m| m.sequence_index).collect();
        assert_eq!(order, vec![2, 0, 4]);
    }

    #[test]
    fn key_moments_of_empty_is_empty() {
        assert!(extract_key_moments(&[], 3).is_empty());
    }

    #[test]
    fn emotions_are_averaged() {
        let a = EmotionDistribution::from_pairs([(EmotionLabel::Joy, 1.0)]);
        let b = EmotionDistribution::from_pairs([
            (EmotionLabel::Joy, 0.5),
            (EmotionLabel::Anger, 0.5),
        ]);
        let mean = aggregate_emotions(&[a, b]);
        assert!((mean.probability(EmotionLabel::Joy) - 0.75).abs() < 1e-9);
        assert!((mean.probability(EmotionLabel::Anger) - 0.25).abs() < 1e-9);
        assert_eq!(mean.label(), EmotionLabel::Joy);
    }

    #[test]
    fn emotions_of_empty_is_neutral() {
        let mean = aggregate_emotions(&[]);
        assert_eq!(mean.label(), EmotionLabel::Neutral);
        assert!(mean.confidence().abs() < f64::EPSILON);
    }

    #[test]
    fn classify_each_aborts_on_failure() {
        let mut store = ConversationStore::new();
        store.append(Role::User, "fine").unwrap();
        store.append(Role::Assistant, "ok").unwrap();
        store.append(Role::User, "boom").unwrap();
        store.append(Role::User, "also fine").unwrap();

        let turns = store.user_turns();
        let err = classify_each(&turns, &Flaky).unwrap_err();
        match err {
            Error::ClassifierUnavailable { sequence_index, .. } => assert_eq!(sequence_index, 2),
            other => panic!("Expected ClassifierUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn analyze_aligns_with_user_turns() {
        let mut store = ConversationStore::new();
        store.append(Role::User, "I love this!").unwrap();
        store.append(Role::Assistant, "Glad to hear it").unwrap();
        store.append(Role::User, "This is terrible").unwrap();

        let analysis = analyze(&store, &LexiconClassifier::new(), &AnalysisOptions::default()).unwrap();
        let indices: Vec<usize> = analysis.per_message.iter().map(|m| m.sequence_index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(analysis.distribution.positive, 1);
        assert_eq!(analysis.distribution.negative, 1);
        assert_eq!(analysis.emotions.as_ref().unwrap().per_message.len(), 2);
        assert_eq!(analysis.key_moments.len(), 2);
    }

    #[test]
    fn analyze_empty_conversation() {
        let store = ConversationStore::new();
        let analysis = analyze(&store, &LexiconClassifier::new(), &AnalysisOptions::default()).unwrap();
        assert_eq!(analysis.overall_label, SentimentLabel::Neutral);
        assert!(analysis.overall_confidence.abs() < f64::EPSILON);
        assert_eq!(analysis.trend, Trend::InsufficientData);
        assert!(analysis.key_moments.is_empty());
    }

    #[test]
    fn headline_capitalizes_label() {
        let analysis = ConversationSentiment {
            overall_label: SentimentLabel::Positive,
            overall_confidence: 0.9,
            per_message: Vec::new(),
            trend: Trend::Stable,
            trend_description: "stable".to_string(),
            key_moments: Vec::new(),
            distribution: LabelDistribution::default(),
            emotions: None,
        };
        assert_eq!(
            analysis.headline(),
            "Overall conversation sentiment: Positive - general satisfaction and positive engagement"
        );
    }

    fn arb_result() -> impl Strategy<Value = SentimentResult> {
        (0..3_usize, 0.0..=1.0_f64).prop_map(|(i, c)| r(SentimentLabel::ALL[i], c))
    }

    proptest! {
        #[test]
        fn overall_confidence_in_unit_range(results in proptest::collection::vec(arb_result(), 0..30)) {
            let (_, confidence) = aggregate_overall(&results);
            prop_assert!((0.0..=1.0).contains(&confidence));
        }

        #[test]
        fn key_moments_bounded_by_top_k(results in proptest::collection::vec(arb_result(), 0..30), k in 0..10_usize) {
            let messages: Vec<MessageSentiment> = results
                .into_iter()
                .enumerate()
                .map(|(i, result)| MessageSentiment { sequence_index: i, text: String::new(), result })
                .collect();
            let moments = extract_key_moments(&messages, k);
            prop_assert_eq!(moments.len(), k.min(messages.len()));
            for pair in moments.windows(2) {
                prop_assert!(pair[0].magnitude >= pair[1].magnitude);
            }
        }
    }
}
