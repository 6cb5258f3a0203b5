//! Plain-text rendering of analysis results.

use crate::core::aggregator::ConversationSentiment;
use crate::core::alerts::Alert;
use crate::core::sentiment::SentimentLabel;
use std::fmt::Write as _;

/// Width of the mood bar on each side of the axis.
const BAR_WIDTH: usize = 10;

/// Maximum characters of message text shown per line.
const PREVIEW_LEN: usize = 60;

/// Render a full analysis report.
#[must_use]
pub fn render(analysis: &ConversationSentiment) -> String {
    let mut out = String::new();
    let overall = analysis.overall();

    // Writing to a String cannot fail
    let _ = writeln!(out, "{}", analysis.headline());
    let _ = writeln!(
        out,
        "Score: {}/100  Confidence: {:.1}%  Trend: {}",
        overall.score(),
        analysis.overall_confidence * 100.0,
        analysis.trend_description
    );

    if analysis.per_message.is_empty() {
        let _ = writeln!(out, "\nNo user messages to analyze.");
        return out;
    }

    let d = analysis.distribution;
    let _ = writeln!(
        out,
        "Distribution: {} positive, {} neutral, {} negative",
        d.positive, d.neutral, d.negative
    );

    let _ = writeln!(out, "\nMood by message:");
    for m in &analysis.per_message {
        let _ = writeln!(
            out,
            "  #{:<3} {} {:>3} {}",
            m.sequence_index + 1,
            mood_bar(m.result.weighted_value()),
            m.result.score(),
            preview(&m.text)
        );
    }

    if let Some(emotions) = &analysis.emotions {
        let _ = writeln!(
            out,
            "\nDominant emotion: {} ({:.1}%)",
            emotions.label,
            emotions.confidence * 100.0
        );
        let mut ranked: Vec<_> = emotions.mean.iter().filter(|(_, p)| *p > 0.0).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        for (label, p) in ranked {
            let _ = writeln!(out, "  {:<9} {:>5.1}%", label.as_str(), p * 100.0);
        }
    }

    if !analysis.key_moments.is_empty() {
        let _ = writeln!(out, "\nKey moments:");
        for moment in &analysis.key_moments {
            let _ = writeln!(
                out,
                "  #{:<3} [{} {:.0}%] {}",
                moment.sequence_index + 1,
                badge(moment.label),
                moment.confidence * 100.0,
                preview(&moment.text)
            );
        }
    }

    out
}

/// One-line alert notice.
#[must_use]
pub fn render_alert(alert: &Alert) -> String {
    format!(
        "! {} mood alert: score {:.0} is below {:.0}",
        alert.severity, alert.score, alert.threshold
    )
}

fn badge(label: SentimentLabel) -> &'static str {
    match label {
        SentimentLabel::Positive => "+ positive",
        SentimentLabel::Neutral => "= neutral",
        SentimentLabel::Negative => "- negative",
    }
}

/// Horizontal bar centred on `|`: negative values grow left, positive right.
fn mood_bar(value: f64) -> String {
    // Value is clamped to [-1, 1], so the product fits in BAR_WIDTH
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled = (value.abs().min(1.0) * BAR_WIDTH as f64).round() as usize;
    let (left, right) = if value < 0.0 {
        (
            format!("{}{}", " ".repeat(BAR_WIDTH - filled), "#".repeat(filled)),
            " ".repeat(BAR_WIDTH),
        )
    } else {
        (
            " ".repeat(BAR_WIDTH),
            format!("{}{}", "#".repeat(filled), " ".repeat(BAR_WIDTH - filled)),
        )
    };
    format!("{left}|{right}")
}

fn preview(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or(text);
    if first_line.chars().count() > PREVIEW_LEN {
        let cut: String = first_line.chars().take(PREVIEW_LEN).collect();
        format!("{cut}...")
    } else {
        first_line.to_string()
    }
}
