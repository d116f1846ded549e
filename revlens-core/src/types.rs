use serde::{Deserialize, Serialize};

// ── Sentiment labels ───────────────────────────────────────────────

/// Classification outcome for a single review, and the aggregate
/// "overall" field of a product summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "POSITIVE",
            Self::Neutral => "NEUTRAL",
            Self::Negative => "NEGATIVE",
        }
    }

    /// Bucket a free-form label string from a classification model.
    ///
    /// Models emit all kinds of label spellings ("negative", "Very Negative",
    /// "LABEL_NEU", 5-class scales). Matching is case-insensitive by
    /// substring: `NEG` wins over `NEU`, and anything unrecognized falls
    /// into the Positive bucket. The fallback is intentional and load-bearing
    /// for models whose positive class is spelled without "POS".
    pub fn from_model_label(raw: &str) -> Self {
        let upper = raw.to_uppercase();
        if upper.contains("NEG") {
            Self::Negative
        } else if upper.contains("NEU") {
            Self::Neutral
        } else {
            Self::Positive
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Aggregated counts ──────────────────────────────────────────────

/// Per-label review counts for one analysis.
///
/// Rebuilt from scratch on every analysis call — never incrementally
/// updated. The field sum equals the number of non-empty reviews that
/// entered the analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
}

impl SentimentCounts {
    /// Increment the bucket for one classified review.
    pub fn record(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Neutral => self.neutral += 1,
            SentimentLabel::Negative => self.negative += 1,
        }
    }

    pub fn total(self) -> u64 {
        self.positive + self.neutral + self.negative
    }

    /// The label with the highest count.
    ///
    /// Ties resolve to the first maximal bucket in the fixed order
    /// Positive, Negative, Neutral. All-zero counts (cannot happen for a
    /// non-empty review batch) default to Neutral.
    pub fn overall(self) -> SentimentLabel {
        if self.total() == 0 {
            return SentimentLabel::Neutral;
        }
        let ordered = [
            (SentimentLabel::Positive, self.positive),
            (SentimentLabel::Negative, self.negative),
            (SentimentLabel::Neutral, self.neutral),
        ];
        let max = ordered.iter().map(|&(_, n)| n).max().unwrap_or(0);
        ordered
            .iter()
            .find(|&&(_, n)| n == max)
            .map_or(SentimentLabel::Neutral, |&(label, _)| label)
    }
}

// ── Products ───────────────────────────────────────────────────────

/// The persisted unit: one product with its latest sentiment summary.
///
/// Identity is `id` alone; `name` and `image` are descriptive. Re-analyzing
/// a product replaces the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Optional image URL; empty string when the client omitted it.
    #[serde(default)]
    pub image: String,
    pub sentiment: SentimentLabel,
    pub counts: SentimentCounts,
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_serde_forms_are_uppercase() {
        let json = serde_json::to_string(&SentimentLabel::Negative).unwrap();
        assert_eq!(json, "\"NEGATIVE\"");
        let back: SentimentLabel = serde_json::from_str("\"POSITIVE\"").unwrap();
        assert_eq!(back, SentimentLabel::Positive);
    }

    #[test]
    fn model_label_bucketing() {
        assert_eq!(
            SentimentLabel::from_model_label("Very Negative"),
            SentimentLabel::Negative
        );
        assert_eq!(
            SentimentLabel::from_model_label("neutral"),
            SentimentLabel::Neutral
        );
        assert_eq!(
            SentimentLabel::from_model_label("positive"),
            SentimentLabel::Positive
        );
        // NEG takes precedence over NEU if both somehow appear
        assert_eq!(
            SentimentLabel::from_model_label("neg-neutral"),
            SentimentLabel::Negative
        );
        // Unrecognized labels fall into the positive bucket
        assert_eq!(
            SentimentLabel::from_model_label("LABEL_3"),
            SentimentLabel::Positive
        );
    }

    #[test]
    fn overall_picks_strict_maximum() {
        let counts = SentimentCounts {
            positive: 1,
            neutral: 4,
            negative: 2,
        };
        assert_eq!(counts.overall(), SentimentLabel::Neutral);
    }

    #[test]
    fn overall_tie_break_order() {
        // Three-way tie: Positive wins
        let tie = SentimentCounts {
            positive: 2,
            neutral: 2,
            negative: 2,
        };
        assert_eq!(tie.overall(), SentimentLabel::Positive);

        // Negative/Neutral tie: Negative wins
        let tie = SentimentCounts {
            positive: 0,
            neutral: 3,
            negative: 3,
        };
        assert_eq!(tie.overall(), SentimentLabel::Negative);
    }

    #[test]
    fn overall_all_zero_defaults_neutral() {
        assert_eq!(SentimentCounts::default().overall(), SentimentLabel::Neutral);
    }

    #[test]
    fn product_round_trips_with_lowercase_count_keys() {
        let product = Product {
            id: "42".into(),
            name: "Widget".into(),
            image: String::new(),
            sentiment: SentimentLabel::Positive,
            counts: SentimentCounts {
                positive: 1,
                neutral: 1,
                negative: 1,
            },
        };
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["sentiment"], "POSITIVE");
        assert_eq!(json["counts"]["positive"], 1);

        let back: Product = serde_json::from_value(json).unwrap();
        assert_eq!(back, product);
    }

    #[test]
    fn product_image_defaults_empty() {
        let json = r#"{"id":"1","name":"Gadget","sentiment":"NEUTRAL","counts":{"positive":0,"neutral":1,"negative":0}}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.image, "");
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        fn any_label() -> impl Strategy<Value = SentimentLabel> {
            prop_oneof![
                Just(SentimentLabel::Positive),
                Just(SentimentLabel::Neutral),
                Just(SentimentLabel::Negative),
            ]
        }

        proptest! {
            #[test]
            fn total_equals_recorded_labels(labels in proptest::collection::vec(any_label(), 0..64)) {
                let mut counts = SentimentCounts::default();
                for &label in &labels {
                    counts.record(label);
                }
                prop_assert_eq!(counts.total(), labels.len() as u64);
            }

            #[test]
            fn overall_is_always_a_maximal_bucket(labels in proptest::collection::vec(any_label(), 1..64)) {
                let mut counts = SentimentCounts::default();
                for &label in &labels {
                    counts.record(label);
                }
                let max = counts.positive.max(counts.neutral).max(counts.negative);
                let winner_count = match counts.overall() {
                    SentimentLabel::Positive => counts.positive,
                    SentimentLabel::Neutral => counts.neutral,
                    SentimentLabel::Negative => counts.negative,
                };
                prop_assert_eq!(winner_count, max);
            }
        }
    }
}
