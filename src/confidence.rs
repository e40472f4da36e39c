use crate::annotate::{Annotation, EntityLabel};
use crate::extract::{matched_priority_keywords, total_priority_keywords};

const LENGTH_WEIGHT: f64 = 0.2;
const ENTITY_WEIGHT: f64 = 0.3;
const KEYWORD_WEIGHT: f64 = 0.3;
const STRUCTURE_WEIGHT: f64 = 0.2;

/// Raw evidence counts feeding [`score`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    /// Input length in characters.
    pub text_chars: usize,
    /// DATE, TIME, PERSON and ORG entities.
    pub entity_count: usize,
    pub matched_keywords: usize,
    pub total_keywords: usize,
    pub verb_count: usize,
}

impl Signals {
    /// Collects signals from text and, when available, its annotation.
    /// Without an annotation the entity and verb counts are zero.
    pub fn collect(text: &str, annotation: Option<&Annotation>) -> Self {
        let (entity_count, verb_count) = annotation
            .map(|a| {
                let entities = a
                    .entities
                    .iter()
                    .filter(|e| {
                        matches!(e.label, EntityLabel::Date | EntityLabel::Time | EntityLabel::Person | EntityLabel::Org)
                    })
                    .count();
                (entities, a.verb_count())
            })
            .unwrap_or_default();

        Self {
            text_chars: text.chars().count(),
            entity_count,
            matched_keywords: matched_priority_keywords(text),
            total_keywords: total_priority_keywords(),
            verb_count,
        }
    }
}

/// Fixed linear model over the four signals.
///
/// # Returns
/// The weighted sum of
/// - length: `min(chars / 50, 1) * 0.2`
/// - entities: `min(entities / 3, 1) * 0.3`
/// - keywords: `matched / total * 0.3`
/// - structure: `min(verbs / 2, 1) * 0.2`
///
/// clamped to `[0, 1]`.
pub fn score(signals: &Signals) -> f64 {
    let length = (signals.text_chars as f64 / 50.0).min(1.0) * LENGTH_WEIGHT;
    let entities = (signals.entity_count as f64 / 3.0).min(1.0) * ENTITY_WEIGHT;
    let keywords = signals.matched_keywords as f64 / signals.total_keywords.max(1) as f64 * KEYWORD_WEIGHT;
    let structure = (signals.verb_count as f64 / 2.0).min(1.0) * STRUCTURE_WEIGHT;

    (length + entities + keywords + structure).clamp(0.0, 1.0)
}

/// Confidence of a parse of `text`.
pub fn compute_confidence(text: &str, annotation: Option<&Annotation>) -> f64 {
    score(&Signals::collect(text, annotation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::{Entity, PosTag, Token};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_components_cap_at_their_weights() {
        let signals = Signals {
            text_chars: 500,
            entity_count: 10,
            matched_keywords: 16,
            total_keywords: 16,
            verb_count: 9,
        };
        assert!(close(score(&signals), 1.0));
    }

    #[test]
    fn test_partial_signals() {
        let signals = Signals {
            text_chars: 25,
            entity_count: 1,
            matched_keywords: 1,
            total_keywords: 16,
            verb_count: 1,
        };
        // 0.1 + 0.1 + 0.01875 + 0.1
        assert!(close(score(&signals), 0.31875));
    }

    #[test]
    fn test_without_annotation_only_text_counts() {
        // 28 chars, one keyword
        let confidence = compute_confidence("urgent: call client tomorrow", None);
        assert!(close(confidence, 28.0 / 50.0 * 0.2 + 0.3 / 16.0));
    }

    #[test]
    fn test_only_listed_entity_labels_count() {
        let annotation = Annotation {
            entities: vec![
                Entity { text: "tomorrow".into(), label: EntityLabel::Date },
                Entity { text: "Acme".into(), label: EntityLabel::Org },
                Entity { text: "thing".into(), label: EntityLabel::Other },
            ],
            tokens: vec![Token { text: "call".into(), pos: PosTag::Verb }],
        };
        let signals = Signals::collect("call Acme tomorrow", Some(&annotation));
        assert_eq!(signals.entity_count, 2);
        assert_eq!(signals.verb_count, 1);
    }

    #[test]
    fn test_empty_text_scores_zero() {
        assert_eq!(compute_confidence("", None), 0.0);
    }
}
