//! Ordered reassembly of section texts into one document

use shared::SectionResult;

/// Join section texts with a blank-line separator, in the given order
pub fn aggregate(results: &[SectionResult]) -> String {
    results
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{ResultStatus, SectionKey, SectionSource};

    fn result(source: SectionSource, text: &str) -> SectionResult {
        SectionResult {
            source,
            text: text.to_string(),
            status: ResultStatus::Success,
            attempts: 1,
        }
    }

    #[test]
    fn joins_in_given_order_with_blank_lines() {
        let results = vec![
            result(SectionSource::Canonical(SectionKey::Liver), "Liver text."),
            result(SectionSource::Canonical(SectionKey::Spleen), "Spleen text."),
            result(SectionSource::Dynamic("Thyroid".to_string()), "Thyroid text."),
        ];
        assert_eq!(
            aggregate(&results),
            "Liver text.\n\nSpleen text.\n\nThyroid text."
        );
    }

    #[test]
    fn empty_input_yields_empty_document() {
        assert_eq!(aggregate(&[]), "");
    }

    #[test]
    fn single_result_has_no_separator() {
        let results = vec![result(SectionSource::Canonical(SectionKey::Aorta), "Aorta.")];
        assert_eq!(aggregate(&results), "Aorta.");
    }
}
