use parley_types::summary::SummaryRecord;

/// Render summaries in order, one `===Summary===` block per URL.
pub fn render_summaries(records: &[SummaryRecord]) -> String {
    records
        .iter()
        .map(|r| {
            format!(
                "\n\n===Summary===\n[URL]\n{}\n[Summary]\n{}",
                r.url, r.summary
            )
        })
        .collect()
}
