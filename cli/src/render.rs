//! Terminal rendering of search results and index reports.

use clause_radar::{IndexReport, IndexStats, MatchResult};

/// Characters of snippet shown in the results table.
pub const PREVIEW_CHARS: usize = 80;

const HEADERS: [&str; 5] = ["Rank", "Contract", "Section", "Score", "Snippet"];

/// Similarity as a percentage with one decimal (`0.9274` → `92.7 %`).
pub fn format_score(score: f32) -> String {
    format!("{:.1} %", score * 100.0)
}

/// Single-line snippet preview, cut at [`PREVIEW_CHARS`] with an ellipsis.
pub fn preview(snippet: &str) -> String {
    let flat = snippet.replace(['\r', '\n'], " ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
    format!("{}…", cut.trim_end())
}

/// Ranked results as an aligned plain-text table.
pub fn results_table(results: &[MatchResult]) -> String {
    let rows: Vec<[String; 5]> = results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            [
                (i + 1).to_string(),
                result.contract_id.clone(),
                result.keyword.clone(),
                format_score(result.score),
                preview(&result.snippet),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS.map(String::from), &widths);
    push_row(&mut out, &widths.map(|w| "-".repeat(w)), &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Summary printed after an indexing run.
pub fn index_summary(report: &IndexReport) -> String {
    let mut out = format!(
        "Indexed {} contract(s) against {} keyword(s).\n",
        report.documents, report.keywords
    );
    out.push_str(&format!(
        "Wrote {} record(s) in {} batch(es); {} pair(s) without a match.\n",
        report.records(),
        report.batches,
        report.misses
    ));
    for skipped in &report.skipped {
        out.push_str(&format!("Skipped {}: {}\n", skipped.document_id, skipped.reason));
    }
    out
}

/// Vector counts for the `stats` command.
pub fn stats_summary(index: &str, stats: &IndexStats) -> String {
    let mut out = format!("Index {index}: {} vector(s)", stats.total_vector_count);
    if let Some(dimension) = stats.dimension {
        out.push_str(&format!(", dimension {dimension}"));
    }
    out.push('\n');
    for (namespace, count) in &stats.namespaces {
        let name = if namespace.is_empty() {
            "(default)"
        } else {
            namespace.as_str()
        };
        out.push_str(&format!("  {name}: {count}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clause_radar::SkippedDocument;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn result(contract_id: &str, keyword: &str, score: f32, snippet: &str) -> MatchResult {
        MatchResult {
            contract_id: contract_id.to_string(),
            keyword: keyword.to_string(),
            score,
            snippet: snippet.to_string(),
        }
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(0.9274), "92.7 %");
        assert_eq!(format_score(1.0), "100.0 %");
        assert_eq!(format_score(0.0), "0.0 %");
    }

    #[test]
    fn test_preview_flattens_newlines() {
        assert_eq!(preview("Effective Date:\nJan 1, 2024"), "Effective Date: Jan 1, 2024");
    }

    #[test]
    fn test_preview_truncates_long_snippets() {
        let snippet = format!("{} tail", "word ".repeat(30));
        let shown = preview(&snippet);
        assert!(shown.ends_with('…'));
        assert!(shown.chars().count() <= PREVIEW_CHARS + 1);
        assert!(!shown.contains("tail"));
        assert_eq!(preview(&"x".repeat(80)), "x".repeat(80));
    }

    #[test]
    fn test_results_table() {
        let table = results_table(&[
            result("NDA1", "Effective Date", 0.93, "Effective Date: Jan 1, 2024"),
            result("Lease7", "Termination", 0.5, "TERMINATION.\nThe landlord may end"),
        ]);

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Rank  Contract  Section"));
        assert!(lines[2].starts_with("1     NDA1      Effective Date  93.0 %"));
        assert!(lines[3].contains("TERMINATION. The landlord may end"));
    }

    #[test]
    fn test_index_summary() {
        let report = IndexReport {
            documents: 1,
            keywords: 2,
            record_ids: vec!["NDA1::Effective Date".to_string()],
            misses: 1,
            batches: 1,
            skipped: vec![SkippedDocument {
                document_id: "scan".to_string(),
                reason: "no text layer".to_string(),
            }],
        };

        assert_eq!(
            index_summary(&report),
            "Indexed 1 contract(s) against 2 keyword(s).\n\
             Wrote 1 record(s) in 1 batch(es); 1 pair(s) without a match.\n\
             Skipped scan: no text layer\n"
        );
    }

    #[test]
    fn test_stats_summary() {
        let stats = IndexStats {
            total_vector_count: 3,
            dimension: Some(768),
            namespaces: BTreeMap::from([(String::new(), 3)]),
        };
        assert_eq!(
            stats_summary("contracts", &stats),
            "Index contracts: 3 vector(s), dimension 768\n  (default): 3\n"
        );
    }
}
