//! Telegram HTML formatting for translation replies and the stats report.

use crate::{language::LanguageProfile, orchestrator::TranslationPart, stats::StatsSnapshot};

const ICON_TRANSLATE: &str = "🌐";

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render reply parts in order, separated by a blank line.
pub fn format_reply(parts: &[TranslationPart]) -> String {
    parts
        .iter()
        .map(|p| {
            format!(
                "{ICON_TRANSLATE} <b>{}</b> {}\n{}",
                escape_html(&p.label),
                p.flag,
                escape_html(&p.text)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Plain-text daily report for the `/stats` admin command.
pub fn format_stats_report(
    snapshot: &StatsSnapshot,
    lang_a: &LanguageProfile,
    lang_b: &LanguageProfile,
) -> String {
    let c = &snapshot.counters;
    format!(
        "Translation Bot Statistics · {date}\n\n\
         Total Translations: {total}\n\
         {a} -> {b}: {a_to_b}\n\
         {b} -> {a}: {b_to_a}\n\
         Other Lang -> Dual-Trans: {dual}\n\
         Partial Dual-Trans Success: {partial}\n\
         Translation Failures: {failed}\n\n\
         Current Language Pair: {a_flag} {a} ↔ {b_flag} {b}",
        date = snapshot.date.format("%Y-%m-%d"),
        total = c.total,
        a = lang_a.name,
        b = lang_b.name,
        a_to_b = c.a_to_b,
        b_to_a = c.b_to_a,
        dual = c.other_to_dual,
        partial = c.partial_dual,
        failed = c.failed,
        a_flag = lang_a.flag,
        b_flag = lang_b.flag,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::DailyCounters;
    use chrono::NaiveDate;

    #[test]
    fn reply_parts_are_escaped_and_joined() {
        let parts = vec![
            TranslationPart {
                label: "EN -> Chinese".to_string(),
                flag: "🇨🇳".to_string(),
                text: "a < b".to_string(),
            },
            TranslationPart {
                label: "EN -> Vietnamese".to_string(),
                flag: "🇻🇳".to_string(),
                text: "x & y".to_string(),
            },
        ];
        assert_eq!(
            format_reply(&parts),
            "🌐 <b>EN -&gt; Chinese</b> 🇨🇳\na &lt; b\n\n🌐 <b>EN -&gt; Vietnamese</b> 🇻🇳\nx &amp; y"
        );
    }

    #[test]
    fn report_lists_every_counter() {
        let snap = StatsSnapshot {
            date: NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
            counters: DailyCounters {
                total: 9,
                a_to_b: 4,
                b_to_a: 3,
                other_to_dual: 1,
                partial_dual: 1,
                failed: 2,
            },
        };
        let a = LanguageProfile::new("zh-CN", "Chinese", "🇨🇳");
        let b = LanguageProfile::new("vi", "Vietnamese", "🇻🇳");
        let report = format_stats_report(&snap, &a, &b);

        assert!(report.starts_with("Translation Bot Statistics · 2026-01-02"));
        assert!(report.contains("Total Translations: 9"));
        assert!(report.contains("Chinese -> Vietnamese: 4"));
        assert!(report.contains("Vietnamese -> Chinese: 3"));
        assert!(report.contains("Partial Dual-Trans Success: 1"));
        assert!(report.contains("Translation Failures: 2"));
        assert!(report.ends_with("🇨🇳 Chinese ↔ 🇻🇳 Vietnamese"));
    }
}
