//! Final report rendering (Telegram HTML subset)

use crate::links::{extract_urls_only, parse_labeled_links};
use std::fmt::Write;

// Approved report wording. Treat as configuration, not prose to tweak.
const PERIOD_PREFIX: &str = "Период";
const PUBLISHED_HEADER: &str = "Ссылки на вышедшие публикации:";
const PLANNED_LABEL: &str = "Планируемый охват:";
const ACTUAL_LABEL: &str = "Фактический охват:";
const MEDIAPLAN_LABEL: &str = "МП:";
const SCREENSHOTS_LABEL: &str = "Скрины:";
const ORGANIC_HEADER: &str = "Также по проекту есть органика. Ссылки на посты, вышедшие органически:";
const ORGANIC_TOTAL_PREFIX: &str = "На данный момент суммарный органический охват:";
const RECENT_POSTS_NOTE: &str =
    "Обращаем внимание, что часть постов вышла совсем недавно. Ожидаем рост показателя.";
const TOTAL_PREFIX: &str = "Итого охват на текущий момент –";
const VIEWS: &str = "просмотров";

const SECTION_BREAK: &str = "\n\n";

/// Everything the renderer needs, borrowed from a draft
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportFields<'a> {
    pub title: &'a str,
    pub period: &'a str,
    /// Raw lines, relabelled by the link parser
    pub paid_links: &'a [String],
    /// Raw lines, reduced to bare urls
    pub organic_links: &'a [String],
    pub planned_reach: u64,
    pub actual_reach: u64,
    pub organic_reach: u64,
    pub mediaplan_url: Option<&'a str>,
    pub screenshots_folder_url: Option<&'a str>,
}

/// Render the report. Sections are separated by blank lines and omitted
/// when they have nothing to show.
pub fn format_report(fields: &ReportFields<'_>) -> String {
    let mut sections: Vec<String> = Vec::new();

    let mut header = format!("<b>{}</b>", escape_html(fields.title.trim()));
    if !fields.period.trim().is_empty() {
        let _ = write!(
            header,
            "\n<i>{PERIOD_PREFIX}: {}</i>",
            escape_html(fields.period.trim())
        );
    }
    sections.push(header);

    let published = parse_labeled_links(fields.paid_links);
    if !published.is_empty() {
        let mut section = format!("<b>{PUBLISHED_HEADER}</b>");
        for link in &published {
            let _ = write!(
                section,
                "\n• <a href=\"{}\">{}</a>",
                escape_html(&link.url),
                escape_html(&link.label)
            );
        }
        sections.push(section);
    }

    let growth = growth_pct(fields.planned_reach, fields.actual_reach);
    sections.push(format!(
        "<b>{PLANNED_LABEL}</b> {}\n<b>{ACTUAL_LABEL}</b> {} (Это на {}% выше планируемого охвата)",
        format_int(fields.planned_reach),
        format_int(fields.actual_reach),
        format_growth(growth)
    ));

    let attachments: Vec<String> = [
        (MEDIAPLAN_LABEL, fields.mediaplan_url),
        (SCREENSHOTS_LABEL, fields.screenshots_folder_url),
    ]
    .into_iter()
    .filter_map(|(label, value)| {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| format!("<b>{label}</b> {}", escape_html(v)))
    })
    .collect();
    if !attachments.is_empty() {
        sections.push(attachments.join("\n"));
    }

    let organic_urls = extract_urls_only(fields.organic_links);
    if !organic_urls.is_empty() || fields.organic_reach > 0 {
        let mut section = String::new();
        if !organic_urls.is_empty() {
            section.push_str(ORGANIC_HEADER);
            for url in &organic_urls {
                let _ = write!(section, "\n• {}", escape_html(url));
            }
            section.push('\n');
        }
        let _ = write!(
            section,
            "{ORGANIC_TOTAL_PREFIX} {} {VIEWS}.\n{RECENT_POSTS_NOTE}",
            format_int(fields.organic_reach)
        );
        sections.push(section);
    }

    let total = fields.actual_reach.saturating_add(fields.organic_reach);
    sections.push(format!("<b>{TOTAL_PREFIX} {} {VIEWS}</b>", format_int(total)));

    sections.join(SECTION_BREAK)
}

/// Growth of actual over planned reach in percent, rounded to one decimal
/// with ties to even. Zero when nothing was planned.
#[allow(clippy::cast_precision_loss)] // reach numbers stay far below 2^52
pub fn growth_pct(planned: u64, actual: u64) -> f64 {
    if planned == 0 {
        return 0.0;
    }
    let raw = (actual as f64 - planned as f64) / planned as f64 * 100.0;
    let rounded = (raw * 10.0).round_ties_even() / 10.0;
    // -0.0 would otherwise render as "-0"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// One decimal place, trailing `.0` dropped: `12.0` → `12`, `12.5` → `12.5`.
pub fn format_growth(pct: f64) -> String {
    let text = format!("{pct:.1}");
    match text.strip_suffix(".0") {
        Some(whole) => whole.to_string(),
        None => text,
    }
}

/// Thousands grouped with spaces: `1233500` → `1 233 500`.
pub fn format_int(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
