//! placeholder.rs
//!
//! Companion cards for widgets that have no data source yet. They are
//! published next to the language chart so embedding documents can link to
//! stable paths today:
//!     weekly_activity.svg   "Coming soon" banner
//!     wakatime.svg          "Coming soon" banner
//!     monthly_activity.svg  sample weekly hours as bars

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::svg::escape_xml;

pub const WEEKLY_FILE: &str = "weekly_activity.svg";
pub const WAKATIME_FILE: &str = "wakatime.svg";
pub const MONTHLY_FILE: &str = "monthly_activity.svg";

const SAMPLE_WEEKS: [(&str, f64); 4] = [
    ("Week 1", 14.0),
    ("Week 2", 18.5),
    ("Week 3", 10.0),
    ("Week 4", 20.2),
];

const MONTHLY_WIDTH: u32 = 600;
const MONTHLY_HEIGHT: u32 = 220;
const BAR_WIDTH: f64 = 60.0;
const BAR_GAP: f64 = 30.0;
const CHART_LEFT: f64 = 80.0;
const CHART_BOTTOM: f64 = 150.0;
const CHART_HEIGHT: f64 = 90.0;

/// Small "coming soon" banner card.
pub fn coming_soon(title: &str) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="600" height="80">
  <style>
    .title {{ font: bold 16px sans-serif; fill: #e5e9f0; }}
    .subtitle {{ font: 12px sans-serif; fill: #e5e9f0; }}
  </style>
  <rect width="100%" height="100%" fill="#3b4252" rx="8" ry="8" />
  <text x="20" y="30" class="title">{}</text>
  <text x="20" y="55" class="subtitle">Coming soon…</text>
</svg>
"##,
        escape_xml(title)
    )
}

/// Monthly activity card built from sample weekly totals, stamped with
/// `updated_at`.
pub fn monthly_activity(updated_at: DateTime<Utc>) -> String {
    let max_hours = SAMPLE_WEEKS
        .iter()
        .map(|(_, h)| *h)
        .fold(0.0_f64, f64::max);
    let max_hours = if max_hours > 0.0 { max_hours } else { 1.0 };

    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{MONTHLY_WIDTH}" height="{MONTHLY_HEIGHT}">"#
    );
    out.push_str(
        "<style>\
         .title{font:bold 18px sans-serif;fill:#eceff4;}\
         .label{font:12px sans-serif;fill:#e5e9f0;}\
         .hours{font:12px monospace;fill:#eceff4;}\
         </style>\n",
    );
    out.push_str("<rect width=\"100%\" height=\"100%\" fill=\"#2e3440\" rx=\"16\" />\n");
    out.push_str("<text x=\"24\" y=\"32\" class=\"title\">Monthly Activity (placeholder)</text>\n");
    out.push_str(
        "<text x=\"24\" y=\"52\" class=\"label\">\
         Sample weekly totals, real GitHub data integration coming soon.</text>\n",
    );

    for (idx, (week, hours)) in SAMPLE_WEEKS.iter().enumerate() {
        let x = CHART_LEFT + idx as f64 * (BAR_WIDTH + BAR_GAP);
        let bar_height = hours / max_hours * CHART_HEIGHT;
        let y = CHART_BOTTOM - bar_height;
        let mid = x + BAR_WIDTH / 2.0;

        let _ = writeln!(
            out,
            r##"<rect x="{x}" y="{y:.2}" width="{BAR_WIDTH}" height="{bar_height:.2}" rx="6" fill="#a3be8c" />"##
        );
        let _ = writeln!(
            out,
            r#"<text x="{mid}" y="{}" text-anchor="middle" class="label">{week}</text>"#,
            CHART_BOTTOM + 16.0
        );
        let _ = writeln!(
            out,
            r#"<text x="{mid}" y="{:.2}" text-anchor="middle" class="hours">{hours:.1}h</text>"#,
            y - 4.0
        );
    }

    let _ = writeln!(
        out,
        r#"<text x="24" y="{}" class="label">Last updated on {}</text>"#,
        MONTHLY_HEIGHT - 16,
        updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    out.push_str("</svg>\n");
    out
}

/// Every placeholder card as `(file name, contents)`.
pub fn all_cards(updated_at: DateTime<Utc>) -> Vec<(&'static str, String)> {
    vec![
        (WEEKLY_FILE, coming_soon("Weekly Activity")),
        (WAKATIME_FILE, coming_soon("WakaTime")),
        (MONTHLY_FILE, monthly_activity(updated_at)),
    ]
}
