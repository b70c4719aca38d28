use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt::Write as _;
use std::str::FromStr;

use crate::languages::{LanguageTotals, Share};

const CARD_WIDTH: u32 = 500;
const DONUT_HEIGHT: u32 = 260;
const FONT: &str = "Segoe UI, system-ui";
const TITLE: &str = "Top Languages by Repo";

const DONUT_CX: f64 = 330.0;
const DONUT_CY: f64 = 145.0;
const R_OUTER: f64 = 80.0;
const R_INNER: f64 = 45.0;

const LEGEND_X: u32 = 40;
const LEGEND_Y_START: u32 = 70;
const LEGEND_LINE_HEIGHT: u32 = 22;
const LEGEND_BOTTOM_PADDING: u32 = 20;

const BAR_LABEL_X: u32 = 32;
const BAR_X: f64 = 150.0;
const BAR_MAX_WIDTH: f64 = 260.0;
const BAR_HEIGHT: u32 = 14;
const BAR_ROW_HEIGHT: u32 = 28;
const BAR_Y_START: u32 = 64;
const BAR_BOTTOM_PADDING: u32 = 20;

/// GitHub linguist colors for common languages.
const LANG_COLORS: &[(&str, &str)] = &[
    ("Python", "#3572A5"),
    ("Shell", "#89e051"),
    ("HTML", "#e34c26"),
    ("Dockerfile", "#384d54"),
    ("Makefile", "#427819"),
    ("Rust", "#dea584"),
    ("Go", "#00ADD8"),
    ("JavaScript", "#f1e05a"),
    ("TypeScript", "#3178c6"),
    ("C", "#555555"),
    ("C++", "#f34b7d"),
    ("Java", "#b07219"),
];

const DEFAULT_COLORS: &[&str] = &[
    "#4C78A8", "#F58518", "#E45756", "#72B7B2", "#54A24B", "#EECA3B", "#B279A2",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

pub struct ThemeColors {
    pub bg: &'static str,
    pub text: &'static str,
    pub muted: &'static str,
}

impl Theme {
    pub fn colors(self) -> ThemeColors {
        match self {
            Theme::Dark => ThemeColors {
                bg: "#0d1117",
                text: "#c9d1d9",
                muted: "#30363d",
            },
            Theme::Light => ThemeColors {
                bg: "#ffffff",
                text: "#24292f",
                muted: "#d0d7de",
            },
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("unknown theme '{other}' (expected dark or light)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    #[default]
    Donut,
    Bar,
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "donut" => Ok(Layout::Donut),
            "bar" => Ok(Layout::Bar),
            other => Err(format!("unknown layout '{other}' (expected donut or bar)")),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChartOptions {
    pub layout: Layout,
    pub theme: Theme,
    pub top_n: usize,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            layout: Layout::Donut,
            theme: Theme::Dark,
            top_n: 5,
        }
    }
}

// Utilities for building SVG content

pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn pick_color(lang: &str, index: usize) -> &'static str {
    LANG_COLORS
        .iter()
        .find(|(name, _)| *name == lang)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_COLORS[index % DEFAULT_COLORS.len()])
}

fn percent_label(share: &Share) -> String {
    format!("{} ({:.1}%)", escape_xml(&share.language), share.fraction * 100.0)
}

/// Path for one donut slice between two angles (radians, clockwise from +x).
fn arc_path(start: f64, end: f64) -> String {
    let (x0, y0) = polar(R_OUTER, start);
    let (x1, y1) = polar(R_OUTER, end);
    let (x2, y2) = polar(R_INNER, end);
    let (x3, y3) = polar(R_INNER, start);
    let large_arc = if end - start > PI { 1 } else { 0 };

    format!(
        "M {x0:.2} {y0:.2} \
         A {R_OUTER:.2} {R_OUTER:.2} 0 {large_arc} 1 {x1:.2} {y1:.2} \
         L {x2:.2} {y2:.2} \
         A {R_INNER:.2} {R_INNER:.2} 0 {large_arc} 0 {x3:.2} {y3:.2} Z"
    )
}

/// A complete ring; an arc cannot start and end on the same point.
fn ring_path() -> String {
    let top = DONUT_CY - R_OUTER;
    let top_inner = DONUT_CY - R_INNER;
    format!(
        "M {cx:.2} {top:.2} \
         A {R_OUTER:.2} {R_OUTER:.2} 0 1 1 {cx:.2} {bottom:.2} \
         A {R_OUTER:.2} {R_OUTER:.2} 0 1 1 {cx:.2} {top:.2} Z \
         M {cx:.2} {top_inner:.2} \
         A {R_INNER:.2} {R_INNER:.2} 0 1 0 {cx:.2} {bottom_inner:.2} \
         A {R_INNER:.2} {R_INNER:.2} 0 1 0 {cx:.2} {top_inner:.2} Z",
        cx = DONUT_CX,
        bottom = DONUT_CY + R_OUTER,
        bottom_inner = DONUT_CY + R_INNER,
    )
}

fn polar(r: f64, angle: f64) -> (f64, f64) {
    (DONUT_CX + r * angle.cos(), DONUT_CY + r * angle.sin())
}

fn open_card(out: &mut String, width: u32, height: u32, colors: &ThemeColors, desc: &str) {
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" role="img" aria-labelledby="title desc">
<title id="title">{TITLE}</title>
<desc id="desc">{desc}</desc>
<rect width="100%" height="100%" fill="{bg}" rx="8" />
<text x="32" y="40" fill="{text}" font-size="20" font-family="{FONT}">{TITLE}</text>
"#,
        bg = colors.bg,
        text = colors.text,
    );
}

fn render_empty(colors: &ThemeColors) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{CARD_WIDTH}" height="{DONUT_HEIGHT}">
  <rect width="100%" height="100%" fill="{bg}"/>
  <text x="50%" y="50%" text-anchor="middle" fill="{text}"
        font-size="16" font-family="{FONT}">
    No language data
  </text>
</svg>
"#,
        bg = colors.bg,
        text = colors.text,
    )
}

/// The donut card grows downwards once the legend outruns it.
fn donut_height(rows: usize) -> u32 {
    let legend = LEGEND_Y_START + rows as u32 * LEGEND_LINE_HEIGHT + LEGEND_BOTTOM_PADDING;
    legend.max(DONUT_HEIGHT)
}

fn render_donut(shares: &[Share], colors: &ThemeColors) -> String {
    let mut out = String::new();
    open_card(
        &mut out,
        CARD_WIDTH,
        donut_height(shares.len()),
        colors,
        "Donut chart of top programming languages.",
    );

    // Legend on the left
    for (idx, share) in shares.iter().enumerate() {
        let color = pick_color(&share.language, idx);
        let y = LEGEND_Y_START + idx as u32 * LEGEND_LINE_HEIGHT;
        let _ = writeln!(
            out,
            r#"<rect x="{LEGEND_X}" y="{}" width="14" height="14" fill="{color}" rx="2" />"#,
            y - 12
        );
        let _ = writeln!(
            out,
            r#"<text x="{}" y="{y}" fill="{}" font-size="13" font-family="{FONT}">{}</text>"#,
            LEGEND_X + 22,
            colors.text,
            percent_label(share)
        );
    }

    // Slices, clockwise from 12 o'clock
    if let [only] = shares {
        let _ = writeln!(
            out,
            r#"<path d="{}" fill="{}" fill-rule="evenodd" stroke="{}" stroke-width="1"/>"#,
            ring_path(),
            pick_color(&only.language, 0),
            colors.bg
        );
    } else {
        let mut angle = -FRAC_PI_2;
        for (idx, share) in shares.iter().enumerate() {
            let end = angle + share.fraction * 2.0 * PI;
            let _ = writeln!(
                out,
                r#"<path d="{}" fill="{}" stroke="{}" stroke-width="1"/>"#,
                arc_path(angle, end),
                pick_color(&share.language, idx),
                colors.bg
            );
            angle = end;
        }
    }

    let _ = writeln!(
        out,
        r#"<text x="{DONUT_CX}" y="{}" text-anchor="middle" fill="{}" font-size="12" font-family="{FONT}">Lang Stats</text>"#,
        DONUT_CY + 5.0,
        colors.text
    );
    out.push_str("</svg>\n");
    out
}

fn render_bar(shares: &[Share], colors: &ThemeColors) -> String {
    let height = BAR_Y_START + shares.len() as u32 * BAR_ROW_HEIGHT + BAR_BOTTOM_PADDING;

    let mut out = String::new();
    open_card(
        &mut out,
        CARD_WIDTH,
        height,
        colors,
        "Bar chart of top programming languages.",
    );

    for (idx, share) in shares.iter().enumerate() {
        let y = BAR_Y_START + idx as u32 * BAR_ROW_HEIGHT;
        let width = share.fraction * BAR_MAX_WIDTH;
        let _ = writeln!(
            out,
            r#"<text x="{BAR_LABEL_X}" y="{}" fill="{}" font-size="13" font-family="{FONT}">{}</text>"#,
            y + BAR_HEIGHT - 2,
            colors.text,
            escape_xml(&share.language)
        );
        let _ = writeln!(
            out,
            r#"<rect x="{BAR_X}" y="{y}" width="{BAR_MAX_WIDTH:.2}" height="{BAR_HEIGHT}" fill="{}" rx="3" />"#,
            colors.muted
        );
        let _ = writeln!(
            out,
            r#"<rect class="bar" x="{BAR_X}" y="{y}" width="{width:.2}" height="{BAR_HEIGHT}" fill="{}" rx="3" />"#,
            pick_color(&share.language, idx)
        );
        let _ = writeln!(
            out,
            r#"<text x="{:.2}" y="{}" fill="{}" font-size="12" font-family="{FONT}">{:.1}%</text>"#,
            BAR_X + BAR_MAX_WIDTH + 8.0,
            y + BAR_HEIGHT - 2,
            colors.text,
            share.fraction * 100.0
        );
    }

    out.push_str("</svg>\n");
    out
}

/// Main SVG generation function
pub fn generate_svg(totals: &LanguageTotals, opts: ChartOptions) -> String {
    let colors = opts.theme.colors();
    let shares = totals.ranked(opts.top_n.max(1));

    if shares.is_empty() {
        return render_empty(&colors);
    }

    match opts.layout {
        Layout::Donut => render_donut(&shares, &colors),
        Layout::Bar => render_bar(&shares, &colors),
    }
}
