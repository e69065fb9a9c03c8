//! Report data as the slide builders see it.
//!
//! Everything here is already normalized: the JSON walking and best-effort
//! defaulting happens in `io::ingest`, so these types never fail to display.

use serde::Serialize;
use serde_json::{Number, Value};

/// Display value used whenever a field is absent or unusable.
pub const PLACEHOLDER: &str = "N/A";

/// A scalar report field as it arrived in the payload.
///
/// Values are shown verbatim; only dates and money get light reformatting
/// (see `report::format`).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    Text(String),
    Number(Number),
    #[default]
    Missing,
}

impl FieldValue {
    /// Interpret an optional JSON value. Blank strings, nulls, arrays and
    /// objects all collapse to `Missing`.
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) if !s.trim().is_empty() => FieldValue::Text(s.clone()),
            Some(Value::Number(n)) => FieldValue::Number(n.clone()),
            Some(Value::Bool(b)) => FieldValue::Text(b.to_string()),
            _ => FieldValue::Missing,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    /// The raw text of the value, if any.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Number(n) => Some(n.to_string()),
            FieldValue::Missing => None,
        }
    }

    /// Verbatim display text, or [`PLACEHOLDER`].
    pub fn display(&self) -> String {
        self.as_text().unwrap_or_else(|| PLACEHOLDER.to_string())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(Number::from(value))
    }
}

/// Media category under which coverage is aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Television,
    Radio,
    Press,
    Digital,
}

impl Channel {
    /// Channels in slide order.
    pub const ALL: [Channel; 4] = [
        Channel::Television,
        Channel::Radio,
        Channel::Press,
        Channel::Digital,
    ];

    /// Report key holding this channel's sub-object.
    pub fn key(self) -> &'static str {
        match self {
            Channel::Television => "TV_raw",
            Channel::Radio => "Radio_raw",
            Channel::Press => "Prensa_raw",
            Channel::Digital => "Medios Digitales_raw",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Channel::Television => "Television",
            Channel::Radio => "Radio",
            Channel::Press => "Press",
            Channel::Digital => "Digital Media",
        }
    }
}

/// One monitored news item.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Story {
    pub date: FieldValue,
    pub title: FieldValue,
    /// Long-form headline, shown as a secondary line.
    pub headline: Option<String>,
    pub link: Option<String>,
}

/// Aggregates and stories for a single channel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelData {
    pub story_count: FieldValue,
    pub audience: FieldValue,
    pub vpe: FieldValue,
    pub vc: FieldValue,
    pub stories: Vec<Story>,
}

/// The global report: period, totals, and per-channel coverage.
///
/// `channels` only holds channels with backing data, in [`Channel::ALL`] order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Report {
    pub start_date: FieldValue,
    pub end_date: FieldValue,
    pub total_stories: FieldValue,
    pub total_audience: FieldValue,
    pub total_vpe: FieldValue,
    pub total_vc: FieldValue,
    pub channels: Vec<(Channel, ChannelData)>,
}

impl Report {
    pub fn channel(&self, channel: Channel) -> Option<&ChannelData> {
        self.channels
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, data)| data)
    }
}

/// Known chart renderings, used only to title chart slides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Top10Television,
    Top10Radio,
    Top10Press,
    Top10Digital,
    VpeBar,
    VcBar,
    AudienceBar,
    StoriesBar,
    Bar,
    Pie,
    Other,
}

impl ChartKind {
    /// Classification priority; the first kind with a matching pattern wins.
    pub const PRIORITY: [ChartKind; 10] = [
        ChartKind::Top10Television,
        ChartKind::Top10Radio,
        ChartKind::Top10Press,
        ChartKind::Top10Digital,
        ChartKind::VpeBar,
        ChartKind::VcBar,
        ChartKind::AudienceBar,
        ChartKind::StoriesBar,
        ChartKind::Bar,
        ChartKind::Pie,
    ];

    /// Substrings matched against the normalized URL (see [`normalize_chart_url`]).
    pub fn patterns(self) -> &'static [&'static str] {
        match self {
            ChartKind::Top10Television => &["top10_tv", "top10_television", "top10_por_medio_tv"],
            ChartKind::Top10Radio => &["top10_radio", "top10_por_medio_radio"],
            ChartKind::Top10Press => &["top10_prensa", "top10_press", "top10_por_medio_prensa"],
            ChartKind::Top10Digital => &[
                "top10_medios_digitales",
                "top10_digital",
                "top10_por_medio_digital",
            ],
            ChartKind::VpeBar => &["vpe_barra", "vpe_bar"],
            ChartKind::VcBar => &["vc_barra", "vc_bar"],
            ChartKind::AudienceBar => &["audiencia_barra", "audience_bar"],
            ChartKind::StoriesBar => &["noticias_barra", "stories_bar"],
            ChartKind::Bar => &["barra", "_bar_", "_bar"],
            ChartKind::Pie => &["torta", "pastel", "_pie"],
            ChartKind::Other => &[],
        }
    }

    /// Fixed slide title, `None` for unrecognized charts.
    pub fn label(self) -> Option<&'static str> {
        match self {
            ChartKind::Top10Television => Some("Top 10 by Channel: Television"),
            ChartKind::Top10Radio => Some("Top 10 by Channel: Radio"),
            ChartKind::Top10Press => Some("Top 10 by Channel: Press"),
            ChartKind::Top10Digital => Some("Top 10 by Channel: Digital Media"),
            ChartKind::VpeBar => Some("VPE by Channel"),
            ChartKind::VcBar => Some("VC by Channel"),
            ChartKind::AudienceBar => Some("Audience by Channel"),
            ChartKind::StoriesBar => Some("Stories by Channel"),
            ChartKind::Bar => Some("Bar Chart"),
            ChartKind::Pie => Some("Distribution by Channel"),
            ChartKind::Other => None,
        }
    }

    pub fn classify(url: &str) -> ChartKind {
        let normalized = normalize_chart_url(url);
        ChartKind::PRIORITY
            .into_iter()
            .find(|kind| kind.patterns().iter().any(|p| normalized.contains(p)))
            .unwrap_or(ChartKind::Other)
    }
}

/// Lowercase the URL and fold separators to `_` so `Top-10 Prensa.png`,
/// `top_10_prensa.png` and `top10_prensa.png` all look alike.
pub fn normalize_chart_url(url: &str) -> String {
    let lowered = url.to_lowercase().replace("%20", "_");
    let folded: String = lowered
        .chars()
        .map(|c| match c {
            '-' | ' ' | '/' | '.' | '?' | '=' | '&' | '+' => '_',
            other => other,
        })
        .collect();
    folded.replace("top_10", "top10")
}

/// A chart image to embed on its own slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartReference {
    pub url: String,
    pub kind: ChartKind,
}

impl ChartReference {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let kind = ChartKind::classify(&url);
        Self { url, kind }
    }

    /// Slide title: the kind's label, else a name derived from the URL.
    pub fn title(&self) -> String {
        match self.kind.label() {
            Some(label) => label.to_string(),
            None => derive_chart_title(&self.url).unwrap_or_else(|| "Chart".to_string()),
        }
    }
}

fn derive_chart_title(raw: &str) -> Option<String> {
    let segment = match url::Url::parse(raw) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()).map(str::to_string)),
        Err(_) => raw.rsplit('/').find(|s| !s.is_empty()).map(str::to_string),
    }?;

    let stem = segment.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(&segment);
    let words: Vec<&str> = stem
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_value_defaults_to_placeholder() {
        assert_eq!(FieldValue::from_json(None).display(), PLACEHOLDER);
        assert_eq!(FieldValue::from_json(Some(&json!(null))).display(), PLACEHOLDER);
        assert_eq!(FieldValue::from_json(Some(&json!("  "))).display(), PLACEHOLDER);
        assert_eq!(FieldValue::from_json(Some(&json!({"a": 1}))).display(), PLACEHOLDER);
        assert_eq!(FieldValue::from_json(Some(&json!(5000))).display(), "5000");
        assert_eq!(FieldValue::from_json(Some(&json!("1000"))).display(), "1000");
        assert_eq!(FieldValue::from_json(Some(&json!(12.5))).display(), "12.5");
    }

    #[test]
    fn classifies_press_top10_and_vpe_bar() {
        assert_eq!(
            ChartKind::classify("https://cdn.example.com/charts/top10_prensa.png"),
            ChartKind::Top10Press
        );
        assert_eq!(
            ChartKind::classify("https://cdn.example.com/charts/Top-10-Prensa.png"),
            ChartKind::Top10Press
        );
        assert_eq!(
            ChartKind::classify("https://cdn.example.com/vpe_barra_2024.png"),
            ChartKind::VpeBar
        );
    }

    #[test]
    fn classification_prefers_specific_kinds() {
        // "vpe_barra" also contains the generic "barra" pattern.
        assert_eq!(ChartKind::classify("http://x/vpe_barra.png"), ChartKind::VpeBar);
        assert_eq!(ChartKind::classify("http://x/otra_barra.png"), ChartKind::Bar);
        assert_eq!(ChartKind::classify("http://x/torta.png"), ChartKind::Pie);
    }

    #[test]
    fn unknown_chart_gets_derived_title() {
        let chart = ChartReference::new("https://example.com/img/weekly_share-summary.png?v=2");
        assert_eq!(chart.kind, ChartKind::Other);
        assert_eq!(chart.title(), "weekly share summary");

        let bare = ChartReference::new("https://example.com/");
        assert_eq!(bare.title(), "Chart");
    }

    #[test]
    fn known_chart_uses_fixed_label() {
        let chart = ChartReference::new("https://example.com/top10_prensa.png");
        assert_eq!(chart.title(), "Top 10 by Channel: Press");
    }
}
