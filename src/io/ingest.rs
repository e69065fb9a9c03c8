//! Payload ingest and normalization.
//!
//! Turns the request JSON into exactly one `Report` plus the chart references
//! to embed. Two payload shapes are accepted:
//!
//! - a list: `[report, chart, chart, ...]` where each chart is `{"url": ...}`
//!   or a bare `http...` string
//! - a single report object with chart URLs under recognized keys (`urls`,
//!   `images`, ...) or as bare `http...` strings among its values
//!
//! A missing or non-object report is fatal. Everything below that level is
//! best effort: malformed items are skipped and recorded as `ItemWarning`s,
//! missing fields become placeholders.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::{Channel, ChannelData, ChartReference, FieldValue, Report, Story};
use crate::error::AppError;

/// Report-object keys whose list values hold chart references.
pub const CHART_KEYS: [&str; 6] = ["urls", "images", "imagenes", "charts", "graficos", "chart_urls"];

/// An item that was skipped or defaulted during ingest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemWarning {
    /// Where the item sat, e.g. `[2]` or `TV_raw.noticias[3]`.
    pub location: String,
    pub message: String,
}

/// Ingest output: the report, the charts, and what was skipped on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedInput {
    pub report: Report,
    pub charts: Vec<ChartReference>,
    pub warnings: Vec<ItemWarning>,
}

/// Normalize a request payload.
pub fn normalize_input(input: &Value) -> Result<NormalizedInput, AppError> {
    let mut warnings = Vec::new();

    let (report_map, charts) = match input {
        Value::Array(items) => {
            let first = items
                .first()
                .ok_or_else(|| AppError::input("Input list is empty; expected the report as its first element."))?;
            let report_map = first
                .as_object()
                .ok_or_else(|| AppError::input("First element of the input list must be a JSON object (the report)."))?;
            let charts = collect_list_charts(&items[1..], &mut warnings);
            (report_map, charts)
        }
        Value::Object(map) => {
            let charts = collect_embedded_charts(map, &mut warnings);
            (map, charts)
        }
        other => {
            return Err(AppError::input(format!(
                "Input must be a JSON list or object, got {}.",
                json_kind(other)
            )));
        }
    };

    let report = parse_report(report_map, &mut warnings);

    for w in &warnings {
        warn!("Skipped input item - location={}, reason={}", w.location, w.message);
    }

    Ok(NormalizedInput {
        report,
        charts,
        warnings,
    })
}

fn collect_list_charts(items: &[Value], warnings: &mut Vec<ItemWarning>) -> Vec<ChartReference> {
    let mut charts = Vec::new();
    for (offset, item) in items.iter().enumerate() {
        // +1: index in the original list, after the report.
        let location = format!("[{}]", offset + 1);
        match chart_from_value(item) {
            Ok(chart) => charts.push(chart),
            Err(message) => warnings.push(ItemWarning { location, message }),
        }
    }
    charts
}

fn collect_embedded_charts(map: &Map<String, Value>, warnings: &mut Vec<ItemWarning>) -> Vec<ChartReference> {
    let mut charts = Vec::new();

    for key in CHART_KEYS {
        let Some(Value::Array(items)) = map.get(key) else {
            continue;
        };
        for (idx, item) in items.iter().enumerate() {
            match chart_from_value(item) {
                Ok(chart) => charts.push(chart),
                Err(message) => warnings.push(ItemWarning {
                    location: format!("{key}[{idx}]"),
                    message,
                }),
            }
        }
    }

    for value in map.values() {
        if let Value::String(s) = value {
            if is_http(s) {
                charts.push(ChartReference::new(s.trim()));
            }
        }
    }

    charts
}

fn chart_from_value(value: &Value) -> Result<ChartReference, String> {
    match value {
        Value::Object(obj) => match obj.get("url") {
            Some(Value::String(url)) if !url.trim().is_empty() => Ok(ChartReference::new(url.trim())),
            Some(_) => Err("chart object has a non-string or empty 'url'".to_string()),
            None => Err("chart object has no 'url' key".to_string()),
        },
        Value::String(s) if is_http(s) => Ok(ChartReference::new(s.trim())),
        other => Err(format!("expected a chart URL or {{\"url\": ...}}, got {}", json_kind(other))),
    }
}

fn is_http(s: &str) -> bool {
    s.trim_start().starts_with("http")
}

fn parse_report(map: &Map<String, Value>, warnings: &mut Vec<ItemWarning>) -> Report {
    let mut channels = Vec::new();
    for channel in Channel::ALL {
        match map.get(channel.key()) {
            None | Some(Value::Null) => {}
            Some(Value::Object(obj)) if obj.is_empty() => {}
            Some(Value::Object(obj)) => channels.push((channel, parse_channel(channel, obj, warnings))),
            Some(other) => warnings.push(ItemWarning {
                location: channel.key().to_string(),
                message: format!("channel data must be an object, got {}", json_kind(other)),
            }),
        }
    }

    Report {
        start_date: field(map, "fechaInicial"),
        end_date: field(map, "fechaFinal"),
        total_stories: field(map, "totalGlobalNoticias"),
        total_audience: field(map, "totalGlobalAudiencia"),
        total_vpe: field(map, "totalGlobalVPE"),
        total_vc: field(map, "totalGlobalVC"),
        channels,
    }
}

fn parse_channel(channel: Channel, map: &Map<String, Value>, warnings: &mut Vec<ItemWarning>) -> ChannelData {
    let mut stories = Vec::new();
    match map.get("noticias") {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) => {
            for (idx, item) in items.iter().enumerate() {
                match item.as_object() {
                    Some(obj) => stories.push(parse_story(obj)),
                    None => warnings.push(ItemWarning {
                        location: format!("{}.noticias[{idx}]", channel.key()),
                        message: format!("story must be an object, got {}", json_kind(item)),
                    }),
                }
            }
        }
        Some(other) => warnings.push(ItemWarning {
            location: format!("{}.noticias", channel.key()),
            message: format!("stories must be a list, got {}", json_kind(other)),
        }),
    }

    ChannelData {
        story_count: field(map, "cantidad_noticias"),
        audience: field(map, "total_audiencia"),
        vpe: field(map, "total_vpe"),
        vc: field(map, "total_vc"),
        stories,
    }
}

fn parse_story(map: &Map<String, Value>) -> Story {
    Story {
        date: field(map, "fecha"),
        title: field(map, "titulo"),
        headline: field(map, "titular").as_text(),
        link: optional_str(map, "url").or_else(|| optional_str(map, "link")),
    }
}

fn field(map: &Map<String, Value>, key: &str) -> FieldValue {
    FieldValue::from_json(map.get(key))
}

fn optional_str(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
