//! Slide planning and building.
//!
//! `plan_slides` decides which slides a report needs, in order:
//! cover, methodology, per-channel coverage (paginated), totals, charts.
//! Each planned slide is a `SlideSpec` and appends itself to the `Deck`
//! through the `SlideBuilder` trait. Every slide gets the same chrome: header
//! bar with title, accent rule, footer caption, and the logo when one loaded.

use tracing::{debug, warn};

use crate::data::{FetchOutcome, ImageFetcher};
use crate::deck::{
    Align, Anchor, Deck, Frame, MediaId, Paragraph, Picture, Rgb, Shape, Slide, TextBox, TextRun, layout,
};
use crate::domain::{Channel, ChannelData, ChartReference, DeckConfig, Report, Story, Theme};
use crate::io::ingest::NormalizedInput;

pub mod format;

use format::{format_date, format_money, format_period};

const METHODOLOGY_POINTS: [&str; 6] = [
    "Coverage is collected daily from television, radio, press and digital media outlets.",
    "Each story is counted once per outlet and dated by its first publication or broadcast.",
    "Audience is the estimated reach reported by each outlet for the period.",
    "VPE (equivalent advertising value) prices each story at the outlet's advertising rate for the same space or airtime.",
    "VC (qualitative value) weighs the VPE by tone, prominence and relevance of the coverage.",
    "Charts summarise the same data by channel; Top 10 charts rank outlets by number of stories.",
];

const PLACEHOLDER_FILL: Rgb = Rgb::new(0xF2, 0xF2, 0xF2);

/// The logo image and where it sits on every slide.
#[derive(Debug, Clone, Copy)]
pub struct LogoPlacement {
    pub media: MediaId,
    pub frame: Frame,
}

/// Shared, read-only state for one render.
pub struct RenderContext<'a> {
    pub config: &'a DeckConfig,
    pub fetcher: &'a dyn ImageFetcher,
    pub logo: Option<LogoPlacement>,
}

/// Something that can add itself to a deck.
pub trait SlideBuilder {
    fn title(&self, config: &DeckConfig) -> String;
    fn append_to(&self, deck: &mut Deck, ctx: &RenderContext<'_>);
}

pub struct CoverSlide<'r> {
    pub report: &'r Report,
}

pub struct MethodologySlide;

/// One page of a channel's stories.
pub struct ChannelCoverageSlide<'r> {
    pub channel: Channel,
    pub data: &'r ChannelData,
    pub stories: &'r [Story],
    /// 1-based.
    pub page: usize,
    pub pages: usize,
}

pub struct TotalsSlide<'r> {
    pub report: &'r Report,
}

pub struct ChartSlide<'r> {
    pub chart: &'r ChartReference,
}

pub enum SlideSpec<'r> {
    Cover(CoverSlide<'r>),
    Methodology(MethodologySlide),
    ChannelCoverage(ChannelCoverageSlide<'r>),
    Totals(TotalsSlide<'r>),
    Chart(ChartSlide<'r>),
}

impl SlideSpec<'_> {
    fn builder(&self) -> &dyn SlideBuilder {
        match self {
            SlideSpec::Cover(s) => s,
            SlideSpec::Methodology(s) => s,
            SlideSpec::ChannelCoverage(s) => s,
            SlideSpec::Totals(s) => s,
            SlideSpec::Chart(s) => s,
        }
    }
}

impl SlideBuilder for SlideSpec<'_> {
    fn title(&self, config: &DeckConfig) -> String {
        self.builder().title(config)
    }

    fn append_to(&self, deck: &mut Deck, ctx: &RenderContext<'_>) {
        self.builder().append_to(deck, ctx)
    }
}

/// Decide the slide sequence for a normalized payload.
pub fn plan_slides<'r>(input: &'r NormalizedInput, config: &DeckConfig) -> Vec<SlideSpec<'r>> {
    let report = &input.report;
    let page_size = config.effective_page_size();
    let mut plan = vec![
        SlideSpec::Cover(CoverSlide { report }),
        SlideSpec::Methodology(MethodologySlide),
    ];

    for (channel, data) in &report.channels {
        if data.stories.is_empty() {
            plan.push(SlideSpec::ChannelCoverage(ChannelCoverageSlide {
                channel: *channel,
                data,
                stories: &[],
                page: 1,
                pages: 1,
            }));
            continue;
        }
        let pages = data.stories.len().div_ceil(page_size);
        for (idx, chunk) in data.stories.chunks(page_size).enumerate() {
            plan.push(SlideSpec::ChannelCoverage(ChannelCoverageSlide {
                channel: *channel,
                data,
                stories: chunk,
                page: idx + 1,
                pages,
            }));
        }
    }

    plan.push(SlideSpec::Totals(TotalsSlide { report }));
    plan.extend(input.charts.iter().map(|chart| SlideSpec::Chart(ChartSlide { chart })));
    plan
}

/// Build the whole deck. Fetch failures degrade to placeholders; nothing here
/// is fatal once the input has been normalized.
pub fn render_deck(input: &NormalizedInput, config: &DeckConfig, fetcher: &dyn ImageFetcher) -> Deck {
    let mut deck = Deck::new(config.report_title.clone());

    let logo = config
        .logo_url
        .as_deref()
        .and_then(|url| match fetch_media(&mut deck, url, fetcher) {
            Ok(media) => Some(place_logo(&deck, media)),
            Err(reason) => {
                warn!("Logo omitted - url={}, reason={}", url, reason);
                None
            }
        });

    let ctx = RenderContext { config, fetcher, logo };
    let plan = plan_slides(input, config);
    for spec in &plan {
        debug!("Building slide {} - {}", deck.slides().len() + 1, spec.title(config));
        spec.append_to(&mut deck, &ctx);
    }
    deck
}

fn place_logo(deck: &Deck, media: MediaId) -> LogoPlacement {
    let region = layout::logo();
    let frame = deck
        .media(media)
        .map(|m| region.fit_centered(m.width_px, m.height_px))
        .unwrap_or(region);
    LogoPlacement { media, frame }
}

/// Fetch, read, delete, decode. The temp file is gone before decoding starts.
fn fetch_media(deck: &mut Deck, url: &str, fetcher: &dyn ImageFetcher) -> Result<MediaId, String> {
    let bytes = match fetcher.fetch(url) {
        FetchOutcome::Fetched(image) => {
            let bytes = image.read();
            image.discard();
            bytes.map_err(|e| format!("downloaded image could not be read: {e}"))?
        }
        FetchOutcome::Failed(reason) => return Err(reason.to_string()),
    };
    deck.add_media(bytes)
        .map_err(|e| format!("image could not be decoded: {e}"))
}

/* -------------------------------------------------------------------------- */
/* Slide chrome and text helpers                                              */
/* -------------------------------------------------------------------------- */

fn start_slide(title: &str, section: &str, ctx: &RenderContext<'_>) -> Slide {
    let theme = &ctx.config.theme;
    let mut slide = Slide::new(title);

    slide.add(Shape::Rect {
        name: "Header Bar".to_string(),
        frame: layout::header_bar(),
        fill: theme.primary_color,
    });
    slide.add(Shape::Rect {
        name: "Accent Rule".to_string(),
        frame: layout::accent_rule(),
        fill: theme.accent_color,
    });
    slide.add(Shape::Text(
        TextBox::new("Title", layout::header_title())
            .with_anchor(Anchor::Middle)
            .with_paragraph(Paragraph::new(vec![
                TextRun::new(title, theme.title_size)
                    .bold()
                    .colored(Rgb::WHITE)
                    .font(&theme.title_font),
            ])),
    ));
    slide.add(Shape::Text(
        TextBox::new("Footer", layout::footer())
            .with_anchor(Anchor::Middle)
            .with_paragraph(Paragraph::new(vec![
                TextRun::new(format!("{} · {}", ctx.config.report_title, section), theme.caption_size)
                    .colored(theme.secondary_color)
                    .font(&theme.body_font),
            ])),
    ));

    if let Some(logo) = ctx.logo {
        slide.add(Shape::Picture(Picture {
            name: "Logo".to_string(),
            frame: logo.frame,
            media: logo.media,
            description: "Logo".to_string(),
        }));
    }

    slide
}

fn body_run(text: impl Into<String>, size: f32, theme: &Theme) -> TextRun {
    TextRun::new(text, size)
        .colored(theme.text_color)
        .font(&theme.body_font)
}

/// `"{label}: {value}"` with a bold label.
fn counter_line(label: &str, value: String, size: f32, theme: &Theme) -> Paragraph {
    Paragraph::new(vec![
        body_run(format!("{label}: "), size, theme).bold(),
        body_run(value, size, theme),
    ])
    .with_space_before(4.0)
}

/* -------------------------------------------------------------------------- */
/* Builders                                                                   */
/* -------------------------------------------------------------------------- */

impl SlideBuilder for CoverSlide<'_> {
    fn title(&self, config: &DeckConfig) -> String {
        config.report_title.clone()
    }

    fn append_to(&self, deck: &mut Deck, ctx: &RenderContext<'_>) {
        let theme = &ctx.config.theme;
        let title = self.title(ctx.config);
        let mut slide = start_slide(&title, "Cover", ctx);

        let period = format_period(&self.report.start_date, &self.report.end_date);
        let body = TextBox::new("Cover", layout::content())
            .with_anchor(Anchor::Middle)
            .with_paragraph(
                Paragraph::new(vec![
                    TextRun::new(title, theme.title_size + 10.0)
                        .bold()
                        .colored(theme.primary_color)
                        .font(&theme.title_font),
                ])
                .with_align(Align::Center),
            )
            .with_paragraph(
                Paragraph::new(vec![
                    body_run("Period: ", theme.body_size + 6.0, theme).bold(),
                    body_run(period, theme.body_size + 6.0, theme),
                ])
                .with_align(Align::Center)
                .with_space_before(18.0),
            )
            .with_paragraph(
                Paragraph::new(vec![
                    TextRun::new("Television · Radio · Press · Digital Media", theme.body_size)
                        .colored(theme.secondary_color)
                        .font(&theme.body_font),
                ])
                .with_align(Align::Center)
                .with_space_before(12.0),
            );
        slide.add(Shape::Text(body));
        deck.push_slide(slide);
    }
}

impl SlideBuilder for MethodologySlide {
    fn title(&self, _config: &DeckConfig) -> String {
        "Methodology".to_string()
    }

    fn append_to(&self, deck: &mut Deck, ctx: &RenderContext<'_>) {
        let theme = &ctx.config.theme;
        let mut slide = start_slide(&self.title(ctx.config), "Methodology", ctx);

        let mut body = TextBox::new("Methodology", layout::content());
        for point in METHODOLOGY_POINTS {
            body.push(
                Paragraph::new(vec![body_run(point, theme.body_size, theme)])
                    .with_bullet()
                    .with_space_before(8.0),
            );
        }
        slide.add(Shape::Text(body));
        deck.push_slide(slide);
    }
}

impl SlideBuilder for ChannelCoverageSlide<'_> {
    fn title(&self, _config: &DeckConfig) -> String {
        if self.page > 1 {
            format!("{} (continued)", self.channel.display_name())
        } else {
            self.channel.display_name().to_string()
        }
    }

    fn append_to(&self, deck: &mut Deck, ctx: &RenderContext<'_>) {
        let config = ctx.config;
        let theme = &config.theme;
        let section = if self.pages > 1 {
            format!("Coverage · {} · page {} of {}", self.channel.display_name(), self.page, self.pages)
        } else {
            format!("Coverage · {}", self.channel.display_name())
        };
        let mut slide = start_slide(&self.title(config), &section, ctx);

        let content = layout::content();
        let counters_height = content.cy / 5;
        let counters = TextBox::new("Counters", Frame::new(content.x, content.y, content.cx, counters_height))
            .with_paragraph(counter_line("Stories", self.data.story_count.display(), theme.body_size, theme))
            .with_paragraph(counter_line("Audience", self.data.audience.display(), theme.body_size, theme))
            .with_paragraph(Paragraph::new(vec![
                body_run("VPE: ", theme.body_size, theme).bold(),
                body_run(format_money(&self.data.vpe, &config.currency_suffix), theme.body_size, theme),
                body_run(" | ", theme.body_size, theme),
                body_run("VC: ", theme.body_size, theme).bold(),
                body_run(format_money(&self.data.vc, &config.currency_suffix), theme.body_size, theme),
            ])
            .with_space_before(4.0));
        slide.add(Shape::Text(counters));

        if !self.stories.is_empty() {
            let gap = content.cy / 40;
            let stories_frame = Frame::new(
                content.x,
                content.y + counters_height + gap,
                content.cx,
                content.cy - counters_height - gap,
            );
            let mut stories = TextBox::new("Stories", stories_frame);
            let size = theme.body_size - 2.0;
            for story in self.stories {
                let date = format_date(&story.date, &config.date_output_format);
                stories.push(
                    Paragraph::new(vec![
                        TextRun::new(format!("{date}: "), size)
                            .bold()
                            .colored(theme.accent_color)
                            .font(&theme.body_font),
                        body_run(story.title.display(), size, theme).linked(story.link.clone()),
                    ])
                    .with_bullet()
                    .with_space_before(6.0),
                );
                if let Some(headline) = &story.headline {
                    stories.push(
                        Paragraph::new(vec![
                            TextRun::new(headline.as_str(), size - 2.0)
                                .italic()
                                .colored(theme.secondary_color)
                                .font(&theme.body_font)
                                .linked(story.link.clone()),
                        ])
                        .with_indent(),
                    );
                }
            }
            slide.add(Shape::Text(stories));
        }

        deck.push_slide(slide);
    }
}

impl SlideBuilder for TotalsSlide<'_> {
    fn title(&self, _config: &DeckConfig) -> String {
        "Global Totals".to_string()
    }

    fn append_to(&self, deck: &mut Deck, ctx: &RenderContext<'_>) {
        let config = ctx.config;
        let theme = &config.theme;
        let size = theme.body_size + 4.0;
        let mut slide = start_slide(&self.title(config), "Totals", ctx);

        let r = self.report;
        let body = TextBox::new("Totals", layout::content())
            .with_paragraph(counter_line("Period", format_period(&r.start_date, &r.end_date), size, theme))
            .with_paragraph(counter_line("Stories", r.total_stories.display(), size, theme))
            .with_paragraph(counter_line("Audience", r.total_audience.display(), size, theme))
            .with_paragraph(counter_line("VPE", format_money(&r.total_vpe, &config.currency_suffix), size, theme))
            .with_paragraph(counter_line("VC", format_money(&r.total_vc, &config.currency_suffix), size, theme));
        slide.add(Shape::Text(body));
        deck.push_slide(slide);
    }
}

impl SlideBuilder for ChartSlide<'_> {
    fn title(&self, _config: &DeckConfig) -> String {
        self.chart.title()
    }

    fn append_to(&self, deck: &mut Deck, ctx: &RenderContext<'_>) {
        let theme = &ctx.config.theme;
        let title = self.title(ctx.config);
        let mut slide = start_slide(&title, &format!("Charts · {title}"), ctx);
        let region = layout::content();

        match fetch_media(deck, &self.chart.url, ctx.fetcher) {
            Ok(media) => {
                let frame = deck
                    .media(media)
                    .map(|m| region.fit_centered(m.width_px, m.height_px))
                    .unwrap_or(region);
                slide.add(Shape::Picture(Picture {
                    name: "Chart".to_string(),
                    frame,
                    media,
                    description: title.clone(),
                }));
            }
            Err(reason) => {
                warn!("Chart placeholder used - url={}, reason={}", self.chart.url, reason);
                let mut placeholder = TextBox::new("Chart Placeholder", region)
                    .with_anchor(Anchor::Middle)
                    .with_paragraph(
                        Paragraph::new(vec![
                            TextRun::new("Chart unavailable", theme.title_size)
                                .bold()
                                .colored(theme.accent_color)
                                .font(&theme.title_font),
                        ])
                        .with_align(Align::Center),
                    )
                    .with_paragraph(
                        Paragraph::new(vec![body_run(reason, theme.body_size - 2.0, theme)])
                            .with_align(Align::Center)
                            .with_space_before(10.0),
                    )
                    .with_paragraph(
                        Paragraph::new(vec![
                            TextRun::new(self.chart.url.as_str(), theme.caption_size)
                                .colored(theme.secondary_color)
                                .font(&theme.body_font),
                        ])
                        .with_align(Align::Center)
                        .with_space_before(6.0),
                    );
                placeholder.fill = Some(PLACEHOLDER_FILL);
                slide.add(Shape::Text(placeholder));
            }
        }

        deck.push_slide(slide);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::data::{FetchFailure, store_temp_image};
    use crate::deck::png_fixture;
    use crate::io::ingest::normalize_input;

    /// Serves canned bytes through real temp files, 404 for anything else.
    struct StubFetcher {
        dir: TempDir,
        images: HashMap<String, Vec<u8>>,
    }

    impl StubFetcher {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                images: HashMap::new(),
            }
        }

        fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
            self.images.insert(url.to_string(), bytes);
            self
        }

        fn leftover_files(&self) -> usize {
            std::fs::read_dir(self.dir.path()).unwrap().count()
        }
    }

    impl ImageFetcher for StubFetcher {
        fn fetch(&self, url: &str) -> FetchOutcome {
            match self.images.get(url) {
                Some(bytes) => match store_temp_image(self.dir.path(), bytes) {
                    Ok(image) => FetchOutcome::Fetched(image),
                    Err(e) => FetchOutcome::Failed(e),
                },
                None => FetchOutcome::Failed(FetchFailure::Status(404)),
            }
        }
    }

    fn scenario() -> serde_json::Value {
        json!([{
            "fechaInicial": "2024-01-01",
            "fechaFinal": "2024-01-31",
            "totalGlobalNoticias": 10,
            "totalGlobalAudiencia": 5000,
            "totalGlobalVPE": "1000",
            "totalGlobalVC": "200",
            "TV_raw": {
                "cantidad_noticias": 3,
                "total_audiencia": 1000,
                "total_vpe": "300",
                "total_vc": "50",
                "noticias": [{"fecha": "2024-01-05", "titulo": "A"}]
            }
        }])
    }

    fn render(input: serde_json::Value, config: &DeckConfig, fetcher: &StubFetcher) -> Deck {
        let normalized = normalize_input(&input).unwrap();
        render_deck(&normalized, config, fetcher)
    }

    fn titled<'d>(deck: &'d Deck, prefix: &str) -> Vec<&'d Slide> {
        deck.slides().iter().filter(|s| s.title.starts_with(prefix)).collect()
    }

    fn texts(slide: &Slide) -> Vec<String> {
        slide.texts()
    }

    fn story_lines(slide: &Slide) -> Vec<String> {
        slide
            .text_box("Stories")
            .map(|tb| tb.paragraphs.iter().filter(|p| p.bullet).map(Paragraph::text).collect())
            .unwrap_or_default()
    }

    #[test]
    fn end_to_end_scenario() {
        let fetcher = StubFetcher::new();
        let deck = render(scenario(), &DeckConfig::default(), &fetcher);

        let titles: Vec<_> = deck.slides().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Media Monitoring Report", "Methodology", "Television", "Global Totals"]
        );

        let cover = texts(&deck.slides()[0]);
        assert!(cover.iter().any(|t| t == "Period: 2024-01-01 to 2024-01-31"), "{cover:?}");

        assert_eq!(story_lines(&deck.slides()[2]), vec!["05/01/2024: A"]);

        let totals = texts(&deck.slides()[3]);
        assert!(totals.contains(&"VPE: 1000 USD".to_string()), "{totals:?}");
        assert!(totals.contains(&"VC: 200 USD".to_string()));
        assert!(totals.contains(&"Stories: 10".to_string()));
        assert!(totals.contains(&"Audience: 5000".to_string()));
    }

    #[test]
    fn channel_counters_are_verbatim() {
        let fetcher = StubFetcher::new();
        let deck = render(scenario(), &DeckConfig::default(), &fetcher);
        let tv = texts(titled(&deck, "Television")[0]);
        assert!(tv.contains(&"Stories: 3".to_string()), "{tv:?}");
        assert!(tv.contains(&"Audience: 1000".to_string()));
        assert!(tv.contains(&"VPE: 300 USD | VC: 50 USD".to_string()));
    }

    #[test]
    fn missing_aggregates_show_placeholder() {
        let fetcher = StubFetcher::new();
        let deck = render(json!([{"totalGlobalNoticias": 4}]), &DeckConfig::default(), &fetcher);
        let totals = texts(titled(&deck, "Global Totals")[0]);
        assert!(totals.contains(&"Stories: 4".to_string()));
        assert!(totals.contains(&"Audience: N/A".to_string()));
        assert!(totals.contains(&"VPE: N/A".to_string()));
        assert!(totals.contains(&"Period: N/A to N/A".to_string()));
    }

    #[test]
    fn channels_without_data_produce_no_slides() {
        let fetcher = StubFetcher::new();
        let input = json!([{
            "Radio_raw": {"cantidad_noticias": 0},
            "Prensa_raw": {}
        }]);
        let deck = render(input, &DeckConfig::default(), &fetcher);
        assert!(titled(&deck, "Television").is_empty());
        assert!(titled(&deck, "Press").is_empty());
        assert!(titled(&deck, "Digital Media").is_empty());

        let radio = titled(&deck, "Radio");
        assert_eq!(radio.len(), 1);
        assert!(radio[0].text_box("Stories").is_none());
    }

    #[test]
    fn stories_are_paginated_in_order() {
        let fetcher = StubFetcher::new();
        let config = DeckConfig {
            page_size: 5,
            ..DeckConfig::default()
        };
        for n in [1usize, 4, 5, 6, 11, 15] {
            let stories: Vec<_> = (0..n)
                .map(|i| json!({"fecha": "2024-02-01", "titulo": format!("S{i}")}))
                .collect();
            let deck = render(json!([{"Prensa_raw": {"noticias": stories}}]), &config, &fetcher);
            let slides = titled(&deck, "Press");
            assert_eq!(slides.len(), n.div_ceil(5), "n={n}");

            let mut seen = Vec::new();
            for slide in &slides {
                let lines = story_lines(slide);
                assert!(lines.len() <= 5);
                seen.extend(lines);
            }
            let expected: Vec<_> = (0..n).map(|i| format!("01/02/2024: S{i}")).collect();
            assert_eq!(seen, expected, "n={n}");
        }
    }

    #[test]
    fn continuation_slides_are_labelled() {
        let fetcher = StubFetcher::new();
        let stories: Vec<_> = (0..7).map(|i| json!({"titulo": format!("T{i}")})).collect();
        let deck = render(json!([{"TV_raw": {"noticias": stories}}]), &DeckConfig::default(), &fetcher);
        let tv: Vec<_> = titled(&deck, "Television").iter().map(|s| s.title.clone()).collect();
        assert_eq!(tv, vec!["Television", "Television (continued)"]);
        let footer = titled(&deck, "Television")[1].text_box("Footer").unwrap().paragraphs[0].text();
        assert!(footer.ends_with("Coverage · Television · page 2 of 2"), "{footer}");
        assert_eq!(story_lines(titled(&deck, "Television")[1]), vec!["N/A: T5", "N/A: T6"]);
    }

    #[test]
    fn headline_and_link_are_rendered() {
        let fetcher = StubFetcher::new();
        let input = json!([{"TV_raw": {"noticias": [
            {"fecha": "2024-01-05", "titulo": "A", "titular": "A happened today", "url": "https://news/a"}
        ]}}]);
        let deck = render(input, &DeckConfig::default(), &fetcher);
        let tv = titled(&deck, "Television")[0];
        let stories = tv.text_box("Stories").unwrap();
        assert_eq!(stories.paragraphs.len(), 2);
        assert_eq!(stories.paragraphs[1].text(), "A happened today");
        assert!(stories.paragraphs[1].indented);
        assert_eq!(tv.links(), vec!["https://news/a"]);
    }

    #[test]
    fn chart_image_is_fitted_into_content_region() {
        let url = "https://charts/top10_prensa.png";
        let fetcher = StubFetcher::new().with(url, png_fixture(300, 100));
        let deck = render(json!([{}, {"url": url}]), &DeckConfig::default(), &fetcher);

        let chart = deck.slides().last().unwrap();
        assert_eq!(chart.title, "Top 10 by Channel: Press");
        let pictures: Vec<_> = chart.pictures().collect();
        assert_eq!(pictures.len(), 1);

        let region = layout::content();
        let frame = pictures[0].frame;
        assert_eq!(frame.cx, region.cx);
        assert!(frame.cy < region.cy);
        assert_eq!(frame.y - region.y, (region.cy - frame.cy) / 2);
        assert_eq!(fetcher.leftover_files(), 0);
    }

    #[test]
    fn failed_fetch_renders_placeholder() {
        let fetcher = StubFetcher::new();
        let deck = render(
            json!([{}, {"url": "https://charts/vpe_barra.png"}, "https://charts/mystery.png"]),
            &DeckConfig::default(),
            &fetcher,
        );
        let charts = &deck.slides()[deck.slides().len() - 2..];
        assert_eq!(charts[0].title, "VPE by Channel");
        assert_eq!(charts[1].title, "mystery");
        for slide in charts {
            assert_eq!(slide.pictures().count(), 0);
            let placeholder = slide.text_box("Chart Placeholder").unwrap();
            assert_eq!(placeholder.paragraphs[0].text(), "Chart unavailable");
            assert!(placeholder.paragraphs[1].text().contains("404"));
        }
        assert!(deck.media_items().is_empty());
    }

    #[test]
    fn undecodable_image_renders_placeholder_and_cleans_up() {
        let url = "https://charts/broken.png";
        let fetcher = StubFetcher::new().with(url, b"<html>oops</html>".to_vec());
        let deck = render(json!([{}, url]), &DeckConfig::default(), &fetcher);
        let slide = deck.slides().last().unwrap();
        assert!(slide.text_box("Chart Placeholder").is_some());
        assert_eq!(fetcher.leftover_files(), 0);
    }

    #[test]
    fn logo_is_shared_by_every_slide() {
        let logo = "https://brand/logo.png";
        let fetcher = StubFetcher::new().with(logo, png_fixture(200, 50));
        let config = DeckConfig {
            logo_url: Some(logo.to_string()),
            ..DeckConfig::default()
        };
        let deck = render(scenario(), &config, &fetcher);
        assert_eq!(deck.media_items().len(), 1);
        for slide in deck.slides() {
            let logos: Vec<_> = slide.pictures().filter(|p| p.name == "Logo").collect();
            assert_eq!(logos.len(), 1, "slide {}", slide.title);
        }
        assert_eq!(fetcher.leftover_files(), 0);
    }

    #[test]
    fn missing_logo_is_omitted() {
        let fetcher = StubFetcher::new();
        let config = DeckConfig {
            logo_url: Some("https://brand/missing.png".to_string()),
            ..DeckConfig::default()
        };
        let deck = render(scenario(), &config, &fetcher);
        assert_eq!(deck.slides().len(), 4);
        assert!(deck.slides().iter().all(|s| s.pictures().count() == 0));
    }

    #[test]
    fn rendering_is_repeatable() {
        let url = "https://charts/torta.png";
        let fetcher = StubFetcher::new().with(url, png_fixture(64, 64));
        let mut input = scenario();
        input.as_array_mut().unwrap().push(json!(url));

        let a = render(input.clone(), &DeckConfig::default(), &fetcher);
        let b = render(input, &DeckConfig::default(), &fetcher);
        assert_eq!(a.slides().len(), b.slides().len());
        for (x, y) in a.slides().iter().zip(b.slides()) {
            assert_eq!(x.texts(), y.texts());
        }
        assert_eq!(a, b);
    }

    #[test]
    fn methodology_is_static() {
        let fetcher = StubFetcher::new();
        let a = render(scenario(), &DeckConfig::default(), &fetcher);
        let b = render(json!({"totalGlobalNoticias": 1}), &DeckConfig::default(), &fetcher);
        assert_eq!(titled(&a, "Methodology")[0], titled(&b, "Methodology")[0]);
    }

    #[test]
    fn plan_orders_sections() {
        let normalized = normalize_input(&json!([
            {"Medios Digitales_raw": {"cantidad_noticias": 1}, "TV_raw": {"cantidad_noticias": 1}},
            "https://c/a.png"
        ]))
        .unwrap();
        let config = DeckConfig::default();
        let kinds: Vec<_> = plan_slides(&normalized, &config)
            .iter()
            .map(|s| match s {
                SlideSpec::Cover(_) => "cover".to_string(),
                SlideSpec::Methodology(_) => "methodology".to_string(),
                SlideSpec::ChannelCoverage(c) => format!("{:?}", c.channel),
                SlideSpec::Totals(_) => "totals".to_string(),
                SlideSpec::Chart(_) => "chart".to_string(),
            })
            .collect();
        assert_eq!(kinds, vec!["cover", "methodology", "Television", "Digital", "totals", "chart"]);
    }
}
