//! HTML rendering of the dashboard

use crate::config::Config;
use crate::controller::ViewState;
use crate::reconcile::{NoDataPolicy, SlotCell, reconcile};
use crate::slots::{Granularity, Slot, generate_slots};
use crate::snapshot::{ServiceStatus, StatusSnapshot};
use crate::status::{BannerStyle, Status};
use crate::theme::Theme;
use chrono::{DateTime, TimeZone};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt::{Display, Write};
use std::sync::OnceLock;

const EMPTY_MESSAGE: &str = "No services are being monitored yet.";
const ERROR_HEADLINE: &str = "Unable to load status data";

/// Rendering knobs taken from the configuration
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub page_title: String,
    pub no_data_policy: NoDataPolicy,
    pub single_day_summary: bool,
    pub service_names: BTreeMap<String, String>,
    pub range_options: Vec<u32>,
    /// Seconds between browser reloads; `None` disables the meta refresh
    pub reload_after_secs: Option<u64>,
    /// Draw range links, the theme toggle and the retry form
    pub interactive: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions::from(&Config::default())
    }
}

impl From<&Config> for RenderOptions {
    fn from(config: &Config) -> Self {
        Self {
            page_title: config.page_title.clone(),
            no_data_policy: config.no_data_policy,
            single_day_summary: config.single_day_summary,
            service_names: config.service_names.clone(),
            range_options: config.range_options.clone(),
            reload_after_secs: Some(config.refresh_interval.as_secs()),
            interactive: true,
        }
    }
}

/// Turns a view of the dashboard into a complete HTML document.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render the whole page for `view`, the selected range and theme.
    pub fn render_page<Tz>(&self, view: &ViewState, days: u32, theme: Theme, now: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut body = String::new();
        body.push_str(&self.render_header(days, theme));

        match view {
            ViewState::Loading => {
                body.push_str(r#"<p class="notice">Loading status data&hellip;</p>"#);
            }
            ViewState::Loaded { snapshot, .. } => {
                body.push_str(&self.render_banner(&snapshot.overall_text(), now));
                body.push_str(&self.render_services(snapshot, days, now));
            }
            ViewState::Failed { message } => {
                body.push_str(&self.render_error(message, days));
            }
        }

        let reload = match self.options.reload_after_secs {
            Some(secs) if secs > 0 => format!(r#"<meta http-equiv="refresh" content="{}">"#, secs),
            _ => String::new(),
        };

        format!(
            r#"<!DOCTYPE html>
<html lang="en" class="{root}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
{reload}
<title>{title}</title>
<style>{css}</style>
</head>
<body>
<main class="container">
{body}
</main>
</body>
</html>
"#,
            root = theme.root_class(),
            reload = reload,
            title = escape_html(&self.options.page_title),
            css = STYLESHEET,
            body = body,
        )
    }

    fn render_header(&self, days: u32, theme: Theme) -> String {
        let mut out = format!(
            r#"<header class="page-header"><h1>{}</h1>"#,
            escape_html(&self.options.page_title)
        );

        if self.options.interactive {
            out.push_str(r#"<nav class="ranges">"#);
            for &range in &self.options.range_options {
                let active = if range == days { " active" } else { "" };
                let _ = write!(
                    out,
                    r#"<a class="range-btn{}" data-range="{}" href="/?days={}">{}</a>"#,
                    active,
                    range,
                    range,
                    range_label(range)
                );
            }
            out.push_str("</nav>");

            let _ = write!(
                out,
                r#"<form method="post" action="/theme?days={}"><button id="theme-toggle" type="submit" data-theme="{}">{}</button></form>"#,
                days,
                theme.as_str(),
                match theme {
                    Theme::Light => "Dark mode",
                    Theme::Dark => "Light mode",
                }
            );
        }

        out.push_str("</header>");
        out
    }

    /// Overall banner with its style preset and the render timestamp.
    pub fn render_banner<Tz>(&self, overall_text: &str, now: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let style = BannerStyle::for_text(overall_text);
        format!(
            r#"<section id="overall-banner" class="banner banner-{class}"><span class="banner-icon">{icon}</span><h2 id="overall-text">{text}</h2><p id="overall-sub">Last updated: {updated}</p></section>"#,
            class = style.css_class,
            icon = style.icon,
            text = escape_html(overall_text),
            updated = now.format("%Y-%m-%d %H:%M:%S"),
        )
    }

    /// Cards for every service, sorted by alias, or the empty state.
    pub fn render_services<Tz>(&self, snapshot: &StatusSnapshot, days: u32, now: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        if snapshot.is_empty() {
            return self.render_empty();
        }

        let granularity = snapshot.granularity;
        let slots = generate_slots(granularity, days, now);

        let mut out = String::from(r#"<section id="services-container" class="services">"#);
        for service in snapshot.sorted_services() {
            out.push_str(&self.render_service_card(service, granularity, &slots, days));
        }
        out.push_str("</section>");
        out
    }

    /// One service card: header, bar chart and axis captions.
    pub fn render_service_card(
        &self,
        service: &ServiceStatus,
        granularity: Granularity,
        slots: &[Slot],
        days: u32,
    ) -> String {
        let status = service.current_status;
        let name = display_name(service, &self.options.service_names);
        let uptime = format!("{:.2}% uptime", service.uptime_90d);

        let mut out = format!(
            r#"<article class="card" data-alias="{alias}"><div class="card-header"><div class="service"><span class="dot dot-{class}"></span><span class="name">{name}</span></div><div class="meta"><span class="label text-{class}">{label}</span><span class="uptime">{uptime}</span></div></div>"#,
            alias = escape_html(&service.service_alias),
            class = status.css_class(),
            name = escape_html(&name),
            label = status.label(),
            uptime = uptime,
        );

        let cells = reconcile(&service.daily, slots, granularity);

        if self.options.single_day_summary && days == 1 {
            let _ = write!(
                out,
                r#"<div class="single-bar bar-{}"></div><div class="axis"><span>Today</span><span>{}</span><span></span></div>"#,
                self.latest_day_status(slots, &cells).css_class(),
                uptime
            );
        } else {
            out.push_str(&self.render_bar_chart(slots, &cells, granularity));
            let first = slots.first().map(|s| s.label(granularity)).unwrap_or_default();
            let last = slots.last().map(|s| s.label(granularity)).unwrap_or_default();
            let _ = write!(
                out,
                r#"<div class="axis"><span>{}</span><span>{}</span><span>{}</span></div>"#,
                first, uptime, last
            );
        }

        out.push_str("</article>");
        out
    }

    /// Worst status among the slots of the most recent local day.
    fn latest_day_status(&self, slots: &[Slot], cells: &[SlotCell<'_>]) -> Status {
        let policy = self.options.no_data_policy;
        let Some(today) = slots.last().map(|slot| slot.start.date()) else {
            return policy.status();
        };

        slots
            .iter()
            .zip(cells)
            .filter(|(slot, _)| slot.start.date() == today)
            .map(|(_, cell)| cell.status(policy))
            .max_by_key(Status::severity)
            .unwrap_or_else(|| policy.status())
    }

    fn render_bar_chart(&self, slots: &[Slot], cells: &[SlotCell<'_>], granularity: Granularity) -> String {
        let mut out = String::from(r#"<div class="bars">"#);

        for (slot, cell) in slots.iter().zip(cells) {
            let status = cell.status(self.options.no_data_policy);
            let mut detail = format!(r#"<div class="tip-date">{}</div>"#, slot.label(granularity));

            match cell.record() {
                Some(record) => {
                    let _ = write!(detail, "<div>{:.2}% uptime</div>", record.uptime);
                    if record.server_error_count > 0 {
                        let _ = write!(
                            detail,
                            r#"<div class="tip-errors">{} errors</div>"#,
                            record.server_error_count
                        );
                    }
                    if let Some(requests) = record.total_requests.filter(|n| *n > 0) {
                        let _ = write!(detail, "<div>{} requests</div>", format_number(requests));
                    }
                }
                None => detail.push_str("<div>No data recorded</div>"),
            }

            let source_key = slot
                .utc_key
                .as_ref()
                .map(|utc| format!(r#" data-utc="{}""#, utc))
                .unwrap_or_default();

            let _ = write!(
                out,
                r#"<div class="bar-wrapper" data-slot="{}"{}><div class="bar bar-{}"></div><div class="bar-tooltip">{}</div></div>"#,
                slot.key,
                source_key,
                status.css_class(),
                detail
            );
        }

        out.push_str("</div>");
        out
    }

    /// Error state with a retry control.
    pub fn render_error(&self, message: &str, days: u32) -> String {
        let retry = if self.options.interactive {
            format!(
                r#"<form method="post" action="/refresh?days={}"><button type="submit" class="retry">Retry</button></form>"#,
                days
            )
        } else {
            String::new()
        };

        format!(
            r#"<section id="services-container" class="error-state"><p class="headline">{}</p><p class="detail">{}</p>{}</section>"#,
            ERROR_HEADLINE,
            escape_html(message),
            retry
        )
    }

    pub fn render_empty(&self) -> String {
        format!(
            r#"<section id="services-container" class="empty-state"><p>{}</p></section>"#,
            EMPTY_MESSAGE
        )
    }
}

/// Caption of a range control.
pub fn range_label(days: u32) -> String {
    match days {
        1 => "24 hours".to_string(),
        n => format!("{} days", n),
    }
}

/// Name shown on a card: configured name, then the title, then the alias.
pub fn display_name(service: &ServiceStatus, names: &BTreeMap<String, String>) -> String {
    if let Some(name) = names.get(&service.service_alias) {
        return name.clone();
    }

    let title = clean_title(&service.service_title);
    if !title.is_empty() {
        return title;
    }

    let alias = title_case(&service.service_alias);
    if alias.is_empty() {
        "Unknown".to_string()
    } else {
        alias
    }
}

/// Resolve translation templates like `$t(service_title_image_gen)` into
/// `Image Gen`. Plain titles are returned unchanged.
pub fn clean_title(raw: &str) -> String {
    static TEMPLATE: OnceLock<Regex> = OnceLock::new();
    let template = TEMPLATE.get_or_init(|| Regex::new(r"^\$t\((.+)\)$").expect("valid title template regex"));

    let raw = raw.trim();
    match template.captures(raw) {
        Some(caps) => {
            let key = &caps[1];
            title_case(key.strip_prefix("service_title_").unwrap_or(key))
        }
        None => raw.to_string(),
    }
}

fn title_case(words: &str) -> String {
    words
        .split(['_', '-', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Compact request counts: `950`, `1.2K`, `3.4M`.
pub fn format_number(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLESHEET: &str = r#"
:root{--bg:#f8fafc;--fg:#0f172a;--muted:#94a3b8;--card:#ffffff;--border:#e2e8f0;--tip-bg:#0f172a;--tip-fg:#ffffff}
html.dark{--bg:#020617;--fg:#e2e8f0;--muted:#64748b;--card:#0f172a;--border:#1e293b;--tip-bg:#f1f5f9;--tip-fg:#0f172a}
body{margin:0;background:var(--bg);color:var(--fg);font-family:system-ui,sans-serif}
.container{max-width:960px;margin:0 auto;padding:2rem 1rem}
.page-header{display:flex;align-items:center;gap:1rem;flex-wrap:wrap;margin-bottom:2rem}
.page-header h1{flex:1;font-size:1.5rem;margin:0}
.ranges{display:flex;gap:.25rem}
.range-btn{padding:.25rem .75rem;border-radius:.5rem;color:var(--muted);text-decoration:none}
.range-btn.active{background:var(--card);color:var(--fg);border:1px solid var(--border)}
button{cursor:pointer;border:1px solid var(--border);background:var(--card);color:var(--fg);border-radius:.5rem;padding:.4rem .9rem}
.banner{border-radius:1rem;padding:1.5rem;margin-bottom:2rem;text-align:center;border:1px solid}
.banner-icon{display:inline-flex;width:3rem;height:3rem;border-radius:50%;align-items:center;justify-content:center;color:#fff;font-weight:700;font-size:1.25rem}
.banner h2{margin:.75rem 0 .25rem}
.banner p{margin:0;color:var(--muted);font-size:.85rem}
.banner-operational{background:#ecfdf5;border-color:#a7f3d0;color:#047857}.banner-operational .banner-icon{background:#10b981}
.banner-degraded{background:#fefce8;border-color:#fef08a;color:#a16207}.banner-degraded .banner-icon{background:#eab308}
.banner-partial-outage{background:#fff7ed;border-color:#fed7aa;color:#c2410c}.banner-partial-outage .banner-icon{background:#f97316}
.banner-major-outage{background:#fef2f2;border-color:#fecaca;color:#b91c1c}.banner-major-outage .banner-icon{background:#ef4444}
html.dark .banner{background:transparent}
.services{display:grid;gap:1rem}
.card{background:var(--card);border:1px solid var(--border);border-radius:.75rem;padding:1.25rem}
.card-header{display:flex;justify-content:space-between;margin-bottom:.75rem;font-size:.85rem}
.service,.meta{display:flex;align-items:center;gap:.5rem}
.name{font-weight:600}
.uptime{color:var(--muted);font-size:.75rem}
.dot{width:.6rem;height:.6rem;border-radius:50%}
.bars{display:flex;align-items:flex-end;gap:1px;height:2rem}
.bar-wrapper{position:relative;flex:1;height:100%;display:flex}
.bar{width:100%;height:100%;border-radius:2px}
.bar-wrapper:hover .bar{opacity:.8}
.bar-tooltip{display:none;position:absolute;bottom:110%;left:50%;transform:translateX(-50%);white-space:nowrap;z-index:10;padding:.35rem .6rem;border-radius:.5rem;font-size:.75rem;background:var(--tip-bg);color:var(--tip-fg)}
.bar-wrapper:hover .bar-tooltip{display:block}
.tip-date{font-weight:600}
.tip-errors{color:#f87171}
.single-bar{height:2rem;border-radius:.375rem}
.axis{display:flex;justify-content:space-between;margin-top:.4rem;font-size:.65rem;color:var(--muted)}
.bar-operational,.dot-operational{background:#10b981}.text-operational{color:#059669}
.bar-degraded,.dot-degraded{background:#eab308}.text-degraded{color:#ca8a04}
.bar-partial-outage,.dot-partial-outage{background:#f97316}.text-partial-outage{color:#ea580c}
.bar-major-outage,.dot-major-outage{background:#ef4444}.text-major-outage{color:#dc2626}
.bar-unknown{background:var(--border)}.dot-unknown{background:#94a3b8}.text-unknown{color:#64748b}
.empty-state,.error-state,.notice{text-align:center;padding:3rem 0;color:var(--muted)}
.error-state .headline{font-size:1.1rem;font-weight:600}
"#;
