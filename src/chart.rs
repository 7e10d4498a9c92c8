//! Chart styling that follows the active theme.
//!
//! The charting library itself runs in the browser; this module owns the
//! style configuration it is handed and keeps it in step with theme changes.

use serde::Serialize;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

use crate::theme::{Theme, ThemeChanged};

/// Charts one browser may register.
pub const MAX_CHARTS: usize = 32;

const FONT_FAMILY: &str = "'Inter', 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif";

/// Global chart defaults for a theme.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartTheme {
    pub theme: Theme,
    pub text_color: &'static str,
    pub grid_color: &'static str,
    pub font_family: &'static str,
    pub font_size: u32,
    pub tooltip: TooltipStyle,
    pub legend: LegendStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipStyle {
    pub background_color: &'static str,
    pub title_color: &'static str,
    pub body_color: &'static str,
    pub border_color: &'static str,
    pub border_width: u32,
    pub corner_radius: u32,
    pub padding: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendStyle {
    pub color: &'static str,
    pub padding: u32,
    pub use_point_style: bool,
    pub point_style: &'static str,
}

impl ChartTheme {
    pub fn for_theme(theme: Theme) -> Self {
        let dark = theme == Theme::Dark;
        let text = if dark { "#e2e8f0" } else { "#1e293b" };

        Self {
            theme,
            text_color: text,
            grid_color: if dark {
                "rgba(255, 255, 255, 0.1)"
            } else {
                "rgba(0, 0, 0, 0.1)"
            },
            font_family: FONT_FAMILY,
            font_size: 12,
            tooltip: TooltipStyle {
                background_color: if dark { "#1e293b" } else { "#ffffff" },
                title_color: text,
                body_color: text,
                border_color: if dark { "#475569" } else { "#e2e8f0" },
                border_width: 1,
                corner_radius: 8,
                padding: 12,
            },
            legend: LegendStyle {
                color: text,
                padding: 15,
                use_point_style: true,
                point_style: "circle",
            },
        }
    }
}

/// Per-axis style of a rendered chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleStyle {
    pub name: String,
    pub tick_color: Option<String>,
    pub grid_color: Option<String>,
    pub title_color: Option<String>,
}

impl ScaleStyle {
    /// An axis with ticks and grid lines but no title.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tick_color: Some(String::new()),
            grid_color: Some(String::new()),
            title_color: None,
        }
    }
}

/// Style options of one chart on the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartInstance {
    pub id: String,
    pub scales: Vec<ScaleStyle>,
    pub legend_color: Option<String>,
    pub title_color: Option<String>,
    /// Bumped on every style-only redraw.
    pub style_revision: u64,
}

impl ChartInstance {
    pub fn new(id: &str, scales: Vec<ScaleStyle>) -> Self {
        Self {
            id: id.to_string(),
            scales,
            legend_color: Some(String::new()),
            title_color: None,
            style_revision: 0,
        }
    }

    /// Rewrite only the option slots the chart actually has.
    fn restyle(&mut self, theme: &ChartTheme) {
        for scale in &mut self.scales {
            if let Some(c) = scale.tick_color.as_mut() {
                *c = theme.text_color.to_string();
            }
            if let Some(c) = scale.grid_color.as_mut() {
                *c = theme.grid_color.to_string();
            }
            if let Some(c) = scale.title_color.as_mut() {
                *c = theme.text_color.to_string();
            }
        }
        if let Some(c) = self.legend_color.as_mut() {
            *c = theme.text_color.to_string();
        }
        if let Some(c) = self.title_color.as_mut() {
            *c = theme.text_color.to_string();
        }
        self.style_revision += 1;
    }
}

/// One browser's chart defaults and the charts rendered with them.
#[derive(Debug, Clone, Serialize)]
pub struct ChartRegistry {
    pub defaults: ChartTheme,
    pub instances: Vec<ChartInstance>,
}

impl ChartRegistry {
    pub fn new(theme: Theme) -> Self {
        Self {
            defaults: ChartTheme::for_theme(theme),
            instances: Vec::new(),
        }
    }

    /// Register a chart, styled for the current defaults. A chart with the
    /// same id is replaced. Returns false when the registry is full.
    pub fn register(&mut self, mut chart: ChartInstance) -> bool {
        let known = self.instances.iter().any(|c| c.id == chart.id);
        if !known && self.instances.len() >= MAX_CHARTS {
            return false;
        }
        chart.restyle(&self.defaults);
        self.instances.retain(|c| c.id != chart.id);
        self.instances.push(chart);
        true
    }

    pub fn apply_theme(&mut self, theme: Theme) {
        self.defaults = ChartTheme::for_theme(theme);
        for chart in &mut self.instances {
            chart.restyle(&self.defaults);
        }
    }
}

/// Keep `registry` in step with theme notifications until the sender is gone.
pub fn spawn_theme_listener(
    registry: Arc<RwLock<ChartRegistry>>,
    mut rx: broadcast::Receiver<ThemeChanged>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ThemeChanged { theme }) => {
                    let mut registry = registry.write().unwrap_or_else(|e| e.into_inner());
                    registry.apply_theme(theme);
                    tracing::debug!(
                        "Restyled {} charts for {} theme",
                        registry.instances.len(),
                        theme.as_str()
                    );
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Chart theme listener skipped {} notifications", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Named colour palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteKind {
    #[default]
    Default,
    Gradient,
    Pastel,
}

impl PaletteKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "gradient" => PaletteKind::Gradient,
            "pastel" => PaletteKind::Pastel,
            _ => PaletteKind::Default,
        }
    }
}

const DEFAULT_DARK: &[&str] = &[
    "rgba(59, 130, 246, 0.8)",
    "rgba(34, 197, 94, 0.8)",
    "rgba(245, 158, 11, 0.8)",
    "rgba(239, 68, 68, 0.8)",
    "rgba(168, 85, 247, 0.8)",
    "rgba(236, 72, 153, 0.8)",
    "rgba(6, 182, 212, 0.8)",
    "rgba(251, 146, 60, 0.8)",
];

const DEFAULT_LIGHT: &[&str] = &[
    "rgba(37, 99, 235, 0.8)",
    "rgba(16, 185, 129, 0.8)",
    "rgba(245, 158, 11, 0.8)",
    "rgba(220, 38, 38, 0.8)",
    "rgba(147, 51, 234, 0.8)",
    "rgba(219, 39, 119, 0.8)",
    "rgba(8, 145, 178, 0.8)",
    "rgba(234, 88, 12, 0.8)",
];

const GRADIENT_DARK: &[&str] = &[
    "rgba(99, 102, 241, 0.8)",
    "rgba(139, 92, 246, 0.8)",
    "rgba(217, 70, 239, 0.8)",
    "rgba(236, 72, 153, 0.8)",
];

const GRADIENT_LIGHT: &[&str] = &[
    "rgba(79, 70, 229, 0.8)",
    "rgba(124, 58, 237, 0.8)",
    "rgba(192, 38, 211, 0.8)",
    "rgba(219, 39, 119, 0.8)",
];

const PASTEL_DARK: &[&str] = &[
    "rgba(147, 197, 253, 0.8)",
    "rgba(167, 243, 208, 0.8)",
    "rgba(253, 224, 71, 0.8)",
    "rgba(252, 165, 165, 0.8)",
    "rgba(196, 181, 253, 0.8)",
];

const PASTEL_LIGHT: &[&str] = &[
    "rgba(191, 219, 254, 0.8)",
    "rgba(209, 250, 229, 0.8)",
    "rgba(254, 240, 138, 0.8)",
    "rgba(254, 202, 202, 0.8)",
    "rgba(221, 214, 254, 0.8)",
];

pub fn palette(kind: PaletteKind, theme: Theme) -> &'static [&'static str] {
    match (kind, theme) {
        (PaletteKind::Default, Theme::Dark) => DEFAULT_DARK,
        (PaletteKind::Default, Theme::Light) => DEFAULT_LIGHT,
        (PaletteKind::Gradient, Theme::Dark) => GRADIENT_DARK,
        (PaletteKind::Gradient, Theme::Light) => GRADIENT_LIGHT,
        (PaletteKind::Pastel, Theme::Dark) => PASTEL_DARK,
        (PaletteKind::Pastel, Theme::Light) => PASTEL_LIGHT,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientStop {
    pub offset: f64,
    pub color: String,
}

/// A canvas linear gradient from `(x0, y0)` to `(x1, y1)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearGradient {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub stops: Vec<GradientStop>,
}

/// Vertical fill fading a palette colour from `alpha` to transparent.
///
/// Palette colours end in `0.8)`; that alpha is what gets replaced.
pub fn gradient_fill(color: &str, alpha: f64) -> LinearGradient {
    LinearGradient {
        x0: 0.0,
        y0: 0.0,
        x1: 0.0,
        y1: 400.0,
        stops: vec![
            GradientStop {
                offset: 0.0,
                color: color.replacen("0.8)", &format!("{})", alpha), 1),
            },
            GradientStop {
                offset: 1.0,
                color: color.replacen("0.8)", "0)", 1),
            },
        ],
    }
}
