//! # Render Model
//!
//! Pure projection of chart state into screen geometry. Nothing here draws;
//! a host toolkit walks the model and paints it. Text measurement is the one
//! layout query that depends on the host, so it is passed in.

use tickrange_types::Bound;

use crate::brush::HandleVisibility;
use crate::chart::{ChartStatus, LiquidityRangeChart};
use crate::viewport::ZoomTransform;

/// Space around label text
const LABEL_PADDING: f64 = 4.0;

/// Host-provided text metrics
pub trait TextMeasure {
    /// `(width, height)` of `text` in pixels
    fn measure(&self, text: &str) -> (f64, f64);
}

/// Fixed advance per character
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasure {
    pub char_width: f64,
    pub line_height: f64,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self {
            char_width: 7.0,
            line_height: 12.0,
        }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn measure(&self, text: &str) -> (f64, f64) {
        (text.chars().count() as f64 * self.char_width, self.line_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandleModel {
    pub bound: Bound,
    /// Handle glyph position, or the edge arrow to draw instead
    pub visibility: HandleVisibility,
    pub label: String,
    pub label_rect: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderModel {
    pub width: f64,
    pub height: f64,
    pub status: ChartStatus,
    pub transform: ZoomTransform,

    /// Curve outline as `(x, y)` pixels, ascending by `x`, y growing down
    pub curve: Vec<(f64, f64)>,

    /// Horizontal span of the selection clipped to the chart
    pub selection: Option<(f64, f64)>,

    pub current_price_px: Option<f64>,
    pub handles: [HandleModel; 2],
}

/// Geometry for the chart as it stands, `height` pixels tall
pub fn render_model(chart: &LiquidityRangeChart, height: f64, measure: &dyn TextMeasure) -> RenderModel {
    let viewport = chart.viewport();
    let controller = chart.controller();
    let width = viewport.width();
    let extent = controller.live_extent();

    let curve = match chart.curve() {
        Some(curve) => {
            let max = curve.points().map(|(_, liquidity)| liquidity).fold(0.0, f64::max);
            let mut points: Vec<(f64, f64)> = curve
                .points()
                .map(|(price, liquidity)| {
                    let y = if max > 0.0 { height - liquidity / max * height } else { height };
                    (viewport.price_to_pixel(price), y)
                })
                .collect();
            points.sort_by(|a, b| a.0.total_cmp(&b.0));
            visible_window(points, width)
        }
        None => Vec::new(),
    };

    let lower_px = viewport.price_to_pixel(extent.lower);
    let upper_px = viewport.price_to_pixel(extent.upper);
    let selection = (upper_px >= 0.0 && lower_px <= width).then(|| (lower_px.max(0.0), upper_px.min(width)));

    let current_px = viewport.price_to_pixel(chart.current_price());
    let current_price_px = viewport.is_visible(current_px).then_some(current_px);

    let handle = |bound: Bound| {
        let visibility = controller.handle_visibility(bound, viewport);
        let label = controller.label(bound, chart.formatter(), chart.current_price());
        let label_rect = label_rect(&label, visibility, width, measure);
        HandleModel {
            bound,
            visibility,
            label,
            label_rect,
        }
    };

    RenderModel {
        width,
        height,
        status: chart.status(),
        transform: viewport.transform(),
        curve,
        selection,
        current_price_px,
        handles: [handle(Bound::Lower), handle(Bound::Upper)],
    }
}

/// Points inside `[0, width]` plus one neighbour on each side so the outline
/// reaches the chart edges
fn visible_window(points: Vec<(f64, f64)>, width: f64) -> Vec<(f64, f64)> {
    let start = points.partition_point(|p| p.0 < 0.0).saturating_sub(1);
    let end = (points.partition_point(|p| p.0 <= width) + 1).min(points.len());
    if start >= end {
        return Vec::new();
    }
    points[start..end].to_vec()
}

/// Label box centered over the handle and clamped inside the chart.
/// Offscreen handles pin their label to the edge they point at.
fn label_rect(text: &str, visibility: HandleVisibility, chart_width: f64, measure: &dyn TextMeasure) -> Rect {
    let (text_width, text_height) = measure.measure(text);
    let width = text_width + 2.0 * LABEL_PADDING;
    let max_x = (chart_width - width).max(0.0);

    let x = match visibility {
        HandleVisibility::Visible(px) => (px - width / 2.0).clamp(0.0, max_x),
        HandleVisibility::OffscreenWest => 0.0,
        HandleVisibility::OffscreenEast => max_x,
    };

    Rect {
        x,
        y: 0.0,
        width,
        height: text_height + 2.0 * LABEL_PADDING,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;
    use tickrange_types::{FeeTier, PoolSnapshot, RawTick};

    use crate::chart::StartingRange;
    use crate::config::ChartConfig;

    fn chart(ticks: Vec<RawTick>) -> LiquidityRangeChart {
        let snapshot = PoolSnapshot {
            pool_id: "render".to_string(),
            generation: 0,
            tick_current: 0,
            tick_spacing: 60,
            fee_tier: FeeTier::Medium,
            decimals0: 18,
            decimals1: 18,
            liquidity: BigUint::from(500u32),
            ticks,
        };
        LiquidityRangeChart::new(snapshot, ChartConfig::default(), false, StartingRange::Default).unwrap()
    }

    fn ticks() -> Vec<RawTick> {
        vec![
            RawTick::new(-4020, 200),
            RawTick::new(-600, 300),
            RawTick::new(600, -300),
            RawTick::new(4020, -200),
        ]
    }

    #[test]
    fn test_model_projects_selection_and_current_price() {
        let chart = chart(ticks());
        let model = render_model(&chart, 200.0, &MonospaceMeasure::default());

        assert_eq!(model.status, ChartStatus::Ready);
        let (left, right) = model.selection.unwrap();
        assert!(left > 0.0 && right < model.width && left < right);

        let current = model.current_price_px.unwrap();
        assert!(left < current && current < right);

        assert!(matches!(model.handles[0].visibility, HandleVisibility::Visible(_)));
        assert_eq!(model.handles[0].label, chart.labels().0);
    }

    #[test]
    fn test_curve_is_sorted_and_scaled_to_height() {
        let chart = chart(ticks());
        let model = render_model(&chart, 200.0, &MonospaceMeasure::default());

        assert!(!model.curve.is_empty());
        assert!(model.curve.windows(2).all(|w| w[0].0 <= w[1].0));
        assert!(model.curve.iter().all(|&(_, y)| (0.0..=200.0).contains(&y)));
        // tallest point touches the top
        assert!(model.curve.iter().any(|&(_, y)| y == 0.0));
    }

    #[test]
    fn test_no_liquidity_has_empty_curve() {
        let chart = chart(Vec::new());
        let model = render_model(&chart, 100.0, &MonospaceMeasure::default());
        assert_eq!(model.status, ChartStatus::NoLiquidityData);
        assert!(model.curve.is_empty());
        assert!(model.selection.is_some());
    }

    #[test]
    fn test_offscreen_labels_pin_to_edges() {
        let mut chart = chart(ticks());
        chart.controller_mut().set_full_range().unwrap();
        let model = render_model(&chart, 100.0, &MonospaceMeasure::default());

        let [lower, upper] = &model.handles;
        assert_eq!(lower.visibility, HandleVisibility::OffscreenWest);
        assert_eq!(lower.label, "0");
        assert_eq!(lower.label_rect.x, 0.0);

        assert_eq!(upper.visibility, HandleVisibility::OffscreenEast);
        assert_eq!(upper.label, "∞");
        assert_eq!(upper.label_rect.right(), model.width);
        assert_eq!(model.selection, Some((0.0, model.width)));
    }

    #[test]
    fn test_label_rect_stays_inside_chart() {
        let measure = MonospaceMeasure::default();
        let near_left = label_rect("+12.5%", HandleVisibility::Visible(2.0), 300.0, &measure);
        assert_eq!(near_left.x, 0.0);

        let near_right = label_rect("+12.5%", HandleVisibility::Visible(299.0), 300.0, &measure);
        assert_eq!(near_right.right(), 300.0);

        let centered = label_rect("1.5", HandleVisibility::Visible(150.0), 300.0, &measure);
        assert_eq!(centered.x + centered.width / 2.0, 150.0);
    }

    #[test]
    fn test_visible_window_keeps_edge_neighbours() {
        let points = vec![(-50.0, 1.0), (-10.0, 1.0), (10.0, 1.0), (90.0, 1.0), (120.0, 1.0), (300.0, 1.0)];
        let window = visible_window(points, 100.0);
        assert_eq!(window.first().unwrap().0, -10.0);
        assert_eq!(window.last().unwrap().0, 120.0);

        assert!(visible_window(vec![(-5.0, 1.0)], 100.0).len() == 1);
        assert!(visible_window(Vec::new(), 100.0).is_empty());
    }
}
