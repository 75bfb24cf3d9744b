//! Curve Renderer
//!
//! Projects a curve (plus an optional live operating point) onto a 2D
//! plotting surface as a flat list of drawing commands. Pure: a render call
//! never mutates model state, so any front end (canvas, SVG, test harness)
//! can replay the commands.

use serde::{Deserialize, Serialize};

const AXIS_COLOR: &str = "#2c3e50";
const GRID_COLOR: &str = "#ecf0f1";
const CURVE_COLOR: &str = "#667eea";
const POINT_COLOR: &str = "#764ba2";
const LIVE_COLOR: &str = "#e74c3c";
const LIVE_RING_COLOR: &str = "rgba(231, 76, 60, 0.5)";
const LIVE_GUIDE_COLOR: &str = "rgba(231, 76, 60, 0.8)";
const LABEL_BG_COLOR: &str = "rgba(255, 255, 255, 0.9)";

/// Fixed-size plotting surface with a uniform inner padding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotArea {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Default for PlotArea {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 400.0,
            padding: 50.0,
        }
    }
}

impl PlotArea {
    fn inner_width(&self) -> f64 {
        self.width - 2.0 * self.padding
    }

    fn inner_height(&self) -> f64 {
        self.height - 2.0 * self.padding
    }
}

/// Horizontal text anchoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// One primitive draw operation. Colors are CSS color strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    Clear,
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        color: String,
        width: f64,
        dashed: bool,
    },
    PolyLine {
        points: Vec<(f64, f64)>,
        color: String,
        width: f64,
    },
    Circle {
        cx: f64,
        cy: f64,
        radius: f64,
        color: String,
        filled: bool,
        width: f64,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: String,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        color: String,
        align: TextAlign,
        bold: bool,
        rotated: bool,
    },
}

/// The device's live operating point, overlaid on the active map's curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveSample {
    pub rpm: u32,
    pub value: f64,
}

/// Everything one render call needs. Slices borrow from the caller's curve;
/// the renderer holds no state between calls (axis auto-scale is per draw).
#[derive(Debug, Clone)]
pub struct CurvePlot<'a> {
    pub keys: &'a [u32],
    pub values: &'a [f64],
    pub live: Option<LiveSample>,
    pub y_unit: &'a str,
    pub y_title: &'a str,
    pub x_title: &'a str,
}

fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{:.1}", v)
    }
}

/// Render a curve to drawing commands.
///
/// Axis extents come from the current curve only. A flat curve (zero value
/// span) and an all-zero key set are both clamped to a span of 1 so no
/// coordinate ever divides by zero. The live overlay is additive: it is
/// drawn only when `live` is present with a positive RPM, and it never
/// alters the curve's own scale, so an out-of-bounds live point may project
/// outside the plot area.
pub fn render(area: &PlotArea, plot: &CurvePlot<'_>) -> Vec<DrawCommand> {
    let mut cmds = vec![DrawCommand::Clear];

    let pad = area.padding;
    let inner_w = area.inner_width();
    let inner_h = area.inner_height();

    // Axes
    cmds.push(DrawCommand::Line {
        x1: pad,
        y1: pad,
        x2: pad,
        y2: area.height - pad,
        color: AXIS_COLOR.into(),
        width: 2.0,
        dashed: false,
    });
    cmds.push(DrawCommand::Line {
        x1: pad,
        y1: area.height - pad,
        x2: area.width - pad,
        y2: area.height - pad,
        color: AXIS_COLOR.into(),
        width: 2.0,
        dashed: false,
    });

    // Grid
    for i in 0..=10 {
        let y = pad + inner_h * i as f64 / 10.0;
        cmds.push(DrawCommand::Line {
            x1: pad,
            y1: y,
            x2: area.width - pad,
            y2: y,
            color: GRID_COLOR.into(),
            width: 1.0,
            dashed: false,
        });
    }

    // Axis titles
    cmds.push(DrawCommand::Text {
        x: 20.0,
        y: area.height / 2.0,
        text: plot.y_title.to_string(),
        color: AXIS_COLOR.into(),
        align: TextAlign::Center,
        bold: false,
        rotated: true,
    });
    cmds.push(DrawCommand::Text {
        x: area.width / 2.0,
        y: area.height - 10.0,
        text: plot.x_title.to_string(),
        color: AXIS_COLOR.into(),
        align: TextAlign::Center,
        bold: false,
        rotated: false,
    });

    if plot.keys.is_empty() || plot.values.is_empty() {
        return cmds;
    }

    let max_rpm = plot.keys.iter().copied().max().unwrap_or(0) as f64;
    let max_rpm = if max_rpm <= 0.0 { 1.0 } else { max_rpm };
    let max_v = plot.values.iter().copied().fold(f64::MIN, f64::max);
    let min_v = plot.values.iter().copied().fold(f64::MAX, f64::min);
    let span = max_v - min_v;
    // Flat curves would otherwise divide by zero
    let span = if span <= 0.0 { 1.0 } else { span };

    let project = |rpm: f64, value: f64| -> (f64, f64) {
        let x = pad + inner_w * rpm / max_rpm;
        let y = area.height - pad - inner_h * (value - min_v) / span;
        (x, y)
    };

    // Value-axis labels
    for i in 0..=5 {
        let y = area.height - pad - inner_h * i as f64 / 5.0;
        let value = min_v + (max_v - min_v) * i as f64 / 5.0;
        cmds.push(DrawCommand::Text {
            x: pad - 10.0,
            y: y + 5.0,
            text: format!("{}{}", fmt_value(value.round()), plot.y_unit),
            color: AXIS_COLOR.into(),
            align: TextAlign::Right,
            bold: false,
            rotated: false,
        });
    }

    // RPM-axis labels
    for i in 0..=5 {
        let x = pad + inner_w * i as f64 / 5.0;
        let value = (max_rpm * i as f64 / 5.0).round();
        cmds.push(DrawCommand::Text {
            x,
            y: area.height - pad + 20.0,
            text: fmt_value(value),
            color: AXIS_COLOR.into(),
            align: TextAlign::Center,
            bold: false,
            rotated: false,
        });
    }

    // Connecting line
    let line: Vec<(f64, f64)> = plot
        .keys
        .iter()
        .zip(plot.values.iter())
        .map(|(&rpm, &v)| project(rpm as f64, v))
        .collect();
    cmds.push(DrawCommand::PolyLine {
        points: line.clone(),
        color: CURVE_COLOR.into(),
        width: 3.0,
    });

    // Point markers
    for &(x, y) in &line {
        cmds.push(DrawCommand::Circle {
            cx: x,
            cy: y,
            radius: 4.0,
            color: POINT_COLOR.into(),
            filled: true,
            width: 1.0,
        });
    }

    // Live operating point
    if let Some(live) = plot.live {
        if live.rpm > 0 {
            let (lx, ly) = project(live.rpm as f64, live.value);

            cmds.push(DrawCommand::Circle {
                cx: lx,
                cy: ly,
                radius: 12.0,
                color: LIVE_RING_COLOR.into(),
                filled: false,
                width: 3.0,
            });
            cmds.push(DrawCommand::Circle {
                cx: lx,
                cy: ly,
                radius: 6.0,
                color: LIVE_COLOR.into(),
                filled: true,
                width: 1.0,
            });
            cmds.push(DrawCommand::Circle {
                cx: lx,
                cy: ly,
                radius: 2.0,
                color: "#ffffff".into(),
                filled: true,
                width: 1.0,
            });

            // Crosshair guides, broken around the marker
            let guides = [
                (pad, ly, lx - 15.0, ly),
                (lx + 15.0, ly, area.width - pad, ly),
                (lx, area.height - pad, lx, ly + 15.0),
                (lx, ly - 15.0, lx, pad),
            ];
            for (x1, y1, x2, y2) in guides {
                cmds.push(DrawCommand::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    color: LIVE_GUIDE_COLOR.into(),
                    width: 1.0,
                    dashed: true,
                });
            }

            let label = format!("{} RPM, {}{}", live.rpm, fmt_value(live.value), plot.y_unit);
            let label_x = lx + 15.0;
            let label_y = ly - 15.0;
            // No text metrics here; approximate the backing rect from glyph count
            let text_width = label.chars().count() as f64 * 7.0;
            cmds.push(DrawCommand::Rect {
                x: label_x - 2.0,
                y: label_y - 12.0,
                width: text_width + 4.0,
                height: 16.0,
                color: LABEL_BG_COLOR.into(),
            });
            cmds.push(DrawCommand::Text {
                x: label_x,
                y: label_y,
                text: label,
                color: LIVE_COLOR.into(),
                align: TextAlign::Left,
                bold: true,
                rotated: false,
            });
        }
    }

    cmds
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_coords(cmds: &[DrawCommand]) -> Vec<f64> {
        let mut out = Vec::new();
        for cmd in cmds {
            match cmd {
                DrawCommand::Clear => {}
                DrawCommand::Line { x1, y1, x2, y2, .. } => out.extend([*x1, *y1, *x2, *y2]),
                DrawCommand::PolyLine { points, .. } => {
                    for (x, y) in points {
                        out.extend([*x, *y]);
                    }
                }
                DrawCommand::Circle { cx, cy, radius, .. } => out.extend([*cx, *cy, *radius]),
                DrawCommand::Rect {
                    x,
                    y,
                    width,
                    height,
                    ..
                } => out.extend([*x, *y, *width, *height]),
                DrawCommand::Text { x, y, .. } => out.extend([*x, *y]),
            }
        }
        out
    }

    fn plot<'a>(keys: &'a [u32], values: &'a [f64], live: Option<LiveSample>) -> CurvePlot<'a> {
        CurvePlot {
            keys,
            values,
            live,
            y_unit: "°",
            y_title: "Advance (degrees)",
            x_title: "RPM",
        }
    }

    #[test]
    fn test_flat_curve_has_finite_coordinates() {
        let keys = [1000, 2000, 3000];
        let values = [10.0, 10.0, 10.0];
        let cmds = render(&PlotArea::default(), &plot(&keys, &values, None));
        assert!(all_coords(&cmds).iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_zero_rpm_curve_has_finite_coordinates() {
        let keys = [0, 0];
        let values = [5.0, 5.0];
        let cmds = render(&PlotArea::default(), &plot(&keys, &values, None));
        assert!(all_coords(&cmds).iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_empty_curve_renders_furniture_only() {
        let cmds = render(&PlotArea::default(), &plot(&[], &[], None));
        assert!(matches!(cmds[0], DrawCommand::Clear));
        assert!(!cmds
            .iter()
            .any(|c| matches!(c, DrawCommand::PolyLine { .. } | DrawCommand::Circle { .. })));
    }

    #[test]
    fn test_live_overlay_present_only_for_positive_rpm() {
        let keys = [0, 6000, 12000];
        let values = [5.0, 30.0, 32.0];

        let without = render(&PlotArea::default(), &plot(&keys, &values, None));
        let zero = render(
            &PlotArea::default(),
            &plot(&keys, &values, Some(LiveSample { rpm: 0, value: 5.0 })),
        );
        let with = render(
            &PlotArea::default(),
            &plot(
                &keys,
                &values,
                Some(LiveSample {
                    rpm: 7500,
                    value: 31.0,
                }),
            ),
        );

        assert_eq!(without.len(), zero.len());
        assert!(with.len() > without.len());
        assert!(with
            .iter()
            .any(|c| matches!(c, DrawCommand::Line { dashed: true, .. })));
        assert!(with
            .iter()
            .any(|c| matches!(c, DrawCommand::Text { bold: true, text, .. } if text.contains("7500 RPM"))));
    }

    #[test]
    fn test_overlay_does_not_rescale_curve() {
        let keys = [1000, 2000];
        let values = [10.0, 20.0];
        let plain = render(&PlotArea::default(), &plot(&keys, &values, None));
        // Live point far outside the curve's extent
        let overlaid = render(
            &PlotArea::default(),
            &plot(
                &keys,
                &values,
                Some(LiveSample {
                    rpm: 20_000,
                    value: 55.0,
                }),
            ),
        );
        let plain_line = plain
            .iter()
            .find(|c| matches!(c, DrawCommand::PolyLine { .. }));
        let overlaid_line = overlaid
            .iter()
            .find(|c| matches!(c, DrawCommand::PolyLine { .. }));
        assert_eq!(plain_line, overlaid_line);
    }
}
