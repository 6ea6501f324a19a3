// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::{
    f64::consts::PI,
    fs,
    path::{Path, PathBuf},
};

use hex_color::HexColor;
use log::debug;

use crate::config::{css_color, ReportColors};
use crate::errors::MutscanError;
use crate::mutation::{MutationRecord, MutationType};
use crate::report::summary::{position_counts, sample_counts_desc, type_counts};

pub const MUTATIONS_PER_SAMPLE: &str = "mutations_per_sample.svg";
pub const MUTATION_TYPES: &str = "mutation_types.svg";
pub const MUTATION_POSITIONS: &str = "mutation_positions.svg";

const FONT_SIZE: u32 = 14;
const TITLE_FONT_SIZE: u32 = 18;

// Plot area margins, in px.
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 120.0;

struct Svg {
    out: String,
}

impl Svg {
    fn new(width: u32, height: u32) -> Self {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">\n",
            width, height, width, height
        ));
        out.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
        out.push_str(&format!(
            "<g font-family=\"sans-serif\" font-size=\"{}\">\n",
            FONT_SIZE
        ));
        Svg { out }
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str) {
        self.out.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"/>\n",
            x, y, w, h, fill
        ));
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.out.push_str(&format!(
            "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"black\"/>\n",
            x1, y1, x2, y2
        ));
    }

    fn text(&mut self, x: f64, y: f64, anchor: &str, s: &str) {
        self.out.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"{}\">{}</text>\n",
            x,
            y,
            anchor,
            escape_svg(s)
        ));
    }

    fn rotated_text(&mut self, x: f64, y: f64, angle: f64, anchor: &str, s: &str) {
        self.out.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"{}\" transform=\"rotate({} {:.2} {:.2})\">{}</text>\n",
            x,
            y,
            anchor,
            angle,
            x,
            y,
            escape_svg(s)
        ));
    }

    fn title(&mut self, x: f64, y: f64, s: &str) {
        self.out.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-size=\"{}\" font-weight=\"bold\">{}</text>\n",
            x,
            y,
            TITLE_FONT_SIZE,
            escape_svg(s)
        ));
    }

    fn path(&mut self, d: &str, fill: &str) {
        self.out.push_str(&format!(
            "<path d=\"{}\" fill=\"{}\" stroke=\"white\"/>\n",
            d, fill
        ));
    }

    fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: &str) {
        self.out.push_str(&format!(
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\"/>\n",
            cx, cy, r, fill
        ));
    }

    fn finish(mut self) -> String {
        self.out.push_str("</g>\n</svg>\n");
        self.out
    }
}

fn escape_svg(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Integer tick step giving at most about ten ticks up to `max`.
pub fn tick_step(max: usize) -> usize {
    let mut step = 1;
    loop {
        for mult in [1, 2, 5] {
            if max / (step * mult) <= 10 {
                return step * mult;
            }
        }
        step *= 10;
    }
}

// Axes, y ticks and y label for a bar-type plot. Returns (x0, y0, plot width, plot height),
// with y0 at the bottom of the plot area.
fn draw_axes(
    svg: &mut Svg,
    width: u32,
    height: u32,
    y_max: usize,
    x_label: &str,
    y_label: &str,
) -> (f64, f64, f64, f64) {
    let x0 = MARGIN_LEFT;
    let y0 = f64::from(height) - MARGIN_BOTTOM;
    let plot_w = f64::from(width) - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = y0 - MARGIN_TOP;
    svg.line(x0, y0, x0 + plot_w, y0);
    svg.line(x0, y0, x0, MARGIN_TOP);

    let step = tick_step(y_max);
    let top = y_max.div_ceil(step).max(1) * step;
    let mut tick = 0;
    while tick <= top {
        let y = y0 - plot_h * tick as f64 / top as f64;
        svg.line(x0 - 5.0, y, x0, y);
        svg.text(x0 - 8.0, y + 4.0, "end", &tick.to_string());
        tick += step;
    }

    svg.text(x0 + plot_w / 2.0, f64::from(height) - 15.0, "middle", x_label);
    svg.rotated_text(20.0, MARGIN_TOP + plot_h / 2.0, -90.0, "middle", y_label);
    (x0, y0, plot_w, plot_h)
}

fn y_scale(y_max: usize) -> f64 {
    let step = tick_step(y_max);
    (y_max.div_ceil(step).max(1) * step) as f64
}

/// Bar chart of mutation counts per sample.
pub fn mutations_per_sample_svg(counts: &[(String, usize)], color: HexColor) -> String {
    let fill = css_color(color);
    let (width, height) = (1000, 600);
    let mut svg = Svg::new(width, height);
    svg.title(f64::from(width) / 2.0, 30.0, "Mutations per Sample");
    let y_max = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
    let (x0, y0, plot_w, plot_h) = draw_axes(
        &mut svg,
        width,
        height,
        y_max,
        "Sample",
        "Number of Mutations",
    );
    let top = y_scale(y_max);
    let slot = plot_w / counts.len().max(1) as f64;
    for (i, (sample, n)) in counts.iter().enumerate() {
        let bar_w = slot * 0.5;
        let x = x0 + slot * i as f64 + (slot - bar_w) / 2.0;
        let h = plot_h * *n as f64 / top;
        svg.rect(x, y0 - h, bar_w, h, &fill);
        svg.rotated_text(x + bar_w / 2.0, y0 + 15.0, -45.0, "end", sample);
    }
    svg.finish()
}

fn slice_color(kind: MutationType, colors: &ReportColors) -> HexColor {
    match kind {
        MutationType::Silent => colors.silent,
        MutationType::Missense => colors.missense,
    }
}

/// Share of each type, in percent.
pub fn type_percentages(counts: &[(MutationType, usize)]) -> Vec<(MutationType, f64)> {
    let total: usize = counts.iter().map(|(_, n)| n).sum();
    counts
        .iter()
        .map(|&(kind, n)| {
            let pct = if total == 0 {
                0.0
            } else {
                100.0 * n as f64 / total as f64
            };
            (kind, pct)
        })
        .collect()
}

/// Pie chart of silent vs missense mutations.
pub fn mutation_types_svg(counts: &[(MutationType, usize)], colors: &ReportColors) -> String {
    let (width, height) = (800, 800);
    let mut svg = Svg::new(width, height);
    svg.title(f64::from(width) / 2.0, 40.0, "Distribution of Mutation Types");
    let (cx, cy, r) = (400.0, 420.0, 280.0);

    let slices: Vec<(MutationType, f64)> = type_percentages(counts)
        .into_iter()
        .filter(|(_, pct)| *pct > 0.0)
        .collect();
    // Start at 12 o'clock, run counter-clockwise.
    let mut angle = PI / 2.0;
    for (kind, pct) in &slices {
        let fill = css_color(slice_color(*kind, colors));
        let sweep = 2.0 * PI * pct / 100.0;
        if slices.len() == 1 {
            svg.circle(cx, cy, r, &fill);
        } else {
            let (x1, y1) = (cx + r * angle.cos(), cy - r * angle.sin());
            let end = angle + sweep;
            let (x2, y2) = (cx + r * end.cos(), cy - r * end.sin());
            let large_arc = if sweep > PI { 1 } else { 0 };
            let d = format!(
                "M {:.2} {:.2} L {:.2} {:.2} A {:.2} {:.2} 0 {} 0 {:.2} {:.2} Z",
                cx, cy, x1, y1, r, r, large_arc, x2, y2
            );
            svg.path(&d, &fill);
        }
        let mid = angle + sweep / 2.0;
        svg.text(
            cx + 0.6 * r * mid.cos(),
            cy - 0.6 * r * mid.sin(),
            "middle",
            &format!("{:.1}%", pct),
        );
        svg.text(
            cx + 1.1 * r * mid.cos(),
            cy - 1.1 * r * mid.sin(),
            "middle",
            &kind.to_string(),
        );
        angle += sweep;
    }
    svg.finish()
}

/// Histogram of mutations along the reference.
pub fn mutation_positions_svg(counts: &[(usize, usize)], color: HexColor) -> String {
    let (width, height) = (1200, 600);
    let mut svg = Svg::new(width, height);
    svg.title(
        f64::from(width) / 2.0,
        30.0,
        "Distribution of Mutations Along the Sequence",
    );
    let y_max = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
    let (x0, y0, plot_w, plot_h) = draw_axes(
        &mut svg,
        width,
        height,
        y_max,
        "Nucleotide Position",
        "Number of Mutations",
    );
    let top = y_scale(y_max);
    let first = counts.first().map(|(p, _)| *p).unwrap_or(0);
    let last = counts.last().map(|(p, _)| *p).unwrap_or(0);
    // Half a position of padding on either side.
    let span = (last - first) as f64 + 1.0;
    let unit = plot_w / span;
    let fill = css_color(color);
    for &(pos, n) in counts {
        let x = x0 + unit * ((pos - first) as f64 + 0.25);
        let h = plot_h * n as f64 / top;
        svg.rect(x, y0 - h, unit * 0.5, h, &fill);
    }
    for pos in [first, last] {
        if !counts.is_empty() {
            let x = x0 + unit * ((pos - first) as f64 + 0.5);
            svg.line(x, y0, x, y0 + 5.0);
            svg.text(x, y0 + 20.0, "middle", &pos.to_string());
        }
    }
    svg.finish()
}

/// Writes the three plots into `dir`, creating it if needed. Nothing is drawn for an empty table.
pub fn write_plots(
    dir: &Path,
    records: &[MutationRecord],
    colors: &ReportColors,
) -> Result<Vec<PathBuf>, MutscanError> {
    fs::create_dir_all(dir)?;
    if records.is_empty() {
        println!("No mutations to plot.");
        return Ok(Vec::new());
    }
    let plots = [
        (
            MUTATIONS_PER_SAMPLE,
            mutations_per_sample_svg(&sample_counts_desc(records), colors.bars),
        ),
        (
            MUTATION_TYPES,
            mutation_types_svg(&type_counts(records), colors),
        ),
        (
            MUTATION_POSITIONS,
            mutation_positions_svg(&position_counts(records), colors.positions),
        ),
    ];
    let mut written = Vec::with_capacity(plots.len());
    for (name, svg) in plots {
        let path = dir.join(name);
        fs::write(&path, svg)?;
        debug!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}
