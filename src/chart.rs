use bon::Builder;
use comfy_table::presets::UTF8_NO_BORDERS;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use crate::engine::Distribution;

/// Presentation settings, built once and handed to a [`Chart`].
#[derive(Clone, Debug, PartialEq, Builder)]
pub struct ChartStyle {
    /// Width in characters of the longest bar.
    #[builder(default = 40)]
    pub bar_width: usize,
    #[builder(default = '#')]
    pub bar_char: char,
    /// Decimal places shown for each value.
    #[builder(default = 2)]
    pub precision: usize,
    /// Show values as percentages instead of raw probabilities.
    #[builder(default = true)]
    pub percent: bool,
    #[builder(default = true)]
    pub show_stats: bool,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Text histogram of a [`Distribution`].
#[derive(Clone, Debug, Default)]
pub struct Chart {
    style: ChartStyle,
}

impl Chart {
    #[must_use]
    pub fn new(style: ChartStyle) -> Self {
        Self { style }
    }

    #[must_use]
    pub fn style(&self) -> &ChartStyle {
        &self.style
    }

    #[must_use]
    pub fn render(&self, dist: &Distribution) -> String {
        let style = &self.style;
        let top = dist
            .y_axis_max
            .unwrap_or_else(|| dist.values.iter().copied().fold(0.0, f64::max));

        let mut table = Table::new();
        table
            .load_preset(UTF8_NO_BORDERS)
            .set_content_arrangement(ContentArrangement::Disabled)
            .set_header(vec![Cell::new("x"), Cell::new(dist.y_axis_label), Cell::new("")]);
        for (x, y) in dist.points() {
            table.add_row(vec![
                Cell::new(x).set_alignment(CellAlignment::Right),
                Cell::new(self.format_value(y)).set_alignment(CellAlignment::Right),
                Cell::new(self.bar(y, top)),
            ]);
        }

        let mut title = dist.label.clone();
        if style.show_stats {
            let stats = &dist.stats;
            title.push_str(&format!(" | mean {:.3}±{:.3}", stats.mean, stats.stddev));
        }
        format!("{title}\n\n{table}\n")
    }

    fn format_value(&self, y: f64) -> String {
        let precision = self.style.precision;
        if self.style.percent {
            format!("{:.precision$}%", y * 100.0)
        } else {
            format!("{y:.precision$}")
        }
    }

    fn bar(&self, y: f64, top: f64) -> String {
        if top <= 0.0 {
            return String::new();
        }
        let len = (y / top * self.style.bar_width as f64).round() as usize;
        std::iter::repeat(self.style.bar_char)
            .take(len.min(self.style.bar_width))
            .collect()
    }
}
