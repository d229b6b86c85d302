//! Bar charts of complaint counts, drawn in the browser by ECharts.
//!
//! The chart options are generated with `charming` and serialised to the
//! ECharts option JSON. Each [ChartSurface] owns one drawing surface on a
//! page and renders the container plus the script that binds the chart to
//! it via `renderQuejasChart` in `/static/quejas.js`.

use charming::{
    Chart,
    component::{Axis, Grid, Title},
    element::{AxisType, Color, ColorStop, ItemStyle, Tooltip, Trigger},
    series::Bar,
};
use maud::{Markup, PreEscaped, html};

use crate::complaint::FrequencyTable;

/// The vertical gradient used to fill every bar, from the top of the bar
/// (offset 0) to its base (offset 1).
pub const BAR_GRADIENT: [(f64, &str); 3] = [(0.0, "#83bff6"), (0.5, "#188df0"), (1.0, "#188df0")];

/// Build a bar chart with one bar per entry of `table`, in table order.
pub fn frequency_bar_chart(title: &str, table: &FrequencyTable) -> Chart {
    let counts = table
        .counts()
        .into_iter()
        .map(|count| count as i64)
        .collect::<Vec<_>>();

    Chart::new()
        .title(Title::new().text(title).subtext(format!("Total: {}", table.total())))
        .tooltip(Tooltip::new().trigger(Trigger::Axis))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .top(70)
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(table.labels()))
        .y_axis(Axis::new().type_(AxisType::Value))
        .series(
            Bar::new()
                .name("Quejas")
                .item_style(ItemStyle::new().color(bar_gradient()))
                .data(counts),
        )
}

fn bar_gradient() -> Color {
    Color::LinearGradient {
        x: 0.0,
        y: 0.0,
        x2: 0.0,
        y2: 1.0,
        color_stops: BAR_GRADIENT
            .iter()
            .map(|(offset, colour)| ColorStop::new(*offset, *colour))
            .collect(),
    }
}

/// An owned handle to one chart container on a page.
///
/// [ChartSurface::replace] discards the previous chart before the new one is
/// attached, and the emitted script disposes any ECharts instance already
/// bound to the container, so re-rendering a surface never stacks charts.
pub struct ChartSurface {
    id: &'static str,
    title: String,
    chart: Option<Chart>,
}

impl ChartSurface {
    /// Create an empty surface for the element with `id`.
    pub fn new(id: &'static str, title: &str) -> Self {
        Self {
            id,
            title: title.to_owned(),
            chart: None,
        }
    }

    /// Draw `table` on this surface, replacing whatever was drawn before.
    pub fn replace(&mut self, table: &FrequencyTable) {
        self.chart.take();
        self.chart = Some(frequency_bar_chart(&self.title, table));
    }

    /// The ECharts option JSON of the current chart.
    pub fn options(&self) -> Option<String> {
        self.chart.as_ref().map(|chart| chart.to_string())
    }

    /// The chart container followed by the script that draws into it.
    pub fn markup(&self) -> Markup {
        let script = self.options().map(|options| {
            // Keep "</script>" in a label from closing the inline script.
            let options = options.replace("</", "<\\/");
            format!("renderQuejasChart(\"{}\", {options});", self.id)
        });

        html! {
            div
                id=(self.id)
                data-chart
                class="min-h-[320px] w-full rounded dark:bg-gray-100"
            {}

            @if let Some(script) = script {
                script { (PreEscaped(script)) }
            }
        }
    }
}
