use getset::{CopyGetters, Getters};
use serde::Serialize;
use serde_json::{json, Value};

use super::aggregate::MonthlyAggregate;
use super::timeline::OrderedTable;
use super::PipelineError;

pub const TIME_SERIES_TITLE: &str = "Serii temporale";
pub const MONTHLY_TITLE: &str = "Agregare lunară (sumă)";
pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    GroupedBar,
}

#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Series {
    name: String,
    values: Vec<Option<f64>>,
}

/// Everything a renderer needs: shared x values and one y series per column.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct ChartSpec {
    #[getset(get = "pub")]
    title: String,
    #[getset(get_copy = "pub")]
    kind: ChartKind,
    #[getset(get = "pub")]
    x_label: String,
    #[getset(get = "pub")]
    x: Vec<String>,
    #[getset(get = "pub")]
    series: Vec<Series>,
}

/// One Plotly trace as it appears in the figure's `data` array.
#[derive(Debug, Serialize)]
struct Trace<'a> {
    #[serde(rename = "type")]
    trace_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<&'static str>,
    name: &'a str,
    x: &'a [String],
    y: &'a [Option<f64>],
}

pub fn build_line_series(table: &OrderedTable, columns: &[String]) -> Result<ChartSpec, PipelineError> {
    let indices = table.selected_indices(columns)?;
    let style = table.timestamp_style();

    let series = columns
        .iter()
        .zip(indices)
        .map(|(name, index)| Series {
            name: name.clone(),
            values: table.numeric_values(index).collect(),
        })
        .collect();

    Ok(ChartSpec {
        title: TIME_SERIES_TITLE.to_string(),
        kind: ChartKind::Line,
        x_label: table.time_column().clone(),
        x: table.timestamps().iter().map(|timestamp| style.format(timestamp)).collect(),
        series,
    })
}

pub fn monthly_chart(aggregate: &MonthlyAggregate) -> ChartSpec {
    let series = aggregate
        .columns()
        .iter()
        .enumerate()
        .map(|(index, name)| Series {
            name: name.clone(),
            values: aggregate.column_sums(index).map(Some).collect(),
        })
        .collect();

    ChartSpec {
        title: MONTHLY_TITLE.to_string(),
        kind: ChartKind::GroupedBar,
        x_label: aggregate.time_column().clone(),
        x: aggregate.months().map(|month| month.to_string()).collect(),
        series,
    }
}

impl ChartSpec {
    /// Plotly figure, one trace per series.
    pub fn figure(&self) -> Value {
        let (trace_type, mode) = match self.kind {
            ChartKind::Line => ("scatter", Some("lines")),
            ChartKind::GroupedBar => ("bar", None),
        };
        let traces: Vec<Trace> = self
            .series
            .iter()
            .map(|series| Trace {
                trace_type,
                mode,
                name: &series.name,
                x: &self.x,
                y: &series.values,
            })
            .collect();

        let mut layout = json!({
            "title": { "text": self.title },
            "xaxis": { "title": { "text": self.x_label } },
            "yaxis": { "title": { "text": "value" } },
            "legend": { "title": { "text": "variable" } },
        });
        if self.kind == ChartKind::GroupedBar {
            layout["barmode"] = json!("group");
        }

        json!({ "data": traces, "layout": layout })
    }

    pub fn render_html(&self) -> Result<String, PipelineError> {
        // Keep the figure from closing the surrounding <script> element.
        let figure = serde_json::to_string(&self.figure())?.replace("</", "<\\/");

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{cdn}"></script>
</head>
<body>
<div id="chart" style="height:100%;width:100%;"></div>
<script>
var figure = {figure};
Plotly.newPlot("chart", figure.data, figure.layout, {{"responsive": true}});
</script>
</body>
</html>
"#,
            title = escape_html(&self.title),
            cdn = PLOTLY_CDN,
            figure = figure,
        ))
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
