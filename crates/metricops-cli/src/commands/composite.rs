use metricops::composite::series;

use super::Output;

/// Renders `s("metric", "source")`, optionally wrapped in one function.
pub fn run(metric: &str, source: &str, function: Option<&str>) -> metricops::Result<Output> {
    let expression = match function {
        Some(function) => series(metric, source).wrap(function)?,
        None => series(metric, source),
    };
    Ok(Output::Text(expression.to_string()))
}
