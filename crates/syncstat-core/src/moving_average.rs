use polars::prelude::*;

use crate::config::MovingAverageWindow;
use crate::error::Result;
use crate::frame::float_values;

pub const MOVING_AVERAGE_SUFFIX: &str = "_moving_average";

pub fn moving_average_column(column: &str) -> String {
    format!("{column}{MOVING_AVERAGE_SUFFIX}")
}

/// Trailing mean over at most `window` samples. Partial windows at the start
/// are averaged over what is available; nulls are skipped, and a window with
/// no values at all yields null. Each window is summed afresh so a large value
/// leaving the window cannot cancel the small ones still in it.
pub fn trailing_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    (0..values.len())
        .map(|idx| {
            let start = (idx + 1).saturating_sub(window);
            let (sum, count) = values[start..=idx]
                .iter()
                .flatten()
                .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
            (count > 0).then(|| sum / count as f64)
        })
        .collect()
}

pub fn add_moving_averages(
    df: &DataFrame,
    columns: &[&str],
    window: MovingAverageWindow,
) -> Result<DataFrame> {
    let mut output = df.clone();
    for column in columns {
        let Some(values) = float_values(df, column)? else {
            tracing::debug!(column = *column, "skipping moving average for absent column");
            continue;
        };
        let averaged = trailing_mean(&values, window.size());
        output.with_column(Series::new(moving_average_column(column).into(), averaged))?;
    }
    Ok(output)
}
