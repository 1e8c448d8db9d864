use polars::prelude::*;
use serde::{Deserialize, Serialize};
use syncstat_parser::schema::BLOCK_HEIGHT;

use crate::error::{PipelineError, Result};
use crate::frame::int_values;

/// Inclusive block-height bounds; an unset bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl HeightRange {
    pub fn new(start: Option<i64>, end: Option<i64>) -> Result<Self> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(PipelineError::Validation(format!(
                    "block height range start {start} is greater than end {end}"
                )));
            }
        }
        Ok(Self { start, end })
    }

    pub fn full() -> Self {
        Self::default()
    }

    pub fn is_full(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, height: i64) -> bool {
        self.start.map_or(true, |start| height >= start)
            && self.end.map_or(true, |end| height <= end)
    }

    /// Concrete bounds for naming output files: open ends take the extreme
    /// heights found in `df`.
    pub fn resolve(&self, df: &DataFrame) -> Result<Option<(i64, i64)>> {
        if self.is_full() {
            return Ok(None);
        }
        let (min, max) = height_bounds(df)?.unwrap_or((0, 0));
        Ok(Some((self.start.unwrap_or(min), self.end.unwrap_or(max))))
    }
}

pub fn filter_by_height(df: &DataFrame, range: &HeightRange) -> Result<DataFrame> {
    if range.is_full() {
        return Ok(df.clone());
    }
    HeightRange::new(range.start, range.end)?;

    let heights = int_values(df, BLOCK_HEIGHT)?.ok_or_else(|| {
        PipelineError::Validation(format!("cannot filter by height without a {BLOCK_HEIGHT} column"))
    })?;
    let mask: Vec<bool> = heights
        .iter()
        .map(|height| height.is_some_and(|h| range.contains(h)))
        .collect();
    let mask = BooleanChunked::from_slice("height_mask".into(), &mask);

    let filtered = df.filter(&mask)?;
    tracing::debug!(
        start = ?range.start,
        end = ?range.end,
        kept = filtered.height(),
        total = df.height(),
        "filtered by block height"
    );
    Ok(filtered)
}

pub fn height_bounds(df: &DataFrame) -> Result<Option<(i64, i64)>> {
    let Some(heights) = int_values(df, BLOCK_HEIGHT)? else {
        return Ok(None);
    };
    let mut present = heights.into_iter().flatten();
    let Some(first) = present.next() else {
        return Ok(None);
    };
    let bounds = present.fold((first, first), |(min, max), h| (min.min(h), max.max(h)));
    Ok(Some(bounds))
}
