use std::fmt;

use polars::prelude::*;
use serde::{Serialize, Serializer};
use syncstat_parser::schema::{
    AT_COUNT, BLOCK_HEIGHT, TRANSACTION_COUNT_ALIASES, USER_TRANSACTION_COUNT,
};
use syncstat_parser::StageTiming;

use crate::config::PipelineConfig;
use crate::enrichment::{BLOCKS_PER_SECOND, SYNC_TIME_S};
use crate::error::Result;
use crate::format::{format_count, format_duration_total, format_fixed, NOT_AVAILABLE};
use crate::frame::{first_present, float_values, present};
use crate::stats::{describe, Distribution};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stat {
    Min,
    Q1,
    Mean,
    Median,
    Q3,
    Max,
    Std,
    Skew,
}

impl Stat {
    pub const DISTRIBUTION: [Stat; 8] = [
        Stat::Min,
        Stat::Q1,
        Stat::Mean,
        Stat::Median,
        Stat::Q3,
        Stat::Max,
        Stat::Std,
        Stat::Skew,
    ];

    pub const STAGE: [Stat; 5] = [Stat::Min, Stat::Max, Stat::Mean, Stat::Median, Stat::Std];

    pub fn label(&self) -> &'static str {
        match self {
            Stat::Min => "Min",
            Stat::Q1 => "Q1",
            Stat::Mean => "Mean",
            Stat::Median => "Median",
            Stat::Q3 => "Q3",
            Stat::Max => "Max",
            Stat::Std => "Std Dev",
            Stat::Skew => "Skewness",
        }
    }

    pub fn pick(&self, distribution: &Distribution) -> f64 {
        match self {
            Stat::Min => distribution.min,
            Stat::Q1 => distribution.q1,
            Stat::Mean => distribution.mean,
            Stat::Median => distribution.median,
            Stat::Q3 => distribution.q3,
            Stat::Max => distribution.max,
            Stat::Std => distribution.std,
            Stat::Skew => distribution.skew,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    All,
    User,
    System,
}

impl TransactionKind {
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::All => "Transactions per Block",
            TransactionKind::User => "User Transactions per Block",
            TransactionKind::System => "System Transactions per Block",
        }
    }
}

/// Identifies one summary row. Rendered (and serialized) as its table label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetricKey {
    TotalSyncTime,
    TotalBlocks,
    TotalTransactions,
    TotalUserTransactions,
    TotalSystemTransactions,
    TotalAts,
    AverageSpeed,
    Speed(Stat),
    TransactionsPerBlock(TransactionKind, Stat),
    Stage { column: String, stat: Stat },
}

impl MetricKey {
    pub fn is_time(&self) -> bool {
        matches!(self, MetricKey::TotalSyncTime)
    }

    pub fn is_count(&self) -> bool {
        matches!(
            self,
            MetricKey::TotalBlocks
                | MetricKey::TotalTransactions
                | MetricKey::TotalUserTransactions
                | MetricKey::TotalSystemTransactions
                | MetricKey::TotalAts
        )
    }

    /// Section heading the metric is listed under, if any.
    pub fn group(&self) -> Option<String> {
        match self {
            MetricKey::Speed(_) => Some("Sync Speed [Blocks/sec sample]".to_string()),
            MetricKey::TransactionsPerBlock(kind, _) => Some(kind.label().to_string()),
            MetricKey::Stage { column, .. } => Some(stage_label(column).to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKey::TotalSyncTime => f.write_str("Total Sync in Progress Time"),
            MetricKey::TotalBlocks => f.write_str("Total Blocks Synced"),
            MetricKey::TotalTransactions => f.write_str("Total Transactions"),
            MetricKey::TotalUserTransactions => f.write_str("Total User Transactions"),
            MetricKey::TotalSystemTransactions => f.write_str("Total System Transactions"),
            MetricKey::TotalAts => f.write_str("Total ATs Executed"),
            MetricKey::AverageSpeed => f.write_str("Overall Average Sync Speed [Blocks/sec]"),
            MetricKey::Speed(Stat::Std) => f.write_str("Std Dev of Sync Speed [Blocks/sec sample]"),
            MetricKey::Speed(Stat::Skew) => {
                f.write_str("Skewness of Sync Speed [Blocks/sec sample]")
            }
            MetricKey::Speed(stat) => write!(f, "{} Sync Speed [Blocks/sec sample]", stat.label()),
            MetricKey::TransactionsPerBlock(kind, stat) => {
                write!(f, "{} - {}", stat.label(), kind.label())
            }
            MetricKey::Stage { column, stat } => {
                write!(f, "{} - {}", stat.label(), stage_label(column))
            }
        }
    }
}

impl Serialize for MetricKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn stage_label(column: &str) -> &str {
    StageTiming::from_column(column)
        .map(|stage| stage.label())
        .unwrap_or(column)
}

/// A display string paired with the number it was rendered from. `raw` is
/// `None` when the value is not available.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricValue {
    pub display: String,
    pub raw: Option<f64>,
}

impl MetricValue {
    pub fn not_available() -> Self {
        Self {
            display: NOT_AVAILABLE.to_string(),
            raw: None,
        }
    }

    pub fn fixed(raw: f64) -> Self {
        Self {
            display: format_fixed(raw),
            raw: Some(raw),
        }
    }

    pub fn count(raw: i64) -> Self {
        Self {
            display: format_count(raw),
            raw: Some(raw as f64),
        }
    }

    pub fn duration(seconds: f64) -> Self {
        Self {
            display: format_duration_total(seconds),
            raw: Some(seconds),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryEntry {
    pub metric: MetricKey,
    #[serde(flatten)]
    pub value: MetricValue,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncSummary {
    pub rows: usize,
    pub entries: Vec<SummaryEntry>,
}

impl SyncSummary {
    pub fn get(&self, metric: &MetricKey) -> Option<&MetricValue> {
        self.entries
            .iter()
            .find(|entry| &entry.metric == metric)
            .map(|entry| &entry.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SummaryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, metric: MetricKey, value: MetricValue) {
        self.entries.push(SummaryEntry { metric, value });
    }
}

/// The metrics a frame is summarised into, in display order. Distribution
/// blocks for transactions and stages only appear when their columns exist.
pub fn metric_keys(df: &DataFrame, config: &PipelineConfig) -> Vec<MetricKey> {
    let has = |name: &str| df.get_column_index(name).is_some();
    let mut keys = vec![
        MetricKey::TotalSyncTime,
        MetricKey::TotalBlocks,
        MetricKey::TotalTransactions,
        MetricKey::TotalUserTransactions,
        MetricKey::TotalSystemTransactions,
        MetricKey::TotalAts,
        MetricKey::AverageSpeed,
    ];
    keys.extend(Stat::DISTRIBUTION.iter().map(|&stat| MetricKey::Speed(stat)));

    let has_all = first_present(df, &TRANSACTION_COUNT_ALIASES).is_some();
    let has_user = has(USER_TRANSACTION_COUNT);
    let kinds = [
        (TransactionKind::All, has_all),
        (TransactionKind::User, has_user),
        (TransactionKind::System, has_all && has_user),
    ];
    for (kind, available) in kinds {
        if available {
            keys.extend(
                Stat::DISTRIBUTION
                    .iter()
                    .map(|&stat| MetricKey::TransactionsPerBlock(kind, stat)),
            );
        }
    }

    for column in config.stage_columns.iter().filter(|column| has(column.as_str())) {
        keys.extend(Stat::STAGE.iter().map(|&stat| MetricKey::Stage {
            column: column.clone(),
            stat,
        }));
    }

    keys
}

/// Summarises an enriched frame. With fewer than two rows every metric is
/// `N/A`. Speed statistics skip the first row, whose speed has no predecessor.
pub fn summarize(df: &DataFrame, config: &PipelineConfig) -> Result<SyncSummary> {
    let keys = metric_keys(df, config);
    let mut summary = SyncSummary {
        rows: df.height(),
        entries: Vec::with_capacity(keys.len()),
    };

    if df.height() < 2 {
        for key in keys {
            summary.push(key, MetricValue::not_available());
        }
        return Ok(summary);
    }

    let totals = Totals::from_frame(df)?;

    let speed = float_values(df, BLOCKS_PER_SECOND)?
        .map(|values| describe(&present(&values[1..])))
        .unwrap_or_default();

    let tx_all = match first_present(df, &TRANSACTION_COUNT_ALIASES) {
        Some(column) => float_values(df, column)?,
        None => None,
    };
    let tx_user = float_values(df, USER_TRANSACTION_COUNT)?;
    let tx_system = match (&tx_all, &tx_user) {
        (Some(all), Some(user)) => Some(
            all.iter()
                .zip(user.iter())
                .map(|(a, u)| match (a, u) {
                    (Some(a), Some(u)) => Some(a - u),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        ),
        _ => None,
    };
    let describe_opt =
        |values: &Option<Vec<Option<f64>>>| values.as_deref().map(present).map(|v| describe(&v));
    let tx_all = describe_opt(&tx_all);
    let tx_user = describe_opt(&tx_user);
    let tx_system = describe_opt(&tx_system);

    for key in keys {
        let value = match &key {
            MetricKey::TotalSyncTime => MetricValue::duration(totals.sync_seconds),
            MetricKey::TotalBlocks => MetricValue::count(totals.blocks),
            MetricKey::TotalTransactions => MetricValue::count(totals.transactions),
            MetricKey::TotalUserTransactions => MetricValue::count(totals.user_transactions),
            MetricKey::TotalSystemTransactions => {
                MetricValue::count(totals.transactions - totals.user_transactions)
            }
            MetricKey::TotalAts => MetricValue::count(totals.ats),
            MetricKey::AverageSpeed => MetricValue::fixed(totals.average_speed()),
            MetricKey::Speed(stat) => MetricValue::fixed(stat.pick(&speed)),
            MetricKey::TransactionsPerBlock(kind, stat) => {
                let distribution = match kind {
                    TransactionKind::All => tx_all,
                    TransactionKind::User => tx_user,
                    TransactionKind::System => tx_system,
                };
                MetricValue::fixed(stat.pick(&distribution.unwrap_or_default()))
            }
            MetricKey::Stage { column, stat } => {
                let values = float_values(df, column)?.unwrap_or_default();
                MetricValue::fixed(stat.pick(&describe(&present(&values))))
            }
        };
        summary.push(key, value);
    }

    Ok(summary)
}

struct Totals {
    sync_seconds: f64,
    blocks: i64,
    transactions: i64,
    user_transactions: i64,
    ats: i64,
}

impl Totals {
    fn from_frame(df: &DataFrame) -> Result<Self> {
        let sync_seconds = span(float_values(df, SYNC_TIME_S)?.as_deref()).unwrap_or(0.0);
        let blocks = span(float_values(df, BLOCK_HEIGHT)?.as_deref()).unwrap_or(0.0) as i64;

        let transactions = match first_present(df, &TRANSACTION_COUNT_ALIASES) {
            Some(column) => column_sum(df, column)?,
            None => 0,
        };

        Ok(Self {
            sync_seconds,
            blocks,
            transactions,
            user_transactions: column_sum(df, USER_TRANSACTION_COUNT)?,
            ats: column_sum(df, AT_COUNT)?,
        })
    }

    fn average_speed(&self) -> f64 {
        if self.sync_seconds > 0.0 {
            self.blocks as f64 / self.sync_seconds
        } else {
            0.0
        }
    }
}

/// Last present value minus first present value.
fn span(values: Option<&[Option<f64>]>) -> Option<f64> {
    let values = values?;
    let first = values.iter().flatten().next()?;
    let last = values.iter().rev().flatten().next()?;
    Some(last - first)
}

fn column_sum(df: &DataFrame, column: &str) -> Result<i64> {
    let Some(values) = float_values(df, column)? else {
        return Ok(0);
    };
    Ok(values.iter().flatten().sum::<f64>().round() as i64)
}
