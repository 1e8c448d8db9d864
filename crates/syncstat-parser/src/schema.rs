use serde::{Deserialize, Serialize};

pub const BLOCK_HEIGHT: &str = "Block_height";
pub const BLOCK_TIMESTAMP: &str = "Block_timestamp";
pub const CUMULATIVE_DIFFICULTY: &str = "Cumulative_difficulty";

pub const SYNC_IN_PROGRESS_TIME_S: &str = "Accumulated_sync_in_progress_time[s]";
pub const SYNC_IN_PROGRESS_TIME_MS: &str = "Accumulated_sync_in_progress_time[ms]";
pub const SYNC_TIME_MS: &str = "Accumulated_sync_time[ms]";

pub const ALL_TRANSACTION_COUNT: &str = "All_transaction_count";
pub const TRANSACTION_COUNT: &str = "Transaction_count";
pub const USER_TRANSACTION_COUNT: &str = "User_transaction_count";
pub const AT_COUNT: &str = "AT_count";

/// Columns whose values do not fit a 64-bit number and must stay textual.
pub const TEXT_COLUMNS: [&str; 1] = [CUMULATIVE_DIFFICULTY];

/// Older measurement logs call the total transaction counter `Transaction_count`.
pub const TRANSACTION_COUNT_ALIASES: [&str; 2] = [ALL_TRANSACTION_COUNT, TRANSACTION_COUNT];

/// Per-block processing stages reported by the measurement log, all in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageTiming {
    PushBlock,
    Validation,
    TxLoop,
    Housekeeping,
    TxApply,
    At,
    Subscription,
    BlockApply,
    Commit,
    Misc,
}

impl StageTiming {
    pub fn all() -> &'static [StageTiming] {
        use StageTiming::*;
        &[
            PushBlock,
            Validation,
            TxLoop,
            Housekeeping,
            TxApply,
            At,
            Subscription,
            BlockApply,
            Commit,
            Misc,
        ]
    }

    pub fn canonical_name(&self) -> &'static str {
        match self {
            StageTiming::PushBlock => "Push_block_time[ms]",
            StageTiming::Validation => "Validation_time[ms]",
            StageTiming::TxLoop => "Tx_loop_time[ms]",
            StageTiming::Housekeeping => "Housekeeping_time[ms]",
            StageTiming::TxApply => "Tx_apply_time[ms]",
            StageTiming::At => "AT_time[ms]",
            StageTiming::Subscription => "Subscription_time[ms]",
            StageTiming::BlockApply => "Block_apply_time[ms]",
            StageTiming::Commit => "Commit_time[ms]",
            StageTiming::Misc => "Misc_time[ms]",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StageTiming::PushBlock => "Push Block Time [ms]",
            StageTiming::Validation => "Validation Time [ms]",
            StageTiming::TxLoop => "TX Loop Time [ms]",
            StageTiming::Housekeeping => "Housekeeping Time [ms]",
            StageTiming::TxApply => "TX Apply Time [ms]",
            StageTiming::At => "AT Time [ms]",
            StageTiming::Subscription => "Subscription Time [ms]",
            StageTiming::BlockApply => "Block Apply Time [ms]",
            StageTiming::Commit => "Commit Time [ms]",
            StageTiming::Misc => "Misc Time [ms]",
        }
    }

    pub fn from_column(name: &str) -> Option<StageTiming> {
        let trimmed = name.trim();
        StageTiming::all()
            .iter()
            .copied()
            .find(|stage| stage.canonical_name() == trimmed)
    }
}
