//! Postgres backend.
//!
//! GLW-wei and points values exceed `BIGINT`, so amounts are stored as decimal
//! text. Leaderboard rows keep their full JSON next to the indexed columns.

use crate::{SnapshotStore, StorageError};
use async_trait::async_trait;
use glow_primitives::WeekRange;
use glow_scoring::{
    BalanceSnapshotStore, PurchaseSource, SourceError, SteeringSnapshotCache, WalletUniverseSource,
};
use glow_types::{
    BalanceSnapshot, DelegatorRow, DelegatorsSnapshot, FarmId, FarmPrincipal,
    ImpactLeaderboardSnapshot, LeaderboardRow, PurchaseKind, PurchaseRecord, RefundRecord,
    RegionRewardSnapshot, RegionTotalsRow, WalletAddress, WalletRegionStake, Week,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, QueryBuilder};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Rows per bulk insert statement.
pub const INSERT_CHUNK_ROWS: usize = 500;

/// Rank of the region totals system row.
const SYSTEM_ROW_RANK: i64 = -1;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS impact_leaderboard_cache (
        wallet_address TEXT PRIMARY KEY,
        rank BIGINT NOT NULL,
        start_week BIGINT NOT NULL,
        end_week BIGINT NOT NULL,
        total_points TEXT NOT NULL,
        glow_worth_wei TEXT NOT NULL,
        last_week_points TEXT NOT NULL,
        data TEXT NOT NULL,
        computed_at BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS delegators_leaderboard_cache (
        wallet_address TEXT PRIMARY KEY,
        rank BIGINT NOT NULL,
        start_week BIGINT NOT NULL,
        end_week BIGINT NOT NULL,
        actively_delegated_glw_wei TEXT NOT NULL,
        data TEXT NOT NULL,
        computed_at BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS region_reward_snapshots (
        week BIGINT NOT NULL,
        region_id BIGINT NOT NULL,
        gctl_staked TEXT NOT NULL,
        glw_reward_wei TEXT NOT NULL,
        PRIMARY KEY (week, region_id)
    )",
    "CREATE TABLE IF NOT EXISTS region_reward_sync (
        week BIGINT PRIMARY KEY
    )",
    "CREATE TABLE IF NOT EXISTS wallet_stake_snapshots (
        wallet_address TEXT NOT NULL,
        week BIGINT NOT NULL,
        region_id BIGINT NOT NULL,
        wallet_staked TEXT NOT NULL,
        PRIMARY KEY (wallet_address, week, region_id)
    )",
    "CREATE TABLE IF NOT EXISTS wallet_stake_sync (
        wallet_address TEXT NOT NULL,
        week BIGINT NOT NULL,
        PRIMARY KEY (wallet_address, week)
    )",
    "CREATE TABLE IF NOT EXISTS wallet_balance_snapshots (
        wallet_address TEXT NOT NULL,
        week BIGINT NOT NULL,
        balance_wei TEXT NOT NULL,
        forward_filled BOOLEAN NOT NULL,
        PRIMARY KEY (wallet_address, week)
    )",
    "CREATE TABLE IF NOT EXISTS fraction_purchases (
        id BIGSERIAL PRIMARY KEY,
        wallet_address TEXT NOT NULL,
        kind TEXT NOT NULL,
        amount_glw_wei TEXT NOT NULL,
        timestamp BIGINT NOT NULL,
        refunded_at BIGINT
    )",
    "CREATE TABLE IF NOT EXISTS farm_principals (
        farm_id TEXT PRIMARY KEY,
        region_id BIGINT,
        principal_glw_wei TEXT NOT NULL
    )",
];

#[derive(Debug, FromRow)]
struct DataRecord {
    rank: i64,
    data: String,
    computed_at: i64,
}

#[derive(Debug, FromRow)]
struct RegionRewardRecord {
    week: i64,
    region_id: i64,
    gctl_staked: String,
    glw_reward_wei: String,
}

#[derive(Debug, FromRow)]
struct WalletStakeRecord {
    week: i64,
    region_id: i64,
    wallet_staked: String,
}

#[derive(Debug, FromRow)]
struct BalanceRecord {
    week: i64,
    balance_wei: String,
    forward_filled: bool,
}

#[derive(Debug, FromRow)]
struct PurchaseRecordRow {
    wallet_address: String,
    kind: String,
    amount_glw_wei: String,
    timestamp: i64,
}

#[derive(Debug, FromRow)]
struct PrincipalRecord {
    farm_id: String,
    region_id: Option<i64>,
    principal_glw_wei: String,
}

fn parse_amount(column: &'static str, value: &str) -> Result<u128, StorageError> {
    value.parse().map_err(|_| StorageError::InvalidValue {
        column,
        value: value.to_string(),
    })
}

fn to_u32(column: &'static str, value: i64) -> Result<u32, StorageError> {
    u32::try_from(value).map_err(|_| StorageError::InvalidValue {
        column,
        value: value.to_string(),
    })
}

fn to_u64(column: &'static str, value: i64) -> Result<u64, StorageError> {
    u64::try_from(value).map_err(|_| StorageError::InvalidValue {
        column,
        value: value.to_string(),
    })
}

fn timestamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn parse_wallet(value: &str) -> Result<WalletAddress, StorageError> {
    WalletAddress::parse(value).map_err(|_| StorageError::InvalidValue {
        column: "wallet_address",
        value: value.to_string(),
    })
}

pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates missing tables.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!(tables = SCHEMA.len(), "storage schema ready");
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for PostgresBackend {
    async fn replace_impact_leaderboard(
        &self,
        snapshot: &ImpactLeaderboardSnapshot,
    ) -> Result<(), StorageError> {
        let start = i64::from(snapshot.week_range.start_week);
        let end = i64::from(snapshot.week_range.end_week);
        let computed_at = timestamp_i64(snapshot.computed_at);

        let mut records: Vec<(String, i64, String, String, String, String)> =
            Vec::with_capacity(snapshot.rows.len() + 1);
        records.push((
            WalletAddress::zero().to_string(),
            SYSTEM_ROW_RANK,
            "0".to_string(),
            "0".to_string(),
            "0".to_string(),
            serde_json::to_string(&snapshot.region_totals)?,
        ));
        for row in &snapshot.rows {
            records.push((
                row.wallet_address.to_string(),
                i64::from(row.rank),
                row.total_points.to_string(),
                row.glow_worth_wei.to_string(),
                row.last_week_points.to_string(),
                serde_json::to_string(row)?,
            ));
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM impact_leaderboard_cache")
            .execute(&mut *tx)
            .await?;
        for chunk in records.chunks(INSERT_CHUNK_ROWS) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO impact_leaderboard_cache (wallet_address, rank, start_week, end_week, \
                 total_points, glow_worth_wei, last_week_points, data, computed_at) ",
            );
            builder.push_values(chunk, |mut b, (wallet, rank, total, worth, last, data)| {
                b.push_bind(wallet.clone())
                    .push_bind(*rank)
                    .push_bind(start)
                    .push_bind(end)
                    .push_bind(total.clone())
                    .push_bind(worth.clone())
                    .push_bind(last.clone())
                    .push_bind(data.clone())
                    .push_bind(computed_at);
            });
            builder.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;

        debug!(rows = snapshot.rows.len(), "impact leaderboard replaced");
        Ok(())
    }

    async fn impact_leaderboard(&self) -> Result<Option<ImpactLeaderboardSnapshot>, StorageError> {
        let records: Vec<DataRecord> = sqlx::query_as(
            "SELECT rank, data, computed_at FROM impact_leaderboard_cache ORDER BY rank ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut region_totals = None;
        let mut rows = Vec::with_capacity(records.len());
        let mut computed_at = 0;
        for record in records {
            computed_at = to_u64("computed_at", record.computed_at)?;
            if record.rank == SYSTEM_ROW_RANK {
                region_totals = Some(serde_json::from_str::<RegionTotalsRow>(&record.data)?);
            } else {
                rows.push(serde_json::from_str::<LeaderboardRow>(&record.data)?);
            }
        }

        let Some(region_totals) = region_totals else {
            return Ok(None);
        };
        let week_range = match rows.first() {
            Some(row) => row.week_range,
            None => {
                let (start, end): (i64, i64) = sqlx::query_as(
                    "SELECT start_week, end_week FROM impact_leaderboard_cache WHERE rank = $1",
                )
                .bind(SYSTEM_ROW_RANK)
                .fetch_one(&self.pool)
                .await?;
                WeekRange {
                    start_week: to_u32("start_week", start)?,
                    end_week: to_u32("end_week", end)?,
                }
            }
        };

        Ok(Some(ImpactLeaderboardSnapshot {
            week_range,
            rows,
            region_totals,
            computed_at,
        }))
    }

    async fn replace_delegators_leaderboard(
        &self,
        snapshot: &DelegatorsSnapshot,
    ) -> Result<(), StorageError> {
        let start = i64::from(snapshot.week_range.start_week);
        let end = i64::from(snapshot.week_range.end_week);
        let computed_at = timestamp_i64(snapshot.computed_at);

        let mut records = Vec::with_capacity(snapshot.rows.len());
        for row in &snapshot.rows {
            records.push((
                row.wallet_address.to_string(),
                i64::from(row.rank),
                row.actively_delegated_glw_wei.to_string(),
                serde_json::to_string(row)?,
            ));
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM delegators_leaderboard_cache")
            .execute(&mut *tx)
            .await?;
        for chunk in records.chunks(INSERT_CHUNK_ROWS) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO delegators_leaderboard_cache (wallet_address, rank, start_week, \
                 end_week, actively_delegated_glw_wei, data, computed_at) ",
            );
            builder.push_values(chunk, |mut b, (wallet, rank, delegated, data)| {
                b.push_bind(wallet.clone())
                    .push_bind(*rank)
                    .push_bind(start)
                    .push_bind(end)
                    .push_bind(delegated.clone())
                    .push_bind(data.clone())
                    .push_bind(computed_at);
            });
            builder.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;

        debug!(rows = snapshot.rows.len(), "delegators leaderboard replaced");
        Ok(())
    }

    async fn delegators_leaderboard(&self) -> Result<Option<DelegatorsSnapshot>, StorageError> {
        let records: Vec<DataRecord> = sqlx::query_as(
            "SELECT rank, data, computed_at FROM delegators_leaderboard_cache ORDER BY rank ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let Some(first) = records.first() else {
            return Ok(None);
        };
        let computed_at = to_u64("computed_at", first.computed_at)?;
        let rows = records
            .iter()
            .map(|record| serde_json::from_str::<DelegatorRow>(&record.data))
            .collect::<Result<Vec<_>, _>>()?;
        let Some(week_range) = rows.first().map(|row| row.week_range) else {
            return Ok(None);
        };

        Ok(Some(DelegatorsSnapshot {
            week_range,
            rows,
            computed_at,
        }))
    }
}

impl PostgresBackend {
    async fn region_rewards_inner(
        &self,
        range: WeekRange,
    ) -> Result<BTreeMap<Week, Vec<RegionRewardSnapshot>>, StorageError> {
        let start = i64::from(range.start_week);
        let end = i64::from(range.end_week);

        let synced: Vec<(i64,)> =
            sqlx::query_as("SELECT week FROM region_reward_sync WHERE week BETWEEN $1 AND $2")
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await?;
        let mut out: BTreeMap<Week, Vec<RegionRewardSnapshot>> = BTreeMap::new();
        for (week,) in synced {
            out.insert(to_u32("week", week)?, Vec::new());
        }

        let records: Vec<RegionRewardRecord> = sqlx::query_as(
            "SELECT week, region_id, gctl_staked, glw_reward_wei FROM region_reward_snapshots \
             WHERE week BETWEEN $1 AND $2 ORDER BY week, region_id",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        for record in records {
            let week = to_u32("week", record.week)?;
            out.entry(week).or_default().push(RegionRewardSnapshot {
                week,
                region_id: to_u32("region_id", record.region_id)?,
                gctl_staked: parse_amount("gctl_staked", &record.gctl_staked)?,
                glw_reward_wei: parse_amount("glw_reward_wei", &record.glw_reward_wei)?,
            });
        }
        Ok(out)
    }

    async fn store_region_rewards_inner(
        &self,
        week: Week,
        rows: &[RegionRewardSnapshot],
    ) -> Result<(), StorageError> {
        let week = i64::from(week);
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM region_reward_snapshots WHERE week = $1")
            .bind(week)
            .execute(&mut *tx)
            .await?;
        if !rows.is_empty() {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO region_reward_snapshots (week, region_id, gctl_staked, glw_reward_wei) ",
            );
            builder.push_values(rows, |mut b, row| {
                b.push_bind(week)
                    .push_bind(i64::from(row.region_id))
                    .push_bind(row.gctl_staked.to_string())
                    .push_bind(row.glw_reward_wei.to_string());
            });
            builder.build().execute(&mut *tx).await?;
        }
        sqlx::query("INSERT INTO region_reward_sync (week) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(week)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn wallet_stakes_inner(
        &self,
        wallet: &WalletAddress,
        range: WeekRange,
    ) -> Result<BTreeMap<Week, Vec<WalletRegionStake>>, StorageError> {
        let start = i64::from(range.start_week);
        let end = i64::from(range.end_week);

        let synced: Vec<(i64,)> = sqlx::query_as(
            "SELECT week FROM wallet_stake_sync WHERE wallet_address = $1 AND week BETWEEN $2 AND $3",
        )
        .bind(wallet.as_str())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        let mut out: BTreeMap<Week, Vec<WalletRegionStake>> = BTreeMap::new();
        for (week,) in synced {
            out.insert(to_u32("week", week)?, Vec::new());
        }

        let records: Vec<WalletStakeRecord> = sqlx::query_as(
            "SELECT week, region_id, wallet_staked FROM wallet_stake_snapshots \
             WHERE wallet_address = $1 AND week BETWEEN $2 AND $3 ORDER BY week, region_id",
        )
        .bind(wallet.as_str())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        for record in records {
            let week = to_u32("week", record.week)?;
            out.entry(week).or_default().push(WalletRegionStake {
                week,
                region_id: to_u32("region_id", record.region_id)?,
                wallet_staked: parse_amount("wallet_staked", &record.wallet_staked)?,
            });
        }
        Ok(out)
    }

    async fn store_wallet_stakes_inner(
        &self,
        wallet: &WalletAddress,
        week: Week,
        rows: &[WalletRegionStake],
    ) -> Result<(), StorageError> {
        let week = i64::from(week);
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM wallet_stake_snapshots WHERE wallet_address = $1 AND week = $2")
            .bind(wallet.as_str())
            .bind(week)
            .execute(&mut *tx)
            .await?;
        if !rows.is_empty() {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO wallet_stake_snapshots (wallet_address, week, region_id, wallet_staked) ",
            );
            builder.push_values(rows, |mut b, row| {
                b.push_bind(wallet.to_string())
                    .push_bind(week)
                    .push_bind(i64::from(row.region_id))
                    .push_bind(row.wallet_staked.to_string());
            });
            builder.build().execute(&mut *tx).await?;
        }
        sqlx::query(
            "INSERT INTO wallet_stake_sync (wallet_address, week) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(wallet.as_str())
        .bind(week)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn weekly_balances_inner(
        &self,
        wallet: &WalletAddress,
        range: WeekRange,
    ) -> Result<BTreeMap<Week, BalanceSnapshot>, StorageError> {
        let records: Vec<BalanceRecord> = sqlx::query_as(
            "SELECT week, balance_wei, forward_filled FROM wallet_balance_snapshots \
             WHERE wallet_address = $1 AND week BETWEEN $2 AND $3",
        )
        .bind(wallet.as_str())
        .bind(i64::from(range.start_week))
        .bind(i64::from(range.end_week))
        .fetch_all(&self.pool)
        .await?;

        let mut out = BTreeMap::new();
        for record in records {
            let week = to_u32("week", record.week)?;
            out.insert(
                week,
                BalanceSnapshot {
                    week,
                    balance_wei: parse_amount("balance_wei", &record.balance_wei)?,
                    forward_filled: record.forward_filled,
                },
            );
        }
        Ok(out)
    }

    /// Purchases made before `until`, or with `refunds` set, refunds issued
    /// before `until` stamped with their refund time.
    async fn purchase_rows(
        &self,
        wallet: &WalletAddress,
        until: u64,
        refunds: bool,
    ) -> Result<Vec<PurchaseRecordRow>, StorageError> {
        let sql = if refunds {
            "SELECT wallet_address, kind, amount_glw_wei, refunded_at AS timestamp \
             FROM fraction_purchases \
             WHERE wallet_address = $1 AND refunded_at IS NOT NULL AND refunded_at < $2 \
             ORDER BY refunded_at"
        } else {
            "SELECT wallet_address, kind, amount_glw_wei, timestamp FROM fraction_purchases \
             WHERE wallet_address = $1 AND timestamp < $2 ORDER BY timestamp"
        };
        let records = sqlx::query_as(sql)
            .bind(wallet.as_str())
            .bind(timestamp_i64(until))
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    async fn farm_principals_inner(&self, farm_ids: &[FarmId]) -> Result<Vec<FarmPrincipal>, StorageError> {
        let records: Vec<PrincipalRecord> = sqlx::query_as(
            "SELECT farm_id, region_id, principal_glw_wei FROM farm_principals WHERE farm_id = ANY($1)",
        )
        .bind(farm_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        records
            .into_iter()
            .map(|record| {
                Ok(FarmPrincipal {
                    farm_id: record.farm_id,
                    region_id: record
                        .region_id
                        .map(|region| to_u32("region_id", region))
                        .transpose()?,
                    principal_glw_wei: parse_amount("principal_glw_wei", &record.principal_glw_wei)?,
                })
            })
            .collect()
    }
}

fn purchase_kind(value: &str) -> Result<PurchaseKind, StorageError> {
    match value {
        "launchpad" => Ok(PurchaseKind::Launchpad),
        "mining-center" => Ok(PurchaseKind::MiningCenter),
        other => Err(StorageError::InvalidValue {
            column: "kind",
            value: other.to_string(),
        }),
    }
}

#[async_trait]
impl SteeringSnapshotCache for PostgresBackend {
    async fn region_rewards(
        &self,
        range: WeekRange,
    ) -> Result<BTreeMap<Week, Vec<RegionRewardSnapshot>>, SourceError> {
        Ok(self.region_rewards_inner(range).await?)
    }

    async fn store_region_rewards(
        &self,
        week: Week,
        rows: &[RegionRewardSnapshot],
    ) -> Result<(), SourceError> {
        Ok(self.store_region_rewards_inner(week, rows).await?)
    }

    async fn wallet_stakes(
        &self,
        wallet: &WalletAddress,
        range: WeekRange,
    ) -> Result<BTreeMap<Week, Vec<WalletRegionStake>>, SourceError> {
        Ok(self.wallet_stakes_inner(wallet, range).await?)
    }

    async fn store_wallet_stakes(
        &self,
        wallet: &WalletAddress,
        week: Week,
        rows: &[WalletRegionStake],
    ) -> Result<(), SourceError> {
        Ok(self.store_wallet_stakes_inner(wallet, week, rows).await?)
    }
}

#[async_trait]
impl BalanceSnapshotStore for PostgresBackend {
    async fn weekly_balances(
        &self,
        wallet: &WalletAddress,
        range: WeekRange,
    ) -> Result<BTreeMap<Week, BalanceSnapshot>, SourceError> {
        Ok(self.weekly_balances_inner(wallet, range).await?)
    }
}

#[async_trait]
impl PurchaseSource for PostgresBackend {
    async fn purchases(
        &self,
        wallet: &WalletAddress,
        until: u64,
    ) -> Result<Vec<PurchaseRecord>, SourceError> {
        let mut out = Vec::new();
        for row in self.purchase_rows(wallet, until, false).await? {
            out.push(PurchaseRecord {
                wallet: parse_wallet(&row.wallet_address)?,
                kind: purchase_kind(&row.kind)?,
                amount_glw_wei: parse_amount("amount_glw_wei", &row.amount_glw_wei)?,
                timestamp: to_u64("timestamp", row.timestamp)?,
            });
        }
        Ok(out)
    }

    async fn refunds(&self, wallet: &WalletAddress, until: u64) -> Result<Vec<RefundRecord>, SourceError> {
        let mut out = Vec::new();
        for row in self.purchase_rows(wallet, until, true).await? {
            out.push(RefundRecord {
                wallet: parse_wallet(&row.wallet_address)?,
                kind: purchase_kind(&row.kind)?,
                amount_glw_wei: parse_amount("amount_glw_wei", &row.amount_glw_wei)?,
                timestamp: to_u64("timestamp", row.timestamp)?,
            });
        }
        Ok(out)
    }

    async fn farm_principals(&self, farm_ids: &[FarmId]) -> Result<Vec<FarmPrincipal>, SourceError> {
        Ok(self.farm_principals_inner(farm_ids).await?)
    }
}

#[async_trait]
impl WalletUniverseSource for PostgresBackend {
    fn feed_name(&self) -> &'static str {
        "purchasers"
    }

    async fn universe_wallets(&self) -> Result<Vec<String>, SourceError> {
        let records: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT wallet_address FROM fraction_purchases")
                .fetch_all(&self.pool)
                .await
                .map_err(StorageError::from)?;
        Ok(records.into_iter().map(|(wallet,)| wallet).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(parse_amount("balance_wei", "123").expect("amount"), 123);
        assert!(matches!(
            parse_amount("balance_wei", "-1"),
            Err(StorageError::InvalidValue { column: "balance_wei", .. })
        ));
    }

    #[test]
    fn test_purchase_kind_labels() {
        assert_eq!(purchase_kind("launchpad").expect("kind"), PurchaseKind::Launchpad);
        assert_eq!(purchase_kind("mining-center").expect("kind"), PurchaseKind::MiningCenter);
        assert!(purchase_kind("other").is_err());
    }

    #[test]
    fn test_negative_week_rejected() {
        assert!(to_u32("week", -1).is_err());
        assert_eq!(to_u32("week", 97).expect("week"), 97);
    }
}
