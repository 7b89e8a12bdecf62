//! 缓存写入
//!
//! 两类分区各自独立事务：先删除该日期的全部行，再批量插入新数据，
//! 任何一步失败都会回滚，分区要么是旧的完整数据，要么是新的完整数据。

use chrono::NaiveDate;
use rusqlite::params;
use std::collections::BTreeMap;

use super::storage::StorageClient;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{LimitUpRecord, PerformanceMatrix};
use crate::services::common::beijing_now;

const DATE_FMT: &str = "%Y-%m-%d";

/// 写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// 已提交，附带插入行数
    Written(usize),
    /// 存储不可用，未执行
    Skipped,
}

#[derive(Clone)]
pub struct CacheWriter {
    storage: StorageClient,
}

impl CacheWriter {
    pub fn new(storage: StorageClient) -> Self {
        Self { storage }
    }

    pub fn is_available(&self) -> bool {
        self.storage.is_available()
    }

    /// 替换某日的涨停快照
    ///
    /// 同一快照内重复的股票代码只保留第一条
    pub fn replace_snapshot(&self, date: NaiveDate, records: &[LimitUpRecord]) -> PipelineResult<WriteOutcome> {
        let trade_date = date.format(DATE_FMT).to_string();
        let created_at = beijing_now().to_rfc3339();

        let result = self.storage.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM limit_up_snapshot WHERE trade_date = ?1", params![trade_date])?;

            let mut inserted = 0;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO limit_up_snapshot (
                        stock_code, trade_date, stock_name, sector_label,
                        board_kind, trade_amount, limit_up_time, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT (stock_code, trade_date) DO NOTHING",
                )?;
                for r in records {
                    inserted += stmt.execute(params![
                        r.stock_code,
                        trade_date,
                        r.stock_name,
                        r.sector_label,
                        r.board_kind,
                        r.trade_amount,
                        r.limit_up_time,
                        created_at,
                    ])?;
                }
            }
            tx.commit()?;
            Ok(inserted)
        });

        Self::finish("涨停快照", &trade_date, result)
    }

    /// 替换某基准日的表现矩阵，只写入窗口内的日期
    pub fn replace_performance(
        &self,
        base_date: NaiveDate,
        window: &[NaiveDate],
        matrix: &PerformanceMatrix,
    ) -> PipelineResult<WriteOutcome> {
        let base = base_date.format(DATE_FMT).to_string();
        let created_at = beijing_now().to_rfc3339();

        let result = self.storage.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM limit_up_performance WHERE base_date = ?1", params![base])?;

            let mut inserted = 0;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO limit_up_performance (
                        stock_code, base_date, performance_date, pct_change, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for (code, row) in matrix.iter() {
                    for date in window {
                        if let Some(pct) = row.get(date) {
                            inserted += stmt.execute(params![
                                code,
                                base,
                                date.format(DATE_FMT).to_string(),
                                pct,
                                created_at,
                            ])?;
                        }
                    }
                }
            }
            tx.commit()?;
            Ok(inserted)
        });

        Self::finish("表现矩阵", &base, result)
    }

    fn finish(
        what: &str,
        key: &str,
        result: Option<PipelineResult<usize>>,
    ) -> PipelineResult<WriteOutcome> {
        match result {
            None => {
                log::warn!("缓存不可用，跳过写入{} ({})", what, key);
                Ok(WriteOutcome::Skipped)
            }
            Some(Ok(n)) => {
                log::info!("💾 {} {} 已替换，写入 {} 行", what, key, n);
                Ok(WriteOutcome::Written(n))
            }
            Some(Err(e)) => Err(match e {
                PipelineError::Persistence(_) => e,
                other => PipelineError::Persistence(other.to_string()),
            }),
        }
    }

    /// 读取某日快照，按写入顺序返回；存储不可用时返回空
    pub fn load_snapshot(&self, date: NaiveDate) -> PipelineResult<Vec<LimitUpRecord>> {
        let trade_date = date.format(DATE_FMT).to_string();
        self.storage
            .with_conn(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT stock_code, stock_name, sector_label, board_kind, trade_amount, limit_up_time
                     FROM limit_up_snapshot WHERE trade_date = ?1 ORDER BY id",
                )?;
                let rows = stmt
                    .query_map(params![trade_date], |row| {
                        Ok(LimitUpRecord {
                            stock_code: row.get(0)?,
                            stock_name: row.get(1)?,
                            sector_label: row.get(2)?,
                            board_kind: row.get(3)?,
                            trade_amount: row.get(4)?,
                            limit_up_time: row.get(5)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    /// 读取某基准日的表现矩阵
    pub fn load_performance(&self, base_date: NaiveDate) -> PipelineResult<PerformanceMatrix> {
        let base = base_date.format(DATE_FMT).to_string();
        self.storage
            .with_conn(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT stock_code, performance_date, pct_change
                     FROM limit_up_performance WHERE base_date = ?1",
                )?;
                let rows = stmt
                    .query_map(params![base], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, f64>(2)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                let mut cells: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
                for (code, date, pct) in rows {
                    let date = NaiveDate::parse_from_str(&date, DATE_FMT)
                        .map_err(|e| PipelineError::DataShape(format!("缓存日期 {} 无效: {}", date, e)))?;
                    cells.entry(code).or_default().insert(date, pct);
                }
                Ok(PerformanceMatrix::from_cells(cells))
            })
            .unwrap_or_else(|| Ok(PerformanceMatrix::default()))
    }
}
