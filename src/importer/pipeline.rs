// ==========================================
// InsightStore - 导入管道（编排）
// ==========================================
// 状态机: Decoding → Iterating → Validating → Done | Failed
// - Decoding: 委托 UniversalFileParser；空表 → EmptySource
// - Iterating: 逐行规范化 + 实体构建，单行失败不影响整体
// - Validating: 零商品 → NoValidProducts（附全部观测列）
// 同步、单线程：一次调用独占三张实体表，结束时整体交还调用方
// ==========================================

use crate::config::ImportConfig;
use crate::domain::import::{ImportOutcome, ImportPhase, ImportReport};
use crate::domain::table::DecodedTable;
use crate::importer::data_cleaner::DataCleaner as DataCleanerImpl;
use crate::importer::entity_builder::EntityBuilder;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper as FieldMapperImpl;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::store_importer_trait::{DataCleaner, FieldMapper};
use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ==========================================
// PhaseTracker - 阶段跟踪
// ==========================================
struct PhaseTracker<'a> {
    import_id: &'a str,
    phase: ImportPhase,
}

impl<'a> PhaseTracker<'a> {
    fn new(import_id: &'a str) -> Self {
        debug!(import_id = %import_id, phase = %ImportPhase::Decoding, "导入阶段开始");
        Self {
            import_id,
            phase: ImportPhase::Decoding,
        }
    }

    fn advance(&mut self, next: ImportPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "非法阶段迁移: {} → {}",
            self.phase,
            next
        );
        debug!(import_id = %self.import_id, from = %self.phase, to = %next, "导入阶段迁移");
        self.phase = next;
    }

    fn fail(&mut self, err: ImportError) -> ImportError {
        warn!(import_id = %self.import_id, phase = %self.phase, error = %err, "导入失败");
        self.advance(ImportPhase::Failed);
        err
    }
}

// ==========================================
// IngestionPipeline
// ==========================================
pub struct IngestionPipeline {
    config: ImportConfig,
    field_mapper: Box<dyn FieldMapper>,
    data_cleaner: Box<dyn DataCleaner>,
}

impl IngestionPipeline {
    /// 使用默认组件创建管道
    pub fn new(config: ImportConfig) -> Self {
        Self::with_components(config, Box::new(FieldMapperImpl), Box::new(DataCleanerImpl))
    }

    /// 自定义组件（测试替身等）
    pub fn with_components(
        config: ImportConfig,
        field_mapper: Box<dyn FieldMapper>,
        data_cleaner: Box<dyn DataCleaner>,
    ) -> Self {
        Self {
            config,
            field_mapper,
            data_cleaner,
        }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// 从字节开始完整执行（含 Decoding）
    pub fn ingest_bytes(&self, bytes: &[u8], extension_hint: &str) -> ImportResult<ImportOutcome> {
        let import_id = Uuid::new_v4().to_string();
        let mut tracker = PhaseTracker::new(&import_id);

        let table = UniversalFileParser
            .decode(bytes, extension_hint)
            .map_err(|e| tracker.fail(e))?;

        self.execute(&import_id, &mut tracker, table, Utc::now())
    }

    /// 对已解码的表执行（导入时刻取当前时间）
    pub fn run(&self, table: DecodedTable) -> ImportResult<ImportOutcome> {
        self.run_at(table, Utc::now())
    }

    /// 对已解码的表执行，使用给定的导入时刻
    ///
    /// 同一次导入内所有 lastUpdated 与日期回退共享该时刻
    pub fn run_at(&self, table: DecodedTable, ingested_at: DateTime<Utc>) -> ImportResult<ImportOutcome> {
        let import_id = Uuid::new_v4().to_string();
        let mut tracker = PhaseTracker::new(&import_id);
        self.execute(&import_id, &mut tracker, table, ingested_at)
    }

    fn execute(
        &self,
        import_id: &str,
        tracker: &mut PhaseTracker<'_>,
        table: DecodedTable,
        ingested_at: DateTime<Utc>,
    ) -> ImportResult<ImportOutcome> {
        let started = Instant::now();

        if table.is_empty() {
            return Err(tracker.fail(ImportError::EmptySource));
        }
        let total_rows = table.len();
        let source_format = table.format;
        info!(import_id = %import_id, format = %source_format, total_rows, "开始导入门店数据");

        // ===== Iterating =====
        tracker.advance(ImportPhase::Iterating);
        let mut builder = EntityBuilder::new(&self.config, self.data_cleaner.as_ref(), ingested_at);
        for (idx, raw_row) in table.rows.iter().enumerate() {
            let canonical = self.field_mapper.canonicalize(raw_row, idx + 1);
            builder.accept(&canonical);
        }

        // ===== Validating =====
        tracker.advance(ImportPhase::Validating);
        let summary = builder.finish();
        if summary.data.products.is_empty() {
            return Err(tracker.fail(ImportError::NoValidProducts {
                columns: summary.observed_columns,
            }));
        }

        tracker.advance(ImportPhase::Done);

        let report = ImportReport {
            import_id: import_id.to_string(),
            source_format: Some(source_format),
            total_rows,
            accepted_rows: summary.accepted_rows,
            rejected_rows: summary.rejected_rows,
            rejected_samples: summary.rejected_samples,
            products: summary.data.products.len(),
            inventory_items: summary.data.inventory.len(),
            sales: summary.data.sales.len(),
            observed_columns: summary.observed_columns,
            ingested_at,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            import_id = %import_id,
            accepted = report.accepted_rows,
            rejected = report.rejected_rows,
            products = report.products,
            inventory = report.inventory_items,
            sales = report.sales,
            elapsed_ms = report.elapsed_ms,
            "门店数据导入完成"
        );

        Ok(ImportOutcome {
            data: summary.data,
            report,
        })
    }
}

impl Default for IngestionPipeline {
    fn default() -> Self {
        Self::new(ImportConfig::default())
    }
}
