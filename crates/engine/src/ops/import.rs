use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use serde_json::Value;

use crate::{Candidate, Engine, ResultEngine, SkipReason, admit, locations};

/// Inserted rows per committed transaction.
pub const IMPORT_BATCH_SIZE: usize = 100;

/// Outcome of a bulk import run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub added: usize,
    pub skipped: usize,
    pub skipped_by_reason: BTreeMap<SkipReason, usize>,
}

impl ImportReport {
    fn skip(&mut self, reason: SkipReason) {
        self.skipped += 1;
        *self.skipped_by_reason.entry(reason).or_default() += 1;
    }
}

impl Engine {
    /// Import feed records as new locations.
    ///
    /// Rejected and duplicate records are counted and skipped. Inserts are
    /// committed every [`IMPORT_BATCH_SIZE`] rows and once at the end; on a
    /// database error the open batch is rolled back and the error returned,
    /// leaving earlier batches in place.
    pub async fn import_locations(&self, records: &[Value]) -> ResultEngine<ImportReport> {
        let mut report = ImportReport::default();
        let mut db_tx = self.database.begin().await?;

        for record in records {
            let candidate = match admit(record) {
                Ok(candidate) => candidate,
                Err(reason) => {
                    report.skip(reason);
                    continue;
                }
            };

            match Self::insert_candidate(&db_tx, candidate).await {
                Ok(true) => {
                    report.added += 1;
                    if report.added % IMPORT_BATCH_SIZE == 0 {
                        db_tx.commit().await?;
                        tracing::debug!(added = report.added, "import batch committed");
                        db_tx = self.database.begin().await?;
                    }
                }
                Ok(false) => report.skip(SkipReason::Duplicate),
                Err(err) => {
                    if let Err(rollback_err) = db_tx.rollback().await {
                        tracing::error!("failed to roll back import batch: {rollback_err}");
                    }
                    tracing::error!(added = report.added, "import aborted: {err}");
                    return Err(err);
                }
            }
        }

        db_tx.commit().await?;
        tracing::info!(
            added = report.added,
            skipped = report.skipped,
            "import finished"
        );
        Ok(report)
    }

    /// Insert unless a location with the same name and address exists.
    async fn insert_candidate(
        db_tx: &DatabaseTransaction,
        candidate: Candidate,
    ) -> ResultEngine<bool> {
        let existing = locations::Entity::find()
            .filter(locations::Column::Name.eq(candidate.name.as_str()))
            .filter(locations::Column::Address.eq(candidate.address.as_str()))
            .one(db_tx)
            .await?;
        if existing.is_some() {
            return Ok(false);
        }

        locations::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(candidate.name),
            address: ActiveValue::Set(candidate.address),
            category: ActiveValue::Set(Some(candidate.category)),
            discount_value: ActiveValue::Set(Some(candidate.discount_value)),
            discount_min: ActiveValue::Set(candidate.discount_min),
            discount_max: ActiveValue::Set(candidate.discount_max),
            latitude: ActiveValue::Set(candidate.latitude),
            longitude: ActiveValue::Set(candidate.longitude),
            description: ActiveValue::Set(candidate.description),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(db_tx)
        .await?;

        Ok(true)
    }
}
