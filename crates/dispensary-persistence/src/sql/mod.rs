//! SQL-based persistence backend (MySQL/PostgreSQL via SeaORM)
//!
//! Every method is a single round-trip except where a backend lacks
//! `RETURNING`, in which case the increment re-reads the row.

use async_trait::async_trait;
use sea_orm::{
    prelude::Expr,
    sea_query::{Func, SimpleExpr},
    *,
};
use tracing::info;

use crate::entity::{medicine, prescription};
use crate::model::*;
use crate::traits::*;

/// External database persistence service
///
/// Wraps a SeaORM `DatabaseConnection` and implements all persistence traits
/// by direct database queries.
pub struct ExternalDbPersistService {
    db: DatabaseConnection,
}

impl ExternalDbPersistService {
    /// Create a new ExternalDbPersistService with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Get a reference to the underlying database connection
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// `LOWER(name) = LOWER(<name>)`
fn name_matches(name: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(medicine::Column::Name))).eq(name.to_lowercase())
}

/// Create the medicine and prescription tables when missing
///
/// Intended for bootstrap and tests; schema evolution is managed outside the service.
pub async fn create_schema(db: &DatabaseConnection) -> anyhow::Result<()> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut medicine_table = schema.create_table_from_entity(medicine::Entity);
    let mut prescription_table = schema.create_table_from_entity(prescription::Entity);

    for table in [
        medicine_table.if_not_exists(),
        prescription_table.if_not_exists(),
    ] {
        db.execute(backend.build(&*table)).await?;
    }

    info!(backend = ?backend, "Database schema ready");
    Ok(())
}

// ============================================================================
// PersistenceService implementation
// ============================================================================

#[async_trait]
impl PersistenceService for ExternalDbPersistService {
    fn storage_mode(&self) -> StorageMode {
        StorageMode::ExternalDb
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        self.db.execute_unprepared("SELECT 1").await?;
        Ok(())
    }
}

// ============================================================================
// StockPersistence implementation
// ============================================================================

#[async_trait]
impl StockPersistence for ExternalDbPersistService {
    async fn medicine_find_stock(&self, name: &str) -> anyhow::Result<Option<StockLevel>> {
        let row = medicine::Entity::find()
            .select_only()
            .column(medicine::Column::Id)
            .column(medicine::Column::StockQuantity)
            .filter(name_matches(name))
            .into_tuple::<(i64, i32)>()
            .one(&self.db)
            .await?;

        Ok(row.map(|(id, stock_quantity)| StockLevel { id, stock_quantity }))
    }

    async fn medicine_insert(
        &self,
        name: &str,
        dosage_form: &str,
        stock_quantity: i32,
    ) -> anyhow::Result<MedicineInfo> {
        let now = chrono::Utc::now().naive_utc();

        let model = medicine::ActiveModel {
            name: Set(name.to_string()),
            dosage_form: Set(dosage_form.to_string()),
            stock_quantity: Set(stock_quantity),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(model.into())
    }

    async fn medicine_increment(
        &self,
        id: i64,
        delta: i32,
    ) -> anyhow::Result<Option<MedicineInfo>> {
        let update = medicine::Entity::update_many()
            .col_expr(
                medicine::Column::StockQuantity,
                Expr::col(medicine::Column::StockQuantity).add(delta),
            )
            .col_expr(
                medicine::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().naive_utc()),
            )
            .filter(medicine::Column::Id.eq(id));

        if self.db.support_returning() {
            let rows = update.exec_with_returning(&self.db).await?;
            return Ok(rows.into_iter().next().map(MedicineInfo::from));
        }

        let result = update.exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.medicine_find_by_id(id).await
    }

    async fn medicine_decrement(&self, id: i64, quantity: i32) -> anyhow::Result<bool> {
        let result = medicine::Entity::update_many()
            .col_expr(
                medicine::Column::StockQuantity,
                Expr::col(medicine::Column::StockQuantity).sub(quantity),
            )
            .col_expr(
                medicine::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().naive_utc()),
            )
            .filter(medicine::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn medicine_find_by_id(&self, id: i64) -> anyhow::Result<Option<MedicineInfo>> {
        let model = medicine::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(MedicineInfo::from))
    }

    async fn medicine_find_all(&self) -> anyhow::Result<Vec<MedicineInfo>> {
        let models = medicine::Entity::find()
            .order_by_asc(medicine::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(MedicineInfo::from).collect())
    }

    async fn medicine_delete(&self, name: &str) -> anyhow::Result<bool> {
        let result = medicine::Entity::delete_many()
            .filter(name_matches(name))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}

// ============================================================================
// PrescriptionPersistence implementation
// ============================================================================

#[async_trait]
impl PrescriptionPersistence for ExternalDbPersistService {
    async fn prescription_create(
        &self,
        patient_name: &str,
        medicine_name: &str,
        dosage: &str,
        quantity: i32,
    ) -> anyhow::Result<PrescriptionInfo> {
        let model = prescription::ActiveModel {
            patient_name: Set(patient_name.to_string()),
            medicine_name: Set(medicine_name.to_string()),
            dosage: Set(dosage.to_string()),
            quantity: Set(quantity),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(model.into())
    }

    async fn prescription_find_all(&self) -> anyhow::Result<Vec<PrescriptionInfo>> {
        let models = prescription::Entity::find()
            .order_by_asc(prescription::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(PrescriptionInfo::from).collect())
    }
}
