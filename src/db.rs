// connexion BD + création du schéma depuis les entités

use std::path::Path;

use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};
use tracing::{debug, info, instrument};

use crate::config::DatabaseConfig;
use crate::models::{category, expense, product, sale, users};

/// Ouvre le pool de connexions (SQLite embarqué ou PostgreSQL selon la config)
#[instrument(skip(config))]
pub async fn establish_connection(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    if let DatabaseConfig::Sqlite { path } = config {
        // mode=rwc crée le fichier mais pas le dossier parent
        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| DbErr::Custom(format!("Cannot create {}: {}", parent.display(), e)))?;
        }
    }

    let mut options = ConnectOptions::new(config.url());
    options.sqlx_logging(false);

    debug!("Connecting with backend {:?}", backend_name(config));
    Database::connect(options).await
}

fn backend_name(config: &DatabaseConfig) -> &'static str {
    match config {
        DatabaseConfig::Sqlite { .. } => "sqlite",
        DatabaseConfig::Postgres { .. } => "postgres",
        DatabaseConfig::Url(url) if url.starts_with("sqlite") => "sqlite",
        DatabaseConfig::Url(_) => "postgres",
    }
}

/// Crée les tables (si absentes) puis les index.
/// L'ordre compte: les clés étrangères référencent des tables déjà créées.
pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut tables = vec![
        schema.create_table_from_entity(users::Entity),
        schema.create_table_from_entity(category::Entity),
        schema.create_table_from_entity(product::Entity),
        schema.create_table_from_entity(sale::Entity),
        schema.create_table_from_entity(expense::Entity),
    ];

    for table in tables.iter_mut() {
        table.if_not_exists();
        db.execute(backend.build(&*table)).await?;
    }

    for index in indexes() {
        db.execute(backend.build(&index)).await?;
    }

    info!("Database tables and indexes ensured");
    Ok(())
}

fn indexes() -> Vec<IndexCreateStatement> {
    vec![
        // Nom de catégorie unique par utilisateur
        Index::create()
            .name("idx_categories_user_name")
            .table(category::Entity)
            .col(category::Column::UserId)
            .col(category::Column::Name)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_products_user")
            .table(product::Entity)
            .col(product::Column::UserId)
            .col(product::Column::Id)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_products_category")
            .table(product::Entity)
            .col(product::Column::CategoryId)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_sales_user_date")
            .table(sale::Entity)
            .col(sale::Column::UserId)
            .col(sale::Column::SaleDate)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_sales_product")
            .table(sale::Entity)
            .col(sale::Column::ProductId)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_expenses_user_incurred")
            .table(expense::Entity)
            .col(expense::Column::UserId)
            .col(expense::Column::IncurredAt)
            .if_not_exists()
            .to_owned(),
    ]
}
