// `MigrationTrait` elides the `SchemaManager` lifetime under `async_trait`;
// impls must elide it too, so opt out of the idiom lint here.
#![allow(elided_lifetimes_in_paths)]

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_stock_pools::Migration),
            Box::new(m20240301_000002_create_stock_movements::Migration),
            Box::new(m20240301_000003_create_delivery_documents::Migration),
            Box::new(m20240301_000004_create_component_assignments::Migration),
            Box::new(m20240301_000005_create_document_counters::Migration),
        ]
    }
}

mod m20240301_000001_create_stock_pools {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_stock_pools"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // The two pools are intentionally separate tables with the same
            // shape; consolidation happens at read time.
            for table in [Pool::TechnicalStock, Pool::GeneralStock] {
                manager
                    .create_table(
                        Table::create()
                            .table(table)
                            .if_not_exists()
                            .col(
                                ColumnDef::new(Pool::Id)
                                    .big_integer()
                                    .not_null()
                                    .auto_increment()
                                    .primary_key(),
                            )
                            .col(ColumnDef::new(Pool::Name).string().not_null())
                            .col(ColumnDef::new(Pool::Brand).string().not_null())
                            .col(ColumnDef::new(Pool::Model).string().not_null())
                            .col(ColumnDef::new(Pool::SerialNumber).string())
                            .col(ColumnDef::new(Pool::QuantityAvailable).integer().not_null())
                            .col(ColumnDef::new(Pool::QuantityReceived).integer().not_null())
                            .col(ColumnDef::new(Pool::State).string_len(32).not_null())
                            .col(ColumnDef::new(Pool::Location).string())
                            .col(ColumnDef::new(Pool::Notes).string())
                            .col(ColumnDef::new(Pool::OriginReference).string())
                            .col(ColumnDef::new(Pool::Version).integer().not_null().default(0))
                            .col(
                                ColumnDef::new(Pool::CreatedAt)
                                    .timestamp_with_time_zone()
                                    .not_null(),
                            )
                            .col(
                                ColumnDef::new(Pool::UpdatedAt)
                                    .timestamp_with_time_zone()
                                    .not_null(),
                            )
                            .to_owned(),
                    )
                    .await?;
            }

            manager
                .create_index(
                    Index::create()
                        .name("idx_technical_stock_product")
                        .table(Pool::TechnicalStock)
                        .col(Pool::Name)
                        .col(Pool::Brand)
                        .col(Pool::Model)
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(
                    Index::create()
                        .name("idx_general_stock_product")
                        .table(Pool::GeneralStock)
                        .col(Pool::Name)
                        .col(Pool::Brand)
                        .col(Pool::Model)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Pool::TechnicalStock).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Pool::GeneralStock).to_owned())
                .await
        }
    }

    #[derive(DeriveIden, Clone, Copy)]
    enum Pool {
        TechnicalStock,
        GeneralStock,
        Id,
        Name,
        Brand,
        Model,
        SerialNumber,
        QuantityAvailable,
        QuantityReceived,
        State,
        Location,
        Notes,
        OriginReference,
        Version,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_stock_movements {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_stock_movements"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(StockMovements::ItemId).big_integer().not_null())
                        .col(ColumnDef::new(StockMovements::Pool).string_len(32).not_null())
                        .col(ColumnDef::new(StockMovements::ProductName).string().not_null())
                        .col(ColumnDef::new(StockMovements::ProductBrand).string().not_null())
                        .col(ColumnDef::new(StockMovements::ProductModel).string().not_null())
                        .col(ColumnDef::new(StockMovements::ProductSerial).string())
                        .col(
                            ColumnDef::new(StockMovements::MovementType)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(StockMovements::QuantityBefore)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::QuantityAfter)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::Reason).string().not_null())
                        .col(ColumnDef::new(StockMovements::Reference).string())
                        .col(ColumnDef::new(StockMovements::Responsible).string().not_null())
                        .col(
                            ColumnDef::new(StockMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_movements_reference")
                        .table(StockMovements::Table)
                        .col(StockMovements::Reference)
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_movements_created_at")
                        .table(StockMovements::Table)
                        .col(StockMovements::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockMovements {
        Table,
        Id,
        ItemId,
        Pool,
        ProductName,
        ProductBrand,
        ProductModel,
        ProductSerial,
        MovementType,
        Quantity,
        QuantityBefore,
        QuantityAfter,
        Reason,
        Reference,
        Responsible,
        CreatedAt,
    }
}

mod m20240301_000003_create_delivery_documents {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_delivery_documents"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DeliveryDocuments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DeliveryDocuments::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(DeliveryDocuments::Number)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(DeliveryDocuments::DocumentDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DeliveryDocuments::Client).string().not_null())
                        .col(ColumnDef::new(DeliveryDocuments::DeliveryAddress).string())
                        .col(ColumnDef::new(DeliveryDocuments::Technician).string().not_null())
                        .col(ColumnDef::new(DeliveryDocuments::Kind).string().not_null())
                        .col(
                            ColumnDef::new(DeliveryDocuments::Status)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(ColumnDef::new(DeliveryDocuments::InvoiceNumber).string())
                        .col(
                            ColumnDef::new(DeliveryDocuments::Version)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(DeliveryDocuments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryDocuments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DeliveryLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DeliveryLines::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(DeliveryLines::DocumentId).uuid().not_null())
                        .col(ColumnDef::new(DeliveryLines::Pool).string_len(32).not_null())
                        .col(ColumnDef::new(DeliveryLines::ItemId).big_integer().not_null())
                        .col(ColumnDef::new(DeliveryLines::ProductName).string().not_null())
                        .col(ColumnDef::new(DeliveryLines::ProductBrand).string().not_null())
                        .col(ColumnDef::new(DeliveryLines::ProductModel).string().not_null())
                        .col(
                            ColumnDef::new(DeliveryLines::RequestedQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryLines::AvailableAtCreation)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DeliveryLines::Notes).string())
                        .col(
                            ColumnDef::new(DeliveryLines::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_delivery_lines_document")
                                .from(DeliveryLines::Table, DeliveryLines::DocumentId)
                                .to(DeliveryDocuments::Table, DeliveryDocuments::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_delivery_lines_document")
                        .table(DeliveryLines::Table)
                        .col(DeliveryLines::DocumentId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DeliveryLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DeliveryDocuments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum DeliveryDocuments {
        Table,
        Id,
        Number,
        DocumentDate,
        Client,
        DeliveryAddress,
        Technician,
        Kind,
        Status,
        InvoiceNumber,
        Version,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum DeliveryLines {
        Table,
        Id,
        DocumentId,
        Pool,
        ItemId,
        ProductName,
        ProductBrand,
        ProductModel,
        RequestedQuantity,
        AvailableAtCreation,
        Notes,
        CreatedAt,
    }
}

mod m20240301_000004_create_component_assignments {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_component_assignments"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ComponentAssignments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ComponentAssignments::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ComponentAssignments::ComponentId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ComponentAssignments::EquipmentId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ComponentAssignments::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ComponentAssignments::Reason).string().not_null())
                        .col(
                            ColumnDef::new(ComponentAssignments::Technician)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ComponentAssignments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_component_assignments_equipment")
                        .table(ComponentAssignments::Table)
                        .col(ComponentAssignments::EquipmentId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ComponentAssignments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ComponentAssignments {
        Table,
        Id,
        ComponentId,
        EquipmentId,
        Quantity,
        Reason,
        Technician,
        CreatedAt,
    }
}

mod m20240301_000005_create_document_counters {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_document_counters"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DocumentCounters::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DocumentCounters::Prefix)
                                .string()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(DocumentCounters::LastValue)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DocumentCounters::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DocumentCounters::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum DocumentCounters {
        Table,
        Prefix,
        LastValue,
        UpdatedAt,
    }
}
