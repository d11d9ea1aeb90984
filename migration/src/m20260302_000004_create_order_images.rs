use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrderImages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderImages::Id)
                            .uuid()
                            .not_null()
                            .default(Expr::cust("gen_random_uuid()"))
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderImages::OrderId).uuid().not_null())
                    // Object-storage locator, e.g. "<user_id>/<order_id>/<millis>-<file_name>"
                    .col(ColumnDef::new(OrderImages::FilePath).string().not_null())
                    .col(ColumnDef::new(OrderImages::FileName).string().not_null())
                    .col(ColumnDef::new(OrderImages::FileSize).big_integer().null())
                    // 'reference' = customer upload, 'final' = produced artwork
                    .col(
                        ColumnDef::new(OrderImages::ImageType)
                            .string_len(20)
                            .not_null()
                            .default("reference"),
                    )
                    .col(
                        ColumnDef::new(OrderImages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_images_order_id")
                            .from(OrderImages::Table, OrderImages::OrderId)
                            .to(Orders::Table, Orders::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_images_order_id")
                    .table(OrderImages::Table)
                    .col(OrderImages::OrderId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderImages::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum OrderImages {
    Table,
    Id,
    OrderId,
    FilePath,
    FileName,
    FileSize,
    ImageType,
    CreatedAt,
}

#[derive(Iden)]
enum Orders {
    Table,
    Id,
}
