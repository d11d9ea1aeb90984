use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrderMoves::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderMoves::Id)
                            .uuid()
                            .not_null()
                            .default(Expr::cust("gen_random_uuid()"))
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderMoves::OrderId).uuid().not_null())
                    .col(
                        ColumnDef::new(OrderMoves::Name)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderMoves::Damage)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderMoves::Description).text().null())
                    // Zero-based submission position
                    .col(ColumnDef::new(OrderMoves::MoveOrder).integer().not_null())
                    .col(
                        ColumnDef::new(OrderMoves::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_moves_order_id")
                            .from(OrderMoves::Table, OrderMoves::OrderId)
                            .to(Orders::Table, Orders::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Position is unique within an order
        manager
            .create_index(
                Index::create()
                    .name("idx_order_moves_order_id_move_order")
                    .table(OrderMoves::Table)
                    .col(OrderMoves::OrderId)
                    .col(OrderMoves::MoveOrder)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderMoves::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum OrderMoves {
    Table,
    Id,
    OrderId,
    Name,
    Damage,
    Description,
    MoveOrder,
    CreatedAt,
}

#[derive(Iden)]
enum Orders {
    Table,
    Id,
}
