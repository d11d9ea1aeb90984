use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Orders::Id)
                            .uuid()
                            .not_null()
                            .default(Expr::cust("gen_random_uuid()"))
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Orders::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(Orders::StripePaymentIntentId)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Orders::CardType)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::Element)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::PokemonName)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Orders::Hp).string_len(8).not_null())
                    .col(
                        ColumnDef::new(Orders::Rarity)
                            .string_len(64)
                            .not_null(),
                    )
                    // Lifecycle: pending -> paid (webhook) -> processing/completed/cancelled (fulfillment)
                    .col(
                        ColumnDef::new(Orders::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Orders::PersonalMessage).text().null())
                    .col(
                        ColumnDef::new(Orders::UseAi)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Orders::AiPrompt).text().null())
                    // Minor currency units (cents), computed server-side
                    .col(ColumnDef::new(Orders::TotalAmount).integer().not_null())
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(
                        ColumnDef::new(Orders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_user_id")
                            .from(Orders::Table, Orders::UserId)
                            .to(AuthUsers::Table, AuthUsers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Listing is always scoped by owner, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_user_id_created_at")
                    .table(Orders::Table)
                    .col(Orders::UserId)
                    .col(Orders::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Webhook resolves orders by payment intent
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_stripe_payment_intent_id")
                    .table(Orders::Table)
                    .col(Orders::StripePaymentIntentId)
                    .to_owned(),
            )
            .await?;

        // Create trigger function for updated_at (if not exists)
        let db = manager.get_connection();
        db.execute_unprepared(
            r#"
            CREATE OR REPLACE FUNCTION update_orders_updated_at()
            RETURNS TRIGGER AS $$
            BEGIN
                NEW.updated_at = NOW();
                RETURN NEW;
            END;
            $$ LANGUAGE plpgsql;
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            DROP TRIGGER IF EXISTS trigger_orders_updated_at ON orders;
            CREATE TRIGGER trigger_orders_updated_at
                BEFORE UPDATE ON orders
                FOR EACH ROW
                EXECUTE FUNCTION update_orders_updated_at();
            "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("DROP TRIGGER IF EXISTS trigger_orders_updated_at ON orders;")
            .await?;
        db.execute_unprepared("DROP FUNCTION IF EXISTS update_orders_updated_at();")
            .await?;

        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Orders {
    Table,
    Id,
    UserId,
    StripePaymentIntentId,
    CardType,
    Element,
    PokemonName,
    Hp,
    Rarity,
    Status,
    PersonalMessage,
    UseAi,
    AiPrompt,
    TotalAmount,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum AuthUsers {
    Table,
    Id,
}
