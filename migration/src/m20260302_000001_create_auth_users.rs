use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Credentials table for email/password principals. OAuth-provisioned
        // users land here too, with an empty password and provider != 'credentials'.
        manager
            .create_table(
                Table::create()
                    .table(AuthUsers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuthUsers::Id)
                            .uuid()
                            .not_null()
                            .default(Expr::cust("gen_random_uuid()"))
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AuthUsers::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuthUsers::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(AuthUsers::Password)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuthUsers::Image)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AuthUsers::EmailVerified)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AuthUsers::Provider)
                            .string_len(32)
                            .not_null()
                            .default("credentials"),
                    )
                    .col(
                        ColumnDef::new(AuthUsers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await?;

        // Login path looks users up by email
        manager
            .create_index(
                Index::create()
                    .name("idx_auth_users_email")
                    .table(AuthUsers::Table)
                    .col(AuthUsers::Email)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuthUsers::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AuthUsers {
    Table,
    Id,
    Name,
    Email,
    Password,
    Image,
    EmailVerified,
    Provider,
    CreatedAt,
}
