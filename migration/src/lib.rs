pub use sea_orm_migration::prelude::*;

mod m20260302_000001_create_auth_users;
mod m20260302_000002_create_orders;
mod m20260302_000003_create_order_moves;
mod m20260302_000004_create_order_images;
mod m20260707_000001_add_order_saga_flags;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260302_000001_create_auth_users::Migration),
            Box::new(m20260302_000002_create_orders::Migration),
            Box::new(m20260302_000003_create_order_moves::Migration),
            Box::new(m20260302_000004_create_order_images::Migration),
            Box::new(m20260707_000001_add_order_saga_flags::Migration),
        ]
    }
}
