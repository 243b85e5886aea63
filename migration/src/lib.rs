pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20250301_000001_create_urls;

/// Width of `urls.short_key`: the base62 form of `u64::MAX` has 11 symbols.
pub const SHORT_KEY_MAX_LEN: u32 = 11;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250301_000001_create_urls::Migration)]
    }
}
