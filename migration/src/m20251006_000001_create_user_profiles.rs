use sea_orm_migration::prelude::*;

use crate::m20251004_000001_create_users::Users;

#[derive(DeriveIden)]
enum UserProfiles {
    Table,
    Id,
    UserId,
    Age,
    Sex,
    HeightCm,
    CurrentWeightKg,
    TargetWeightKg,
    Goal,
    ActivityLevel,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserProfiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserProfiles::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserProfiles::UserId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(UserProfiles::Age).integer().null())
                    .col(ColumnDef::new(UserProfiles::Sex).string_len(20).null())
                    .col(ColumnDef::new(UserProfiles::HeightCm).double().null())
                    .col(ColumnDef::new(UserProfiles::CurrentWeightKg).double().null())
                    .col(ColumnDef::new(UserProfiles::TargetWeightKg).double().null())
                    .col(ColumnDef::new(UserProfiles::Goal).string_len(50).null())
                    .col(ColumnDef::new(UserProfiles::ActivityLevel).string_len(50).null())
                    .col(
                        ColumnDef::new(UserProfiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(UserProfiles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_profiles_user_id")
                            .from(UserProfiles::Table, UserProfiles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserProfiles::Table).to_owned())
            .await
    }
}
