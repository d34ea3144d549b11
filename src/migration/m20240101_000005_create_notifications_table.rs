use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    Kind,
    BusId,
    BusStopId,
    UserId,
    Timing,
    Message,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Buses {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum BusStops {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Notifications::Kind)
                            .string_len(20)
                            .not_null()
                            .default("booking"),
                    )
                    .col(ColumnDef::new(Notifications::BusId).integer().not_null())
                    .col(ColumnDef::new(Notifications::BusStopId).integer().null())
                    .col(ColumnDef::new(Notifications::UserId).integer().not_null())
                    .col(ColumnDef::new(Notifications::Timing).time().null())
                    .col(
                        ColumnDef::new(Notifications::Message)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notifications::Status)
                            .string_len(20)
                            .not_null()
                            .default("waiting"),
                    )
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_bus_id")
                            .from(Notifications::Table, Notifications::BusId)
                            .to(Buses::Table, Buses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_bus_stop_id")
                            .from(Notifications::Table, Notifications::BusStopId)
                            .to(BusStops::Table, BusStops::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_user_id")
                            .from(Notifications::Table, Notifications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_bus_status")
                    .table(Notifications::Table)
                    .col(Notifications::BusId)
                    .col(Notifications::Status)
                    .to_owned(),
            )
            .await?;

        // One live booking per passenger, bus and stop. Completed rows fall
        // out of the index, so the passenger can book the same trip again.
        let db = manager.get_connection();
        db.execute_unprepared(
            "CREATE UNIQUE INDEX uq_notifications_active_booking \
             ON notifications (bus_id, bus_stop_id, user_id) \
             WHERE kind = 'booking' AND status IN ('waiting', 'traveling')",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await
    }
}
