use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum BusTimings {
    Table,
    Id,
    BusId,
    StopId,
    ArrivalTime,
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

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BusTimings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BusTimings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BusTimings::BusId).integer().not_null())
                    .col(ColumnDef::new(BusTimings::StopId).integer().not_null())
                    .col(ColumnDef::new(BusTimings::ArrivalTime).time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bus_timings_bus_id")
                            .from(BusTimings::Table, BusTimings::BusId)
                            .to(Buses::Table, Buses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bus_timings_stop_id")
                            .from(BusTimings::Table, BusTimings::StopId)
                            .to(BusStops::Table, BusStops::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Timetable lookups filter on stop and lower-bound the arrival time
        manager
            .create_index(
                Index::create()
                    .name("idx_bus_timings_stop_arrival")
                    .table(BusTimings::Table)
                    .col(BusTimings::StopId)
                    .col(BusTimings::ArrivalTime)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BusTimings::Table).to_owned())
            .await
    }
}
