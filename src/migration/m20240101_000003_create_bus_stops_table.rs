use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum BusStops {
    Table,
    Id,
    StopName,
    Latitude,
    Longitude,
    City,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BusStops::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BusStops::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BusStops::StopName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BusStops::Latitude).double().not_null())
                    .col(ColumnDef::new(BusStops::Longitude).double().not_null())
                    .col(ColumnDef::new(BusStops::City).string_len(100).null())
                    .col(
                        ColumnDef::new(BusStops::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Bounding-box prefilter for the nearby-stops search scans this
        manager
            .create_index(
                Index::create()
                    .name("idx_bus_stops_lat_lon")
                    .table(BusStops::Table)
                    .col(BusStops::Latitude)
                    .col(BusStops::Longitude)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BusStops::Table).to_owned())
            .await
    }
}
