pub mod bus;
pub mod bus_stop;
pub mod bus_timing;
pub mod notification;
pub mod user;

pub use bus::Entity as Bus;
pub use bus::Model as BusModel;
pub use bus_stop::Entity as BusStop;
pub use bus_stop::Model as BusStopModel;
pub use bus_stop::NearbyStop;
pub use bus_timing::Entity as BusTiming;
pub use bus_timing::Model as BusTimingModel;
pub use bus_timing::BusTimingRow;
pub use notification::Entity as Notification;
pub use notification::Model as NotificationModel;
pub use notification::{BookingStatus, NotificationKind, NotificationView};
pub use user::Entity as User;
pub use user::Model as UserModel;
