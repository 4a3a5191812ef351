pub mod appointment;
pub mod notification;
pub mod schedule;
pub mod slot;
pub mod user;

pub use appointment::{
    Appointment, AppointmentStatus, BookingReceipt, BookingRequest, SelectedService,
    BUNDLE_SERVICE_ID, MAX_DURATION_MINUTES,
};
pub use notification::{NewNotification, Notification, NotificationKind};
pub use schedule::{DayName, DaySchedule, Schedule};
pub use slot::Slot;
pub use user::{CalendarConnection, User, Vendor};
