pub mod booking;
pub mod money;
pub mod payment;

pub use booking::{Booking, BookingStatus, NewBooking, PaymentMethod, RoomType};
pub use money::Money;
pub use payment::{ChargeRequest, ChargeSession, MetadataField, Verification};
