pub mod booking;
pub mod token;

pub use booking::{Booking, BookingStatus, ServiceType};
pub use token::{ModificationToken, TokenKind};
