pub mod booking;
pub mod error;
pub mod event;

pub mod prelude {
    pub use crate::booking::{Booking as BookingEntity, BookingDraft};
    pub use crate::error::ValidationError;
    pub use crate::event::{
        Event as EventEntity, EventDraft, EventMode, EventUpdate,
    };
}
