pub mod booking;
pub mod conversation;
pub mod service;

pub use booking::{Booking, BookingStatus};
pub use conversation::{ConversationState, ConversationStep};
pub use service::{CatalogError, GarageService, ServiceCatalog};
