pub mod conversation;
pub mod intent;
pub mod messaging;
pub mod reminders;
pub mod replies;
pub mod scheduling;
