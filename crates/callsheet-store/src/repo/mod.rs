pub mod contacts;
pub mod tags;

pub use contacts::{ContactNew, ContactsRepo};
pub use tags::TagsRepo;
