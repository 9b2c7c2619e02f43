pub mod presence_entry;

pub use presence_entry::Entity as PresenceEntryEntity;
