// Route handlers, one module per resource.

pub mod chat;
pub mod feed;
pub mod reports;
pub mod stats;
pub mod verify;
