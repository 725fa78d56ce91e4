pub mod document;
pub mod page_session;

pub use document::{DocumentSession, ElementRef, Selector};
pub use page_session::PageSession;
