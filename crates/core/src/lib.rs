pub mod codec;
pub mod document;
pub mod error;
pub mod tiers;

pub use codec::SAVE_KEY;
pub use document::SaveDocument;
pub use error::CoreError;
