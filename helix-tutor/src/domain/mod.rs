pub mod conversation;
pub mod request;
pub mod search;
pub mod unit;

pub use conversation::{ConversationTurn, Role, infer_preferred_format};
pub use request::{Level, OutputFormat};
pub use search::{ScoredUnit, SearchFilter};
pub use unit::{Extra, MetaValue, SourceType, Unit, keys};
