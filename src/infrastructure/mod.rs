pub mod formatting;
pub mod messaging;
