mod arabic;
mod standard;

pub use arabic::ArabicFormatter;
pub use standard::StandardFormatter;
