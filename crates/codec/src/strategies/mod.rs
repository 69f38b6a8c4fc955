mod compact;
mod pretty;

pub use compact::CompactJson;
pub use pretty::PrettyJson;
