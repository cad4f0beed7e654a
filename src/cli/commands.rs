pub mod resolve;
pub mod serve;

pub use resolve::resolve_workbook;
pub use serve::serve;
