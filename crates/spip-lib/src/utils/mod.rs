// Utilities

pub mod format;
pub mod tool_locator;
