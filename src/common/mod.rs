// Shared constants and small formatting helpers
pub mod constants;
pub mod utils;
