// Public configuration types

pub mod session_options;

pub use session_options::SessionOptions;
