pub mod paths;
pub mod phrase;
