pub mod ast_utils;
pub mod js_parser;
pub mod symbols;

pub use js_parser::{extract_registrations, JsParser, RegistrationScanner};
pub use symbols::*;

#[cfg(test)]
mod tests;
