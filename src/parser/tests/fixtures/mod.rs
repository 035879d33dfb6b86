// Test fixtures for parser testing
//
// JavaScript snippets covering the registration shapes the scanner has to
// recognize or reject.

pub mod registration_patterns;

pub use registration_patterns::*;
