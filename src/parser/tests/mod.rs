// Parser regression tests for class registration extraction

pub mod fixtures;

mod annotation_parsing;
mod malformed_registrations;
