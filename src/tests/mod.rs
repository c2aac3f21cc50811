// Test modules, one file per component.

pub mod parse_tests;
