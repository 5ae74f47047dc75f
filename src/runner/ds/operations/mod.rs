pub mod object;
pub mod test_and_comparison;
pub mod time;
pub mod type_conversion;
