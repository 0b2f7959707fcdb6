pub mod clock;
pub mod jwt;
pub mod signature;
pub mod test_utils;
