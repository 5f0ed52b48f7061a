pub mod binary;
pub mod dispatch;
pub mod division;
pub mod engine;
pub mod field_division;
pub mod millionaire;
pub mod msb;
pub mod prf;
pub mod truncation;
