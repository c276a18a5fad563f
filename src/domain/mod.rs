pub mod matching;
pub mod product;
