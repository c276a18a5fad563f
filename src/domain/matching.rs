use crate::domain::product::Product;

/// A record from source A paired with its best counterpart from source B.
#[derive(Clone, Debug, PartialEq)]
pub struct Match {
    pub a: Product,
    pub b: Option<Product>,
    pub score: f32,
}
