use std::fmt;

/// A catalog listing from one source.
///
/// `id` stays `None` until the record store assigns one. Embeddings stay
/// `None` until an embedding pass has filled them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Product {
    pub id: Option<i32>,
    pub source: String,
    pub url: String,
    pub name: String,
    pub description: String,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub name_embedding: Option<Vec<f32>>,
    pub description_embedding: Option<Vec<f32>>,
}

impl Product {
    pub fn new(source: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// Both embeddings are present.
    pub fn is_embedded(&self) -> bool {
        self.name_embedding.is_some() && self.description_embedding.is_some()
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.id.map(|id| id.to_string()).unwrap_or_default();
        let price = self.price.map(|p| p.to_string()).unwrap_or_default();
        write!(
            f,
            "id: {id}; source: {}; url: {}; name: {}; price: {price}; image url: {}",
            self.source,
            self.url,
            self.name,
            self.image_url.as_deref().unwrap_or(""),
        )
    }
}

/// Stored embeddings of one product.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductEmbeddings {
    pub product_id: i32,
    pub source: String,
    pub name_embedding: Option<Vec<f32>>,
    pub description_embedding: Option<Vec<f32>>,
}
