//! Diesel row types for the `products` table.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::product::Product as DomainProduct;
use crate::schema::products;
use crate::vector::encode;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Product {
    pub id: i32,
    pub source: String,
    pub url: String,
    pub name: String,
    pub description: String,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub name_emb: Option<Vec<u8>>,
    pub descr_emb: Option<Vec<u8>>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProductEmbeddings {
    pub id: i32,
    pub source: String,
    pub name_emb: Option<Vec<u8>>,
    pub descr_emb: Option<Vec<u8>>,
}

/// Insert/update payload. Absent optional fields overwrite stored values
/// with `NULL`, so saving a product replaces the whole row.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = products)]
#[diesel(treat_none_as_null = true)]
pub struct NewProduct<'a> {
    pub source: &'a str,
    pub url: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub price: Option<f64>,
    pub image_url: Option<&'a str>,
    pub name_emb: Option<Vec<u8>>,
    pub descr_emb: Option<Vec<u8>>,
}

impl<'a> From<&'a DomainProduct> for NewProduct<'a> {
    fn from(product: &'a DomainProduct) -> Self {
        Self {
            source: &product.source,
            url: &product.url,
            name: &product.name,
            description: &product.description,
            price: product.price,
            image_url: product.image_url.as_deref(),
            name_emb: product.name_embedding.as_deref().map(encode),
            descr_emb: product.description_embedding.as_deref().map(encode),
        }
    }
}
