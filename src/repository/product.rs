use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::domain::product::{Product, ProductEmbeddings};
use crate::models::product::{
    NewProduct as DbNewProduct, Product as DbProduct, ProductEmbeddings as DbProductEmbeddings,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, ProductReader, ProductWriter};
use crate::vector::decode;

/// Decode a stored embedding blob.
///
/// A blob that does not match the configured dimensionality is logged and
/// treated as a missing embedding, so the product itself is still returned.
fn hydrate_embedding(
    blob: Option<Vec<u8>>,
    dimensions: usize,
    product_id: i32,
    field: &str,
) -> Option<Vec<f32>> {
    let blob = blob?;
    match decode(&blob, dimensions) {
        Ok(embedding) => Some(embedding),
        Err(e) => {
            log::warn!("Skipping {field} embedding of product {product_id}: {e}");
            None
        }
    }
}

impl DieselRepository {
    fn hydrate_product(&self, db_product: DbProduct) -> Product {
        Product {
            id: Some(db_product.id),
            name_embedding: hydrate_embedding(
                db_product.name_emb,
                self.dimensions,
                db_product.id,
                "name",
            ),
            description_embedding: hydrate_embedding(
                db_product.descr_emb,
                self.dimensions,
                db_product.id,
                "description",
            ),
            source: db_product.source,
            url: db_product.url,
            name: db_product.name,
            description: db_product.description,
            price: db_product.price,
            image_url: db_product.image_url,
        }
    }
}

impl ProductReader for DieselRepository {
    fn list_products(&self, source: &str) -> RepositoryResult<Vec<Product>> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let products = products::table
            .filter(products::source.eq(source))
            .order(products::id.asc())
            .select(DbProduct::as_select())
            .load(&mut conn)?;

        Ok(products
            .into_iter()
            .map(|db_product| self.hydrate_product(db_product))
            .collect())
    }

    fn list_embeddings(&self, source: &str) -> RepositoryResult<Vec<ProductEmbeddings>> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let rows = products::table
            .filter(products::source.eq(source))
            .order(products::id.asc())
            .select(DbProductEmbeddings::as_select())
            .load(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|row| ProductEmbeddings {
                product_id: row.id,
                name_embedding: hydrate_embedding(row.name_emb, self.dimensions, row.id, "name"),
                description_embedding: hydrate_embedding(
                    row.descr_emb,
                    self.dimensions,
                    row.id,
                    "description",
                ),
                source: row.source,
            })
            .collect())
    }
}

fn upsert_products(conn: &mut SqliteConnection, products: &[Product]) -> QueryResult<usize> {
    use crate::schema::products;

    let mut affected_rows = 0;
    for product in products {
        let db_product = DbNewProduct::from(product);
        diesel::insert_into(products::table)
            .values(&db_product)
            .on_conflict((products::source, products::url))
            .do_update()
            .set((&db_product, products::updated_at.eq(Utc::now().naive_utc())))
            .execute(conn)?;
        affected_rows += 1;
    }
    Ok(affected_rows)
}

impl ProductWriter for DieselRepository {
    fn save_products(&self, products: &[Product]) -> RepositoryResult<usize> {
        if products.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;

        let affected = conn.transaction(|conn| upsert_products(conn, products))?;

        Ok(affected)
    }

    fn delete_products(&self, source: &str) -> RepositoryResult<usize> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let deleted =
            diesel::delete(products::table.filter(products::source.eq(source))).execute(&mut conn)?;

        Ok(deleted)
    }

    fn replace_products(
        &self,
        source: &str,
        products: &[Product],
    ) -> RepositoryResult<(usize, usize)> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let counts = conn.transaction(|conn| {
            let deleted =
                diesel::delete(products::table.filter(products::source.eq(source))).execute(conn)?;
            let saved = upsert_products(conn, products)?;
            Ok::<(usize, usize), RepositoryError>((deleted, saved))
        })?;

        Ok(counts)
    }
}
