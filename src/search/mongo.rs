//! # MongoDB
//!
//! Production [`Catalog`] over the `vendors`, `ventures` and `products` collections.
//!
//! ## Queries
//! - Vendors: plain `find` with an `$or` filter plus `count_documents`
//! - Ventures: `$lookup` vendor, derive `ownerName`, `$match`
//! - Products: `$lookup` venture then vendor, derive `ventureName` and `ownerName`, `$match`
//!
//! The page and the count for one entity type run concurrently and share the
//! same filter and collation, so `total` always describes the rows being paged.
//! The join is rebuilt for the count instead of being cached.
//!
//! ## Commands
//!
//! Seed a vendor and query it back.
//! ```sh
//! mongosh marketplace --eval 'db.vendors.insertOne({name: "Maria", surname: "Lopez", email: "maria@example.com"})'
//! curl 'http://localhost:8080/emprendedores/search?q=mar'
//! ```
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{self, Bson, Document, doc},
    options::{Collation, CollationStrength},
};
use serde::de::DeserializeOwned;

use super::{Catalog, SearchPage, StoreError};
use crate::{
    models::{
        Model, OWNER_NAME, PRODUCT_DESCRIPTION, PRODUCT_NAME, PRODUCT_VENTURE, Product,
        ProductHit, ProductSuggestion, VENDOR_EMAIL, VENDOR_NAME, VENDOR_SURNAME, VENTURE_CITY,
        VENTURE_COMMERCIAL_NAME, VENTURE_DESCRIPTION, VENTURE_NAME, VENTURE_VENDOR, Vendor,
        VendorHit, VendorSuggestion, Venture, VentureHit, VentureSuggestion,
    },
    pattern::Pattern,
    query::Window,
};

const COUNT_FIELD: &str = "total";

#[derive(Clone)]
pub struct MongoCatalog {
    database: Database,
    collation: Collation,
}

impl MongoCatalog {
    /// Strength 1 collation ignores both case and accents.
    pub fn new(database: Database, locale: &str) -> Self {
        let collation = Collation::builder()
            .locale(locale)
            .strength(CollationStrength::Primary)
            .build();

        Self {
            database,
            collation,
        }
    }

    fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.database.collection::<T>(name)
    }

    async fn aggregate<T>(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let documents: Vec<Document> = self
            .collection::<Document>(collection)
            .aggregate(pipeline)
            .collation(self.collation.clone())
            .await?
            .try_collect()
            .await?;

        documents
            .into_iter()
            .map(|document| bson::from_document(document).map_err(StoreError::from))
            .collect()
    }

    async fn aggregate_count(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> Result<u64, StoreError> {
        let counted: Vec<Document> = self
            .collection::<Document>(collection)
            .aggregate(pipeline)
            .collation(self.collation.clone())
            .await?
            .try_collect()
            .await?;

        Ok(counted.first().map(read_count).unwrap_or(0))
    }

    async fn aggregate_page<T>(
        &self,
        collection: &str,
        base: Vec<Document>,
        projection: Document,
        window: Window,
    ) -> Result<SearchPage<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let fetch = page_pipeline(base.clone(), projection, window);
        let count = count_pipeline(base);

        let (items, total) = tokio::try_join!(
            self.aggregate::<T>(collection, fetch),
            self.aggregate_count(collection, count),
        )?;

        Ok(SearchPage { items, total })
    }

    async fn find_vendors<T>(
        &self,
        pattern: &Pattern,
        projection: Document,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned + Unpin + Send + Sync,
    {
        let items = self
            .collection::<T>(Vendor::COLLECTION)
            .find(vendor_filter(pattern))
            .projection(projection)
            .collation(self.collation.clone())
            .sort(doc! { "_id": 1 })
            .skip(skip)
            .limit(limit as i64)
            .await?
            .try_collect()
            .await?;

        Ok(items)
    }
}

#[async_trait]
impl Catalog for MongoCatalog {
    async fn products(
        &self,
        pattern: &Pattern,
        window: Window,
    ) -> Result<SearchPage<ProductHit>, StoreError> {
        self.aggregate_page(
            Product::COLLECTION,
            product_pipeline(pattern),
            product_projection(),
            window,
        )
        .await
    }

    async fn ventures(
        &self,
        pattern: &Pattern,
        window: Window,
    ) -> Result<SearchPage<VentureHit>, StoreError> {
        self.aggregate_page(
            Venture::COLLECTION,
            venture_pipeline(pattern),
            venture_projection(),
            window,
        )
        .await
    }

    async fn vendors(
        &self,
        pattern: &Pattern,
        window: Window,
    ) -> Result<SearchPage<VendorHit>, StoreError> {
        let vendors = self.collection::<VendorHit>(Vendor::COLLECTION);

        let count = async {
            vendors
                .count_documents(vendor_filter(pattern))
                .collation(self.collation.clone())
                .await
                .map_err(StoreError::from)
        };

        let (items, total) = tokio::try_join!(
            self.find_vendors::<VendorHit>(
                pattern,
                vendor_projection(),
                window.skip(),
                window.limit,
            ),
            count,
        )?;

        Ok(SearchPage { items, total })
    }

    async fn product_suggestions(
        &self,
        pattern: &Pattern,
        limit: u32,
    ) -> Result<Vec<ProductSuggestion>, StoreError> {
        let pipeline = suggestion_pipeline(
            product_pipeline(pattern),
            doc! { "_id": 1, "name": 1, "image": 1, VENTURE_NAME: 1 },
            limit,
        );

        self.aggregate(Product::COLLECTION, pipeline).await
    }

    async fn venture_suggestions(
        &self,
        pattern: &Pattern,
        limit: u32,
    ) -> Result<Vec<VentureSuggestion>, StoreError> {
        let pipeline = suggestion_pipeline(
            venture_pipeline(pattern),
            doc! { "_id": 1, "commercialName": 1, "location": 1 },
            limit,
        );

        self.aggregate(Venture::COLLECTION, pipeline).await
    }

    async fn vendor_suggestions(
        &self,
        pattern: &Pattern,
        limit: u32,
    ) -> Result<Vec<VendorSuggestion>, StoreError> {
        self.find_vendors(
            pattern,
            doc! { "_id": 1, "name": 1, "surname": 1 },
            0,
            limit,
        )
        .await
    }
}

/// `{ $regex, $options: "i" }` for one field.
fn regex(pattern: &Pattern) -> Document {
    doc! { "$regex": pattern.source(), "$options": "i" }
}

fn any_field_matches(fields: &[&str], pattern: &Pattern) -> Document {
    let clauses: Vec<Document> = fields
        .iter()
        .map(|field| {
            let mut clause = Document::new();
            clause.insert(*field, regex(pattern));
            clause
        })
        .collect();

    doc! { "$or": clauses }
}

/// `$concat` yields null on a missing operand, so both parts default to "".
fn full_name(prefix: &str) -> Document {
    doc! {
        "$trim": {
            "input": {
                "$concat": [
                    { "$ifNull": [format!("${prefix}.name"), ""] },
                    " ",
                    { "$ifNull": [format!("${prefix}.surname"), ""] },
                ]
            }
        }
    }
}

fn lookup(from: &str, local_field: &str, alias: &str) -> [Document; 2] {
    [
        doc! {
            "$lookup": {
                "from": from,
                "localField": local_field,
                "foreignField": "_id",
                "as": alias,
            }
        },
        doc! { "$unwind": format!("${alias}") },
    ]
}

pub fn vendor_filter(pattern: &Pattern) -> Document {
    any_field_matches(&[VENDOR_NAME, VENDOR_SURNAME, VENDOR_EMAIL], pattern)
}

/// Join and filter stages shared by the venture page, count and suggestions.
pub fn venture_pipeline(pattern: &Pattern) -> Vec<Document> {
    let mut pipeline = Vec::with_capacity(4);
    pipeline.extend(lookup(Vendor::COLLECTION, VENTURE_VENDOR, "owner"));
    pipeline.push(doc! { "$addFields": { OWNER_NAME: full_name("owner") } });
    pipeline.push(doc! {
        "$match": any_field_matches(
            &[VENTURE_COMMERCIAL_NAME, VENTURE_DESCRIPTION, VENTURE_CITY, OWNER_NAME],
            pattern,
        )
    });
    pipeline
}

/// Join and filter stages shared by the product page, count and suggestions.
pub fn product_pipeline(pattern: &Pattern) -> Vec<Document> {
    let mut pipeline = Vec::with_capacity(6);
    pipeline.extend(lookup(Venture::COLLECTION, PRODUCT_VENTURE, "shop"));
    pipeline.extend(lookup(Vendor::COLLECTION, "shop.vendor", "owner"));
    pipeline.push(doc! {
        "$addFields": {
            VENTURE_NAME: "$shop.commercialName",
            OWNER_NAME: full_name("owner"),
        }
    });
    pipeline.push(doc! {
        "$match": any_field_matches(
            &[PRODUCT_NAME, PRODUCT_DESCRIPTION, VENTURE_NAME, OWNER_NAME],
            pattern,
        )
    });
    pipeline
}

pub fn page_pipeline(
    mut base: Vec<Document>,
    projection: Document,
    window: Window,
) -> Vec<Document> {
    base.extend([
        doc! { "$sort": { "_id": 1 } },
        doc! { "$skip": window.skip() as i64 },
        doc! { "$limit": window.limit as i64 },
        doc! { "$project": projection },
    ]);
    base
}

pub fn count_pipeline(mut base: Vec<Document>) -> Vec<Document> {
    base.push(doc! { "$count": COUNT_FIELD });
    base
}

fn suggestion_pipeline(mut base: Vec<Document>, projection: Document, limit: u32) -> Vec<Document> {
    base.extend([
        doc! { "$sort": { "_id": 1 } },
        doc! { "$limit": limit as i64 },
        doc! { "$project": projection },
    ]);
    base
}

fn vendor_projection() -> Document {
    doc! { "_id": 1, "name": 1, "surname": 1, "email": 1, "phone": 1, "image": 1 }
}

fn venture_projection() -> Document {
    doc! {
        "_id": 1,
        "commercialName": 1,
        "description": 1,
        "location": 1,
        "status": 1,
        "vendor": 1,
        OWNER_NAME: 1,
    }
}

fn product_projection() -> Document {
    doc! {
        "_id": 1,
        "name": 1,
        "description": 1,
        "price": 1,
        "stock": 1,
        "image": 1,
        "venture": 1,
        VENTURE_NAME: 1,
        OWNER_NAME: 1,
    }
}

fn read_count(document: &Document) -> u64 {
    match document.get(COUNT_FIELD) {
        Some(Bson::Int32(n)) => (*n).max(0) as u64,
        Some(Bson::Int64(n)) => (*n).max(0) as u64,
        _ => 0,
    }
}
