//! In-process [`Catalog`] with the same join and filter rules as the MongoDB one.
//!
//! Rows are kept in `_id` order, products and ventures whose owner chain is
//! broken are skipped, and every call is counted so tests can assert that a
//! request never reached the store. Individual entity types can be made to fail.
use std::{
    collections::HashSet,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use super::{Catalog, SearchPage, StoreError};
use crate::{
    models::{
        Location, Product, ProductHit, ProductSuggestion, Vendor, VendorHit, VendorSuggestion,
        Venture, VentureHit, VentureStatus, VentureSuggestion,
    },
    pattern::Pattern,
    query::{EntityType, Window},
};

#[derive(Debug, Default)]
pub struct MemoryCatalog {
    vendors: Vec<Vendor>,
    ventures: Vec<Venture>,
    products: Vec<Product>,
    failing: HashSet<EntityType>,
    queries: AtomicUsize,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vendor(&mut self, name: &str, surname: &str, email: &str) -> ObjectId {
        let id = ObjectId::new();
        self.insert_vendor(Vendor {
            id,
            name: name.to_string(),
            surname: surname.to_string(),
            email: email.to_string(),
            phone: None,
            image: None,
        });
        id
    }

    pub fn add_venture(
        &mut self,
        vendor: ObjectId,
        commercial_name: &str,
        description: &str,
        city: &str,
    ) -> ObjectId {
        let id = ObjectId::new();
        self.insert_venture(Venture {
            id,
            commercial_name: commercial_name.to_string(),
            description: description.to_string(),
            location: Location {
                city: city.to_string(),
            },
            status: VentureStatus::Active,
            vendor,
        });
        id
    }

    pub fn add_product(
        &mut self,
        venture: ObjectId,
        name: &str,
        description: &str,
        price: f64,
        stock: i64,
    ) -> ObjectId {
        let id = ObjectId::new();
        self.insert_product(Product {
            id,
            name: name.to_string(),
            description: description.to_string(),
            price,
            stock,
            image: None,
            venture,
        });
        id
    }

    pub fn insert_vendor(&mut self, vendor: Vendor) {
        self.vendors.push(vendor);
        self.vendors.sort_by_key(|vendor| vendor.id);
    }

    pub fn insert_venture(&mut self, venture: Venture) {
        self.ventures.push(venture);
        self.ventures.sort_by_key(|venture| venture.id);
    }

    pub fn insert_product(&mut self, product: Product) {
        self.products.push(product);
        self.products.sort_by_key(|product| product.id);
    }

    pub fn fail_on(&mut self, entity: EntityType) {
        self.failing.insert(entity);
    }

    pub fn queries_issued(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn query(&self, entity: EntityType) -> Result<(), StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(&entity) {
            return Err(StoreError::Unavailable(format!("{entity} collection offline")));
        }

        Ok(())
    }

    fn vendor(&self, id: ObjectId) -> Option<&Vendor> {
        self.vendors.iter().find(|vendor| vendor.id == id)
    }

    fn venture(&self, id: ObjectId) -> Option<&Venture> {
        self.ventures.iter().find(|venture| venture.id == id)
    }

    fn vendor_rows(&self, pattern: &Pattern) -> Vec<VendorHit> {
        self.vendors
            .iter()
            .filter(|vendor| {
                pattern.is_match(&vendor.name)
                    || pattern.is_match(&vendor.surname)
                    || pattern.is_match(&vendor.email)
            })
            .map(VendorHit::from)
            .collect()
    }

    fn venture_rows(&self, pattern: &Pattern) -> Vec<VentureHit> {
        self.ventures
            .iter()
            .filter_map(|venture| {
                let owner_name = self.vendor(venture.vendor)?.full_name();

                let matched = pattern.is_match(&venture.commercial_name)
                    || pattern.is_match(&venture.description)
                    || pattern.is_match(&venture.location.city)
                    || pattern.is_match(&owner_name);

                matched.then(|| VentureHit {
                    id: venture.id,
                    commercial_name: venture.commercial_name.clone(),
                    description: venture.description.clone(),
                    location: venture.location.clone(),
                    status: venture.status,
                    vendor: venture.vendor,
                    owner_name,
                })
            })
            .collect()
    }

    fn product_rows(&self, pattern: &Pattern) -> Vec<ProductHit> {
        self.products
            .iter()
            .filter_map(|product| {
                let venture = self.venture(product.venture)?;
                let owner_name = self.vendor(venture.vendor)?.full_name();

                let matched = pattern.is_match(&product.name)
                    || pattern.is_match(&product.description)
                    || pattern.is_match(&venture.commercial_name)
                    || pattern.is_match(&owner_name);

                matched.then(|| ProductHit {
                    id: product.id,
                    name: product.name.clone(),
                    description: product.description.clone(),
                    price: product.price,
                    stock: product.stock,
                    image: product.image.clone(),
                    venture: venture.id,
                    venture_name: venture.commercial_name.clone(),
                    owner_name,
                })
            })
            .collect()
    }
}

fn paginate<T>(rows: Vec<T>, window: Window) -> SearchPage<T> {
    let total = rows.len() as u64;
    let items = rows
        .into_iter()
        .skip(window.skip() as usize)
        .take(window.limit as usize)
        .collect();

    SearchPage { items, total }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn products(
        &self,
        pattern: &Pattern,
        window: Window,
    ) -> Result<SearchPage<ProductHit>, StoreError> {
        self.query(EntityType::Product)?;
        Ok(paginate(self.product_rows(pattern), window))
    }

    async fn ventures(
        &self,
        pattern: &Pattern,
        window: Window,
    ) -> Result<SearchPage<VentureHit>, StoreError> {
        self.query(EntityType::Venture)?;
        Ok(paginate(self.venture_rows(pattern), window))
    }

    async fn vendors(
        &self,
        pattern: &Pattern,
        window: Window,
    ) -> Result<SearchPage<VendorHit>, StoreError> {
        self.query(EntityType::Vendor)?;
        Ok(paginate(self.vendor_rows(pattern), window))
    }

    async fn product_suggestions(
        &self,
        pattern: &Pattern,
        limit: u32,
    ) -> Result<Vec<ProductSuggestion>, StoreError> {
        self.query(EntityType::Product)?;

        Ok(self
            .product_rows(pattern)
            .into_iter()
            .take(limit as usize)
            .map(|hit| ProductSuggestion {
                id: hit.id,
                name: hit.name,
                image: hit.image,
                venture_name: hit.venture_name,
            })
            .collect())
    }

    async fn venture_suggestions(
        &self,
        pattern: &Pattern,
        limit: u32,
    ) -> Result<Vec<VentureSuggestion>, StoreError> {
        self.query(EntityType::Venture)?;

        Ok(self
            .venture_rows(pattern)
            .into_iter()
            .take(limit as usize)
            .map(|hit| VentureSuggestion {
                id: hit.id,
                commercial_name: hit.commercial_name,
                location: hit.location,
            })
            .collect())
    }

    async fn vendor_suggestions(
        &self,
        pattern: &Pattern,
        limit: u32,
    ) -> Result<Vec<VendorSuggestion>, StoreError> {
        self.query(EntityType::Vendor)?;

        Ok(self
            .vendor_rows(pattern)
            .into_iter()
            .take(limit as usize)
            .map(|hit| VendorSuggestion {
                id: hit.id,
                name: hit.name,
                surname: hit.surname,
            })
            .collect())
    }
}
