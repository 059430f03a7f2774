//! # Collections
//!
//! Read-only view of the three marketplace collections and the rows search returns.
//!
//! ## Schema
//! - `vendors`: name, surname, email, optional phone/image
//! - `ventures`: commercialName, description, location.city, status, vendor (ObjectId)
//! - `products`: name, description, price, stock, optional image, venture (ObjectId)
//!
//! Owner context on result rows (`ventureName`, `ownerName`) is joined in at query
//! time and never stored.
use mongodb::bson::{oid::ObjectId, serde_helpers::serialize_object_id_as_hex_string};
use serde::{Deserialize, Serialize};

/// Binds a document type to the collection that stores it.
pub trait Model {
    const COLLECTION: &'static str;
}

pub const VENDOR_NAME: &str = "name";
pub const VENDOR_SURNAME: &str = "surname";
pub const VENDOR_EMAIL: &str = "email";

pub const VENTURE_COMMERCIAL_NAME: &str = "commercialName";
pub const VENTURE_DESCRIPTION: &str = "description";
pub const VENTURE_CITY: &str = "location.city";
pub const VENTURE_VENDOR: &str = "vendor";

pub const PRODUCT_NAME: &str = "name";
pub const PRODUCT_DESCRIPTION: &str = "description";
pub const PRODUCT_VENTURE: &str = "venture";

pub const VENTURE_NAME: &str = "ventureName";
pub const OWNER_NAME: &str = "ownerName";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub surname: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl Model for Vendor {
    const COLLECTION: &'static str = "vendors";
}

impl Vendor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname).trim().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VentureStatus {
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub city: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venture {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub commercial_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Location,
    pub status: VentureStatus,
    pub vendor: ObjectId,
}

impl Model for Venture {
    const COLLECTION: &'static str = "ventures";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub stock: i64,
    #[serde(default)]
    pub image: Option<String>,
    pub venture: ObjectId,
}

impl Model for Product {
    const COLLECTION: &'static str = "products";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorHit {
    #[serde(rename = "_id", serialize_with = "serialize_object_id_as_hex_string")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub surname: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl From<&Vendor> for VendorHit {
    fn from(vendor: &Vendor) -> Self {
        Self {
            id: vendor.id,
            name: vendor.name.clone(),
            surname: vendor.surname.clone(),
            email: vendor.email.clone(),
            phone: vendor.phone.clone(),
            image: vendor.image.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VentureHit {
    #[serde(rename = "_id", serialize_with = "serialize_object_id_as_hex_string")]
    pub id: ObjectId,
    pub commercial_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Location,
    pub status: VentureStatus,
    #[serde(serialize_with = "serialize_object_id_as_hex_string")]
    pub vendor: ObjectId,
    pub owner_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductHit {
    #[serde(rename = "_id", serialize_with = "serialize_object_id_as_hex_string")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub stock: i64,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(serialize_with = "serialize_object_id_as_hex_string")]
    pub venture: ObjectId,
    pub venture_name: String,
    pub owner_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorSuggestion {
    #[serde(rename = "_id", serialize_with = "serialize_object_id_as_hex_string")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub surname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VentureSuggestion {
    #[serde(rename = "_id", serialize_with = "serialize_object_id_as_hex_string")]
    pub id: ObjectId,
    pub commercial_name: String,
    #[serde(default)]
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSuggestion {
    #[serde(rename = "_id", serialize_with = "serialize_object_id_as_hex_string")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub venture_name: String,
}
