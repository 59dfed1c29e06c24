//! Core records shared by the data source and the verification harness
//!
//! Every record serializes to the same JSON mapping the Stylish API uses for
//! the equivalent entity, so ground truth and observed responses can be
//! compared as `serde_json::Value`s without a translation layer.

use serde::{Deserialize, Serialize};

/// Login provider accepted by `/user/login`
pub const NATIVE_PROVIDER: &str = "native";

/// A fixture account, scoped to one worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub email: String,
    pub password: String,
}

impl Account {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Login body for the native provider
    pub fn native_credentials(&self) -> Credentials {
        Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
            provider: Some(NATIVE_PROVIDER.to_string()),
        }
    }

    /// Login body with the provider flag left out
    pub fn credentials_without_provider(&self) -> Credentials {
        Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
            provider: None,
        }
    }
}

/// Body of a login request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// `id, category, title` of one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTitle {
    pub id: i64,
    pub category: String,
    pub title: String,
}

/// One row of the product ⋈ product_images ⋈ variant ⋈ color join.
///
/// A product with `n` images and `m` variants yields `n * m` rows; the
/// harness folds them back into a [`ProductSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetailRow {
    pub id: i64,
    pub category: String,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub texture: String,
    pub wash: String,
    pub place: String,
    pub note: String,
    pub story: String,
    pub main_image: String,
    pub image_id: i64,
    pub image: String,
    pub variant_id: i64,
    pub color_id: i64,
    pub color_code: String,
    pub color_name: String,
    pub size: String,
    pub stock: i64,
}

/// A product as rendered by `/products/*`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: i64,
    pub category: String,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub texture: String,
    pub wash: String,
    pub place: String,
    pub note: String,
    pub story: String,
    pub main_image: String,
    pub images: Vec<String>,
    pub variants: Vec<Variant>,
    pub colors: Vec<Color>,
    pub sizes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub color_code: String,
    pub size: String,
    pub stock: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Color {
    pub code: String,
    pub name: String,
}

/// Public columns of the `user` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub provider: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

impl UserRecord {
    /// The mapping `/user/profile` returns: the record without its id
    pub fn profile(&self) -> serde_json::Value {
        serde_json::json!({
            "provider": self.provider,
            "email": self.email,
            "name": self.name,
            "picture": self.picture,
        })
    }
}

/// A persisted order, with `details` already decoded from its JSON column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: i64,
    pub number: String,
    pub time: i64,
    pub status: i64,
    pub details: serde_json::Value,
    pub user_id: i64,
    pub total: i64,
}
