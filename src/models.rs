use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// A catalog entry as stored in Sled and returned by the API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct Product {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub price: f64,
}

/// Body of `POST /products`.
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct ProductCreate {
    pub title: String,
    pub description: String,
    pub price: f64,
}

impl ProductCreate {
    pub fn into_product(self, id: u64) -> Product {
        let ProductCreate { title, description, price } = self;
        Product { id, title, description, price }
    }
}

/// Body of `PUT /products/{id}`. Every field is required; there is no partial update.
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct ProductUpdate {
    pub title: String,
    pub description: String,
    pub price: f64,
}

impl ProductUpdate {
    /// Overwrites each field of `product`. The id is never touched.
    pub fn apply_to(&self, product: &mut Product) {
        let ProductUpdate { title, description, price } = self;
        product.title.clone_from(title);
        product.description.clone_from(description);
        product.price = *price;
    }
}

#[derive(Deserialize, Debug, Clone, Copy, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// Number of products to skip
    #[serde(default)]
    pub skip: usize,
    /// Maximum number of products to return
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

/// Form body of `POST /token`.
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// JWT claims carried by access tokens.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthPayload {
    pub sub: String, // username
    pub iat: u64,
    pub exp: u64,
}

/// A username with its bcrypt hash, as handed out by an identity provider.
#[derive(Debug, Clone)]
pub struct Credential {
    pub username: String,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_replaces_every_field_but_id() {
        let mut product = ProductCreate {
            title: "Old".to_string(),
            description: "Old description".to_string(),
            price: 1.0,
        }
        .into_product(7);

        ProductUpdate {
            title: "New".to_string(),
            description: "New description".to_string(),
            price: 2.5,
        }
        .apply_to(&mut product);

        assert_eq!(product.id, 7);
        assert_eq!(product.title, "New");
        assert_eq!(product.description, "New description");
        assert_eq!(product.price, 2.5);
    }

    #[test]
    fn pagination_defaults() {
        let page: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(page.skip, 0);
        assert_eq!(page.limit, 10);
    }
}
