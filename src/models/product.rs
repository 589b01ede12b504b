use serde::{Deserialize, Serialize};

/// One row of the `products` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i32,
    pub name: String,
    /// No bounds enforced; negative stock is stored as given.
    pub stock: i32,
}

// ── Request payloads ─────────────────────────────────────────────────────────

/// Body of `POST /products`. A client-supplied `id` is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub stock: i32,
}

/// Body of `PUT /products/:id`. The path id is authoritative; `id` here is
/// optional and must agree with it when present.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProduct {
    #[serde(default)]
    pub id: Option<i32>,
    pub name: String,
    pub stock: i32,
}

impl CreateProduct {
    pub fn into_product(self, id: i32) -> Product {
        Product {
            id,
            name: self.name,
            stock: self.stock,
        }
    }
}

impl UpdateProduct {
    pub fn into_product(self, id: i32) -> Product {
        Product {
            id,
            name: self.name,
            stock: self.stock,
        }
    }
}
