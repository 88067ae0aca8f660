//! GraphQL documents and their variables/response shapes.
//!
//! Only the fields needed to build cart and wishlist payloads are selected.

use serde::{Deserialize, Serialize};

use crate::shopify::types::{Product, ProductConnection};

macro_rules! product_fields {
    () => {
        r"
fragment ProductFields on Product {
  id
  handle
  title
  description
  availableForSale
  priceRange {
    minVariantPrice { amount currencyCode }
    maxVariantPrice { amount currencyCode }
  }
  compareAtPriceRange {
    minVariantPrice { amount currencyCode }
    maxVariantPrice { amount currencyCode }
  }
  images(first: 10) { nodes { url altText } }
  options { name values }
  variants(first: 100) {
    nodes {
      id
      title
      availableForSale
      price { amount currencyCode }
      compareAtPrice { amount currencyCode }
      selectedOptions { name value }
    }
  }
}
"
    };
}

pub const GET_PRODUCT_BY_HANDLE: &str = concat!(
    r"
query GetProductByHandle($handle: String!) {
  product(handle: $handle) { ...ProductFields }
}
",
    product_fields!()
);

pub const GET_PRODUCTS: &str = concat!(
    r"
query GetProducts($first: Int!, $query: String) {
  products(first: $first, query: $query) {
    nodes { ...ProductFields }
    pageInfo { hasNextPage endCursor }
  }
}
",
    product_fields!()
);

#[derive(Debug, Serialize)]
pub struct GetProductByHandleVariables {
    pub handle: String,
}

#[derive(Debug, Deserialize)]
pub struct GetProductByHandleData {
    pub product: Option<Product>,
}

#[derive(Debug, Serialize)]
pub struct GetProductsVariables {
    pub first: i64,
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GetProductsData {
    pub products: ProductConnection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_include_fragment() {
        for doc in [GET_PRODUCT_BY_HANDLE, GET_PRODUCTS] {
            assert!(doc.contains("...ProductFields"));
            assert!(doc.contains("fragment ProductFields on Product"));
        }
    }
}
