//! OpenAPI schema definitions for the paginated envelope.
//!
//! The `pagination` crate stays free of utoipa, so each concrete
//! `Paginated<T>` returned by a handler gets a schema wrapper here that
//! mirrors its serialised shape.

use utoipa::ToSchema;

use crate::domain::{InventoryItem, InventoryMovement, Order, Purchase, User};
use crate::inbound::http::catalog::ProductResponse;

macro_rules! page_schema {
    ($(#[$meta:meta])* $name:ident, $item:ty) => {
        $(#[$meta])*
        #[derive(ToSchema)]
        #[expect(
            dead_code,
            reason = "Used only for OpenAPI schema generation via utoipa"
        )]
        pub struct $name {
            /// Rows on this page.
            items: Vec<$item>,
            /// One-based page number.
            #[schema(example = 1)]
            page: u32,
            /// Page size used for the query.
            #[schema(example = 20)]
            limit: u32,
            /// Rows matching the query across all pages.
            total: u64,
            /// Pages needed to show `total` rows.
            total_pages: u64,
        }
    };
}

page_schema!(
    /// Page of storefront products.
    ProductPage,
    ProductResponse
);
page_schema!(
    /// Page of orders.
    OrderPage,
    Order
);
page_schema!(
    /// Page of users.
    UserPage,
    User
);
page_schema!(
    /// Page of inventory items.
    InventoryPage,
    InventoryItem
);
page_schema!(
    /// Page of inventory movements.
    MovementPage,
    InventoryMovement
);
page_schema!(
    /// Page of supplier purchases.
    PurchasePage,
    Purchase
);

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::PartialSchema;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    #[test]
    fn page_schema_lists_envelope_fields() {
        let RefOr::T(Schema::Object(object)) = OrderPage::schema() else {
            panic!("expected object schema");
        };
        for field in ["items", "page", "limit", "total", "total_pages"] {
            assert!(object.properties.contains_key(field), "missing {field}");
        }
    }
}
