//! PostgreSQL-backed `OrderRepository` implementation using Diesel ORM.
//!
//! Checkout runs in one transaction: inventory rows are locked in product id
//! order, prices are read at that moment and copied into `order_items`, stock
//! is decremented with a `sale` movement and the ordered products leave the
//! customer's cart. Cancelling an order returns its stock the same way.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use pagination::{PageRequest, Paginated};
use tracing::debug;

use crate::domain::ports::{OrderRepository, RepositoryError};
use crate::domain::{
    InvalidTransition, MovementKind, Order, OrderDraft, OrderId, OrderStatus, StatusChange,
    StockShortage, UserId, effective_price,
};

use super::diesel_error_mapping::{count_to_total, map_diesel_error, map_pool_error};
use super::diesel_stock::{Movement, apply_delta, in_lock_order, increase, lock_quantities};
use super::models::{NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow, ProductRow};
use super::pool::DbPool;
use super::schema::{cart_items, order_items, orders, products};

/// Diesel-backed implementation of the `OrderRepository` port.
#[derive(Clone)]
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Priced line ready to insert.
struct PricedLine {
    product: ProductRow,
    quantity: i32,
    unit_price: i64,
    line_total: i64,
}

fn price_lines(
    draft: &OrderDraft,
    mut products_by_id: HashMap<i64, ProductRow>,
    stock: &HashMap<i64, i32>,
) -> Result<Vec<PricedLine>, RepositoryError> {
    draft
        .lines()
        .iter()
        .map(|line| -> Result<PricedLine, RepositoryError> {
            let product = products_by_id
                .remove(&line.product_id)
                .filter(|product| product.is_active)
                .ok_or_else(|| {
                    RepositoryError::not_found(format!("product {} not found", line.product_id))
                })?;
            let available = stock.get(&line.product_id).copied().unwrap_or(0);
            if available < line.quantity {
                return Err(StockShortage {
                    product_id: line.product_id,
                    available,
                    requested: line.quantity,
                }
                .into());
            }
            let unit_price = effective_price(product.price, product.sale_price);
            let line_total = unit_price
                .checked_mul(i64::from(line.quantity))
                .ok_or_else(|| RepositoryError::constraint("order line total overflows"))?;
            Ok(PricedLine {
                product,
                quantity: line.quantity,
                unit_price,
                line_total,
            })
        })
        .collect()
}

fn sum_totals(lines: &[PricedLine]) -> Result<i64, RepositoryError> {
    lines
        .iter()
        .try_fold(0_i64, |total, line| total.checked_add(line.line_total))
        .ok_or_else(|| RepositoryError::constraint("order total overflows"))
}

fn orders_with_status(status: Option<OrderStatus>) -> orders::BoxedQuery<'static, Pg> {
    let mut query = orders::table.into_boxed();
    if let Some(status) = status {
        query = query.filter(orders::status.eq(status.as_str()));
    }
    query
}

async fn load_items(
    conn: &mut AsyncPgConnection,
    order_ids: &[OrderId],
) -> Result<HashMap<OrderId, Vec<OrderItemRow>>, RepositoryError> {
    let rows: Vec<OrderItemRow> = order_items::table
        .filter(order_items::order_id.eq_any(order_ids))
        .select(OrderItemRow::as_select())
        .order((order_items::order_id.asc(), order_items::id.asc()))
        .load(conn)
        .await?;
    let mut grouped: HashMap<OrderId, Vec<OrderItemRow>> = HashMap::new();
    for row in rows {
        grouped.entry(row.order_id).or_default().push(row);
    }
    Ok(grouped)
}

async fn assemble(
    conn: &mut AsyncPgConnection,
    rows: Vec<OrderRow>,
) -> Result<Vec<Order>, RepositoryError> {
    let ids: Vec<OrderId> = rows.iter().map(|row| row.id).collect();
    let mut items = load_items(conn, &ids).await?;
    rows.into_iter()
        .map(|row| {
            let order_items = items.remove(&row.id).unwrap_or_default();
            row.into_order(order_items)
        })
        .collect()
}

async fn place_in_transaction(
    conn: &mut AsyncPgConnection,
    user_id: UserId,
    draft: &OrderDraft,
) -> Result<Order, RepositoryError> {
    let product_ids: Vec<i64> = draft.lines().iter().map(|line| line.product_id).collect();
    let stock: HashMap<i64, i32> = lock_quantities(conn, &product_ids)
        .await?
        .into_iter()
        .collect();
    let products_by_id: HashMap<i64, ProductRow> = products::table
        .filter(products::id.eq_any(&product_ids))
        .select(ProductRow::as_select())
        .load::<ProductRow>(conn)
        .await?
        .into_iter()
        .map(|row| (row.id, row))
        .collect();

    let lines = price_lines(draft, products_by_id, &stock)?;
    let total_amount = sum_totals(&lines)?;

    let order: OrderRow = diesel::insert_into(orders::table)
        .values(&NewOrderRow {
            user_id,
            status: OrderStatus::New.as_str(),
            total_amount,
            phone: draft.phone.as_str(),
            address: draft.address.as_deref(),
            comment: draft.comment.as_deref(),
            delivery_type: draft.delivery_type.as_str(),
            payment_method: draft.payment_method.as_str(),
        })
        .returning(OrderRow::as_returning())
        .get_result(conn)
        .await?;

    let new_items: Vec<NewOrderItemRow<'_>> = lines
        .iter()
        .map(|line| NewOrderItemRow {
            order_id: order.id,
            product_id: line.product.id,
            sku: line.product.sku.as_str(),
            name_ru: line.product.name_ru.as_str(),
            name_uz: line.product.name_uz.as_str(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total,
        })
        .collect();
    let items: Vec<OrderItemRow> = diesel::insert_into(order_items::table)
        .values(&new_items)
        .returning(OrderItemRow::as_returning())
        .get_results(conn)
        .await?;

    for line in &lines {
        let available = stock.get(&line.product.id).copied().unwrap_or(0);
        apply_delta(
            conn,
            line.product.id,
            available,
            -line.quantity,
            Movement {
                kind: MovementKind::Sale,
                reference: Some(order.id.to_string()),
                note: None,
            },
        )
        .await?;
    }

    diesel::delete(
        cart_items::table
            .filter(cart_items::user_id.eq(user_id))
            .filter(cart_items::product_id.eq_any(&product_ids)),
    )
    .execute(conn)
    .await?;

    order.into_order(items)
}

async fn transition_in_transaction(
    conn: &mut AsyncPgConnection,
    id: OrderId,
    target: OrderStatus,
    expected: Option<OrderStatus>,
) -> Result<StatusChange, RepositoryError> {
    let current: OrderRow = orders::table
        .find(id)
        .select(OrderRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| RepositoryError::not_found(format!("order {id} not found")))?;
    let previous = current.status()?;
    if expected.is_some_and(|expected| expected != previous) {
        return Err(InvalidTransition {
            from: previous,
            to: target,
        }
        .into());
    }
    let next = previous.transition_to(target)?;

    let updated: OrderRow = diesel::update(orders::table.find(id))
        .set((
            orders::status.eq(next.as_str()),
            orders::updated_at.eq(Utc::now()),
        ))
        .returning(OrderRow::as_returning())
        .get_result(conn)
        .await?;
    let items = load_items(conn, &[id]).await?.remove(&id).unwrap_or_default();

    if next == OrderStatus::Cancelled {
        for item in in_lock_order(&items, |item| item.product_id) {
            increase(
                conn,
                item.product_id,
                item.quantity,
                Movement {
                    kind: MovementKind::Return,
                    reference: Some(id.to_string()),
                    note: None,
                },
            )
            .await?;
        }
        debug!(order_id = id, lines = items.len(), "cancelled order stock returned");
    }

    Ok(StatusChange {
        order: updated.into_order(items)?,
        previous,
    })
}

#[async_trait]
impl OrderRepository for DieselOrderRepository {
    async fn place(&self, user_id: UserId, draft: &OrderDraft) -> Result<Order, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            async move { place_in_transaction(conn, user_id, draft).await }.scope_boxed()
        })
        .await
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Paginated<Order>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = orders::table
            .filter(orders::user_id.eq(user_id))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<OrderRow> = orders::table
            .filter(orders::user_id.eq(user_id))
            .select(OrderRow::as_select())
            .order((orders::created_at.desc(), orders::id.desc()))
            .limit(page.sql_limit())
            .offset(page.sql_offset())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let items = assemble(&mut conn, rows).await?;
        Ok(Paginated::new(items, page, count_to_total(total)))
    }

    async fn find(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<OrderRow> = orders::table
            .find(id)
            .select(OrderRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        match row {
            Some(row) => Ok(assemble(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Paginated<Order>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = orders_with_status(status)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<OrderRow> = orders_with_status(status)
            .select(OrderRow::as_select())
            .order((orders::created_at.desc(), orders::id.desc()))
            .limit(page.sql_limit())
            .offset(page.sql_offset())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let items = assemble(&mut conn, rows).await?;
        Ok(Paginated::new(items, page, count_to_total(total)))
    }

    async fn transition(
        &self,
        id: OrderId,
        target: OrderStatus,
        expected: Option<OrderStatus>,
    ) -> Result<StatusChange, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            async move { transition_in_transaction(conn, id, target, expected).await }
                .scope_boxed()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    //! Checkout pricing rules evaluated against locked rows.

    use super::*;
    use crate::domain::{DeliveryType, OrderInput, OrderLineInput, PaymentMethod};
    use rstest::rstest;

    fn product(id: i64, price: i64, sale_price: Option<i64>, is_active: bool) -> ProductRow {
        ProductRow {
            id,
            sku: format!("SKU-{id}"),
            name_ru: "Товар".to_owned(),
            name_uz: "Mahsulot".to_owned(),
            description_ru: None,
            description_uz: None,
            price,
            sale_price,
            category_id: None,
            image_url: None,
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn draft(lines: &[(i64, i32)]) -> OrderDraft {
        OrderDraft::try_from(OrderInput {
            items: lines
                .iter()
                .map(|&(product_id, quantity)| OrderLineInput {
                    product_id,
                    quantity,
                })
                .collect(),
            phone: "+998901234567".to_owned(),
            address: None,
            comment: None,
            delivery_type: DeliveryType::Pickup,
            payment_method: PaymentMethod::Cash,
        })
        .expect("valid draft")
    }

    #[rstest]
    fn sale_price_wins_and_totals_add_up() {
        let products = HashMap::from([
            (1, product(1, 20_000, Some(15_000), true)),
            (2, product(2, 7_500, None, true)),
        ]);
        let stock = HashMap::from([(1, 10), (2, 3)]);

        let lines = price_lines(&draft(&[(1, 2), (2, 3)]), products, &stock).expect("priced");
        assert_eq!(lines[0].unit_price, 15_000);
        assert_eq!(lines[0].line_total, 30_000);
        assert_eq!(lines[1].line_total, 22_500);
        assert_eq!(sum_totals(&lines).expect("total"), 52_500);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(product(1, 10_000, None, false)))]
    fn unknown_or_inactive_products_are_not_found(#[case] row: Option<ProductRow>) {
        let products: HashMap<i64, ProductRow> = row.into_iter().map(|p| (p.id, p)).collect();
        let err = price_lines(&draft(&[(1, 1)]), products, &HashMap::from([(1, 5)]))
            .err()
            .expect("rejected");
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[rstest]
    #[case(HashMap::from([(1, 1)]), 1)]
    #[case(HashMap::new(), 0)]
    fn short_stock_reports_availability(
        #[case] stock: HashMap<i64, i32>,
        #[case] available: i32,
    ) {
        let products = HashMap::from([(1, product(1, 10_000, None, true))]);
        let err = price_lines(&draft(&[(1, 2)]), products, &stock)
            .err()
            .expect("rejected");
        assert_eq!(err, RepositoryError::insufficient_stock(1_i64, available, 2_i32));
    }
}
