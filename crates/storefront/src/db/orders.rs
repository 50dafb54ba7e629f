//! Order repository: orders, line items, and the append-only event log.
//!
//! Every state change runs inside one transaction that locks the order row,
//! consults the transition table, updates the order, and appends an event.
//! Payment settlements additionally carry the gateway transaction id, which
//! has a unique index over the event log: replaying a settlement for a
//! transaction that is already recorded is detected inside the same
//! transaction and reported as [`SettleOutcome::AlreadyRecorded`] instead of
//! an error. That is what makes gateway callbacks safe to re-deliver.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use marigold_core::{OrderId, OrderState, PaymentMethod, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Customer, Order, OrderEvent, OrderEventKind, OrderItem, ProductDoc};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    customer_name: String,
    customer_email: String,
    customer_user_id: Option<i32>,
    total_amount: Decimal,
    discount_amount: Decimal,
    coupon_code: Option<String>,
    state: OrderState,
    payment_method: PaymentMethod,
    gateway_order_id: Option<String>,
    gateway_payment_id: Option<String>,
    merchant_transaction_id: Option<String>,
    payment_instrument: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: OrderId::from_uuid(self.id),
            order_number: self.order_number,
            customer: Customer {
                name: self.customer_name,
                email: self.customer_email,
                user_id: self.customer_user_id.map(UserId::new),
            },
            items,
            total_amount: self.total_amount,
            discount_amount: self.discount_amount,
            coupon_code: self.coupon_code,
            state: self.state,
            payment_method: self.payment_method,
            gateway_order_id: self.gateway_order_id,
            gateway_payment_id: self.gateway_payment_id,
            merchant_transaction_id: self.merchant_transaction_id,
            payment_instrument: self.payment_instrument,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_id: Uuid,
    product_id: String,
    quantity: i32,
    size: Option<String>,
    price: Decimal,
    name: String,
    slug: Option<String>,
    description: Option<String>,
    images: serde_json::Value,
    discount: Option<Decimal>,
    product_link: Option<String>,
    status: Option<String>,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let images: Vec<serde_json::Value> = serde_json::from_value(row.images)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid item images: {e}")))?;
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("negative quantity: {}", row.quantity))
        })?;

        Ok(Self {
            product_id: ProductId::new(row.product_id),
            quantity,
            size: row.size,
            price: row.price,
            name: row.name,
            slug: row.slug,
            description: row.description,
            images,
            discount: row.discount,
            product_link: row.product_link,
            status: row.status,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderEventRow {
    id: i64,
    order_id: Uuid,
    kind: String,
    gateway_txn_id: Option<String>,
    data: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderEventRow> for OrderEvent {
    type Error = RepositoryError;

    fn try_from(row: OrderEventRow) -> Result<Self, Self::Error> {
        let kind: OrderEventKind = row
            .kind
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("{e}")))?;

        Ok(Self {
            id: row.id,
            order_id: OrderId::from_uuid(row.order_id),
            kind,
            gateway_txn_id: row.gateway_txn_id,
            data: row.data,
            created_at: row.created_at,
        })
    }
}

// =============================================================================
// Write Payloads
// =============================================================================

/// Everything needed to persist a fresh order.
#[derive(Debug)]
pub struct NewOrder {
    pub order_number: String,
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub coupon_code: Option<String>,
    pub state: OrderState,
    pub payment_method: PaymentMethod,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub merchant_transaction_id: Option<String>,
    pub payment_instrument: Option<serde_json::Value>,
    /// Gateway transaction id when the order is created already settled
    /// (PhonePe hands the storefront a finished payment).
    pub settlement_txn_id: Option<String>,
}

/// Gateway metadata recorded alongside a settlement.
#[derive(Debug, Default)]
pub struct PaymentUpdate {
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub payment_instrument: Option<serde_json::Value>,
}

/// Result of a settlement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// The transition was applied and an event appended.
    Applied,
    /// This gateway transaction was already recorded; nothing changed.
    AlreadyRecorded,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new order with its line items and initial event(s).
    ///
    /// Always appends `order_placed`; when the order arrives already settled
    /// (`settlement_txn_id`), also appends the settlement event so the log
    /// stays complete.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn create(&self, new: NewOrder) -> Result<Order, RepositoryError> {
        let id = OrderId::generate();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO storefront.order
                (id, order_number, customer_name, customer_email, customer_user_id,
                 total_amount, discount_amount, coupon_code, state, payment_method,
                 gateway_order_id, gateway_payment_id, merchant_transaction_id,
                 payment_instrument)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ",
        )
        .bind(id.as_uuid())
        .bind(&new.order_number)
        .bind(&new.customer.name)
        .bind(&new.customer.email)
        .bind(new.customer.user_id)
        .bind(new.total_amount)
        .bind(new.discount_amount)
        .bind(&new.coupon_code)
        .bind(new.state)
        .bind(new.payment_method)
        .bind(&new.gateway_order_id)
        .bind(&new.gateway_payment_id)
        .bind(&new.merchant_transaction_id)
        .bind(&new.payment_instrument)
        .execute(&mut *tx)
        .await?;

        for item in &new.items {
            insert_item(&mut tx, id, item).await?;
        }

        append_event(&mut tx, id, OrderEventKind::OrderPlaced, None, None).await?;

        if let Some(txn_id) = &new.settlement_txn_id {
            append_event(
                &mut tx,
                id,
                OrderEventKind::for_state(new.state),
                Some(txn_id),
                new.payment_instrument.clone(),
            )
            .await?;
        }

        tx.commit().await?;

        // Read back through the normal path so timestamps come from the db.
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Get an order with its line items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, order_number, customer_name, customer_email, customer_user_id,
                   total_amount, discount_amount, coupon_code, state, payment_method,
                   gateway_order_id, gateway_payment_id, merchant_transaction_id,
                   payment_instrument, created_at, updated_at
            FROM storefront.order
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self
            .items_for(&[id])
            .await?
            .into_iter()
            .map(|owned| owned.item)
            .collect();
        Ok(Some(row.into_order(items)))
    }

    /// List a user's orders, newest first, items included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, order_number, customer_name, customer_email, customer_user_id,
                   total_amount, discount_amount, coupon_code, state, payment_method,
                   gateway_order_id, gateway_payment_id, merchant_transaction_id,
                   payment_instrument, created_at, updated_at
            FROM storefront.order
            WHERE customer_user_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<OrderId> = rows.iter().map(|r| OrderId::from_uuid(r.id)).collect();
        let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for owned in self.items_for(&ids).await? {
            by_order.entry(owned.order_id).or_default().push(owned.item);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect())
    }

    /// Find an order id by PhonePe merchant transaction id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_merchant_txn(
        &self,
        merchant_transaction_id: &str,
    ) -> Result<Option<OrderId>, RepositoryError> {
        let id: Option<Uuid> = sqlx::query_scalar(
            r"
            SELECT id FROM storefront.order
            WHERE merchant_transaction_id = $1
            ",
        )
        .bind(merchant_transaction_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(id.map(OrderId::from_uuid))
    }

    /// Settle a payment idempotently.
    ///
    /// Keyed on the gateway transaction id: if the event log already has this
    /// transaction, nothing changes and `AlreadyRecorded` is returned. A
    /// settlement that is not a legal transition (e.g. failing an order that
    /// was already paid under a different transaction) is rejected.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown order,
    /// `RepositoryError::IllegalTransition` when the state machine forbids
    /// the change, and `RepositoryError::Database` for query failures.
    pub async fn settle_payment(
        &self,
        id: OrderId,
        kind: OrderEventKind,
        gateway_txn_id: &str,
        update: PaymentUpdate,
    ) -> Result<SettleOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let state: Option<OrderState> = sqlx::query_scalar(
            r"SELECT state FROM storefront.order WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let state = state.ok_or(RepositoryError::NotFound)?;

        let already: bool = sqlx::query_scalar(
            r"SELECT EXISTS(SELECT 1 FROM storefront.order_event WHERE gateway_txn_id = $1)",
        )
        .bind(gateway_txn_id)
        .fetch_one(&mut *tx)
        .await?;

        if already {
            tx.rollback().await?;
            return Ok(SettleOutcome::AlreadyRecorded);
        }

        let next = kind.target_state();
        if !state.can_transition(next) {
            tx.rollback().await?;
            return Err(RepositoryError::IllegalTransition { from: state, to: next });
        }

        sqlx::query(
            r"
            UPDATE storefront.order
            SET state = $2,
                gateway_order_id = COALESCE($3, gateway_order_id),
                gateway_payment_id = COALESCE($4, gateway_payment_id),
                payment_instrument = COALESCE($5, payment_instrument),
                updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .bind(next)
        .bind(&update.gateway_order_id)
        .bind(&update.gateway_payment_id)
        .bind(&update.payment_instrument)
        .execute(&mut *tx)
        .await?;

        append_event(
            &mut tx,
            id,
            kind,
            Some(gateway_txn_id),
            update.payment_instrument,
        )
        .await?;

        tx.commit().await?;
        Ok(SettleOutcome::Applied)
    }

    /// Apply a manual state change (the order-update endpoint).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown order and
    /// `RepositoryError::IllegalTransition` when the state machine forbids
    /// the change.
    pub async fn update_state(
        &self,
        id: OrderId,
        next: OrderState,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let state: Option<OrderState> = sqlx::query_scalar(
            r"SELECT state FROM storefront.order WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let state = state.ok_or(RepositoryError::NotFound)?;

        if state != next {
            if !state.can_transition(next) {
                tx.rollback().await?;
                return Err(RepositoryError::IllegalTransition { from: state, to: next });
            }

            sqlx::query(
                r"UPDATE storefront.order SET state = $2, updated_at = now() WHERE id = $1",
            )
            .bind(id.as_uuid())
            .bind(next)
            .execute(&mut *tx)
            .await?;

            append_event(&mut tx, id, OrderEventKind::for_state(next), None, None).await?;
        }

        tx.commit().await?;
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Rewrite the snapshot display fields of every line item referencing a
    /// product. The charged `price` column is deliberately not in the SET
    /// list; monetary amounts never change retroactively.
    ///
    /// Returns the number of line items touched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn refresh_product_snapshots(
        &self,
        product: &ProductDoc,
    ) -> Result<u64, RepositoryError> {
        let images = serde_json::Value::Array(product.images.clone());

        let result = sqlx::query(
            r"
            UPDATE storefront.order_item
            SET name = $2,
                slug = $3,
                description = $4,
                images = $5,
                discount = $6,
                product_link = $7,
                status = $8
            WHERE product_id = $1
            ",
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(images)
        .bind(product.discount)
        .bind(&product.product_link)
        .bind(&product.status)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Fetch an order's event log, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn events(&self, id: OrderId) -> Result<Vec<OrderEvent>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderEventRow>(
            r"
            SELECT id, order_id, kind, gateway_txn_id, data, created_at
            FROM storefront.order_event
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(id.as_uuid())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn items_for(
        &self,
        ids: &[OrderId],
    ) -> Result<Vec<OrderItemWithOwner>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let uuids: Vec<Uuid> = ids.iter().map(OrderId::as_uuid).collect();
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT order_id, product_id, quantity, size, price, name, slug,
                   description, images, discount, product_link, status
            FROM storefront.order_item
            WHERE order_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(&uuids)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let order_id = row.order_id;
                Ok(OrderItemWithOwner {
                    order_id,
                    item: row.try_into()?,
                })
            })
            .collect()
    }
}

struct OrderItemWithOwner {
    order_id: Uuid,
    item: OrderItem,
}

async fn insert_item(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
    item: &OrderItem,
) -> Result<(), RepositoryError> {
    let images = serde_json::Value::Array(item.images.clone());
    let quantity = i32::try_from(item.quantity)
        .map_err(|_| RepositoryError::Conflict(format!("quantity too large: {}", item.quantity)))?;

    sqlx::query(
        r"
        INSERT INTO storefront.order_item
            (order_id, product_id, quantity, size, price, name, slug,
             description, images, discount, product_link, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ",
    )
    .bind(order_id.as_uuid())
    .bind(item.product_id.as_str())
    .bind(quantity)
    .bind(&item.size)
    .bind(item.price)
    .bind(&item.name)
    .bind(&item.slug)
    .bind(&item.description)
    .bind(images)
    .bind(item.discount)
    .bind(&item.product_link)
    .bind(&item.status)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn append_event(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
    kind: OrderEventKind,
    gateway_txn_id: Option<&str>,
    data: Option<serde_json::Value>,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO storefront.order_event (order_id, kind, gateway_txn_id, data)
        VALUES ($1, $2, $3, $4)
        ",
    )
    .bind(order_id.as_uuid())
    .bind(kind.to_string())
    .bind(gateway_txn_id)
    .bind(data)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
