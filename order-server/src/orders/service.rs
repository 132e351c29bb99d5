//! Order Service
//!
//! Entry point of the order pipeline. Every mutation follows the same shape:
//!
//! 1. read the current row (ownership-scoped) and validate
//! 2. resolve and price components, build the detail snapshot
//! 3. one transaction: order row + detail rows + audit rows
//! 4. after commit: mirror audit records, invalidate dependent cache keys
//!
//! Reference lookups happen before the transaction opens, so a transaction
//! never waits on a second pool connection.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use shared::models::{
    LicenseSummary, Order, OrderCreate, OrderDetail, OrderDetailDraft, OrderStatus,
    OrderStatusUpdate, OrderUpdate, SummaryOrder, VenueSummary,
};
use sqlx::SqlitePool;

use super::actor::RequestContext;
use super::error::{OrderError, OrderResult};
use super::sequencer::OrderNumberSequencer;
use super::snapshot::{build_details, reconcile_drafts};
use super::state_machine::StatusChange;
use crate::cache::{CacheKey, CacheResource, OrderFootprint, SummaryCache, invalidation_keys};
use crate::db::repository::{WriteContext, order, order_detail, summary};
use crate::db::statement::AuditTrail;
use crate::pricing::{ComponentIds, PriceCalculator, PricingError};
use crate::utils::Clock;
use crate::utils::time::{day_end_millis, day_start_millis};
use crate::utils::validation::{
    MAX_EMAIL_LEN, MAX_SHORT_TEXT_LEN, validate_amount, validate_id, validate_optional_text,
    validate_required_text,
};

/// Attribute checks that do not need the catalogue
fn validate_attributes(data: &OrderCreate) -> OrderResult<()> {
    validate_required_text(&data.buyer_id, "buyer_id", MAX_SHORT_TEXT_LEN)?;
    validate_id(data.venue_id, "venue_id")?;
    if data.quantity < 1 {
        return Err(OrderError::Validation("quantity must be at least 1".into()));
    }
    if let Some(method) = data.payment_method_id {
        validate_id(method, "payment_method_id")?;
    }
    validate_amount(data.payment_fee, "payment_fee")?;
    validate_optional_text(data.email.as_deref(), "email", MAX_EMAIL_LEN)?;
    Ok(())
}

/// Priced order ready to be written
struct PricedOrder {
    total_price: f64,
    details: Vec<OrderDetailDraft>,
}

#[derive(Clone)]
pub struct OrderService {
    pool: SqlitePool,
    calculator: PriceCalculator,
    sequencer: OrderNumberSequencer,
    cache: SummaryCache,
    clock: Arc<dyn Clock>,
    request_timeout: Duration,
}

impl OrderService {
    pub fn new(
        pool: SqlitePool,
        calculator: PriceCalculator,
        cache: SummaryCache,
        clock: Arc<dyn Clock>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            calculator,
            sequencer: OrderNumberSequencer::new(clock.clone()),
            cache,
            clock,
            request_timeout,
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn price(
        &self,
        data: &OrderCreate,
        project_id: i64,
    ) -> Result<PricedOrder, PricingError> {
        let resolved = self
            .calculator
            .resolve(&ComponentIds::of(data), project_id)
            .await?;
        let total_price = resolved.total();
        let details = build_details(&resolved);

        let reconciled = reconcile_drafts(&details);
        if reconciled != total_price {
            tracing::warn!(
                total_price,
                reconciled,
                "Detail snapshot does not reconcile with order total"
            );
        }

        Ok(PricedOrder {
            total_price,
            details,
        })
    }

    /// Run a transaction body under the request deadline
    ///
    /// On expiry the body's future is dropped, which drops its open
    /// transaction and rolls it back.
    async fn within_deadline<T>(
        &self,
        body: impl Future<Output = OrderResult<T>>,
    ) -> OrderResult<T> {
        match tokio::time::timeout(self.request_timeout, body).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    timeout_ms = self.request_timeout.as_millis() as u64,
                    "Order transaction timed out, rolled back"
                );
                Err(OrderError::Persistence(format!(
                    "transaction exceeded {}ms",
                    self.request_timeout.as_millis()
                )))
            }
        }
    }

    async fn footprint(&self, project_id: i64, order: &Order) -> OrderFootprint {
        let license_id = match summary::find_venue_license(&self.pool, project_id, order.venue_id)
            .await
        {
            Ok(license_id) => license_id,
            Err(e) => {
                tracing::warn!(venue_id = order.venue_id, error = %e, "Venue license lookup failed");
                None
            }
        };
        OrderFootprint::of(order, license_id, self.clock.timezone())
    }

    async fn invalidate(&self, ctx: &RequestContext, footprints: &[&OrderFootprint]) {
        let keys = invalidation_keys(ctx.project_id, &ctx.actor, footprints);
        self.cache.invalidate(&keys).await;
    }

    async fn read_back(&self, project_id: i64, order_id: i64) -> OrderResult<Order> {
        order::find_by_id(&self.pool, project_id, order_id, None)
            .await?
            .ok_or_else(|| OrderError::not_found(order_id))
    }

    async fn current(&self, ctx: &RequestContext, order_id: i64) -> OrderResult<Order> {
        order::find_by_id(&self.pool, ctx.project_id, order_id, ctx.owner_scope())
            .await?
            .ok_or_else(|| OrderError::not_found(order_id))
    }

    fn cache_key(&self, ctx: &RequestContext, resource: CacheResource) -> CacheKey {
        CacheKey::new(ctx.project_id, ctx.owner_scope(), resource)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create an order; always starts as Created with no lifecycle stamps
    pub async fn insert(&self, ctx: &RequestContext, data: OrderCreate) -> OrderResult<Order> {
        validate_attributes(&data)?;
        let priced = self
            .price(&data, ctx.project_id)
            .await
            .map_err(OrderError::from_create_pricing)?;

        let now = self.clock.now_millis();
        let write = WriteContext {
            project_id: ctx.project_id,
            actor_id: ctx.actor_id(),
            owner: None,
            now,
        };
        let mut trail = AuditTrail::new(ctx.actor_id(), ctx.project_id, now);

        let (order_id, order_number) = self
            .within_deadline(async {
                let mut tx = self.pool.begin().await?;
                let order_number = self.sequencer.next(&mut tx).await?;
                let order_id = order::insert(
                    &mut tx,
                    &write,
                    &order_number,
                    &data,
                    priced.total_price,
                    &mut trail,
                )
                .await?;
                order_detail::insert_all(
                    &mut tx,
                    &write,
                    order_id,
                    ctx.actor_id(),
                    &priced.details,
                    &mut trail,
                )
                .await?;
                tx.commit().await?;
                Ok::<_, OrderError>((order_id, order_number))
            })
            .await?;
        trail.emit();

        let created = self.read_back(ctx.project_id, order_id).await?;
        let footprint = self.footprint(ctx.project_id, &created).await;
        self.invalidate(ctx, &[&footprint]).await;

        tracing::info!(
            order_id,
            order_number = %order_number,
            total_price = priced.total_price,
            actor = %ctx.actor_id(),
            "Order created"
        );
        Ok(created)
    }

    /// Patch an order's attributes (and optionally its status); price and
    /// detail snapshot are recomputed from the merged attributes
    pub async fn update(
        &self,
        ctx: &RequestContext,
        order_id: i64,
        patch: OrderUpdate,
    ) -> OrderResult<Order> {
        let current = self.current(ctx, order_id).await?;
        let merged = patch.merge_onto(&current);
        validate_attributes(&merged)?;
        validate_optional_text(
            patch.open_payment_status.as_deref(),
            "open_payment_status",
            MAX_SHORT_TEXT_LEN,
        )?;

        let now = self.clock.now_millis();
        let change = match patch.status {
            Some(target) => {
                StatusChange::plan(current.status, target, patch.open_payment_status.clone(), now)?
            }
            None => StatusChange {
                open_payment_status: patch.open_payment_status.clone(),
                ..StatusChange::unchanged(current.status)
            },
        };
        let priced = self.price(&merged, ctx.project_id).await?;
        let before = self.footprint(ctx.project_id, &current).await;

        let write = WriteContext {
            project_id: ctx.project_id,
            actor_id: ctx.actor_id(),
            owner: ctx.owner_scope(),
            now,
        };
        let mut trail = AuditTrail::new(ctx.actor_id(), ctx.project_id, now);
        let stmt = order::update_statement(&write, order_id, &merged, priced.total_price, &change);

        self.within_deadline(async {
            let mut tx = self.pool.begin().await?;
            order::execute_guarded(&mut tx, &write, order_id, &stmt, &mut trail).await?;
            order_detail::replace_all(
                &mut tx,
                &write,
                order_id,
                &current.created_by,
                &priced.details,
                &mut trail,
            )
            .await?;
            tx.commit().await?;
            Ok::<_, OrderError>(())
        })
        .await?;
        trail.emit();

        let updated = self.read_back(ctx.project_id, order_id).await?;
        let after = self.footprint(ctx.project_id, &updated).await;
        self.invalidate(ctx, &[&before, &after]).await;

        tracing::info!(
            order_id,
            status = %updated.status,
            total_price = updated.total_price,
            actor = %ctx.actor_id(),
            "Order updated"
        );
        Ok(updated)
    }

    /// Move an order through its lifecycle; the matching timestamp is stamped
    /// the first time a status is reached
    pub async fn update_status(
        &self,
        ctx: &RequestContext,
        order_id: i64,
        request: OrderStatusUpdate,
    ) -> OrderResult<Order> {
        validate_optional_text(
            request.open_payment_status.as_deref(),
            "open_payment_status",
            MAX_SHORT_TEXT_LEN,
        )?;
        let current = self.current(ctx, order_id).await?;

        let now = self.clock.now_millis();
        let change = StatusChange::plan(
            current.status,
            request.status,
            request.open_payment_status,
            now,
        )?;

        let write = WriteContext {
            project_id: ctx.project_id,
            actor_id: ctx.actor_id(),
            owner: ctx.owner_scope(),
            now,
        };
        let mut trail = AuditTrail::new(ctx.actor_id(), ctx.project_id, now);
        let stmt = order::update_status_statement(&write, order_id, &change);

        self.within_deadline(async {
            let mut tx = self.pool.begin().await?;
            order::execute_guarded(&mut tx, &write, order_id, &stmt, &mut trail).await?;
            tx.commit().await?;
            Ok::<_, OrderError>(())
        })
        .await?;
        trail.emit();

        let updated = self.read_back(ctx.project_id, order_id).await?;
        let before = self.footprint(ctx.project_id, &current).await;
        let after = self.footprint(ctx.project_id, &updated).await;
        self.invalidate(ctx, &[&before, &after]).await;

        tracing::info!(
            order_id,
            from = %current.status,
            to = %updated.status,
            actor = %ctx.actor_id(),
            "Order status changed"
        );
        Ok(updated)
    }

    /// Soft-delete an order and its detail rows
    pub async fn delete(&self, ctx: &RequestContext, order_id: i64) -> OrderResult<()> {
        let current = self.current(ctx, order_id).await?;
        let footprint = self.footprint(ctx.project_id, &current).await;

        let now = self.clock.now_millis();
        let write = WriteContext {
            project_id: ctx.project_id,
            actor_id: ctx.actor_id(),
            owner: ctx.owner_scope(),
            now,
        };
        let mut trail = AuditTrail::new(ctx.actor_id(), ctx.project_id, now);

        self.within_deadline(async {
            let mut tx = self.pool.begin().await?;
            order::soft_delete(&mut tx, &write, order_id, &mut trail).await?;
            order_detail::soft_delete_by_order(&mut tx, &write, order_id, &mut trail).await?;
            tx.commit().await?;
            Ok::<_, OrderError>(())
        })
        .await?;
        trail.emit();

        self.invalidate(ctx, &[&footprint]).await;

        tracing::info!(order_id, actor = %ctx.actor_id(), "Order deleted");
        Ok(())
    }

    // =========================================================================
    // Reads (cache-aside)
    // =========================================================================

    pub async fn get(&self, ctx: &RequestContext, order_id: i64) -> OrderResult<Order> {
        let key = self.cache_key(ctx, CacheResource::Order(order_id));
        self.cache
            .get_or_load(&key, || self.current(ctx, order_id))
            .await
    }

    /// Live detail rows of an order visible to the caller
    pub async fn get_details(
        &self,
        ctx: &RequestContext,
        order_id: i64,
    ) -> OrderResult<Vec<OrderDetail>> {
        let key = self.cache_key(ctx, CacheResource::Details(order_id));
        self.cache
            .get_or_load(&key, || async {
                self.current(ctx, order_id).await?;
                order_detail::find_by_order(&self.pool, ctx.project_id, order_id)
                    .await
                    .map_err(OrderError::from)
            })
            .await
    }

    /// Live orders, optionally narrowed to one status
    pub async fn select(
        &self,
        ctx: &RequestContext,
        status: Option<OrderStatus>,
    ) -> OrderResult<Vec<Order>> {
        let key = self.cache_key(ctx, CacheResource::OrderList(status));
        self.cache
            .get_or_load(&key, || async {
                order::find_all(&self.pool, ctx.project_id, status, ctx.owner_scope())
                    .await
                    .map_err(OrderError::from)
            })
            .await
    }

    pub async fn select_by_venue_id(
        &self,
        ctx: &RequestContext,
        venue_id: i64,
    ) -> OrderResult<Vec<Order>> {
        let key = self.cache_key(ctx, CacheResource::VenueOrders(venue_id));
        self.cache
            .get_or_load(&key, || async {
                order::find_by_venue(&self.pool, ctx.project_id, venue_id, ctx.owner_scope())
                    .await
                    .map_err(OrderError::from)
            })
            .await
    }

    pub async fn select_by_buyer_id(
        &self,
        ctx: &RequestContext,
        buyer_id: &str,
    ) -> OrderResult<Vec<Order>> {
        let key = self.cache_key(ctx, CacheResource::BuyerOrders(buyer_id.to_string()));
        self.cache
            .get_or_load(&key, || async {
                order::find_by_buyer(&self.pool, ctx.project_id, buyer_id, ctx.owner_scope())
                    .await
                    .map_err(OrderError::from)
            })
            .await
    }

    /// Orders paid on a business date
    pub async fn select_paid_on(
        &self,
        ctx: &RequestContext,
        date: NaiveDate,
    ) -> OrderResult<Vec<Order>> {
        let tz = self.clock.timezone();
        let (start, end) = (day_start_millis(date, tz), day_end_millis(date, tz));
        let key = self.cache_key(ctx, CacheResource::PaidOn(date));
        self.cache
            .get_or_load(&key, || async {
                order::find_paid_between(&self.pool, ctx.project_id, start, end, ctx.owner_scope())
                    .await
                    .map_err(OrderError::from)
            })
            .await
    }

    pub async fn venue_summary(
        &self,
        ctx: &RequestContext,
        venue_id: i64,
    ) -> OrderResult<VenueSummary> {
        let key = self.cache_key(ctx, CacheResource::VenueSummary(venue_id));
        self.cache
            .get_or_load(&key, || async {
                summary::find_venue_summary(&self.pool, ctx.project_id, venue_id, ctx.owner_scope())
                    .await?
                    .ok_or_else(|| OrderError::NotFound(format!("venue {venue_id}")))
            })
            .await
    }

    pub async fn license_summary(
        &self,
        ctx: &RequestContext,
        license_id: i64,
    ) -> OrderResult<LicenseSummary> {
        let key = self.cache_key(ctx, CacheResource::LicenseSummary(license_id));
        self.cache
            .get_or_load(&key, || async {
                summary::find_license_summary(
                    &self.pool,
                    ctx.project_id,
                    license_id,
                    ctx.owner_scope(),
                )
                .await?
                .ok_or_else(|| OrderError::NotFound(format!("license {license_id}")))
            })
            .await
    }

    pub async fn license_orders(
        &self,
        ctx: &RequestContext,
        license_id: i64,
    ) -> OrderResult<Vec<SummaryOrder>> {
        let key = self.cache_key(ctx, CacheResource::LicenseOrders(license_id));
        self.cache
            .get_or_load(&key, || async {
                summary::find_license_orders(&self.pool, ctx.project_id, license_id, ctx.owner_scope())
                    .await
                    .map_err(OrderError::from)
            })
            .await
    }
}
