//! Order status transitions.
//!
//! ```text
//! PENDING ──► PREPARING ──► DELIVERING ──► COMPLETED
//!    │
//!    └──────► CANCELLED
//! ```
//!
//! Every transition is a conditional update on the current status. An update
//! that matches no row means another request moved the order first, and is
//! reported as a conflict rather than retried.

use chrono::Utc;
use diesel::prelude::*;
use diesel::PgConnection;

use crate::catalog;
use crate::error::{Conflict, MarketplaceError};
use crate::events::{MarketplaceEvent, MarketplaceEventPublisher};
use crate::lookup::{self, OrderStatus};
use crate::models::Order;
use crate::principal::Principal;
use crate::riders;
use crate::schema::orders;

/// Who is asking for a transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Actor {
    /// The user who owns the order's restaurant.
    RestaurantOperator,
    /// A rider accepting or completing delivery work.
    RiderAssignment,
}

impl OrderStatus {
    /// The only status an order can move to `self` from.
    pub fn predecessor(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => None,
            OrderStatus::Preparing | OrderStatus::Cancelled => Some(OrderStatus::Pending),
            OrderStatus::Delivering => Some(OrderStatus::Preparing),
            OrderStatus::Completed => Some(OrderStatus::Delivering),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

pub fn is_allowed(from: OrderStatus, to: OrderStatus, actor: Actor) -> bool {
    matches!(
        (from, to, actor),
        (OrderStatus::Pending, OrderStatus::Preparing, Actor::RestaurantOperator)
            | (OrderStatus::Pending, OrderStatus::Cancelled, Actor::RestaurantOperator)
            | (OrderStatus::Preparing, OrderStatus::Delivering, _)
            | (OrderStatus::Delivering, OrderStatus::Completed, _)
    )
}

/// Moves `order_id` from `from` to `to` if and only if it is currently `from`.
pub(crate) fn compare_and_set(
    conn: &mut PgConnection,
    order_id: i64,
    from: OrderStatus,
    to: OrderStatus,
    actor: Actor,
) -> Result<(), MarketplaceError> {
    if !is_allowed(from, to, actor) {
        return Err(Conflict::OrderStatus { expected: from }.into());
    }
    let lookups = lookup::lookups(conn)?;

    let updated = diesel::update(
        orders::table
            .filter(orders::id.eq(order_id))
            .filter(orders::order_status_id.eq(lookups.order_status.id(from))),
    )
    .set((
        orders::order_status_id.eq(lookups.order_status.id(to)),
        orders::updated_at.eq(Utc::now()),
    ))
    .execute(conn)?;

    if updated == 0 {
        tracing::warn!(order_id, %from, %to, ?actor, "order status transition rejected");
        return Err(Conflict::OrderStatus { expected: from }.into());
    }

    MarketplaceEventPublisher::new(conn).publish(&MarketplaceEvent::OrderStatusChanged {
        order_id,
        from,
        to,
    })?;
    tracing::info!(order_id, %from, %to, ?actor, "order status changed");
    Ok(())
}

/// PENDING → PREPARING.
pub fn accept(
    conn: &mut PgConnection,
    principal: &Principal,
    order_id: i64,
) -> Result<Order, MarketplaceError> {
    transition_as_operator(conn, principal, order_id, OrderStatus::Preparing)
}

/// PENDING → CANCELLED.
pub fn cancel(
    conn: &mut PgConnection,
    principal: &Principal,
    order_id: i64,
) -> Result<Order, MarketplaceError> {
    transition_as_operator(conn, principal, order_id, OrderStatus::Cancelled)
}

/// PREPARING → DELIVERING without a rider, for restaurants that deliver
/// themselves.
pub fn hand_off(
    conn: &mut PgConnection,
    principal: &Principal,
    order_id: i64,
) -> Result<Order, MarketplaceError> {
    transition_as_operator(conn, principal, order_id, OrderStatus::Delivering)
}

/// DELIVERING → COMPLETED. A rider still working the order is released.
pub fn complete(
    conn: &mut PgConnection,
    principal: &Principal,
    order_id: i64,
) -> Result<Order, MarketplaceError> {
    transition_as_operator(conn, principal, order_id, OrderStatus::Completed)
}

fn transition_as_operator(
    conn: &mut PgConnection,
    principal: &Principal,
    order_id: i64,
    to: OrderStatus,
) -> Result<Order, MarketplaceError> {
    let from = to
        .predecessor()
        .ok_or(Conflict::OrderStatus { expected: to })?;

    conn.transaction(|conn| {
        let order = super::find_order_for_update(conn, order_id)?;
        catalog::ensure_restaurant_operator(conn, principal, order.restaurant_id)?;

        compare_and_set(conn, order.id, from, to, Actor::RestaurantOperator)?;
        if to == OrderStatus::Completed {
            riders::release_active_work(conn, order.id)?;
        }

        super::find_order(conn, order.id)
    })
}
