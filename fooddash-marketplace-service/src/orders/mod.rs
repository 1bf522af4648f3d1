//! Order pricing, creation and reads.

pub mod status;

use chrono::{DateTime, Utc};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::PgConnection;
use serde::Serialize;

use crate::cart;
use crate::catalog;
use crate::error::MarketplaceError;
use crate::events::{MarketplaceEvent, MarketplaceEventPublisher};
use crate::lookup::{self, Lookups, OrderStatus};
use crate::models::{self, Cart, Order, OrderItem, OrderItemSelection};
use crate::pricing::{self, OrderTotals, PricedLine};
use crate::principal::Principal;
use crate::schema::{
    carts, order_item_selections, order_items, orders, restaurants, rider_works, riders,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineRequest {
    pub menu_id: i64,
    pub qty: i32,
    pub note: String,
    pub option_value_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrder {
    pub restaurant_id: i64,
    pub items: Vec<OrderLineRequest>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedOrder {
    pub order_id: i64,
    pub status: OrderStatus,
    #[serde(flatten)]
    pub totals: OrderTotals,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub id: i64,
    pub user_id: i64,
    pub restaurant_id: i64,
    pub status: OrderStatus,
    pub subtotal: i64,
    pub discount: i64,
    pub delivery_fee: i64,
    pub total: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderSummary {
    pub fn from_order(order: Order, lookups: &Lookups) -> Result<Self, MarketplaceError> {
        Ok(Self {
            id: order.id,
            user_id: order.user_id,
            restaurant_id: order.restaurant_id,
            status: lookups.order_status.value(order.order_status_id)?,
            subtotal: order.subtotal,
            discount: order.discount,
            delivery_fee: order.delivery_fee,
            total: order.total,
            created_at: order.created_at,
            updated_at: order.updated_at,
        })
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct OrderLine {
    #[serde(flatten)]
    pub item: OrderItem,
    pub selections: Vec<OrderItemSelection>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub summary: OrderSummary,
    pub items: Vec<OrderLine>,
}

/// Checks that can be made without touching the database, in the order the
/// caller sees them: an empty order, then a bad quantity, then repeated
/// option values within a line.
pub fn validate_lines(items: &[OrderLineRequest]) -> Result<(), MarketplaceError> {
    if items.is_empty() {
        return Err(MarketplaceError::EmptyItems);
    }
    if items.iter().any(|item| item.qty < 1) {
        return Err(MarketplaceError::InvalidQuantity);
    }
    for item in items {
        pricing::ensure_distinct(&item.option_value_ids)?;
    }
    Ok(())
}

/// Prices `input` from catalog data and persists it as a PENDING order.
///
/// Client-supplied prices are never consulted. Nothing is written unless
/// every line validates.
pub fn create_order(
    conn: &mut PgConnection,
    principal: &Principal,
    delivery_fee: i64,
    input: &CreateOrder,
) -> Result<CreatedOrder, MarketplaceError> {
    validate_lines(&input.items)?;
    conn.transaction(|conn| place_order(conn, principal.user_id, delivery_fee, input))
}

/// Turns the caller's cart into an order and empties the cart, atomically.
pub fn checkout_cart(
    conn: &mut PgConnection,
    principal: &Principal,
    delivery_fee: i64,
) -> Result<CreatedOrder, MarketplaceError> {
    conn.transaction(|conn| {
        let cart = carts::table
            .filter(carts::user_id.eq(principal.user_id))
            .select(Cart::as_select())
            .for_update()
            .first(conn)
            .optional()?
            .ok_or(MarketplaceError::EmptyItems)?;
        let restaurant_id = cart.restaurant_id.ok_or(MarketplaceError::EmptyItems)?;
        let items = cart::load_lines(conn, &cart)?
            .into_iter()
            .map(|line| OrderLineRequest {
                menu_id: line.item.menu_id,
                qty: line.item.qty,
                note: line.item.note,
                option_value_ids: line
                    .selections
                    .iter()
                    .map(|s| s.option_value_id)
                    .collect(),
            })
            .collect::<Vec<_>>();

        let input = CreateOrder {
            restaurant_id,
            items,
        };
        validate_lines(&input.items)?;
        let created = place_order(conn, principal.user_id, delivery_fee, &input)?;
        cart::clear_cart(conn, cart)?;
        Ok(created)
    })
}

fn place_order(
    conn: &mut PgConnection,
    user_id: i64,
    delivery_fee: i64,
    input: &CreateOrder,
) -> Result<CreatedOrder, MarketplaceError> {
    if !catalog::restaurant_exists(conn, input.restaurant_id)? {
        return Err(MarketplaceError::RestaurantNotFound);
    }

    let mut menu_ids = input.items.iter().map(|i| i.menu_id).collect::<Vec<_>>();
    menu_ids.sort_unstable();
    menu_ids.dedup();
    let prices = catalog::menu_prices_in_restaurant(conn, input.restaurant_id, &menu_ids)?;
    if prices.len() != menu_ids.len() {
        return Err(MarketplaceError::MenuNotInRestaurant);
    }

    let mut value_ids = input
        .items
        .iter()
        .flat_map(|i| i.option_value_ids.iter().copied())
        .collect::<Vec<_>>();
    value_ids.sort_unstable();
    value_ids.dedup();
    let valid = catalog::option_values_for_menus(conn, &menu_ids, &value_ids)?;

    let lines = input
        .items
        .iter()
        .map(|item| {
            let price = prices
                .get(&item.menu_id)
                .copied()
                .ok_or(MarketplaceError::MenuNotInRestaurant)?;
            let selections =
                catalog::resolve_selections(&valid, item.menu_id, &item.option_value_ids)?;
            pricing::price_line(item.menu_id, price, item.qty, selections)
        })
        .collect::<Result<Vec<PricedLine>, _>>()?;
    let totals = OrderTotals::compute(&lines, delivery_fee)?;

    let lookups = lookup::lookups(conn)?;
    let order_id = diesel::insert_into(orders::table)
        .values(models::NewOrder {
            user_id,
            restaurant_id: input.restaurant_id,
            order_status_id: lookups.order_status.id(OrderStatus::Pending),
            subtotal: totals.subtotal,
            discount: totals.discount,
            delivery_fee: totals.delivery_fee,
            total: totals.total,
        })
        .returning(orders::id)
        .get_result::<i64>(conn)?;

    for (line, item) in lines.iter().zip(&input.items) {
        let order_item_id = diesel::insert_into(order_items::table)
            .values(models::NewOrderItem {
                order_id,
                menu_id: line.menu_id,
                qty: line.qty,
                note: &item.note,
                unit_price: line.unit_price,
                total: line.total,
            })
            .returning(order_items::id)
            .get_result::<i64>(conn)?;

        let rows = line
            .selections
            .iter()
            .map(|s| models::NewOrderItemSelection {
                order_item_id,
                option_id: s.option_id,
                option_value_id: s.option_value_id,
                price_delta: s.price_delta,
            })
            .collect::<Vec<_>>();
        if !rows.is_empty() {
            diesel::insert_into(order_item_selections::table)
                .values(&rows)
                .execute(conn)?;
        }
    }

    MarketplaceEventPublisher::new(conn).publish(&MarketplaceEvent::OrderCreated {
        order_id,
        user_id,
        restaurant_id: input.restaurant_id,
        total: totals.total,
    })?;
    tracing::info!(
        order_id,
        user_id,
        restaurant_id = input.restaurant_id,
        total = totals.total,
        "order created"
    );

    Ok(CreatedOrder {
        order_id,
        status: OrderStatus::Pending,
        totals,
    })
}

pub(crate) fn find_order(
    conn: &mut PgConnection,
    order_id: i64,
) -> Result<Order, MarketplaceError> {
    orders::table
        .find(order_id)
        .select(Order::as_select())
        .first(conn)
        .optional()?
        .ok_or(MarketplaceError::NotFound("order"))
}

pub(crate) fn find_order_for_update(
    conn: &mut PgConnection,
    order_id: i64,
) -> Result<Order, MarketplaceError> {
    orders::table
        .find(order_id)
        .select(Order::as_select())
        .for_update()
        .first(conn)
        .optional()?
        .ok_or(MarketplaceError::NotFound("order"))
}

/// Whether `user_id` has ever been the rider on `order_id`.
pub(crate) fn is_rider_of(
    conn: &mut PgConnection,
    user_id: i64,
    order_id: i64,
) -> QueryResult<bool> {
    diesel::select(exists(
        rider_works::table
            .inner_join(riders::table)
            .filter(rider_works::order_id.eq(order_id))
            .filter(riders::user_id.eq(user_id)),
    ))
    .get_result(conn)
}

fn is_restaurant_operator(
    conn: &mut PgConnection,
    user_id: i64,
    restaurant_id: i64,
) -> QueryResult<bool> {
    diesel::select(exists(
        restaurants::table
            .filter(restaurants::id.eq(restaurant_id))
            .filter(restaurants::user_id.eq(user_id)),
    ))
    .get_result(conn)
}

/// The order with its lines, visible to the customer who placed it, the
/// restaurant operator and any rider who worked it.
pub fn get_order(
    conn: &mut PgConnection,
    principal: &Principal,
    order_id: i64,
) -> Result<OrderDetail, MarketplaceError> {
    let order = find_order(conn, order_id)?;
    let allowed = order.user_id == principal.user_id
        || is_restaurant_operator(conn, principal.user_id, order.restaurant_id)?
        || is_rider_of(conn, principal.user_id, order.id)?;
    if !allowed {
        return Err(MarketplaceError::Forbidden);
    }

    let items = OrderItem::belonging_to(&order)
        .select(OrderItem::as_select())
        .order(order_items::id.asc())
        .load(conn)?;
    let selections = OrderItemSelection::belonging_to(&items)
        .select(OrderItemSelection::as_select())
        .order(order_item_selections::id.asc())
        .load(conn)?
        .grouped_by(&items);
    let items = items
        .into_iter()
        .zip(selections)
        .map(|(item, selections)| OrderLine { item, selections })
        .collect();

    let lookups = lookup::lookups(conn)?;
    Ok(OrderDetail {
        summary: OrderSummary::from_order(order, lookups)?,
        items,
    })
}

/// The caller's own orders, newest first.
pub fn list_customer_orders(
    conn: &mut PgConnection,
    principal: &Principal,
) -> Result<Vec<OrderSummary>, MarketplaceError> {
    let rows = orders::table
        .filter(orders::user_id.eq(principal.user_id))
        .order(orders::created_at.desc())
        .then_order_by(orders::id.desc())
        .select(Order::as_select())
        .load(conn)?;
    summarize(conn, rows)
}

/// Orders of a restaurant the caller operates, optionally narrowed to one
/// status, newest first.
pub fn list_restaurant_orders(
    conn: &mut PgConnection,
    principal: &Principal,
    restaurant_id: i64,
    status: Option<OrderStatus>,
) -> Result<Vec<OrderSummary>, MarketplaceError> {
    catalog::ensure_restaurant_operator(conn, principal, restaurant_id)?;

    let mut query = orders::table
        .filter(orders::restaurant_id.eq(restaurant_id))
        .select(Order::as_select())
        .into_boxed();
    if let Some(status) = status {
        let lookups = lookup::lookups(conn)?;
        query = query.filter(orders::order_status_id.eq(lookups.order_status.id(status)));
    }
    let rows = query
        .order(orders::created_at.desc())
        .then_order_by(orders::id.desc())
        .load(conn)?;
    summarize(conn, rows)
}

fn summarize(
    conn: &mut PgConnection,
    rows: Vec<Order>,
) -> Result<Vec<OrderSummary>, MarketplaceError> {
    let lookups = lookup::lookups(conn)?;
    rows.into_iter()
        .map(|order| OrderSummary::from_order(order, lookups))
        .collect()
}
