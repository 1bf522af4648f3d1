use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::schema::{
    cart_item_selections, cart_items, carts, menus, order_item_selections, order_items, orders,
    outbox, payments, restaurants, rider_applications, rider_works, riders,
};

#[derive(Queryable, Selectable, Identifiable, Debug, PartialEq)]
#[diesel(table_name = restaurants)]
pub struct Restaurant {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, PartialEq)]
#[diesel(belongs_to(Restaurant))]
#[diesel(table_name = menus)]
pub struct Menu {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub price: i64,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, PartialEq)]
#[diesel(table_name = carts)]
pub struct Cart {
    pub id: i64,
    pub user_id: i64,
    pub restaurant_id: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, PartialEq)]
#[diesel(table_name = carts)]
pub struct NewCart {
    pub user_id: i64,
    pub restaurant_id: Option<i64>,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Serialize, Debug, PartialEq)]
#[diesel(belongs_to(Cart))]
#[diesel(table_name = cart_items)]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub menu_id: i64,
    pub qty: i32,
    pub note: String,
    pub selection_key: String,
    pub unit_price: i64,
    pub total: i64,
}

#[derive(Insertable, Debug, PartialEq)]
#[diesel(table_name = cart_items)]
pub struct NewCartItem<'a> {
    pub cart_id: i64,
    pub menu_id: i64,
    pub qty: i32,
    pub note: &'a str,
    pub selection_key: &'a str,
    pub unit_price: i64,
    pub total: i64,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Serialize, Debug, PartialEq)]
#[diesel(belongs_to(CartItem))]
#[diesel(table_name = cart_item_selections)]
pub struct CartItemSelection {
    pub id: i64,
    pub cart_item_id: i64,
    pub option_id: i64,
    pub option_value_id: i64,
    pub price_delta: i64,
}

#[derive(Insertable, Debug, PartialEq)]
#[diesel(table_name = cart_item_selections)]
pub struct NewCartItemSelection {
    pub cart_item_id: i64,
    pub option_id: i64,
    pub option_value_id: i64,
    pub price_delta: i64,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, PartialEq)]
#[diesel(table_name = orders)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub restaurant_id: i64,
    pub order_status_id: i32,
    pub subtotal: i64,
    pub discount: i64,
    pub delivery_fee: i64,
    pub total: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, PartialEq)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub user_id: i64,
    pub restaurant_id: i64,
    pub order_status_id: i32,
    pub subtotal: i64,
    pub discount: i64,
    pub delivery_fee: i64,
    pub total: i64,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Serialize, Debug, PartialEq)]
#[diesel(belongs_to(Order))]
#[diesel(table_name = order_items)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_id: i64,
    pub qty: i32,
    pub note: String,
    pub unit_price: i64,
    pub total: i64,
}

#[derive(Insertable, Debug, PartialEq)]
#[diesel(table_name = order_items)]
pub struct NewOrderItem<'a> {
    pub order_id: i64,
    pub menu_id: i64,
    pub qty: i32,
    pub note: &'a str,
    pub unit_price: i64,
    pub total: i64,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Serialize, Debug, PartialEq)]
#[diesel(belongs_to(OrderItem))]
#[diesel(table_name = order_item_selections)]
pub struct OrderItemSelection {
    pub id: i64,
    pub order_item_id: i64,
    pub option_id: i64,
    pub option_value_id: i64,
    pub price_delta: i64,
}

#[derive(Insertable, Debug, PartialEq)]
#[diesel(table_name = order_item_selections)]
pub struct NewOrderItemSelection {
    pub order_item_id: i64,
    pub option_id: i64,
    pub option_value_id: i64,
    pub price_delta: i64,
}

#[derive(Queryable, Selectable, Identifiable, Debug, PartialEq)]
#[diesel(table_name = rider_applications)]
pub struct RiderApplication {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

#[derive(Queryable, Selectable, Identifiable, Debug, PartialEq)]
#[diesel(table_name = riders)]
pub struct Rider {
    pub id: i64,
    pub user_id: i64,
    pub application_id: i64,
    pub rider_status_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, PartialEq)]
#[diesel(table_name = riders)]
pub struct NewRider {
    pub user_id: i64,
    pub application_id: i64,
    pub rider_status_id: i32,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Serialize, Debug, PartialEq)]
#[diesel(belongs_to(Rider))]
#[diesel(table_name = rider_works)]
pub struct RiderWork {
    pub id: i64,
    pub rider_id: i64,
    pub order_id: i64,
    pub work_at: DateTime<Utc>,
    pub finish_at: Option<DateTime<Utc>>,
}

#[derive(Insertable, Debug, PartialEq)]
#[diesel(table_name = rider_works)]
pub struct NewRiderWork {
    pub rider_id: i64,
    pub order_id: i64,
    pub work_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Debug, PartialEq)]
#[diesel(table_name = payments)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub amount: i64,
    pub payment_method_id: i32,
    pub payment_status_id: i32,
    pub paid_at: Option<DateTime<Utc>>,
    pub slip_reference: Option<String>,
    pub slip_uploaded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert side of the per-order payment upsert; the same values are applied
/// on conflict with the existing row.
#[derive(Insertable, AsChangeset, Debug, PartialEq)]
#[diesel(table_name = payments)]
#[diesel(treat_none_as_null = true)]
pub struct PaymentUpsert {
    pub order_id: i64,
    pub amount: i64,
    pub payment_method_id: i32,
    pub payment_status_id: i32,
    pub paid_at: Option<DateTime<Utc>>,
    pub slip_reference: Option<String>,
    pub slip_uploaded_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Debug, PartialEq)]
#[diesel(table_name = outbox)]
pub struct Outbox {
    pub id: i32,
    pub topic: String,
    pub key: String,
    pub value: Vec<u8>,
}

#[derive(Insertable, Debug, PartialEq)]
#[diesel(table_name = outbox)]
pub struct NewOutbox {
    pub topic: String,
    pub key: String,
    pub value: Vec<u8>,
}
