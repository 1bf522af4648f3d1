//! The per-user cart.
//!
//! A cart is locked to one restaurant while it holds items; adding a menu of
//! another restaurant is rejected rather than clearing the cart. Lines merge
//! only when menu, note and the set of selected option values all match.

use chrono::Utc;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::PgConnection;
use serde::Serialize;

use crate::catalog;
use crate::error::{Conflict, MarketplaceError};
use crate::models::{self, Cart, CartItem, CartItemSelection};
use crate::pricing;
use crate::principal::Principal;
use crate::schema::{cart_item_selections, cart_items, carts};

#[derive(Serialize, Debug, PartialEq)]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub selections: Vec<CartItemSelection>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct CartView {
    /// `None` when the user has never had a cart.
    pub cart_id: Option<i64>,
    pub user_id: i64,
    pub restaurant_id: Option<i64>,
    pub items: Vec<CartLine>,
    pub subtotal: i64,
}

impl CartView {
    fn empty(user_id: i64) -> Self {
        Self {
            cart_id: None,
            user_id,
            restaurant_id: None,
            items: vec![],
            subtotal: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AddCartItem {
    pub restaurant_id: i64,
    pub menu_id: i64,
    pub qty: i32,
    pub note: String,
    pub option_value_ids: Vec<i64>,
}

pub fn get(conn: &mut PgConnection, principal: &Principal) -> Result<CartView, MarketplaceError> {
    match find_cart(conn, principal.user_id)? {
        Some(cart) => Ok(load_view(conn, cart)?),
        None => Ok(CartView::empty(principal.user_id)),
    }
}

pub fn add(
    conn: &mut PgConnection,
    principal: &Principal,
    input: AddCartItem,
) -> Result<CartView, MarketplaceError> {
    if input.qty < 1 {
        return Err(MarketplaceError::InvalidQuantity);
    }
    pricing::ensure_distinct(&input.option_value_ids)?;

    conn.transaction(|conn| {
        diesel::insert_into(carts::table)
            .values(models::NewCart {
                user_id: principal.user_id,
                restaurant_id: None,
            })
            .on_conflict(carts::user_id)
            .do_nothing()
            .execute(conn)?;
        let cart = carts::table
            .filter(carts::user_id.eq(principal.user_id))
            .select(Cart::as_select())
            .for_update()
            .first(conn)?;

        if let Some(locked) = cart.restaurant_id {
            if locked != input.restaurant_id {
                return Err(Conflict::CartHasAnotherRestaurant.into());
            }
        }

        let menu = catalog::find_menu(conn, input.menu_id)?
            .filter(|menu| menu.restaurant_id == input.restaurant_id)
            .ok_or(MarketplaceError::MenuNotInRestaurant)?;
        let valid = catalog::option_values_for_menus(conn, &[menu.id], &input.option_value_ids)?;
        let selections = catalog::resolve_selections(&valid, menu.id, &input.option_value_ids)?;
        let unit_price = pricing::unit_price(menu.price, &selections)?;
        let key = pricing::selection_key(&input.option_value_ids);

        let existing = cart_items::table
            .filter(cart_items::cart_id.eq(cart.id))
            .filter(cart_items::menu_id.eq(menu.id))
            .filter(cart_items::note.eq(&input.note))
            .filter(cart_items::selection_key.eq(&key))
            .select(CartItem::as_select())
            .for_update()
            .first(conn)
            .optional()?;

        match existing {
            Some(item) => {
                let qty = item
                    .qty
                    .checked_add(input.qty)
                    .ok_or(MarketplaceError::PriceOutOfRange)?;
                let total = pricing::line_total(item.unit_price, qty)?;
                diesel::update(cart_items::table.find(item.id))
                    .set((cart_items::qty.eq(qty), cart_items::total.eq(total)))
                    .execute(conn)?;
            }
            None => {
                let total = pricing::line_total(unit_price, input.qty)?;
                let item_id = diesel::insert_into(cart_items::table)
                    .values(models::NewCartItem {
                        cart_id: cart.id,
                        menu_id: menu.id,
                        qty: input.qty,
                        note: &input.note,
                        selection_key: &key,
                        unit_price,
                        total,
                    })
                    .returning(cart_items::id)
                    .get_result::<i64>(conn)?;
                let rows = selections
                    .iter()
                    .map(|s| models::NewCartItemSelection {
                        cart_item_id: item_id,
                        option_id: s.option_id,
                        option_value_id: s.option_value_id,
                        price_delta: s.price_delta,
                    })
                    .collect::<Vec<_>>();
                if !rows.is_empty() {
                    diesel::insert_into(cart_item_selections::table)
                        .values(&rows)
                        .execute(conn)?;
                }
            }
        }

        let cart = diesel::update(carts::table.find(cart.id))
            .set((
                carts::restaurant_id.eq(Some(input.restaurant_id)),
                carts::updated_at.eq(Utc::now()),
            ))
            .returning(Cart::as_returning())
            .get_result(conn)?;

        tracing::debug!(
            user_id = principal.user_id,
            menu_id = menu.id,
            qty = input.qty,
            "cart item added"
        );
        Ok(load_view(conn, cart)?)
    })
}

/// Sets the quantity of one of the caller's items; zero or less removes it.
pub fn update_qty(
    conn: &mut PgConnection,
    principal: &Principal,
    item_id: i64,
    qty: i32,
) -> Result<CartView, MarketplaceError> {
    conn.transaction(|conn| {
        let cart = carts::table
            .filter(carts::user_id.eq(principal.user_id))
            .select(Cart::as_select())
            .for_update()
            .first(conn)
            .optional()?
            .ok_or(MarketplaceError::NotFound("cart item"))?;
        let item = CartItem::belonging_to(&cart)
            .filter(cart_items::id.eq(item_id))
            .select(CartItem::as_select())
            .first(conn)
            .optional()?
            .ok_or(MarketplaceError::NotFound("cart item"))?;

        if qty <= 0 {
            diesel::delete(cart_items::table.find(item.id)).execute(conn)?;
            let cart = release_if_empty(conn, cart)?;
            return Ok(load_view(conn, cart)?);
        }

        let total = pricing::line_total(item.unit_price, qty)?;
        diesel::update(cart_items::table.find(item.id))
            .set((cart_items::qty.eq(qty), cart_items::total.eq(total)))
            .execute(conn)?;
        Ok(load_view(conn, cart)?)
    })
}

pub fn remove_item(
    conn: &mut PgConnection,
    principal: &Principal,
    item_id: i64,
) -> Result<CartView, MarketplaceError> {
    update_qty(conn, principal, item_id, 0)
}

pub fn clear(conn: &mut PgConnection, principal: &Principal) -> Result<CartView, MarketplaceError> {
    conn.transaction(|conn| {
        let Some(cart) = find_cart(conn, principal.user_id)? else {
            return Ok(CartView::empty(principal.user_id));
        };
        let cart = clear_cart(conn, cart)?;
        Ok(load_view(conn, cart)?)
    })
}

pub(crate) fn find_cart(conn: &mut PgConnection, user_id: i64) -> QueryResult<Option<Cart>> {
    carts::table
        .filter(carts::user_id.eq(user_id))
        .select(Cart::as_select())
        .first(conn)
        .optional()
}

pub(crate) fn clear_cart(conn: &mut PgConnection, cart: Cart) -> QueryResult<Cart> {
    diesel::delete(cart_items::table.filter(cart_items::cart_id.eq(cart.id))).execute(conn)?;
    unlock(conn, cart.id)
}

pub(crate) fn load_lines(conn: &mut PgConnection, cart: &Cart) -> QueryResult<Vec<CartLine>> {
    let items = CartItem::belonging_to(cart)
        .select(CartItem::as_select())
        .order(cart_items::id.asc())
        .load(conn)?;
    let selections = CartItemSelection::belonging_to(&items)
        .select(CartItemSelection::as_select())
        .order(cart_item_selections::id.asc())
        .load(conn)?
        .grouped_by(&items);

    Ok(items
        .into_iter()
        .zip(selections)
        .map(|(item, selections)| CartLine { item, selections })
        .collect())
}

fn load_view(conn: &mut PgConnection, cart: Cart) -> QueryResult<CartView> {
    let items = load_lines(conn, &cart)?;
    let subtotal = items.iter().map(|line| line.item.total).sum::<i64>();
    Ok(CartView {
        cart_id: Some(cart.id),
        user_id: cart.user_id,
        restaurant_id: cart.restaurant_id,
        items,
        subtotal,
    })
}

fn release_if_empty(conn: &mut PgConnection, cart: Cart) -> QueryResult<Cart> {
    let has_items = diesel::select(exists(
        cart_items::table.filter(cart_items::cart_id.eq(cart.id)),
    ))
    .get_result::<bool>(conn)?;
    if has_items {
        return Ok(cart);
    }
    unlock(conn, cart.id)
}

fn unlock(conn: &mut PgConnection, cart_id: i64) -> QueryResult<Cart> {
    diesel::update(carts::table.find(cart_id))
        .set((
            carts::restaurant_id.eq(None::<i64>),
            carts::updated_at.eq(Utc::now()),
        ))
        .returning(Cart::as_returning())
        .get_result(conn)
}
