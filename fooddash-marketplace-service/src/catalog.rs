//! Read-only view of restaurants, menus and option values.
//!
//! Rows are owned by the catalog collaborator; nothing here writes.

use std::collections::HashMap;

use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::PgConnection;

use crate::error::MarketplaceError;
use crate::models;
use crate::pricing::SelectedValue;
use crate::principal::Principal;
use crate::schema::{menu_options, menus, option_values, restaurants};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MenuRef {
    pub id: i64,
    pub price: i64,
    pub restaurant_id: i64,
}

/// An option value that is valid for a particular menu.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MenuOptionValue {
    pub menu_id: i64,
    pub value: SelectedValue,
}

/// `None` when no such menu exists; callers report that as invalid input.
pub fn find_menu(conn: &mut PgConnection, menu_id: i64) -> QueryResult<Option<MenuRef>> {
    Ok(menus::table
        .find(menu_id)
        .select((menus::id, menus::price, menus::restaurant_id))
        .first::<(i64, i64, i64)>(conn)
        .optional()?
        .map(|(id, price, restaurant_id)| MenuRef {
            id,
            price,
            restaurant_id,
        }))
}

pub fn restaurant_exists(conn: &mut PgConnection, restaurant_id: i64) -> QueryResult<bool> {
    diesel::select(exists(restaurants::table.find(restaurant_id))).get_result(conn)
}

pub fn find_restaurant(
    conn: &mut PgConnection,
    restaurant_id: i64,
) -> Result<models::Restaurant, MarketplaceError> {
    restaurants::table
        .find(restaurant_id)
        .select(models::Restaurant::as_select())
        .first(conn)
        .optional()?
        .ok_or(MarketplaceError::RestaurantNotFound)
}

/// Fails with `Forbidden` unless the principal operates the restaurant.
pub fn ensure_restaurant_operator(
    conn: &mut PgConnection,
    principal: &Principal,
    restaurant_id: i64,
) -> Result<models::Restaurant, MarketplaceError> {
    let restaurant = find_restaurant(conn, restaurant_id)?;
    if restaurant.user_id != principal.user_id {
        return Err(MarketplaceError::Forbidden);
    }
    Ok(restaurant)
}

/// Prices of the requested menus, restricted to those owned by the restaurant.
pub fn menu_prices_in_restaurant(
    conn: &mut PgConnection,
    restaurant_id: i64,
    menu_ids: &[i64],
) -> QueryResult<HashMap<i64, i64>> {
    let rows = menus::table
        .filter(menus::restaurant_id.eq(restaurant_id))
        .filter(menus::id.eq_any(menu_ids))
        .select((menus::id, menus::price))
        .load::<(i64, i64)>(conn)?;
    Ok(rows.into_iter().collect())
}

/// The requested option values whose option is attached to one of the given
/// menus. A value attached to several of the menus appears once per menu.
pub fn option_values_for_menus(
    conn: &mut PgConnection,
    menu_ids: &[i64],
    option_value_ids: &[i64],
) -> QueryResult<Vec<MenuOptionValue>> {
    if option_value_ids.is_empty() {
        return Ok(vec![]);
    }
    let rows = option_values::table
        .inner_join(menu_options::table.on(menu_options::option_id.eq(option_values::option_id)))
        .filter(menu_options::menu_id.eq_any(menu_ids))
        .filter(option_values::id.eq_any(option_value_ids))
        .select((
            menu_options::menu_id,
            option_values::option_id,
            option_values::id,
            option_values::price_adjustment,
        ))
        .load::<(i64, i64, i64, i64)>(conn)?;

    Ok(rows
        .into_iter()
        .map(
            |(menu_id, option_id, option_value_id, price_delta)| MenuOptionValue {
                menu_id,
                value: SelectedValue {
                    option_id,
                    option_value_id,
                    price_delta,
                },
            },
        )
        .collect())
}

/// Resolves `option_value_ids` for one menu, in request order.
///
/// Fails with `InvalidOptionValue` on the first id whose option is not
/// attached to the menu.
pub fn resolve_selections(
    valid: &[MenuOptionValue],
    menu_id: i64,
    option_value_ids: &[i64],
) -> Result<Vec<SelectedValue>, MarketplaceError> {
    option_value_ids
        .iter()
        .map(|id| {
            valid
                .iter()
                .find(|v| v.menu_id == menu_id && v.value.option_value_id == *id)
                .map(|v| v.value)
                .ok_or(MarketplaceError::InvalidOptionValue(*id))
        })
        .collect()
}
