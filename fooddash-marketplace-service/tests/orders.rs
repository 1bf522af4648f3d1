mod common;

use common::{customer, line, order_in, outbox_types, seed_catalog, test_connection, DELIVERY_FEE};
use diesel::dsl::count_star;
use diesel::prelude::*;
use fooddash_marketplace_service::cart::{self, AddCartItem};
use fooddash_marketplace_service::events::ORDER_EVENT_CHANNEL;
use fooddash_marketplace_service::lookup::OrderStatus;
use fooddash_marketplace_service::orders::{self, CreateOrder};
use fooddash_marketplace_service::schema::{order_items, orders as orders_table};
use fooddash_marketplace_service::{MarketplaceError, Principal, Role};

fn order_count(conn: &mut PgConnection, user_id: i64) -> i64 {
    orders_table::table
        .filter(orders_table::user_id.eq(user_id))
        .select(count_star())
        .first(conn)
        .unwrap()
}

#[test]
fn test_create_order_prices_from_catalog() {
    let Some(mut conn) = test_connection() else { return };
    let catalog = seed_catalog(&mut conn);
    let user = customer();

    let input = CreateOrder {
        restaurant_id: catalog.restaurant_id,
        items: vec![line(catalog.menu_id, 2, vec![catalog.large_id])],
    };
    let created = orders::create_order(&mut conn, &user, DELIVERY_FEE, &input).unwrap();

    assert_eq!(created.status, OrderStatus::Pending);
    assert_eq!(created.totals.subtotal, 240);
    assert_eq!(created.totals.discount, 0);
    assert_eq!(created.totals.delivery_fee, 20);
    assert_eq!(created.totals.total, 260);

    let detail = orders::get_order(&mut conn, &user, created.order_id).unwrap();
    assert_eq!(detail.summary.total, 260);
    assert_eq!(detail.summary.status, OrderStatus::Pending);
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].item.unit_price, 120);
    assert_eq!(detail.items[0].item.total, 240);
    assert_eq!(detail.items[0].selections.len(), 1);
    assert_eq!(detail.items[0].selections[0].option_value_id, catalog.large_id);
    assert_eq!(detail.items[0].selections[0].price_delta, 20);

    assert_eq!(
        outbox_types(&mut conn, ORDER_EVENT_CHANNEL, &created.order_id.to_string()),
        vec!["order_created"]
    );
}

#[test]
fn test_total_is_sum_of_lines_plus_fee() {
    let Some(mut conn) = test_connection() else { return };
    let catalog = seed_catalog(&mut conn);

    let input = CreateOrder {
        restaurant_id: catalog.restaurant_id,
        items: vec![
            line(catalog.menu_id, 1, vec![catalog.large_id, catalog.extra_id]),
            line(catalog.side_menu_id, 3, vec![]),
            line(catalog.menu_id, 1, vec![]),
        ],
    };
    let created = orders::create_order(&mut conn, &customer(), DELIVERY_FEE, &input).unwrap();
    assert_eq!(created.totals.subtotal, 130 + 150 + 100);
    assert_eq!(created.totals.total, 130 + 150 + 100 + DELIVERY_FEE);
}

#[test]
fn test_menu_of_another_restaurant_creates_nothing() {
    let Some(mut conn) = test_connection() else { return };
    let catalog = seed_catalog(&mut conn);
    let user = customer();

    let input = CreateOrder {
        restaurant_id: catalog.restaurant_id,
        items: vec![
            line(catalog.menu_id, 1, vec![]),
            line(catalog.other_menu_id, 1, vec![]),
        ],
    };
    let err = orders::create_order(&mut conn, &user, DELIVERY_FEE, &input).unwrap_err();
    assert!(matches!(err, MarketplaceError::MenuNotInRestaurant));
    assert_eq!(order_count(&mut conn, user.user_id), 0);
}

#[test]
fn test_invalid_option_value_creates_nothing() {
    let Some(mut conn) = test_connection() else { return };
    let catalog = seed_catalog(&mut conn);
    let user = customer();

    let input = CreateOrder {
        restaurant_id: catalog.restaurant_id,
        items: vec![
            line(catalog.menu_id, 1, vec![catalog.large_id]),
            line(catalog.menu_id, 1, vec![catalog.other_value_id]),
        ],
    };
    let err = orders::create_order(&mut conn, &user, DELIVERY_FEE, &input).unwrap_err();
    assert!(matches!(
        err,
        MarketplaceError::InvalidOptionValue(id) if id == catalog.other_value_id
    ));
    assert_eq!(order_count(&mut conn, user.user_id), 0);

    let items: i64 = order_items::table
        .inner_join(orders_table::table)
        .filter(orders_table::user_id.eq(user.user_id))
        .select(count_star())
        .first(&mut conn)
        .unwrap();
    assert_eq!(items, 0);
}

#[test]
fn test_validation_order() {
    let Some(mut conn) = test_connection() else { return };
    let catalog = seed_catalog(&mut conn);
    let user = customer();

    let empty = CreateOrder {
        restaurant_id: -1,
        items: vec![],
    };
    assert!(matches!(
        orders::create_order(&mut conn, &user, DELIVERY_FEE, &empty),
        Err(MarketplaceError::EmptyItems)
    ));

    let zero_qty = CreateOrder {
        restaurant_id: -1,
        items: vec![line(catalog.menu_id, 0, vec![])],
    };
    assert!(matches!(
        orders::create_order(&mut conn, &user, DELIVERY_FEE, &zero_qty),
        Err(MarketplaceError::InvalidQuantity)
    ));

    let unknown_restaurant = CreateOrder {
        restaurant_id: -1,
        items: vec![line(catalog.menu_id, 1, vec![])],
    };
    assert!(matches!(
        orders::create_order(&mut conn, &user, DELIVERY_FEE, &unknown_restaurant),
        Err(MarketplaceError::RestaurantNotFound)
    ));
}

#[test]
fn test_checkout_moves_cart_into_order() {
    let Some(mut conn) = test_connection() else { return };
    let catalog = seed_catalog(&mut conn);
    let user = customer();

    cart::add(
        &mut conn,
        &user,
        AddCartItem {
            restaurant_id: catalog.restaurant_id,
            menu_id: catalog.menu_id,
            qty: 2,
            note: "extra spicy".to_string(),
            option_value_ids: vec![catalog.large_id],
        },
    )
    .unwrap();

    let created = orders::checkout_cart(&mut conn, &user, DELIVERY_FEE).unwrap();
    assert_eq!(created.totals.total, 260);

    let detail = orders::get_order(&mut conn, &user, created.order_id).unwrap();
    assert_eq!(detail.items[0].item.note, "extra spicy");
    assert_eq!(detail.items[0].selections.len(), 1);

    let view = cart::get(&mut conn, &user).unwrap();
    assert!(view.items.is_empty());
    assert_eq!(view.restaurant_id, None);
}

#[test]
fn test_checkout_of_empty_cart_is_rejected() {
    let Some(mut conn) = test_connection() else { return };
    let user = customer();

    assert!(matches!(
        orders::checkout_cart(&mut conn, &user, DELIVERY_FEE),
        Err(MarketplaceError::EmptyItems)
    ));
}

#[test]
fn test_order_visibility() {
    let Some(mut conn) = test_connection() else { return };
    let catalog = seed_catalog(&mut conn);
    let user = customer();
    let order_id = order_in(&mut conn, &catalog, &user, OrderStatus::Pending);

    assert!(orders::get_order(&mut conn, &user, order_id).is_ok());
    assert!(orders::get_order(&mut conn, &catalog.owner, order_id).is_ok());

    let stranger = Principal::new(common::next_user_id(), Role::Customer);
    assert!(matches!(
        orders::get_order(&mut conn, &stranger, order_id),
        Err(MarketplaceError::Forbidden)
    ));
    assert!(matches!(
        orders::get_order(&mut conn, &user, -1),
        Err(MarketplaceError::NotFound("order"))
    ));
}

#[test]
fn test_listings() {
    let Some(mut conn) = test_connection() else { return };
    let catalog = seed_catalog(&mut conn);
    let user = customer();
    let pending = order_in(&mut conn, &catalog, &user, OrderStatus::Pending);
    let preparing = order_in(&mut conn, &catalog, &user, OrderStatus::Preparing);

    let mine = orders::list_customer_orders(&mut conn, &user).unwrap();
    assert_eq!(
        mine.iter().map(|o| o.id).collect::<Vec<_>>(),
        vec![preparing, pending]
    );

    let queue = orders::list_restaurant_orders(
        &mut conn,
        &catalog.owner,
        catalog.restaurant_id,
        Some(OrderStatus::Pending),
    )
    .unwrap();
    assert_eq!(queue.iter().map(|o| o.id).collect::<Vec<_>>(), vec![pending]);

    assert!(matches!(
        orders::list_restaurant_orders(&mut conn, &user, catalog.restaurant_id, None),
        Err(MarketplaceError::Forbidden)
    ));
}
