#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use diesel::prelude::*;
use diesel::PgConnection;
use fooddash_marketplace_service::lookup::{self, OrderStatus};
use fooddash_marketplace_service::orders::{self, status, CreateOrder, OrderLineRequest};
use fooddash_marketplace_service::schema::{
    menu_options, menus, option_values, options, orders as orders_table, outbox, restaurants,
    rider_applications,
};
use fooddash_marketplace_service::{riders, run_migrations, Principal, Role};

pub const DELIVERY_FEE: i64 = 20;

static MIGRATED: Mutex<bool> = Mutex::new(false);

/// Opens a connection with migrations applied, or `None` when no database is
/// configured so DB-backed tests can be skipped.
pub fn connect() -> Option<PgConnection> {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").ok()?;
    let mut conn = match PgConnection::establish(&url) {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("skipping database test: {e}");
            return None;
        }
    };

    let mut migrated = MIGRATED.lock().unwrap_or_else(|e| e.into_inner());
    if !*migrated {
        run_migrations(&mut conn).unwrap();
        *migrated = true;
    }
    Some(conn)
}

/// A connection whose changes are rolled back when it is dropped.
pub fn test_connection() -> Option<PgConnection> {
    let mut conn = connect()?;
    conn.begin_test_transaction().unwrap();
    Some(conn)
}

/// User ids unique across test processes.
pub fn next_user_id() -> i64 {
    static BASE: OnceLock<i64> = OnceLock::new();
    static NEXT: AtomicI64 = AtomicI64::new(0);
    let base = *BASE.get_or_init(|| {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_micros() as i64;
        (micros % 1_000_000_000_000) * 1_000
    });
    base + NEXT.fetch_add(1, Ordering::SeqCst)
}

pub fn customer() -> Principal {
    Principal::new(next_user_id(), Role::Customer)
}

pub fn admin() -> Principal {
    Principal::new(next_user_id(), Role::Admin)
}

pub struct Catalog {
    pub owner: Principal,
    pub restaurant_id: i64,
    /// Priced at 100.
    pub menu_id: i64,
    /// Priced at 50, no options.
    pub side_menu_id: i64,
    pub size_option_id: i64,
    /// +20 on `menu_id`.
    pub large_id: i64,
    /// +10 on `menu_id`.
    pub extra_id: i64,
    pub other_restaurant_id: i64,
    pub other_menu_id: i64,
    /// An option value of the other restaurant.
    pub other_value_id: i64,
}

fn insert_restaurant(conn: &mut PgConnection, owner: i64, name: &str) -> i64 {
    diesel::insert_into(restaurants::table)
        .values((restaurants::user_id.eq(owner), restaurants::name.eq(name)))
        .returning(restaurants::id)
        .get_result(conn)
        .unwrap()
}

fn insert_menu(conn: &mut PgConnection, restaurant_id: i64, name: &str, price: i64) -> i64 {
    diesel::insert_into(menus::table)
        .values((
            menus::restaurant_id.eq(restaurant_id),
            menus::name.eq(name),
            menus::price.eq(price),
        ))
        .returning(menus::id)
        .get_result(conn)
        .unwrap()
}

fn insert_option(conn: &mut PgConnection, restaurant_id: i64, menu_id: i64, name: &str) -> i64 {
    let option_id = diesel::insert_into(options::table)
        .values((options::restaurant_id.eq(restaurant_id), options::name.eq(name)))
        .returning(options::id)
        .get_result(conn)
        .unwrap();
    diesel::insert_into(menu_options::table)
        .values((
            menu_options::menu_id.eq(menu_id),
            menu_options::option_id.eq(option_id),
        ))
        .execute(conn)
        .unwrap();
    option_id
}

fn insert_value(conn: &mut PgConnection, option_id: i64, name: &str, adjustment: i64) -> i64 {
    diesel::insert_into(option_values::table)
        .values((
            option_values::option_id.eq(option_id),
            option_values::name.eq(name),
            option_values::price_adjustment.eq(adjustment),
        ))
        .returning(option_values::id)
        .get_result(conn)
        .unwrap()
}

pub fn seed_catalog(conn: &mut PgConnection) -> Catalog {
    let owner = Principal::new(next_user_id(), Role::Owner);
    let restaurant_id = insert_restaurant(conn, owner.user_id, "Noodle Bar");
    let menu_id = insert_menu(conn, restaurant_id, "Beef Noodle", 100);
    let side_menu_id = insert_menu(conn, restaurant_id, "Spring Roll", 50);
    let size_option_id = insert_option(conn, restaurant_id, menu_id, "Size");
    let large_id = insert_value(conn, size_option_id, "Large", 20);
    let extras = insert_option(conn, restaurant_id, menu_id, "Extras");
    let extra_id = insert_value(conn, extras, "Egg", 10);

    let other_restaurant_id = insert_restaurant(conn, next_user_id(), "Pizza Place");
    let other_menu_id = insert_menu(conn, other_restaurant_id, "Margherita", 200);
    let crust = insert_option(conn, other_restaurant_id, other_menu_id, "Crust");
    let other_value_id = insert_value(conn, crust, "Thin", 0);

    Catalog {
        owner,
        restaurant_id,
        menu_id,
        side_menu_id,
        size_option_id,
        large_id,
        extra_id,
        other_restaurant_id,
        other_menu_id,
        other_value_id,
    }
}

pub fn line(menu_id: i64, qty: i32, option_value_ids: Vec<i64>) -> OrderLineRequest {
    OrderLineRequest {
        menu_id,
        qty,
        note: String::new(),
        option_value_ids,
    }
}

/// Places a one-line order (2 x large noodle, total 260) and walks it to
/// `target` through the restaurant operator.
pub fn order_in(
    conn: &mut PgConnection,
    catalog: &Catalog,
    customer: &Principal,
    target: OrderStatus,
) -> i64 {
    let input = CreateOrder {
        restaurant_id: catalog.restaurant_id,
        items: vec![line(catalog.menu_id, 2, vec![catalog.large_id])],
    };
    let order_id = orders::create_order(conn, customer, DELIVERY_FEE, &input)
        .unwrap()
        .order_id;

    let path: &[OrderStatus] = match target {
        OrderStatus::Pending => &[],
        OrderStatus::Preparing => &[OrderStatus::Preparing],
        OrderStatus::Delivering => &[OrderStatus::Preparing, OrderStatus::Delivering],
        OrderStatus::Completed => &[
            OrderStatus::Preparing,
            OrderStatus::Delivering,
            OrderStatus::Completed,
        ],
        OrderStatus::Cancelled => &[OrderStatus::Cancelled],
    };
    for step in path {
        let moved = match step {
            OrderStatus::Preparing => status::accept(conn, &catalog.owner, order_id),
            OrderStatus::Delivering => status::hand_off(conn, &catalog.owner, order_id),
            OrderStatus::Completed => status::complete(conn, &catalog.owner, order_id),
            OrderStatus::Cancelled => status::cancel(conn, &catalog.owner, order_id),
            OrderStatus::Pending => unreachable!(),
        };
        moved.unwrap();
    }
    order_id
}

pub fn order_status(conn: &mut PgConnection, order_id: i64) -> OrderStatus {
    let id = orders_table::table
        .find(order_id)
        .select(orders_table::order_status_id)
        .first::<i32>(conn)
        .unwrap();
    lookup::lookups(conn).unwrap().order_status.value(id).unwrap()
}

/// An approved rider, ONLINE when `online` is set.
pub fn seed_rider(conn: &mut PgConnection, online: bool) -> Principal {
    let rider = Principal::new(next_user_id(), Role::Rider);
    let application_id = diesel::insert_into(rider_applications::table)
        .values(rider_applications::user_id.eq(rider.user_id))
        .returning(rider_applications::id)
        .get_result::<i64>(conn)
        .unwrap();
    riders::approve_application(conn, &admin(), application_id).unwrap();
    if online {
        riders::set_availability(conn, &rider, true).unwrap();
    }
    rider
}

/// Event types written to the outbox under `key`, oldest first.
pub fn outbox_types(conn: &mut PgConnection, topic: &str, key: &str) -> Vec<String> {
    outbox::table
        .filter(outbox::topic.eq(topic))
        .filter(outbox::key.eq(key))
        .order(outbox::id.asc())
        .select(outbox::value)
        .load::<Vec<u8>>(conn)
        .unwrap()
        .into_iter()
        .map(|value| {
            let event: serde_json::Value = serde_json::from_slice(&value).unwrap();
            event["type"].as_str().unwrap().to_string()
        })
        .collect()
}
