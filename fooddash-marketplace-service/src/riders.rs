//! Rider onboarding, availability and delivery work.
//!
//! A rider holds at most one active work (a `rider_works` row without
//! `finish_at`), and an order has at most one active work. Both are enforced
//! by partial unique indexes; the row lock taken on the rider and the order
//! keeps the common case from reaching them.
//!
//! Transactions that touch both rows lock the order first, then the rider.

use chrono::{DateTime, Utc};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::PgConnection;
use serde::Serialize;

use crate::error::{Conflict, MarketplaceError};
use crate::events::{MarketplaceEvent, MarketplaceEventPublisher};
use crate::lookup::{self, Lookups, OrderStatus, PaymentMethod, RiderStatus};
use crate::models::{NewRider, NewRiderWork, Rider, RiderApplication, RiderWork};
use crate::orders::{self, status, status::Actor};
use crate::payments;
use crate::principal::Principal;
use crate::schema::{
    orders as orders_table, payments as payments_table, restaurants, rider_applications,
    rider_works, riders,
};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RiderProfile {
    pub id: i64,
    pub user_id: i64,
    pub status: RiderStatus,
    pub created_at: DateTime<Utc>,
}

impl RiderProfile {
    fn new(rider: Rider, lookups: &Lookups) -> Result<Self, MarketplaceError> {
        Ok(Self {
            id: rider.id,
            user_id: rider.user_id,
            status: lookups.rider_status.value(rider.rider_status_id)?,
            created_at: rider.created_at,
        })
    }
}

/// A PREPARING order nobody is working yet.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AvailableOrder {
    pub order_id: i64,
    pub restaurant_id: i64,
    pub restaurant_name: String,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct CurrentWork {
    pub work: RiderWork,
    pub customer_id: i64,
    pub restaurant_id: i64,
    pub restaurant_name: String,
    pub order_status: OrderStatus,
    pub total: i64,
    /// `None` until the customer picks a payment method.
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct CompletedWork {
    pub work: RiderWork,
    /// Whether completing the work settled a cash-on-delivery payment.
    pub payment_settled: bool,
}

/// Approves a pending rider application and creates an OFFLINE rider for it.
pub fn approve_application(
    conn: &mut PgConnection,
    principal: &Principal,
    application_id: i64,
) -> Result<RiderProfile, MarketplaceError> {
    if !principal.is_admin() {
        return Err(MarketplaceError::Forbidden);
    }

    conn.transaction(|conn| {
        let application = rider_applications::table
            .find(application_id)
            .select(RiderApplication::as_select())
            .for_update()
            .first(conn)
            .optional()?
            .ok_or(MarketplaceError::NotFound("rider application"))?;
        if application.approved_at.is_some() {
            return Err(Conflict::ApplicationAlreadyApproved.into());
        }

        diesel::update(rider_applications::table.find(application.id))
            .set(rider_applications::approved_at.eq(Utc::now()))
            .execute(conn)?;

        let lookups = lookup::lookups(conn)?;
        let rider = diesel::insert_into(riders::table)
            .values(NewRider {
                user_id: application.user_id,
                application_id: application.id,
                rider_status_id: lookups.rider_status.id(RiderStatus::Offline),
            })
            .returning(Rider::as_returning())
            .get_result(conn)
            .map_err(|e| {
                MarketplaceError::on_unique_violation(e, Conflict::ApplicationAlreadyApproved)
            })?;

        tracing::info!(
            application_id = application.id,
            rider_id = rider.id,
            user_id = rider.user_id,
            "rider application approved"
        );
        RiderProfile::new(rider, lookups)
    })
}

pub fn get_rider(
    conn: &mut PgConnection,
    principal: &Principal,
) -> Result<RiderProfile, MarketplaceError> {
    let rider = find_rider(conn, principal.user_id)?;
    let lookups = lookup::lookups(conn)?;
    RiderProfile::new(rider, lookups)
}

/// Switches between OFFLINE and ONLINE. Repeating the current status is a
/// no-op; neither direction is allowed while work is active.
pub fn set_availability(
    conn: &mut PgConnection,
    principal: &Principal,
    online: bool,
) -> Result<RiderProfile, MarketplaceError> {
    conn.transaction(|conn| {
        let rider = lock_rider(conn, principal.user_id)?;
        let lookups = lookup::lookups(conn)?;

        if has_active_work(conn, rider.id)? {
            return Err(if online {
                Conflict::RiderHasActiveWork
            } else {
                Conflict::CannotGoOfflineWithActiveWork
            }
            .into());
        }

        let target = if online {
            RiderStatus::Online
        } else {
            RiderStatus::Offline
        };
        if lookups.rider_status.value(rider.rider_status_id)? == target {
            return RiderProfile::new(rider, lookups);
        }

        let rider = diesel::update(riders::table.find(rider.id))
            .set(riders::rider_status_id.eq(lookups.rider_status.id(target)))
            .returning(Rider::as_returning())
            .get_result(conn)?;
        MarketplaceEventPublisher::new(conn).publish(&MarketplaceEvent::RiderAvailabilityChanged {
            rider_id: rider.id,
            status: target,
        })?;
        tracing::info!(rider_id = rider.id, status = ?target, "rider availability changed");
        RiderProfile::new(rider, lookups)
    })
}

/// PREPARING orders with no active work, oldest first.
pub fn list_available(
    conn: &mut PgConnection,
    principal: &Principal,
) -> Result<Vec<AvailableOrder>, MarketplaceError> {
    find_rider(conn, principal.user_id)?;
    let lookups = lookup::lookups(conn)?;

    let rows = orders_table::table
        .inner_join(restaurants::table)
        .left_join(
            rider_works::table.on(rider_works::order_id
                .eq(orders_table::id)
                .and(rider_works::finish_at.is_null())),
        )
        .filter(rider_works::id.nullable().is_null())
        .filter(orders_table::order_status_id.eq(lookups.order_status.id(OrderStatus::Preparing)))
        .order(orders_table::created_at.asc())
        .then_order_by(orders_table::id.asc())
        .select((
            orders_table::id,
            restaurants::id,
            restaurants::name,
            orders_table::total,
            orders_table::created_at,
        ))
        .load::<(i64, i64, String, i64, DateTime<Utc>)>(conn)?;

    Ok(rows
        .into_iter()
        .map(
            |(order_id, restaurant_id, restaurant_name, total, created_at)| AvailableOrder {
                order_id,
                restaurant_id,
                restaurant_name,
                total,
                created_at,
            },
        )
        .collect())
}

/// Takes a PREPARING order: records the work, marks the rider ASSIGNED and
/// moves the order to DELIVERING, all or nothing.
pub fn accept_work(
    conn: &mut PgConnection,
    principal: &Principal,
    order_id: i64,
) -> Result<RiderWork, MarketplaceError> {
    conn.transaction(|conn| {
        let order = orders::find_order_for_update(conn, order_id)?;
        let rider = lock_rider(conn, principal.user_id)?;
        let lookups = lookup::lookups(conn)?;

        if has_active_work(conn, rider.id)? {
            return Err(Conflict::RiderHasActiveWork.into());
        }
        if lookups.rider_status.value(rider.rider_status_id)? != RiderStatus::Online {
            return Err(Conflict::RiderNotOnline.into());
        }

        let order_taken = diesel::select(exists(
            rider_works::table
                .filter(rider_works::order_id.eq(order.id))
                .filter(rider_works::finish_at.is_null()),
        ))
        .get_result::<bool>(conn)?;
        if order_taken {
            return Err(Conflict::OrderAlreadyAssigned.into());
        }

        status::compare_and_set(
            conn,
            order.id,
            OrderStatus::Preparing,
            OrderStatus::Delivering,
            Actor::RiderAssignment,
        )?;

        let work = diesel::insert_into(rider_works::table)
            .values(NewRiderWork {
                rider_id: rider.id,
                order_id: order.id,
                work_at: Utc::now(),
            })
            .returning(RiderWork::as_returning())
            .get_result(conn)
            .map_err(|e| MarketplaceError::on_unique_violation(e, Conflict::OrderAlreadyAssigned))?;

        if !set_status(conn, lookups, rider.id, RiderStatus::Online, RiderStatus::Assigned)? {
            return Err(Conflict::RiderNotOnline.into());
        }

        MarketplaceEventPublisher::new(conn).publish(&MarketplaceEvent::RiderWorkAssigned {
            rider_id: rider.id,
            order_id: order.id,
            work_at: work.work_at,
        })?;
        tracing::info!(
            rider_id = rider.id,
            order_id = order.id,
            work_id = work.id,
            "work accepted"
        );
        Ok(work)
    })
}

/// Finishes the caller's active work on `order_id`: closes the work, moves
/// the order to COMPLETED, settles a pending cash-on-delivery payment and
/// releases the rider back to ONLINE, all or nothing.
pub fn complete_work(
    conn: &mut PgConnection,
    principal: &Principal,
    order_id: i64,
) -> Result<CompletedWork, MarketplaceError> {
    conn.transaction(|conn| {
        let order = orders::find_order_for_update(conn, order_id)?;
        let rider = lock_rider(conn, principal.user_id)?;
        let lookups = lookup::lookups(conn)?;
        let now = Utc::now();

        let work = diesel::update(
            rider_works::table
                .filter(rider_works::rider_id.eq(rider.id))
                .filter(rider_works::order_id.eq(order_id))
                .filter(rider_works::finish_at.is_null()),
        )
        .set(rider_works::finish_at.eq(now))
        .returning(RiderWork::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or(Conflict::NoActiveWork)?;

        status::compare_and_set(
            conn,
            order_id,
            OrderStatus::Delivering,
            OrderStatus::Completed,
            Actor::RiderAssignment,
        )?;

        let settled = payments::settle_cash_on_delivery(conn, order.id, order.total, now)?;

        if !set_status(conn, lookups, rider.id, RiderStatus::Assigned, RiderStatus::Online)? {
            return Err(Conflict::RiderNotAssigned.into());
        }

        MarketplaceEventPublisher::new(conn).publish(&MarketplaceEvent::RiderWorkCompleted {
            rider_id: rider.id,
            order_id,
            finish_at: now,
        })?;
        tracing::info!(
            rider_id = rider.id,
            order_id,
            work_id = work.id,
            payment_settled = settled.is_some(),
            "work completed"
        );
        Ok(CompletedWork {
            work,
            payment_settled: settled.is_some(),
        })
    })
}

pub fn current_work(
    conn: &mut PgConnection,
    principal: &Principal,
) -> Result<Option<CurrentWork>, MarketplaceError> {
    let rider = find_rider(conn, principal.user_id)?;
    let lookups = lookup::lookups(conn)?;

    let row = rider_works::table
        .inner_join(
            orders_table::table
                .inner_join(restaurants::table)
                .left_join(payments_table::table),
        )
        .filter(rider_works::rider_id.eq(rider.id))
        .filter(rider_works::finish_at.is_null())
        .select((
            RiderWork::as_select(),
            orders_table::user_id,
            orders_table::order_status_id,
            orders_table::total,
            restaurants::id,
            restaurants::name,
            payments_table::payment_method_id.nullable(),
        ))
        .first::<(RiderWork, i64, i32, i64, i64, String, Option<i32>)>(conn)
        .optional()?;

    let Some((work, customer_id, status_id, total, restaurant_id, restaurant_name, method_id)) = row
    else {
        return Ok(None);
    };
    Ok(Some(CurrentWork {
        work,
        customer_id,
        restaurant_id,
        restaurant_name,
        order_status: lookups.order_status.value(status_id)?,
        total,
        payment_method: method_id
            .map(|id| lookups.payment_method.value(id))
            .transpose()?,
    }))
}

/// Finished works, most recent first.
pub fn work_history(
    conn: &mut PgConnection,
    principal: &Principal,
) -> Result<Vec<RiderWork>, MarketplaceError> {
    let rider = find_rider(conn, principal.user_id)?;
    Ok(RiderWork::belonging_to(&rider)
        .filter(rider_works::finish_at.is_not_null())
        .order(rider_works::finish_at.desc())
        .select(RiderWork::as_select())
        .load(conn)?)
}

/// Closes whatever work is active on `order_id` and puts its rider back
/// ONLINE. Used when the restaurant completes an order itself; the caller
/// must already hold the order row lock.
pub(crate) fn release_active_work(
    conn: &mut PgConnection,
    order_id: i64,
) -> Result<Option<RiderWork>, MarketplaceError> {
    let lookups = lookup::lookups(conn)?;
    let now = Utc::now();
    let Some(work) = diesel::update(
        rider_works::table
            .filter(rider_works::order_id.eq(order_id))
            .filter(rider_works::finish_at.is_null()),
    )
    .set(rider_works::finish_at.eq(now))
    .returning(RiderWork::as_returning())
    .get_result(conn)
    .optional()?
    else {
        return Ok(None);
    };

    if !set_status(conn, lookups, work.rider_id, RiderStatus::Assigned, RiderStatus::Online)? {
        tracing::warn!(rider_id = work.rider_id, order_id, "released rider was not assigned");
    }
    MarketplaceEventPublisher::new(conn).publish(&MarketplaceEvent::RiderWorkCompleted {
        rider_id: work.rider_id,
        order_id,
        finish_at: now,
    })?;
    Ok(Some(work))
}

fn find_rider(conn: &mut PgConnection, user_id: i64) -> Result<Rider, MarketplaceError> {
    riders::table
        .filter(riders::user_id.eq(user_id))
        .select(Rider::as_select())
        .first(conn)
        .optional()?
        .ok_or(MarketplaceError::NotFound("rider"))
}

fn lock_rider(conn: &mut PgConnection, user_id: i64) -> Result<Rider, MarketplaceError> {
    riders::table
        .filter(riders::user_id.eq(user_id))
        .select(Rider::as_select())
        .for_update()
        .first(conn)
        .optional()?
        .ok_or(MarketplaceError::NotFound("rider"))
}

fn has_active_work(conn: &mut PgConnection, rider_id: i64) -> QueryResult<bool> {
    diesel::select(exists(
        rider_works::table
            .filter(rider_works::rider_id.eq(rider_id))
            .filter(rider_works::finish_at.is_null()),
    ))
    .get_result(conn)
}

/// Conditional rider status update; `false` when the rider was not in `from`.
fn set_status(
    conn: &mut PgConnection,
    lookups: &Lookups,
    rider_id: i64,
    from: RiderStatus,
    to: RiderStatus,
) -> QueryResult<bool> {
    let updated = diesel::update(
        riders::table
            .filter(riders::id.eq(rider_id))
            .filter(riders::rider_status_id.eq(lookups.rider_status.id(from))),
    )
    .set(riders::rider_status_id.eq(lookups.rider_status.id(to)))
    .execute(conn)?;
    Ok(updated == 1)
}
