//! Payment method selection and settlement.
//!
//! Each order has at most one payment row. Transfers are settled by a slip
//! whose amount has been verified upstream; cash on delivery is settled when
//! the rider completes the work.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::error::{Conflict, MarketplaceError};
use crate::events::{MarketplaceEvent, MarketplaceEventPublisher};
use crate::lookup::{self, Lookups, OrderStatus, PaymentMethod, PaymentStatus};
use crate::models::{Order, Payment, PaymentUpsert};
use crate::orders;
use crate::principal::Principal;
use crate::schema::payments;

/// Slip data as reported by the verification service, never by the client.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSlip {
    pub amount: i64,
    pub trans_ref: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PaymentView {
    pub id: i64,
    pub order_id: i64,
    pub amount: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub slip_reference: Option<String>,
    pub slip_uploaded_at: Option<DateTime<Utc>>,
}

impl PaymentView {
    fn new(payment: Payment, lookups: &Lookups) -> Result<Self, MarketplaceError> {
        Ok(Self {
            id: payment.id,
            order_id: payment.order_id,
            amount: payment.amount,
            method: lookups.payment_method.value(payment.payment_method_id)?,
            status: lookups.payment_status.value(payment.payment_status_id)?,
            paid_at: payment.paid_at,
            slip_reference: payment.slip_reference,
            slip_uploaded_at: payment.slip_uploaded_at,
        })
    }
}

/// Records how the customer intends to pay. Allowed until the payment is
/// settled; switching methods discards any slip attached so far.
pub fn select_method(
    conn: &mut PgConnection,
    principal: &Principal,
    order_id: i64,
    method: PaymentMethod,
) -> Result<PaymentView, MarketplaceError> {
    conn.transaction(|conn| {
        let order = lock_customer_order(conn, principal, order_id)?;
        let lookups = lookup::lookups(conn)?;

        if let Some(existing) = lock_payment(conn, order.id)? {
            if existing.paid_at.is_some() {
                return Err(Conflict::PaymentAlreadySettled.into());
            }
        }

        let payment = upsert(
            conn,
            &PaymentUpsert {
                order_id: order.id,
                amount: 0,
                payment_method_id: lookups.payment_method.id(method),
                payment_status_id: lookups.payment_status.id(PaymentStatus::Pending),
                paid_at: None,
                slip_reference: None,
                slip_uploaded_at: None,
                updated_at: Utc::now(),
            },
        )?;
        tracing::info!(order_id = order.id, method = ?method, "payment method selected");
        PaymentView::new(payment, lookups)
    })
}

/// Attaches a verified transfer slip to the order's payment.
///
/// The payment is settled when the verified amount equals the order total,
/// or unconditionally when `require_amount_match` is off. A slip reference
/// can back only one payment.
pub fn attach_slip(
    conn: &mut PgConnection,
    principal: &Principal,
    order_id: i64,
    slip: &VerifiedSlip,
    require_amount_match: bool,
) -> Result<PaymentView, MarketplaceError> {
    conn.transaction(|conn| {
        let order = lock_customer_order(conn, principal, order_id)?;
        let lookups = lookup::lookups(conn)?;
        let now = Utc::now();

        let previous_paid_at = match lock_payment(conn, order.id)? {
            Some(existing) if existing.paid_at.is_some() => {
                if existing.slip_reference.as_deref() != Some(slip.trans_ref.as_str()) {
                    return Err(Conflict::PaymentAlreadySettled.into());
                }
                existing.paid_at
            }
            _ => None,
        };

        let matches = !require_amount_match || slip.amount == order.total;
        let paid_at = if matches {
            Some(previous_paid_at.unwrap_or(now))
        } else {
            None
        };
        let status = if matches {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Pending
        };

        let payment = upsert(
            conn,
            &PaymentUpsert {
                order_id: order.id,
                amount: slip.amount,
                payment_method_id: lookups.payment_method.id(PaymentMethod::Transfer),
                payment_status_id: lookups.payment_status.id(status),
                paid_at,
                slip_reference: Some(slip.trans_ref.clone()),
                slip_uploaded_at: Some(now),
                updated_at: now,
            },
        )
        .map_err(|e| MarketplaceError::on_unique_violation(e, Conflict::SlipAlreadyUsed))?;

        match paid_at {
            Some(paid_at) if previous_paid_at.is_none() => {
                MarketplaceEventPublisher::new(conn).publish(&MarketplaceEvent::PaymentSettled {
                    order_id: order.id,
                    method: PaymentMethod::Transfer,
                    amount: slip.amount,
                    paid_at,
                })?;
                tracing::info!(order_id = order.id, amount = slip.amount, "transfer settled");
            }
            Some(_) => {}
            None => tracing::warn!(
                order_id = order.id,
                expected = order.total,
                verified = slip.amount,
                "slip amount does not match order total"
            ),
        }
        PaymentView::new(payment, lookups)
    })
}

/// The order's payment, visible to the customer and the restaurant operator.
pub fn get_payment(
    conn: &mut PgConnection,
    principal: &Principal,
    order_id: i64,
) -> Result<PaymentView, MarketplaceError> {
    let order = orders::find_order(conn, order_id)?;
    if order.user_id != principal.user_id {
        catalog::ensure_restaurant_operator(conn, principal, order.restaurant_id)?;
    }
    let payment = payments::table
        .filter(payments::order_id.eq(order.id))
        .select(Payment::as_select())
        .first(conn)
        .optional()?
        .ok_or(MarketplaceError::NotFound("payment"))?;
    let lookups = lookup::lookups(conn)?;
    PaymentView::new(payment, lookups)
}

/// Marks an unpaid cash-on-delivery payment as collected for `amount`.
/// Returns `None` when there is nothing to settle.
pub(crate) fn settle_cash_on_delivery(
    conn: &mut PgConnection,
    order_id: i64,
    amount: i64,
    now: DateTime<Utc>,
) -> Result<Option<Payment>, MarketplaceError> {
    let lookups = lookup::lookups(conn)?;
    let settled = diesel::update(
        payments::table
            .filter(payments::order_id.eq(order_id))
            .filter(payments::payment_method_id.eq(lookups.payment_method.id(PaymentMethod::Cod)))
            .filter(payments::paid_at.is_null()),
    )
    .set((
        payments::payment_status_id.eq(lookups.payment_status.id(PaymentStatus::Paid)),
        payments::paid_at.eq(now),
        payments::amount.eq(amount),
        payments::updated_at.eq(now),
    ))
    .returning(Payment::as_returning())
    .get_result(conn)
    .optional()?;

    if let Some(payment) = &settled {
        MarketplaceEventPublisher::new(conn).publish(&MarketplaceEvent::PaymentSettled {
            order_id,
            method: PaymentMethod::Cod,
            amount: payment.amount,
            paid_at: now,
        })?;
        tracing::info!(order_id, amount, "cash on delivery settled");
    }
    Ok(settled)
}

fn lock_customer_order(
    conn: &mut PgConnection,
    principal: &Principal,
    order_id: i64,
) -> Result<Order, MarketplaceError> {
    let order = orders::find_order_for_update(conn, order_id)?;
    if order.user_id != principal.user_id {
        return Err(MarketplaceError::Forbidden);
    }
    let lookups = lookup::lookups(conn)?;
    if lookups.order_status.value(order.order_status_id)? == OrderStatus::Cancelled {
        return Err(Conflict::OrderCancelled.into());
    }
    Ok(order)
}

fn lock_payment(conn: &mut PgConnection, order_id: i64) -> QueryResult<Option<Payment>> {
    payments::table
        .filter(payments::order_id.eq(order_id))
        .select(Payment::as_select())
        .for_update()
        .first(conn)
        .optional()
}

fn upsert(conn: &mut PgConnection, values: &PaymentUpsert) -> QueryResult<Payment> {
    diesel::insert_into(payments::table)
        .values(values)
        .on_conflict(payments::order_id)
        .do_update()
        .set(values)
        .returning(Payment::as_returning())
        .get_result(conn)
}
