use chrono::{DateTime, Utc};
use diesel::{prelude::*, PgConnection};
use serde::Serialize;

use crate::error::MarketplaceError;
use crate::lookup::{OrderStatus, PaymentMethod, RiderStatus};
use crate::models::NewOutbox;
use crate::schema;

pub const ORDER_EVENT_CHANNEL: &str = "order.event";
pub const RIDER_EVENT_CHANNEL: &str = "rider.event";
pub const PAYMENT_EVENT_CHANNEL: &str = "payment.event";

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketplaceEvent {
    OrderCreated {
        order_id: i64,
        user_id: i64,
        restaurant_id: i64,
        total: i64,
    },
    OrderStatusChanged {
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
    },
    RiderAvailabilityChanged {
        rider_id: i64,
        status: RiderStatus,
    },
    RiderWorkAssigned {
        rider_id: i64,
        order_id: i64,
        work_at: DateTime<Utc>,
    },
    /// Emitted when a rider finishes a delivery and is released back to ONLINE.
    RiderWorkCompleted {
        rider_id: i64,
        order_id: i64,
        finish_at: DateTime<Utc>,
    },
    PaymentSettled {
        order_id: i64,
        method: PaymentMethod,
        amount: i64,
        paid_at: DateTime<Utc>,
    },
}

impl MarketplaceEvent {
    fn channel(&self) -> &'static str {
        match self {
            MarketplaceEvent::OrderCreated { .. } | MarketplaceEvent::OrderStatusChanged { .. } => {
                ORDER_EVENT_CHANNEL
            }
            MarketplaceEvent::RiderAvailabilityChanged { .. }
            | MarketplaceEvent::RiderWorkAssigned { .. }
            | MarketplaceEvent::RiderWorkCompleted { .. } => RIDER_EVENT_CHANNEL,
            MarketplaceEvent::PaymentSettled { .. } => PAYMENT_EVENT_CHANNEL,
        }
    }

    fn key(&self) -> String {
        match self {
            MarketplaceEvent::OrderCreated { order_id, .. }
            | MarketplaceEvent::OrderStatusChanged { order_id, .. }
            | MarketplaceEvent::PaymentSettled { order_id, .. } => order_id.to_string(),
            MarketplaceEvent::RiderAvailabilityChanged { rider_id, .. }
            | MarketplaceEvent::RiderWorkAssigned { rider_id, .. }
            | MarketplaceEvent::RiderWorkCompleted { rider_id, .. } => rider_id.to_string(),
        }
    }
}

/// Writes events to the outbox on the caller's connection, so they commit or
/// roll back together with the state change that produced them.
pub struct MarketplaceEventPublisher<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> MarketplaceEventPublisher<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }

    pub fn publish(&mut self, event: &MarketplaceEvent) -> Result<(), MarketplaceError> {
        let value = serde_json::to_vec(event)?;
        diesel::insert_into(schema::outbox::table)
            .values(NewOutbox {
                topic: event.channel().to_string(),
                key: event.key(),
                value,
            })
            .execute(self.conn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_route_to_their_channel() {
        let event = MarketplaceEvent::OrderStatusChanged {
            order_id: 7,
            from: OrderStatus::Pending,
            to: OrderStatus::Preparing,
        };
        assert_eq!(event.channel(), ORDER_EVENT_CHANNEL);
        assert_eq!(event.key(), "7");

        let event = MarketplaceEvent::RiderAvailabilityChanged {
            rider_id: 3,
            status: RiderStatus::Online,
        };
        assert_eq!(event.channel(), RIDER_EVENT_CHANNEL);
        assert_eq!(event.key(), "3");
    }

    #[test]
    fn serializes_with_a_type_tag() {
        let event = MarketplaceEvent::OrderStatusChanged {
            order_id: 7,
            from: OrderStatus::Delivering,
            to: OrderStatus::Completed,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "order_status_changed");
        assert_eq!(json["from"], "DELIVERING");
        assert_eq!(json["to"], "COMPLETED");
    }
}
