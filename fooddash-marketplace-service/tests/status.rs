mod common;

use common::{customer, order_in, order_status, outbox_types, seed_catalog, test_connection};
use fooddash_marketplace_service::events::ORDER_EVENT_CHANNEL;
use fooddash_marketplace_service::lookup::OrderStatus;
use fooddash_marketplace_service::orders::status;
use fooddash_marketplace_service::{Conflict, MarketplaceError, Principal, Role};

#[test]
fn test_operator_walks_order_to_completion() {
    let Some(mut conn) = test_connection() else { return };
    let catalog = seed_catalog(&mut conn);
    let order_id = order_in(&mut conn, &catalog, &customer(), OrderStatus::Pending);

    let order = status::accept(&mut conn, &catalog.owner, order_id).unwrap();
    assert_eq!(order.id, order_id);
    assert_eq!(order_status(&mut conn, order_id), OrderStatus::Preparing);

    status::hand_off(&mut conn, &catalog.owner, order_id).unwrap();
    assert_eq!(order_status(&mut conn, order_id), OrderStatus::Delivering);

    status::complete(&mut conn, &catalog.owner, order_id).unwrap();
    assert_eq!(order_status(&mut conn, order_id), OrderStatus::Completed);

    assert_eq!(
        outbox_types(&mut conn, ORDER_EVENT_CHANNEL, &order_id.to_string()),
        vec![
            "order_created",
            "order_status_changed",
            "order_status_changed",
            "order_status_changed"
        ]
    );
}

#[test]
fn test_cancel_only_from_pending() {
    let Some(mut conn) = test_connection() else { return };
    let catalog = seed_catalog(&mut conn);
    let order_id = order_in(&mut conn, &catalog, &customer(), OrderStatus::Preparing);

    let err = status::cancel(&mut conn, &catalog.owner, order_id).unwrap_err();
    assert!(matches!(
        err,
        MarketplaceError::Conflict(Conflict::OrderStatus {
            expected: OrderStatus::Pending
        })
    ));
    assert_eq!(order_status(&mut conn, order_id), OrderStatus::Preparing);

    let pending = order_in(&mut conn, &catalog, &customer(), OrderStatus::Pending);
    status::cancel(&mut conn, &catalog.owner, pending).unwrap();
    assert_eq!(order_status(&mut conn, pending), OrderStatus::Cancelled);
}

#[test]
fn test_accepting_twice_conflicts() {
    let Some(mut conn) = test_connection() else { return };
    let catalog = seed_catalog(&mut conn);
    let order_id = order_in(&mut conn, &catalog, &customer(), OrderStatus::Pending);

    status::accept(&mut conn, &catalog.owner, order_id).unwrap();
    let err = status::accept(&mut conn, &catalog.owner, order_id).unwrap_err();
    assert_eq!(err.to_string(), "order not in pending state");
}

#[test]
fn test_terminal_states_are_final() {
    let Some(mut conn) = test_connection() else { return };
    let catalog = seed_catalog(&mut conn);
    let cancelled = order_in(&mut conn, &catalog, &customer(), OrderStatus::Cancelled);
    let completed = order_in(&mut conn, &catalog, &customer(), OrderStatus::Completed);

    assert!(status::accept(&mut conn, &catalog.owner, cancelled).is_err());
    assert!(status::hand_off(&mut conn, &catalog.owner, cancelled).is_err());
    assert!(status::complete(&mut conn, &catalog.owner, completed).is_err());
    assert_eq!(order_status(&mut conn, cancelled), OrderStatus::Cancelled);
    assert_eq!(order_status(&mut conn, completed), OrderStatus::Completed);
}

#[test]
fn test_only_the_operator_may_transition() {
    let Some(mut conn) = test_connection() else { return };
    let catalog = seed_catalog(&mut conn);
    let user = customer();
    let order_id = order_in(&mut conn, &catalog, &user, OrderStatus::Pending);

    let other_owner = Principal::new(common::next_user_id(), Role::Owner);
    assert!(matches!(
        status::accept(&mut conn, &other_owner, order_id),
        Err(MarketplaceError::Forbidden)
    ));
    assert!(matches!(
        status::cancel(&mut conn, &user, order_id),
        Err(MarketplaceError::Forbidden)
    ));
    assert_eq!(order_status(&mut conn, order_id), OrderStatus::Pending);
}
