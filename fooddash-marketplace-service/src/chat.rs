use diesel::PgConnection;

use crate::error::MarketplaceError;
use crate::orders;

/// Whether `user_id` may join the chat room of `order_id`: the customer who
/// placed it, or any rider who has worked it.
pub fn can_access_room(
    conn: &mut PgConnection,
    user_id: i64,
    order_id: i64,
) -> Result<bool, MarketplaceError> {
    let order = orders::find_order(conn, order_id)?;
    if order.user_id == user_id {
        return Ok(true);
    }
    Ok(orders::is_rider_of(conn, user_id, order.id)?)
}
