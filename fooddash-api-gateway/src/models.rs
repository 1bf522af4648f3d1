use chrono::{DateTime, Utc};
use fooddash_marketplace_service::cart::{CartLine, CartView};
use fooddash_marketplace_service::lookup::{OrderStatus, PaymentMethod, PaymentStatus, RiderStatus};
use fooddash_marketplace_service::models::{CartItemSelection, OrderItemSelection, RiderWork};
use fooddash_marketplace_service::orders::{CreatedOrder, OrderDetail, OrderLine, OrderSummary};
use fooddash_marketplace_service::payments::PaymentView;
use fooddash_marketplace_service::riders::{
    AvailableOrder, CompletedWork, CurrentWork, RiderProfile,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddCartItemRequest {
    /// Restaurant the menu belongs to
    pub restaurant_id: i64,
    pub menu_id: i64,
    /// Quantity, at least 1
    pub qty: i32,
    /// Free-text note for the kitchen
    #[serde(default)]
    pub note: String,
    /// Chosen option values, at most one per value
    #[serde(default)]
    pub option_value_ids: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    /// New quantity; 0 or less removes the item
    pub qty: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SelectionResponse {
    pub option_id: i64,
    pub option_value_id: i64,
    /// Price adjustment of this value, in minor units
    pub price_delta: i64,
}

impl From<CartItemSelection> for SelectionResponse {
    fn from(selection: CartItemSelection) -> Self {
        Self {
            option_id: selection.option_id,
            option_value_id: selection.option_value_id,
            price_delta: selection.price_delta,
        }
    }
}

impl From<OrderItemSelection> for SelectionResponse {
    fn from(selection: OrderItemSelection) -> Self {
        Self {
            option_id: selection.option_id,
            option_value_id: selection.option_value_id,
            price_delta: selection.price_delta,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LineItemResponse {
    pub id: i64,
    pub menu_id: i64,
    pub qty: i32,
    pub note: String,
    /// Menu price plus selected adjustments, at the time the line was priced
    pub unit_price: i64,
    pub total: i64,
    pub selections: Vec<SelectionResponse>,
}

impl From<CartLine> for LineItemResponse {
    fn from(line: CartLine) -> Self {
        Self {
            id: line.item.id,
            menu_id: line.item.menu_id,
            qty: line.item.qty,
            note: line.item.note,
            unit_price: line.item.unit_price,
            total: line.item.total,
            selections: line.selections.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<OrderLine> for LineItemResponse {
    fn from(line: OrderLine) -> Self {
        Self {
            id: line.item.id,
            menu_id: line.item.menu_id,
            qty: line.item.qty,
            note: line.item.note,
            unit_price: line.item.unit_price,
            total: line.item.total,
            selections: line.selections.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    /// Absent until the first item is added
    pub cart_id: Option<i64>,
    /// Restaurant the cart is locked to, absent when empty
    pub restaurant_id: Option<i64>,
    pub items: Vec<LineItemResponse>,
    pub subtotal: i64,
}

impl From<CartView> for CartResponse {
    fn from(cart: CartView) -> Self {
        Self {
            cart_id: cart.cart_id,
            restaurant_id: cart.restaurant_id,
            items: cart.items.into_iter().map(Into::into).collect(),
            subtotal: cart.subtotal,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub menu_id: i64,
    pub qty: i32,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub option_value_ids: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub restaurant_id: i64,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrderResponse {
    pub order_id: i64,
    #[schema(value_type = String, example = "PENDING")]
    pub status: OrderStatus,
    pub subtotal: i64,
    pub discount: i64,
    pub delivery_fee: i64,
    pub total: i64,
}

impl From<CreatedOrder> for CreateOrderResponse {
    fn from(order: CreatedOrder) -> Self {
        Self {
            order_id: order.order_id,
            status: order.status,
            subtotal: order.totals.subtotal,
            discount: order.totals.discount,
            delivery_fee: order.totals.delivery_fee,
            total: order.totals.total,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    /// Customer who placed the order
    pub user_id: i64,
    pub restaurant_id: i64,
    #[schema(value_type = String, example = "PREPARING")]
    pub status: OrderStatus,
    pub subtotal: i64,
    pub discount: i64,
    pub delivery_fee: i64,
    pub total: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderSummary> for OrderResponse {
    fn from(order: OrderSummary) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            restaurant_id: order.restaurant_id,
            status: order.status,
            subtotal: order.subtotal,
            discount: order.discount,
            delivery_fee: order.delivery_fee,
            total: order.total,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetailResponse {
    pub order: OrderResponse,
    pub items: Vec<LineItemResponse>,
}

impl From<OrderDetail> for OrderDetailResponse {
    fn from(detail: OrderDetail) -> Self {
        Self {
            order: detail.summary.into(),
            items: detail.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub orders: Vec<OrderResponse>,
}

impl From<Vec<OrderSummary>> for ListOrdersResponse {
    fn from(orders: Vec<OrderSummary>) -> Self {
        Self {
            orders: orders.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RiderResponse {
    pub id: i64,
    pub user_id: i64,
    #[schema(value_type = String, example = "ONLINE")]
    pub status: RiderStatus,
    pub created_at: DateTime<Utc>,
}

impl From<RiderProfile> for RiderResponse {
    fn from(rider: RiderProfile) -> Self {
        Self {
            id: rider.id,
            user_id: rider.user_id,
            status: rider.status,
            created_at: rider.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateAvailabilityRequest {
    /// true to go ONLINE, false to go OFFLINE
    pub online: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailableOrderResponse {
    pub order_id: i64,
    pub restaurant_id: i64,
    pub restaurant_name: String,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}

impl From<AvailableOrder> for AvailableOrderResponse {
    fn from(order: AvailableOrder) -> Self {
        Self {
            order_id: order.order_id,
            restaurant_id: order.restaurant_id,
            restaurant_name: order.restaurant_name,
            total: order.total,
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListAvailableOrdersResponse {
    pub orders: Vec<AvailableOrderResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RiderWorkResponse {
    pub id: i64,
    pub order_id: i64,
    pub work_at: DateTime<Utc>,
    /// Absent while the work is active
    pub finish_at: Option<DateTime<Utc>>,
}

impl From<RiderWork> for RiderWorkResponse {
    fn from(work: RiderWork) -> Self {
        Self {
            id: work.id,
            order_id: work.order_id,
            work_at: work.work_at,
            finish_at: work.finish_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListRiderWorksResponse {
    pub works: Vec<RiderWorkResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentWorkResponse {
    pub work: RiderWorkResponse,
    pub customer_id: i64,
    pub restaurant_id: i64,
    pub restaurant_name: String,
    #[schema(value_type = String, example = "DELIVERING")]
    pub order_status: OrderStatus,
    pub total: i64,
    /// Absent until the customer picks a method
    #[schema(value_type = Option<String>, example = "COD")]
    pub payment_method: Option<PaymentMethod>,
}

impl From<CurrentWork> for CurrentWorkResponse {
    fn from(current: CurrentWork) -> Self {
        Self {
            work: current.work.into(),
            customer_id: current.customer_id,
            restaurant_id: current.restaurant_id,
            restaurant_name: current.restaurant_name,
            order_status: current.order_status,
            total: current.total,
            payment_method: current.payment_method,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompleteWorkResponse {
    pub work: RiderWorkResponse,
    /// Whether a cash-on-delivery payment was settled by this completion
    pub payment_settled: bool,
}

impl From<CompletedWork> for CompleteWorkResponse {
    fn from(completed: CompletedWork) -> Self {
        Self {
            work: completed.work.into(),
            payment_settled: completed.payment_settled,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SelectPaymentMethodRequest {
    #[schema(value_type = String, example = "TRANSFER")]
    pub method: PaymentMethod,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadSlipRequest {
    /// QR payload read from the transfer slip
    pub qr_payload: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i64,
    pub order_id: i64,
    /// Settled or verified amount, in minor units
    pub amount: i64,
    #[schema(value_type = String, example = "TRANSFER")]
    pub method: PaymentMethod,
    #[schema(value_type = String, example = "PAID")]
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    /// Bank transaction reference of the attached slip
    pub slip_reference: Option<String>,
    pub slip_uploaded_at: Option<DateTime<Utc>>,
}

impl From<PaymentView> for PaymentResponse {
    fn from(payment: PaymentView) -> Self {
        Self {
            id: payment.id,
            order_id: payment.order_id,
            amount: payment.amount,
            method: payment.method,
            status: payment.status,
            paid_at: payment.paid_at,
            slip_reference: payment.slip_reference,
            slip_uploaded_at: payment.slip_uploaded_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatAccessResponse {
    pub order_id: i64,
    pub allowed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Error message
    pub error: String,
}
