use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use crate::lookup::OrderStatus;

/// Coarse classification used by the transport layer to pick a status code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Forbidden,
    Infrastructure,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    #[error("order not in {expected} state")]
    OrderStatus { expected: OrderStatus },
    #[error("order already assigned")]
    OrderAlreadyAssigned,
    #[error("rider already has active work")]
    RiderHasActiveWork,
    #[error("cannot go OFFLINE while having active work")]
    CannotGoOfflineWithActiveWork,
    #[error("rider is not online")]
    RiderNotOnline,
    #[error("rider is not assigned")]
    RiderNotAssigned,
    #[error("no active work")]
    NoActiveWork,
    #[error("cart has another restaurant")]
    CartHasAnotherRestaurant,
    #[error("rider application already approved")]
    ApplicationAlreadyApproved,
    #[error("payment already settled")]
    PaymentAlreadySettled,
    #[error("slip already used")]
    SlipAlreadyUsed,
    #[error("order is cancelled")]
    OrderCancelled,
}

#[derive(Error, Debug)]
pub enum MarketplaceError {
    #[error("order must contain at least one item")]
    EmptyItems,
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error("option value {0} selected more than once")]
    DuplicateOptionValue(i64),
    #[error("invalid option value {0}")]
    InvalidOptionValue(i64),
    #[error("menu does not belong to restaurant")]
    MenuNotInRestaurant,
    #[error("price out of range")]
    PriceOutOfRange,

    #[error("restaurant not found")]
    RestaurantNotFound,
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(#[from] Conflict),

    #[error("forbidden")]
    Forbidden,

    #[error("lookup table {table} has no row named {name}")]
    MissingLookup {
        table: &'static str,
        name: &'static str,
    },
    #[error("lookup table {table} has no id {id}")]
    UnknownLookupId { table: &'static str, id: i32 },
    #[error("event serialization failed")]
    Serialization(#[from] serde_json::Error),
    #[error("database error")]
    Database(#[from] DieselError),
}

impl MarketplaceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MarketplaceError::EmptyItems
            | MarketplaceError::InvalidQuantity
            | MarketplaceError::DuplicateOptionValue(_)
            | MarketplaceError::InvalidOptionValue(_)
            | MarketplaceError::MenuNotInRestaurant
            | MarketplaceError::PriceOutOfRange => ErrorKind::Validation,
            MarketplaceError::RestaurantNotFound | MarketplaceError::NotFound(_) => {
                ErrorKind::NotFound
            }
            MarketplaceError::Conflict(_) => ErrorKind::Conflict,
            MarketplaceError::Forbidden => ErrorKind::Forbidden,
            MarketplaceError::MissingLookup { .. }
            | MarketplaceError::UnknownLookupId { .. }
            | MarketplaceError::Serialization(_)
            | MarketplaceError::Database(_) => ErrorKind::Infrastructure,
        }
    }

    /// Maps a unique violation to `conflict`, passing every other error through.
    pub(crate) fn on_unique_violation(err: DieselError, conflict: Conflict) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                MarketplaceError::Conflict(conflict)
            }
            err => MarketplaceError::Database(err),
        }
    }
}
