//! Status and payment-method identities.
//!
//! The database stores statuses as rows of small lookup tables. Their ids are
//! resolved by name once per process and cached behind a [`OnceLock`], so the
//! rest of the crate only ever deals in the typed enums below.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::OnceLock;

use diesel::prelude::*;
use diesel::PgConnection;
use serde::{Deserialize, Serialize};

use crate::error::MarketplaceError;
use crate::schema;

/// A closed set of values backed by a lookup table keyed by `name`.
pub trait LookupName: Copy + Eq + Hash + fmt::Debug + 'static {
    const TABLE: &'static str;
    const ALL: &'static [Self];

    fn name(self) -> &'static str;
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Delivering,
    Completed,
    Cancelled,
}

impl LookupName for OrderStatus {
    const TABLE: &'static str = "order_statuses";
    const ALL: &'static [Self] = &[
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Delivering,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    fn name(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Delivering => "DELIVERING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name().to_lowercase())
    }
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiderStatus {
    Offline,
    Online,
    Assigned,
}

impl LookupName for RiderStatus {
    const TABLE: &'static str = "rider_statuses";
    const ALL: &'static [Self] = &[
        RiderStatus::Offline,
        RiderStatus::Online,
        RiderStatus::Assigned,
    ];

    fn name(self) -> &'static str {
        match self {
            RiderStatus::Offline => "OFFLINE",
            RiderStatus::Online => "ONLINE",
            RiderStatus::Assigned => "ASSIGNED",
        }
    }
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl LookupName for PaymentStatus {
    const TABLE: &'static str = "payment_statuses";
    const ALL: &'static [Self] = &[PaymentStatus::Pending, PaymentStatus::Paid];

    fn name(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
        }
    }
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash on delivery, settled when the rider completes the work.
    Cod,
    /// Bank transfer, settled by a verified slip.
    Transfer,
}

impl LookupName for PaymentMethod {
    const TABLE: &'static str = "payment_methods";
    const ALL: &'static [Self] = &[PaymentMethod::Cod, PaymentMethod::Transfer];

    fn name(self) -> &'static str {
        match self {
            PaymentMethod::Cod => "COD",
            PaymentMethod::Transfer => "TRANSFER",
        }
    }
}

/// Bidirectional id mapping for one lookup table.
#[derive(Debug)]
pub struct LookupTable<T: LookupName> {
    ids: HashMap<T, i32>,
    values: HashMap<i32, T>,
}

impl<T: LookupName> LookupTable<T> {
    /// Builds the mapping from `(id, name)` rows. Every variant must be present.
    pub fn from_rows(rows: Vec<(i32, String)>) -> Result<Self, MarketplaceError> {
        let by_name = rows
            .into_iter()
            .map(|(id, name)| (name, id))
            .collect::<HashMap<_, _>>();

        let mut ids = HashMap::new();
        let mut values = HashMap::new();
        for value in T::ALL {
            let id = *by_name
                .get(value.name())
                .ok_or(MarketplaceError::MissingLookup {
                    table: T::TABLE,
                    name: value.name(),
                })?;
            ids.insert(*value, id);
            values.insert(id, *value);
        }
        Ok(Self { ids, values })
    }

    pub fn id(&self, value: T) -> i32 {
        self.ids[&value]
    }

    pub fn value(&self, id: i32) -> Result<T, MarketplaceError> {
        self.values
            .get(&id)
            .copied()
            .ok_or(MarketplaceError::UnknownLookupId { table: T::TABLE, id })
    }
}

#[derive(Debug)]
pub struct Lookups {
    pub order_status: LookupTable<OrderStatus>,
    pub rider_status: LookupTable<RiderStatus>,
    pub payment_status: LookupTable<PaymentStatus>,
    pub payment_method: LookupTable<PaymentMethod>,
}

impl Lookups {
    pub fn load(conn: &mut PgConnection) -> Result<Self, MarketplaceError> {
        let order_status = schema::order_statuses::table
            .select((schema::order_statuses::id, schema::order_statuses::name))
            .load::<(i32, String)>(conn)?;
        let rider_status = schema::rider_statuses::table
            .select((schema::rider_statuses::id, schema::rider_statuses::name))
            .load::<(i32, String)>(conn)?;
        let payment_status = schema::payment_statuses::table
            .select((schema::payment_statuses::id, schema::payment_statuses::name))
            .load::<(i32, String)>(conn)?;
        let payment_method = schema::payment_methods::table
            .select((schema::payment_methods::id, schema::payment_methods::name))
            .load::<(i32, String)>(conn)?;

        Ok(Self {
            order_status: LookupTable::from_rows(order_status)?,
            rider_status: LookupTable::from_rows(rider_status)?,
            payment_status: LookupTable::from_rows(payment_status)?,
            payment_method: LookupTable::from_rows(payment_method)?,
        })
    }
}

static LOOKUPS: OnceLock<Lookups> = OnceLock::new();

/// Returns the process-wide lookup cache, loading it on first use.
///
/// Concurrent first callers may each read the tables, but only one result is
/// ever installed and every caller observes that one.
pub fn lookups(conn: &mut PgConnection) -> Result<&'static Lookups, MarketplaceError> {
    if let Some(lookups) = LOOKUPS.get() {
        return Ok(lookups);
    }
    let loaded = Lookups::load(conn)?;
    tracing::debug!("lookup tables loaded");
    Ok(LOOKUPS.get_or_init(|| loaded))
}
