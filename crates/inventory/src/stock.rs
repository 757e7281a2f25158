use core::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use madmin_core::{DomainError, DomainResult, EntityId};

use crate::distributor::DistributorId;
use crate::request::{NewStockRequest, UpdateStockRequest};
use crate::validation::{
    parse_distributor_id, parse_expiration_date, parse_min_quantity, parse_quantity, validate_name,
};

/// Stock item identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockId(pub EntityId);

impl StockId {
    pub fn generate() -> Self {
        Self(EntityId::new())
    }
}

impl core::fmt::Display for StockId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for StockId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityId::parse_named(s, "StockId").map(Self)
    }
}

/// Stock variant. Serialized (and persisted) as its integer discriminator.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum StockType {
    Medicine,
    Feed,
    Accessory,
}

impl StockType {
    pub const ALL: [StockType; 3] = [StockType::Medicine, StockType::Feed, StockType::Accessory];

    /// Stable integer tag stored in the `type` column.
    pub const fn discriminator(self) -> i64 {
        match self {
            StockType::Medicine => 0,
            StockType::Feed => 1,
            StockType::Accessory => 2,
        }
    }

    pub const fn from_discriminator(value: i64) -> Option<Self> {
        match value {
            0 => Some(StockType::Medicine),
            1 => Some(StockType::Feed),
            2 => Some(StockType::Accessory),
            _ => None,
        }
    }

    /// Medicine and feed carry an expiration date; accessories never do.
    pub const fn is_expirable(self) -> bool {
        match self {
            StockType::Medicine | StockType::Feed => true,
            StockType::Accessory => false,
        }
    }
}

impl TryFrom<i64> for StockType {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_discriminator(value)
            .ok_or_else(|| DomainError::validation(format!("invalid stock type: {value}")))
    }
}

impl From<StockType> for i64 {
    fn from(value: StockType) -> Self {
        value.discriminator()
    }
}

impl core::fmt::Display for StockType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            StockType::Medicine => "MEDICINE",
            StockType::Feed => "FEED",
            StockType::Accessory => "ACCESSORY",
        };
        f.write_str(label)
    }
}

/// Mutable field set shared by every variant.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StockFields {
    name: String,
    quantity: Decimal,
    min_quantity: Decimal,
    expiration_date: Option<DateTime<Utc>>,
    distributor_id: Option<DistributorId>,
}

impl StockFields {
    /// Validate every field of an untrusted request for the given variant.
    ///
    /// Nothing is assigned anywhere until all fields pass.
    fn validate(stock_type: StockType, request: &NewStockRequest) -> DomainResult<Self> {
        let name = validate_name(&request.name)?;
        let quantity = parse_quantity(&request.quantity)?;
        let min_quantity = parse_min_quantity(&request.min_quantity)?;
        let distributor_id = parse_distributor_id(&request.distributor_id)?;

        let expiration_date = if stock_type.is_expirable() {
            let date = parse_expiration_date(&request.expiration_date).map_err(|e| match e {
                DomainError::Validation(msg) => {
                    DomainError::validation(format!("{}: {msg}", stock_type.to_string().to_lowercase()))
                }
                other => other,
            })?;
            Some(date)
        } else {
            if !request.expiration_date.is_empty() {
                return Err(DomainError::validation(
                    "error in creating stock item: expiration date set for an accessory",
                ));
            }
            None
        };

        Ok(Self {
            name,
            quantity,
            min_quantity,
            expiration_date,
            distributor_id,
        })
    }
}

/// One inventory record: a medicine, feed or accessory.
///
/// Modelled as a variant tag plus the shared field set. Values handed out by
/// the store are independent copies; mutating one does not touch storage
/// until it is written back.
#[derive(Debug, Clone)]
pub struct StockItem {
    id: StockId,
    stock_type: StockType,
    fields: StockFields,
}

impl StockItem {
    /// Validate an untrusted request and build a new item with a fresh id.
    pub fn new(request: &NewStockRequest) -> DomainResult<Self> {
        let stock_type = StockType::try_from(request.stock_type)?;
        let fields = StockFields::validate(stock_type, request)?;

        Ok(Self {
            id: StockId::generate(),
            stock_type,
            fields,
        })
    }

    /// Rebuild an item from persisted values.
    ///
    /// Only the variant/expiration invariant is checked; a violation means the
    /// stored row is not something this model ever writes.
    pub fn restore(
        id: StockId,
        stock_type: StockType,
        name: String,
        quantity: Decimal,
        min_quantity: Decimal,
        expiration_date: Option<DateTime<Utc>>,
        distributor_id: Option<DistributorId>,
    ) -> DomainResult<Self> {
        match (stock_type.is_expirable(), expiration_date.is_some()) {
            (true, false) => {
                return Err(DomainError::invariant(format!(
                    "{stock_type} {id} has no expiration date"
                )));
            }
            (false, true) => {
                return Err(DomainError::invariant(format!(
                    "{stock_type} {id} carries an expiration date"
                )));
            }
            _ => {}
        }

        Ok(Self {
            id,
            stock_type,
            fields: StockFields {
                name,
                quantity,
                min_quantity,
                expiration_date,
                distributor_id,
            },
        })
    }

    /// Replace every mutable field from an update request.
    ///
    /// All-or-nothing: on error the item is left exactly as it was.
    pub fn update(&mut self, request: &UpdateStockRequest) -> DomainResult<()> {
        let requested_id = StockId::from_str(&request.id)?;
        if requested_id != self.id {
            return Err(DomainError::validation(format!(
                "id mismatch: item is {}, update targets {requested_id}",
                self.id
            )));
        }

        let requested_type = StockType::try_from(request.stock.stock_type)?;
        if requested_type != self.stock_type {
            return Err(DomainError::validation(format!(
                "stock type cannot change from {} to {requested_type}",
                self.stock_type
            )));
        }

        let fields = StockFields::validate(self.stock_type, &request.stock)?;
        self.fields = fields;
        Ok(())
    }

    pub fn id_typed(&self) -> StockId {
        self.id
    }

    pub fn stock_type(&self) -> StockType {
        self.stock_type
    }

    pub fn name(&self) -> &str {
        &self.fields.name
    }

    pub fn quantity(&self) -> Decimal {
        self.fields.quantity
    }

    pub fn min_quantity(&self) -> Decimal {
        self.fields.min_quantity
    }

    pub fn distributor_id(&self) -> Option<DistributorId> {
        self.fields.distributor_id
    }

    pub fn is_expirable(&self) -> bool {
        self.stock_type.is_expirable()
    }

    /// Expiration date of an expirable item.
    ///
    /// # Panics
    ///
    /// Panics on an accessory. Check [`StockItem::is_expirable`] first, or use
    /// [`StockItem::try_expiration_date`].
    pub fn expiration_date(&self) -> DateTime<Utc> {
        match self.fields.expiration_date {
            Some(date) if self.is_expirable() => date,
            _ => panic!("trying to read an accessory's expiration date; accessories do not expire"),
        }
    }

    /// Expiration date, or `None` for accessories.
    pub fn try_expiration_date(&self) -> Option<DateTime<Utc>> {
        self.fields.expiration_date
    }

    /// # Panics
    ///
    /// Panics on an accessory.
    pub fn set_expiration_date(&mut self, date: DateTime<Utc>) {
        if !self.is_expirable() {
            panic!("trying to set an accessory's expiration date; accessories do not expire");
        }
        self.fields.expiration_date = Some(date);
    }
}

impl PartialEq for StockItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.stock_type == other.stock_type
            && self.fields.name == other.fields.name
            && self.fields.expiration_date == other.fields.expiration_date
            && self.fields.quantity == other.fields.quantity
            && self.fields.min_quantity == other.fields.min_quantity
    }
}

impl Eq for StockItem {}
