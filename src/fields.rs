//! The extracted-field data model.
//!
//! The schema is fixed: fourteen keys describing the seller, the buyer, the
//! vehicle and the sale. The model is asked for exactly these keys; anything
//! else it returns is ignored when building [`ExtractedFields`].

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Marker the model is told to use for fields it cannot find.
pub const MISSING_MARKER: &str = "missing";

/// One key of the extraction schema (version 2), in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    SellerName,
    SellerAddress,
    BuyerName,
    BuyerAddress,
    VehicleMake,
    VehicleModel,
    VehicleYear,
    VehicleStyle,
    VehicleColor,
    Vin,
    OdometerReading,
    SellerRegistrationNumber,
    SaleDate,
    SalePrice,
}

impl FieldKey {
    /// Every key, in the order the form lists them.
    pub const ALL: [FieldKey; 14] = [
        FieldKey::SellerName,
        FieldKey::SellerAddress,
        FieldKey::BuyerName,
        FieldKey::BuyerAddress,
        FieldKey::VehicleMake,
        FieldKey::VehicleModel,
        FieldKey::VehicleYear,
        FieldKey::VehicleStyle,
        FieldKey::VehicleColor,
        FieldKey::Vin,
        FieldKey::OdometerReading,
        FieldKey::SellerRegistrationNumber,
        FieldKey::SaleDate,
        FieldKey::SalePrice,
    ];

    /// JSON key the model must use.
    pub const fn json_key(self) -> &'static str {
        match self {
            FieldKey::SellerName => "seller_name",
            FieldKey::SellerAddress => "seller_address",
            FieldKey::BuyerName => "buyer_name",
            FieldKey::BuyerAddress => "buyer_address",
            FieldKey::VehicleMake => "vehicle_make",
            FieldKey::VehicleModel => "vehicle_model",
            FieldKey::VehicleYear => "vehicle_year",
            FieldKey::VehicleStyle => "vehicle_style",
            FieldKey::VehicleColor => "vehicle_color",
            FieldKey::Vin => "vin",
            FieldKey::OdometerReading => "odometer_reading",
            FieldKey::SellerRegistrationNumber => "seller_registration_number",
            FieldKey::SaleDate => "sale_date",
            FieldKey::SalePrice => "sale_price",
        }
    }

    /// Label printed on the rendered form.
    pub const fn label(self) -> &'static str {
        match self {
            FieldKey::SellerName => "Seller's Name",
            FieldKey::SellerAddress => "Seller's Address",
            FieldKey::BuyerName => "Buyer's Name",
            FieldKey::BuyerAddress => "Buyer's Address",
            FieldKey::VehicleMake => "Vehicle Make",
            FieldKey::VehicleModel => "Vehicle Model",
            FieldKey::VehicleYear => "Vehicle Year",
            FieldKey::VehicleStyle => "Vehicle Style",
            FieldKey::VehicleColor => "Vehicle Color",
            FieldKey::Vin => "VIN",
            FieldKey::OdometerReading => "Odometer Reading",
            FieldKey::SellerRegistrationNumber => "Seller's Registration Number",
            FieldKey::SaleDate => "Sale Date",
            FieldKey::SalePrice => "Sale Price",
        }
    }

    /// What the model should look for, as listed in the prompt.
    pub const fn description(self) -> &'static str {
        match self {
            FieldKey::SellerName => "Seller's Full Name (dealership or private seller)",
            FieldKey::SellerAddress => "Seller's Address",
            FieldKey::BuyerName => "Buyer's Full Name",
            FieldKey::BuyerAddress => "Buyer's Address",
            FieldKey::VehicleMake => "Vehicle Make",
            FieldKey::VehicleModel => "Vehicle Model",
            FieldKey::VehicleYear => "Vehicle Model Year",
            FieldKey::VehicleStyle => "Vehicle Body Style",
            FieldKey::VehicleColor => "Vehicle Color",
            FieldKey::Vin => "Vehicle Identification Number (VIN)",
            FieldKey::OdometerReading => "Odometer Reading",
            FieldKey::SellerRegistrationNumber => "Seller's Dealer Registration Number",
            FieldKey::SaleDate => "Sale Date",
            FieldKey::SalePrice => "Sale Price",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_key())
    }
}

/// A single extracted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Present(String),
    /// Absent from the reply, or explicitly marked missing by the model.
    Missing,
}

impl FieldValue {
    /// Text shown on the form.
    pub fn as_str(&self) -> &str {
        match self {
            FieldValue::Present(s) => s,
            FieldValue::Missing => MISSING_MARKER,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The fourteen schema fields of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExtractedFields {
    values: BTreeMap<FieldKey, FieldValue>,
}

impl ExtractedFields {
    /// Build from the model's parsed JSON object.
    ///
    /// Unknown keys are dropped. Keys the model omitted, and values equal to
    /// the missing marker, become [`FieldValue::Missing`].
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        let values = FieldKey::ALL
            .iter()
            .map(|&key| {
                let value = match object.get(key.json_key()) {
                    Some(v) => {
                        let s = coerce_to_string(v);
                        if s.trim().eq_ignore_ascii_case(MISSING_MARKER) {
                            FieldValue::Missing
                        } else {
                            FieldValue::Present(s)
                        }
                    }
                    None => FieldValue::Missing,
                };
                (key, value)
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, key: FieldKey) -> &FieldValue {
        self.values.get(&key).unwrap_or(&MISSING)
    }

    pub fn set(&mut self, key: FieldKey, value: impl Into<String>) {
        self.values.insert(key, FieldValue::Present(value.into()));
    }

    /// Discard whatever sale date the model found and use `placeholder`.
    pub fn override_sale_date(&mut self, placeholder: &str) {
        self.set(FieldKey::SaleDate, placeholder);
    }

    /// Fields in form order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &FieldValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// Number of fields carrying a value.
    pub fn present_count(&self) -> usize {
        self.values.values().filter(|v| !v.is_missing()).count()
    }
}

static MISSING: FieldValue = FieldValue::Missing;

/// Render a JSON value the way the form displays it.
///
/// `null` is empty, strings are taken verbatim, anything else keeps its JSON
/// text (`42000`, `true`, `["a"]`).
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
