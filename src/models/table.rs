use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Occupancy of a dining table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableStatus {
    #[serde(rename = "libre")]
    Free,
    #[serde(rename = "ocupada")]
    Occupied,
    #[serde(rename = "reservada")]
    Reserved,
    #[serde(rename = "en mantenimiento")]
    Maintenance,
}

impl TableStatus {
    pub const ALL: [TableStatus; 4] = [
        TableStatus::Free,
        TableStatus::Occupied,
        TableStatus::Reserved,
        TableStatus::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Free => "libre",
            TableStatus::Occupied => "ocupada",
            TableStatus::Reserved => "reservada",
            TableStatus::Maintenance => "en mantenimiento",
        }
    }

    /// Status after pressing the toggle: free becomes occupied, anything else
    /// becomes free. Open orders on the table are not considered.
    pub fn toggled(self) -> TableStatus {
        match self {
            TableStatus::Free => TableStatus::Occupied,
            _ => TableStatus::Free,
        }
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| Error::general(format!("unknown table status: {}", s)))
    }
}

/// Drawing shape of a table on the floor plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableShape {
    Circle,
    Square,
    Oval,
    Rectangle,
    Diamond,
}

impl TableShape {
    pub const ALL: [TableShape; 5] = [
        TableShape::Circle,
        TableShape::Square,
        TableShape::Oval,
        TableShape::Rectangle,
        TableShape::Diamond,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableShape::Circle => "circle",
            TableShape::Square => "square",
            TableShape::Oval => "oval",
            TableShape::Rectangle => "rectangle",
            TableShape::Diamond => "diamond",
        }
    }
}

impl FromStr for TableShape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableShape::ALL
            .into_iter()
            .find(|shape| shape.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| Error::general(format!("unknown table shape: {}", s)))
    }
}

/// A row of `tables`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: i64,
    pub name: String,
    pub capacity: i32,
    pub status: TableStatus,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub code: String,
    #[serde(default)]
    pub shape: Option<TableShape>,
    #[serde(default, with = "super::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Table embedded in an order row through `tables(id,name,code)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRef {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// Values submitted by the table form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableForm {
    pub name: String,
    pub capacity: i32,
    pub status: TableStatus,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<TableShape>,
}

impl Default for TableForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            capacity: 1,
            status: TableStatus::Free,
            code: String::new(),
            shape: Some(TableShape::Square),
        }
    }
}

impl From<&DiningTable> for TableForm {
    fn from(table: &DiningTable) -> Self {
        Self {
            name: table.name.clone(),
            capacity: table.capacity,
            status: table.status,
            code: table.code.clone(),
            shape: table.shape,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn toggle_only_flips_between_free_and_occupied() {
        assert_eq!(TableStatus::Free.toggled(), TableStatus::Occupied);
        assert_eq!(TableStatus::Occupied.toggled(), TableStatus::Free);
        assert_eq!(TableStatus::Reserved.toggled(), TableStatus::Free);
        assert_eq!(TableStatus::Maintenance.toggled(), TableStatus::Free);
    }

    #[test]
    fn status_round_trips_through_its_token() {
        for status in TableStatus::ALL {
            assert_eq!(status.as_str().parse::<TableStatus>().unwrap(), status);
        }
        assert!("free".parse::<TableStatus>().is_err());
    }

    #[test]
    fn deserializes_row_with_nulls() {
        let table: DiningTable = serde_json::from_value(json!({
            "id": 4,
            "name": "Terraza 2",
            "capacity": 6,
            "status": "en mantenimiento",
            "code": null,
            "shape": "diamond",
            "created_at": "2024-05-01T12:00:00+00:00"
        }))
        .unwrap();

        assert_eq!(table.status, TableStatus::Maintenance);
        assert_eq!(table.code, "");
        assert_eq!(table.shape, Some(TableShape::Diamond));
        assert!(table.created_at.is_some());
    }
}
