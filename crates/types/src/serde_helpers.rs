//! Serde adapters that carry integer amounts as decimal strings.

/// `u128` wei amounts as base-10 strings.
pub mod wei_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(0);
        }
        trimmed.parse::<u128>().map_err(serde::de::Error::custom)
    }
}

/// `i128` signed wei amounts as base-10 strings.
pub mod signed_wei_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &i128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i128, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        s.trim().parse::<i128>().map_err(serde::de::Error::custom)
    }
}

/// scaled6 values as six-decimal strings (`"10.500000"`).
pub mod points_string {
    use glow_primitives::{format_points_scaled6, parse_points_scaled6};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_points_scaled6(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        parse_points_scaled6(&s).map_err(serde::de::Error::custom)
    }
}

/// Region -> scaled6 points maps with string values.
pub mod region_points {
    use crate::RegionId;
    use glow_primitives::{format_points_scaled6, parse_points_scaled6};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S>(value: &BTreeMap<RegionId, u128>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(value.len()))?;
        for (region, points) in value {
            map.serialize_entry(&region.to_string(), &format_points_scaled6(*points))?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<RegionId, u128>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: BTreeMap<String, String> = Deserialize::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(region, points)| {
                let region = region.parse::<RegionId>().map_err(serde::de::Error::custom)?;
                let points = parse_points_scaled6(&points).map_err(serde::de::Error::custom)?;
                Ok((region, points))
            })
            .collect()
    }
}
