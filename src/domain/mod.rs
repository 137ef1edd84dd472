//! Domain types shared by the services and the HTTP layer.
//!
//! Identifiers use the newtype pattern so image ids and user ids cannot be
//! mixed up at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a stored image.
///
/// # Examples
///
/// ```rust
/// use annodesk::domain::ImageId;
///
/// let id = ImageId::new(42);
/// assert_eq!(id.value(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ImageId(i32);

impl ImageId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ImageId> for i32 {
    fn from(id: ImageId) -> Self {
        id.0
    }
}

impl From<i32> for ImageId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl FromStr for ImageId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i32>().map(Self)
    }
}

impl Serialize for ImageId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

/// Accepts both `7` and `"7"`; browser annotation widgets send either.
impl<'de> Deserialize<'de> for ImageId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Account role. Administrators upload batches and export results;
/// annotators only work their own queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Annotator,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Annotator => "annotator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "annotator" => Ok(Self::Annotator),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The authenticated identity performing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: i32,
    pub name: String,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this actor may write annotations or labels for an image
    /// assigned to `assignee`.
    #[must_use]
    pub fn may_edit(&self, assignee: &str) -> bool {
        self.is_admin() || self.name == assignee
    }
}

/// Axis-aligned rectangle in absolute pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Media-fragment selector form, e.g. `xywh=pixel:10,10,50,20`.
    #[must_use]
    pub fn to_selector(&self) -> String {
        format!("xywh=pixel:{},{},{},{}", self.x, self.y, self.w, self.h)
    }
}

/// Normalizes a display name the way assignments are stored.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_id_accepts_number_or_string() {
        let a: ImageId = serde_json::from_str("7").unwrap();
        let b: ImageId = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<ImageId>("\"seven\"").is_err());
    }

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::Annotator.as_str(), "annotator");
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn actor_edit_permissions() {
        let alice = Actor {
            id: 2,
            name: "ALICE".to_string(),
            role: Role::Annotator,
        };
        let admin = Actor {
            id: 1,
            name: "BOSS".to_string(),
            role: Role::Admin,
        };

        assert!(alice.may_edit("ALICE"));
        assert!(!alice.may_edit("BOB"));
        assert!(admin.may_edit("BOB"));
    }

    #[test]
    fn rect_selector_format() {
        let rect = Rect::new(10.0, 10.0, 50.0, 20.0);
        assert_eq!(rect.to_selector(), "xywh=pixel:10,10,50,20");
        assert_eq!(normalize_name("  alice "), "ALICE");
    }
}
