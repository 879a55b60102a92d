//! Star jar domain — placement, persistence, change propagation and the two
//! views (jar and collection) that share one store.
//!
//! Everything here is single-threaded: `Rc`/`RefCell` rather than `Arc`/`Mutex`,
//! matching the one WASM instance per page it runs in.

pub mod bus;
pub mod dex;
pub mod mask;
pub mod sampler;
pub mod store;
pub mod view;

use serde::{Deserialize, Serialize, Serializer};

/// A position in mask-raster coordinates (0..raster_size on both axes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(serialize_with = "whole_as_integer")]
    pub x: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Sampled positions are whole numbers; writing them as `12` rather than
/// `12.0` keeps jars saved by the JS build byte-identical after a round trip.
fn whole_as_integer<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// A star currently in the jar.
///
/// Serialized flat (`{"id","src","x","y","compliment"}`) — the layout already
/// sitting in users' localStorage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveItem {
    pub id: String,
    /// Relative image path, as it was in the catalog at spawn time.
    #[serde(rename = "src")]
    pub image: String,
    #[serde(flatten)]
    pub position: Point,
    pub compliment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_item_uses_flat_layout() {
        let item = ActiveItem {
            id: "star-0".to_string(),
            image: "/stars/pink1.PNG".to_string(),
            position: Point::new(120.0, 88.0),
            compliment: "You are kind".to_string(),
        };
        let json = serde_json::to_string(&item).unwrap();
        assert_eq!(
            json,
            r#"{"id":"star-0","src":"/stars/pink1.PNG","x":120,"y":88,"compliment":"You are kind"}"#
        );
    }

    #[test]
    fn fractional_positions_stay_fractional() {
        let p = Point::new(10.5, 3.0);
        assert_eq!(serde_json::to_string(&p).unwrap(), r#"{"x":10.5,"y":3}"#);
    }

    #[test]
    fn reads_js_written_items() {
        let json = r#"{"id":"star-3","src":"/stars/b.PNG","x":101.73,"y":40,"compliment":"c"}"#;
        let item: ActiveItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.position, Point::new(101.73, 40.0));
        assert_eq!(serde_json::to_string(&item).unwrap(), json);
    }

    #[test]
    fn distance_sq() {
        assert_eq!(Point::new(0.0, 0.0).distance_sq(&Point::new(3.0, 4.0)), 25.0);
    }
}
