//! Administrative region lookup for Indian states and union territories.
//!
//! The table is a `static` slice: built at compile time, never mutated, safe to
//! share across threads without locking.
//!
//! Several boxes overlap (Delhi sits inside Haryana, Ladakh inside Jammu and
//! Kashmir, ...). Lookup is first-match in table order, so the order below is
//! part of the behaviour and must not be re-sorted.

use serde::Serialize;

use crate::coords::Coordinate;

/// Elevation baseline used when a region has no entry of its own.
pub const DEFAULT_ELEVATION_M: f64 = 500.0;

/// A named region with its bounding box and optional elevation baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Region {
    pub name: &'static str,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
    /// Typical terrain elevation in metres, used only by feature synthesis.
    pub elevation_m: Option<f64>,
}

impl Region {
    const fn new(
        name: &'static str,
        lat: (f64, f64),
        lng: (f64, f64),
        elevation_m: Option<f64>,
    ) -> Self {
        Self {
            name,
            lat_min: lat.0,
            lat_max: lat.1,
            lng_min: lng.0,
            lng_max: lng.1,
            elevation_m,
        }
    }

    /// Inclusive bounding-box containment.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        self.lat_min <= lat && lat <= self.lat_max && self.lng_min <= lng && lng <= self.lng_max
    }

    pub fn centroid(&self) -> Coordinate {
        Coordinate::new(
            (self.lat_min + self.lat_max) / 2.0,
            (self.lng_min + self.lng_max) / 2.0,
        )
    }

    /// Euclidean distance in degree space from the box centroid.
    fn centroid_distance(&self, lat: f64, lng: f64) -> f64 {
        let c = self.centroid();
        ((lat - c.latitude).powi(2) + (lng - c.longitude).powi(2)).sqrt()
    }
}

pub const REGIONS: &[Region] = &[
    Region::new("Uttarakhand", (28.7, 31.3), (77.5, 81.5), Some(2000.0)),
    Region::new("Himachal Pradesh", (30.0, 33.0), (75.5, 79.5), Some(2500.0)),
    Region::new("Punjab", (29.5, 32.5), (73.5, 76.5), Some(250.0)),
    Region::new("Haryana", (27.5, 30.5), (74.5, 77.5), Some(220.0)),
    Region::new("Delhi", (28.4, 28.9), (76.8, 77.3), Some(200.0)),
    Region::new("Uttar Pradesh", (23.8, 30.4), (77.0, 84.6), Some(200.0)),
    Region::new("Rajasthan", (23.0, 30.2), (69.5, 78.3), Some(300.0)),
    Region::new("Madhya Pradesh", (21.1, 26.9), (74.0, 82.8), Some(450.0)),
    Region::new("Maharashtra", (15.6, 22.0), (72.6, 80.9), Some(400.0)),
    Region::new("Gujarat", (20.1, 24.7), (68.2, 74.5), Some(150.0)),
    Region::new("Odisha", (17.8, 22.6), (81.3, 87.5), Some(200.0)),
    Region::new("Chhattisgarh", (17.8, 24.1), (80.2, 84.4), Some(350.0)),
    Region::new("Jharkhand", (21.9, 25.3), (83.3, 87.6), Some(300.0)),
    Region::new("West Bengal", (21.5, 27.2), (85.8, 89.9), Some(100.0)),
    Region::new("Bihar", (24.2, 27.5), (83.3, 88.2), Some(150.0)),
    Region::new("Assam", (24.1, 28.2), (89.7, 96.0), Some(100.0)),
    Region::new("Meghalaya", (25.0, 26.1), (89.9, 92.8), None),
    Region::new("Tripura", (22.9, 24.5), (91.0, 92.7), None),
    Region::new("Manipur", (23.8, 25.7), (93.0, 94.8), None),
    Region::new("Mizoram", (21.9, 24.5), (92.2, 93.4), None),
    Region::new("Nagaland", (25.2, 27.0), (93.2, 95.8), None),
    Region::new("Arunachal Pradesh", (26.6, 29.5), (91.2, 97.4), Some(1500.0)),
    Region::new("Sikkim", (27.0, 28.1), (88.0, 88.9), Some(2000.0)),
    Region::new("Jammu and Kashmir", (32.2, 37.1), (73.2, 80.3), Some(3000.0)),
    Region::new("Ladakh", (32.2, 37.1), (75.9, 79.9), Some(3500.0)),
    Region::new("Goa", (15.0, 15.8), (73.7, 74.3), Some(50.0)),
    Region::new("Kerala", (8.2, 12.8), (74.9, 77.4), Some(300.0)),
    Region::new("Tamil Nadu", (8.1, 13.6), (76.2, 80.3), Some(200.0)),
    Region::new("Karnataka", (11.5, 18.5), (74.0, 78.6), Some(600.0)),
    Region::new("Andhra Pradesh", (12.6, 19.9), (77.0, 84.8), Some(300.0)),
    Region::new("Telangana", (16.0, 19.9), (77.2, 81.8), Some(400.0)),
];

/// Name reported when a table has no regions at all.
pub const UNKNOWN_REGION: &str = "Unknown";

/// Maps coordinates to region names over an immutable table.
#[derive(Debug, Clone, Copy)]
pub struct RegionResolver {
    table: &'static [Region],
}

impl Default for RegionResolver {
    fn default() -> Self {
        Self { table: REGIONS }
    }
}

impl RegionResolver {
    pub fn new(table: &'static [Region]) -> Self {
        Self { table }
    }

    pub fn regions(&self) -> &'static [Region] {
        self.table
    }

    /// Resolve a point to a region name. Total: falls back to the nearest
    /// box centroid when no box contains the point.
    pub fn resolve(&self, lat: f64, lng: f64) -> &'static str {
        self.resolve_region(lat, lng)
            .map(|r| r.name)
            .unwrap_or(UNKNOWN_REGION)
    }

    /// Same as [`resolve`](Self::resolve) but returns the table entry.
    /// `None` only for an empty table.
    pub fn resolve_region(&self, lat: f64, lng: f64) -> Option<&'static Region> {
        if let Some(hit) = self.table.iter().find(|r| r.contains(lat, lng)) {
            return Some(hit);
        }

        // Strict `<` keeps the earliest entry on equal distances.
        let mut best: Option<(&'static Region, f64)> = None;
        for region in self.table {
            let d = region.centroid_distance(lat, lng);
            match best {
                Some((_, best_d)) if !(d < best_d) => {}
                _ => best = Some((region, d)),
            }
        }
        best.map(|(r, _)| r)
    }

    /// Elevation baseline for a region name; 500 m when unknown or unset.
    pub fn elevation_baseline(&self, name: &str) -> f64 {
        self.table
            .iter()
            .find(|r| r.name == name)
            .and_then(|r| r.elevation_m)
            .unwrap_or(DEFAULT_ELEVATION_M)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_31_regions_with_unique_names() {
        assert_eq!(REGIONS.len(), 31);
        let mut names: Vec<&str> = REGIONS.iter().map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 31);
    }

    /// New Delhi lies in both the Haryana and Delhi boxes; Haryana comes first.
    #[test]
    fn first_match_wins_on_overlap() {
        let r = RegionResolver::default();
        assert!(REGIONS.iter().find(|x| x.name == "Delhi").unwrap().contains(28.6139, 77.2090));
        assert_eq!(r.resolve(28.6139, 77.2090), "Haryana");
    }

    /// Ladakh's box is entirely inside Jammu and Kashmir's, so it is never
    /// returned by containment.
    #[test]
    fn shadowed_region_resolves_to_earlier_entry() {
        let r = RegionResolver::default();
        assert_eq!(r.resolve(34.15, 77.58), "Jammu and Kashmir");
    }

    #[test]
    fn contained_point_resolves_to_its_box() {
        let r = RegionResolver::default();
        assert_eq!(r.resolve(10.0, 76.5), "Kerala");
        assert_eq!(r.resolve(15.4, 74.0), "Goa");
    }

    #[test]
    fn outside_all_boxes_uses_nearest_centroid() {
        let r = RegionResolver::default();
        // Bay of Bengal: outside every box, closest to the Odisha centroid.
        let name = r.resolve(19.0, 89.0);
        let expected = REGIONS
            .iter()
            .min_by(|a, b| {
                a.centroid_distance(19.0, 89.0)
                    .partial_cmp(&b.centroid_distance(19.0, 89.0))
                    .unwrap()
            })
            .unwrap()
            .name;
        assert!(REGIONS.iter().all(|x| !x.contains(19.0, 89.0)));
        assert_eq!(name, expected);
    }

    #[test]
    fn centroid_ties_break_by_table_order() {
        static TIED: &[Region] = &[
            Region::new("First", (0.0, 2.0), (0.0, 2.0), None),
            Region::new("Second", (0.0, 2.0), (4.0, 6.0), None),
        ];
        // Equidistant from both centroids (1,1) and (1,5).
        let r = RegionResolver::new(TIED);
        assert_eq!(r.resolve(1.0, 3.0), "First");
    }

    #[test]
    fn resolution_is_total_over_the_globe() {
        let r = RegionResolver::default();
        for lat in (-90..=90).step_by(15) {
            for lng in (-180..=180).step_by(30) {
                assert!(!r.resolve(lat as f64, lng as f64).is_empty());
            }
        }
    }

    #[test]
    fn empty_table_reports_unknown() {
        let r = RegionResolver::new(&[]);
        assert_eq!(r.resolve(10.0, 10.0), UNKNOWN_REGION);
    }

    #[test]
    fn elevation_baseline_defaults_to_500() {
        let r = RegionResolver::default();
        assert_eq!(r.elevation_baseline("Ladakh"), 3500.0);
        assert_eq!(r.elevation_baseline("Meghalaya"), DEFAULT_ELEVATION_M);
        assert_eq!(r.elevation_baseline("Atlantis"), DEFAULT_ELEVATION_M);
    }
}
