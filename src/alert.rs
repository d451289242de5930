//! Disaster alerts, geofencing, and emergency check-ins.
//!
//! Alerts are broadcast rows with an optional epicenter and radius; the
//! feed shows an alert when the user is inside the radius, or always when
//! either side lacks a location fix. Distance uses the haversine formula —
//! arithmetic, not engineering. Users respond to an alert with a check-in
//! ("safe" or "need help") carrying their position.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::progress::UserId;
use crate::scenario::DisasterType;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Geofence radius applied when an alert declares none.
pub const DEFAULT_ALERT_RADIUS_KM: f64 = 10.0;

/// A WGS84 coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lon: f64,
}

impl GeoPoint {
    /// Creates a point from degrees.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Great-circle distance between two points in kilometers (haversine).
#[must_use]
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Alert severity, ordered from least to most urgent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// General awareness, no action needed.
    Advisory,
    /// Conditions are favorable for the hazard.
    Watch,
    /// The hazard is occurring or imminent.
    Warning,
    /// Life-threatening; act immediately.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Advisory => write!(f, "advisory"),
            Self::Watch => write!(f, "watch"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Globally unique alert identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(Uuid);

impl AlertId {
    /// Creates a new random alert ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One broadcast disaster alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Identifier.
    pub id: AlertId,
    /// Headline.
    pub title: String,
    /// Situation description and instructions.
    pub description: String,
    /// Hazard category.
    pub disaster_type: DisasterType,
    /// Urgency.
    pub severity: Severity,
    /// Human-readable affected area ("Ward 4, Riverside").
    pub location_name: String,
    /// Epicenter, when known.
    pub epicenter: Option<GeoPoint>,
    /// Geofence radius in km; [`DEFAULT_ALERT_RADIUS_KM`] applies when
    /// absent.
    pub radius_km: Option<f64>,
    /// False once the alert is withdrawn.
    pub is_active: bool,
    /// When the alert was issued.
    pub issued_at: DateTime<Utc>,
    /// Automatic expiry, if any.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// True once `expires_at` has passed.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Whether the alert applies at the user's position.
    ///
    /// Alerts without an epicenter, and users without a location fix, are
    /// always relevant — missing data must never hide a warning.
    #[must_use]
    pub fn is_relevant(&self, user: Option<GeoPoint>) -> bool {
        let (Some(user), Some(center)) = (user, self.epicenter) else {
            return true;
        };
        distance_km(user, center) <= self.radius_km.unwrap_or(DEFAULT_ALERT_RADIUS_KM)
    }
}

/// Filters a feed down to active, unexpired alerts relevant at `user`.
#[must_use]
pub fn relevant_alerts<'a>(
    alerts: &'a [Alert],
    user: Option<GeoPoint>,
    now: DateTime<Utc>,
) -> Vec<&'a Alert> {
    alerts
        .iter()
        .filter(|a| a.is_active && !a.is_expired(now) && a.is_relevant(user))
        .collect()
}

/// How a user answered an alert's check-in prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInStatus {
    /// The user reported being safe.
    Safe,
    /// The user asked for help.
    NeedHelp,
}

/// One emergency check-in against an alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    /// Reporting user.
    pub user_id: UserId,
    /// Alert being answered.
    pub alert_id: AlertId,
    /// Safe or needs help.
    pub status: CheckInStatus,
    /// Position at check-in time, when available.
    pub location: Option<GeoPoint>,
    /// When the check-in was made.
    pub reported_at: DateTime<Utc>,
}

impl CheckIn {
    /// Creates a check-in stamped with the current time.
    #[must_use]
    pub fn new(
        user_id: UserId,
        alert_id: AlertId,
        status: CheckInStatus,
        location: Option<GeoPoint>,
    ) -> Self {
        Self {
            user_id,
            alert_id,
            status,
            location,
            reported_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn alert(epicenter: Option<GeoPoint>, radius_km: Option<f64>) -> Alert {
        Alert {
            id: AlertId::new(),
            title: "Flood warning".to_string(),
            description: "River rising".to_string(),
            disaster_type: DisasterType::Flood,
            severity: Severity::Warning,
            location_name: "Riverside".to_string(),
            epicenter,
            radius_km,
            is_active: true,
            issued_at: Utc::now(),
            expires_at: None,
        }
    }

    // New Delhi and Agra, roughly 180 km apart.
    const DELHI: GeoPoint = GeoPoint::new(28.6139, 77.2090);
    const AGRA: GeoPoint = GeoPoint::new(27.1767, 78.0081);

    #[test]
    fn test_haversine_known_distance() {
        let d = distance_km(DELHI, AGRA);
        assert!((170.0..190.0).contains(&d), "got {d}");
    }

    #[test]
    fn test_haversine_zero_distance() {
        assert!(distance_km(DELHI, DELHI) < 1e-9);
    }

    #[test]
    fn test_relevance_inside_and_outside_radius() {
        let a = alert(Some(DELHI), Some(50.0));
        let nearby = GeoPoint::new(28.7, 77.1);
        assert!(a.is_relevant(Some(nearby)));
        assert!(!a.is_relevant(Some(AGRA)));
    }

    #[test]
    fn test_default_radius_applies() {
        let a = alert(Some(DELHI), None);
        // ~1 km away: inside the 10 km default.
        assert!(a.is_relevant(Some(GeoPoint::new(28.62, 77.21))));
        assert!(!a.is_relevant(Some(AGRA)));
    }

    #[test]
    fn test_missing_location_is_always_relevant() {
        assert!(alert(Some(DELHI), Some(1.0)).is_relevant(None));
        assert!(alert(None, None).is_relevant(Some(AGRA)));
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let mut a = alert(None, None);
        assert!(!a.is_expired(now));
        a.expires_at = Some(now - Duration::minutes(1));
        assert!(a.is_expired(now));
    }

    #[test]
    fn test_relevant_alerts_filters_feed() {
        let now = Utc::now();
        let mut expired = alert(None, None);
        expired.expires_at = Some(now - Duration::hours(1));
        let mut withdrawn = alert(None, None);
        withdrawn.is_active = false;
        let far = alert(Some(AGRA), Some(5.0));
        let near = alert(Some(DELHI), Some(50.0));

        let feed = vec![expired, withdrawn, far, near.clone()];
        let shown = relevant_alerts(&feed, Some(DELHI), now);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].id, near.id);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Watch > Severity::Advisory);
        assert_eq!(format!("{}", Severity::Critical), "critical");
    }

    #[test]
    fn test_check_in_serde_round_trip() {
        let check_in = CheckIn::new(
            UserId::new(),
            AlertId::new(),
            CheckInStatus::NeedHelp,
            Some(DELHI),
        );
        let json = serde_json::to_string(&check_in).unwrap();
        assert!(json.contains("need_help"));
        let back: CheckIn = serde_json::from_str(&json).unwrap();
        assert_eq!(check_in, back);
    }
}
