//! Field work: design/fitting tasks and location check-ins.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Owned, Record, lenient};
use crate::types::{CheckInId, HoardingId, TaskId, UserId};

/// What a task asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Artwork for a campaign.
    Design,
    /// Mounting flex on a hoarding.
    Fitting,
    /// Site inspection.
    Inspection,
}

/// A design or fitting task assigned to a staff member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Task {
    #[serde(deserialize_with = "lenient::value")]
    pub id: Option<TaskId>,
    #[serde(deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(rename = "type", deserialize_with = "lenient::text")]
    pub kind: Option<String>,
    #[serde(deserialize_with = "lenient::value")]
    pub hoarding_id: Option<HoardingId>,
    #[serde(deserialize_with = "lenient::value")]
    pub assigned_to: Option<UserId>,
    #[serde(deserialize_with = "lenient::text")]
    pub assigned_to_name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub due_date: Option<String>,
    #[serde(deserialize_with = "lenient::value")]
    pub created_by: Option<UserId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Task {
    const COLLECTION_KEY: &'static str = "tasks";
    const RECORD_KEY: &'static str = "task";
    const ALIASES: &'static [(&'static str, &'static str)] = &[("hoarding", "hoardingId")];
}

impl Owned for Task {
    fn owners(&self) -> Vec<&UserId> {
        self.assigned_to.iter().chain(&self.created_by).collect()
    }
}

impl Task {
    #[must_use]
    pub fn parsed_kind(&self) -> Option<TaskKind> {
        match self.kind.as_deref()?.trim().to_ascii_lowercase().as_str() {
            "design" => Some(TaskKind::Design),
            "fitting" | "mounting" => Some(TaskKind::Fitting),
            "inspection" => Some(TaskKind::Inspection),
            _ => None,
        }
    }

    #[must_use]
    pub fn assignee_label(&self) -> &str {
        self.assigned_to_name.as_deref().unwrap_or("Unassigned")
    }
}

/// A location check-in recorded by a field user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckIn {
    #[serde(deserialize_with = "lenient::value")]
    pub id: Option<CheckInId>,
    #[serde(deserialize_with = "lenient::value")]
    pub user_id: Option<UserId>,
    #[serde(deserialize_with = "lenient::text")]
    pub user_name: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub longitude: Option<f64>,
    #[serde(deserialize_with = "lenient::value")]
    pub hoarding_id: Option<HoardingId>,
    #[serde(deserialize_with = "lenient::text")]
    pub note: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for CheckIn {
    const COLLECTION_KEY: &'static str = "checkins";
    const RECORD_KEY: &'static str = "checkin";
    const ALIASES: &'static [(&'static str, &'static str)] = &[
        ("user", "userId"),
        ("lat", "latitude"),
        ("lng", "longitude"),
        ("hoarding", "hoardingId"),
        ("timestamp", "createdAt"),
    ];
}

impl Owned for CheckIn {
    fn owners(&self) -> Vec<&UserId> {
        self.user_id.iter().collect()
    }
}

impl CheckIn {
    /// `lat, lng` with six decimals, or `N/A`.
    #[must_use]
    pub fn coordinates_label(&self) -> String {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => format!("{lat:.6}, {lng:.6}"),
            _ => super::NOT_AVAILABLE.to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_task_kind_and_owners() {
        let task = Task::decode(json!({
            "type": "Fitting",
            "assignedTo": {"_id": "u9", "name": "Raju"}
        }))
        .unwrap();
        assert_eq!(task.parsed_kind(), Some(TaskKind::Fitting));
        assert!(task.is_owned_by(&UserId::new("u9")));
        assert_eq!(task.assignee_label(), "Unassigned");
    }

    #[test]
    fn test_check_in_coordinates() {
        let check_in = CheckIn::decode(json!({"lat": 18.52043, "lng": "73.856744"})).unwrap();
        assert_eq!(check_in.coordinates_label(), "18.520430, 73.856744");
        assert_eq!(CheckIn::default().coordinates_label(), "N/A");
    }
}
