// Attendance status value object

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttendanceStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
    Tentative,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown attendance status '{0}'")]
pub struct UnknownAttendanceStatus(pub String);

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Pending => "PENDING",
            AttendanceStatus::Accepted => "ACCEPTED",
            AttendanceStatus::Declined => "DECLINED",
            AttendanceStatus::Tentative => "TENTATIVE",
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = UnknownAttendanceStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(AttendanceStatus::Pending),
            "ACCEPTED" => Ok(AttendanceStatus::Accepted),
            "DECLINED" => Ok(AttendanceStatus::Declined),
            "TENTATIVE" => Ok(AttendanceStatus::Tentative),
            _ => Err(UnknownAttendanceStatus(s.to_string())),
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_form_matches_wire_form() {
        for status in [
            AttendanceStatus::Pending,
            AttendanceStatus::Accepted,
            AttendanceStatus::Declined,
            AttendanceStatus::Tentative,
        ] {
            let wire = serde_json::to_string(&status).expect("serialize");
            assert_eq!(wire, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<AttendanceStatus>(), Ok(status));
        }
    }

    #[test]
    fn rejects_unknown_status() {
        let err = "maybe".parse::<AttendanceStatus>().expect_err("reject");
        assert_eq!(err, UnknownAttendanceStatus("maybe".to_string()));
    }

    #[test]
    fn defaults_to_pending() {
        assert_eq!(AttendanceStatus::default(), AttendanceStatus::Pending);
    }
}
