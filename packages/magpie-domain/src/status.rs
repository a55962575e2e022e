use serde::{Deserialize, Serialize};

/// Session lifecycle. Transitions only move forward; `Error` is reachable from
/// any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
	Initiated,
	Searching,
	Processing,
	Completed,
	Error,
}
impl SessionStatus {
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Completed | Self::Error)
	}

	pub fn can_advance_to(self, next: Self) -> bool {
		if self == next {
			return true;
		}
		if self.is_terminal() {
			return false;
		}
		if next == Self::Error {
			return true;
		}

		rank(next) > rank(self)
	}
}

fn rank(status: SessionStatus) -> u8 {
	match status {
		SessionStatus::Initiated => 0,
		SessionStatus::Searching => 1,
		SessionStatus::Processing => 2,
		SessionStatus::Completed => 3,
		SessionStatus::Error => 3,
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
	Pending,
	Processing,
	Success,
	NoRelevantInfo,
	Error,
	PartialSuccess,
}
impl DocumentStatus {
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Success | Self::NoRelevantInfo | Self::Error | Self::PartialSuccess)
	}
}
