use serde::{Deserialize, Serialize};

use crate::model::ids::UserId;

/// Subscription tier of a learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Premium,
}

/// The signed-in user as seen by the exam engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Learner {
    id: UserId,
    name: String,
    plan: Plan,
}

impl Learner {
    #[must_use]
    pub fn new(id: UserId, name: impl Into<String>, plan: Plan) -> Self {
        Self {
            id,
            name: name.into(),
            plan,
        }
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn plan(&self) -> Plan {
        self.plan
    }

    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        matches!(self.plan, Plan::Premium)
    }
}
