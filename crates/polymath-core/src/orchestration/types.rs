//! Role identities and graph edges
//!
//! Roles form a closed set; the orchestrator's transition table matches on
//! these tags rather than on free-form names.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Agent roles in the question-answering graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Picks the first expert for the question
    Router,
    /// Looks things up with external tools
    Researcher,
    /// Reasons over the question and collected context
    Reasoner,
    /// Answers questions about tabular data with sandboxed code
    DataAnalyst,
    /// Drafts, then refines, the answer
    Generator,
    /// Critiques the draft
    Verifier,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Router,
        Role::Researcher,
        Role::Reasoner,
        Role::DataAnalyst,
        Role::Generator,
        Role::Verifier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Router => "router",
            Role::Researcher => "researcher",
            Role::Reasoner => "reasoner",
            Role::DataAnalyst => "data_analyst",
            Role::Generator => "generator",
            Role::Verifier => "verifier",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Router => "Router",
            Role::Researcher => "Researcher",
            Role::Reasoner => "Reasoner",
            Role::DataAnalyst => "Data analyst",
            Role::Generator => "Generator",
            Role::Verifier => "Verifier",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "router" => Ok(Role::Router),
            "researcher" => Ok(Role::Researcher),
            "reasoner" => Ok(Role::Reasoner),
            "data_analyst" | "data-analyst" | "dataanalyst" => Ok(Role::DataAnalyst),
            "generator" => Ok(Role::Generator),
            "verifier" => Ok(Role::Verifier),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Roles the router may hand a question to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTarget {
    Researcher,
    Reasoner,
    DataAnalyst,
}

impl RouteTarget {
    pub const ALL: [RouteTarget; 3] = [
        RouteTarget::Researcher,
        RouteTarget::Reasoner,
        RouteTarget::DataAnalyst,
    ];

    pub fn role(&self) -> Role {
        match self {
            RouteTarget::Researcher => Role::Researcher,
            RouteTarget::Reasoner => Role::Reasoner,
            RouteTarget::DataAnalyst => Role::DataAnalyst,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.role().as_str()
    }

    /// Comma-separated target names, for prompts and error messages
    pub fn allowed() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::str::FromStr for RouteTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "researcher" => Ok(RouteTarget::Researcher),
            "reasoner" => Ok(RouteTarget::Reasoner),
            "data_analyst" => Ok(RouteTarget::DataAnalyst),
            _ => Err(format!("Unknown route target: {}", s)),
        }
    }
}

/// Where control goes after a role step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum NextStep {
    Goto(Role),
    Terminal,
}

impl NextStep {
    pub fn role(&self) -> Option<Role> {
        match self {
            NextStep::Goto(role) => Some(*role),
            NextStep::Terminal => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, NextStep::Terminal)
    }
}

impl std::fmt::Display for NextStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NextStep::Goto(role) => write!(f, "{}", role),
            NextStep::Terminal => f.write_str("terminal"),
        }
    }
}

impl From<NextStep> for String {
    fn from(next: NextStep) -> Self {
        next.to_string()
    }
}

impl TryFrom<String> for NextStep {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "terminal" {
            Ok(NextStep::Terminal)
        } else {
            value.parse().map(NextStep::Goto)
        }
    }
}

/// Unique run identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new random run ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_names() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!("Data-Analyst".parse::<Role>().unwrap(), Role::DataAnalyst);
        assert!("writer".parse::<Role>().is_err());
    }

    #[test]
    fn test_route_targets() {
        assert_eq!(RouteTarget::allowed(), "researcher, reasoner, data_analyst");
        assert_eq!(
            "data_analyst".parse::<RouteTarget>().unwrap().role(),
            Role::DataAnalyst
        );
        assert!("generator".parse::<RouteTarget>().is_err());
        assert!("router".parse::<RouteTarget>().is_err());
    }

    #[test]
    fn test_next_step_serde() {
        assert_eq!(
            serde_json::to_string(&NextStep::Goto(Role::DataAnalyst)).unwrap(),
            "\"data_analyst\""
        );
        assert_eq!(serde_json::to_string(&NextStep::Terminal).unwrap(), "\"terminal\"");
        let next: NextStep = serde_json::from_str("\"verifier\"").unwrap();
        assert_eq!(next, NextStep::Goto(Role::Verifier));
        assert!(serde_json::from_str::<NextStep>("\"nowhere\"").is_err());
    }

    #[test]
    fn test_run_id_parse() {
        let id = RunId::new();
        assert_eq!(id.to_string().parse::<RunId>().unwrap(), id);
        assert!("not-a-uuid".parse::<RunId>().is_err());
    }
}
