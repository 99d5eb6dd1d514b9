//! Code for reading `agent` blocks.
use crate::agent::{AgentID, PrototypeID, PrototypeMap};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;

/// The raw contents of an `agent` block
#[derive(Debug, Deserialize, PartialEq)]
pub struct AgentDoc {
    name: String,
    prototype: String,
    #[serde(default)]
    parent: Option<String>,
}

/// A validated agent declaration
#[derive(Debug, PartialEq)]
pub struct AgentSpec {
    /// The agent's unique name
    pub name: AgentID,
    /// The prototype the agent is built from
    pub prototype: PrototypeID,
    /// The agent one level up the hierarchy, if any
    pub parent: Option<AgentID>,
}

/// Validate the declared agents, preserving declaration order.
///
/// Prototypes must exist, names must be unique, and a parent must be declared earlier and
/// sit exactly one level up the hierarchy.
pub fn convert_agents(docs: Vec<AgentDoc>, prototypes: &PrototypeMap) -> Result<Vec<AgentSpec>> {
    let mut agents = Vec::with_capacity(docs.len());
    let mut kinds = IndexMap::new();
    for doc in docs {
        let prototype = prototypes
            .get(doc.prototype.as_str())
            .with_context(|| format!("Agent {} names unknown prototype {}", doc.name, doc.prototype))?;
        let kind = prototype.config.kind();

        let parent = doc
            .parent
            .map(|parent| -> Result<AgentID> {
                let parent_kind = kinds
                    .get(parent.as_str())
                    .with_context(|| format!("Agent {} declared before its parent {parent}", doc.name))?;
                ensure!(
                    Some(*parent_kind) == kind.parent_kind(),
                    "Agent {} is a {kind} and cannot have the {parent_kind} {parent} as parent",
                    doc.name,
                );
                Ok(AgentID::from(parent))
            })
            .transpose()?;

        let name = AgentID::from(doc.name);
        ensure!(
            kinds.insert(name.clone(), kind).is_none(),
            "Duplicate agent name"
        );
        agents.push(AgentSpec {
            name,
            prototype: prototype.id.clone(),
            parent,
        });
    }

    Ok(agents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::prototypes;
    use rstest::rstest;

    fn doc(name: &str, prototype: &str, parent: Option<&str>) -> AgentDoc {
        AgentDoc {
            name: name.into(),
            prototype: prototype.into(),
            parent: parent.map(String::from),
        }
    }

    #[rstest]
    fn test_convert_agents(prototypes: PrototypeMap) {
        let agents = convert_agents(
            vec![
                doc("usa", "region", None),
                doc("exelon", "utility", Some("usa")),
                doc("mine1", "mine", Some("exelon")),
            ],
            &prototypes,
        )
        .unwrap();
        assert_eq!(agents.len(), 3);
        assert_eq!(agents[2].parent, Some("exelon".into()));
    }

    #[rstest]
    fn test_parent_optional(prototypes: PrototypeMap) {
        // A facility without a declared parent is accepted
        let agents = convert_agents(vec![doc("mine1", "mine", None)], &prototypes).unwrap();
        assert_eq!(agents[0].parent, None);
    }

    #[rstest]
    fn test_unknown_prototype(prototypes: PrototypeMap) {
        assert!(convert_agents(vec![doc("x", "reactor", None)], &prototypes).is_err());
    }

    #[rstest]
    fn test_parent_must_come_first(prototypes: PrototypeMap) {
        let result = convert_agents(
            vec![
                doc("mine1", "mine", Some("exelon")),
                doc("exelon", "utility", None),
            ],
            &prototypes,
        );
        assert!(result.is_err());
    }

    #[rstest]
    fn test_parent_must_be_one_level_up(prototypes: PrototypeMap) {
        let result = convert_agents(
            vec![
                doc("usa", "region", None),
                doc("mine1", "mine", Some("usa")),
            ],
            &prototypes,
        );
        assert!(result.is_err());
    }

    #[rstest]
    fn test_duplicate_agent(prototypes: PrototypeMap) {
        let result = convert_agents(
            vec![doc("usa", "region", None), doc("usa", "region", None)],
            &prototypes,
        );
        assert!(result.is_err());
    }
}
