//! Level definition types: the read-only entity data a level compiler emits.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::connection::{ConnectionError, parse_connection};
use crate::output::OutputDefinition;

/// A whole level: an ordered list of entity definitions.
///
/// Spawn order follows list order, which in turn fixes the enumeration
/// order target resolution uses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelDefinition {
    /// Human-readable level name.
    #[serde(default)]
    pub name: Option<String>,

    /// Entities in spawn order.
    #[serde(default)]
    pub entities: Vec<EntityDefinition>,
}

/// Data for one entity as it appears in the compiled level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDefinition {
    /// Entity kind, used to pick an input handler.
    pub classname: String,

    /// Designer-assigned name; not required to be unique.
    #[serde(default)]
    pub targetname: Option<String>,

    /// Designer-set option bits.
    #[serde(default)]
    pub spawnflags: u32,

    /// Initial parent, `"name"` or `"name,attachment"`.
    #[serde(default)]
    pub parent: Option<String>,

    /// Visual or brush model reference, not interpreted here.
    #[serde(default)]
    pub model: Option<String>,

    /// Output connections in definition order.
    #[serde(default)]
    pub outputs: Vec<OutputSpec>,

    /// Remaining raw key/values.
    #[serde(default)]
    pub keyvalues: BTreeMap<String, String>,
}

/// An output as written in level data: either a Source connection string
/// or a fully structured definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputSpec {
    /// `output: OnTrigger` + `connection: "target,input,param,delay,times"`.
    Connection {
        /// Output name.
        output: String,
        /// Source connection value.
        connection: String,
    },
    /// A structured [`OutputDefinition`].
    Definition(OutputDefinition),
}

impl OutputSpec {
    /// Convert to an [`OutputDefinition`], parsing connection strings.
    pub fn into_definition(self) -> Result<OutputDefinition, ConnectionError> {
        match self {
            Self::Connection { output, connection } => parse_connection(&output, &connection),
            Self::Definition(definition) => Ok(definition),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_output_forms() {
        let yaml = r#"
name: test
entities:
  - classname: logic_relay
    targetname: relay
    spawnflags: 1
    outputs:
      - output: OnTrigger
        connection: "door,Open,,1.5,1"
      - output: OnTrigger
        target: "lamp_*"
        input: TurnOn
        parameters: ["bright"]
  - classname: func_door
    targetname: door
    parent: "train,hinge"
    keyvalues:
      speed: "100"
"#;
        let level: LevelDefinition = serde_yml::from_str(yaml).unwrap();
        assert_eq!(level.entities.len(), 2);

        let relay = level.entities.first().unwrap();
        assert_eq!(relay.spawnflags, 1);
        let outputs: Vec<OutputDefinition> = relay
            .outputs
            .iter()
            .cloned()
            .map(OutputSpec::into_definition)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs.first().unwrap().target_pattern, "door");
        assert_eq!(outputs.first().unwrap().fire_limit, 1);
        assert_eq!(outputs.get(1).unwrap().parameters, vec!["bright".to_owned()]);

        let door = level.entities.get(1).unwrap();
        assert_eq!(door.parent.as_deref(), Some("train,hinge"));
        assert_eq!(door.keyvalues.get("speed").map(String::as_str), Some("100"));
    }

    #[test]
    fn empty_level_is_valid() {
        let level: LevelDefinition = serde_yml::from_str("entities: []").unwrap();
        assert!(level.entities.is_empty());
        assert!(level.name.is_none());
    }
}
