//! Command registry: name → constructor + schema.
//!
//! The reference agent discovers handler classes by scanning a directory at
//! startup and matching file stems against a naming convention. This is
//! replaced with a compile-time table — [`crate::commands`] types are
//! registered here by hand, once, and the YAML schema bodies (unchanged in
//! shape from the reference agent's `shared/command_schemas`) are embedded
//! into the binary with `include_str!` rather than read from disk, since
//! there is no dynamic discovery left to justify a runtime schema directory.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::commands::{CommandError, CommandHandler, ConstructFn, Goto, Land, Rtl, Takeoff, Wait, Yaw};

#[derive(Debug, Clone, Deserialize)]
pub struct CommandSchema {
    pub name: String,
    pub description: String,
    pub category: String,
    pub validation_schema: Value,
}

struct Entry {
    construct: ConstructFn,
    schema: Option<CommandSchema>,
}

/// Static verb → (constructor, schema) table built once at startup.
pub struct CommandRegistry {
    entries: HashMap<&'static str, Entry>,
}

const EMBEDDED_SCHEMAS: &[(&str, &str)] = &[
    ("takeoff", include_str!("../../schemas/takeoff.yaml")),
    ("land", include_str!("../../schemas/land.yaml")),
    ("rtl", include_str!("../../schemas/rtl.yaml")),
    ("goto", include_str!("../../schemas/goto.yaml")),
    ("yaw", include_str!("../../schemas/yaw.yaml")),
    ("wait", include_str!("../../schemas/wait.yaml")),
];

impl CommandRegistry {
    pub fn new() -> Self {
        let mut entries: HashMap<&'static str, Entry> = HashMap::new();

        let handlers: &[(&'static str, ConstructFn)] = &[
            ("takeoff", Takeoff::construct),
            ("land", Land::construct),
            ("rtl", Rtl::construct),
            ("goto", Goto::construct),
            ("yaw", Yaw::construct),
            ("wait", Wait::construct),
        ];
        for (name, construct) in handlers {
            entries.insert(name, Entry { construct: *construct, schema: None });
        }

        for (name, yaml) in EMBEDDED_SCHEMAS {
            match serde_yaml::from_str::<CommandSchema>(yaml) {
                Ok(schema) => {
                    entries
                        .entry(name)
                        .or_insert(Entry { construct: unregistered_construct, schema: None })
                        .schema = Some(schema);
                }
                Err(err) => {
                    tracing::error!(command = *name, error = %err, "failed to parse embedded command schema");
                }
            }
        }

        Self { entries }
    }

    pub fn get_handler(&self, name: &str) -> Option<ConstructFn> {
        self.entries.get(name).map(|e| e.construct)
    }

    pub fn get_schema(&self, name: &str) -> Option<&CommandSchema> {
        self.entries.get(name).and_then(|e| e.schema.as_ref())
    }

    /// Validate `params` against the Draft-7 schema registered for `name`.
    /// A missing validator is not an error — returns no errors, as handlers
    /// fall back on their own structural checks.
    pub fn validate_params(&self, name: &str, params: &Value) -> Vec<String> {
        let Some(schema) = self.get_schema(name) else {
            return Vec::new();
        };
        match jsonschema::JSONSchema::compile(&schema.validation_schema) {
            Ok(compiled) => match compiled.validate(params) {
                Ok(()) => Vec::new(),
                Err(errors) => errors
                    .map(|e| format!("{}: {}", e.instance_path, e))
                    .collect(),
            },
            Err(err) => {
                tracing::error!(command = name, error = %err, "command schema failed to compile");
                Vec::new()
            }
        }
    }

    pub fn list_commands(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn describe_commands(&self) -> Vec<CommandDescription> {
        self.list_commands()
            .into_iter()
            .map(|name| {
                let entry = &self.entries[name];
                let schema = entry.schema.as_ref();
                CommandDescription {
                    name,
                    description: schema.map(|s| s.description.clone()).unwrap_or_default(),
                    category: schema.map(|s| s.category.clone()).unwrap_or_else(|| "uncategorized".into()),
                    has_schema: schema.is_some(),
                }
            })
            .collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct CommandDescription {
    pub name: &'static str,
    pub description: String,
    pub category: String,
    pub has_schema: bool,
}

/// Placeholder constructor for a schema registered without a matching
/// handler — visible in the catalog, unusable for execution, per the
/// registry's "independent coupling" contract.
fn unregistered_construct(_params: &HashMap<String, Value>) -> Result<Box<dyn CommandHandler>, CommandError> {
    Err(CommandError::InvalidParameters("no handler registered for this command".into()))
}
