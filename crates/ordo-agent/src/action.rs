//! Action trait and invocation

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ordo_ai::ActionDef;

use crate::error::{Error, Result};

/// An externally invokable capability exposed to an agent as a choosable
/// option: a CRUD operation, the name→id lookup, or a retrieval query.
#[async_trait]
pub trait Action: Send + Sync {
    /// Action name (used in model function calls)
    fn name(&self) -> &str;

    /// Description shown to the model
    fn description(&self) -> &str;

    /// JSON Schema for the argument payload
    fn parameters_schema(&self) -> serde_json::Value;

    /// Invoke with a schema-conforming argument payload, producing text.
    /// Failures should be reported as `Error::ActionInvocation`.
    async fn invoke(&self, arguments: serde_json::Value) -> Result<String>;
}

/// Type alias for a boxed action
pub type BoxedAction = Arc<dyn Action>;

/// Convert an action to its model-facing definition
pub fn to_action_def(action: &dyn Action) -> ActionDef {
    ActionDef {
        name: action.name().to_string(),
        description: action.description().to_string(),
        parameters: action.parameters_schema(),
    }
}

/// The fixed action table of one agent, built at construction and never
/// mutated at runtime. Validates arguments against each action's schema
/// before invoking it.
pub struct ActionSet {
    actions: Vec<BoxedAction>,
    validators: HashMap<String, jsonschema::Validator>,
}

impl ActionSet {
    /// Build a set from boxed actions, compiling their schemas
    pub fn new(actions: Vec<BoxedAction>) -> Self {
        let mut validators = HashMap::new();
        for action in &actions {
            match jsonschema::validator_for(&action.parameters_schema()) {
                Ok(validator) => {
                    validators.insert(action.name().to_string(), validator);
                }
                Err(e) => {
                    tracing::warn!(
                        "Invalid parameter schema for action '{}', skipping validation: {}",
                        action.name(),
                        e
                    );
                }
            }
        }
        Self { actions, validators }
    }

    /// Model-facing definitions of every action in the set
    pub fn defs(&self) -> Vec<ActionDef> {
        self.actions.iter().map(|a| to_action_def(a.as_ref())).collect()
    }

    /// Look up an action by name
    pub fn get(&self, name: &str) -> Option<&BoxedAction> {
        self.actions.iter().find(|a| a.name() == name)
    }

    /// Whether the set advertises an action with this name
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Validate and invoke an action. Every failure path surfaces as
    /// `Error::ActionInvocation` carrying the action name.
    pub async fn invoke(&self, name: &str, arguments: serde_json::Value) -> Result<String> {
        let Some(action) = self.get(name) else {
            return Err(Error::invocation(name, format!("unknown action '{name}'")));
        };

        if let Some(validator) = self.validators.get(name) {
            let errors: Vec<String> = validator
                .iter_errors(&arguments)
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{path}: {e}")
                    }
                })
                .collect();
            if !errors.is_empty() {
                return Err(Error::invocation(
                    name,
                    format!("argument validation failed: {}", errors.join("; ")),
                ));
            }
        }

        action.invoke(arguments).await
    }
}
