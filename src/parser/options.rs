use serde::{Deserialize, Serialize};

/// Knobs for [`parse_qasm_with`](super::parse_qasm_with).
///
/// Every field has a default, so a JSON file only needs the keys it changes:
///
/// ```
/// use qasm_gates::parser::ParseOptions;
/// let options: ParseOptions = serde_json::from_str(r#"{ "expand_custom_gates": true }"#).unwrap();
/// assert!(options.expand_custom_gates);
/// assert_eq!(options.builtin_includes, vec!["qelib1.inc".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Inline every custom gate call instead of keeping it as one named
    /// instruction.
    pub expand_custom_gates: bool,
    /// Include files whose gates are already built in. Including them is a
    /// no-op; any other include is rejected.
    pub builtin_includes: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            expand_custom_gates: false,
            builtin_includes: vec!["qelib1.inc".to_string()],
        }
    }
}
