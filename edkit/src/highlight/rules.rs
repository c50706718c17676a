//! Built-in and file-loaded rule sets.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{HighlightRule, HighlightRuleSet, Style};
use crate::errors::{EditError, EditResult};

/// The stock PL/1 rule set.
///
/// Declaration order is load-bearing: comments and strings come first, then
/// the capture-scoped procedure-name rules, then the keyword groups, so a
/// keyword rule overwrites anything before it wherever their spans overlap.
/// Do not reorder.
pub fn pl1() -> HighlightRuleSet {
    let procedure_name = Style::color("#1E90FF").bold(); // Dodger Blue
    let control = Style::color("#FFD700").bold(); // Gold
    let logical = Style::color("#00CED1"); // Dark Turquoise
    let data_type = Style::color("#FFA500"); // Orange
    let keyword = Style::color("#32CD32"); // Lime Green
    let reserved = Style::color("#9370DB"); // Medium Purple
    let comment = Style::color("#008000").italic(); // Green
    let string = Style::color("#00FFFF"); // Cyan

    let control_structures = [
        r"\bIF\b",
        r"\bTHEN\b",
        r"\bELSE\b",
        r"\bSELECT\b",
        r"\bWHEN\b",
        r"\bOTHERWISE\b",
        r"\bEND\b",
        r"\bDO\b",
        r"\bDO UNTIL\b",
        r"\bDO WHILE\b",
        r"\bDO TO BY\b",
        r"\bLEAVE\b",
        r"\bITERATE\b",
        r"\bGOTO\b",
        r"\bCALL\b",
        r"\bRETURN\b",
    ];

    let logical_operators = [
        "&", r"\|", "¬", r"\^", "=", r"\^=", "<", ">", "<=", ">=",
    ];

    let data_types = [
        r"\bBIT\b",
        r"\bCHARACTER\b",
        r"\bDECIMAL\b",
        r"\bFIXED\b",
        r"\bFLOAT\b",
        r"\bCOMPLEX\b",
        r"\bPOINTER\b",
        r"\bFILE\b",
        r"\bLABEL\b",
    ];

    let keywords = [
        r"\bDECLARE\b",
        r"\bDEFINE\b",
        r"\bPROCEDURE\b",
        r"\bENTRY\b",
        r"\bSTATIC\b",
        r"\bAUTOMATIC\b",
        r"\bCONTROLLED\b",
        r"\bBASED\b",
        r"\bALIGNED\b",
        r"\bAREA\b",
        r"\bREFER\b",
        r"\bPICTURE\b",
        r"\bINITIAL\b",
        r"\bDEFAULT\b",
        r"\bVALUE\b",
    ];

    let reserved_words = [
        r"\bBEGIN\b",
        r"\bEND\b",
        r"\bPACKAGE\b",
        r"\bIMPORT\b",
        r"\bEXPORT\b",
        r"\bINCLUDE\b",
        r"\bINLINE\b",
        r"\bCONDITION\b",
        r"\bSIGNAL\b",
        r"\bON\b",
        r"\bERROR\b",
        r"\bSTOP\b",
        r"\bHALT\b",
        r"\bRESIGNAL\b",
        r"\bUNDEFINED\b",
        r"\bSTORAGE\b",
        r"\bUNION\b",
        r"\bSTRUCTURE\b",
        r"\bELEMENT\b",
        r"\bSTREAM\b",
        r"\bOPEN\b",
        r"\bCLOSE\b",
        r"\bREAD\b",
        r"\bWRITE\b",
        r"\bGET\b",
        r"\bPUT\b",
        r"\bSKIP\b",
        r"\bPAGE\b",
    ];

    let mut set = HighlightRuleSet::new();
    push(&mut set, r"/\*.*?\*/", &comment); // block comments
    push(&mut set, "'[^']*'", &string); // single quotes
    push(&mut set, "\"[^\"]*\"", &string); // double quotes
    push_capture(&mut set, r"\bPROCEDURE\s+(\w+)", &procedure_name, 1);
    push_capture(&mut set, r"\bCALL\s+(\w+)", &procedure_name, 1);
    for pattern in control_structures {
        push(&mut set, pattern, &control);
    }
    for pattern in logical_operators {
        push(&mut set, pattern, &logical);
    }
    for pattern in data_types {
        push(&mut set, pattern, &data_type);
    }
    for pattern in keywords {
        push(&mut set, pattern, &keyword);
    }
    for pattern in reserved_words {
        push(&mut set, pattern, &reserved);
    }
    set
}

fn push(set: &mut HighlightRuleSet, pattern: &str, style: &Style) {
    set.push(HighlightRule::new(pattern, style.clone()).expect("Invalid built-in rule pattern"));
}

fn push_capture(set: &mut HighlightRuleSet, pattern: &str, style: &Style, group: usize) {
    set.push(
        HighlightRule::with_capture(pattern, style.clone(), group)
            .expect("Invalid built-in rule pattern"),
    );
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RuleSpec {
    pattern: String,
    color: String,
    #[serde(default)]
    bold: bool,
    #[serde(default)]
    italic: bool,
    #[serde(default)]
    capture: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RulesFile {
    rules: Vec<RuleSpec>,
}

/// Loads a rule set from a YAML file. File order becomes priority order.
pub fn load_rules_file(path: &Path) -> EditResult<HighlightRuleSet> {
    let content = std::fs::read_to_string(path).map_err(|e| EditError::from_io(path, e))?;
    let parsed: RulesFile = serde_yaml::from_str(&content)
        .map_err(|e| EditError::config_error(format!("Failed to parse rules file: {e}")))?;

    let mut set = HighlightRuleSet::new();
    for spec in parsed.rules {
        let style = Style {
            color: spec.color,
            bold: spec.bold,
            italic: spec.italic,
        };
        let rule = match spec.capture {
            Some(group) => HighlightRule::with_capture(&spec.pattern, style, group)?,
            None => HighlightRule::new(&spec.pattern, style)?,
        };
        set.push(rule);
    }
    Ok(set)
}
