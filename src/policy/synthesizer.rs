//! Builds policy records from an extracted action table.
//!
//! Each role column is processed on its own: every distinct resource the column
//! mentions gets one [`Policy`], named after the binding paired with the column,
//! and collects the action names whose marker reads "yes".
use crate::config::BindingAlignment;
use crate::config::ResourceRegistry;
use crate::policy::extractor::ActionTable;
use crate::policy::extractor::Binding;
use crate::policy::warning::Warning;
use crate::policy::warning::Warnings;
use crate::policy::Conditions;
use crate::policy::Policy;
use crate::policy::EFFECT_ALLOW;
use std::collections::HashMap;

/// Resource and action-name columns precede the role columns.
const PREFIX_LEN: usize = 2;

/// Placeholder for values a missing binding would have supplied.
pub const MISSING: &str = "MISSING";

/// Marker granting an action, compared case-insensitively.
const AFFIRMATIVE: &str = "yes";

/// Policies and warnings of one worksheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Synthesis {
    pub policies: Vec<Policy>,
    pub warnings: Warnings,
}

/// Synthesizes with the default pairing: every role column takes one binding.
pub fn synthesize(table: &ActionTable, bindings: &[Binding], registry: &ResourceRegistry) -> Synthesis {
    synthesize_with(table, bindings, registry, BindingAlignment::default())
}

pub fn synthesize_with(
    table: &ActionTable,
    bindings: &[Binding],
    registry: &ResourceRegistry,
    alignment: BindingAlignment,
) -> Synthesis {
    let mut synthesis = Synthesis::default();
    if table.has_no_data() {
        synthesis.warnings.push(Warning::EmptyActionTable);
    }

    let header = table.header();
    let mut slot = 0usize;
    for col in PREFIX_LEN..table.width() {
        let role = header[col].trim();
        if role.is_empty() {
            synthesis.warnings.push(Warning::EmptyRoleHeader {
                position: col - PREFIX_LEN + 1,
            });
            if alignment == BindingAlignment::EveryColumn {
                slot += 1;
            }
            continue;
        }
        let policies = synthesize_column(table, col, role, bindings.get(slot), registry, &mut synthesis.warnings);
        synthesis.policies.extend(policies);
        slot += 1;
    }
    synthesis
}

/// One policy per distinct resource of a role column, in order of first mention
fn synthesize_column(
    table: &ActionTable,
    col: usize,
    role: &str,
    binding: Option<&Binding>,
    registry: &ResourceRegistry,
    warnings: &mut Warnings,
) -> Vec<Policy> {
    let mut policies = Vec::<Policy>::new();
    let mut positions = HashMap::<String, usize>::new();
    for (index, row) in table.rows.iter().enumerate().skip(1) {
        let sheet_row = index + 1;
        for piece in cell(row, 0).split(',') {
            let key = piece.trim().to_lowercase();
            if key.is_empty() {
                warnings.push(Warning::EmptyResource { row: sheet_row });
                continue;
            }
            let Some(label) = registry.label(&key) else {
                warnings.push(Warning::UnknownResource {
                    resource: key,
                    row: sheet_row,
                });
                continue;
            };
            let position = match positions.get(&key) {
                Some(position) => *position,
                None => {
                    policies.push(new_policy(role, label, binding, warnings));
                    positions.insert(key, policies.len() - 1);
                    policies.len() - 1
                }
            };
            if cell(row, col).trim().eq_ignore_ascii_case(AFFIRMATIVE) {
                policies[position].actions.push(cell(row, 1).to_owned());
            }
        }
    }
    policies
}

/// Cell text, empty past the end of a short row
fn cell(row: &[String], col: usize) -> &str {
    row.get(col).map(String::as_str).unwrap_or_default()
}

fn new_policy(role: &str, label: &str, binding: Option<&Binding>, warnings: &mut Warnings) -> Policy {
    let (name, description, subject, file_name) = match binding {
        Some(binding) => (
            format!("pn:{}:{}:{}", binding.group, label, binding.role()).to_lowercase(),
            binding.description.to_owned(),
            binding.subject.to_owned(),
            format!("{}_{}", binding.role(), label).to_lowercase(),
        ),
        None => {
            let role = role.to_lowercase();
            let (name, file_name) = (format!("{}:{}", role, MISSING), format!("{}_{}", role, MISSING));
            warnings.push(Warning::MissingBinding { role });
            (name, MISSING.to_owned(), MISSING.to_owned(), file_name)
        }
    };
    Policy {
        name,
        description,
        subjects: vec![subject],
        actions: Vec::new(),
        effect: EFFECT_ALLOW.to_owned(),
        conditions: Conditions::default(),
        resources: vec![format!("rn:{}", label.to_lowercase())],
        file_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> ActionTable {
        ActionTable {
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        }
    }

    fn registry() -> ResourceRegistry {
        ResourceRegistry::new([("home", "Home"), ("billing", "Billing")])
    }

    fn binding(role: &str) -> Binding {
        Binding::new("Grp", &format!("a:b:{}", role), &format!("{} description", role))
    }

    #[test]
    fn single_role_single_resource() {
        let table = table(&[&["Page", "Name", "Admin"], &["home", "view", "Yes"]]);
        let bindings = vec![Binding::new("grp", "a:b:editor", "desc")];
        let registry = ResourceRegistry::new([("home", "Home")]);
        let synthesis = synthesize(&table, &bindings, &registry);

        assert!(synthesis.warnings.is_empty());
        assert_eq!(
            synthesis.policies,
            vec![Policy {
                name: "pn:grp:home:editor".to_owned(),
                description: "desc".to_owned(),
                subjects: vec!["a:b:editor".to_owned()],
                actions: vec!["view".to_owned()],
                effect: "allow".to_owned(),
                conditions: Conditions {},
                resources: vec!["rn:home".to_owned()],
                file_name: "editor_home".to_owned(),
            }]
        );
    }

    #[test]
    fn unknown_resource_is_skipped_with_warning() {
        let table = table(&[&["Page", "Name", "Admin"], &["home", "view", "Yes"]]);
        let bindings = vec![Binding::new("grp", "a:b:editor", "desc")];
        let synthesis = synthesize(&table, &bindings, &ResourceRegistry::default());

        assert!(synthesis.policies.is_empty());
        assert_eq!(
            synthesis.warnings.messages(),
            vec!["page 'home' (row 2) isn't in config file: skipped"]
        );
    }

    #[test]
    fn empty_role_header_still_consumes_binding_slot() {
        let table = table(&[&["Page", "Name", "", "Editor"], &["home", "view", "Yes", "Yes"]]);
        let bindings = vec![binding("skipped"), binding("editor")];
        let synthesis = synthesize(&table, &bindings, &registry());

        assert_eq!(synthesis.warnings.messages(), vec!["find empty role-header on 1-th position"]);
        assert_eq!(synthesis.policies.len(), 1);
        assert_eq!(synthesis.policies[0].name, "pn:grp:home:editor");
    }

    #[test]
    fn named_columns_alignment_skips_empty_headers() {
        let table = table(&[&["Page", "Name", "", "Editor"], &["home", "view", "Yes", "Yes"]]);
        let bindings = vec![binding("editor")];
        let synthesis = synthesize_with(&table, &bindings, &registry(), BindingAlignment::NamedColumns);

        assert_eq!(synthesis.policies.len(), 1);
        assert_eq!(synthesis.policies[0].name, "pn:grp:home:editor");
    }

    #[test]
    fn bindings_pair_with_columns_left_to_right() {
        let table = table(&[
            &["Page", "Name", "Admin", "Editor"],
            &["home", "view", "Yes", "Yes"],
            &["home", "edit", "Yes", "No"],
        ]);
        let bindings = vec![binding("admin"), binding("editor")];
        let synthesis = synthesize(&table, &bindings, &registry());

        let summary: Vec<(&str, Vec<&str>)> = synthesis
            .policies
            .iter()
            .map(|policy| (policy.name.as_str(), policy.actions.iter().map(String::as_str).collect()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("pn:grp:home:admin", vec!["view", "edit"]),
                ("pn:grp:home:editor", vec!["view"]),
            ]
        );
        assert_eq!(synthesis.policies[1].description, "editor description");
        assert_eq!(synthesis.policies[1].subjects, vec!["a:b:editor"]);
    }

    #[test]
    fn resource_keys_are_trimmed_and_case_insensitive() {
        let table = table(&[
            &["Page", "Name", "Admin"],
            &[" Home ", "view", "yes"],
            &["home", "edit", "YES"],
            &["HOME", "delete", " Yes "],
        ]);
        let synthesis = synthesize(&table, &[binding("admin")], &registry());

        assert_eq!(synthesis.policies.len(), 1);
        assert_eq!(synthesis.policies[0].actions, vec!["view", "edit", "delete"]);
        assert_eq!(synthesis.policies[0].resources, vec!["rn:home"]);
    }

    #[test]
    fn comma_separated_resources_get_own_records() {
        let table = table(&[&["Page", "Name", "Admin"], &["home, billing", "view", "Yes"]]);
        let synthesis = synthesize(&table, &[binding("admin")], &registry());

        let names: Vec<&str> = synthesis.policies.iter().map(|policy| policy.name.as_str()).collect();
        assert_eq!(names, vec!["pn:grp:home:admin", "pn:grp:billing:admin"]);
        assert!(synthesis.policies.iter().all(|policy| policy.actions == vec!["view"]));
        assert_eq!(synthesis.policies[1].file_name, "admin_billing");
    }

    #[test]
    fn record_exists_without_affirmative_markers() {
        let table = table(&[&["Page", "Name", "Admin"], &["home", "view", "No"], &["home", "edit", ""]]);
        let synthesis = synthesize(&table, &[binding("admin")], &registry());

        assert_eq!(synthesis.policies.len(), 1);
        assert!(synthesis.policies[0].actions.is_empty());
    }

    #[test]
    fn duplicate_action_names_are_kept() {
        let table = table(&[&["Page", "Name", "Admin"], &["home", "view", "Yes"], &["home", "view", "Yes"]]);
        let synthesis = synthesize(&table, &[binding("admin")], &registry());

        assert_eq!(synthesis.policies[0].actions, vec!["view", "view"]);
    }

    #[test]
    fn missing_binding_uses_placeholders_and_warns_once() {
        let table = table(&[
            &["Page", "Name", "Admin", "Auditor"],
            &["home", "view", "Yes", "Yes"],
            &["billing", "view", "Yes", "Yes"],
        ]);
        let synthesis = synthesize(&table, &[binding("admin")], &registry());

        let auditor: Vec<&Policy> = synthesis
            .policies
            .iter()
            .filter(|policy| policy.file_name.starts_with("auditor"))
            .collect();
        assert_eq!(auditor.len(), 2);
        assert_eq!(auditor[0].name, "auditor:MISSING");
        assert_eq!(auditor[0].description, "MISSING");
        assert_eq!(auditor[0].subjects, vec!["MISSING"]);
        assert_eq!(auditor[0].file_name, "auditor_MISSING");
        assert_eq!(auditor[1].resources, vec!["rn:billing"]);
        assert_eq!(synthesis.warnings.messages(), vec!["cannot find binding name for 'auditor'"]);
    }

    #[test]
    fn empty_resource_pieces_warn_per_row() {
        let table = table(&[
            &["Page", "Name", "Admin", "Editor"],
            &["", "view", "Yes", "Yes"],
            &["home,", "edit", "Yes", "Yes"],
        ]);
        let synthesis = synthesize(&table, &[binding("admin"), binding("editor")], &registry());

        assert_eq!(
            synthesis.warnings.messages(),
            vec!["found empty page-field on row 2", "found empty page-field on row 3"]
        );
        assert_eq!(synthesis.policies.len(), 2);
        assert!(synthesis.policies.iter().all(|policy| policy.actions == vec!["edit"]));
    }

    #[test]
    fn short_rows_read_missing_cells_as_empty() {
        let table = table(&[&["Page", "Name", "Admin"], &["home"], &["home", "edit", "Yes"]]);
        let synthesis = synthesize(&table, &[binding("admin")], &registry());

        assert_eq!(synthesis.policies.len(), 1);
        assert_eq!(synthesis.policies[0].actions, vec!["edit"]);
        assert!(synthesis.warnings.is_empty());
    }

    #[test]
    fn header_only_table_warns_empty() {
        let table = table(&[&["Page", "Name", "Admin"]]);
        let synthesis = synthesize(&table, &[binding("admin")], &registry());

        assert!(synthesis.policies.is_empty());
        assert_eq!(synthesis.warnings.messages(), vec!["action table is empty"]);
    }

    #[test]
    fn generated_identifiers_are_lower_case_but_fields_keep_casing() {
        let table = table(&[&["Page", "Name", "Admin"], &["billing", "view", "Yes"]]);
        let bindings = vec![Binding::new("Finance", "Org:Team:Approver", "Approvers Of Bills")];
        let synthesis = synthesize(&table, &bindings, &registry());

        let policy = &synthesis.policies[0];
        assert_eq!(policy.name, "pn:finance:billing:approver");
        assert_eq!(policy.file_name, "approver_billing");
        assert_eq!(policy.subjects, vec!["Org:Team:Approver"]);
        assert_eq!(policy.description, "Approvers Of Bills");
    }

    #[test]
    fn synthesis_is_deterministic() {
        let table = table(&[
            &["Page", "Name", "Admin", "", "Editor"],
            &["home, billing", "view", "Yes", "Yes", "no"],
            &["reports", "edit", "Yes", "", "Yes"],
        ]);
        let bindings = vec![binding("admin")];
        assert_eq!(
            synthesize(&table, &bindings, &registry()),
            synthesize(&table, &bindings, &registry())
        );
    }
}
