//! Cross-crate resolution scenarios
//!
//! Documents are parsed by layer-meta, resolved by layer-core, and the result
//! is written back out the way a backup tool would consume it.

use layer_core::{
    Error, InheritanceSettings, IssueKind, ResolutionStage, Resolver, ScriptRegistry,
    StaticValueSource,
};
use layer_meta::{
    ConfigurationDocument, ConfigurationItem, ConflictPolicy, FallbackStrategy, InheritanceRule,
    InheritanceSource, LayeredDocument, MachineSelector, RuleAction, SectionKind, ValidationLevel,
};
use layer_test_utils::context::{build_server, developer_laptop, machine_builder};
use layer_test_utils::items::{application, complete_file, file, tagged};
use layer_test_utils::{LayeredBuilder, fixture, machine};
use serde_json::json;

// =============================================================================
// Workstation fleet
// =============================================================================

mod fleet_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_each_machine_gets_its_own_document() {
        let layered = fixture("workstation");
        let resolver = Resolver::default();

        let laptop = resolver.resolve(&layered, &developer_laptop()).unwrap();
        let server = resolver.resolve(&layered, &build_server()).unwrap();
        let office = resolver.resolve(&layered, &machine("OFFICE-PC")).unwrap();

        assert_eq!(laptop.document.item_count(), 9);
        assert_eq!(server.document.item_count(), 6);
        assert_eq!(office.document.item_count(), 7);

        assert_eq!(laptop.report.machine_name, "DEV-LAPTOP-07");
        assert_eq!(server.report.machine_name, "BUILD-SRV-01");
        assert!(office.report.applied_layers.is_empty());
    }

    #[test]
    fn test_office_pc_falls_back_to_base_with_settings_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("inheritance.toml");
        std::fs::write(
            &path,
            "fallback_strategy = \"use_base\"\n[configuration]\nvalidation_level = \"strict\"\n",
        )
        .unwrap();
        let settings = InheritanceSettings::load(&path).unwrap();
        assert_eq!(settings.fallback_strategy, FallbackStrategy::UseBase);

        let resolution = Resolver::new(settings)
            .resolve(&fixture("workstation"), &machine("OFFICE-PC"))
            .unwrap();
        let doc = &resolution.document;

        assert_eq!(doc.sections.files.len(), 2);
        assert_eq!(doc.sections.registry.len(), 1);
        assert!(doc.sections.applications.is_empty());
        assert!(
            doc.sections
                .metadata(&SectionKind::Files)
                .iter()
                .all(|meta| meta.is_from(&InheritanceSource::Base))
        );
    }

    #[test]
    fn test_resolved_document_round_trips_through_json() {
        let resolution = Resolver::default()
            .resolve(&fixture("workstation"), &developer_laptop())
            .unwrap();

        let json = serde_json::to_value(&resolution.document).unwrap();
        assert_eq!(json["metadata"]["name"], "developer-workstation");
        assert_eq!(json["files"][1]["inheritance_source"], "machine_specific");
        assert_eq!(json["files"][2]["encrypt"], true);
        assert!(json.get("machine_specific").is_none());

        let parsed: ConfigurationDocument = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, resolution.document);
    }

    #[test]
    fn test_report_serializes_for_diagnostics() {
        let resolution = Resolver::default()
            .resolve(&fixture("workstation"), &build_server())
            .unwrap();

        let report = serde_json::to_value(&resolution.report).unwrap();
        assert_eq!(report["applied_layers"], json!(["build-servers"]));
        assert_eq!(report["stages"][0], "init");
        assert_eq!(report["stages"].as_array().map(Vec::len), Some(8));
        assert_eq!(report["validation"]["level"], "moderate");
    }
}

// =============================================================================
// Scripts and external values
// =============================================================================

mod script_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn studio_document() -> LayeredDocument {
        let mut normalize = InheritanceRule::new("normalize-paths", RuleAction::Transform);
        normalize.applies_to = vec![SectionKind::Files];
        normalize.parameters.transform_script = Some("forward-slashes".to_string());

        LayeredBuilder::new("studio")
            .shared(|s| {
                s.files.push(complete_file("Project root", "C:\\Projects\\studio"));
                s.applications.push(application("Blender", "BlenderFoundation.Blender"));
            })
            .layer(
                "licensed",
                Some(85),
                vec![MachineSelector::external_value(
                    "HKLM\\Software\\Studio",
                    "License",
                    Some("pro"),
                )],
                |s| s.applications.push(application("Houdini", "SideFX.Houdini")),
            )
            .layer(
                "render-nodes",
                Some(75),
                vec![MachineSelector::script("is-render-node", json!(true))],
                |s| s.applications.push(application("Render agent", "Studio.RenderAgent")),
            )
            .rule(normalize)
            .build()
    }

    fn scripts(license: &str) -> ScriptRegistry {
        ScriptRegistry::new()
            .with_external_source(StaticValueSource::new().with_value(
                "HKLM\\Software\\Studio",
                Some("License"),
                license,
            ))
            .with_predicate("is-render-node", |ctx| {
                Ok(json!(ctx.machine_name().starts_with("RENDER-")))
            })
            .with_transform("forward-slashes", |item, _ctx| match item {
                ConfigurationItem::File(mut file) => {
                    file.path = file.path.replace('\\', "/");
                    Ok(ConfigurationItem::File(file))
                }
                other => Ok(other),
            })
    }

    #[test]
    fn test_external_value_selects_licensed_layer() {
        let resolution = Resolver::default()
            .with_scripts(scripts("PRO"))
            .resolve(&studio_document(), &machine("ARTIST-01"))
            .unwrap();

        assert_eq!(resolution.report.applied_layers, vec!["licensed"]);
        assert_eq!(resolution.report.applied_rules, vec!["normalize-paths"]);
        assert_eq!(resolution.document.sections.files[0].path, "C:/Projects/studio");
        assert_eq!(resolution.document.sections.applications.len(), 2);
    }

    #[test]
    fn test_predicate_script_selects_render_layer() {
        let resolution = Resolver::default()
            .with_scripts(scripts("basic"))
            .resolve(&studio_document(), &machine("RENDER-12"))
            .unwrap();

        assert_eq!(resolution.report.applied_layers, vec!["render-nodes"]);
        let apps: Vec<_> = resolution
            .document
            .sections
            .applications
            .iter()
            .map(|app| app.name.as_str())
            .collect();
        assert_eq!(apps, vec!["Blender", "Render agent"]);
    }

    #[test]
    fn test_missing_scripts_mean_no_layer_and_skipped_rule() {
        let resolution = Resolver::default()
            .resolve(&studio_document(), &machine("RENDER-12"))
            .unwrap();

        assert!(resolution.report.applied_layers.is_empty());
        assert_eq!(resolution.document.sections.files[0].path, "C:\\Projects\\studio");
    }
}

// =============================================================================
// Conflicts and failures
// =============================================================================

mod conflict_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_merge_both_combines_fields_across_layers() {
        let mut incoming = file("Editor settings", "~/.config/editor.json");
        incoming.encrypt = Some(true);
        incoming.inheritance.conflict_resolution = Some(ConflictPolicy::MergeBoth);

        let layered = LayeredBuilder::new("editor")
            .shared(|s| s.files.push(complete_file("Editor settings", "~/.config/editor.json")))
            .layer("secure", None, vec![MachineSelector::machine_name("VAULT-01")], |s| {
                s.files.push(incoming)
            })
            .build();

        let resolution = Resolver::default()
            .resolve(&layered, &machine("VAULT-01"))
            .unwrap();
        let merged = &resolution.document.sections.files[0];

        assert_eq!(resolution.document.sections.files.len(), 1);
        assert_eq!(merged.encrypt, Some(true));
        assert_eq!(merged.action.as_deref(), Some("backup"));
        assert!(merged.inheritance.is_from(&InheritanceSource::Shared));
    }

    #[test]
    fn test_tag_pairing_replaces_differently_named_item() {
        let layered = LayeredBuilder::new("browsers")
            .shared(|s| {
                s.applications
                    .push(tagged(application("Firefox", "Mozilla.Firefox"), &["browser"]))
            })
            .layer("kiosk", None, vec![MachineSelector::hostname_pattern("KIOSK-*")], |s| {
                s.applications
                    .push(tagged(application("Chromium", "Hibbiki.Chromium"), &["browser"]))
            })
            .build();

        let resolution = Resolver::default()
            .resolve(&layered, &machine_builder("KIOSK-3").build())
            .unwrap();
        let apps = &resolution.document.sections.applications;

        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].name, "Chromium");
    }

    #[test]
    fn test_blank_policy_fails_during_machine_merge() {
        let mut incoming = file("Hosts", "/etc/hosts");
        incoming.inheritance.conflict_resolution = Some(ConflictPolicy::from(" "));

        let layered = LayeredBuilder::new("broken")
            .shared(|s| s.files.push(file("Hosts", "/etc/hosts")))
            .layer("all", None, vec![MachineSelector::hostname_pattern("*")], |s| {
                s.files.push(incoming)
            })
            .build();

        let err = Resolver::default()
            .resolve(&layered, &machine("ANY"))
            .unwrap_err();
        assert_eq!(err.stage(), Some(ResolutionStage::SharedMerged));
        assert!(err.to_string().contains("shared_merged"));
    }

    #[test]
    fn test_relaxed_level_rejects_only_empty_result() {
        let relaxed = InheritanceSettings {
            validation_level: ValidationLevel::Relaxed,
            ..Default::default()
        };
        let err = Resolver::new(relaxed.clone())
            .resolve(&LayeredDocument::default(), &machine("EMPTY"))
            .unwrap_err();
        assert_eq!(err.stage(), Some(ResolutionStage::ConditionalsApplied));
        let Error::Resolution { source, .. } = err else {
            panic!("expected a resolution error");
        };
        assert!(matches!(*source, Error::EmptyConfiguration));

        let layered = LayeredBuilder::new("duplicates")
            .base(|s| {
                s.files.push(file("Notes", "~/notes.txt"));
                s.files.push(file("Notes", "~/notes.md"));
            })
            .build();
        let resolution = Resolver::new(relaxed)
            .resolve(&layered, &machine("ANY"))
            .unwrap();
        assert_eq!(resolution.document.sections.files.len(), 2);
    }

    #[test]
    fn test_duplicate_names_warn_when_moderate_and_fail_when_strict() {
        let layered = LayeredBuilder::new("duplicates")
            .base(|s| {
                s.files.push(complete_file("Notes", "~/notes.txt"));
                s.files.push(complete_file("Notes", "~/notes.md"));
            })
            .build();

        let resolution = Resolver::default()
            .resolve(&layered, &machine("ANY"))
            .unwrap();
        let report = resolution.report.validation.unwrap();
        assert_eq!(report.of_kind(IssueKind::DuplicateName).count(), 1);

        let strict = InheritanceSettings {
            validation_level: ValidationLevel::Strict,
            ..Default::default()
        };
        let err = Resolver::new(strict)
            .resolve(&layered, &machine("ANY"))
            .unwrap_err();
        assert!(err.to_string().contains("duplicate name 'Notes'"));
    }

    #[test]
    fn test_document_parsed_from_yaml_string() {
        let layered: LayeredDocument = serde_yaml::from_str(
            r#"
metadata:
  name: minimal
files:
  - name: Profile
    path: ~/.profile
machine_specific:
  - name: everyone
    machine_selectors:
      - type: hostname_pattern
        value: "*"
    files:
      - name: Profile
        path: ~/.profile
        action: restore
"#,
        )
        .unwrap();

        let resolution = Resolver::default()
            .resolve(&layered, &machine("ANY"))
            .unwrap();
        let profile = &resolution.document.sections.files[0];
        assert_eq!(profile.action.as_deref(), Some("restore"));
        assert_eq!(profile.inheritance.inheritance_priority, Some(80));
    }
}
