use dropin_core::{InstallError, InstallRequest, Installer, Placement, StaticRepository};
use dropin_schema::{Capability, Requirement, Unit, Version, VersionRange, namespace};

fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

fn bundle(id: &str) -> Unit {
    Unit::new(id, v("1.0.0"))
}

fn needs(id: &str) -> Requirement {
    Requirement::mandatory(namespace::BUNDLE, id, VersionRange::Any)
}

fn exporter(id: &str, package: &str, version: &str) -> Unit {
    bundle(id).provides(Capability::new(namespace::PACKAGE, package, v(version)))
}

fn imports(package: &str, range: &str) -> Requirement {
    Requirement::mandatory(namespace::PACKAGE, package, VersionRange::parse(range).unwrap())
}

fn install(request: &InstallRequest, repo: &StaticRepository) -> Placement {
    Installer::new(repo).install(request).unwrap()
}

fn ids(placement: &Placement, name: &str) -> Vec<String> {
    placement
        .package_map()
        .get(name)
        .cloned()
        .unwrap_or_default()
}

fn requires<'p>(placement: &'p Placement, dropin: &str, id: &str) -> Option<&'p str> {
    placement
        .dropin(dropin)?
        .provides
        .iter()
        .find(|p| p.id == id)?
        .requires()
}

#[test]
fn test_simple_mapping_and_main() {
    let repo = StaticRepository::new();
    let request = InstallRequest::new("main", [bundle("a"), bundle("b"), bundle("c")]).map("a", "sub");
    let placement = install(&request, &repo);

    assert_eq!(placement.dropins.len(), 2);
    assert_eq!(ids(&placement, "sub"), vec!["a"]);
    assert_eq!(ids(&placement, "main"), vec!["b", "c"]);
}

#[test]
fn test_everything_unmapped_lands_in_main() {
    let repo = StaticRepository::new();
    let request = InstallRequest::new("main", [bundle("a"), bundle("b")]);
    let placement = install(&request, &repo);

    let map = placement.package_map();
    assert_eq!(map.len(), 1);
    assert_eq!(map["main"], vec!["a", "b"]);
}

#[test]
fn test_two_plugins_self_dependency_has_no_requires() {
    let repo = StaticRepository::new();
    let request = InstallRequest::new("main", [bundle("a").requires(needs("b")), bundle("b")]);
    let placement = install(&request, &repo);

    assert_eq!(ids(&placement, "main"), vec!["a", "b"]);
    assert_eq!(requires(&placement, "main", "a"), None);
    assert_eq!(requires(&placement, "main", "b"), None);
}

#[test]
fn test_dependency_follows_its_only_dependent() {
    let repo = StaticRepository::new();
    let request = InstallRequest::new("main", [bundle("a").requires(needs("b")), bundle("b"), bundle("c")])
        .map("a", "sub");
    let placement = install(&request, &repo);

    assert_eq!(ids(&placement, "sub"), vec!["a", "b"]);
    assert_eq!(ids(&placement, "main"), vec!["c"]);
}

#[test]
fn test_cross_package_cycle_keeps_both_names() {
    let repo = StaticRepository::new();
    let request = InstallRequest::new(
        "main",
        [bundle("a").requires(needs("b")), bundle("b").requires(needs("a"))],
    )
    .map("a", "sub1")
    .map("b", "sub2");
    let placement = install(&request, &repo);

    let map = placement.package_map();
    assert_eq!(map.len(), 2);
    assert_eq!(map["sub1"], vec!["a"]);
    assert_eq!(map["sub2"], vec!["b"]);
    assert_eq!(requires(&placement, "sub1", "a"), Some("b"));
}

#[test]
fn test_unmapped_cycle_ends_up_together() {
    let repo = StaticRepository::new();
    let request = InstallRequest::new(
        "main",
        [
            bundle("a").requires(needs("b")),
            bundle("b").requires(needs("c")),
            bundle("c").requires(needs("a")),
        ],
    );
    let placement = install(&request, &repo);
    assert_eq!(ids(&placement, "main"), vec!["a", "b", "c"]);
}

#[test]
fn test_independent_plugins_common_dependency() {
    let u = bundle("u");
    let repo = StaticRepository::new()
        .with_external([u.clone()])
        .with_path(&u, "/usr/share/java/u.jar");
    let request = InstallRequest::new(
        "main",
        [bundle("a").requires(needs("u")), bundle("b").requires(needs("u"))],
    )
    .map("a", "sub1")
    .map("b", "sub2");
    let placement = install(&request, &repo);

    assert_eq!(ids(&placement, "sub1"), vec!["a", "u"]);
    assert_eq!(ids(&placement, "sub2"), vec!["b", "u"]);
    assert_eq!(requires(&placement, "sub1", "a"), Some("u"));
    assert_eq!(requires(&placement, "sub2", "b"), Some("u"));

    for name in ["sub1", "sub2"] {
        let dropin = placement.dropin(name).unwrap();
        assert_eq!(dropin.symlinks.len(), 1);
        assert_eq!(dropin.symlinks[0].link_name, "u_1.0.0.jar");
        assert_eq!(
            dropin.symlinks[0].target.as_deref(),
            Some(std::path::Path::new("/usr/share/java/u.jar"))
        );
    }
}

#[test]
fn test_shared_external_chain_is_split_all_the_way_down() {
    let repo = StaticRepository::new().with_external([bundle("e1").requires(needs("e2")), bundle("e2")]);
    let request = InstallRequest::new(
        "main",
        [bundle("a").requires(needs("e1")), bundle("b").requires(needs("e1"))],
    )
    .map("a", "sub1")
    .map("b", "sub2");
    let placement = install(&request, &repo);

    assert_eq!(ids(&placement, "sub1"), vec!["a", "e1", "e2"]);
    assert_eq!(ids(&placement, "sub2"), vec!["b", "e1", "e2"]);
}

#[test]
fn test_interdependent_impossible_split() {
    let repo = StaticRepository::new();
    let request = InstallRequest::new(
        "main",
        [
            bundle("a").requires(needs("b")),
            bundle("b"),
            bundle("c").requires(needs("b")),
        ],
    )
    .map("a", "sub1")
    .map("c", "sub2");

    let err = Installer::new(&repo).install(&request).unwrap_err();
    assert_eq!(err.to_string(), "There are 1 unmerged virtual metapackages");
    let InstallError::UnmergedVirtualPackages { count, dump } = err else {
        panic!("expected unmerged virtual packages");
    };
    assert_eq!(count, 1);
    assert!(dump.contains("* b 1.0.0"));
    assert!(dump.contains("Physical package sub1:"));
    assert!(dump.contains("Physical package sub2:"));
}

#[test]
fn test_version_range_picks_highest_match_only() {
    let repo = StaticRepository::new().with_external([
        exporter("api2", "org.api", "2"),
        exporter("api3", "org.api", "3"),
        exporter("api4", "org.api", "4"),
        exporter("api5", "org.api", "5"),
    ]);
    let request = InstallRequest::new("main", [bundle("a").requires(imports("org.api", "[2.5,5.0.0)"))]);
    let placement = install(&request, &repo);

    assert_eq!(ids(&placement, "main"), vec!["a", "api4"]);
    assert_eq!(requires(&placement, "main", "a"), Some("api4"));
}

#[test]
fn test_wildcard_version_picks_exactly_one() {
    let repo = StaticRepository::new().with_external([
        exporter("api2", "org.api", "2"),
        exporter("api3", "org.api", "3"),
        exporter("api4", "org.api", "4"),
        exporter("api5", "org.api", "5"),
    ]);
    let request = InstallRequest::new("main", [bundle("a").requires(imports("org.api", "0.0.0"))]);
    let placement = install(&request, &repo);

    let dropin = placement.dropin("main").unwrap();
    assert_eq!(dropin.symlinks.len(), 1);
    assert_eq!(dropin.symlinks[0].id, "api5");
}

#[test]
fn test_platform_internal_and_meta_tiers() {
    let runtime = Unit::new("a.jre", v("17")).provides(Capability::new(
        namespace::PACKAGE,
        "javax.xml",
        Version::ZERO,
    ));
    let repo = StaticRepository::new()
        .with_platform([bundle("p")])
        .with_internal([bundle("i")])
        .with_meta([runtime]);
    let request = InstallRequest::new(
        "main",
        [bundle("a")
            .requires(needs("p"))
            .requires(needs("i"))
            .requires(imports("javax.xml", "0"))],
    );
    let placement = install(&request, &repo);

    assert_eq!(ids(&placement, "main"), vec!["a"]);
    assert_eq!(requires(&placement, "main", "a"), Some("i"));
}

#[test]
fn test_fragment_follows_ordinary_placement() {
    let repo = StaticRepository::new().with_external([bundle("ext.host")]);
    let request = InstallRequest::new(
        "main",
        [
            bundle("host"),
            bundle("frag").requires(Requirement::host("host", VersionRange::Any)),
            bundle("frag.ext").requires(Requirement::host("ext.host", VersionRange::Any)),
        ],
    )
    .map("host", "sub");
    let placement = install(&request, &repo);

    assert_eq!(ids(&placement, "sub"), vec!["host"]);
    assert_eq!(ids(&placement, "main"), vec!["frag", "frag.ext"]);
    assert_eq!(requires(&placement, "main", "frag"), None);
    assert!(placement.dropin("main").unwrap().symlinks.is_empty());
}

#[test]
fn test_ignore_optional() {
    let repo = StaticRepository::new().with_external([bundle("e")]);
    let unit = bundle("a").requires(Requirement::optional(namespace::BUNDLE, "e", VersionRange::Any));

    let placement = install(&InstallRequest::new("main", [unit.clone()]), &repo);
    assert_eq!(ids(&placement, "main"), vec!["a", "e"]);

    let placement = install(&InstallRequest::new("main", [unit]).ignore_optional("a"), &repo);
    assert_eq!(ids(&placement, "main"), vec!["a"]);
}

#[test]
fn test_unresolved_requirements_do_not_abort() {
    let repo = StaticRepository::new();
    let request = InstallRequest::new(
        "main",
        [bundle("a")
            .requires(needs("missing"))
            .requires(Requirement::optional(namespace::BUNDLE, "gone", VersionRange::Any))],
    );
    let placement = install(&request, &repo);
    assert_eq!(ids(&placement, "main"), vec!["a"]);
    assert_eq!(requires(&placement, "main", "a"), None);
}

#[test]
fn test_features_and_multi_artifact_units() {
    let repo = StaticRepository::new();
    let request = InstallRequest::new(
        "main",
        [
            Unit::feature("org.foo.feature", v("1.0.0")),
            bundle("org.foo").with_artifacts([
                dropin_schema::ArtifactKey::bundle("org.foo", v("1.0.0")),
                dropin_schema::ArtifactKey::bundle("org.foo.source", v("1.0.0")),
            ]),
        ],
    );
    let placement = install(&request, &repo);
    let paths: Vec<String> = placement.dropins[0]
        .provides
        .iter()
        .map(|p| p.path.display().to_string())
        .collect();
    assert_eq!(
        paths,
        vec![
            "/dropins/main/eclipse/features/org.foo.feature_1.0.0",
            "/dropins/main/eclipse/plugins/org.foo_1.0.0.jar",
            "/dropins/main/eclipse/plugins/org.foo.source_1.0.0.jar",
        ]
    );
}

#[test]
fn test_identical_input_gives_identical_output() {
    let build = || {
        let repo = StaticRepository::new().with_external([
            bundle("u").requires(needs("w")),
            bundle("w"),
            exporter("x1", "org.x", "1"),
            exporter("x2", "org.x", "1"),
        ]);
        let request = InstallRequest::new(
            "main",
            [
                bundle("a").requires(needs("u")).requires(imports("org.x", "0")),
                bundle("b").requires(needs("u")).requires(needs("c")),
                bundle("c").requires(imports("org.x", "0")),
            ],
        )
        .map("a", "sub1")
        .map("b", "sub2");
        install(&request, &repo).to_json().unwrap()
    };
    assert_eq!(build(), build());
}

#[test]
fn test_own_export_loses_to_higher_version_elsewhere() {
    let repo = StaticRepository::new();
    let request = InstallRequest::new(
        "main",
        [
            exporter("a", "api", "1").requires(imports("api", "0")),
            exporter("b", "api", "2"),
        ],
    )
    .map("a", "sub1")
    .map("b", "sub2");
    let placement = install(&request, &repo);

    assert_eq!(ids(&placement, "sub1"), vec!["a"]);
    assert_eq!(ids(&placement, "sub2"), vec!["b"]);
    assert_eq!(requires(&placement, "sub1", "a"), Some("b"));
}

#[test]
fn test_feature_and_bundle_sharing_identity_are_both_placed() {
    let repo = StaticRepository::new();
    let request = InstallRequest::new(
        "main",
        [Unit::feature("org.foo", v("1.0.0")), bundle("org.foo")],
    );
    let placement = install(&request, &repo);

    let paths: Vec<String> = placement.dropins[0]
        .provides
        .iter()
        .map(|p| p.path.display().to_string())
        .collect();
    assert_eq!(
        paths,
        vec![
            "/dropins/main/eclipse/features/org.foo_1.0.0",
            "/dropins/main/eclipse/plugins/org.foo_1.0.0.jar",
        ]
    );
}
