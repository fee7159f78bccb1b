// Property-based tests for assignment invariants.
//
// Three categories:
// 1. Determinism: identical inputs and context give identical ids
// 2. Uniqueness: no two modules of one run share an id
// 3. Minimality: every id is the shortest free prefix of its own digest
//
// Uses proptest with explicit configuration to prevent CI flakiness.

use std::collections::HashSet;
use std::path::Path;

use modid::config::DigestEncoding;
use modid::context::ResolutionContext;
use modid::hash::{create_hash, Algorithm};
use modid::identity::IdentityDeriver;
use modid::manifest::MemoryManifestReader;
use modid::{AssignmentRun, SourceModule};
use proptest::prelude::*;

// ── Test helpers ────────────────────────────────────────────────────────────

fn deriver() -> IdentityDeriver {
    let ctx = ResolutionContext::new(Path::new("/app"))
        .unwrap()
        .with_global_dir(Path::new("/usr/lib/node_modules"))
        .unwrap();
    let reader = MemoryManifestReader::new()
        .with("/app/node_modules/foo", "foo", "2.14.3")
        .with("/app/node_modules/@scope/bar", "@scope/bar", "0.3.0");
    IdentityDeriver::new(ctx, Box::new(reader))
}

fn digest(algorithm: &Algorithm, deriver: &IdentityDeriver, raw: &str) -> String {
    let mut h = create_hash(algorithm, deriver);
    h.update_str(raw).unwrap();
    h.digest(DigestEncoding::Hex)
}

fn assign(
    algorithm: &Algorithm,
    deriver: &IdentityDeriver,
    length: usize,
    requests: &[String],
) -> Vec<Option<String>> {
    let mut run = AssignmentRun::new(algorithm, deriver, DigestEncoding::Hex, length);
    let mut modules: Vec<SourceModule> =
        requests.iter().map(|r| SourceModule::new(r.as_str())).collect();
    run.assign(modules.iter_mut());
    modules.into_iter().map(|m| m.id).collect()
}

// ── Generators ──────────────────────────────────────────────────────────────

/// Module paths inside the project, its dependencies and the global dir.
fn arb_module_path() -> impl Strategy<Value = String> {
    let file = "[a-z]{1,6}(/[a-z]{1,6}){0,2}\\.js";
    prop_oneof![
        file.prop_map(|f| format!("/app/src/{}", f)),
        file.prop_map(|f| format!("/app/node_modules/foo/{}", f)),
        file.prop_map(|f| format!("/app/node_modules/@scope/bar/{}", f)),
        file.prop_map(|f| format!("/usr/lib/node_modules/baz/{}", f)),
        file.prop_map(|f| format!("./lib/{}", f)),
    ]
}

fn arb_request() -> impl Strategy<Value = String> {
    prop_oneof![arb_module_path(), "[ -~]{0,40}"]
}

// ── Properties ──────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 200,
        max_shrink_iters: 200,
        .. ProptestConfig::default()
    })]

    #[test]
    fn derivation_is_deterministic(path in arb_module_path()) {
        let d = deriver();
        let first = d.derive(&path).unwrap();
        let second = deriver().derive(&path).unwrap();
        prop_assert_eq!(first.clone(), second);
        prop_assert_eq!(d.derive(&path).unwrap(), first);
    }

    #[test]
    fn global_identities_are_stable_under_rederivation(file in "[a-z]{1,6}\\.js") {
        let d = deriver();
        let raw = format!("/usr/lib/node_modules/baz/{}", file);
        let expected = format!("@npm-global-dir/baz/{}", file);
        let identity = d.derive(&raw).unwrap();
        prop_assert_eq!(identity.canonical(), Some(expected.as_str()));
        prop_assert_eq!(d.derive(&raw).unwrap(), identity);
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        max_shrink_iters: 100,
        .. ProptestConfig::default()
    })]

    #[test]
    fn digest_ids_are_unique_and_minimal(
        requests in prop::collection::vec(arb_request(), 0..40),
        length in 1usize..4,
    ) {
        let d = deriver();
        let alg = Algorithm::from_name("sha256").unwrap();
        let ids = assign(&alg, &d, length, &requests);

        let mut seen: HashSet<String> = HashSet::new();
        for (raw, id) in requests.iter().zip(&ids) {
            let id = id.clone().expect("sha256 digests never run out here");
            let full = digest(&alg, &d, raw);
            prop_assert!(full.starts_with(&id));
            prop_assert!(id.len() >= length);
            // every shorter admissible prefix was already taken
            for len in length..id.len() {
                prop_assert!(seen.contains(&full[..len]), "{} not minimal", id);
            }
            prop_assert!(seen.insert(id));
        }
    }

    #[test]
    fn assignment_is_deterministic(
        requests in prop::collection::vec(arb_request(), 0..20),
    ) {
        let d = deriver();
        let alg = Algorithm::Fast;
        prop_assert_eq!(assign(&alg, &d, 2, &requests), assign(&alg, &d, 2, &requests));
    }

    #[test]
    fn semantic_ids_are_unique(
        paths in prop::collection::vec(arb_module_path(), 0..30),
    ) {
        let d = deriver();
        let ids = assign(&Algorithm::Named, &d, 4, &paths);
        let assigned: Vec<&String> = ids.iter().flatten().collect();
        let distinct: HashSet<&String> = assigned.iter().copied().collect();
        prop_assert_eq!(assigned.len(), distinct.len());
    }
}
