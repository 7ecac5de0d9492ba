use impression_core::{FloatImage, PointSet, RowCol};
use impression_correspond::{
    angle_between, AngleTolerance, CliqueParams, CompatibilityGraph, CorrespondFailure,
    CorresponderKind,
};

fn set(points: Vec<RowCol>) -> PointSet {
    PointSet::new(points, FloatImage::filled(32, 32, 1.0))
}

fn square() -> Vec<RowCol> {
    vec![[0.0, 0.0], [0.0, 10.0], [10.0, 0.0], [10.0, 10.0]]
}

fn pseudo_random(n: usize, seed: u64) -> Vec<RowCol> {
    let mut s = seed.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut next = move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (s >> 11) as f64 / (1u64 << 53) as f64
    };
    (0..n).map(|_| [next() * 100.0, next() * 100.0]).collect()
}

fn all_kinds(epsilon: f64) -> [CorresponderKind; 2] {
    let params = CliqueParams {
        epsilon,
        use_dfs: false,
        alpha: 0.5,
    };
    [
        CorresponderKind::Clique(params),
        CorresponderKind::CliqueThinned(params),
    ]
}

#[test]
fn too_few_points_always_fail() {
    let big = pseudo_random(6, 1);
    for small_len in 0..=2 {
        let small = pseudo_random(small_len, 2);
        for kind in all_kinds(0.1) {
            for (q, k) in [(small.clone(), big.clone()), (big.clone(), small.clone())] {
                let c = kind.correspond(&set(q), &set(k));
                assert!(!c.success());
                assert_eq!(c.size(), 0);
                assert_eq!(c.diagnostics.vertices, 0);
                assert_eq!(c.diagnostics.edges, 0);
            }
        }
    }
}

#[test]
fn four_against_one_fails_on_k() {
    let c = CorresponderKind::Clique(CliqueParams::default())
        .correspond(&set(square()), &set(vec![[3.0, 3.0]]));
    assert!(!c.success());
    assert_eq!(
        c.failure(),
        Some(&CorrespondFailure::NotEnoughPoints { q: 4, k: 1 })
    );
}

#[test]
fn identical_squares_match_completely() {
    let c = CorresponderKind::Clique(CliqueParams {
        epsilon: 0.1,
        ..CliqueParams::default()
    })
    .correspond(&set(square()), &set(square()));
    assert!(c.success());
    assert_eq!(c.size(), 4);
    assert_eq!(c.q(), c.k());
    assert_eq!(c.diagnostics.upper_bound, 4);
    assert_eq!(c.diagnostics.ratio, 100.0);
    assert_eq!(c.diagnostics.vertices, 16);
}

#[test]
fn clique_bound_is_the_smaller_side() {
    let mut q = square();
    q.push([5.0, 3.0]);
    let c = CorresponderKind::Clique(CliqueParams {
        epsilon: 0.1,
        ..CliqueParams::default()
    })
    .correspond(&set(q), &set(square()));
    assert!(c.success());
    assert_eq!(c.diagnostics.vertices, 20);
    assert_eq!(c.diagnostics.upper_bound, 4);
    assert!(c.size() <= 4);
}

#[test]
fn successful_matchings_are_consistent_and_bounded() {
    for seed in 0..5 {
        let q = pseudo_random(9, seed);
        let mut k: Vec<RowCol> = q
            .iter()
            .skip(2)
            .map(|p| [p[0] * 0.9 + 5.0, p[1] * 0.9 - 4.0])
            .collect();
        k.extend(pseudo_random(4, seed + 50));

        for kind in all_kinds(0.08) {
            let c = kind.correspond(&set(q.clone()), &set(k.clone()));
            assert!(c.success(), "seed {seed}");
            assert_eq!(c.q().len(), c.size());
            assert_eq!(c.k().len(), c.size());
            assert!(c.size() <= q.len().min(k.len()));
            assert!(c.size() >= 7, "seed {seed}: size {}", c.size());

            let tol = AngleTolerance::from_epsilon(0.08);
            for a in 0..c.size() {
                for b in (a + 1)..c.size() {
                    let dq = [c.q()[b][0] - c.q()[a][0], c.q()[b][1] - c.q()[a][1]];
                    let dk = [c.k()[b][0] - c.k()[a][0], c.k()[b][1] - c.k()[a][1]];
                    assert!(tol.accepts(angle_between(dq, dk)));
                }
            }
        }
    }
}

#[test]
fn edge_count_is_monotone_in_epsilon() {
    let q = pseudo_random(6, 7);
    let k = pseudo_random(6, 8);
    let mut previous = 0;
    for epsilon in [0.0, 0.05, 0.1, 0.3, 0.7, 1.5, 3.2] {
        let g = CompatibilityGraph::build(&q, &k, AngleTolerance::from_epsilon(epsilon))
            .expect("graph");
        assert!(g.n_edges() >= previous, "epsilon {epsilon}");
        previous = g.n_edges();
    }
}

#[test]
fn matched_size_is_invariant_under_point_permutation() {
    let q = pseudo_random(8, 21);
    let k: Vec<RowCol> = q.iter().map(|p| [p[0] + 1.0, p[1] + 2.0]).collect();
    let mut q_rev = q.clone();
    q_rev.reverse();
    let mut k_rot = k.clone();
    k_rot.rotate_left(3);

    let kind = CorresponderKind::Clique(CliqueParams::default());
    let a = kind.correspond(&set(q), &set(k));
    let b = kind.correspond(&set(q_rev), &set(k_rot));
    assert_eq!(a.size(), 8);
    assert_eq!(a.size(), b.size());
}

#[test]
fn failed_matching_still_yields_a_complete_row() {
    let _ = env_logger::builder().is_test(true).try_init();
    let c = CorresponderKind::Clique(CliqueParams::default())
        .correspond(&set(square()), &set(vec![[3.0, 3.0], [4.0, 4.0]]));
    let row = serde_json::to_value(c.record()).expect("serialize");
    for key in ["success", "size", "graph_v", "graph_e", "ub", "ratio", "elapsed_s"] {
        assert!(row.get(key).is_some(), "missing {key}");
    }
    assert_eq!(row["success"], serde_json::json!(false));
    assert_eq!(row["size"], serde_json::json!(0));
}

#[test]
fn corresponder_kind_reads_from_json() {
    let kind: CorresponderKind =
        serde_json::from_str(r#"{"kind": "clique", "epsilon": 0.3}"#).expect("parse");
    assert_eq!(
        kind,
        CorresponderKind::Clique(CliqueParams {
            epsilon: 0.3,
            ..CliqueParams::default()
        })
    );
    let dummy: CorresponderKind = serde_json::from_str(r#"{"kind": "identity"}"#).expect("parse");
    assert_eq!(dummy.name(), "dummy");
}
