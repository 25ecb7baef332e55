//! Seeded sampling across the default event set.

use stride_domain_rand::{AddRigidBodyMassCfg, DomainRandCfg, MassOperation, RandomizationRange};
use stride_test_utils::rng::{nominal_values, seeded_rng};

#[test]
fn mass_offsets_track_nominal_masses() {
    let cfg = DomainRandCfg::default().add_rigid_body_mass;
    let masses = nominal_values(32, 0.5, 12.0, 3);
    let mut rng = seeded_rng(11);
    for nominal in &masses {
        let m = cfg.apply(*nominal, &mut rng).unwrap();
        assert!(m > 0.0);
        assert!(m <= nominal + 5.0, "{nominal} -> {m}");
    }
}

#[test]
fn scaled_masses_stay_proportional() {
    let cfg = AddRigidBodyMassCfg {
        mass_distribution_params: (0.8, 1.2),
        operation: MassOperation::Scale,
        ..AddRigidBodyMassCfg::default()
    };
    let mut rng = seeded_rng(5);
    for nominal in nominal_values(32, 1.0, 4.0, 9) {
        let m = cfg.apply(nominal, &mut rng).unwrap();
        assert!(m >= 0.8 * nominal - 1e-5 && m <= 1.2 * nominal + 1e-5);
    }
}

#[test]
fn same_seed_same_episode() {
    let cfg = DomainRandCfg::default();
    let draw = |seed| {
        let mut rng = seeded_rng(seed);
        let buckets = cfg.physics_material.sample_buckets(&mut rng).unwrap();
        let pose = cfg
            .reset_base
            .pose_range
            .sample("domain_rand.reset_base.pose_range", &mut rng)
            .unwrap();
        let push = cfg.push_robot.next_interval(&mut rng).unwrap();
        (buckets, pose, push)
    };
    assert_eq!(draw(42), draw(42));
    assert_ne!(draw(42).0, draw(43).0);
}

#[test]
fn gain_scaling_around_nominals() {
    let mut rng = seeded_rng(1);
    for nominal in nominal_values(8, 20.0, 60.0, 2) {
        let range = RandomizationRange::scaling(nominal, 0.1).unwrap();
        let kp = range.sample(&mut rng);
        assert!((kp - nominal).abs() <= 0.1 * nominal + 1e-4);
    }
}
