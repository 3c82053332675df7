use mimic_avatar_core::{
    layers::{breathing_offsets, BlinkPhase},
    BoneSlot, ConfigError, ControllerConfig, ControllerConfigPatch, NodeHandle, PoseController,
    SceneNode, Vec3,
};

const DT: f32 = 1.0 / 60.0;

fn approx(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

fn n(id: u64, name: &str) -> SceneNode {
    SceneNode::new(NodeHandle(id), name, Vec3::ZERO)
}

fn face_rig() -> Vec<SceneNode> {
    mimic_test_fixtures::skeletons::load("face-rig").expect("face-rig fixture")
}

fn seeded(seed: u64) -> PoseController {
    PoseController::with_seed(ControllerConfig::default(), seed)
}

/// it should leave bound slots unchanged when other slots are missing
#[test]
fn missing_slots_do_not_perturb_bound_slots() {
    let full = face_rig();
    let skip = [
        "jaw", "lid.T.L", "lid.T.R", "lid.B.L", "lid.B.R", "upper_arm.L", "upper_arm.R",
    ];
    let partial: Vec<SceneNode> = full
        .iter()
        .filter(|node| !skip.contains(&node.name.as_str()))
        .cloned()
        .collect();

    let mut a = seeded(9);
    let mut b = seeded(9);
    a.initialize(&full);
    b.initialize(&partial);
    assert!(b.binding(BoneSlot::Jaw).is_none());
    assert!(b.missing_slots().contains(&BoneSlot::EyelidUpperL));

    for i in 0..240 {
        let speaking = (i / 60) % 2 == 0;
        let fa = a.update(DT, speaking, 0.6).clone();
        let fb = b.update(DT, speaking, 0.6).clone();
        for write in fb.iter() {
            assert!(b.binding(write.slot).is_some());
            let other = fa.get(write.slot).expect("slot written by both controllers");
            assert!((other - write.rotation).length() < 1e-6, "slot {}", write.slot);
        }
        assert!(fb.get(BoneSlot::Jaw).is_none());
    }
}

/// it should write rest + breathing for the spine chain
#[test]
fn spine_writes_are_rest_plus_breathing() {
    let mut c = seeded(1);
    c.initialize(&face_rig());
    let cfg = c.config().clone();

    for _ in 0..30 {
        c.update(DT, false, 0.0);
    }
    let time = c.time();
    let expected = breathing_offsets(time, cfg.breath_speed, cfg.breath_amount);
    for (slot, offset) in expected {
        let rest = c.rest_pose(slot).unwrap();
        let written = c.frame().get(slot).unwrap();
        assert!((written - (rest + offset)).length() < 1e-6, "slot {slot}");
    }

    let lift: Vec<f32> = BoneSlot::SPINE_CHAIN
        .iter()
        .map(|s| c.frame().get(*s).unwrap().x - c.rest_pose(*s).unwrap().x)
        .collect();
    assert!(lift[0] <= lift[1] && lift[1] <= lift[2], "{lift:?}");
}

/// it should drive the eyelids through one full blink
#[test]
fn triggered_blink_closes_and_reopens_lids() {
    let mut c = seeded(3);
    c.initialize(&face_rig());
    let close = c.config().eyelid_close_angle;
    let ratio = c.config().lower_lid_ratio;

    c.update(DT, false, 0.0);
    c.trigger_blink();
    assert_eq!(c.blink_state().phase, BlinkPhase::Closing);

    let mut peak: f32 = 0.0;
    for _ in 0..20 {
        c.update(0.01, false, 0.0);
        let v = c.blink_value();
        assert!((0.0..=1.0).contains(&v));
        peak = peak.max(v);

        let upper = c.frame().get(BoneSlot::EyelidUpperL).unwrap();
        let lower = c.frame().get(BoneSlot::EyelidLowerR).unwrap();
        assert!(approx(upper.x, v * close, 1e-6));
        assert!(approx(lower.x, -v * close * ratio, 1e-6));
    }
    assert!(peak > 0.9);
    assert_eq!(c.blink_value(), 0.0);
    assert!(!c.is_blinking());
    assert!(c.next_blink_time() > c.time());
}

/// it should blink on its own schedule
#[test]
fn blinks_fire_within_the_configured_interval() {
    let mut c = seeded(11);
    c.initialize(&face_rig());
    let first = c.next_blink_time();
    let mut started_at = None;
    for _ in 0..(7.0 / DT) as usize {
        c.update(DT, false, 0.0);
        if c.is_blinking() && started_at.is_none() {
            started_at = Some(c.time());
        }
    }
    let started_at = started_at.expect("a blink within 7s");
    assert!(started_at >= first && started_at < first + DT * 1.5);
}

/// it should nod while speaking and settle back to rest afterwards
#[test]
fn head_nods_then_returns_to_rest() {
    let mut c = seeded(5);
    c.initialize(&[n(1, "Head"), n(2, "Neck")]);
    let rest = c.rest_pose(BoneSlot::Head).unwrap();

    let mut max_offset: f32 = 0.0;
    for _ in 0..60 {
        let head = c.update(DT, true, 0.0).get(BoneSlot::Head).unwrap();
        max_offset = max_offset.max((head.x - rest.x).abs());
    }
    assert!(max_offset > 0.01);
    assert!(max_offset <= c.config().head_nod_amount + 1e-6);

    for _ in 0..180 {
        c.update(DT, false, 0.0);
    }
    let head = c.frame().get(BoneSlot::Head).unwrap();
    assert!((head - rest).length() < 1e-4);
}

/// it should follow mouth opening with the jaw, or leave it alone when disabled
#[test]
fn jaw_tracks_mouth_unless_disabled() {
    let mut c = seeded(5);
    c.initialize(&[n(1, "Jaw")]);
    let rest = c.rest_pose(BoneSlot::Jaw).unwrap();
    for _ in 0..60 {
        c.update(DT, true, 1.0);
    }
    let jaw = c.frame().get(BoneSlot::Jaw).unwrap();
    assert!(approx(jaw.x - rest.x, c.config().jaw_open_amount, 1e-3));

    c.set_config(&ControllerConfigPatch {
        jaw_open_amount: Some(0.0),
        ..Default::default()
    })
    .unwrap();
    assert!(c.update(DT, true, 1.0).get(BoneSlot::Jaw).is_none());
    assert!(c.binding(BoneSlot::Jaw).is_some());
}

/// it should restore the rest pose and restart the clock on reset
#[test]
fn reset_writes_rest_pose_for_every_bound_slot() {
    let mut c = seeded(2);
    let rig = face_rig();
    c.initialize(&rig);
    for _ in 0..90 {
        c.update(DT, true, 0.8);
    }
    c.trigger_blink();

    let frame = c.reset().clone();
    assert_eq!(frame.len(), c.bindings().len());
    for write in frame.iter() {
        assert_eq!(Some(write.rotation), c.rest_pose(write.slot));
    }
    assert_eq!(c.time(), 0.0);
    assert!(!c.is_blinking());
    assert_eq!(c.blink_value(), 0.0);
    assert_eq!(c.talk_state().head, 0.0);
    assert!(c.next_blink_time() >= c.config().blink_interval_min);
}

/// it should keep bindings and rest pose when tunables change
#[test]
fn set_config_leaves_bindings_and_rest_pose() {
    let mut c = seeded(2);
    c.initialize(&face_rig());
    let rest_before: Vec<Option<Vec3>> = BoneSlot::ALL.iter().map(|s| c.rest_pose(*s)).collect();
    let bound_before = c.bindings().len();

    c.set_config(&ControllerConfigPatch {
        breath_amount: Some(0.2),
        eyelid_close_angle: Some(0.8),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(c.config().breath_amount, 0.2);
    assert_eq!(c.config().eyelid_close_angle, 0.8);
    assert_eq!(c.bindings().len(), bound_before);
    let rest_after: Vec<Option<Vec3>> = BoneSlot::ALL.iter().map(|s| c.rest_pose(*s)).collect();
    assert_eq!(rest_before, rest_after);
}

/// it should bake the T-pose correction into the frame written by initialize
#[test]
fn initialize_frame_carries_corrected_arms() {
    let mut c = seeded(4);
    c.initialize(&face_rig());
    let left = c.frame().get(BoneSlot::UpperArmL).unwrap();
    let right = c.frame().get(BoneSlot::UpperArmR).unwrap();
    assert!(left.z < -1.0, "{left:?}");
    assert!(right.z > 1.0, "{right:?}");
    assert_eq!(c.frame().len(), BoneSlot::COUNT);
}

/// it should refuse tunables that would break the blink scheduler and keep animating
#[test]
fn set_config_rejects_invalid_patches() {
    let mut c = seeded(4);
    c.initialize(&face_rig());
    let before = c.config().clone();

    let err = c
        .set_config(&ControllerConfigPatch {
            blink_interval_max: Some(f32::INFINITY),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { field: "blink_interval_max", .. }));
    assert_eq!(c.config(), &before);

    let err = c
        .set_config(&ControllerConfigPatch {
            blink_interval_min: Some(9.0),
            blink_interval_max: Some(1.0),
            blink_duration: Some(-1.0),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { field: "blink_interval_min", .. }));
    assert_eq!(c.config(), &before);
    assert!(c.config().validate().is_ok());

    c.reset();
    c.trigger_blink();
    for _ in 0..30 {
        c.update(DT, false, 0.0);
    }
    assert!(c.next_blink_time().is_finite());
}
