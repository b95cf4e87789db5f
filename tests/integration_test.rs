//! Integration tests for the complete Waymo AP pipeline.

mod common;

use approx::assert_relative_eq;
use common::{car_box, groundtruth, metadata, prediction, FakeMatcher};
use waymo_ap_eval::{BoxStore, BoxType, WaymoApMetric, WaymoApParams, WaymoMetadata};

fn car_store() -> BoxStore {
    let mut store = BoxStore::new();
    store.add_groundtruth(groundtruth(1, 1, car_box(10.0))).unwrap();
    store.add_groundtruth(groundtruth(2, 1, car_box(20.0))).unwrap();
    store.add_prediction(prediction(1, 1, car_box(10.1), 0.9)).unwrap();
    store.add_prediction(prediction(2, 1, car_box(20.3), 0.6)).unwrap();
    store
}

#[test]
fn test_end_to_end_with_missing_class() {
    // Two eval classes, three PR points, class 2 has no boxes at all.
    let metadata = metadata(&["Background", "car", "truck"], &[1, 2], 3);
    let mut metric = WaymoApMetric::new(
        metadata,
        car_store(),
        FakeMatcher::default(),
        WaymoApParams::default(),
    )
    .unwrap();

    let report = metric.summary("eval").unwrap();

    let ap_default: Vec<&str> = report
        .scalars
        .iter()
        .filter(|s| s.tag.ends_with("/AP_default"))
        .map(|s| s.tag.as_str())
        .collect();
    assert_eq!(ap_default, vec!["eval/car/AP_default", "eval/truck/AP_default"]);

    // 2 gt / (2 gt + 2 pd) on the overall breakdown.
    let car_ap = report.scalar("eval/car/AP_default").unwrap();
    assert_relative_eq!(car_ap, 0.5);
    assert_relative_eq!(report.scalar("eval/car/APH_default").unwrap(), 0.45);
    assert!(report.scalar("eval/truck/AP_default").unwrap().is_nan());
    assert!(report.scalar("eval/truck/APH_default").unwrap().is_nan());

    assert_eq!(report.scalars[0].tag, "eval/weighted_mAP");
    assert_relative_eq!(report.scalars[0].value, 0.25);
    assert_eq!(report.scalars.len(), 5);

    assert_eq!(report.curves.len(), 2);
    assert_eq!(report.curves[0].title, "eval/car/PR");
    assert_eq!(report.curves[0].xs, vec![1.0, 1.0, 0.0]);
    assert_eq!(report.curves[0].ys, vec![1.0, 0.5, 0.0]);
    assert_eq!(report.curves[1].title, "eval/truck/PR");
    assert_eq!(report.curves[1].xs, vec![0.0, 0.0, 0.0]);
    assert_eq!(report.curves[1].ys, vec![0.0, 0.0, 0.0]);
}

#[test]
fn test_evaluation_runs_once() {
    let mut metric = WaymoApMetric::new(
        WaymoMetadata::new(),
        car_store(),
        FakeMatcher::default(),
        WaymoApParams::default(),
    )
    .unwrap();

    let first = metric.value().unwrap();
    let second = metric.value().unwrap();
    metric.summary("a").unwrap();
    metric.summary("b").unwrap();

    assert_eq!(first, second);
    // Only Vehicle has data; Pedestrian and Cyclist never reach the matcher.
    assert_eq!(metric.matcher().calls.get(), 1);
    let tables = metric.tables().unwrap();
    assert_eq!(tables.breakdowns().len(), 1);
    assert_relative_eq!(first, 0.5 / 3.0);
}

#[test]
fn test_extra_breakdowns_reported_under_their_class() {
    let params = WaymoApParams::new(BoxType::ThreeD).with_breakdown("OBJECT_TYPE");
    let mut metric = WaymoApMetric::new(
        WaymoMetadata::new(),
        car_store(),
        FakeMatcher::default(),
        params,
    )
    .unwrap();

    let report = metric.summary("waymo").unwrap();
    let tags: Vec<&str> = report.scalars.iter().map(|s| s.tag.as_str()).collect();

    assert_eq!(
        tags,
        vec![
            "waymo/weighted_mAP",
            "waymo/Vehicle/AP_default",
            "waymo/Vehicle/APH_default",
            "waymo_extra/AP_OBJECT_TYPE_TYPE_VEHICLE_LEVEL_2",
            "waymo_extra/APH_OBJECT_TYPE_TYPE_VEHICLE_LEVEL_2",
            "waymo/Pedestrian/AP_default",
            "waymo/Pedestrian/APH_default",
            "waymo_extra/AP_OBJECT_TYPE_TYPE_PEDESTRIAN_LEVEL_2",
            "waymo_extra/APH_OBJECT_TYPE_TYPE_PEDESTRIAN_LEVEL_2",
            "waymo/Cyclist/AP_default",
            "waymo/Cyclist/APH_default",
            "waymo_extra/AP_OBJECT_TYPE_TYPE_CYCLIST_LEVEL_2",
            "waymo_extra/APH_OBJECT_TYPE_TYPE_CYCLIST_LEVEL_2",
        ]
    );

    // Breakdown 1 (vehicle shard) gets half the overall AP from the fake matcher.
    assert_relative_eq!(
        report
            .scalar("waymo_extra/AP_OBJECT_TYPE_TYPE_VEHICLE_LEVEL_2")
            .unwrap(),
        0.25
    );

    let titles: Vec<&str> = report.curves.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "waymo/Vehicle/PR",
            "waymo/Vehicle/OBJECT_TYPE_TYPE_VEHICLE_LEVEL_2/PR",
            "waymo/Pedestrian/PR",
            "waymo/Pedestrian/OBJECT_TYPE_TYPE_PEDESTRIAN_LEVEL_2/PR",
            "waymo/Cyclist/PR",
            "waymo/Cyclist/OBJECT_TYPE_TYPE_CYCLIST_LEVEL_2/PR",
        ]
    );
}

#[test]
fn test_range_breakdown_tables() {
    let params = WaymoApParams::new(BoxType::ThreeD).with_breakdown("RANGE");
    let mut metric = WaymoApMetric::new(
        WaymoMetadata::new(),
        car_store(),
        FakeMatcher::default(),
        params,
    )
    .unwrap();

    let tables = metric.tables().unwrap();
    assert_eq!(tables.breakdowns().len(), 13);

    let near_vehicle = tables
        .breakdown_by_name("RANGE_TYPE_VEHICLE_[0, 30)_LEVEL_2")
        .unwrap();
    let ap = tables.ap(&near_vehicle).unwrap();
    assert_eq!(ap.len(), 3);
    assert_relative_eq!(ap[0], 0.25);
    assert!(ap[1].is_nan());
    assert!(ap[2].is_nan());

    let report = metric.summary("range").unwrap();
    let vehicle_extra = report
        .scalars
        .iter()
        .filter(|s| s.tag.starts_with("range_extra/AP_RANGE_TYPE_VEHICLE"))
        .count();
    assert_eq!(vehicle_extra, 3);
    // Sign is not an eval class, so its shards never appear.
    assert!(report.scalars.iter().all(|s| !s.tag.contains("TYPE_SIGN")));
}

#[test]
fn test_report_serializes_to_json() {
    let mut metric = WaymoApMetric::new(
        WaymoMetadata::new(),
        car_store(),
        FakeMatcher::default(),
        WaymoApParams::new(BoxType::TwoD),
    )
    .unwrap();

    let json = metric.summary("eval").unwrap().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["scalars"][0]["tag"], "eval/weighted_mAP");
    assert_eq!(value["curves"][0]["x_axis"]["label"], "Recall");
    assert_eq!(value["curves"][0]["style"]["markersize"], 14.0);
    // Pedestrian AP is a NaN placeholder.
    assert!(value["scalars"][3]["value"].is_null());
}

#[test]
fn test_repeated_extra_breakdown() {
    let params = WaymoApParams::new(BoxType::ThreeD)
        .with_breakdown("OBJECT_TYPE")
        .with_breakdown("OBJECT_TYPE");
    let mut metric = WaymoApMetric::new(
        WaymoMetadata::new(),
        car_store(),
        FakeMatcher::default(),
        params,
    )
    .unwrap();
    assert_eq!(metric.config().breakdown_generator_ids().len(), 3);
    assert_eq!(metric.config().breakdowns().len(), 1 + 4 + 4);

    let report = metric.summary("waymo").unwrap();
    let vehicle_tags: Vec<&str> = report
        .scalars
        .iter()
        .map(|s| s.tag.as_str())
        .filter(|tag| tag.contains("Vehicle") || tag.contains("VEHICLE"))
        .collect();
    assert_eq!(
        vehicle_tags,
        vec![
            "waymo/Vehicle/AP_default",
            "waymo/Vehicle/APH_default",
            "waymo_extra/AP_OBJECT_TYPE_TYPE_VEHICLE_LEVEL_2",
            "waymo_extra/APH_OBJECT_TYPE_TYPE_VEHICLE_LEVEL_2",
            "waymo_extra/AP_OBJECT_TYPE_TYPE_VEHICLE_LEVEL_2",
            "waymo_extra/APH_OBJECT_TYPE_TYPE_VEHICLE_LEVEL_2",
        ]
    );
    assert_eq!(report.scalars.len(), 1 + 3 * 6);
    assert_eq!(report.curves.len(), 3 * 3);

    // The later occurrence (breakdown 5) wins for the repeated key.
    let repeated: Vec<f64> = report
        .scalars
        .iter()
        .filter(|s| s.tag == "waymo_extra/AP_OBJECT_TYPE_TYPE_VEHICLE_LEVEL_2")
        .map(|s| s.value)
        .collect();
    assert_eq!(repeated.len(), 2);
    for value in repeated {
        assert_relative_eq!(value, 0.5 / 6.0);
    }
    assert_relative_eq!(report.scalar("waymo/Vehicle/AP_default").unwrap(), 0.5);
}

#[test]
fn test_explicit_one_shard_breakdown() {
    let params = WaymoApParams::default().with_breakdown("ONE_SHARD");
    let mut metric = WaymoApMetric::new(
        WaymoMetadata::new(),
        car_store(),
        FakeMatcher::default(),
        params,
    )
    .unwrap();

    let report = metric.summary("eval").unwrap();
    // The second overall entry never matches a class name, so it is not reported.
    assert_eq!(report.scalars.len(), 1 + 3 * 2);
    assert!(report.scalars.iter().all(|s| !s.tag.starts_with("eval_extra/")));
    assert_eq!(report.curves.len(), 3);
    // Both overall entries share one key; the later one (breakdown 1) is kept.
    assert_relative_eq!(report.scalar("eval/Vehicle/AP_default").unwrap(), 0.25);
    assert_relative_eq!(report.scalar("eval/weighted_mAP").unwrap(), 0.25 / 3.0);
}
