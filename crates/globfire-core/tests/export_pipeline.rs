use std::path::PathBuf;

use globfire_core::export::{export_name, spawn_export_worker, ExportJob};
use globfire_core::feature::{AttrValue, AREA, END_DATE, LAT, LON, START_DATE};
use globfire_core::plan::{PipelineConfig, PipelinePlan};
use globfire_core::query::GeoJsonSource;
use uuid::Uuid;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

/// The fixture holds four perimeters: one valid 2018 fire in Kansas, a 2017
/// multi-polygon fire, a 2018 fire far below the size threshold and a 2018
/// fire outside the region. Only the first survives.
#[test]
fn plan_over_geojson_keeps_only_the_valid_fire() {
    let plan = PipelinePlan::for_config(&PipelineConfig {
        year: 2018,
        min_size: 1e7,
    })
    .expect("plan");
    let source = GeoJsonSource::new(fixture("final_perimeters.geojson"));

    let out = plan.execute(&source).expect("execute");
    assert_eq!(out.len(), 1);

    let feature = &out.features()[0];
    assert_eq!(feature.attr("Id"), Some(&AttrValue::Int(1)));
    // original attributes survive untouched
    assert_eq!(feature.i64_attr("IDate").unwrap(), 1529020800000);

    let area = feature.f64_attr(AREA).unwrap();
    assert!(area > 1e7 && area < 1e20, "area was {}", area);
    assert!((feature.f64_attr(LON).unwrap() - (-99.9)).abs() < 1e-6);
    assert!((feature.f64_attr(LAT).unwrap() - 40.1).abs() < 1e-3);
    assert!(matches!(feature.attr(START_DATE), Some(AttrValue::Date(_))));
    assert!(matches!(feature.attr(END_DATE), Some(AttrValue::Date(_))));
}

#[tokio::test]
async fn exported_csv_contains_original_and_engine_columns() {
    let plan = PipelinePlan::for_config(&PipelineConfig {
        year: 2018,
        min_size: 1e7,
    })
    .expect("plan");
    let source = GeoJsonSource::new(fixture("final_perimeters.geojson"));
    let collection = plan.execute(&source).expect("execute");

    let out_dir = std::env::temp_dir().join(format!("globfire-it-{}", Uuid::new_v4()));
    let (queue, worker) = spawn_export_worker(out_dir.clone());
    queue
        .submit(ExportJob::csv(export_name(2018, 1e7), collection))
        .expect("submit");
    drop(queue);
    worker.await.expect("worker");

    let path = out_dir.join("us_fire_2018_10000000.csv");
    let mut reader = csv::Reader::from_path(&path).expect("read exported csv");
    let headers = reader.headers().expect("headers").clone();
    for expected in ["Id", "IDate", "FDate", AREA, LON, LAT, START_DATE, END_DATE] {
        assert!(
            headers.iter().any(|h| h == expected),
            "missing column {}",
            expected
        );
    }

    let rows: Vec<_> = reader.records().collect::<Result<_, _>>().expect("rows");
    assert_eq!(rows.len(), 1);
    let start_idx = headers.iter().position(|h| h == START_DATE).unwrap();
    assert_eq!(&rows[0][start_idx], "2018-06-15");

    std::fs::remove_dir_all(&out_dir).ok();
}
