//! End-to-end: CSV observations -> yearly aggregates -> trend

use chrono::{Datelike, NaiveDate};
use trendsat_algorithms::aggregate::{aggregate, AggregateRecord};
use trendsat_algorithms::trend::{fit, fit_by_unit, TrendParams};
use trendsat_core::io::{read_observations, read_observations_from_reader, write_records, ReadOptions};
use trendsat_core::{Error, Observation, PeriodKind};

/// Two pixels of 16-day composites, 2015-2020. `up` rises by 0.5 per year,
/// `flat` stays constant; `flat` has a cloudy (QA-rejected) composite each
/// year.
fn write_input(path: &std::path::Path) {
    let mut text = String::from("unit_id,timestamp,value,qa\n");
    for year in 2015..=2020 {
        let mut date = NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
        let mut k = 0;
        while date.year() == year {
            let up = 1.0 + 0.5 * (year - 2015) as f64;
            text.push_str(&format!("up,{},{},0\n", date, up));
            let qa = if k == 3 { 2 } else { 0 };
            let flat = if qa == 0 { 4.0 } else { 100.0 };
            text.push_str(&format!("flat,{},{},{}\n", date, flat, qa));
            date = date + chrono::Days::new(16);
            k += 1;
        }
    }
    std::fs::write(path, text).unwrap();
}

#[test]
fn test_pipeline_from_csv() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("obs.csv");
    write_input(&input);

    let options = ReadOptions {
        qa_mask: Some("0-1:0".parse().unwrap()),
        dn: Some(16),
        ..Default::default()
    };
    let (observations, summary) = read_observations(&input, &options).unwrap();
    assert_eq!(summary.qa_rejected, 6);
    assert_eq!(summary.missing_values, 0);

    let years = aggregate(&observations, PeriodKind::Year, None).unwrap();
    assert_eq!(years.len(), 12);

    for r in years.iter().filter(|r| r.unit_id.as_str() == "flat") {
        assert!((r.mean - 4.0).abs() < 1e-12, "cloudy composite leaked: {}", r.mean);
        assert_eq!(r.observed_days, r.period_length_days);
        assert_eq!(r.coverage_days, r.period_length_days - 16);
    }

    let up: Vec<Observation> = years
        .iter()
        .filter(|r| r.unit_id.as_str() == "up")
        .map(AggregateRecord::to_observation)
        .collect();
    let trend = fit(&up, false).unwrap();
    assert!((trend.slope - 0.5).abs() < 1e-9);
    assert_eq!(trend.n, 6);
    assert!(trend.rmse < 1e-9);

    let output = dir.path().join("years.csv");
    write_records(&years, &output).unwrap();
    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.starts_with(
        "unit_id,period_start,period_end,value,mean,coverage_days,observed_days,period_length_days"
    ));
    assert_eq!(written.lines().count(), 13);
}

#[test]
fn test_trend_output_marks_undefined_tval() {
    let d = |y| NaiveDate::from_ymd_opt(y, 6, 1).unwrap();
    let batch = vec![
        Observation::new("short", d(2019), 1.0),
        Observation::new("short", d(2020), 2.0),
        Observation::new("long", d(2018), 1.0),
        Observation::new("long", d(2019), 2.5),
        Observation::new("long", d(2020), 2.9),
    ];
    let results: Vec<_> = fit_by_unit(&batch, &TrendParams::default())
        .into_iter()
        .map(|(_, r)| r.unwrap())
        .collect();

    let mut buf = Vec::new();
    trendsat_core::io::write_records_to_writer(&results, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "unit_id,offset,slope,rmse,tval,n");
    assert!(lines[1].starts_with("long,"));
    assert!(lines[2].starts_with("short,"));
    assert!(lines[2].ends_with(",,2"), "undefined tval should be empty: {}", lines[2]);
}

#[test]
fn test_exclusive_end_composites_fill_month() {
    let csv = "\
unit_id,timestamp,interval_end,value
px,2019-01-01,2019-01-09,1.0
px,2019-01-09,2019-01-17,1.0
px,2019-01-17,2019-01-25,1.0
px,2019-01-25,2019-02-02,1.0
";
    let (inclusive, _) = read_observations_from_reader(csv.as_bytes(), &ReadOptions::default()).unwrap();
    assert!(matches!(
        aggregate(&inclusive, PeriodKind::Month, Some((2019, 2019))),
        Err(Error::CoverageOverflow { .. })
    ));

    let options = ReadOptions {
        exclusive_end: true,
        ..Default::default()
    };
    let (observations, _) = read_observations_from_reader(csv.as_bytes(), &options).unwrap();
    let months = aggregate(&observations, PeriodKind::Month, Some((2019, 2019))).unwrap();
    assert_eq!(months.len(), 2);
    assert_eq!(months[0].coverage_days, 31);
    assert_eq!(months[0].period_length_days, 31);
    assert!((months[0].mean - 1.0).abs() < 1e-12);
    assert_eq!(months[1].coverage_days, 1);
}
