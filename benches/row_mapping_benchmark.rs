use criterion::{criterion_group, criterion_main, Criterion};
use gym_journal::models::{JournalData, Row};
use gym_journal::services::DashboardView;
use std::hint::black_box;

fn row(cells: &[&str]) -> Row {
    cells.iter().map(|c| c.to_string()).collect()
}

/// A few years of training: several exercises per session, metrics weekly.
fn fixture_rows(days: usize) -> (Vec<Row>, Vec<Row>, Vec<Row>) {
    let start = chrono::NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
    let mut workouts = Vec::new();
    let mut metrics = Vec::new();
    let mut notes = Vec::new();

    for day in 0..days {
        let date = (start + chrono::Duration::days(day as i64))
            .format("%Y-%m-%d")
            .to_string();
        let ts = format!("{date}T18:00:00.000Z");
        if day % 2 == 0 {
            for exercise in ["Squat", "Bench", "Row", "Curl"] {
                workouts.push(row(&[&date, exercise, "3", "8-10", &ts]));
            }
            notes.push(row(&[&date, "Felt good, added 2.5kg", &ts]));
        }
        if day % 7 == 0 {
            // Some hand-edited rows with blanks
            let bmi = if day % 14 == 0 { "" } else { "24.1" };
            metrics.push(row(&[&date, "81.4", bmi, &ts]));
        }
    }

    // Unsorted, as appended out of order over time
    metrics.reverse();
    (workouts, metrics, notes)
}

fn benchmark_row_mapping(c: &mut Criterion) {
    let (workouts, metrics, notes) = fixture_rows(3 * 365);

    let mut group = c.benchmark_group("journal_rows");

    group.bench_function("from_rows", |b| {
        b.iter(|| JournalData::from_rows(black_box(&workouts), black_box(&metrics), black_box(&notes)))
    });

    let data = JournalData::from_rows(&workouts, &metrics, &notes);
    group.bench_function("dashboard_view", |b| {
        b.iter(|| DashboardView::from_data(black_box(data.clone())))
    });

    group.finish();
}

criterion_group!(benches, benchmark_row_mapping);
criterion_main!(benches);
