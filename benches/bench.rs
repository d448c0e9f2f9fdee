use criterion::{black_box, criterion_group, criterion_main, Criterion};

use corkboard::models::{Database, NewThread, NewUser, Page, Role, SortKey, ThreadQuery};

fn listing_database() -> Database {
    let db = Database::open_in_memory().unwrap();
    let mut conn = db.connection().unwrap();

    let author = conn
        .insert_user(&NewUser::new("Bench", "bench@example.com", "eng", Role::User, "hunter2").unwrap())
        .unwrap();

    for n in 0..500 {
        conn.insert_thread(NewThread::new(
            format!("thread number {}", n),
            "benchmark thread body".into(),
            author,
        ))
        .unwrap();
    }

    db
}

pub fn bench_listing(c: &mut Criterion) {
    let db = listing_database();

    let query = ThreadQuery {
        search: Some("number 4".into()),
        status: None,
        sort: SortKey::Popular,
    };
    let page = Page { num: 1, width: 10 };

    c.bench_function("thread_page", |b| {
        b.iter(|| {
            let mut conn = db.connection().unwrap();
            conn.thread_page(black_box(&query), page).unwrap()
        })
    });
}

criterion_group!(benches, bench_listing);
criterion_main!(benches);
