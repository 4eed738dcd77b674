use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use pim_core::LocaleId;
use pim_infra::CatalogConfig;
use pim_infra::ProductAbstractLookup;
use pim_infra::ProductAggregateWriter;
use pim_infra::catalog_store::InMemoryCatalogDatabase;
use pim_products::{
    Attributes, Locale, LocalizedAttributes, Price, ProductAbstract, ProductImage, ProductImageSet,
    QueryCriteriaExpander, QueryJoin, Relation, codec,
};
use std::sync::Arc;

type Db = Arc<InMemoryCatalogDatabase>;

fn attributes(n: usize) -> Attributes {
    (0..n)
        .map(|i| (format!("attribute_{i:03}"), serde_json::json!({ "value": i, "label": format!("Label {i}") })))
        .collect()
}

fn setup_db() -> Db {
    let db = Arc::new(InMemoryCatalogDatabase::new());
    db.add_locale(Locale::new(LocaleId::new(46), "de_DE")).unwrap();
    db.add_locale(Locale::new(LocaleId::new(66), "en_US")).unwrap();
    db
}

fn writer(db: &Db) -> ProductAggregateWriter<Db, Db, Db, Db> {
    ProductAggregateWriter::new(db.clone(), db.clone(), db.clone(), db.clone(), CatalogConfig::default())
}

fn full_product(sku: String) -> ProductAbstract {
    ProductAbstract::new(sku)
        .with_attribute("color", "red")
        .with_attribute("size", "M")
        .with_price(Price::new(999))
        .with_localized_attributes(LocalizedAttributes::new(Locale::new(LocaleId::new(46), "de_DE"), "Rot"))
        .with_localized_attributes(LocalizedAttributes::new(Locale::new(LocaleId::new(66), "en_US"), "Red"))
        .with_image_set(ProductImageSet::new("default").with_image(ProductImage::new("s.jpg", "l.jpg")))
}

fn bench_attribute_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("attribute_codec");

    for size in [1usize, 16, 128] {
        let attrs = attributes(size);
        let blob = codec::encode(&attrs).unwrap();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("encode", size), &attrs, |b, attrs| {
            b.iter(|| codec::encode(black_box(attrs)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("decode", size), &blob, |b, blob| {
            b.iter(|| codec::decode(black_box(blob)).unwrap());
        });
    }

    group.finish();
}

fn bench_writer(c: &mut Criterion) {
    let mut group = c.benchmark_group("product_aggregate_writer");

    group.bench_function("create_full_aggregate", |b| {
        let db = setup_db();
        let writer = writer(&db);
        let mut next = 0u64;
        b.iter(|| {
            next += 1;
            writer.create(black_box(&full_product(format!("SKU-{next}")))).unwrap();
        });
    });

    group.bench_function("update_full_aggregate", |b| {
        let db = setup_db();
        let writer = writer(&db);
        let id = writer.create(&full_product("SKU-1".to_string())).unwrap();
        let product = full_product("SKU-1".to_string()).with_id(id);
        b.iter(|| {
            writer.update(black_box(&product)).unwrap();
        });
    });

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("product_abstract_lookup");

    for catalog_size in [100usize, 1_000] {
        let db = setup_db();
        let writer = writer(&db);
        for i in 0..catalog_size {
            let product = if i % 2 == 0 {
                full_product(format!("SKU-{i}"))
            } else {
                ProductAbstract::new(format!("SKU-{i}"))
            };
            writer.create(&product).unwrap();
        }
        let lookup = ProductAbstractLookup::new(db.clone(), db.clone(), db.clone(), db.clone(), db.clone());

        group.bench_with_input(BenchmarkId::new("find_by_sku_full", catalog_size), &catalog_size, |b, size| {
            let sku = format!("SKU-{}", size / 2);
            b.iter(|| lookup.find_by_sku_full(black_box(&sku)).unwrap());
        });

        let expander = QueryCriteriaExpander::new()
            .with(|c| c.with_join(QueryJoin::inner(Relation::LocalizedAttributes)))
            .with(|c| c.with_limit(50));
        group.bench_with_input(BenchmarkId::new("list_localized", catalog_size), &expander, |b, expander| {
            b.iter(|| lookup.list(black_box(expander)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_attribute_codec, bench_writer, bench_lookup);
criterion_main!(benches);
