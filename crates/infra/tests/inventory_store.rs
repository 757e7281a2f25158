use std::collections::HashSet;

use chrono::{TimeZone, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use madmin_infra::{InventoryStore, StoreConfig, StoreError, connect_database};
use madmin_inventory::{
    Distributor, DistributorId, NewStockRequest, StockId, StockItem, StockType, UpdateStockRequest,
};

const DATE: &str = "2030-01-01T00:00:00.000Z";

/// One private in-memory database per test.
async fn memory_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory sqlite")
}

async fn store() -> InventoryStore {
    madmin_observability::init();
    InventoryStore::new(memory_pool().await)
        .await
        .expect("failed to initialize store")
}

fn stock_request(stock_type: StockType, name: &str, quantity: &str) -> NewStockRequest {
    NewStockRequest {
        name: name.to_string(),
        stock_type: stock_type.discriminator(),
        expiration_date: if stock_type.is_expirable() {
            DATE.to_string()
        } else {
            String::new()
        },
        quantity: quantity.to_string(),
        ..NewStockRequest::default()
    }
}

fn stock(stock_type: StockType, name: &str, quantity: &str) -> StockItem {
    StockItem::new(&stock_request(stock_type, name, quantity)).unwrap()
}

async fn table_exists(pool: &SqlitePool, table: &str) -> bool {
    let name: Option<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1")
            .bind(table)
            .fetch_optional(pool)
            .await
            .unwrap();
    name.as_deref() == Some(table)
}

#[tokio::test]
async fn new_store_creates_both_tables() {
    let store = store().await;
    assert!(table_exists(store.pool(), "warehouse").await);
    assert!(table_exists(store.pool(), "distributors").await);
}

#[tokio::test]
async fn schema_creation_is_idempotent() {
    let pool = memory_pool().await;
    let first = InventoryStore::new(pool.clone()).await.unwrap();
    first.create_stock(&stock(StockType::Feed, "Oats", "3")).await.unwrap();

    let second = InventoryStore::new(pool).await.unwrap();
    assert_eq!(second.size().await.unwrap(), 1);
}

#[tokio::test]
async fn created_stock_reads_back_equal() {
    let store = store().await;

    for stock_type in StockType::ALL {
        let item = stock(stock_type, "Item", "12.50");
        store.create_stock(&item).await.unwrap();

        let read = store.read_stock(item.id_typed()).await.unwrap().expect("item should exist");
        assert_eq!(read, item);
        assert_eq!(read.stock_type(), stock_type);
        assert_eq!(read.quantity().to_string(), "12.50");
        assert_eq!(read.is_expirable(), stock_type.is_expirable());
    }
}

#[tokio::test]
async fn expiration_date_survives_with_milliseconds() {
    let store = store().await;
    let mut req = stock_request(StockType::Medicine, "Aspirin", "2.0");
    req.expiration_date = "2030-06-30T08:15:42.123Z".to_string();
    req.min_quantity = "0.125".to_string();
    let item = StockItem::new(&req).unwrap();
    store.create_stock(&item).await.unwrap();

    let read = store.read_stock(item.id_typed()).await.unwrap().unwrap();
    assert_eq!(
        read.expiration_date(),
        Utc.with_ymd_and_hms(2030, 6, 30, 8, 15, 42).unwrap() + chrono::Duration::milliseconds(123)
    );
    assert_eq!(read.quantity().to_string(), "2.0");
    assert_eq!(read.min_quantity().to_string(), "0.125");
}

#[tokio::test]
async fn accessory_is_stored_without_expiration_date() {
    let store = store().await;
    let item = stock(StockType::Accessory, "Leash", "5");
    store.create_stock(&item).await.unwrap();

    let raw: Option<String> =
        sqlx::query_scalar("SELECT expiration_date FROM warehouse WHERE id = ?1")
            .bind(item.id_typed().to_string())
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(raw, None);

    let read = store.read_stock(item.id_typed()).await.unwrap().unwrap();
    assert_eq!(read.try_expiration_date(), None);
}

#[tokio::test]
async fn read_of_unknown_id_is_not_found() {
    let store = store().await;
    assert!(store.read_stock(StockId::generate()).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_is_idempotent() {
    let store = store().await;
    let item = stock(StockType::Feed, "Hay", "40");
    store.create_stock(&item).await.unwrap();

    assert!(store.delete_stock(item.id_typed()).await.unwrap());
    assert!(store.read_stock(item.id_typed()).await.unwrap().is_none());
    assert!(!store.delete_stock(item.id_typed()).await.unwrap());
    assert!(store.read_stock(item.id_typed()).await.unwrap().is_none());
}

#[tokio::test]
async fn update_changing_only_name() {
    let store = store().await;
    let original = stock(StockType::Medicine, "Aspirin", "2.0");
    store.create_stock(&original).await.unwrap();

    let mut item = store.read_stock(original.id_typed()).await.unwrap().unwrap();
    let update = UpdateStockRequest {
        id: item.id_typed().to_string(),
        stock: stock_request(StockType::Medicine, "Aspirin Forte", "2.0"),
    };
    item.update(&update).unwrap();
    store.update_stock(&item).await.unwrap();

    let read = store.read_stock(original.id_typed()).await.unwrap().unwrap();
    assert_eq!(read.name(), "Aspirin Forte");
    assert_eq!(read.id_typed(), original.id_typed());
    assert_eq!(read.stock_type(), original.stock_type());
    assert_eq!(read.quantity().to_string(), "2.0");
    assert_eq!(read.min_quantity(), original.min_quantity());
    assert_eq!(read.expiration_date(), original.expiration_date());
}

#[tokio::test]
async fn returned_items_are_independent_copies() {
    let store = store().await;
    let item = stock(StockType::Feed, "Bran", "1");
    store.create_stock(&item).await.unwrap();

    let mut copy = store.read_stock(item.id_typed()).await.unwrap().unwrap();
    copy.set_expiration_date(Utc.with_ymd_and_hms(2040, 1, 1, 0, 0, 0).unwrap());

    let read = store.read_stock(item.id_typed()).await.unwrap().unwrap();
    assert_eq!(read, item);
}

#[tokio::test]
async fn update_of_missing_row_is_an_error() {
    let store = store().await;
    let item = stock(StockType::Accessory, "Bowl", "1");

    match store.update_stock(&item).await {
        Err(StoreError::StockNotFound(id)) => assert_eq!(id, item.id_typed()),
        other => panic!("Expected StockNotFound error, got {other:?}"),
    }
    assert_eq!(store.size().await.unwrap(), 0);
}

#[tokio::test]
async fn duplicate_id_is_rejected() {
    let store = store().await;
    let item = stock(StockType::Accessory, "Bowl", "1");
    store.create_stock(&item).await.unwrap();

    match store.create_stock(&item).await {
        Err(StoreError::Duplicate(_)) => {}
        other => panic!("Expected Duplicate error, got {other:?}"),
    }
}

#[tokio::test]
async fn size_after_inserts_and_one_delete() {
    let store = store().await;
    let items: Vec<StockItem> = (0..5)
        .map(|i| stock(StockType::ALL[i % 3], &format!("item {i}"), "1"))
        .collect();
    for item in &items {
        store.create_stock(item).await.unwrap();
    }
    assert_eq!(store.size().await.unwrap(), 5);

    store.delete_stock(items[2].id_typed()).await.unwrap();
    assert_eq!(store.size().await.unwrap(), 4);
}

#[tokio::test]
async fn stock_lists_every_item_by_id() {
    let store = store().await;
    let items = [
        stock(StockType::Medicine, "Aspirin", "1"),
        stock(StockType::Feed, "Oats", "2.25"),
        stock(StockType::Accessory, "Leash", "3"),
    ];
    for item in &items {
        store.create_stock(item).await.unwrap();
    }

    let all = store.stock().await.unwrap();
    assert_eq!(all.len(), items.len());
    for item in &items {
        assert_eq!(all.get(&item.id_typed()), Some(item));
    }
}

#[tokio::test]
async fn unknown_discriminator_is_corruption() {
    let store = store().await;
    let item = stock(StockType::Accessory, "Collar", "1");
    store.create_stock(&item).await.unwrap();

    sqlx::query("UPDATE warehouse SET type = 7 WHERE id = ?1")
        .bind(item.id_typed().to_string())
        .execute(store.pool())
        .await
        .unwrap();

    let err = store.read_stock(item.id_typed()).await.unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, StoreError::CorruptRow { .. }));
    assert!(store.stock().await.is_err());
}

#[tokio::test]
async fn expirable_row_without_date_is_corruption() {
    let store = store().await;
    let item = stock(StockType::Medicine, "Aspirin", "1");
    store.create_stock(&item).await.unwrap();

    sqlx::query("UPDATE warehouse SET expiration_date = NULL WHERE id = ?1")
        .bind(item.id_typed().to_string())
        .execute(store.pool())
        .await
        .unwrap();

    assert!(matches!(
        store.read_stock(item.id_typed()).await,
        Err(StoreError::CorruptRow { .. })
    ));
}

#[tokio::test]
async fn distributor_crud() {
    let store = store().await;
    let mut distributor = Distributor::new("Acme Pharma");
    store.create_distributor(&distributor).await.unwrap();

    let read = store.read_distributor(distributor.id_typed()).await.unwrap().unwrap();
    assert_eq!(read, distributor);

    distributor.set_name("Acme Animal Health");
    store.update_distributor(&distributor).await.unwrap();
    let read = store.read_distributor(distributor.id_typed()).await.unwrap().unwrap();
    assert_eq!(read.name(), "Acme Animal Health");

    assert_eq!(store.distributor_count().await.unwrap(), 1);
    assert!(store.delete_distributor(distributor.id_typed()).await.unwrap());
    assert!(!store.delete_distributor(distributor.id_typed()).await.unwrap());
    assert!(store.read_distributor(distributor.id_typed()).await.unwrap().is_none());
}

#[tokio::test]
async fn update_of_missing_distributor_is_an_error() {
    let store = store().await;
    let distributor = Distributor::new("Ghost");
    assert!(matches!(
        store.update_distributor(&distributor).await,
        Err(StoreError::DistributorNotFound(_))
    ));
}

#[tokio::test]
async fn stock_keeps_distributor_reference() {
    let store = store().await;
    let distributor = Distributor::new("Feed Co");
    store.create_distributor(&distributor).await.unwrap();

    let mut req = stock_request(StockType::Feed, "Oats", "10");
    req.distributor_id = distributor.id_typed().to_string();
    let item = StockItem::new(&req).unwrap();
    store.create_stock(&item).await.unwrap();

    let read = store.read_stock(item.id_typed()).await.unwrap().unwrap();
    assert_eq!(read.distributor_id(), Some(distributor.id_typed()));
}

#[tokio::test]
async fn stock_referencing_unknown_distributor_is_rejected() {
    let store = store().await;
    let missing = DistributorId::generate();

    let mut req = stock_request(StockType::Accessory, "Leash", "1");
    req.distributor_id = missing.to_string();
    let item = StockItem::new(&req).unwrap();

    match store.create_stock(&item).await {
        Err(StoreError::UnknownDistributor(id)) => assert_eq!(id, missing),
        other => panic!("Expected UnknownDistributor error, got {other:?}"),
    }
    assert_eq!(store.size().await.unwrap(), 0);
}

#[tokio::test]
async fn update_stock_with_unknown_distributor_is_rejected() {
    let store = store().await;
    let item = stock(StockType::Medicine, "Aspirin", "2");
    store.create_stock(&item).await.unwrap();

    let missing = DistributorId::generate();
    let mut changed = item.clone();
    let mut stock = stock_request(StockType::Medicine, "Renamed", "9");
    stock.distributor_id = missing.to_string();
    changed
        .update(&UpdateStockRequest {
            id: item.id_typed().to_string(),
            stock,
        })
        .unwrap();

    match store.update_stock(&changed).await {
        Err(StoreError::UnknownDistributor(id)) => assert_eq!(id, missing),
        other => panic!("Expected UnknownDistributor error, got {other:?}"),
    }

    let stored = store.read_stock(item.id_typed()).await.unwrap().unwrap();
    assert_eq!(stored, item);
    assert_eq!(stored.name(), "Aspirin");
    assert_eq!(stored.distributor_id(), None);
}

#[tokio::test]
async fn referenced_distributor_cannot_be_deleted() {
    let store = store().await;
    let distributor = Distributor::new("Acme");
    store.create_distributor(&distributor).await.unwrap();

    let mut req = stock_request(StockType::Medicine, "Aspirin", "1");
    req.distributor_id = distributor.id_typed().to_string();
    let item = StockItem::new(&req).unwrap();
    store.create_stock(&item).await.unwrap();

    match store.delete_distributor(distributor.id_typed()).await {
        Err(StoreError::DistributorInUse(id)) => assert_eq!(id, distributor.id_typed()),
        other => panic!("Expected DistributorInUse error, got {other:?}"),
    }

    store.delete_stock(item.id_typed()).await.unwrap();
    assert!(store.delete_distributor(distributor.id_typed()).await.unwrap());
}

#[tokio::test]
async fn distributors_lists_every_record() {
    let store = store().await;
    let a = Distributor::new("A");
    let b = Distributor::new("B");
    store.create_distributor(&a).await.unwrap();
    store.create_distributor(&b).await.unwrap();

    let all = store.distributors().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all.get(&a.id_typed()), Some(&a));
    assert_eq!(all.get(&b.id_typed()), Some(&b));
}

#[tokio::test]
async fn truncate_empties_both_tables() {
    let store = store().await;
    let distributor = Distributor::new("Acme");
    store.create_distributor(&distributor).await.unwrap();
    let mut req = stock_request(StockType::Feed, "Oats", "1");
    req.distributor_id = distributor.id_typed().to_string();
    store.create_stock(&StockItem::new(&req).unwrap()).await.unwrap();

    store.truncate().await.unwrap();
    assert_eq!(store.size().await.unwrap(), 0);
    assert_eq!(store.distributor_count().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_share_one_pool() {
    let store = store().await;

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                let item = stock(StockType::Accessory, &format!("bowl {i}"), "1");
                store.create_stock(&item).await.map(|_| item.id_typed())
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap().unwrap());
    }

    assert_eq!(ids.len(), 16);
    assert_eq!(store.size().await.unwrap(), 16);
}

#[tokio::test]
async fn file_database_persists_across_pools() {
    let dir = std::env::temp_dir().join(format!("madmin-{}", uuid::Uuid::new_v4()));
    let path = dir.join("nested").join("database.sqlite");
    let config = StoreConfig {
        database_url: format!("sqlite://{}", path.display()),
        max_connections: 2,
    };

    let item = stock(StockType::Medicine, "Aspirin", "12.50");
    {
        let pool = connect_database(&config).await.unwrap();
        let store = InventoryStore::new(pool.clone()).await.unwrap();
        store.create_stock(&item).await.unwrap();
        pool.close().await;
    }

    let pool = connect_database(&config).await.unwrap();
    let store = InventoryStore::new(pool.clone()).await.unwrap();
    let read = store.read_stock(item.id_typed()).await.unwrap().unwrap();
    assert_eq!(read, item);
    assert_eq!(read.quantity().to_string(), "12.50");
    pool.close().await;

    let _ = std::fs::remove_dir_all(&dir);
}
