use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use stockdb_core::ingest::entity::RawDocument;
use stockdb_core::ingest::error::IngestError;
use stockdb_core::migrate::entity::Table;
use stockdb_core::snapshot::entity::Snapshot;
use stockdb_core::snapshot::error::NormalizeError;
use stockdb_core::store::error::StoreError;
use stockdb_core::store::port::{MigrationSource, SnapshotStore};
use stockdb_ingest::driver::Ingestor;
use stockdb_ingest::source::DirectorySource;
use stockdb_store::sqlite::{SqliteRole, SqliteStore};
use tempfile::{TempDir, tempdir};

fn document(symbol: &str, timestamps: &[i64]) -> Value {
    json!({
        "symbol": symbol,
        "basicInfo": {"companyName": format!("{symbol} JSC"), "exchange": "HOSE", "matchPrice": 21.5},
        "priceData": {
            "t": timestamps,
            "o": timestamps.iter().map(|_| 20.0).collect::<Vec<_>>(),
            "c": timestamps.iter().map(|_| 21.0).collect::<Vec<_>>(),
            "v": timestamps.iter().map(|_| 1000).collect::<Vec<_>>()
        },
        "fullData": {"overview": {"tên": "Công ty Cổ phần", "tags": ["ngân hàng", 1, null]}},
        "updatedAt": "2025-03-01T00:00:00Z"
    })
}

fn raw(name: &str, value: &Value) -> RawDocument {
    RawDocument::new(name, value.to_string())
}

async fn source_store() -> anyhow::Result<(TempDir, Arc<SqliteStore>)> {
    let dir = tempdir()?;
    let store = SqliteStore::open(dir.path().join("stocks.db"), SqliteRole::Source).await?;
    store.init_schema().await?;
    Ok((dir, Arc::new(store)))
}

#[tokio::test]
async fn test_one_malformed_document_is_isolated() -> anyhow::Result<()> {
    let (_dir, store) = source_store().await?;
    let ingestor = Ingestor::new(store.clone());

    let documents = vec![
        raw("a.json", &document("AAA", &[1, 2])),
        RawDocument::new("broken.json", "{\"symbol\": \"BRK\", "),
        raw("b.json", &document("BBB", &[1])),
        raw("c.json", &document("CCC", &[])),
    ];
    let report = ingestor.ingest(documents).await?;

    assert_eq!(report.total, 4);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(store.count_rows(Table::Stocks).await?, 3);
    assert_eq!(store.count_rows(Table::PriceData).await?, 3);
    Ok(())
}

#[tokio::test]
async fn test_reingesting_same_document_is_idempotent() -> anyhow::Result<()> {
    let (_dir, store) = source_store().await?;
    let ingestor = Ingestor::new(store.clone());
    let doc = document("VCB", &[100, 200, 300]);

    ingestor.ingest(vec![raw("vcb.json", &doc)]).await?;
    let report = ingestor.ingest(vec![raw("vcb.json", &doc)]).await?;

    assert_eq!(report.succeeded, 1);
    assert_eq!(store.count_rows(Table::Stocks).await?, 1);
    let page = store.price_page(None, 100).await?;
    let stamps: Vec<i64> = page.iter().map(|r| r.timestamp).collect();
    assert_eq!(stamps, vec![100, 200, 300]);
    Ok(())
}

#[tokio::test]
async fn test_blob_round_trip_through_store() -> anyhow::Result<()> {
    let (_dir, store) = source_store().await?;
    let doc = document("CTG", &[1]);
    Ingestor::new(store.clone())
        .ingest(vec![raw("ctg.json", &doc)])
        .await?;

    let stocks = store.load_stocks().await?;
    let blob = stocks[0].full_data_json.as_deref().expect("blob stored");
    let restored: Value = serde_json::from_str(blob)?;
    assert_eq!(restored, doc["fullData"]);
    assert!(blob.contains("Công ty Cổ phần"));
    Ok(())
}

#[tokio::test]
async fn test_document_level_errors() -> anyhow::Result<()> {
    let (_dir, store) = source_store().await?;
    let ingestor = Ingestor::new(store);

    let unreadable = RawDocument {
        name: "gone.json".to_string(),
        body: Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")),
    };
    assert!(matches!(
        ingestor.ingest_one(unreadable).await,
        Err(IngestError::Read(_))
    ));

    let no_symbol = raw("anon.json", &json!({"basicInfo": {"companyName": "?"}}));
    assert!(matches!(
        ingestor.ingest_one(no_symbol).await,
        Err(IngestError::Input(NormalizeError::MissingSymbol))
    ));

    let ok = raw("ok.json", &document("TCB", &[1]));
    assert_eq!(ingestor.ingest_one(ok).await?, "TCB");
    Ok(())
}

/// 对指定 symbol 写入失败的存储，其余 symbol 只做记录。
struct FlakyStore {
    poisoned: &'static str,
    written: Mutex<Vec<String>>,
}

#[async_trait]
impl SnapshotStore for FlakyStore {
    async fn replace_snapshot(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if snapshot.symbol() == self.poisoned {
            return Err(StoreError::Write("constraint failed".to_string()));
        }
        self.written
            .lock()
            .map_err(|e| StoreError::Write(e.to_string()))?
            .push(snapshot.symbol().to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_store_failure_does_not_stop_the_run() {
    let store = Arc::new(FlakyStore {
        poisoned: "BAD",
        written: Mutex::new(Vec::new()),
    });
    let ingestor = Ingestor::new(store.clone());

    let report = ingestor
        .ingest(vec![
            raw("1.json", &document("BAD", &[1])),
            raw("2.json", &document("GOOD", &[1])),
            raw("3.json", &json!({"symbol": ""})),
        ])
        .await
        .unwrap();

    assert_eq!((report.total, report.succeeded, report.failed), (3, 1, 2));
    assert_eq!(*store.written.lock().unwrap(), vec!["GOOD".to_string()]);
}

/// 连接已断开的存储，只记录被调用的次数。
struct UnreachableStore {
    calls: AtomicUsize,
}

#[async_trait]
impl SnapshotStore for UnreachableStore {
    async fn replace_snapshot(&self, _snapshot: &Snapshot) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Connection("database is unreachable".to_string()))
    }
}

#[tokio::test]
async fn test_lost_connection_aborts_the_run() {
    let store = Arc::new(UnreachableStore {
        calls: AtomicUsize::new(0),
    });
    let ingestor = Ingestor::new(store.clone());

    let documents: Vec<RawDocument> = ["AAA", "BBB", "CCC", "DDD", "EEE"]
        .iter()
        .map(|s| raw(&format!("{s}.json"), &document(s, &[1])))
        .collect();
    let result = ingestor.ingest(documents).await;

    assert!(matches!(
        result,
        Err(IngestError::Store(StoreError::Connection(_)))
    ));
    assert_eq!(store.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_malformed_documents_before_lost_connection_are_skipped() {
    let store = Arc::new(UnreachableStore {
        calls: AtomicUsize::new(0),
    });
    let ingestor = Ingestor::new(store.clone());

    let result = ingestor
        .ingest(vec![
            RawDocument::new("broken.json", "not json"),
            raw("ok.json", &document("OKK", &[1])),
            raw("never.json", &document("NVR", &[1])),
        ])
        .await;

    assert!(result.is_err());
    assert_eq!(store.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_directory_source_reads_json_files_in_name_order() -> anyhow::Result<()> {
    let docs = tempdir()?;
    std::fs::write(docs.path().join("b.json"), document("BBB", &[1]).to_string())?;
    std::fs::write(docs.path().join("a.JSON"), document("AAA", &[1, 2]).to_string())?;
    std::fs::write(docs.path().join("notes.txt"), "not a snapshot")?;
    std::fs::write(docs.path().join("c.json"), "garbage")?;
    std::fs::create_dir(docs.path().join("nested.json"))?;

    let source = DirectorySource::open(docs.path())?;
    assert_eq!(source.len(), 3);

    let names: Vec<String> = DirectorySource::open(docs.path())?
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, vec!["a.JSON", "b.json", "c.json"]);

    let (_dir, store) = source_store().await?;
    let report = Ingestor::new(store.clone()).ingest(source).await?;
    assert_eq!((report.total, report.succeeded, report.failed), (3, 2, 1));
    assert_eq!(store.count_rows(Table::PriceData).await?, 3);
    Ok(())
}

#[tokio::test]
async fn test_missing_directory_is_fatal() {
    let result = DirectorySource::open("/definitely/not/here");
    assert!(matches!(result, Err(IngestError::Source(_))));
}
