mod common;

use std::sync::Arc;

use sql_dal::{DalError, Dialect, SqlValue, Store, StoreConfig, TableSchema};
use tokio::runtime::Runtime;

use common::{MockConnector, result_set};

fn store(connector: Arc<MockConnector>) -> Store {
    Store::new(connector, StoreConfig::new(Dialect::Mssql)).unwrap()
}

#[test]
fn nested_begins_share_one_physical_transaction() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let connector = MockConnector::new();
        let store = store(connector.clone());
        let mut tx = store.transaction();

        tx.begin().await?;
        tx.begin().await?;
        assert_eq!(tx.txref(), 2);

        tx.commit().await?;
        assert_eq!(tx.txref(), 1);
        tx.commit().await?;
        assert_eq!(tx.txref(), 0);

        // One physical BEGIN, one dedicated connection; each commit call
        // issues a physical COMMIT.
        assert_eq!(
            connector.issued(),
            vec![
                "BEGIN TRANSACTION",
                "COMMIT TRANSACTION",
                "COMMIT TRANSACTION"
            ]
        );
        assert_eq!(connector.connects(), 1);
        Ok(())
    })
}

#[test]
fn statements_inside_the_transaction_use_the_shared_connection()
-> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let connector = MockConnector::new();
        let store = store(connector.clone());
        let mut tx = store.transaction();

        tx.begin().await?;
        tx.sql("SELECT 1", &[])?.exec().await?;
        tx.sql("SELECT 2", &[])?.exec().await?;
        tx.commit().await?;

        assert_eq!(connector.connects(), 1);
        assert_eq!(
            connector.issued(),
            vec![
                "BEGIN TRANSACTION",
                "SELECT 1",
                "SELECT 2",
                "COMMIT TRANSACTION"
            ]
        );
        Ok(())
    })
}

#[test]
fn at_depth_zero_statements_fall_back_to_the_store() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let connector = MockConnector::new();
        let store = store(connector.clone());
        let mut tx = store.transaction();

        tx.sql("SELECT 1", &[])?.exec().await?;
        assert_eq!(connector.connects(), 1);

        // Entering the transaction opens its own dedicated connection.
        tx.begin().await?;
        assert_eq!(connector.connects(), 2);
        tx.commit().await?;
        Ok(())
    })
}

#[test]
fn rollback_releases_the_connection_and_a_later_begin_starts_over()
-> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let connector = MockConnector::new();
        let store = store(connector.clone());
        let mut tx = store.transaction();

        tx.begin().await?;
        tx.rollback().await?;
        assert_eq!(tx.txref(), 0);

        tx.begin().await?;
        tx.commit().await?;

        assert_eq!(connector.connects(), 2);
        assert_eq!(
            connector.issued(),
            vec![
                "BEGIN TRANSACTION",
                "ROLLBACK TRANSACTION",
                "BEGIN TRANSACTION",
                "COMMIT TRANSACTION"
            ]
        );
        Ok(())
    })
}

#[test]
fn commit_without_begin_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let connector = MockConnector::new();
        let store = store(connector.clone());
        let mut tx = store.transaction();

        let err = tx.commit().await.unwrap_err();
        assert!(matches!(err, DalError::Execution(_)));
        assert!(connector.issued().is_empty());
        Ok(())
    })
}

#[test]
fn an_inner_commit_commits_for_real() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let connector = MockConnector::new();
        let store = store(connector.clone());
        let mut tx = store.transaction();

        tx.begin().await?;
        tx.begin().await?;
        tx.commit().await?;

        // The physical COMMIT has already gone out while the outer level
        // still believes it is inside the transaction.
        assert_eq!(tx.txref(), 1);
        assert!(
            connector
                .issued()
                .contains(&"COMMIT TRANSACTION".to_string())
        );

        // The dedicated connection is still held until the full unwind.
        tx.sql("SELECT 1", &[])?.exec().await?;
        assert_eq!(connector.connects(), 1);
        tx.commit().await?;
        Ok(())
    })
}

#[test]
fn close_discards_outstanding_nesting() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let connector = MockConnector::new();
        let store = store(connector.clone());
        let mut tx = store.transaction();

        tx.begin().await?;
        tx.begin().await?;
        tx.close();
        assert_eq!(tx.txref(), 0);

        // The handle is dead: no physical transaction remains to commit.
        let err = tx.commit().await.unwrap_err();
        assert!(matches!(err, DalError::Execution(_)));
        Ok(())
    })
}

#[test]
fn daos_run_against_the_transaction_connection() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let connector = MockConnector::new();
        let mut store = store(connector.clone());
        store.register_schema(
            "animals",
            TableSchema::new(
                "animal_table",
                vec!["id".into(), "name".into()],
                Dialect::Mssql,
            ),
        );

        let mut tx = store.transaction();
        tx.begin().await?;

        let animals = tx.dao("animals")?;
        connector.push_response(result_set(
            &["id", "name"],
            vec![vec![SqlValue::from(1), SqlValue::from("fido")]],
        ));
        let row = animals.find_by_id(&tx, 1).await?;
        assert!(row.is_some());

        tx.commit().await?;

        assert_eq!(connector.connects(), 1);
        assert_eq!(
            connector.issued(),
            vec![
                "BEGIN TRANSACTION",
                "SELECT * FROM [animal_table] WHERE [id] = 1;",
                "COMMIT TRANSACTION"
            ]
        );
        Ok(())
    })
}
