use anyhow::Result;
use fleet_store::{FileBackend, KvBackend, KvHandle, StoreError};
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_put_get_delete() -> Result<()> {
    let dir = tempdir()?;
    let backend = FileBackend::open(dir.path())?;

    backend.put("/fleet/containers/c1", br#"{"a":1}"#)?;
    assert_eq!(
        backend.get("/fleet/containers/c1")?.as_deref(),
        Some(&br#"{"a":1}"#[..])
    );
    assert!(dir.path().join("fleet/containers/c1.json").is_file());

    assert!(backend.delete("/fleet/containers/c1")?);
    assert!(!backend.delete("/fleet/containers/c1")?);
    assert!(backend.get("/fleet/containers/c1")?.is_none());
    Ok(())
}

#[test]
fn test_list_ignores_temp_and_nested() -> Result<()> {
    let dir = tempdir()?;
    let backend = FileBackend::open(dir.path())?;

    backend.put("/fleet/containers/b", b"{}")?;
    backend.put("/fleet/containers/a.v2", b"{}")?;
    backend.put("/fleet/containers/deep/x", b"{}")?;
    std::fs::write(dir.path().join("fleet/containers/.a.json.tmp"), b"partial")?;

    assert_eq!(
        backend.list("/fleet/containers/")?,
        vec!["/fleet/containers/a.v2", "/fleet/containers/b"]
    );
    assert!(backend.list("/fleet/nothing-here")?.is_empty());
    Ok(())
}

#[test]
fn test_rejects_escaping_keys() -> Result<()> {
    let dir = tempdir()?;
    let backend = FileBackend::open(dir.path())?;

    assert!(matches!(
        backend.put("/fleet/../../etc/passwd", b"x"),
        Err(StoreError::InvalidKey(_))
    ));
    assert!(matches!(backend.get("relative"), Err(StoreError::InvalidKey(_))));
    Ok(())
}

#[test]
fn test_documents_survive_reopen() -> Result<()> {
    let dir = tempdir()?;

    {
        let backend: Arc<dyn KvBackend> = Arc::new(FileBackend::open(dir.path())?);
        let handle = KvHandle::new(backend, "/fleet/containers");
        handle.write("c1", &serde_json::json!({ "additional_labels": { "team": "core" } }))?;
    }

    let backend: Arc<dyn KvBackend> = Arc::new(FileBackend::open(dir.path())?);
    let handle = KvHandle::new(backend, "/fleet/containers");
    assert_eq!(handle.ids()?, vec!["c1"]);

    let doc: Option<serde_json::Value> = handle.read("c1")?;
    assert_eq!(doc.unwrap()["additional_labels"]["team"], "core");
    Ok(())
}
