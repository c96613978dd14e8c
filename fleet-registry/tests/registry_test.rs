use fleet_registry::{ContainerRegistry, ContainerReport, ContainerStorage};
use fleet_store::{KvBackend, MemoryBackend};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

fn registry() -> (ContainerRegistry, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    (ContainerRegistry::new(backend.clone(), "/fleet"), backend)
}

fn report(id: &str, name: &str) -> ContainerReport {
    ContainerReport::new(id, name, "nginx:1.25")
}

fn ids(records: &[Arc<fleet_registry::ContainerRecord>]) -> HashSet<String> {
    records.iter().map(|r| r.id().to_string()).collect()
}

#[test]
fn test_report_then_invalidate_scenario() {
    let (reg, _) = registry();

    reg.update_and_get_container(&report("c1", "web"), "n1");
    let record = reg.get_container("c1").expect("c1 is valid");
    let snap = record.snapshot().unwrap();
    assert_eq!(snap.name(), "web");
    assert_eq!(snap.node(), Some("n1"));

    // Some orchestrators leak a leading slash into the name.
    reg.update_and_get_container(&report("c1", "/web"), "n1");
    assert!(reg.get_container("c1").is_none());
    assert!(!reg.contains("c1"));
    assert!(reg.get_containers().is_empty());
}

#[test]
fn test_node_sweep_scenario() {
    let (reg, _) = registry();
    reg.update_and_get_container(&report("a", "web"), "n1");
    reg.update_and_get_container(&report("b", "db"), "n1");
    reg.update_and_get_container(&report("c", "cache"), "n2");

    let on_n1 = reg.get_containers_by_node("n1");
    assert_eq!(ids(&on_n1), HashSet::from(["a".to_string(), "b".to_string()]));

    assert_eq!(reg.remove_node_containers("n1"), 2);
    assert!(reg.get_containers_by_node("n1").is_empty());
    assert_eq!(ids(&reg.get_containers()), HashSet::from(["c".to_string()]));
}

#[test]
fn test_update_never_evicts() {
    let (reg, _) = registry();
    let rec = reg.update_and_get_container(&report("c1", "/bad"), "n1");
    assert!(rec.snapshot().is_none());
    assert!(reg.contains("c1"));

    // The same identity may be corrected later.
    let again = reg.update_and_get_container(&report("c1", "good"), "n1");
    assert!(Arc::ptr_eq(&rec, &again));
    assert_eq!(reg.get_container("c1").unwrap().snapshot().unwrap().name(), "good");
}

#[test]
fn test_point_lookup_evicts_invalid() {
    let (reg, backend) = registry();
    reg.update_and_get_container(&report("c1", "/web"), "n1");
    assert!(backend.get("/fleet/containers/c1").unwrap().is_some());

    assert!(reg.get_container("c1").is_none());
    assert!(!reg.contains("c1"));
    assert!(backend.get("/fleet/containers/c1").unwrap().is_none());
    assert!(reg.get_container("c1").is_none());
}

#[test]
fn test_bulk_listing_does_not_evict() {
    let (reg, _) = registry();
    reg.update_and_get_container(&report("good", "web"), "n1");
    reg.update_and_get_container(&report("bad", "/web"), "n1");

    assert_eq!(ids(&reg.get_containers()), HashSet::from(["good".to_string()]));
    assert!(reg.contains("bad"));
    assert_eq!(reg.len(), 2);
}

#[test]
fn test_node_query_includes_invalid_records() {
    let (reg, _) = registry();
    reg.update_and_get_container(&report("good", "web"), "n1");
    reg.update_and_get_container(&report("bad", "/web"), "n1");
    reg.update_and_get_container(&report("other", "web"), "n2");

    let on_n1 = reg.get_containers_by_node("n1");
    assert_eq!(ids(&on_n1), HashSet::from(["good".to_string(), "bad".to_string()]));
    assert_eq!(reg.node_container_ids("n2"), HashSet::from(["other".to_string()]));
}

#[test]
fn test_node_follows_latest_report() {
    let (reg, _) = registry();
    reg.update_and_get_container(&report("c1", "web"), "n1");
    reg.update_and_get_container(&report("c1", "web"), "n2");

    assert!(reg.get_containers_by_node("n1").is_empty());
    assert_eq!(reg.get_containers_by_node("n2").len(), 1);
}

#[test]
fn test_removed_identity_starts_fresh() {
    let (reg, _) = registry();
    let old = reg.update_and_get_container(&report("c1", "web"), "n1");
    old.set_additional_labels([("team".to_string(), "core".to_string())].into());

    reg.remove_node_containers("n1");
    assert!(reg.get_container("c1").is_none());

    let fresh = reg.update_and_get_container(&report("c1", "web"), "n3");
    assert!(!Arc::ptr_eq(&old, &fresh));
    assert!(fresh.additional_labels().is_empty());
    assert_eq!(fresh.node().as_deref(), Some("n3"));
}

#[test]
fn test_find_container() {
    let (reg, _) = registry();
    reg.update_and_get_container(&report("4f2a9c01", "web"), "n1");
    reg.update_and_get_container(&report("77be0d13", "db"), "n1");

    assert_eq!(reg.find_container("4f2a9c01").unwrap().id(), "4f2a9c01");
    assert_eq!(reg.find_container("4f2a").unwrap().id(), "4f2a9c01");
    assert_eq!(reg.find_container("db").unwrap().id(), "77be0d13");
    assert!(reg.find_container("cache").is_none());
    assert!(reg.find_container("9").is_none());
}

#[test]
fn test_find_skips_and_evicts_invalid() {
    let (reg, _) = registry();
    reg.update_and_get_container(&report("abc1", "/web"), "n1");

    // The scan ignores invalid records.
    assert!(reg.find_container("abc").is_none());
    assert!(reg.contains("abc1"));

    // An exact hit on an invalid record evicts it.
    assert!(reg.find_container("abc1").is_none());
    assert!(!reg.contains("abc1"));
}

#[test]
fn test_remove_set() {
    let (reg, backend) = registry();
    for id in ["a", "b", "c"] {
        reg.update_and_get_container(&report(id, "svc"), "n1");
    }

    let gone = HashSet::from(["a".to_string(), "c".to_string(), "missing".to_string()]);
    assert_eq!(reg.remove(&gone), 2);
    assert_eq!(ids(&reg.get_containers()), HashSet::from(["b".to_string()]));
    assert_eq!(backend.list("/fleet/containers/").unwrap(), vec!["/fleet/containers/b"]);
}

#[test]
fn test_racing_reports_create_one_record() {
    let (reg, _) = registry();
    let reg = Arc::new(reg);
    let barrier = Arc::new(Barrier::new(16));

    let workers: Vec<_> = (0..16)
        .map(|i| {
            let reg = reg.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                reg.update_and_get_container(&report("new", "web"), &format!("n{}", i))
            })
        })
        .collect();

    let records: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    assert_eq!(reg.len(), 1);
    assert!(records.iter().all(|r| Arc::ptr_eq(r, &records[0])));
}

#[test]
fn test_concurrent_readers_and_writers() {
    let (reg, _) = registry();
    let reg = Arc::new(reg);

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let reg = reg.clone();
            thread::spawn(move || {
                for i in 0..200 {
                    let id = format!("w{}-{}", w, i % 10);
                    reg.update_and_get_container(&report(&id, "svc"), "n1");
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let reg = reg.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    for rec in reg.get_containers() {
                        let snap = rec.snapshot().expect("listed records are valid");
                        assert_eq!(snap.id(), rec.id());
                    }
                }
            })
        })
        .collect();

    for t in writers.into_iter().chain(readers) {
        t.join().unwrap();
    }
    assert_eq!(reg.get_containers().len(), 40);
}

#[test]
fn test_trait_object_handle() {
    let (reg, _) = registry();
    let storage: Arc<dyn ContainerStorage> = Arc::new(reg);

    storage.update_and_get_container(&report("c1", "web"), "n1");
    assert!(storage.get_container("c1").is_some());
    assert_eq!(storage.get_containers_by_node("n1").len(), 1);
}
