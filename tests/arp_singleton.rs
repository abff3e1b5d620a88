//! First access to the ARP dialect from many threads at once.
//!
//! Lives in its own test binary so nothing else has touched the dialect
//! cell before the threads race for it.

use highgo_connector::dialect::{arp_load_count, ArpDialect};
use highgo_connector::{ConnectionProfile, DialectHandle, SqlDialect};
use std::sync::{Arc, Barrier};

#[test]
fn test_concurrent_first_access_loads_once() {
    const CALLERS: usize = 16;
    assert_eq!(arp_load_count(), 0);

    let barrier = Arc::new(Barrier::new(CALLERS));
    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                let profile = ConnectionProfile {
                    hostname: Some("h".to_string()),
                    database_name: Some("d".to_string()),
                    ..ConnectionProfile::default()
                };
                barrier.wait();
                match profile.dialect() {
                    DialectHandle::Arp(d) => d as *const ArpDialect as usize,
                    DialectHandle::Legacy(_) => 0,
                }
            })
        })
        .collect();

    let addresses: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let first = addresses[0];
    assert_ne!(first, 0);
    assert!(addresses.iter().all(|a| *a == first));
    assert_eq!(arp_load_count(), 1);
    assert_eq!(highgo_connector::dialect::dialect_singleton().name(), "HIGHGO");
}
