// Rolling history buffer tests

use homeserver_monitor::error::ConfigError;
use homeserver_monitor::history::{DEFAULT_HISTORY_CAPACITY, HistoryBuffer, HistorySet};
use homeserver_monitor::models::ResourceId;

#[test]
fn test_rejects_zero_capacity() {
    assert_eq!(HistoryBuffer::new(0).unwrap_err(), ConfigError::ZeroCapacity);
    assert_eq!(HistorySet::new(0).unwrap_err(), ConfigError::ZeroCapacity);
}

#[test]
fn test_empty_buffer_has_no_current_value() {
    let buffer = HistoryBuffer::new(DEFAULT_HISTORY_CAPACITY).unwrap();
    assert!(buffer.is_empty());
    assert_eq!(buffer.current(), None);
    assert_eq!(buffer.snapshot().count(), 0);
    assert_eq!(buffer.capacity(), 20);
}

#[test]
fn test_partial_buffer_reports_only_real_samples() {
    let mut buffer = HistoryBuffer::new(20).unwrap();
    buffer.push(42.0, 1_000);
    buffer.push(43.0, 2_000);
    let points = buffer.to_vec();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].value, 42.0);
    assert_eq!(buffer.current(), Some(43.0));
}

#[test]
fn test_never_exceeds_capacity_and_keeps_last_values_in_order() {
    let capacity = 5;
    for extra in [0usize, 1, 3, 17] {
        let mut buffer = HistoryBuffer::new(capacity).unwrap();
        let total = capacity + extra;
        for i in 0..total {
            buffer.push(i as f64, i as u64 * 1000);
            assert!(buffer.len() <= capacity);
        }
        let values: Vec<f64> = buffer.snapshot().map(|p| p.value).collect();
        let expected: Vec<f64> = (extra..total).map(|i| i as f64).collect();
        assert_eq!(values, expected, "after pushing {} values", total);
        assert!(
            buffer
                .snapshot()
                .zip(buffer.snapshot().skip(1))
                .all(|(a, b)| a.timestamp < b.timestamp)
        );
    }
}

#[test]
fn test_snapshot_does_not_mutate() {
    let mut buffer = HistoryBuffer::new(3).unwrap();
    buffer.push(1.0, 1);
    buffer.push(2.0, 2);
    let first = buffer.to_vec();
    let _ = buffer.snapshot().count();
    assert_eq!(buffer.to_vec(), first);
    assert_eq!(buffer.len(), 2);
}

#[test]
fn test_tail_slices_newest_points_oldest_first() {
    let mut buffer = HistoryBuffer::new(10).unwrap();
    for i in 0..6 {
        buffer.push(i as f64, i);
    }
    let tail: Vec<f64> = buffer.tail(3).iter().map(|p| p.value).collect();
    assert_eq!(tail, vec![3.0, 4.0, 5.0]);
    assert_eq!(buffer.tail(100).len(), 6);
    assert!(buffer.tail(0).is_empty());
    assert_eq!(buffer.len(), 6);
}

#[test]
fn test_history_set_creates_series_on_first_push() {
    let mut set = HistorySet::new(2).unwrap();
    set.push(&ResourceId::Cpu, 10.0, 1);
    set.push(&ResourceId::Cpu, 20.0, 2);
    set.push(&ResourceId::Cpu, 30.0, 3);
    set.push(&ResourceId::ContainerCpu("web".into()), 5.0, 3);

    let cpu = set.get(&ResourceId::Cpu).unwrap();
    assert_eq!(cpu.capacity(), 2);
    assert_eq!(cpu.current(), Some(30.0));
    assert_eq!(cpu.len(), 2);
    assert!(set.get(&ResourceId::Memory).is_none());
    assert_eq!(set.series().count(), 2);
}
