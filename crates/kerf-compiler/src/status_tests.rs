use crate::status::StatusList;

#[test]
fn starts_with_default_group() {
    let statuses = StatusList::new();
    assert_eq!(statuses.vals(), &[1, 0]);
}

#[test]
fn intern_default_reuses_offset_zero() {
    let mut statuses = StatusList::new();
    assert_eq!(statuses.intern(&[0]).unwrap(), 0);
    assert_eq!(statuses.vals(), &[1, 0]);
}

#[test]
fn intern_appends_groups() {
    let mut statuses = StatusList::new();
    assert_eq!(statuses.intern(&[5]).unwrap(), 2);
    assert_eq!(statuses.intern(&[3, 7]).unwrap(), 4);
    assert_eq!(statuses.vals(), &[1, 0, 1, 5, 2, 3, 7]);
}

#[test]
fn intern_is_append_only() {
    let mut statuses = StatusList::new();
    let first = statuses.intern(&[5]).unwrap();
    statuses.intern(&[9]).unwrap();
    // Same group later: same offset, no growth.
    let len = statuses.len();
    assert_eq!(statuses.intern(&[5]).unwrap(), first);
    assert_eq!(statuses.len(), len);
}
